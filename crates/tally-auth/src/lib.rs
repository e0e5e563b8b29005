//! Tally Authentication and Session Management
//!
//! This crate provides cookie/JWT session authentication for Tally:
//! password hashing, session token issuance and verification, the
//! rotation policy, the cookie transport port, the login/signup/logout
//! use cases, and role-based route authorization.

pub mod authz;
pub mod cookie;
pub mod error;
pub mod password;
pub mod policy;
pub mod service;
pub mod token;

pub use authz::{Access, RedirectReason, RouteClass, RouteTable, DASHBOARD_PATH, LOGIN_PATH};
pub use cookie::{CookieOptions, CookieTransport, SameSitePolicy, SessionJar, SESSION_COOKIE};
pub use error::{AuthError, FieldError};
pub use password::PasswordHasher;
pub use policy::{RotationDecision, SessionPolicy};
pub use service::{AuthService, Signup};
pub use token::{IssuedSession, SessionClaims, SessionCodec, SessionState, MIN_SECRET_BYTES};
