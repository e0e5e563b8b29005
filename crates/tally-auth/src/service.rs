//! Core authentication use cases
//!
//! `AuthService` orchestrates the user repository, the password hasher,
//! the session codec, and the cookie transport for login, signup, and
//! logout. Every login failure path collapses into the same generic
//! error so callers cannot probe which accounts exist.

use std::sync::Arc;

use chrono::Utc;
use tally_db::{Database, NewUser, Role, User};
use tracing::{debug, info};

use crate::cookie::{CookieOptions, CookieTransport, SESSION_COOKIE};
use crate::error::{AuthError, FieldError};
use crate::password::PasswordHasher;
use crate::token::{IssuedSession, SessionCodec};

/// Valid Argon2 hash that verifies against nothing; compared when the
/// looked-up user does not exist so the lookup-miss path costs the same
/// as a password mismatch.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dGltaW5nX2F0dGFja19wcmV2ZW50aW9u$K8rI5T7VdQ8xkO0GqK5K2w";

const MAX_USERNAME_LENGTH: usize = 64;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 256;

/// Signup form input
#[derive(Debug, Clone)]
pub struct Signup {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Login, signup, and logout orchestration
#[derive(Clone)]
pub struct AuthService {
    db: Database,
    hasher: PasswordHasher,
    codec: Arc<SessionCodec>,
}

impl AuthService {
    pub fn new(db: Database, hasher: PasswordHasher, codec: Arc<SessionCodec>) -> Self {
        Self { db, hasher, codec }
    }

    pub fn codec(&self) -> &SessionCodec {
        &self.codec
    }

    /// Authenticate with email and password; on success a session cookie
    /// is written through `cookies`.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        cookies: &mut dyn CookieTransport,
    ) -> Result<User, AuthError> {
        let email = normalize_email(email);
        debug!("Login attempt for {}", email);

        let lookup = self.db.get_user_by_email(&email).await?;

        // Always run one verification so unknown emails cost the same
        // as wrong passwords.
        let (hash_to_verify, user) = match lookup {
            Some(u) => (u.password_hash.clone(), Some(u)),
            None => (DUMMY_HASH.to_string(), None),
        };
        let password_valid = self.hasher.verify(password, &hash_to_verify)?;

        let user = match (user, password_valid) {
            (Some(u), true) => u,
            _ => return Err(AuthError::Authentication),
        };

        self.start_session(&user, cookies)?;
        info!("User {} logged in", user.username);
        Ok(user)
    }

    /// Register a new account and log it in.
    pub async fn signup(
        &self,
        signup: Signup,
        cookies: &mut dyn CookieTransport,
    ) -> Result<User, AuthError> {
        let email = normalize_email(&signup.email);
        let username = signup.username.trim().to_string();

        let mut problems = Vec::new();
        validate_email(&email, &mut problems);
        validate_username(&username, &mut problems);
        validate_password(&signup.password, &mut problems);
        if !problems.is_empty() {
            return Err(AuthError::Validation(problems));
        }

        let password_hash = self.hasher.hash(&signup.password)?;

        // The repository re-checks uniqueness; Duplicate maps to Conflict
        let user = self
            .db
            .insert_user(NewUser {
                username,
                email,
                password_hash,
                role: Role::User,
            })
            .await?;

        self.start_session(&user, cookies)?;
        info!("User {} signed up", user.username);
        Ok(user)
    }

    /// Drop the session cookie. Deleting an absent cookie is fine, so
    /// repeated logouts are harmless.
    pub fn logout(&self, cookies: &mut dyn CookieTransport) {
        cookies.delete(SESSION_COOKIE);
    }

    /// Issue a token and persist it in the cookie. The cookie is written
    /// only after the token is fully signed, so an aborted request never
    /// commits a partial session.
    fn start_session(
        &self,
        user: &User,
        cookies: &mut dyn CookieTransport,
    ) -> Result<IssuedSession, AuthError> {
        let now = Utc::now().timestamp();
        let issued = self.codec.issue(user.id, user.role, now)?;
        cookies.set(
            SESSION_COOKIE,
            issued.token.clone(),
            CookieOptions::session(issued.claims.exp - now),
        );
        Ok(issued)
    }
}

/// Emails are matched case-insensitively and without surrounding space
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str, problems: &mut Vec<FieldError>) {
    if email.is_empty() {
        problems.push(FieldError::new("email", "Email cannot be empty"));
        return;
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    };
    if !valid {
        problems.push(FieldError::new("email", "Email address is not valid"));
    }
}

fn validate_username(username: &str, problems: &mut Vec<FieldError>) {
    if username.is_empty() {
        problems.push(FieldError::new("username", "Username cannot be empty"));
        return;
    }
    if username.len() > MAX_USERNAME_LENGTH {
        problems.push(FieldError::new(
            "username",
            format!(
                "Username exceeds maximum length of {} characters",
                MAX_USERNAME_LENGTH
            ),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        problems.push(FieldError::new(
            "username",
            "Username can only contain alphanumeric characters, underscores, and hyphens",
        ));
    }
}

fn validate_password(password: &str, problems: &mut Vec<FieldError>) {
    if password.len() < MIN_PASSWORD_LENGTH {
        problems.push(FieldError::new(
            "password",
            format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LENGTH
            ),
        ));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        problems.push(FieldError::new(
            "password",
            format!(
                "Password exceeds maximum length of {} characters",
                MAX_PASSWORD_LENGTH
            ),
        ));
    }
}
