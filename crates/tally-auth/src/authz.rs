//! Role-based route authorization
//!
//! Routes are classified once per request from a static prefix table and
//! the decoded session decides between letting the request through and
//! redirecting it, before any page logic runs.

use tally_db::Role;

use crate::token::SessionClaims;

/// Where authenticated users land
pub const DASHBOARD_PATH: &str = "/dashboard";
/// Where unauthenticated users are sent
pub const LOGIN_PATH: &str = "/login";

/// Access class of a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Protected,
    Admin,
}

/// Why a request was redirected instead of served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    /// Logged-in user on a login/signup style page
    BounceAuthenticated,
    /// Protected route without a usable session
    NotAuthenticated,
    /// Admin route without a usable session
    AdminNotAuthenticated,
    /// Admin route with a non-admin session
    AdminNotAuthorized,
}

impl RedirectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectReason::BounceAuthenticated => "public.bounce_authenticated",
            RedirectReason::NotAuthenticated => "protected.not_authenticated",
            RedirectReason::AdminNotAuthenticated => "admin.not_authenticated",
            RedirectReason::AdminNotAuthorized => "admin.not_authorized",
        }
    }
}

/// Authorization outcome for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow,
    Redirect {
        to: &'static str,
        reason: RedirectReason,
    },
}

/// Static route classification table, built once at startup
#[derive(Debug, Clone)]
pub struct RouteTable {
    public: Vec<String>,
    admin: Vec<String>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            public: vec!["/".to_string(), "/login".to_string(), "/signup".to_string()],
            admin: vec!["/admin".to_string(), "/api/users".to_string()],
        }
    }
}

/// Prefix match on path segments: `/api/users` covers `/api/users/3`
/// but not `/api/users-export`. `/` only matches itself.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return path == "/";
    }
    path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}

impl RouteTable {
    pub fn new(public: Vec<String>, admin: Vec<String>) -> Self {
        Self { public, admin }
    }

    /// Classify a request path. Admin prefixes win over public ones;
    /// everything unlisted is protected.
    pub fn classify(&self, path: &str) -> RouteClass {
        if self.admin.iter().any(|p| matches_prefix(path, p)) {
            return RouteClass::Admin;
        }
        if self.public.iter().any(|p| matches_prefix(path, p)) {
            return RouteClass::Public;
        }
        RouteClass::Protected
    }

    /// Decide access for a classified route given the decoded session,
    /// if any. An invalid session must be passed as `None`.
    pub fn authorize(&self, class: RouteClass, claims: Option<&SessionClaims>) -> Access {
        match (class, claims) {
            // Logged-in users have no business on login/signup pages
            (RouteClass::Public, Some(_)) => Access::Redirect {
                to: DASHBOARD_PATH,
                reason: RedirectReason::BounceAuthenticated,
            },
            (RouteClass::Public, None) => Access::Allow,

            (RouteClass::Protected, Some(_)) => Access::Allow,
            (RouteClass::Protected, None) => Access::Redirect {
                to: LOGIN_PATH,
                reason: RedirectReason::NotAuthenticated,
            },

            (RouteClass::Admin, Some(claims)) => {
                if claims.role == Role::Admin {
                    Access::Allow
                } else {
                    Access::Redirect {
                        to: DASHBOARD_PATH,
                        reason: RedirectReason::AdminNotAuthorized,
                    }
                }
            }
            (RouteClass::Admin, None) => Access::Redirect {
                to: LOGIN_PATH,
                reason: RedirectReason::AdminNotAuthenticated,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Role) -> SessionClaims {
        SessionClaims {
            user_id: "1".to_string(),
            role,
            session_start: 1_700_000_000,
            iat: 1_700_000_000,
            exp: 1_700_000_900,
        }
    }

    #[test]
    fn test_classification() {
        let table = RouteTable::default();

        assert_eq!(table.classify("/"), RouteClass::Public);
        assert_eq!(table.classify("/login"), RouteClass::Public);
        assert_eq!(table.classify("/signup"), RouteClass::Public);

        assert_eq!(table.classify("/admin"), RouteClass::Admin);
        assert_eq!(table.classify("/api/users"), RouteClass::Admin);
        assert_eq!(table.classify("/api/users/3"), RouteClass::Admin);

        assert_eq!(table.classify("/dashboard"), RouteClass::Protected);
        assert_eq!(table.classify("/api/invoices"), RouteClass::Protected);
        // Segment boundaries matter
        assert_eq!(table.classify("/api/users-export"), RouteClass::Protected);
        assert_eq!(table.classify("/loginx"), RouteClass::Protected);
    }

    #[test]
    fn test_public_bounces_authenticated_users() {
        let table = RouteTable::default();
        let c = claims(Role::User);

        assert_eq!(
            table.authorize(RouteClass::Public, Some(&c)),
            Access::Redirect {
                to: DASHBOARD_PATH,
                reason: RedirectReason::BounceAuthenticated
            }
        );
        assert_eq!(table.authorize(RouteClass::Public, None), Access::Allow);
    }

    #[test]
    fn test_protected_requires_session() {
        let table = RouteTable::default();
        let c = claims(Role::Guest);

        assert_eq!(table.authorize(RouteClass::Protected, Some(&c)), Access::Allow);
        assert_eq!(
            table.authorize(RouteClass::Protected, None),
            Access::Redirect {
                to: LOGIN_PATH,
                reason: RedirectReason::NotAuthenticated
            }
        );
    }

    #[test]
    fn test_admin_requires_admin_role() {
        let table = RouteTable::default();

        assert_eq!(
            table.authorize(RouteClass::Admin, Some(&claims(Role::Admin))),
            Access::Allow
        );
        assert_eq!(
            table.authorize(RouteClass::Admin, Some(&claims(Role::User))),
            Access::Redirect {
                to: DASHBOARD_PATH,
                reason: RedirectReason::AdminNotAuthorized
            }
        );
        assert_eq!(
            table.authorize(RouteClass::Admin, None),
            Access::Redirect {
                to: LOGIN_PATH,
                reason: RedirectReason::AdminNotAuthenticated
            }
        );
    }

    #[test]
    fn test_redirect_reason_codes() {
        assert_eq!(
            RedirectReason::BounceAuthenticated.as_str(),
            "public.bounce_authenticated"
        );
        assert_eq!(
            RedirectReason::NotAuthenticated.as_str(),
            "protected.not_authenticated"
        );
        assert_eq!(
            RedirectReason::AdminNotAuthenticated.as_str(),
            "admin.not_authenticated"
        );
        assert_eq!(
            RedirectReason::AdminNotAuthorized.as_str(),
            "admin.not_authorized"
        );
    }
}
