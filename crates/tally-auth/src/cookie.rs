//! Cookie transport port
//!
//! The policy layer talks to cookies through [`CookieTransport`] so it
//! stays agnostic of the HTTP framework's cookie jar. [`SessionJar`]
//! adapts axum-extra's `CookieJar` to the port.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// SameSite attribute values recognized by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSitePolicy {
    Strict,
    Lax,
    None,
}

/// The exact set of cookie attributes this application sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub http_only: bool,
    pub path: String,
    pub same_site: SameSitePolicy,
    pub max_age_secs: i64,
}

impl CookieOptions {
    /// Attributes for the session cookie. HttpOnly and strict SameSite
    /// are fixed policy, not per-call choices.
    pub fn session(max_age_secs: i64) -> Self {
        Self {
            http_only: true,
            path: "/".to_string(),
            same_site: SameSitePolicy::Strict,
            max_age_secs,
        }
    }
}

/// Small port over cookie get/set/delete
pub trait CookieTransport: Send {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&mut self, name: &str, value: String, options: CookieOptions);
    fn delete(&mut self, name: &str);
}

/// Adapter over axum-extra's `CookieJar`
#[derive(Default, Clone)]
pub struct SessionJar {
    jar: CookieJar,
}

impl SessionJar {
    pub fn new(jar: CookieJar) -> Self {
        Self { jar }
    }

    /// Hand the jar back for inclusion in an axum response
    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

impl CookieTransport for SessionJar {
    fn get(&self, name: &str) -> Option<String> {
        self.jar.get(name).map(|c| c.value().to_string())
    }

    fn set(&mut self, name: &str, value: String, options: CookieOptions) {
        let cookie = Cookie::build((name.to_string(), value))
            .http_only(options.http_only)
            .path(options.path)
            .same_site(match options.same_site {
                SameSitePolicy::Strict => SameSite::Strict,
                SameSitePolicy::Lax => SameSite::Lax,
                SameSitePolicy::None => SameSite::None,
            })
            .max_age(time::Duration::seconds(options.max_age_secs))
            .build();

        let jar = std::mem::take(&mut self.jar);
        self.jar = jar.add(cookie);
    }

    fn delete(&mut self, name: &str) {
        let removal = Cookie::build((name.to_string(), String::new()))
            .path("/")
            .build();
        let jar = std::mem::take(&mut self.jar);
        self.jar = jar.remove(removal);
    }
}
