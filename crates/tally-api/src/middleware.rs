//! Per-request session gate and auth extractors
//!
//! The gate runs once for every application route before any handler:
//! it decodes the session cookie, applies the rotation policy, and
//! enforces the route table's access rules. Handlers downstream see the
//! authenticated user through request extensions.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use tally_auth::{
    Access, CookieOptions, CookieTransport, RotationDecision, SessionClaims, SessionJar,
    SessionState, SESSION_COOKIE,
};
use tally_db::Role;
use tracing::{debug, error};

use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated user attached to a request by the session gate
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub role: Role,
}

impl CurrentUser {
    fn from_claims(claims: &SessionClaims) -> Option<Self> {
        // decode guarantees the id parses
        claims.user_id_num().map(|id| Self {
            id,
            role: claims.role,
        })
    }
}

/// Session gate middleware.
///
/// Classification, decoding, rotation, and the access decision all
/// happen here, once per request, before any page logic executes.
pub async fn session_gate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let mut cookies = SessionJar::new(jar);
    let now = Utc::now().timestamp();

    let token = cookies.get(SESSION_COOKIE);
    let decoded = state.codec.decode(token.as_deref());
    if decoded.needs_cleanup() {
        cookies.delete(SESSION_COOKIE);
    }

    let claims = match decoded {
        SessionState::Active(claims) => match state.policy.evaluate(&claims, now) {
            RotationDecision::Expired { age_secs, max_secs } => {
                debug!("Session expired (age {}s of {}s)", age_secs, max_secs);
                cookies.delete(SESSION_COOKIE);
                None
            }
            RotationDecision::Rotate { expires_at } => {
                match state.codec.reissue(&claims, now, expires_at) {
                    Ok(issued) => {
                        cookies.set(
                            SESSION_COOKIE,
                            issued.token.clone(),
                            CookieOptions::session(expires_at - now),
                        );
                        debug!("Session rotated for user {}", issued.claims.user_id);
                        Some(issued.claims)
                    }
                    Err(err) => {
                        // Keep the still-valid token rather than dropping the session
                        error!("Session rotation failed: {}", err);
                        Some(claims)
                    }
                }
            }
            RotationDecision::NotDue { .. } => Some(claims),
        },
        _ => None,
    };

    let path = request.uri().path();
    let class = state.routes.classify(path);
    match state.routes.authorize(class, claims.as_ref()) {
        Access::Redirect { to, reason } => {
            debug!("Redirecting {}: {}", path, reason.as_str());
            (cookies.into_jar(), Redirect::to(to)).into_response()
        }
        Access::Allow => {
            if let Some(user) = claims.as_ref().and_then(CurrentUser::from_claims) {
                request.extensions_mut().insert(user);
            }
            let response = next.run(request).await;
            if response.headers().contains_key(header::SET_COOKIE) {
                // The handler managed the session cookie itself (login,
                // signup, logout); it is the only cookie this app writes,
                // so the gate's jar must not override it.
                return response;
            }
            (cookies.into_jar(), response).into_response()
        }
    }
}

// ==================== Auth Extractors ====================

/// Extractor for the authenticated user (required)
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(RequireAuth)
            .ok_or(ApiError::Unauthorized)
    }
}

/// Extractor for an admin user (required)
pub struct RequireAdmin(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;

        if !user.role.is_admin() {
            return Err(ApiError::Forbidden);
        }

        Ok(RequireAdmin(user))
    }
}

#[cfg(test)]
mod tests {
    use crate::routes::create_router;
    use crate::state::AppState;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use std::sync::Arc;
    use tally_auth::{AuthService, PasswordHasher, RouteTable, SessionCodec, SessionPolicy};
    use tally_db::Database;
    use tower::ServiceExt;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    async fn test_app() -> (Router, tempfile::NamedTempFile) {
        let file = tempfile::NamedTempFile::new().unwrap();
        let url = format!("sqlite:{}?mode=rwc", file.path().display());
        let db = Database::new(&url).await.unwrap();

        let hasher = PasswordHasher::new(1).unwrap();
        let codec = Arc::new(SessionCodec::new(SECRET, 900, 2_592_000).unwrap());
        let policy = SessionPolicy::new(900, 120, 2_592_000);
        let auth = AuthService::new(db.clone(), hasher.clone(), codec.clone());
        let state = AppState::new(
            db,
            auth,
            hasher,
            codec,
            policy,
            Arc::new(RouteTable::default()),
        );
        (create_router(state), file)
    }

    /// The `session=<token>` pair from a response's Set-Cookie header
    fn session_cookie(response: &axum::response::Response) -> String {
        response
            .headers()
            .get(header::SET_COOKIE)
            .expect("response should set a cookie")
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    /// Sign up a regular user and return their session cookie
    async fn signup(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/signup")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"email":"ada@example.com","username":"ada","password":"correct-horse"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        session_cookie(&response)
    }

    #[tokio::test]
    async fn test_protected_route_redirects_without_session() {
        let (app, _file) = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/dashboard")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
    }

    #[tokio::test]
    async fn test_login_then_protected_route_is_allowed() {
        let (app, _file) = test_app().await;
        let cookie = signup(&app).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/dashboard")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_route_redirects_regular_users() {
        let (app, _file) = test_app().await;
        let cookie = signup(&app).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/users")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/dashboard"
        );
    }

    #[tokio::test]
    async fn test_public_route_bounces_authenticated_users() {
        let (app, _file) = test_app().await;
        let cookie = signup(&app).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/dashboard"
        );
    }

    #[tokio::test]
    async fn test_logout_drops_the_session() {
        let (app, _file) = test_app().await;
        let cookie = signup(&app).await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/logout")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
        // The handler answers with a removal cookie
        let removal = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(removal.starts_with("session="));
        assert!(removal.contains("Max-Age=0"));

        // Without the cookie, protected routes redirect again
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/dashboard")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_garbage_cookie_is_cleaned_up_and_redirected() {
        let (app, _file) = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/dashboard")
                    .header(header::COOKIE, "session=garbage")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
        let removal = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(removal.starts_with("session="));
        assert!(removal.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_health_stays_outside_the_gate() {
        let (app, _file) = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_bad_credentials_get_the_generic_error() {
        let (app, _file) = test_app().await;
        signup(&app).await;

        for body in [
            r#"{"email":"ada@example.com","password":"wrong-password"}"#,
            r#"{"email":"nobody@example.com","password":"correct-horse"}"#,
        ] {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/login")
                        .header(header::CONTENT_TYPE, "application/json")
                        .body(Body::from(body))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }
}
