//! Authentication routes

use axum::{
    extract::State,
    http::StatusCode,
    response::Redirect,
    routing::post,
    Json, Router,
};
use axum_extra::extract::CookieJar;
use tally_auth::{SessionJar, Signup, LOGIN_PATH};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{LoginRequest, SessionResponse, SignupRequest};

/// POST /login
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), ApiError> {
    let mut cookies = SessionJar::new(jar);
    let user = state
        .auth
        .login(&request.email, &request.password, &mut cookies)
        .await?;

    Ok((cookies.into_jar(), Json(SessionResponse::from_user(&user))))
}

/// POST /signup
async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<SessionResponse>), ApiError> {
    let mut cookies = SessionJar::new(jar);
    let user = state
        .auth
        .signup(
            Signup {
                email: request.email,
                username: request.username,
                password: request.password,
            },
            &mut cookies,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        cookies.into_jar(),
        Json(SessionResponse::from_user(&user)),
    ))
}

/// POST /logout
async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let mut cookies = SessionJar::new(jar);
    state.auth.logout(&mut cookies);
    (cookies.into_jar(), Redirect::to(LOGIN_PATH))
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/signup", post(signup))
        .route("/logout", post(logout))
}
