//! Application state

use std::sync::Arc;

use tally_auth::{AuthService, PasswordHasher, RouteTable, SessionCodec, SessionPolicy};
use tally_db::Database;

/// Application state shared across handlers
///
/// Everything here is constructed once at startup from the immutable
/// configuration snapshot and never mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub auth: AuthService,
    pub hasher: PasswordHasher,
    pub codec: Arc<SessionCodec>,
    pub policy: SessionPolicy,
    pub routes: Arc<RouteTable>,
}

impl AppState {
    pub fn new(
        db: Database,
        auth: AuthService,
        hasher: PasswordHasher,
        codec: Arc<SessionCodec>,
        policy: SessionPolicy,
        routes: Arc<RouteTable>,
    ) -> Self {
        Self {
            db,
            auth,
            hasher,
            codec,
            policy,
            routes,
        }
    }
}
