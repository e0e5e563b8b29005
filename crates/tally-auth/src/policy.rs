//! Session rotation policy
//!
//! A session is `Fresh` until its remaining time drops under the refresh
//! threshold, `NeedsRotation` from then until the absolute lifetime cap,
//! and `Expired` past the cap or its own expiry. Transitions are driven
//! purely by wall-clock comparison on each request; there is no timer.

use crate::token::SessionClaims;

/// What to do with a decoded session on this request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationDecision {
    /// Re-issue with this expiry (already capped at the absolute lifetime)
    Rotate { expires_at: i64 },
    /// Keep the current token
    NotDue { time_left_secs: i64 },
    /// Session is over; treat as unauthenticated
    Expired { age_secs: i64, max_secs: i64 },
}

/// Wall-clock thresholds for session rotation
#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    session_duration_secs: i64,
    refresh_threshold_secs: i64,
    max_session_secs: i64,
}

impl SessionPolicy {
    pub fn new(
        session_duration_secs: i64,
        refresh_threshold_secs: i64,
        max_session_secs: i64,
    ) -> Self {
        Self {
            session_duration_secs,
            refresh_threshold_secs,
            max_session_secs,
        }
    }

    /// Decide whether a session should be rotated at time `now`.
    ///
    /// Rotation never pushes the expiry past
    /// `session_start + max_session`, so the total session age is bounded
    /// no matter how active the user is. The absolute cap wins even when
    /// the token's own expiry has not been reached yet.
    pub fn evaluate(&self, claims: &SessionClaims, now: i64) -> RotationDecision {
        let age_secs = now - claims.session_start;

        if now > claims.exp || age_secs >= self.max_session_secs {
            return RotationDecision::Expired {
                age_secs,
                max_secs: self.max_session_secs,
            };
        }

        if claims.exp - now < self.refresh_threshold_secs {
            let expires_at =
                (now + self.session_duration_secs).min(claims.session_start + self.max_session_secs);
            return RotationDecision::Rotate { expires_at };
        }

        RotationDecision::NotDue {
            time_left_secs: claims.exp - now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_db::Role;

    const DURATION: i64 = 900;
    const THRESHOLD: i64 = 120;
    const MAX_SESSION: i64 = 2_592_000;

    fn policy() -> SessionPolicy {
        SessionPolicy::new(DURATION, THRESHOLD, MAX_SESSION)
    }

    fn claims(session_start: i64, iat: i64, exp: i64) -> SessionClaims {
        SessionClaims {
            user_id: "u1".to_string(),
            role: Role::User,
            session_start,
            iat,
            exp,
        }
    }

    #[test]
    fn test_not_due_midway() {
        let t = 1_700_000_000;
        let c = claims(t, t, t + DURATION);

        let decision = policy().evaluate(&c, t + 100);
        assert_eq!(
            decision,
            RotationDecision::NotDue {
                time_left_secs: 800
            }
        );
    }

    #[test]
    fn test_rotation_inside_refresh_window() {
        let t = 1_700_000_000;
        let c = claims(t, t, t + DURATION);

        // 50 seconds left, under the 120 second threshold
        let decision = policy().evaluate(&c, t + 850);
        assert_eq!(
            decision,
            RotationDecision::Rotate {
                expires_at: t + 850 + DURATION
            }
        );
    }

    #[test]
    fn test_rotation_is_capped_at_absolute_lifetime() {
        let t = 1_700_000_000;
        // Session nearly exhausted: 60 seconds of absolute lifetime left
        let now = t + MAX_SESSION - 60;
        let c = claims(t, now - 800, now + 50);

        match policy().evaluate(&c, now) {
            RotationDecision::Rotate { expires_at } => {
                assert_eq!(expires_at, t + MAX_SESSION);
                assert!(expires_at <= c.session_start + MAX_SESSION);
            }
            other => panic!("expected rotation, got {:?}", other),
        }
    }

    #[test]
    fn test_expired_by_token_expiry() {
        let t = 1_700_000_000;
        let c = claims(t, t, t + DURATION);

        let decision = policy().evaluate(&c, t + DURATION + 1);
        assert!(matches!(decision, RotationDecision::Expired { .. }));
    }

    #[test]
    fn test_absolute_cap_wins_over_unexpired_token() {
        let t = 1_700_000_000;
        // Expiry still in the future, but the session is at its cap
        let now = t + MAX_SESSION;
        let c = claims(t, now - 400, now + 500);

        let decision = policy().evaluate(&c, now);
        assert_eq!(
            decision,
            RotationDecision::Expired {
                age_secs: MAX_SESSION,
                max_secs: MAX_SESSION
            }
        );
    }

    #[test]
    fn test_rotation_never_exceeds_cap_across_rotations() {
        let t = 1_700_000_000;
        let mut c = claims(t, t, t + DURATION);
        let mut now = t;

        // Ride the refresh window repeatedly; the expiry must stay bounded
        for _ in 0..100 {
            now = c.exp - 50;
            match policy().evaluate(&c, now) {
                RotationDecision::Rotate { expires_at } => {
                    assert!(expires_at <= t + MAX_SESSION);
                    c = claims(t, now, expires_at);
                }
                RotationDecision::Expired { .. } => return,
                RotationDecision::NotDue { .. } => panic!("50s left must be inside the window"),
            }
        }
    }
}
