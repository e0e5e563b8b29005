//! Session token codec
//!
//! Sessions are a single signed JWT carried in a cookie and validated
//! statelessly. The claim shape is fixed: `iat`/`exp` are the standard
//! registered claims, `userId`/`role`/`sessionStart` are custom ones.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tally_db::Role;
use tracing::debug;

use crate::error::AuthError;

/// Minimum length of the symmetric signing key
pub const MIN_SECRET_BYTES: usize = 32;

/// Tolerated clock skew when verifying `exp`; issuance uses none
const CLOCK_SKEW_LEEWAY_SECS: u64 = 5;

/// Claims embedded in a session token
///
/// Immutable once issued; rotation produces a new value, never a
/// mutation of an existing one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub role: Role,
    /// Epoch seconds of the original login; survives rotations
    #[serde(rename = "sessionStart")]
    pub session_start: i64,
    /// Epoch seconds this particular token was signed
    pub iat: i64,
    /// Epoch seconds this token lapses
    pub exp: i64,
}

impl SessionClaims {
    /// The user id parsed back to its numeric form.
    ///
    /// Decode guarantees this parses, so `None` only occurs for claims
    /// constructed outside the codec.
    pub fn user_id_num(&self) -> Option<i64> {
        self.user_id.parse().ok()
    }
}

/// A freshly signed token together with its claims
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub claims: SessionClaims,
}

/// Outcome of decoding the session cookie
///
/// `Invalid` covers bad signature, bad shape, and expiry alike; it is
/// never trusted for role decisions and the caller is expected to clear
/// the cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Missing,
    Invalid,
    Active(SessionClaims),
}

impl SessionState {
    /// Whether the caller should delete the session cookie
    pub fn needs_cleanup(&self) -> bool {
        matches!(self, SessionState::Invalid)
    }

    pub fn claims(&self) -> Option<&SessionClaims> {
        match self {
            SessionState::Active(claims) => Some(claims),
            _ => None,
        }
    }
}

/// Signs and verifies session tokens with a server-held symmetric key
#[derive(Clone)]
pub struct SessionCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_duration_secs: i64,
    max_session_secs: i64,
}

impl SessionCodec {
    /// Create a codec.
    ///
    /// A key shorter than [`MIN_SECRET_BYTES`] is refused so a
    /// misconfigured process fails closed before serving any request.
    pub fn new(
        secret: &[u8],
        session_duration_secs: i64,
        max_session_secs: i64,
    ) -> Result<Self, AuthError> {
        if secret.len() < MIN_SECRET_BYTES {
            return Err(AuthError::Infrastructure(format!(
                "session signing key must be at least {} bytes, got {}",
                MIN_SECRET_BYTES,
                secret.len()
            )));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            session_duration_secs,
            max_session_secs,
        })
    }

    /// Session duration applied to fresh and rotated tokens
    pub fn session_duration_secs(&self) -> i64 {
        self.session_duration_secs
    }

    /// Issue a fresh session at login: `sessionStart = iat = now`
    pub fn issue(&self, user_id: i64, role: Role, now: i64) -> Result<IssuedSession, AuthError> {
        let claims = SessionClaims {
            user_id: user_id.to_string(),
            role,
            session_start: now,
            iat: now,
            exp: now + self.session_duration_secs,
        };
        self.sign(claims)
    }

    /// Re-issue a rotated token: same identity and `sessionStart`, new
    /// `iat` and the expiry the rotation policy decided on.
    pub fn reissue(
        &self,
        claims: &SessionClaims,
        now: i64,
        expires_at: i64,
    ) -> Result<IssuedSession, AuthError> {
        let claims = SessionClaims {
            user_id: claims.user_id.clone(),
            role: claims.role,
            session_start: claims.session_start,
            iat: now,
            exp: expires_at,
        };
        self.sign(claims)
    }

    fn sign(&self, claims: SessionClaims) -> Result<IssuedSession, AuthError> {
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(IssuedSession { token, claims })
    }

    /// Verify and decode a session token.
    ///
    /// Checks the signature and `exp` (with skew leeway), then validates
    /// the claim shape: the user id must parse, timestamps must be
    /// ordered, and the expiry may never sit past the absolute session
    /// lifetime measured from `sessionStart`.
    pub fn decode(&self, token: Option<&str>) -> SessionState {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return SessionState::Missing,
        };

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY_SECS;

        let claims = match decode::<SessionClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => data.claims,
            Err(err) => {
                debug!("Session token rejected: {}", err);
                return SessionState::Invalid;
            }
        };

        if claims.user_id.is_empty() || claims.user_id.parse::<i64>().is_err() {
            debug!("Session token rejected: malformed user id");
            return SessionState::Invalid;
        }
        if claims.session_start > claims.exp {
            debug!("Session token rejected: start past expiry");
            return SessionState::Invalid;
        }
        if claims.exp > claims.session_start + self.max_session_secs {
            debug!("Session token rejected: expiry past absolute lifetime");
            return SessionState::Invalid;
        }

        SessionState::Active(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";
    const DURATION: i64 = 900;
    const MAX_SESSION: i64 = 2_592_000;

    fn codec() -> SessionCodec {
        SessionCodec::new(SECRET, DURATION, MAX_SESSION).unwrap()
    }

    #[test]
    fn test_short_secret_is_refused() {
        let result = SessionCodec::new(b"too-short", DURATION, MAX_SESSION);
        assert!(matches!(result, Err(AuthError::Infrastructure(_))));
    }

    #[test]
    fn test_issue_decode_round_trip() {
        let codec = codec();
        let now = Utc::now().timestamp();
        let issued = codec.issue(42, Role::User, now).unwrap();

        let state = codec.decode(Some(&issued.token));
        let claims = state.claims().expect("token should decode");
        assert_eq!(claims.user_id, "42");
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.session_start, now);
        // Fresh sessions start the clock at issuance
        assert_eq!(claims.iat, claims.session_start);
        assert!(claims.session_start <= claims.exp);
        assert_eq!(claims.exp, now + DURATION);
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let codec = codec();
        let now = Utc::now().timestamp();
        let issued = codec.issue(7, Role::Admin, now).unwrap();

        // Flip one character inside the payload segment
        let payload_start = issued.token.find('.').unwrap() + 1;
        let mut bytes = issued.token.into_bytes();
        let i = payload_start + 2;
        bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        assert_eq!(codec.decode(Some(&tampered)), SessionState::Invalid);
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let codec = codec();
        // Issued far enough in the past that exp is beyond the leeway
        let now = Utc::now().timestamp();
        let issued = codec.issue(1, Role::User, now - DURATION - 60).unwrap();

        assert_eq!(codec.decode(Some(&issued.token)), SessionState::Invalid);
    }

    #[test]
    fn test_wrong_key_is_invalid() {
        let codec = codec();
        let other = SessionCodec::new(b"ffffffffffffffffffffffffffffffff", DURATION, MAX_SESSION)
            .unwrap();
        let now = Utc::now().timestamp();
        let issued = other.issue(1, Role::User, now).unwrap();

        assert_eq!(codec.decode(Some(&issued.token)), SessionState::Invalid);
    }

    #[test]
    fn test_missing_token() {
        let codec = codec();
        assert_eq!(codec.decode(None), SessionState::Missing);
        assert_eq!(codec.decode(Some("")), SessionState::Missing);
        assert!(!codec.decode(None).needs_cleanup());
        assert!(codec.decode(Some("garbage")).needs_cleanup());
    }

    #[test]
    fn test_expiry_past_absolute_lifetime_is_invalid() {
        let codec = codec();
        let now = Utc::now().timestamp();
        // A signature-valid token whose shape violates the lifetime cap
        let forged = SessionClaims {
            user_id: "1".to_string(),
            role: Role::User,
            session_start: now - MAX_SESSION - 100,
            iat: now,
            exp: now + DURATION,
        };
        let issued = codec.reissue(&forged, now, forged.exp).unwrap();

        assert_eq!(codec.decode(Some(&issued.token)), SessionState::Invalid);
    }

    #[test]
    fn test_rotation_preserves_session_start() {
        let codec = codec();
        let now = Utc::now().timestamp();
        let first = codec.issue(9, Role::Guest, now).unwrap();

        let later = now + 100;
        let rotated = codec
            .reissue(&first.claims, later, later + DURATION)
            .unwrap();
        let state = codec.decode(Some(&rotated.token));
        let claims = state.claims().expect("rotated token should decode");

        assert_eq!(claims.session_start, now);
        assert_eq!(claims.iat, later);
        assert_eq!(claims.exp, later + DURATION);
        assert_eq!(claims.user_id, "9");
        assert_eq!(claims.role, Role::Guest);
    }
}
