//! Signed session tokens, which carry the identity of an authenticated user.
//!
//! Users log in with the external authentication provider, which issues a session token, signed
//! with the application secret shared between the provider and this application. The token is sent
//! by the client with each request in the `X-SESSION-TOKEN` header.
//!
//! Token format: `<base64url(payload json)>.<base64url(HMAC-SHA256 of the first part)>`

use crate::data_store::auth_token::AccessRole;
use crate::data_store::UserId;
use base64::Engine;
use ring::hmac;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

const BASE64: base64::engine::GeneralPurpose = base64::engine::general_purpose::URL_SAFE_NO_PAD;

#[derive(Debug, Clone)]
pub struct SessionToken {
    user_id: UserId,
    role: AccessRole,
    issued_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize, Deserialize)]
struct SessionTokenPayload {
    #[serde(rename = "u")]
    user_id: UserId,
    #[serde(rename = "r")]
    role: i32,
    #[serde(rename = "t")]
    issued_at: i64,
}

impl SessionToken {
    pub fn new(user_id: UserId, role: AccessRole) -> Self {
        SessionToken {
            user_id,
            role,
            issued_at: chrono::Utc::now(),
        }
    }

    /// Parse and verify a session token string.
    ///
    /// Fails if the token is malformed, its signature does not match the `secret` or it has been
    /// issued more than `max_age` ago.
    pub fn from_string(
        data: &str,
        secret: &str,
        max_age: std::time::Duration,
    ) -> Result<Self, SessionError> {
        let (payload_part, signature_part) = data
            .split_once('.')
            .ok_or(SessionError::InvalidTokenFormat)?;
        let signature = BASE64
            .decode(signature_part)
            .map_err(|_| SessionError::InvalidTokenFormat)?;
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        hmac::verify(&key, payload_part.as_bytes(), &signature)
            .map_err(|_| SessionError::SignatureVerificationFailed)?;

        let payload: SessionTokenPayload = serde_json::from_slice(
            &BASE64
                .decode(payload_part)
                .map_err(|_| SessionError::InvalidTokenFormat)?,
        )
        .map_err(|_| SessionError::InvalidTokenFormat)?;
        let issued_at = chrono::DateTime::from_timestamp(payload.issued_at, 0)
            .ok_or(SessionError::InvalidTokenFormat)?;
        let max_age =
            chrono::TimeDelta::from_std(max_age).map_err(|_| SessionError::InvalidTokenFormat)?;
        if issued_at + max_age < chrono::Utc::now() {
            return Err(SessionError::ExpiredToken);
        }

        Ok(SessionToken {
            user_id: payload.user_id,
            role: payload
                .role
                .try_into()
                .map_err(|_| SessionError::InvalidTokenFormat)?,
            issued_at,
        })
    }

    pub fn as_string(&self, secret: &str) -> String {
        let payload = SessionTokenPayload {
            user_id: self.user_id,
            role: self.role as i32,
            issued_at: self.issued_at.timestamp(),
        };
        // A uuid and two integers always serialize to JSON
        let payload_part = BASE64.encode(
            serde_json::to_vec(&payload).expect("Session token payload should be serializable"),
        );
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        let signature = hmac::sign(&key, payload_part.as_bytes());
        format!("{}.{}", payload_part, BASE64.encode(signature.as_ref()))
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn role(&self) -> AccessRole {
        self.role
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    InvalidTokenFormat,
    SignatureVerificationFailed,
    ExpiredToken,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::InvalidTokenFormat => f.write_str("Invalid session token format"),
            SessionError::SignatureVerificationFailed => {
                f.write_str("Session token signature is not valid")
            }
            SessionError::ExpiredToken => f.write_str("Session token has expired"),
        }
    }
}
