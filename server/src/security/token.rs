//! Stateless access tokens.
//!
//! A token is an HS256 JWS over [`JwtClaims`].  Verification needs only the
//! signing secret; there is no session table and no revocation list.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error};

use shared::types::{JwtClaims, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The caller presented a token that must not be trusted.
    #[error("token rejected: {0}")]
    Unauthorized(&'static str),

    /// The token verified but its claims are not what this server issues.
    #[error("token claims malformed: {0}")]
    Internal(String),
}

/// Who a verified request is acting as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub admin: bool,
}

pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        // Expiry and claim types are checked by hand in `parse` so that each
        // failure maps to the right error class.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign a 24h token for `subject`.  Identical inputs give an identical
    /// token.
    pub fn issue(
        &self,
        subject: UserId,
        admin: bool,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = JwtClaims::new(subject, admin, now.timestamp());

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            error!("Failed to sign token for {}: {}", subject, e);
            TokenError::Internal(format!("signing failed: {e}"))
        })
    }

    /// Verify `token` and extract the identity it carries.
    ///
    /// Checks run in a fixed order and stop at the first failure:
    /// structure and signature (`Unauthorized`), then claim presence and
    /// types (`Internal`), then expiry against `now` (`Unauthorized`).
    pub fn parse(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TokenError> {
        let data = decode::<Map<String, Value>>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::Unauthorized("invalid signature"),
                _ => {
                    debug!("Undecodable token: {}", e);
                    TokenError::Unauthorized("malformed token")
                }
            })?;
        let claims = data.claims;

        let user_id: UserId = string_claim(&claims, "sub")?
            .parse()
            .map_err(|_| TokenError::Internal("sub is not a user id".into()))?;

        let admin = claims
            .get("adm")
            .and_then(Value::as_bool)
            .ok_or_else(|| TokenError::Internal("adm missing or not a bool".into()))?;

        let exp: i64 = string_claim(&claims, "exp")?
            .parse()
            .map_err(|_| TokenError::Internal("exp is not a decimal timestamp".into()))?;

        if exp < now.timestamp() {
            return Err(TokenError::Unauthorized("token expired"));
        }

        Ok(Identity { user_id, admin })
    }
}

fn string_claim<'a>(claims: &'a Map<String, Value>, name: &str) -> Result<&'a str, TokenError> {
    claims
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| TokenError::Internal(format!("{name} missing or not a string")))
}
