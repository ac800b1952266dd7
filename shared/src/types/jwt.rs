use serde::{Deserialize, Serialize};

use super::ids::UserId;

/// Value of both the `iss` and `aud` claims.
pub const ISSUER: &str = "foodie";

/// Access tokens are valid for 24 hours from issue.
pub const TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// Claims embedded in every access token.
///
/// The token is self-contained: verifying the HMAC signature and `exp` is
/// enough to trust `sub` and `adm` without any server-side session.  `iat`
/// and `exp` are carried as decimal strings of Unix seconds.
///
/// `adm` is a snapshot taken at issue time.  A user promoted or demoted
/// afterwards keeps the old flag until they log in again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject: the user id.
    pub sub: String,

    /// Administrator flag.
    pub adm: bool,

    pub iat: String,
    pub exp: String,
    pub iss: String,
    pub aud: String,
}

impl JwtClaims {
    pub fn new(subject: UserId, admin: bool, issued_at: i64) -> Self {
        Self {
            sub: subject.to_string(),
            adm: admin,
            iat: issued_at.to_string(),
            exp: (issued_at + TOKEN_LIFETIME_SECS).to_string(),
            iss: ISSUER.to_string(),
            aud: ISSUER.to_string(),
        }
    }
}
