//! Token header and claims

use serde::{Deserialize, Serialize};

/// The only signing algorithm accepted
pub const ALGORITHM: &str = "HS256";

/// JOSE header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

impl Header {
    pub fn hs256() -> Self {
        Header {
            alg: ALGORITHM.to_string(),
            typ: Some("JWT".to_string()),
        }
    }
}

/// Signed token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Levels of the user the token was issued to
    pub auth_level: Vec<String>,

    /// Absolute expiry, Unix epoch seconds
    #[serde(alias = "max_age")]
    pub expires_at: i64,
}

impl Claims {
    pub fn new(auth_level: Vec<String>, expires_at: i64) -> Self {
        Claims {
            auth_level,
            expires_at,
        }
    }

    /// Expired strictly after `expires_at`
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at
    }
}
