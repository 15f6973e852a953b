//! Compact HS256 token codec
//!
//! Tokens have three base64url segments, `header.claims.signature`, where
//! the signature is HMAC-SHA256 over `header.claims` keyed with the shared
//! process secret. Signatures are checked in constant time.

use super::claims::{Claims, Header, ALGORITHM};
use crate::error::{GateError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies tokens with the shared secret
#[derive(Debug)]
pub struct TokenSigner {
    secret: SecretString,
}

impl TokenSigner {
    /// Create a signer; the secret must not be empty
    pub fn new(secret: impl Into<String>) -> Result<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(GateError::Configuration(
                "token secret must not be empty".to_string(),
            ));
        }
        Ok(TokenSigner {
            secret: SecretString::from(secret),
        })
    }

    /// Create a signer from an already wrapped secret
    pub fn from_secret(secret: SecretString) -> Result<Self> {
        if secret.expose_secret().is_empty() {
            return Err(GateError::Configuration(
                "token secret must not be empty".to_string(),
            ));
        }
        Ok(TokenSigner { secret })
    }

    /// Encode and sign claims
    pub fn encode(&self, claims: &Claims) -> Result<String> {
        let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&Header::hs256())?);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
        let signing_input = format!("{header}.{payload}");

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Verify a token and return its claims
    ///
    /// Expiry is not checked here; see [`Claims::is_expired`].
    ///
    /// # Errors
    ///
    /// `TokenInvalid` for any malformed, foreign-algorithm or mis-signed token.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("expected three segments"));
        };

        let decoded_header: Header = decode_segment(header)?;
        if decoded_header.alg != ALGORITHM {
            return Err(invalid("unsupported algorithm"));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| invalid("signature is not base64url"))?;

        let mut mac = self.mac()?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| invalid("signature mismatch"))?;

        decode_segment(payload)
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| GateError::Internal(format!("hmac key rejected: {e}")))
    }
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| invalid("segment is not base64url"))?;
    serde_json::from_slice(&bytes).map_err(|_| invalid("segment is not valid json"))
}

fn invalid(reason: &str) -> GateError {
    debug!("Rejected token: {}", reason);
    GateError::TokenInvalid
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN_TOKEN: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.\
        eyJhdXRoX2xldmVsIjpbImFkbWluIl0sImV4cGlyZXNfYXQiOjE3MDAwMDA2MDB9.\
        0jCIuks5hXqw6JmtXzUsTbvT5HVa2_u6j35JTSIBG8M";

    fn signer() -> TokenSigner {
        TokenSigner::new("xxx").unwrap()
    }

    #[test]
    fn test_encode_known_vector() {
        let claims = Claims::new(vec!["admin".to_string()], 1_700_000_600);
        assert_eq!(signer().encode(&claims).unwrap(), KNOWN_TOKEN);
    }

    #[test]
    fn test_decode_known_vector() {
        let claims = signer().decode(KNOWN_TOKEN).unwrap();
        assert_eq!(claims.auth_level, vec!["admin".to_string()]);
        assert_eq!(claims.expires_at, 1_700_000_600);
    }

    #[test]
    fn test_wrong_secret() {
        let other = TokenSigner::new("yyy").unwrap();
        assert!(matches!(
            other.decode(KNOWN_TOKEN),
            Err(GateError::TokenInvalid)
        ));
    }

    #[test]
    fn test_tampered_claims() {
        let forged_claims =
            URL_SAFE_NO_PAD.encode(br#"{"auth_level":["root"],"expires_at":1700000600}"#);
        let mut parts: Vec<&str> = KNOWN_TOKEN.split('.').collect();
        parts[1] = &forged_claims;
        let forged = parts.join(".");

        assert!(matches!(signer().decode(&forged), Err(GateError::TokenInvalid)));
    }

    #[test]
    fn test_malformed_tokens() {
        let signer = signer();
        for token in [
            "",
            "abc",
            "a.b",
            "a.b.c.d",
            "!!!.???.***",
            "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.bm90IGpzb24.c2ln",
        ] {
            assert!(
                matches!(signer.decode(token), Err(GateError::TokenInvalid)),
                "token {:?} should be invalid",
                token
            );
        }
    }

    #[test]
    fn test_foreign_algorithm_rejected() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(br#"{"auth_level":["admin"],"expires_at":1}"#);
        let token = format!("{header}.{payload}.");
        assert!(matches!(signer().decode(&token), Err(GateError::TokenInvalid)));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            TokenSigner::new(""),
            Err(GateError::Configuration(_))
        ));
    }
}
