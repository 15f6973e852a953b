//! Token validation and restriction enforcement
//!
//! Checks run in a fixed order:
//! 1. token presence
//! 2. signature
//! 3. restriction lookup and level intersection
//! 4. expiry
//!
//! A restricted pair therefore reports `AccessDenied` before `TokenExpired`.

use crate::core::clock::Clock;
use crate::core::credentials::CredentialStore;
use crate::core::token::TokenSigner;
use crate::error::{GateError, Result};
use std::sync::Arc;
use tracing::{debug, warn};

/// Authorization gate for protected operations
#[derive(Clone)]
pub struct AuthorizationGate {
    store: Arc<CredentialStore>,
    signer: Arc<TokenSigner>,
    clock: Arc<dyn Clock>,
}

impl AuthorizationGate {
    pub fn new(store: Arc<CredentialStore>, signer: Arc<TokenSigner>, clock: Arc<dyn Clock>) -> Self {
        AuthorizationGate {
            store,
            signer,
            clock,
        }
    }

    /// Authorize `token` for `action` on `resource`
    ///
    /// # Errors
    ///
    /// - `TokenMissing` when no token (or an empty one) is given
    /// - `TokenInvalid` when the token is malformed or mis-signed
    /// - `AccessDenied` when a restriction exists and none of the token's
    ///   levels is allowed
    /// - `TokenExpired` when the token is past its expiry
    pub fn authorize(&self, token: Option<&str>, resource: &str, action: &str) -> Result<bool> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(GateError::TokenMissing)?;

        let claims = self.signer.decode(token)?;

        if let Some(restriction) = self.store.get_restriction(resource, action) {
            if !restriction.permits(&claims.auth_level) {
                warn!("Access denied on '{}'/'{}'", resource, action);
                return Err(GateError::AccessDenied);
            }
        }

        if claims.is_expired(self.clock.now()) {
            return Err(GateError::TokenExpired);
        }

        debug!("Authorized '{}'/'{}'", resource, action);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::credentials::{Restriction, StoreOptions, UserSettings};
    use crate::core::token::{Claims, TokenIssuer};

    struct Fixture {
        gate: AuthorizationGate,
        issuer: TokenIssuer,
        signer: Arc<TokenSigner>,
        clock: Arc<ManualClock>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(
            CredentialStore::initialize(StoreOptions {
                users: Some(vec![
                    UserSettings::new("admin", "admin", &["super user"], 600),
                    UserSettings::new("admin2", "admin2", &["admin"], 1),
                ]),
                restrictions: Some(vec![Restriction::new(
                    "topics",
                    "reader",
                    &["admin", "super admin"],
                )]),
                ..StoreOptions::default()
            })
            .unwrap(),
        );
        let signer = Arc::new(TokenSigner::new("xxx").unwrap());
        let clock = Arc::new(ManualClock::new(10_000));
        Fixture {
            gate: AuthorizationGate::new(Arc::clone(&store), Arc::clone(&signer), clock.clone()),
            issuer: TokenIssuer::new(store, Arc::clone(&signer), clock.clone()),
            signer,
            clock,
        }
    }

    #[test]
    fn test_missing_token() {
        let f = fixture();
        assert!(matches!(
            f.gate.authorize(None, "topics", "reader"),
            Err(GateError::TokenMissing)
        ));
        assert!(matches!(
            f.gate.authorize(Some(""), "topics", "reader"),
            Err(GateError::TokenMissing)
        ));
    }

    #[test]
    fn test_invalid_token() {
        let f = fixture();
        assert!(matches!(
            f.gate.authorize(Some("not-a-token"), "topics", "reader"),
            Err(GateError::TokenInvalid)
        ));
    }

    #[test]
    fn test_allowed_level() {
        let f = fixture();
        let token = f.issuer.authenticate("admin2", "admin2").unwrap().token;
        assert!(f.gate.authorize(Some(&token), "topics", "reader").unwrap());
    }

    #[test]
    fn test_denied_level() {
        let f = fixture();
        let token = f.issuer.authenticate("admin", "admin").unwrap().token;
        assert!(matches!(
            f.gate.authorize(Some(&token), "topics", "reader"),
            Err(GateError::AccessDenied)
        ));
    }

    #[test]
    fn test_unrestricted_pair_skips_levels() {
        let f = fixture();
        let token = f.issuer.authenticate("admin", "admin").unwrap().token;
        assert!(f.gate.authorize(Some(&token), "topics", "writer").unwrap());
        assert!(f.gate.authorize(Some(&token), "other", "reader").unwrap());
    }

    #[test]
    fn test_expired_token() {
        let f = fixture();
        let token = f.issuer.authenticate("admin2", "admin2").unwrap().token;

        f.clock.advance(1);
        assert!(f.gate.authorize(Some(&token), "topics", "reader").unwrap());

        f.clock.advance(1);
        assert!(matches!(
            f.gate.authorize(Some(&token), "topics", "reader"),
            Err(GateError::TokenExpired)
        ));
        assert!(matches!(
            f.gate.authorize(Some(&token), "unrestricted", "reader"),
            Err(GateError::TokenExpired)
        ));
    }

    #[test]
    fn test_access_denied_reported_before_expiry() {
        let f = fixture();
        let stale = f
            .signer
            .encode(&Claims::new(vec!["guest".to_string()], 0))
            .unwrap();

        assert!(matches!(
            f.gate.authorize(Some(&stale), "topics", "reader"),
            Err(GateError::AccessDenied)
        ));
        assert!(matches!(
            f.gate.authorize(Some(&stale), "topics", "writer"),
            Err(GateError::TokenExpired)
        ));
    }
}
