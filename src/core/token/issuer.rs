//! Login: password check and token minting

use super::claims::Claims;
use super::signer::TokenSigner;
use crate::core::clock::Clock;
use crate::core::credentials::CredentialStore;
use crate::error::{GateError, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// A freshly minted token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Encoded token
    pub token: String,
    /// Lifetime granted, seconds
    pub max_age: i64,
    /// Absolute expiry, Unix epoch seconds
    pub expires_at: i64,
}

impl IssuedToken {
    /// `Bearer <token>`, the form carried by header and cookie
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Authenticates users and issues signed tokens
#[derive(Clone)]
pub struct TokenIssuer {
    store: Arc<CredentialStore>,
    signer: Arc<TokenSigner>,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(store: Arc<CredentialStore>, signer: Arc<TokenSigner>, clock: Arc<dyn Clock>) -> Self {
        TokenIssuer {
            store,
            signer,
            clock,
        }
    }

    /// Check a username/password pair and mint a token
    ///
    /// # Errors
    ///
    /// `InvalidLogin` for an unknown user or a wrong password; both cases
    /// produce the same error.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<IssuedToken> {
        let Some(user) = self.store.get_user(username) else {
            debug!("Login rejected");
            return Err(GateError::InvalidLogin);
        };

        if !user.verify_password(password) {
            debug!("Login rejected");
            return Err(GateError::InvalidLogin);
        }

        let expires_at = self.clock.now().saturating_add(user.max_age);
        let claims = Claims::new(user.auth_level, expires_at);
        let token = self.signer.encode(&claims)?;

        info!("Issued token for '{}' ({}s)", user.username, user.max_age);
        Ok(IssuedToken {
            token,
            max_age: user.max_age,
            expires_at,
        })
    }
}
