//! TOML configuration
//!
//! ```toml
//! secret = "change-me"
//!
//! [auth]
//! database = "credentials.db"   # or ":memory:"
//! replace = false
//!
//! [[auth.users]]
//! username = "admin"
//! password = "admin"
//! auth_level = ["admin"]
//! max_age = 600
//!
//! [[auth.restrictions]]
//! tree = "topics"
//! blueprint = "records"
//! auth_level = ["admin"]
//! ```
//!
//! Without an `[auth]` table the gate runs disabled and lets every request
//! through.

use crate::core::credentials::{Database, Restriction, StoreOptions, UserSettings};
use crate::error::{GateError, Result};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Default, Deserialize)]
pub struct GateConfig {
    /// Process-wide token signing secret
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub secret: Option<SecretString>,

    /// Authorization settings; absent means disabled
    #[serde(default)]
    pub auth: Option<AuthSettings>,
}

/// Credential store settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub database: Database,
    #[serde(default)]
    pub replace: bool,
    #[serde(default)]
    pub users: Option<Vec<UserSettings>>,
    #[serde(default)]
    pub restrictions: Option<Vec<Restriction>>,
}

impl AuthSettings {
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            database: self.database.clone(),
            replace: self.replace,
            users: self.users.clone(),
            restrictions: self.restrictions.clone(),
        }
    }
}

impl GateConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: GateConfig = toml::from_str(content)
            .map_err(|e| GateError::Configuration(format!("invalid config: {e}")))?;
        config.check()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn is_enabled(&self) -> bool {
        self.auth.is_some()
    }

    fn check(&self) -> Result<()> {
        if self.auth.is_some() && self.secret.is_none() {
            return Err(GateError::Configuration(
                "a secret is required when [auth] is configured".to_string(),
            ));
        }
        Ok(())
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> std::result::Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}
