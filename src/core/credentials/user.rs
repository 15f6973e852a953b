//! User credentials and restriction policies
//!
//! Users are declared in configuration with a plaintext password, then
//! salted and digested once on load. Only the digest and the salt are kept.

use crate::error::{GateError, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use validator::Validate;

/// Length of the per-user random salt
pub const SALT_LENGTH: usize = 16;

/// User entry as declared in configuration
#[derive(Clone, Deserialize, Validate)]
pub struct UserSettings {
    #[validate(length(min = 1))]
    pub username: String,

    pub password: String,

    /// Permission levels granted to this user
    #[validate(length(min = 1))]
    pub auth_level: Vec<String>,

    /// Token lifetime in seconds
    #[validate(range(min = 1))]
    pub max_age: i64,
}

impl UserSettings {
    pub fn new(username: &str, password: &str, auth_level: &[&str], max_age: i64) -> Self {
        UserSettings {
            username: username.to_string(),
            password: password.to_string(),
            auth_level: auth_level.iter().map(|l| l.to_string()).collect(),
            max_age,
        }
    }
}

impl std::fmt::Debug for UserSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserSettings")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("auth_level", &self.auth_level)
            .field("max_age", &self.max_age)
            .finish()
    }
}

/// Stored user credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password_sha256: String,
    pub auth_level: Vec<String>,
    pub salt: String,
    pub max_age: i64,
}

impl User {
    /// Salt and digest a configured user
    pub fn from_settings(settings: &UserSettings) -> Result<Self> {
        Self::with_salt(settings, generate_salt())
    }

    /// Digest a configured user with a caller-provided salt
    pub fn with_salt(settings: &UserSettings, salt: impl Into<String>) -> Result<Self> {
        settings.validate().map_err(|e| {
            GateError::Configuration(format!("invalid user '{}': {}", settings.username, e))
        })?;
        validate_levels(&settings.auth_level, &settings.username)?;

        let salt = salt.into();
        Ok(User {
            username: settings.username.clone(),
            password_sha256: password_digest(&salt, &settings.password),
            auth_level: settings.auth_level.clone(),
            salt,
            max_age: settings.max_age,
        })
    }

    /// Check a plaintext password against the stored digest in constant time
    pub fn verify_password(&self, password: &str) -> bool {
        let candidate = password_digest(&self.salt, password);
        candidate
            .as_bytes()
            .ct_eq(self.password_sha256.as_bytes())
            .into()
    }
}

/// Random alphanumeric salt of [`SALT_LENGTH`] characters
pub fn generate_salt() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LENGTH)
        .map(char::from)
        .collect()
}

/// Hex-encoded `sha256(salt || password)`
pub fn password_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Restriction entry as declared in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Restriction {
    /// Logical resource (tree) identifier
    #[serde(alias = "tree")]
    #[validate(length(min = 1))]
    pub resource: String,

    /// Named operation group (blueprint)
    #[serde(alias = "blueprint")]
    #[validate(length(min = 1))]
    pub action: String,

    /// Levels allowed to perform `action` on `resource`
    pub auth_level: Vec<String>,
}

impl Restriction {
    pub fn new(resource: &str, action: &str, auth_level: &[&str]) -> Self {
        Restriction {
            resource: resource.to_string(),
            action: action.to_string(),
            auth_level: auth_level.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// True if any of `levels` is allowed by this restriction
    pub fn permits(&self, levels: &[String]) -> bool {
        self.auth_level.iter().any(|allowed| levels.contains(allowed))
    }

    pub(crate) fn check(&self) -> Result<()> {
        self.validate().map_err(|e| {
            GateError::Configuration(format!(
                "invalid restriction on '{}'/'{}': {}",
                self.resource, self.action, e
            ))
        })
    }
}

fn validate_levels(levels: &[String], username: &str) -> Result<()> {
    if levels.iter().any(|l| l.trim().is_empty()) {
        return Err(GateError::Configuration(format!(
            "user '{}' has an empty auth level",
            username
        )));
    }
    Ok(())
}
