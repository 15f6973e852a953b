//! Error types for authorization and parameter coercion

use serde::Serialize;
use thiserror::Error;

/// Gate operation result type
pub type Result<T> = std::result::Result<T, GateError>;

/// Authorization, coercion and grammar errors
///
/// Every variant except the internal faults (`Storage`, `Serialization`,
/// `Io`, `Internal`) belongs to the handled taxonomy: it carries a stable
/// kind and message and is expected in normal operation.
#[derive(Error, Debug)]
pub enum GateError {
    /// Unknown username or wrong password (same message for both)
    #[error("Invalid login: wrong username or password")]
    InvalidLogin,

    /// Username or password missing from a login attempt
    #[error("Missing login: username and password are required")]
    MissingLogin,

    /// No bearer token on a protected operation
    #[error("Authorization token required")]
    TokenMissing,

    /// Malformed or mis-signed token
    #[error("Invalid authorization token")]
    TokenInvalid,

    /// Token past its expiry time
    #[error("Outdated authorization token")]
    TokenExpired,

    /// Token levels do not intersect the restriction levels
    #[error("Access denied")]
    AccessDenied,

    /// A coerced value does not have the declared type
    #[error("Parsing error on `{field}`: got {value}, expected {expected}")]
    Parsing {
        field: String,
        value: String,
        expected: String,
    },

    /// A raw value cannot be converted into the requested primitive
    #[error("Conversion error: cannot convert {value} into {target}")]
    Conversion { value: String, target: String },

    /// A closed-vocabulary value outside its set
    #[error("Unknown {kind} `{value}`, possible values: {}", .choices.join(", "))]
    UnknownChoice {
        kind: &'static str,
        value: String,
        choices: Vec<&'static str>,
    },

    /// Initialization misuse
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Backing storage failure
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// JSON encoding failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected internal fault
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Stable error kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidLogin,
    MissingLogin,
    TokenMissing,
    TokenInvalid,
    TokenExpired,
    AccessDenied,
    Parsing,
    Conversion,
    UnknownChoice,
    Configuration,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidLogin => "invalid_login",
            ErrorKind::MissingLogin => "missing_login",
            ErrorKind::TokenMissing => "token_missing",
            ErrorKind::TokenInvalid => "token_invalid",
            ErrorKind::TokenExpired => "token_expired",
            ErrorKind::AccessDenied => "access_denied",
            ErrorKind::Parsing => "parsing",
            ErrorKind::Conversion => "conversion",
            ErrorKind::UnknownChoice => "unknown_choice",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GateError {
    /// Build a parsing error for `field`
    pub fn parsing(field: &str, value: impl std::fmt::Display, expected: &str) -> Self {
        GateError::Parsing {
            field: field.to_string(),
            value: value.to_string(),
            expected: expected.to_string(),
        }
    }

    /// Build a conversion error
    pub fn conversion(value: impl std::fmt::Display, target: &str) -> Self {
        GateError::Conversion {
            value: value.to_string(),
            target: target.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GateError::InvalidLogin => ErrorKind::InvalidLogin,
            GateError::MissingLogin => ErrorKind::MissingLogin,
            GateError::TokenMissing => ErrorKind::TokenMissing,
            GateError::TokenInvalid => ErrorKind::TokenInvalid,
            GateError::TokenExpired => ErrorKind::TokenExpired,
            GateError::AccessDenied => ErrorKind::AccessDenied,
            GateError::Parsing { .. } => ErrorKind::Parsing,
            GateError::Conversion { .. } => ErrorKind::Conversion,
            GateError::UnknownChoice { .. } => ErrorKind::UnknownChoice,
            GateError::Configuration(_) => ErrorKind::Configuration,
            GateError::Storage(_)
            | GateError::Serialization(_)
            | GateError::Io(_)
            | GateError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// True for faults outside the handled taxonomy
    pub fn is_internal(&self) -> bool {
        self.kind() == ErrorKind::Internal
    }

    /// HTTP-style status code for the boundary layer
    pub fn status(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidLogin
            | ErrorKind::MissingLogin
            | ErrorKind::TokenMissing
            | ErrorKind::TokenInvalid
            | ErrorKind::TokenExpired => 401,
            ErrorKind::AccessDenied => 403,
            ErrorKind::Parsing | ErrorKind::Conversion | ErrorKind::UnknownChoice => 400,
            ErrorKind::Configuration | ErrorKind::Internal => 500,
        }
    }
}
