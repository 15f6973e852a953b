//! Credential storage
//!
//! Holds user credentials and per-resource restriction policies:
//! - Salted SHA-256 password digests
//! - (resource, action) restrictions keyed by permission levels
//! - SQLite persistence with an in-memory read snapshot

mod store;
mod user;

pub use store::{CredentialStore, Database, StoreOptions};
pub use user::{generate_salt, password_digest, Restriction, User, UserSettings, SALT_LENGTH};
