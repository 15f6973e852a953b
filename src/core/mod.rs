//! Core components
//!
//! - `credentials`: users and restrictions, SQLite-backed
//! - `token`: HS256 token codec and login
//! - `gate`: ordered token and restriction checks
//! - `params`: request parameter coercion
//! - `conditions`: nested boolean condition compiler
//! - `boundary`: request head, route names and error bodies
//! - `config`: TOML configuration

pub mod boundary;
pub mod clock;
pub mod conditions;
pub mod config;
pub mod credentials;
pub mod gate;
pub mod literal;
pub mod params;
pub mod token;
