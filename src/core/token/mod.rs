//! Signed, time-bounded access tokens
//!
//! - HS256 compact encoding with a shared process secret
//! - Claims carry the user's auth levels and an absolute expiry
//! - Issued on login, never persisted server-side

mod claims;
mod issuer;
mod signer;

pub use claims::{Claims, Header, ALGORITHM};
pub use issuer::{IssuedToken, TokenIssuer};
pub use signer::TokenSigner;
