//! # postforge-auth
//!
//! Authentication and access-control primitives for the PostForge platform.
//!
//! ## Modules
//!
//! - `jwt` — JWT token creation, validation, and claims
//! - `password` — Argon2id password hashing and policy enforcement
//! - `revocation` — Token revocation registry and password-reset tokens
//! - `quota` — Monthly post-credit enforcement

pub mod jwt;
pub mod password;
pub mod quota;
pub mod revocation;

pub use jwt::{Claims, JwtDecoder, JwtEncoder, TokenPair, TokenType};
pub use password::{PasswordHasher, PasswordValidator};
pub use quota::UsageGate;
pub use revocation::RevocationRegistry;
