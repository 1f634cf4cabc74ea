//! Authentication use cases.

pub mod service;

pub use service::{AuthService, RegisterRequest};
