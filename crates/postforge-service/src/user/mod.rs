//! User self-service use cases.

pub mod service;

pub use service::{UpdateProfileRequest, UserService};
