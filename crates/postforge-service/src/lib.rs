//! # postforge-service
//!
//! Business logic service layer for PostForge. Each service orchestrates
//! repositories, cache, and authentication to implement application-level
//! use cases.
//!
//! Services follow constructor injection — all dependencies are provided
//! at construction time via `Arc` references.

pub mod auth;
pub mod content;
pub mod subscription;
pub mod user;

pub use auth::AuthService;
pub use content::{GeneratorClient, PostService};
pub use subscription::SubscriptionService;
pub use user::UserService;
