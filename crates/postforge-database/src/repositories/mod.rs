//! Repository implementations for all PostForge entities.

pub mod plan;
pub mod post;
pub mod user;

pub use plan::PlanRepository;
pub use post::PostRepository;
pub use user::UserRepository;
