//! Content generation use cases.

pub mod generator;
pub mod service;

pub use generator::GeneratorClient;
pub use service::{CreatePostRequest, PostService};
