//! Blog post entity and generation status.

pub mod model;
pub mod status;

pub use model::{BlogPost, CreatePost};
pub use status::PostStatus;
