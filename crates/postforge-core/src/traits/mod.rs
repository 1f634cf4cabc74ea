//! Cross-crate traits.

pub mod cache;

pub use cache::CacheProvider;
