//! Core type definitions used across the PostForge workspace.

pub mod pagination;

pub use pagination::{PageRequest, PageResponse};
