//! HTTP request handlers, organized by domain.

pub mod auth;
pub mod health;
pub mod post;
pub mod subscription;
pub mod user;
