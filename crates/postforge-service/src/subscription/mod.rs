//! Subscription and plan use cases.

pub mod service;

pub use service::SubscriptionService;
