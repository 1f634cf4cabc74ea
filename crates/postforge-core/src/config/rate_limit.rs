//! Rate limiting configuration.

use serde::{Deserialize, Serialize};

/// Fixed-window rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether rate limiting is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Window length in seconds.
    #[serde(default = "default_window")]
    pub window_seconds: u64,
    /// Allowed requests per window for unauthenticated endpoints,
    /// keyed by client IP.
    #[serde(default = "default_anonymous_limit")]
    pub anonymous_limit: u32,
    /// Allowed requests per window for authenticated endpoints,
    /// keyed by user id.
    #[serde(default = "default_authenticated_limit")]
    pub authenticated_limit: u32,
    /// Allowed login attempts per window, keyed by client IP.
    #[serde(default = "default_login_limit")]
    pub login_limit: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_seconds: default_window(),
            anonymous_limit: default_anonymous_limit(),
            authenticated_limit: default_authenticated_limit(),
            login_limit: default_login_limit(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_window() -> u64 {
    60
}

fn default_anonymous_limit() -> u32 {
    30
}

fn default_authenticated_limit() -> u32 {
    120
}

fn default_login_limit() -> u32 {
    10
}
