//! Generation-wide constants
//!
//! Single source of truth for intervals, limits and wire literals.

/// Polling configuration
pub mod polling {
    /// Interval between status queries, in seconds
    pub const INTERVAL_SECS: u64 = 3;
    /// Shortest interval the poll loop will ever wait, in seconds
    pub const MIN_INTERVAL_SECS: u64 = 1;
    /// Upper bound for the backoff delay after failed queries, in seconds
    pub const BACKOFF_MAX_SECS: u64 = 60;
    /// Consecutive failed queries before the loop gives up
    pub const MAX_CONSECUTIVE_FAILURES: u32 = 20;
}

/// Push channel configuration
pub mod push {
    /// Bounded queue size for push events
    pub const CHANNEL_CAPACITY: usize = 64;
    /// Event type carrying log lines and review signals
    pub const LOG_EVENT_TYPE: &str = "log";
    /// Log message that asks for human review
    pub const REVIEW_REQUIRED_MESSAGE: &str = "REVIEW_REQUIRED";
}

/// Remote service endpoints
pub mod endpoints {
    /// Default base URL of the generation service
    pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
    /// Environment variable overriding the base URL
    pub const BASE_URL_ENV: &str = "BLUEPRINT_API_URL";
}
