// src/server/middleware/mod.rs
pub mod rate_limit;

// Re-export main components for cleaner imports
pub use rate_limit::ConnectionRateLimiter;
