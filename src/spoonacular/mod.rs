pub mod client;
pub mod models;
pub mod rate_limiter;

pub use client::SpoonacularClient;
pub use rate_limiter::RateLimiter;
