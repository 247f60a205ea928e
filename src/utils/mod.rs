/// Per-agent circuit breaker.
pub mod circuit_breaker;
/// Exponential backoff helpers.
pub mod retry;
/// TOML configuration and hot-reload manager.
pub mod toml_config;
