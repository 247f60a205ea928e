//! API key guard and caller identity
//!
//! GENESIS has no user accounts of its own; it sits behind a gateway that
//! already authenticated the user. What it checks is that the caller is that
//! gateway.
//!
//! # Configuration
//!
//! ```toml
//! [auth]
//! api_key_env = "GENESIS_API_KEY"
//! ```
//!
//! When the named variable is set and non-empty, every `/api/*` route
//! requires either header:
//!
//! ```text
//! Authorization: Bearer <key>
//! x-api-key: <key>
//! ```
//!
//! The calling user is identified by `x-user-id` (see [`middleware::UserId`]).

/// API key middleware and the user id extractor.
pub mod middleware;
