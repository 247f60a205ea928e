//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Agent listing handlers.
pub mod agents;
/// Dry-run routing handler.
pub mod analyze;
/// Chat handlers (REST and WebSocket).
pub mod chat;
