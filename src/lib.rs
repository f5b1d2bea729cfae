#![deny(missing_docs)]
//! Mezmur lyrics bot.
//!
//! Telegram front-end for the Mezmur lyrics service: commands, menu buttons
//! and inline queries are turned into API calls and rendered back as chat
//! messages.

/// Remote lyrics API client and wire models.
pub mod api;
/// Telegram-facing handlers, state and views.
pub mod bot;
/// Configuration and settings management.
pub mod config;
/// Dispatcher wiring and process lifecycle.
pub mod runner;
/// Text helpers and retry utilities.
pub mod utils;

/// Recording transport and mock constructors for tests.
#[cfg(any(test, feature = "testing"))]
pub mod testing;
