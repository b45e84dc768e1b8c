//! # Corkboard
//!
//! A message-record service backed by a single-file ordered key-value store:
//! - Copy-on-write B-tree in one data file, crash-safe dual meta slots
//! - Ascending key-order iteration for deterministic pagination
//! - Typed service operations (create/list/get/update/delete)
//! - Thin axum REST layer
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HTTP Router                             │
//! │          (axum: routes, status mapping, CORS)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Message Service                             │
//! │     (validation, ids, timestamps, merge-on-update)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Store                                  │
//! │       (copy-on-write B-tree, single data file)               │
//! └─────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod http;
pub mod message;
pub mod service;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{Config, SyncStrategy};
pub use error::{CorkboardError, FieldError, Result};
pub use message::{CreateMessage, ListMessages, Message, MessagePage, UpdateMessage};
pub use service::MessageService;
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Corkboard
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
