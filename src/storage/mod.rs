//! Storage Engine Module
//!
//! This module provides the in-memory key-value store and the background
//! task that reclaims expired entries.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              StorageEngine               │
//! │   RwLock<HashMap<Bytes, Entry>>          │
//! │   Entry = value + optional deadline      │
//! └──────────────────────────────────────────┘
//!                     ▲
//!                     │ purge_expired()
//!       ┌─────────────┴─────────────┐
//!       │       ExpirySweeper       │
//!       │  (Background Tokio Task)  │
//!       └───────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use resplite::storage::StorageEngine;
//! use bytes::Bytes;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let engine = Arc::new(StorageEngine::new());
//!
//! engine.set(Bytes::from("name"), Bytes::from("Ariz"), None);
//! assert_eq!(engine.get(&Bytes::from("name")), Some(Bytes::from("Ariz")));
//!
//! engine.set(
//!     Bytes::from("session"),
//!     Bytes::from("token123"),
//!     Some(Duration::from_secs(3600)),
//! );
//! ```

pub mod engine;
pub mod expiry;

pub use engine::{Entry, StorageEngine, StorageStats};
pub use expiry::{ExpiryConfig, ExpirySweeper};
