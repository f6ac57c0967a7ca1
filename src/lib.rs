//! Tiered Cache - A multi-tier adaptive cache server
//!
//! A byte-bounded in-process fast tier with pluggable eviction, an optional
//! shared backing tier that degrades gracefully, and periodic self-tuning.

pub mod api;
pub mod backing;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use backing::{BackingStore, HttpBackingStore, MemoryBackingStore};
pub use cache::{CacheEngine, CacheRegistry, EvictionPolicy};
pub use config::Config;
pub use error::CacheError;
pub use tasks::{spawn_cleanup_task, spawn_optimizer_task};
