//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - TTL Cleanup: Sweeps expired entries from every cache
//! - Self-Tuning: Adjusts each cache's policy and default TTL from its stats

mod cleanup;
mod optimizer;

pub use cleanup::spawn_cleanup_task;
pub use optimizer::spawn_optimizer_task;
