//! Background Tasks Module
//!
//! # Tasks
//! - TTL Cleanup: sweeps expired memory-backend entries at a configured interval

mod cleanup;

pub use cleanup::{spawn_cleanup_task, spawn_cleanup_thread};
