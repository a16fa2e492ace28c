//! Background Tasks Module
//!
//! Long-running tasks that keep the local tier tidy.

mod cleanup;

pub use cleanup::spawn_cleanup_task;
