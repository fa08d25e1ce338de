//! Background Tasks Module
//!
//! Contains background tasks that run alongside request handling.
//!
//! # Tasks
//! - Invalidation: Deletes cache keys reported as changed by content watchers

mod invalidation;

pub use invalidation::spawn_invalidation_task;
