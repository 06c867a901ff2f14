//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside a cache.
//!
//! # Tasks
//! - Expiration sweep: Removes lapsed entries at configured intervals

mod sweep;

pub use sweep::spawn_sweep_task;
