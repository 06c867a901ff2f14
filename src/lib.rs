//! Envelope Cache - A TTL-aware, type-preserving cache layer
//!
//! Wraps values stored in a raw key-value engine with type and expiry
//! metadata, and adds pattern search, expiry sweeping and popularity purging.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod raw;
pub mod tasks;

pub use cache::{EnvelopeCache, Scope, TtlMode, UpdateRequest, Value};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{CacheError, Result};
pub use raw::{MemoryStore, RawStore};
pub use tasks::spawn_sweep_task;
