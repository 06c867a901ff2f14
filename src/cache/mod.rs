//! Cache Module
//!
//! Envelope-based caching with TTL preservation, pattern search, expiry
//! sweeping and popularity purging on top of a `RawStore`.

pub mod envelope;
mod locks;
mod request;
mod search;
mod stats;
mod store;
mod value;


// Re-export public types
pub use envelope::Envelope;
pub use locks::KeyLocks;
pub use request::{Scope, TtlMode, UpdateRequest};
pub use search::Search;
pub use stats::{CacheStats, Gauge};
pub use store::EnvelopeCache;
pub use value::{TypeTag, Value};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed encoded envelope size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

/// Deepest list/record nesting an envelope may carry
pub const MAX_NESTING_DEPTH: usize = 64;

/// Default hit threshold for popularity purges
pub const DEFAULT_MIN_HITS: u64 = 10;

/// Default number of per-key lock stripes
pub const DEFAULT_LOCK_STRIPES: usize = 64;
