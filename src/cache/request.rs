//! Request types accepted by the envelope cache operations.

use std::str::FromStr;

use crate::cache::Value;
use crate::error::CacheError;
use crate::raw::StoreScope;

// == Update Request ==
/// Second argument of `EnvelopeCache::update`.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateRequest {
    /// Replace the stored data wholesale
    Replace(Value),
    /// Add a signed delta to numeric data
    Delta(i64),
}

impl From<Value> for UpdateRequest {
    fn from(value: Value) -> Self {
        UpdateRequest::Replace(value)
    }
}

// == TTL Mode ==
/// What `EnvelopeCache::ttl` reports for entries that have a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TtlMode {
    /// Seconds until the deadline; negative once passed
    #[default]
    Remaining,
    /// The deadline itself as Unix seconds
    Absolute,
}

// == Scope ==
/// Target of purge and flush operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Cache,
    Compiled,
    All,
}

impl Scope {
    /// Raw store scopes covered by this scope.
    pub fn store_scopes(self) -> &'static [StoreScope] {
        match self {
            Scope::Cache => &[StoreScope::Cache],
            Scope::Compiled => &[StoreScope::Compiled],
            Scope::All => &[StoreScope::Cache, StoreScope::Compiled],
        }
    }
}

impl FromStr for Scope {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cache" => Ok(Scope::Cache),
            "compiled" => Ok(Scope::Compiled),
            "all" => Ok(Scope::All),
            other => Err(CacheError::InvalidRequest(format!("unknown scope: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_from_str() {
        assert_eq!("cache".parse::<Scope>().unwrap(), Scope::Cache);
        assert_eq!("Compiled".parse::<Scope>().unwrap(), Scope::Compiled);
        assert_eq!(" all ".parse::<Scope>().unwrap(), Scope::All);
        assert!(matches!(
            "disk".parse::<Scope>(),
            Err(CacheError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_all_covers_both_store_scopes() {
        assert_eq!(
            Scope::All.store_scopes(),
            &[StoreScope::Cache, StoreScope::Compiled]
        );
    }

    #[test]
    fn test_value_converts_to_replace() {
        let request: UpdateRequest = Value::from("v").into();
        assert_eq!(request, UpdateRequest::Replace(Value::from("v")));
    }
}
