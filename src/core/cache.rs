//! Cache and clock abstractions

use async_trait::async_trait;
use std::hash::Hash;
use std::time::{Duration, Instant};

#[async_trait]
pub trait Cache<K, V>: Send + Sync
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Returns the value for `key` unless it is missing or expired.
    async fn get(&self, key: &K) -> Option<V>;

    /// Stores `value`, replacing any previous entry. `None` never expires.
    async fn put(&self, key: K, value: V, ttl: Option<Duration>);
}

/// Source of the current time for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}
