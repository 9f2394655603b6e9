//! Per-call timeouts for any [`RoomStore`].
//!
//! A storage call that never returns would otherwise stall the event that
//! issued it forever. `TimedStore` bounds every call and turns the stall
//! into [`StoreError::Timeout`], which the room layer reports like any
//! other storage failure.

use std::future::Future;
use std::time::Duration;

use crate::{Fields, RoomStore, StoreError};

/// Wraps a store so every call fails after `limit`.
#[derive(Debug, Clone)]
pub struct TimedStore<S> {
    inner: S,
    limit: Duration,
}

impl<S: RoomStore> TimedStore<S> {
    /// Wraps `inner`, bounding each call to `limit`.
    pub fn new(inner: S, limit: Duration) -> Self {
        Self { inner, limit }
    }

    /// The per-call limit.
    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.limit, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(op, limit_ms = self.limit.as_millis() as u64, "storage call timed out");
                Err(StoreError::Timeout {
                    op,
                    limit: self.limit,
                })
            }
        }
    }
}

impl<S: RoomStore> RoomStore for TimedStore<S> {
    async fn set_hash(&self, key: &str, fields: Fields) -> Result<(), StoreError> {
        self.bounded("set_hash", self.inner.set_hash(key, fields)).await
    }

    async fn get_hash(&self, key: &str) -> Result<Fields, StoreError> {
        self.bounded("get_hash", self.inner.get_hash(key)).await
    }

    async fn compare_and_swap_hash(
        &self,
        key: &str,
        field: &str,
        expected: &str,
        fields: Fields,
    ) -> Result<bool, StoreError> {
        self.bounded(
            "compare_and_swap_hash",
            self.inner.compare_and_swap_hash(key, field, expected, fields),
        )
        .await
    }

    async fn set_expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        self.bounded("set_expire", self.inner.set_expire(key, ttl)).await
    }

    async fn delete_key(&self, key: &str) -> Result<bool, StoreError> {
        self.bounded("delete_key", self.inner.delete_key(key)).await
    }

    async fn list_push(&self, key: &str, value: &str) -> Result<usize, StoreError> {
        self.bounded("list_push", self.inner.list_push(key, value)).await
    }

    async fn list_range(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>, StoreError> {
        self.bounded("list_range", self.inner.list_range(key, start, stop))
            .await
    }

    async fn list_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        self.bounded("list_keys", self.inner.list_keys(pattern)).await
    }
}
