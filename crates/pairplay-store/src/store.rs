//! The storage contract consumed by the room layer.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::StoreError;

/// The fields of a hash value.
pub type Fields = HashMap<String, String>;

/// A key/value store with hash and list values and per-key expiry.
///
/// Semantics follow the usual remote key/value servers:
///
/// - Expired keys are invisible to every operation.
/// - `get_hash` on a missing key returns an empty map, not an error.
/// - Writing to a key that holds the other kind of value is
///   [`StoreError::WrongType`].
///
/// Every method is a suspension point. Methods return `Send` futures so
/// callers can hold a store inside spawned connection tasks.
pub trait RoomStore: Send + Sync + 'static {
    /// Sets the given fields on a hash, creating it if needed.
    /// Existing fields not named in `fields` are kept, as is any expiry.
    fn set_hash(
        &self,
        key: &str,
        fields: Fields,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Returns all fields of a hash, or an empty map if the key is absent.
    fn get_hash(&self, key: &str) -> impl Future<Output = Result<Fields, StoreError>> + Send;

    /// Atomically sets `fields` on the hash only if `field` currently
    /// equals `expected`.
    ///
    /// An absent key or field counts as the empty string, so
    /// `expected == ""` creates the hash if needed. Returns `Ok(false)`
    /// without writing when the current value differs from `expected`.
    /// This is the building block for check-and-increment without a
    /// read-then-write gap.
    fn compare_and_swap_hash(
        &self,
        key: &str,
        field: &str,
        expected: &str,
        fields: Fields,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Sets the key to expire after `ttl`. Returns `false` if the key is absent.
    fn set_expire(
        &self,
        key: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Deletes a key of any type. Returns `false` if it was already absent.
    fn delete_key(&self, key: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Appends a value to a list, creating it if needed. Returns the new length.
    fn list_push(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;

    /// Returns list elements from `start` to `stop`, both inclusive.
    /// Negative indexes count from the end (`-1` is the last element).
    fn list_range(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;

    /// Returns the live keys matching a glob pattern (`*` and `?`),
    /// in lexical order.
    fn list_keys(
        &self,
        pattern: &str,
    ) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;
}

impl<S: RoomStore> RoomStore for Arc<S> {
    async fn set_hash(&self, key: &str, fields: Fields) -> Result<(), StoreError> {
        (**self).set_hash(key, fields).await
    }

    async fn get_hash(&self, key: &str) -> Result<Fields, StoreError> {
        (**self).get_hash(key).await
    }

    async fn compare_and_swap_hash(
        &self,
        key: &str,
        field: &str,
        expected: &str,
        fields: Fields,
    ) -> Result<bool, StoreError> {
        (**self)
            .compare_and_swap_hash(key, field, expected, fields)
            .await
    }

    async fn set_expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        (**self).set_expire(key, ttl).await
    }

    async fn delete_key(&self, key: &str) -> Result<bool, StoreError> {
        (**self).delete_key(key).await
    }

    async fn list_push(&self, key: &str, value: &str) -> Result<usize, StoreError> {
        (**self).list_push(key, value).await
    }

    async fn list_range(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>, StoreError> {
        (**self).list_range(key, start, stop).await
    }

    async fn list_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        (**self).list_keys(pattern).await
    }
}
