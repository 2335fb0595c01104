//! Store trait definitions

use async_trait::async_trait;
use warden_api::Settings;

use crate::{StoreKey, StoreRecord, StoreResult};

/// Mutation applied inside [`Store::update`]
pub type UpdateFn = Box<dyn FnOnce(&mut StoreRecord) + Send>;

/// The shared, asynchronously accessed key-value store
#[async_trait]
pub trait Store: Send + Sync {
    /// Read the given keys. Keys never written are left as `None`.
    async fn get(&self, keys: &[StoreKey]) -> StoreResult<StoreRecord>;

    /// Write every populated key of `record`; other keys are untouched
    async fn set(&self, record: StoreRecord) -> StoreResult<()>;

    /// Read `keys`, apply `apply`, and write `keys` back as one atomic unit.
    ///
    /// No other `get`/`set`/`update` can observe or interleave with the
    /// intermediate state. Returns the record as written.
    async fn update(&self, keys: &[StoreKey], apply: UpdateFn) -> StoreResult<StoreRecord>;

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;

    /// Write first-run defaults for any key that has never been written
    async fn ensure_defaults(&self, settings: Settings) -> StoreResult<()> {
        self.update(
            StoreKey::ALL,
            Box::new(move |record| record.fill_defaults(settings)),
        )
        .await
        .map(|_| ())
    }
}
