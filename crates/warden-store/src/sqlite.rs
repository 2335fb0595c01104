//! SQLite-based store implementation

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{Store, StoreError, StoreKey, StoreRecord, StoreResult, UpdateFn};

/// SQLite-based store.
///
/// Every operation runs under one connection lock, so `update` is a true
/// read-modify-write transaction with respect to all other callers.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("store lock poisoned".into()))
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r#"
            -- One JSON document per store key
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value_json TEXT NOT NULL
            );
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

fn read_keys(conn: &Connection, keys: &[StoreKey]) -> StoreResult<StoreRecord> {
    let mut record = StoreRecord::default();
    let mut stmt = conn.prepare_cached("SELECT value_json FROM kv WHERE key = ?")?;

    for key in keys {
        let json: Option<String> = stmt
            .query_row([key.as_str()], |row| row.get(0))
            .optional()?;

        if let Some(json) = json {
            record.load_json(*key, &json)?;
        }
    }

    Ok(record)
}

fn write_entries(conn: &Connection, entries: &[(StoreKey, String)]) -> StoreResult<()> {
    let mut stmt = conn.prepare_cached(
        r#"
        INSERT INTO kv (key, value_json)
        VALUES (?, ?)
        ON CONFLICT(key)
        DO UPDATE SET value_json = excluded.value_json
        "#,
    )?;

    for (key, json) in entries {
        stmt.execute(params![key.as_str(), json])?;
    }

    Ok(())
}

#[async_trait]
impl Store for SqliteStore {
    async fn get(&self, keys: &[StoreKey]) -> StoreResult<StoreRecord> {
        let conn = self.lock()?;
        read_keys(&conn, keys)
    }

    async fn set(&self, record: StoreRecord) -> StoreResult<()> {
        let entries = record.to_json_entries()?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        write_entries(&tx, &entries)?;
        tx.commit()?;

        debug!(keys = entries.len(), "Store record written");
        Ok(())
    }

    async fn update(&self, keys: &[StoreKey], apply: UpdateFn) -> StoreResult<StoreRecord> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut record = read_keys(&tx, keys)?;
        apply(&mut record);

        let entries: Vec<_> = record
            .to_json_entries()?
            .into_iter()
            .filter(|(key, _)| keys.contains(key))
            .collect();
        write_entries(&tx, &entries)?;
        tx.commit()?;

        Ok(record)
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlockList, Limits, TimeData};
    use std::sync::Arc;
    use warden_api::Settings;
    use warden_util::Domain;

    #[test]
    fn test_in_memory_store() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.is_healthy());
    }

    #[tokio::test]
    async fn test_missing_keys_are_absent() {
        let store = SqliteStore::in_memory().unwrap();
        let record = store.get(StoreKey::ALL).await.unwrap();

        assert_eq!(record, StoreRecord::default());
        assert!(record.extension_enabled());
    }

    #[tokio::test]
    async fn test_set_writes_only_present_keys() {
        let store = SqliteStore::in_memory().unwrap();

        let limits: Limits = [(Domain::new("a.com"), 10)].into_iter().collect();
        store
            .set(StoreRecord {
                limits: Some(limits.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .set(StoreRecord {
                extension_enabled: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();

        let record = store
            .get(&[StoreKey::Limits, StoreKey::ExtensionEnabled])
            .await
            .unwrap();
        assert_eq!(record.limits, Some(limits));
        assert_eq!(record.extension_enabled, Some(false));
    }

    #[tokio::test]
    async fn test_update_is_read_modify_write() {
        let store = SqliteStore::in_memory().unwrap();
        let domain = Domain::new("a.com");

        for secs in [30, 12] {
            let d = domain.clone();
            store
                .update(
                    &[StoreKey::TimeData],
                    Box::new(move |record| {
                        record
                            .time_data
                            .get_or_insert_with(TimeData::default)
                            .add("2025-01-01", &d, secs);
                    }),
                )
                .await
                .unwrap();
        }

        let record = store.get(&[StoreKey::TimeData]).await.unwrap();
        assert_eq!(record.time_data().seconds("2025-01-01", &domain), 42);
    }

    #[tokio::test]
    async fn test_update_ignores_unrequested_keys() {
        let store = SqliteStore::in_memory().unwrap();

        store
            .update(
                &[StoreKey::Limits],
                Box::new(|record| {
                    record.limits = Some(Limits::new());
                    record.blocked_sites = Some(BlockList::from_iter([Domain::new("x.com")]));
                }),
            )
            .await
            .unwrap();

        let record = store.get(StoreKey::ALL).await.unwrap();
        assert!(record.limits.is_some());
        assert!(record.blocked_sites.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_updates_do_not_lose_increments() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let domain = Domain::new("busy.example");

        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            let d = domain.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update(
                        &[StoreKey::TimeData],
                        Box::new(move |record| {
                            record
                                .time_data
                                .get_or_insert_with(TimeData::default)
                                .add("2025-01-01", &d, 2);
                        }),
                    )
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let record = store.get(&[StoreKey::TimeData]).await.unwrap();
        assert_eq!(record.time_data().seconds("2025-01-01", &domain), 100);
    }

    #[tokio::test]
    async fn test_ensure_defaults_never_overwrites() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .set(StoreRecord {
                extension_enabled: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();

        store.ensure_defaults(Settings::default()).await.unwrap();

        let record = store.get(StoreKey::ALL).await.unwrap();
        assert_eq!(record.extension_enabled, Some(false));
        assert_eq!(record.settings, Some(Settings::default()));
        assert_eq!(record.time_data, Some(TimeData::default()));
    }

    #[tokio::test]
    async fn test_settings_written_without_tracking_flag_still_load() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO kv (key, value_json) VALUES ('settings', ?)",
                [r#"{"notifications":true,"warningThreshold":0.9}"#],
            )
            .unwrap();

        store.ensure_defaults(Settings::default()).await.unwrap();

        let record = store.get(StoreKey::ALL).await.unwrap();
        assert_eq!(record.settings, Some(Settings::default()));
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .set(StoreRecord {
                    blocked_sites: Some(BlockList::from_iter([Domain::new("x.com")])),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let record = store.get(&[StoreKey::BlockedSites]).await.unwrap();
        assert!(record.blocked_sites().contains(&Domain::new("x.com")));
    }
}
