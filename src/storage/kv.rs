use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::schema::Database;
use super::types::StorageError;

/// A string-keyed, string-valued persistent store.
///
/// The store has no transactions or expiry of its own; freshness and capacity
/// rules live in the layers above it.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// The value under `key`, or `None` if the key was never written.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or replace the value under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// ============================================================================
// SQLite
// ============================================================================

#[async_trait]
impl KvStore for Database {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from_sqlx)?;

        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from_sqlx)?;

        Ok(())
    }
}

// ============================================================================
// In-memory
// ============================================================================

enum Availability {
    Available { quota: Option<usize> },
    Unavailable,
}

/// Process-local store.
///
/// Besides plain use in tests it can model a size-limited store
/// ([`with_quota`](MemoryStore::with_quota), counting value bytes) and an
/// environment without persistent storage ([`unavailable`](MemoryStore::unavailable)).
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    availability: Availability,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            availability: Availability::Available { quota: None },
        }
    }

    /// A store that rejects writes once stored values would exceed `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            availability: Availability::Available { quota: Some(bytes) },
        }
    }

    /// A store on which every operation fails with [`StorageError::Unavailable`].
    pub fn unavailable() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            availability: Availability::Unavailable,
        }
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        if matches!(self.availability, Availability::Unavailable) {
            return Err(StorageError::Unavailable);
        }
        self.entries.lock().map_err(|_| StorageError::Unavailable)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries()?;

        if let Availability::Available { quota: Some(quota) } = self.availability {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let required = others + value.len();
            if required > quota {
                return Err(StorageError::QuotaExceeded { required, quota });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn exercise(store: &dyn KvStore) {
        assert_eq!(store.get("missing").await.unwrap(), None);

        store.set("theme.variant", "dark").await.unwrap();
        assert_eq!(
            store.get("theme.variant").await.unwrap().as_deref(),
            Some("dark")
        );

        store.set("theme.variant", "light").await.unwrap();
        assert_eq!(
            store.get("theme.variant").await.unwrap().as_deref(),
            Some("light")
        );

        store.remove("theme.variant").await.unwrap();
        store.remove("theme.variant").await.unwrap();
        assert_eq!(store.get("theme.variant").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_database_store_contract() {
        let db = Database::open(":memory:").await.unwrap();
        exercise(&db).await;
    }

    #[tokio::test]
    async fn test_memory_store_contract() {
        exercise(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_quota_rejects_oversized_write() {
        let store = MemoryStore::with_quota(10);
        store.set("a", "12345").await.unwrap();
        // Replacing a value only counts the new size
        store.set("a", "1234567890").await.unwrap();

        let err = store.set("b", "x").await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::QuotaExceeded {
                required: 11,
                quota: 10
            }
        ));
        assert_eq!(store.get("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_everything() {
        let store = MemoryStore::unavailable();
        assert!(matches!(
            store.get("k").await,
            Err(StorageError::Unavailable)
        ));
        assert!(matches!(
            store.set("k", "v").await,
            Err(StorageError::Unavailable)
        ));
        assert!(matches!(
            store.remove("k").await,
            Err(StorageError::Unavailable)
        ));
    }
}
