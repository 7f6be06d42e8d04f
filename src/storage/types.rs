use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors from the persistent key-value store.
///
/// Callers in the cache and bookmark layers never propagate these; they log
/// and fall back to empty data.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Another instance of the application has locked the database
    #[error("Another instance of newsdesk appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// A write would push the store past its size limit
    #[error("Storage quota exceeded: {required} bytes required, {quota} bytes available")]
    QuotaExceeded { required: usize, quota: usize },

    /// No persistent store exists in this environment, or it has been disabled
    #[error("Persistent storage is unavailable")]
    Unavailable,

    /// Generic database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    /// Classify a sqlx error, recognising lock contention.
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_message(&err.to_string()) {
            return StorageError::InstanceLocked;
        }
        StorageError::Database(err)
    }
}

/// SQLITE_BUSY / SQLITE_LOCKED / SQLITE_CANTOPEN surface only as message text.
pub(crate) fn is_lock_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("sqlite_busy")
        || message.contains("sqlite_locked")
        || message.contains("unable to open database file")
}
