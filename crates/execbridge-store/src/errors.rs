use thiserror::Error;

/// Failure classification C5 relies on to decide whether a single-row insert
/// is worth retrying. `Transient`/`NonTransient` map directly onto §7's
/// `TransientDatabaseError`/`NonTransientDatabaseError`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transient database error: {0}")]
    Transient(String),
    #[error("database error: {0}")]
    NonTransient(String),
    #[error("version conflict: expected version {expected}, row is at {found}")]
    VersionConflict { expected: i32, found: i32 },
    #[error("execution not found")]
    NotFound,
    #[error("bulkUpdateSentTimestamp invoked outside a transaction")]
    NotInTransaction,
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

/// Map a raw `sqlx::Error` onto the transient/non-transient split.
///
/// Serialization failures, deadlocks, and connection-pool exhaustion are
/// transient (worth retrying with backoff); integrity-constraint violations
/// and anything else are not.
pub(crate) fn classify_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("40001") | Some("40P01") => StoreError::Transient(err.to_string()),
            Some(code) if code.starts_with("23") => StoreError::NonTransient(err.to_string()),
            _ => StoreError::NonTransient(err.to_string()),
        },
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Transient(err.to_string())
        }
        sqlx::Error::RowNotFound => StoreError::NotFound,
        _ => StoreError::NonTransient(err.to_string()),
    }
}
