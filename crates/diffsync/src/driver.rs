//! Driver-boundary traits the synchronizer consumes.
//!
//! The host supplies implementations backed by its connection pool. Each
//! connection is owned by a single logical role (source or target) for the
//! duration of a run; the only cross-task traffic is the handoff of the
//! target cursor out of the background SELECT task.

use async_trait::async_trait;

use crate::error::Result;
use crate::value::{SqlType, SqlValue};

/// One side of the synchronization (source or target).
///
/// Methods take `&self` so a connection handle can be shared with the
/// background SELECT task; implementations serialize access internally.
/// Any call may block on the underlying driver.
#[async_trait]
pub trait SyncConnection: Send + Sync {
    /// Current auto-commit state.
    async fn auto_commit(&self) -> Result<bool>;

    /// Switch auto-commit on or off.
    async fn set_auto_commit(&self, enabled: bool) -> Result<()>;

    /// Execute an ordered SELECT and return its cursor.
    ///
    /// `fetch_size` of 0 keeps the driver default. The cursor is released
    /// when dropped.
    async fn query(&self, sql: &str, fetch_size: u32) -> Result<Box<dyn RowCursor>>;

    /// Prepare a parameterized DML statement.
    async fn prepare(&self, sql: &str) -> Result<Box<dyn DmlStatement>>;

    /// Commit the current transaction.
    async fn commit(&self) -> Result<()>;

    /// Roll back the current transaction.
    async fn rollback(&self) -> Result<()>;
}

/// Forward-only cursor over an ordered result stream.
#[async_trait]
pub trait RowCursor: Send {
    /// Advance to the next row. Returns `false` once exhausted.
    async fn advance(&mut self) -> Result<bool>;

    /// Read the value at 1-based `ordinal` from the current row using the
    /// dialect-resolved type. NULL columns come back as a typed
    /// [`SqlValue::Null`].
    fn value(&self, ordinal: usize, ty: SqlType) -> Result<SqlValue>;
}

/// A prepared DML statement with batch accumulation.
///
/// Parameter ordinals are 1-based, matching the `?` placeholders of the
/// statement text.
#[async_trait]
pub trait DmlStatement: Send {
    /// Clear all bound parameters.
    fn clear_parameters(&mut self);

    /// Bind a parameter; NULL values bind as typed NULL.
    fn bind(&mut self, ordinal: usize, value: SqlValue, ty: SqlType) -> Result<()>;

    /// Append the current parameter set to the pending batch.
    fn add_batch(&mut self) -> Result<()>;

    /// Submit the pending batch to the driver and clear it.
    async fn execute_batch(&mut self) -> Result<()>;

    /// Release the statement. Called at most once; dropping an unclosed
    /// statement must also release it.
    async fn close(&mut self) -> Result<()>;
}
