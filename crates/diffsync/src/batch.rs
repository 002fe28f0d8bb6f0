//! Flush-bounded batching over prepared DML statements.

use tracing::debug;

use crate::driver::{DmlStatement, SyncConnection};
use crate::error::Result;
use crate::statement::TableStatements;
use crate::value::{SqlType, SqlValue};

/// Per-operation row counters for one table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TableCounts {
    /// Rows inserted into the target.
    pub inserts: u64,

    /// Rows updated on the target.
    pub updates: u64,

    /// Rows deleted from the target.
    pub deletes: u64,
}

/// One prepared statement plus its pending-count bookkeeping.
///
/// Adds flush automatically every `max_batch` rows; residuals are flushed by
/// [`DmlBatch::flush_residual`] at table end. The driver never sees a batch
/// larger than the bound.
pub struct DmlBatch {
    stmt: Box<dyn DmlStatement>,
    max_batch: usize,
    count: u64,
    closed: bool,
}

impl DmlBatch {
    /// Wrap a prepared statement with the given flush bound.
    pub fn new(stmt: Box<dyn DmlStatement>, max_batch: usize) -> Self {
        debug_assert!(max_batch >= 1);
        Self {
            stmt,
            max_batch,
            count: 0,
            closed: false,
        }
    }

    /// Rows added so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Clear bind parameters ahead of the next row.
    pub fn clear_parameters(&mut self) {
        self.stmt.clear_parameters();
    }

    /// Bind a parameter at 1-based `ordinal`.
    pub fn bind(&mut self, ordinal: usize, value: SqlValue, ty: SqlType) -> Result<()> {
        self.stmt.bind(ordinal, value, ty)
    }

    /// Add the bound row to the batch, flushing at the bound.
    pub async fn submit(&mut self) -> Result<()> {
        self.stmt.add_batch()?;
        self.count += 1;
        if self.count % self.max_batch as u64 == 0 {
            self.stmt.execute_batch().await?;
        }
        Ok(())
    }

    /// Flush rows left over since the last full batch.
    pub async fn flush_residual(&mut self) -> Result<()> {
        if self.count % self.max_batch as u64 != 0 {
            self.stmt.execute_batch().await?;
        }
        Ok(())
    }

    /// Release the statement. Safe to call more than once; only the first
    /// call reaches the driver.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stmt.close().await
    }
}

/// The three per-table batches (UPDATE absent for pure-key tables).
pub struct BatchSet {
    pub(crate) insert: DmlBatch,
    pub(crate) update: Option<DmlBatch>,
    pub(crate) delete: DmlBatch,
}

impl BatchSet {
    /// Prepare the DML statements on the target connection.
    pub async fn prepare(
        target: &dyn SyncConnection,
        statements: &TableStatements,
        max_batch: usize,
    ) -> Result<Self> {
        let delete = DmlBatch::new(target.prepare(&statements.delete).await?, max_batch);
        let insert = DmlBatch::new(target.prepare(&statements.insert).await?, max_batch);
        let update = match &statements.update {
            Some(sql) => Some(DmlBatch::new(target.prepare(sql).await?, max_batch)),
            None => None,
        };

        Ok(Self {
            insert,
            update,
            delete,
        })
    }

    /// Flush residual rows on all three batches and release the statements.
    pub async fn finish(&mut self) -> Result<()> {
        self.delete.flush_residual().await?;
        self.delete.close().await?;

        self.insert.flush_residual().await?;
        self.insert.close().await?;

        if let Some(update) = self.update.as_mut() {
            update.flush_residual().await?;
            update.close().await?;
        }

        Ok(())
    }

    /// Best-effort release on error paths; close failures are logged, not
    /// surfaced, so the original error stays visible.
    pub async fn abandon(&mut self) {
        for batch in [Some(&mut self.delete), Some(&mut self.insert), self.update.as_mut()]
            .into_iter()
            .flatten()
        {
            if let Err(e) = batch.close().await {
                debug!("statement close failed during cleanup: {}", e);
            }
        }
    }

    /// Row counters accumulated so far.
    #[must_use]
    pub fn counts(&self) -> TableCounts {
        TableCounts {
            inserts: self.insert.count(),
            updates: self.update.as_ref().map_or(0, DmlBatch::count),
            deletes: self.delete.count(),
        }
    }
}
