//! Synchronization context and the collaborators invoked around the table loop.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::catalog::Catalog;
use crate::dialect::Dialect;
use crate::driver::SyncConnection;
use crate::error::Result;

/// Constraint choreography on the target database.
///
/// Foreign keys and unique constraints are dropped before the first table and
/// restored after the last so row mutations can land in any order. The host's
/// DDL layer implements this against its own dialect.
#[async_trait]
pub trait ConstraintOps: Send + Sync {
    /// Drop all foreign keys on the target.
    async fn drop_foreign_keys(&self, target: &dyn SyncConnection) -> Result<()>;

    /// Drop all unique constraints on the target.
    async fn drop_unique_constraints(&self, target: &dyn SyncConnection) -> Result<()>;

    /// Re-create the unique constraints dropped earlier.
    async fn restore_unique_constraints(&self, target: &dyn SyncConnection) -> Result<()>;

    /// Re-create the foreign keys dropped earlier.
    async fn restore_foreign_keys(&self, target: &dyn SyncConnection) -> Result<()>;
}

/// Identity and sequence reseeding after the row pass.
#[async_trait]
pub trait SequenceOps: Send + Sync {
    /// Align target identity columns with the source.
    async fn synchronize_identity_columns(
        &self,
        source: &dyn SyncConnection,
        target: &dyn SyncConnection,
    ) -> Result<()>;

    /// Align target sequences with the source.
    async fn synchronize_sequences(
        &self,
        source: &dyn SyncConnection,
        target: &dyn SyncConnection,
    ) -> Result<()>;
}

/// Everything a synchronization run needs, owned by the caller.
///
/// The connections outlive the strategy invocation; the catalog is a
/// read-only snapshot of the source schema taken before the run.
pub struct SyncContext {
    /// Authoritative side. Read only.
    pub source: Arc<dyn SyncConnection>,

    /// Drifted side, brought into equality with the source.
    pub target: Arc<dyn SyncConnection>,

    /// Type resolution for reads and binds.
    pub dialect: Arc<dyn Dialect>,

    /// Snapshot of the source schema.
    pub catalog: Catalog,

    /// Constraint teardown/restoration collaborator.
    pub constraints: Arc<dyn ConstraintOps>,

    /// Identity/sequence reseeding collaborator.
    pub sequences: Arc<dyn SequenceOps>,

    /// Cooperative cancellation signal checked at row and table boundaries.
    pub cancel: CancellationToken,
}

impl SyncContext {
    /// Create a context with a fresh cancellation token.
    pub fn new(
        source: Arc<dyn SyncConnection>,
        target: Arc<dyn SyncConnection>,
        dialect: Arc<dyn Dialect>,
        catalog: Catalog,
        constraints: Arc<dyn ConstraintOps>,
        sequences: Arc<dyn SequenceOps>,
    ) -> Self {
        Self {
            source,
            target,
            dialect,
            catalog,
            constraints,
            sequences,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}
