//! # diffsync
//!
//! Differential row-level synchronization for drifted database replicas.
//!
//! Given connections to two schema-identical databases, the strategy brings
//! the target's row contents into equality with the source's by transferring
//! only the differences, table by table:
//!
//! - **Merge-join** over the two primary-key-ordered result streams, driven
//!   in parallel (the target SELECT runs on a worker task)
//! - **Constraint choreography**: foreign keys and unique constraints are
//!   dropped on the target around the mutation window and restored afterwards
//! - **Batched DML** with one target transaction per table
//! - **Type-aware equality** including binary blobs and NULL transitions
//! - An optional **version column** fast path for wide tables
//!
//! Cluster membership, schema introspection, identifier quoting, and DDL stay
//! with the host: they come in through the [`SyncContext`] as read-only
//! snapshots and collaborator traits.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use diffsync::{
//!     Catalog, DifferentialSyncStrategy, SyncConfig, SyncContext,
//! };
//!
//! # async fn run(
//! #     source: Arc<dyn diffsync::SyncConnection>,
//! #     target: Arc<dyn diffsync::SyncConnection>,
//! #     dialect: Arc<dyn diffsync::Dialect>,
//! #     catalog: Catalog,
//! #     constraints: Arc<dyn diffsync::ConstraintOps>,
//! #     sequences: Arc<dyn diffsync::SequenceOps>,
//! # ) -> diffsync::Result<()> {
//! let config = SyncConfig::default()
//!     .with_max_batch_size(500)
//!     .with_version_pattern("row_version");
//!
//! let ctx = SyncContext::new(source, target, dialect, catalog, constraints, sequences);
//! let strategy = DifferentialSyncStrategy::new(&config)?;
//! let report = strategy.synchronize(&ctx).await?;
//! println!("inserted {} rows", report.total_inserts());
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod catalog;
pub mod config;
pub mod context;
pub mod dialect;
pub mod driver;
pub mod error;
mod merge;
pub mod statement;
pub mod strategy;
pub mod table;
pub mod value;

#[cfg(test)]
mod testing;

// Re-exports for convenient access
pub use batch::TableCounts;
pub use catalog::{Catalog, ColumnProjection, ColumnProperties, TableProperties};
pub use config::{SyncConfig, VersionMatcher};
pub use context::{ConstraintOps, SequenceOps, SyncContext};
pub use dialect::{AnsiDialect, Dialect};
pub use driver::{DmlStatement, RowCursor, SyncConnection};
pub use error::{Result, SyncError};
pub use statement::TableStatements;
pub use strategy::{DifferentialSyncStrategy, SyncReport};
pub use table::TableReport;
pub use value::{SqlType, SqlValue};
