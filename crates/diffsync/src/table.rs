//! Single-table synchronization inside one target transaction.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::batch::{BatchSet, TableCounts};
use crate::catalog::{ColumnProjection, TableProperties};
use crate::config::VersionMatcher;
use crate::context::SyncContext;
use crate::error::{Result, SyncError};
use crate::merge::{merge_cursors, resolve_column_types};
use crate::statement::TableStatements;

/// Outcome of one table's synchronization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    /// Qualified table name.
    pub table: String,

    /// Row counters for the table.
    pub counts: TableCounts,

    /// When the table finished.
    pub completed_at: DateTime<Utc>,
}

/// Synchronize one table: project, select both sides in parallel, merge,
/// drain batches, commit.
///
/// The caller rolls back the target transaction when this returns an error;
/// statements and cursors created here are released on every exit path.
pub(crate) async fn synchronize_table(
    ctx: &SyncContext,
    table: &TableProperties,
    version: Option<&VersionMatcher>,
    fetch_size: u32,
    max_batch: usize,
) -> Result<TableReport> {
    let projection = ColumnProjection::resolve(table, version)?;
    let statements = TableStatements::build(&table.name, &projection);

    debug!("{}", statements.select);
    debug!("{}", statements.delete);
    debug!("{}", statements.insert);
    if let Some(update) = &statements.update {
        debug!("{}", update);
    }

    let column_types = resolve_column_types(table, &projection, ctx.dialect.as_ref())?;

    // Fill both cursors in parallel: the target SELECT goes to a worker while
    // the source SELECT runs here. Rows are only consumed after both exist.
    let target = Arc::clone(&ctx.target);
    let target_select = statements.select.clone();
    let pending_target =
        tokio::spawn(async move { target.query(&target_select, fetch_size).await });

    let mut source_cursor = ctx.source.query(&statements.select, fetch_size).await?;
    let mut target_cursor = pending_target
        .await
        .map_err(|e| SyncError::Task(e.to_string()))??;

    let mut batches = BatchSet::prepare(ctx.target.as_ref(), &statements, max_batch).await?;

    let merged = merge_cursors(
        source_cursor.as_mut(),
        target_cursor.as_mut(),
        &projection,
        &column_types,
        &mut batches,
        &ctx.cancel,
    )
    .await;

    if let Err(e) = merged {
        batches.abandon().await;
        return Err(e);
    }

    if let Err(e) = batches.finish().await {
        batches.abandon().await;
        return Err(e);
    }

    ctx.target.commit().await?;

    let counts = batches.counts();
    info!("{}: inserted {} rows", table.name, counts.inserts);
    info!("{}: updated {} rows", table.name, counts.updates);
    info!("{}: deleted {} rows", table.name, counts.deletes);

    Ok(TableReport {
        table: table.name.clone(),
        counts,
        completed_at: Utc::now(),
    })
}
