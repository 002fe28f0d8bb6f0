//! Dual-cursor merge-join over the source and target result streams.
//!
//! Both cursors yield rows ordered by the primary key under the same total
//! order the comparator implements, with unique key tuples per stream. The
//! loop walks them in parallel and turns the classic three-way partition into
//! DML: source surplus becomes INSERT, target surplus becomes DELETE, and a
//! key match becomes an UPDATE only when some value column actually differs.

use std::cmp::Ordering;

use tokio_util::sync::CancellationToken;

use crate::batch::BatchSet;
use crate::catalog::{ColumnProjection, TableProperties};
use crate::dialect::Dialect;
use crate::driver::RowCursor;
use crate::error::{Result, SyncError};
use crate::value::{compare_keys, values_equal, SqlType};

/// Resolve the type code for every projected column, in select order.
pub(crate) fn resolve_column_types(
    table: &TableProperties,
    projection: &ColumnProjection,
    dialect: &dyn Dialect,
) -> Result<Vec<SqlType>> {
    projection
        .select_cols
        .iter()
        .map(|name| Ok(dialect.column_type(table.require_column(name)?)))
        .collect()
}

/// Run the merge, pushing decisions into the table's batches.
///
/// Cursors must be positioned *before* their first row; the loop advances
/// them. Row consumption is strictly single-threaded - the parallelism of
/// the two SELECTs ended before this function is called.
pub(crate) async fn merge_cursors(
    source: &mut dyn RowCursor,
    target: &mut dyn RowCursor,
    projection: &ColumnProjection,
    column_types: &[SqlType],
    batches: &mut BatchSet,
    cancel: &CancellationToken,
) -> Result<()> {
    let pk_len = projection.pk_len();
    let select_len = projection.select_cols.len();
    let value_len = select_len - pk_len;

    let mut has_source = source.advance().await?;
    let mut has_target = target.advance().await?;

    while has_source || has_target {
        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        let cmp = if !has_source {
            // target surplus
            Ordering::Greater
        } else if !has_target {
            // source surplus
            Ordering::Less
        } else {
            let mut cmp = Ordering::Equal;
            for i in 1..=pk_len {
                let ty = column_types[i - 1];
                let sv = source.value(i, ty)?;
                let tv = target.value(i, ty)?;
                cmp = compare_keys(&sv, &tv)?;
                if cmp != Ordering::Equal {
                    break;
                }
            }
            cmp
        };

        match cmp {
            Ordering::Greater => {
                let delete = &mut batches.delete;
                delete.clear_parameters();
                for i in 1..=pk_len {
                    let ty = column_types[i - 1];
                    delete.bind(i, target.value(i, ty)?, ty)?;
                }
                delete.submit().await?;
            }
            Ordering::Less => {
                let insert = &mut batches.insert;
                insert.clear_parameters();
                for i in 1..=select_len {
                    let ty = column_types[i - 1];
                    insert.bind(i, source.value(i, ty)?, ty)?;
                }
                insert.submit().await?;
            }
            Ordering::Equal => {
                if let Some(update) = batches.update.as_mut() {
                    update.clear_parameters();

                    let mut updated = false;
                    for i in pk_len + 1..=select_len {
                        let ty = column_types[i - 1];
                        let sv = source.value(i, ty)?;
                        let tv = target.value(i, ty)?;

                        updated |= sv.is_null() != tv.is_null();
                        updated |=
                            !sv.is_null() && !tv.is_null() && !values_equal(&sv, &tv);

                        update.bind(i - pk_len, sv, ty)?;
                    }

                    if updated {
                        for i in 1..=pk_len {
                            let ty = column_types[i - 1];
                            update.bind(value_len + i, target.value(i, ty)?, ty)?;
                        }
                        update.submit().await?;
                    }
                }
            }
        }

        // a key tie advances both sides, so neither stream can stall the other
        if has_source && cmp != Ordering::Greater {
            has_source = source.advance().await?;
        }
        if has_target && cmp != Ordering::Less {
            has_target = target.advance().await?;
        }
    }

    Ok(())
}
