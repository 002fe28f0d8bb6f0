//! Per-table SQL text generation.
//!
//! Identifiers come verbatim from the catalog; all variability is
//! parameterized, so the texts contain no literal values. Quoting, when an
//! engine needs it, belongs to the host's dialect layer that produced the
//! catalog names.

use crate::catalog::ColumnProjection;

/// The four SQL texts driving one table's synchronization.
#[derive(Debug, Clone)]
pub struct TableStatements {
    /// `SELECT {select_cols} FROM {table} ORDER BY {pk_cols}` - run on both sides.
    pub select: String,

    /// `DELETE FROM {table} WHERE pk1 = ? AND ...`
    pub delete: String,

    /// `INSERT INTO {table} ({select_cols}) VALUES (?, ...)`
    pub insert: String,

    /// `UPDATE {table} SET v1 = ?, ... WHERE pk1 = ? AND ...` - absent for
    /// pure-key tables.
    pub update: Option<String>,
}

impl TableStatements {
    /// Build the texts for a table from its resolved projection.
    pub fn build(table: &str, projection: &ColumnProjection) -> Self {
        let select_list = projection.select_cols.join(", ");
        let order_list = projection.pk_cols.join(", ");
        let pk_where = format!("{} = ?", projection.pk_cols.join(" = ? AND "));

        let select = format!(
            "SELECT {} FROM {} ORDER BY {}",
            select_list, table, order_list
        );

        let delete = format!("DELETE FROM {} WHERE {}", table, pk_where);

        let placeholders = vec!["?"; projection.select_cols.len()].join(", ");
        let insert = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table, select_list, placeholders
        );

        let update = if projection.non_pk_cols.is_empty() {
            None
        } else {
            let set_list = format!("{} = ?", projection.value_cols().join(" = ?, "));
            Some(format!(
                "UPDATE {} SET {} WHERE {}",
                table, set_list, pk_where
            ))
        };

        Self {
            select,
            delete,
            insert,
            update,
        }
    }
}
