//! Read-only schema snapshot consumed by the synchronizer.
//!
//! The catalog is produced by the host's introspection layer and handed in
//! through the [`SyncContext`](crate::context::SyncContext); the strategy
//! never mutates it. Tables iterate in catalog order and each table exposes
//! its columns in catalog order together with an ordered primary key.

use serde::{Deserialize, Serialize};

use crate::config::VersionMatcher;
use crate::error::{Result, SyncError};

/// Column metadata as the catalog reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProperties {
    /// Column name.
    pub name: String,

    /// Data type name (e.g., "int", "varchar", "bytea").
    pub data_type: String,

    /// Numeric precision.
    #[serde(default)]
    pub precision: i32,

    /// Numeric scale.
    #[serde(default)]
    pub scale: i32,

    /// Whether the column allows NULL.
    #[serde(default)]
    pub is_nullable: bool,

    /// Whether the column is an identity column.
    #[serde(default)]
    pub is_identity: bool,
}

/// Table metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableProperties {
    /// Qualified table name, emitted verbatim into SQL.
    pub name: String,

    /// Column definitions in catalog order.
    pub columns: Vec<ColumnProperties>,

    /// Ordered primary key column names. Must be non-empty for sync.
    pub primary_key: Vec<String>,
}

impl TableProperties {
    /// Column names in catalog order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Look up a column's properties by name.
    pub fn column_properties(&self, name: &str) -> Option<&ColumnProperties> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up a column's properties, failing on catalog inconsistency.
    pub fn require_column(&self, name: &str) -> Result<&ColumnProperties> {
        self.column_properties(name).ok_or_else(|| {
            SyncError::Catalog(format!(
                "column {} not present in table {}",
                name, self.name
            ))
        })
    }

    /// Check if the table has a primary key.
    #[must_use]
    pub fn has_primary_key(&self) -> bool {
        !self.primary_key.is_empty()
    }
}

/// Ordered snapshot of the source schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    tables: Vec<TableProperties>,
}

impl Catalog {
    /// Create a catalog from tables in iteration order.
    pub fn new(tables: Vec<TableProperties>) -> Self {
        Self { tables }
    }

    /// Tables in catalog order.
    pub fn tables(&self) -> &[TableProperties] {
        &self.tables
    }
}

/// The ordered column lists read from each side of a table during the merge.
///
/// `select_cols` always starts with the primary key columns, followed by the
/// value columns: the single version column when one is configured and
/// matched, otherwise every non-key column.
#[derive(Debug, Clone)]
pub struct ColumnProjection {
    /// Primary-key columns in catalog order (non-empty).
    pub pk_cols: Vec<String>,

    /// All other columns in catalog order.
    pub non_pk_cols: Vec<String>,

    /// The version column, when the pattern matched exactly one non-key column.
    pub version_col: Option<String>,

    /// Columns read from each side: primary key first, then value columns.
    pub select_cols: Vec<String>,
}

impl ColumnProjection {
    /// Resolve the projection for a table, failing fast on a missing primary key.
    ///
    /// A version pattern that matches zero or several non-key columns is
    /// ignored and the projection falls back to all non-key columns.
    pub fn resolve(table: &TableProperties, version: Option<&VersionMatcher>) -> Result<Self> {
        if !table.has_primary_key() {
            return Err(SyncError::NoPrimaryKey(table.name.clone()));
        }

        let pk_cols = table.primary_key.clone();

        let mut version_candidates = Vec::new();
        let mut non_pk_cols = Vec::with_capacity(table.columns.len());

        for column in table.column_names() {
            if pk_cols.iter().any(|pk| pk == column) {
                continue;
            }
            if let Some(matcher) = version {
                if matcher.matches(column) {
                    version_candidates.push(column.to_string());
                }
            }
            non_pk_cols.push(column.to_string());
        }

        let version_col = if version_candidates.len() == 1 {
            version_candidates.pop()
        } else {
            None
        };

        let mut select_cols = pk_cols.clone();
        match &version_col {
            Some(v) => select_cols.push(v.clone()),
            None => select_cols.extend(non_pk_cols.iter().cloned()),
        }

        Ok(Self {
            pk_cols,
            non_pk_cols,
            version_col,
            select_cols,
        })
    }

    /// Number of primary-key columns.
    #[must_use]
    pub fn pk_len(&self) -> usize {
        self.pk_cols.len()
    }

    /// The value columns of the projection (everything after the key).
    #[must_use]
    pub fn value_cols(&self) -> &[String] {
        &self.select_cols[self.pk_cols.len()..]
    }
}
