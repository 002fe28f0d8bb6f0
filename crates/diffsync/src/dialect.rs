//! SQL dialect seam.
//!
//! The synchronizer is dialect-agnostic: everything engine-specific it needs
//! is the mapping from catalog column metadata to a bindable type code.
//! Identifier quoting and DDL stay with the host's dialect layer.

use tracing::debug;

use crate::catalog::ColumnProperties;
use crate::value::SqlType;

/// SQL syntax strategy consumed by the synchronizer.
///
/// # Design Pattern
///
/// This is a **Strategy** pattern - different implementations provide
/// interchangeable type resolution rules per database engine.
pub trait Dialect: Send + Sync {
    /// Get the dialect identifier (e.g., "postgres", "mssql").
    fn name(&self) -> &str;

    /// Resolve a catalog column to the type code used for reads and binds.
    fn column_type(&self, column: &ColumnProperties) -> SqlType;
}

/// Dialect for engines that follow ANSI-ish type naming.
///
/// Covers the common PostgreSQL / SQL Server / MySQL spellings; unknown
/// type names fall back to text binding.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiDialect;

impl AnsiDialect {
    /// Create a new ANSI dialect.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for AnsiDialect {
    fn name(&self) -> &str {
        "ansi"
    }

    fn column_type(&self, column: &ColumnProperties) -> SqlType {
        match column.data_type.to_lowercase().as_str() {
            "bool" | "boolean" | "bit" => SqlType::Bool,
            "smallint" | "int2" | "tinyint" => SqlType::SmallInt,
            "int" | "integer" | "int4" | "serial" | "mediumint" => SqlType::Int,
            "bigint" | "int8" | "bigserial" => SqlType::BigInt,
            "real" | "float4" => SqlType::Real,
            "double precision" | "float8" | "float" | "double" => SqlType::Double,
            "decimal" | "numeric" | "money" | "smallmoney" => SqlType::Decimal,
            "char" | "nchar" | "varchar" | "nvarchar" | "character" | "character varying"
            | "text" | "ntext" | "clob" => SqlType::Text,
            "binary" | "varbinary" | "bytea" | "blob" | "image" => SqlType::Bytes,
            "uuid" | "uniqueidentifier" => SqlType::Uuid,
            "timestamp" | "timestamptz" | "timestamp with time zone"
            | "timestamp without time zone" | "datetime" | "datetime2" | "smalldatetime" => {
                SqlType::Timestamp
            }
            "date" => SqlType::Date,
            "time" | "timetz" | "time with time zone" | "time without time zone" => SqlType::Time,
            other => {
                debug!("unmapped data type {:?}, binding as text", other);
                SqlType::Text
            }
        }
    }
}
