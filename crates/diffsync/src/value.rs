//! Typed SQL values and the comparisons that drive the merge-join.
//!
//! Row values travel through the synchronizer as [`SqlValue`], a tagged
//! representation carrying the dialect-resolved type code. NULLs keep their
//! column's type code so statements can bind typed NULLs.

use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{Result, SyncError};

/// Dialect-resolved SQL type code for a column.
///
/// This is what a [`Dialect`](crate::dialect::Dialect) maps catalog column
/// metadata onto, and what drivers receive alongside every bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Bool,
    SmallInt,
    Int,
    BigInt,
    Real,
    Double,
    Decimal,
    Text,
    Bytes,
    Uuid,
    Timestamp,
    Date,
    Time,
}

/// A single column value read from a cursor.
///
/// `Null` carries the column's type code for typed NULL binding; every other
/// variant is the deserialized form the driver produced for that type code.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL with the column's type code.
    Null(SqlType),

    /// Boolean value.
    Bool(bool),

    /// 16-bit signed integer (smallint).
    I16(i16),

    /// 32-bit signed integer (int).
    I32(i32),

    /// 64-bit signed integer (bigint).
    I64(i64),

    /// 32-bit floating point (real/float4).
    F32(f32),

    /// 64-bit floating point (double precision/float8).
    F64(f64),

    /// Text/string data.
    Text(String),

    /// Binary data.
    Bytes(Vec<u8>),

    /// UUID/GUID value.
    Uuid(Uuid),

    /// Decimal value with arbitrary precision.
    Decimal(Decimal),

    /// Timestamp without timezone.
    DateTime(NaiveDateTime),

    /// Date without time component.
    Date(NaiveDate),

    /// Time without date component.
    Time(NaiveTime),
}

impl SqlValue {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null(_))
    }

    /// The type code for this value (the column's code for NULLs).
    #[must_use]
    pub fn type_code(&self) -> SqlType {
        match self {
            SqlValue::Null(t) => *t,
            SqlValue::Bool(_) => SqlType::Bool,
            SqlValue::I16(_) => SqlType::SmallInt,
            SqlValue::I32(_) => SqlType::Int,
            SqlValue::I64(_) => SqlType::BigInt,
            SqlValue::F32(_) => SqlType::Real,
            SqlValue::F64(_) => SqlType::Double,
            SqlValue::Text(_) => SqlType::Text,
            SqlValue::Bytes(_) => SqlType::Bytes,
            SqlValue::Uuid(_) => SqlType::Uuid,
            SqlValue::Decimal(_) => SqlType::Decimal,
            SqlValue::DateTime(_) => SqlType::Timestamp,
            SqlValue::Date(_) => SqlType::Date,
            SqlValue::Time(_) => SqlType::Time,
        }
    }

    /// Short name of the value's kind, for error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            SqlValue::Null(_) => "null",
            SqlValue::Bool(_) => "bool",
            SqlValue::I16(_) => "smallint",
            SqlValue::I32(_) => "int",
            SqlValue::I64(_) => "bigint",
            SqlValue::F32(_) => "real",
            SqlValue::F64(_) => "double",
            SqlValue::Text(_) => "text",
            SqlValue::Bytes(_) => "bytes",
            SqlValue::Uuid(_) => "uuid",
            SqlValue::Decimal(_) => "decimal",
            SqlValue::DateTime(_) => "timestamp",
            SqlValue::Date(_) => "date",
            SqlValue::Time(_) => "time",
        }
    }
}

// Convenience conversions for common types
impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i16> for SqlValue {
    fn from(v: i16) -> Self {
        SqlValue::I16(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::I32(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::I64(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::F64(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        SqlValue::Uuid(v)
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

/// Total-order comparison of two primary-key values.
///
/// Both streams are assumed to yield mutually comparable values for the same
/// key ordinal. Integral widths are normalized before comparing, as are the
/// two float widths; decimals compare against integrals through `Decimal`.
/// Floats use IEEE total ordering so the merge can never see an unordered
/// pair. Anything else cross-kind (including NULL, which has no place in a
/// primary key here) is rejected explicitly rather than given an arbitrary
/// order.
pub fn compare_keys(a: &SqlValue, b: &SqlValue) -> Result<Ordering> {
    use SqlValue::*;

    if let (Some(x), Some(y)) = (as_integral(a), as_integral(b)) {
        return Ok(x.cmp(&y));
    }

    let ord = match (a, b) {
        (F32(x), F32(y)) => (*x as f64).total_cmp(&(*y as f64)),
        (F64(x), F64(y)) => x.total_cmp(y),
        (F32(x), F64(y)) => (*x as f64).total_cmp(y),
        (F64(x), F32(y)) => x.total_cmp(&(*y as f64)),
        (Decimal(x), Decimal(y)) => x.cmp(y),
        (Decimal(x), _) => match as_integral(b) {
            Some(y) => x.cmp(&rust_decimal::Decimal::from(y)),
            None => return Err(incomparable(a, b)),
        },
        (_, Decimal(y)) => match as_integral(a) {
            Some(x) => rust_decimal::Decimal::from(x).cmp(y),
            None => return Err(incomparable(a, b)),
        },
        (Bool(x), Bool(y)) => x.cmp(y),
        (Text(x), Text(y)) => x.cmp(y),
        (Bytes(x), Bytes(y)) => x.cmp(y),
        (Uuid(x), Uuid(y)) => x.cmp(y),
        (DateTime(x), DateTime(y)) => x.cmp(y),
        (Date(x), Date(y)) => x.cmp(y),
        (Time(x), Time(y)) => x.cmp(y),
        _ => return Err(incomparable(a, b)),
    };

    Ok(ord)
}

/// Equality of two non-null value-column values.
///
/// Byte arrays compare by length then content; floats compare bitwise so a
/// NaN on both sides does not report an endless difference; everything else
/// delegates to the deserialized type's own equality. The caller handles
/// NULLs before getting here.
#[must_use]
pub fn values_equal(a: &SqlValue, b: &SqlValue) -> bool {
    use SqlValue::*;

    match (a, b) {
        (Bytes(x), Bytes(y)) => x.len() == y.len() && x == y,
        (F32(x), F32(y)) => x.to_bits() == y.to_bits(),
        (F64(x), F64(y)) => x.to_bits() == y.to_bits(),
        _ => a == b,
    }
}

fn as_integral(v: &SqlValue) -> Option<i64> {
    match v {
        SqlValue::I16(x) => Some(*x as i64),
        SqlValue::I32(x) => Some(*x as i64),
        SqlValue::I64(x) => Some(*x),
        _ => None,
    }
}

fn incomparable(a: &SqlValue, b: &SqlValue) -> SyncError {
    SyncError::Incomparable {
        left: a.kind_name(),
        right: b.kind_name(),
    }
}
