//! In-memory driver fakes backing the scenario tests.
//!
//! `MemServer` is a tiny transactional table store; `MemConnection` speaks the
//! driver traits over it, understanding exactly the SQL shapes the statement
//! builder emits. Constraint and sequence collaborators record their calls so
//! tests can assert the choreography around the table loop.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::catalog::{ColumnProperties, TableProperties};
use crate::context::{ConstraintOps, SequenceOps};
use crate::dialect::{AnsiDialect, Dialect};
use crate::driver::{DmlStatement, RowCursor, SyncConnection};
use crate::error::{Result, SyncError};
use crate::value::{compare_keys, values_equal, SqlType, SqlValue};

pub fn int(v: i64) -> SqlValue {
    SqlValue::I64(v)
}

pub fn text(v: &str) -> SqlValue {
    SqlValue::Text(v.to_string())
}

pub fn bytes(v: &[u8]) -> SqlValue {
    SqlValue::Bytes(v.to_vec())
}

pub fn null(ty: SqlType) -> SqlValue {
    SqlValue::Null(ty)
}

/// Column layout of one fake table: names, declared types, and how many
/// leading columns form the primary key.
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<(String, String)>,
    pub pk_len: usize,
}

impl TableSpec {
    pub fn new(name: &str, columns: &[(&str, &str)], pk_len: usize) -> Self {
        Self {
            name: name.to_string(),
            columns: columns
                .iter()
                .map(|(n, t)| (n.to_string(), t.to_string()))
                .collect(),
            pk_len,
        }
    }

    /// Catalog view of this table.
    pub fn table_properties(&self) -> TableProperties {
        TableProperties {
            name: self.name.clone(),
            columns: self
                .columns
                .iter()
                .map(|(n, t)| ColumnProperties {
                    name: n.clone(),
                    data_type: t.clone(),
                    precision: 0,
                    scale: 0,
                    is_nullable: true,
                    is_identity: false,
                })
                .collect(),
            primary_key: self
                .columns
                .iter()
                .take(self.pk_len)
                .map(|(n, _)| n.clone())
                .collect(),
        }
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _)| n == name)
    }

    fn null_for(&self, index: usize) -> SqlValue {
        let props = ColumnProperties {
            name: self.columns[index].0.clone(),
            data_type: self.columns[index].1.clone(),
            precision: 0,
            scale: 0,
            is_nullable: true,
            is_identity: false,
        };
        SqlValue::Null(AnsiDialect::new().column_type(&props))
    }
}

struct MemTable {
    spec: TableSpec,
    rows: Vec<Vec<SqlValue>>,
}

#[derive(Default)]
struct MemState {
    tables: HashMap<String, MemTable>,
    fail_flush: HashSet<String>,
    fail_query: HashSet<String>,
    fks_dropped: bool,
    uniques_dropped: bool,
    events: Vec<String>,
    commits: Vec<(bool, bool)>,
    rollbacks: usize,
    fetch_sizes: Vec<u32>,
}

/// One fake database shared by its connections.
#[derive(Clone)]
pub struct MemServer {
    inner: Arc<Mutex<MemState>>,
}

impl MemServer {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemState::default())),
        }
    }

    pub fn create_table(&self, spec: TableSpec, rows: Vec<Vec<SqlValue>>) {
        let mut state = self.inner.lock().unwrap();
        state
            .tables
            .insert(spec.name.clone(), MemTable { spec, rows });
    }

    /// Make every batch flush against `table` fail with a driver error.
    pub fn fail_flush_on(&self, table: &str) {
        self.inner.lock().unwrap().fail_flush.insert(table.to_string());
    }

    /// Make every SELECT against `table` fail with a driver error.
    pub fn fail_query_on(&self, table: &str) {
        self.inner.lock().unwrap().fail_query.insert(table.to_string());
    }

    /// Committed rows of a table, sorted by its primary key.
    pub fn rows(&self, table: &str) -> Vec<Vec<SqlValue>> {
        let state = self.inner.lock().unwrap();
        let t = state.tables.get(table).expect("unknown table");
        let pk_len = t.spec.pk_len;
        let mut rows = t.rows.clone();
        rows.sort_by(|a, b| compare_rows(a, b, pk_len));
        rows
    }

    /// Collaborator calls in invocation order.
    pub fn events(&self) -> Vec<String> {
        self.inner.lock().unwrap().events.clone()
    }

    /// (fks_dropped, uniques_dropped) snapshots taken at each commit.
    pub fn commit_envelopes(&self) -> Vec<(bool, bool)> {
        self.inner.lock().unwrap().commits.clone()
    }

    pub fn rollbacks(&self) -> usize {
        self.inner.lock().unwrap().rollbacks
    }

    /// Fetch sizes passed to each SELECT, in query order.
    pub fn fetch_sizes(&self) -> Vec<u32> {
        self.inner.lock().unwrap().fetch_sizes.clone()
    }

    fn record_event(&self, event: &str) {
        self.inner.lock().unwrap().events.push(event.to_string());
    }
}

fn compare_rows(a: &[SqlValue], b: &[SqlValue], pk_len: usize) -> Ordering {
    for i in 0..pk_len {
        match compare_keys(&a[i], &b[i]).unwrap_or(Ordering::Equal) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

enum Op {
    Insert {
        table: String,
        cols: Vec<String>,
        values: Vec<SqlValue>,
    },
    Update {
        table: String,
        set_cols: Vec<String>,
        set_values: Vec<SqlValue>,
        key_cols: Vec<String>,
        key_values: Vec<SqlValue>,
    },
    Delete {
        table: String,
        key_cols: Vec<String>,
        key_values: Vec<SqlValue>,
    },
}

fn apply_ops(state: &mut MemState, ops: Vec<Op>) {
    for op in ops {
        match op {
            Op::Insert {
                table,
                cols,
                values,
            } => {
                let t = state.tables.get_mut(&table).expect("unknown table");
                let mut row: Vec<SqlValue> = (0..t.spec.columns.len())
                    .map(|i| t.spec.null_for(i))
                    .collect();
                for (col, value) in cols.iter().zip(values) {
                    let idx = t.spec.column_index(col).expect("unknown column");
                    row[idx] = value;
                }
                t.rows.push(row);
            }
            Op::Update {
                table,
                set_cols,
                set_values,
                key_cols,
                key_values,
            } => {
                let t = state.tables.get_mut(&table).expect("unknown table");
                let key_idx: Vec<usize> = key_cols
                    .iter()
                    .map(|c| t.spec.column_index(c).expect("unknown column"))
                    .collect();
                let set_idx: Vec<usize> = set_cols
                    .iter()
                    .map(|c| t.spec.column_index(c).expect("unknown column"))
                    .collect();
                for row in &mut t.rows {
                    if key_idx
                        .iter()
                        .zip(&key_values)
                        .all(|(&i, v)| values_equal(&row[i], v))
                    {
                        for (&i, v) in set_idx.iter().zip(&set_values) {
                            row[i] = v.clone();
                        }
                    }
                }
            }
            Op::Delete {
                table,
                key_cols,
                key_values,
            } => {
                let t = state.tables.get_mut(&table).expect("unknown table");
                let key_idx: Vec<usize> = key_cols
                    .iter()
                    .map(|c| t.spec.column_index(c).expect("unknown column"))
                    .collect();
                t.rows.retain(|row| {
                    !key_idx
                        .iter()
                        .zip(&key_values)
                        .all(|(&i, v)| values_equal(&row[i], v))
                });
            }
        }
    }
}

struct ConnState {
    auto_commit: bool,
    pending: Vec<Op>,
}

/// A connection over a [`MemServer`], with a simple transaction journal.
pub struct MemConnection {
    server: MemServer,
    conn: Arc<Mutex<ConnState>>,
}

impl MemConnection {
    pub fn new(server: &MemServer) -> Self {
        Self {
            server: server.clone(),
            conn: Arc::new(Mutex::new(ConnState {
                auto_commit: true,
                pending: Vec::new(),
            })),
        }
    }
}

#[async_trait]
impl SyncConnection for MemConnection {
    async fn auto_commit(&self) -> Result<bool> {
        Ok(self.conn.lock().unwrap().auto_commit)
    }

    async fn set_auto_commit(&self, enabled: bool) -> Result<()> {
        self.conn.lock().unwrap().auto_commit = enabled;
        Ok(())
    }

    async fn query(&self, sql: &str, fetch_size: u32) -> Result<Box<dyn RowCursor>> {
        let (cols, table, order_cols) = parse_select(sql)?;
        let mut state = self.server.inner.lock().unwrap();
        state.fetch_sizes.push(fetch_size);
        if state.fail_query.contains(&table) {
            return Err(SyncError::driver("injected query failure", sql));
        }
        let t = state
            .tables
            .get(&table)
            .ok_or_else(|| SyncError::driver("unknown table", sql))?;

        let col_idx: Vec<usize> = cols
            .iter()
            .map(|c| {
                t.spec
                    .column_index(c)
                    .ok_or_else(|| SyncError::driver("unknown column", sql))
            })
            .collect::<Result<_>>()?;

        let mut rows: Vec<Vec<SqlValue>> = t
            .rows
            .iter()
            .map(|row| col_idx.iter().map(|&i| row[i].clone()).collect())
            .collect();

        let order_idx: Vec<usize> = order_cols
            .iter()
            .map(|c| cols.iter().position(|p| p == c).expect("order column"))
            .collect();
        rows.sort_by(|a, b| {
            for &i in &order_idx {
                match compare_keys(&a[i], &b[i]).unwrap_or(Ordering::Equal) {
                    Ordering::Equal => continue,
                    other => return other,
                }
            }
            Ordering::Equal
        });

        Ok(Box::new(MemCursor { rows, pos: None }))
    }

    async fn prepare(&self, sql: &str) -> Result<Box<dyn DmlStatement>> {
        let kind = parse_dml(sql)?;
        Ok(Box::new(MemStatement {
            server: self.server.clone(),
            conn: Arc::clone(&self.conn),
            kind,
            params: Vec::new(),
            batch: Vec::new(),
            closed: false,
        }))
    }

    async fn commit(&self) -> Result<()> {
        let ops = std::mem::take(&mut self.conn.lock().unwrap().pending);
        let mut state = self.server.inner.lock().unwrap();
        apply_ops(&mut state, ops);
        let envelope = (state.fks_dropped, state.uniques_dropped);
        state.commits.push(envelope);
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        self.conn.lock().unwrap().pending.clear();
        self.server.inner.lock().unwrap().rollbacks += 1;
        Ok(())
    }
}

struct MemCursor {
    rows: Vec<Vec<SqlValue>>,
    pos: Option<usize>,
}

#[async_trait]
impl RowCursor for MemCursor {
    async fn advance(&mut self) -> Result<bool> {
        let next = self.pos.map_or(0, |p| p + 1);
        self.pos = Some(next);
        Ok(next < self.rows.len())
    }

    fn value(&self, ordinal: usize, _ty: SqlType) -> Result<SqlValue> {
        let pos = self.pos.ok_or_else(|| {
            SyncError::driver("cursor not positioned on a row", "memdb cursor")
        })?;
        Ok(self.rows[pos][ordinal - 1].clone())
    }
}

enum DmlKind {
    Insert {
        table: String,
        cols: Vec<String>,
    },
    Update {
        table: String,
        set_cols: Vec<String>,
        key_cols: Vec<String>,
    },
    Delete {
        table: String,
        key_cols: Vec<String>,
    },
}

struct MemStatement {
    server: MemServer,
    conn: Arc<Mutex<ConnState>>,
    kind: DmlKind,
    params: Vec<Option<SqlValue>>,
    batch: Vec<Vec<SqlValue>>,
    closed: bool,
}

impl MemStatement {
    fn table(&self) -> &str {
        match &self.kind {
            DmlKind::Insert { table, .. } => table,
            DmlKind::Update { table, .. } => table,
            DmlKind::Delete { table, .. } => table,
        }
    }

    fn row_to_op(&self, row: Vec<SqlValue>) -> Op {
        match &self.kind {
            DmlKind::Insert { table, cols } => Op::Insert {
                table: table.clone(),
                cols: cols.clone(),
                values: row,
            },
            DmlKind::Update {
                table,
                set_cols,
                key_cols,
            } => {
                let (set_values, key_values) = row.split_at(set_cols.len());
                Op::Update {
                    table: table.clone(),
                    set_cols: set_cols.clone(),
                    set_values: set_values.to_vec(),
                    key_cols: key_cols.clone(),
                    key_values: key_values.to_vec(),
                }
            }
            DmlKind::Delete { table, key_cols } => Op::Delete {
                table: table.clone(),
                key_cols: key_cols.clone(),
                key_values: row,
            },
        }
    }
}

#[async_trait]
impl DmlStatement for MemStatement {
    fn clear_parameters(&mut self) {
        self.params.clear();
    }

    fn bind(&mut self, ordinal: usize, value: SqlValue, _ty: SqlType) -> Result<()> {
        if self.params.len() < ordinal {
            self.params.resize(ordinal, None);
        }
        self.params[ordinal - 1] = Some(value);
        Ok(())
    }

    fn add_batch(&mut self) -> Result<()> {
        let row: Vec<SqlValue> = self
            .params
            .iter()
            .map(|p| {
                p.clone()
                    .ok_or_else(|| SyncError::driver("unbound parameter", self.table()))
            })
            .collect::<Result<_>>()?;
        self.batch.push(row);
        Ok(())
    }

    async fn execute_batch(&mut self) -> Result<()> {
        let failing = {
            let state = self.server.inner.lock().unwrap();
            state.fail_flush.contains(self.table())
        };
        if failing {
            self.batch.clear();
            return Err(SyncError::driver("injected flush failure", self.table()));
        }

        let ops: Vec<Op> = std::mem::take(&mut self.batch)
            .into_iter()
            .map(|row| self.row_to_op(row))
            .collect();

        let auto_commit = self.conn.lock().unwrap().auto_commit;
        if auto_commit {
            let mut state = self.server.inner.lock().unwrap();
            apply_ops(&mut state, ops);
        } else {
            self.conn.lock().unwrap().pending.extend(ops);
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(SyncError::driver("statement closed twice", self.table()));
        }
        self.closed = true;
        Ok(())
    }
}

fn parse_select(sql: &str) -> Result<(Vec<String>, String, Vec<String>)> {
    let rest = sql
        .strip_prefix("SELECT ")
        .ok_or_else(|| SyncError::driver("unsupported query", sql))?;
    let (cols, rest) = rest
        .split_once(" FROM ")
        .ok_or_else(|| SyncError::driver("unsupported query", sql))?;
    let (table, order) = rest
        .split_once(" ORDER BY ")
        .ok_or_else(|| SyncError::driver("unsupported query", sql))?;

    Ok((
        split_list(cols),
        table.to_string(),
        split_list(order),
    ))
}

fn parse_dml(sql: &str) -> Result<DmlKind> {
    if let Some(rest) = sql.strip_prefix("INSERT INTO ") {
        let (table, rest) = rest
            .split_once(" (")
            .ok_or_else(|| SyncError::driver("unsupported insert", sql))?;
        let (cols, _) = rest
            .split_once(')')
            .ok_or_else(|| SyncError::driver("unsupported insert", sql))?;
        return Ok(DmlKind::Insert {
            table: table.to_string(),
            cols: split_list(cols),
        });
    }

    if let Some(rest) = sql.strip_prefix("UPDATE ") {
        let (table, rest) = rest
            .split_once(" SET ")
            .ok_or_else(|| SyncError::driver("unsupported update", sql))?;
        let (sets, wheres) = rest
            .split_once(" WHERE ")
            .ok_or_else(|| SyncError::driver("unsupported update", sql))?;
        return Ok(DmlKind::Update {
            table: table.to_string(),
            set_cols: split_assignments(sets),
            key_cols: split_conditions(wheres),
        });
    }

    if let Some(rest) = sql.strip_prefix("DELETE FROM ") {
        let (table, wheres) = rest
            .split_once(" WHERE ")
            .ok_or_else(|| SyncError::driver("unsupported delete", sql))?;
        return Ok(DmlKind::Delete {
            table: table.to_string(),
            key_cols: split_conditions(wheres),
        });
    }

    Err(SyncError::driver("unsupported statement", sql))
}

fn split_list(s: &str) -> Vec<String> {
    s.split(", ").map(|c| c.trim().to_string()).collect()
}

fn split_assignments(s: &str) -> Vec<String> {
    s.split(", ")
        .map(|a| a.trim_end_matches(" = ?").trim().to_string())
        .collect()
}

fn split_conditions(s: &str) -> Vec<String> {
    s.split(" AND ")
        .map(|c| c.trim_end_matches(" = ?").trim().to_string())
        .collect()
}

/// Constraint collaborator that records its calls and tracks the envelope.
pub struct RecordingConstraintOps {
    server: MemServer,
}

impl RecordingConstraintOps {
    pub fn new(target: &MemServer) -> Self {
        Self {
            server: target.clone(),
        }
    }
}

#[async_trait]
impl ConstraintOps for RecordingConstraintOps {
    async fn drop_foreign_keys(&self, _target: &dyn SyncConnection) -> Result<()> {
        let mut state = self.server.inner.lock().unwrap();
        state.fks_dropped = true;
        state.events.push("drop_foreign_keys".to_string());
        Ok(())
    }

    async fn drop_unique_constraints(&self, _target: &dyn SyncConnection) -> Result<()> {
        let mut state = self.server.inner.lock().unwrap();
        state.uniques_dropped = true;
        state.events.push("drop_unique_constraints".to_string());
        Ok(())
    }

    async fn restore_unique_constraints(&self, _target: &dyn SyncConnection) -> Result<()> {
        let mut state = self.server.inner.lock().unwrap();
        state.uniques_dropped = false;
        state.events.push("restore_unique_constraints".to_string());
        Ok(())
    }

    async fn restore_foreign_keys(&self, _target: &dyn SyncConnection) -> Result<()> {
        let mut state = self.server.inner.lock().unwrap();
        state.fks_dropped = false;
        state.events.push("restore_foreign_keys".to_string());
        Ok(())
    }
}

/// Sequence collaborator that records its calls.
pub struct RecordingSequenceOps {
    server: MemServer,
}

impl RecordingSequenceOps {
    pub fn new(target: &MemServer) -> Self {
        Self {
            server: target.clone(),
        }
    }
}

#[async_trait]
impl SequenceOps for RecordingSequenceOps {
    async fn synchronize_identity_columns(
        &self,
        _source: &dyn SyncConnection,
        _target: &dyn SyncConnection,
    ) -> Result<()> {
        self.server.record_event("synchronize_identity_columns");
        Ok(())
    }

    async fn synchronize_sequences(
        &self,
        _source: &dyn SyncConnection,
        _target: &dyn SyncConnection,
    ) -> Result<()> {
        self.server.record_event("synchronize_sequences");
        Ok(())
    }
}
