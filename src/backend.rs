//! Boundary traits for the external storage collaborators.
//!
//! The compiler reads schemas through [`SchemaRegistry`]; materialization and
//! preview execution go through [`Warehouse`]. Both are implemented outside
//! this crate against the real warehouse; [`StaticRegistry`] is an in-memory
//! implementation for tests and embedding.

use crate::error::RunError;
use crate::rel::RelExpr;
use crate::schema::{Schema, TableRef};
use ahash::AHashMap;

/// Read-only lookup from a materialized table reference to its schema and
/// row count.
pub trait SchemaRegistry {
    fn get_schema(&self, table: &TableRef) -> Option<Schema>;
    fn get_row_count(&self, table: &TableRef) -> Option<u64>;
}

/// One result row, in output-schema column order.
pub type Row = Vec<serde_json::Value>;

/// A small materialized result set, used for previews and grids.
pub type RowSet = Vec<Row>;

/// Query execution against the warehouse.
pub trait Warehouse {
    /// Creates or replaces `target` with the result of `expr`.
    fn materialize(&mut self, expr: &RelExpr, target: &TableRef) -> Result<(), RunError>;

    /// Runs `expr` and returns at most `limit` rows.
    fn execute(&self, expr: &RelExpr, limit: u64) -> Result<RowSet, RunError>;
}

/// A fixed in-memory registry of table schemas.
#[derive(Debug, Default)]
pub struct StaticRegistry {
    tables: AHashMap<TableRef, (Schema, u64)>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, table: TableRef, schema: Schema, num_rows: u64) {
        self.tables.insert(table, (schema, num_rows));
    }

    pub fn remove_table(&mut self, table: &TableRef) {
        self.tables.remove(table);
    }
}

impl SchemaRegistry for StaticRegistry {
    fn get_schema(&self, table: &TableRef) -> Option<Schema> {
        self.tables.get(table).map(|(schema, _)| schema.clone())
    }

    fn get_row_count(&self, table: &TableRef) -> Option<u64> {
        self.tables.get(table).map(|(_, rows)| *rows)
    }
}
