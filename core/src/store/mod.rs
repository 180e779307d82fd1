//! SQLite table source.
//!
//! RULE: Only store talks to the database.
//! Everything above it works on `RowSet`s and never executes SQL.
//! The dashboard only reads; `migrate` exists so tests and local setups
//! can create the expected empty tables.

use crate::{
    error::PulseResult,
    normalize::canonicalize_value,
    rowset::{RowSet, Value},
    types::STATE_COLUMN,
};
use rusqlite::{Connection, OpenFlags};

mod table;

pub use table::Table;

/// Raw geographic column name as the source tables spell it.
pub const RAW_STATE_COLUMN: &str = "States";

pub struct PulseStore {
    conn: Connection,
    path: Option<String>, // None for :memory:
}

impl PulseStore {
    /// Open an existing database read-only.
    pub fn open(path: &str) -> PulseResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI,
        )?;
        log::debug!("opened {path} read-only");
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// `open`, degrading to an empty in-memory database when `path` cannot
    /// be opened. Every table then loads as an empty row set.
    pub fn open_or_empty(path: &str) -> PulseResult<Self> {
        match Self::open(path) {
            Ok(store) => Ok(store),
            Err(e) => {
                log::error!("Failed to open database {path}: {e}");
                Self::in_memory()
            }
        }
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> PulseResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, path: None })
    }

    /// Create the nine source tables if they do not exist.
    pub fn migrate(&self) -> PulseResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_pulse_tables.sql"))?;
        Ok(())
    }

    /// Underlying connection, for fixtures and tooling.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Database file in use; `None` for an in-memory store.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Read every row of `table`.
    ///
    /// A `States` column is canonicalized and renamed to `State` so rows
    /// join against boundary features by key.
    pub fn load(&self, table: &str) -> PulseResult<RowSet> {
        let sql = format!("SELECT * FROM {}", quote_ident(table));
        let mut stmt = self.conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = RowSet::new(columns);
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                cells.push(Value::from(row.get_ref(i)?));
            }
            rows.push(cells);
        }

        normalize_geography(&mut rows)?;
        log::debug!("loaded {} rows from {table}", rows.len());
        Ok(rows)
    }

    /// `load`, degrading to an empty row set when the source fails.
    pub fn load_or_empty(&self, table: &str) -> RowSet {
        match self.load(table) {
            Ok(rows) => rows,
            Err(e) => {
                log::error!("Failed to load data from {table}: {e}");
                RowSet::default()
            }
        }
    }
}

fn normalize_geography(rows: &mut RowSet) -> PulseResult<()> {
    if !rows.has_column(RAW_STATE_COLUMN) || rows.has_column(STATE_COLUMN) {
        return Ok(());
    }
    rows.map_column(RAW_STATE_COLUMN, |v| match v {
        Value::Null => Value::Null,
        v => Value::Text(canonicalize_value(v)),
    })?;
    rows.rename_column(RAW_STATE_COLUMN, STATE_COLUMN);
    Ok(())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
