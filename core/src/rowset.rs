//! Column-named, dynamically typed tables.
//!
//! A `RowSet` is what the loader hands to the aggregation layer: the full
//! contents of one table, columns in `SELECT *` order. Cells keep the
//! SQLite storage class they were read with.

use crate::error::{PulseError, PulseResult};
use rusqlite::types::ValueRef;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Real(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    /// Numeric view of the cell. Null reads as 0; text is not numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Null => Some(0.0),
            Value::Integer(i) => Some(*i as f64),
            Value::Real(f) => Some(*f),
            Value::Text(_) => None,
        }
    }

    /// Total order used for group keys: nulls, then numbers, then text.
    pub fn cmp_key(&self, other: &Value) -> Ordering {
        fn rank(v: &Value) -> u8 {
            match v {
                Value::Null => 0,
                Value::Integer(_) | Value::Real(_) => 1,
                Value::Text(_) => 2,
            }
        }
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (a, b) if rank(a) == 1 && rank(b) == 1 => {
                let (x, y) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
                x.total_cmp(&y)
            }
            (a, b) => rank(a).cmp(&rank(b)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(v: ValueRef<'_>) -> Self {
        match v {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            // No table in this schema stores blobs.
            ValueRef::Blob(_) => Value::Null,
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Real(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_columns(columns: &[&str]) -> Self {
        Self::new(columns.iter().map(|c| c.to_string()).collect())
    }

    /// Append a row. Its width must match the column list.
    pub fn push(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len(), "row width mismatch");
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn column_index(&self, name: &str) -> PulseResult<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| PulseError::MissingColumn {
                column: name.to_string(),
                available: self.columns.clone(),
            })
    }

    /// All cells of `name` as numbers, with nulls read as 0.
    pub fn numeric_column(&self, name: &str) -> PulseResult<Vec<f64>> {
        let idx = self.column_index(name)?;
        self.rows
            .iter()
            .map(|r| {
                r[idx].as_f64().ok_or_else(|| PulseError::NotNumeric {
                    column: name.to_string(),
                })
            })
            .collect()
    }

    /// All cells of `name` rendered as labels.
    pub fn label_column(&self, name: &str) -> PulseResult<Vec<String>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| r[idx].to_string()).collect())
    }

    pub fn sum(&self, name: &str) -> PulseResult<f64> {
        Ok(self.numeric_column(name)?.iter().sum())
    }

    /// Rename a column in place. Returns false if `from` is absent.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.columns.iter_mut().find(|c| *c == from) {
            Some(col) => {
                *col = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Rewrite every cell of one column in place.
    pub fn map_column<F>(&mut self, name: &str, f: F) -> PulseResult<()>
    where
        F: Fn(&Value) -> Value,
    {
        let idx = self.column_index(name)?;
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
        Ok(())
    }

    /// Keep only the rows for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[Value]) -> bool,
    {
        self.rows.retain(|r| keep(r));
    }

    /// A copy holding only the rows for which `keep` returns true.
    pub fn filtered<F>(&self, mut keep: F) -> RowSet
    where
        F: FnMut(&[Value]) -> bool,
    {
        RowSet {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// A copy with `name` set to `values`, appended if the column is new.
    pub fn with_column(&self, name: &str, values: Vec<Value>) -> RowSet {
        debug_assert_eq!(values.len(), self.rows.len(), "column length mismatch");
        let mut out = self.clone();
        match out.columns.iter().position(|c| c == name) {
            Some(idx) => {
                for (row, v) in out.rows.iter_mut().zip(values) {
                    row[idx] = v;
                }
            }
            None => {
                out.columns.push(name.to_string());
                for (row, v) in out.rows.iter_mut().zip(values) {
                    row.push(v);
                }
            }
        }
        out
    }

    /// A copy holding the rows at `order`, in that order.
    pub fn reordered(&self, order: &[usize]) -> RowSet {
        RowSet {
            columns: self.columns.clone(),
            rows: order.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }
}
