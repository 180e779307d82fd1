//! pulse-core: normalization, aggregation and chart building for the
//! transaction insights dashboard.
//!
//! Data flows one way: `store` loads a table into a `RowSet`, `aggregate`
//! filters and groups it, `chart` turns the result into a `ChartSpec`, and
//! `dashboard` decides which of those steps each page runs.

pub mod aggregate;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod geo;
pub mod normalize;
pub mod rowset;
pub mod store;
pub mod types;
