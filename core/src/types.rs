//! Shared primitive types used across the dashboard.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A calendar year as stored in the `Years` column.
pub type Year = i64;

/// A quarter number, 1 through 4.
pub type Quarter = i64;

/// A canonical place name, the join key between rows and boundaries.
pub type GeoKey = String;

/// Canonical column names shared by every table.
pub const STATE_COLUMN: &str = "State";
pub const YEAR_COLUMN: &str = "Years";
pub const QUARTER_COLUMN: &str = "Quarter";

/// A (year, quarter) pair. Filtering is by exact match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    pub year: Year,
    pub quarter: Quarter,
}

impl Period {
    pub fn new(year: Year, quarter: Quarter) -> Self {
        Self { year, quarter }
    }

    /// Axis label used by the trend charts, e.g. `2023 Q4`.
    pub fn label(&self) -> String {
        format!("{} Q{}", self.year, self.quarter)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
