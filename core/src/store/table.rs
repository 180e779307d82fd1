//! The nine logical tables and their physical names.

use crate::config::TableNames;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    AggTransaction,
    AggInsurance,
    AggUser,
    MapTransaction,
    MapInsurance,
    MapUser,
    TopTransaction,
    TopInsurance,
    TopUser,
}

impl Table {
    pub const ALL: [Table; 9] = [
        Table::AggTransaction,
        Table::AggInsurance,
        Table::AggUser,
        Table::MapTransaction,
        Table::MapInsurance,
        Table::MapUser,
        Table::TopTransaction,
        Table::TopInsurance,
        Table::TopUser,
    ];

    pub fn physical_name<'a>(&self, names: &'a TableNames) -> &'a str {
        match self {
            Table::AggTransaction => &names.agg_transaction,
            Table::AggInsurance => &names.agg_insurance,
            Table::AggUser => &names.agg_user,
            Table::MapTransaction => &names.map_transaction,
            Table::MapInsurance => &names.map_insurance,
            Table::MapUser => &names.map_user,
            Table::TopTransaction => &names.top_transaction,
            Table::TopInsurance => &names.top_insurance,
            Table::TopUser => &names.top_user,
        }
    }
}
