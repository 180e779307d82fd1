use serde::{Deserialize, Serialize};

/// Physical table names for the nine logical tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub agg_transaction: String,
    pub agg_insurance: String,
    pub agg_user: String,
    pub map_transaction: String,
    pub map_insurance: String,
    pub map_user: String,
    pub top_transaction: String,
    pub top_insurance: String,
    pub top_user: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            agg_transaction: "aggregated_transaction".into(),
            agg_insurance: "aggregated_insurance".into(),
            agg_user: "aggregated_user".into(),
            map_transaction: "map_transaction".into(),
            map_insurance: "map_insurance".into(),
            map_user: "map_user".into(),
            top_transaction: "top_transaction".into(),
            top_insurance: "top_insurance".into(),
            top_user: "top_user".into(),
        }
    }
}

/// How many rows each ranked chart keeps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankLimits {
    pub top_states: usize,
    pub top_brands: usize,
    pub top_payment_types: usize,
    pub top_districts: usize,
}

impl Default for RankLimits {
    fn default() -> Self {
        Self {
            top_states: 10,
            top_brands: 8,
            top_payment_types: 5,
            top_districts: 10,
        }
    }
}

/// Choropleth colour scale per page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorScales {
    pub overview: String,
    pub transaction: String,
    pub insurance: String,
    pub expansion: String,
    pub users: String,
}

impl Default for ColorScales {
    fn default() -> Self {
        Self {
            overview: "Viridis".into(),
            transaction: "Blues".into(),
            insurance: "Oranges".into(),
            expansion: "Reds".into(),
            users: "Purples".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// SQLite database holding the pre-aggregated tables.
    pub database: String,
    /// GeoJSON FeatureCollection of state boundaries.
    pub geojson: String,
    pub tables: TableNames,
    pub limits: RankLimits,
    pub color_scales: ColorScales,
    /// Rows dated before this year are dropped at load.
    pub inception_year: i64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            database: "pulse.db".into(),
            geojson: "Indian_States.geojson".into(),
            tables: TableNames::default(),
            limits: RankLimits::default(),
            color_scales: ColorScales::default(),
            inception_year: 2018,
        }
    }
}

impl DashboardConfig {
    /// Load from a JSON file. Keys absent from the file keep their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: DashboardConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: DashboardConfig = serde_json::from_str(
            r#"{ "database": "other.db", "limits": { "top_states": 5 } }"#,
        )
        .unwrap();
        assert_eq!(config.database, "other.db");
        assert_eq!(config.limits.top_states, 5);
        assert_eq!(config.limits.top_brands, 8);
        assert_eq!(config.tables.map_user, "map_user");
        assert_eq!(config.inception_year, 2018);
    }
}
