//! Declarative chart specifications.
//!
//! Builders are pure: they read a `RowSet` and return a `ChartSpec` the
//! renderer can draw. An empty input returns `Ok(None)`, the "no chart"
//! sentinel. A missing selector column is a schema error.

use crate::{
    error::PulseResult,
    geo::{BoundarySet, FEATURE_ID_KEY},
    rowset::RowSet,
    types::{GeoKey, STATE_COLUMN},
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
    Choropleth(ChoroplethSpec),
    Pie(PieSpec),
    Bar(BarSpec),
    Line(LineSpec),
}

impl ChartSpec {
    pub fn title(&self) -> &str {
        match self {
            ChartSpec::Choropleth(c) => &c.title,
            ChartSpec::Pie(c) => &c.title,
            ChartSpec::Bar(c) => &c.title,
            ChartSpec::Line(c) => &c.title,
        }
    }
}

/// Fixed map framing for the Indian subcontinent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoView {
    pub visible: bool,
    pub projection: String,
    pub parallels: [f64; 2],
    pub rotation_lat: f64,
    pub rotation_lon: f64,
    pub lon_range: [f64; 2],
    pub lat_range: [f64; 2],
}

impl Default for GeoView {
    fn default() -> Self {
        Self {
            visible: false,
            projection: "conic conformal".into(),
            parallels: [12.47, 35.17],
            rotation_lat: 24.0,
            rotation_lon: 80.0,
            lon_range: [68.0, 98.0],
            lat_range: [6.0, 38.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoroplethSpec {
    pub title: String,
    pub locations: Vec<GeoKey>,
    pub values: Vec<f64>,
    pub feature_id_key: String,
    pub color_scale: String,
    pub colorbar_title: String,
    pub marker_line_color: String,
    pub marker_line_width: f64,
    pub geo: GeoView,
    pub height: u32,
    /// Locations with no boundary feature; these will not be drawn.
    pub unmatched: Vec<GeoKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSpec {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub hole: f64,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSpec {
    pub title: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub x_title: String,
    pub y_title: String,
    pub text_auto: bool,
    /// Colour each bar by its x category.
    pub color_by_x: bool,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSpec {
    pub title: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub x_title: String,
    pub y_title: String,
    pub markers: bool,
    pub y_tick_format: Option<String>,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoroplethOptions {
    pub title: String,
    pub color_scale: String,
    pub value_suffix: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineOptions {
    pub title: String,
    pub x_title: Option<String>,
    pub y_title: Option<String>,
    pub height: u32,
}

impl LineOptions {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_title: None,
            y_title: None,
            height: 400,
        }
    }
}

/// Axis-label casing: underscores become spaces, then each word is
/// capitalized with the rest lowercased ("Transaction_amount" ->
/// "Transaction Amount").
pub fn title_case(column: &str) -> String {
    let mut out = String::with_capacity(column.len());
    let mut boundary = true;
    for ch in column.replace('_', " ").chars() {
        if ch.is_alphabetic() {
            if boundary {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            boundary = false;
        } else {
            out.push(ch);
            boundary = true;
        }
    }
    out
}

fn no_data() -> PulseResult<Option<ChartSpec>> {
    log::warn!("No data available for the chart.");
    Ok(None)
}

/// State-level map joined to `boundaries` on the canonical key.
pub fn choropleth(
    rows: &RowSet,
    value_column: &str,
    options: &ChoroplethOptions,
    boundaries: &BoundarySet,
) -> PulseResult<Option<ChartSpec>> {
    if rows.is_empty() {
        return no_data();
    }
    let locations = rows.label_column(STATE_COLUMN)?;
    let values = rows.numeric_column(value_column)?;
    let unmatched = boundaries.unmatched(locations.iter().map(String::as_str));
    if !unmatched.is_empty() {
        log::warn!("{} locations have no boundary feature: {unmatched:?}", unmatched.len());
    }

    Ok(Some(ChartSpec::Choropleth(ChoroplethSpec {
        title: options.title.clone(),
        locations,
        values,
        feature_id_key: FEATURE_ID_KEY.into(),
        color_scale: options.color_scale.clone(),
        colorbar_title: format!("{} ({})", title_case(value_column), options.value_suffix),
        marker_line_color: "white".into(),
        marker_line_width: 1.5,
        geo: GeoView::default(),
        height: 600,
        unmatched,
    })))
}

pub fn pie(
    rows: &RowSet,
    values_column: &str,
    names_column: &str,
    title: &str,
) -> PulseResult<Option<ChartSpec>> {
    if rows.is_empty() {
        return no_data();
    }
    Ok(Some(ChartSpec::Pie(PieSpec {
        title: title.into(),
        labels: rows.label_column(names_column)?,
        values: rows.numeric_column(values_column)?,
        hole: 0.4,
        height: 400,
    })))
}

pub fn bar(
    rows: &RowSet,
    x_column: &str,
    y_column: &str,
    title: &str,
    text_auto: bool,
) -> PulseResult<Option<ChartSpec>> {
    if rows.is_empty() {
        return no_data();
    }
    Ok(Some(ChartSpec::Bar(BarSpec {
        title: title.into(),
        x: rows.label_column(x_column)?,
        y: rows.numeric_column(y_column)?,
        x_title: title_case(x_column),
        y_title: title_case(y_column),
        text_auto,
        color_by_x: true,
        height: 400,
    })))
}

/// Trend line with markers and scientific y ticks.
pub fn line(
    rows: &RowSet,
    x_column: &str,
    y_column: &str,
    options: &LineOptions,
) -> PulseResult<Option<ChartSpec>> {
    if rows.is_empty() {
        return no_data();
    }
    Ok(Some(ChartSpec::Line(LineSpec {
        title: options.title.clone(),
        x: rows.label_column(x_column)?,
        y: rows.numeric_column(y_column)?,
        x_title: options.x_title.clone().unwrap_or_else(|| x_column.to_string()),
        y_title: options.y_title.clone().unwrap_or_else(|| y_column.to_string()),
        markers: true,
        y_tick_format: Some(".2e".into()),
        height: options.height,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_case_matches_axis_labels() {
        assert_eq!(title_case("Transaction_amount"), "Transaction Amount");
        assert_eq!(title_case("Amount_M"), "Amount M");
        assert_eq!(title_case("State"), "State");
        assert_eq!(title_case("AppOpens"), "Appopens");
    }
}
