//! Page and case-study controller.
//!
//! RULE: the controller only dispatches. It chooses tables, filters,
//! groupings and chart builders; every computation lives in `aggregate`
//! and every chart shape lives in `chart`.
//!
//! Tables are read fresh for every page. The store and the boundary set are
//! long-lived handles owned by the caller and lent to `Dashboard::new`.

use crate::{
    aggregate::{
        self, filter_period, filter_year, group, sums, top_n, with_engagement_rate,
        with_growth_score, with_period_label, with_scaled, ENGAGEMENT_RATE, GROWTH_SCORE,
        PERIOD_LABEL,
    },
    chart::{self, ChartSpec, ChoroplethOptions, LineOptions},
    config::DashboardConfig,
    error::{PulseError, PulseResult},
    geo::BoundarySet,
    rowset::RowSet,
    store::{PulseStore, Table},
    types::{Period, Quarter, Year, QUARTER_COLUMN, STATE_COLUMN, YEAR_COLUMN},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Selector fallback when the primary table is empty.
pub const FALLBACK_PERIOD: Period = Period { year: 2023, quarter: 1 };

const NO_DATA: &str = "No data available for the selected period.";

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaseStudy {
    TransactionDynamics,
    DeviceUsage,
    InsuranceMarket,
    MarketExpansion,
    UserGrowth,
}

impl CaseStudy {
    pub const ALL: [CaseStudy; 5] = [
        CaseStudy::TransactionDynamics,
        CaseStudy::DeviceUsage,
        CaseStudy::InsuranceMarket,
        CaseStudy::MarketExpansion,
        CaseStudy::UserGrowth,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            CaseStudy::TransactionDynamics => "transaction-dynamics",
            CaseStudy::DeviceUsage => "device-usage",
            CaseStudy::InsuranceMarket => "insurance-market",
            CaseStudy::MarketExpansion => "market-expansion",
            CaseStudy::UserGrowth => "user-growth",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            CaseStudy::TransactionDynamics => "Transaction Dynamics Analysis",
            CaseStudy::DeviceUsage => "Device Usage & User Engagement Analysis",
            CaseStudy::InsuranceMarket => "Insurance Market Analysis",
            CaseStudy::MarketExpansion => "Market Expansion Strategy Analysis",
            CaseStudy::UserGrowth => "User Growth Analysis",
        }
    }

    pub fn objective(&self) -> &'static str {
        match self {
            CaseStudy::TransactionDynamics => "Analyze transaction patterns across states, quarters, and payment types for strategic decision making.",
            CaseStudy::DeviceUsage => "Understand user device preferences and engagement patterns to optimize app performance.",
            CaseStudy::InsuranceMarket => "Analyze insurance transaction growth and identify market expansion opportunities.",
            CaseStudy::MarketExpansion => "Identify high-potential regions and growth opportunities for market expansion.",
            CaseStudy::UserGrowth => "Analyze user registration patterns and engagement metrics for growth strategy.",
        }
    }

    /// Table whose periods populate the year/quarter selectors.
    pub fn primary_table(&self) -> Table {
        match self {
            CaseStudy::TransactionDynamics => Table::AggTransaction,
            CaseStudy::DeviceUsage => Table::AggUser,
            CaseStudy::InsuranceMarket => Table::AggInsurance,
            CaseStudy::MarketExpansion => Table::MapTransaction,
            CaseStudy::UserGrowth => Table::MapUser,
        }
    }
}

impl FromStr for CaseStudy {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CaseStudy::ALL
            .into_iter()
            .find(|c| c.slug() == s)
            .ok_or_else(|| PulseError::UnknownCaseStudy { name: s.to_string() })
    }
}

/// One heading on a page: a chart, or a notice explaining why there is none.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub heading: String,
    pub chart: Option<ChartSpec>,
    pub notice: Option<String>,
}

impl Section {
    fn from_chart(heading: impl Into<String>, chart: Option<ChartSpec>) -> Self {
        let notice = chart.is_none().then(|| NO_DATA.to_string());
        Self {
            heading: heading.into(),
            chart,
            notice,
        }
    }

    fn skipped(heading: impl Into<String>, notice: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            chart: None,
            notice: Some(notice.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickStat {
    pub label: String,
    pub value: f64,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewPage {
    pub stats: Vec<QuickStat>,
    pub heatmap: Section,
    pub trend: Section,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseStudyPage {
    pub case: CaseStudy,
    pub title: String,
    pub objective: String,
    pub period: Period,
    /// Set when the selected period has no rows at all.
    pub notice: Option<String>,
    pub sections: Vec<Section>,
}

/// Selector contents for one case study.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodChoices {
    pub case: CaseStudy,
    pub years: Vec<Year>,
    pub year: Year,
    pub quarters: Vec<Quarter>,
    pub default: Option<Period>,
}

// ── Controller ───────────────────────────────────────────────────────────────

pub struct Dashboard<'a> {
    store: &'a PulseStore,
    boundaries: &'a BoundarySet,
    config: &'a DashboardConfig,
}

impl<'a> Dashboard<'a> {
    pub fn new(store: &'a PulseStore, boundaries: &'a BoundarySet, config: &'a DashboardConfig) -> Self {
        Self {
            store,
            boundaries,
            config,
        }
    }

    /// Boundary FeatureCollection with `State_Name` set on every feature,
    /// the geometry every choropleth's `feature_id_key` joins against.
    pub fn boundaries(&self) -> &'a serde_json::Value {
        self.boundaries.feature_collection()
    }

    /// Load a logical table, dropping rows with impossible periods.
    pub fn table(&self, table: Table) -> RowSet {
        let name = table.physical_name(&self.config.tables);
        let mut rows = self.store.load_or_empty(name);
        aggregate::drop_invalid_periods(&mut rows, self.config.inception_year);
        rows
    }

    /// Rows of `table` in `period`; empty when the table itself is empty.
    fn table_in(&self, table: Table, period: Period) -> PulseResult<RowSet> {
        let rows = self.table(table);
        if rows.is_empty() {
            return Ok(rows);
        }
        filter_period(&rows, period)
    }

    fn map_options(&self, title: String, color_scale: &str, suffix: &str) -> ChoroplethOptions {
        ChoroplethOptions {
            title,
            color_scale: color_scale.to_string(),
            value_suffix: suffix.to_string(),
        }
    }

    // ── Overview ────────────────────────────────────────────────────────────

    pub fn overview(&self) -> PulseResult<OverviewPage> {
        let txn = self.table(Table::AggTransaction);
        let top_user = self.table(Table::TopUser);
        let insurance = self.table(Table::AggInsurance);

        let total_count = total(&txn, "Transaction_count")?;
        let total_amount = total(&txn, "Transaction_amount")?;
        let total_users = total(&top_user, "Registered_Users")?;
        let total_insurance = total(&insurance, "Insurance_amount")?;

        let stats = vec![
            QuickStat {
                label: "Total Transactions".into(),
                value: total_count,
                display: format!("{:.1}B", total_count / 1e9),
            },
            QuickStat {
                label: "Total Amount".into(),
                value: total_amount,
                display: format!("₹{:.1}T", total_amount / 1e12),
            },
            QuickStat {
                label: "Registered Users".into(),
                value: total_users,
                display: format!("{:.1}M", total_users / 1e6),
            },
            QuickStat {
                label: "Insurance Amount".into(),
                value: total_insurance,
                display: format!("₹{:.1}B", total_insurance / 1e9),
            },
        ];

        let latest = if txn.is_empty() {
            None
        } else {
            aggregate::latest_period(&txn)?
        };
        let heatmap = match latest {
            Some(latest) => {
                let summary = group(
                    &filter_period(&txn, latest)?,
                    &[STATE_COLUMN],
                    &sums(&["Transaction_amount", "Transaction_count"]),
                )?;
                let summary = with_scaled(&summary, "Transaction_amount", 1e6, "Amount_M")?;
                let options = self.map_options(
                    format!("Transaction Amount - {} Q{}", latest.year, latest.quarter),
                    &self.config.color_scales.overview,
                    "₹M",
                );
                let map = chart::choropleth(&summary, "Amount_M", &options, self.boundaries)?;
                Section::from_chart("Transaction Heatmap", map)
            }
            None => Section::from_chart("Transaction Heatmap", None),
        };

        let trend = if txn.is_empty() {
            Section::from_chart("Transaction Trend", None)
        } else {
            let by_period = group(
                &txn,
                &[YEAR_COLUMN, QUARTER_COLUMN],
                &sums(&["Transaction_amount"]),
            )?;
            let by_period = with_period_label(&by_period)?;
            let options = LineOptions {
                title: "Transaction Amount Over Time".into(),
                x_title: Some("Time Period".into()),
                y_title: Some("Transaction Amount (₹)".into()),
                height: 600,
            };
            let line = chart::line(&by_period, PERIOD_LABEL, "Transaction_amount", &options)?;
            Section::from_chart("Transaction Trend", line)
        };

        Ok(OverviewPage {
            stats,
            heatmap,
            trend,
        })
    }

    // ── Selectors ───────────────────────────────────────────────────────────

    /// Years of the case's primary table, and the quarters of `year`
    /// (the first year when `None`).
    pub fn period_choices(&self, case: CaseStudy, year: Option<Year>) -> PulseResult<PeriodChoices> {
        let rows = self.table(case.primary_table());
        if rows.is_empty() {
            return Ok(PeriodChoices {
                case,
                years: vec![FALLBACK_PERIOD.year],
                year: FALLBACK_PERIOD.year,
                quarters: vec![FALLBACK_PERIOD.quarter],
                default: Some(FALLBACK_PERIOD),
            });
        }
        let years = aggregate::years(&rows)?;
        let year = year.or_else(|| years.first().copied()).unwrap_or(FALLBACK_PERIOD.year);
        let quarters = aggregate::quarters(&rows, year)?;
        let default = quarters.first().map(|&q| Period::new(year, q));
        Ok(PeriodChoices {
            case,
            years,
            year,
            quarters,
            default,
        })
    }

    // ── Case studies ────────────────────────────────────────────────────────

    pub fn case_study(&self, case: CaseStudy, period: Period) -> PulseResult<CaseStudyPage> {
        let mut page = CaseStudyPage {
            case,
            title: case.title().to_string(),
            objective: case.objective().to_string(),
            period,
            notice: None,
            sections: Vec::new(),
        };
        let sections = match case {
            CaseStudy::TransactionDynamics => self.transaction_dynamics(period)?,
            CaseStudy::DeviceUsage => Some(self.device_usage(period)?),
            CaseStudy::InsuranceMarket => self.insurance_market(period)?,
            CaseStudy::MarketExpansion => self.market_expansion(period)?,
            CaseStudy::UserGrowth => self.user_growth(period)?,
        };
        match sections {
            Some(sections) => page.sections = sections,
            None => {
                log::warn!("{}: no rows for {period}", case.slug());
                page.notice = Some(NO_DATA.to_string());
            }
        }
        Ok(page)
    }

    fn transaction_dynamics(&self, period: Period) -> PulseResult<Option<Vec<Section>>> {
        let rows = self.table_in(Table::AggTransaction, period)?;
        if rows.is_empty() {
            return Ok(None);
        }
        let summary = group(
            &rows,
            &[STATE_COLUMN],
            &sums(&["Transaction_amount", "Transaction_count"]),
        )?;
        let summary = with_scaled(&summary, "Transaction_amount", 1e6, "Amount_M")?;

        let options = self.map_options(
            format!("Transactions - {} Q{}", period.year, period.quarter),
            &self.config.color_scales.transaction,
            "₹M",
        );
        let map = chart::choropleth(&summary, "Amount_M", &options, self.boundaries)?;

        let limit = self.config.limits.top_states;
        let top = top_n(&summary, "Transaction_amount", limit)?;
        let top = with_scaled(&top, "Transaction_amount", 1e9, "Amount_B")?;
        let bar = chart::bar(&top, STATE_COLUMN, "Amount_B", "Top States by Transaction Amount (₹B)", true)?;

        let payment = if rows.has_column("Transaction_type") {
            let by_type = group(&rows, &["Transaction_type"], &sums(&["Transaction_count"]))?;
            let by_type = top_n(&by_type, "Transaction_count", self.config.limits.top_payment_types)?;
            let pie = chart::pie(
                &by_type,
                "Transaction_count",
                "Transaction_type",
                "Transaction Distribution by Payment Type",
            )?;
            Section::from_chart("Payment Type Distribution", pie)
        } else {
            Section::skipped("Payment Type Distribution", "Transaction types are not recorded in this table.")
        };

        Ok(Some(vec![
            Section::from_chart("State-wise Transaction Heatmap", map),
            Section::from_chart(format!("Top {limit} States by Amount"), bar),
            payment,
        ]))
    }

    fn device_usage(&self, period: Period) -> PulseResult<Vec<Section>> {
        let users = self.table_in(Table::AggUser, period)?;
        let brands = if users.is_empty() {
            Section::from_chart("Device Brand Distribution", None)
        } else if !users.has_column("Brands") {
            Section::skipped("Device Brand Distribution", "Device brands are not recorded in this table.")
        } else {
            let by_brand = group(&users, &["Brands"], &sums(&["Transaction_count"]))?;
            let by_brand = top_n(&by_brand, "Transaction_count", self.config.limits.top_brands)?;
            let pie = chart::pie(&by_brand, "Transaction_count", "Brands", "User Distribution by Device Brand")?;
            Section::from_chart("Device Brand Distribution", pie)
        };

        let map_users = self.table_in(Table::MapUser, period)?;
        let districts = if map_users.is_empty() {
            Section::from_chart("Top Districts by App Opens", None)
        } else if !map_users.has_column("AppOpens") {
            Section::skipped("Top Districts by App Opens", "App opens are not recorded in this table.")
        } else {
            let by_district = group(&map_users, &["District"], &sums(&["AppOpens"]))?;
            let by_district = top_n(&by_district, "AppOpens", self.config.limits.top_districts)?;
            let bar = chart::bar(&by_district, "District", "AppOpens", "Top Districts by App Opens", true)?;
            Section::from_chart("Top Districts by App Opens", bar)
        };

        Ok(vec![brands, districts])
    }

    fn insurance_market(&self, period: Period) -> PulseResult<Option<Vec<Section>>> {
        let all = self.table(Table::AggInsurance);
        if all.is_empty() {
            return Ok(None);
        }
        let rows = filter_period(&all, period)?;
        if rows.is_empty() {
            return Ok(None);
        }
        let summary = group(
            &rows,
            &[STATE_COLUMN],
            &sums(&["Insurance_amount", "Insurance_count"]),
        )?;
        let summary = with_scaled(&summary, "Insurance_amount", 1e3, "Amount_K")?;
        let options = self.map_options(
            format!("Insurance Amount - {} Q{}", period.year, period.quarter),
            &self.config.color_scales.insurance,
            "₹K",
        );
        let map = chart::choropleth(&summary, "Amount_K", &options, self.boundaries)?;

        let yearly = filter_year(&all, period.year)?;
        let by_quarter = group(&yearly, &[QUARTER_COLUMN], &sums(&["Insurance_amount"]))?;
        let trend = chart::line(
            &by_quarter,
            QUARTER_COLUMN,
            "Insurance_amount",
            &LineOptions::new("Insurance Growth by Quarter"),
        )?;

        Ok(Some(vec![
            Section::from_chart("Insurance Coverage Heatmap", map),
            Section::from_chart("Quarterly Growth Trend", trend),
        ]))
    }

    fn market_expansion(&self, period: Period) -> PulseResult<Option<Vec<Section>>> {
        let rows = self.table_in(Table::MapTransaction, period)?;
        if rows.is_empty() {
            return Ok(None);
        }
        let summary = group(
            &rows,
            &[STATE_COLUMN],
            &sums(&["Transaction_amount", "Transaction_count"]),
        )?;
        let summary = with_scaled(&summary, "Transaction_amount", 1e6, "Amount_M")?;
        let options = self.map_options(
            format!("Market Penetration - {} Q{}", period.year, period.quarter),
            &self.config.color_scales.expansion,
            "₹M",
        );
        let map = chart::choropleth(&summary, "Amount_M", &options, self.boundaries)?;

        let scored = with_growth_score(&summary)?;
        let top = top_n(&scored, GROWTH_SCORE, self.config.limits.top_states)?;
        let bar = chart::bar(&top, STATE_COLUMN, GROWTH_SCORE, "States with Highest Growth Potential", true)?;

        Ok(Some(vec![
            Section::from_chart("Market Penetration Heatmap", map),
            Section::from_chart("Growth Opportunity Analysis", bar),
        ]))
    }

    fn user_growth(&self, period: Period) -> PulseResult<Option<Vec<Section>>> {
        let rows = self.table_in(Table::MapUser, period)?;
        if rows.is_empty() {
            return Ok(None);
        }
        let summary = group(
            &rows,
            &[STATE_COLUMN],
            &sums(&["RegisteredUsers", "AppOpens"]),
        )?;
        let summary = with_scaled(&summary, "RegisteredUsers", 1e3, "Users_K")?;
        let options = self.map_options(
            format!("Registered Users - {} Q{}", period.year, period.quarter),
            &self.config.color_scales.users,
            "K Users",
        );
        let map = chart::choropleth(&summary, "Users_K", &options, self.boundaries)?;

        let engaged = with_engagement_rate(&summary)?;
        let top = top_n(&engaged, ENGAGEMENT_RATE, self.config.limits.top_states)?;
        let bar = chart::bar(&top, STATE_COLUMN, ENGAGEMENT_RATE, "States with Highest User Engagement", true)?;

        Ok(Some(vec![
            Section::from_chart("User Distribution Heatmap", map),
            Section::from_chart("User Engagement Analysis", bar),
        ]))
    }
}

/// Column total, or 0 for a table that failed to load.
fn total(rows: &RowSet, column: &str) -> PulseResult<f64> {
    if rows.is_empty() {
        return Ok(0.0);
    }
    rows.sum(column)
}
