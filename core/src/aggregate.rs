//! Filtering, grouping, derived ratios and ranking over `RowSet`s.
//!
//! Everything here is pure: inputs are borrowed, results are new row sets.
//! The only failures are schema mismatches (a requested column is absent,
//! or a reduced column holds text), which callers must not paper over.

use crate::{
    error::{PulseError, PulseResult},
    rowset::{RowSet, Value},
    types::{Period, Quarter, Year, QUARTER_COLUMN, YEAR_COLUMN},
};
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub const GROWTH_SCORE: &str = "Growth_Score";
pub const ENGAGEMENT_RATE: &str = "Engagement_Rate";
pub const PERIOD_LABEL: &str = "Period";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Sum,
}

// ── Filtering ────────────────────────────────────────────────────────────────

/// Rows whose (Years, Quarter) equals `period` exactly.
pub fn filter_period(rows: &RowSet, period: Period) -> PulseResult<RowSet> {
    let y = rows.column_index(YEAR_COLUMN)?;
    let q = rows.column_index(QUARTER_COLUMN)?;
    Ok(rows.filtered(|r| {
        r[y].as_i64() == Some(period.year) && r[q].as_i64() == Some(period.quarter)
    }))
}

/// Rows dated in `year`, any quarter.
pub fn filter_year(rows: &RowSet, year: Year) -> PulseResult<RowSet> {
    let y = rows.column_index(YEAR_COLUMN)?;
    Ok(rows.filtered(|r| r[y].as_i64() == Some(year)))
}

/// Drop rows dated before `inception_year` or with a quarter outside 1..=4.
/// Tables without period columns are left alone. Returns the number dropped.
pub fn drop_invalid_periods(rows: &mut RowSet, inception_year: Year) -> usize {
    let (Ok(y), Ok(q)) = (rows.column_index(YEAR_COLUMN), rows.column_index(QUARTER_COLUMN))
    else {
        return 0;
    };
    let before = rows.len();
    rows.retain(|r| {
        let year_ok = r[y].as_i64().is_some_and(|v| v >= inception_year);
        let quarter_ok = r[q].as_i64().is_some_and(|v| (1..=4).contains(&v));
        year_ok && quarter_ok
    });
    let dropped = before - rows.len();
    if dropped > 0 {
        log::warn!("dropped {dropped} rows with invalid year/quarter");
    }
    dropped
}

// ── Grouping ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct GroupKey(Vec<Value>);

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| a.cmp_key(b))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

/// Running sum that stays integral while every input is an integer.
#[derive(Debug, Clone, Copy)]
struct SumAcc {
    int: Option<i64>,
    float: f64,
}

impl SumAcc {
    fn new() -> Self {
        Self { int: Some(0), float: 0.0 }
    }

    fn add(&mut self, v: &Value) -> Option<()> {
        match v {
            Value::Integer(i) => self.int = self.int.and_then(|s| s.checked_add(*i)),
            Value::Null => {}
            Value::Real(_) => self.int = None,
            Value::Text(_) => return None,
        }
        self.float += v.as_f64()?;
        Some(())
    }

    fn finish(self) -> Value {
        match self.int {
            Some(i) => Value::Integer(i),
            None => Value::Real(self.float),
        }
    }
}

/// One output row per distinct `group_by` value, each measure reduced.
///
/// Output columns are the group columns followed by the measure columns.
/// Groups come out in ascending key order, so grouping by
/// (Years, Quarter) yields chronological rows. Rows with a null key cell
/// belong to no group.
pub fn group(
    rows: &RowSet,
    group_by: &[&str],
    measures: &[(&str, Reduction)],
) -> PulseResult<RowSet> {
    let key_idx = group_by
        .iter()
        .map(|c| rows.column_index(c))
        .collect::<PulseResult<Vec<_>>>()?;
    let measure_idx = measures
        .iter()
        .map(|(c, _)| rows.column_index(c))
        .collect::<PulseResult<Vec<_>>>()?;

    let mut groups: BTreeMap<GroupKey, Vec<SumAcc>> = BTreeMap::new();
    for row in rows.rows() {
        if key_idx.iter().any(|&i| row[i].is_null()) {
            continue;
        }
        let key = GroupKey(key_idx.iter().map(|&i| row[i].clone()).collect());
        let accs = groups
            .entry(key)
            .or_insert_with(|| vec![SumAcc::new(); measures.len()]);
        for (slot, (&idx, (name, reduction))) in measure_idx.iter().zip(measures).enumerate() {
            match reduction {
                Reduction::Sum => accs[slot].add(&row[idx]).ok_or_else(|| {
                    PulseError::NotNumeric {
                        column: name.to_string(),
                    }
                })?,
            }
        }
    }

    let columns = group_by
        .iter()
        .chain(measures.iter().map(|(c, _)| c))
        .map(|c| c.to_string())
        .collect();
    let mut out = RowSet::new(columns);
    for (key, accs) in groups {
        let mut row = key.0;
        row.extend(accs.into_iter().map(SumAcc::finish));
        out.push(row);
    }
    Ok(out)
}

/// Filter to `period` (when given) and then `group`.
///
/// A period absent from the input yields an empty result, not an error.
pub fn aggregate(
    rows: &RowSet,
    period: Option<Period>,
    group_by: &[&str],
    measures: &[(&str, Reduction)],
) -> PulseResult<RowSet> {
    match period {
        Some(p) => {
            let filtered = filter_period(rows, p)?;
            if filtered.is_empty() {
                log::warn!("no rows for {p}");
            }
            group(&filtered, group_by, measures)
        }
        None => group(rows, group_by, measures),
    }
}

/// Shorthand for summing every listed column.
pub fn sums<'a>(columns: &[&'a str]) -> Vec<(&'a str, Reduction)> {
    columns.iter().map(|c| (*c, Reduction::Sum)).collect()
}

// ── Derived columns ──────────────────────────────────────────────────────────

/// `numerator / denominator`, with a zero denominator giving 0.
/// Overflow saturates at `f64::MAX`.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let r = numerator / denominator;
    if r.is_nan() {
        0.0
    } else {
        r.clamp(-f64::MAX, f64::MAX)
    }
}

/// Copy of `rows` with `out = numerator / denominator` per row.
pub fn with_ratio(
    rows: &RowSet,
    numerator: &str,
    denominator: &str,
    out: &str,
) -> PulseResult<RowSet> {
    let num = rows.numeric_column(numerator)?;
    let den = rows.numeric_column(denominator)?;
    let values = num
        .iter()
        .zip(&den)
        .map(|(n, d)| Value::Real(ratio(*n, *d)))
        .collect();
    Ok(rows.with_column(out, values))
}

/// Average transaction value per state: amount / count.
pub fn with_growth_score(rows: &RowSet) -> PulseResult<RowSet> {
    with_ratio(rows, "Transaction_amount", "Transaction_count", GROWTH_SCORE)
}

/// App opens per registered user.
pub fn with_engagement_rate(rows: &RowSet) -> PulseResult<RowSet> {
    with_ratio(rows, "AppOpens", "RegisteredUsers", ENGAGEMENT_RATE)
}

/// Copy of `rows` with `out = source / divisor`, e.g. amounts in millions.
pub fn with_scaled(rows: &RowSet, source: &str, divisor: f64, out: &str) -> PulseResult<RowSet> {
    let values = rows
        .numeric_column(source)?
        .into_iter()
        .map(|v| Value::Real(ratio(v, divisor)))
        .collect();
    Ok(rows.with_column(out, values))
}

/// Copy of `rows` with a `Period` label ("2023 Q4") built from Years/Quarter.
pub fn with_period_label(rows: &RowSet) -> PulseResult<RowSet> {
    let y = rows.column_index(YEAR_COLUMN)?;
    let q = rows.column_index(QUARTER_COLUMN)?;
    let labels = rows
        .rows()
        .iter()
        .map(|r| Value::Text(format!("{} Q{}", r[y], r[q])))
        .collect();
    Ok(rows.with_column(PERIOD_LABEL, labels))
}

// ── Ranking ──────────────────────────────────────────────────────────────────

/// The `n` rows with the largest `column`, descending.
/// Ties keep their input order. Fewer than `n` rows returns them all.
pub fn top_n(rows: &RowSet, column: &str, n: usize) -> PulseResult<RowSet> {
    let values = rows.numeric_column(column)?;
    let mut order: Vec<usize> = (0..values.len()).collect();
    // sort_by is stable.
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
    order.truncate(n);
    Ok(rows.reordered(&order))
}

// ── Period discovery ─────────────────────────────────────────────────────────

/// Distinct (year, quarter) pairs present, ascending.
pub fn periods(rows: &RowSet) -> PulseResult<Vec<Period>> {
    let y = rows.column_index(YEAR_COLUMN)?;
    let q = rows.column_index(QUARTER_COLUMN)?;
    let mut out: Vec<Period> = rows
        .rows()
        .iter()
        .filter_map(|r| Some(Period::new(r[y].as_i64()?, r[q].as_i64()?)))
        .collect();
    out.sort();
    out.dedup();
    Ok(out)
}

/// Distinct years present, ascending.
pub fn years(rows: &RowSet) -> PulseResult<Vec<Year>> {
    let mut out: Vec<Year> = periods(rows)?.into_iter().map(|p| p.year).collect();
    out.dedup();
    Ok(out)
}

/// Distinct quarters present within `year`, ascending.
pub fn quarters(rows: &RowSet, year: Year) -> PulseResult<Vec<Quarter>> {
    Ok(periods(rows)?
        .into_iter()
        .filter(|p| p.year == year)
        .map(|p| p.quarter)
        .collect())
}

/// The latest year, then the latest quarter within that year.
pub fn latest_period(rows: &RowSet) -> PulseResult<Option<Period>> {
    Ok(periods(rows)?.last().copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_is_zero_only_for_zero_denominator() {
        assert_eq!(ratio(10.0, 0.0), 0.0);
        assert_eq!(ratio(0.0, 0.0), 0.0);
        assert_eq!(ratio(150.0, 15.0), 10.0);
        assert!(ratio(1.0, 3.0) > 0.0);
        assert_eq!(ratio(1e308, 1e-10), f64::MAX);
        assert_eq!(ratio(-1e308, 1e-10), -f64::MAX);
    }

    #[test]
    fn integer_sums_stay_integral() {
        let mut acc = SumAcc::new();
        acc.add(&Value::Integer(2)).unwrap();
        acc.add(&Value::Null).unwrap();
        acc.add(&Value::Integer(3)).unwrap();
        assert_eq!(acc.finish(), Value::Integer(5));

        let mut acc = SumAcc::new();
        acc.add(&Value::Integer(2)).unwrap();
        acc.add(&Value::Real(0.5)).unwrap();
        assert_eq!(acc.finish(), Value::Real(2.5));
    }

    #[test]
    fn text_cannot_be_summed() {
        let mut acc = SumAcc::new();
        assert!(acc.add(&Value::from("12")).is_none());
    }
}
