//! Aggregation layer tests: grouping, filtering, ratios and ranking.

use pulse_core::{
    aggregate::{
        aggregate, drop_invalid_periods, group, latest_period, periods, quarters, ratio, sums,
        top_n, with_engagement_rate, with_growth_score, with_period_label, years, Reduction,
        ENGAGEMENT_RATE, GROWTH_SCORE, PERIOD_LABEL,
    },
    error::PulseError,
    rowset::{RowSet, Value},
    types::Period,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Rows shaped like a transaction table: State, Years, Quarter, amount, count.
fn txn_rows(rows: &[(&str, i64, i64, f64, i64)]) -> RowSet {
    let mut set = RowSet::with_columns(&[
        "State",
        "Years",
        "Quarter",
        "Transaction_amount",
        "Transaction_count",
    ]);
    for (state, year, quarter, amount, count) in rows {
        set.push(vec![
            Value::from(*state),
            Value::Integer(*year),
            Value::Integer(*quarter),
            Value::Real(*amount),
            Value::Integer(*count),
        ]);
    }
    set
}

fn labels(rows: &RowSet, column: &str) -> Vec<String> {
    rows.label_column(column).unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn odisha_rows_collapse_into_one_group() {
    let rows = txn_rows(&[("odisha", 2023, 1, 100.0, 10), ("odisha", 2023, 1, 50.0, 5)]);

    let out = group(&rows, &["State"], &sums(&["Transaction_amount", "Transaction_count"])).unwrap();
    let out = with_growth_score(&out).unwrap();

    assert_eq!(out.len(), 1);
    assert_eq!(labels(&out, "State"), vec!["odisha"]);
    assert_eq!(out.numeric_column("Transaction_amount").unwrap(), vec![150.0]);
    assert_eq!(out.numeric_column("Transaction_count").unwrap(), vec![15.0]);
    assert_eq!(out.numeric_column(GROWTH_SCORE).unwrap(), vec![10.0]);
}

#[test]
fn grouping_conserves_column_sums() {
    let rows = txn_rows(&[
        ("kerala", 2022, 1, 10.0, 1),
        ("goa", 2022, 2, 20.0, 2),
        ("kerala", 2022, 3, 30.0, 3),
        ("bihar", 2023, 1, 40.0, 4),
        ("goa", 2023, 4, 50.0, 5),
    ]);

    for key in ["State", "Years", "Quarter"] {
        let out = aggregate(&rows, None, &[key], &sums(&["Transaction_amount", "Transaction_count"])).unwrap();
        assert_eq!(out.sum("Transaction_amount").unwrap(), rows.sum("Transaction_amount").unwrap());
        assert_eq!(out.sum("Transaction_count").unwrap(), rows.sum("Transaction_count").unwrap());
        let distinct: std::collections::BTreeSet<String> = labels(&rows, key).into_iter().collect();
        assert_eq!(out.len(), distinct.len(), "one row per distinct {key}");
    }
}

#[test]
fn groups_come_out_in_key_order() {
    let rows = txn_rows(&[
        ("kerala", 2023, 2, 1.0, 1),
        ("assam", 2022, 4, 1.0, 1),
        ("kerala", 2022, 1, 1.0, 1),
    ]);
    let by_state = group(&rows, &["State"], &sums(&["Transaction_count"])).unwrap();
    assert_eq!(labels(&by_state, "State"), vec!["assam", "kerala"]);

    let by_period = group(&rows, &["Years", "Quarter"], &sums(&["Transaction_amount"])).unwrap();
    let by_period = with_period_label(&by_period).unwrap();
    assert_eq!(labels(&by_period, PERIOD_LABEL), vec!["2022 Q1", "2022 Q4", "2023 Q2"]);
}

#[test]
fn filter_keeps_only_the_exact_period() {
    let rows = txn_rows(&[
        ("goa", 2023, 1, 10.0, 1),
        ("goa", 2023, 2, 20.0, 2),
        ("goa", 2022, 1, 40.0, 4),
    ]);
    let out = aggregate(&rows, Some(Period::new(2023, 1)), &["State"], &sums(&["Transaction_amount"])).unwrap();
    assert_eq!(out.numeric_column("Transaction_amount").unwrap(), vec![10.0]);
}

#[test]
fn absent_period_yields_empty_result() {
    let rows = txn_rows(&[("goa", 2023, 1, 10.0, 1)]);
    let out = aggregate(
        &rows,
        Some(Period::new(2099, 1)),
        &["State"],
        &[("Transaction_amount", Reduction::Sum)],
    )
    .expect("absent period is not an error");
    assert!(out.is_empty());
}

#[test]
fn missing_group_column_is_reported() {
    let rows = txn_rows(&[("goa", 2023, 1, 10.0, 1)]);
    let err = group(&rows, &["District"], &sums(&["Transaction_amount"])).unwrap_err();
    assert!(
        matches!(err, PulseError::MissingColumn { ref column, .. } if column == "District"),
        "unexpected error: {err}"
    );
}

#[test]
fn text_in_a_summed_column_is_reported() {
    let mut rows = RowSet::with_columns(&["State", "Transaction_count"]);
    rows.push(vec![Value::from("goa"), Value::from("many")]);
    let err = group(&rows, &["State"], &sums(&["Transaction_count"])).unwrap_err();
    assert!(matches!(err, PulseError::NotNumeric { .. }), "unexpected error: {err}");
}

#[test]
fn null_cells_sum_as_zero() {
    let mut rows = RowSet::with_columns(&["State", "AppOpens"]);
    rows.push(vec![Value::from("goa"), Value::Null]);
    rows.push(vec![Value::from("goa"), Value::Integer(7)]);
    let out = group(&rows, &["State"], &sums(&["AppOpens"])).unwrap();
    assert_eq!(out.numeric_column("AppOpens").unwrap(), vec![7.0]);
}

#[test]
fn null_keys_form_no_group() {
    let mut rows = RowSet::with_columns(&["District", "AppOpens"]);
    rows.push(vec![Value::Null, Value::Integer(900)]);
    rows.push(vec![Value::from("pune"), Value::Integer(10)]);
    rows.push(vec![Value::from("nagpur"), Value::Integer(40)]);

    let out = group(&rows, &["District"], &sums(&["AppOpens"])).unwrap();
    let top = top_n(&out, "AppOpens", 10).unwrap();
    assert_eq!(labels(&top, "District"), vec!["nagpur", "pune"]);
    assert_eq!(top.numeric_column("AppOpens").unwrap(), vec![40.0, 10.0]);
}

#[test]
fn ratios_are_zero_exactly_when_denominator_is_zero() {
    for n in [0.0, 1.0, 12.5, 1e12] {
        assert_eq!(ratio(n, 0.0), 0.0);
        for d in [1e-10, 0.5, 1.0, 3.0, 1e9] {
            let r = ratio(n, d);
            assert!(r.is_finite());
            assert_eq!(r == 0.0, n == 0.0, "ratio({n}, {d}) = {r}");
        }
    }
}

#[test]
fn engagement_rate_handles_states_without_users() {
    let mut rows = RowSet::with_columns(&["State", "RegisteredUsers", "AppOpens"]);
    rows.push(vec![Value::from("goa"), Value::Integer(0), Value::Integer(50)]);
    rows.push(vec![Value::from("kerala"), Value::Integer(100), Value::Integer(250)]);

    let out = with_engagement_rate(&rows).unwrap();
    assert_eq!(out.numeric_column(ENGAGEMENT_RATE).unwrap(), vec![0.0, 2.5]);
    // The input is not modified.
    assert!(!rows.has_column(ENGAGEMENT_RATE));
}

#[test]
fn top_n_sorts_descending_with_stable_ties() {
    let rows = txn_rows(&[
        ("a", 2023, 1, 5.0, 1),
        ("b", 2023, 1, 9.0, 1),
        ("c", 2023, 1, 5.0, 1),
        ("d", 2023, 1, 7.0, 1),
        ("e", 2023, 1, 5.0, 1),
    ]);
    let top = top_n(&rows, "Transaction_amount", 4).unwrap();
    assert_eq!(top.len(), 4);
    assert_eq!(labels(&top, "State"), vec!["b", "d", "a", "c"]);

    let values = top.numeric_column("Transaction_amount").unwrap();
    assert!(values.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn top_n_larger_than_input_returns_everything() {
    let rows = txn_rows(&[("a", 2023, 1, 1.0, 1), ("b", 2023, 1, 2.0, 1)]);
    let top = top_n(&rows, "Transaction_amount", 10).unwrap();
    assert_eq!(labels(&top, "State"), vec!["b", "a"]);
}

#[test]
fn period_discovery_lists_sorted_distinct_values() {
    let rows = txn_rows(&[
        ("a", 2023, 3, 1.0, 1),
        ("a", 2022, 4, 1.0, 1),
        ("b", 2023, 1, 1.0, 1),
        ("c", 2023, 3, 1.0, 1),
    ]);
    assert_eq!(
        periods(&rows).unwrap(),
        vec![Period::new(2022, 4), Period::new(2023, 1), Period::new(2023, 3)]
    );
    assert_eq!(years(&rows).unwrap(), vec![2022, 2023]);
    assert_eq!(quarters(&rows, 2023).unwrap(), vec![1, 3]);
    assert!(quarters(&rows, 2019).unwrap().is_empty());
    assert_eq!(latest_period(&rows).unwrap(), Some(Period::new(2023, 3)));
}

#[test]
fn invalid_periods_are_dropped() {
    let mut rows = txn_rows(&[
        ("a", 2017, 1, 1.0, 1),
        ("a", 2018, 0, 1.0, 1),
        ("a", 2018, 5, 1.0, 1),
        ("a", 2018, 4, 1.0, 1),
    ]);
    let dropped = drop_invalid_periods(&mut rows, 2018);
    assert_eq!(dropped, 3);
    assert_eq!(periods(&rows).unwrap(), vec![Period::new(2018, 4)]);
}
