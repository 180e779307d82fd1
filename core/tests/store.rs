//! Table loader tests against an in-memory database.

use pulse_core::{
    config::TableNames,
    error::PulseError,
    rowset::Value,
    store::{PulseStore, Table},
};
use rusqlite::params;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn make_store() -> PulseStore {
    let store = PulseStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

fn insert_txn(store: &PulseStore, state: Option<&str>, year: i64, quarter: i64, amount: f64, count: i64) {
    store
        .connection()
        .execute(
            "INSERT INTO aggregated_transaction
             (States, Years, Quarter, Transaction_type, Transaction_count, Transaction_amount)
             VALUES (?1, ?2, ?3, 'Peer-to-peer payments', ?4, ?5)",
            params![state, year, quarter, count, amount],
        )
        .expect("insert");
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn states_column_is_canonicalized_and_renamed() {
    let store = make_store();
    insert_txn(&store, Some("Orissa"), 2023, 1, 100.0, 10);
    insert_txn(&store, Some("  Andaman and Nicobar "), 2023, 1, 50.0, 5);
    insert_txn(&store, None, 2023, 1, 1.0, 1);

    let rows = store.load("aggregated_transaction").unwrap();

    assert!(rows.has_column("State"));
    assert!(!rows.has_column("States"));
    assert_eq!(
        rows.label_column("State").unwrap(),
        vec!["odisha", "andaman & nicobar islands", ""]
    );
    assert_eq!(rows.rows()[2][0], Value::Null, "missing states stay null");
}

#[test]
fn columns_keep_select_order_and_storage_types() {
    let store = make_store();
    insert_txn(&store, Some("goa"), 2022, 3, 12.5, 4);

    let rows = store.load("aggregated_transaction").unwrap();
    assert_eq!(
        rows.columns(),
        &[
            "State",
            "Years",
            "Quarter",
            "Transaction_type",
            "Transaction_count",
            "Transaction_amount"
        ]
    );
    let row = &rows.rows()[0];
    assert_eq!(row[1], Value::Integer(2022));
    assert_eq!(row[4], Value::Integer(4));
    assert_eq!(row[5], Value::Real(12.5));
}

#[test]
fn tables_without_states_are_left_alone() {
    let store = make_store();
    store
        .connection()
        .execute_batch("CREATE TABLE pincode_ref (Pincodes TEXT, Label TEXT); INSERT INTO pincode_ref VALUES ('560001', 'Orissa');")
        .unwrap();

    let rows = store.load("pincode_ref").unwrap();
    assert_eq!(rows.columns(), &["Pincodes", "Label"]);
    assert_eq!(rows.label_column("Label").unwrap(), vec!["Orissa"]);
}

#[test]
fn absent_table_is_an_error_from_load() {
    let store = make_store();
    let err = store.load("no_such_table").unwrap_err();
    assert!(matches!(err, PulseError::Database(_)), "unexpected error: {err}");
}

#[test]
fn absent_table_degrades_to_empty_rows() {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = make_store();
    let rows = store.load_or_empty("no_such_table");
    assert!(rows.is_empty());
    assert!(rows.columns().is_empty());
}

#[test]
fn every_logical_table_exists_after_migrate() {
    let store = make_store();
    let names = TableNames::default();
    for table in Table::ALL {
        let name = table.physical_name(&names);
        let rows = store.load(name).unwrap_or_else(|e| panic!("{name}: {e}"));
        assert!(rows.is_empty(), "{name} should start empty");
        assert!(rows.has_column("State"), "{name} should expose State");
    }
}

#[test]
fn quoted_table_names_cannot_escape_the_select() {
    let store = make_store();
    let err = store.load("aggregated_user\"; DROP TABLE map_user; --").unwrap_err();
    assert!(matches!(err, PulseError::Database(_)));
    assert!(store.load("map_user").is_ok(), "map_user must survive");
}

#[test]
fn unreachable_database_degrades_to_empty_tables() {
    assert!(PulseStore::open("/nonexistent/dir/pulse.db").is_err());

    let store = PulseStore::open_or_empty("/nonexistent/dir/pulse.db").unwrap();
    assert_eq!(store.path(), None);
    let rows = store.load_or_empty(Table::MapUser.physical_name(&TableNames::default()));
    assert!(rows.is_empty());
}

#[test]
fn sample_config_file_parses() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/dashboard.json");
    let config = pulse_core::config::DashboardConfig::load(path).unwrap();
    assert_eq!(config, pulse_core::config::DashboardConfig {
        geojson: "data/Indian_States.geojson".into(),
        ..Default::default()
    });
}
