//! pulse-dash: headless renderer for the transaction insights dashboard.
//!
//! Usage:
//!   pulse-dash --db pulse.db --geojson Indian_States.geojson --page overview
//!   pulse-dash --config dashboard.json --page case --case user-growth --year 2023 --quarter 4
//!   pulse-dash --config dashboard.json --page boundaries
//!   pulse-dash --config dashboard.json --ipc-mode

use anyhow::Result;
use pulse_core::{
    config::DashboardConfig,
    dashboard::{CaseStudy, Dashboard},
    geo::BoundarySet,
    store::PulseStore,
    types::{Period, Quarter, Year},
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Overview,
    Boundaries,
    Periods {
        case: CaseStudy,
        #[serde(default)]
        year: Option<Year>,
    },
    CaseStudy {
        case: CaseStudy,
        #[serde(default)]
        year: Option<Year>,
        #[serde(default)]
        quarter: Option<Quarter>,
    },
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut config = match flag(&args, "--config") {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    };
    if let Some(db) = flag(&args, "--db") {
        config.database = db.to_string();
    }
    if let Some(geojson) = flag(&args, "--geojson") {
        config.geojson = geojson.to_string();
    }
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");

    let store = PulseStore::open_or_empty(&config.database)?;
    let boundaries = BoundarySet::load_or_empty(&config.geojson);
    log::info!(
        "database {} | {} boundary features",
        store.path().unwrap_or("<empty>"),
        boundaries.len()
    );
    let dashboard = Dashboard::new(&store, &boundaries, &config);

    if ipc_mode {
        return run_ipc_loop(&dashboard);
    }

    let page = flag(&args, "--page").unwrap_or("overview");
    let json = match page {
        "overview" => serde_json::to_string_pretty(&dashboard.overview()?)?,
        "boundaries" => serde_json::to_string_pretty(dashboard.boundaries())?,
        "case" => {
            let case: CaseStudy = flag(&args, "--case")
                .unwrap_or(CaseStudy::TransactionDynamics.slug())
                .parse()?;
            let year = numeric_flag(&args, "--year")?;
            let quarter = numeric_flag(&args, "--quarter")?;
            let period = resolve_period(&dashboard, case, year, quarter)?;
            serde_json::to_string_pretty(&dashboard.case_study(case, period)?)?
        }
        other => anyhow::bail!("Unknown page '{other}' (expected overview, case or boundaries)"),
    };
    println!("{json}");
    Ok(())
}

fn run_ipc_loop(dashboard: &Dashboard<'_>) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                reply_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };

        let reply = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Overview => dashboard.overview().map(|p| serde_json::to_value(p)),
            IpcCommand::Boundaries => Ok(Ok(dashboard.boundaries().clone())),
            IpcCommand::Periods { case, year } => dashboard
                .period_choices(case, year)
                .map(|p| serde_json::to_value(p)),
            IpcCommand::CaseStudy {
                case,
                year,
                quarter,
            } => resolve_period(dashboard, case, year, quarter)
                .and_then(|period| dashboard.case_study(case, period))
                .map(|p| serde_json::to_value(p)),
        };

        // Schema errors are reported per request; the session keeps going.
        match reply {
            Ok(value) => writeln!(stdout, "{}", value?)?,
            Err(e) => {
                log::error!("request failed: {e}");
                reply_error(&mut stdout, &e.to_string())?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn reply_error(stdout: &mut io::Stdout, message: &str) -> Result<()> {
    let err_json = serde_json::json!({ "error": message });
    writeln!(stdout, "{}", err_json)?;
    stdout.flush()?;
    Ok(())
}

/// Fill in whichever of year/quarter the caller left out from the
/// case's selector defaults.
fn resolve_period(
    dashboard: &Dashboard<'_>,
    case: CaseStudy,
    year: Option<Year>,
    quarter: Option<Quarter>,
) -> pulse_core::error::PulseResult<Period> {
    if let (Some(y), Some(q)) = (year, quarter) {
        return Ok(Period::new(y, q));
    }
    let choices = dashboard.period_choices(case, year)?;
    let q = quarter
        .or_else(|| choices.quarters.first().copied())
        .unwrap_or(1);
    Ok(Period::new(choices.year, q))
}

/// Parse an optional integer flag, rejecting values that are not numbers.
fn numeric_flag(args: &[String], name: &str) -> Result<Option<i64>> {
    match flag(args, name) {
        None => Ok(None),
        Some(v) => match v.parse() {
            Ok(n) => Ok(Some(n)),
            Err(_) => anyhow::bail!("Invalid value '{v}' for {name} (expected an integer)"),
        },
    }
}

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}
