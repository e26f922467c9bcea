//! dashboard-runner: headless driver for the Nickel Watch dashboards.
//!
//! Usage:
//!   dashboard-runner --seed 42
//!   dashboard-runner --seed 42 --config dashboard.json --ipc-mode

use anyhow::Result;
use nickel_watch_core::{
    config::DashboardConfig,
    dashboard::Dashboard,
    filter::SiteFilter,
    risk::category_counts,
    session::Session,
    view::usd,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Login {
        username: String,
        password: String,
    },
    Logout,
    Render {
        page: String,
        #[serde(default)]
        filters: serde_json::Value,
    },
    GetSession,
    Quit,
}

#[derive(serde::Serialize)]
struct SessionState {
    session_id: String,
    user: Option<String>,
    authenticated: bool,
    pages: Vec<&'static str>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed_flag: Option<u64> = parse_arg(&args, "--seed");
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let config_path: Option<String> = parse_arg(&args, "--config");

    let mut config = match config_path.as_deref() {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    };
    if let Some(seed) = seed_flag {
        config = config.with_seed(seed);
    }
    let seed = config.seed;

    if !ipc_mode {
        println!("Nickel Watch: dashboard-runner");
        println!("  seed:      {seed}");
        println!("  config:    {}", config_path.as_deref().unwrap_or("(defaults)"));
        println!();
    }

    let dashboard = Dashboard::build(config)?;

    if ipc_mode {
        run_ipc_loop(&dashboard)?;
    } else {
        print_summary(&dashboard)?;
    }
    Ok(())
}

fn run_ipc_loop(dashboard: &Dashboard) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();
    let mut session = Session::new();

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
                write_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Login { username, password } => {
                let ok = session.login(&dashboard.config().auth, &username, &password);
                if ok {
                    write_json(&mut stdout, &session_state(dashboard, &session))?;
                } else {
                    write_error(&mut stdout, "invalid username or password")?;
                }
            }
            IpcCommand::Logout => {
                session.logout();
                write_json(&mut stdout, &session_state(dashboard, &session))?;
            }
            IpcCommand::GetSession => {
                write_json(&mut stdout, &session_state(dashboard, &session))?;
            }
            IpcCommand::Render { page, filters } => {
                match dashboard.render_named(&session, &page, filters) {
                    Ok(view) => write_json(&mut stdout, &view)?,
                    Err(e) => {
                        log::warn!("render {page} failed: {e}");
                        write_error(&mut stdout, &e.to_string())?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn session_state(dashboard: &Dashboard, session: &Session) -> SessionState {
    SessionState {
        session_id: session.id.to_string(),
        user: session.user.clone(),
        authenticated: session.is_authenticated(),
        pages: dashboard.pages(session).iter().map(|p| p.as_str()).collect(),
    }
}

fn write_json<T: serde::Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string(value)?)?;
    out.flush()?;
    Ok(())
}

fn write_error(out: &mut impl Write, message: &str) -> Result<()> {
    write_json(out, &serde_json::json!({ "error": message }))
}

fn print_summary(dashboard: &Dashboard) -> Result<()> {
    let store = dashboard.store();

    println!("=== DATASET ===");
    for table in ["mine", "stakeholder_txn", "site", "official", "txn", "connection"] {
        println!("  {table:<16} {}", store.row_count(table)?);
    }

    let rows = dashboard.integrated_risk(&SiteFilter::default())?;
    println!();
    println!("=== INTEGRATED RISK ===");
    for r in &rows {
        println!(
            "  {:<10} {:<18} {:<5} | land {:.2} fin {:.2} off {:.2} txn {:.2} | {:.3} {}",
            r.site_name,
            r.district,
            r.license_type.as_str(),
            r.sub_scores.land_change,
            r.sub_scores.financial,
            r.sub_scores.official,
            r.sub_scores.transaction,
            r.score,
            r.category
        );
    }
    let counts = category_counts(&rows);
    println!(
        "  low: {}  medium: {}  high: {}",
        counts[0].1, counts[1].1, counts[2].1
    );

    let financials = store.financial_records()?;
    let reported: f64 = financials.iter().map(|f| f.reported_revenue).sum();
    let estimated: f64 = financials.iter().map(|f| f.estimated_revenue).sum();
    println!();
    println!("=== REVENUE ===");
    println!("  reported:  {}", usd(reported));
    println!("  estimated: {}", usd(estimated));

    let (_, forest) = dashboard.fit_classifier()?;
    println!();
    println!("=== CLASSIFIER (illustrative) ===");
    println!("  training accuracy: {:.1}%", forest.accuracy(&rows) * 100.0);
    for f in forest.feature_importances() {
        println!("  {:<12} {:.3}", f.feature, f.importance);
    }
    Ok(())
}

/// Value following `flag`, if present and parseable.
fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
}
