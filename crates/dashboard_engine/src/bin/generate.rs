use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use dashboard_engine::{generate_dashboard_from_file, write_dashboard_json};
use std::env;
use std::path::PathBuf;

fn arg_value(flag: &str) -> Option<String> {
    env::args()
        .position(|a| a == flag)
        .and_then(|i| env::args().nth(i + 1))
}

fn main() -> Result<()> {
    let csv = arg_value("--csv").ok_or_else(|| anyhow!("missing --csv <positions export>"))?;
    let settings_path = arg_value("--settings").map(PathBuf::from);

    let settings = settings_loader::resolve_settings(settings_path.as_ref())
        .context("resolve settings")?;
    logger::init(&settings.log_filter);

    let out_path = arg_value("--out")
        .map(PathBuf::from)
        .unwrap_or_else(|| settings.dashboard_path.clone());
    let as_of = match arg_value("--as-of") {
        Some(raw) => Some(
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .with_context(|| format!("invalid --as-of date '{}'", raw))?,
        ),
        None => settings.as_of,
    };
    let csv_path = PathBuf::from(&csv);

    println!(
        "Generating positions dashboard...\n  export: {}\n  output: {}",
        csv_path.display(),
        out_path.display()
    );

    let dashboard = generate_dashboard_from_file(&csv_path, as_of).context("generate dashboard")?;
    write_dashboard_json(&dashboard, &out_path, settings.pretty)
        .context("write dashboard json")?;

    if !dashboard.metadata.header_found {
        println!("⚠️  No positions header found in {}", csv_path.display());
    }
    println!(
        "Done. {} stocks, {} options, {} bonds. Generated at {}",
        dashboard.stats.stocks,
        dashboard.stats.options,
        dashboard.stats.bonds,
        dashboard.metadata.generated_at
    );
    Ok(())
}
