use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dashboard_engine::bonds::value_bonds;
use dashboard_engine::format::{
    ChangeDirection, change_direction, format_amount, format_currency, format_percentage,
};
use dashboard_engine::view::{bond_rows, orphan_rows, stock_rows};
use dashboard_engine::{PortfolioSession, SortConfig, group_by_strategy};
use models::{Position, SortKey};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "positions", about = "Browse a brokerage positions export from the terminal.")]
struct Args {
    /// Positions CSV export
    csv: PathBuf,

    /// Case-insensitive substring filter on symbols
    #[arg(short, long, default_value = "")]
    filter: String,

    /// Column header click; repeat to toggle (e.g. --sort last --sort last)
    #[arg(short, long = "sort")]
    sort: Vec<SortKey>,

    /// Reference day for expiry buckets (YYYY-MM-DD)
    #[arg(long)]
    as_of: Option<NaiveDate>,

    #[arg(long)]
    settings: Option<PathBuf>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    view: Option<View>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum View {
    /// Stocks with their option legs (default)
    Stocks,
    /// Options whose underlying has no stock row
    Orphans,
    /// Bonds and CDs with valuation
    Bonds,
    /// Options bucketed by strategy
    Strategies,
    /// Counts and expiry buckets
    Stats,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn position_line(p: &Position) -> String {
    let arrow = match change_direction(&p.percent_change) {
        ChangeDirection::Up => "▲",
        ChangeDirection::Down => "▼",
    };
    format!(
        "{:<22} {:>10} {:>8} {:>10} {} {:>8} {:>5} {:>14}",
        p.symbol,
        format_currency(&p.last),
        p.signed_quantity(),
        format_currency(&p.avg_price_text),
        arrow,
        format_percentage(&p.percent_change),
        p.days,
        format_amount(p.position_value),
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = settings_loader::resolve_settings(args.settings.as_ref())
        .context("resolve settings")?;
    logger::init(&settings.log_filter);

    let mut config = SortConfig::new(settings.default_sort);
    for key in &args.sort {
        config.request_sort(*key);
    }

    let session = PortfolioSession::new(args.as_of.or(settings.as_of));
    let published = session
        .upload_file(&args.csv)
        .await
        .with_context(|| format!("load {}", args.csv.display()))?;
    let snapshot = &published.snapshot;

    let view = args.view.unwrap_or(if settings.group_by_strategy {
        View::Strategies
    } else {
        View::Stocks
    });

    match view {
        View::Stocks => {
            let rows = stock_rows(snapshot, &args.filter, &config);
            if args.json {
                return print_json(&rows);
            }
            for row in rows {
                match row.stock {
                    Some(stock) => println!("{}", position_line(stock)),
                    None => println!("{:<22} (no stock row)", row.symbol),
                }
                for option in row.options {
                    let leg = option.leg_label().unwrap_or_default();
                    println!("  └ {} {}", position_line(option), leg);
                }
                if row.option_count > 0 {
                    println!("  {} option(s)", row.option_count);
                }
            }
        }
        View::Orphans => {
            let rows = orphan_rows(snapshot, &args.filter, &config);
            if args.json {
                return print_json(&rows);
            }
            for option in rows {
                println!("{}", position_line(option));
            }
        }
        View::Bonds => {
            let rows = bond_rows(snapshot, &args.filter, &config);
            let valued = value_bonds(&rows);
            if args.json {
                return print_json(&valued);
            }
            for bond in valued {
                println!(
                    "{:<14} qty {:>8} cost {:>14} value {:>14} pnl {:>12}",
                    bond.symbol,
                    bond.quantity,
                    format_amount(bond.cost_basis),
                    format_amount(bond.market_value),
                    format_amount(bond.pnl),
                );
            }
        }
        View::Strategies => {
            let buckets = group_by_strategy(snapshot);
            if args.json {
                return print_json(&buckets);
            }
            for bucket in buckets {
                println!("{} ({})", bucket.strategy, bucket.entries.len());
                for entry in bucket.entries {
                    println!("  {:<8} {}", entry.stock_symbol, position_line(entry.option));
                }
            }
        }
        View::Stats => {
            let stats = &published.stats;
            if args.json {
                return print_json(stats);
            }
            println!("📈 Stocks : {}", stats.stocks);
            println!("🧾 Options: {}", stats.options);
            println!("🏦 Bonds  : {}", stats.bonds);
            for (strategy, count) in &stats.strategies {
                println!("   {}: {}", strategy, count);
            }
            let e = &stats.expirations;
            println!(
                "⏳ Expiring: ≤7d {} | 8-30d {} | 31-90d {} | >90d {}",
                e.next_7_days, e.next_8_to_30_days, e.next_31_to_90_days, e.over_90_days
            );
        }
    }

    Ok(())
}
