use anyhow::Result;
use std::{env, fs, path::PathBuf};

use brokerage_positions::BrokeragePositionsParser;
use models::PositionType;

fn find_csv_file() -> Option<PathBuf> {
    let current_dir = env::current_dir().ok()?;
    let entries = fs::read_dir(&current_dir).ok()?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("csv") {
            return Some(path);
        }
    }
    None
}

fn main() -> Result<()> {
    // Usage:
    //   brokerage_positions [csv_file]
    //
    // If csv_file is not provided, the first .csv file in the current directory is used.
    logger::init("info");

    let csv_path = if let Some(arg) = env::args().nth(1) {
        PathBuf::from(arg)
    } else if let Some(found) = find_csv_file() {
        found
    } else {
        anyhow::bail!("No CSV file found in current directory. Please provide a CSV file path as the first argument.");
    };

    println!("📖 Parsing positions export: {}", csv_path.display());

    let parsed = BrokeragePositionsParser::new().parse_file(&csv_path)?;

    if !parsed.header_found {
        println!("❌ Positions header not found, nothing parsed.");
        return Ok(());
    }

    println!("\n📊 Summary:");
    println!("✓ Rows: {}", parsed.positions.len());
    println!("✓ Stocks/ETFs: {}", parsed.count(PositionType::Stock));
    println!(
        "✓ Options: {} ({} undecoded)",
        parsed.count(PositionType::Option),
        parsed.undecoded_options()
    );
    println!("✓ Bonds/CDs: {}", parsed.count(PositionType::Bond));
    if parsed.skipped_records > 0 {
        println!("⚠ Skipped unreadable rows: {}", parsed.skipped_records);
    }
    println!("✅ Source digest: {}", &parsed.source_digest[..12]);

    Ok(())
}
