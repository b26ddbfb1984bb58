pub mod bonds;
pub mod error;
pub mod format;
pub mod linker;
pub mod session;
pub mod stats;
pub mod view;

use brokerage_positions::BrokeragePositionsParser;
use chrono::{NaiveDate, Utc};
use models::{PortfolioSnapshot, PositionStats};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

pub use error::{EngineError, Result};
pub use linker::link_positions;
pub use session::{PortfolioSession, PublishedPortfolio};
pub use stats::{calculate_stats, option_universe, reference_time};
pub use view::{group_by_strategy, SortConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardMetadata {
    pub generated_at: String,
    pub source_digest: String,
    pub as_of: Option<NaiveDate>,
    pub header_found: bool,
    pub skipped_records: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardOutput {
    pub metadata: DashboardMetadata,
    pub snapshot: PortfolioSnapshot,
    pub stats: PositionStats,
}

/// Raw export text to a linked snapshot.
pub fn build_snapshot(raw: &str) -> PortfolioSnapshot {
    let parsed = BrokeragePositionsParser::new().parse_text(raw);
    link_positions(parsed.positions, parsed.source_digest)
}

pub fn generate_dashboard(raw: &str, as_of: Option<NaiveDate>) -> DashboardOutput {
    let parsed = BrokeragePositionsParser::new().parse_text(raw);
    let metadata = DashboardMetadata {
        generated_at: Utc::now().to_rfc3339(),
        source_digest: parsed.source_digest.clone(),
        as_of,
        header_found: parsed.header_found,
        skipped_records: parsed.skipped_records,
    };

    let snapshot = link_positions(parsed.positions, parsed.source_digest);
    let stats = calculate_stats(&snapshot, reference_time(as_of));

    DashboardOutput {
        metadata,
        snapshot,
        stats,
    }
}

pub fn generate_dashboard_from_file(
    csv_path: &Path,
    as_of: Option<NaiveDate>,
) -> Result<DashboardOutput> {
    let bytes = fs::read(csv_path).map_err(|source| EngineError::Read {
        path: csv_path.to_path_buf(),
        source,
    })?;
    Ok(generate_dashboard(&String::from_utf8_lossy(&bytes), as_of))
}

pub fn write_dashboard_json(output: &DashboardOutput, out_path: &Path, pretty: bool) -> Result<()> {
    let write_err = |source| EngineError::Write {
        path: out_path.to_path_buf(),
        source,
    };
    if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let json = if pretty {
        serde_json::to_string_pretty(output)?
    } else {
        serde_json::to_string(output)?
    };
    fs::write(out_path, json).map_err(write_err)?;
    Ok(())
}
