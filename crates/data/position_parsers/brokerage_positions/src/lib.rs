pub mod classify;
pub mod normalize;
pub mod preprocess;
pub mod strategy;

use anyhow::{Context, Result};
use models::{Position, PositionType};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

pub use classify::{classify, parse_option_symbol, OptionSymbol};
pub use normalize::{parse_amount, parse_price, parse_quantity};
pub use preprocess::{clean_export, CleanedExport, HEADER_LINE};
pub use strategy::tag_strategy;

pub const PARSER_NAME: &str = "brokerage_positions";

/// Parser for the single supported brokerage positions export layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrokeragePositionsParser;

impl BrokeragePositionsParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<ParsedPositions> {
        let mut file = std::fs::File::open(path.as_ref())
            .with_context(|| format!("Cannot open {}", path.as_ref().display()))?;
        self.parse_reader(&mut file)
            .with_context(|| format!("Cannot read {}", path.as_ref().display()))
    }

    pub fn parse_reader<R: Read>(&self, mut reader: R) -> Result<ParsedPositions> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(self.parse_text(&String::from_utf8_lossy(&buf)))
    }

    /// Full text-to-positions pass: preprocess, normalize, classify, tag.
    /// Never fails; defects degrade to fewer rows or defaulted fields.
    pub fn parse_text(&self, raw: &str) -> ParsedPositions {
        let cleaned = clean_export(raw);
        let rows = normalize::normalize_rows(&cleaned.text);

        ParsedPositions {
            header_found: cleaned.header_found,
            source_digest: make_hash_id(&cleaned.text),
            positions: rows.positions,
            skipped_records: rows.skipped_records,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedPositions {
    pub header_found: bool,
    /// SHA-256 of the cleaned CSV text.
    pub source_digest: String,
    pub positions: Vec<Position>,
    pub skipped_records: usize,
}

impl ParsedPositions {
    pub fn count(&self, position_type: PositionType) -> usize {
        self.positions
            .iter()
            .filter(|p| p.position_type() == position_type)
            .count()
    }

    /// Options whose symbol starts with `.` but did not decode.
    pub fn undecoded_options(&self) -> usize {
        self.positions
            .iter()
            .filter(|p| p.position_type() == PositionType::Option && p.contract().is_none())
            .count()
    }
}

fn make_hash_id(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    let hash = hasher.finalize();
    hex::encode(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{OptionStrategy, OptionType, Side};

    const EXPORT: &str = "Account Summary\n\
        As of 01/10/2025\n\
        \n\
        Symbol,Last,Pos Qty,%Change,Avg Price,Days\n\
        AAPL,150.00,+100,+1.2%,140.00,-\n\
        \n\
        .AAPL250117C150,5.00,-2,+3.0%,4.00,30\n\
        .TSLA250321P200,12.00,1,-2.0%,$10.00,60\n\
        912828XG8,99.50,10,+0.1%,98.00,-\n\
        .BADSYMBOL,1.00,1,+0%,1.00,-\n";

    #[test]
    fn test_scenario_a_single_stock() {
        let parsed = BrokeragePositionsParser::new().parse_text(
            "Symbol,Last,Pos Qty,%Change,Avg Price,Days\nAAPL,150.00,+100,+1.2%,140.00,-",
        );
        assert_eq!(parsed.positions.len(), 1);
        let p = &parsed.positions[0];
        assert_eq!(p.symbol, "AAPL");
        assert_eq!(p.position_type(), PositionType::Stock);
        assert_eq!(p.quantity, 100.0);
        assert_eq!(p.side, Side::Long);
    }

    #[test]
    fn test_scenario_b_short_call() {
        let parsed = BrokeragePositionsParser::new().parse_text(EXPORT);
        let option = parsed
            .positions
            .iter()
            .find(|p| p.symbol == ".AAPL250117C150")
            .unwrap();
        let contract = option.contract().unwrap();
        assert_eq!(contract.underlying, "AAPL");
        assert_eq!(contract.expiry_label, "2025-01-17");
        assert_eq!(contract.option_type, OptionType::Call);
        assert_eq!(contract.strike, 150.0);
        assert_eq!(option.side, Side::Short);
        assert_eq!(option.quantity, 2.0);
        assert_eq!(contract.strategy, OptionStrategy::CoveredCall);
        assert_eq!(contract.strategy.label(), "Covered Call / Bear Call Spread");
    }

    #[test]
    fn test_scenario_d_bond() {
        let parsed = BrokeragePositionsParser::new().parse_text(EXPORT);
        let bond = parsed.positions.iter().find(|p| p.symbol == "912828XG8").unwrap();
        assert_eq!(bond.position_type(), PositionType::Bond);
    }

    #[test]
    fn test_scenario_e_malformed_option() {
        let parsed = BrokeragePositionsParser::new().parse_text(EXPORT);
        let bad = parsed.positions.iter().find(|p| p.symbol == ".BADSYMBOL").unwrap();
        assert_eq!(bad.position_type(), PositionType::Option);
        assert!(bad.underlying().is_none());
        assert!(bad.strategy().is_none());
        assert_eq!(parsed.undecoded_options(), 1);
    }

    #[test]
    fn test_every_row_has_exactly_one_type() {
        let parsed = BrokeragePositionsParser::new().parse_text(EXPORT);
        assert!(parsed.header_found);
        assert_eq!(parsed.positions.len(), 5);
        let total = parsed.count(PositionType::Stock)
            + parsed.count(PositionType::Option)
            + parsed.count(PositionType::Bond);
        assert_eq!(total, parsed.positions.len());
        assert_eq!(parsed.count(PositionType::Option), 3);
    }

    #[test]
    fn test_digest_ignores_preamble() {
        let parser = BrokeragePositionsParser::new();
        let a = parser.parse_text(EXPORT);
        let b = parser.parse_text(&format!("Different preamble\n{}", EXPORT));
        assert_eq!(a.source_digest, b.source_digest);
        assert_eq!(a.source_digest.len(), 64);
    }

    #[test]
    fn test_parse_reader_lossy_utf8() {
        let mut bytes = b"Symbol,Last,Pos Qty,%Change,Avg Price,Days\nAAPL,1,1,+1%,1,-\n".to_vec();
        bytes.extend_from_slice(&[0xff, b'\n']);
        let parsed = BrokeragePositionsParser::new()
            .parse_reader(bytes.as_slice())
            .unwrap();
        assert_eq!(parsed.positions[0].symbol, "AAPL");
    }

    #[test]
    fn test_parse_file_missing() {
        let err = BrokeragePositionsParser::new()
            .parse_file("/definitely/not/here.csv")
            .unwrap_err();
        assert!(err.to_string().contains("Cannot open"));
    }
}
