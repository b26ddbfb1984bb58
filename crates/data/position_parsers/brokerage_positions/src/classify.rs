//! Instrument classification and option symbol decoding.
//!
//! Option symbols follow `.` + underlying + `YYMMDD` + `C|P` + strike,
//! e.g. `.AAPL250117C150` or `.SPY250321P512.5`.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use models::{OptionContract, OptionType, PositionKind, Side};
use regex::Regex;

use crate::strategy::tag_strategy;

lazy_static! {
    static ref OPTION_SYMBOL_REGEX: Regex = Regex::new(
        r"^\.(?P<underlying>[A-Z]+)(?P<date>\d{6})(?P<side>[CP])(?P<strike>\d+(?:\.\d+)?)$"
    )
    .expect("Invalid regex pattern");
}

/// Symbol fields captured by the option grammar, before any row context is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSymbol {
    pub underlying: String,
    pub expiry_label: String,
    pub expiry: Option<NaiveDate>,
    pub option_type: OptionType,
    pub strike: f64,
    pub strike_text: String,
}

pub fn parse_option_symbol(symbol: &str) -> Option<OptionSymbol> {
    let caps = OPTION_SYMBOL_REGEX.captures(symbol)?;
    let date = &caps["date"];
    let strike_text = caps["strike"].to_string();
    let strike = strike_text.parse::<f64>().ok()?;

    // Two-digit years always land in 20YY.
    let expiry_label = format!("20{}-{}-{}", &date[0..2], &date[2..4], &date[4..6]);
    let expiry = NaiveDate::parse_from_str(&expiry_label, "%Y-%m-%d").ok();

    let option_type = if &caps["side"] == "C" {
        OptionType::Call
    } else {
        OptionType::Put
    };

    Some(OptionSymbol {
        underlying: caps["underlying"].to_string(),
        expiry_label,
        expiry,
        option_type,
        strike,
        strike_text,
    })
}

pub fn looks_like_bond(symbol: &str) -> bool {
    symbol.chars().count() > 5 && symbol.chars().any(|c| c.is_ascii_digit())
}

/// First match wins: leading `.` is an option, long symbols with digits
/// are bonds/CDs, everything else is a stock or ETF.
pub fn classify(symbol: &str, side: Side, days: &str) -> PositionKind {
    if symbol.starts_with('.') {
        let contract = parse_option_symbol(symbol).map(|parsed| OptionContract {
            strategy: tag_strategy(side, parsed.option_type),
            days_to_expiry: parse_days(days),
            underlying: parsed.underlying,
            option_type: parsed.option_type,
            strike: parsed.strike,
            strike_text: parsed.strike_text,
            expiry_label: parsed.expiry_label,
            expiry: parsed.expiry,
        });
        if contract.is_none() {
            tracing::warn!(symbol, "option symbol does not match the contract grammar");
        }
        return PositionKind::Option(contract);
    }

    if looks_like_bond(symbol) {
        PositionKind::Bond
    } else {
        PositionKind::Stock
    }
}

fn parse_days(days: &str) -> Option<i64> {
    days.trim().replace(',', "").parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::OptionStrategy;

    #[test]
    fn test_parse_option_symbol_call() {
        let parsed = parse_option_symbol(".AAPL250117C150").unwrap();
        assert_eq!(parsed.underlying, "AAPL");
        assert_eq!(parsed.expiry_label, "2025-01-17");
        assert_eq!(parsed.expiry, NaiveDate::from_ymd_opt(2025, 1, 17));
        assert_eq!(parsed.option_type, OptionType::Call);
        assert_eq!(parsed.strike, 150.0);
        assert_eq!(parsed.strike_text, "150");
    }

    #[test]
    fn test_parse_option_symbol_fractional_put() {
        let parsed = parse_option_symbol(".SPY250321P512.5").unwrap();
        assert_eq!(parsed.underlying, "SPY");
        assert_eq!(parsed.option_type, OptionType::Put);
        assert_eq!(parsed.strike, 512.5);
    }

    #[test]
    fn test_impossible_date_keeps_label_only() {
        let parsed = parse_option_symbol(".TSLA251399C100").unwrap();
        assert_eq!(parsed.expiry_label, "2025-13-99");
        assert!(parsed.expiry.is_none());
    }

    #[test]
    fn test_grammar_rejections() {
        assert!(parse_option_symbol(".BADSYMBOL").is_none());
        assert!(parse_option_symbol(".aapl250117C150").is_none());
        assert!(parse_option_symbol(".AAPL25011C150").is_none());
        assert!(parse_option_symbol(".AAPL250117X150").is_none());
        assert!(parse_option_symbol(".AAPL250117C").is_none());
        assert!(parse_option_symbol("AAPL250117C150").is_none());
    }

    #[test]
    fn test_classify_option_with_contract() {
        let kind = classify(".AAPL250117C150", Side::Short, "30");
        let PositionKind::Option(Some(contract)) = kind else {
            panic!("expected decoded option");
        };
        assert_eq!(contract.days_to_expiry, Some(30));
        assert_eq!(contract.strategy, OptionStrategy::CoveredCall);
    }

    #[test]
    fn test_classify_malformed_option() {
        assert_eq!(classify(".BADSYMBOL", Side::Long, "-"), PositionKind::Option(None));
    }

    #[test]
    fn test_classify_bond_and_stock() {
        assert_eq!(classify("912828XG8", Side::Long, "-"), PositionKind::Bond);
        assert_eq!(classify("AAPL", Side::Long, "-"), PositionKind::Stock);
        // Long but no digits: still a stock.
        assert_eq!(classify("BRKB.AX", Side::Long, "-"), PositionKind::Stock);
        // Digits but short.
        assert_eq!(classify("A1", Side::Long, "-"), PositionKind::Stock);
    }

    #[test]
    fn test_days_not_numeric() {
        let PositionKind::Option(Some(contract)) = classify(".QQQ250620P400", Side::Long, "-")
        else {
            panic!("expected decoded option");
        };
        assert_eq!(contract.days_to_expiry, None);
        assert_eq!(contract.strategy, OptionStrategy::ProtectivePut);
    }
}
