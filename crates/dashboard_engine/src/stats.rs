//! Portfolio-level counts and histograms, recomputed per snapshot.

use chrono::{DateTime, NaiveDate, Utc};
use models::{ExpiryBuckets, PortfolioSnapshot, Position, PositionStats};
use std::collections::BTreeMap;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Decoded options attached to any group. Orphans always have a group
/// (with no stock), so they are already part of this set.
pub fn option_universe(snapshot: &PortfolioSnapshot) -> Vec<&Position> {
    snapshot
        .groups
        .values()
        .flat_map(|g| g.options.iter())
        .collect()
}

/// `as_of` pins "today" to midnight UTC; otherwise the clock is used.
pub fn reference_time(as_of: Option<NaiveDate>) -> DateTime<Utc> {
    as_of
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_else(Utc::now)
}

/// Whole days until expiry midnight (UTC), rounded up.
pub fn days_until(expiry: NaiveDate, now: DateTime<Utc>) -> Option<i64> {
    let expiry_at = expiry.and_hms_opt(0, 0, 0)?.and_utc();
    let millis = (expiry_at - now).num_milliseconds();
    Some((millis + MILLIS_PER_DAY - 1).div_euclid(MILLIS_PER_DAY))
}

pub fn bucket_expiry(buckets: &mut ExpiryBuckets, days: i64) {
    if days <= 7 {
        buckets.next_7_days += 1;
    } else if days <= 30 {
        buckets.next_8_to_30_days += 1;
    } else if days <= 90 {
        buckets.next_31_to_90_days += 1;
    } else {
        buckets.over_90_days += 1;
    }
}

pub fn calculate_stats(snapshot: &PortfolioSnapshot, now: DateTime<Utc>) -> PositionStats {
    let universe = option_universe(snapshot);

    let mut strategies: BTreeMap<String, usize> = BTreeMap::new();
    let mut expirations = ExpiryBuckets::default();

    for option in &universe {
        let Some(contract) = option.contract() else {
            continue;
        };
        *strategies
            .entry(contract.strategy.label().to_string())
            .or_insert(0) += 1;

        if let Some(days) = contract.expiry.and_then(|e| days_until(e, now)) {
            bucket_expiry(&mut expirations, days);
        }
    }

    PositionStats {
        stocks: snapshot.groups.values().filter(|g| g.stock.is_some()).count(),
        options: universe.len(),
        bonds: snapshot.bonds.len(),
        strategies,
        expirations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linker::link_positions;
    use brokerage_positions::BrokeragePositionsParser;

    fn snapshot(rows: &[&str]) -> PortfolioSnapshot {
        let text = format!(
            "Symbol,Last,Pos Qty,%Change,Avg Price,Days\n{}",
            rows.join("\n")
        );
        let parsed = BrokeragePositionsParser::new().parse_text(&text);
        link_positions(parsed.positions, parsed.source_digest)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_until_rounds_up() {
        let now = reference_time(Some(day(2025, 1, 10)));
        assert_eq!(days_until(day(2025, 1, 17), now), Some(7));
        assert_eq!(days_until(day(2025, 1, 10), now), Some(0));
        assert_eq!(days_until(day(2025, 1, 9), now), Some(-1));

        let midday = day(2025, 1, 10).and_hms_opt(12, 0, 0).unwrap().and_utc();
        assert_eq!(days_until(day(2025, 1, 11), midday), Some(1));
        assert_eq!(days_until(day(2025, 1, 10), midday), Some(0));
    }

    #[test]
    fn test_bucket_cutoffs() {
        let mut b = ExpiryBuckets::default();
        for d in [-3, 0, 7, 8, 30, 31, 90, 91, 400] {
            bucket_expiry(&mut b, d);
        }
        assert_eq!(b.next_7_days, 3);
        assert_eq!(b.next_8_to_30_days, 2);
        assert_eq!(b.next_31_to_90_days, 2);
        assert_eq!(b.over_90_days, 2);
    }

    #[test]
    fn test_calculate_stats() {
        let snap = snapshot(&[
            "AAPL,150.00,+100,+1.2%,140.00,-",
            "MSFT,400.00,10,-0.5%,390.00,-",
            ".AAPL250117C150,5.00,-2,+3.0%,4.00,7",
            ".AAPL250214C160,5.00,-1,+3.0%,4.00,35",
            ".TSLA250321P200,12.00,-1,-2.0%,10.00,70",
            ".SPY251219P500,12.00,1,-2.0%,10.00,343",
            "912828XG8,99.50,10,+0.1%,98.00,-",
            ".BADSYMBOL,1.00,1,+0%,1.00,-",
        ]);
        let stats = calculate_stats(&snap, reference_time(Some(day(2025, 1, 10))));

        assert_eq!(stats.stocks, 2);
        assert_eq!(stats.options, 4);
        assert_eq!(stats.bonds, 1);
        assert_eq!(stats.strategies["Covered Call / Bear Call Spread"], 2);
        assert_eq!(stats.strategies["Cash Secured Put / Bear Put Spread"], 1);
        assert_eq!(stats.strategies["Protective Put / Bull Put Spread"], 1);
        assert!(!stats.strategies.contains_key("Long Call / Bull Call Spread"));

        assert_eq!(stats.expirations.next_7_days, 1);
        assert_eq!(stats.expirations.next_8_to_30_days, 0);
        assert_eq!(stats.expirations.next_31_to_90_days, 2);
        assert_eq!(stats.expirations.over_90_days, 1);
        assert_eq!(stats.expirations.total(), stats.options);
    }

    #[test]
    fn test_orphans_counted_once() {
        let snap = snapshot(&[".TSLA250321P200,12.00,-1,-2.0%,10.00,70"]);
        let stats = calculate_stats(&snap, reference_time(Some(day(2025, 1, 10))));
        assert_eq!(snap.orphaned_options.len(), 1);
        assert_eq!(stats.options, 1);
        assert_eq!(stats.stocks, 0);
    }

    #[test]
    fn test_unresolvable_expiry_counted_but_not_bucketed() {
        let snap = snapshot(&[
            ".TSLA251399C100,1.00,1,+0%,1.00,-",
            ".TSLA250321P200,12.00,-1,-2.0%,10.00,70",
        ]);
        let stats = calculate_stats(&snap, reference_time(Some(day(2025, 1, 10))));
        assert_eq!(stats.options, 2);
        assert_eq!(stats.expirations.total(), 1);
        assert!(stats.expirations.total() <= stats.options);
    }

    #[test]
    fn test_empty_snapshot() {
        let stats = calculate_stats(&PortfolioSnapshot::default(), Utc::now());
        assert_eq!(stats, PositionStats::default());
    }
}
