//! Read-only views over a snapshot: text filter, stable sorting and
//! regrouping by strategy. Nothing here mutates snapshot data.

use models::{OptionStrategy, PortfolioSnapshot, Position, SortDirection, SortKey, StockGroup};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

// ------------------------
// Filtering
// ------------------------

/// Case-insensitive substring match on the symbol, and on the underlying for options.
pub fn matches_query(position: &Position, query: &str) -> bool {
    let needle = query.to_lowercase();
    position.symbol.to_lowercase().contains(&needle)
        || position
            .underlying()
            .map(|u| u.to_lowercase().contains(&needle))
            .unwrap_or(false)
}

pub fn filter_groups<'a>(
    groups: &'a BTreeMap<String, StockGroup>,
    query: &str,
) -> Vec<(&'a str, &'a StockGroup)> {
    let needle = query.to_lowercase();
    groups
        .iter()
        .filter(|(symbol, _)| symbol.to_lowercase().contains(&needle))
        .map(|(symbol, group)| (symbol.as_str(), group))
        .collect()
}

pub fn filter_positions<'a>(positions: &'a [Position], query: &str) -> Vec<&'a Position> {
    positions.iter().filter(|p| matches_query(p, query)).collect()
}

// ------------------------
// Sorting
// ------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortConfig {
    pub fn new(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Ascending,
        }
    }

    /// Selecting the active key flips the direction; a new key starts ascending.
    pub fn request_sort(&mut self, key: SortKey) {
        self.direction = if self.key == key && self.direction == SortDirection::Ascending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        self.key = key;
    }

    fn apply(&self, ordering: Ordering) -> Ordering {
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Comparable cell value. Missing sorts before numbers, numbers before text.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Missing,
    Number(f64),
    Text(String),
}

impl SortValue {
    fn from_display(raw: &str) -> Self {
        let t = raw.trim();
        if t.is_empty() {
            return SortValue::Missing;
        }
        let numeric = t.replace(['$', ',', '%', '+'], "");
        match numeric.parse::<f64>() {
            Ok(v) if v.is_finite() => SortValue::Number(v),
            _ => SortValue::Text(t.to_string()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortValue::Missing => 0,
            SortValue::Number(_) => 1,
            SortValue::Text(_) => 2,
        }
    }

    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

pub fn sort_value(position: &Position, key: SortKey) -> SortValue {
    match key {
        SortKey::Symbol => SortValue::Text(position.symbol.clone()),
        SortKey::Last => SortValue::from_display(&position.last),
        SortKey::PosQty => SortValue::Number(position.signed_quantity()),
        SortKey::PercentChange => SortValue::from_display(&position.percent_change),
        SortKey::AvgPrice => SortValue::Number(position.avg_price),
        SortKey::Days => SortValue::from_display(&position.days),
        SortKey::Value => SortValue::Number(position.position_value),
    }
}

/// Group rows sort by their key for `Symbol`, otherwise by the stock's own
/// field; groups without a stock row count as missing.
pub fn group_sort_value(symbol: &str, group: &StockGroup, key: SortKey) -> SortValue {
    match (key, &group.stock) {
        (SortKey::Symbol, _) => SortValue::Text(symbol.to_string()),
        (_, Some(stock)) => sort_value(stock, key),
        (_, None) => SortValue::Missing,
    }
}

pub fn sort_groups(rows: &mut [(&str, &StockGroup)], config: &SortConfig) {
    rows.sort_by(|(sa, ga), (sb, gb)| {
        let a = group_sort_value(sa, ga, config.key);
        let b = group_sort_value(sb, gb, config.key);
        config.apply(a.compare(&b))
    });
}

pub fn sort_positions(rows: &mut [&Position], config: &SortConfig) {
    rows.sort_by(|a, b| {
        config.apply(sort_value(a, config.key).compare(&sort_value(b, config.key)))
    });
}

// ------------------------
// Tabs
// ------------------------

#[derive(Debug, Clone, Serialize)]
pub struct GroupRow<'a> {
    pub symbol: &'a str,
    pub stock: Option<&'a Position>,
    pub options: &'a [Position],
    pub option_count: usize,
}

/// Stocks & options tab: filtered by group symbol, then sorted.
pub fn stock_rows<'a>(
    snapshot: &'a PortfolioSnapshot,
    query: &str,
    config: &SortConfig,
) -> Vec<GroupRow<'a>> {
    let mut rows = filter_groups(&snapshot.groups, query);
    sort_groups(&mut rows, config);
    rows.into_iter()
        .map(|(symbol, group)| GroupRow {
            symbol,
            stock: group.stock.as_ref(),
            options: &group.options,
            option_count: group.options.len(),
        })
        .collect()
}

pub fn orphan_rows<'a>(
    snapshot: &'a PortfolioSnapshot,
    query: &str,
    config: &SortConfig,
) -> Vec<&'a Position> {
    let mut rows = filter_positions(&snapshot.orphaned_options, query);
    sort_positions(&mut rows, config);
    rows
}

pub fn bond_rows<'a>(
    snapshot: &'a PortfolioSnapshot,
    query: &str,
    config: &SortConfig,
) -> Vec<&'a Position> {
    let mut rows = filter_positions(&snapshot.bonds, query);
    sort_positions(&mut rows, config);
    rows
}

// ------------------------
// Strategy grouping
// ------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StrategyEntry<'a> {
    /// The group's stock symbol, or the underlying when no stock row exists.
    pub stock_symbol: &'a str,
    pub option: &'a Position,
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategyBucket<'a> {
    pub strategy: OptionStrategy,
    pub entries: Vec<StrategyEntry<'a>>,
}

/// Buckets the option universe by strategy, in the snapshot's first-seen
/// strategy order.
pub fn group_by_strategy(snapshot: &PortfolioSnapshot) -> Vec<StrategyBucket<'_>> {
    let mut buckets: Vec<StrategyBucket<'_>> = snapshot
        .strategies
        .iter()
        .map(|s| StrategyBucket {
            strategy: *s,
            entries: Vec::new(),
        })
        .collect();

    for (symbol, group) in &snapshot.groups {
        let stock_symbol = group
            .stock
            .as_ref()
            .map(|s| s.symbol.as_str())
            .unwrap_or(symbol.as_str());

        for option in &group.options {
            let Some(strategy) = option.strategy() else {
                continue;
            };
            let entry = StrategyEntry {
                stock_symbol,
                option,
            };
            match buckets.iter_mut().find(|b| b.strategy == strategy) {
                Some(bucket) => bucket.entries.push(entry),
                None => buckets.push(StrategyBucket {
                    strategy,
                    entries: vec![entry],
                }),
            }
        }
    }

    buckets
}
