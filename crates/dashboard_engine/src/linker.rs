//! Groups option legs under their underlying stock and finds orphans.

use models::{PortfolioSnapshot, Position, PositionType, StockGroup};
use std::collections::{BTreeMap, HashSet};

pub fn link_positions(positions: Vec<Position>, source_digest: String) -> PortfolioSnapshot {
    let mut groups: BTreeMap<String, StockGroup> = BTreeMap::new();
    let mut stock_symbols: HashSet<&str> = HashSet::new();

    // Pass 1: stocks. A repeated symbol replaces the earlier row.
    for stock in positions
        .iter()
        .filter(|p| p.position_type() == PositionType::Stock)
    {
        if !stock_symbols.insert(stock.symbol.as_str()) {
            tracing::warn!(symbol = %stock.symbol, "duplicate stock row, keeping the last one");
        }
        groups.insert(
            stock.symbol.clone(),
            StockGroup {
                stock: Some(stock.clone()),
                options: Vec::new(),
            },
        );
    }

    // Pass 2: decoded options, in input order.
    let mut orphaned_options = Vec::new();
    for option in &positions {
        let Some(underlying) = option.underlying() else {
            continue;
        };
        groups
            .entry(underlying.to_string())
            .or_default()
            .options
            .push(option.clone());

        if !stock_symbols.contains(underlying) {
            orphaned_options.push(option.clone());
        }
    }

    let bonds: Vec<Position> = positions
        .iter()
        .filter(|p| p.position_type() == PositionType::Bond)
        .cloned()
        .collect();

    let mut strategies = Vec::new();
    for strategy in positions.iter().filter_map(Position::strategy) {
        if !strategies.contains(&strategy) {
            strategies.push(strategy);
        }
    }

    tracing::debug!(
        groups = groups.len(),
        orphaned = orphaned_options.len(),
        bonds = bonds.len(),
        "positions linked"
    );

    PortfolioSnapshot {
        source_digest,
        positions,
        groups,
        orphaned_options,
        bonds,
        strategies,
    }
}
