//! Bond/CD valuation for the bonds tab. Prices are quoted per 10 units of face.

use brokerage_positions::parse_price;
use models::Position;
use serde::Serialize;

pub const BOND_PRICE_MULTIPLIER: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BondValuation {
    pub symbol: String,
    pub quantity: f64,
    pub avg_price: f64,
    pub last_price: f64,
    pub cost_basis: f64,
    pub market_value: f64,
    pub pnl: f64,
}

pub fn value_bond(bond: &Position) -> BondValuation {
    let quantity = bond.signed_quantity();
    let last_price = parse_price(&bond.last);
    let cost_basis = quantity * bond.avg_price * BOND_PRICE_MULTIPLIER;
    let market_value = quantity * last_price * BOND_PRICE_MULTIPLIER;

    BondValuation {
        symbol: bond.symbol.clone(),
        quantity,
        avg_price: bond.avg_price,
        last_price,
        cost_basis,
        market_value,
        pnl: market_value - cost_basis,
    }
}

pub fn value_bonds(bonds: &[&Position]) -> Vec<BondValuation> {
    bonds.iter().map(|b| value_bond(b)).collect()
}
