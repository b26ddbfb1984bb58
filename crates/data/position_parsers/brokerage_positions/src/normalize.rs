//! Row normalization: CSV records into classified [`Position`]s.

use csv::{ReaderBuilder, StringRecord};
use models::{Position, Side};
use std::collections::HashMap;

use crate::classify::classify;

/// Header name -> column index, so rows missing trailing cells still resolve.
#[derive(Debug, Clone)]
struct ColumnIndex {
    idx: HashMap<String, usize>,
}

impl ColumnIndex {
    fn new(headers: &StringRecord) -> Self {
        let mut idx = HashMap::new();
        for (i, c) in headers.iter().enumerate() {
            let k = c.trim().to_string();
            if !k.is_empty() {
                idx.entry(k).or_insert(i);
            }
        }
        Self { idx }
    }

    fn get(&self, row: &StringRecord, col: &str) -> String {
        self.idx
            .get(col)
            .and_then(|i| row.get(*i))
            .unwrap_or("")
            .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPositionRow {
    pub symbol: String,
    pub last: String,
    pub pos_qty: String,
    pub percent_change: String,
    pub avg_price: String,
    pub days: String,
}

#[derive(Debug, Default)]
pub struct NormalizedRows {
    pub positions: Vec<Position>,
    pub skipped_records: usize,
}

/// Parses cleaned export text (header + data lines). Unreadable records are
/// skipped one at a time; the rest of the batch is kept.
pub fn normalize_rows(cleaned: &str) -> NormalizedRows {
    let mut out = NormalizedRows::default();
    if cleaned.trim().is_empty() {
        return out;
    }

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(cleaned.as_bytes());

    let columns = match rdr.headers() {
        Ok(headers) => ColumnIndex::new(headers),
        Err(e) => {
            tracing::warn!(error = %e, "unreadable header row");
            return out;
        }
    };

    for (idx, record) in rdr.records().enumerate() {
        let rec = match record {
            Ok(rec) => rec,
            Err(e) => {
                tracing::warn!(row = idx, error = %e, "skipping unreadable position row");
                out.skipped_records += 1;
                continue;
            }
        };

        let row = RawPositionRow {
            symbol: columns.get(&rec, "Symbol"),
            last: columns.get(&rec, "Last"),
            pos_qty: columns.get(&rec, "Pos Qty"),
            percent_change: columns.get(&rec, "%Change"),
            avg_price: columns.get(&rec, "Avg Price"),
            days: columns.get(&rec, "Days"),
        };
        out.positions.push(normalize_row(row));
    }

    tracing::debug!(
        rows = out.positions.len(),
        skipped = out.skipped_records,
        "rows normalized"
    );
    out
}

pub fn normalize_row(row: RawPositionRow) -> Position {
    let (side, quantity) = parse_quantity(&row.pos_qty);
    let avg_price = parse_price(&row.avg_price);
    let kind = classify(&row.symbol, side, &row.days);

    Position {
        position_value: quantity * avg_price,
        symbol: row.symbol,
        side,
        quantity,
        avg_price,
        avg_price_text: row.avg_price,
        last: row.last,
        percent_change: row.percent_change,
        days: row.days,
        kind,
    }
}

/// Splits `Pos Qty` into side and magnitude. The sign is read before the
/// `+`/`-` and thousands separators are stripped; unparseable magnitudes are 0.
pub fn parse_quantity(raw: &str) -> (Side, f64) {
    let t = raw.trim().replace(',', "");
    let (side, digits) = match t.strip_prefix('-') {
        Some(rest) => (Side::Short, rest),
        None => (Side::Long, t.strip_prefix('+').unwrap_or(t.as_str())),
    };
    let magnitude = digits
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(f64::abs)
        .unwrap_or(0.0);
    (side, magnitude)
}

/// Parses `$1,234.50`-style prices, 0 when missing or unparseable.
pub fn parse_price(raw: &str) -> f64 {
    parse_amount(raw).unwrap_or(0.0)
}

pub fn parse_amount(raw: &str) -> Option<f64> {
    let t = raw.trim().replace(['$', ','], "");
    if t.is_empty() || t == "-" || t == "--" {
        return None;
    }
    t.parse::<f64>().ok().filter(|v| v.is_finite())
}
