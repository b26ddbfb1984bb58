use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// Settings models
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub dashboard_path: PathBuf,
	pub pretty: bool,
	pub log_filter: String,
	/// Fixed reference day for expiry bucketing; the clock is used when absent.
	pub as_of: Option<NaiveDate>,
	pub default_sort: SortKey,
	pub group_by_strategy: bool,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			dashboard_path: PathBuf::from("dashboard/positions.json"),
			pretty: true,
			log_filter: "info".to_string(),
			as_of: None,
			default_sort: SortKey::Symbol,
			group_by_strategy: false,
		}
	}
}

// Position models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
	Long,
	Short,
}

impl Side {
	pub fn label(self) -> &'static str {
		match self {
			Side::Long => "Long",
			Side::Short => "Short",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
	Call,
	Put,
}

impl OptionType {
	pub fn label(self) -> &'static str {
		match self {
			OptionType::Call => "Call",
			OptionType::Put => "Put",
		}
	}
}

/// Single-leg heuristic label derived from side and call/put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionStrategy {
	#[serde(rename = "Covered Call / Bear Call Spread")]
	CoveredCall,
	#[serde(rename = "Protective Put / Bull Put Spread")]
	ProtectivePut,
	#[serde(rename = "Cash Secured Put / Bear Put Spread")]
	CashSecuredPut,
	#[serde(rename = "Long Call / Bull Call Spread")]
	LongCall,
}

impl OptionStrategy {
	pub fn label(self) -> &'static str {
		match self {
			OptionStrategy::CoveredCall => "Covered Call / Bear Call Spread",
			OptionStrategy::ProtectivePut => "Protective Put / Bull Put Spread",
			OptionStrategy::CashSecuredPut => "Cash Secured Put / Bear Put Spread",
			OptionStrategy::LongCall => "Long Call / Bull Call Spread",
		}
	}
}

impl fmt::Display for OptionStrategy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

/// Contract fields decoded from an option symbol such as `.AAPL250117C150`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
	pub underlying: String,
	pub option_type: OptionType,
	pub strike: f64,
	/// Strike exactly as written in the symbol.
	pub strike_text: String,
	/// `20YY-MM-DD`, kept even when it is not a real calendar date.
	pub expiry_label: String,
	pub expiry: Option<NaiveDate>,
	/// Taken from the row's own `Days` column.
	pub days_to_expiry: Option<i64>,
	pub strategy: OptionStrategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionType {
	Stock,
	Option,
	Bond,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "position_type", content = "contract")]
pub enum PositionKind {
	Stock,
	/// `None` when the symbol starts with `.` but does not follow the option grammar.
	Option(Option<OptionContract>),
	Bond,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
	pub symbol: String,
	pub side: Side,
	/// Magnitude of `Pos Qty`, never negative.
	pub quantity: f64,
	pub avg_price: f64,
	pub avg_price_text: String,
	pub last: String,
	pub percent_change: String,
	pub days: String,
	pub position_value: f64,
	pub kind: PositionKind,
}

impl Position {
	pub fn position_type(&self) -> PositionType {
		match self.kind {
			PositionKind::Stock => PositionType::Stock,
			PositionKind::Option(_) => PositionType::Option,
			PositionKind::Bond => PositionType::Bond,
		}
	}

	pub fn is_short(&self) -> bool {
		self.side == Side::Short
	}

	/// Quantity with the short side negative.
	pub fn signed_quantity(&self) -> f64 {
		match self.side {
			Side::Long => self.quantity,
			Side::Short => -self.quantity,
		}
	}

	pub fn contract(&self) -> Option<&OptionContract> {
		match &self.kind {
			PositionKind::Option(contract) => contract.as_ref(),
			_ => None,
		}
	}

	pub fn underlying(&self) -> Option<&str> {
		self.contract().map(|c| c.underlying.as_str())
	}

	pub fn strategy(&self) -> Option<OptionStrategy> {
		self.contract().map(|c| c.strategy)
	}

	/// e.g. "Short Call"
	pub fn leg_label(&self) -> Option<String> {
		self.contract()
			.map(|c| format!("{} {}", self.side.label(), c.option_type.label()))
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockGroup {
	pub stock: Option<Position>,
	pub options: Vec<Position>,
}

/// Complete derived state of one uploaded export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
	pub source_digest: String,
	pub positions: Vec<Position>,
	pub groups: BTreeMap<String, StockGroup>,
	pub orphaned_options: Vec<Position>,
	pub bonds: Vec<Position>,
	/// Distinct strategies in first-seen order.
	pub strategies: Vec<OptionStrategy>,
}

// Stats models
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryBuckets {
	#[serde(rename = "next7Days")]
	pub next_7_days: usize,
	#[serde(rename = "next8to30Days")]
	pub next_8_to_30_days: usize,
	#[serde(rename = "next31to90Days")]
	pub next_31_to_90_days: usize,
	#[serde(rename = "over90Days")]
	pub over_90_days: usize,
}

impl ExpiryBuckets {
	pub fn total(&self) -> usize {
		self.next_7_days + self.next_8_to_30_days + self.next_31_to_90_days + self.over_90_days
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionStats {
	pub stocks: usize,
	pub options: usize,
	pub bonds: usize,
	pub strategies: BTreeMap<String, usize>,
	pub expirations: ExpiryBuckets,
}

// View models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortKey {
	#[default]
	Symbol,
	Last,
	#[serde(rename = "Pos Qty")]
	PosQty,
	#[serde(rename = "%Change")]
	PercentChange,
	#[serde(rename = "Avg Price")]
	AvgPrice,
	Days,
	Value,
}

impl SortKey {
	pub const ALL: [SortKey; 7] = [
		SortKey::Symbol,
		SortKey::Last,
		SortKey::PosQty,
		SortKey::PercentChange,
		SortKey::AvgPrice,
		SortKey::Days,
		SortKey::Value,
	];

	/// Column header as it appears in the export.
	pub fn column(self) -> &'static str {
		match self {
			SortKey::Symbol => "Symbol",
			SortKey::Last => "Last",
			SortKey::PosQty => "Pos Qty",
			SortKey::PercentChange => "%Change",
			SortKey::AvgPrice => "Avg Price",
			SortKey::Days => "Days",
			SortKey::Value => "Value",
		}
	}
}

impl FromStr for SortKey {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let wanted = s.trim().to_lowercase().replace(['_', '-', ' '], "");
		SortKey::ALL
			.into_iter()
			.find(|k| {
				let column = k.column().to_lowercase().replace(' ', "");
				column == wanted || column.trim_start_matches('%') == wanted
			})
			.ok_or_else(|| format!("unknown sort key '{}'", s))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
	#[default]
	Ascending,
	Descending,
}
