use models::{OptionStrategy, OptionType, Side};

/// Per-leg heuristic: never looks at other positions, so a spread shows up
/// as two independently tagged legs.
pub fn tag_strategy(side: Side, option_type: OptionType) -> OptionStrategy {
    match (side, option_type) {
        (Side::Short, OptionType::Call) => OptionStrategy::CoveredCall,
        (Side::Long, OptionType::Put) => OptionStrategy::ProtectivePut,
        (Side::Short, OptionType::Put) => OptionStrategy::CashSecuredPut,
        (Side::Long, OptionType::Call) => OptionStrategy::LongCall,
    }
}
