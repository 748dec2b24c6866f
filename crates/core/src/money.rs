use rust_decimal::{Decimal, RoundingStrategy};

pub const DEFAULT_MINOR_UNITS: u32 = 2;

/// Rounds to the currency's minor unit, halves away from zero.
pub fn round_money(amount: Decimal, minor_units: u32) -> Decimal {
    amount.round_dp_with_strategy(minor_units, RoundingStrategy::MidpointAwayFromZero)
}
