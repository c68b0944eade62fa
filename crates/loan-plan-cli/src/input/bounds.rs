//! Limits applied to flag-supplied inputs before they reach the core.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const PRINCIPAL_MIN: Decimal = dec!(1000);
pub const PRINCIPAL_MAX: Decimal = dec!(500000000);
pub const ANNUAL_RATE_PCT_MAX: Decimal = dec!(200);
pub const TAX_PCT_MAX: Decimal = dec!(50);
pub const MAX_PAYMENT_MIN: Decimal = dec!(1000);
pub const PERIODS_MIN: i64 = 1;
pub const PERIODS_MAX: i64 = loan_plan_core::MAX_PERIODS as i64;

/// Check `value` against an inclusive range; `max = None` leaves it open.
pub fn within(
    flag: &str,
    value: Decimal,
    min: Decimal,
    max: Option<Decimal>,
) -> Result<Decimal, String> {
    if value < min {
        return Err(format!("--{flag} must be at least {min} (got {value})"));
    }
    if let Some(max) = max {
        if value > max {
            return Err(format!("--{flag} must be at most {max} (got {value})"));
        }
    }
    Ok(value)
}

/// 85 -> 0.85
pub fn pct_to_rate(pct: Decimal) -> Decimal {
    pct / dec!(100)
}
