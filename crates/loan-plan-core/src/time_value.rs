use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::error::LoanPlanError;
use crate::types::{Money, Rate};
use crate::LoanPlanResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const STEP_THRESHOLD: Decimal = dec!(0.0000000000000001);
const MAX_IRR_ITERATIONS: u32 = 100;
const MAX_BISECTION_ITERATIONS: u32 = 200;
const MIN_RATE: Decimal = dec!(-0.99);

/// Rates probed, in order, when looking for a sign change to bisect.
/// Past the last entry the upper bracket keeps doubling.
const BRACKET_GRID: [Decimal; 15] = [
    dec!(-0.9),
    dec!(-0.5),
    dec!(-0.25),
    dec!(-0.1),
    dec!(0),
    dec!(0.01),
    dec!(0.05),
    dec!(0.1),
    dec!(0.25),
    dec!(0.5),
    dec!(1),
    dec!(2),
    dec!(5),
    dec!(10),
    dec!(100),
];

pub(crate) fn overflow(context: &str) -> LoanPlanError {
    LoanPlanError::Overflow {
        context: context.into(),
    }
}

/// Net Present Value of a series of cash flows
pub fn npv(rate: Rate, cash_flows: &[Money]) -> LoanPlanResult<Money> {
    if rate <= dec!(-1) {
        return Err(LoanPlanError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let one_plus_r = Decimal::ONE
        .checked_add(rate)
        .ok_or_else(|| overflow("NPV discount factor"))?;
    let factor = Decimal::ONE
        .checked_div(one_plus_r)
        .ok_or_else(|| LoanPlanError::DivisionByZero {
            context: "NPV discount factor".into(),
        })?;
    let mut discount = Decimal::ONE;
    let mut result = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount
                .checked_mul(factor)
                .ok_or_else(|| overflow(&format!("NPV discount factor at period {t}")))?;
        }
        let term = cf
            .checked_mul(discount)
            .ok_or_else(|| overflow(&format!("NPV term at period {t}")))?;
        result = result
            .checked_add(term)
            .ok_or_else(|| overflow("NPV sum"))?;
    }

    Ok(result)
}

/// NPV and its first derivative with respect to the rate.
fn npv_with_derivative(rate: Rate, cash_flows: &[Money]) -> LoanPlanResult<(Money, Decimal)> {
    let one_plus_r = Decimal::ONE
        .checked_add(rate)
        .ok_or_else(|| overflow("IRR discount factor"))?;
    if one_plus_r <= Decimal::ZERO {
        return Err(LoanPlanError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }
    let factor = Decimal::ONE / one_plus_r;

    let mut discount = Decimal::ONE;
    let mut npv_val = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount
                .checked_mul(factor)
                .ok_or_else(|| overflow("IRR discount factor"))?;
        }
        let term = cf
            .checked_mul(discount)
            .ok_or_else(|| overflow("IRR present value"))?;
        npv_val = npv_val
            .checked_add(term)
            .ok_or_else(|| overflow("IRR present value"))?;

        // d/dr [cf / (1+r)^t] = -t * cf / (1+r)^(t+1)
        if t > 0 {
            let slope = term
                .checked_mul(Decimal::from(t as u64))
                .and_then(|v| v.checked_mul(factor))
                .ok_or_else(|| overflow("IRR derivative"))?;
            dnpv = dnpv
                .checked_sub(slope)
                .ok_or_else(|| overflow("IRR derivative"))?;
        }
    }

    Ok((npv_val, dnpv))
}

/// Internal Rate of Return.
///
/// Newton-Raphson from `guess`; if that fails to settle, bisects the first
/// sign change found on a fixed grid of rates, extended upwards by doubling.
/// There is no upper ceiling: any root whose NPV stays representable is found.
pub fn irr(cash_flows: &[Money], guess: Rate) -> LoanPlanResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(LoanPlanError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    match newton_irr(cash_flows, guess) {
        Ok(rate) => Ok(rate),
        Err(e) => {
            debug!(error = %e, "Newton IRR failed, falling back to bisection");
            bisection_irr(cash_flows)
        }
    }
}

fn newton_irr(cash_flows: &[Money], guess: Rate) -> LoanPlanResult<Rate> {
    let mut rate = guess.max(MIN_RATE);
    let mut last_delta = Decimal::MAX;

    for i in 0..MAX_IRR_ITERATIONS {
        let (npv_val, dnpv) = npv_with_derivative(rate, cash_flows)?;

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }

        if dnpv.is_zero() {
            return Err(LoanPlanError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: npv_val,
            });
        }

        let step = npv_val
            .checked_div(dnpv)
            .ok_or_else(|| overflow("IRR Newton step"))?;
        rate = rate
            .checked_sub(step)
            .ok_or_else(|| overflow("IRR Newton step"))?
            .max(MIN_RATE);
        last_delta = npv_val;

        if step.abs() < STEP_THRESHOLD {
            return Ok(rate);
        }
    }

    Err(LoanPlanError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta,
    })
}

fn bisection_irr(cash_flows: &[Money]) -> LoanPlanResult<Rate> {
    let mut previous: Option<(Rate, Money)> = None;
    let mut bracket: Option<(Rate, Money, Rate)> = None;

    for &rate in BRACKET_GRID.iter() {
        let Ok(value) = npv(rate, cash_flows) else {
            continue;
        };
        if value.is_zero() {
            return Ok(rate);
        }
        if let Some((prev_rate, prev_value)) = previous {
            if prev_value.is_sign_negative() != value.is_sign_negative() {
                bracket = Some((prev_rate, prev_value, rate));
                break;
            }
        }
        previous = Some((rate, value));
    }

    if bracket.is_none() {
        bracket = extend_upper_bracket(cash_flows, previous)?;
    }

    let Some((mut lo, mut lo_value, mut hi)) = bracket else {
        return Err(LoanPlanError::ConvergenceFailure {
            function: "IRR".into(),
            iterations: 0,
            last_delta: previous.map(|(_, v)| v).unwrap_or(Decimal::ZERO),
        });
    };

    for _ in 0..MAX_BISECTION_ITERATIONS {
        let mid = lo + (hi - lo) / dec!(2);
        let mid_value = npv(mid, cash_flows)?;

        if mid_value.abs() < CONVERGENCE_THRESHOLD || hi - lo < STEP_THRESHOLD {
            return Ok(mid);
        }

        if mid_value.is_sign_negative() == lo_value.is_sign_negative() {
            lo = mid;
            lo_value = mid_value;
        } else {
            hi = mid;
        }
    }

    Ok(lo + (hi - lo) / dec!(2))
}

/// Double the last positive grid rate until the NPV changes sign or the
/// arithmetic runs out of range.
fn extend_upper_bracket(
    cash_flows: &[Money],
    last: Option<(Rate, Money)>,
) -> LoanPlanResult<Option<(Rate, Money, Rate)>> {
    let Some((mut rate, mut value)) = last.filter(|(r, _)| *r > Decimal::ZERO) else {
        return Ok(None);
    };

    while let Some(next) = rate.checked_mul(dec!(2)) {
        let Ok(next_value) = npv(next, cash_flows) else {
            break;
        };
        if next_value.is_zero() {
            return Ok(Some((next, next_value, next)));
        }
        if next_value.is_sign_negative() != value.is_sign_negative() {
            return Ok(Some((rate, value, next)));
        }
        rate = next;
        value = next_value;
    }

    Ok(None)
}

/// Payment (PMT)
pub fn pmt(rate: Rate, nper: u32, present_value: Money, future_value: Money) -> LoanPlanResult<Money> {
    if nper == 0 {
        return Err(LoanPlanError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(-(present_value + future_value) / Decimal::from(nper));
    }

    let one_plus_r = Decimal::ONE + rate;
    let factor = one_plus_r
        .checked_powu(u64::from(nper))
        .ok_or_else(|| overflow("PMT compounding factor"))?;
    let annuity_factor = (factor - Decimal::ONE) / rate;

    if annuity_factor.is_zero() {
        return Err(LoanPlanError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    let numerator = present_value
        .checked_mul(factor)
        .and_then(|v| v.checked_add(future_value))
        .ok_or_else(|| overflow("PMT numerator"))?;
    Ok(-numerator / annuity_factor)
}

/// Compound a periodic rate over `periods` periods: `(1 + rate)^periods - 1`.
pub fn compound(rate: Rate, periods: u32) -> LoanPlanResult<Rate> {
    let growth = (Decimal::ONE + rate)
        .checked_powu(u64::from(periods))
        .ok_or_else(|| overflow("rate compounding"))?;
    Ok(growth - Decimal::ONE)
}
