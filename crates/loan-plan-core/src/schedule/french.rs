//! Period-by-period schedule for a fixed-installment loan.
//!
//! Each installment carries the level pure installment plus the fixed
//! administrative fee and the tax levied on interest and on that fee. The
//! financial cost rate (CFT) is the annualised IRR of the borrower's cash
//! flows: the disbursement followed by every all-in payment.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::LoanPlanError;
use crate::time_value::{self, overflow};
use crate::types::*;
use crate::LoanPlanResult;

const MONTHS_PER_YEAR: u32 = 12;

/// Input for a single schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    #[serde(flatten)]
    pub terms: LoanTerms,
    /// Number of monthly installments.
    pub period_count: u32,
}

/// A single installment of the schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub period: u32,
    pub opening_balance: Money,
    pub pure_installment: Money,
    pub interest: Money,
    pub amortization: Money,
    pub fixed_fee: Money,
    pub tax: Money,
    pub total_payment: Money,
    pub closing_balance: Money,
}

/// Summary metrics derived from the rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub period_count: u32,
    pub monthly_rate: Rate,
    pub pure_installment: Money,
    pub mean_total_payment: Money,
    /// Annualised financial cost (CFT) as a percentage.
    pub annual_cost_rate_pct: Percentage,
    /// False when the IRR solve failed and the cost rate was reported as 0.
    pub cost_rate_converged: bool,
    pub total_interest: Money,
    pub total_fees: Money,
    pub total_tax: Money,
    pub total_paid: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleOutput {
    pub rows: Vec<ScheduleRow>,
    pub summary: ScheduleSummary,
}

/// Build the schedule without the metadata envelope.
///
/// Used directly by the optimiser, which evaluates many period counts
/// against the same terms.
pub fn build_schedule(terms: &LoanTerms, period_count: u32) -> LoanPlanResult<ScheduleOutput> {
    terms.validate()?;
    if period_count == 0 {
        return Err(LoanPlanError::InvalidInput {
            field: "period_count".into(),
            reason: "At least one installment is required".into(),
        });
    }
    if period_count > MAX_PERIODS {
        return Err(LoanPlanError::InvalidInput {
            field: "period_count".into(),
            reason: format!("At most {MAX_PERIODS} installments are supported (got {period_count})"),
        });
    }

    let monthly_rate = terms.annual_rate / Decimal::from(MONTHS_PER_YEAR);
    let pure_installment = if monthly_rate > Decimal::ZERO {
        time_value::pmt(monthly_rate, period_count, -terms.principal, Decimal::ZERO)?
    } else {
        terms.principal / Decimal::from(period_count)
    };

    let mut rows = Vec::with_capacity(period_count as usize);
    let mut cash_flows = Vec::with_capacity(period_count as usize + 1);
    cash_flows.push(-terms.principal);

    let fee_tax = terms
        .fixed_fee
        .checked_mul(terms.tax_rate)
        .ok_or_else(|| overflow("tax on fixed fee"))?;
    let mut balance = terms.principal;
    let mut total_interest = Decimal::ZERO;
    let mut total_tax = Decimal::ZERO;
    let mut total_paid = Decimal::ZERO;

    for period in 1..=period_count {
        let opening = balance;
        let interest = opening
            .checked_mul(monthly_rate)
            .ok_or_else(|| overflow(&format!("interest at period {period}")))?;

        // The last installment retires whatever balance is left, so drift
        // in the level installment never leaves a residual.
        let amortization = if period == period_count {
            opening
        } else {
            pure_installment
                .checked_sub(interest)
                .ok_or_else(|| overflow(&format!("amortization at period {period}")))?
        };
        balance = opening
            .checked_sub(amortization)
            .ok_or_else(|| overflow(&format!("closing balance at period {period}")))?;

        let tax = interest
            .checked_mul(terms.tax_rate)
            .and_then(|t| t.checked_add(fee_tax))
            .ok_or_else(|| overflow(&format!("tax at period {period}")))?;
        let total_payment = pure_installment
            .checked_add(terms.fixed_fee)
            .and_then(|t| t.checked_add(tax))
            .ok_or_else(|| overflow(&format!("total payment at period {period}")))?;

        total_interest = total_interest
            .checked_add(interest)
            .ok_or_else(|| overflow("total interest"))?;
        total_tax = total_tax
            .checked_add(tax)
            .ok_or_else(|| overflow("total tax"))?;
        total_paid = total_paid
            .checked_add(total_payment)
            .ok_or_else(|| overflow("total paid"))?;
        cash_flows.push(total_payment);

        rows.push(ScheduleRow {
            period,
            opening_balance: opening,
            pure_installment,
            interest,
            amortization,
            fixed_fee: terms.fixed_fee,
            tax,
            total_payment,
            closing_balance: balance,
        });
    }

    let (annual_cost_rate_pct, cost_rate_converged) =
        match annual_cost_rate(&cash_flows, monthly_rate) {
            Ok(rate) => (rate, true),
            Err(e) => {
                warn!(period_count, error = %e, "financial cost rate did not converge; reporting 0");
                (Decimal::ZERO, false)
            }
        };

    let total_fees = terms
        .fixed_fee
        .checked_mul(Decimal::from(period_count))
        .ok_or_else(|| overflow("total fees"))?;

    debug!(
        period_count,
        %pure_installment,
        %annual_cost_rate_pct,
        "schedule built"
    );

    Ok(ScheduleOutput {
        rows,
        summary: ScheduleSummary {
            period_count,
            monthly_rate,
            pure_installment,
            mean_total_payment: total_paid / Decimal::from(period_count),
            annual_cost_rate_pct,
            cost_rate_converged,
            total_interest,
            total_fees,
            total_tax,
            total_paid,
        },
    })
}

/// Monthly IRR of the borrower's flows, compounded to a yearly percentage.
fn annual_cost_rate(cash_flows: &[Money], monthly_rate: Rate) -> LoanPlanResult<Percentage> {
    let monthly_irr = time_value::irr(cash_flows, monthly_rate)?;
    if monthly_irr <= dec!(-1) {
        return Err(LoanPlanError::InvalidInput {
            field: "irr".into(),
            reason: "Monthly IRR at or below -100%".into(),
        });
    }
    time_value::compound(monthly_irr, MONTHS_PER_YEAR)?
        .checked_mul(dec!(100))
        .ok_or_else(|| overflow("annual cost rate"))
}

/// Generate a French-system amortisation schedule with summary metrics.
pub fn generate_schedule(
    input: &ScheduleInput,
) -> LoanPlanResult<ComputationOutput<ScheduleOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let output = build_schedule(&input.terms, input.period_count)?;

    if !output.summary.cost_rate_converged {
        warnings.push(
            "Financial cost rate could not be solved from the cash flows; reported as 0%".into(),
        );
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "French System Amortisation (level installment, CFT via IRR)",
        &serde_json::json!({
            "principal": input.terms.principal.to_string(),
            "annual_rate": input.terms.annual_rate.to_string(),
            "fixed_fee": input.terms.fixed_fee.to_string(),
            "tax_rate": input.terms.tax_rate.to_string(),
            "period_count": input.period_count,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_input() -> ScheduleInput {
        ScheduleInput {
            terms: LoanTerms {
                principal: dec!(1200),
                annual_rate: dec!(0.12),
                fixed_fee: Decimal::ZERO,
                tax_rate: Decimal::ZERO,
            },
            period_count: 12,
        }
    }

    #[test]
    fn test_plain_annuity() {
        let result = generate_schedule(&sample_input()).unwrap();
        let sched = &result.result;
        assert_eq!(sched.rows.len(), 12);

        // 1% monthly on 1200 => installment ≈ 106.6185
        let first = &sched.rows[0];
        assert_eq!(first.interest, dec!(12));
        assert!((first.pure_installment - dec!(106.6185)).abs() < dec!(0.0001));
        assert_eq!(first.tax, Decimal::ZERO);
        assert_eq!(first.total_payment, first.pure_installment);

        // No charges => CFT equals the effective annual rate of 1%/month
        assert!(sched.summary.cost_rate_converged);
        assert!((sched.summary.annual_cost_rate_pct - dec!(12.6825)).abs() < dec!(0.0001));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_balances_chain_and_close() {
        let sched = build_schedule(&sample_input().terms, 12).unwrap();
        for pair in sched.rows.windows(2) {
            assert_eq!(pair[0].closing_balance, pair[1].opening_balance);
        }
        assert_eq!(sched.rows.last().unwrap().closing_balance, Decimal::ZERO);
        assert_eq!(sched.rows[0].opening_balance, dec!(1200));
    }

    #[test]
    fn test_fee_and_tax_charges() {
        let mut input = sample_input();
        input.terms.fixed_fee = dec!(10);
        input.terms.tax_rate = dec!(0.21);
        let sched = build_schedule(&input.terms, input.period_count).unwrap();

        // Period 1: interest 12 => tax = 12*0.21 + 10*0.21 = 4.62
        let first = &sched.rows[0];
        assert_eq!(first.fixed_fee, dec!(10));
        assert_eq!(first.tax, dec!(4.62));
        assert!((first.total_payment - first.pure_installment - dec!(14.62)).abs() < dec!(0.0000001));

        assert_eq!(sched.summary.total_fees, dec!(120));
        // CFT ≈ 41.71% once fees and tax are included
        assert!((sched.summary.annual_cost_rate_pct - dec!(41.7147)).abs() < dec!(0.001));
    }

    #[test]
    fn test_totals_are_consistent() {
        let mut input = sample_input();
        input.terms.fixed_fee = dec!(10);
        input.terms.tax_rate = dec!(0.21);
        let sched = build_schedule(&input.terms, input.period_count).unwrap();
        let s = &sched.summary;

        let paid: Decimal = sched.rows.iter().map(|r| r.total_payment).sum();
        let tax: Decimal = sched.rows.iter().map(|r| r.tax).sum();
        assert_eq!(s.total_paid, paid);
        assert_eq!(s.total_tax, tax);
        assert_eq!(s.mean_total_payment, paid / dec!(12));
    }

    #[test]
    fn test_zero_periods_rejected() {
        let mut input = sample_input();
        input.period_count = 0;
        let err = generate_schedule(&input).unwrap_err();
        assert!(matches!(err, LoanPlanError::InvalidInput { ref field, .. } if field == "period_count"));
    }

    #[test]
    fn test_period_count_capped() {
        let mut input = sample_input();
        input.period_count = MAX_PERIODS + 1;
        let err = generate_schedule(&input).unwrap_err();
        assert!(matches!(err, LoanPlanError::InvalidInput { ref field, .. } if field == "period_count"));

        input.period_count = u32::MAX;
        assert!(generate_schedule(&input).is_err());

        input.period_count = MAX_PERIODS;
        assert!(generate_schedule(&input).is_ok());
    }

    #[test]
    fn test_oversized_fee_is_an_error() {
        let mut input = sample_input();
        input.terms.fixed_fee = dec!(1000000000000000000000000000);
        input.period_count = 120;
        let err = generate_schedule(&input).unwrap_err();
        assert!(matches!(err, LoanPlanError::Overflow { .. }));
    }

    #[test]
    fn test_unrepresentable_cost_rate_degrades_to_zero() {
        // -1000 then 201000: monthly IRR 200, and 201^12 * 100 exceeds Decimal
        let input = ScheduleInput {
            terms: LoanTerms {
                principal: dec!(1000),
                annual_rate: Decimal::ZERO,
                fixed_fee: dec!(200000),
                tax_rate: Decimal::ZERO,
            },
            period_count: 1,
        };
        let result = generate_schedule(&input).unwrap();
        let summary = &result.result.summary;
        assert_eq!(summary.annual_cost_rate_pct, Decimal::ZERO);
        assert!(!summary.cost_rate_converged);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("reported as 0%"));
        // The schedule itself is still complete
        assert_eq!(result.result.rows[0].closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_negative_principal_rejected() {
        let mut input = sample_input();
        input.terms.principal = dec!(-1200);
        assert!(generate_schedule(&input).is_err());
    }
}
