use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use crate::error::LoanPlanError;
use crate::schedule::french::build_schedule;
use crate::types::*;
use crate::LoanPlanResult;

/// Inclusive range of installment counts to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRange {
    pub min_periods: u32,
    pub max_periods: u32,
}

impl PeriodRange {
    pub fn new(min_periods: u32, max_periods: u32) -> Self {
        Self {
            min_periods,
            max_periods,
        }
    }

    fn validate(&self) -> LoanPlanResult<()> {
        if self.min_periods == 0 {
            return Err(LoanPlanError::InvalidInput {
                field: "period_range.min_periods".into(),
                reason: "Range must start at one installment or more".into(),
            });
        }
        if self.max_periods > MAX_PERIODS {
            return Err(LoanPlanError::InvalidInput {
                field: "period_range.max_periods".into(),
                reason: format!(
                    "At most {MAX_PERIODS} installments are supported (got {})",
                    self.max_periods
                ),
            });
        }
        if self.min_periods > self.max_periods {
            return Err(LoanPlanError::InvalidInput {
                field: "period_range".into(),
                reason: format!(
                    "min_periods ({}) must be <= max_periods ({})",
                    self.min_periods, self.max_periods
                ),
            });
        }
        Ok(())
    }
}

/// Input for the installment-count search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationInput {
    #[serde(flatten)]
    pub terms: LoanTerms,
    /// Highest mean all-in installment the borrower can pay.
    pub max_affordable_payment: Money,
    pub period_range: PeriodRange,
}

/// A period count whose mean installment fits the cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePlan {
    pub period_count: u32,
    pub annual_cost_rate_pct: Percentage,
    pub mean_total_payment: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Lowest cost rate; ties go to the fewest installments.
    pub best: CandidatePlan,
    /// Every affordable plan, by increasing period count.
    pub candidates: Vec<CandidatePlan>,
}

/// Returned when no period count in range is affordable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoSolution {
    pub principal: Money,
    pub max_affordable_payment: Money,
    pub period_range: PeriodRange,
    /// Smallest mean installment seen anywhere in the range.
    pub lowest_mean_payment: Money,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OptimizationOutcome {
    Optimal(OptimizationResult),
    NotFound(NoSolution),
}

impl OptimizationOutcome {
    pub fn best(&self) -> Option<&CandidatePlan> {
        match self {
            OptimizationOutcome::Optimal(result) => Some(&result.best),
            OptimizationOutcome::NotFound(_) => None,
        }
    }
}

/// Search the period range for the affordable plan with the lowest CFT.
pub fn optimize_plan(
    input: &OptimizationInput,
) -> LoanPlanResult<ComputationOutput<OptimizationOutcome>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.terms.validate()?;
    input.period_range.validate()?;
    if input.max_affordable_payment <= Decimal::ZERO {
        return Err(LoanPlanError::InvalidInput {
            field: "max_affordable_payment".into(),
            reason: "Maximum affordable payment must be positive".into(),
        });
    }

    let range = input.period_range;
    let mut candidates: Vec<CandidatePlan> = Vec::new();
    let mut best: Option<CandidatePlan> = None;
    let mut lowest_mean_payment = Decimal::MAX;

    for n in range.min_periods..=range.max_periods {
        let summary = build_schedule(&input.terms, n)?.summary;
        lowest_mean_payment = lowest_mean_payment.min(summary.mean_total_payment);

        let affordable = summary.mean_total_payment <= input.max_affordable_payment;
        debug!(
            period_count = n,
            mean_total_payment = %summary.mean_total_payment,
            annual_cost_rate_pct = %summary.annual_cost_rate_pct,
            affordable,
            "evaluated plan"
        );
        if !affordable {
            continue;
        }

        if !summary.cost_rate_converged {
            warnings.push(format!(
                "{n} installments: financial cost rate did not converge and is reported as 0%"
            ));
        }

        let plan = CandidatePlan {
            period_count: n,
            annual_cost_rate_pct: summary.annual_cost_rate_pct,
            mean_total_payment: summary.mean_total_payment,
        };
        let improves = best
            .as_ref()
            .map_or(true, |b| plan.annual_cost_rate_pct < b.annual_cost_rate_pct);
        if improves {
            best = Some(plan.clone());
        }
        candidates.push(plan);
    }

    let outcome = match best {
        Some(best) => {
            info!(
                period_count = best.period_count,
                annual_cost_rate_pct = %best.annual_cost_rate_pct,
                candidates = candidates.len(),
                "optimal plan selected"
            );
            OptimizationOutcome::Optimal(OptimizationResult { best, candidates })
        }
        None => {
            info!(
                min_periods = range.min_periods,
                max_periods = range.max_periods,
                "no affordable plan in range"
            );
            OptimizationOutcome::NotFound(NoSolution {
                principal: input.terms.principal,
                max_affordable_payment: input.max_affordable_payment,
                period_range: range,
                lowest_mean_payment,
                message: no_solution_message(input),
            })
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Installment-count search minimising CFT under a payment cap",
        &serde_json::json!({
            "principal": input.terms.principal.to_string(),
            "annual_rate": input.terms.annual_rate.to_string(),
            "fixed_fee": input.terms.fixed_fee.to_string(),
            "tax_rate": input.terms.tax_rate.to_string(),
            "max_affordable_payment": input.max_affordable_payment.to_string(),
            "min_periods": range.min_periods,
            "max_periods": range.max_periods,
        }),
        warnings,
        elapsed,
        outcome,
    ))
}

fn no_solution_message(input: &OptimizationInput) -> String {
    format!(
        "No plan found: a loan of {} cannot be repaid with a mean installment of at most {} \
         using between {} and {} installments. Try raising the maximum installment or \
         borrowing less.",
        input.terms.principal.round_dp(2),
        input.max_affordable_payment.round_dp(2),
        input.period_range.min_periods,
        input.period_range.max_periods,
    )
}
