use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_plan_core::optimizer::plan_search::{self, OptimizationInput, PeriodRange};
use loan_plan_core::schedule::french;

use crate::commands::schedule::terms_from_flags;
use crate::input;
use crate::input::bounds;

/// Arguments for the installment-count search
#[derive(Args)]
pub struct OptimizeArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Nominal annual rate in percent (e.g. 85 for 85%)
    #[arg(long)]
    pub annual_rate_pct: Option<Decimal>,

    /// Administrative fee charged on every installment
    #[arg(long, default_value = "0")]
    pub fixed_fee: Decimal,

    /// Tax on interest and fees in percent (e.g. 21 for 21%)
    #[arg(long, default_value = "0")]
    pub tax_pct: Decimal,

    /// Highest mean monthly installment the borrower can pay
    #[arg(long)]
    pub max_payment: Option<Decimal>,

    /// Fewest installments to consider
    #[arg(long, default_value_t = 12, value_parser = clap::value_parser!(u32).range(bounds::PERIODS_MIN..=bounds::PERIODS_MAX))]
    pub min_periods: u32,

    /// Most installments to consider
    #[arg(long, default_value_t = 48, value_parser = clap::value_parser!(u32).range(bounds::PERIODS_MIN..=bounds::PERIODS_MAX))]
    pub max_periods: u32,
}

pub fn run_optimize(args: OptimizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let opt_input: OptimizationInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(piped) = input::stdin::read_stdin()? {
        piped
    } else {
        let max_payment = args
            .max_payment
            .ok_or("--max-payment is required (or provide --input)")?;
        let max_payment =
            bounds::within("max-payment", max_payment, bounds::MAX_PAYMENT_MIN, None)?;
        if args.min_periods > args.max_periods {
            return Err(format!(
                "--min-periods ({}) must not exceed --max-periods ({})",
                args.min_periods, args.max_periods
            )
            .into());
        }

        OptimizationInput {
            terms: terms_from_flags(
                args.principal,
                args.annual_rate_pct,
                args.fixed_fee,
                args.tax_pct,
            )?,
            max_affordable_payment: max_payment,
            period_range: PeriodRange::new(args.min_periods, args.max_periods),
        }
    };

    let result = plan_search::optimize_plan(&opt_input)?;

    // Attach the full schedule of the winning plan alongside the search.
    let best_schedule = match result.result.best() {
        Some(best) => {
            let schedule = french::build_schedule(&opt_input.terms, best.period_count)?;
            serde_json::to_value(schedule)?
        }
        None => Value::Null,
    };

    let mut value = serde_json::to_value(result)?;
    if let Some(map) = value.as_object_mut() {
        map.insert("best_schedule".into(), best_schedule);
    }
    Ok(value)
}
