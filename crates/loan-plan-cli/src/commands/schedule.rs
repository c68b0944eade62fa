use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_plan_core::schedule::french::{self, ScheduleInput};
use loan_plan_core::LoanTerms;

use crate::input;
use crate::input::bounds;

/// Arguments for a single amortisation schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Number of monthly installments
    #[arg(long, value_parser = clap::value_parser!(u32).range(bounds::PERIODS_MIN..=bounds::PERIODS_MAX))]
    pub periods: Option<u32>,

    /// Nominal annual rate in percent (e.g. 85 for 85%)
    #[arg(long)]
    pub annual_rate_pct: Option<Decimal>,

    /// Administrative fee charged on every installment
    #[arg(long, default_value = "0")]
    pub fixed_fee: Decimal,

    /// Tax on interest and fees in percent (e.g. 21 for 21%)
    #[arg(long, default_value = "0")]
    pub tax_pct: Decimal,
}

/// Build loan terms from flags, enforcing the interactive input limits.
pub fn terms_from_flags(
    principal: Option<Decimal>,
    annual_rate_pct: Option<Decimal>,
    fixed_fee: Decimal,
    tax_pct: Decimal,
) -> Result<LoanTerms, Box<dyn std::error::Error>> {
    let principal = principal.ok_or("--principal is required (or provide --input)")?;
    let annual_rate_pct =
        annual_rate_pct.ok_or("--annual-rate-pct is required (or provide --input)")?;

    let principal = bounds::within(
        "principal",
        principal,
        bounds::PRINCIPAL_MIN,
        Some(bounds::PRINCIPAL_MAX),
    )?;
    let annual_rate_pct = bounds::within(
        "annual-rate-pct",
        annual_rate_pct,
        Decimal::ZERO,
        Some(bounds::ANNUAL_RATE_PCT_MAX),
    )?;
    let fixed_fee = bounds::within("fixed-fee", fixed_fee, Decimal::ZERO, None)?;
    let tax_pct = bounds::within("tax-pct", tax_pct, Decimal::ZERO, Some(bounds::TAX_PCT_MAX))?;

    Ok(LoanTerms {
        principal,
        annual_rate: bounds::pct_to_rate(annual_rate_pct),
        fixed_fee,
        tax_rate: bounds::pct_to_rate(tax_pct),
    })
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input: ScheduleInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(piped) = input::stdin::read_stdin()? {
        piped
    } else {
        let period_count = args
            .periods
            .ok_or("--periods is required (or provide --input)")?;
        ScheduleInput {
            terms: terms_from_flags(
                args.principal,
                args.annual_rate_pct,
                args.fixed_fee,
                args.tax_pct,
            )?,
            period_count,
        }
    };

    let result = french::generate_schedule(&schedule_input)?;
    Ok(serde_json::to_value(result)?)
}
