use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LoanPlanError;
use crate::LoanPlanResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.85 = 85%). Never as percentages.
pub type Rate = Decimal;

/// Rates already scaled for display (180.04 = 180.04%).
pub type Percentage = Decimal;

/// Longest schedule, in monthly installments, the core will build.
pub const MAX_PERIODS: u32 = 120;

/// Terms shared by every schedule of a given loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Amount disbursed to the borrower.
    pub principal: Money,
    /// Nominal annual rate (TNA), compounded monthly.
    pub annual_rate: Rate,
    /// Administrative fee charged on every installment.
    #[serde(default)]
    pub fixed_fee: Money,
    /// Tax levied on interest and on the fixed fee (not on amortisation).
    #[serde(default)]
    pub tax_rate: Rate,
}

impl LoanTerms {
    /// Reject terms the schedule arithmetic cannot price.
    pub fn validate(&self) -> LoanPlanResult<()> {
        if self.principal <= Decimal::ZERO {
            return Err(LoanPlanError::InvalidInput {
                field: "principal".into(),
                reason: "Principal must be positive".into(),
            });
        }
        if self.annual_rate < Decimal::ZERO {
            return Err(LoanPlanError::InvalidInput {
                field: "annual_rate".into(),
                reason: "Annual rate cannot be negative".into(),
            });
        }
        if self.fixed_fee < Decimal::ZERO {
            return Err(LoanPlanError::InvalidInput {
                field: "fixed_fee".into(),
                reason: "Fixed fee cannot be negative".into(),
            });
        }
        if self.tax_rate < Decimal::ZERO {
            return Err(LoanPlanError::InvalidInput {
                field: "tax_rate".into(),
                reason: "Tax rate cannot be negative".into(),
            });
        }
        Ok(())
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
