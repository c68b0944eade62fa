pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "schedule")]
pub mod schedule;

#[cfg(feature = "optimizer")]
pub mod optimizer;

pub use error::LoanPlanError;
pub use types::*;

/// Standard result type for all loan-plan operations
pub type LoanPlanResult<T> = Result<T, LoanPlanError>;
