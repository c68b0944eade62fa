//! Installment-count search under an affordability cap.

pub mod plan_search;
