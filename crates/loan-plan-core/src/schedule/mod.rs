//! French-system (level installment) amortisation schedules.

pub mod french;
