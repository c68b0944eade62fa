pub mod optimize;
pub mod schedule;
