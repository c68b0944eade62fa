pub mod bounds;
pub mod file;
pub mod stdin;
