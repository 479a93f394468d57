pub mod plans;
pub mod reports;
pub mod tester;

pub use plans::{expand_plan_keys, find_plan};
pub use tester::*;
