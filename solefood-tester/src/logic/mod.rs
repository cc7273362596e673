pub mod reports;
pub mod scenarios;
pub mod tester;
pub mod walker;

pub use scenarios::{get_scenario, list_scenarios};
pub use tester::*;
