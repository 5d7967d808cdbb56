pub mod agent;
pub mod chile;
pub mod documents;
pub mod duty;
pub mod special;

pub use duty::{calculate_duties, CalculationResult, InsuranceMethod};
