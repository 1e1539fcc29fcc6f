pub mod evaluator;
pub mod rule;
pub mod vat;

pub use evaluator::{evaluate_duty, DutyComputability, DutyLine};
pub use rule::{CompoundOperator, DutyRate, DutyRuleRecord, DutyType, SpecificRate, SpecificUnit};
