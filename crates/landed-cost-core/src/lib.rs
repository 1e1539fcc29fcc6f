pub mod compliance;
pub mod duty;
pub mod engine;
pub mod error;
pub mod fees;
pub mod hunter;
pub mod lookup;
pub mod preference;
pub mod reference;
pub mod types;

pub use error::LandedCostError;
pub use types::*;

/// Standard result type for all landed-cost operations
pub type LandedCostResult<T> = Result<T, LandedCostError>;
