use thiserror::Error;

#[derive(Debug, Error)]
pub enum LandedCostError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("No active tariff version is published; cannot compute against an empty tariff book")]
    NoActiveTariffVersion,

    #[error("Unknown HS code '{code}': not present in the tariff reference data")]
    UnknownHsCode { code: String },

    #[error("HS code '{code}' exists but has no duty rate in tariff version '{version}'")]
    NoRateForVersion { code: String, version: String },

    #[error("Unsupported duty type '{duty_type}' on HS code '{code}': rate record cannot be evaluated")]
    UnsupportedDutyType { duty_type: String, code: String },

    #[error("Duty not computable for HS code '{code}': {reason}")]
    NotComputable { code: String, reason: String },

    #[error("Run history write failed: {0}")]
    RunHistoryError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for LandedCostError {
    fn from(e: serde_json::Error) -> Self {
        LandedCostError::SerializationError(e.to_string())
    }
}
