//! Engine error types.
//!
//! Local recovery is the default: out-of-range values are clamped,
//! unmatched parameters are dropped with partial coverage, and "no
//! substitute found" is an empty list, not an error. Only the cases below
//! surface as typed errors.

use chainshare_core::ParameterUnit;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid parameter map: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("No parameter map found for plugin '{plugin}'")]
    MapNotFound { plugin: String },

    #[error("Curve domain error: {message}")]
    Domain { message: String },

    #[error("Cannot translate {from_unit} value to {to_unit}")]
    IncompatibleUnit {
        from_unit: ParameterUnit,
        to_unit: ParameterUnit,
    },

    #[error("Stored parameter map could not be parsed: {message}")]
    Corrupt { message: String },
}

impl EngineError {
    /// Stable error code for the presentation layer.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation { .. } => "VALIDATION",
            EngineError::MapNotFound { .. } => "MAP_NOT_FOUND",
            EngineError::Domain { .. } => "CURVE_DOMAIN",
            EngineError::IncompatibleUnit { .. } => "INCOMPATIBLE_UNIT",
            EngineError::Corrupt { .. } => "CORRUPT_MAP",
        }
    }

    /// Recovery hint for whoever submitted the offending data.
    pub fn suggestion(&self) -> &'static str {
        match self {
            EngineError::Validation { .. } => {
                "Fix the named field in the submitted parameter map and resubmit."
            }
            EngineError::MapNotFound { .. } => {
                "The plugin has no community map yet. Contribute one to enable substitution."
            }
            EngineError::Domain { .. } => {
                "Logarithmic and exponential curves need strictly positive bounds."
            }
            EngineError::IncompatibleUnit { .. } => {
                "Only parameters sharing a physical unit can be translated."
            }
            EngineError::Corrupt { .. } => {
                "The stored map is structurally invalid and needs re-submission."
            }
        }
    }

    /// Errors a contribution pipeline can fix by resubmitting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::Validation { .. } | EngineError::Corrupt { .. }
        )
    }

    pub(crate) fn validation(field: &str, reason: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Serializable error payload for the presentation layer, which renders a
/// generic "could not evaluate compatibility" message from it rather than
/// surfacing internals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub suggestion: String,
    pub recoverable: bool,
}

impl From<EngineError> for ErrorResponse {
    fn from(err: EngineError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            suggestion: err.suggestion().to_string(),
            recoverable: err.is_recoverable(),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Corrupt {
            message: err.to_string(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
