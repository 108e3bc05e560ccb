//! # Conversion Errors
//!
//! The unit-conversion layer is the only part of the engine that fails
//! through `Result` — everything downstream accumulates problems as data
//! inside the result record (see [`crate::results`]). These errors are
//! structured so callers can branch on them programmatically instead of
//! string-matching.
//!
//! ## Example
//!
//! ```rust
//! use reagent_core::units::{to_molarity, ConcentrationUnit};
//!
//! let err = to_molarity(5.0, ConcentrationUnit::MilligramPerMilliliter, None).unwrap_err();
//! assert_eq!(err.error_code(), "MISSING_MOLECULAR_WEIGHT");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::units::ConcentrationUnit;

/// Error raised by the unit-conversion layer.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum ConversionError {
    /// The two units belong to families that cannot be interconverted
    /// with the data at hand (e.g. %w/w needs a density).
    #[error("Cannot convert from {from} to {to}: units are not in the same convertible family")]
    UnsupportedConversion { from: String, to: String },

    /// A mass-based concentration unit needs a molecular weight to become
    /// a molarity.
    #[error("Converting {unit} to molarity requires a molecular weight")]
    MissingMolecularWeight { unit: String },
}

impl ConversionError {
    /// Create an UnsupportedConversion error
    pub fn unsupported(from: ConcentrationUnit, to: ConcentrationUnit) -> Self {
        ConversionError::UnsupportedConversion {
            from: from.symbol().to_string(),
            to: to.symbol().to_string(),
        }
    }

    /// Create a MissingMolecularWeight error
    pub fn missing_molecular_weight(unit: ConcentrationUnit) -> Self {
        ConversionError::MissingMolecularWeight {
            unit: unit.symbol().to_string(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ConversionError::UnsupportedConversion { .. } => "UNSUPPORTED_CONVERSION",
            ConversionError::MissingMolecularWeight { .. } => "MISSING_MOLECULAR_WEIGHT",
        }
    }
}
