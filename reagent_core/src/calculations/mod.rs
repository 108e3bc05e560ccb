//! # Reagent Calculations
//!
//! This module contains the four calculation kinds. Each follows the
//! pattern:
//!
//! - `*Input` - Input parameters (JSON-serializable)
//! - `calculate(&input, &config) -> result record` - Pure function;
//!   validation errors come back inside the result, never as a panic or
//!   an `Err` at the call site
//!
//! ## Available Calculations
//!
//! - [`buffer`] - N-component buffer recipe (volumes + solvent top-up)
//! - [`stock`] - Stock solution (solute mass with purity correction)
//! - [`dilution`] - Single C1V1 = C2V2 dilution
//! - [`serial`] - Serial-dilution protocol with cell-addition correction

pub mod buffer;
pub mod dilution;
pub mod serial;
pub mod stock;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use buffer::{BufferComponent, BufferInput};
pub use dilution::SimpleDilutionInput;
pub use serial::{ProtocolSummary, SerialDilutionInput, SerialDilutionResult, SerialDilutionStep};
pub use stock::StockSolutionInput;

/// Enum wrapper for all calculation inputs.
///
/// Lets the surrounding editor layer parse a markup block into one value
/// and hand it around with clean serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CalculationInput {
    /// N-component buffer recipe
    Buffer(BufferInput),
    /// Stock solution from powder
    StockSolution(StockSolutionInput),
    /// Single-step dilution
    SimpleDilution(SimpleDilutionInput),
    /// Serial-dilution protocol
    SerialDilution(SerialDilutionInput),
}

impl CalculationInput {
    /// Get the user-provided label for this calculation
    pub fn label(&self) -> &str {
        match self {
            CalculationInput::Buffer(b) => &b.label,
            CalculationInput::StockSolution(s) => &s.reagent_name,
            CalculationInput::SimpleDilution(d) => &d.label,
            CalculationInput::SerialDilution(s) => &s.label,
        }
    }

    /// Get the calculation kind as a string
    pub fn calc_type(&self) -> &'static str {
        match self {
            CalculationInput::Buffer(_) => "Buffer",
            CalculationInput::StockSolution(_) => "StockSolution",
            CalculationInput::SimpleDilution(_) => "SimpleDilution",
            CalculationInput::SerialDilution(_) => "SerialDilution",
        }
    }
}
