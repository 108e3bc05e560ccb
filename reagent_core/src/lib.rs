//! # reagent_core - Laboratory Reagent Calculation Engine
//!
//! `reagent_core` computes bench-ready quantities for buffer recipes,
//! stock solutions, single dilutions, and serial-dilution protocols. Every
//! result carries machine-checkable warnings and validation errors, so the
//! surrounding editor layer can render a blocking error list or advisory
//! notes without re-deriving any chemistry.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions of the input record and an explicit
//!   [`config::EngineConfig`]; no engine object, no hidden settings
//! - **JSON-First**: All inputs and results implement Serialize/Deserialize
//! - **Errors as data**: Input problems accumulate inside the result record
//!   instead of aborting at the first failure; a broken buffer row is
//!   scoped to its index and never blanks the rest of the recipe
//! - **Loud conversions**: A concentration that cannot be converted with
//!   the data at hand is an error, never a silent pass-through
//!
//! ## Quick Start
//!
//! ```rust
//! use reagent_core::calculations::dilution::{SimpleDilutionInput, calculate};
//! use reagent_core::config::EngineConfig;
//! use reagent_core::units::{ConcentrationUnit, VolumeUnit};
//!
//! // Dilute a 5 M stock to 150 mM in 50 mL
//! let input = SimpleDilutionInput {
//!     label: "NaCl working solution".to_string(),
//!     stock_concentration: 5.0,
//!     stock_unit: ConcentrationUnit::Molar,
//!     final_concentration: 150.0,
//!     final_unit: ConcentrationUnit::Millimolar,
//!     final_volume: 50.0,
//!     volume_unit: VolumeUnit::Milliliter,
//! };
//!
//! let result = calculate(&input, &EngineConfig::default());
//! assert_eq!(result.components[0].display_text, "1.50 mL");
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - The four calculation kinds (buffer, stock, dilution, serial)
//! - [`units`] - Closed unit families and conversions
//! - [`display`] - Human-friendly display-unit optimization
//! - [`config`] - Caller-supplied engine settings
//! - [`results`] - Shared warning/error/result records
//! - [`errors`] - Structured conversion errors

pub mod calculations;
pub mod config;
pub mod display;
pub mod errors;
pub mod results;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use calculations::CalculationInput;
pub use config::EngineConfig;
pub use errors::ConversionError;
pub use results::{
    CalculatedComponent, CalculationResult, CalculationStep, Severity, ValidationError,
    ValidationErrorKind, Warning, WarningKind,
};
pub use units::{ConcentrationUnit, MassUnit, VolumeUnit};
