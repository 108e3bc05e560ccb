//! # Result & Report Model
//!
//! Shared output types for all composers. A composer never fails at the
//! call site: structural input problems accumulate as [`ValidationError`]s
//! and advisory findings as [`Warning`]s, both carried inside the returned
//! [`CalculationResult`]. This keeps the "one bad row doesn't blank the
//! recipe" contract explicit and testable.
//!
//! All types serialize to clean JSON for the surrounding editor layer.

use serde::{Deserialize, Serialize};

use crate::units::{MassUnit, VolumeUnit};

// ============================================================================
// Warnings
// ============================================================================

/// How urgently a warning should be surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Machine-checkable warning categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// A volume (or mass) too small to measure reliably
    SmallVolume,
    /// A quantity unusually large for bench work
    LargeVolume,
    /// Component volumes exceed the requested total volume
    VolumeOverflow,
    /// Dilution factor outside the plausible range for one step
    UnusualDilutionFactor,
}

impl WarningKind {
    /// Short code for programmatic handling
    pub fn code(self) -> &'static str {
        match self {
            WarningKind::SmallVolume => "SMALL_VOLUME",
            WarningKind::LargeVolume => "LARGE_VOLUME",
            WarningKind::VolumeOverflow => "VOLUME_OVERFLOW",
            WarningKind::UnusualDilutionFactor => "UNUSUAL_DILUTION_FACTOR",
        }
    }
}

/// Advisory finding attached to a fully-computed result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub severity: Severity,
    pub message: String,
    /// Index of the component/step this warning refers to, when scoped
    pub component_index: Option<usize>,
}

impl Warning {
    pub fn new(kind: WarningKind, severity: Severity, message: impl Into<String>) -> Self {
        Warning {
            kind,
            severity,
            message: message.into(),
            component_index: None,
        }
    }

    /// Scope this warning to one component or step
    pub fn at_component(mut self, index: usize) -> Self {
        self.component_index = Some(index);
        self
    }
}

// ============================================================================
// Validation Errors
// ============================================================================

/// Structural input problems. Unlike warnings, any of these blocks the
/// calculation (except `CalculationError`, which is scoped to one
/// component and leaves the rest of a buffer recipe computed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    MissingRequiredField,
    NegativeValue,
    InvalidConcentration,
    InvalidVolume,
    InvalidMolecularWeight,
    CalculationError,
}

impl ValidationErrorKind {
    /// Short code for programmatic handling
    pub fn code(self) -> &'static str {
        match self {
            ValidationErrorKind::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            ValidationErrorKind::NegativeValue => "NEGATIVE_VALUE",
            ValidationErrorKind::InvalidConcentration => "INVALID_CONCENTRATION",
            ValidationErrorKind::InvalidVolume => "INVALID_VOLUME",
            ValidationErrorKind::InvalidMolecularWeight => "INVALID_MOLECULAR_WEIGHT",
            ValidationErrorKind::CalculationError => "CALCULATION_ERROR",
        }
    }
}

/// A single validation failure, optionally scoped to a field and/or a
/// component index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
    pub field: Option<String>,
    pub component_index: Option<usize>,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        ValidationError {
            kind,
            message: message.into(),
            field: None,
            component_index: None,
        }
    }

    /// Name the offending input field
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Scope this error to one component
    pub fn at_component(mut self, index: usize) -> Self {
        self.component_index = Some(index);
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.field, self.component_index) {
            (Some(field), Some(i)) => {
                write!(f, "[{}] component {}, {}: {}", self.kind.code(), i + 1, field, self.message)
            }
            (Some(field), None) => write!(f, "[{}] {}: {}", self.kind.code(), field, self.message),
            (None, Some(i)) => {
                write!(f, "[{}] component {}: {}", self.kind.code(), i + 1, self.message)
            }
            (None, None) => write!(f, "[{}] {}", self.kind.code(), self.message),
        }
    }
}

// ============================================================================
// Calculated Output
// ============================================================================

/// One narrated step of a calculation, emitted only when
/// `EngineConfig::show_calculation_steps` is enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationStep {
    pub description: String,
    /// The formula actually evaluated, with substituted values
    pub formula: Option<String>,
}

impl CalculationStep {
    pub fn new(description: impl Into<String>) -> Self {
        CalculationStep {
            description: description.into(),
            formula: None,
        }
    }

    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }
}

/// Mass of solute paired with its display unit (stock solutions only).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassEquivalent {
    pub value: f64,
    pub unit: MassUnit,
}

/// One fully-computed recipe line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedComponent {
    /// Component name from the input
    pub name: String,
    /// Optional lot identifier carried through from the input
    pub lot: Option<String>,
    /// Required volume in canonical liters
    pub volume_liters: f64,
    /// Required volume expressed in the optimized display unit
    pub display_value: f64,
    pub display_unit: VolumeUnit,
    /// Human-readable quantity, e.g. "3.00 mL"
    pub display_text: String,
    /// Share of the total volume, 0-100, rounded to 2 decimals
    pub percent_of_total: f64,
    /// Mass of solute to weigh out (stock-solution calculations)
    pub mass_equivalent: Option<MassEquivalent>,
}

/// Result record returned by every composer.
///
/// When `errors` is non-empty the calculation did not run: `components` is
/// empty and the volumes are zero. A per-component `CalculationError` is
/// the one exception — it appears alongside the successfully computed
/// components of the same recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// User label for this calculation
    pub label: String,
    pub notes: Option<String>,
    pub components: Vec<CalculatedComponent>,
    /// Solvent top-up volume in liters, clamped to >= 0 for display
    pub solvent_volume_liters: f64,
    /// Unclamped solvent volume; negative exactly when the components
    /// overflow the requested total
    pub raw_solvent_volume_liters: f64,
    /// Solvent quantity in the optimized display unit, e.g. "92.00 mL"
    pub solvent_display_text: String,
    pub warnings: Vec<Warning>,
    pub errors: Vec<ValidationError>,
    /// Step narration, present only when enabled in the configuration
    pub steps: Option<Vec<CalculationStep>>,
}

impl CalculationResult {
    /// Empty result carrying only validation errors.
    pub(crate) fn invalid(label: impl Into<String>, errors: Vec<ValidationError>) -> Self {
        CalculationResult {
            label: label.into(),
            notes: None,
            components: Vec::new(),
            solvent_volume_liters: 0.0,
            raw_solvent_volume_liters: 0.0,
            solvent_display_text: String::new(),
            warnings: Vec::new(),
            errors,
            steps: None,
        }
    }

    /// True when no blocking validation errors were recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Sum of the computed component volumes in liters.
    pub fn total_component_volume_liters(&self) -> f64 {
        self.components.iter().map(|c| c.volume_liters).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_builder() {
        let w = Warning::new(WarningKind::SmallVolume, Severity::High, "below 1 µL")
            .at_component(2);
        assert_eq!(w.component_index, Some(2));
        assert_eq!(w.kind.code(), "SMALL_VOLUME");
    }

    #[test]
    fn test_validation_error_display() {
        let e = ValidationError::new(ValidationErrorKind::InvalidConcentration, "must be > 0")
            .with_field("stock_concentration")
            .at_component(0);
        let text = e.to_string();
        assert!(text.contains("INVALID_CONCENTRATION"));
        assert!(text.contains("component 1"));
        assert!(text.contains("stock_concentration"));
    }

    #[test]
    fn test_result_serialization_roundtrip() {
        let result = CalculationResult::invalid(
            "PBS",
            vec![ValidationError::new(
                ValidationErrorKind::InvalidVolume,
                "Total volume must be positive",
            )
            .with_field("total_volume")],
        );
        let json = serde_json::to_string_pretty(&result).unwrap();
        let roundtrip: CalculationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, roundtrip);
        assert!(!roundtrip.is_valid());
    }
}
