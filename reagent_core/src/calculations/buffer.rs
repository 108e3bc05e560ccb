//! # Buffer Recipe Calculation
//!
//! Computes, for an N-component buffer recipe, the volume of each stock
//! solution to combine via C1V1 = C2V2, the solvent top-up volume, and the
//! associated warnings.
//!
//! ## Failure semantics
//!
//! - Structural input problems accumulate and block the whole recipe
//!   (empty component list, non-positive volumes/concentrations).
//! - Arithmetic problems scoped to one row (final concentration above the
//!   stock, a non-convertible unit) are recorded as a `CALCULATION_ERROR`
//!   at that row's index and the remaining rows still compute. One bad
//!   row must not blank the recipe.
//!
//! ## Example
//!
//! ```rust
//! use reagent_core::calculations::buffer::{BufferInput, BufferComponent, calculate};
//! use reagent_core::config::EngineConfig;
//! use reagent_core::units::{ConcentrationUnit, VolumeUnit};
//!
//! let input = BufferInput {
//!     label: "TBS".to_string(),
//!     total_volume: 100.0,
//!     volume_unit: VolumeUnit::Milliliter,
//!     components: vec![BufferComponent {
//!         name: "NaCl".to_string(),
//!         stock_concentration: 5.0,
//!         stock_unit: ConcentrationUnit::Molar,
//!         final_concentration: 150.0,
//!         final_unit: ConcentrationUnit::Millimolar,
//!         lot: None,
//!     }],
//!     notes: None,
//! };
//!
//! let result = calculate(&input, &EngineConfig::default());
//! assert!(result.is_valid());
//! assert_eq!(result.components[0].display_text, "3.00 mL");
//! ```

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::display::{format_volume, optimize_volume};
use crate::results::{
    CalculatedComponent, CalculationResult, CalculationStep, Severity, ValidationError,
    ValidationErrorKind, Warning, WarningKind,
};
use crate::units::{convert_volume, to_molarity, ConcentrationUnit, VolumeUnit};

/// One row of a buffer recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferComponent {
    /// Reagent name (e.g. "Tris-HCl")
    pub name: String,

    /// Concentration of the stock solution on the shelf
    pub stock_concentration: f64,
    pub stock_unit: ConcentrationUnit,

    /// Desired concentration in the finished buffer
    pub final_concentration: f64,
    pub final_unit: ConcentrationUnit,

    /// Optional lot identifier carried through to the result
    pub lot: Option<String>,
}

/// Input parameters for a buffer recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferInput {
    /// User label for this recipe (e.g. "10x PBS")
    pub label: String,

    /// Final volume of buffer to prepare
    pub total_volume: f64,
    pub volume_unit: VolumeUnit,

    /// Ordered list of recipe rows
    pub components: Vec<BufferComponent>,

    pub notes: Option<String>,
}

impl BufferInput {
    /// Validate input parameters, accumulating every problem rather than
    /// stopping at the first.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !(self.total_volume.is_finite() && self.total_volume > 0.0) {
            errors.push(
                ValidationError::new(
                    ValidationErrorKind::InvalidVolume,
                    format!("Total volume must be positive, got {}", self.total_volume),
                )
                .with_field("total_volume"),
            );
        }

        if self.components.is_empty() {
            errors.push(
                ValidationError::new(
                    ValidationErrorKind::MissingRequiredField,
                    "Recipe needs at least one component",
                )
                .with_field("components"),
            );
        }

        for (i, component) in self.components.iter().enumerate() {
            if component.name.trim().is_empty() {
                errors.push(
                    ValidationError::new(
                        ValidationErrorKind::MissingRequiredField,
                        "Component name must not be empty",
                    )
                    .with_field("name")
                    .at_component(i),
                );
            }
            errors.extend(validate_concentration(
                component.stock_concentration,
                "stock_concentration",
                i,
            ));
            errors.extend(validate_concentration(
                component.final_concentration,
                "final_concentration",
                i,
            ));
        }

        errors
    }
}

fn validate_concentration(value: f64, field: &str, index: usize) -> Option<ValidationError> {
    if value.is_finite() && value > 0.0 {
        return None;
    }
    let kind = if value < 0.0 {
        ValidationErrorKind::NegativeValue
    } else {
        ValidationErrorKind::InvalidConcentration
    };
    Some(
        ValidationError::new(kind, format!("Concentration must be positive, got {value}"))
            .with_field(field)
            .at_component(index),
    )
}

/// Intermediate per-row outcome: the computed line plus the values that
/// drive the row warnings.
struct ComputedRow {
    component: CalculatedComponent,
    index: usize,
    stock_molar: f64,
    final_molar: f64,
    /// Required volume in the configured display unit, before the
    /// optimizer rescales it; this is what the small-volume check reads.
    volume_in_default_unit: f64,
}

fn compute_row(
    component: &BufferComponent,
    index: usize,
    total_liters: f64,
    config: &EngineConfig,
) -> Result<ComputedRow, ValidationError> {
    let row_error = |message: String| {
        ValidationError::new(ValidationErrorKind::CalculationError, message)
            .at_component(index)
    };

    let stock_molar = to_molarity(component.stock_concentration, component.stock_unit, None)
        .map_err(|e| row_error(format!("{}: {e}", component.name)))?;
    let final_molar = to_molarity(component.final_concentration, component.final_unit, None)
        .map_err(|e| row_error(format!("{}: {e}", component.name)))?;

    if final_molar > stock_molar {
        return Err(row_error(format!(
            "{}: final concentration exceeds the stock concentration",
            component.name
        )));
    }

    // C1V1 = C2V2 solved for the stock volume
    let required_liters = final_molar * total_liters / stock_molar;
    let in_default_unit =
        convert_volume(required_liters, VolumeUnit::Liter, config.default_volume_unit);
    let (display_value, display_unit) = optimize_volume(in_default_unit, config.default_volume_unit);
    let percent = round2(required_liters / total_liters * 100.0);

    Ok(ComputedRow {
        component: CalculatedComponent {
            name: component.name.clone(),
            lot: component.lot.clone(),
            volume_liters: required_liters,
            display_value,
            display_unit,
            display_text: format_volume(display_value, display_unit, config.decimal_places),
            percent_of_total: percent,
            mass_equivalent: None,
        },
        index,
        stock_molar,
        final_molar,
        volume_in_default_unit: in_default_unit,
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Calculate component volumes and solvent top-up for a buffer recipe.
///
/// Never fails at the call site: validation errors come back inside the
/// result with an empty component list, and per-row calculation errors
/// come back alongside the rows that did compute.
pub fn calculate(input: &BufferInput, config: &EngineConfig) -> CalculationResult {
    let validation = input.validate();
    if !validation.is_empty() {
        let mut result = CalculationResult::invalid(&input.label, validation);
        result.notes = input.notes.clone();
        return result;
    }

    let total_liters = convert_volume(input.total_volume, input.volume_unit, VolumeUnit::Liter);

    let mut components = Vec::new();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut steps = config.show_calculation_steps.then(Vec::new);

    for (i, component) in input.components.iter().enumerate() {
        match compute_row(component, i, total_liters, config) {
            Ok(row) => {
                if row.volume_in_default_unit < 0.1 {
                    warnings.push(
                        Warning::new(
                            WarningKind::SmallVolume,
                            Severity::Medium,
                            format!(
                                "{}: {} is hard to pipette accurately",
                                component.name, row.component.display_text
                            ),
                        )
                        .at_component(i),
                    );
                }
                if row.stock_molar / row.final_molar > 1000.0 {
                    warnings.push(
                        Warning::new(
                            WarningKind::UnusualDilutionFactor,
                            Severity::Medium,
                            format!(
                                "{}: dilution factor {:.0} exceeds 1000, consider an intermediate dilution",
                                component.name,
                                row.stock_molar / row.final_molar
                            ),
                        )
                        .at_component(i),
                    );
                }
                if let Some(steps) = steps.as_mut() {
                    steps.push(
                        CalculationStep::new(format!(
                            "{}: stock volume from C1V1 = C2V2",
                            component.name
                        ))
                        .with_formula(format!(
                            "V1 = ({} M × {} L) / {} M = {} L",
                            row.final_molar, total_liters, row.stock_molar,
                            row.component.volume_liters
                        )),
                    );
                    steps.push(
                        CalculationStep::new(format!(
                            "{}: convert to display unit",
                            component.name
                        ))
                        .with_formula(format!(
                            "{} L = {}",
                            row.component.volume_liters, row.component.display_text
                        )),
                    );
                }
                components.push(row.component);
            }
            Err(error) => errors.push(error),
        }
    }

    let used_liters: f64 = components.iter().map(|c| c.volume_liters).sum();
    let raw_solvent = total_liters - used_liters;
    let solvent = raw_solvent.max(0.0);

    if raw_solvent < 0.0 {
        warnings.push(Warning::new(
            WarningKind::VolumeOverflow,
            Severity::High,
            format!(
                "Component volumes exceed the total volume by {:.3} mL",
                convert_volume(-raw_solvent, VolumeUnit::Liter, VolumeUnit::Milliliter)
            ),
        ));
    }
    if raw_solvent < 0.1 * total_liters {
        warnings.push(Warning::new(
            WarningKind::SmallVolume,
            Severity::Low,
            "Less than 10% of the total volume is left for solvent",
        ));
    }

    if let Some(steps) = steps.as_mut() {
        steps.push(
            CalculationStep::new("Solvent top-up to the total volume").with_formula(format!(
                "{} L − {} L = {} L",
                total_liters, used_liters, raw_solvent
            )),
        );
    }

    let (solvent_value, solvent_unit) = optimize_volume(solvent, VolumeUnit::Liter);

    CalculationResult {
        label: input.label.clone(),
        notes: input.notes.clone(),
        components,
        solvent_volume_liters: solvent,
        raw_solvent_volume_liters: raw_solvent,
        solvent_display_text: format_volume(solvent_value, solvent_unit, config.decimal_places),
        warnings,
        errors,
        steps,
    }
}
