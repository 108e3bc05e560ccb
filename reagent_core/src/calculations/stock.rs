//! # Stock Solution Calculation
//!
//! Computes the mass of solute to weigh out for a target molar
//! concentration in a target volume, correcting for reagent purity, and
//! picks the mass unit a person would actually read off a balance.
//!
//! ## Example
//!
//! ```rust
//! use reagent_core::calculations::stock::{StockSolutionInput, calculate};
//! use reagent_core::config::EngineConfig;
//! use reagent_core::units::{ConcentrationUnit, MassUnit, VolumeUnit};
//!
//! // 1 M NaCl in 100 mL: 0.1 mol × 58.44 g/mol = 5.844 g
//! let input = StockSolutionInput {
//!     reagent_name: "NaCl".to_string(),
//!     molecular_weight: 58.44,
//!     concentration: 1.0,
//!     concentration_unit: ConcentrationUnit::Molar,
//!     volume: 100.0,
//!     volume_unit: VolumeUnit::Milliliter,
//!     purity_percent: None,
//!     lot: None,
//! };
//!
//! let result = calculate(&input, &EngineConfig::default());
//! let mass = result.components[0].mass_equivalent.unwrap();
//! assert_eq!(mass.unit, MassUnit::Gram);
//! assert!((mass.value - 5.844).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::display::{format_mass, format_volume, optimize_mass, optimize_volume};
use crate::results::{
    CalculatedComponent, CalculationResult, CalculationStep, MassEquivalent, Severity,
    ValidationError, ValidationErrorKind, Warning, WarningKind,
};
use crate::units::{convert_volume, to_molarity, ConcentrationUnit, MassUnit, VolumeUnit};

/// Input parameters for a stock-solution preparation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSolutionInput {
    /// Reagent to dissolve (e.g. "Tris base")
    pub reagent_name: String,

    /// Molecular weight in g/mol
    pub molecular_weight: f64,

    /// Target concentration of the finished stock
    pub concentration: f64,
    pub concentration_unit: ConcentrationUnit,

    /// Target volume of the finished stock
    pub volume: f64,
    pub volume_unit: VolumeUnit,

    /// Reagent purity in percent, (0, 100]. Omit for 100%.
    pub purity_percent: Option<f64>,

    pub lot: Option<String>,
}

impl StockSolutionInput {
    /// Validate input parameters, accumulating every problem.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.reagent_name.trim().is_empty() {
            errors.push(
                ValidationError::new(
                    ValidationErrorKind::MissingRequiredField,
                    "Reagent name must not be empty",
                )
                .with_field("reagent_name"),
            );
        }

        if !(self.molecular_weight.is_finite() && self.molecular_weight > 0.0) {
            errors.push(
                ValidationError::new(
                    ValidationErrorKind::InvalidMolecularWeight,
                    format!(
                        "Molecular weight must be positive, got {}",
                        self.molecular_weight
                    ),
                )
                .with_field("molecular_weight"),
            );
        }

        if !(self.concentration.is_finite() && self.concentration > 0.0) {
            let kind = if self.concentration < 0.0 {
                ValidationErrorKind::NegativeValue
            } else {
                ValidationErrorKind::InvalidConcentration
            };
            errors.push(
                ValidationError::new(
                    kind,
                    format!("Concentration must be positive, got {}", self.concentration),
                )
                .with_field("concentration"),
            );
        }

        if !(self.volume.is_finite() && self.volume > 0.0) {
            let kind = if self.volume < 0.0 {
                ValidationErrorKind::NegativeValue
            } else {
                ValidationErrorKind::InvalidVolume
            };
            errors.push(
                ValidationError::new(kind, format!("Volume must be positive, got {}", self.volume))
                    .with_field("volume"),
            );
        }

        if let Some(purity) = self.purity_percent {
            if !(purity.is_finite() && purity > 0.0 && purity <= 100.0) {
                errors.push(
                    ValidationError::new(
                        ValidationErrorKind::InvalidConcentration,
                        format!("Purity must be in (0, 100], got {purity}"),
                    )
                    .with_field("purity_percent"),
                );
            }
        }

        errors
    }
}

/// Calculate the solute mass for a stock solution.
pub fn calculate(input: &StockSolutionInput, config: &EngineConfig) -> CalculationResult {
    let validation = input.validate();
    if !validation.is_empty() {
        return CalculationResult::invalid(&input.reagent_name, validation);
    }

    let volume_liters = convert_volume(input.volume, input.volume_unit, VolumeUnit::Liter);

    // The molecular weight is in hand here, so mg/mL-style target units
    // are legal; only density-dependent units (%w/w, %v/v) still fail.
    let molar = match to_molarity(
        input.concentration,
        input.concentration_unit,
        Some(input.molecular_weight),
    ) {
        Ok(m) => m,
        Err(e) => {
            return CalculationResult::invalid(
                &input.reagent_name,
                vec![ValidationError::new(
                    ValidationErrorKind::InvalidConcentration,
                    e.to_string(),
                )
                .with_field("concentration_unit")],
            );
        }
    };

    let raw_mass_grams = molar * volume_liters * input.molecular_weight;
    let mass_grams = match input.purity_percent {
        Some(purity) => raw_mass_grams / (purity / 100.0),
        None => raw_mass_grams,
    };

    let mut warnings = Vec::new();
    if mass_grams < 0.001 {
        warnings.push(Warning::new(
            WarningKind::SmallVolume,
            Severity::Medium,
            format!(
                "{:.3} mg is below typical balance precision; prepare a larger volume",
                mass_grams * 1e3
            ),
        ));
    }
    if mass_grams > 10.0 {
        warnings.push(Warning::new(
            WarningKind::LargeVolume,
            Severity::Low,
            format!("{mass_grams:.1} g of solute is unusually large for a stock"),
        ));
    }

    let mut steps = config.show_calculation_steps.then(Vec::new);
    if let Some(steps) = steps.as_mut() {
        steps.push(
            CalculationStep::new("Solute mass from m = C × V × MW").with_formula(format!(
                "m = {} M × {} L × {} g/mol = {} g",
                molar, volume_liters, input.molecular_weight, raw_mass_grams
            )),
        );
        if let Some(purity) = input.purity_percent {
            steps.push(
                CalculationStep::new("Correct for reagent purity").with_formula(format!(
                    "m = {raw_mass_grams} g / ({purity} / 100) = {mass_grams} g"
                )),
            );
        }
        steps.push(CalculationStep::new("Choose display mass unit").with_formula(format!(
            "{} g = {}",
            mass_grams,
            {
                let (v, u) = optimize_mass(mass_grams, MassUnit::Gram);
                format_mass(v, u, config.decimal_places)
            }
        )));
    }

    let (mass_value, mass_unit) = optimize_mass(mass_grams, MassUnit::Gram);
    let (volume_value, volume_unit) = optimize_volume(volume_liters, VolumeUnit::Liter);
    let volume_text = format_volume(volume_value, volume_unit, config.decimal_places);

    let component = CalculatedComponent {
        name: input.reagent_name.clone(),
        lot: input.lot.clone(),
        volume_liters,
        display_value: volume_value,
        display_unit: volume_unit,
        display_text: volume_text.clone(),
        percent_of_total: 100.0,
        mass_equivalent: Some(MassEquivalent {
            value: mass_value,
            unit: mass_unit,
        }),
    };

    CalculationResult {
        label: input.reagent_name.clone(),
        notes: None,
        components: vec![component],
        // By convention the entire target volume is solvent + solute.
        solvent_volume_liters: volume_liters,
        raw_solvent_volume_liters: volume_liters,
        solvent_display_text: volume_text,
        warnings,
        errors: Vec::new(),
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nacl_1m() -> StockSolutionInput {
        StockSolutionInput {
            reagent_name: "NaCl".to_string(),
            molecular_weight: 58.44,
            concentration: 1.0,
            concentration_unit: ConcentrationUnit::Molar,
            volume: 1.0,
            volume_unit: VolumeUnit::Liter,
            purity_percent: None,
            lot: None,
        }
    }

    #[test]
    fn test_basic_mass() {
        let result = calculate(&nacl_1m(), &EngineConfig::default());
        assert!(result.is_valid());
        let mass = result.components[0].mass_equivalent.unwrap();
        assert_eq!(mass.unit, MassUnit::Gram);
        assert!((mass.value - 58.44).abs() < 1e-9);
        assert_eq!(result.components[0].percent_of_total, 100.0);
        // Solvent equals the full target volume by convention
        assert_eq!(result.solvent_volume_liters, 1.0);
    }

    #[test]
    fn test_purity_correction_divides_exactly() {
        let mut input = nacl_1m();
        input.purity_percent = Some(50.0);
        let result = calculate(&input, &EngineConfig::default());
        let mass = result.components[0].mass_equivalent.unwrap();
        assert!((mass.value - 116.88).abs() < 1e-9);
    }

    #[test]
    fn test_purity_100_is_noop() {
        let mut input = nacl_1m();
        input.purity_percent = Some(100.0);
        let with = calculate(&input, &EngineConfig::default());
        let without = calculate(&nacl_1m(), &EngineConfig::default());
        assert_eq!(
            with.components[0].mass_equivalent,
            without.components[0].mass_equivalent
        );
    }

    #[test]
    fn test_invalid_molecular_weight() {
        let mut input = nacl_1m();
        input.molecular_weight = 0.0;
        let result = calculate(&input, &EngineConfig::default());
        assert!(result.components.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(
            result.errors[0].kind,
            ValidationErrorKind::InvalidMolecularWeight
        );
    }

    #[test]
    fn test_purity_out_of_range() {
        for bad in [0.0, -5.0, 120.0] {
            let mut input = nacl_1m();
            input.purity_percent = Some(bad);
            let result = calculate(&input, &EngineConfig::default());
            assert!(!result.is_valid(), "purity {bad} should be rejected");
            assert_eq!(result.errors[0].field.as_deref(), Some("purity_percent"));
        }
    }

    #[test]
    fn test_mass_unit_by_magnitude() {
        // 100 µM in 10 mL at MW 300: 1e-4 × 0.01 × 300 = 3e-4 g = 300 µg
        let input = StockSolutionInput {
            reagent_name: "Inhibitor".to_string(),
            molecular_weight: 300.0,
            concentration: 100.0,
            concentration_unit: ConcentrationUnit::Micromolar,
            volume: 10.0,
            volume_unit: VolumeUnit::Milliliter,
            purity_percent: None,
            lot: None,
        };
        let result = calculate(&input, &EngineConfig::default());
        let mass = result.components[0].mass_equivalent.unwrap();
        assert_eq!(mass.unit, MassUnit::Microgram);
        assert!((mass.value - 300.0).abs() < 1e-9);
        // Sub-milligram mass warns about balance precision
        assert!(result
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::SmallVolume));
    }

    #[test]
    fn test_large_mass_warning() {
        let mut input = nacl_1m();
        input.concentration = 5.0; // 292.2 g
        let result = calculate(&input, &EngineConfig::default());
        assert!(result
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::LargeVolume));
    }

    #[test]
    fn test_mass_concentration_target_unit() {
        // 10 mg/mL in 50 mL needs 500 mg regardless of MW; via molarity:
        // (10 g/L / 58.44) × 0.05 L × 58.44 = 0.5 g
        let input = StockSolutionInput {
            reagent_name: "NaCl".to_string(),
            molecular_weight: 58.44,
            concentration: 10.0,
            concentration_unit: ConcentrationUnit::MilligramPerMilliliter,
            volume: 50.0,
            volume_unit: VolumeUnit::Milliliter,
            purity_percent: None,
            lot: None,
        };
        let result = calculate(&input, &EngineConfig::default());
        let mass = result.components[0].mass_equivalent.unwrap();
        assert_eq!(mass.unit, MassUnit::Milligram);
        assert!((mass.value - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_density_unit_rejected() {
        let mut input = nacl_1m();
        input.concentration_unit = ConcentrationUnit::PercentWeightWeight;
        let result = calculate(&input, &EngineConfig::default());
        assert!(!result.is_valid());
        assert_eq!(
            result.errors[0].kind,
            ValidationErrorKind::InvalidConcentration
        );
    }

    #[test]
    fn test_steps_narration() {
        let mut input = nacl_1m();
        input.purity_percent = Some(99.0);
        let config = EngineConfig {
            show_calculation_steps: true,
            ..EngineConfig::default()
        };
        let result = calculate(&input, &config);
        let steps = result.steps.unwrap();
        assert_eq!(steps.len(), 3);
        assert!(steps[1].description.contains("purity"));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let input = nacl_1m();
        let json = serde_json::to_string(&input).unwrap();
        let roundtrip: StockSolutionInput = serde_json::from_str(&json).unwrap();
        assert_eq!(input, roundtrip);
    }
}
