//! # Single-Step Dilution Calculation
//!
//! C1V1 = C2V2 for one dilution from a stock to a final concentration and
//! volume. Both sides are normalized to molarity before the identity is
//! applied, so mixed molar-family units (a 5 M stock diluted to 150 mM)
//! just work.
//!
//! ## Example
//!
//! ```rust
//! use reagent_core::calculations::dilution::{SimpleDilutionInput, calculate};
//! use reagent_core::config::EngineConfig;
//! use reagent_core::units::{ConcentrationUnit, VolumeUnit};
//!
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
//! // V1 = 150 mM × 50 mL / 5 M = 1.5 mL
//! assert_eq!(result.components[0].display_text, "1.50 mL");
//! ```

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::display::{format_volume, optimize_volume};
use crate::results::{
    CalculatedComponent, CalculationResult, CalculationStep, Severity, ValidationError,
    ValidationErrorKind, Warning, WarningKind,
};
use crate::units::{convert_volume, to_molarity, ConcentrationUnit, VolumeUnit};

/// Input parameters for a single dilution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleDilutionInput {
    /// User label for this dilution
    pub label: String,

    /// Concentration of the stock being diluted
    pub stock_concentration: f64,
    pub stock_unit: ConcentrationUnit,

    /// Desired concentration after dilution
    pub final_concentration: f64,
    pub final_unit: ConcentrationUnit,

    /// Desired final volume
    pub final_volume: f64,
    pub volume_unit: VolumeUnit,
}

impl SimpleDilutionInput {
    /// Validate input parameters, accumulating every problem. The
    /// stock-vs-final ordering check needs both concentrations in molar,
    /// so conversion failures surface here too.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        let mut check_positive = |value: f64, field: &str, kind: ValidationErrorKind| {
            if !(value.is_finite() && value > 0.0) {
                let kind = if value < 0.0 {
                    ValidationErrorKind::NegativeValue
                } else {
                    kind
                };
                errors.push(
                    ValidationError::new(kind, format!("Value must be positive, got {value}"))
                        .with_field(field.to_string()),
                );
            }
        };

        check_positive(
            self.stock_concentration,
            "stock_concentration",
            ValidationErrorKind::InvalidConcentration,
        );
        check_positive(
            self.final_concentration,
            "final_concentration",
            ValidationErrorKind::InvalidConcentration,
        );
        check_positive(
            self.final_volume,
            "final_volume",
            ValidationErrorKind::InvalidVolume,
        );

        if !errors.is_empty() {
            return errors;
        }

        match (
            to_molarity(self.stock_concentration, self.stock_unit, None),
            to_molarity(self.final_concentration, self.final_unit, None),
        ) {
            (Ok(stock_molar), Ok(final_molar)) => {
                // Strict: equality is rejected, not passed through.
                if final_molar >= stock_molar {
                    errors.push(
                        ValidationError::new(
                            ValidationErrorKind::InvalidConcentration,
                            "Final concentration must be strictly below the stock concentration",
                        )
                        .with_field("final_concentration"),
                    );
                }
            }
            (stock, final_c) => {
                for (conversion, field) in
                    [(stock, "stock_unit"), (final_c, "final_unit")]
                {
                    if let Err(e) = conversion {
                        errors.push(
                            ValidationError::new(
                                ValidationErrorKind::InvalidConcentration,
                                e.to_string(),
                            )
                            .with_field(field),
                        );
                    }
                }
            }
        }

        errors
    }
}

/// Calculate the stock and solvent volumes for a single dilution.
pub fn calculate(input: &SimpleDilutionInput, config: &EngineConfig) -> CalculationResult {
    let validation = input.validate();
    if !validation.is_empty() {
        return CalculationResult::invalid(&input.label, validation);
    }

    // validate() already proved both conversions succeed
    let stock_molar = to_molarity(input.stock_concentration, input.stock_unit, None)
        .unwrap_or_default();
    let final_molar = to_molarity(input.final_concentration, input.final_unit, None)
        .unwrap_or_default();
    let volume_liters = convert_volume(input.final_volume, input.volume_unit, VolumeUnit::Liter);

    let stock_needed_liters = final_molar * volume_liters / stock_molar;
    let solvent_liters = volume_liters - stock_needed_liters;
    let dilution_factor = stock_molar / final_molar;

    let mut warnings = Vec::new();
    if dilution_factor < 2.0 {
        warnings.push(Warning::new(
            WarningKind::UnusualDilutionFactor,
            Severity::Low,
            format!(
                "Dilution factor {dilution_factor:.2} is below 2; double-check the target concentration"
            ),
        ));
    }
    if stock_needed_liters < 0.001 {
        warnings.push(Warning::new(
            WarningKind::SmallVolume,
            Severity::Medium,
            format!(
                "Stock volume {:.1} µL may exceed pipetting precision",
                convert_volume(stock_needed_liters, VolumeUnit::Liter, VolumeUnit::Microliter)
            ),
        ));
    }

    let in_default_unit =
        convert_volume(stock_needed_liters, VolumeUnit::Liter, config.default_volume_unit);
    let (display_value, display_unit) =
        optimize_volume(in_default_unit, config.default_volume_unit);
    let display_text = format_volume(display_value, display_unit, config.decimal_places);

    let mut steps = config.show_calculation_steps.then(Vec::new);
    if let Some(steps) = steps.as_mut() {
        steps.push(
            CalculationStep::new("Stock volume from C1V1 = C2V2").with_formula(format!(
                "V1 = ({final_molar} M × {volume_liters} L) / {stock_molar} M = {stock_needed_liters} L"
            )),
        );
        steps.push(
            CalculationStep::new("Solvent volume to reach the final volume").with_formula(
                format!("{volume_liters} L − {stock_needed_liters} L = {solvent_liters} L"),
            ),
        );
    }

    let (solvent_value, solvent_unit) = optimize_volume(solvent_liters, VolumeUnit::Liter);
    let percent = (stock_needed_liters / volume_liters * 10_000.0).round() / 100.0;

    CalculationResult {
        label: input.label.clone(),
        notes: Some(format!("Dilution factor: {dilution_factor:.2}")),
        components: vec![CalculatedComponent {
            name: "Stock solution".to_string(),
            lot: None,
            volume_liters: stock_needed_liters,
            display_value,
            display_unit,
            display_text,
            percent_of_total: percent,
            mass_equivalent: None,
        }],
        solvent_volume_liters: solvent_liters,
        raw_solvent_volume_liters: solvent_liters,
        solvent_display_text: format_volume(solvent_value, solvent_unit, config.decimal_places),
        warnings,
        errors: Vec::new(),
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nacl_dilution() -> SimpleDilutionInput {
        SimpleDilutionInput {
            label: "NaCl working".to_string(),
            stock_concentration: 5.0,
            stock_unit: ConcentrationUnit::Molar,
            final_concentration: 150.0,
            final_unit: ConcentrationUnit::Millimolar,
            final_volume: 50.0,
            volume_unit: VolumeUnit::Milliliter,
        }
    }

    #[test]
    fn test_c1v1_identity_holds() {
        // stock_volume × stock == final × volume, the conservation of moles
        let cases = [
            (5.0, 0.15, 0.05),
            (1.0, 0.001, 1.0),
            (10.0, 2.5, 0.2),
            (0.5, 0.0001, 0.01),
        ];
        for (stock, final_c, volume) in cases {
            let input = SimpleDilutionInput {
                label: "prop".to_string(),
                stock_concentration: stock,
                stock_unit: ConcentrationUnit::Molar,
                final_concentration: final_c,
                final_unit: ConcentrationUnit::Molar,
                final_volume: volume,
                volume_unit: VolumeUnit::Liter,
            };
            let result = calculate(&input, &EngineConfig::default());
            assert!(result.is_valid());
            let v1 = result.components[0].volume_liters;
            assert!(
                (v1 * stock - final_c * volume).abs() <= 1e-12 * (final_c * volume),
                "moles not conserved for {stock} M -> {final_c} M in {volume} L"
            );
            // Solvent fills the remainder
            assert!(
                (v1 + result.solvent_volume_liters - volume).abs() < 1e-12
            );
        }
    }

    #[test]
    fn test_mixed_units() {
        let result = calculate(&nacl_dilution(), &EngineConfig::default());
        assert!(result.is_valid());
        // 150 mM × 50 mL / 5 M = 1.5 mL
        assert!((result.components[0].volume_liters - 0.0015).abs() < 1e-12);
        assert_eq!(result.components[0].display_text, "1.50 mL");
        assert_eq!(result.notes.as_deref(), Some("Dilution factor: 33.33"));
    }

    #[test]
    fn test_equal_concentrations_rejected() {
        let mut input = nacl_dilution();
        input.final_concentration = 5000.0; // 5 M in mM, equal to the stock
        let result = calculate(&input, &EngineConfig::default());
        assert!(!result.is_valid());
        assert!(result.components.is_empty());
        assert_eq!(
            result.errors[0].kind,
            ValidationErrorKind::InvalidConcentration
        );
    }

    #[test]
    fn test_reversed_concentrations_rejected() {
        let mut input = nacl_dilution();
        input.final_concentration = 10.0;
        input.final_unit = ConcentrationUnit::Molar;
        let result = calculate(&input, &EngineConfig::default());
        assert!(!result.is_valid());
    }

    #[test]
    fn test_validation_accumulates() {
        let input = SimpleDilutionInput {
            label: "bad".to_string(),
            stock_concentration: -1.0,
            stock_unit: ConcentrationUnit::Molar,
            final_concentration: 0.0,
            final_unit: ConcentrationUnit::Molar,
            final_volume: f64::NAN,
            volume_unit: VolumeUnit::Milliliter,
        };
        let result = calculate(&input, &EngineConfig::default());
        assert_eq!(result.errors.len(), 3);
    }

    #[test]
    fn test_non_molar_units_fail_loudly() {
        let mut input = nacl_dilution();
        input.stock_unit = ConcentrationUnit::MilligramPerMilliliter;
        let result = calculate(&input, &EngineConfig::default());
        assert!(!result.is_valid());
        assert_eq!(result.errors[0].field.as_deref(), Some("stock_unit"));
    }

    #[test]
    fn test_insufficient_dilution_warning() {
        let mut input = nacl_dilution();
        input.final_concentration = 3000.0; // factor 1.67
        let result = calculate(&input, &EngineConfig::default());
        assert!(result.is_valid());
        assert!(result
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::UnusualDilutionFactor));
    }

    #[test]
    fn test_pipetting_precision_warning() {
        let input = SimpleDilutionInput {
            label: "tiny".to_string(),
            stock_concentration: 1.0,
            stock_unit: ConcentrationUnit::Molar,
            final_concentration: 1.0,
            final_unit: ConcentrationUnit::Micromolar,
            final_volume: 10.0,
            volume_unit: VolumeUnit::Milliliter,
        };
        // V1 = 1e-6 × 0.01 / 1 = 1e-8 L = 10 nL
        let result = calculate(&input, &EngineConfig::default());
        assert!(result
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::SmallVolume && w.severity == Severity::Medium));
    }

    #[test]
    fn test_idempotence() {
        let input = nacl_dilution();
        let config = EngineConfig::default();
        assert_eq!(calculate(&input, &config), calculate(&input, &config));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let input = nacl_dilution();
        let json = serde_json::to_string(&input).unwrap();
        let roundtrip: SimpleDilutionInput = serde_json::from_str(&json).unwrap();
        assert_eq!(input, roundtrip);
    }
}
