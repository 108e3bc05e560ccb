//! # Serial Dilution Planning
//!
//! Plans a chain of single dilutions from one stock down to a list of
//! target concentrations, where each step feeds the next. The targets are
//! the concentrations desired *at the cells*: adding a small aliquot of an
//! intermediate tube into a fixed cell-suspension volume dilutes it once
//! more, so the planner first remaps each target back to the concentration
//! required in the tube:
//!
//! ```text
//! required = target × (cell_volume + addition_volume) / addition_volume
//! ```
//!
//! Corrected targets are sorted descending — the chain may only dilute,
//! never concentrate — and walked once, carrying the running concentration
//! from step to step.
//!
//! ## Example
//!
//! ```rust
//! use reagent_core::calculations::serial::{SerialDilutionInput, calculate};
//! use reagent_core::config::EngineConfig;
//! use reagent_core::units::{ConcentrationUnit, VolumeUnit};
//!
//! let input = SerialDilutionInput {
//!     label: "Dose response".to_string(),
//!     stock_concentration: 50_000.0,
//!     concentration_unit: ConcentrationUnit::Micromolar,
//!     target_concentrations: vec![100.0, 10.0, 1.0, 0.1],
//!     cell_volume: 200.0,
//!     cell_volume_unit: VolumeUnit::Microliter,
//!     addition_volume: 2.0,
//!     addition_volume_unit: VolumeUnit::Microliter,
//!     dilution_volume: 200.0,
//!     dilution_volume_unit: VolumeUnit::Microliter,
//! };
//!
//! let result = calculate(&input, &EngineConfig::default());
//! assert_eq!(result.steps.len(), 4);
//! assert_eq!(result.summary.required_tubes, 5);
//! ```

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::results::{
    Severity, ValidationError, ValidationErrorKind, Warning, WarningKind,
};
use crate::units::{
    convert_molar, convert_volume, to_molarity, ConcentrationUnit, VolumeUnit,
};

/// Input parameters for a serial-dilution protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerialDilutionInput {
    /// User label for this protocol
    pub label: String,

    /// Concentration of the starting stock
    pub stock_concentration: f64,
    /// Unit for the stock, the targets and the step endpoints
    pub concentration_unit: ConcentrationUnit,

    /// Concentrations desired at the cells (not in the tube), in
    /// `concentration_unit`, in any order
    pub target_concentrations: Vec<f64>,

    /// Volume of cell suspension each aliquot is added into
    pub cell_volume: f64,
    pub cell_volume_unit: VolumeUnit,

    /// Aliquot volume transferred from a tube to the cells
    pub addition_volume: f64,
    pub addition_volume_unit: VolumeUnit,

    /// Working volume prepared in each dilution tube; also the display
    /// unit for step volumes
    pub dilution_volume: f64,
    pub dilution_volume_unit: VolumeUnit,
}

/// One step of the planned chain. Concentrations are in the caller's
/// concentration unit, volumes in the caller's dilution-volume unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerialDilutionStep {
    /// 1-based step number
    pub step_number: usize,
    pub from_concentration: f64,
    pub to_concentration: f64,
    pub concentration_unit: ConcentrationUnit,
    /// Volume taken from the stock (step 1) or the previous tube
    pub stock_volume: f64,
    pub solvent_volume: f64,
    pub total_volume: f64,
    pub volume_unit: VolumeUnit,
    /// from / to, always >= 1 for valid inputs
    pub dilution_factor: f64,
    /// Bench-ready narrative for this step
    pub description: String,
}

/// Roll-up numbers for the whole protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolSummary {
    pub total_steps: usize,
    /// Sum of the working volumes over all steps, in `volume_unit`
    pub total_volume: f64,
    pub volume_unit: VolumeUnit,
    pub highest_dilution_factor: f64,
    /// Coarse estimate at 3 minutes per step
    pub estimated_minutes: usize,
    /// `estimated_minutes` rendered as "45 min" or "1h 15min"
    pub estimated_time: String,
    /// One tube per step plus the stock tube
    pub required_tubes: usize,
}

/// Result of planning a serial-dilution protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerialDilutionResult {
    pub label: String,
    pub steps: Vec<SerialDilutionStep>,
    pub summary: ProtocolSummary,
    pub warnings: Vec<Warning>,
    pub errors: Vec<ValidationError>,
}

impl SerialDilutionResult {
    fn invalid(label: impl Into<String>, errors: Vec<ValidationError>) -> Self {
        SerialDilutionResult {
            label: label.into(),
            steps: Vec::new(),
            summary: ProtocolSummary {
                total_steps: 0,
                total_volume: 0.0,
                volume_unit: VolumeUnit::Milliliter,
                highest_dilution_factor: 0.0,
                estimated_minutes: 0,
                estimated_time: format_minutes(0),
                required_tubes: 0,
            },
            warnings: Vec::new(),
            errors,
        }
    }

    /// True when no blocking validation errors were recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Tabular export of the step list, one markdown row per step.
    ///
    /// Pure formatting: no arithmetic beyond what the steps already hold.
    pub fn to_table(&self, decimal_places: usize) -> String {
        let mut out = String::from(
            "| Step | From | To | Stock Volume | Solvent Volume | Dilution Factor |\n\
             | --- | --- | --- | --- | --- | --- |\n",
        );
        for step in &self.steps {
            let c = step.concentration_unit.symbol();
            let v = step.volume_unit.symbol();
            out.push_str(&format!(
                "| {} | {:.dp$} {c} | {:.dp$} {c} | {:.dp$} {v} | {:.dp$} {v} | {:.dp$} |\n",
                step.step_number,
                step.from_concentration,
                step.to_concentration,
                step.stock_volume,
                step.solvent_volume,
                step.dilution_factor,
                dp = decimal_places,
            ));
        }
        out
    }

    /// Numbered-list narrative of the protocol, one line per step.
    pub fn to_protocol_text(&self) -> String {
        let mut out = String::new();
        for step in &self.steps {
            out.push_str(&format!("{}. {}\n", step.step_number, step.description));
        }
        out.push_str(&format!(
            "Requires {} tubes, estimated time {}.\n",
            self.summary.required_tubes, self.summary.estimated_time
        ));
        out
    }
}

fn format_minutes(minutes: usize) -> String {
    if minutes > 60 {
        format!("{}h {}min", minutes / 60, minutes % 60)
    } else {
        format!("{minutes} min")
    }
}

fn validate(input: &SerialDilutionInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if !(input.stock_concentration.is_finite() && input.stock_concentration > 0.0) {
        errors.push(
            ValidationError::new(
                ValidationErrorKind::InvalidConcentration,
                format!(
                    "Stock concentration must be positive, got {}",
                    input.stock_concentration
                ),
            )
            .with_field("stock_concentration"),
        );
    }

    if to_molarity(1.0, input.concentration_unit, None).is_err() {
        errors.push(
            ValidationError::new(
                ValidationErrorKind::InvalidConcentration,
                format!(
                    "Serial dilutions require a molar-family unit, got {}",
                    input.concentration_unit.symbol()
                ),
            )
            .with_field("concentration_unit"),
        );
    }

    for (value, field) in [
        (input.cell_volume, "cell_volume"),
        (input.addition_volume, "addition_volume"),
        (input.dilution_volume, "dilution_volume"),
    ] {
        if !(value.is_finite() && value > 0.0) {
            errors.push(
                ValidationError::new(
                    ValidationErrorKind::InvalidVolume,
                    format!("Volume must be positive, got {value}"),
                )
                .with_field(field),
            );
        }
    }

    if input.target_concentrations.is_empty() {
        errors.push(
            ValidationError::new(
                ValidationErrorKind::MissingRequiredField,
                "At least one target concentration is required",
            )
            .with_field("target_concentrations"),
        );
    }
    for (i, target) in input.target_concentrations.iter().enumerate() {
        if !(target.is_finite() && *target > 0.0) {
            errors.push(
                ValidationError::new(
                    ValidationErrorKind::InvalidConcentration,
                    format!("Target concentration must be positive, got {target}"),
                )
                .with_field("target_concentrations")
                .at_component(i),
            );
        }
    }

    errors
}

/// Plan a serial-dilution protocol.
///
/// Like the other composers this never fails at the call site; blocking
/// problems come back in `errors` with an empty step list.
pub fn calculate(input: &SerialDilutionInput, config: &EngineConfig) -> SerialDilutionResult {
    let mut errors = validate(input);
    if !errors.is_empty() {
        return SerialDilutionResult::invalid(&input.label, errors);
    }

    let unit = input.concentration_unit;
    // validate() guarantees the unit is molar-family
    let stock_molar = to_molarity(input.stock_concentration, unit, None).unwrap_or_default();
    let cell_liters = convert_volume(input.cell_volume, input.cell_volume_unit, VolumeUnit::Liter);
    let addition_liters = convert_volume(
        input.addition_volume,
        input.addition_volume_unit,
        VolumeUnit::Liter,
    );
    let dilution_liters = convert_volume(
        input.dilution_volume,
        input.dilution_volume_unit,
        VolumeUnit::Liter,
    );

    // Cell-addition correction: the tube must be more concentrated than
    // the dose at the cells by the ratio of the receiving volume to the
    // aliquot.
    let correction = (cell_liters + addition_liters) / addition_liters;
    let mut required: Vec<f64> = Vec::with_capacity(input.target_concentrations.len());
    for (i, target) in input.target_concentrations.iter().enumerate() {
        let target_molar = to_molarity(*target, unit, None).unwrap_or_default();
        let required_molar = target_molar * correction;
        if required_molar >= stock_molar {
            errors.push(
                ValidationError::new(
                    ValidationErrorKind::InvalidConcentration,
                    format!(
                        "Target {target} {} needs {:.4} {} in the tube, which is not below the stock",
                        unit.symbol(),
                        convert_molar(required_molar, ConcentrationUnit::Molar, unit)
                            .unwrap_or(required_molar),
                        unit.symbol()
                    ),
                )
                .with_field("target_concentrations")
                .at_component(i),
            );
        }
        required.push(required_molar);
    }
    if !errors.is_empty() {
        return SerialDilutionResult::invalid(&input.label, errors);
    }

    // Descending chain; exact duplicates would be factor-1.0 steps, so
    // collapse them.
    required.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    required.dedup();

    let mut steps = Vec::with_capacity(required.len());
    let mut warnings = Vec::new();
    let mut current_molar = stock_molar;
    let mut highest_factor = 0.0f64;

    for (i, target_molar) in required.iter().enumerate() {
        let factor = current_molar / target_molar;
        let stock_needed_liters = dilution_liters / factor;
        let solvent_liters = dilution_liters - stock_needed_liters;

        let from = convert_molar(current_molar, ConcentrationUnit::Molar, unit)
            .unwrap_or(current_molar);
        let to = convert_molar(*target_molar, ConcentrationUnit::Molar, unit)
            .unwrap_or(*target_molar);
        let stock_volume = convert_volume(
            stock_needed_liters,
            VolumeUnit::Liter,
            input.dilution_volume_unit,
        );
        let solvent_volume = convert_volume(
            solvent_liters,
            VolumeUnit::Liter,
            input.dilution_volume_unit,
        );

        let source = if i == 0 {
            "the stock".to_string()
        } else {
            format!("tube {i}")
        };
        let dp = config.decimal_places;
        let description = format!(
            "Mix {:.dp$} {v} of {source} with {:.dp$} {v} of solvent for {:.dp$} {c} (1:{factor:.1} dilution)",
            stock_volume,
            solvent_volume,
            to,
            v = input.dilution_volume_unit.symbol(),
            c = unit.symbol(),
        );

        let stock_microliters =
            convert_volume(stock_needed_liters, VolumeUnit::Liter, VolumeUnit::Microliter);
        if stock_microliters < 1.0 {
            warnings.push(
                Warning::new(
                    WarningKind::SmallVolume,
                    Severity::High,
                    format!(
                        "Step {}: {stock_microliters:.2} µL cannot be pipetted reliably; add an intermediate dilution",
                        i + 1
                    ),
                )
                .at_component(i),
            );
        }
        if factor > 1000.0 {
            warnings.push(
                Warning::new(
                    WarningKind::UnusualDilutionFactor,
                    Severity::Medium,
                    format!("Step {}: dilution factor {factor:.0} exceeds 1000", i + 1),
                )
                .at_component(i),
            );
        }

        highest_factor = highest_factor.max(factor);
        steps.push(SerialDilutionStep {
            step_number: i + 1,
            from_concentration: from,
            to_concentration: to,
            concentration_unit: unit,
            stock_volume,
            solvent_volume,
            total_volume: input.dilution_volume,
            volume_unit: input.dilution_volume_unit,
            dilution_factor: factor,
            description,
        });
        current_molar = *target_molar;
    }

    let total_steps = steps.len();
    let estimated_minutes = total_steps * 3;
    let summary = ProtocolSummary {
        total_steps,
        total_volume: input.dilution_volume * total_steps as f64,
        volume_unit: input.dilution_volume_unit,
        highest_dilution_factor: highest_factor,
        estimated_minutes,
        estimated_time: format_minutes(estimated_minutes),
        required_tubes: total_steps + 1,
    };

    SerialDilutionResult {
        label: input.label.clone(),
        steps,
        summary,
        warnings,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dose_response() -> SerialDilutionInput {
        SerialDilutionInput {
            label: "Dose response".to_string(),
            stock_concentration: 50_000.0,
            concentration_unit: ConcentrationUnit::Micromolar,
            target_concentrations: vec![100.0, 10.0, 1.0, 0.1],
            cell_volume: 200.0,
            cell_volume_unit: VolumeUnit::Microliter,
            addition_volume: 2.0,
            addition_volume_unit: VolumeUnit::Microliter,
            dilution_volume: 200.0,
            dilution_volume_unit: VolumeUnit::Microliter,
        }
    }

    #[test]
    fn test_chain_invariant() {
        let result = calculate(&dose_response(), &EngineConfig::default());
        assert!(result.is_valid());
        assert_eq!(result.steps.len(), 4);
        assert_eq!(result.summary.required_tubes, 5);

        for pair in result.steps.windows(2) {
            // Strictly descending...
            assert!(pair[1].to_concentration < pair[0].to_concentration);
            // ...and chained: step k's output is step k+1's input.
            assert!(
                (pair[1].from_concentration - pair[0].to_concentration).abs()
                    < 1e-9 * pair[0].to_concentration
            );
        }
        assert!((result.steps[0].from_concentration - 50_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_cell_addition_correction() {
        let result = calculate(&dose_response(), &EngineConfig::default());
        // (200 + 2) / 2 = 101x correction: a 100 µM dose needs 10100 µM in
        // the tube.
        assert!((result.steps[0].to_concentration - 10_100.0).abs() < 1e-6);
        assert!((result.steps[3].to_concentration - 10.1).abs() < 1e-9);
    }

    #[test]
    fn test_unsorted_targets_are_sorted_descending() {
        let mut input = dose_response();
        input.target_concentrations = vec![1.0, 100.0, 0.1, 10.0];
        let sorted = calculate(&dose_response(), &EngineConfig::default());
        let shuffled = calculate(&input, &EngineConfig::default());
        assert_eq!(sorted.steps, shuffled.steps);
    }

    #[test]
    fn test_duplicate_targets_collapse() {
        let mut input = dose_response();
        input.target_concentrations = vec![10.0, 10.0, 1.0];
        let result = calculate(&input, &EngineConfig::default());
        assert_eq!(result.steps.len(), 2);
        assert!(result
            .steps
            .iter()
            .all(|s| s.dilution_factor > 1.0));
    }

    #[test]
    fn test_step_volumes() {
        let result = calculate(&dose_response(), &EngineConfig::default());
        for step in &result.steps {
            assert_eq!(step.volume_unit, VolumeUnit::Microliter);
            assert!(
                (step.stock_volume + step.solvent_volume - step.total_volume).abs() < 1e-9
            );
            // Moles are conserved within each tube
            let made = step.to_concentration * step.total_volume;
            let taken = step.from_concentration * step.stock_volume;
            assert!((made - taken).abs() < 1e-6 * made);
        }
        // Step 2 onward dilute 10x in 200 µL: 20 µL + 180 µL
        assert!((result.steps[1].stock_volume - 20.0).abs() < 1e-9);
        assert!((result.steps[1].solvent_volume - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary() {
        let result = calculate(&dose_response(), &EngineConfig::default());
        let summary = &result.summary;
        assert_eq!(summary.total_steps, 4);
        assert!((summary.total_volume - 800.0).abs() < 1e-9);
        assert_eq!(summary.estimated_minutes, 12);
        assert_eq!(summary.estimated_time, "12 min");
        // First hop is the largest: 50000 / 10100
        assert!((summary.highest_dilution_factor - 50_000.0 / 10_100.0).abs() < 1e-9);
    }

    #[test]
    fn test_time_formatting_above_one_hour() {
        assert_eq!(format_minutes(12), "12 min");
        assert_eq!(format_minutes(60), "60 min");
        assert_eq!(format_minutes(75), "1h 15min");
        assert_eq!(format_minutes(126), "2h 6min");
    }

    #[test]
    fn test_target_above_stock_rejected() {
        let mut input = dose_response();
        // 600 µM at the cells needs 60600 µM in the tube, above the stock
        input.target_concentrations = vec![600.0, 10.0];
        let result = calculate(&input, &EngineConfig::default());
        assert!(!result.is_valid());
        assert!(result.steps.is_empty());
        assert_eq!(result.errors[0].component_index, Some(0));
    }

    #[test]
    fn test_validation_accumulates() {
        let input = SerialDilutionInput {
            label: "bad".to_string(),
            stock_concentration: 0.0,
            concentration_unit: ConcentrationUnit::PartsPerMillion,
            target_concentrations: vec![],
            cell_volume: -1.0,
            cell_volume_unit: VolumeUnit::Microliter,
            addition_volume: 2.0,
            addition_volume_unit: VolumeUnit::Microliter,
            dilution_volume: 0.0,
            dilution_volume_unit: VolumeUnit::Microliter,
        };
        let result = calculate(&input, &EngineConfig::default());
        // stock, unit family, cell volume, dilution volume, empty targets
        assert_eq!(result.errors.len(), 5);
    }

    #[test]
    fn test_sub_microliter_step_warns_high() {
        let mut input = dose_response();
        // One huge hop: 50000 µM straight to 1.01 µM in the tube needs
        // 0.004 µL of stock.
        input.target_concentrations = vec![0.01];
        let result = calculate(&input, &EngineConfig::default());
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(
            |w| w.kind == WarningKind::SmallVolume && w.severity == Severity::High
        ));
        assert!(result
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::UnusualDilutionFactor));
    }

    #[test]
    fn test_table_export() {
        let result = calculate(&dose_response(), &EngineConfig::default());
        let table = result.to_table(2);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(
            lines[0],
            "| Step | From | To | Stock Volume | Solvent Volume | Dilution Factor |"
        );
        assert_eq!(lines.len(), 2 + 4); // header + divider + 4 steps
        assert!(lines[3].starts_with("| 2 | 10100.00 µM | 1010.00 µM | 20.00 µL | 180.00 µL |"));
    }

    #[test]
    fn test_protocol_text_export() {
        let result = calculate(&dose_response(), &EngineConfig::default());
        let text = result.to_protocol_text();
        assert!(text.starts_with("1. Mix "));
        assert!(text.contains("4. Mix "));
        assert!(text.contains("Requires 5 tubes"));
        // Exporters are deterministic
        assert_eq!(text, result.to_protocol_text());
    }

    #[test]
    fn test_idempotence() {
        let input = dose_response();
        let config = EngineConfig::default();
        assert_eq!(calculate(&input, &config), calculate(&input, &config));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let input = dose_response();
        let json = serde_json::to_string_pretty(&input).unwrap();
        let roundtrip: SerialDilutionInput = serde_json::from_str(&json).unwrap();
        assert_eq!(input, roundtrip);

        let result = calculate(&input, &EngineConfig::default());
        let json = serde_json::to_string_pretty(&result).unwrap();
        let roundtrip: SerialDilutionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, roundtrip);
    }
}
