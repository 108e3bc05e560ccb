//! # Display-Unit Optimization
//!
//! Picks the unit that renders a quantity in a human-friendly 1-1000
//! magnitude range ("3.00 mL" rather than "0.003 L"). Shared by every
//! composer. Walking the candidate units from largest to smallest keeps
//! the rule a single pass:
//!
//! - L takes anything >= 1
//! - mL and µL take [1, 1000)
//! - nL takes [0, 1000)
//! - anything else (negative, non-finite) falls back to the caller's unit

use crate::units::{convert_mass, convert_volume, MassUnit, VolumeUnit};

/// Choose the best display unit for a volume.
pub fn optimize_volume(value: f64, unit: VolumeUnit) -> (f64, VolumeUnit) {
    if !value.is_finite() {
        return (value, unit);
    }
    let liters = convert_volume(value, unit, VolumeUnit::Liter);
    let candidates = VolumeUnit::descending();
    for (i, candidate) in candidates.iter().enumerate() {
        let in_unit = convert_volume(liters, VolumeUnit::Liter, *candidate);
        let matched = if i == 0 {
            in_unit >= 1.0
        } else if i == candidates.len() - 1 {
            (0.0..1000.0).contains(&in_unit)
        } else {
            (1.0..1000.0).contains(&in_unit)
        };
        if matched {
            return (in_unit, *candidate);
        }
    }
    (value, unit)
}

/// Choose the best display unit for a mass, analogous thresholds starting
/// at grams.
pub fn optimize_mass(value: f64, unit: MassUnit) -> (f64, MassUnit) {
    if !value.is_finite() {
        return (value, unit);
    }
    let grams = convert_mass(value, unit, MassUnit::Gram);
    let candidates = MassUnit::descending();
    for (i, candidate) in candidates.iter().enumerate() {
        let in_unit = convert_mass(grams, MassUnit::Gram, *candidate);
        let matched = if i == 0 {
            in_unit >= 1.0
        } else if i == candidates.len() - 1 {
            (0.0..1000.0).contains(&in_unit)
        } else {
            (1.0..1000.0).contains(&in_unit)
        };
        if matched {
            return (in_unit, *candidate);
        }
    }
    (value, unit)
}

/// Format a volume as "3.00 mL" with the configured decimal count.
pub fn format_volume(value: f64, unit: VolumeUnit, decimal_places: usize) -> String {
    format!("{:.*} {}", decimal_places, value, unit.symbol())
}

/// Format a mass as "58.44 mg".
pub fn format_mass(value: f64, unit: MassUnit, decimal_places: usize) -> String {
    format!("{:.*} {}", decimal_places, value, unit.symbol())
}

/// Format a concentration as "150.00 mM".
pub fn format_concentration(
    value: f64,
    unit: crate::units::ConcentrationUnit,
    decimal_places: usize,
) -> String {
    format!("{:.*} {}", decimal_places, value, unit.symbol())
}
