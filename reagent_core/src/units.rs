//! # Unit Types & Conversion
//!
//! Closed unit families for laboratory quantities. Each family is a small
//! enum whose variants carry a conversion factor relative to one canonical
//! base unit, so conversion is a total function rather than a table lookup
//! that can miss.
//!
//! ## Design Philosophy
//!
//! We use closed enums rather than a full units library because:
//! - Bench work uses a fixed, small set of units
//! - JSON serialization stays clean (just a tag string)
//! - A conversion can never silently return the wrong value for an
//!   unlisted unit
//!
//! ## Canonical bases
//!
//! - Volume: liter (L)
//! - Mass: gram (g)
//! - Concentration: molar (M) — only the molar family converts without
//!   extra data; mass-based representations need a molecular weight
//!
//! ## Example
//!
//! ```rust
//! use reagent_core::units::{VolumeUnit, convert_volume};
//!
//! let ml = convert_volume(0.003, VolumeUnit::Liter, VolumeUnit::Milliliter);
//! assert_eq!(ml, 3.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::ConversionError;

// ============================================================================
// Volume Units
// ============================================================================

/// Volume units, canonical base = liter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeUnit {
    Liter,
    Milliliter,
    Microliter,
    Nanoliter,
}

impl VolumeUnit {
    /// Amount of this unit per 1 liter (value_in_unit = liters * factor).
    pub fn factor(self) -> f64 {
        match self {
            VolumeUnit::Liter => 1.0,
            VolumeUnit::Milliliter => 1e3,
            VolumeUnit::Microliter => 1e6,
            VolumeUnit::Nanoliter => 1e9,
        }
    }

    /// Display symbol (e.g. "mL").
    pub fn symbol(self) -> &'static str {
        match self {
            VolumeUnit::Liter => "L",
            VolumeUnit::Milliliter => "mL",
            VolumeUnit::Microliter => "µL",
            VolumeUnit::Nanoliter => "nL",
        }
    }

    /// All volume units from largest to smallest.
    pub fn descending() -> [VolumeUnit; 4] {
        [
            VolumeUnit::Liter,
            VolumeUnit::Milliliter,
            VolumeUnit::Microliter,
            VolumeUnit::Nanoliter,
        ]
    }
}

// ============================================================================
// Mass Units
// ============================================================================

/// Mass units, canonical base = gram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MassUnit {
    Gram,
    Milligram,
    Microgram,
    Nanogram,
}

impl MassUnit {
    /// Amount of this unit per 1 gram.
    pub fn factor(self) -> f64 {
        match self {
            MassUnit::Gram => 1.0,
            MassUnit::Milligram => 1e3,
            MassUnit::Microgram => 1e6,
            MassUnit::Nanogram => 1e9,
        }
    }

    /// Display symbol (e.g. "mg").
    pub fn symbol(self) -> &'static str {
        match self {
            MassUnit::Gram => "g",
            MassUnit::Milligram => "mg",
            MassUnit::Microgram => "µg",
            MassUnit::Nanogram => "ng",
        }
    }

    /// All mass units from largest to smallest.
    pub fn descending() -> [MassUnit; 4] {
        [
            MassUnit::Gram,
            MassUnit::Milligram,
            MassUnit::Microgram,
            MassUnit::Nanogram,
        ]
    }
}

// ============================================================================
// Concentration Units
// ============================================================================

/// Concentration units.
///
/// Only the molar family (M, mM, µM, nM) is directly interconvertible.
/// Mass-per-volume representations (mg/mL, µg/mL, %w/v, ppm, ppb) convert
/// to molarity only when a molecular weight is supplied; %w/w and %v/v
/// would additionally need a solution density the engine does not model
/// and are never converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcentrationUnit {
    Molar,
    Millimolar,
    Micromolar,
    Nanomolar,
    PercentWeightVolume,
    PercentWeightWeight,
    PercentVolumeVolume,
    MilligramPerMilliliter,
    MicrogramPerMilliliter,
    PartsPerMillion,
    PartsPerBillion,
}

impl ConcentrationUnit {
    /// True for units in the molar family (directly interconvertible).
    pub fn is_molar(self) -> bool {
        matches!(
            self,
            ConcentrationUnit::Molar
                | ConcentrationUnit::Millimolar
                | ConcentrationUnit::Micromolar
                | ConcentrationUnit::Nanomolar
        )
    }

    /// Amount of this unit per 1 molar. Only meaningful for the molar
    /// family; non-molar units return `None`.
    pub fn molar_factor(self) -> Option<f64> {
        match self {
            ConcentrationUnit::Molar => Some(1.0),
            ConcentrationUnit::Millimolar => Some(1e3),
            ConcentrationUnit::Micromolar => Some(1e6),
            ConcentrationUnit::Nanomolar => Some(1e9),
            _ => None,
        }
    }

    /// Display symbol (e.g. "mM", "%w/v").
    pub fn symbol(self) -> &'static str {
        match self {
            ConcentrationUnit::Molar => "M",
            ConcentrationUnit::Millimolar => "mM",
            ConcentrationUnit::Micromolar => "µM",
            ConcentrationUnit::Nanomolar => "nM",
            ConcentrationUnit::PercentWeightVolume => "%w/v",
            ConcentrationUnit::PercentWeightWeight => "%w/w",
            ConcentrationUnit::PercentVolumeVolume => "%v/v",
            ConcentrationUnit::MilligramPerMilliliter => "mg/mL",
            ConcentrationUnit::MicrogramPerMilliliter => "µg/mL",
            ConcentrationUnit::PartsPerMillion => "ppm",
            ConcentrationUnit::PartsPerBillion => "ppb",
        }
    }

    /// Grams of solute per liter represented by 1 of this unit, for
    /// mass-per-volume representations. ppm/ppb are read as mg/L and µg/L
    /// (dilute aqueous convention).
    fn grams_per_liter(self) -> Option<f64> {
        match self {
            ConcentrationUnit::MilligramPerMilliliter => Some(1.0), // mg/mL == g/L
            ConcentrationUnit::MicrogramPerMilliliter => Some(1e-3), // µg/mL == mg/L
            ConcentrationUnit::PercentWeightVolume => Some(10.0),  // g/100mL == 10 g/L
            ConcentrationUnit::PartsPerMillion => Some(1e-3),
            ConcentrationUnit::PartsPerBillion => Some(1e-6),
            _ => None,
        }
    }
}

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert a volume between units, normalizing through liters.
///
/// The identity conversion short-circuits so `convert_volume(x, u, u) == x`
/// exactly, not just up to rounding.
pub fn convert_volume(value: f64, from: VolumeUnit, to: VolumeUnit) -> f64 {
    if from == to {
        return value;
    }
    value / from.factor() * to.factor()
}

/// Convert a mass between units, normalizing through grams.
pub fn convert_mass(value: f64, from: MassUnit, to: MassUnit) -> f64 {
    if from == to {
        return value;
    }
    value / from.factor() * to.factor()
}

/// Convert a concentration within the molar family, normalizing through
/// molar. Fails with [`ConversionError::UnsupportedConversion`] if either
/// unit is outside the family — there is no silent pass-through.
pub fn convert_molar(
    value: f64,
    from: ConcentrationUnit,
    to: ConcentrationUnit,
) -> Result<f64, ConversionError> {
    if from == to && from.is_molar() {
        return Ok(value);
    }
    match (from.molar_factor(), to.molar_factor()) {
        (Some(f), Some(t)) => Ok(value / f * t),
        _ => Err(ConversionError::unsupported(from, to)),
    }
}

/// Express a concentration as molarity (mol/L).
///
/// Molar-family units convert directly. Mass-per-volume units (mg/mL,
/// µg/mL, %w/v, ppm, ppb) require `molecular_weight` in g/mol and fail
/// with [`ConversionError::MissingMolecularWeight`] without one. %w/w and
/// %v/v always fail with [`ConversionError::UnsupportedConversion`].
pub fn to_molarity(
    value: f64,
    unit: ConcentrationUnit,
    molecular_weight: Option<f64>,
) -> Result<f64, ConversionError> {
    if let Some(factor) = unit.molar_factor() {
        return Ok(value / factor);
    }
    match unit.grams_per_liter() {
        Some(g_per_l) => match molecular_weight {
            Some(mw) if mw > 0.0 => Ok(value * g_per_l / mw),
            _ => Err(ConversionError::missing_molecular_weight(unit)),
        },
        None => Err(ConversionError::unsupported(unit, ConcentrationUnit::Molar)),
    }
}
