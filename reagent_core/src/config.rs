//! # Engine Configuration
//!
//! A plain value passed by reference into every composer call. The engine
//! itself holds no settings: callers that want hot-reloadable settings
//! simply build a new `EngineConfig` and pass it on the next call, which
//! keeps concurrent use safe without any coordination.

use serde::{Deserialize, Serialize};

use crate::units::{ConcentrationUnit, VolumeUnit};

/// Caller-supplied engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Decimal places used in display strings (e.g. "3.00 mL" at 2)
    pub decimal_places: usize,

    /// Emit step-by-step narration in results
    pub show_calculation_steps: bool,

    /// Preferred volume unit before display optimization
    pub default_volume_unit: VolumeUnit,

    /// Preferred concentration unit for new inputs
    pub default_concentration_unit: ConcentrationUnit,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            decimal_places: 2,
            show_calculation_steps: false,
            default_volume_unit: VolumeUnit::Milliliter,
            default_concentration_unit: ConcentrationUnit::Millimolar,
        }
    }
}
