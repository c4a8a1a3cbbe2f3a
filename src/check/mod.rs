//! Design-rule checking.
//!
//! The checker reads a tree together with the state computed for it and
//! reports what is wrong, without re-deriving any electrical value.
//! Output order is fixed: structural findings first, then per-stage
//! findings in pre-order of the valid forest.
//!
//! | Code | Condition | Severity |
//! |------|-----------|----------|
//! | `STRUCTURAL_CYCLE` | feeds form a loop | ERROR |
//! | `MULTI_PARENT` | stage fed twice | ERROR |
//! | `INVALID_EDGE` | edge out of a load or into a source | ERROR |
//! | `UNPOWERED_STAGE` | non-source stage with no feed | ERROR |
//! | `VIN_OUT_OF_RANGE` | `vin` outside `[vin_min, vin_max]` | ERROR |
//! | `IOUT_EXCEEDS_MAX` | `iout > max_iout` | ERROR |
//! | `IOUT_NEAR_MAX` | `iout > headroom * max_iout` | WARNING |
//! | `INVALID_CONVERSION` | regulator `vout >= vin` | ERROR |
//! | `DROPOUT_MARGIN` | LDO `vin - vout < dropout` | WARNING |
//! | `EFFICIENCY_OUT_OF_RANGE` | DCDC efficiency outside (0, 1] | ERROR |
//! | `LOW_EFFICIENCY` | actual efficiency below threshold | WARNING |
//! | `COMPUTATION_UNRESOLVED` | operating point not computable | ERROR |

mod diagnostic;
mod rules;

pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use rules::{check, check_with_config};

pub(crate) use rules::check_with_topology;

/// Default advisory threshold for `LOW_EFFICIENCY`.
pub const DEFAULT_LOW_EFFICIENCY_THRESHOLD: f64 = 0.30;

/// Default fraction of `max_iout` above which `IOUT_NEAR_MAX` fires.
pub const DEFAULT_CURRENT_HEADROOM: f64 = 0.90;

/// Tunable thresholds for the advisory rules.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckConfig {
    /// Efficiency below which a regulator is flagged.
    pub low_efficiency_threshold: f64,
    /// Fraction of the current rating treated as "close to the limit".
    pub current_headroom: f64,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            low_efficiency_threshold: DEFAULT_LOW_EFFICIENCY_THRESHOLD,
            current_headroom: DEFAULT_CURRENT_HEADROOM,
        }
    }
}

impl CheckConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the low-efficiency advisory threshold (0 disables the rule).
    pub fn with_low_efficiency_threshold(mut self, threshold: f64) -> Self {
        self.low_efficiency_threshold = threshold;
        self
    }

    /// Set the current headroom ratio.
    ///
    /// A value of 1.0 or more disables `IOUT_NEAR_MAX`.
    pub fn with_current_headroom(mut self, headroom: f64) -> Self {
        self.current_headroom = headroom;
        self
    }
}
