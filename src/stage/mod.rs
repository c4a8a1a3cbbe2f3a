//! Stage models for power tree computation.
//!
//! This module provides the typed stages a power tree is assembled from:
//! - Source: fixed supply rail, always a root
//! - LDO: linear regulator, input current equals output current plus bias
//! - DCDC: switching converter, input power scaled by efficiency
//! - Load: terminal consumer drawing a fixed current or a fixed power
//!
//! Each regulator model owns its conversion equations; the propagation
//! engine only decides the order in which they run.

mod load;
mod regulator;
mod source;
mod types;

pub use load::{LoadDemand, LoadParams};
pub use regulator::{DcdcParams, LdoParams};
pub use source::SourceParams;
pub use types::{StageId, StageInfo, StageType};

use crate::engine::UnresolvedCause;

/// Upper bound used when a stage declares no input voltage limit.
pub const UNLIMITED_VOLTAGE: f64 = f64::MAX;

/// Per-kind parameter set of a stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageKind {
    Source(SourceParams),
    Ldo(LdoParams),
    Dcdc(DcdcParams),
    Load(LoadParams),
}

impl StageKind {
    /// Get the type tag.
    pub fn stage_type(&self) -> StageType {
        match self {
            StageKind::Source(_) => StageType::Source,
            StageKind::Ldo(_) => StageType::Ldo,
            StageKind::Dcdc(_) => StageType::Dcdc,
            StageKind::Load(_) => StageType::Load,
        }
    }

    /// Configured output voltage. Loads have no output rail.
    pub fn vout(&self) -> Option<f64> {
        match self {
            StageKind::Source(s) => Some(s.vout),
            StageKind::Ldo(l) => Some(l.vout),
            StageKind::Dcdc(d) => Some(d.vout),
            StageKind::Load(_) => None,
        }
    }

    /// Rated output current.
    pub fn max_iout(&self) -> Option<f64> {
        match self {
            StageKind::Source(s) => Some(s.max_iout),
            StageKind::Ldo(l) => Some(l.max_iout),
            StageKind::Dcdc(d) => Some(d.max_iout),
            StageKind::Load(_) => None,
        }
    }

    /// Declared input voltage window `(vin_min, vin_max)`.
    /// Sources have no input.
    pub fn input_range(&self) -> Option<(f64, f64)> {
        match self {
            StageKind::Source(_) => None,
            StageKind::Ldo(l) => Some((l.vin_min, l.vin_max)),
            StageKind::Dcdc(d) => Some((d.vin_min, d.vin_max)),
            StageKind::Load(l) => Some((l.vin_min, l.vin_max)),
        }
    }

    /// Whether the stage has an output rail other stages can hang off.
    pub fn has_output(&self) -> bool {
        !matches!(self, StageKind::Load(_))
    }

    /// Whether the stage can be fed by a parent.
    pub fn has_input(&self) -> bool {
        !matches!(self, StageKind::Source(_))
    }
}

/// A stage in the power tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub id: StageId,
    pub info: StageInfo,
    pub kind: StageKind,
}

impl Stage {
    /// Create a stage with empty metadata.
    pub fn new(id: impl Into<StageId>, kind: StageKind) -> Self {
        Self {
            id: id.into(),
            info: StageInfo::default(),
            kind,
        }
    }

    pub fn source(id: impl Into<StageId>, params: SourceParams) -> Self {
        Self::new(id, StageKind::Source(params))
    }

    pub fn ldo(id: impl Into<StageId>, params: LdoParams) -> Self {
        Self::new(id, StageKind::Ldo(params))
    }

    pub fn dcdc(id: impl Into<StageId>, params: DcdcParams) -> Self {
        Self::new(id, StageKind::Dcdc(params))
    }

    pub fn load(id: impl Into<StageId>, params: LoadParams) -> Self {
        Self::new(id, StageKind::Load(params))
    }

    /// Attach metadata.
    pub fn with_info(mut self, info: StageInfo) -> Self {
        self.info = info;
        self
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.info.name = Some(name.into());
        self
    }

    /// Get the type tag.
    pub fn stage_type(&self) -> StageType {
        self.kind.stage_type()
    }

    /// Display name, falling back to the id.
    pub fn label(&self) -> &str {
        self.info.name.as_deref().unwrap_or(self.id.as_str())
    }
}

/// Electrical result of running a regulator at a given operating point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    /// Current drawn from the parent rail
    pub iin: f64,
    /// Power drawn from the parent rail
    pub pin: f64,
    /// Power delivered on the output rail
    pub pout: f64,
    /// Power lost in the regulator
    pub pdiss: f64,
    /// `pout / pin`, absent for an idle regulator
    pub efficiency: Option<f64>,
}

/// Reject NaN and infinities produced by a degenerate operating point.
pub(crate) fn finite(value: f64) -> Result<f64, UnresolvedCause> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(UnresolvedCause::NonFinite)
    }
}
