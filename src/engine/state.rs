//! Computed electrical state.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::stage::StageId;

/// Why a stage's operating point could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnresolvedCause {
    /// The stage sits on a 0 V rail
    ZeroInputVoltage,
    /// A switching converter configured with zero efficiency
    ZeroEfficiency,
    /// Arithmetic produced NaN or an infinity
    NonFinite,
    /// A child's demand is unknown, so this stage's current is too
    DownstreamUnresolved { child: StageId },
}

impl fmt::Display for UnresolvedCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroInputVoltage => write!(f, "input rail is at 0 V"),
            Self::ZeroEfficiency => write!(f, "configured efficiency is 0"),
            Self::NonFinite => write!(f, "operating point is not finite"),
            Self::DownstreamUnresolved { child } => {
                write!(f, "demand of downstream stage '{child}' is unknown")
            }
        }
    }
}

/// Outcome of propagation for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "cause", rename_all = "snake_case")]
pub enum Resolution {
    /// Every applicable field was computed
    Resolved,
    /// Computation hit a degenerate operating point
    Unresolved(UnresolvedCause),
    /// Excluded from propagation by a structural error
    Blocked,
}

/// Electrical state of one stage after propagation.
///
/// Fields that do not apply to the stage kind (a load's `vout`, a source's
/// `iin`) or that could not be computed are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputedState {
    pub vin: Option<f64>,
    pub vout: Option<f64>,
    pub iin: Option<f64>,
    pub iout: Option<f64>,
    pub pin: Option<f64>,
    pub pout: Option<f64>,
    pub pdiss: Option<f64>,
    pub efficiency_actual: Option<f64>,
    pub resolution: Resolution,
}

impl ComputedState {
    pub(crate) fn blocked() -> Self {
        Self {
            vin: None,
            vout: None,
            iin: None,
            iout: None,
            pin: None,
            pout: None,
            pdiss: None,
            efficiency_actual: None,
            resolution: Resolution::Blocked,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution == Resolution::Resolved
    }

    pub fn is_blocked(&self) -> bool {
        self.resolution == Resolution::Blocked
    }

    /// Cause of an unresolved computation.
    pub fn unresolved_cause(&self) -> Option<&UnresolvedCause> {
        match &self.resolution {
            Resolution::Unresolved(cause) => Some(cause),
            _ => None,
        }
    }

    pub(crate) fn mark_unresolved(&mut self, cause: UnresolvedCause) {
        self.iin = None;
        self.pin = None;
        self.pdiss = None;
        self.efficiency_actual = None;
        self.resolution = Resolution::Unresolved(cause);
    }
}

/// Computed state of every stage, in tree insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ComputedStateMap(IndexMap<StageId, ComputedState>);

impl ComputedStateMap {
    pub fn get(&self, id: &StageId) -> Option<&ComputedState> {
        self.0.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &StageId) -> Option<&mut ComputedState> {
        self.0.get_mut(id)
    }

    pub(crate) fn insert(&mut self, id: StageId, state: ComputedState) {
        self.0.insert(id, state);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StageId, &ComputedState)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ids of stages whose computation could not complete.
    pub fn unresolved(&self) -> impl Iterator<Item = &StageId> {
        self.0
            .iter()
            .filter(|(_, s)| s.unresolved_cause().is_some())
            .map(|(id, _)| id)
    }
}

impl<'a> IntoIterator for &'a ComputedStateMap {
    type Item = (&'a StageId, &'a ComputedState);
    type IntoIter = indexmap::map::Iter<'a, StageId, ComputedState>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
