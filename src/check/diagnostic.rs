//! Diagnostic records.

use std::fmt;

use serde::Serialize;

use crate::stage::StageId;

/// How bad a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// The design cannot work as drawn
    Error,
    /// The design works but deserves a second look
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARNING"),
        }
    }
}

/// Taxonomy of findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // ============ Structural ============
    /// Feeds form a loop
    StructuralCycle,
    /// A stage is fed by more than one parent
    MultiParent,
    /// An edge leaves a load or enters a source
    InvalidEdge,
    /// A non-source stage has no feed
    UnpoweredStage,

    // ============ Electrical ============
    /// Actual input voltage outside the declared window
    VinOutOfRange,
    /// Output current above the rating
    IoutExceedsMax,
    /// Output current close to the rating
    IoutNearMax,
    /// Regulator output at or above its input
    InvalidConversion,
    /// LDO headroom below its dropout voltage
    DropoutMargin,
    /// Configured efficiency outside (0, 1]
    EfficiencyOutOfRange,
    /// Actual efficiency below the advisory threshold
    LowEfficiency,
    /// Operating point could not be computed
    ComputationUnresolved,
}

impl DiagnosticCode {
    /// Persisted / displayed name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StructuralCycle => "STRUCTURAL_CYCLE",
            Self::MultiParent => "MULTI_PARENT",
            Self::InvalidEdge => "INVALID_EDGE",
            Self::UnpoweredStage => "UNPOWERED_STAGE",
            Self::VinOutOfRange => "VIN_OUT_OF_RANGE",
            Self::IoutExceedsMax => "IOUT_EXCEEDS_MAX",
            Self::IoutNearMax => "IOUT_NEAR_MAX",
            Self::InvalidConversion => "INVALID_CONVERSION",
            Self::DropoutMargin => "DROPOUT_MARGIN",
            Self::EfficiencyOutOfRange => "EFFICIENCY_OUT_OF_RANGE",
            Self::LowEfficiency => "LOW_EFFICIENCY",
            Self::ComputationUnresolved => "COMPUTATION_UNRESOLVED",
        }
    }

    /// Whether the code describes topology rather than electrical state.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::StructuralCycle | Self::MultiParent | Self::InvalidEdge | Self::UnpoweredStage
        )
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding about the tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Offending stage, `None` for findings spanning several stages
    pub node_id: Option<StageId>,
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
}

impl Diagnostic {
    pub fn error(node_id: Option<StageId>, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            node_id,
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(
        node_id: Option<StageId>,
        code: DiagnosticCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            node_id,
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node_id {
            Some(id) => write!(f, "{} {} [{}]: {}", self.severity, self.code, id, self.message),
            None => write!(f, "{} {}: {}", self.severity, self.code, self.message),
        }
    }
}
