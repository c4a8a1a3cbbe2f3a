//! Operating point propagation engine.
//!
//! The engine turns a [`PowerTree`] into the electrical state of every
//! stage in two passes over the valid forest:
//!
//! 1. **Voltages, pre-order.** A source drives its configured `vout`; every
//!    other stage takes `vin` from its parent's `vout` and regulators drive
//!    their own configured `vout`.
//! 2. **Currents, post-order.** A load's demand is its fixed current or
//!    `power / vin`. Each regulator sums its children's demands into `iout`
//!    and converts it into its own input current, which becomes the demand
//!    on its parent.
//!
//! ```text
//!   SOURCE 12V ──► LDO 5V ──► LOAD 0.5A
//!        ◄─ 0.501A ◄── 0.5A + iq
//! ```
//!
//! Every run starts from scratch; nothing is cached between calls.

mod propagate;
mod state;
mod summary;

pub use propagate::propagate;
pub use state::{ComputedState, ComputedStateMap, Resolution, UnresolvedCause};
pub use summary::{summarize, PowerSummary};

use serde::Serialize;
use tracing::debug;

use crate::check::{self, CheckConfig, Diagnostic, Severity};
use crate::tree::{PowerTree, Topology};

/// Everything the editor needs after an edit: states, diagnostics and
/// per-source totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub states: ComputedStateMap,
    pub diagnostics: Vec<Diagnostic>,
    pub summaries: Vec<PowerSummary>,
}

impl Evaluation {
    /// Whether any ERROR diagnostic was raised.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }
}

/// Propagate and check `tree` with the default rule configuration.
pub fn evaluate(tree: &PowerTree) -> Evaluation {
    evaluate_with_config(tree, &CheckConfig::default())
}

/// Propagate and check `tree`.
pub fn evaluate_with_config(tree: &PowerTree, config: &CheckConfig) -> Evaluation {
    let topology = Topology::analyze(tree);
    let states = propagate::propagate_with(tree, &topology);
    let diagnostics = check::check_with_topology(tree, &topology, &states, config);
    let summaries = summary::summarize_with(tree, &topology, &states);
    debug!(
        stages = states.len(),
        diagnostics = diagnostics.len(),
        "evaluation complete"
    );
    Evaluation {
        states,
        diagnostics,
        summaries,
    }
}
