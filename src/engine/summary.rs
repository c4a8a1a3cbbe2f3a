//! Per-source power totals.

use serde::Serialize;

use super::state::ComputedStateMap;
use crate::stage::{StageId, StageKind};
use crate::tree::{PowerTree, Topology};

/// Power budget of the subtree hanging off one source.
///
/// Totals are `None` when any stage in the subtree is unresolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerSummary {
    pub source: StageId,
    /// Power leaving the source
    pub source_power: Option<f64>,
    /// Power consumed by loads
    pub load_power: Option<f64>,
    /// Power burnt in regulators
    pub dissipation: Option<f64>,
    /// `load_power / source_power`
    pub efficiency: Option<f64>,
    /// Number of loads in the subtree
    pub loads: usize,
    /// Longest series chain, source included
    pub depth: usize,
}

/// Summarize every source of `tree` from an existing propagation result.
pub fn summarize(tree: &PowerTree, states: &ComputedStateMap) -> Vec<PowerSummary> {
    summarize_with(tree, &Topology::analyze(tree), states)
}

pub(crate) fn summarize_with(
    tree: &PowerTree,
    topology: &Topology,
    states: &ComputedStateMap,
) -> Vec<PowerSummary> {
    topology
        .roots()
        .iter()
        .map(|root| summarize_root(tree, topology, states, root))
        .collect()
}

fn summarize_root(
    tree: &PowerTree,
    topology: &Topology,
    states: &ComputedStateMap,
    root: &StageId,
) -> PowerSummary {
    let mut loads = 0;
    let mut depth = 0;
    let mut complete = true;
    let mut load_power = 0.0;
    let mut dissipation = 0.0;

    let mut stack = vec![(root, 1usize)];
    while let Some((id, level)) = stack.pop() {
        depth = depth.max(level);
        stack.extend(topology.children(id).iter().map(|c| (c, level + 1)));

        let (Some(stage), Some(state)) = (tree.stage(id), states.get(id)) else {
            complete = false;
            continue;
        };
        complete &= state.is_resolved();
        match stage.kind {
            StageKind::Load(_) => {
                loads += 1;
                load_power += state.pin.unwrap_or(0.0);
            }
            StageKind::Ldo(_) | StageKind::Dcdc(_) => {
                dissipation += state.pdiss.unwrap_or(0.0);
            }
            StageKind::Source(_) => {}
        }
    }

    let source_power = states.get(root).and_then(|s| s.pout).filter(|_| complete);
    let efficiency = source_power
        .filter(|p| *p > 0.0)
        .map(|p| load_power / p);
    PowerSummary {
        source: root.clone(),
        source_power,
        load_power: complete.then_some(load_power),
        dissipation: complete.then_some(dissipation),
        efficiency,
        loads,
        depth,
    }
}
