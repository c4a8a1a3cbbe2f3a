//! Two-pass operating point propagation.

use tracing::{debug, trace, warn};

use super::state::{ComputedState, ComputedStateMap, Resolution, UnresolvedCause};
use crate::stage::{finite, Conversion, StageId, StageKind};
use crate::tree::{PowerTree, Topology};

/// Compute the operating point of every stage in `tree`.
///
/// This is a pure function of the tree: no state survives between calls and
/// the same tree always produces the same map. Stages cut off by structural
/// errors come back [`Resolution::Blocked`]; their siblings still compute.
pub fn propagate(tree: &PowerTree) -> ComputedStateMap {
    let topology = Topology::analyze(tree);
    propagate_with(tree, &topology)
}

/// Propagate over an already analyzed topology.
pub(crate) fn propagate_with(tree: &PowerTree, topology: &Topology) -> ComputedStateMap {
    debug!(stages = tree.len(), "propagating operating points");

    let mut states = ComputedStateMap::default();
    for stage in tree.stages() {
        states.insert(stage.id.clone(), ComputedState::blocked());
    }

    propagate_voltages(tree, topology, &mut states);
    propagate_currents(tree, topology, &mut states);

    for id in states.unresolved() {
        warn!(stage = %id, "operating point unresolved");
    }
    states
}

/// Phase 1, parents before children: fix every rail voltage.
fn propagate_voltages(tree: &PowerTree, topology: &Topology, states: &mut ComputedStateMap) {
    for id in topology.preorder() {
        let Some(stage) = tree.stage(&id) else {
            continue;
        };

        let vin = match &stage.kind {
            StageKind::Source(_) => None,
            _ => {
                let parent_vout = topology
                    .parent(&id)
                    .and_then(|p| states.get(p))
                    .and_then(|p| p.vout);
                match parent_vout {
                    Some(v) => Some(v),
                    // parent never got a rail; leave this stage blocked
                    None => continue,
                }
            }
        };

        if let Some(state) = states.get_mut(&id) {
            state.vin = vin;
            state.vout = stage.kind.vout();
            state.resolution = Resolution::Resolved;
        }
    }
}

/// Phase 2, children before parents: sum demands and convert them upward.
fn propagate_currents(tree: &PowerTree, topology: &Topology, states: &mut ComputedStateMap) {
    for id in topology.postorder() {
        let Some(stage) = tree.stage(&id) else {
            continue;
        };
        let Some(current) = states.get(&id) else {
            continue;
        };
        if current.is_blocked() {
            continue;
        }
        let vin = current.vin;
        let vout = current.vout;

        let mut update = current.clone();
        match (&stage.kind, children_demand(topology, states, &id)) {
            (StageKind::Load(params), _) => {
                update.iout = Some(0.0);
                let vin = vin.unwrap_or(0.0);
                match params
                    .demand
                    .current_at(vin)
                    .and_then(|iin| finite(vin * iin).map(|pin| (iin, pin)))
                {
                    Ok((iin, pin)) => {
                        update.iin = Some(iin);
                        update.pin = Some(pin);
                    }
                    Err(cause) => update.mark_unresolved(cause),
                }
            }
            (_, Err(child)) => {
                update.iout = None;
                update.pout = None;
                update.mark_unresolved(UnresolvedCause::DownstreamUnresolved { child });
            }
            (StageKind::Source(params), Ok(iout)) => {
                update.iout = Some(iout);
                match finite(params.output_power(iout)) {
                    Ok(pout) => update.pout = Some(pout),
                    Err(cause) => update.mark_unresolved(cause),
                }
            }
            (StageKind::Ldo(params), Ok(iout)) => {
                update.iout = Some(iout);
                apply(&mut update, params.convert(vin.unwrap_or(0.0), iout));
            }
            (StageKind::Dcdc(params), Ok(iout)) => {
                update.iout = Some(iout);
                apply(&mut update, params.convert(vin.unwrap_or(0.0), iout));
            }
        }

        trace!(
            stage = %id,
            vin = ?vin,
            vout = ?vout,
            iin = ?update.iin,
            iout = ?update.iout,
            "computed"
        );
        if let Some(state) = states.get_mut(&id) {
            *state = update;
        }
    }
}

/// Total current drawn from `id`'s output rail, or the first child whose
/// demand is unknown.
fn children_demand(
    topology: &Topology,
    states: &ComputedStateMap,
    id: &StageId,
) -> Result<f64, StageId> {
    let mut total = 0.0;
    for child in topology.children(id) {
        match states.get(child) {
            Some(state) if state.is_resolved() => total += state.iin.unwrap_or(0.0),
            _ => return Err(child.clone()),
        }
    }
    Ok(total)
}

fn apply(state: &mut ComputedState, conversion: Result<Conversion, UnresolvedCause>) {
    match conversion {
        Ok(c) => {
            state.iin = Some(c.iin);
            state.pin = Some(c.pin);
            state.pout = Some(c.pout);
            state.pdiss = Some(c.pdiss);
            state.efficiency_actual = c.efficiency;
        }
        Err(cause) => state.mark_unresolved(cause),
    }
}
