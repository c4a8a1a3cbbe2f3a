//! Rule evaluation.

use tracing::debug;

use super::{CheckConfig, Diagnostic, DiagnosticCode};
use crate::engine::{ComputedState, ComputedStateMap};
use crate::stage::{Stage, StageKind};
use crate::tree::{PowerTree, Topology};

/// Check `tree` against the state computed for it, with default thresholds.
pub fn check(tree: &PowerTree, states: &ComputedStateMap) -> Vec<Diagnostic> {
    check_with_config(tree, states, &CheckConfig::default())
}

/// Check `tree` against the state computed for it.
pub fn check_with_config(
    tree: &PowerTree,
    states: &ComputedStateMap,
    config: &CheckConfig,
) -> Vec<Diagnostic> {
    check_with_topology(tree, &Topology::analyze(tree), states, config)
}

pub(crate) fn check_with_topology(
    tree: &PowerTree,
    topology: &Topology,
    states: &ComputedStateMap,
    config: &CheckConfig,
) -> Vec<Diagnostic> {
    let mut diagnostics = topology.diagnostics().to_vec();

    for id in topology.preorder() {
        let (Some(stage), Some(state)) = (tree.stage(&id), states.get(&id)) else {
            continue;
        };
        if state.is_blocked() {
            continue;
        }
        check_stage(stage, state, config, &mut diagnostics);
    }

    debug!(
        count = diagnostics.len(),
        structural = diagnostics.iter().filter(|d| d.code.is_structural()).count(),
        "checked design rules"
    );
    diagnostics
}

fn check_stage(
    stage: &Stage,
    state: &ComputedState,
    config: &CheckConfig,
    out: &mut Vec<Diagnostic>,
) {
    let id = Some(stage.id.clone());
    let name = stage.label();

    // Input window
    if let (Some((vin_min, vin_max)), Some(vin)) = (stage.kind.input_range(), state.vin) {
        if vin < vin_min || vin > vin_max {
            out.push(Diagnostic::error(
                id.clone(),
                DiagnosticCode::VinOutOfRange,
                format!(
                    "[{name}] Vin {} V is outside the allowed range {} - {} V",
                    volts(vin),
                    volts(vin_min),
                    volts(vin_max)
                ),
            ));
        }
    }

    // Current rating
    if let (Some(max_iout), Some(iout)) = (stage.kind.max_iout(), state.iout) {
        if iout > max_iout {
            out.push(Diagnostic::error(
                id.clone(),
                DiagnosticCode::IoutExceedsMax,
                format!(
                    "[{name}] Iout {} A exceeds the rated maximum {} A",
                    amps(iout),
                    amps(max_iout)
                ),
            ));
        } else if config.current_headroom < 1.0 && iout > config.current_headroom * max_iout {
            out.push(Diagnostic::warning(
                id.clone(),
                DiagnosticCode::IoutNearMax,
                format!(
                    "[{name}] Iout {} A is within {:.0}% of the rated maximum {} A",
                    amps(iout),
                    (1.0 - config.current_headroom) * 100.0,
                    amps(max_iout)
                ),
            ));
        }
    }

    // Conversion direction and headroom
    if let (StageKind::Ldo(_) | StageKind::Dcdc(_), Some(vin), Some(vout)) =
        (&stage.kind, state.vin, state.vout)
    {
        if vout >= vin {
            out.push(Diagnostic::error(
                id.clone(),
                DiagnosticCode::InvalidConversion,
                format!(
                    "[{name}] Vout {} V must be below Vin {} V for a {}",
                    volts(vout),
                    volts(vin),
                    stage.stage_type()
                ),
            ));
        } else if let StageKind::Ldo(params) = &stage.kind {
            if vin - vout < params.dropout {
                out.push(Diagnostic::warning(
                    id.clone(),
                    DiagnosticCode::DropoutMargin,
                    format!(
                        "[{name}] headroom {} V is below the {} V dropout",
                        volts(vin - vout),
                        volts(params.dropout)
                    ),
                ));
            }
        }
    }

    // Configured efficiency
    if let StageKind::Dcdc(params) = &stage.kind {
        if !params.efficiency_in_range() {
            out.push(Diagnostic::error(
                id.clone(),
                DiagnosticCode::EfficiencyOutOfRange,
                format!(
                    "[{name}] efficiency {} must lie in (0, 1]",
                    params.efficiency
                ),
            ));
        }
    }

    // Actual efficiency
    if let Some(efficiency) = state.efficiency_actual {
        if efficiency < config.low_efficiency_threshold {
            out.push(Diagnostic::warning(
                id.clone(),
                DiagnosticCode::LowEfficiency,
                format!(
                    "[{name}] efficiency {:.1}% is below the {:.1}% advisory threshold",
                    efficiency * 100.0,
                    config.low_efficiency_threshold * 100.0
                ),
            ));
        }
    }

    if let Some(cause) = state.unresolved_cause() {
        out.push(Diagnostic::error(
            id,
            DiagnosticCode::ComputationUnresolved,
            format!("[{name}] operating point unresolved: {cause}"),
        ));
    }
}

/// Voltage with three decimals and trailing zeros trimmed.
fn volts(v: f64) -> String {
    trim(format!("{v:.3}"))
}

/// Current with six decimals (micro-amp resolution) and trailing zeros trimmed.
fn amps(i: f64) -> String {
    trim(format!("{i:.6}"))
}

fn trim(s: String) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}
