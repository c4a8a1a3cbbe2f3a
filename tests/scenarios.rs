//! End-to-end scenarios for the power tree engine.

use approx::assert_abs_diff_eq;
use powertree_core::engine::{evaluate, propagate, UnresolvedCause};
use powertree_core::error::PowerTreeError;
use powertree_core::snapshot;
use powertree_core::stage::{DcdcParams, LdoParams, LoadParams, SourceParams, Stage, StageId};
use powertree_core::{check::check, DiagnosticCode, PowerTree, Severity};

fn id(s: &str) -> StageId {
    StageId::new(s)
}

/// Helper: SOURCE(12V, 2A) -> LDO(5V, iq=1mA, 1A) -> LOAD(`load_amps`)
fn ldo_chain(load_amps: f64) -> PowerTree {
    let mut tree = PowerTree::new();
    tree.add_node(Stage::source("src", SourceParams::new(12.0, 2.0)))
        .expect("add source");
    tree.add_node(Stage::ldo(
        "ldo",
        LdoParams::new(5.0, 1.0)
            .with_iq(1e-3)
            .with_input_range(5.5, 15.0),
    ))
    .expect("add ldo");
    tree.add_node(Stage::load(
        "load",
        LoadParams::current(load_amps).with_input_range(4.5, 5.5),
    ))
    .expect("add load");
    tree.connect(&id("src"), &id("ldo")).expect("connect ldo");
    tree.connect(&id("ldo"), &id("load")).expect("connect load");
    tree
}

// ── Worked scenarios ──────────────────────────────────────────────

#[test]
fn test_scenario_a_ldo_chain() {
    let tree = ldo_chain(0.5);
    let result = evaluate(&tree);

    let ldo = result.states.get(&id("ldo")).unwrap();
    assert_abs_diff_eq!(ldo.iin.unwrap(), 0.501, epsilon = 1e-12);
    assert_abs_diff_eq!(ldo.pout.unwrap(), 2.5, epsilon = 1e-12);
    assert_abs_diff_eq!(ldo.pin.unwrap(), 6.012, epsilon = 1e-9);
    assert_abs_diff_eq!(ldo.pdiss.unwrap(), 3.512, epsilon = 1e-9);

    let src = result.states.get(&id("src")).unwrap();
    assert_abs_diff_eq!(src.iout.unwrap(), 0.501, epsilon = 1e-12);

    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
}

#[test]
fn test_scenario_b_overloaded_ldo() {
    let tree = ldo_chain(1.5);
    let result = evaluate(&tree);

    assert_eq!(result.diagnostics.len(), 1);
    let diag = &result.diagnostics[0];
    assert_eq!(diag.code, DiagnosticCode::IoutExceedsMax);
    assert_eq!(diag.severity, Severity::Error);
    assert_eq!(diag.node_id, Some(id("ldo")));

    // the state is still fully populated
    let ldo = result.states.get(&id("ldo")).unwrap();
    assert!(ldo.is_resolved());
    assert_abs_diff_eq!(ldo.iout.unwrap(), 1.5, epsilon = 1e-12);
    assert_abs_diff_eq!(ldo.iin.unwrap(), 1.501, epsilon = 1e-12);
}

#[test]
fn test_scenario_c_zero_efficiency() {
    let mut tree = PowerTree::new();
    tree.add_node(Stage::source("src", SourceParams::new(12.0, 2.0)))
        .unwrap();
    tree.add_node(Stage::dcdc("buck", DcdcParams::new(5.0, 2.0, 0.0)))
        .unwrap();
    tree.add_node(Stage::load("load", LoadParams::current(0.5)))
        .unwrap();
    tree.connect(&id("src"), &id("buck")).unwrap();
    tree.connect(&id("buck"), &id("load")).unwrap();

    let result = evaluate(&tree);
    let buck_codes: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.node_id == Some(id("buck")))
        .map(|d| d.code)
        .collect();
    assert_eq!(
        buck_codes,
        vec![
            DiagnosticCode::EfficiencyOutOfRange,
            DiagnosticCode::ComputationUnresolved
        ]
    );

    let buck = result.states.get(&id("buck")).unwrap();
    assert_eq!(
        buck.unresolved_cause(),
        Some(&UnresolvedCause::ZeroEfficiency)
    );
    assert!(buck.pin.is_none());
    assert!(result
        .states
        .iter()
        .all(|(_, s)| s.pin.map_or(true, f64::is_finite)));
}

#[test]
fn test_scenario_d_second_parent_rejected() {
    let mut tree = ldo_chain(0.1);
    tree.add_node(Stage::source("aux", SourceParams::new(5.0, 1.0)))
        .unwrap();
    let before = tree.clone();

    let err = tree.connect(&id("aux"), &id("load")).unwrap_err();
    assert_eq!(err.diagnostic_code(), Some(DiagnosticCode::MultiParent));
    match err {
        PowerTreeError::Structural(e) => {
            let diag = e.to_diagnostic().unwrap();
            assert_eq!(diag.code, DiagnosticCode::MultiParent);
            assert_eq!(diag.severity, Severity::Error);
        }
        other => panic!("expected structural error, got {other:?}"),
    }
    assert_eq!(tree, before);
}

// ── Structural handling ───────────────────────────────────────────

#[test]
fn test_cycle_is_always_rejected() {
    let mut tree = ldo_chain(0.1);
    tree.add_node(Stage::ldo("ldo2", LdoParams::new(3.3, 1.0)))
        .unwrap();
    tree.disconnect(&id("load")).unwrap();
    tree.connect(&id("ldo"), &id("ldo2")).unwrap();

    // ldo2 is downstream of ldo; feeding ldo from ldo2 closes a loop
    tree.disconnect(&id("ldo")).unwrap();
    let err = tree.connect(&id("ldo2"), &id("ldo")).unwrap_err();
    assert_eq!(err.diagnostic_code(), Some(DiagnosticCode::StructuralCycle));
}

#[test]
fn test_loaded_cycle_blocks_only_its_component() {
    let tree = snapshot::deserialize(
        r#"{
            "nodes": [
                { "id": "src", "type": "SOURCE", "vout": 5, "max_iout": 1 },
                { "id": "led", "type": "LOAD", "vin_min": 0, "vin_max": 6, "current": 0.02 },
                { "id": "a", "type": "LDO", "vout": 3.3, "max_iout": 1, "iq": 0, "vin_min": 0, "vin_max": 20 },
                { "id": "b", "type": "LDO", "vout": 1.8, "max_iout": 1, "iq": 0, "vin_min": 0, "vin_max": 20 },
                { "id": "sink", "type": "LOAD", "vin_min": 0, "vin_max": 6, "current": 0.1 }
            ],
            "edges": [
                { "parent": "src", "child": "led" },
                { "parent": "a", "child": "b" },
                { "parent": "b", "child": "a" },
                { "parent": "b", "child": "sink" }
            ]
        }"#,
    )
    .unwrap();

    let states = propagate(&tree);
    let diagnostics = check(&tree, &states);

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, DiagnosticCode::StructuralCycle);
    assert_eq!(diagnostics[0].node_id, None);

    assert!(states.get(&id("a")).unwrap().is_blocked());
    assert!(states.get(&id("sink")).unwrap().is_blocked());
    let src = states.get(&id("src")).unwrap();
    assert_abs_diff_eq!(src.iout.unwrap(), 0.02, epsilon = 1e-12);
}

#[test]
fn test_loaded_multi_parent_reported_before_rules() {
    let tree = snapshot::deserialize(
        r#"{
            "nodes": [
                { "id": "src", "type": "SOURCE", "vout": 5, "max_iout": 0.1 },
                { "id": "aux", "type": "SOURCE", "vout": 3.3, "max_iout": 1 },
                { "id": "x", "type": "LOAD", "vin_min": 0, "vin_max": 6, "current": 0.01 },
                { "id": "y", "type": "LOAD", "vin_min": 0, "vin_max": 6, "current": 0.5 }
            ],
            "edges": [
                { "parent": "src", "child": "x" },
                { "parent": "aux", "child": "x" },
                { "parent": "src", "child": "y" }
            ]
        }"#,
    )
    .unwrap();

    let result = evaluate(&tree);
    let codes: Vec<_> = result.diagnostics.iter().map(|d| d.code).collect();
    assert_eq!(
        codes,
        vec![DiagnosticCode::MultiParent, DiagnosticCode::IoutExceedsMax]
    );
    assert!(result.states.get(&id("x")).unwrap().is_blocked());
    // the doubly-fed load places no demand on either source
    assert_abs_diff_eq!(
        result.states.get(&id("aux")).unwrap().iout.unwrap(),
        0.0,
        epsilon = 1e-15
    );
}

// ── Sample board ──────────────────────────────────────────────────

#[test]
fn test_sample_board() {
    let tree = snapshot::deserialize(include_str!("../demos/board.json")).unwrap();
    let result = evaluate(&tree);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);

    let ldo = result.states.get(&id("ldo3v3")).unwrap();
    let ldo_iout = 0.12 + 0.05 / 3.3;
    assert_abs_diff_eq!(ldo.iout.unwrap(), ldo_iout, epsilon = 1e-12);

    let buck_iout = ldo_iout + 5e-5 + 1.2;
    let buck = result.states.get(&id("buck5")).unwrap();
    assert_abs_diff_eq!(buck.iout.unwrap(), buck_iout, epsilon = 1e-12);
    let buck_iin = 5.0 * buck_iout / 0.92 / 12.0 + 0.002;
    assert_abs_diff_eq!(buck.iin.unwrap(), buck_iin, epsilon = 1e-12);

    let vbat = result.states.get(&id("vbat")).unwrap();
    assert_abs_diff_eq!(vbat.iout.unwrap(), buck_iin + 0.2, epsilon = 1e-12);

    let summary = &result.summaries[0];
    assert_eq!(summary.loads, 4);
    assert_eq!(summary.depth, 4);
    assert!(summary.efficiency.unwrap() < 1.0);
}

#[test]
fn test_overflowing_load_is_reported() {
    let tree = snapshot::deserialize(
        r#"{
            "nodes": [
                { "id": "s", "type": "SOURCE", "vout": 1e308, "max_iout": 100 },
                { "id": "l", "type": "LOAD", "vin_min": 0, "vin_max": 1.7e308, "current": 10 }
            ],
            "edges": [{ "parent": "s", "child": "l" }]
        }"#,
    )
    .unwrap();

    let result = evaluate(&tree);
    let unresolved: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.code == DiagnosticCode::ComputationUnresolved)
        .filter_map(|d| d.node_id.clone())
        .collect();
    assert_eq!(unresolved, vec![id("s"), id("l")]);
    assert_eq!(result.states.get(&id("l")).unwrap().pin, None);
}
