//! Snapshot codec behaviour across the public API.

use powertree_core::engine::evaluate;
use powertree_core::error::{FormatError, PowerTreeError};
use powertree_core::snapshot::{self, SNAPSHOT_VERSION};
use powertree_core::stage::{
    DcdcParams, LdoParams, LoadParams, SourceParams, Stage, StageId, StageInfo,
};
use powertree_core::PowerTree;

fn sample_tree() -> PowerTree {
    let mut tree = PowerTree::new();
    tree.add_node(
        Stage::source("vin", SourceParams::new(24.0, 5.0)).with_info(StageInfo {
            name: Some("24V bus".to_string()),
            notes: Some("bench supply".to_string()),
            position: Some([10.0, -4.5]),
            ..StageInfo::default()
        }),
    )
    .unwrap();
    tree.add_node(
        Stage::dcdc(
            "buck",
            DcdcParams::new(3.3, 2.0, 0.87)
                .with_iq(0.0015)
                .with_input_range(4.5, 36.0),
        )
        .with_name("3V3 buck"),
    )
    .unwrap();
    tree.add_node(Stage::ldo(
        "ldo",
        LdoParams::new(1.8, 0.3)
            .with_iq(2e-5)
            .with_input_range(2.5, 5.5)
            .with_dropout(0.25),
    ))
    .unwrap();
    tree.add_node(Stage::load(
        "fpga",
        LoadParams::power(0.45).with_input_range(1.71, 1.89),
    ))
    .unwrap();
    tree.add_node(Stage::load(
        "radio",
        LoadParams::current(0.1 / 3.0).with_input_range(3.0, 3.6),
    ))
    .unwrap();
    tree.connect(&"vin".into(), &"buck".into()).unwrap();
    tree.connect(&"buck".into(), &"ldo".into()).unwrap();
    tree.connect(&"ldo".into(), &"fpga".into()).unwrap();
    tree.connect(&"buck".into(), &"radio".into()).unwrap();
    tree
}

#[test]
fn test_round_trip_preserves_tree_and_results() {
    let tree = sample_tree();
    let document = snapshot::serialize(&tree).unwrap();
    let restored = snapshot::deserialize(&document).unwrap();

    assert_eq!(restored, tree);
    // results compare exactly, not approximately
    assert_eq!(evaluate(&restored), evaluate(&tree));
}

#[test]
fn test_round_trip_of_sample_board() {
    let tree = snapshot::deserialize(include_str!("../demos/board.json")).unwrap();
    let again = snapshot::deserialize(&snapshot::serialize(&tree).unwrap()).unwrap();
    assert_eq!(again, tree);

    let fan = tree.stage(&StageId::new("fan")).unwrap();
    assert_eq!(fan.info.notes.as_deref(), Some("12V fan straight off the adapter"));
}

#[test]
fn test_written_document_carries_version() {
    let value = snapshot::to_value(&sample_tree()).unwrap();
    assert_eq!(value["version"].as_u64(), Some(SNAPSHOT_VERSION));
    assert_eq!(value["nodes"].as_array().unwrap().len(), 5);
    assert_eq!(value["edges"].as_array().unwrap().len(), 4);
}

#[test]
fn test_file_round_trip() {
    let path = std::env::temp_dir().join(format!(
        "powertree-snapshot-{}.json",
        std::process::id()
    ));
    let tree = sample_tree();
    snapshot::save_file(&path, &tree).unwrap();
    let restored = snapshot::load_file(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(restored, tree);
}

#[test]
fn test_missing_file_is_read_error() {
    let err = snapshot::load_file(std::path::Path::new("/nonexistent/powertree.json")).unwrap_err();
    assert!(matches!(err, PowerTreeError::FileReadError { .. }));
}

#[test]
fn test_rejected_document_names_node_and_field() {
    let err = snapshot::deserialize(
        r#"{ "nodes": [ { "id": "buck", "type": "DCDC", "vout": 5, "max_iout": 1,
                          "iq": 0, "vin_min": 6, "vin_max": 20 } ] }"#,
    )
    .unwrap_err();
    match err {
        PowerTreeError::Format(FormatError::MissingField { node, field }) => {
            assert_eq!(node, "buck");
            assert_eq!(field, "efficiency");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_legacy_edge_and_type_spellings() {
    let tree = snapshot::deserialize(
        r#"{ "nodes": [
                { "id": "a", "type": "input", "vout": 5, "max_iout": 1 },
                { "id": "b", "type": "Load", "vin_min": 4, "vin_max": 6, "current": 0.2 }
            ],
            "edges": [ { "src": "a", "dst": "b" } ] }"#,
    )
    .unwrap();
    assert_eq!(tree.parent_of(&StageId::new("b")), Some(&StageId::new("a")));
    assert!(evaluate(&tree).diagnostics.is_empty());
}
