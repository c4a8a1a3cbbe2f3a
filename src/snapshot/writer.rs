//! Tree → document.

use serde::Serialize;
use serde_json::Value;

use super::SNAPSHOT_VERSION;
use crate::error::Result;
use crate::stage::{LoadDemand, Stage, StageId, StageInfo, StageKind};
use crate::tree::PowerTree;

#[derive(Serialize)]
struct Document<'a> {
    version: u64,
    nodes: Vec<NodeRecord<'a>>,
    edges: Vec<EdgeRecord<'a>>,
}

#[derive(Serialize)]
struct NodeRecord<'a> {
    id: &'a StageId,
    #[serde(rename = "type")]
    stage_type: &'static str,
    #[serde(flatten)]
    params: ParamsRecord,
    #[serde(flatten)]
    info: &'a StageInfo,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ParamsRecord {
    Source {
        vout: f64,
        max_iout: f64,
    },
    Ldo {
        vout: f64,
        max_iout: f64,
        iq: f64,
        vin_min: f64,
        vin_max: f64,
        dropout: f64,
    },
    Dcdc {
        vout: f64,
        max_iout: f64,
        iq: f64,
        efficiency: f64,
        vin_min: f64,
        vin_max: f64,
    },
    Load {
        vin_min: f64,
        vin_max: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        current: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        power: Option<f64>,
    },
}

#[derive(Serialize)]
struct EdgeRecord<'a> {
    parent: &'a StageId,
    child: &'a StageId,
}

impl<'a> From<&'a Stage> for NodeRecord<'a> {
    fn from(stage: &'a Stage) -> Self {
        let params = match &stage.kind {
            StageKind::Source(p) => ParamsRecord::Source {
                vout: p.vout,
                max_iout: p.max_iout,
            },
            StageKind::Ldo(p) => ParamsRecord::Ldo {
                vout: p.vout,
                max_iout: p.max_iout,
                iq: p.iq,
                vin_min: p.vin_min,
                vin_max: p.vin_max,
                dropout: p.dropout,
            },
            StageKind::Dcdc(p) => ParamsRecord::Dcdc {
                vout: p.vout,
                max_iout: p.max_iout,
                iq: p.iq,
                efficiency: p.efficiency,
                vin_min: p.vin_min,
                vin_max: p.vin_max,
            },
            StageKind::Load(p) => {
                let (current, power) = match p.demand {
                    LoadDemand::Current(i) => (Some(i), None),
                    LoadDemand::Power(w) => (None, Some(w)),
                };
                ParamsRecord::Load {
                    vin_min: p.vin_min,
                    vin_max: p.vin_max,
                    current,
                    power,
                }
            }
        };
        NodeRecord {
            id: &stage.id,
            stage_type: stage.stage_type().as_str(),
            params,
            info: &stage.info,
        }
    }
}

fn document(tree: &PowerTree) -> Document<'_> {
    Document {
        version: SNAPSHOT_VERSION,
        nodes: tree.stages().map(NodeRecord::from).collect(),
        edges: tree
            .edges()
            .iter()
            .map(|e| EdgeRecord {
                parent: &e.parent,
                child: &e.child,
            })
            .collect(),
    }
}

/// Render `tree` as a pretty-printed JSON document.
pub fn serialize(tree: &PowerTree) -> Result<String> {
    Ok(serde_json::to_string_pretty(&document(tree))?)
}

/// Render `tree` as a JSON value.
pub fn to_value(tree: &PowerTree) -> Result<Value> {
    Ok(serde_json::to_value(document(tree))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{LdoParams, LoadParams, SourceParams};

    #[test]
    fn test_document_shape() {
        let mut tree = PowerTree::new();
        tree.add_node(Stage::source("vbat", SourceParams::new(12.0, 2.0)).with_name("Battery"))
            .unwrap();
        tree.add_node(Stage::ldo("ldo", LdoParams::new(5.0, 1.0).with_iq(1e-3)))
            .unwrap();
        tree.add_node(Stage::load("mcu", LoadParams::power(0.5)))
            .unwrap();
        tree.connect(&"vbat".into(), &"ldo".into()).unwrap();
        tree.connect(&"ldo".into(), &"mcu".into()).unwrap();

        let doc = to_value(&tree).unwrap();
        assert_eq!(doc["version"], 1);
        assert_eq!(doc["nodes"][0]["type"], "SOURCE");
        assert_eq!(doc["nodes"][0]["name"], "Battery");
        assert_eq!(doc["nodes"][1]["iq"], 1e-3);
        assert_eq!(doc["nodes"][2]["power"], 0.5);
        assert!(doc["nodes"][2].get("current").is_none());
        assert!(doc["nodes"][1].get("notes").is_none());
        assert_eq!(doc["edges"][1]["parent"], "ldo");
        assert_eq!(doc["edges"][1]["child"], "mcu");
    }
}
