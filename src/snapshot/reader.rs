//! Document → tree.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::debug;

use super::SNAPSHOT_VERSION;
use crate::error::{FormatError, Result};
use crate::stage::{
    DcdcParams, LdoParams, LoadDemand, LoadParams, SourceParams, Stage, StageId, StageInfo,
    StageKind, StageType,
};
use crate::tree::{Edge, PowerTree};

/// Parse a JSON snapshot into a tree.
pub fn deserialize(document: &str) -> Result<PowerTree> {
    let value: Value = serde_json::from_str(document).map_err(FormatError::from)?;
    from_value(&value)
}

/// Build a tree from a parsed JSON snapshot.
///
/// Nothing is returned on failure, so a caller holding a previous tree
/// keeps it untouched.
pub fn from_value(document: &Value) -> Result<PowerTree> {
    let root = document.as_object().ok_or_else(|| FormatError::InvalidDocument {
        message: "top level must be an object".to_string(),
    })?;

    if let Some(version) = root.get("version") {
        let version = version.as_u64().ok_or_else(|| FormatError::InvalidDocument {
            message: "'version' must be a non-negative integer".to_string(),
        })?;
        if version > SNAPSHOT_VERSION {
            return Err(FormatError::UnsupportedVersion {
                version,
                latest: SNAPSHOT_VERSION,
            }
            .into());
        }
    }

    let nodes = collection(root, "nodes")?.ok_or_else(|| FormatError::InvalidDocument {
        message: "missing 'nodes' collection".to_string(),
    })?;
    let edges = collection(root, "edges")?
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut tree = PowerTree::new();
    let mut seen = HashSet::new();
    for (index, node) in nodes.iter().enumerate() {
        let stage = read_stage(index, node)?;
        if !seen.insert(stage.id.clone()) {
            return Err(FormatError::DuplicateNode {
                node: stage.id.to_string(),
            }
            .into());
        }
        tree.add_node(stage)?;
    }

    for (index, edge) in edges.iter().enumerate() {
        let edge = read_edge(index, edge)?;
        for id in [&edge.parent, &edge.child] {
            if !tree.contains(id) {
                return Err(FormatError::UnknownEdgeNode {
                    index,
                    node: id.to_string(),
                }
                .into());
            }
        }
        if tree.edges().contains(&edge) {
            debug!(index, parent = %edge.parent, child = %edge.child, "skipping repeated edge");
            continue;
        }
        tree.push_edge_unchecked(edge);
    }

    debug!(
        stages = tree.len(),
        edges = tree.edges().len(),
        "snapshot decoded"
    );
    Ok(tree)
}

/// Fetch an optional top-level array.
fn collection<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> std::result::Result<Option<&'a Vec<Value>>, FormatError> {
    match root.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(_) => Err(FormatError::InvalidDocument {
            message: format!("'{key}' must be an array"),
        }),
    }
}

fn read_stage(index: usize, node: &Value) -> std::result::Result<Stage, FormatError> {
    let obj = node.as_object().ok_or_else(|| FormatError::InvalidDocument {
        message: format!("node {index} must be an object"),
    })?;

    let position = format!("#{index}");
    let id = match obj.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(_) => {
            return Err(FormatError::InvalidField {
                node: position,
                field: "id".to_string(),
                message: "expected a non-empty string".to_string(),
            })
        }
        None => {
            return Err(FormatError::MissingField {
                node: position,
                field: "id".to_string(),
            })
        }
    };

    let fields = Fields { obj, node: &id };
    let tag = fields.string("type")?;
    let stage_type = StageType::from_tag(&tag).ok_or_else(|| FormatError::UnknownStageType {
        node: id.clone(),
        tag: tag.clone(),
    })?;

    let kind = match stage_type {
        StageType::Source => StageKind::Source(SourceParams {
            vout: fields.number("vout")?,
            max_iout: fields.number("max_iout")?,
        }),
        StageType::Ldo => StageKind::Ldo(LdoParams {
            vout: fields.number("vout")?,
            max_iout: fields.number("max_iout")?,
            iq: fields.number("iq")?,
            vin_min: fields.number("vin_min")?,
            vin_max: fields.number("vin_max")?,
            dropout: fields.optional_number("dropout")?.unwrap_or(0.0),
        }),
        StageType::Dcdc => StageKind::Dcdc(DcdcParams {
            vout: fields.number("vout")?,
            max_iout: fields.number("max_iout")?,
            iq: fields.number("iq")?,
            efficiency: fields.number("efficiency")?,
            vin_min: fields.number("vin_min")?,
            vin_max: fields.number("vin_max")?,
        }),
        StageType::Load => {
            let demand = match (
                fields.optional_number("current")?,
                fields.optional_number("power")?,
            ) {
                (Some(i), None) => LoadDemand::Current(i),
                (None, Some(w)) => LoadDemand::Power(w),
                (Some(_), Some(_)) => {
                    return Err(FormatError::ConflictingDemand { node: id.clone() })
                }
                (None, None) => {
                    return Err(FormatError::MissingField {
                        node: id.clone(),
                        field: "current".to_string(),
                    })
                }
            };
            StageKind::Load(LoadParams {
                vin_min: fields.number("vin_min")?,
                vin_max: fields.number("vin_max")?,
                demand,
            })
        }
    };

    let info = StageInfo {
        name: fields.optional_string("name")?,
        ic_name: fields.optional_string("ic_name")?,
        notes: fields.optional_string("notes")?,
        color: fields.optional_string("color")?,
        position: fields.optional_position("position")?,
    };

    Ok(Stage {
        id: StageId::new(id),
        info,
        kind,
    })
}

fn read_edge(index: usize, edge: &Value) -> std::result::Result<Edge, FormatError> {
    let obj = edge.as_object().ok_or_else(|| FormatError::InvalidDocument {
        message: format!("edge {index} must be an object"),
    })?;
    let endpoint = |primary: &str, alias: &str| {
        match obj.get(primary).or_else(|| obj.get(alias)) {
            Some(Value::String(s)) => Ok(StageId::new(s.as_str())),
            Some(_) => Err(FormatError::InvalidDocument {
                message: format!("edge {index}: '{primary}' must be a string"),
            }),
            None => Err(FormatError::InvalidDocument {
                message: format!("edge {index}: missing '{primary}'"),
            }),
        }
    };
    Ok(Edge {
        parent: endpoint("parent", "src")?,
        child: endpoint("child", "dst")?,
    })
}

/// Typed access to one node's fields with errors naming the node.
struct Fields<'a> {
    obj: &'a Map<String, Value>,
    node: &'a str,
}

impl Fields<'_> {
    fn missing(&self, field: &str) -> FormatError {
        FormatError::missing_field(self.node, field)
    }

    fn invalid(&self, field: &str, message: &str) -> FormatError {
        FormatError::invalid_field(self.node, field, message)
    }

    fn string(&self, field: &str) -> std::result::Result<String, FormatError> {
        match self.obj.get(field) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(self.invalid(field, "expected a string")),
            None => Err(self.missing(field)),
        }
    }

    fn optional_string(&self, field: &str) -> std::result::Result<Option<String>, FormatError> {
        match self.obj.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.invalid(field, "expected a string")),
        }
    }

    /// `[x, y]` pair of finite numbers.
    fn optional_position(&self, field: &str) -> std::result::Result<Option<[f64; 2]>, FormatError> {
        let items = match self.obj.get(field) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Array(items)) => items,
            Some(_) => return Err(self.invalid(field, "expected an [x, y] array")),
        };
        let coords: Option<Vec<f64>> = items
            .iter()
            .map(|v| v.as_f64().filter(|c| c.is_finite()))
            .collect();
        match coords.as_deref() {
            Some(&[x, y]) => Ok(Some([x, y])),
            _ => Err(self.invalid(field, "expected an [x, y] array")),
        }
    }

    fn number(&self, field: &str) -> std::result::Result<f64, FormatError> {
        self.optional_number(field)?
            .ok_or_else(|| self.missing(field))
    }

    fn optional_number(&self, field: &str) -> std::result::Result<Option<f64>, FormatError> {
        match self.obj.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_f64()
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| self.invalid(field, "expected a finite number")),
        }
    }
}
