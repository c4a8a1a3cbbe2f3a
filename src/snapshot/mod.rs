//! Snapshot codec for persisting power trees.
//!
//! A snapshot is a JSON document holding two collections, `nodes` and
//! `edges`. Computed state is never persisted.
//!
//! ```json
//! {
//!   "version": 1,
//!   "nodes": [
//!     { "id": "vbat", "type": "SOURCE", "vout": 12.0, "max_iout": 2.0 },
//!     { "id": "ldo", "type": "LDO", "vout": 5.0, "max_iout": 1.0,
//!       "iq": 0.001, "vin_min": 6.0, "vin_max": 16.0, "name": "5V rail" },
//!     { "id": "mcu", "type": "LOAD", "vin_min": 4.5, "vin_max": 5.5, "current": 0.5 }
//!   ],
//!   "edges": [
//!     { "parent": "vbat", "child": "ldo" },
//!     { "parent": "ldo", "child": "mcu" }
//!   ]
//! }
//! ```
//!
//! # Node fields
//!
//! | Type | Required | Optional |
//! |------|----------|----------|
//! | SOURCE | `vout`, `max_iout` | |
//! | LDO | `vout`, `max_iout`, `iq`, `vin_min`, `vin_max` | `dropout` |
//! | DCDC | `vout`, `max_iout`, `iq`, `efficiency`, `vin_min`, `vin_max` | |
//! | LOAD | `vin_min`, `vin_max`, one of `current` / `power` | |
//!
//! Every node may also carry `name`, `ic_name`, `notes`, `color` and
//! `position`. Unknown fields are ignored so older readers accept newer
//! documents.
//!
//! Reading checks that the document is well formed and that edges name
//! existing nodes. Edges that break tree invariants are kept as written and
//! reported by the engine's structural analysis.

mod reader;
mod writer;

pub use reader::{deserialize, from_value};
pub use writer::{serialize, to_value};

use std::path::Path;

use tracing::debug;

use crate::error::{PowerTreeError, Result};
use crate::tree::PowerTree;

/// Latest document version this crate reads and the one it writes.
pub const SNAPSHOT_VERSION: u64 = 1;

/// Read a snapshot file.
pub fn load_file(path: &Path) -> Result<PowerTree> {
    let content = std::fs::read_to_string(path).map_err(|e| PowerTreeError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    debug!(path = %path.display(), bytes = content.len(), "loading snapshot");
    deserialize(&content)
}

/// Replace `tree` with the tree described by `document`.
///
/// On failure `tree` is left exactly as it was.
pub fn reload(tree: &mut PowerTree, document: &str) -> Result<()> {
    *tree = deserialize(document)?;
    Ok(())
}

/// Write a snapshot file.
pub fn save_file(path: &Path, tree: &PowerTree) -> Result<()> {
    let content = serialize(tree)?;
    std::fs::write(path, content).map_err(|e| PowerTreeError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;
    debug!(path = %path.display(), stages = tree.len(), "saved snapshot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatError;
    use crate::stage::StageId;

    const BOARD: &str = r#"{
        "nodes": [
            { "id": "vbat", "type": "SOURCE", "vout": 12, "max_iout": 2 },
            { "id": "mcu", "type": "LOAD", "vin_min": 3, "vin_max": 15, "current": 0.1 }
        ],
        "edges": [{ "parent": "vbat", "child": "mcu" }]
    }"#;

    #[test]
    fn test_failed_reload_keeps_open_tree() {
        let mut tree = deserialize(BOARD).unwrap();
        let before = tree.clone();

        let err = reload(
            &mut tree,
            r#"{ "nodes": [{ "id": "ldo", "type": "LDO", "vout": 3.3 }] }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PowerTreeError::Format(FormatError::MissingField { .. })
        ));
        assert_eq!(tree, before);

        assert!(reload(&mut tree, "not json").is_err());
        assert_eq!(tree, before);
    }

    #[test]
    fn test_reload_replaces_tree() {
        let mut tree = PowerTree::new();
        reload(&mut tree, BOARD).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(
            tree.parent_of(&StageId::new("mcu")),
            Some(&StageId::new("vbat"))
        );
    }
}
