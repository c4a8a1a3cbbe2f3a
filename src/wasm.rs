//! WASM bindings for PowerTree Core.
//!
//! This module exposes the engine to a browser-based editor. Trees cross
//! the boundary as snapshot JSON and results come back as JSON strings.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmPowerTree } from 'powertree_core';
//!
//! await init();
//!
//! const tree = new WasmPowerTree(JSON.stringify({
//!   nodes: [
//!     { id: "vbat", type: "SOURCE", vout: 12, max_iout: 2 },
//!     { id: "mcu", type: "LOAD", vin_min: 3, vin_max: 15, current: 0.1 },
//!   ],
//!   edges: [{ parent: "vbat", child: "mcu" }],
//! }));
//!
//! const { states, diagnostics } = JSON.parse(tree.evaluate());
//! ```

use wasm_bindgen::prelude::*;

use crate::check::CheckConfig;
use crate::engine::evaluate_with_config;
use crate::error::PowerTreeError;
use crate::snapshot;
use crate::tree::PowerTree;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn to_js(e: PowerTreeError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// WASM-compatible handle on a power tree.
///
/// Holds the tree last loaded by the editor; every call recomputes from
/// scratch.
#[wasm_bindgen]
pub struct WasmPowerTree {
    tree: PowerTree,
    config: CheckConfig,
}

#[wasm_bindgen]
impl WasmPowerTree {
    /// Create a handle from a snapshot document.
    ///
    /// # Arguments
    /// * `snapshot_json` - The tree in snapshot JSON format
    #[wasm_bindgen(constructor)]
    pub fn new(snapshot_json: &str) -> Result<WasmPowerTree, JsValue> {
        let tree = snapshot::deserialize(snapshot_json).map_err(to_js)?;
        Ok(WasmPowerTree {
            tree,
            config: CheckConfig::default(),
        })
    }

    /// Replace the tree with a new snapshot.
    ///
    /// On a format error the previous tree is kept.
    #[wasm_bindgen]
    pub fn load(&mut self, snapshot_json: &str) -> Result<(), JsValue> {
        snapshot::reload(&mut self.tree, snapshot_json).map_err(to_js)
    }

    /// Set the advisory thresholds.
    ///
    /// # Arguments
    /// * `low_efficiency` - Efficiency below which a regulator is flagged
    /// * `headroom` - Fraction of a rated current treated as close to the limit
    #[wasm_bindgen]
    pub fn configure(&mut self, low_efficiency: f64, headroom: f64) {
        self.config = CheckConfig::new()
            .with_low_efficiency_threshold(low_efficiency)
            .with_current_headroom(headroom);
    }

    /// Compute states, diagnostics and summaries as a JSON string.
    #[wasm_bindgen]
    pub fn evaluate(&self) -> Result<String, JsValue> {
        let evaluation = evaluate_with_config(&self.tree, &self.config);
        serde_json::to_string(&evaluation).map_err(|e| {
            to_js(PowerTreeError::WasmError {
                message: e.to_string(),
            })
        })
    }

    /// Current tree as snapshot JSON.
    #[wasm_bindgen]
    pub fn snapshot(&self) -> Result<String, JsValue> {
        snapshot::serialize(&self.tree).map_err(to_js)
    }

    /// Number of stages in the tree.
    #[wasm_bindgen(getter)]
    pub fn stage_count(&self) -> usize {
        self.tree.len()
    }
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
