//! # PowerTree Core
//!
//! Operating-point computation and design-rule checking for power
//! distribution trees.
//!
//! A power tree is assembled from typed stages (sources, linear
//! regulators, switching converters and loads). Given the topology and the
//! parameters of every stage, the engine derives each stage's voltages,
//! currents, power and efficiency, then flags design errors such as an
//! overloaded regulator or a rail outside a part's input window.
//!
//! ## Architecture
//!
//! - [`stage`] - Stage kinds and their parameter sets
//! - [`tree`] - Stage ownership, connectivity and structural analysis
//! - [`engine`] - Two-pass voltage/current propagation
//! - [`check`] - Constraint rules producing diagnostics
//! - [`snapshot`] - JSON persistence of trees
//! - [`report`] - Text/JSON reports (CLI only)
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! powertree board.json --format text --strict
//! ```
//!
//! ### Library
//!
//! ```
//! use powertree_core::stage::{LdoParams, LoadParams, SourceParams, Stage};
//! use powertree_core::{evaluate, PowerTree};
//!
//! let mut tree = PowerTree::new();
//! let vbat = tree.add_node(Stage::source("vbat", SourceParams::new(12.0, 2.0))).unwrap();
//! let ldo = tree.add_node(Stage::ldo("ldo", LdoParams::new(5.0, 1.0).with_iq(1e-3))).unwrap();
//! let mcu = tree.add_node(Stage::load("mcu", LoadParams::current(0.5))).unwrap();
//! tree.connect(&vbat, &ldo).unwrap();
//! tree.connect(&ldo, &mcu).unwrap();
//!
//! let result = evaluate(&tree);
//! let ldo_state = result.states.get(&ldo).unwrap();
//! assert!((ldo_state.iin.unwrap() - 0.501).abs() < 1e-12);
//! assert!(result.diagnostics.is_empty());
//! ```
//!
//! ### WASM
//!
//! ```javascript
//! import { WasmPowerTree } from 'powertree_core';
//!
//! const tree = new WasmPowerTree(snapshotJson);
//! const result = JSON.parse(tree.evaluate());
//! ```
//!
//! ## Computation Model
//!
//! Every edit is followed by a full, synchronous recomputation. Nothing is
//! cached: [`propagate`] and [`check`](check::check) are pure functions of
//! the tree, so repeated calls on an unchanged tree give identical results.

pub mod check;
pub mod engine;
pub mod error;
pub mod snapshot;
pub mod stage;
pub mod tree;

#[cfg(feature = "cli")]
pub mod report;

// Re-export main types for convenience
pub use check::{CheckConfig, Diagnostic, DiagnosticCode, Severity};
pub use engine::{evaluate, evaluate_with_config, propagate, ComputedStateMap, Evaluation};
pub use error::{PowerTreeError, Result};
pub use tree::PowerTree;

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmPowerTree;
