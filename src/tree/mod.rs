//! Power tree representation and structural analysis.
//!
//! [`PowerTree`] owns every stage in an arena keyed by [`StageId`] and keeps
//! connectivity as a separate list of parent → child [`Edge`]s, so no stage
//! ever points at another.
//!
//! Edits through [`PowerTree::connect`] and friends reject anything that
//! would break the tree invariants. A tree restored from a snapshot may
//! still carry bad edges; [`Topology::analyze`] finds them and derives the
//! valid forest the engine actually walks.
//!
//! [`StageId`]: crate::stage::StageId

mod graph;
mod topology;

pub use graph::{Edge, PowerTree};
pub use topology::Topology;
