//! Structural analysis of a power tree.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::{debug, warn};

use super::PowerTree;
use crate::check::{Diagnostic, DiagnosticCode};
use crate::stage::StageId;

/// The valid forest of a tree plus everything that had to be cut from it.
///
/// Stages outside the forest are *blocked*: a cycle, a second feed, an
/// illegal edge or a missing source keeps the engine from computing them.
/// Blocked stages never stop their siblings from being computed.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    roots: Vec<StageId>,
    children: HashMap<StageId, Vec<StageId>>,
    parent: HashMap<StageId, StageId>,
    blocked: HashSet<StageId>,
    diagnostics: Vec<Diagnostic>,
}

impl Topology {
    /// Derive the valid forest and the structural diagnostics of `tree`.
    pub fn analyze(tree: &PowerTree) -> Self {
        let mut topo = Topology::default();

        // Incoming feeds per stage, ignoring edges no valid tree can hold.
        let mut incoming: IndexMap<&StageId, Vec<&StageId>> = IndexMap::new();
        for (index, edge) in tree.edges().iter().enumerate() {
            let (Some(parent), Some(child)) = (tree.stage(&edge.parent), tree.stage(&edge.child))
            else {
                topo.diagnostics.push(Diagnostic::error(
                    None,
                    DiagnosticCode::InvalidEdge,
                    format!(
                        "Edge {index} ({} -> {}) references a stage that does not exist",
                        edge.parent, edge.child
                    ),
                ));
                continue;
            };
            if !parent.kind.has_output() {
                topo.diagnostics.push(Diagnostic::error(
                    Some(child.id.clone()),
                    DiagnosticCode::InvalidEdge,
                    format!(
                        "'{}' is fed from load '{}', which has no output rail",
                        child.id, parent.id
                    ),
                ));
                continue;
            }
            if !child.kind.has_input() {
                topo.diagnostics.push(Diagnostic::error(
                    Some(child.id.clone()),
                    DiagnosticCode::InvalidEdge,
                    format!(
                        "Source '{}' cannot be fed from '{}'",
                        child.id, parent.id
                    ),
                ));
                continue;
            }
            incoming.entry(&child.id).or_default().push(&parent.id);
        }

        for (child, parents) in &incoming {
            if parents.len() > 1 {
                let names: Vec<&str> = parents.iter().map(|p| p.as_str()).collect();
                topo.diagnostics.push(Diagnostic::error(
                    Some((*child).clone()),
                    DiagnosticCode::MultiParent,
                    format!("'{}' is powered by {} stages: {}", child, parents.len(), names.join(", ")),
                ));
            }
        }

        // Single feeds only from here on.
        let single: HashMap<&StageId, &StageId> = incoming
            .iter()
            .filter(|(_, parents)| parents.len() == 1)
            .map(|(child, parents)| (*child, parents[0]))
            .collect();

        for edge in tree.edges() {
            if single.get(&edge.child) == Some(&&edge.parent) {
                topo.children
                    .entry(edge.parent.clone())
                    .or_default()
                    .push(edge.child.clone());
                topo.parent.insert(edge.child.clone(), edge.parent.clone());
            }
        }

        for stage in tree.stages() {
            if incoming.contains_key(&stage.id) {
                continue;
            }
            if stage.kind.has_input() {
                topo.diagnostics.push(Diagnostic::error(
                    Some(stage.id.clone()),
                    DiagnosticCode::UnpoweredStage,
                    format!("{} '{}' has no power feed", stage.stage_type(), stage.id),
                ));
            } else {
                topo.roots.push(stage.id.clone());
            }
        }

        let reachable: HashSet<StageId> = topo.preorder().into_iter().collect();
        topo.find_cycles(tree, &single, &reachable);

        topo.blocked = tree
            .stages()
            .map(|s| &s.id)
            .filter(|id| !reachable.contains(*id))
            .cloned()
            .collect();
        if !topo.blocked.is_empty() {
            warn!(
                blocked = topo.blocked.len(),
                "stages excluded from propagation by structural errors"
            );
        }
        debug!(
            roots = topo.roots.len(),
            structural = topo.diagnostics.len(),
            "analyzed topology"
        );
        topo
    }

    /// Walk feed chains upward from every unreachable stage; a chain that
    /// revisits its own path is a cycle.
    fn find_cycles<'t>(
        &mut self,
        tree: &'t PowerTree,
        single: &HashMap<&'t StageId, &'t StageId>,
        reachable: &HashSet<StageId>,
    ) {
        let mut done: HashSet<&'t StageId> = HashSet::new();
        for stage in tree.stages() {
            if reachable.contains(&stage.id) || done.contains(&stage.id) {
                continue;
            }
            let mut path: Vec<&'t StageId> = Vec::new();
            let mut current: &'t StageId = &stage.id;
            loop {
                if let Some(pos) = path.iter().position(|p| *p == current) {
                    // path runs child -> parent; report parent -> child
                    let mut members: Vec<&str> = path[pos..].iter().map(|p| p.as_str()).collect();
                    members.reverse();
                    let first = members[0];
                    members.push(first);
                    self.diagnostics.push(Diagnostic::error(
                        None,
                        DiagnosticCode::StructuralCycle,
                        format!("Cycle detected: {}", members.join(" -> ")),
                    ));
                    break;
                }
                if done.contains(current) {
                    break;
                }
                path.push(current);
                match single.get(current) {
                    Some(parent) => current = *parent,
                    None => break,
                }
            }
            done.extend(path);
        }
    }

    /// Source roots of the valid forest, in insertion order.
    pub fn roots(&self) -> &[StageId] {
        &self.roots
    }

    /// Children of `id` in the valid forest, in connection order.
    pub fn children(&self, id: &StageId) -> &[StageId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parent of `id` in the valid forest.
    pub fn parent(&self, id: &StageId) -> Option<&StageId> {
        self.parent.get(id)
    }

    /// Whether `id` was cut from the valid forest.
    pub fn is_blocked(&self, id: &StageId) -> bool {
        self.blocked.contains(id)
    }

    /// Structural diagnostics, in discovery order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Whether the tree satisfies every structural invariant.
    pub fn is_valid(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Stages of the valid forest, each parent before its children.
    pub fn preorder(&self) -> Vec<StageId> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut stack: Vec<&StageId> = self.roots.iter().rev().collect();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            order.push(id.clone());
            stack.extend(self.children(id).iter().rev());
        }
        order
    }

    /// Stages of the valid forest, each child before its parent.
    pub fn postorder(&self) -> Vec<StageId> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        for root in &self.roots {
            // (stage, children already pushed)
            let mut stack: Vec<(&StageId, bool)> = vec![(root, false)];
            while let Some((id, expanded)) = stack.pop() {
                if expanded {
                    order.push(id.clone());
                    continue;
                }
                if !seen.insert(id) {
                    continue;
                }
                stack.push((id, true));
                stack.extend(self.children(id).iter().rev().map(|c| (c, false)));
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{LdoParams, LoadParams, SourceParams, Stage};
    use crate::tree::Edge;

    fn id(s: &str) -> StageId {
        StageId::new(s)
    }

    fn ids(list: &[StageId]) -> Vec<&str> {
        list.iter().map(|s| s.as_str()).collect()
    }

    fn branching() -> PowerTree {
        let mut tree = PowerTree::new();
        tree.add_node(Stage::source("vbat", SourceParams::new(12.0, 3.0)))
            .unwrap();
        tree.add_node(Stage::ldo("ldo5", LdoParams::new(5.0, 1.0)))
            .unwrap();
        tree.add_node(Stage::ldo("ldo3", LdoParams::new(3.3, 1.0)))
            .unwrap();
        tree.add_node(Stage::load("a", LoadParams::current(0.1)))
            .unwrap();
        tree.add_node(Stage::load("b", LoadParams::current(0.2)))
            .unwrap();
        tree.connect(&id("vbat"), &id("ldo5")).unwrap();
        tree.connect(&id("ldo5"), &id("a")).unwrap();
        tree.connect(&id("vbat"), &id("ldo3")).unwrap();
        tree.connect(&id("ldo3"), &id("b")).unwrap();
        tree
    }

    #[test]
    fn test_traversal_orders() {
        let topo = Topology::analyze(&branching());
        assert!(topo.is_valid());
        assert_eq!(ids(&topo.preorder()), vec!["vbat", "ldo5", "a", "ldo3", "b"]);
        assert_eq!(ids(&topo.postorder()), vec!["a", "ldo5", "b", "ldo3", "vbat"]);
        assert_eq!(topo.parent(&id("b")), Some(&id("ldo3")));
    }

    #[test]
    fn test_unpowered_stage_is_blocked() {
        let mut tree = branching();
        tree.add_node(Stage::ldo("stray", LdoParams::new(1.8, 0.3)))
            .unwrap();
        tree.add_node(Stage::load("c", LoadParams::current(0.05)))
            .unwrap();
        tree.connect(&id("stray"), &id("c")).unwrap();

        let topo = Topology::analyze(&tree);
        assert_eq!(topo.diagnostics().len(), 1);
        assert_eq!(topo.diagnostics()[0].code, DiagnosticCode::UnpoweredStage);
        assert!(topo.is_blocked(&id("stray")));
        assert!(topo.is_blocked(&id("c")));
        assert!(!topo.is_blocked(&id("a")));
    }

    #[test]
    fn test_loaded_multi_parent_and_cycle() {
        let mut tree = branching();
        tree.push_edge_unchecked(Edge::new("ldo5", "b"));
        tree.add_node(Stage::ldo("x", LdoParams::new(5.0, 1.0))).unwrap();
        tree.add_node(Stage::ldo("y", LdoParams::new(5.0, 1.0))).unwrap();
        tree.push_edge_unchecked(Edge::new("x", "y"));
        tree.push_edge_unchecked(Edge::new("y", "x"));

        let topo = Topology::analyze(&tree);
        let codes: Vec<_> = topo.diagnostics().iter().map(|d| d.code).collect();
        assert_eq!(
            codes,
            vec![DiagnosticCode::MultiParent, DiagnosticCode::StructuralCycle]
        );
        assert!(topo.diagnostics()[1].message.contains("y -> x -> y"));
        assert!(topo.is_blocked(&id("b")));
        assert!(topo.is_blocked(&id("x")));
        assert!(!topo.is_blocked(&id("ldo3")));
        assert!(topo.children(&id("ldo3")).is_empty());
    }

    #[test]
    fn test_loaded_illegal_edges_ignored() {
        let mut tree = branching();
        tree.add_node(Stage::source("usb", SourceParams::new(5.0, 0.5)))
            .unwrap();
        tree.push_edge_unchecked(Edge::new("ldo5", "usb"));

        let topo = Topology::analyze(&tree);
        assert_eq!(topo.diagnostics().len(), 1);
        assert_eq!(topo.diagnostics()[0].code, DiagnosticCode::InvalidEdge);
        assert_eq!(topo.diagnostics()[0].node_id, Some(id("usb")));
        // the source still counts as a root once its bad feed is ignored
        assert!(!topo.is_blocked(&id("usb")));
    }
}
