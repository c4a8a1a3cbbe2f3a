//! Stage arena and connectivity.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Result, StructuralError};
use crate::stage::{Stage, StageId, StageInfo, StageKind};

/// A directed feed from a parent's output rail to a child's input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub parent: StageId,
    pub child: StageId,
}

impl Edge {
    pub fn new(parent: impl Into<StageId>, child: impl Into<StageId>) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
        }
    }
}

/// A forest of power stages.
///
/// Stages iterate in insertion order and edges in connection order, which
/// keeps every traversal (and so every result) deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerTree {
    stages: IndexMap<StageId, Stage>,
    edges: Vec<Edge>,
}

impl PowerTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn contains(&self, id: &StageId) -> bool {
        self.stages.contains_key(id)
    }

    /// Look up a stage.
    pub fn stage(&self, id: &StageId) -> Option<&Stage> {
        self.stages.get(id)
    }

    /// All stages in insertion order.
    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.values()
    }

    /// All edges in connection order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Mutable access to a stage's metadata.
    pub fn info_mut(&mut self, id: &StageId) -> Option<&mut StageInfo> {
        self.stages.get_mut(id).map(|s| &mut s.info)
    }

    /// Add an unconnected stage.
    pub fn add_node(&mut self, stage: Stage) -> Result<StageId> {
        if self.stages.contains_key(&stage.id) {
            return Err(StructuralError::DuplicateNode { id: stage.id }.into());
        }
        let id = stage.id.clone();
        debug!(stage = %id, kind = %stage.stage_type(), "adding stage");
        self.stages.insert(id.clone(), stage);
        Ok(id)
    }

    /// Remove a stage that powers nothing, along with its feed.
    ///
    /// Fails with [`StructuralError::HasChildren`] rather than orphaning
    /// downstream stages; use [`PowerTree::remove_subtree`] for that.
    pub fn remove_node(&mut self, id: &StageId) -> Result<Stage> {
        self.require(id)?;
        let children = self.edges.iter().filter(|e| &e.parent == id).count();
        if children > 0 {
            return Err(StructuralError::HasChildren {
                id: id.clone(),
                children,
            }
            .into());
        }
        self.edges.retain(|e| &e.child != id);
        debug!(stage = %id, "removed stage");
        self.stages
            .shift_remove(id)
            .ok_or_else(|| StructuralError::NodeNotFound { id: id.clone() }.into())
    }

    /// Remove a stage and everything downstream of it.
    ///
    /// Returns the removed stages, the subtree root first.
    pub fn remove_subtree(&mut self, id: &StageId) -> Result<Vec<Stage>> {
        self.require(id)?;

        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let mut children = self.children_of(&current);
            children.reverse();
            stack.extend(children.into_iter().cloned());
            order.push(current);
        }

        self.edges
            .retain(|e| !seen.contains(&e.parent) && !seen.contains(&e.child));
        let removed: Vec<Stage> = order
            .iter()
            .filter_map(|sid| self.stages.shift_remove(sid))
            .collect();
        debug!(stage = %id, count = removed.len(), "removed subtree");
        Ok(removed)
    }

    /// Feed `child` from `parent`'s output rail.
    ///
    /// Rejects the edge, leaving the tree untouched, when it would give the
    /// child a second parent, close a cycle, hang a stage off a load, or feed
    /// a source.
    pub fn connect(&mut self, parent: &StageId, child: &StageId) -> Result<()> {
        let parent_stage = self.require(parent)?;
        let child_stage = self.require(child)?;

        if parent == child {
            return Err(StructuralError::Cycle {
                parent: parent.clone(),
                child: child.clone(),
            }
            .into());
        }
        if !parent_stage.kind.has_output() {
            return Err(StructuralError::LoadOutput {
                parent: parent.clone(),
                child: child.clone(),
            }
            .into());
        }
        if !child_stage.kind.has_input() {
            return Err(StructuralError::SourceInput {
                parent: parent.clone(),
                child: child.clone(),
            }
            .into());
        }
        if let Some(existing) = self.parent_of(child) {
            return Err(StructuralError::MultiParent {
                child: child.clone(),
                existing: existing.clone(),
            }
            .into());
        }
        if self.is_upstream(child, parent) {
            return Err(StructuralError::Cycle {
                parent: parent.clone(),
                child: child.clone(),
            }
            .into());
        }

        debug!(%parent, %child, "connecting");
        self.edges.push(Edge::new(parent.clone(), child.clone()));
        Ok(())
    }

    /// Cut the feed of `child`, returning the stage that powered it.
    pub fn disconnect(&mut self, child: &StageId) -> Result<Option<StageId>> {
        self.require(child)?;
        let previous = self.parent_of(child).cloned();
        self.edges.retain(|e| &e.child != child);
        if let Some(parent) = &previous {
            debug!(%parent, %child, "disconnected");
        }
        Ok(previous)
    }

    /// Replace a stage's parameters, possibly changing its kind.
    ///
    /// A stage that is fed cannot become a source and a stage that powers
    /// others cannot become a load.
    pub fn set_kind(&mut self, id: &StageId, kind: StageKind) -> Result<()> {
        self.require(id)?;
        if !kind.has_input() && self.parent_of(id).is_some() {
            return Err(StructuralError::KindConflict {
                id: id.clone(),
                kind: kind.stage_type().as_str(),
                message: "it is powered by another stage".to_string(),
            }
            .into());
        }
        if !kind.has_output() && !self.children_of(id).is_empty() {
            return Err(StructuralError::KindConflict {
                id: id.clone(),
                kind: kind.stage_type().as_str(),
                message: "it powers other stages".to_string(),
            }
            .into());
        }
        if let Some(stage) = self.stages.get_mut(id) {
            stage.kind = kind;
        }
        Ok(())
    }

    /// The stage feeding `id`, if any.
    pub fn parent_of(&self, id: &StageId) -> Option<&StageId> {
        self.edges.iter().find(|e| &e.child == id).map(|e| &e.parent)
    }

    /// Stages fed directly by `id`, in connection order.
    pub fn children_of(&self, id: &StageId) -> Vec<&StageId> {
        self.edges
            .iter()
            .filter(|e| &e.parent == id)
            .map(|e| &e.child)
            .collect()
    }

    /// Stages with no feed, in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = &Stage> {
        self.stages
            .values()
            .filter(|s| !self.edges.iter().any(|e| e.child == s.id))
    }

    /// Number of series stages along the longest chain starting at `id`.
    /// A stage powering nothing has depth 1.
    pub fn depth(&self, id: &StageId) -> Option<usize> {
        self.stage(id)?;

        let mut children: HashMap<&StageId, Vec<&StageId>> = HashMap::new();
        for edge in &self.edges {
            children.entry(&edge.parent).or_default().push(&edge.child);
        }

        // Explicit DFS: (stage, index of the next child to visit). A stage
        // already on the path is skipped so loaded cycles still terminate.
        let mut path: Vec<(&StageId, usize)> = vec![(id, 0)];
        let mut on_path: HashSet<&StageId> = HashSet::from([id]);
        let mut deepest = 1;
        while let Some(&(current, next)) = path.last() {
            match children.get(current).and_then(|c| c.get(next)).copied() {
                Some(child) => {
                    if let Some(top) = path.last_mut() {
                        top.1 += 1;
                    }
                    if on_path.insert(child) {
                        path.push((child, 0));
                        deepest = deepest.max(path.len());
                    }
                }
                None => {
                    on_path.remove(current);
                    path.pop();
                }
            }
        }
        Some(deepest)
    }

    /// Whether `ancestor` feeds `id` through any chain of edges.
    fn is_upstream(&self, ancestor: &StageId, id: &StageId) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            for edge in self.edges.iter().filter(|e| &e.child == current) {
                if &edge.parent == ancestor {
                    return true;
                }
                stack.push(&edge.parent);
            }
        }
        false
    }

    fn require(&self, id: &StageId) -> Result<&Stage> {
        self.stages
            .get(id)
            .ok_or_else(|| StructuralError::NodeNotFound { id: id.clone() }.into())
    }

    /// Append an edge without enforcing tree invariants.
    ///
    /// Only for restoring snapshots: the codec has already checked both ids
    /// exist, and [`Topology`](super::Topology) reports anything else wrong.
    pub(crate) fn push_edge_unchecked(&mut self, edge: Edge) {
        self.edges.push(edge);
    }
}
