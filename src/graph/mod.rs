//! The in-memory workflow graph: flat arenas of nodes and ordered edges.
//!
//! Nodes and edges are stored by integer id, with edges as index pairs, so
//! the DAG carries no owning pointer cycles and ancestor/descendant walks
//! stay cheap. Dirty state propagates through `data_updated`: any
//! kind-relevant edit bumps the node and all its descendants, which in turn
//! invalidates memoized schemas. Cosmetic edits (position, display label)
//! never dirty anything.

use crate::backend::SchemaRegistry;
use crate::compiler::Compiler;
use crate::error::{CompileError, CycleError, GraphError};
use crate::rel::RelExpr;
use crate::schema::Schema;
use ahash::AHashMap;
use chrono::{DateTime, Utc};
use std::fmt;

pub mod node;

pub use node::*;

/// Index of a node in its workflow's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One transformation step in a workflow.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Canvas position, cosmetic only.
    pub x: f64,
    pub y: f64,
    /// Display name, cosmetic only.
    pub label: Option<String>,
    /// Wall-clock time of the last kind-relevant change to this node or an
    /// ancestor.
    pub data_updated: DateTime<Utc>,
    /// Logical stamp backing the schema memo; advances with `data_updated`.
    pub(crate) stamp: u64,
    /// Last compile error, kept for inline UI display. Compilation itself
    /// reports through `Result`; this is a record, not shared state.
    pub error: Option<String>,
}

/// An ordered parent → child relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub parent: NodeId,
    pub child: NodeId,
    /// 0-based slot on the child; meaningful for order-sensitive kinds.
    pub position: u32,
}

/// A workflow's DAG of nodes, with memoized schema propagation.
#[derive(Debug, Default)]
pub struct WorkflowGraph {
    nodes: Vec<Option<Node>>,
    edges: Vec<Edge>,
    clock: u64,
    schema_cache: AHashMap<NodeId, (u64, Schema)>,
}

impl WorkflowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.clock += 1;
        self.nodes.push(Some(Node {
            id,
            kind,
            x: 0.0,
            y: 0.0,
            label: None,
            data_updated: Utc::now(),
            stamp: self.clock,
            error: None,
        }));
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize).and_then(|n| n.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, GraphError> {
        self.nodes
            .get_mut(id.0 as usize)
            .and_then(|n| n.as_mut())
            .ok_or(GraphError::NodeNotFound { node_id: id.0 })
    }

    fn require(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.node(id)
            .ok_or(GraphError::NodeNotFound { node_id: id.0 })
    }

    /// Live nodes, in arena order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter_map(|n| n.as_ref())
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Connects `parent` to `child` at the given slot. An edge that would
    /// close a cycle is rejected before any mutation.
    pub fn connect(&mut self, parent: NodeId, child: NodeId, position: u32) -> Result<(), GraphError> {
        self.require(parent)?;
        self.require(child)?;
        if self
            .edges
            .iter()
            .any(|e| e.child == child && e.position == position)
        {
            return Err(GraphError::PositionTaken {
                child: child.0,
                position,
            });
        }
        if parent == child || self.is_reachable(child, parent) {
            return Err(GraphError::Cycle(CycleError(format!(
                "edge {} -> {} would close a cycle",
                parent, child
            ))));
        }
        self.edges.push(Edge {
            parent,
            child,
            position,
        });
        self.touch(child);
        Ok(())
    }

    pub fn disconnect(&mut self, parent: NodeId, child: NodeId) -> Result<(), GraphError> {
        self.require(parent)?;
        self.require(child)?;
        self.edges
            .retain(|e| !(e.parent == parent && e.child == child));
        self.touch(child);
        Ok(())
    }

    /// Removes a node, cascading to every edge that references it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        self.require(id)?;
        let children: Vec<NodeId> = self.children(id);
        self.edges.retain(|e| e.parent != id && e.child != id);
        self.nodes[id.0 as usize] = None;
        self.schema_cache.remove(&id);
        for child in children {
            self.touch(child);
        }
        Ok(())
    }

    /// Replaces the node's kind-specific configuration. Dirties the node and
    /// all descendants.
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) -> Result<(), GraphError> {
        self.node_mut(id)?.kind = kind;
        self.touch(id);
        Ok(())
    }

    /// Moves the node on the canvas. Never dirties data.
    pub fn set_position(&mut self, id: NodeId, x: f64, y: f64) -> Result<(), GraphError> {
        let node = self.node_mut(id)?;
        node.x = x;
        node.y = y;
        Ok(())
    }

    /// Renames the node's display label. Never dirties data.
    pub fn set_label(&mut self, id: NodeId, label: Option<String>) -> Result<(), GraphError> {
        self.node_mut(id)?.label = label;
        Ok(())
    }

    /// Parent ids ordered by edge position.
    pub fn parents(&self, id: NodeId) -> Vec<NodeId> {
        let mut edges: Vec<&Edge> = self.edges.iter().filter(|e| e.child == id).collect();
        edges.sort_by_key(|e| e.position);
        edges.iter().map(|e| e.parent).collect()
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = self
            .edges
            .iter()
            .filter(|e| e.parent == id)
            .map(|e| e.child)
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// All nodes reachable downstream of `id`, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut seen = Vec::new();
        let mut stack = self.children(id);
        while let Some(next) = stack.pop() {
            if !seen.contains(&next) {
                seen.push(next);
                stack.extend(self.children(next));
            }
        }
        seen
    }

    fn is_reachable(&self, from: NodeId, to: NodeId) -> bool {
        from == to || self.descendants(from).contains(&to)
    }

    /// Bumps the dirty stamp on `id` and everything downstream of it.
    fn touch(&mut self, id: NodeId) {
        self.clock += 1;
        let now = Utc::now();
        let mut targets = self.descendants(id);
        targets.push(id);
        for target in targets {
            if let Some(node) = self.nodes.get_mut(target.0 as usize).and_then(|n| n.as_mut()) {
                node.stamp = self.clock;
                node.data_updated = now;
            }
            self.schema_cache.remove(&target);
        }
    }

    /// Kahn's algorithm over the live node set. Returns a topological order,
    /// or the cycle that prevents one.
    pub fn validate_acyclic(&self) -> Result<Vec<NodeId>, CycleError> {
        let live: Vec<NodeId> = self.nodes().map(|n| n.id).collect();
        let mut in_degree: AHashMap<NodeId, usize> =
            live.iter().map(|id| (*id, 0)).collect();
        for edge in &self.edges {
            *in_degree.entry(edge.child).or_insert(0) += 1;
        }

        let mut queue: Vec<NodeId> = live
            .iter()
            .filter(|id| in_degree[*id] == 0)
            .copied()
            .collect();
        queue.sort();

        let mut sorted = Vec::with_capacity(live.len());
        while let Some(id) = queue.pop() {
            sorted.push(id);
            for child in self.children(id) {
                let deg = in_degree.entry(child).or_insert(0);
                *deg -= 1;
                if *deg == 0 {
                    queue.push(child);
                }
            }
        }

        if sorted.len() != live.len() {
            return Err(CycleError("workflow node graph is not acyclic".into()));
        }
        Ok(sorted)
    }

    /// Most recent `data_updated` across all nodes; drives `out_of_date`.
    pub fn max_data_updated(&self) -> Option<DateTime<Utc>> {
        self.nodes().map(|n| n.data_updated).max()
    }

    /// Output nodes in arena order.
    pub fn output_nodes(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|n| matches!(n.kind, NodeKind::Output(_)))
            .map(|n| n.id)
            .collect()
    }

    /// Compiles the node and records the outcome on it: the last error is
    /// stored for UI display on failure and cleared on success. The output
    /// schema is memoized against the node's dirty stamp.
    pub fn compile_node(
        &mut self,
        id: NodeId,
        registry: &dyn SchemaRegistry,
    ) -> Result<RelExpr, CompileError> {
        let result = Compiler::new(&*self, registry).compile(id);
        let stamp = self.node(id).map(|n| n.stamp);
        match (&result, stamp) {
            (Ok(expr), Some(stamp)) => {
                self.schema_cache.insert(id, (stamp, expr.schema().clone()));
                if let Some(node) = self.nodes.get_mut(id.0 as usize).and_then(|n| n.as_mut()) {
                    node.error = None;
                }
            }
            (Err(err), Some(_)) => {
                let message = err.to_string();
                if let Some(node) = self.nodes.get_mut(id.0 as usize).and_then(|n| n.as_mut()) {
                    node.error = Some(message);
                }
            }
            _ => {}
        }
        result
    }

    /// The node's output schema. Served from the memo while neither the node
    /// nor any ancestor has changed; otherwise recompiled.
    pub fn schema_of(
        &mut self,
        id: NodeId,
        registry: &dyn SchemaRegistry,
    ) -> Result<Schema, CompileError> {
        if let (Some(node), Some((stamp, schema))) = (self.node(id), self.schema_cache.get(&id)) {
            if node.stamp == *stamp {
                return Ok(schema.clone());
            }
        }
        self.compile_node(id, registry).map(|expr| expr.schema().clone())
    }

    /// The last compile error recorded for the node, if any.
    pub fn last_error(&self, id: NodeId) -> Option<&str> {
        self.node(id).and_then(|n| n.error.as_deref())
    }
}
