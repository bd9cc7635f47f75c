use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::atomic::{AtomicU64, Ordering};

use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::*;

use super::{occupied_positions, position_to_glycoct, GlycanGraph, Link, Node, NodeId, NodeKind};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// A fresh identifier, never handed out before in this process.
pub(crate) fn next_node_id() -> u64 {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

fn position_key(position: Option<u16>) -> u16 {
    position.unwrap_or(u16::MAX)
}

fn node_key(node: &Node) -> String {
    match &node.kind {
        NodeKind::Monosaccharide(residue) => residue.to_glycoct(),
        NodeKind::Substituent(substituent) => substituent.name.to_string(),
    }
}

/// Canonical text for everything below `node`. Two subtrees get the same key
/// exactly when they hold the same residues joined the same way, whatever
/// order they were declared in.
fn subtree_key(
    graph: &GlycanGraph,
    node: NodeIndex,
    keys: &mut HashMap<NodeIndex, String>,
    visiting: &mut HashSet<NodeIndex>,
) -> String {
    if let Some(key) = keys.get(&node) {
        return key.clone();
    }
    if !visiting.insert(node) {
        return node_key(&graph[node]);
    }

    let edges: Vec<_> = graph
        .edges_directed(node, Direction::Outgoing)
        .map(|edge| (edge.target(), edge.weight().clone()))
        .collect();
    let mut branches: Vec<_> = edges
        .into_iter()
        .map(|(child, link)| {
            format!(
                "{}{}+{}{}{{{}}}",
                position_to_glycoct(link.parent_position),
                link.parent_atom.to_glycoct(),
                position_to_glycoct(link.child_position),
                link.child_atom.to_glycoct(),
                subtree_key(graph, child, keys, visiting)
            )
        })
        .collect();
    branches.sort();

    visiting.remove(&node);
    let key = format!("{}[{}]", node_key(&graph[node]), branches.join(","));
    keys.insert(node, key.clone());
    key
}

fn subtree_keys(graph: &GlycanGraph) -> HashMap<NodeIndex, String> {
    let mut keys = HashMap::new();
    let mut visiting = HashSet::new();
    for node in graph.node_indices() {
        subtree_key(graph, node, &mut keys, &mut visiting);
    }
    keys
}

/// Outgoing edges of `node`, ordered by parent position, then child
/// position, then the child's subtree key when `keys` is given, then
/// insertion order.
fn ordered_children(
    graph: &GlycanGraph,
    node: NodeIndex,
    keys: Option<&HashMap<NodeIndex, String>>,
) -> Vec<(EdgeIndex, NodeIndex)> {
    let mut children: Vec<_> = graph
        .edges_directed(node, Direction::Outgoing)
        .map(|edge| {
            let link = edge.weight();
            let subtree = keys
                .and_then(|keys| keys.get(&edge.target()))
                .cloned()
                .unwrap_or_default();
            (
                (
                    position_key(link.parent_position),
                    position_key(link.child_position),
                    subtree,
                    edge.id().index(),
                ),
                edge.id(),
                edge.target(),
            )
        })
        .collect();
    children.sort_by(|(a, ..), (b, ..)| a.cmp(b));
    children
        .into_iter()
        .map(|(_, edge, child)| (edge, child))
        .collect()
}

/// Depth-first pre-order from `root`. Children are visited before parents
/// reached through an incoming edge.
fn traversal_order(
    graph: &GlycanGraph,
    root: NodeIndex,
    keys: &HashMap<NodeIndex, String>,
) -> Vec<NodeIndex> {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if !visited.insert(node) {
            continue;
        }
        order.push(node);

        let mut parents: Vec<_> = graph
            .edges_directed(node, Direction::Incoming)
            .map(|edge| (edge.id().index(), edge.source()))
            .collect();
        parents.sort();
        for (_, parent) in parents.into_iter().rev() {
            if !visited.contains(&parent) {
                stack.push(parent);
            }
        }
        for (_, child) in ordered_children(graph, node, Some(keys)).into_iter().rev() {
            if !visited.contains(&child) {
                stack.push(child);
            }
        }
    }
    order
}

/// A finished glycan: a rooted graph of residues and substituents where
/// every node carries a unique global identifier.
#[derive(Clone)]
pub struct Glycan {
    graph: GlycanGraph,
    root: NodeIndex,
}

impl Glycan {
    /// Build a glycan from everything reachable from `root` in `source`.
    ///
    /// Nodes are stored in traversal order, so the root is always at index 0,
    /// and each receives a fresh global identifier. Siblings sharing a
    /// position are ordered by structure, so the layout never depends on the
    /// order links were declared in.
    pub fn from_root(source: &GlycanGraph, root: NodeIndex) -> Self {
        let keys = subtree_keys(source);
        let order = traversal_order(source, root, &keys);
        if order.len() < source.node_count() {
            let reachable: HashSet<_> = order.iter().copied().collect();
            for node in source.node_indices().filter(|n| !reachable.contains(n)) {
                warn!(
                    "Dropping node {} which is not connected to the root {}",
                    source[node].id, source[root].id
                );
            }
        }

        let mut graph = GlycanGraph::default();
        let mut mapping = HashMap::new();
        for &old in &order {
            let new = graph.add_node(source[old].with_id(NodeId::Global(next_node_id())));
            mapping.insert(old, new);
        }
        for &old in &order {
            for (edge, child) in ordered_children(source, old, Some(&keys)) {
                if let Some(&new_child) = mapping.get(&child) {
                    graph.add_edge(mapping[&old], new_child, source[edge].clone());
                }
            }
        }

        Self {
            graph,
            root: mapping[&root],
        }
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn root_node(&self) -> &Node {
        &self.graph[self.root]
    }

    pub fn graph(&self) -> &GlycanGraph {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Nodes in traversal order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.graph.node_indices().map(move |ix| (ix, &self.graph[ix]))
    }

    pub fn node(&self, ix: NodeIndex) -> &Node {
        &self.graph[ix]
    }

    /// Look a node up by its global identifier.
    pub fn get(&self, id: u64) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .find(|&ix| self.graph[ix].id == NodeId::Global(id))
    }

    /// Children in canonical order: edges were inserted that way.
    pub fn children(&self, ix: NodeIndex) -> Vec<(NodeIndex, &Link)> {
        ordered_children(&self.graph, ix, None)
            .into_iter()
            .map(|(edge, child)| (child, &self.graph[edge]))
            .collect()
    }

    pub fn parents(&self, ix: NodeIndex) -> Vec<(NodeIndex, &Link)> {
        self.graph
            .edges_directed(ix, Direction::Incoming)
            .map(|edge| (edge.source(), edge.weight()))
            .collect()
    }

    /// Nodes without children.
    pub fn leaves(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&ix| {
                self.graph
                    .edges_directed(ix, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .collect()
    }

    pub fn occupied_positions(&self, ix: NodeIndex) -> BTreeSet<u16> {
        occupied_positions(&self.graph, ix)
    }

    /// A structurally identical copy whose nodes have fresh identifiers.
    pub fn clone_structure(&self) -> Self {
        Self::from_root(&self.graph, self.root)
    }
}

impl PartialEq for Glycan {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.link_count() == other.link_count()
            && self.to_glycoct() == other.to_glycoct()
    }
}

impl Eq for Glycan {}

impl Debug for Glycan {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Glycan")
            .field("root", &self.root_node().id)
            .field("nodes", &self.len())
            .field("links", &self.link_count())
            .finish()
    }
}
