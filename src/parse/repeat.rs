use std::collections::{BTreeMap, HashMap};

use petgraph::stable_graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::*;

use super::{Linkage, Location, Multiplicity};
use crate::*;

/// The number after `r` in a repeat stub, and after `REP` in its header.
pub type RepeatId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Unknown,
    Ranging,
    Exact,
}

/// Which end of an expanded repeat a lookup wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The first copy, where incoming links land.
    In,
    /// The last copy, where outgoing links leave.
    Out,
}

fn bound_to_string(bound: Option<u32>) -> String {
    bound.map_or_else(|| "-1".to_string(), |b| b.to_string())
}

impl Multiplicity {
    pub fn new(lower: Option<u32>, upper: Option<u32>) -> Self {
        Self { lower, upper }
    }

    pub fn precision(&self) -> Precision {
        match (self.lower, self.upper) {
            (Some(lower), Some(upper)) if lower == upper => Precision::Exact,
            (Some(_), Some(_)) => Precision::Ranging,
            _ => Precision::Unknown,
        }
    }

    /// The copy count used when none is requested: the upper bound, else the
    /// lower bound, else one.
    pub fn default_count(&self) -> u32 {
        self.upper.or(self.lower).unwrap_or(1)
    }

    /// Check a copy count against the bounds. Only enforced when both bounds
    /// are known; a repeat always has at least one copy.
    pub fn validate(&self, n: u32) -> Result<u32> {
        let bounds = self.lower.unwrap_or(1)..=self.upper.unwrap_or(u32::MAX);
        let out_of_range = self.precision() != Precision::Unknown && !bounds.contains(&n);
        if n == 0 || out_of_range {
            return Err(GlycoctError::Range {
                requested: n,
                lower: bound_to_string(self.lower),
                upper: bound_to_string(self.upper),
            });
        }
        Ok(n)
    }
}

/// A repeated subunit: the nodes captured for one copy, and how copies chain
/// together.
#[derive(Debug, Clone)]
pub struct RepeatRecord {
    /// The document index of the stub line standing in for this repeat.
    pub index: usize,
    pub repeat: RepeatId,
    /// How copy `i` links to copy `i + 1`. Links from outside the repeat use
    /// the same ends.
    pub linkage: Option<Linkage>,
    pub multiplicity: Multiplicity,
    stub: String,
    line: usize,
    template: BTreeMap<usize, NodeIndex>,
    copies: Vec<BTreeMap<usize, NodeIndex>>,
}

impl RepeatRecord {
    pub(crate) fn new(index: usize, repeat: RepeatId, at: &Location) -> Self {
        Self {
            index,
            repeat,
            linkage: None,
            multiplicity: Multiplicity::default(),
            stub: at.token.to_string(),
            line: at.line,
            template: BTreeMap::new(),
            copies: Vec::new(),
        }
    }

    fn error(&self, reason: String) -> GlycoctError {
        GlycoctError::format(self.line, &self.stub, reason)
    }

    pub(crate) fn insert(&mut self, local: usize, node: NodeIndex) -> bool {
        self.template.insert(local, node).is_none()
    }

    /// A captured node, only meaningful before expansion.
    pub(crate) fn template_node(&self, local: usize) -> Option<NodeIndex> {
        if self.is_expanded() {
            return None;
        }
        self.template.get(&local).copied()
    }

    pub fn is_expanded(&self) -> bool {
        !self.copies.is_empty()
    }

    pub fn copy_count(&self) -> usize {
        self.copies.len()
    }

    /// Replace the captured nodes in `graph` with `n` decorated copies
    /// chained by the internal linkage. `n` defaults from the bounds.
    /// Expanding twice is a no-op.
    pub fn expand(&mut self, graph: &mut GlycanGraph, requested: Option<u32>) -> Result<()> {
        if self.is_expanded() {
            return Ok(());
        }
        let linkage = self
            .linkage
            .clone()
            .ok_or_else(|| self.error(format!("repeat {} has no REP{} header", self.repeat, self.repeat)))?;
        if self.template.is_empty() {
            return Err(self.error(format!("repeat {} has no residues", self.repeat)));
        }
        for local in [linkage.parent, linkage.child] {
            if !self.template.contains_key(&local) {
                return Err(GlycoctError::UnresolvedReference(local));
            }
        }
        let n = self
            .multiplicity
            .validate(requested.unwrap_or_else(|| self.multiplicity.default_count()))?;
        debug!("Expanding repeat {} into {} copies", self.repeat, n);

        let locals: HashMap<NodeIndex, usize> =
            self.template.iter().map(|(&local, &ix)| (ix, local)).collect();
        let mut internal: Vec<_> = self
            .template
            .values()
            .flat_map(|&ix| graph.edges_directed(ix, Direction::Outgoing))
            .filter_map(|edge| {
                let child = locals.get(&edge.target())?;
                Some((edge.id().index(), locals[&edge.source()], *child, edge.weight().clone()))
            })
            .collect();
        internal.sort_by_key(|(order, ..)| *order);

        let mut copies = Vec::with_capacity(n as usize);
        for copy in 1..=n {
            let mut mapping = BTreeMap::new();
            for (&local, &ix) in &self.template {
                let clone = graph[ix].with_id(NodeId::Decorated { copy, local });
                mapping.insert(local, graph.add_node(clone));
            }
            for (_, parent, child, link) in &internal {
                graph.add_edge(mapping[parent], mapping[child], link.clone());
            }
            trace!("Repeat {} copy {} has {} nodes", self.repeat, copy, mapping.len());
            copies.push(mapping);
        }

        for pair in copies.windows(2) {
            form_link(graph, pair[0][&linkage.parent], pair[1][&linkage.child], &linkage.spec)?;
        }

        for &ix in self.template.values() {
            graph.remove_node(ix);
        }
        self.copies = copies;
        Ok(())
    }

    /// The copy of `local` at one end of the expanded chain.
    pub fn get_node(&self, local: usize, side: Side) -> Option<NodeIndex> {
        let copy = match side {
            Side::In => self.copies.first(),
            Side::Out => self.copies.last(),
        }?;
        copy.get(&local).copied()
    }

    /// The node a link from outside attaches to.
    pub fn attachment(&self, side: Side) -> Result<NodeIndex> {
        let linkage = self
            .linkage
            .as_ref()
            .ok_or_else(|| self.error(format!("repeat {} has no REP{} header", self.repeat, self.repeat)))?;
        let local = match side {
            Side::In => linkage.child,
            Side::Out => linkage.parent,
        };
        self.get_node(local, side)
            .ok_or(GlycoctError::UnresolvedReference(local))
    }

    pub fn entry(&self) -> Result<NodeIndex> {
        self.attachment(Side::In)
    }

    pub fn exit(&self) -> Result<NodeIndex> {
        self.attachment(Side::Out)
    }

    /// The first copy's lowest-indexed node, or its parent when that node is
    /// a substituent.
    pub fn root(&self, graph: &GlycanGraph) -> Result<NodeIndex> {
        let ix = self
            .copies
            .first()
            .and_then(|copy| copy.values().next().copied())
            .ok_or_else(|| self.error(format!("repeat {} was never expanded", self.repeat)))?;
        if graph[ix].is_substituent() {
            if let Some(edge) = graph.edges_directed(ix, Direction::Incoming).next() {
                return Ok(edge.source());
            }
        }
        Ok(ix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(parent: u16, child: u16) -> LinkSpec {
        LinkSpec {
            parent_atom: LinkAtom::O,
            parent_positions: vec![Some(parent)],
            child_atom: LinkAtom::D,
            child_positions: vec![Some(child)],
            id: None,
        }
    }

    /// A two-residue unit 2 -(4+1)-> 3, chained 3 -(3+1)-> 2.
    fn record(graph: &mut GlycanGraph, multiplicity: Multiplicity) -> RepeatRecord {
        let at = Location {
            line: 1,
            token: "1r:r1",
        };
        let mut record = RepeatRecord::new(1, 1, &at);
        let two = graph.add_node(Node::monosaccharide(
            NodeId::Local(2),
            Monosaccharide::new(SuperClass::Hex),
        ));
        let three = graph.add_node(Node::monosaccharide(
            NodeId::Local(3),
            Monosaccharide::new(SuperClass::Pen),
        ));
        form_link(graph, two, three, &spec(4, 1)).unwrap();
        record.insert(2, two);
        record.insert(3, three);
        record.linkage = Some(Linkage {
            parent: 3,
            child: 2,
            spec: spec(3, 1),
        });
        record.multiplicity = multiplicity;
        record
    }

    #[test]
    fn test_default_counts() {
        assert_eq!(Multiplicity::new(Some(2), Some(4)).default_count(), 4);
        assert_eq!(Multiplicity::new(None, Some(3)).default_count(), 3);
        assert_eq!(Multiplicity::new(Some(2), None).default_count(), 2);
        assert_eq!(Multiplicity::new(None, None).default_count(), 1);
    }

    #[test]
    fn test_precision() {
        assert_eq!(Multiplicity::new(Some(2), Some(2)).precision(), Precision::Exact);
        assert_eq!(Multiplicity::new(Some(2), Some(4)).precision(), Precision::Ranging);
        assert_eq!(Multiplicity::new(None, Some(4)).precision(), Precision::Unknown);
    }

    #[test]
    fn test_validate() {
        let bounded = Multiplicity::new(Some(2), Some(4));
        assert_eq!(bounded.validate(3).unwrap(), 3);
        assert!(matches!(bounded.validate(5), Err(GlycoctError::Range { requested: 5, .. })));
        assert!(matches!(bounded.validate(1), Err(GlycoctError::Range { .. })));
        assert_eq!(Multiplicity::new(Some(2), None).validate(10).unwrap(), 10);
        assert!(Multiplicity::default().validate(0).is_err());
    }

    #[test]
    fn test_validate_by_precision() {
        let exact = Multiplicity::new(Some(3), Some(3));
        assert_eq!(exact.precision(), Precision::Exact);
        assert_eq!(exact.validate(3).unwrap(), 3);
        assert!(matches!(
            exact.validate(2),
            Err(GlycoctError::Range { requested: 2, .. })
        ));

        // Either bound missing leaves the count unchecked apart from zero.
        for open in [Multiplicity::new(None, Some(4)), Multiplicity::new(Some(5), None)] {
            assert_eq!(open.precision(), Precision::Unknown);
            assert_eq!(open.validate(1).unwrap(), 1);
            assert_eq!(open.validate(9).unwrap(), 9);
            assert!(open.validate(0).is_err());
        }
    }

    #[test]
    fn test_expand_chains_copies() -> Result<()> {
        let mut graph = GlycanGraph::default();
        let mut record = record(&mut graph, Multiplicity::new(Some(2), Some(4)));
        record.expand(&mut graph, None)?;

        assert_eq!(record.copy_count(), 4);
        assert_eq!(graph.node_count(), 8);
        // 4 internal links plus 3 joining consecutive copies.
        assert_eq!(graph.edge_count(), 7);

        let entry = record.entry()?;
        let exit = record.exit()?;
        assert_eq!(graph[entry].id, NodeId::Decorated { copy: 1, local: 2 });
        assert_eq!(graph[exit].id, NodeId::Decorated { copy: 4, local: 3 });

        let joins: Vec<_> = graph
            .edge_indices()
            .filter(|&e| graph[e].parent_position == Some(3))
            .map(|e| {
                let (p, c) = graph.edge_endpoints(e).unwrap();
                (graph[p].id, graph[c].id)
            })
            .collect();
        assert_eq!(joins.len(), 3);
        assert!(joins.contains(&(
            NodeId::Decorated { copy: 1, local: 3 },
            NodeId::Decorated { copy: 2, local: 2 }
        )));

        // A second expansion changes nothing.
        record.expand(&mut graph, Some(2))?;
        assert_eq!(graph.node_count(), 8);
        assert_eq!(record.root(&graph)?, entry);
        Ok(())
    }

    #[test]
    fn test_expand_requested_count_out_of_range() {
        let mut graph = GlycanGraph::default();
        let mut record = record(&mut graph, Multiplicity::new(Some(2), Some(4)));
        let result = record.expand(&mut graph, Some(6));
        assert!(matches!(result, Err(GlycoctError::Range { requested: 6, .. })));
        assert!(!record.is_expanded());
    }

    #[test]
    fn test_expand_without_header() {
        let mut graph = GlycanGraph::default();
        let mut record = record(&mut graph, Multiplicity::default());
        record.linkage = None;
        let result = record.expand(&mut graph, None);
        assert!(matches!(result, Err(GlycoctError::Format { line: 1, .. })));
    }
}
