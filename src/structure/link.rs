use std::collections::BTreeSet;
use std::fmt::{Display, Formatter, Result as FmtResult};

use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::*;

use super::GlycanGraph;
use crate::{GlycoctError, Result};

/// An attachment position on a residue. `None` is an unknown position
/// (written `-1`), which never occupies a site.
pub type Position = Option<u16>;

pub fn position_to_glycoct(position: Position) -> String {
    match position {
        Some(p) => p.to_string(),
        None => "-1".to_string(),
    }
}

/// The atom replaced at one end of a linkage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LinkAtom {
    O,
    D,
    H,
    N,
    X,
}

/// Atomic composition lost from a node when a bond forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Loss {
    Hydrogen,
    Hydroxyl,
}

impl Display for Loss {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Loss::Hydrogen => write!(f, "H"),
            Loss::Hydroxyl => write!(f, "OH"),
        }
    }
}

impl LinkAtom {
    pub fn from_glycoct(c: char) -> Option<Self> {
        match c {
            'o' => Some(LinkAtom::O),
            'd' => Some(LinkAtom::D),
            'h' => Some(LinkAtom::H),
            'n' => Some(LinkAtom::N),
            'x' => Some(LinkAtom::X),
            _ => None,
        }
    }

    pub fn to_glycoct(&self) -> char {
        match self {
            LinkAtom::O => 'o',
            LinkAtom::D => 'd',
            LinkAtom::H => 'h',
            LinkAtom::N => 'n',
            LinkAtom::X => 'x',
        }
    }

    /// `None` when the loss is unknown (`x`).
    pub fn loss(&self) -> Option<Loss> {
        match self {
            LinkAtom::O | LinkAtom::H | LinkAtom::N => Some(Loss::Hydrogen),
            LinkAtom::D => Some(Loss::Hydroxyl),
            LinkAtom::X => None,
        }
    }
}

/// Everything needed to instantiate a bond once both endpoints are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpec {
    pub parent_atom: LinkAtom,
    pub parent_positions: Vec<Position>,
    pub child_atom: LinkAtom,
    pub child_positions: Vec<Position>,
    /// The index of the declaring linkage line, if any.
    pub id: Option<usize>,
}

impl LinkSpec {
    pub fn is_ambiguous(&self) -> bool {
        self.parent_positions.len() > 1 || self.child_positions.len() > 1
    }

    /// The link as seen from inside a repeat: when the outside parent only
    /// gives up a hydrogen, the repeat's entry node gives up the hydroxyl.
    pub(crate) fn into_repeat_entry(mut self) -> Self {
        if self.parent_atom.loss() == Some(Loss::Hydrogen) {
            self.child_atom = LinkAtom::D;
        }
        self
    }
}

/// A directed bond from a parent node to a child node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    pub parent_position: Position,
    pub child_position: Position,
    pub parent_atom: LinkAtom,
    pub child_atom: LinkAtom,
    pub id: Option<usize>,
    /// Candidate positions in declaration order. A single entry for an
    /// unambiguous link.
    pub parent_choices: Vec<Position>,
    pub child_choices: Vec<Position>,
}

impl Link {
    pub fn new(parent_position: Position, child_position: Position) -> Self {
        Self {
            parent_position,
            child_position,
            parent_atom: LinkAtom::O,
            child_atom: LinkAtom::D,
            id: None,
            parent_choices: vec![parent_position],
            child_choices: vec![child_position],
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        self.parent_choices.len() > 1 || self.child_choices.len() > 1
    }

    pub fn parent_loss(&self) -> Option<Loss> {
        self.parent_atom.loss()
    }

    pub fn child_loss(&self) -> Option<Loss> {
        self.child_atom.loss()
    }
}

/// Positions on `node` taken by a bond, from either end.
pub fn occupied_positions(graph: &GlycanGraph, node: NodeIndex) -> BTreeSet<u16> {
    let outgoing = graph
        .edges_directed(node, Direction::Outgoing)
        .filter_map(|edge| edge.weight().parent_position);
    let incoming = graph
        .edges_directed(node, Direction::Incoming)
        .filter_map(|edge| edge.weight().child_position);
    outgoing.chain(incoming).collect()
}

/// The first candidate, in declaration order, that is not occupied on `node`.
pub fn find_open_position(
    graph: &GlycanGraph,
    node: NodeIndex,
    choices: &[Position],
) -> Result<Position> {
    let occupied = occupied_positions(graph, node);
    choices
        .iter()
        .copied()
        .find(|choice| match choice {
            Some(p) => !occupied.contains(p),
            None => true,
        })
        .ok_or_else(|| GlycoctError::NoOpenPosition {
            node: graph[node].id,
            choices: choices
                .iter()
                .map(|p| position_to_glycoct(*p))
                .collect::<Vec<_>>()
                .join("|"),
        })
}

fn choose_position(graph: &GlycanGraph, node: NodeIndex, choices: &[Position]) -> Result<Position> {
    match choices {
        [] => Ok(None),
        [only] => Ok(*only),
        _ => find_open_position(graph, node, choices),
    }
}

/// Instantiate a bond between two concrete nodes, resolving ambiguous
/// positions against the bonds already present.
pub fn form_link(
    graph: &mut GlycanGraph,
    parent: NodeIndex,
    child: NodeIndex,
    spec: &LinkSpec,
) -> Result<EdgeIndex> {
    if graph[parent].is_substituent() && graph[child].is_monosaccharide() {
        warn!(
            "Monosaccharide {} has substituent parent {}; such structures may not traverse as expected",
            graph[child].id, graph[parent].id
        );
    }

    let parent_position = choose_position(graph, parent, &spec.parent_positions)?;
    let child_position = choose_position(graph, child, &spec.child_positions)?;
    if spec.is_ambiguous() {
        trace!(
            "Resolved ambiguous link {} -> {} at ({}+{})",
            graph[parent].id,
            graph[child].id,
            position_to_glycoct(parent_position),
            position_to_glycoct(child_position)
        );
    }

    let link = Link {
        parent_position,
        child_position,
        parent_atom: spec.parent_atom,
        child_atom: spec.child_atom,
        id: spec.id,
        parent_choices: spec.parent_positions.clone(),
        child_choices: spec.child_positions.clone(),
    };
    Ok(graph.add_edge(parent, child, link))
}
