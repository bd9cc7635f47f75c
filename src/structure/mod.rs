use petgraph::stable_graph::StableDiGraph;

mod residue;
pub use residue::*;

mod link;
pub use link::*;

mod glycan;
pub use glycan::*;

/// Nodes joined by directed parent-to-child links. Stable indices let
/// repeat expansion remove template nodes without disturbing the rest.
pub type GlycanGraph = StableDiGraph<Node, Link>;
