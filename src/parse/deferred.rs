use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use tracing::*;

use super::{Document, Entry, RepeatId, Side};
use crate::*;

/// How a deferred link finds its ends once repeats are expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    /// The parent is a repeat: the link leaves its last copy.
    Outgoing(RepeatId),
    /// The child is a repeat: the link enters its first copy.
    Incoming(RepeatId),
    /// Both ends are looked up by index, across scopes.
    Direct { parent: usize },
}

/// A link recorded during reading and replayed, in the order it was read,
/// after every repeat has been expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredLink {
    pub handler: Handler,
    /// The index of the end not named by the handler. For `Direct`, the child.
    pub key: usize,
    /// The repeat whose body declared the link, searched first.
    pub scope: Option<RepeatId>,
    pub spec: LinkSpec,
}

impl Document {
    /// Find the concrete node for `key`, and whether it is a repeat's entry.
    fn retrieve(&self, key: usize, scope: Option<RepeatId>, side: Side) -> Result<(NodeIndex, bool)> {
        if let Some(ix) = scope.and_then(|repeat| self.repeats.get(&repeat)?.get_node(key, side)) {
            return Ok((ix, false));
        }
        match self.entries.get(&key) {
            Some(Entry::Node(ix)) => Ok((*ix, false)),
            Some(Entry::Repeat(repeat)) => {
                let ix = self.repeat(*repeat)?.attachment(side)?;
                Ok((ix, side == Side::In))
            }
            None => self
                .repeats
                .values()
                .find_map(|record| record.get_node(key, side))
                .map(|ix| (ix, false))
                .ok_or(GlycoctError::UnresolvedReference(key)),
        }
    }

    /// Form the link described by `op` in the expanded graph.
    pub(crate) fn replay(&mut self, op: DeferredLink) -> Result<EdgeIndex> {
        let (parent, child, into_repeat) = match op.handler {
            Handler::Outgoing(repeat) => {
                let parent = self.repeat(repeat)?.exit()?;
                let (child, into_repeat) = self.retrieve(op.key, op.scope, Side::In)?;
                (parent, child, into_repeat)
            }
            Handler::Incoming(repeat) => {
                let (parent, _) = self.retrieve(op.key, op.scope, Side::Out)?;
                (parent, self.repeat(repeat)?.entry()?, true)
            }
            Handler::Direct { parent } => {
                let (parent, _) = self.retrieve(parent, op.scope, Side::Out)?;
                let (child, into_repeat) = self.retrieve(op.key, op.scope, Side::In)?;
                (parent, child, into_repeat)
            }
        };
        debug!(
            "Replaying {:?}: {} -> {}",
            op.handler,
            self.graph[parent].id,
            self.graph[child].id
        );
        let spec = if into_repeat {
            op.spec.into_repeat_entry()
        } else {
            op.spec
        };
        form_link(&mut self.graph, parent, child, &spec)
    }
}
