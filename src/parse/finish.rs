use petgraph::stable_graph::NodeIndex;
use tracing::*;

use super::{Document, Entry, ReaderOptions};
use crate::*;

impl Document {
    /// Expand repeats, replay deferred links in the order they were read,
    /// and renumber everything reachable from the root.
    pub(crate) fn finish(mut self, options: &ReaderOptions) -> Result<Glycan> {
        for record in self.repeats.values_mut() {
            record.expand(&mut self.graph, options.repeat_count)?;
        }

        let deferred = std::mem::take(&mut self.deferred);
        if !deferred.is_empty() {
            debug!("Replaying {} deferred links", deferred.len());
        }
        for op in deferred {
            self.replay(op)?;
        }

        let root = self.root_node()?;
        let glycan = Glycan::from_root(&self.graph, root);
        debug!(
            "Finished glycan with {} nodes and {} links",
            glycan.len(),
            glycan.link_count()
        );
        Ok(glycan)
    }

    fn root_node(&self) -> Result<NodeIndex> {
        // A document of only substituents has no residue to root it.
        let entry = self
            .root
            .or_else(|| self.entries.values().next().copied())
            .ok_or(GlycoctError::UnresolvedReference(0))?;
        match entry {
            Entry::Node(ix) => Ok(ix),
            Entry::Repeat(repeat) => self.repeat(repeat)?.root(&self.graph),
        }
    }
}
