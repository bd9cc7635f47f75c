use std::collections::BTreeMap;

use petgraph::stable_graph::NodeIndex;
use tracing::*;

use super::{DeferredLink, Handler, Linkage, Multiplicity, RepeatId, RepeatRecord};
use crate::*;

/// Where a token came from, for error messages.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Location<'a> {
    pub line: usize,
    pub token: &'a str,
}

impl Location<'_> {
    pub fn error(&self, reason: impl Into<String>) -> GlycoctError {
        GlycoctError::format(self.line, self.token, reason)
    }
}

/// What a document-level index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Entry {
    Node(NodeIndex),
    /// A stub standing in for a repeat until it is expanded.
    Repeat(RepeatId),
}

/// The result of looking up an index from the current scope.
#[derive(Debug, Clone, Copy)]
enum Found {
    /// Captured by the repeat currently being read.
    Template(NodeIndex),
    Document(Entry),
    Missing,
}

/// Everything read so far for one document, before repeats are expanded
/// and deferred links are replayed.
#[derive(Debug, Default)]
pub(crate) struct Document {
    pub(crate) graph: GlycanGraph,
    pub(crate) entries: BTreeMap<usize, Entry>,
    pub(crate) repeats: BTreeMap<RepeatId, RepeatRecord>,
    pub(crate) deferred: Vec<DeferredLink>,
    pub(crate) root: Option<Entry>,
    current_repeat: Option<RepeatId>,
}

impl Document {
    pub fn has_root(&self) -> bool {
        self.root.is_some()
    }

    pub fn has_content(&self) -> bool {
        self.root.is_some() || !self.entries.is_empty() || !self.repeats.is_empty()
    }

    pub fn current_repeat(&self) -> Option<RepeatId> {
        self.current_repeat
    }

    pub(crate) fn repeat(&self, repeat: RepeatId) -> Result<&RepeatRecord> {
        self.repeats
            .get(&repeat)
            .ok_or(GlycoctError::UnresolvedReference(repeat))
    }

    /// Add a residue or substituent, into the current repeat's capture when
    /// reading a repeat body.
    pub fn add_node(&mut self, index: usize, kind: NodeKind, in_repeat: bool, at: &Location) -> Result<()> {
        let is_residue = matches!(kind, NodeKind::Monosaccharide(_));
        if in_repeat {
            let repeat = self
                .current_repeat
                .ok_or_else(|| at.error("residue inside REP before any REPn header"))?;
            let ix = self.graph.add_node(Node {
                id: NodeId::Local(index),
                kind,
            });
            let record = self
                .repeats
                .get_mut(&repeat)
                .ok_or(GlycoctError::UnresolvedReference(repeat))?;
            if !record.insert(index, ix) {
                return Err(at.error(format!("index {index} is declared twice in repeat {repeat}")));
            }
            if self.root.is_none() && is_residue {
                self.root = Some(Entry::Repeat(repeat));
            }
            trace!("Captured {} into repeat {}", index, repeat);
        } else {
            if self.entries.contains_key(&index) {
                return Err(at.error(format!("index {index} is declared twice")));
            }
            let ix = self.graph.add_node(Node {
                id: NodeId::Local(index),
                kind,
            });
            self.entries.insert(index, Entry::Node(ix));
            if self.root.is_none() && is_residue {
                self.root = Some(Entry::Node(ix));
            }
        }
        Ok(())
    }

    pub fn add_repeat_stub(&mut self, index: usize, repeat: RepeatId, at: &Location) -> Result<()> {
        if self.entries.contains_key(&index) {
            return Err(at.error(format!("index {index} is declared twice")));
        }
        if self.repeats.contains_key(&repeat) {
            return Err(at.error(format!("repeat {repeat} is declared twice")));
        }
        self.repeats.insert(repeat, RepeatRecord::new(index, repeat, at));
        self.entries.insert(index, Entry::Repeat(repeat));
        if self.root.is_none() {
            self.root = Some(Entry::Repeat(repeat));
        }
        Ok(())
    }

    /// Start reading the body of a repeat declared earlier by a stub.
    pub fn begin_repeat(
        &mut self,
        repeat: RepeatId,
        linkage: Linkage,
        multiplicity: Multiplicity,
        at: &Location,
    ) -> Result<()> {
        let record = self
            .repeats
            .get_mut(&repeat)
            .ok_or_else(|| at.error(format!("REP{repeat} has no matching repeat stub")))?;
        debug!(
            "Reading repeat {} ({}-{} copies)",
            repeat,
            multiplicity.lower.map_or(-1, i64::from),
            multiplicity.upper.map_or(-1, i64::from)
        );
        record.linkage = Some(linkage);
        record.multiplicity = multiplicity;
        self.current_repeat = Some(repeat);
        Ok(())
    }

    fn lookup(&self, index: usize, in_repeat: bool) -> Found {
        if in_repeat {
            let captured = self
                .current_repeat
                .and_then(|repeat| self.repeats.get(&repeat))
                .and_then(|record| record.template_node(index));
            if let Some(ix) = captured {
                return Found::Template(ix);
            }
        }
        match self.entries.get(&index) {
            Some(entry) => Found::Document(*entry),
            None => Found::Missing,
        }
    }

    /// Link two nodes now when both are concrete and in the same scope,
    /// otherwise record the link for replay once repeats are expanded.
    pub fn add_linkage(&mut self, linkage: Linkage, in_repeat: bool) -> Result<()> {
        let parent = self.lookup(linkage.parent, in_repeat);
        let child = self.lookup(linkage.child, in_repeat);
        let scope = if in_repeat { self.current_repeat } else { None };

        let (handler, key) = match (parent, child) {
            (Found::Document(Entry::Repeat(repeat)), _) => (Handler::Outgoing(repeat), linkage.child),
            (_, Found::Document(Entry::Repeat(repeat))) => (Handler::Incoming(repeat), linkage.parent),
            (Found::Template(p), Found::Template(c))
            | (Found::Document(Entry::Node(p)), Found::Document(Entry::Node(c))) => {
                form_link(&mut self.graph, p, c, &linkage.spec)?;
                return Ok(());
            }
            _ => (
                Handler::Direct {
                    parent: linkage.parent,
                },
                linkage.child,
            ),
        };
        trace!(
            "Deferring link {} -> {} as {:?}",
            linkage.parent,
            linkage.child,
            handler
        );
        self.deferred.push(DeferredLink {
            handler,
            key,
            scope,
            spec: linkage.spec,
        });
        Ok(())
    }
}
