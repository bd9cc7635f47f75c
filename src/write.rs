//! Serializing glycans back to GlycoCT condensed text.

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::*;

fn optional_number(n: Option<u16>) -> String {
    n.map_or_else(|| "x".to_string(), |n| n.to_string())
}

fn positions(chosen: Position, choices: &[Position]) -> String {
    if choices.len() > 1 {
        choices
            .iter()
            .map(|p| position_to_glycoct(*p))
            .collect::<Vec<_>>()
            .join("|")
    } else {
        position_to_glycoct(chosen)
    }
}

impl Monosaccharide {
    /// The residue line body after `b:`, e.g. `b-dglc-HEX-1:5|6:a`.
    pub fn to_glycoct(&self) -> String {
        let mut out = format!(
            "{}-{}-{}:{}",
            self.anomer.to_glycoct(),
            self.stem_descriptor(),
            optional_number(self.ring_start),
            optional_number(self.ring_end)
        );
        if self.reduced {
            out.push_str("|1:aldi");
        }
        for (position, modification) in &self.modifications {
            out.push('|');
            out.push_str(&optional_number(*position));
            out.push(':');
            out.push_str(modification.to_glycoct());
        }
        out
    }
}

impl Glycan {
    /// Write this glycan as a single GlycoCT document. Residues are numbered
    /// in traversal order from the root, and links in the order their
    /// parents are numbered.
    pub fn to_glycoct(&self) -> String {
        self.to_string()
    }
}

impl Display for Glycan {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        let numbers: HashMap<_, _> = self
            .nodes()
            .enumerate()
            .map(|(i, (ix, _))| (ix, i + 1))
            .collect();

        writeln!(f, "RES")?;
        for (ix, node) in self.nodes() {
            match &node.kind {
                NodeKind::Monosaccharide(residue) => {
                    writeln!(f, "{}b:{}", numbers[&ix], residue.to_glycoct())?
                }
                NodeKind::Substituent(substituent) => {
                    writeln!(f, "{}s:{}", numbers[&ix], substituent.name)?
                }
            }
        }

        let links: Vec<_> = self
            .nodes()
            .flat_map(|(ix, _)| {
                self.children(ix)
                    .into_iter()
                    .map(move |(child, link)| (ix, child, link))
            })
            .collect();
        if links.is_empty() {
            return Ok(());
        }
        writeln!(f, "LIN")?;
        for (i, (parent, child, link)) in links.into_iter().enumerate() {
            writeln!(
                f,
                "{}:{}{}({}+{}){}{}",
                i + 1,
                numbers[&parent],
                link.parent_atom.to_glycoct(),
                positions(link.parent_position, &link.parent_choices),
                positions(link.child_position, &link.child_choices),
                numbers[&child],
                link.child_atom.to_glycoct()
            )?;
        }
        Ok(())
    }
}
