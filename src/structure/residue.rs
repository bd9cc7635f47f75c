use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

use lazy_static::lazy_static;

use crate::Name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Anomer {
    Alpha,
    Beta,
    /// Open-chain form (`o`), no anomeric center.
    Uncyclized,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Configuration {
    D,
    L,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stem {
    Gro,
    Ery,
    Rib,
    Ara,
    All,
    Alt,
    Glc,
    Man,
    Tre,
    Xyl,
    Lyx,
    Gul,
    Ido,
    Gal,
    Tal,
    Thr,
    Missing,
}

/// The carbon-skeleton class of a monosaccharide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SuperClass {
    Tri,
    Tet,
    Pen,
    Hex,
    Hep,
    Oct,
    Non,
    Dec,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Modification {
    Deoxy,
    Acidic,
    Keto,
    DoubleBond,
    Alditol,
    Sp,
    Sp2,
    Geminal,
    Lactone,
    Anhydro,
}

lazy_static! {
    static ref ANOMER_CODES: HashMap<&'static str, Anomer> = HashMap::from([
        ("a", Anomer::Alpha),
        ("b", Anomer::Beta),
        ("o", Anomer::Uncyclized),
        ("x", Anomer::Missing),
    ]);
    static ref CONFIGURATION_CODES: HashMap<&'static str, Configuration> = HashMap::from([
        ("d", Configuration::D),
        ("l", Configuration::L),
        ("x", Configuration::Missing),
    ]);
    static ref STEM_CODES: HashMap<&'static str, Stem> = HashMap::from([
        ("gro", Stem::Gro),
        ("ery", Stem::Ery),
        ("rib", Stem::Rib),
        ("ara", Stem::Ara),
        ("all", Stem::All),
        ("alt", Stem::Alt),
        ("glc", Stem::Glc),
        ("man", Stem::Man),
        ("tre", Stem::Tre),
        ("xyl", Stem::Xyl),
        ("lyx", Stem::Lyx),
        ("gul", Stem::Gul),
        ("ido", Stem::Ido),
        ("gal", Stem::Gal),
        ("tal", Stem::Tal),
        ("thr", Stem::Thr),
        ("x", Stem::Missing),
    ]);
    static ref SUPERCLASS_CODES: HashMap<&'static str, SuperClass> = HashMap::from([
        ("TRI", SuperClass::Tri),
        ("TET", SuperClass::Tet),
        ("PEN", SuperClass::Pen),
        ("HEX", SuperClass::Hex),
        ("HEP", SuperClass::Hep),
        ("OCT", SuperClass::Oct),
        ("NON", SuperClass::Non),
        ("DEC", SuperClass::Dec),
        ("SUG", SuperClass::Missing),
    ]);
    static ref MODIFICATION_CODES: HashMap<&'static str, Modification> = HashMap::from([
        ("d", Modification::Deoxy),
        ("a", Modification::Acidic),
        ("keto", Modification::Keto),
        ("en", Modification::DoubleBond),
        ("aldi", Modification::Alditol),
        ("sp", Modification::Sp),
        ("sp2", Modification::Sp2),
        ("geminal", Modification::Geminal),
        ("lactone", Modification::Lactone),
        ("anhydro", Modification::Anhydro),
    ]);
}

impl Anomer {
    pub fn from_glycoct(code: &str) -> Option<Self> {
        ANOMER_CODES.get(code).copied()
    }

    pub fn to_glycoct(&self) -> &'static str {
        match self {
            Anomer::Alpha => "a",
            Anomer::Beta => "b",
            Anomer::Uncyclized => "o",
            Anomer::Missing => "x",
        }
    }
}

impl Configuration {
    pub fn from_glycoct(code: &str) -> Option<Self> {
        CONFIGURATION_CODES.get(code).copied()
    }

    pub fn to_glycoct(&self) -> &'static str {
        match self {
            Configuration::D => "d",
            Configuration::L => "l",
            Configuration::Missing => "x",
        }
    }
}

impl Stem {
    pub fn from_glycoct(code: &str) -> Option<Self> {
        STEM_CODES.get(code).copied()
    }

    pub fn to_glycoct(&self) -> &'static str {
        use Stem::*;
        match self {
            Gro => "gro",
            Ery => "ery",
            Rib => "rib",
            Ara => "ara",
            All => "all",
            Alt => "alt",
            Glc => "glc",
            Man => "man",
            Tre => "tre",
            Xyl => "xyl",
            Lyx => "lyx",
            Gul => "gul",
            Ido => "ido",
            Gal => "gal",
            Tal => "tal",
            Thr => "thr",
            Missing => "x",
        }
    }
}

impl SuperClass {
    pub fn from_glycoct(code: &str) -> Option<Self> {
        SUPERCLASS_CODES.get(code).copied()
    }

    pub fn to_glycoct(&self) -> &'static str {
        use SuperClass::*;
        match self {
            Tri => "TRI",
            Tet => "TET",
            Pen => "PEN",
            Hex => "HEX",
            Hep => "HEP",
            Oct => "OCT",
            Non => "NON",
            Dec => "DEC",
            Missing => "SUG",
        }
    }

    /// Number of backbone carbons, if known.
    pub fn carbons(&self) -> Option<u16> {
        use SuperClass::*;
        match self {
            Tri => Some(3),
            Tet => Some(4),
            Pen => Some(5),
            Hex => Some(6),
            Hep => Some(7),
            Oct => Some(8),
            Non => Some(9),
            Dec => Some(10),
            Missing => None,
        }
    }
}

impl Modification {
    pub fn from_glycoct(code: &str) -> Option<Self> {
        MODIFICATION_CODES.get(code).copied()
    }

    pub fn to_glycoct(&self) -> &'static str {
        use Modification::*;
        match self {
            Deoxy => "d",
            Acidic => "a",
            Keto => "keto",
            DoubleBond => "en",
            Alditol => "aldi",
            Sp => "sp",
            Sp2 => "sp2",
            Geminal => "geminal",
            Lactone => "lactone",
            Anhydro => "anhydro",
        }
    }
}

/// A monosaccharide residue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Monosaccharide {
    pub anomer: Anomer,
    /// Paired element-wise with `stem`.
    pub configuration: Vec<Configuration>,
    pub stem: Vec<Stem>,
    pub superclass: SuperClass,
    pub ring_start: Option<u16>,
    pub ring_end: Option<u16>,
    /// Position to modification, in declaration order. A position may carry
    /// several modifications.
    pub modifications: Vec<(Option<u16>, Modification)>,
    pub reduced: bool,
}

impl Monosaccharide {
    pub fn new(superclass: SuperClass) -> Self {
        Self {
            anomer: Anomer::Missing,
            configuration: vec![Configuration::Missing],
            stem: vec![Stem::Missing],
            superclass,
            ring_start: None,
            ring_end: None,
            modifications: Vec::new(),
            reduced: false,
        }
    }

    pub fn modifications_at(&self, position: u16) -> impl Iterator<Item = Modification> + '_ {
        self.modifications
            .iter()
            .filter(move |(p, _)| *p == Some(position))
            .map(|(_, m)| *m)
    }

    pub fn add_modification(&mut self, position: Option<u16>, modification: Modification) {
        self.modifications.push((position, modification));
    }

    /// The configuration/stem pairs and superclass, e.g. `dglc-HEX` or
    /// `dgro-dgal-NON`.
    pub fn stem_descriptor(&self) -> String {
        let mut out = String::new();
        for (config, stem) in self.configuration.iter().zip(&self.stem) {
            if *stem == Stem::Missing {
                continue;
            }
            out.push_str(config.to_glycoct());
            out.push_str(stem.to_glycoct());
            out.push('-');
        }
        out.push_str(self.superclass.to_glycoct());
        out
    }
}

/// A non-sugar group attached to a residue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Substituent {
    pub name: Name,
}

impl Substituent {
    pub fn new(name: impl Into<Name>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Monosaccharide(Monosaccharide),
    Substituent(Substituent),
}

/// The identifier of a node.
///
/// Nodes start out with the index they were declared under (`Local`). Copies
/// produced by repeat expansion are tagged with their copy number
/// (`Decorated`). Finishing a document replaces both with a process-wide
/// unique `Global` identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    Local(usize),
    Decorated { copy: u32, local: usize },
    Global(u64),
}

impl NodeId {
    /// The index the node was declared under in the source text, if it
    /// still carries one.
    pub fn local(&self) -> Option<usize> {
        match self {
            NodeId::Local(local) | NodeId::Decorated { local, .. } => Some(*local),
            NodeId::Global(_) => None,
        }
    }

    pub fn global(&self) -> Option<u64> {
        match self {
            NodeId::Global(id) => Some(*id),
            _ => None,
        }
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            NodeId::Local(local) => write!(f, "{local}"),
            NodeId::Decorated { copy, local } => write!(f, "({copy}, {local})"),
            NodeId::Global(id) => write!(f, "#{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
}

impl Node {
    pub fn monosaccharide(id: NodeId, residue: Monosaccharide) -> Self {
        Self {
            id,
            kind: NodeKind::Monosaccharide(residue),
        }
    }

    pub fn substituent(id: NodeId, substituent: Substituent) -> Self {
        Self {
            id,
            kind: NodeKind::Substituent(substituent),
        }
    }

    pub fn is_substituent(&self) -> bool {
        matches!(self.kind, NodeKind::Substituent(_))
    }

    pub fn is_monosaccharide(&self) -> bool {
        matches!(self.kind, NodeKind::Monosaccharide(_))
    }

    pub fn as_monosaccharide(&self) -> Option<&Monosaccharide> {
        match &self.kind {
            NodeKind::Monosaccharide(residue) => Some(residue),
            NodeKind::Substituent(_) => None,
        }
    }

    pub fn as_substituent(&self) -> Option<&Substituent> {
        match &self.kind {
            NodeKind::Substituent(substituent) => Some(substituent),
            NodeKind::Monosaccharide(_) => None,
        }
    }

    /// The same chemistry under a different identifier.
    pub(crate) fn with_id(&self, id: NodeId) -> Self {
        Self {
            id,
            kind: self.kind.clone(),
        }
    }
}
