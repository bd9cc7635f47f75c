use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use nom::{
    branch::alt,
    character::complete::{char, digit1, multispace0, none_of, one_of},
    combinator::{all_consuming, map, map_res, not, opt, peek, recognize, value},
    error::{context, VerboseError, VerboseErrorKind},
    multi::{many1_count, separated_list0},
    sequence::{delimited, pair, separated_pair, terminated, tuple},
    IResult,
};

use crate::*;

impl Monosaccharide {
    /// The residue's identity without anomer or ring, e.g. `dglc-HEX|6:a`.
    pub fn composition_key(&self) -> String {
        let mut key = self.stem_descriptor();
        if self.reduced {
            key.push_str("|1:aldi");
        }
        for (position, modification) in &self.modifications {
            key.push('|');
            key.push_str(&position.map_or_else(|| "x".to_string(), |p| p.to_string()));
            key.push(':');
            key.push_str(modification.to_glycoct());
        }
        key
    }
}

impl Node {
    pub fn composition_key(&self) -> String {
        match &self.kind {
            NodeKind::Monosaccharide(residue) => residue.composition_key(),
            NodeKind::Substituent(substituent) => substituent.name.to_string(),
        }
    }
}

/// How many of each kind of residue and substituent a glycan contains,
/// ignoring how they are linked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlycanComposition(BTreeMap<String, usize>);

impl GlycanComposition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>, count: usize) {
        *self.0.entry(key.into()).or_default() += count;
    }

    pub fn get(&self, key: &str) -> usize {
        self.0.get(key).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(key, count)| (key.as_str(), *count))
    }
}

impl Glycan {
    pub fn composition(&self) -> GlycanComposition {
        let mut composition = GlycanComposition::new();
        for (_, node) in self.nodes() {
            composition.add(node.composition_key(), 1);
        }
        composition
    }
}

impl Display for GlycanComposition {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        let parts: Vec<_> = self
            .0
            .iter()
            .map(|(key, count)| format!("{key}:{count}"))
            .collect();
        write!(f, "{{{}}}", parts.join("; "))
    }
}

type Res<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

fn count_follows(input: &str) -> Res<()> {
    value(
        (),
        tuple((multispace0, digit1, multispace0, peek(one_of(";}")))),
    )(input)
}

/// Keys may contain `:` themselves, so a key runs up to the last `:` of
/// its entry.
fn key(input: &str) -> Res<&str> {
    map(
        recognize(many1_count(alt((
            none_of(":;{}"),
            terminated(char(':'), not(count_follows)),
        )))),
        str::trim,
    )(input)
}

fn entry(input: &str) -> Res<(&str, usize)> {
    context(
        "expected key:count",
        separated_pair(
            key,
            char(':'),
            delimited(
                multispace0,
                map_res(digit1, str::parse::<usize>),
                multispace0,
            ),
        ),
    )(input)
}

fn composition(input: &str) -> Res<GlycanComposition> {
    map(
        delimited(
            pair(multispace0, context("expected '{'", char('{'))),
            separated_list0(char(';'), entry),
            context(
                "expected ';' or '}'",
                tuple((multispace0, opt(char(';')), multispace0, char('}'), multispace0)),
            ),
        ),
        |entries| {
            let mut composition = GlycanComposition::new();
            for (key, count) in entries {
                composition.add(key, count);
            }
            composition
        },
    )(input)
}

impl FromStr for GlycanComposition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        all_consuming(composition)(s)
            .map(|(_, composition)| composition)
            .map_err(|err| match err {
                nom::Err::Error(e) | nom::Err::Failure(e) => e
                    .errors
                    .iter()
                    .find_map(|(_, kind)| match kind {
                        VerboseErrorKind::Context(ctx) => Some(ctx.to_string()),
                        _ => None,
                    })
                    .unwrap_or_else(|| format!("malformed composition: {s}")),
                nom::Err::Incomplete(_) => format!("incomplete composition: {s}"),
            })
    }
}
