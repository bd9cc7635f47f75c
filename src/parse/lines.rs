//! Classification of single GlycoCT tokens into typed lines.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, digit1, one_of},
    combinator::{all_consuming, cut, map, map_opt, map_res, opt, recognize, value},
    error::{context, VerboseError, VerboseErrorKind},
    multi::{many0, separated_list1},
    sequence::{pair, preceded, separated_pair, tuple},
    IResult,
};

use crate::*;

type Res<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Res,
    Lin,
    Rep,
    Alt,
    Und,
}

impl Section {
    pub fn keyword(&self) -> &'static str {
        match self {
            Section::Res => "RES",
            Section::Lin => "LIN",
            Section::Rep => "REP",
            Section::Alt => "ALT",
            Section::Und => "UND",
        }
    }
}

/// A parsed linkage between two source-local indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Linkage {
    pub parent: usize,
    pub child: usize,
    pub spec: LinkSpec,
}

/// Bounds on the number of copies of a repeat unit. `None` is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Multiplicity {
    pub lower: Option<u32>,
    pub upper: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Section(Section),
    Residue { index: usize, residue: Monosaccharide },
    Substituent { index: usize, name: String },
    Linkage(Linkage),
    RepeatStub { index: usize, repeat: usize },
    RepeatHeader {
        repeat: usize,
        linkage: Linkage,
        multiplicity: Multiplicity,
    },
}

fn index(input: &str) -> Res<usize> {
    map_res(digit1, str::parse)(input)
}

fn signed(input: &str) -> Res<i64> {
    map_res(recognize(pair(opt(char('-')), digit1)), str::parse)(input)
}

/// A ring or modification position: digits, or `x` for unknown.
fn optional_number(input: &str) -> Res<Option<u16>> {
    alt((
        value(None, char('x')),
        map(map_res(digit1, str::parse::<u16>), Some),
    ))(input)
}

/// A link attachment position: a number, or a negative number for unknown.
fn position(input: &str) -> Res<Position> {
    map_res(signed, |v| {
        if v < 0 {
            Ok(None)
        } else {
            u16::try_from(v).map(Some)
        }
    })(input)
}

fn positions(input: &str) -> Res<Vec<Position>> {
    context(
        "expected '|'-separated attachment positions",
        separated_list1(char('|'), position),
    )(input)
}

fn link_atom(input: &str) -> Res<LinkAtom> {
    context(
        "expected a replaced atom (one of o, d, h, n, x)",
        map_opt(one_of("odhnx"), LinkAtom::from_glycoct),
    )(input)
}

fn anomer(input: &str) -> Res<Anomer> {
    map_opt(one_of("abxo"), |c| Anomer::from_glycoct(&c.to_string()))(input)
}

fn config_stem(input: &str) -> Res<(Configuration, Stem)> {
    preceded(
        char('-'),
        pair(
            map_opt(one_of("dlx"), |c| Configuration::from_glycoct(&c.to_string())),
            context(
                "unknown stem",
                cut(map_opt(
                    take_while1(|c: char| c.is_ascii_lowercase()),
                    Stem::from_glycoct,
                )),
            ),
        ),
    )(input)
}

fn superclass(input: &str) -> Res<SuperClass> {
    preceded(
        opt(char('-')),
        context(
            "expected a superclass such as HEX",
            map_opt(take_while1(|c: char| c.is_ascii_uppercase()), SuperClass::from_glycoct),
        ),
    )(input)
}

fn ring(input: &str) -> Res<(Option<u16>, Option<u16>)> {
    preceded(
        opt(char('-')),
        context(
            "expected ring positions such as 1:5",
            separated_pair(optional_number, char(':'), optional_number),
        ),
    )(input)
}

fn modification(input: &str) -> Res<(Option<u16>, Modification)> {
    preceded(
        char('|'),
        separated_pair(
            optional_number,
            char(':'),
            context(
                "unknown modification",
                cut(map_opt(
                    take_while1(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit()),
                    Modification::from_glycoct,
                )),
            ),
        ),
    )(input)
}

fn residue_line(input: &str) -> Res<(usize, Monosaccharide)> {
    let (input, (ix, _, anomer, conf_stem, superclass, (ring_start, ring_end), modifications)) =
        tuple((
            index,
            tag("b:"),
            opt(anomer),
            many0(config_stem),
            superclass,
            ring,
            many0(modification),
        ))(input)?;

    let (configuration, stem) = if conf_stem.is_empty() {
        (vec![Configuration::Missing], vec![Stem::Missing])
    } else {
        conf_stem.into_iter().unzip()
    };
    let mut residue = Monosaccharide {
        anomer: anomer.unwrap_or(Anomer::Missing),
        configuration,
        stem,
        superclass,
        ring_start,
        ring_end,
        modifications,
        reduced: false,
    };
    if let Some(at) = residue
        .modifications
        .iter()
        .position(|m| *m == (Some(1), Modification::Alditol))
    {
        residue.modifications.remove(at);
        residue.reduced = true;
    }
    Ok((input, (ix, residue)))
}

fn substituent_line(input: &str) -> Res<(usize, String)> {
    map(
        separated_pair(
            index,
            tag("s:"),
            context(
                "expected a substituent name",
                take_while1(|c: char| !c.is_whitespace() && c != ';'),
            ),
        ),
        |(ix, name): (usize, &str)| (ix, name.to_string()),
    )(input)
}

/// `<parent><atom>(<positions>+<positions>)<child><atom>`
fn linkage_body(input: &str) -> Res<Linkage> {
    let (input, (parent, parent_atom, _, parent_positions, _, child_positions, _, child, child_atom)) =
        tuple((
            index,
            link_atom,
            char('('),
            positions,
            one_of("+-"),
            positions,
            char(')'),
            index,
            link_atom,
        ))(input)?;
    Ok((
        input,
        Linkage {
            parent,
            child,
            spec: LinkSpec {
                parent_atom,
                parent_positions,
                child_atom,
                child_positions,
                id: None,
            },
        },
    ))
}

fn linkage_line(input: &str) -> Res<Linkage> {
    map(
        separated_pair(index, char(':'), linkage_body),
        |(id, mut linkage)| {
            linkage.spec.id = Some(id);
            linkage
        },
    )(input)
}

fn repeat_stub(input: &str) -> Res<(usize, usize)> {
    separated_pair(index, tag("r:r"), index)(input)
}

fn bound(input: &str) -> Res<Option<u32>> {
    map_res(signed, |v| {
        if v < 0 {
            Ok(None)
        } else {
            u32::try_from(v).map(Some)
        }
    })(input)
}

fn repeat_header(input: &str) -> Res<(usize, Linkage, Multiplicity)> {
    let (input, (_, repeat, _, linkage, _, (lower, upper))) = tuple((
        tag("REP"),
        index,
        char(':'),
        context("expected an internal linkage", linkage_body),
        char('='),
        context(
            "expected a multiplicity such as 1-4 or -1--1",
            separated_pair(bound, char('-'), bound),
        ),
    ))(input)?;
    Ok((input, (repeat, linkage, Multiplicity { lower, upper })))
}

fn reason(err: nom::Err<VerboseError<&str>>) -> String {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => e
            .errors
            .iter()
            .find_map(|(_, kind)| match kind {
                VerboseErrorKind::Context(ctx) => Some(ctx.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| "malformed line".to_string()),
        nom::Err::Incomplete(_) => "incomplete line".to_string(),
    }
}

fn run<'a, T>(parser: impl FnMut(&'a str) -> Res<'a, T>, token: &'a str) -> Result<T, String> {
    all_consuming(parser)(token)
        .map(|(_, parsed)| parsed)
        .map_err(reason)
}

/// Classify one token. The error is a human-readable reason.
pub fn classify(token: &str) -> Result<Line, String> {
    match token {
        "RES" => return Ok(Line::Section(Section::Res)),
        "LIN" => return Ok(Line::Section(Section::Lin)),
        "REP" => return Ok(Line::Section(Section::Rep)),
        _ => {}
    }
    if token.starts_with("ALT") {
        return Ok(Line::Section(Section::Alt));
    }
    if token.starts_with("UND") {
        return Ok(Line::Section(Section::Und));
    }
    if token.starts_with("REP") {
        let (repeat, linkage, multiplicity) = run(repeat_header, token)?;
        return Ok(Line::RepeatHeader {
            repeat,
            linkage,
            multiplicity,
        });
    }

    let rest = token.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == token.len() {
        return Err("expected a section keyword or a line starting with an index".to_string());
    }
    match rest.chars().next() {
        Some('b') => {
            let (index, residue) = run(residue_line, token)?;
            Ok(Line::Residue { index, residue })
        }
        Some('s') => {
            let (index, name) = run(substituent_line, token)?;
            Ok(Line::Substituent { index, name })
        }
        Some('r') => {
            let (index, repeat) = run(repeat_stub, token)?;
            Ok(Line::RepeatStub { index, repeat })
        }
        Some(':') => Ok(Line::Linkage(run(linkage_line, token)?)),
        _ => Err("unrecognized line type".to_string()),
    }
}
