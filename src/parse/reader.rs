//! The GlycoCT section state machine and the lazy document iterator.

use std::collections::VecDeque;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::{BufRead, Lines};

use tracing::*;

use super::{classify, Document, Line, Location, Section};
use crate::*;

/// Settings shared by every document a reader produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Expand every repeat to exactly this many copies instead of the count
    /// picked from its bounds. Still checked against known bounds.
    pub repeat_count: Option<u32>,
}

impl ReaderOptions {
    pub fn repeat_count(mut self, n: u32) -> Self {
        self.repeat_count = Some(n);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Res,
    Lin,
    Rep,
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            State::Start => write!(f, "START"),
            State::Res => write!(f, "RES"),
            State::Lin => write!(f, "LIN"),
            State::Rep => write!(f, "REP"),
        }
    }
}

/// Reads GlycoCT documents from a stream, yielding one [`Glycan`] per
/// document.
///
/// Input is consumed one line at a time, and a document is only finished
/// when the next one starts or the stream ends. After the stream ends or an
/// error is yielded, the reader yields nothing more.
pub struct GlycoctReader<R> {
    lines: Lines<R>,
    line: usize,
    tokens: VecDeque<String>,
    state: State,
    in_repeat: bool,
    document: Document,
    options: ReaderOptions,
    done: bool,
}

impl<R: BufRead> GlycoctReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, ReaderOptions::default())
    }

    pub fn with_options(reader: R, options: ReaderOptions) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
            tokens: VecDeque::new(),
            state: State::Start,
            in_repeat: false,
            document: Document::default(),
            options,
            done: false,
        }
    }

    fn next_token(&mut self) -> Option<Result<String>> {
        loop {
            if let Some(token) = self.tokens.pop_front() {
                return Some(Ok(token));
            }
            match self.lines.next()? {
                Ok(text) => {
                    self.line += 1;
                    self.tokens.extend(
                        text.split(|c: char| c.is_whitespace() || c == ';')
                            .filter(|token| !token.is_empty())
                            .map(str::to_string),
                    );
                }
                Err(err) => return Some(Err(err.into())),
            }
        }
    }

    fn finish_document(&mut self) -> Result<Glycan> {
        std::mem::take(&mut self.document).finish(&self.options)
    }

    /// Apply one token. Returns a glycan when the token closes a document.
    fn step(&mut self, token: &str) -> Result<Option<Glycan>> {
        let at = Location {
            line: self.line,
            token,
        };
        let line = classify(token).map_err(|reason| at.error(reason))?;
        trace!("{} ({}): {:?}", token, self.state, line);

        match line {
            Line::Section(Section::Res) => {
                let finished = if self.document.has_root() && !self.in_repeat {
                    Some(self.finish_document()?)
                } else {
                    None
                };
                self.state = State::Res;
                return Ok(finished);
            }
            Line::Section(Section::Lin) => {
                if self.state != State::Res {
                    return Err(at.error(format!("LIN must follow RES, not {}", self.state)));
                }
                self.state = State::Lin;
            }
            Line::Section(Section::Rep) => {
                debug!("Entering REP section at line {}", self.line);
                self.state = State::Rep;
                self.in_repeat = true;
            }
            Line::Section(section @ (Section::Alt | Section::Und)) => {
                return Err(GlycoctError::UnsupportedSection(section.keyword().to_string()));
            }
            Line::RepeatHeader {
                repeat,
                linkage,
                multiplicity,
            } => {
                if !self.in_repeat {
                    return Err(at.error("repeat header outside of a REP section"));
                }
                self.document.begin_repeat(repeat, linkage, multiplicity, &at)?;
                self.state = State::Start;
            }
            Line::Residue { index, residue } if self.state == State::Res => {
                self.document.add_node(
                    index,
                    NodeKind::Monosaccharide(residue),
                    self.in_repeat,
                    &at,
                )?;
            }
            Line::Substituent { index, name } if self.state == State::Res => {
                self.document.add_node(
                    index,
                    NodeKind::Substituent(Substituent::new(name)),
                    self.in_repeat,
                    &at,
                )?;
            }
            Line::RepeatStub { index, repeat } if self.state == State::Res => {
                if self.in_repeat {
                    return Err(GlycoctError::UnsupportedSection(format!(
                        "REP nested inside repeat {}",
                        self.document.current_repeat().unwrap_or_default()
                    )));
                }
                self.document.add_repeat_stub(index, repeat, &at)?;
            }
            Line::Linkage(linkage) if self.state == State::Lin => {
                self.document.add_linkage(linkage, self.in_repeat)?;
            }
            _ => {
                return Err(at.error(format!("unexpected in the {} section", self.state)));
            }
        }
        Ok(None)
    }
}

impl<'a> GlycoctReader<&'a [u8]> {
    pub fn from_text(text: &'a str) -> Self {
        Self::new(text.as_bytes())
    }
}

impl<R: BufRead> Iterator for GlycoctReader<R> {
    type Item = Result<Glycan>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let result = match self.next_token() {
                Some(Ok(token)) => self.step(&token),
                Some(Err(err)) => Err(err),
                None => {
                    self.done = true;
                    self.in_repeat = false;
                    if !self.document.has_content() {
                        return None;
                    }
                    return Some(self.finish_document());
                }
            };
            match result {
                Ok(Some(glycan)) => return Some(Ok(glycan)),
                Ok(None) => continue,
                Err(err) => {
                    debug!("Stopping after error: {}", err);
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

impl<R: BufRead> std::iter::FusedIterator for GlycoctReader<R> {}

/// The documents found in a string by [`loads`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loaded {
    One(Glycan),
    Many(Vec<Glycan>),
}

impl Loaded {
    pub fn into_vec(self) -> Vec<Glycan> {
        match self {
            Loaded::One(glycan) => vec![glycan],
            Loaded::Many(glycans) => glycans,
        }
    }
}

/// Parse every document in `text`: a single glycan when there is exactly
/// one, otherwise all of them in order.
pub fn loads(text: &str) -> Result<Loaded> {
    loads_with(text, ReaderOptions::default())
}

pub fn loads_with(text: &str, options: ReaderOptions) -> Result<Loaded> {
    let mut glycans = GlycoctReader::with_options(text.as_bytes(), options).collect::<Result<Vec<_>>>()?;
    if glycans.len() == 1 {
        if let Some(glycan) = glycans.pop() {
            return Ok(Loaded::One(glycan));
        }
    }
    Ok(Loaded::Many(glycans))
}

/// Parse a string holding exactly one document.
pub fn parse_glycoct(text: &str) -> Result<Glycan> {
    match loads(text)? {
        Loaded::One(glycan) => Ok(glycan),
        Loaded::Many(glycans) => Err(GlycoctError::format(
            0,
            text.lines().next().unwrap_or_default(),
            format!("expected one document, found {}", glycans.len()),
        )),
    }
}
