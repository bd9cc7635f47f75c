use thiserror::Error;

use crate::NodeId;

pub type Result<T, E = GlycoctError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum GlycoctError {
    #[error("Line {line}: could not interpret '{token}': {reason}")]
    Format {
        line: usize,
        token: String,
        reason: String,
    },
    #[error("Section {0} is not supported")]
    UnsupportedSection(String),
    #[error("Repeat count {requested} is not within the range {lower}-{upper}")]
    Range {
        requested: u32,
        lower: String,
        upper: String,
    },
    #[error("No open position among {choices} on node {node}")]
    NoOpenPosition { node: NodeId, choices: String },
    #[error("Could not resolve a node declared as {0}")]
    UnresolvedReference(usize),
    #[error("Failed to read GlycoCT input")]
    Io(#[from] std::io::Error),
}

/// The category of a [`GlycoctError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Format,
    UnsupportedSection,
    Range,
    NoOpenPosition,
    UnresolvedReference,
    Io,
}

impl GlycoctError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GlycoctError::Format { .. } => ErrorKind::Format,
            GlycoctError::UnsupportedSection(_) => ErrorKind::UnsupportedSection,
            GlycoctError::Range { .. } => ErrorKind::Range,
            GlycoctError::NoOpenPosition { .. } => ErrorKind::NoOpenPosition,
            GlycoctError::UnresolvedReference(_) => ErrorKind::UnresolvedReference,
            GlycoctError::Io(_) => ErrorKind::Io,
        }
    }

    /// True when the input used a part of the format this parser refuses to
    /// approximate, as opposed to being malformed.
    pub fn is_unsupported_section(&self) -> bool {
        self.kind() == ErrorKind::UnsupportedSection
    }

    pub(crate) fn format(line: usize, token: &str, reason: impl Into<String>) -> Self {
        GlycoctError::Format {
            line,
            token: token.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = GlycoctError::UnsupportedSection("ALT".into());
        assert!(err.is_unsupported_section());
        assert_eq!(err.to_string(), "Section ALT is not supported");

        let err = GlycoctError::format(3, "1q:foo", "unknown line");
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(!err.is_unsupported_section());
        assert_eq!(
            err.to_string(),
            "Line 3: could not interpret '1q:foo': unknown line"
        );
    }
}
