//! Error types for the documentation pipeline.
//!
//! Every failure is fatal for the file being processed and carries the file
//! identifier and the 1-based line that triggered it.

use thiserror::Error;

/// A pipeline error with location information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocError {
    /// File identifier handed to [`crate::document`].
    pub file: String,
    /// 1-based source line.
    pub line: usize,
    pub kind: ErrorKind,
}

impl DocError {
    #[must_use]
    pub fn new(file: impl Into<String>, line: usize, kind: ErrorKind) -> Self {
        Self {
            file: file.into(),
            line,
            kind,
        }
    }
}

impl std::fmt::Display for DocError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.kind)
    }
}

impl std::error::Error for DocError {}

/// The kind of pipeline error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("unmatched end marker `{marker}`")]
    UnmatchedMarker { marker: String },

    #[error("unterminated region {region} (opened here)")]
    UnterminatedRegion { region: String },

    #[error("duplicate {kind} name `{name}` (first defined on line {first_line})")]
    DuplicateRegionName {
        kind: String,
        name: String,
        first_line: usize,
    },

    #[error("nested region {inner} inside {outer} opened on line {outer_line}")]
    NestedRegion {
        inner: String,
        outer: String,
        outer_line: usize,
    },

    #[error("malformed marker `{marker}`: {reason}")]
    MalformedMarker { marker: String, reason: String },

    #[error("marker `{marker}` inside an ignore block opened on line {ignore_line}")]
    IgnoreOverlap { marker: String, ignore_line: usize },

    #[error("malformed metadata in `{annotation}`: {reason}")]
    MalformedMetadata { annotation: String, reason: String },

    #[error("annotation `{annotation}` is not followed by a matching declaration (found {found})")]
    OrphanedAnnotation { annotation: String, found: String },

    #[error("unresolved reference `{path}` in documentation of `{referrer}`")]
    UnresolvedReference { path: String, referrer: String },

    #[error("ambiguous reference `{path}` in documentation of `{referrer}`: candidates are {}", .candidates.join(", "))]
    AmbiguousReference {
        path: String,
        referrer: String,
        candidates: Vec<String>,
    },

    #[error("missing snippet `{snippet}` referenced by `{referrer}`")]
    MissingSnippetReference { snippet: String, referrer: String },

    #[error("missing proxy `{proxy}` injected into `{owner}`")]
    MissingProxyReference { proxy: String, owner: String },

    #[error("inject marker `{proxy}` must appear directly inside a struct or class body")]
    MisplacedInject { proxy: String },

    #[error("proxy `{proxy}` does not contain a declaration")]
    MalformedProxy { proxy: String },
}

pub type Result<T, E = DocError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_location() {
        let err = DocError::new(
            "test.h",
            12,
            ErrorKind::UnmatchedMarker {
                marker: "[/snippet]".to_string(),
            },
        );
        assert_eq!(err.to_string(), "test.h:12: unmatched end marker `[/snippet]`");
    }

    #[test]
    fn ambiguous_lists_candidates() {
        let kind = ErrorKind::AmbiguousReference {
            path: "A".to_string(),
            referrer: "Main".to_string(),
            candidates: vec!["Foo::A".to_string(), "Something::A".to_string()],
        };
        assert!(kind.to_string().ends_with("candidates are Foo::A, Something::A"));
    }
}
