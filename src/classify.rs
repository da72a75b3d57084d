//! Line classifier: tags every raw source line in one linear pass.
//!
//! Recognizes three families of lines:
//! - `///` doc comments → [`LineKind::DocComment`]
//! - `////` tool comments carrying a bracketed directive
//!   (`[snippet: name]`, `[/snippet]`, `[proxy: name]`, `[/proxy]`,
//!   `[inject: name]`, `[ignore]`, `[/ignore]`), or plain tool text
//! - everything else → [`LineKind::Code`]
//!
//! Lines between `[ignore]` and `[/ignore]` are kept for pass-through but
//! flagged `ignored`, so downstream consumers skip them.

use crate::error::{DocError, ErrorKind, Result};
use regex::Regex;
use std::sync::LazyLock;

// -- Regex patterns -----------------------------------------------------------

static RE_TOOL_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[[:space:]]*////[[:space:]]?(.*)$").unwrap());

static RE_DOC_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[[:space:]]*///([^/].*)?$").unwrap());

// [snippet: name], [/snippet], [inject: name], [ignore] ...
static RE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[[[:blank:]]*(/?)[[:blank:]]*(snippet|proxy|inject|ignore)[[:blank:]]*(?::[[:blank:]]*([^\]]*?))?[[:blank:]]*\][[:blank:]]*$")
        .unwrap()
});

static RE_REGION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-]*$").unwrap());

// -- Types --------------------------------------------------------------------

/// Classification of a single source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Plain source code (including blank lines).
    Code,
    /// `///` doc comment; payload is the text after the prefix.
    DocComment(String),
    /// `////` tool comment without a directive; payload is the text after the prefix.
    ToolComment(String),
    SnippetBegin(String),
    SnippetEnd,
    ProxyBegin(String),
    ProxyEnd,
    InjectRef(String),
    IgnoreBegin,
    IgnoreEnd,
}

impl LineKind {
    /// True for the bracketed directive lines.
    pub fn is_marker(&self) -> bool {
        !matches!(
            self,
            LineKind::Code | LineKind::DocComment(_) | LineKind::ToolComment(_)
        )
    }
}

/// A classified source line. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedLine {
    /// 1-based line number.
    pub line: usize,
    /// Byte offset of the line start in the source text.
    pub offset: usize,
    /// Raw line text without the line terminator.
    pub text: String,
    pub kind: LineKind,
    /// Inside an `[ignore]` block (the ignore markers themselves included).
    pub ignored: bool,
}

impl TaggedLine {
    /// Lines every consumer other than raw pass-through should look at.
    pub fn is_visible(&self) -> bool {
        !self.ignored
    }

    pub fn is_blank(&self) -> bool {
        self.kind == LineKind::Code && self.text.trim().is_empty()
    }
}

// -- Public API ---------------------------------------------------------------

/// Classify `source` into tagged lines, preserving input order.
pub fn classify(file: &str, source: &str) -> Result<Vec<TaggedLine>> {
    let mut lines = Vec::new();
    // Line of the currently open [ignore], if any.
    let mut ignore_open: Option<usize> = None;
    let mut offset = 0;

    for (index, raw) in source.split('\n').enumerate() {
        let line = index + 1;
        let text = raw.strip_suffix('\r').unwrap_or(raw);
        let kind = classify_line(file, line, text)?;

        let ignored = match &kind {
            LineKind::IgnoreBegin => {
                if let Some(outer_line) = ignore_open {
                    return Err(DocError::new(
                        file,
                        line,
                        ErrorKind::NestedRegion {
                            inner: "ignore".to_string(),
                            outer: "ignore".to_string(),
                            outer_line,
                        },
                    ));
                }
                ignore_open = Some(line);
                true
            }
            LineKind::IgnoreEnd => {
                if ignore_open.take().is_none() {
                    return Err(DocError::new(
                        file,
                        line,
                        ErrorKind::UnmatchedMarker {
                            marker: "[/ignore]".to_string(),
                        },
                    ));
                }
                true
            }
            LineKind::SnippetBegin(_)
            | LineKind::SnippetEnd
            | LineKind::ProxyBegin(_)
            | LineKind::ProxyEnd => {
                // A region boundary may not fall inside an ignored span.
                if let Some(ignore_line) = ignore_open {
                    return Err(DocError::new(
                        file,
                        line,
                        ErrorKind::IgnoreOverlap {
                            marker: text.trim().to_string(),
                            ignore_line,
                        },
                    ));
                }
                false
            }
            _ => ignore_open.is_some(),
        };

        lines.push(TaggedLine {
            line,
            offset,
            text: text.to_string(),
            kind,
            ignored,
        });
        offset += raw.len() + 1;
    }

    if let Some(line) = ignore_open {
        return Err(DocError::new(
            file,
            line,
            ErrorKind::UnterminatedRegion {
                region: "ignore".to_string(),
            },
        ));
    }

    // A trailing newline produces one empty phantom line; drop it.
    if source.ends_with('\n') {
        lines.pop();
    }

    Ok(lines)
}

// -- Line processing ----------------------------------------------------------

fn classify_line(file: &str, line: usize, text: &str) -> Result<LineKind> {
    if let Some(caps) = RE_TOOL_COMMENT.captures(text) {
        let content = caps[1].trim_end();
        return match RE_DIRECTIVE.captures(content.trim()) {
            Some(d) => directive(
                file,
                line,
                content.trim(),
                d.get(1).is_some_and(|m| !m.as_str().is_empty()),
                &d[2],
                d.get(3).map(|m| m.as_str().trim()),
            ),
            None => Ok(LineKind::ToolComment(content.to_string())),
        };
    }

    if let Some(caps) = RE_DOC_COMMENT.captures(text) {
        let body = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let body = body.strip_prefix(' ').unwrap_or(body);
        return Ok(LineKind::DocComment(body.trim_end().to_string()));
    }

    Ok(LineKind::Code)
}

fn directive(
    file: &str,
    line: usize,
    marker: &str,
    closing: bool,
    word: &str,
    name: Option<&str>,
) -> Result<LineKind> {
    let malformed = |reason: &str| {
        DocError::new(
            file,
            line,
            ErrorKind::MalformedMarker {
                marker: marker.to_string(),
                reason: reason.to_string(),
            },
        )
    };

    let named = |name: Option<&str>| -> Result<String> {
        match name {
            Some(n) if RE_REGION_NAME.is_match(n) => Ok(n.to_string()),
            Some(n) if !n.is_empty() => Err(malformed("invalid name")),
            _ => Err(malformed("missing name")),
        }
    };

    if closing {
        if name.is_some() {
            return Err(malformed("end markers take no name"));
        }
        return match word {
            "snippet" => Ok(LineKind::SnippetEnd),
            "proxy" => Ok(LineKind::ProxyEnd),
            "ignore" => Ok(LineKind::IgnoreEnd),
            _ => Err(malformed("inject has no end marker")),
        };
    }

    match word {
        "snippet" => Ok(LineKind::SnippetBegin(named(name)?)),
        "proxy" => Ok(LineKind::ProxyBegin(named(name)?)),
        "inject" => Ok(LineKind::InjectRef(named(name)?)),
        _ if name.is_some() => Err(malformed("ignore takes no name")),
        _ => Ok(LineKind::IgnoreBegin),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<LineKind> {
        classify("t.h", src)
            .unwrap()
            .into_iter()
            .map(|l| l.kind)
            .collect()
    }

    #[test]
    fn classify_doc_and_code() {
        let k = kinds("/// Hello\n///\nint x;\n");
        assert_eq!(
            k,
            vec![
                LineKind::DocComment("Hello".to_string()),
                LineKind::DocComment(String::new()),
                LineKind::Code,
            ]
        );
    }

    #[test]
    fn classify_directives() {
        let k = kinds(
            "//// [snippet: hello_world]\n\t//// [/snippet]\n//// [proxy: p]\n//// void F();\n//// [/proxy]\n//// [inject: p]\n",
        );
        assert_eq!(
            k,
            vec![
                LineKind::SnippetBegin("hello_world".to_string()),
                LineKind::SnippetEnd,
                LineKind::ProxyBegin("p".to_string()),
                LineKind::ToolComment("void F();".to_string()),
                LineKind::ProxyEnd,
                LineKind::InjectRef("p".to_string()),
            ]
        );
    }

    #[test]
    fn tool_comment_is_not_doc_comment() {
        let k = kinds("//// just a note\n");
        assert_eq!(k, vec![LineKind::ToolComment("just a note".to_string())]);
    }

    #[test]
    fn ignore_flags_enclosed_lines() {
        let lines = classify("t.h", "a;\n//// [ignore]\nb;\n//// [/ignore]\nc;").unwrap();
        let flags: Vec<bool> = lines.iter().map(|l| l.ignored).collect();
        assert_eq!(flags, vec![false, true, true, true, false]);
    }

    #[test]
    fn offsets_and_line_numbers() {
        let lines = classify("t.h", "ab\r\ncd\n").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].line, 2);
        assert_eq!(lines[1].offset, 4);
        assert_eq!(lines[1].text, "cd");
    }

    #[test]
    fn unmatched_ignore_end() {
        let err = classify("t.h", "//// [/ignore]\n").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnmatchedMarker { .. }));
        assert_eq!(err.line, 1);
    }

    #[test]
    fn unterminated_ignore_names_opening_line() {
        let err = classify("t.h", "x;\n//// [ignore]\ny;\n").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnterminatedRegion { .. }));
        assert_eq!(err.line, 2);
    }

    #[test]
    fn region_boundary_inside_ignore_is_error() {
        let err =
            classify("t.h", "//// [ignore]\n//// [/snippet]\n//// [/ignore]\n").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::IgnoreOverlap { ignore_line: 1, .. }));
    }

    #[test]
    fn snippet_without_name_is_malformed() {
        let err = classify("t.h", "//// [snippet]\n").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MalformedMarker { .. }));
    }
}
