//! Markdown body of an aggregated doc comment.
//!
//! Two constructs are recognised inside the markdown:
//! - cross-references: `` [`struct: Foo::Bar`]() ``
//! - example references: a ```` ```snippet ```` fence whose only content is a
//!   snippet name. The code is filled in later from the region map.

use crate::model::DeclKind;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

// -- Regex patterns -----------------------------------------------------------

static RE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\[`[[:space:]]*(\w+)[[:space:]]*:[[:space:]]*(\w+(?:[[:space:]]*::[[:space:]]*\w+)*)[[:space:]]*`\][[:space:]]*\([[:space:]]*\)",
    )
    .unwrap()
});

static RE_SNIPPET_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[[:space:]]*snippet[[:space:]]*$").unwrap());

static RE_SNIPPET_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[/[:space:]]*([A-Za-z_][A-Za-z0-9_\-]*)[[:space:]]*$").unwrap());

// -- Types --------------------------------------------------------------------

/// Reference to a named snippet from an examples fence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExampleRef {
    pub snippet: String,
    /// Line of the snippet name inside the fence.
    pub line: usize,
    /// Snippet text, filled in by the document builder.
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Segment {
    Markdown(String),
    Example(ExampleRef),
}

/// A `` [`kind: path`]() `` link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossReference {
    pub kind: DeclKind,
    /// Path as written, whitespace removed.
    pub path: String,
    pub line: usize,
    /// Qualified path of the resolved declaration.
    pub target: Option<String>,
}

/// Documentation attached to one declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocBlock {
    /// Line of the first doc comment.
    pub line: usize,
    pub segments: Vec<Segment>,
    pub references: Vec<CrossReference>,
}

impl DocBlock {
    /// Parse doc comment lines (prefix already stripped) into a block.
    pub fn parse(lines: &[(usize, String)]) -> DocBlock {
        let first = lines.first().map(|(line, _)| *line).unwrap_or(0);
        let start = lines
            .iter()
            .position(|(_, text)| !text.trim().is_empty())
            .unwrap_or(lines.len());
        let end = lines
            .iter()
            .rposition(|(_, text)| !text.trim().is_empty())
            .map_or(start, |i| i + 1);
        let lines = &lines[start..end];

        let mut segments = Vec::new();
        let mut references = Vec::new();
        let mut text: Vec<&str> = Vec::new();
        let mut fence: Option<&str> = None;
        let mut i = 0;

        while i < lines.len() {
            let (line, content) = &lines[i];
            let trimmed = content.trim();

            if let Some(marker) = fence {
                if trimmed.starts_with(marker) {
                    fence = None;
                }
                text.push(content);
                i += 1;
                continue;
            }

            if RE_SNIPPET_FENCE.is_match(trimmed) {
                if let Some((example, consumed)) = snippet_fence(&lines[i + 1..]) {
                    flush(&mut text, &mut segments);
                    segments.push(Segment::Example(example));
                    i += 1 + consumed;
                    continue;
                }
                log::warn!("line {}: snippet fence without a snippet name", line);
            }

            if trimmed.starts_with("```") {
                fence = Some("```");
            } else if trimmed.starts_with("~~~") {
                fence = Some("~~~");
            } else {
                references.extend(scan_references(*line, content));
            }
            text.push(content);
            i += 1;
        }
        flush(&mut text, &mut segments);

        DocBlock {
            line: first,
            segments,
            references,
        }
    }

    pub fn examples(&self) -> impl Iterator<Item = &ExampleRef> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Example(example) => Some(example),
            Segment::Markdown(_) => None,
        })
    }

    pub fn is_resolved(&self) -> bool {
        self.references.iter().all(|r| r.target.is_some())
    }

    /// Markdown text with examples rendered as code fences and
    /// cross-references left in source form.
    pub fn markdown(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Markdown(text) => text.clone(),
                Segment::Example(ExampleRef {
                    code: Some(code), ..
                }) => format!("```cpp\n{}\n```", code),
                Segment::Example(ExampleRef { snippet, .. }) => {
                    format!("```snippet\n{}\n```", snippet)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// -- Helpers ------------------------------------------------------------------

fn flush(text: &mut Vec<&str>, segments: &mut Vec<Segment>) {
    if !text.is_empty() {
        segments.push(Segment::Markdown(text.join("\n")));
        text.clear();
    }
}

/// Match `name` + closing fence after a ```` ```snippet ```` line.
/// Returns the example and the number of lines consumed.
fn snippet_fence(rest: &[(usize, String)]) -> Option<(ExampleRef, usize)> {
    let mut iter = rest.iter().enumerate().filter(|(_, (_, t))| !t.trim().is_empty());
    let (_, (line, name_text)) = iter.next()?;
    let name = RE_SNIPPET_NAME.captures(name_text)?.get(1)?.as_str().to_string();
    let (close_index, (_, close_text)) = iter.next()?;
    if close_text.trim() != "```" {
        return None;
    }
    Some((
        ExampleRef {
            snippet: name,
            line: *line,
            code: None,
        },
        close_index + 1,
    ))
}

fn scan_references(line: usize, text: &str) -> Vec<CrossReference> {
    RE_REFERENCE
        .captures_iter(text)
        .filter_map(|caps| {
            let hint = &caps[1];
            let Some(kind) = DeclKind::from_hint(hint) else {
                log::warn!("line {}: unknown cross-reference kind `{}`", line, hint);
                return None;
            };
            Some(CrossReference {
                kind,
                path: caps[2].split_whitespace().collect(),
                line,
                target: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(text: &str) -> DocBlock {
        let lines: Vec<(usize, String)> = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 10, l.to_string()))
            .collect();
        DocBlock::parse(&lines)
    }

    #[test]
    fn parse_references_in_order() {
        let doc = block("See:\n- [`enum: Something`]()\n- [`struct: Self :: Foo`]()");
        let refs: Vec<(&str, DeclKind, usize)> = doc
            .references
            .iter()
            .map(|r| (r.path.as_str(), r.kind, r.line))
            .collect();
        assert_eq!(
            refs,
            vec![
                ("Something", DeclKind::Enum, 11),
                ("Self::Foo", DeclKind::Struct, 12),
            ]
        );
    }

    #[test]
    fn parse_snippet_fences_as_examples() {
        let doc = block("# Examples\n```snippet\nhello_world\n```\n```snippet\nwait_what\n```");
        let names: Vec<&str> = doc.examples().map(|e| e.snippet.as_str()).collect();
        assert_eq!(names, vec!["hello_world", "wait_what"]);
        assert_eq!(doc.segments.len(), 3);
        assert_eq!(doc.examples().next().unwrap().line, 12);
    }

    #[test]
    fn references_inside_code_fences_are_ignored() {
        let doc = block("```cpp\n// [`struct: Nope`]()\n```\n[`class: Yes`]()");
        assert_eq!(doc.references.len(), 1);
        assert_eq!(doc.references[0].path, "Yes");
    }

    #[test]
    fn unknown_kind_is_skipped() {
        let doc = block("[`module: Foo`]()");
        assert!(doc.references.is_empty());
    }

    #[test]
    fn markdown_renders_substituted_examples() {
        let mut doc = block("Text\n\n```snippet\nhello\n```");
        if let Segment::Example(example) = &mut doc.segments[1] {
            example.code = Some("printf(\"Hello\");".to_string());
        }
        assert_eq!(doc.markdown(), "Text\n\n```cpp\nprintf(\"Hello\");\n```");
    }

    #[test]
    fn surrounding_blank_lines_are_trimmed() {
        let doc = block("\nBody\n\n");
        assert_eq!(doc.line, 10);
        assert_eq!(doc.markdown(), "Body");
    }

    #[test]
    fn snippet_fence_without_name_stays_markdown() {
        let doc = block("```snippet\n```");
        assert_eq!(doc.examples().count(), 0);
        assert_eq!(doc.markdown(), "```snippet\n```");
    }
}
