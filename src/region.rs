//! Region extractor: named snippet and proxy spans.
//!
//! Keeps one open-region slot per kind. Snippets capture code and doc lines
//! verbatim; proxies capture code and the text of their `////` lines, and
//! reject `///` lines, whose docs belong above the `[proxy:]` marker.
//! Marker lines and ignored lines never reach captured text.

use crate::classify::{LineKind, TaggedLine};
use crate::error::{DocError, ErrorKind, Result};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    Snippet,
    Proxy,
}

impl RegionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RegionKind::Snippet => "snippet",
            RegionKind::Proxy => "proxy",
        }
    }
}

impl std::fmt::Display for RegionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named span of captured code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub name: String,
    pub kind: RegionKind,
    /// Line of the opening marker.
    pub line: usize,
    /// Captured lines, dedented, with surrounding blank lines trimmed.
    pub lines: Vec<String>,
}

impl Region {
    /// Captured text joined with `\n`, without a trailing newline.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// First non-blank captured line, trimmed.
    pub fn first_line(&self) -> Option<&str> {
        self.lines
            .iter()
            .map(|l| l.trim())
            .find(|l| !l.is_empty())
    }
}

/// All regions of one file, keyed by kind and name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionMap {
    regions: BTreeMap<(RegionKind, String), Region>,
}

impl RegionMap {
    pub fn get(&self, kind: RegionKind, name: &str) -> Option<&Region> {
        self.regions.get(&(kind, name.to_string()))
    }

    pub fn snippet(&self, name: &str) -> Option<&Region> {
        self.get(RegionKind::Snippet, name)
    }

    pub fn proxy(&self, name: &str) -> Option<&Region> {
        self.get(RegionKind::Proxy, name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    pub fn of_kind(&self, kind: RegionKind) -> impl Iterator<Item = &Region> {
        self.regions.values().filter(move |r| r.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

struct OpenRegion {
    name: String,
    line: usize,
    lines: Vec<String>,
}

/// Extract every snippet and proxy region from the tagged stream.
pub fn extract(file: &str, lines: &[TaggedLine]) -> Result<RegionMap> {
    let mut map = RegionMap::default();
    let mut snippet: Option<OpenRegion> = None;
    let mut proxy: Option<OpenRegion> = None;

    for tagged in lines {
        match &tagged.kind {
            LineKind::SnippetBegin(name) => open(file, tagged, RegionKind::Snippet, name, &mut snippet)?,
            LineKind::ProxyBegin(name) => open(file, tagged, RegionKind::Proxy, name, &mut proxy)?,
            LineKind::SnippetEnd => close(file, tagged, RegionKind::Snippet, &mut snippet, &mut map)?,
            LineKind::ProxyEnd => close(file, tagged, RegionKind::Proxy, &mut proxy, &mut map)?,
            _ if !tagged.is_visible() || tagged.kind.is_marker() => {}
            LineKind::ToolComment(content) => {
                if let Some(open) = proxy.as_mut() {
                    open.lines.push(content.clone());
                }
            }
            LineKind::DocComment(_) if proxy.is_some() => {
                let name = proxy.as_ref().map(|open| open.name.clone()).unwrap_or_default();
                return Err(DocError::new(
                    file,
                    tagged.line,
                    ErrorKind::MalformedProxy { proxy: name },
                ));
            }
            LineKind::Code | LineKind::DocComment(_) => {
                for open in [snippet.as_mut(), proxy.as_mut()].into_iter().flatten() {
                    open.lines.push(tagged.text.clone());
                }
            }
            _ => {}
        }
    }

    for (kind, open) in [(RegionKind::Snippet, snippet), (RegionKind::Proxy, proxy)] {
        if let Some(open) = open {
            return Err(DocError::new(
                file,
                open.line,
                ErrorKind::UnterminatedRegion {
                    region: format!("`{}: {}`", kind, open.name),
                },
            ));
        }
    }

    Ok(map)
}

fn open(
    file: &str,
    tagged: &TaggedLine,
    kind: RegionKind,
    name: &str,
    slot: &mut Option<OpenRegion>,
) -> Result<()> {
    if let Some(outer) = slot.as_ref() {
        return Err(DocError::new(
            file,
            tagged.line,
            ErrorKind::NestedRegion {
                inner: format!("`{}: {}`", kind, name),
                outer: format!("`{}: {}`", kind, outer.name),
                outer_line: outer.line,
            },
        ));
    }
    *slot = Some(OpenRegion {
        name: name.to_string(),
        line: tagged.line,
        lines: Vec::new(),
    });
    Ok(())
}

fn close(
    file: &str,
    tagged: &TaggedLine,
    kind: RegionKind,
    slot: &mut Option<OpenRegion>,
    map: &mut RegionMap,
) -> Result<()> {
    let Some(open) = slot.take() else {
        return Err(DocError::new(
            file,
            tagged.line,
            ErrorKind::UnmatchedMarker {
                marker: format!("[/{}]", kind),
            },
        ));
    };

    let key = (kind, open.name.clone());
    if let Some(first) = map.regions.get(&key) {
        return Err(DocError::new(
            file,
            open.line,
            ErrorKind::DuplicateRegionName {
                kind: kind.to_string(),
                name: open.name,
                first_line: first.line,
            },
        ));
    }

    map.regions.insert(
        key,
        Region {
            name: open.name,
            kind,
            line: open.line,
            lines: dedent(open.lines),
        },
    );
    Ok(())
}

/// Trim surrounding blank lines and strip the common leading whitespace.
fn dedent(mut lines: Vec<String>) -> Vec<String> {
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    let start = lines
        .iter()
        .position(|l| !l.trim().is_empty())
        .unwrap_or(lines.len());
    lines.drain(..start);

    let level = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    lines
        .into_iter()
        .map(|l| {
            if l.trim().is_empty() {
                String::new()
            } else {
                l.chars().skip(level).collect::<String>().trim_end().to_string()
            }
        })
        .collect()
}
