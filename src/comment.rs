//! Comment aggregator: merges consecutive `///` lines into blocks.
//!
//! A blank line ends a block unless the next non-blank line continues it.
//! A block directly followed by a `[proxy: name]` marker documents that proxy;
//! every other block is handed to the declaration parser, which attaches it
//! to the next declaration head.

use crate::classify::{LineKind, TaggedLine};
use crate::docblock::DocBlock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockTarget {
    Declaration,
    Proxy(String),
}

/// Consecutive doc comment lines, prefix stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBlock {
    /// Line of the first doc comment.
    pub line: usize,
    /// Last line belonging to the block.
    pub end: usize,
    pub lines: Vec<(usize, String)>,
    pub target: BlockTarget,
}

impl CommentBlock {
    pub fn to_doc(&self) -> DocBlock {
        DocBlock::parse(&self.lines)
    }
}

pub fn aggregate(lines: &[TaggedLine]) -> Vec<CommentBlock> {
    let visible: Vec<&TaggedLine> = lines.iter().filter(|l| l.is_visible()).collect();
    let mut blocks = Vec::new();
    let mut current: Vec<(usize, String)> = Vec::new();

    for (index, tagged) in visible.iter().enumerate() {
        if let LineKind::DocComment(text) = &tagged.kind {
            current.push((tagged.line, text.clone()));
            continue;
        }
        if current.is_empty() {
            continue;
        }

        let next = if tagged.is_blank() {
            visible[index + 1..].iter().find(|l| !l.is_blank())
        } else {
            Some(tagged)
        };
        match next.map(|l| &l.kind) {
            Some(LineKind::DocComment(_)) => current.push((tagged.line, String::new())),
            kind => {
                let target = match kind {
                    Some(LineKind::ProxyBegin(name)) => BlockTarget::Proxy(name.clone()),
                    _ => BlockTarget::Declaration,
                };
                blocks.push(close(std::mem::take(&mut current), target));
            }
        }
    }

    if !current.is_empty() {
        blocks.push(close(current, BlockTarget::Declaration));
    }
    blocks
}

fn close(lines: Vec<(usize, String)>, target: BlockTarget) -> CommentBlock {
    CommentBlock {
        line: lines.first().map_or(0, |(l, _)| *l),
        end: lines.last().map_or(0, |(l, _)| *l),
        lines,
        target,
    }
}
