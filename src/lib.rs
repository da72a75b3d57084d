//! headerdoc: extract documentation from annotated C++ headers.
//!
//! The pipeline runs in fixed phases over one file:
//!
//! 1. [`classify`] tags every line (code, doc comment, directive marker)
//! 2. [`region`] pairs snippet/proxy markers into named regions
//! 3. [`comment`] groups doc comment lines into blocks
//! 4. [`parser`] builds the declaration tree and attaches the blocks
//! 5. [`document`] splices injects, resolves references and fills examples
//!
//! [`document()`] runs all of them.

pub mod classify;
pub mod comment;
pub mod config;
pub mod docblock;
pub mod document;
pub mod emit;
pub mod error;
pub mod model;
pub mod parser;
pub mod region;
pub mod resolve;
pub mod symbols;

pub use config::{ConfigError, Settings};
pub use docblock::DocBlock;
pub use error::{DocError, ErrorKind};
pub use model::{DeclKind, Declaration, Document, Item, Visibility};

use comment::BlockTarget;
use std::collections::BTreeMap;

/// Build the resolved document for `source`, reported as `file` in errors.
pub fn document(file: &str, source: &str) -> Result<Document, DocError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    let lines = classify::classify(file, source)?;
    let regions = region::extract(file, &lines)?;
    let blocks = comment::aggregate(&lines);
    log::debug!(
        "{}: {} lines, {} regions, {} doc blocks",
        file,
        lines.len(),
        regions.len(),
        blocks.len()
    );

    let proxy_docs: BTreeMap<String, DocBlock> = blocks
        .iter()
        .filter_map(|block| match &block.target {
            BlockTarget::Proxy(name) => Some((name.clone(), block.to_doc())),
            BlockTarget::Declaration => None,
        })
        .collect();

    let parsed = parser::parse(file, &lines, &blocks)?;
    document::build(file, parsed, &regions, &proxy_docs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_strips_bom() {
        let doc = document("t.h", "\u{feff}/// Doc.\nstruct S\n{\n};\n").unwrap();
        assert_eq!(doc.declarations.len(), 1);
        assert_eq!(doc.declarations[0].line, 2);
    }

    #[test]
    fn document_of_empty_source() {
        let doc = document("t.h", "").unwrap();
        assert!(doc.declarations.is_empty());
        assert!(doc.snippets.is_empty());
    }

    #[test]
    fn document_reports_first_error() {
        let err = document("t.h", "//// [snippet: a]\nint X;\n").unwrap_err();
        assert_eq!(err.to_string().split(':').next(), Some("t.h"));
        assert!(matches!(err.kind, ErrorKind::UnterminatedRegion { .. }));
    }
}
