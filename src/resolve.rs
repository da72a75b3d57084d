//! Reference resolver.
//!
//! Runs after the whole file is parsed, so forward references resolve.
//! A path is looked up, in order:
//! 1. `Self` as first segment: the documented declaration's path, exact only
//! 2. as written
//! 3. under the documented declaration's path, then under each ancestor
//! 4. as a bare name, if exactly one declaration carries it

use crate::docblock::{CrossReference, DocBlock};
use crate::error::{DocError, ErrorKind, Result};
use crate::model::{join_path, Declaration, PATH_SEPARATOR};
use crate::symbols::SymbolTable;

const SELF: &str = "Self";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(String),
    Ambiguous(Vec<String>),
    Unresolved,
}

/// Resolve `path` as written in the docs of the declaration at `context`.
pub fn resolve_path(table: &SymbolTable, path: &str, context: &str) -> Resolution {
    let found = |candidate: String| {
        if table.contains(&candidate) {
            Resolution::Found(candidate)
        } else {
            Resolution::Unresolved
        }
    };

    if let Some(rest) = path.strip_prefix(SELF) {
        if rest.is_empty() {
            return found(context.to_string());
        }
        if let Some(rest) = rest.strip_prefix(PATH_SEPARATOR) {
            return found(join_path(context, rest));
        }
    }

    if table.contains(path) {
        return Resolution::Found(path.to_string());
    }

    let mut scope = Some(context);
    while let Some(prefix) = scope.filter(|s| !s.is_empty()) {
        let candidate = join_path(prefix, path);
        if table.contains(&candidate) {
            return Resolution::Found(candidate);
        }
        scope = prefix.rsplit_once(PATH_SEPARATOR).map(|(parent, _)| parent);
    }

    if path.contains(PATH_SEPARATOR) {
        return Resolution::Unresolved;
    }
    match table.paths_named(path).as_slice() {
        [] => Resolution::Unresolved,
        [single] => Resolution::Found(single.to_string()),
        many => Resolution::Ambiguous(many.iter().map(|p| p.to_string()).collect()),
    }
}

/// Resolve every cross-reference of `doc`, returning a new block.
/// References that already carry a target are kept as they are.
pub fn resolve_doc(
    file: &str,
    table: &SymbolTable,
    doc: &DocBlock,
    context: &str,
) -> Result<DocBlock> {
    let references = doc
        .references
        .iter()
        .map(|reference| resolve_reference(file, table, reference, context))
        .collect::<Result<Vec<_>>>()?;
    Ok(DocBlock {
        references,
        ..doc.clone()
    })
}

fn resolve_reference(
    file: &str,
    table: &SymbolTable,
    reference: &CrossReference,
    context: &str,
) -> Result<CrossReference> {
    if reference.target.is_some() {
        return Ok(reference.clone());
    }
    match resolve_path(table, &reference.path, context) {
        Resolution::Found(target) => {
            let kinds = table.get(&target).unwrap_or_default();
            if !kinds.iter().any(|s| s.kind == reference.kind) {
                log::warn!(
                    "{}:{}: `{}: {}` resolves to `{}`, which is not a {}",
                    file,
                    reference.line,
                    reference.kind,
                    reference.path,
                    target,
                    reference.kind
                );
            }
            log::trace!("{}:{}: `{}` -> `{}`", file, reference.line, reference.path, target);
            Ok(CrossReference {
                target: Some(target),
                ..reference.clone()
            })
        }
        Resolution::Ambiguous(candidates) => Err(DocError::new(
            file,
            reference.line,
            ErrorKind::AmbiguousReference {
                path: reference.path.clone(),
                referrer: context.to_string(),
                candidates,
            },
        )),
        Resolution::Unresolved => Err(DocError::new(
            file,
            reference.line,
            ErrorKind::UnresolvedReference {
                path: reference.path.clone(),
                referrer: context.to_string(),
            },
        )),
    }
}

/// Resolve all doc blocks in the tree, producing a new tree.
pub fn resolve(
    file: &str,
    declarations: &[Declaration],
    table: &SymbolTable,
) -> Result<Vec<Declaration>> {
    declarations
        .iter()
        .map(|decl| decl.map_docs(&mut |doc, context| resolve_doc(file, table, doc, context)))
        .collect()
}
