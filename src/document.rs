//! Document model builder.
//!
//! Takes the parse output and produces the final, resolved tree:
//! 1. splice a synthetic member into each inject site's owner
//! 2. build the symbol table over the spliced tree
//! 3. resolve cross-references
//! 4. fill example references with snippet text

use crate::docblock::{DocBlock, ExampleRef, Segment};
use crate::error::{DocError, ErrorKind, Result};
use crate::model::{Declaration, Document, InjectSite, Visibility};
use crate::parser::{self, Parsed};
use crate::region::{RegionKind, RegionMap};
use crate::resolve;
use crate::symbols::SymbolTable;
use std::collections::BTreeMap;

/// Build the document for `file`. `proxy_docs` maps proxy names to the doc
/// block written directly above the proxy.
pub fn build(
    file: &str,
    parsed: Parsed,
    regions: &RegionMap,
    proxy_docs: &BTreeMap<String, DocBlock>,
) -> Result<Document> {
    let mut declarations = parsed.declarations;
    for site in &parsed.injects {
        let member = synthetic_member(file, site, regions, proxy_docs)?;
        let Some(owner) = find_mut(&mut declarations, &site.owner) else {
            return Err(DocError::new(
                file,
                site.line,
                ErrorKind::MisplacedInject {
                    proxy: site.proxy.clone(),
                },
            ));
        };
        owner.members.push(member);
    }

    let table = SymbolTable::build(&declarations);
    log::debug!("{}: {} symbols", file, table.len());
    let resolved = resolve::resolve(file, &declarations, &table)?;

    let declarations = resolved
        .iter()
        .map(|decl| decl.map_docs(&mut |doc, context| substitute(file, doc, context, regions)))
        .collect::<Result<Vec<_>>>()?;

    let snippets = regions
        .of_kind(RegionKind::Snippet)
        .map(|region| (region.name.clone(), region.text()))
        .collect();

    Ok(Document {
        file: file.to_string(),
        declarations,
        snippets,
    })
}

/// Documentation-only member described by the proxy an inject site names.
fn synthetic_member(
    file: &str,
    site: &InjectSite,
    regions: &RegionMap,
    proxy_docs: &BTreeMap<String, DocBlock>,
) -> Result<Declaration> {
    let Some(proxy) = regions.proxy(&site.proxy) else {
        return Err(DocError::new(
            file,
            site.line,
            ErrorKind::MissingProxyReference {
                proxy: site.proxy.clone(),
                owner: site.owner.clone(),
            },
        ));
    };
    let malformed = || {
        DocError::new(
            file,
            proxy.line,
            ErrorKind::MalformedProxy {
                proxy: proxy.name.clone(),
            },
        )
    };
    let signature = proxy.first_line().ok_or_else(malformed)?.to_string();
    let member = parser::parse_fragment(file, &proxy.text(), proxy.line + 1, &site.owner)?
        .into_iter()
        .next()
        .ok_or_else(malformed)?;

    Ok(Declaration {
        line: site.line,
        visibility: Visibility::Public,
        signature,
        doc: proxy_docs.get(&proxy.name).cloned(),
        synthetic: true,
        ..member
    })
}

fn find_mut<'a>(declarations: &'a mut [Declaration], path: &str) -> Option<&'a mut Declaration> {
    for decl in declarations {
        if decl.path == path {
            return Some(decl);
        }
        if path.starts_with(&decl.path) {
            if let Some(found) = find_mut(&mut decl.members, path) {
                return Some(found);
            }
        }
    }
    None
}

/// Fill every example reference of `doc` with its snippet's text.
fn substitute(file: &str, doc: &DocBlock, context: &str, regions: &RegionMap) -> Result<DocBlock> {
    let segments = doc
        .segments
        .iter()
        .map(|segment| match segment {
            Segment::Example(example) if example.code.is_none() => {
                let Some(snippet) = regions.snippet(&example.snippet) else {
                    return Err(DocError::new(
                        file,
                        example.line,
                        ErrorKind::MissingSnippetReference {
                            snippet: example.snippet.clone(),
                            referrer: context.to_string(),
                        },
                    ));
                };
                Ok(Segment::Example(ExampleRef {
                    code: Some(snippet.text()),
                    ..example.clone()
                }))
            }
            other => Ok(other.clone()),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(DocBlock {
        segments,
        ..doc.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::comment::{aggregate, BlockTarget};
    use crate::model::Item;
    use crate::region;

    fn build_src(src: &str) -> Result<Document> {
        let lines = classify("t.h", src)?;
        let regions = region::extract("t.h", &lines)?;
        let blocks = aggregate(&lines);
        let proxy_docs = blocks
            .iter()
            .filter_map(|b| match &b.target {
                BlockTarget::Proxy(name) => Some((name.clone(), b.to_doc())),
                BlockTarget::Declaration => None,
            })
            .collect();
        let parsed = parser::parse("t.h", &lines, &blocks)?;
        build("t.h", parsed, &regions, &proxy_docs)
    }

    const INJECT_SRC: &str = "/// Proxy docs.\n//// [proxy: injectable]\n//// void Injected() const;\n//// [/proxy]\nstruct Who\n{\n\tint What = 0;\n\t//// [inject: injectable]\n\tINJECT\n};\n";

    #[test]
    fn inject_appends_synthetic_member() {
        let doc = build_src(INJECT_SRC).unwrap();
        let who = doc.find("Who").unwrap();
        let names: Vec<&str> = who.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["What", "Injected"]);

        let injected = &who.members[1];
        assert!(injected.synthetic);
        assert_eq!(injected.path, "Who::Injected");
        assert_eq!(injected.signature, "void Injected() const;");
        assert!(matches!(injected.item, Item::Function(_)));
        assert_eq!(injected.doc.as_ref().unwrap().markdown(), "Proxy docs.");
    }

    #[test]
    fn inject_of_property_proxy() {
        let src = "/// Injected counter.\n//// [proxy: counter]\n//// int Count = 0;\n//// [/proxy]\nstruct Who\n{\n\tint What = 0;\n\t//// [inject: counter]\n\tINJECT_COUNTER\n};\n";
        let doc = build_src(src).unwrap();
        let count = doc.find("Who::Count").unwrap();
        assert!(count.synthetic);
        assert_eq!(count.signature, "int Count = 0;");
        assert_eq!(count.doc.as_ref().unwrap().markdown(), "Injected counter.");
        let Item::Property(shape) = &count.item else {
            panic!("expected property, got {:?}", count.item);
        };
        assert_eq!(shape.ty, "int");
        assert_eq!(shape.default.as_deref(), Some("0"));
        assert_eq!(doc.find("Who").unwrap().members.len(), 2);
    }

    #[test]
    fn doc_comment_inside_proxy_is_malformed() {
        let src = "//// [proxy: p]\n/// Wrong place.\n//// void F();\n//// [/proxy]\nstruct Who\n{\n\t//// [inject: p]\n};\n";
        let err = build_src(src).unwrap_err();
        assert_eq!(err.line, 2);
        assert!(matches!(err.kind, ErrorKind::MalformedProxy { .. }));
    }

    #[test]
    fn inject_of_unknown_proxy_is_error() {
        let err = build_src("struct Who\n{\n\t//// [inject: nope]\n};\n").unwrap_err();
        assert_eq!(err.line, 3);
        assert!(matches!(err.kind, ErrorKind::MissingProxyReference { .. }));
    }

    #[test]
    fn empty_proxy_is_malformed() {
        let err = build_src("//// [proxy: empty]\n//// [/proxy]\nstruct Who\n{\n\t//// [inject: empty]\n};\n")
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MalformedProxy { .. }));
        assert_eq!(err.line, 1);
    }

    #[test]
    fn synthetic_member_is_resolvable() {
        let src = format!("{}/// See [`function: Who::Injected`]()\nvoid Main();\n", INJECT_SRC);
        let doc = build_src(&src).unwrap();
        let main = doc.find("Main").unwrap();
        assert_eq!(
            main.doc.as_ref().unwrap().references[0].target.as_deref(),
            Some("Who::Injected")
        );
    }

    #[test]
    fn examples_are_substituted_in_order() {
        let src = "/// ```snippet\n/// second\n/// ```\n/// ```snippet\n/// first\n/// ```\nvoid Main()\n{\n\t//// [snippet: first]\n\tone();\n\t//// [/snippet]\n\t//// [snippet: second]\n\ttwo();\n\t//// [/snippet]\n}\n";
        let doc = build_src(src).unwrap();
        let main = doc.find("Main").unwrap();
        let code: Vec<&str> = main
            .doc
            .as_ref()
            .unwrap()
            .examples()
            .filter_map(|e| e.code.as_deref())
            .collect();
        assert_eq!(code, vec!["two();", "one();"]);
        assert_eq!(doc.snippets.len(), 2);
    }

    #[test]
    fn missing_snippet_is_error() {
        let err = build_src("/// ```snippet\n/// nope\n/// ```\nvoid Main();\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(
            err.kind,
            ErrorKind::MissingSnippetReference {
                snippet: "nope".to_string(),
                referrer: "Main".to_string()
            }
        );
    }
}
