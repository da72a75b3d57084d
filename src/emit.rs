//! Header re-serialization.
//!
//! Renders a [`Document`] back into annotated header text: doc comments,
//! annotations, template heads and declarations, without any directive
//! markers. Examples appear as substituted code fences and cross-references
//! in their written form, so feeding the output back through
//! [`crate::document`] yields the same reference targets.

use crate::docblock::DocBlock;
use crate::model::{Declaration, Document, Item, Visibility};

const INDENT: &str = "\t";

/// Render `doc` as header text.
pub fn to_header(doc: &Document) -> String {
    let mut out = String::new();
    for (i, decl) in doc.declarations.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        emit_declaration(&mut out, decl, 0);
    }
    out
}

fn line(out: &mut String, depth: usize, text: &str) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(text);
    out.push('\n');
}

fn emit_doc(out: &mut String, depth: usize, doc: &DocBlock) {
    for text in doc.markdown().lines() {
        if text.is_empty() {
            line(out, depth, "///");
        } else {
            line(out, depth, &format!("/// {}", text));
        }
    }
}

fn emit_declaration(out: &mut String, decl: &Declaration, depth: usize) {
    if let Some(doc) = &decl.doc {
        emit_doc(out, depth, doc);
    }
    if let Some(annotation) = &decl.annotation {
        line(out, depth, &annotation.to_source());
    }
    if let Some(template) = &decl.template {
        line(out, depth, template);
    }

    match &decl.item {
        Item::Enum(shape) if shape.has_body => {
            line(out, depth, &decl.signature);
            line(out, depth, "{");
            for member in &decl.members {
                emit_variant(out, member, depth + 1);
            }
            line(out, depth, "};");
        }
        Item::Struct(shape) | Item::Class(shape) if shape.has_body || !decl.members.is_empty() => {
            let mut current = match decl.item {
                Item::Class(_) => Visibility::Private,
                _ => Visibility::Public,
            };
            line(out, depth, &decl.signature);
            line(out, depth, "{");
            for (i, member) in decl.members.iter().enumerate() {
                if member.visibility != current {
                    current = member.visibility;
                    line(out, depth, &format!("{}:", current.as_str()));
                } else if i > 0 {
                    out.push('\n');
                }
                emit_declaration(out, member, depth + 1);
            }
            line(out, depth, "};");
        }
        Item::Function(shape)
            if !decl.synthetic && shape.params.iter().any(|p| p.doc.is_some()) =>
        {
            let head = match &shape.prefix {
                Some(prefix) => format!("{} {}(", prefix, decl.name),
                None => format!("{}(", decl.name),
            };
            line(out, depth, &head);
            for (i, param) in shape.params.iter().enumerate() {
                if let Some(doc) = &param.doc {
                    emit_doc(out, depth + 1, doc);
                }
                let separator = if i + 1 < shape.params.len() { "," } else { "" };
                line(out, depth + 1, &format!("{}{}", param.signature(), separator));
            }
            let tail = match &shape.qualifiers {
                Some(qualifiers) => format!(") {};", qualifiers),
                None => ");".to_string(),
            };
            line(out, depth, &tail);
        }
        _ => line(out, depth, &terminated(&decl.signature)),
    }
}

fn emit_variant(out: &mut String, member: &Declaration, depth: usize) {
    if let Some(doc) = &member.doc {
        emit_doc(out, depth, doc);
    }
    let text = match &member.annotation {
        Some(annotation) => format!("{} {},", member.signature, annotation.to_source()),
        None => format!("{},", member.signature),
    };
    line(out, depth, &text);
}

fn terminated(signature: &str) -> String {
    if signature.ends_with(';') {
        signature.to_string()
    } else {
        format!("{};", signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_struct_with_visibility_and_param_docs() {
        let src = "/// A struct.\nUSTRUCT(BlueprintType)\nstruct S\n{\n\tint A;\nprotected:\n\t/// Does it.\n\tvoid F(\n\t\t/// The value.\n\t\tint V = 0) const;\n};\n";
        let doc = crate::document("t.h", src).unwrap();
        let out = to_header(&doc);
        assert_eq!(
            out,
            "/// A struct.\nUSTRUCT(BlueprintType)\nstruct S\n{\n\tint A;\nprotected:\n\t/// Does it.\n\tvoid F(\n\t\t/// The value.\n\t\tint V = 0\n\t) const;\n};\n"
        );
    }

    #[test]
    fn emit_enum_variants_with_meta() {
        let src = "UENUM()\nenum class E : uint8\n{\n\t/// First.\n\tA UMETA(DisplayName = \"Alpha\"),\n\tB = 2\n};\n";
        let out = to_header(&crate::document("t.h", src).unwrap());
        assert_eq!(
            out,
            "UENUM()\nenum class E : uint8\n{\n\t/// First.\n\tA UMETA(DisplayName = Alpha),\n\tB = 2,\n};\n"
        );
    }

    #[test]
    fn emit_has_no_directive_markers() {
        let src = "/// ```snippet\n/// s\n/// ```\nvoid Main()\n{\n\t//// [snippet: s]\n\tgo();\n\t//// [/snippet]\n}\n";
        let out = to_header(&crate::document("t.h", src).unwrap());
        assert!(!out.contains("////"));
        assert!(out.contains("/// ```cpp\n/// go();\n/// ```\n"));
        assert!(out.ends_with("void Main();\n"));
    }
}
