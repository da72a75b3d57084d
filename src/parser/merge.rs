//! Duplicate merge: combine repeated declarations of one entity.
//!
//! Headers routinely mention an entity twice, e.g. a forward declaration
//! followed by the definition. Within one scope the later declaration wins,
//! except that a bodyless forward declaration never displaces a definition.
//! Whichever survives inherits a doc block or annotation it lacks.
//! Functions whose parameter types differ are overloads and are all kept.

use crate::model::Declaration;

/// Add `decl` to `decls`, merging it with an earlier declaration of the same entity.
pub fn merge_into(decls: &mut Vec<Declaration>, decl: Declaration) {
    let Some(index) = decls.iter().position(|d| same_entity(d, &decl)) else {
        decls.push(decl);
        return;
    };

    let earlier = &mut decls[index];
    if earlier.item.has_body() && !decl.item.has_body() {
        log::debug!(
            "keeping definition of `{}` from line {} over forward declaration on line {}",
            earlier.path,
            earlier.line,
            decl.line
        );
        inherit(earlier, decl);
    } else {
        log::debug!(
            "`{}` on line {} replaces the declaration on line {}",
            decl.path,
            decl.line,
            earlier.line
        );
        let loser = std::mem::replace(earlier, decl);
        inherit(earlier, loser);
    }
}

fn same_entity(a: &Declaration, b: &Declaration) -> bool {
    a.path == b.path && a.kind() == b.kind() && a.item.param_types() == b.item.param_types()
}

fn inherit(winner: &mut Declaration, loser: Declaration) {
    if winner.doc.is_none() {
        winner.doc = loser.doc;
    }
    if winner.annotation.is_none() {
        winner.annotation = loser.annotation;
    }
    if winner.template.is_none() {
        winner.template = loser.template;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docblock::DocBlock;
    use crate::model::{EnumShape, FunctionShape, Item, Param, Visibility};

    fn decl(name: &str, line: usize, item: Item) -> Declaration {
        Declaration {
            name: name.to_string(),
            path: name.to_string(),
            line,
            visibility: Visibility::Public,
            template: None,
            annotation: None,
            signature: name.to_string(),
            doc: None,
            item,
            members: Vec::new(),
            synthetic: false,
        }
    }

    fn enum_item(has_body: bool) -> Item {
        Item::Enum(EnumShape {
            scoped: true,
            underlying: None,
            has_body,
        })
    }

    fn function(ty: &str, has_body: bool) -> Item {
        Item::Function(FunctionShape {
            params: vec![Param {
                name: Some("A".to_string()),
                ty: ty.to_string(),
                default: None,
                doc: None,
            }],
            has_body,
            ..FunctionShape::default()
        })
    }

    #[test]
    fn definition_replaces_forward_in_place() {
        let mut decls = vec![decl("Something", 5, enum_item(false)), decl("Other", 6, enum_item(true))];
        merge_into(&mut decls, decl("Something", 20, enum_item(true)));
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].line, 20);
        assert!(decls[0].item.has_body());
    }

    #[test]
    fn forward_after_definition_is_absorbed() {
        let mut decls = vec![decl("Something", 5, enum_item(true))];
        let mut forward = decl("Something", 20, enum_item(false));
        forward.doc = Some(DocBlock::parse(&[(19, "Late docs.".to_string())]));
        merge_into(&mut decls, forward);
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].line, 5);
        assert!(decls[0].doc.is_some());
    }

    #[test]
    fn overloads_are_kept() {
        let mut decls = vec![decl("F", 1, function("int", false))];
        merge_into(&mut decls, decl("F", 2, function("float", false)));
        merge_into(&mut decls, decl("F", 3, function("int", true)));
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].line, 3);
    }
}
