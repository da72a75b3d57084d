//! Flat symbol table over a declaration tree.
//!
//! Keyed by qualified path. Overloads share a path, so each path maps to
//! every declaration carrying it.

use crate::model::{DeclKind, Declaration};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub path: String,
    pub name: String,
    pub kind: DeclKind,
    pub line: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    by_path: BTreeMap<String, Vec<Symbol>>,
    /// Bare name → distinct paths carrying it.
    by_name: BTreeMap<String, BTreeSet<String>>,
}

impl SymbolTable {
    pub fn build(declarations: &[Declaration]) -> Self {
        let mut table = SymbolTable::default();
        for decl in declarations {
            for d in decl.walk() {
                table.insert(d);
            }
        }
        table
    }

    pub fn insert(&mut self, decl: &Declaration) {
        self.by_path
            .entry(decl.path.clone())
            .or_default()
            .push(Symbol {
                path: decl.path.clone(),
                name: decl.name.clone(),
                kind: decl.kind(),
                line: decl.line,
            });
        self.by_name
            .entry(decl.name.clone())
            .or_default()
            .insert(decl.path.clone());
    }

    pub fn get(&self, path: &str) -> Option<&[Symbol]> {
        self.by_path.get(path).map(Vec::as_slice)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    /// Distinct paths whose last segment is `name`, sorted.
    pub fn paths_named(&self, name: &str) -> Vec<&str> {
        self.by_name
            .get(name)
            .map(|paths| paths.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Number of distinct paths.
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::comment::aggregate;
    use crate::parser;

    fn table(src: &str) -> SymbolTable {
        let lines = classify("t.h", src).unwrap();
        let parsed = parser::parse("t.h", &lines, &aggregate(&lines)).unwrap();
        SymbolTable::build(&parsed.declarations)
    }

    #[test]
    fn build_indexes_nested_members() {
        let t = table("struct Foo\n{\n\tvoid Foo();\n\tint A;\n};\n");
        assert!(t.contains("Foo"));
        assert!(t.contains("Foo::Foo"));
        assert!(t.contains("Foo::A"));
        assert_eq!(t.len(), 3);
        assert_eq!(t.paths_named("Foo"), vec!["Foo", "Foo::Foo"]);
    }

    #[test]
    fn overloads_share_a_path() {
        let t = table("struct S\n{\n\tvoid F(int A);\n\tvoid F(float A);\n};\n");
        assert_eq!(t.get("S::F").map(<[Symbol]>::len), Some(2));
        assert_eq!(t.paths_named("F"), vec!["S::F"]);
    }
}
