//! Data model for parsed documentation: format-agnostic.
//!
//! Declarations form an owned tree: every member belongs to exactly one
//! enclosing declaration. Lookups go through the flat
//! [`SymbolTable`](crate::symbols::SymbolTable), so no back-pointers exist.

use crate::config::Settings;
use crate::docblock::DocBlock;
use crate::error::Result;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Separator between segments of a qualified path.
pub const PATH_SEPARATOR: &str = "::";

/// Join a parent path and a name into a qualified path.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", parent, PATH_SEPARATOR, name)
    }
}

/// Closed set of declaration kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Enum,
    Struct,
    Class,
    Function,
    /// Enum variant.
    Member,
    /// Data member.
    Property,
}

impl DeclKind {
    /// Kind named by a cross-reference hint (`enum`, `struct`, `class`, `function`).
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint {
            "enum" => Some(DeclKind::Enum),
            "struct" => Some(DeclKind::Struct),
            "class" => Some(DeclKind::Class),
            "function" => Some(DeclKind::Function),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeclKind::Enum => "enum",
            DeclKind::Struct => "struct",
            DeclKind::Class => "class",
            DeclKind::Function => "function",
            DeclKind::Member => "member",
            DeclKind::Property => "property",
        }
    }
}

impl std::fmt::Display for DeclKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "public" => Some(Visibility::Public),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }

    pub fn can_export(self, settings: &Settings) -> bool {
        match self {
            Visibility::Public => true,
            Visibility::Protected => settings.document_protected,
            Visibility::Private => settings.document_private,
        }
    }
}

/// Annotation metadata value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    /// Bare specifier such as `BlueprintType`.
    Flag,
    /// `Key = Value`, string literals unquoted.
    Text(String),
    /// `Key = (A = B, C)`.
    Group(Metadata),
}

impl Serialize for MetaValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetaValue::Flag => serializer.serialize_bool(true),
            MetaValue::Text(text) => serializer.serialize_str(text),
            MetaValue::Group(group) => group.serialize(serializer),
        }
    }
}

/// Ordered key → value mapping parsed from a reflection macro's arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub entries: Vec<(String, MetaValue)>,
}

impl Metadata {
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render back to macro argument syntax: `BlueprintType, Meta = (Foo = Bar)`.
    pub fn to_args(&self) -> String {
        self.entries
            .iter()
            .map(|(key, value)| match value {
                MetaValue::Flag => key.clone(),
                MetaValue::Text(text) if is_plain_token(text) => format!("{} = {}", key, text),
                MetaValue::Text(text) => format!("{} = \"{}\"", key, text.replace('"', "\\\"")),
                MetaValue::Group(group) => format!("{} = ({})", key, group.to_args()),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn is_plain_token(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// A reflection macro attached to a declaration, e.g. `UCLASS(Blueprintable)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    #[serde(rename = "macro")]
    pub macro_name: String,
    pub metadata: Metadata,
    pub line: usize,
}

impl Annotation {
    /// Render back to source form.
    pub fn to_source(&self) -> String {
        format!("{}({})", self.macro_name, self.metadata.to_args())
    }
}

/// Function parameter; the default expression is kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: String,
    pub default: Option<String>,
    pub doc: Option<DocBlock>,
}

impl Param {
    pub fn signature(&self) -> String {
        let mut result = self.ty.clone();
        if let Some(name) = &self.name {
            result.push(' ');
            result.push_str(name);
        }
        if let Some(default) = &self.default {
            result.push_str(" = ");
            result.push_str(default);
        }
        result
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnumShape {
    /// `enum class` / `enum struct`.
    pub scoped: bool,
    pub underlying: Option<String>,
    pub has_body: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordShape {
    /// Export macro between keyword and name, e.g. `MYGAME_API`.
    pub api: Option<String>,
    pub bases: Vec<String>,
    pub has_body: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FunctionShape {
    /// Everything before the name: specifiers and return type.
    pub prefix: Option<String>,
    pub params: Vec<Param>,
    /// Everything after the parameter list: `const`, `override`, `= 0`.
    pub qualifiers: Option<String>,
    /// Constructor or destructor.
    pub special: bool,
    pub has_body: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropertyShape {
    #[serde(rename = "type")]
    pub ty: String,
    /// Array extent; `Some("")` for `[]`.
    pub array: Option<String>,
    pub default: Option<String>,
    pub is_static: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemberShape {
    pub value: Option<String>,
}

/// Kind-specific part of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Item {
    Enum(EnumShape),
    Struct(RecordShape),
    Class(RecordShape),
    Function(FunctionShape),
    Property(PropertyShape),
    Member(MemberShape),
}

impl Item {
    pub fn kind(&self) -> DeclKind {
        match self {
            Item::Enum(_) => DeclKind::Enum,
            Item::Struct(_) => DeclKind::Struct,
            Item::Class(_) => DeclKind::Class,
            Item::Function(_) => DeclKind::Function,
            Item::Property(_) => DeclKind::Property,
            Item::Member(_) => DeclKind::Member,
        }
    }

    /// Whether this is a definition rather than a forward declaration.
    pub fn has_body(&self) -> bool {
        match self {
            Item::Enum(shape) => shape.has_body,
            Item::Struct(shape) | Item::Class(shape) => shape.has_body,
            Item::Function(shape) => shape.has_body,
            Item::Property(_) | Item::Member(_) => true,
        }
    }

    /// Parameter types, used to tell overloads apart.
    pub fn param_types(&self) -> Vec<&str> {
        match self {
            Item::Function(shape) => shape.params.iter().map(|p| p.ty.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

/// A named, kind-tagged structural unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub name: String,
    /// Qualified path, ancestry joined with `::`.
    pub path: String,
    pub line: usize,
    pub visibility: Visibility,
    pub template: Option<String>,
    pub annotation: Option<Annotation>,
    /// Normalized head text, without template, annotation or body.
    pub signature: String,
    pub doc: Option<DocBlock>,
    #[serde(flatten)]
    pub item: Item,
    pub members: Vec<Declaration>,
    /// Documentation-only member spliced in from a proxy.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,
}

impl Declaration {
    pub fn kind(&self) -> DeclKind {
        self.item.kind()
    }

    /// Depth-first iterator over this declaration and all descendants.
    pub fn walk(&self) -> Vec<&Declaration> {
        let mut out = vec![self];
        for member in &self.members {
            out.extend(member.walk());
        }
        out
    }

    /// Rebuild this subtree, passing every doc block (own and parameter docs)
    /// through `f` together with the path of the declaration it documents.
    pub fn map_docs<F>(&self, f: &mut F) -> Result<Declaration>
    where
        F: FnMut(&DocBlock, &str) -> Result<DocBlock>,
    {
        let doc = match &self.doc {
            Some(doc) => Some(f(doc, &self.path)?),
            None => None,
        };
        let item = match &self.item {
            Item::Function(shape) => {
                let mut params = Vec::with_capacity(shape.params.len());
                for param in &shape.params {
                    let doc = match &param.doc {
                        Some(doc) => Some(f(doc, &self.path)?),
                        None => None,
                    };
                    params.push(Param {
                        doc,
                        ..param.clone()
                    });
                }
                Item::Function(FunctionShape {
                    params,
                    ..shape.clone()
                })
            }
            other => other.clone(),
        };
        let members = self
            .members
            .iter()
            .map(|m| m.map_docs(f))
            .collect::<Result<Vec<_>>>()?;
        Ok(Declaration {
            doc,
            item,
            members,
            ..self.clone_shallow()
        })
    }

    fn clone_shallow(&self) -> Declaration {
        Declaration {
            name: self.name.clone(),
            path: self.path.clone(),
            line: self.line,
            visibility: self.visibility,
            template: self.template.clone(),
            annotation: self.annotation.clone(),
            signature: self.signature.clone(),
            doc: None,
            item: self.item.clone(),
            members: Vec::new(),
            synthetic: self.synthetic,
        }
    }

    /// Pruned copy according to the export policy, or `None` when dropped.
    fn exported(&self, settings: &Settings, inside_enum: bool) -> Option<Declaration> {
        let documented = settings.show_all || self.doc.is_some();
        let members: Vec<Declaration> = self
            .members
            .iter()
            .filter_map(|m| m.exported(settings, self.kind() == DeclKind::Enum))
            .collect();
        let keep = match self.kind() {
            DeclKind::Member => inside_enum,
            DeclKind::Enum => documented && self.visibility.can_export(settings),
            DeclKind::Struct | DeclKind::Class => {
                (documented || !members.is_empty()) && self.visibility.can_export(settings)
            }
            DeclKind::Function | DeclKind::Property => {
                documented && self.visibility.can_export(settings)
            }
        };
        if !keep {
            return None;
        }
        let mut members = members;
        if settings.sort_by_name {
            members.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Some(Declaration {
            doc: self.doc.clone(),
            members,
            ..self.clone_shallow()
        })
    }
}

/// Records a `[inject: name]` marker found inside a struct or class body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectSite {
    pub proxy: String,
    /// Path of the enclosing declaration.
    pub owner: String,
    pub line: usize,
}

/// Complete documentation model of a single source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    pub file: String,
    pub declarations: Vec<Declaration>,
    /// Snippet name → captured text, for renderers.
    pub snippets: BTreeMap<String, String>,
}

impl Document {
    /// Every declaration in depth-first order.
    pub fn walk(&self) -> Vec<&Declaration> {
        self.declarations.iter().flat_map(|d| d.walk()).collect()
    }

    /// First declaration with the given qualified path.
    pub fn find(&self, path: &str) -> Option<&Declaration> {
        self.walk().into_iter().find(|d| d.path == path)
    }

    /// Copy pruned by the export policy in `settings`.
    pub fn exported(&self, settings: &Settings) -> Document {
        let mut declarations: Vec<Declaration> = self
            .declarations
            .iter()
            .filter_map(|d| d.exported(settings, false))
            .collect();
        if settings.sort_by_name {
            declarations.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Document {
            file: self.file.clone(),
            declarations,
            snippets: self.snippets.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(name: &str, item: Item, doc: bool, members: Vec<Declaration>) -> Declaration {
        Declaration {
            name: name.to_string(),
            path: name.to_string(),
            line: 1,
            visibility: Visibility::Public,
            template: None,
            annotation: None,
            signature: name.to_string(),
            doc: doc.then(|| DocBlock::parse(&[(1, "Docs.".to_string())])),
            item,
            members,
            synthetic: false,
        }
    }

    #[test]
    fn join_path_skips_empty_parent() {
        assert_eq!(join_path("", "Foo"), "Foo");
        assert_eq!(join_path("Foo", "Bar"), "Foo::Bar");
    }

    #[test]
    fn metadata_to_args_round_trips_groups() {
        let meta = Metadata {
            entries: vec![
                ("BlueprintType".to_string(), MetaValue::Flag),
                (
                    "Meta".to_string(),
                    MetaValue::Group(Metadata {
                        entries: vec![("Foo".to_string(), MetaValue::Text("Bar".to_string()))],
                    }),
                ),
                ("Category".to_string(), MetaValue::Text("A|B".to_string())),
            ],
        };
        assert_eq!(
            meta.to_args(),
            "BlueprintType, Meta = (Foo = Bar), Category = \"A|B\""
        );
    }

    #[test]
    fn metadata_serializes_as_map() {
        let meta = Metadata {
            entries: vec![
                ("BlueprintType".to_string(), MetaValue::Flag),
                ("Category".to_string(), MetaValue::Text("X".to_string())),
            ],
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(json, r#"{"BlueprintType":true,"Category":"X"}"#);
    }

    #[test]
    fn export_drops_undocumented_members_but_keeps_owner() {
        let private_fn = Declaration {
            visibility: Visibility::Private,
            ..decl("Hidden", Item::Function(FunctionShape::default()), true, vec![])
        };
        let public_fn = decl("Shown", Item::Function(FunctionShape::default()), true, vec![]);
        let bare = decl("Bare", Item::Property(PropertyShape::default()), false, vec![]);
        let record = decl(
            "Who",
            Item::Struct(RecordShape::default()),
            false,
            vec![private_fn, public_fn, bare],
        );
        let doc = Document {
            file: "t.h".to_string(),
            declarations: vec![record],
            snippets: BTreeMap::new(),
        };

        let exported = doc.exported(&Settings::default());
        let names: Vec<&str> = exported.walk().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Who", "Shown"]);

        let all = doc.exported(&Settings {
            show_all: true,
            document_private: true,
            ..Settings::default()
        });
        assert_eq!(all.walk().len(), 4);
    }

    #[test]
    fn declaration_serializes_kind_tag() {
        let d = decl("E", Item::Enum(EnumShape::default()), false, vec![]);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["kind"], "enum");
        assert_eq!(json["name"], "E");
        assert!(json.get("synthetic").is_none());
    }
}
