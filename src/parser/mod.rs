//! Declaration parser.
//!
//! Walks the piece stream one scope at a time. Doc blocks, reflection
//! annotations and `template <...>` heads are held as pending state until the
//! next statement; if that statement declares something they attach to it.
//! Struct, class and enum bodies recurse; function bodies are skipped.

mod head;
mod lexer;
mod merge;
mod metadata;

pub use head::join_tokens;
pub use lexer::{tokenize, Piece, Tok, Token};

use crate::classify::TaggedLine;
use crate::comment::CommentBlock;
use crate::docblock::DocBlock;
use crate::error::{DocError, ErrorKind, Result};
use crate::model::{
    join_path, Annotation, DeclKind, Declaration, InjectSite, Item, MemberShape, Visibility,
};
use head::{BraceRole, Head, Statement};

/// Reflection macros and the declaration kind each one must precede.
const REFLECTION_MACROS: &[(&str, DeclKind)] = &[
    ("UENUM", DeclKind::Enum),
    ("USTRUCT", DeclKind::Struct),
    ("UCLASS", DeclKind::Class),
    ("UINTERFACE", DeclKind::Class),
    ("UFUNCTION", DeclKind::Function),
    ("UPROPERTY", DeclKind::Property),
];

/// Statements that never declare anything worth documenting.
const SKIPPED_STATEMENTS: &[&str] = &["using", "typedef", "friend", "static_assert"];

/// Output of the parse phase.
#[derive(Debug, Clone, Default)]
pub struct Parsed {
    pub declarations: Vec<Declaration>,
    pub injects: Vec<InjectSite>,
}

#[derive(Debug, Clone)]
struct Scope {
    /// Path prefix for declarations in this scope.
    path: String,
    /// Name of the enclosing struct or class.
    record: Option<String>,
    visibility: Visibility,
}

impl Scope {
    fn file() -> Self {
        Scope {
            path: String::new(),
            record: None,
            visibility: Visibility::Public,
        }
    }

    fn record(path: &str, name: &str, visibility: Visibility) -> Self {
        Scope {
            path: path.to_string(),
            record: Some(name.to_string()),
            visibility,
        }
    }
}

#[derive(Debug, Default)]
struct Pending {
    doc: Option<DocBlock>,
    annotation: Option<Annotation>,
    template: Option<String>,
}

/// Parse the declarations of one file.
pub fn parse(file: &str, lines: &[TaggedLine], blocks: &[CommentBlock]) -> Result<Parsed> {
    let mut parser = Parser::new(file, lexer::pieces(lines, blocks));
    let declarations = parser.scope(&Scope::file(), false)?;
    Ok(Parsed {
        declarations,
        injects: parser.injects,
    })
}

/// Parse code lifted out of a proxy as if it appeared inside the record at
/// path `owner`.
pub fn parse_fragment(
    file: &str,
    text: &str,
    first_line: usize,
    owner: &str,
) -> Result<Vec<Declaration>> {
    let pieces = tokenize(text, first_line).into_iter().map(Piece::Token).collect();
    let record = owner.rsplit("::").next().unwrap_or(owner);
    let mut parser = Parser::new(file, pieces);
    parser.scope(&Scope::record(owner, record, Visibility::Public), false)
}

fn annotated_kind(name: &str) -> Option<DeclKind> {
    REFLECTION_MACROS
        .iter()
        .find(|(m, _)| *m == name)
        .map(|(_, kind)| *kind)
}

fn is_macro_name(text: &str) -> bool {
    text.len() > 1
        && text
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        && text.chars().any(|c| c.is_ascii_uppercase())
}

struct Parser<'a> {
    file: &'a str,
    pieces: Vec<Piece>,
    pos: usize,
    injects: Vec<InjectSite>,
}

impl<'a> Parser<'a> {
    fn new(file: &'a str, pieces: Vec<Piece>) -> Self {
        Parser {
            file,
            pieces,
            pos: 0,
            injects: Vec::new(),
        }
    }

    fn error(&self, line: usize, kind: ErrorKind) -> DocError {
        DocError::new(self.file, line, kind)
    }

    fn token(&self, at: usize) -> Option<&Token> {
        self.pieces.get(at).and_then(Piece::token)
    }

    fn next_is(&self, offset: usize, tok: Tok) -> bool {
        self.token(self.pos + offset).is_some_and(|t| t.is(tok))
    }

    // -- Scopes ---------------------------------------------------------------

    fn scope(&mut self, scope: &Scope, terminated: bool) -> Result<Vec<Declaration>> {
        let mut decls = Vec::new();
        let mut visibility = scope.visibility;
        let mut pending = Pending::default();

        loop {
            let Some(piece) = self.pieces.get(self.pos) else {
                if terminated {
                    log::warn!(
                        "{}: body of `{}` is not closed at end of input",
                        self.file,
                        scope.path
                    );
                }
                break;
            };
            let token = match piece {
                Piece::Doc(doc) => {
                    if let Some(old) = pending.doc.replace(doc.clone()) {
                        log::debug!(
                            "{}:{}: discarding doc block, another block follows",
                            self.file,
                            old.line
                        );
                    }
                    self.pos += 1;
                    continue;
                }
                Piece::Inject { proxy, line } => {
                    let (proxy, line) = (proxy.clone(), *line);
                    if scope.record.is_none() {
                        return Err(self.error(line, ErrorKind::MisplacedInject { proxy }));
                    }
                    self.injects.push(InjectSite {
                        proxy,
                        owner: scope.path.clone(),
                        line,
                    });
                    self.pos += 1;
                    continue;
                }
                Piece::Token(token) => token.clone(),
            };

            match token.tok {
                Tok::RBrace => {
                    self.pos += 1;
                    if terminated {
                        break;
                    }
                    log::warn!("{}:{}: stray `}}`", self.file, token.line);
                }
                Tok::Semi => self.pos += 1,
                Tok::Ident => {
                    self.ident(&token, scope, &mut visibility, &mut pending, &mut decls)?
                }
                _ => self.declaration(scope, visibility, &mut pending, &mut decls)?,
            }
        }

        if let Some(annotation) = pending.annotation {
            let found = if terminated { "end of body" } else { "end of input" };
            return Err(self.error(
                annotation.line,
                ErrorKind::OrphanedAnnotation {
                    annotation: annotation.macro_name,
                    found: found.to_string(),
                },
            ));
        }
        if let Some(doc) = pending.doc {
            log::debug!(
                "{}:{}: discarding doc block, no declaration follows",
                self.file,
                doc.line
            );
        }
        Ok(decls)
    }

    fn ident(
        &mut self,
        token: &Token,
        scope: &Scope,
        visibility: &mut Visibility,
        pending: &mut Pending,
        decls: &mut Vec<Declaration>,
    ) -> Result<()> {
        let text = token.text.as_str();

        if let Some(label) = Visibility::from_label(text) {
            if self.next_is(1, Tok::Colon) {
                *visibility = label;
                self.pos += 2;
                return Ok(());
            }
        }
        if text == "template" && self.next_is(1, Tok::Lt) {
            pending.template = Some(self.template_head());
            return Ok(());
        }
        if text == "inline" && self.token(self.pos + 1).is_some_and(|t| t.is_ident("namespace")) {
            self.pos += 1;
            return Ok(());
        }
        if text == "namespace" {
            if let Some(doc) = pending.doc.take() {
                log::debug!("{}:{}: discarding doc block on namespace", self.file, doc.line);
            }
            for decl in self.namespace(scope)? {
                merge::merge_into(decls, decl);
            }
            return Ok(());
        }
        if text == "extern" && self.next_is(1, Tok::Str) && self.next_is(2, Tok::LBrace) {
            self.pos += 3;
            for decl in self.scope(scope, true)? {
                merge::merge_into(decls, decl);
            }
            return Ok(());
        }
        if annotated_kind(text).is_some() {
            if let Some(previous) = &pending.annotation {
                return Err(self.error(
                    previous.line,
                    ErrorKind::OrphanedAnnotation {
                        annotation: previous.macro_name.clone(),
                        found: format!("annotation `{}`", text),
                    },
                ));
            }
            pending.annotation = Some(self.annotation(token)?);
            return Ok(());
        }
        if SKIPPED_STATEMENTS.contains(&text) {
            let stmt = self.statement()?;
            log::trace!("{}:{}: skipping `{}`", self.file, stmt.line, join_tokens(&stmt.tokens));
            if stmt.body {
                self.skip_body()?;
            }
            return Ok(());
        }
        if let Some(end) = self.macro_call_end() {
            log::trace!("{}:{}: skipping macro invocation `{}`", self.file, token.line, text);
            self.pos = end;
            return Ok(());
        }
        self.declaration(scope, *visibility, pending, decls)
    }

    fn namespace(&mut self, scope: &Scope) -> Result<Vec<Declaration>> {
        self.pos += 1;
        let mut name = String::new();
        while let Some(token) = self.pieces.get(self.pos).and_then(Piece::token) {
            let (tok, text) = (token.tok, token.text.clone());
            match tok {
                Tok::LBrace => {
                    self.pos += 1;
                    let inner = Scope {
                        path: if name.is_empty() {
                            scope.path.clone()
                        } else {
                            join_path(&scope.path, &name)
                        },
                        record: None,
                        visibility: Visibility::Public,
                    };
                    return self.scope(&inner, true);
                }
                Tok::Ident if text == "inline" => {}
                Tok::Ident => name.push_str(&text),
                Tok::Scope => name.push_str("::"),
                _ => {
                    // Alias: `namespace Short = Some::Long;`
                    let stmt = self.statement()?;
                    log::trace!("{}:{}: skipping namespace alias", self.file, stmt.line);
                    return Ok(Vec::new());
                }
            }
            self.pos += 1;
        }
        Ok(Vec::new())
    }

    // -- Statements -----------------------------------------------------------

    fn declaration(
        &mut self,
        scope: &Scope,
        visibility: Visibility,
        pending: &mut Pending,
        decls: &mut Vec<Declaration>,
    ) -> Result<()> {
        let stmt = self.statement()?;
        if stmt.tokens.is_empty() {
            return Ok(());
        }

        let heads = match head::classify(&stmt, scope.record.as_deref()) {
            Head::Decls(heads) => heads,
            Head::Skip(reason) => {
                let text = join_tokens(&stmt.tokens);
                if let Some(annotation) = pending.annotation.take() {
                    return Err(self.error(
                        annotation.line,
                        ErrorKind::OrphanedAnnotation {
                            annotation: annotation.macro_name,
                            found: format!("`{}`", text),
                        },
                    ));
                }
                log::trace!("{}:{}: skipping {} `{}`", self.file, stmt.line, reason, text);
                if stmt.body {
                    self.skip_body()?;
                }
                pending.template = None;
                if let Some(doc) = pending.doc.take() {
                    log::debug!(
                        "{}:{}: discarding doc block, no declaration follows",
                        self.file,
                        doc.line
                    );
                }
                return Ok(());
            }
        };

        for (index, head) in heads.into_iter().enumerate() {
            let path = join_path(&scope.path, &head.name);
            let kind = head.item.kind();
            let (annotation, doc, template) = if index == 0 {
                (
                    pending.annotation.take(),
                    pending.doc.take(),
                    pending.template.take(),
                )
            } else {
                (None, None, None)
            };

            if let Some(annotation) = &annotation {
                if annotated_kind(&annotation.macro_name) != Some(kind) {
                    return Err(self.error(
                        annotation.line,
                        ErrorKind::OrphanedAnnotation {
                            annotation: annotation.macro_name.clone(),
                            found: format!("{} `{}`", kind, head.name),
                        },
                    ));
                }
            }

            let members = if stmt.body && index == 0 {
                match &head.item {
                    Item::Struct(_) => {
                        self.scope(&Scope::record(&path, &head.name, Visibility::Public), true)?
                    }
                    Item::Class(_) => {
                        self.scope(&Scope::record(&path, &head.name, Visibility::Private), true)?
                    }
                    Item::Enum(_) => self.enum_body(&path)?,
                    _ => {
                        self.skip_body()?;
                        Vec::new()
                    }
                }
            } else {
                Vec::new()
            };

            if head.name.is_empty() {
                log::debug!("{}:{}: anonymous {} is not documented", self.file, stmt.line, kind);
                continue;
            }
            merge::merge_into(
                decls,
                Declaration {
                    name: head.name,
                    path,
                    line: stmt.line,
                    visibility,
                    template,
                    annotation,
                    signature: head.signature,
                    doc,
                    item: head.item,
                    members,
                    synthetic: false,
                },
            );
        }
        Ok(())
    }

    /// Collect one statement up to `;`, a body `{`, or the enclosing `}`.
    fn statement(&mut self) -> Result<Statement> {
        let mut stmt = Statement {
            line: self.pieces.get(self.pos).map_or(0, Piece::line),
            ..Statement::default()
        };
        let mut depth = 0usize;

        while let Some(piece) = self.pieces.get(self.pos) {
            let token = match piece {
                Piece::Doc(doc) => {
                    if depth > 0 {
                        stmt.param_docs.push((stmt.tokens.len(), doc.clone()));
                    } else {
                        log::debug!(
                            "{}:{}: discarding doc block inside a statement",
                            self.file,
                            doc.line
                        );
                    }
                    self.pos += 1;
                    continue;
                }
                Piece::Inject { proxy, line } => {
                    return Err(self.error(
                        *line,
                        ErrorKind::MisplacedInject {
                            proxy: proxy.clone(),
                        },
                    ));
                }
                Piece::Token(token) => token.clone(),
            };

            match token.tok {
                Tok::Semi if depth == 0 => {
                    self.pos += 1;
                    return Ok(stmt);
                }
                Tok::RBrace if depth == 0 => return Ok(stmt),
                Tok::LBrace if depth == 0 => {
                    if head::brace_role(&stmt.tokens) == BraceRole::Body {
                        self.pos += 1;
                        stmt.body = true;
                        return Ok(stmt);
                    }
                    let group = self.braced()?;
                    stmt.tokens.extend(group);
                    continue;
                }
                Tok::LParen | Tok::LBracket => depth += 1,
                Tok::RParen | Tok::RBracket => depth = depth.saturating_sub(1),
                _ => {}
            }
            stmt.tokens.push(token);
            self.pos += 1;
        }
        Ok(stmt)
    }

    /// Consume a balanced `{ ... }` initializer and return its tokens.
    fn braced(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        let mut depth = 0usize;
        while let Some(piece) = self.pieces.get(self.pos) {
            self.pos += 1;
            match piece {
                Piece::Token(token) => {
                    match token.tok {
                        Tok::LBrace => depth += 1,
                        Tok::RBrace => depth = depth.saturating_sub(1),
                        _ => {}
                    }
                    tokens.push(token.clone());
                    if depth == 0 {
                        return Ok(tokens);
                    }
                }
                Piece::Inject { proxy, line } => {
                    return Err(self.error(
                        *line,
                        ErrorKind::MisplacedInject {
                            proxy: proxy.clone(),
                        },
                    ));
                }
                Piece::Doc(_) => {}
            }
        }
        log::warn!("{}: initializer is not closed at end of input", self.file);
        Ok(tokens)
    }

    /// Skip a function body whose `{` has been consumed.
    fn skip_body(&mut self) -> Result<()> {
        let mut depth = 1usize;
        while let Some(piece) = self.pieces.get(self.pos) {
            self.pos += 1;
            match piece {
                Piece::Token(token) if token.is(Tok::LBrace) => depth += 1,
                Piece::Token(token) if token.is(Tok::RBrace) => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Piece::Inject { proxy, line } => {
                    return Err(self.error(
                        *line,
                        ErrorKind::MisplacedInject {
                            proxy: proxy.clone(),
                        },
                    ));
                }
                _ => {}
            }
        }
        log::warn!("{}: body is not closed at end of input", self.file);
        Ok(())
    }

    fn template_head(&mut self) -> String {
        let mut tokens = Vec::new();
        let mut angle = 0usize;
        while let Some(piece) = self.pieces.get(self.pos) {
            self.pos += 1;
            let Piece::Token(token) = piece else {
                continue;
            };
            tokens.push(token.clone());
            match token.tok {
                Tok::Lt => angle += 1,
                Tok::Gt => {
                    angle = angle.saturating_sub(1);
                    if angle == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
        join_tokens(&tokens)
    }

    /// Position just past a bare macro invocation such as `GENERATED_BODY()`
    /// that ends its line, or `None` if the current token is not one.
    fn macro_call_end(&self) -> Option<usize> {
        let token = self.token(self.pos)?;
        if !is_macro_name(&token.text) {
            return None;
        }
        let mut end = self.pos + 1;
        let mut line = token.line;
        if self.token(end).is_some_and(|t| t.is(Tok::LParen)) {
            let mut depth = 0usize;
            loop {
                let t = self.token(end)?;
                match t.tok {
                    Tok::LParen => depth += 1,
                    Tok::RParen => depth -= 1,
                    Tok::Semi | Tok::LBrace | Tok::RBrace => return None,
                    _ => {}
                }
                line = t.line;
                end += 1;
                if depth == 0 {
                    break;
                }
            }
        }
        match self.pieces.get(end) {
            Some(piece) if piece.line() <= line => None,
            _ => Some(end),
        }
    }

    // -- Annotations ----------------------------------------------------------

    fn annotation(&mut self, token: &Token) -> Result<Annotation> {
        let (name, line) = (token.text.clone(), token.line);
        let malformed = |reason: &str| {
            DocError::new(
                self.file,
                line,
                ErrorKind::MalformedMetadata {
                    annotation: name.clone(),
                    reason: reason.to_string(),
                },
            )
        };

        self.pos += 1;
        if !self.next_is(0, Tok::LParen) {
            return Err(malformed("expected `(`"));
        }
        self.pos += 1;

        let mut inner = Vec::new();
        let mut depth = 1usize;
        loop {
            let Some(piece) = self.pieces.get(self.pos) else {
                return Err(malformed("unbalanced parentheses"));
            };
            self.pos += 1;
            let Piece::Token(token) = piece else {
                continue;
            };
            match token.tok {
                Tok::LParen => depth += 1,
                Tok::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                Tok::Semi | Tok::LBrace | Tok::RBrace => {
                    return Err(malformed("unbalanced parentheses"))
                }
                _ => {}
            }
            inner.push(token.clone());
        }

        let metadata = metadata::parse(&inner).map_err(|reason| malformed(&reason))?;
        Ok(Annotation {
            macro_name: name.clone(),
            metadata,
            line,
        })
    }

    // -- Enums ----------------------------------------------------------------

    fn enum_body(&mut self, path: &str) -> Result<Vec<Declaration>> {
        let mut members = Vec::new();
        let mut doc: Option<DocBlock> = None;

        loop {
            let Some(piece) = self.pieces.get(self.pos) else {
                log::warn!("{}: body of `{}` is not closed at end of input", self.file, path);
                break;
            };
            let token = match piece {
                Piece::Doc(block) => {
                    doc = Some(block.clone());
                    self.pos += 1;
                    continue;
                }
                Piece::Inject { proxy, line } => {
                    return Err(self.error(
                        *line,
                        ErrorKind::MisplacedInject {
                            proxy: proxy.clone(),
                        },
                    ));
                }
                Piece::Token(token) => token,
            };
            match token.tok {
                Tok::RBrace => {
                    self.pos += 1;
                    break;
                }
                Tok::Comma => {
                    self.pos += 1;
                    continue;
                }
                _ => {}
            }

            let tokens = self.variant_tokens();
            if let Some(member) = self.variant(path, &tokens, doc.take())? {
                merge::merge_into(&mut members, member);
            }
        }
        Ok(members)
    }

    fn variant_tokens(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut depth = 0usize;
        while let Some(piece) = self.pieces.get(self.pos) {
            let Piece::Token(token) = piece else {
                self.pos += 1;
                continue;
            };
            match token.tok {
                Tok::Comma if depth == 0 => {
                    self.pos += 1;
                    break;
                }
                Tok::RBrace if depth == 0 => break,
                Tok::LParen | Tok::LBrace | Tok::LBracket => depth += 1,
                Tok::RParen | Tok::RBrace | Tok::RBracket => depth = depth.saturating_sub(1),
                _ => {}
            }
            tokens.push(token.clone());
            self.pos += 1;
        }
        tokens
    }

    fn variant(
        &self,
        path: &str,
        tokens: &[Token],
        doc: Option<DocBlock>,
    ) -> Result<Option<Declaration>> {
        let Some(name) = tokens.first().filter(|t| t.is(Tok::Ident)) else {
            log::trace!("{}: skipping enum entry `{}`", self.file, join_tokens(tokens));
            return Ok(None);
        };

        let (head_end, annotation) = match tokens.iter().position(|t| t.is_ident("UMETA")) {
            Some(at) => {
                let line = tokens[at].line;
                let malformed = |reason: String| {
                    self.error(
                        line,
                        ErrorKind::MalformedMetadata {
                            annotation: "UMETA".to_string(),
                            reason,
                        },
                    )
                };
                let args = &tokens[at + 1..];
                if !args.first().is_some_and(|t| t.is(Tok::LParen))
                    || !args.last().is_some_and(|t| t.is(Tok::RParen))
                {
                    return Err(malformed("expected `(...)`".to_string()));
                }
                let metadata = metadata::parse(&args[1..args.len() - 1]).map_err(malformed)?;
                (
                    at,
                    Some(Annotation {
                        macro_name: "UMETA".to_string(),
                        metadata,
                        line,
                    }),
                )
            }
            None => (tokens.len(), None),
        };

        let head = &tokens[..head_end];
        let value = head
            .iter()
            .position(|t| t.is(Tok::Eq))
            .map(|eq| join_tokens(&head[eq + 1..]));
        Ok(Some(Declaration {
            name: name.text.clone(),
            path: join_path(path, &name.text),
            line: name.line,
            visibility: Visibility::Public,
            template: None,
            annotation,
            signature: join_tokens(head),
            doc,
            item: Item::Member(MemberShape { value }),
            members: Vec::new(),
            synthetic: false,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::comment::aggregate;
    use crate::model::{FunctionShape, MetaValue};

    fn parse_src(src: &str) -> Result<Parsed> {
        let lines = classify("t.h", src)?;
        let blocks = aggregate(&lines);
        parse("t.h", &lines, &blocks)
    }

    fn paths(parsed: &Parsed) -> Vec<String> {
        fn walk(decls: &[Declaration], out: &mut Vec<String>) {
            for d in decls {
                out.push(format!("{} {}", d.kind(), d.path));
                walk(&d.members, out);
            }
        }
        let mut out = Vec::new();
        walk(&parsed.declarations, &mut out);
        out
    }

    #[test]
    fn parse_struct_members_with_visibility() {
        let parsed = parse_src(
            "struct S\n{\n\tint A;\nprotected:\n\tvoid F();\nprivate:\n\tstatic float B = 1.f;\n};\n",
        )
        .unwrap();
        assert_eq!(paths(&parsed), vec!["struct S", "property S::A", "function S::F", "property S::B"]);
        let members = &parsed.declarations[0].members;
        let vis: Vec<Visibility> = members.iter().map(|m| m.visibility).collect();
        assert_eq!(vis, vec![Visibility::Public, Visibility::Protected, Visibility::Private]);
    }

    #[test]
    fn class_members_default_to_private() {
        let parsed = parse_src("class C\n{\n\tvoid F();\n};\n").unwrap();
        assert_eq!(parsed.declarations[0].members[0].visibility, Visibility::Private);
    }

    #[test]
    fn parse_annotation_and_doc_attach() {
        let parsed = parse_src(
            "/// Enum docs.\nUENUM(BlueprintType, Meta = (Foo = Bar))\nenum class E : uint8\n{\n\t/// First.\n\tA UMETA(DisplayName = \"Alpha\"),\n\tB = 3\n};\n",
        )
        .unwrap();
        let e = &parsed.declarations[0];
        assert_eq!(e.doc.as_ref().unwrap().markdown(), "Enum docs.");
        let annotation = e.annotation.as_ref().unwrap();
        assert_eq!(annotation.macro_name, "UENUM");
        assert_eq!(annotation.line, 2);
        assert!(matches!(annotation.metadata.get("Meta"), Some(MetaValue::Group(_))));
        assert_eq!(e.members.len(), 2);
        assert_eq!(e.members[0].doc.as_ref().unwrap().markdown(), "First.");
        assert_eq!(
            e.members[0].annotation.as_ref().unwrap().metadata.get("DisplayName"),
            Some(&MetaValue::Text("Alpha".to_string()))
        );
        assert_eq!(e.members[1].item, Item::Member(MemberShape { value: Some("3".to_string()) }));
    }

    #[test]
    fn forward_declaration_merges_with_definition() {
        let parsed = parse_src(
            "enum class E : uint8;\nclass FOO Bar;\n/// Docs.\nenum class E : uint8\n{\n\tA\n};\n",
        )
        .unwrap();
        assert_eq!(paths(&parsed), vec!["enum E", "member E::A", "class Bar"]);
        assert!(parsed.declarations[0].doc.is_some());
        assert!(parsed.declarations[0].item.has_body());
    }

    #[test]
    fn parameter_docs_attach() {
        let parsed = parse_src(
            "void F(\n\t/// Count.\n\tint A,\n\t/// Target.\n\tAActor* B = nullptr);\n",
        )
        .unwrap();
        let Item::Function(FunctionShape { params, .. }) = &parsed.declarations[0].item else {
            panic!("expected function");
        };
        assert_eq!(params[0].doc.as_ref().unwrap().markdown(), "Count.");
        assert_eq!(params[1].doc.as_ref().unwrap().markdown(), "Target.");
    }

    #[test]
    fn namespaces_prefix_paths() {
        let parsed = parse_src("namespace Game::AI\n{\n\tstruct Brain;\n}\n").unwrap();
        assert_eq!(paths(&parsed), vec!["struct Game::AI::Brain"]);
    }

    #[test]
    fn skips_macros_bodies_and_preprocessor() {
        let parsed = parse_src(
            "#pragma once\nusing Foo = int;\nUCLASS()\nclass C\n{\n\tGENERATED_BODY()\npublic:\n\tvoid F()\n\t{\n\t\tint Local = 0;\n\t}\n\tINJECT\n};\nvoid C::F2() {}\n",
        )
        .unwrap();
        assert_eq!(paths(&parsed), vec!["class C", "function C::F"]);
    }

    #[test]
    fn injects_record_owner() {
        let parsed = parse_src("struct Who\n{\n\t//// [inject: injectable]\n\tINJECT\n};\n").unwrap();
        assert_eq!(
            parsed.injects,
            vec![InjectSite {
                proxy: "injectable".to_string(),
                owner: "Who".to_string(),
                line: 3,
            }]
        );
    }

    #[test]
    fn inject_outside_record_is_misplaced() {
        let err = parse_src("//// [inject: p]\n").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MisplacedInject { .. }));
        let err = parse_src("struct S\n{\n\tvoid F()\n\t{\n\t\t//// [inject: p]\n\t}\n};\n").unwrap_err();
        assert_eq!(err.line, 5);
    }

    #[test]
    fn annotation_without_declaration_is_orphaned() {
        let err = parse_src("UCLASS()\n").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::OrphanedAnnotation { .. }));
        assert_eq!(err.line, 1);

        let err = parse_src("UCLASS()\nstruct S {};\n").unwrap_err();
        assert!(
            matches!(err.kind, ErrorKind::OrphanedAnnotation { ref found, .. } if found == "struct `S`")
        );
    }

    #[test]
    fn unbalanced_metadata_is_malformed() {
        let err = parse_src("struct S\n{\n\tUPROPERTY(EditAnywhere, Meta = (A = B)\n\tint X;\n};\n")
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MalformedMetadata { .. }));
        assert_eq!(err.line, 3);
    }

    #[test]
    fn fragment_parses_in_record_context() {
        let decls = parse_fragment("t.h", "void Injected() const;", 10, "Who").unwrap();
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].path, "Who::Injected");
        assert_eq!(decls[0].line, 10);
        assert_eq!(decls[0].signature, "void Injected() const");
    }
}
