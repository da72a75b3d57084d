//! Declaration heads: decide what one collected statement declares.
//!
//! The parser is structural, not grammatical. A head is classified by its
//! leading keyword (`enum`, `struct`, `class`, `union`), by the presence of a
//! parameter list, or, inside a record, as a data member. Anything else is
//! reported as [`Head::Skip`].

use super::lexer::{Tok, Token};
use crate::docblock::DocBlock;
use crate::model::{EnumShape, FunctionShape, Item, Param, PropertyShape, RecordShape};

/// Tokens of one statement up to `;` or an opening body brace.
#[derive(Debug, Clone, Default)]
pub struct Statement {
    pub tokens: Vec<Token>,
    /// Doc blocks met inside parentheses, keyed by the index of the next token.
    pub param_docs: Vec<(usize, DocBlock)>,
    /// Ended with a body `{`, which has been consumed.
    pub body: bool,
    pub line: usize,
}

/// One declaration recognised in a head.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadDecl {
    pub name: String,
    pub signature: String,
    pub item: Item,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Head {
    Decls(Vec<HeadDecl>),
    Skip(&'static str),
}

/// What a `{` at statement depth 0 opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BraceRole {
    Body,
    Initializer,
}

const SPECIFIERS: &[&str] = &[
    "virtual",
    "explicit",
    "inline",
    "static",
    "constexpr",
    "consteval",
    "FORCEINLINE",
];

const BUILTIN_TYPES: &[&str] = &[
    "void", "bool", "char", "short", "int", "long", "float", "double", "signed", "unsigned",
    "auto", "const", "volatile", "int8", "int16", "int32", "int64", "uint8", "uint16", "uint32",
    "uint64",
];

// -- Token text ---------------------------------------------------------------

/// Join tokens into normalized source text.
pub fn join_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            let before = if i > 1 { Some(&tokens[i - 2]) } else { None };
            if needs_space(before, &tokens[i - 1], token) {
                out.push(' ');
            }
        }
        out.push_str(&token.text);
    }
    out
}

fn is_pointer(token: &Token) -> bool {
    token.is_op("*") || token.is_op("&") || token.is_op("&&")
}

fn is_unary(before: Option<&Token>, prev: &Token) -> bool {
    let unary_op = ["-", "+", "!", "&", "*"].iter().any(|op| prev.is_op(op)) || prev.is(Tok::Tilde);
    unary_op
        && match before {
            None => true,
            Some(b) => matches!(
                b.tok,
                Tok::Eq | Tok::LParen | Tok::Comma | Tok::LBracket | Tok::LBrace | Tok::Op
            ) || b.is_ident("return"),
        }
}

fn needs_space(before: Option<&Token>, prev: &Token, next: &Token) -> bool {
    use Tok::*;
    if matches!(next.tok, Comma | Semi | RParen | RBracket | Scope | Gt | RBrace) {
        return false;
    }
    if matches!(prev.tok, LParen | LBracket | Scope | Lt | LBrace | Tilde) {
        return false;
    }
    if prev.is_op(".") || prev.is_op("->") || next.is_op(".") || next.is_op("->") {
        return false;
    }
    if is_unary(before, prev) {
        return false;
    }
    match next.tok {
        LParen => {
            !(matches!(prev.tok, Ident | Gt | RParen | RBracket)
                || before.is_some_and(|b| b.is_ident("operator")))
        }
        LBracket => !matches!(prev.tok, Ident | RBracket),
        Lt => !(prev.is(Ident) && !prev.is_ident("template")),
        Op if is_pointer(next) => !(matches!(prev.tok, Ident | Gt | RBracket) || is_pointer(prev)),
        Op if prev.is_ident("operator") => false,
        _ => true,
    }
}

// -- Structure helpers --------------------------------------------------------

/// Split at top-level commas, ignoring commas nested in brackets or angles.
fn split_commas(tokens: &[Token]) -> Vec<(usize, &[Token])> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut angle = 0usize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token.tok {
            Tok::LParen | Tok::LBracket | Tok::LBrace => depth += 1,
            Tok::RParen | Tok::RBracket | Tok::RBrace => depth = depth.saturating_sub(1),
            Tok::Lt if opens_angle(tokens, i) => angle += 1,
            Tok::Gt if angle > 0 => angle -= 1,
            Tok::Comma if depth == 0 && angle == 0 => {
                parts.push((start, &tokens[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push((start, &tokens[start..]));
    parts
}

fn opens_angle(tokens: &[Token], i: usize) -> bool {
    i > 0 && tokens[i - 1].is(Tok::Ident) && !tokens[i - 1].is_ident("operator")
}

/// Index of the first token of `tok` at bracket and angle depth 0.
fn find_top(tokens: &[Token], tok: Tok) -> Option<usize> {
    let mut depth = 0usize;
    let mut angle = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        if token.tok == tok && depth == 0 && angle == 0 {
            return Some(i);
        }
        match token.tok {
            Tok::LParen | Tok::LBracket | Tok::LBrace => depth += 1,
            Tok::RParen | Tok::RBracket | Tok::RBrace => depth = depth.saturating_sub(1),
            Tok::Lt if opens_angle(tokens, i) => angle += 1,
            Tok::Gt if angle > 0 => angle -= 1,
            _ => {}
        }
    }
    None
}

/// Index of the bracket closing the one opened at `open`.
fn matching(tokens: &[Token], open: usize) -> Option<usize> {
    let (opener, closer) = match tokens[open].tok {
        Tok::LParen => (Tok::LParen, Tok::RParen),
        Tok::LBracket => (Tok::LBracket, Tok::RBracket),
        Tok::LBrace => (Tok::LBrace, Tok::RBrace),
        _ => return None,
    };
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        if token.tok == opener {
            depth += 1;
        } else if token.tok == closer {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Index of the `(` opening a function parameter list.
fn find_call(tokens: &[Token]) -> Option<usize> {
    let mut angle = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        let after_operator = i > 0 && tokens[i - 1].is_ident("operator");
        match token.tok {
            Tok::Lt if opens_angle(tokens, i) => angle += 1,
            Tok::Gt if angle > 0 => angle -= 1,
            Tok::Eq if angle == 0 && !after_operator => return None,
            Tok::LBrace if angle == 0 => return None,
            Tok::LParen if angle == 0 => {
                // `operator()(...)`
                if after_operator
                    && tokens.get(i + 1).is_some_and(|t| t.is(Tok::RParen))
                    && tokens.get(i + 2).is_some_and(|t| t.is(Tok::LParen))
                {
                    return Some(i + 2);
                }
                return Some(i);
            }
            _ => {}
        }
    }
    None
}

const SCOPE_KEYWORDS: &[&str] = &["enum", "struct", "class", "union", "namespace"];

/// Decide whether a `{` following `tokens` opens a body or an initializer.
pub fn brace_role(tokens: &[Token]) -> BraceRole {
    let Some(first) = tokens.first() else {
        return BraceRole::Initializer;
    };
    if let Some(open) = find_call(tokens) {
        let Some(close) = matching(tokens, open) else {
            return BraceRole::Body;
        };
        // Constructor initializer list: `Foo() : A(0), B{1} {`
        let init_list = tokens[close + 1..].iter().any(|t| t.is(Tok::Colon));
        let last = tokens.last().map(|t| t.tok);
        if init_list && matches!(last, Some(Tok::Ident) | Some(Tok::Gt)) {
            return BraceRole::Initializer;
        }
        return BraceRole::Body;
    }
    if find_top(tokens, Tok::Eq).is_some() {
        return BraceRole::Initializer;
    }
    if SCOPE_KEYWORDS.iter().any(|k| first.is_ident(k)) {
        return BraceRole::Body;
    }
    if first.is_ident("extern") {
        return BraceRole::Body;
    }
    BraceRole::Initializer
}

// -- Classification -----------------------------------------------------------

/// Classify a statement; `record` is the name of the enclosing struct or
/// class, if any.
pub fn classify(stmt: &Statement, record: Option<&str>) -> Head {
    let tokens = stmt.tokens.as_slice();
    let Some(first) = tokens.first() else {
        return Head::Skip("empty statement");
    };

    if first.is_ident("enum") {
        return enum_head(tokens, stmt.body);
    }
    if ["struct", "class", "union"].iter().any(|k| first.is_ident(k)) && is_record_head(tokens) {
        return record_head(tokens, stmt.body);
    }
    if find_call(tokens).is_some() {
        return function_head(stmt, record);
    }
    if record.is_some() && !stmt.body {
        return property_heads(tokens);
    }
    Head::Skip("statement")
}

fn is_record_head(tokens: &[Token]) -> bool {
    !tokens
        .iter()
        .any(|t| matches!(t.tok, Tok::LParen | Tok::Eq | Tok::LBrace) || is_pointer(t))
}

fn enum_head(tokens: &[Token], body: bool) -> Head {
    let scoped = tokens
        .get(1)
        .is_some_and(|t| t.is_ident("class") || t.is_ident("struct"));
    let start = if scoped { 2 } else { 1 };
    let colon = find_top(tokens, Tok::Colon).unwrap_or(tokens.len());
    let name = tokens[start.min(colon)..colon]
        .iter()
        .rev()
        .find(|t| t.is(Tok::Ident))
        .map(|t| t.text.clone())
        .unwrap_or_default();
    let underlying = (colon < tokens.len()).then(|| join_tokens(&tokens[colon + 1..]));
    Head::Decls(vec![HeadDecl {
        name,
        signature: join_tokens(tokens),
        item: Item::Enum(EnumShape {
            scoped,
            underlying,
            has_body: body,
        }),
    }])
}

fn record_head(tokens: &[Token], body: bool) -> Head {
    let colon = find_top(tokens, Tok::Colon).unwrap_or(tokens.len());
    let mut idents: Vec<&Token> = Vec::new();
    let mut angle = 0usize;
    for (i, token) in tokens[..colon].iter().enumerate().skip(1) {
        match token.tok {
            Tok::Lt if opens_angle(tokens, i) => angle += 1,
            Tok::Gt if angle > 0 => angle -= 1,
            Tok::Ident if angle == 0 && !token.is_ident("final") => idents.push(token),
            _ => {}
        }
    }
    let Some((name, api)) = idents.split_last() else {
        return Head::Skip("anonymous record");
    };
    let bases = if colon < tokens.len() {
        split_commas(&tokens[colon + 1..])
            .into_iter()
            .map(|(_, part)| join_tokens(part))
            .filter(|b| !b.is_empty())
            .collect()
    } else {
        Vec::new()
    };
    let shape = RecordShape {
        api: (!api.is_empty()).then(|| {
            api.iter()
                .map(|t| t.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        }),
        bases,
        has_body: body,
    };
    let item = if tokens[0].is_ident("class") {
        Item::Class(shape)
    } else {
        Item::Struct(shape)
    };
    Head::Decls(vec![HeadDecl {
        name: name.text.clone(),
        signature: join_tokens(tokens),
        item,
    }])
}

fn function_head(stmt: &Statement, record: Option<&str>) -> Head {
    let tokens = stmt.tokens.as_slice();
    let Some(open) = find_call(tokens) else {
        return Head::Skip("statement");
    };
    let Some(close) = matching(tokens, open) else {
        return Head::Skip("unbalanced parameter list");
    };

    let (name, name_start) = match tokens[..open]
        .iter()
        .rposition(|t| t.is_ident("operator"))
    {
        Some(op) => (
            tokens[op..open].iter().map(|t| t.text.as_str()).collect::<String>(),
            op,
        ),
        None => {
            let Some(ident) = open.checked_sub(1).map(|i| &tokens[i]).filter(|t| t.is(Tok::Ident))
            else {
                return Head::Skip("call expression");
            };
            if open >= 2 && tokens[open - 2].is(Tok::Tilde) {
                (format!("~{}", ident.text), open - 2)
            } else {
                (ident.text.clone(), open - 1)
            }
        }
    };
    if name_start > 0 && tokens[name_start - 1].is(Tok::Scope) {
        return Head::Skip("out-of-line definition");
    }

    let prefix = &tokens[..name_start];
    let only_specifiers = prefix
        .iter()
        .all(|t| SPECIFIERS.iter().any(|s| t.is_ident(s)));
    let special = only_specifiers
        && record.is_some_and(|r| name.strip_prefix('~').unwrap_or(&name) == r);
    if only_specifiers && !special {
        return Head::Skip("macro invocation");
    }

    let qualifier_end = tokens[close + 1..]
        .iter()
        .position(|t| t.is(Tok::Colon))
        .map_or(tokens.len(), |i| close + 1 + i);
    let qualifiers = join_tokens(&tokens[close + 1..qualifier_end]);

    Head::Decls(vec![HeadDecl {
        name,
        signature: join_tokens(&tokens[..qualifier_end]),
        item: Item::Function(FunctionShape {
            prefix: (!prefix.is_empty()).then(|| join_tokens(prefix)),
            params: params(tokens, open, close, &stmt.param_docs),
            qualifiers: (!qualifiers.is_empty()).then_some(qualifiers),
            special,
            has_body: stmt.body,
        }),
    }])
}

fn params(tokens: &[Token], open: usize, close: usize, docs: &[(usize, DocBlock)]) -> Vec<Param> {
    let inner = &tokens[open + 1..close];
    let parts = split_commas(inner);
    if parts.len() == 1 && (parts[0].1.is_empty() || (parts[0].1.len() == 1 && parts[0].1[0].is_ident("void"))) {
        return Vec::new();
    }

    let mut result = Vec::new();
    for (index, (offset, part)) in parts.iter().enumerate() {
        let start = open + 1 + offset;
        let end = parts
            .get(index + 1)
            .map_or(close, |(next, _)| open + 1 + next);
        let doc = docs
            .iter()
            .filter(|(at, _)| *at >= start && *at < end)
            .map(|(_, doc)| doc.clone())
            .last();
        result.push(param(part, doc));
    }
    result
}

fn param(tokens: &[Token], doc: Option<DocBlock>) -> Param {
    let (decl, default) = match find_top(tokens, Tok::Eq) {
        Some(eq) => (&tokens[..eq], Some(join_tokens(&tokens[eq + 1..]))),
        None => (tokens, None),
    };
    let name_at = declarator_name(decl).filter(|&i| {
        i > 0 && !BUILTIN_TYPES.iter().any(|b| decl[i].is_ident(b)) && !decl[i - 1].is(Tok::Scope)
    });
    match name_at {
        Some(i) => {
            let ty: Vec<Token> = decl
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, t)| t.clone())
                .collect();
            Param {
                name: Some(decl[i].text.clone()),
                ty: join_tokens(&ty),
                default,
                doc,
            }
        }
        None => Param {
            name: None,
            ty: join_tokens(decl),
            default,
            doc,
        },
    }
}

/// Index of the declared name: the identifier before a trailing array extent,
/// or the last token.
fn declarator_name(decl: &[Token]) -> Option<usize> {
    let mut end = decl.len();
    while end > 0 && decl[end - 1].is(Tok::RBracket) {
        end = decl[..end].iter().rposition(|t| t.is(Tok::LBracket))?;
    }
    let i = end.checked_sub(1)?;
    decl[i].is(Tok::Ident).then_some(i)
}

fn property_heads(tokens: &[Token]) -> Head {
    let parts = split_commas(tokens);
    let Some((_, first)) = parts.first() else {
        return Head::Skip("statement");
    };
    let Some(first_decl) = property(&[], first) else {
        return Head::Skip("statement");
    };

    // Type shared by further declarators: `int A, *B;`
    let name_at = first
        .iter()
        .position(|t| t.is_ident(&first_decl.name))
        .unwrap_or(0);
    let mut base: Vec<Token> = first[..name_at].to_vec();
    while base.last().is_some_and(is_pointer) {
        base.pop();
    }

    let mut decls = vec![first_decl];
    for (_, part) in &parts[1..] {
        if let Some(decl) = property(&base, part) {
            decls.push(decl);
        }
    }
    Head::Decls(decls)
}

fn property(base: &[Token], part: &[Token]) -> Option<HeadDecl> {
    let full: Vec<Token> = base.iter().chain(part).cloned().collect();

    let brace = find_top(&full, Tok::LBrace);
    let eq = find_top(&full, Tok::Eq);
    let (decl_end, default) = match (eq, brace) {
        (Some(eq), _) => (eq, Some(join_tokens(&full[eq + 1..]))),
        (None, Some(brace)) => (brace, Some(join_tokens(&full[brace..]))),
        (None, None) => (full.len(), None),
    };
    let decl_end = find_top(&full[..decl_end], Tok::Colon).unwrap_or(decl_end);
    let decl = &full[..decl_end];

    let name_at = declarator_name(decl).filter(|&i| i > 0)?;
    let array = (name_at + 1 < decl.len()).then(|| {
        let inner = &decl[name_at + 1..];
        join_tokens(&inner[1..inner.len() - 1])
    });
    let ty_tokens: Vec<Token> = decl[..name_at]
        .iter()
        .filter(|t| !t.is_ident("static"))
        .cloned()
        .collect();
    if ty_tokens.is_empty() {
        return None;
    }

    Some(HeadDecl {
        name: decl[name_at].text.clone(),
        signature: join_tokens(&full),
        item: Item::Property(PropertyShape {
            ty: join_tokens(&ty_tokens),
            array,
            default,
            is_static: decl[..name_at].iter().any(|t| t.is_ident("static")),
        }),
    })
}
