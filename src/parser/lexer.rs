//! Token stream over the visible code of a header.
//!
//! Doc comment, tool comment and ignored lines are blanked out before lexing,
//! so token line numbers still match the source. Doc blocks and inject
//! markers are then merged back into the stream by line as [`Piece`]s.

use crate::classify::{LineKind, TaggedLine};
use crate::comment::{BlockTarget, CommentBlock};
use crate::docblock::DocBlock;
use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Tok {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
    #[regex(r"[0-9][0-9A-Za-z_.']*")]
    Number,
    #[regex(r#"(u8|u|U|L)?"([^"\\\n]|\\.)*""#)]
    Str,
    #[regex(r"'([^'\\\n]|\\.)*'")]
    Char,

    #[token("::")]
    Scope,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
    #[token("=")]
    Eq,
    #[token("~")]
    Tilde,
    #[regex(r"->|\+\+|--|&&|\|\||\.\.\.|[-+*/%&|^!<>=]=|[-+*/%&|^!?.@$\\]")]
    Op,

    // -- Trivia, filtered out by `tokenize` --
    #[regex(r"//[^\n]*")]
    LineComment,
    /// `/* ... */`, up to the first `*/` or the end of input.
    #[token("/*", block_comment)]
    BlockComment,
    /// Preprocessor line including `\` continuations.
    #[regex(r"#([^\n\\]|\\[^\n]|\\\n)*")]
    Preprocessor,
}

fn block_comment(lex: &mut logos::Lexer<Tok>) -> bool {
    let rest = lex.remainder();
    match rest.find("*/") {
        Some(end) => lex.bump(end + 2),
        None => {
            log::warn!("unterminated block comment");
            lex.bump(rest.len());
        }
    }
    true
}

impl Tok {
    pub fn is_trivia(self) -> bool {
        matches!(self, Tok::LineComment | Tok::BlockComment | Tok::Preprocessor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub tok: Tok,
    pub text: String,
    /// 1-based source line.
    pub line: usize,
}

impl Token {
    pub fn is(&self, tok: Tok) -> bool {
        self.tok == tok
    }

    pub fn is_ident(&self, text: &str) -> bool {
        self.tok == Tok::Ident && self.text == text
    }

    pub fn is_op(&self, text: &str) -> bool {
        self.tok == Tok::Op && self.text == text
    }
}

/// One element of the parser's input stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Token(Token),
    Doc(DocBlock),
    /// `[inject: name]`.
    Inject { proxy: String, line: usize },
}

impl Piece {
    pub fn line(&self) -> usize {
        match self {
            Piece::Token(token) => token.line,
            Piece::Doc(doc) => doc.line,
            Piece::Inject { line, .. } => *line,
        }
    }

    pub fn token(&self) -> Option<&Token> {
        match self {
            Piece::Token(token) => Some(token),
            _ => None,
        }
    }
}

/// Lex `source`, numbering lines from `first_line`.
pub fn tokenize(source: &str, first_line: usize) -> Vec<Token> {
    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(source.match_indices('\n').map(|(i, _)| i + 1))
        .collect();
    let line_of = |offset: usize| line_starts.partition_point(|&start| start <= offset) - 1;

    let mut lexer = Tok::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let tok = match result {
            Ok(tok) if tok.is_trivia() => continue,
            Ok(tok) => tok,
            Err(()) => {
                log::trace!("unrecognised character {:?}", lexer.slice());
                Tok::Op
            }
        };
        tokens.push(Token {
            tok,
            text: lexer.slice().to_string(),
            line: first_line + line_of(lexer.span().start),
        });
    }
    tokens
}

/// Build the parser stream: visible code tokens plus declaration-bound doc
/// blocks and inject markers, in source order.
pub fn pieces(lines: &[TaggedLine], blocks: &[CommentBlock]) -> Vec<Piece> {
    let code: Vec<&str> = lines
        .iter()
        .map(|l| match l.kind {
            LineKind::Code if l.is_visible() => l.text.as_str(),
            _ => "",
        })
        .collect();
    let first_line = lines.first().map_or(1, |l| l.line);

    let mut pieces: Vec<Piece> = tokenize(&code.join("\n"), first_line)
        .into_iter()
        .map(Piece::Token)
        .collect();
    pieces.extend(
        blocks
            .iter()
            .filter(|b| b.target == BlockTarget::Declaration)
            .map(|b| Piece::Doc(b.to_doc())),
    );
    pieces.extend(lines.iter().filter(|l| l.is_visible()).filter_map(|l| match &l.kind {
        LineKind::InjectRef(proxy) => Some(Piece::Inject {
            proxy: proxy.clone(),
            line: l.line,
        }),
        _ => None,
    }));
    // Stable: tokens sharing a line keep their order.
    pieces.sort_by_key(Piece::line);
    pieces
}
