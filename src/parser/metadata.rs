//! Reflection macro argument lists: `BlueprintType, Meta = (Foo = Bar)`.

use super::head::join_tokens;
use super::lexer::{Tok, Token};
use crate::model::{MetaValue, Metadata};

/// Parse the tokens between a macro's outer parentheses.
pub fn parse(tokens: &[Token]) -> Result<Metadata, String> {
    let mut entries = Vec::new();
    for entry in split_top_level(tokens)? {
        if entry.is_empty() {
            continue;
        }
        match entry.iter().position(|t| t.is(Tok::Eq)) {
            Some(eq) => {
                let key = join_tokens(&entry[..eq]);
                if key.is_empty() {
                    return Err("missing key before `=`".to_string());
                }
                let value = value(&entry[eq + 1..])
                    .ok_or_else(|| format!("missing value for `{}`", key))??;
                entries.push((key, value));
            }
            None => entries.push((join_tokens(entry), MetaValue::Flag)),
        }
    }
    Ok(Metadata { entries })
}

fn value(tokens: &[Token]) -> Option<Result<MetaValue, String>> {
    let (first, last) = (tokens.first()?, tokens.last()?);
    if first.is(Tok::LParen) && last.is(Tok::RParen) && closes_at_end(tokens) {
        return Some(parse(&tokens[1..tokens.len() - 1]).map(MetaValue::Group));
    }
    if tokens.len() == 1 && first.is(Tok::Str) {
        return Some(Ok(MetaValue::Text(unquote(&first.text))));
    }
    Some(Ok(MetaValue::Text(join_tokens(tokens))))
}

/// Whether the opening parenthesis at index 0 is closed by the last token.
fn closes_at_end(tokens: &[Token]) -> bool {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match token.tok {
            Tok::LParen => depth += 1,
            Tok::RParen => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i == tokens.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

fn split_top_level(tokens: &[Token]) -> Result<Vec<&[Token]>, String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token.tok {
            Tok::LParen => depth += 1,
            Tok::RParen => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| "unbalanced parentheses".to_string())?;
            }
            Tok::Comma if depth == 0 => {
                parts.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err("unbalanced parentheses".to_string());
    }
    parts.push(&tokens[start..]);
    Ok(parts)
}

fn unquote(text: &str) -> String {
    let inner = text
        .trim_start_matches(|c| c != '"')
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::tokenize;

    fn meta(src: &str) -> Result<Metadata, String> {
        parse(&tokenize(src, 1))
    }

    #[test]
    fn parse_flags_and_nested_group() {
        let m = meta("BlueprintType, Meta = (Foo = Bar)").unwrap();
        assert_eq!(m.get("BlueprintType"), Some(&MetaValue::Flag));
        let Some(MetaValue::Group(group)) = m.get("Meta") else {
            panic!("expected group");
        };
        assert_eq!(group.get("Foo"), Some(&MetaValue::Text("Bar".to_string())));
    }

    #[test]
    fn parse_unquotes_strings() {
        let m = meta(r#"Category = "Game|Stats", DisplayName = "Say \"hi\"""#).unwrap();
        assert_eq!(m.get("Category"), Some(&MetaValue::Text("Game|Stats".to_string())));
        assert_eq!(m.get("DisplayName"), Some(&MetaValue::Text("Say \"hi\"".to_string())));
    }

    #[test]
    fn parse_empty_list() {
        assert!(meta("").unwrap().is_empty());
    }

    #[test]
    fn parse_keeps_order() {
        let m = meta("B, A = 1, C").unwrap();
        let keys: Vec<&str> = m.entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["B", "A", "C"]);
    }

    #[test]
    fn unbalanced_group_is_error() {
        assert!(meta("Meta = (Foo = Bar").is_err());
        assert!(meta("Foo)").is_err());
    }

    #[test]
    fn missing_value_is_error() {
        assert_eq!(meta("Category =").unwrap_err(), "missing value for `Category`");
    }
}
