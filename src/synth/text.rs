//! Text-level helpers for scanning foreign source.
//!
//! These understand just enough of C-like syntax to find balanced blocks
//! and split object literals: string literals (`'`, `"`, `` ` ``), line and
//! block comments, and `()`, `[]`, `{}` nesting. They are not a parser for
//! any host language and return `None` whenever the text does not fit.

use serde_json::{Map, Number, Value};

/// If `bytes[i..]` starts a string literal or comment, return the index just
/// past its end. `Some(None)` means it starts one that never terminates.
fn skip_trivia(bytes: &[u8], i: usize) -> Option<Option<usize>> {
    match bytes[i] {
        q @ (b'\'' | b'"' | b'`') => {
            let mut j = i + 1;
            while j < bytes.len() {
                match bytes[j] {
                    b'\\' => j += 2,
                    c if c == q => return Some(Some(j + 1)),
                    _ => j += 1,
                }
            }
            Some(None)
        }
        b'/' if bytes.get(i + 1) == Some(&b'/') => {
            let end = bytes[i..]
                .iter()
                .position(|&c| c == b'\n')
                .map(|p| i + p + 1)
                .unwrap_or(bytes.len());
            Some(Some(end))
        }
        b'/' if bytes.get(i + 1) == Some(&b'*') => {
            let rest = &bytes[i + 2..];
            Some(
                rest.windows(2)
                    .position(|w| w == b"*/")
                    .map(|p| i + 2 + p + 2),
            )
        }
        _ => None,
    }
}

fn closer(open: u8) -> Option<u8> {
    match open {
        b'{' => Some(b'}'),
        b'(' => Some(b')'),
        b'[' => Some(b']'),
        _ => None,
    }
}

/// Index of the bracket closing the one at `open`.
pub fn find_matching(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut stack = vec![closer(*bytes.get(open)?)?];
    let mut i = open + 1;
    while i < bytes.len() {
        if let Some(skipped) = skip_trivia(bytes, i) {
            i = skipped?;
            continue;
        }
        let c = bytes[i];
        if let Some(close) = closer(c) {
            stack.push(close);
        } else if matches!(c, b'}' | b')' | b']') {
            if stack.pop()? != c {
                return None;
            }
            if stack.is_empty() {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

/// Split `body` on commas that sit outside any nesting, strings or comments.
/// Empty pieces (trailing commas) are dropped.
pub fn split_top_level(body: &str) -> Option<Vec<&str>> {
    let bytes = body.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if let Some(skipped) = skip_trivia(bytes, i) {
            i = skipped?;
            continue;
        }
        match bytes[i] {
            b'{' | b'(' | b'[' => depth += 1,
            b'}' | b')' | b']' => depth = depth.checked_sub(1)?,
            b',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if depth != 0 {
        return None;
    }
    parts.push(&body[start..]);
    Some(
        parts
            .into_iter()
            .map(strip_comments_and_trim)
            .filter(|p| !p.is_empty())
            .collect(),
    )
}

/// Trim whitespace and leading/trailing comments from a piece of text.
fn strip_comments_and_trim(mut s: &str) -> &str {
    loop {
        let trimmed = s.trim();
        if let Some(rest) = trimmed.strip_prefix("//") {
            s = rest.split_once('\n').map(|(_, r)| r).unwrap_or("");
        } else if trimmed.starts_with("/*") {
            s = trimmed.split_once("*/").map(|(_, r)| r).unwrap_or("");
        } else {
            return trimmed;
        }
    }
}

/// Split an object-literal entry `key: value` into its parts.
///
/// Keys may be bare identifiers or quoted strings. Method shorthand,
/// spreads and anything else without a top-level `:` yield `None`.
pub fn split_entry(entry: &str) -> Option<(String, &str)> {
    let entry = entry.trim();
    let bytes = entry.as_bytes();
    let (key, rest) = match bytes.first()? {
        b'\'' | b'"' | b'`' => {
            let end = skip_trivia(bytes, 0)??;
            (entry[1..end - 1].to_string(), &entry[end..])
        }
        _ => {
            let end = entry
                .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$' || c == '-'))
                .unwrap_or(entry.len());
            if end == 0 {
                return None;
            }
            (entry[..end].to_string(), &entry[end..])
        }
    };
    let value = rest.trim_start().strip_prefix(':')?;
    Some((key, value.trim()))
}

fn unquote(s: &str) -> Option<String> {
    let first = s.chars().next()?;
    if !matches!(first, '\'' | '"' | '`') || s.len() < 2 || !s.ends_with(first) {
        return None;
    }
    let inner = &s[1..s.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                other => out.push(other),
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

fn parse_number(s: &str) -> Option<Value> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::Number(i.into()));
    }
    // JS allows `.5` and `5.`; Rust's float parser accepts both.
    let f: f64 = s.parse().ok()?;
    Number::from_f64(f).map(Value::Number)
}

/// Parse a literal value written in JavaScript/TypeScript syntax.
///
/// Supports strings, numbers, booleans, `null`/`undefined`, arrays and
/// object literals whose members are themselves literals.
pub fn parse_js_literal(src: &str) -> Option<Value> {
    let s = strip_comments_and_trim(src);
    match s {
        "" => None,
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        "null" | "undefined" => Some(Value::Null),
        _ if s.starts_with('[') => {
            if find_matching(s, 0)? != s.len() - 1 {
                return None;
            }
            split_top_level(&s[1..s.len() - 1])?
                .into_iter()
                .map(parse_js_literal)
                .collect::<Option<Vec<_>>>()
                .map(Value::Array)
        }
        _ if s.starts_with('{') => {
            if find_matching(s, 0)? != s.len() - 1 {
                return None;
            }
            let mut map = Map::new();
            for entry in split_top_level(&s[1..s.len() - 1])? {
                let (key, value) = split_entry(entry)?;
                map.insert(key, parse_js_literal(value)?);
            }
            Some(Value::Object(map))
        }
        _ => unquote(s).map(Value::String).or_else(|| parse_number(s)),
    }
}
