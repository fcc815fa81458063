//! Indexing helpers for raw C source files.
//!
//! Model files declare layouts, display lists, vertex buffers and lights as
//! `type name[] = { ... };` structs. These helpers turn such a file into named bodies
//! that can be fed to a [SourceMap](crate::SourceMap) or decoded as tables.

use indexmap::IndexMap;

use crate::{Arg, SourceError};

/// The build version whose side of `#ifdef` blocks is kept.
pub const VERSION: &str = "VERSION_US";

/// Removes `//` and `/* */` comments, keeping line breaks.
pub fn strip_comments(source: &str) -> String {
    let mut result = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = ' ';
                for c in chars.by_ref() {
                    if c == '\n' {
                        result.push('\n');
                    }
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            _ => result.push(c),
        }
    }
    result
}

/// Evaluates `#ifdef`/`#ifndef`/`#else`/`#endif` blocks as if only [VERSION] were
/// defined.
///
/// Directive lines themselves are removed. Nested blocks are supported.
pub fn keep_version_us(source: &str) -> String {
    // One entry per open block: (branch active, parent active).
    let mut blocks: Vec<(bool, bool)> = Vec::new();
    let mut active = true;
    let mut lines = Vec::new();

    for line in source.lines() {
        let trimmed = line.trim_start();
        if let Some(symbol) = trimmed.strip_prefix("#ifdef") {
            blocks.push((symbol.trim() == VERSION, active));
            active = active && symbol.trim() == VERSION;
        } else if let Some(symbol) = trimmed.strip_prefix("#ifndef") {
            blocks.push((symbol.trim() != VERSION, active));
            active = active && symbol.trim() != VERSION;
        } else if trimmed.starts_with("#else") {
            if let Some((taken, parent)) = blocks.last_mut() {
                *taken = !*taken;
                active = *parent && *taken;
            }
        } else if trimmed.starts_with("#endif") {
            if let Some((_, parent)) = blocks.pop() {
                active = parent;
            }
        } else if active {
            lines.push(line);
        }
    }
    lines.join("\n")
}

/// Splits a C file into its top-level `;`-terminated declarations, keyed by declared
/// name.
///
/// The value is the initializer body between the outer braces, so
/// `const Gfx dl[] = { a, b };` maps `dl` to `" a, b "`. Declarations without an
/// initializer are skipped. Comments are stripped first.
pub fn split_structs(source: &str) -> IndexMap<String, String> {
    let source = strip_comments(source);
    let mut structs = IndexMap::new();
    for decl in source.split(';') {
        let (head, body) = match decl.split_once('=') {
            Some(parts) => parts,
            None => continue,
        };
        let name = match declared_name(head) {
            Some(name) => name,
            None => continue,
        };
        let body = body.trim();
        let body = match (body.find('{'), body.rfind('}')) {
            (Some(start), Some(end)) if start < end => &body[start + 1..end],
            _ => body,
        };
        structs.insert(name.to_owned(), body.to_owned());
    }
    structs
}

/// The type keyword of a declaration head such as `static const Vtx name[]`.
pub fn declared_type(source: &str, name: &str) -> Option<String> {
    let source = strip_comments(source);
    source.split(';').find_map(|decl| {
        let (head, _) = decl.split_once('=')?;
        if declared_name(head)? != name {
            return None;
        }
        let words: Vec<&str> = head.split_whitespace().collect();
        let type_index = words.len().checked_sub(2)?;
        Some(words[type_index].to_owned())
    })
}

fn declared_name(head: &str) -> Option<&str> {
    let head = head.trim();
    let head = head.strip_suffix("[]").unwrap_or(head).trim_end();
    let head = match head.rfind('[') {
        Some(bracket) if head.ends_with(']') => head[..bracket].trim_end(),
        _ => head,
    };
    let name = head.rsplit(|c: char| c.is_whitespace() || c == '*').next()?;
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Some(name)
    } else {
        None
    }
}

/// Splits an initializer body into lines, one macro call per line.
pub fn body_lines(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Flattens a brace initializer such as `{{{ 1, 2, 3 }, 0, { 4, 5 }}}` into its
/// scalar values.
///
/// Macro wrappers like `gdSPDefLights1(...)` are treated as an extra level of nesting.
pub fn flatten_initializer(body: &str) -> Result<Vec<Arg>, SourceError> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    for c in body.chars() {
        match c {
            '{' | '(' => {
                depth += 1;
                current.clear();
            }
            '}' | ')' | ',' => {
                let text = current.trim();
                if !text.is_empty() {
                    values.push(Arg::parse(text));
                }
                current.clear();
                if c != ',' {
                    depth -= 1;
                    if depth < 0 {
                        return Err(SourceError::ParseError {
                            message: "unbalanced initializer".to_owned(),
                        });
                    }
                }
            }
            _ => current.push(c),
        }
    }
    if depth != 0 {
        return Err(SourceError::ParseError {
            message: "unbalanced initializer".to_owned(),
        });
    }
    let text = current.trim();
    if !text.is_empty() {
        values.push(Arg::parse(text));
    }
    Ok(values)
}
