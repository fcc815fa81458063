use std::{iter::Peekable, str::Chars};

use crate::{
    Arg,
    SourceError::{self, ParseError},
};

/// A macro invocation such as `gsSPVertex(bob_vertex_0, 15, 0)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroCall {
    /// The macro name.
    pub name: String,
    /// The arguments in order. An empty argument list has no entries.
    pub args: Vec<Arg>,
}

impl MacroCall {
    /// Construct a call from a name and argument texts, mostly for tests.
    pub fn new(name: impl Into<String>, args: &[&str]) -> Self {
        Self {
            name: name.into(),
            args: args.iter().map(|&arg| Arg::parse(arg)).collect(),
        }
    }

    /// Returns an error unless the call has exactly `n` arguments.
    pub fn expect_arity(&self, n: usize) -> Result<(), SourceError> {
        if self.args.len() == n {
            Ok(())
        } else {
            Err(ParseError {
                message: format!(
                    "{} expects {} arguments, found {}",
                    self.name,
                    n,
                    self.args.len()
                ),
            })
        }
    }

    /// Returns an error unless the call has between `min` and `max` arguments.
    pub fn expect_arity_range(&self, min: usize, max: usize) -> Result<(), SourceError> {
        if (min..=max).contains(&self.args.len()) {
            Ok(())
        } else {
            Err(ParseError {
                message: format!(
                    "{} expects {} to {} arguments, found {}",
                    self.name,
                    min,
                    max,
                    self.args.len()
                ),
            })
        }
    }

    /// The `i`th argument as an integer.
    pub fn int(&self, i: usize) -> Result<i64, SourceError> {
        self.arg(i)?
            .as_int()
            .ok_or_else(|| self.bad_arg(i, "an integer"))
    }

    /// The `i`th argument as a number.
    pub fn float(&self, i: usize) -> Result<f32, SourceError> {
        self.arg(i)?.as_f32().ok_or_else(|| self.bad_arg(i, "a number"))
    }

    /// The `i`th argument as a boolean.
    pub fn bool(&self, i: usize) -> Result<bool, SourceError> {
        self.arg(i)?.as_bool().ok_or_else(|| self.bad_arg(i, "a boolean"))
    }

    /// The `i`th argument as a name.
    pub fn symbol(&self, i: usize) -> Result<&str, SourceError> {
        self.arg(i)?.as_symbol().ok_or_else(|| self.bad_arg(i, "a name"))
    }

    /// The `i`th argument.
    pub fn arg(&self, i: usize) -> Result<&Arg, SourceError> {
        self.args.get(i).ok_or_else(|| ParseError {
            message: format!("{} is missing argument {}", self.name, i + 1),
        })
    }

    fn bad_arg(&self, i: usize, expected: &str) -> SourceError {
        ParseError {
            message: format!(
                "{} argument {} should be {}, found `{}`",
                self.name,
                i + 1,
                expected,
                self.args[i]
            ),
        }
    }
}

/// Parses a single source line as a macro call.
///
/// Comments are ignored. Lines that do not start with `identifier(` (array headers,
/// closing braces, blank lines) produce `Ok(None)`.
pub fn parse_macro_call(line: &str) -> Result<Option<MacroCall>, SourceError> {
    let code = strip_line_comments(line);
    Parser::new(&code).parse()
}

fn strip_line_comments(line: &str) -> String {
    let mut code = String::with_capacity(line.len());
    let mut rest = line;
    loop {
        match (rest.find("/*"), rest.find("//")) {
            (Some(block), line_comment) if line_comment.map_or(true, |l| block < l) => {
                code.push_str(&rest[..block]);
                match rest[block + 2..].find("*/") {
                    Some(end) => rest = &rest[block + 2 + end + 2..],
                    None => return code,
                }
            }
            (_, Some(line_comment)) => {
                code.push_str(&rest[..line_comment]);
                return code;
            }
            (_, None) => {
                code.push_str(rest);
                return code;
            }
        }
    }
}

struct Parser<'s> {
    chars: Peekable<Chars<'s>>,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str) -> Self {
        Parser {
            chars: source.chars().peekable(),
        }
    }

    fn parse(mut self) -> Result<Option<MacroCall>, SourceError> {
        self.skip_whitespace();
        let name = match self.name() {
            Some(name) => name,
            None => return Ok(None),
        };
        self.skip_whitespace();
        if self.chars.peek() != Some(&'(') {
            return Ok(None);
        }
        self.chars.next();
        let args = self.args(&name)?;
        Ok(Some(MacroCall { name, args }))
    }

    fn name(&mut self) -> Option<String> {
        let mut name = String::new();
        match self.chars.peek() {
            Some(&c) if c.is_ascii_alphabetic() || c == '_' => {
                name.push(c);
                self.chars.next();
            }
            _ => return None,
        }

        while let Some(&c) = self
            .chars
            .peek()
            .filter(|&&c| c.is_ascii_alphanumeric() || c == '_')
        {
            name.push(c);
            self.chars.next();
        }
        Some(name)
    }

    fn args(&mut self, name: &str) -> Result<Vec<Arg>, SourceError> {
        let mut args = Vec::new();
        let mut current = String::new();
        let mut depth = 0;
        loop {
            let c = self.chars.next().ok_or_else(|| ParseError {
                message: format!("unterminated argument list for {}", name),
            })?;
            match c {
                '(' | '{' => {
                    depth += 1;
                    current.push(c);
                }
                ')' | '}' if depth > 0 => {
                    depth -= 1;
                    current.push(c);
                }
                ')' => break,
                ',' if depth == 0 => {
                    args.push(self.finish_arg(&current, name)?);
                    current.clear();
                }
                _ => current.push(c),
            }
        }
        if !current.trim().is_empty() || !args.is_empty() {
            args.push(self.finish_arg(&current, name)?);
        }
        Ok(args)
    }

    fn finish_arg(&self, text: &str, name: &str) -> Result<Arg, SourceError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ParseError {
                message: format!("empty argument in call to {}", name),
            });
        }
        let text = strip_parens(text);
        Ok(Arg::parse(text))
    }

    fn skip_whitespace(&mut self) {
        while self
            .chars
            .peek()
            .filter(|c| c.is_ascii_whitespace())
            .is_some()
        {
            self.chars.next();
        }
    }
}

fn strip_parens(mut text: &str) -> &str {
    while text.starts_with('(') && text.ends_with(')') {
        let inner = &text[1..text.len() - 1];
        let mut depth = 0i32;
        let balanced = inner.chars().all(|c| {
            match c {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
            depth >= 0
        });
        if !balanced || depth != 0 {
            break;
        }
        text = inner.trim();
    }
    text
}
