//! Source-expression parser
//!
//! Compiles the expression strings found in `selected-fields` into
//! [`Expression`] values. The accepted language is deliberately closed:
//!
//! ```text
//! expr    := path | literal | call
//! path    := '$' segment* | ident segment*
//! segment := '.' key | '[' digits ']' | '[' quoted ']'
//! literal := quoted | number | 'true' | 'false' | 'null'
//! call    := ident '(' [ expr (',' expr)* ] ')'
//! ```
//!
//! Calls are limited to `col`, `lit`, `concat`, `coalesce`, `lower`, `upper`
//! and `trim`. Everything else is rejected with [`Error::Expression`].

use super::types::{Expression, FieldPath, PathSegment};
use crate::error::{Error, Result};
use crate::types::JsonValue;
use regex::Regex;
use std::sync::LazyLock;

/// Identifier: field names and function names
static IDENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-]*").unwrap());

/// Key after a dot; may start with a digit (`$.payload.0day`)
static KEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_\-]*").unwrap());

/// JSON-style number literal
static NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?([eE][+\-]?[0-9]+)?").unwrap());

/// Parse and validate a source-expression
pub fn parse_expression(source: &str) -> Result<Expression> {
    let mut parser = Parser::new(source);
    parser.skip_whitespace();
    if parser.at_end() {
        return Err(parser.error("empty expression"));
    }
    let expr = parser.parse_expr()?;
    parser.skip_whitespace();
    if !parser.at_end() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(expr)
}

/// Parse a bare field path (`a.b[0]`, `$.a.b`, `$`)
pub fn parse_path(source: &str) -> Result<FieldPath> {
    let mut parser = Parser::new(source);
    parser.skip_whitespace();
    let path = parser.parse_path_root()?;
    parser.skip_whitespace();
    if !parser.at_end() {
        return Err(parser.error("unexpected trailing input in path"));
    }
    Ok(path)
}

/// Maximum nesting of function calls in one expression
pub(crate) const MAX_NESTING: usize = 64;

struct Parser<'a> {
    source: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            depth: 0,
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::expression(self.source, self.pos, message)
    }

    fn error_at(&self, pos: usize, message: impl Into<String>) -> Error {
        Error::expression(self.source, pos, message)
    }

    fn take_match(&mut self, regex: &Regex) -> Option<&'a str> {
        let rest = self.rest();
        let m = regex.find(rest)?;
        self.pos += m.end();
        Some(&rest[..m.end()])
    }

    fn parse_expr(&mut self) -> Result<Expression> {
        self.skip_whitespace();
        let start = self.pos;
        match self.peek() {
            Some('$') => self.parse_path_root().map(Expression::Path),
            Some('\'' | '"') => self.parse_quoted().map(|s| Expression::Literal(s.into())),
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_number(),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                let ident = self
                    .take_match(&IDENT_REGEX)
                    .ok_or_else(|| self.error("expected identifier"))?;
                self.skip_whitespace();
                if self.peek() == Some('(') {
                    return self.parse_call(ident, start);
                }
                match ident {
                    "true" => Ok(Expression::Literal(JsonValue::Bool(true))),
                    "false" => Ok(Expression::Literal(JsonValue::Bool(false))),
                    "null" => Ok(Expression::Literal(JsonValue::Null)),
                    _ => {
                        let mut segments = vec![PathSegment::Key(ident.to_string())];
                        self.parse_segments(&mut segments)?;
                        Ok(Expression::Path(FieldPath::new(segments)))
                    }
                }
            }
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_path_root(&mut self) -> Result<FieldPath> {
        let mut segments = Vec::new();
        if self.peek() == Some('$') {
            self.bump();
        } else {
            let ident = self
                .take_match(&IDENT_REGEX)
                .ok_or_else(|| self.error("expected field name"))?;
            segments.push(PathSegment::Key(ident.to_string()));
        }
        self.parse_segments(&mut segments)?;
        Ok(FieldPath::new(segments))
    }

    fn parse_segments(&mut self, segments: &mut Vec<PathSegment>) -> Result<()> {
        loop {
            match self.peek() {
                Some('.') => {
                    self.bump();
                    let key = self
                        .take_match(&KEY_REGEX)
                        .ok_or_else(|| self.error("expected field name after '.'"))?;
                    segments.push(PathSegment::Key(key.to_string()));
                }
                Some('[') => {
                    self.bump();
                    self.skip_whitespace();
                    match self.peek() {
                        Some('\'' | '"') => {
                            let key = self.parse_quoted()?;
                            segments.push(PathSegment::Key(key));
                        }
                        Some(c) if c.is_ascii_digit() => {
                            let start = self.pos;
                            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                                self.bump();
                            }
                            let idx = self.source[start..self.pos]
                                .parse::<usize>()
                                .map_err(|e| self.error_at(start, format!("invalid index: {e}")))?;
                            segments.push(PathSegment::Index(idx));
                        }
                        _ => return Err(self.error("expected index or quoted key inside '[]'")),
                    }
                    self.skip_whitespace();
                    self.expect(']')?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn parse_quoted(&mut self) -> Result<String> {
        let start = self.pos;
        let quote = self.bump().ok_or_else(|| self.error("expected string"))?;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some(c @ ('\\' | '\'' | '"')) => out.push(c),
                    Some(c) => {
                        return Err(self.error_at(self.pos - c.len_utf8(), "invalid escape"));
                    }
                    None => return Err(self.error_at(start, "unterminated string")),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
                None => return Err(self.error_at(start, "unterminated string")),
            }
        }
    }

    fn parse_number(&mut self) -> Result<Expression> {
        let start = self.pos;
        let text = self
            .take_match(&NUMBER_REGEX)
            .ok_or_else(|| self.error("invalid number"))?;
        let number = if let Ok(i) = text.parse::<i64>() {
            serde_json::Number::from(i)
        } else {
            text.parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .ok_or_else(|| self.error_at(start, format!("invalid number '{text}'")))?
        };
        Ok(Expression::Literal(JsonValue::Number(number)))
    }

    fn parse_args(&mut self) -> Result<Vec<Expression>> {
        if self.depth >= MAX_NESTING {
            return Err(self.error("expression nested too deeply"));
        }
        self.depth += 1;
        let args = self.parse_arg_list();
        self.depth -= 1;
        args
    }

    fn parse_arg_list(&mut self) -> Result<Vec<Expression>> {
        self.expect('(')?;
        let mut args = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(')') {
            self.bump();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(')') => {
                    self.bump();
                    return Ok(args);
                }
                Some(c) => return Err(self.error(format!("expected ',' or ')', found '{c}'"))),
                None => return Err(self.error("unclosed argument list")),
            }
        }
    }

    fn parse_call(&mut self, name: &str, start: usize) -> Result<Expression> {
        match name {
            "col" => {
                self.expect('(')?;
                self.skip_whitespace();
                let arg_pos = self.pos;
                let text = match self.peek() {
                    Some('\'' | '"') => self.parse_quoted()?,
                    _ => return Err(self.error("col() takes a single quoted field path")),
                };
                self.skip_whitespace();
                self.expect(')')?;
                let path = parse_path(&text).map_err(|e| match e {
                    Error::Expression { message, .. } => {
                        self.error_at(arg_pos, format!("invalid path in col(): {message}"))
                    }
                    other => other,
                })?;
                Ok(Expression::Path(path))
            }
            "lit" => {
                let args = self.parse_args()?;
                match <[Expression; 1]>::try_from(args) {
                    Ok([Expression::Literal(value)]) => Ok(Expression::Literal(value)),
                    _ => Err(self.error_at(start, "lit() takes exactly one literal")),
                }
            }
            "concat" | "coalesce" => {
                let args = self.parse_args()?;
                if args.is_empty() {
                    return Err(self.error_at(start, format!("{name}() needs at least one argument")));
                }
                Ok(if name == "concat" {
                    Expression::Concat(args)
                } else {
                    Expression::Coalesce(args)
                })
            }
            "lower" | "upper" | "trim" => {
                let args = self.parse_args()?;
                let [arg] = <[Expression; 1]>::try_from(args).map_err(|_| {
                    self.error_at(start, format!("{name}() takes exactly one argument"))
                })?;
                let arg = Box::new(arg);
                Ok(match name {
                    "lower" => Expression::Lower(arg),
                    "upper" => Expression::Upper(arg),
                    _ => Expression::Trim(arg),
                })
            }
            other => Err(self.error_at(start, format!("unknown function '{other}'"))),
        }
    }
}
