//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the ccgen project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Lightweight scanner for C/C++ translation units
//
// Extracts the high-level facts rule generation needs without a full
// preprocessor or compiler front-end:
//
//   - `#include` lines (angle-bracket and quoted form)
//   - conditional compilation guards (`#if`, `#ifdef`, `#ifndef`,
//     `#elif` and friends), reconstructed as an Expr AST
//   - the presence of a `main()` function, to distinguish executables
//     from libraries
//
// Real-world sources abuse the preprocessor, so malformed directives
// are tolerated and produce a best-effort result instead of an error.
// An `#if` whose expression cannot be parsed still enters the nesting
// stack, but with an unknown guard: includes below it are recorded as
// unconditional and the branch is left out of the negations built for
// `#else` / `#elif`.
//

pub mod expr;
mod lex;

use std::fs;
use std::io;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::platform::Macros;
use expr::{Compare, CompareOp, Expr, Value};
use lex::{Token, TokenReader};

/// What the scanner learned about one translation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceInfo {
    pub includes: Vec<Include>,
    pub has_main: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    pub path: String,
    /// True for the `<path>` form, or when the quoted form was malformed.
    pub is_system: bool,
    /// The `#if` guard in force at the include, None when unconditional.
    pub condition: Option<Expr>,
}

/// Runs the extractor on an in-memory buffer.
pub fn parse_source(input: &str) -> SourceInfo {
    let mut parser = Parser::new(input);
    parser.run();
    parser.info
}

/// Opens `path` and feeds its contents to the extractor.
pub fn parse_source_file(path: impl AsRef<Path>) -> io::Result<SourceInfo> {
    Ok(parse_source(&fs::read_to_string(path)?))
}

/// A valid macro identifier: first character `_` or a letter,
/// subsequent characters `_`, letters or decimal digits.
static MACRO_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// A C integer literal: decimal, octal or hex, with the optional
/// unsigned/long suffix combinations.
static INTEGER_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:0[xX][0-9a-fA-F]+|0[0-7]*|[1-9][0-9]*)(?:[uU](?:ll?|LL?)?|ll?[uU]?|LL?[uU]?)?$")
        .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MacroError {
    #[error("invalid macro name '{0}'")]
    InvalidName(String),
    #[error("macro {name}={value}, only integer literal values are allowed")]
    InvalidValue { name: String, value: String },
}

/// Converts `-D` style macro definitions (`NAME` or `NAME=INT`, with an
/// optional `-D` prefix) into a [`Macros`] map. A bare `NAME` defines
/// the value 1. Names and values are validated; string or float values
/// are rejected.
pub fn parse_macros(defs: &[String]) -> Result<Macros, MacroError> {
    let mut macros = Macros::new();
    for def in defs {
        let def = def.strip_prefix("-D").unwrap_or(def); // tolerate gcc/clang style
        let (name, raw) = match def.split_once('=') {
            Some((name, raw)) => (name, raw),
            None => (def, ""),
        };

        if !MACRO_IDENTIFIER.is_match(name) {
            return Err(MacroError::InvalidName(name.to_string()));
        }

        if raw.is_empty() {
            // FOO -> FOO=1
            macros.insert(name.to_string(), 1);
            continue;
        }

        if !INTEGER_LITERAL.is_match(raw) {
            return Err(MacroError::InvalidValue {
                name: name.to_string(),
                value: raw.to_string(),
            });
        }
        let value = parse_int_literal(raw).ok_or_else(|| MacroError::InvalidValue {
            name: name.to_string(),
            value: raw.to_string(),
        })?;
        macros.insert(name.to_string(), value);
    }
    Ok(macros)
}

/// Parses a C integer literal: decimal, leading-zero octal, `0x` hex,
/// and the `0b`/`0o` forms, ignoring `U`/`L` suffixes.
fn parse_int_literal(token: &str) -> Option<i64> {
    let trimmed = token.trim_end_matches(|c| matches!(c, 'u' | 'U' | 'l' | 'L'));
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let (radix, digits) = if let Some(rest) = digits.strip_prefix("0x").or(digits.strip_prefix("0X"))
    {
        (16, rest)
    } else if let Some(rest) = digits.strip_prefix("0b").or(digits.strip_prefix("0B")) {
        (2, rest)
    } else if let Some(rest) = digits.strip_prefix("0o").or(digits.strip_prefix("0O")) {
        (8, rest)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };
    let value = i64::from_str_radix(digits, radix).ok()?;
    Some(if negative { -value } else { value })
}

struct Parser<'a> {
    tr: TokenReader<'a>,
    info: SourceInfo,
    /// Active `#if` nesting; the AND-conjunction of the known entries
    /// is the current guard. None marks an unparseable guard.
    condition_stack: Vec<Option<Expr>>,
    /// Per `#if`-block list of branch expressions seen so far, used to
    /// build the `!previous` conjunct for `#else` / `#elif`.
    group_stack: Vec<Vec<Expr>>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Parser {
            tr: TokenReader::new(input),
            info: SourceInfo::default(),
            condition_stack: Vec::new(),
            group_stack: Vec::new(),
        }
    }

    fn run(&mut self) {
        let mut prev: Option<&str> = None;
        while let Some(token) = self.tr.next() {
            if token.starts_with('#') {
                self.directive(token);
                prev = Some(token);
                continue;
            }
            if token == "main" && prev == Some("int") && self.tr.peek() == Some("(") {
                self.info.has_main = true;
            }
            prev = Some(token);
        }
    }

    fn directive(&mut self, token: &str) {
        match token {
            "#include" => self.include(),
            "#ifdef" | "#ifndef" => self.ifdef(token),
            "#if" => self.conditional(),
            "#else" => self.alternative(),
            "#elif" | "#elifdef" | "#elifndef" => self.elif(token),
            "#endif" => {
                self.condition_stack.pop();
                self.group_stack.pop();
            }
            _ => {}
        }
    }

    /// The AND-conjunction of every active `#if` expression, or None
    /// when no known guard is in force.
    fn current_guard(&self) -> Option<Expr> {
        let mut conditions = self.condition_stack.iter().flatten().cloned();
        let first = conditions.next()?;
        Some(conditions.fold(first, Expr::and))
    }

    fn include(&mut self) {
        // A missing operand is a truncated directive; tolerate it.
        let Some(mut path) = self.tr.next() else {
            return;
        };
        let mut is_system = false;
        if path == "<" {
            is_system = true;
            match self.tr.next() {
                Some(token) => path = token,
                None => return,
            }
        } else if !path.contains('"') {
            // Malformed input, e.g. `#include weird>`
            is_system = true;
        }
        self.info.includes.push(Include {
            path: path.trim_matches('"').to_string(),
            is_system,
            condition: self.current_guard(),
        });
    }

    /// The next macro identifier, skipping line continuations.
    fn ident(&mut self) -> Option<String> {
        loop {
            match self.tr.next()? {
                "\\" => continue,
                token => return Some(token.to_string()),
            }
        }
    }

    fn ifdef(&mut self, kind: &str) {
        let Some(name) = self.ident() else {
            return;
        };
        let mut condition = Expr::defined(name);
        if kind == "#ifndef" {
            condition = Expr::not(condition);
        }
        self.condition_stack.push(Some(condition.clone()));
        self.group_stack.push(vec![condition]);
    }

    fn conditional(&mut self) {
        let condition = self.collect_expr();
        self.condition_stack.push(condition.clone());
        self.group_stack.push(Vec::from_iter(condition));
    }

    fn alternative(&mut self) {
        if self.condition_stack.is_empty() || self.group_stack.is_empty() {
            return; // #else without #if, silently ignore
        }
        self.condition_stack.pop();
        let seen = self.group_stack.last_mut().unwrap();
        match or_all(seen) {
            Some(previous) => {
                let negated = Expr::not(previous);
                self.condition_stack.push(Some(negated.clone()));
                seen.push(negated);
            }
            // every earlier branch had an unparseable guard
            None => self.condition_stack.push(None),
        }
    }

    fn elif(&mut self, kind: &str) {
        if self.condition_stack.is_empty() || self.group_stack.is_empty() {
            return; // #elif without #if, silently ignore
        }
        self.condition_stack.pop();

        let branch = match kind {
            "#elif" => self.collect_expr(),
            "#elifdef" | "#elifndef" => self.ident().map(|name| {
                let condition = Expr::defined(name);
                if kind == "#elifndef" {
                    Expr::not(condition)
                } else {
                    condition
                }
            }),
            _ => unreachable!("unexpected directive {kind}"),
        };

        let seen = self.group_stack.last_mut().unwrap();
        match branch {
            Some(branch) => {
                let condition = match or_all(seen) {
                    Some(previous) => Expr::and(branch.clone(), Expr::not(previous)),
                    None => branch.clone(),
                };
                self.condition_stack.push(Some(condition));
                // record only the raw branch for future !previous
                seen.push(branch);
            }
            None => self.condition_stack.push(None),
        }
    }

    /// Collects the remaining tokens of the logical line, joining
    /// `\`-continuations, and parses them as a guard expression.
    /// Returns None when the expression cannot be parsed; the caller
    /// then treats the guard as unknown.
    fn collect_expr(&mut self) -> Option<Expr> {
        let mut tokens = Vec::new();
        loop {
            match self.tr.next_keep_eol() {
                None | Some(Token::Eol) => break,
                Some(Token::Text("\\")) => {
                    // Multiline expression: join with the next line. A
                    // backslash elsewhere is dropped.
                    if self.tr.peek_keep_eol() == Some(Token::Eol) {
                        self.tr.next_keep_eol();
                    }
                }
                Some(Token::Text(token)) => tokens.push(token),
            }
        }
        ExprParser::new(&tokens).parse()
    }
}

fn or_all(exprs: &[Expr]) -> Option<Expr> {
    let mut exprs = exprs.iter().cloned();
    let first = exprs.next()?;
    Some(exprs.fold(first, Expr::or))
}

/// Recursive-descent parser for `#if` conditions over the collected
/// tokens of one logical line. Handles `&&`, `||`, unary `!`,
/// parentheses, `defined` tests and integer comparisons.
struct ExprParser<'a> {
    tokens: &'a [&'a str],
    idx: usize,
}

impl<'a> ExprParser<'a> {
    fn new(tokens: &'a [&'a str]) -> Self {
        ExprParser { tokens, idx: 0 }
    }

    /// Tokens after a complete parse are tolerated, e.g. the argument
    /// list of a function-like macro the grammar does not cover.
    fn parse(mut self) -> Option<Expr> {
        self.parse_or()
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.idx).copied()
    }

    fn peek_is(&self, expected: &str) -> bool {
        self.peek() == Some(expected)
    }

    fn next(&mut self) -> Option<&'a str> {
        let token = self.peek()?;
        self.idx += 1;
        Some(token)
    }

    fn consume(&mut self, expected: &str) -> Option<()> {
        if !self.peek_is(expected) {
            return None;
        }
        self.idx += 1;
        Some(())
    }

    fn parse_or(&mut self) -> Option<Expr> {
        let mut left = self.parse_and()?;
        while self.peek_is("||") {
            self.idx += 1;
            let right = self.parse_and()?;
            left = Expr::or(left, right);
        }
        Some(left)
    }

    fn parse_and(&mut self) -> Option<Expr> {
        let mut left = self.parse_unary()?;
        while self.peek_is("&&") {
            self.idx += 1;
            let right = self.parse_unary()?;
            left = Expr::and(left, right);
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        if self.consume("!").is_some() {
            return Some(Expr::not(self.parse_unary()?));
        }
        if self.consume("(").is_some() {
            let inner = self.parse_or()?;
            self.consume(")")?;
            return Some(inner);
        }
        if self.consume("defined").is_some() {
            // both `defined NAME` and `defined(NAME)`
            if self.consume("(").is_some() {
                let name = self.next()?;
                self.consume(")")?;
                return Some(Expr::defined(name));
            }
            return Some(Expr::defined(self.next()?));
        }

        let token = self.next()?;
        if let Some(op) = self.peek().and_then(CompareOp::from_token) {
            self.idx += 1;
            let left = interpret_value(token)?;
            let right = interpret_value(self.next()?)?;
            return Some(Expr::Compare(Compare { left, op, right }));
        }
        // `#if X` is equivalent to `#if X != 0`
        Some(Expr::Compare(Compare {
            left: Value::Ident(token.to_string()),
            op: CompareOp::Ne,
            right: Value::Constant(0),
        }))
    }
}

/// Classifies a token as either a macro reference or an integer
/// constant.
fn interpret_value(token: &str) -> Option<Value> {
    if MACRO_IDENTIFIER.is_match(token) {
        return Some(Value::Ident(token.to_string()));
    }
    parse_int_literal(token).map(Value::Constant)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_literal_bases() {
        assert_eq!(parse_int_literal("42"), Some(42));
        assert_eq!(parse_int_literal("0"), Some(0));
        assert_eq!(parse_int_literal("010"), Some(8));
        assert_eq!(parse_int_literal("0x1F"), Some(31));
        assert_eq!(parse_int_literal("0X1f"), Some(31));
        assert_eq!(parse_int_literal("0b101"), Some(5));
        assert_eq!(parse_int_literal("32UL"), Some(32));
        assert_eq!(parse_int_literal("-5"), Some(-5));
        assert_eq!(parse_int_literal(""), None);
        assert_eq!(parse_int_literal("0x"), None);
        assert_eq!(parse_int_literal("abc"), None);
    }

    #[test]
    fn interpret_value_classification() {
        assert_eq!(
            interpret_value("_WIN32"),
            Some(Value::Ident("_WIN32".to_string()))
        );
        assert_eq!(interpret_value("32"), Some(Value::Constant(32)));
        assert_eq!(interpret_value("3.14"), None);
        assert_eq!(interpret_value("\"str\""), None);
    }
}
