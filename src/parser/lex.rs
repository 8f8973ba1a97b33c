//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the ccgen project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Tokenizer for C/C++ translation units
//
// Splits input into whitespace-separated words, brackets and the
// comparison/negation operators, skipping comments. Newlines are
// preserved as explicit markers so directive parsing can honour line
// boundaries.
//

/// A lexical token. Directive parsing mostly ignores line boundaries,
/// but `#if` expression collection needs them, so newlines survive
/// tokenization as an explicit marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    Eol,
    Text(&'a str),
}

fn is_bracket(c: char) -> bool {
    matches!(c, '(' | ')' | '[' | ']' | '{' | '}')
}

fn is_operator_start(c: char) -> bool {
    matches!(c, '!' | '=' | '<' | '>')
}

pub(crate) struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Tokenizer { src, pos: 0 }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        loop {
            let rest = &self.src[self.pos..];
            let c = rest.chars().next()?;
            match c {
                '\n' => {
                    self.pos += 1;
                    return Some(Token::Eol);
                }
                // Line comments run to the newline, which stays in the stream
                '/' if rest.starts_with("//") => {
                    self.pos += rest.find('\n').unwrap_or(rest.len());
                }
                '/' if rest.starts_with("/*") => {
                    self.pos += match rest[2..].find("*/") {
                        Some(close) => 2 + close + 2,
                        None => rest.len(),
                    };
                }
                _ if c.is_whitespace() => {
                    self.pos += c.len_utf8();
                }
                _ if is_bracket(c) => {
                    let end = self.pos + c.len_utf8();
                    let token = &self.src[self.pos..end];
                    self.pos = end;
                    return Some(Token::Text(token));
                }
                _ if is_operator_start(c) => {
                    // two-character operator? ("==", "!=", "<=", ">=")
                    let len = if rest[1..].starts_with('=') { 2 } else { 1 };
                    let token = &rest[..len];
                    self.pos += len;
                    return Some(Token::Text(token));
                }
                _ => {
                    // A word runs until a newline, whitespace, bracket or
                    // operator character. Comment starts inside a word do
                    // not terminate it.
                    let end = rest
                        .char_indices()
                        .find(|&(_, c)| {
                            c == '\n' || c.is_whitespace() || is_bracket(c) || is_operator_start(c)
                        })
                        .map(|(i, _)| i)
                        .unwrap_or(rest.len());
                    let token = &rest[..end];
                    self.pos += end;
                    return Some(Token::Text(token));
                }
            }
        }
    }
}

/// One-token-lookahead reader over the tokenizer. `next` and `peek`
/// skip the newline markers; the `keep_eol` variants expose them for
/// expression collection and continuation handling.
pub(crate) struct TokenReader<'a> {
    tokens: Tokenizer<'a>,
    lookahead: Option<Token<'a>>,
}

impl<'a> TokenReader<'a> {
    pub fn new(input: &'a str) -> Self {
        TokenReader {
            tokens: Tokenizer::new(input),
            lookahead: None,
        }
    }

    fn fetch(&mut self) -> Option<Token<'a>> {
        match self.lookahead.take() {
            Some(token) => Some(token),
            None => self.tokens.next(),
        }
    }

    /// Next token, skipping newline markers.
    pub fn next(&mut self) -> Option<&'a str> {
        loop {
            match self.fetch()? {
                Token::Eol => continue,
                Token::Text(token) => return Some(token),
            }
        }
    }

    /// Next token without consuming it, skipping newline markers.
    pub fn peek(&mut self) -> Option<&'a str> {
        let token = self.next()?;
        self.lookahead = Some(Token::Text(token));
        Some(token)
    }

    /// Next raw token including newline markers.
    pub fn next_keep_eol(&mut self) -> Option<Token<'a>> {
        self.fetch()
    }

    /// Next raw token without consuming it, including newline markers.
    pub fn peek_keep_eol(&mut self) -> Option<Token<'a>> {
        let token = self.fetch()?;
        self.lookahead = Some(token);
        Some(token)
    }
}
