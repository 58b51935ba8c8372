/*
 * meli - mimelib address lexer
 *
 * Copyright 2017 Manos Pitsidianakis
 *
 * This file is part of meli.
 *
 * meli is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * meli is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with meli. If not, see <http://www.gnu.org/licenses/>.
 */

//! Tokenizer for `RFC822` address text.
//!
//! ```text
//! specials    =  "(" / ")" / "<" / ">" / "@"  ; Must be in quoted-
//!             /  "," / ";" / ":" / "\" / <">  ;  string, to use
//!             /  "." / "[" / "]"              ;  within a word.
//! ```

use super::{AddressError, Strictness, SyntaxErrorKind};

/// `RFC822` special characters.
pub const SPECIALS: &str = "()<>@,;:\\\".[]";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenKind {
    Atom,
    QuotedString,
    DomainLiteral,
    Comment,
    Special(char),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Token text. Quoted strings and comments are unquoted and unescaped,
    /// domain literals keep their brackets.
    pub value: String,
    /// Byte offset of the first character in the input.
    pub start: usize,
    /// Byte offset one past the last character in the input.
    pub end: usize,
}

impl Token {
    #[inline]
    pub fn is_special(&self, c: char) -> bool {
        self.kind == TokenKind::Special(c)
    }

    /// An atom or a quoted string.
    #[inline]
    pub const fn is_word(&self) -> bool {
        matches!(self.kind, TokenKind::Atom | TokenKind::QuotedString)
    }

    #[inline]
    pub const fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::Comment)
    }

    /// The token as it was written, quotes and escapes included.
    #[inline]
    pub fn raw<'i>(&self, input: &'i str) -> &'i str {
        &input[self.start..self.end]
    }
}

struct Lexer<'i> {
    input: &'i str,
    pos: usize,
    strictness: Strictness,
}

impl<'i> Lexer<'i> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, reason: SyntaxErrorKind, position: usize) -> AddressError {
        AddressError::new(reason, self.strictness, self.input, position)
    }

    fn token(&self, kind: TokenKind, value: String, start: usize) -> Token {
        Token {
            kind,
            value,
            start,
            end: self.pos,
        }
    }

    fn check_control(&self, c: char, position: usize) -> Result<(), AddressError> {
        if self.strictness == Strictness::Strict && c.is_control() && c != '\t' {
            return Err(self.error(SyntaxErrorKind::InvalidCharacter, position));
        }
        Ok(())
    }

    fn next_token(&mut self) -> Result<Option<Token>, AddressError> {
        while let Some(c) = self.peek() {
            if c == ' ' || c == '\t' || c == '\r' || c == '\n' {
                self.bump();
            } else {
                break;
            }
        }
        let start = self.pos;
        let Some(c) = self.bump() else {
            return Ok(None);
        };
        let token = match c {
            '"' => self.quoted_string(start)?,
            '(' => self.comment(start)?,
            '[' => self.domain_literal(start)?,
            c if SPECIALS.contains(c) => self.token(TokenKind::Special(c), c.to_string(), start),
            c => {
                self.check_control(c, start)?;
                self.atom(c, start)?
            }
        };
        Ok(Some(token))
    }

    fn quoted_string(&mut self, start: usize) -> Result<Token, AddressError> {
        let mut value = String::new();
        loop {
            let position = self.pos;
            match self.bump() {
                None => {
                    if self.strictness != Strictness::ParseHeader {
                        return Err(self.error(SyntaxErrorKind::UnterminatedQuote, start));
                    }
                    log::debug!(
                        "Closing unterminated quoted string at end of address {:?}",
                        self.input
                    );
                    break;
                }
                Some('"') => break,
                Some('\\') => {
                    if let Some(escaped) = self.bump() {
                        value.push(escaped);
                    }
                }
                // Folding.
                Some('\r' | '\n') => {}
                Some(c) => {
                    self.check_control(c, position)?;
                    value.push(c);
                }
            }
        }
        Ok(self.token(TokenKind::QuotedString, value, start))
    }

    fn comment(&mut self, start: usize) -> Result<Token, AddressError> {
        let mut value = String::new();
        let mut depth = 1_usize;
        loop {
            let position = self.pos;
            match self.bump() {
                None => {
                    if self.strictness != Strictness::ParseHeader {
                        return Err(self.error(SyntaxErrorKind::UnterminatedComment, start));
                    }
                    log::debug!(
                        "Closing unterminated comment at end of address {:?}",
                        self.input
                    );
                    break;
                }
                Some('\\') => {
                    if let Some(escaped) = self.bump() {
                        value.push(escaped);
                    }
                }
                Some('(') => {
                    depth += 1;
                    value.push('(');
                }
                Some(')') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    value.push(')');
                }
                Some('\r' | '\n') => {}
                Some(c) => {
                    self.check_control(c, position)?;
                    value.push(c);
                }
            }
        }
        Ok(self.token(TokenKind::Comment, value, start))
    }

    fn domain_literal(&mut self, start: usize) -> Result<Token, AddressError> {
        let mut value = String::from("[");
        loop {
            let position = self.pos;
            match self.bump() {
                // Recovering would swallow the rest of the list.
                None => return Err(self.error(SyntaxErrorKind::UnterminatedDomainLiteral, start)),
                Some(']') => {
                    value.push(']');
                    break;
                }
                Some('[') if self.strictness == Strictness::Strict => {
                    return Err(self.error(SyntaxErrorKind::InvalidCharacter, position));
                }
                Some('\\') => {
                    value.push('\\');
                    if let Some(escaped) = self.bump() {
                        value.push(escaped);
                    }
                }
                Some('\r' | '\n') => {}
                Some(c) => {
                    self.check_control(c, position)?;
                    value.push(c);
                }
            }
        }
        Ok(self.token(TokenKind::DomainLiteral, value, start))
    }

    fn atom(&mut self, first: char, start: usize) -> Result<Token, AddressError> {
        let mut value = String::from(first);
        while let Some(c) = self.peek() {
            if c == ' ' || c == '\t' || c == '\r' || c == '\n' || SPECIALS.contains(c) {
                break;
            }
            self.check_control(c, self.pos)?;
            value.push(c);
            self.bump();
        }
        Ok(self.token(TokenKind::Atom, value, start))
    }
}

/// Split `input` into tokens. Comments are kept in the stream.
///
/// Unterminated quoted strings and comments are closed at the end of input
/// with [`Strictness::ParseHeader`] and are an error otherwise. Control
/// characters are rejected with [`Strictness::Strict`].
pub fn tokenize(input: &str, strictness: Strictness) -> Result<Vec<Token>, AddressError> {
    let mut lexer = Lexer {
        input,
        pos: 0,
        strictness,
    };
    let mut tokens = vec![];
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str, strictness: Strictness) -> Vec<TokenKind> {
        tokenize(input, strictness)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_address_lexer_tokens() {
        let input = r#""Joe \"Q\" User" (home (nested)) <joe@[10.0.0.1]>"#;
        let tokens = tokenize(input, Strictness::Strict).unwrap();
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                TokenKind::QuotedString,
                TokenKind::Comment,
                TokenKind::Special('<'),
                TokenKind::Atom,
                TokenKind::Special('@'),
                TokenKind::DomainLiteral,
                TokenKind::Special('>'),
            ]
        );
        assert_eq!(tokens[0].value, r#"Joe "Q" User"#);
        assert_eq!(tokens[0].raw(input), r#""Joe \"Q\" User""#);
        assert_eq!(tokens[1].value, "home (nested)");
        assert_eq!(tokens[5].value, "[10.0.0.1]");
        assert_eq!(tokens[3].start, input.find("joe@").unwrap());
    }

    #[test]
    fn test_address_lexer_non_ascii_atoms() {
        let tokens = tokenize("Jörg <jörg@example.com>", Strictness::Strict).unwrap();
        assert_eq!(tokens[0].value, "Jörg");
        assert_eq!(tokens[2].value, "jörg");
        assert_eq!(tokens[2].start, 7);
    }

    #[test]
    fn test_address_lexer_unterminated() {
        for strictness in [Strictness::Strict, Strictness::NonStrict] {
            let err = tokenize("\"Joe <joe@x>", strictness).unwrap_err();
            assert_eq!(err.reason, SyntaxErrorKind::UnterminatedQuote);
            assert_eq!(err.position, 0);
            let err = tokenize("joe@x (Joe", strictness).unwrap_err();
            assert_eq!(err.reason, SyntaxErrorKind::UnterminatedComment);
            assert_eq!(err.position, 6);
        }
        assert_eq!(
            kinds("\"Joe <joe@x>", Strictness::ParseHeader),
            vec![TokenKind::QuotedString]
        );
        assert_eq!(
            kinds("joe@x (Joe", Strictness::ParseHeader),
            vec![
                TokenKind::Atom,
                TokenKind::Special('@'),
                TokenKind::Atom,
                TokenKind::Comment
            ]
        );
        let err = tokenize("joe@[1.2.3", Strictness::ParseHeader).unwrap_err();
        assert_eq!(err.reason, SyntaxErrorKind::UnterminatedDomainLiteral);
    }

    #[test]
    fn test_address_lexer_control_characters() {
        let err = tokenize("jo\u{7}e@x", Strictness::Strict).unwrap_err();
        assert_eq!(err.reason, SyntaxErrorKind::InvalidCharacter);
        assert_eq!(err.position, 2);
        assert_eq!(
            kinds("jo\u{7}e@x", Strictness::NonStrict),
            vec![TokenKind::Atom, TokenKind::Special('@'), TokenKind::Atom]
        );
    }
}
