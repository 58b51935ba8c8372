/*
 * meli - mimelib address parser
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

//! Address list grammar, evaluated over the token stream of
//! [`super::lexer`].
//!
//! ```text
//! address     =  mailbox                      ; one addressee
//!             /  group                        ; named list
//! group       =  phrase ":" [#mailbox] ";"
//! mailbox     =  addr-spec                    ; simple address
//!             /  phrase route-addr            ; name & addr-spec
//! route-addr  =  "<" [route] addr-spec ">"
//! route       =  1#("@" domain) ":"           ; path-relative
//! addr-spec   =  local-part "@" domain        ; global address
//! local-part  =  word *("." word)             ; uninterpreted
//! domain      =  sub-domain *("." sub-domain)
//! sub-domain  =  domain-ref / domain-literal
//! ```

use std::ops::Range;

use super::{
    lexer::{tokenize, Token, TokenKind},
    AddressError, InternetAddress, Personal, Strictness, SyntaxErrorKind,
};

/// One comma separated element of a list, as a range of token indices.
struct Element {
    tokens: Range<usize>,
    /// Index of the `:` that opens a group.
    group: Option<usize>,
    /// Index of the `;` that closes a group, if it was present.
    group_end: Option<usize>,
}

impl Element {
    const fn plain(tokens: Range<usize>) -> Self {
        Self {
            tokens,
            group: None,
            group_end: None,
        }
    }
}

pub struct AddressParser<'i> {
    input: &'i str,
    tokens: Vec<Token>,
    strictness: Strictness,
}

impl<'i> AddressParser<'i> {
    pub fn new(input: &'i str, strictness: Strictness) -> Result<Self, AddressError> {
        Ok(Self {
            input,
            tokens: tokenize(input, strictness)?,
            strictness,
        })
    }

    /// Every address of a comma separated list. Empty elements are skipped.
    pub fn parse_list(&self) -> Result<Vec<InternetAddress>, AddressError> {
        self.list(0..self.tokens.len())
    }

    /// Exactly one address.
    pub fn parse_single(&self) -> Result<InternetAddress, AddressError> {
        let mut list = self.parse_list()?;
        match list.len() {
            1 => Ok(list.remove(0)),
            0 => Err(self.error(SyntaxErrorKind::EmptyAddress, 0)),
            _ => {
                let position = self
                    .tokens
                    .iter()
                    .find(|t| t.is_special(','))
                    .map_or(0, |t| t.start);
                Err(self.error(SyntaxErrorKind::MultipleAddresses, position))
            }
        }
    }

    /// The members of a group. `None` if the input is not a group.
    pub fn group_members(&self) -> Result<Option<Vec<InternetAddress>>, AddressError> {
        if !super::is_group_text(self.input.trim()) {
            return Ok(None);
        }
        let mut route = false;
        let mut colon = None;
        for (i, token) in self.tokens.iter().enumerate() {
            match token.kind {
                TokenKind::Special('<') => route = true,
                TokenKind::Special('>') => route = false,
                TokenKind::Special(':') if !route => {
                    colon = Some(i);
                    break;
                }
                _ => {}
            }
        }
        let (Some(colon), Some(semicolon)) = (
            colon,
            self.tokens.iter().rposition(|t| t.is_special(';')),
        ) else {
            return Ok(None);
        };
        if semicolon < colon {
            return Ok(None);
        }
        self.check_group_phrase(0..colon, colon)?;
        self.list(colon + 1..semicolon).map(Some)
    }

    fn error(&self, reason: SyntaxErrorKind, position: usize) -> AddressError {
        AddressError::new(reason, self.strictness, self.input, position)
    }

    fn error_at(&self, reason: SyntaxErrorKind, token: usize) -> AddressError {
        let position = self
            .tokens
            .get(token)
            .map_or(self.input.len(), |t| t.start);
        self.error(reason, position)
    }

    fn list(&self, range: Range<usize>) -> Result<Vec<InternetAddress>, AddressError> {
        let mut ret = vec![];
        for element in self.split(range)? {
            if let Some(colon) = element.group {
                ret.push(self.group(&element, colon)?);
            } else {
                ret.extend(self.element(element.tokens)?);
            }
        }
        Ok(ret)
    }

    /// Split at top level commas. Commas inside a route-addr or a group body
    /// do not separate; quoted strings, comments and domain literals are
    /// single tokens already.
    fn split(&self, range: Range<usize>) -> Result<Vec<Element>, AddressError> {
        let mut elements = vec![];
        let mut start = range.start;
        let mut route = false;
        let mut group = None;
        for i in range.clone() {
            match self.tokens[i].kind {
                TokenKind::Special('<') if !route => route = true,
                TokenKind::Special('>') if route => route = false,
                TokenKind::Special(':') if !route => {
                    if group.is_some() {
                        return Err(self.error_at(SyntaxErrorKind::NestedGroup, i));
                    }
                    group = Some(i);
                }
                TokenKind::Special(';') if !route => {
                    if let Some(colon) = group.take() {
                        elements.push(Element {
                            tokens: start..i + 1,
                            group: Some(colon),
                            group_end: Some(i),
                        });
                    } else if self.strictness == Strictness::ParseHeader {
                        log::debug!(
                            "Treating stray ';' as a separator in address list {:?}",
                            self.input
                        );
                        elements.push(Element::plain(start..i));
                    } else {
                        return Err(self.error_at(SyntaxErrorKind::UnexpectedToken, i));
                    }
                    start = i + 1;
                }
                TokenKind::Special(',') if !route && group.is_none() => {
                    elements.push(Element::plain(start..i));
                    start = i + 1;
                }
                _ => {}
            }
        }
        if let Some(colon) = group {
            if self.strictness != Strictness::ParseHeader {
                return Err(self.error_at(SyntaxErrorKind::UnterminatedGroup, colon));
            }
            log::debug!("Closing unterminated group in {:?}", self.input);
            elements.push(Element {
                tokens: start..range.end,
                group: Some(colon),
                group_end: None,
            });
        } else {
            elements.push(Element::plain(start..range.end));
        }
        Ok(elements)
    }

    fn check_group_phrase(&self, range: Range<usize>, colon: usize) -> Result<(), AddressError> {
        if self.strictness != Strictness::Strict {
            return Ok(());
        }
        let words = self.words(range);
        if words.is_empty() {
            return Err(self.error_at(SyntaxErrorKind::UnexpectedToken, colon));
        }
        self.check_phrase(&words)
    }

    /// A group is kept as one address whose text is the whole group.
    fn group(&self, element: &Element, colon: usize) -> Result<InternetAddress, AddressError> {
        self.check_group_phrase(element.tokens.start..colon, colon)?;
        let members_end = element.group_end.unwrap_or(element.tokens.end);
        self.list(colon + 1..members_end)?;

        let first = &self.tokens[element.tokens.start];
        let last = &self.tokens[element.tokens.end - 1];
        let mut address = self.input[first.start..last.end].to_string();
        if element.group_end.is_none() {
            address.push(';');
        }
        Ok(InternetAddress {
            address,
            personal: Personal::Absent,
        })
    }

    /// Indices of the non-comment tokens of `range`.
    fn words(&self, range: Range<usize>) -> Vec<usize> {
        range.filter(|&i| !self.tokens[i].is_comment()).collect()
    }

    fn first_comment(&self, range: Range<usize>) -> Personal {
        range
            .map(|i| &self.tokens[i])
            .find(|t| t.is_comment() && !t.value.trim().is_empty())
            .map_or(Personal::Absent, |t| Personal::encoded(t.value.trim()))
    }

    fn element(&self, range: Range<usize>) -> Result<Vec<InternetAddress>, AddressError> {
        let words = self.words(range.clone());
        if words.is_empty() {
            return Ok(vec![]);
        }
        if let Some(open) = words.iter().position(|&i| self.tokens[i].is_special('<')) {
            return self.route_addr(range, &words, open).map(|a| vec![a]);
        }
        if self.strictness == Strictness::NonStrict {
            if let Some(runs) = self.whitespace_runs(&words) {
                return runs
                    .into_iter()
                    .map(|run| {
                        Ok::<_, AddressError>(InternetAddress {
                            address: self.addr_spec(run)?,
                            personal: Personal::Absent,
                        })
                    })
                    .collect();
            }
        }
        Ok(vec![InternetAddress {
            address: self.addr_spec(&words)?,
            personal: self.first_comment(range),
        }])
    }

    /// `a@b c@d`: simple addresses separated only by white space.
    fn whitespace_runs<'w>(&self, words: &'w [usize]) -> Option<Vec<&'w [usize]>> {
        let mut runs = vec![];
        let mut start = 0;
        for k in 1..words.len() {
            let (prev, next) = (&self.tokens[words[k - 1]], &self.tokens[words[k]]);
            let special = |t: &Token| matches!(t.kind, TokenKind::Special(_));
            if next.start > prev.end && !special(prev) && !special(next) {
                runs.push(&words[start..k]);
                start = k;
            }
        }
        runs.push(&words[start..]);
        (runs.len() > 1
            && runs
                .iter()
                .all(|run| run.iter().any(|&i| self.tokens[i].is_special('@'))))
        .then_some(runs)
    }

    fn route_addr(
        &self,
        range: Range<usize>,
        words: &[usize],
        open: usize,
    ) -> Result<InternetAddress, AddressError> {
        let close = match words[open + 1..]
            .iter()
            .position(|&i| self.tokens[i].is_special('>'))
        {
            Some(k) => open + 1 + k,
            None if self.strictness == Strictness::ParseHeader => {
                log::debug!("Closing unterminated route-addr in {:?}", self.input);
                words.len()
            }
            None => {
                return Err(self.error_at(SyntaxErrorKind::UnterminatedRoute, words[open]));
            }
        };
        if let Some(&extra) = words.get(close + 1) {
            if self.strictness != Strictness::ParseHeader {
                return Err(self.error_at(SyntaxErrorKind::UnexpectedToken, extra));
            }
            log::debug!("Ignoring text after route-addr in {:?}", self.input);
        }

        let inner = &words[open + 1..close];
        let (route, spec) = if inner
            .first()
            .map_or(false, |&i| self.tokens[i].is_special('@'))
        {
            let Some(colon) = inner.iter().position(|&i| self.tokens[i].is_special(':')) else {
                return Err(self.error_at(SyntaxErrorKind::UnexpectedToken, inner[0]));
            };
            inner.split_at(colon + 1)
        } else {
            inner.split_at(0)
        };
        if self.strictness == Strictness::Strict {
            self.check_route(route)?;
        }
        let address = if spec.is_empty() && self.strictness == Strictness::ParseHeader {
            // "<>", the null reverse path.
            String::new()
        } else if spec.is_empty() {
            return Err(self.error_at(SyntaxErrorKind::EmptyAddress, words[open]));
        } else {
            let mut address = self.raw(route);
            address.push_str(&self.addr_spec(spec)?);
            address
        };

        let phrase = &words[..open];
        let personal = if phrase.is_empty() {
            self.first_comment(range)
        } else {
            if self.strictness == Strictness::Strict {
                self.check_phrase(phrase)?;
            }
            Personal::encoded(&self.phrase(phrase))
        };
        Ok(InternetAddress { address, personal })
    }

    /// `1#("@" domain) ":"`
    fn check_route(&self, route: &[usize]) -> Result<(), AddressError> {
        let Some((_colon, hops)) = route.split_last() else {
            return Ok(());
        };
        for hop in hops.split(|&i| self.tokens[i].is_special(',')) {
            match hop.split_first() {
                Some((&at, domain)) if self.tokens[at].is_special('@') => {
                    self.check_dotted(domain, at, SyntaxErrorKind::MissingDomain, |t| {
                        matches!(t.kind, TokenKind::Atom | TokenKind::DomainLiteral)
                    })?;
                }
                Some((&other, _)) => {
                    return Err(self.error_at(SyntaxErrorKind::UnexpectedToken, other));
                }
                None => {}
            }
        }
        Ok(())
    }

    /// `phrase = 1*word`, periods tolerated as in `John Q. Public`.
    fn check_phrase(&self, phrase: &[usize]) -> Result<(), AddressError> {
        match phrase
            .iter()
            .find(|&&i| !(self.tokens[i].is_word() || self.tokens[i].is_special('.')))
        {
            Some(&i) => Err(self.error_at(SyntaxErrorKind::UnexpectedToken, i)),
            None => Ok(()),
        }
    }

    /// Words joined by a space wherever the input had white space or a
    /// comment between them.
    fn phrase(&self, phrase: &[usize]) -> String {
        let mut ret = String::new();
        let mut prev_end = None;
        for &i in phrase {
            let token = &self.tokens[i];
            if prev_end.map_or(false, |end| token.start > end) {
                ret.push(' ');
            }
            ret.push_str(&token.value);
            prev_end = Some(token.end);
        }
        ret
    }

    fn raw(&self, words: &[usize]) -> String {
        words
            .iter()
            .map(|&i| self.tokens[i].raw(self.input))
            .collect()
    }

    /// `word *("." word)` and friends: items accepted by `is_item` separated
    /// by single periods.
    fn check_dotted(
        &self,
        items: &[usize],
        anchor: usize,
        empty: SyntaxErrorKind,
        is_item: impl Fn(&Token) -> bool,
    ) -> Result<(), AddressError> {
        if items.is_empty() {
            return Err(self.error_at(empty, anchor + 1));
        }
        for (k, &i) in items.iter().enumerate() {
            let token = &self.tokens[i];
            let ok = if k % 2 == 0 {
                is_item(token)
            } else {
                token.is_special('.')
            };
            if !ok {
                return Err(self.error_at(SyntaxErrorKind::UnexpectedToken, i));
            }
        }
        if items.len() % 2 == 0 {
            // Trailing period.
            return Err(self.error_at(SyntaxErrorKind::UnexpectedToken, items[items.len() - 1]));
        }
        Ok(())
    }

    /// Validate an addr-spec according to the strictness level and return
    /// its text without white space and comments.
    fn addr_spec(&self, words: &[usize]) -> Result<String, AddressError> {
        match self.strictness {
            Strictness::Strict => {
                let mut at = words
                    .iter()
                    .enumerate()
                    .filter(|&(_, &i)| self.tokens[i].is_special('@'))
                    .map(|(k, _)| k);
                let Some(first_at) = at.next() else {
                    let end = self.tokens[words[words.len() - 1]].end;
                    return Err(self.error(SyntaxErrorKind::MissingDomain, end));
                };
                if let Some(second_at) = at.next() {
                    return Err(self.error_at(SyntaxErrorKind::UnexpectedToken, words[second_at]));
                }
                let (local, domain) = (&words[..first_at], &words[first_at + 1..]);
                if local.is_empty() {
                    return Err(self.error_at(SyntaxErrorKind::EmptyAddress, words[first_at]));
                }
                self.check_dotted(local, words[0], SyntaxErrorKind::EmptyAddress, Token::is_word)?;
                self.check_dotted(
                    domain,
                    words[first_at],
                    SyntaxErrorKind::MissingDomain,
                    |t| matches!(t.kind, TokenKind::Atom | TokenKind::DomainLiteral),
                )?;
            }
            Strictness::NonStrict => {
                if self.tokens[words[0]].is_special('@') {
                    return Err(self.error_at(SyntaxErrorKind::EmptyAddress, words[0]));
                }
                if let Some(&i) = words.iter().find(|&&i| {
                    matches!(self.tokens[i].kind, TokenKind::Special(c) if c != '.' && c != '@')
                }) {
                    return Err(self.error_at(SyntaxErrorKind::UnexpectedToken, i));
                }
            }
            Strictness::ParseHeader => {}
        }
        Ok(self.raw(words))
    }
}
