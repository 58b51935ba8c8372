/*
 * meli - mimelib headers module
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

//! Ordered header container [`HeaderMap`] and the case-insensitive
//! [`HeaderName`].

pub mod names;

use std::{
    convert::TryInto,
    io::{BufRead, Write},
    ops::Deref,
};

use indexmap::IndexMap;
pub use names::{HeaderName, InvalidHeaderName, StandardHeader};
use smallvec::SmallVec;

use crate::{
    email::parser::{self, BytesExt},
    error::{Error, ErrorKind, Result},
};

/// Values of one header field, in the order they were added.
pub type HeaderValues = SmallVec<[String; 1]>;

/// Map of mail headers and values.
///
/// Fields keep the order in which they were first added. Every field may
/// appear at most once, except for `Return-Path` and `Received` (see
/// [`HeaderName::is_repeatable`]); repeated values of those are kept together
/// under the field's first position.
///
/// Values are stored as they appear on the wire: folding line breaks are
/// kept and encoded words are not decoded.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct HeaderMap(IndexMap<HeaderName, HeaderValues>);

fn header_name<T: TryInto<HeaderName>>(key: T) -> Result<HeaderName> {
    key.try_into().map_err(|_| {
        Error::new("Invalid header name")
            .set_details("Header names are printable US-ASCII characters except ':'.")
            .set_kind(ErrorKind::ValueError)
    })
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value. Fails with [`ErrorKind::DuplicateHeader`] if the field
    /// is already present and may not repeat.
    pub fn add_header<T: TryInto<HeaderName>, V: Into<String>>(
        &mut self,
        key: T,
        value: V,
    ) -> Result<()> {
        let key = header_name(key)?;
        if let Some(values) = self.0.get_mut(&key) {
            if !key.is_repeatable() {
                return Err(Error::new(format!(
                    "Header map cannot contain more than one value for header: {}",
                    key
                ))
                .set_kind(ErrorKind::DuplicateHeader));
            }
            values.push(value.into());
        } else {
            self.0.insert(key, smallvec::smallvec![value.into()]);
        }
        Ok(())
    }

    /// Replace all values of a field with `value`. A new field is appended at
    /// the end.
    pub fn set_header<T: TryInto<HeaderName>, V: Into<String>>(
        &mut self,
        key: T,
        value: V,
    ) -> Result<()> {
        let key = header_name(key)?;
        self.0.insert(key, smallvec::smallvec![value.into()]);
        Ok(())
    }

    /// First value of a field.
    pub fn get<T: TryInto<HeaderName>>(&self, key: T) -> Option<&str> {
        let k = key.try_into().ok()?;
        self.0
            .get(&k)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values of a field; empty if the field is absent.
    pub fn get_all<T: TryInto<HeaderName>>(&self, key: T) -> &[String] {
        key.try_into()
            .ok()
            .and_then(|k| self.0.get(&k))
            .map_or(&[][..], |values| values.as_slice())
    }

    pub fn contains_key<T: TryInto<HeaderName>>(&self, key: T) -> bool {
        key.try_into()
            .ok()
            .map(|k| self.0.contains_key(&k))
            .unwrap_or(false)
    }

    /// Remove a field, keeping the order of the remaining fields.
    pub fn remove<T: TryInto<HeaderName>>(&mut self, key: T) -> Option<HeaderValues> {
        key.try_into().ok().and_then(|k| self.0.shift_remove(&k))
    }

    /// Every `(name, value)` pair, in order.
    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &str)> + '_ {
        self.0
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k, v.as_str())))
    }

    /// Parse a header block. Parsing stops at the first empty line; anything
    /// else that is not a header field is an error.
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        let (fields, _body) = parser::mail(raw)?;
        let mut ret = Self::new();
        for (name, value) in fields {
            ret.add_header(name, String::from_utf8_lossy(value))?;
        }
        Ok(ret)
    }

    /// Read a header block from `reader`, up to and including the empty line
    /// that ends it, and add its fields to this map. The reader is left
    /// positioned at the start of the body.
    pub fn load<R: BufRead>(&mut self, reader: &mut R) -> Result<()> {
        let mut block = Vec::new();
        let mut line = Vec::new();
        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            if line.trim().is_empty() {
                break;
            }
            block.extend_from_slice(&line);
        }
        if block.is_empty() {
            return Ok(());
        }
        let (rest, fields) = parser::headers::headers(&block)?;
        if !rest.trim().is_empty() {
            return Err(Error::new("Could not parse header block")
                .set_details(format!(
                    "Not a header field: {:?}",
                    String::from_utf8_lossy(rest)
                        .lines()
                        .next()
                        .unwrap_or_default()
                ))
                .set_kind(ErrorKind::Parse));
        }
        for (name, value) in fields {
            self.add_header(name, String::from_utf8_lossy(value))?;
        }
        Ok(())
    }

    /// Write every field as `Name: value` followed by CRLF.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        for (name, value) in self.iter() {
            write!(writer, "{}: {}\r\n", name, value)?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> IndexMap<HeaderName, HeaderValues> {
        self.0
    }
}

impl Deref for HeaderMap {
    type Target = IndexMap<HeaderName, HeaderValues>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for HeaderMap {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (name, value) in self.iter() {
            write!(fmt, "{}: {}\r\n", name, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
