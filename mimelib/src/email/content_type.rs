/*
 * meli - mimelib content type module
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

//! `Content-Type` header values.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use indexmap::IndexMap;

use crate::{
    email::parser::{self, BytesExt},
    error::{Error, ErrorKind, Result},
};

/// A MIME type with its parameters, eg. `text/plain; charset=utf-8`.
///
/// Type, subtype and parameter names are kept in lower case; parameter values
/// are kept as given.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContentType {
    primary: String,
    sub: String,
    params: IndexMap<String, String>,
}

impl Default for ContentType {
    /// `text/plain; charset=us-ascii`, the type of a body without a
    /// `Content-Type` header.
    fn default() -> Self {
        let mut ret = Self::new("text", "plain");
        ret.set_parameter("charset", "us-ascii");
        ret
    }
}

impl ContentType {
    pub fn new(primary: &str, sub: &str) -> Self {
        Self {
            primary: primary.trim().to_ascii_lowercase(),
            sub: sub.trim().to_ascii_lowercase(),
            params: IndexMap::new(),
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        let (rest, (primary, sub, params)) =
            parser::content_type::content_type(value.as_bytes()).map_err(|err| {
                Error::from(err).set_summary(format!("Invalid content type: {:?}", value))
            })?;
        if rest
            .iter()
            .any(|&b| b != b';' && !b.is_ascii_whitespace())
        {
            return Err(Error::new(format!("Invalid content type: {:?}", value))
                .set_details(format!(
                    "Unexpected text after parameters: {:?}",
                    String::from_utf8_lossy(rest.trim())
                ))
                .set_kind(ErrorKind::Parse));
        }
        let mut ret = Self::new(
            &String::from_utf8_lossy(primary),
            &String::from_utf8_lossy(sub),
        );
        for (name, value) in params {
            ret.set_parameter(
                &String::from_utf8_lossy(name),
                String::from_utf8_lossy(&value),
            );
        }
        Ok(ret)
    }

    #[inline]
    pub fn primary_type(&self) -> &str {
        &self.primary
    }

    #[inline]
    pub fn sub_type(&self) -> &str {
        &self.sub
    }

    /// `type/subtype` without parameters.
    pub fn base_type(&self) -> String {
        format!("{}/{}", self.primary, self.sub)
    }

    /// Case insensitive parameter lookup.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.params
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn set_parameter<V: Into<String>>(&mut self, name: &str, value: V) {
        self.params
            .insert(name.trim().to_ascii_lowercase(), value.into());
    }

    pub fn remove_parameter(&mut self, name: &str) -> Option<String> {
        self.params.shift_remove(&name.to_ascii_lowercase())
    }

    pub fn parameters(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[inline]
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    /// Match against `type/subtype`, `type/*` or `*/*`, case insensitively.
    /// Parameters of `pattern` are ignored.
    pub fn match_type(&self, pattern: &str) -> bool {
        let pattern = pattern.split(';').next().unwrap_or_default().trim();
        let Some((primary, sub)) = pattern.split_once('/') else {
            return false;
        };
        let (primary, sub) = (primary.trim(), sub.trim());
        (primary == "*" || primary.eq_ignore_ascii_case(&self.primary))
            && (sub == "*" || sub.eq_ignore_ascii_case(&self.sub))
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        self.primary == "text"
    }
}

/* tspecials from RFC2045, plus white space */
fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value.bytes().any(|b| {
            b.is_ascii_whitespace() || b.is_ascii_control() || b"()<>@,;:\\\"/[]?=".contains(&b)
        })
}

impl Display for ContentType {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}/{}", self.primary, self.sub)?;
        for (name, value) in &self.params {
            if needs_quotes(value) {
                write!(
                    f,
                    "; {}=\"{}\"",
                    name,
                    value.replace('\\', "\\\\").replace('"', "\\\"")
                )?;
            } else {
                write!(f, "; {}={}", name, value)?;
            }
        }
        Ok(())
    }
}

impl FromStr for ContentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_parse() {
        let ct = ContentType::parse("Text/PLAIN; Charset=\"ISO-8859-1\"; format=flowed;").unwrap();
        assert_eq!(ct.primary_type(), "text");
        assert_eq!(ct.sub_type(), "plain");
        assert_eq!(ct.base_type(), "text/plain");
        assert_eq!(ct.charset(), Some("ISO-8859-1"));
        assert_eq!(ct.parameter("FORMAT"), Some("flowed"));
        assert_eq!(ct.parameter("delsp"), None);
        assert!(ct.is_text());
        assert_eq!(ct.to_string(), "text/plain; charset=ISO-8859-1; format=flowed");

        assert_eq!(
            ContentType::parse("text").unwrap_err().kind,
            ErrorKind::Parse
        );
        assert_eq!(
            ContentType::parse("text/plain garbage").unwrap_err().kind,
            ErrorKind::Parse
        );
    }

    #[test]
    fn test_content_type_match() {
        let ct: ContentType = "message/rfc822".parse().unwrap();
        assert!(ct.match_type("message/rfc822"));
        assert!(ct.match_type("MESSAGE/RFC822; foo=bar"));
        assert!(ct.match_type("message/*"));
        assert!(ct.match_type("*/*"));
        assert!(!ct.match_type("text/*"));
        assert!(!ct.match_type("message"));
    }

    #[test]
    fn test_content_type_display_quotes() {
        let mut ct = ContentType::new("application", "octet-stream");
        ct.set_parameter("name", "my file \"1\".bin");
        ct.set_parameter("size", "12");
        assert_eq!(
            ct.to_string(),
            "application/octet-stream; name=\"my file \\\"1\\\".bin\"; size=12"
        );
        let reparsed = ContentType::parse(&ct.to_string()).unwrap();
        assert_eq!(reparsed, ct);
        assert_eq!(ct.remove_parameter("NAME").as_deref(), Some("my file \"1\".bin"));
        assert_eq!(ct.parameters().collect::<Vec<_>>(), vec![("size", "12")]);
        assert_eq!(
            ContentType::default().to_string(),
            "text/plain; charset=us-ascii"
        );
    }
}
