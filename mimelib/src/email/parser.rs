/*
 * meli - mimelib parser module
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

//! Parsers for email. See submodules.
#![allow(clippy::type_complexity)]

use std::{borrow::Cow, convert::TryFrom};

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_until, take_while1},
    character::is_hex_digit,
    combinator::map,
    error::ErrorKind,
    multi::{fold_many0, many0},
    number::complete::le_u8,
};

use crate::{
    email::headers::HeaderName,
    error::{self, Error, Result, ResultIntoError},
};

macro_rules! to_str {
    ($l:expr) => {{
        String::from_utf8_lossy($l)
    }};
}

#[derive(Eq, PartialEq)]
pub struct ParsingError<I> {
    pub input: I,
    pub error: Cow<'static, str>,
}

impl std::fmt::Debug for ParsingError<&'_ [u8]> {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.debug_struct("ParsingError")
            .field("input", &to_str!(self.input))
            .field("error", &self.error)
            .finish()
    }
}

pub type IResult<I, O, E = ParsingError<I>> = std::result::Result<(I, O), nom::Err<E>>;

impl<I> From<(I, &'static str)> for ParsingError<I> {
    fn from((input, error): (I, &'static str)) -> Self {
        Self {
            input,
            error: error.into(),
        }
    }
}

impl<I> From<(I, String)> for ParsingError<I> {
    fn from((input, error): (I, String)) -> Self {
        Self {
            input,
            error: error.into(),
        }
    }
}

impl<I> nom::error::ParseError<I> for ParsingError<I> {
    fn from_error_kind(input: I, kind: ErrorKind) -> Self {
        Self {
            input,
            error: kind.description().to_string().into(),
        }
    }

    fn append(input: I, kind: ErrorKind, other: Self) -> Self {
        Self {
            input,
            error: format!("{}, {}", kind.description(), other.error).into(),
        }
    }
}

impl<'i> From<ParsingError<&'i [u8]>> for Error {
    fn from(val: ParsingError<&'i [u8]>) -> Self {
        Self::new("Parsing error")
            .set_details(format!(
                r#"In input: "{}...",
Error: {}"#,
                to_str!(val.input).chars().take(30).collect::<String>(),
                val.error
            ))
            .set_kind(error::ErrorKind::Parse)
    }
}

impl<'i> From<nom::Err<ParsingError<&'i [u8]>>> for Error {
    fn from(val: nom::Err<ParsingError<&'i [u8]>>) -> Self {
        match val {
            nom::Err::Incomplete(_) => {
                Self::new("Parsing Error: Incomplete").set_kind(error::ErrorKind::Parse)
            }
            nom::Err::Error(err) | nom::Err::Failure(err) => err.into(),
        }
    }
}

macro_rules! is_ctl_or_space {
    ($var:expr) => {
        /* <any ASCII control character and DEL> */
        $var < 33 || $var == 127
    };
}

macro_rules! is_whitespace {
    ($var:expr) => {
        $var == b' ' || $var == b'\t' || $var == b'\n' || $var == b'\r'
    };
}

pub trait BytesExt {
    fn rtrim(&self) -> &Self;
    fn ltrim(&self) -> &Self;
    fn trim(&self) -> &Self;
}

impl BytesExt for [u8] {
    fn rtrim(&self) -> &Self {
        if let Some(last) = self.iter().rposition(|b| !is_whitespace!(*b)) {
            &self[..=last]
        } else {
            &[]
        }
    }
    fn ltrim(&self) -> &Self {
        if let Some(first) = self.iter().position(|b| !is_whitespace!(*b)) {
            &self[first..]
        } else {
            &[]
        }
    }
    fn trim(&self) -> &[u8] {
        self.rtrim().ltrim()
    }
}

/// Split a raw message into its header fields and its body.
///
/// The body starts after the first empty line. A message without an empty
/// line has no body.
pub fn mail(input: &[u8]) -> Result<(Vec<(HeaderName, &[u8])>, &[u8])> {
    let (rest, fields) =
        headers::headers(input).chain_err_summary(|| "Could not parse mail headers")?;

    let body = if let Some(body) = rest.strip_prefix(b"\r\n") {
        body
    } else if let Some(body) = rest.strip_prefix(b"\n") {
        body
    } else if rest.is_empty() {
        rest
    } else {
        return Err(Error::new("Could not parse mail headers")
            .set_details(format!(
                "Expected a header field or an empty line, found: \"{}...\"",
                to_str!(rest).chars().take(30).collect::<String>()
            ))
            .set_kind(error::ErrorKind::Parse));
    };

    Ok((fields, body))
}

/// Remove folding line breaks from a header value.
pub fn unfold(value: &[u8]) -> Cow<'_, [u8]> {
    if !value.contains(&b'\n') {
        return Cow::Borrowed(value);
    }
    let mut ret = Vec::with_capacity(value.len());
    let mut i = 0;
    while i < value.len() {
        if value[i..].starts_with(b"\r\n") {
            i += 2;
        } else if value[i] == b'\n' {
            i += 1;
        } else {
            ret.push(value[i]);
            i += 1;
        }
    }
    Cow::Owned(ret)
}

pub mod headers {
    //! Email headers.
    use super::*;

    pub fn headers(input: &[u8]) -> IResult<&[u8], Vec<(HeaderName, &[u8])>> {
        many0(header)(input)
    }

    /// Parse a single header as a ([`HeaderName`], `&[u8]`) tuple. The value
    /// keeps its folding line breaks.
    pub fn header(input: &[u8]) -> IResult<&[u8], (HeaderName, &[u8])> {
        if input.is_empty() {
            return Err(nom::Err::Error((input, "header(): empty input").into()));
        } else if input.starts_with(b"\n") || input.starts_with(b"\r\n") {
            return Err(nom::Err::Error(
                (input, "header(): field name starts with new line").into(),
            ));
        }
        /* field-name  =  1*<any CHAR, excluding CTLs, SPACE, and ":"> */
        let Some(colon) = input
            .iter()
            .position(|&b| b == b':' || is_ctl_or_space!(b))
        else {
            return Err(nom::Err::Error(
                (input, "header(): expected ':' after field name").into(),
            ));
        };
        if input[colon] != b':' {
            return Err(nom::Err::Error(
                (
                    &input[colon..],
                    format!(
                        "header(): invalid character in field name: {:?}",
                        input[colon] as char
                    ),
                )
                    .into(),
            ));
        }
        let Ok(name) = HeaderName::try_from(&input[..colon]) else {
            return Err(nom::Err::Error(
                (input, "header(): invalid header name").into(),
            ));
        };
        let mut ptr = colon + 1;
        while ptr < input.len() && (input[ptr] == b' ' || input[ptr] == b'\t') {
            ptr += 1;
        }
        header_value(&input[ptr..]).map(|(rest, value)| (rest, (name, value)))
    }

    /* A header can span multiple lines, eg:
     *
     * Received: from -------------------- (-------------------------)
     * 	by --------------------- (--------------------- [------------------])
     * (-----------------------) 	with ESMTP id ------------ for
     * <------------------->; 	Tue,  5 Jan 2016 21:30:44 +0100 (CET)
     */
    pub fn header_value(input: &[u8]) -> IResult<&[u8], &[u8]> {
        let input_len = input.len();
        for (i, x) in input.iter().enumerate() {
            if *x == b'\n'
                && (((i + 1) < input_len && input[i + 1] != b' ' && input[i + 1] != b'\t')
                    || i + 1 == input_len)
            {
                let value = &input[..i];
                let value = value.strip_suffix(b"\r").unwrap_or(value);
                return Ok((&input[(i + 1)..], value));
            }
        }
        // Last field of a block that is not terminated by a line break.
        Ok((&input[input_len..], input.strip_suffix(b"\r").unwrap_or(input)))
    }
}

pub mod content_type {
    //! `Content-Type` header values.
    use super::*;

    /* token := 1*<any (US-ASCII) CHAR except SPACE, CTLs, or tspecials> */
    fn is_token_char(c: u8) -> bool {
        !is_ctl_or_space!(c) && c < 128 && !br#"()<>@,;:\"/[]?="#.contains(&c)
    }

    fn quoted_value(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
        let (mut input, _) = tag("\"")(input)?;
        let mut ret = Vec::with_capacity(input.len());
        loop {
            match input.first() {
                None => {
                    return Err(nom::Err::Error(
                        (input, "quoted_value(): unterminated quoted string").into(),
                    ))
                }
                Some(b'"') => return Ok((&input[1..], ret)),
                Some(b'\\') if input.len() > 1 => {
                    ret.push(input[1]);
                    input = &input[2..];
                }
                Some(c) => {
                    ret.push(*c);
                    input = &input[1..];
                }
            }
        }
    }

    /* Caution: values may contain encoded words or raw 8bit text */
    pub fn content_type_parameter(input: &[u8]) -> IResult<&[u8], (&[u8], Vec<u8>)> {
        let (input, _) = tag(";")(input.ltrim())?;
        let (input, name) = take_while1(is_token_char)(input.ltrim())?;
        let (input, _) = tag("=")(input.ltrim())?;
        let (input, value) = alt((
            quoted_value,
            map(is_not(";\" \t\r\n"), |v: &[u8]| v.to_vec()),
        ))(input.ltrim())?;

        Ok((input, (name, value)))
    }

    pub fn content_type(input: &[u8]) -> IResult<&[u8], (&[u8], &[u8], Vec<(&[u8], Vec<u8>)>)> {
        let (input, _type) = take_while1(is_token_char)(input.ltrim())?;
        let (input, _) = tag("/")(input.ltrim())?;
        let (input, _subtype) = take_while1(is_token_char)(input.ltrim())?;
        let (input, parameters) = many0(content_type_parameter)(input)?;
        Ok((input, (_type, _subtype, parameters)))
    }
}

pub mod encodings {
    //! Email encodings (quoted printable, `MIME` encoded words).
    use data_encoding::{BASE64_MIME, BASE64_NOPAD};

    use super::*;

    fn hex_value(c: u8) -> u8 {
        match c {
            b'0'..=b'9' => c - b'0',
            b'A'..=b'F' => c - b'A' + 10,
            _ => c - b'a' + 10,
        }
    }

    pub fn quoted_printable_byte(input: &[u8]) -> IResult<&[u8], u8> {
        if input.len() < 3 {
            Err(nom::Err::Error(
                (
                    input,
                    "quoted_printable_byte(): input too short to be quoted_printable",
                )
                    .into(),
            ))
        } else if input[0] == b'=' && is_hex_digit(input[1]) && is_hex_digit(input[2]) {
            Ok((&input[3..], hex_value(input[1]) * 16 + hex_value(input[2])))
        } else {
            Err(nom::Err::Error(
                (input, "quoted_printable_byte(): invalid input").into(),
            ))
        }
    }

    fn quoted_printable_soft_break(input: &[u8]) -> IResult<&[u8], ()> {
        let (rest, _) = alt((tag("=\r\n"), tag("=\n")))(input)?;
        Ok((rest, ()))
    }

    fn qp_underscore_header(input: &[u8]) -> IResult<&[u8], u8> {
        let (rest, _) = tag(b"_")(input)?;
        Ok((rest, 0x20))
    }

    // With MIME, headers in quoted printable format can contain underscores that
    // represent spaces. In non-header context, an underscore is just a plain
    // underscore.
    pub fn quoted_printable_bytes_header(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
        many0(alt((quoted_printable_byte, qp_underscore_header, le_u8)))(input)
    }

    /// Decode a quoted-printable body. Soft line breaks are removed, hard line
    /// breaks are kept as they are.
    pub fn quoted_printable_bytes(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
        fold_many0(
            alt((
                map(quoted_printable_soft_break, |()| None),
                map(quoted_printable_byte, Some),
                map(le_u8, Some),
            )),
            Vec::new,
            |mut acc, byte| {
                if let Some(byte) = byte {
                    acc.push(byte);
                }
                acc
            },
        )(input)
    }

    /* Encoded words
     *"=?charset?encoding?encoded text?=".
     */
    /// Returns the charset label, the upper case encoding letter and the
    /// decoded bytes, still in the word's charset.
    pub fn encoded_word(input: &[u8]) -> IResult<&[u8], (&[u8], u8, Vec<u8>)> {
        let (input, _) = tag("=?")(input)?;
        let (input, charset) = take_while1(|c: u8| c != b'?' && !is_ctl_or_space!(c))(input)?;
        let (input, encoding) = alt((tag("?B?"), tag("?b?"), tag("?Q?"), tag("?q?")))(input)?;
        let (input, text) = take_until("?=")(input)?;
        let (input, _) = tag("?=")(input)?;
        if text.iter().any(|&c| is_ctl_or_space!(c)) {
            return Err(nom::Err::Error(
                (text, "encoded_word(): encoded text contains white space").into(),
            ));
        }
        let encoding = encoding[1].to_ascii_uppercase();
        let decoded = if encoding == b'B' {
            match BASE64_MIME.decode(text) {
                Ok(v) => v,
                Err(_) => {
                    let unpadded = text
                        .iter()
                        .rposition(|&c| c != b'=')
                        .map_or(&text[..0], |last| &text[..=last]);
                    BASE64_NOPAD.decode(unpadded).map_err(|_| {
                        nom::Err::Error((text, "encoded_word(): invalid base64").into())
                    })?
                }
            }
        } else {
            match quoted_printable_bytes_header(text) {
                Ok((rest, v)) if rest.is_empty() => v,
                _ => {
                    return Err(nom::Err::Error(
                        (text, "encoded_word(): invalid quoted_printable").into(),
                    ))
                }
            }
        };
        // RFC 2231 language suffix, eg. "=?US-ASCII*EN?Q?Keith_Moore?="
        let charset = charset
            .split(|&c| c == b'*')
            .next()
            .unwrap_or(charset);
        Ok((input, (charset, encoding, decoded)))
    }
}
