/*
 * meli - mimelib transfer encoding module
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

//! `Content-Transfer-Encoding` of message bodies.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use base64::{
    alphabet,
    engine::{general_purpose, DecodePaddingMode, GeneralPurpose},
    Engine,
};

use crate::{
    email::parser::{self, BytesExt},
    error::{Error, ErrorKind, Result},
};

/// Base64 as found in the wild: padding is optional when decoding.
const MIME_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    general_purpose::PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Maximum encoded line length, not counting the line break.
const MAX_LINE_LEN: usize = 76;

/// Longest line a `7bit` body may have.
const MAX_7BIT_LINE_LEN: usize = 998;

#[allow(non_camel_case_types)]
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum ContentTransferEncoding {
    #[default]
    _7Bit,
    _8Bit,
    Binary,
    Base64,
    QuotedPrintable,
    Other {
        tag: String,
    },
}

impl ContentTransferEncoding {
    /// The mildest encoding that can carry `body` unchanged through a mail
    /// transport: `7bit` for short ASCII lines, quoted-printable for mostly
    /// ASCII text and base64 otherwise.
    pub fn for_body(body: &[u8]) -> Self {
        let long_lines = body
            .split(|&b| b == b'\n')
            .any(|line| line.len() > MAX_7BIT_LINE_LEN);
        let non_ascii = body
            .iter()
            .filter(|&&b| !b.is_ascii() || (b.is_ascii_control() && !b"\r\n\t".contains(&b)))
            .count();
        if non_ascii == 0 && !long_lines {
            Self::_7Bit
        } else if non_ascii * 3 <= body.len() {
            Self::QuotedPrintable
        } else {
            Self::Base64
        }
    }

    /// Like [`ContentTransferEncoding::for_body`], for bodies whose bytes
    /// must come back exactly: base64 as soon as `body` has a control byte
    /// or a line break that is not `CRLF`, since quoted-printable
    /// normalises line breaks.
    pub fn for_binary_body(body: &[u8]) -> Self {
        let mut prev = None;
        let mut iter = body.iter().peekable();
        while let Some(&b) = iter.next() {
            let bare_line_break = match b {
                b'\r' => iter.peek() != Some(&&b'\n'),
                b'\n' => prev != Some(b'\r'),
                _ => false,
            };
            if bare_line_break || (b.is_ascii_control() && !b"\r\n\t".contains(&b)) {
                return Self::Base64;
            }
            prev = Some(b);
        }
        Self::for_body(body)
    }

    /// Identity encodings leave the body as it is.
    pub const fn is_identity(&self) -> bool {
        matches!(self, Self::_7Bit | Self::_8Bit | Self::Binary)
    }
}

impl Display for ContentTransferEncoding {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::_7Bit => write!(f, "7bit"),
            Self::_8Bit => write!(f, "8bit"),
            Self::Binary => write!(f, "binary"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Other { ref tag } => write!(f, "{}", tag),
        }
    }
}

impl From<&[u8]> for ContentTransferEncoding {
    fn from(val: &[u8]) -> Self {
        let val = val.trim();
        if val.eq_ignore_ascii_case(b"base64") {
            Self::Base64
        } else if val.eq_ignore_ascii_case(b"7bit") {
            Self::_7Bit
        } else if val.eq_ignore_ascii_case(b"8bit") {
            Self::_8Bit
        } else if val.eq_ignore_ascii_case(b"binary") {
            Self::Binary
        } else if val.eq_ignore_ascii_case(b"quoted-printable") {
            Self::QuotedPrintable
        } else {
            Self::Other {
                tag: String::from_utf8_lossy(val).to_ascii_lowercase(),
            }
        }
    }
}

impl From<&str> for ContentTransferEncoding {
    fn from(val: &str) -> Self {
        Self::from(val.as_bytes())
    }
}

impl FromStr for ContentTransferEncoding {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

/// Undoes and applies a `Content-Transfer-Encoding`.
pub trait TransferCodec: Send + Sync + std::fmt::Debug {
    fn decode(&self, encoding: &ContentTransferEncoding, body: &[u8]) -> Result<Vec<u8>>;
    fn encode(&self, encoding: &ContentTransferEncoding, body: &[u8]) -> Result<Vec<u8>>;
}

/// Handles `7bit`, `8bit`, `binary`, `base64` and `quoted-printable`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultTransferCodec;

fn unsupported(encoding: &ContentTransferEncoding) -> Error {
    Error::new(format!(
        "Unsupported Content-Transfer-Encoding: {}",
        encoding
    ))
    .set_kind(ErrorKind::UnsupportedEncoding)
}

impl TransferCodec for DefaultTransferCodec {
    fn decode(&self, encoding: &ContentTransferEncoding, body: &[u8]) -> Result<Vec<u8>> {
        match encoding {
            e if e.is_identity() => Ok(body.to_vec()),
            ContentTransferEncoding::Base64 => {
                let stripped = body
                    .iter()
                    .copied()
                    .filter(|b| !b.is_ascii_whitespace())
                    .collect::<Vec<u8>>();
                MIME_BASE64.decode(stripped).map_err(|err| {
                    Error::from(err).set_summary("Could not decode base64 body")
                })
            }
            ContentTransferEncoding::QuotedPrintable => {
                let (_, bytes) = parser::encodings::quoted_printable_bytes(body)?;
                Ok(bytes)
            }
            other => Err(unsupported(other)),
        }
    }

    fn encode(&self, encoding: &ContentTransferEncoding, body: &[u8]) -> Result<Vec<u8>> {
        match encoding {
            e if e.is_identity() => Ok(body.to_vec()),
            ContentTransferEncoding::Base64 => Ok(base64_encode(body)),
            ContentTransferEncoding::QuotedPrintable => Ok(qp_encode(body)),
            other => Err(unsupported(other)),
        }
    }
}

fn base64_encode(body: &[u8]) -> Vec<u8> {
    let encoded = general_purpose::STANDARD.encode(body);
    let mut ret = Vec::with_capacity(encoded.len() + 2 * (encoded.len() / MAX_LINE_LEN + 1));
    for line in encoded.as_bytes().chunks(MAX_LINE_LEN) {
        ret.extend_from_slice(line);
        ret.extend_from_slice(b"\r\n");
    }
    ret
}

/// Quoted-printable with CRLF hard breaks and `=` soft breaks, no line
/// longer than [`MAX_LINE_LEN`].
fn qp_encode(body: &[u8]) -> Vec<u8> {
    const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";

    let mut ret = Vec::with_capacity(body.len() + body.len() / 2);
    let mut lines = body.split(|&b| b == b'\n').peekable();
    while let Some(line) = lines.next() {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let mut column = 0;
        for (i, &b) in line.iter().enumerate() {
            let last = i + 1 == line.len();
            // Trailing white space is encoded so that transports cannot strip it.
            let passthru = matches!(b, b'!'..=b'<' | b'>'..=b'~')
                || (matches!(b, b' ' | b'\t') && !last);
            let width = if passthru { 1 } else { 3 };
            if column + width > MAX_LINE_LEN - 1 {
                ret.extend_from_slice(b"=\r\n");
                column = 0;
            }
            if passthru {
                ret.push(b);
            } else {
                ret.push(b'=');
                ret.push(HEX_CHARS[(b >> 4) as usize]);
                ret.push(HEX_CHARS[(b & 0x0f) as usize]);
            }
            column += width;
        }
        if lines.peek().is_some() {
            ret.extend_from_slice(b"\r\n");
        }
    }
    ret
}
