/*
 * meli - mimelib encodings module
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

//! Charset resolution and `RFC2047` encoded words.
//!
//! ```rust
//! use mimelib::email::encodings::{decode_text, encode_text};
//!
//! let encoded = encode_text("Keld Jørn Simonsen", "utf-8", None).unwrap();
//! assert_eq!(encoded, "=?UTF-8?Q?Keld_J=C3=B8rn_Simonsen?=");
//! assert_eq!(decode_text(&encoded).unwrap(), "Keld Jørn Simonsen");
//! ```

use data_encoding::BASE64;
use encoding_rs::{Encoding, REPLACEMENT, UTF_16BE, UTF_16LE};

use super::parser::{self, BytesExt};
use crate::error::{Error, ErrorKind, Result};

/// Maximum length of a single encoded word, delimiters included.
pub const ENCODED_WORD_MAX_LEN: usize = 75;

/* Labels that WHATWG maps to windows-1252 but that mail software means as
 * strict 7bit ASCII. */
const ASCII_LABELS: &[&str] = &[
    "us-ascii",
    "ascii",
    "ansi_x3.4-1968",
    "ansi_x3.4-1986",
    "iso-ir-6",
    "iso_646.irv:1991",
    "iso646-us",
    "us",
    "646",
    "ibm367",
    "cp367",
    "csascii",
];

/// A resolved character set.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Charset {
    #[default]
    Ascii,
    Encoding(&'static Encoding),
}

impl Charset {
    pub const UTF8: Self = Self::Encoding(encoding_rs::UTF_8);

    /// Map a charset label as found in `Content-Type` parameters and encoded
    /// words to a [`Charset`].
    pub fn resolve(label: &str) -> Result<Self> {
        let trimmed = label.trim().trim_matches('"').trim();
        if ASCII_LABELS
            .iter()
            .any(|ascii| ascii.eq_ignore_ascii_case(trimmed))
        {
            return Ok(Self::Ascii);
        }
        match Encoding::for_label_no_replacement(trimmed.as_bytes()) {
            Some(encoding) => Ok(Self::Encoding(encoding)),
            None => Err(Error::new(format!("Unsupported charset: {}", label))
                .set_details("The charset label is not a known encoding.")
                .set_kind(ErrorKind::UnsupportedEncoding)),
        }
    }

    /// Canonical name, suitable for `charset=` parameters and encoded words.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ascii => "US-ASCII",
            Self::Encoding(encoding) => encoding.name(),
        }
    }

    /// Decode bytes. Malformed sequences are replaced with U+FFFD.
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Self::Ascii => {
                if bytes.is_ascii() {
                    String::from_utf8_lossy(bytes).into_owned()
                } else {
                    log::debug!("Replacing non-ASCII bytes in US-ASCII text.");
                    bytes
                        .iter()
                        .map(|&b| if b.is_ascii() { b as char } else { '\u{FFFD}' })
                        .collect()
                }
            }
            Self::Encoding(encoding) => {
                let (decoded, had_errors) = encoding.decode_without_bom_handling(bytes);
                if had_errors {
                    log::debug!(
                        "Replaced malformed byte sequences while decoding {}.",
                        encoding.name()
                    );
                }
                decoded.into_owned()
            }
        }
    }

    /// Encode text. Fails if a character has no representation in this
    /// charset.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        let unmappable = || {
            Error::new(format!(
                "Text contains characters that cannot be encoded as {}",
                self.name()
            ))
            .set_kind(ErrorKind::UnsupportedEncoding)
        };
        match *self {
            Self::Ascii if text.is_ascii() => Ok(text.as_bytes().to_vec()),
            Self::Ascii => Err(unmappable()),
            Self::Encoding(encoding) if encoding == UTF_16BE => {
                Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect())
            }
            Self::Encoding(encoding) if encoding == UTF_16LE => {
                Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect())
            }
            Self::Encoding(encoding) if encoding == REPLACEMENT => Err(unmappable()),
            Self::Encoding(encoding) => {
                let (bytes, used, had_errors) = encoding.encode(text);
                if had_errors || used != encoding {
                    Err(unmappable())
                } else {
                    Ok(bytes.into_owned())
                }
            }
        }
    }
}

impl std::fmt::Display for Charset {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "{}", self.name())
    }
}

/// Encoding of an encoded word's text.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum WordEncoding {
    /// Base64.
    B,
    /// Quoted printable, with `_` for space.
    Q,
}

/// Decode exactly one encoded word, eg. `=?utf-8?Q?caf=C3=A9?=`.
pub fn decode_word(word: &str) -> Result<String> {
    let (rest, (charset, _, bytes)) = parser::encodings::encoded_word(word.trim().as_bytes())
        .map_err(|err| Error::from(err).set_summary(format!("Invalid encoded word: {}", word)))?;
    if !rest.is_empty() {
        return Err(Error::new(format!("Invalid encoded word: {}", word))
            .set_details("Trailing characters after the encoded word.")
            .set_kind(ErrorKind::Parse));
    }
    let charset = Charset::resolve(&String::from_utf8_lossy(charset))?;
    Ok(charset.decode(&bytes))
}

/// Decode all encoded words in a header text.
///
/// White space between two adjacent encoded words is dropped, other text is
/// kept as is. Words that look like encoded words but do not parse are kept
/// verbatim; an unknown charset is an error.
pub fn decode_text(text: &str) -> Result<String> {
    if !text.contains("=?") {
        return Ok(text.to_string());
    }
    let mut ret = String::with_capacity(text.len());
    let mut previous_was_encoded = false;
    let mut rest = text;
    while !rest.is_empty() {
        let ws_len = rest
            .find(|c: char| !c.is_ascii_whitespace())
            .unwrap_or(rest.len());
        let (ws, tail) = rest.split_at(ws_len);
        if tail.is_empty() {
            ret.push_str(ws);
            break;
        }
        let word_len = tail
            .find(|c: char| c.is_ascii_whitespace())
            .unwrap_or(tail.len());
        let (word, tail) = tail.split_at(word_len);
        rest = tail;

        if word.starts_with("=?") && word.ends_with("?=") {
            match decode_word(word) {
                Ok(decoded) => {
                    if !previous_was_encoded {
                        ret.push_str(ws);
                    }
                    ret.push_str(&decoded);
                    previous_was_encoded = true;
                    continue;
                }
                Err(err) if err.kind == ErrorKind::UnsupportedEncoding => return Err(err),
                Err(err) => {
                    log::trace!("Keeping malformed encoded word {:?}: {}", word, err.summary);
                }
            }
        }
        ret.push_str(ws);
        ret.push_str(word);
        previous_was_encoded = false;
    }
    Ok(ret)
}

fn needs_encoding(text: &str) -> bool {
    text.bytes()
        .any(|b| !b.is_ascii() || (b.is_ascii_control() && b != b'\t'))
        || text.contains("=?")
}

/* RFC2047 5.(3): characters allowed verbatim in a 'Q'-encoded word inside a
 * phrase. */
fn is_q_safe(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!*+-/".contains(&b)
}

fn q_encoded_len(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .map(|&b| if b == b' ' || is_q_safe(b) { 1 } else { 3 })
        .sum()
}

fn q_encode(bytes: &[u8], out: &mut String) {
    const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";

    for &b in bytes {
        if b == b' ' {
            out.push('_');
        } else if is_q_safe(b) {
            out.push(b as char);
        } else {
            out.push('=');
            out.push(HEX_CHARS[(b >> 4) as usize] as char);
            out.push(HEX_CHARS[(b & 0x0f) as usize] as char);
        }
    }
}

/// Encode `text` as one or more encoded words in `charset`.
///
/// Text that needs no encoding is returned unchanged. When `encoding` is
/// `None`, `Q` is used for mostly ASCII text and `B` otherwise. Words never
/// exceed [`ENCODED_WORD_MAX_LEN`] and never split a character; multiple
/// words are separated by a space.
pub fn encode_text(text: &str, charset: &str, encoding: Option<WordEncoding>) -> Result<String> {
    if !needs_encoding(text) {
        return Ok(text.to_string());
    }
    let resolved = Charset::resolve(charset)?;
    let encoding = encoding.unwrap_or_else(|| {
        let non_ascii = text.chars().filter(|c| !c.is_ascii()).count();
        if non_ascii * 2 < text.chars().count() {
            WordEncoding::Q
        } else {
            WordEncoding::B
        }
    });
    let prefix = format!(
        "=?{}?{}?",
        resolved.name(),
        match encoding {
            WordEncoding::B => 'B',
            WordEncoding::Q => 'Q',
        }
    );
    let budget = ENCODED_WORD_MAX_LEN.saturating_sub(prefix.len() + 2);
    let encoded_len = |bytes: &[u8]| match encoding {
        WordEncoding::B => (bytes.len() + 2) / 3 * 4,
        WordEncoding::Q => q_encoded_len(bytes),
    };

    let mut chunks: Vec<Vec<u8>> = vec![];
    let mut start = 0;
    let mut current: Vec<u8> = vec![];
    for (idx, c) in text.char_indices() {
        let end = idx + c.len_utf8();
        let candidate = resolved.encode(&text[start..end])?;
        if encoded_len(&candidate) > budget && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            start = idx;
            current = resolved.encode(&text[start..end])?;
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    let mut ret = String::with_capacity(chunks.len() * ENCODED_WORD_MAX_LEN);
    for chunk in chunks {
        if !ret.is_empty() {
            ret.push(' ');
        }
        ret.push_str(&prefix);
        match encoding {
            WordEncoding::B => ret.push_str(&BASE64.encode(&chunk)),
            WordEncoding::Q => q_encode(&chunk, &mut ret),
        }
        ret.push_str("?=");
    }
    Ok(ret)
}

/// Decode a header value's bytes: raw 8bit text is read as UTF-8, encoded
/// words are decoded.
pub fn decode_header_value(value: &[u8]) -> Result<String> {
    let unfolded = parser::unfold(value);
    decode_text(&String::from_utf8_lossy(unfolded.trim()))
}
