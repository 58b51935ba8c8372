/*
 * meli - mimelib address module
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

//! `RFC822` addresses.
//!
//! ```text
//! >           address
//! >         ┌────┴────────┐
//! > Name <address@domain.tld>
//! > └─┬┘
//! > personal
//! ```
//!
//! A group (`phrase ":" [#mailbox] ";"`) is kept as a single
//! [`InternetAddress`] whose address is the whole group text; see
//! [`InternetAddress::is_group`] and [`InternetAddress::get_group`].
//!
//! ```rust
//! use mimelib::email::address::{InternetAddress, Strictness};
//!
//! let list = InternetAddress::parse_list(
//!     "Jörg <joerg@example.com>, \"Doe, Jane\" <jane@example.com>",
//!     Strictness::Strict,
//! )
//! .unwrap();
//! assert_eq!(list[1].personal(), Some("Doe, Jane"));
//! assert_eq!(list[1].to_string(), "\"Doe, Jane\" <jane@example.com>");
//! assert_eq!(list[0].to_unicode_string(), "Jörg <joerg@example.com>");
//! ```

pub mod lexer;
pub mod parser;

use std::{
    borrow::Cow,
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
    sync::{Arc, OnceLock},
};

use self::{lexer::SPECIALS, parser::AddressParser};
use crate::{
    conf::{MimeSettings, DEFAULT_FOLD_COLUMN},
    email::encodings::{decode_text, encode_text},
    error::{Error, ErrorKind, Result},
};

/// How much of the `RFC822` grammar is enforced, loosest first.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Strictness {
    /// Incoming mail: unterminated quotes, comments, route-addrs and groups
    /// are closed at the end of the input.
    #[default]
    ParseHeader,
    /// Structural checks only. Simple addresses separated by white space are
    /// split.
    NonStrict,
    /// The full grammar, an address must have a domain.
    Strict,
}

impl Strictness {
    const fn or_strict(strict: bool, otherwise: Self) -> Self {
        if strict {
            Self::Strict
        } else {
            otherwise
        }
    }
}

impl fmt::Display for Strictness {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ParseHeader => write!(fmt, "parse-header"),
            Self::NonStrict => write!(fmt, "non-strict"),
            Self::Strict => write!(fmt, "strict"),
        }
    }
}

/// The grammar rule an address failed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SyntaxErrorKind {
    UnexpectedToken,
    UnterminatedQuote,
    UnterminatedComment,
    UnterminatedDomainLiteral,
    UnterminatedRoute,
    UnterminatedGroup,
    NestedGroup,
    EmptyAddress,
    MissingDomain,
    MultipleAddresses,
    InvalidCharacter,
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            Self::UnexpectedToken => "unexpected token",
            Self::UnterminatedQuote => "unterminated quoted string",
            Self::UnterminatedComment => "unterminated comment",
            Self::UnterminatedDomainLiteral => "unterminated domain literal",
            Self::UnterminatedRoute => "missing '>'",
            Self::UnterminatedGroup => "missing ';' at end of group",
            Self::NestedGroup => "nested group",
            Self::EmptyAddress => "empty address",
            Self::MissingDomain => "missing domain",
            Self::MultipleAddresses => "more than one address",
            Self::InvalidCharacter => "invalid character",
        };
        write!(fmt, "{}", msg)
    }
}

/// A syntax error, with the text that was being parsed and the byte offset
/// the error was detected at.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AddressError {
    pub reason: SyntaxErrorKind,
    pub strictness: Strictness,
    pub input: String,
    pub position: usize,
}

impl AddressError {
    pub fn new(
        reason: SyntaxErrorKind,
        strictness: Strictness,
        input: &str,
        position: usize,
    ) -> Self {
        Self {
            reason,
            strictness,
            input: input.to_string(),
            position,
        }
    }
}

impl fmt::Display for AddressError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "{} at position {} in {:?}",
            self.reason, self.position, self.input
        )
    }
}

impl std::error::Error for AddressError {}

impl From<AddressError> for Error {
    fn from(err: AddressError) -> Self {
        Self::new("Invalid address")
            .set_details(err.to_string())
            .set_kind(ErrorKind::AddressSyntax {
                reason: err.reason,
                strictness: err.strictness,
            })
            .set_source(Some(Arc::new(err)))
    }
}

/// Display name of an address. Only one form is authoritative, the other is
/// derived on first use and cached until the personal is replaced.
#[derive(Clone, Debug, Default)]
enum Personal {
    #[default]
    Absent,
    Decoded {
        name: String,
        charset: Option<String>,
        encoded: OnceLock<Option<String>>,
    },
    Encoded {
        raw: String,
        decoded: OnceLock<String>,
        /// `raw` as encoded words, when `raw` is not plain ASCII.
        ascii: OnceLock<Option<String>>,
    },
}

impl Personal {
    fn encoded(raw: &str) -> Self {
        Self::Encoded {
            raw: raw.to_string(),
            decoded: OnceLock::new(),
            ascii: OnceLock::new(),
        }
    }
}

/// An `RFC822` address with an optional display name.
///
/// Equality, hashing and ordering only look at the address, compared case
/// insensitively.
#[derive(Clone, Debug, Default)]
pub struct InternetAddress {
    address: String,
    personal: Personal,
}

impl InternetAddress {
    /// Parse exactly one address with [`Strictness::Strict`].
    pub fn new(text: &str) -> Result<Self> {
        parse_address(text, Strictness::Strict)
    }

    /// An address with a display name encoded in `charset` (UTF-8 if
    /// `None`). The address itself is not validated.
    pub fn with_personal<A: Into<String>>(
        address: A,
        personal: &str,
        charset: Option<&str>,
    ) -> Result<Self> {
        let mut ret = Self {
            address: address.into(),
            personal: Personal::Absent,
        };
        ret.set_personal(Some(personal), charset)?;
        Ok(ret)
    }

    /// Parse a list with [`Strictness::Strict`] or
    /// [`Strictness::NonStrict`].
    pub fn parse(text: &str, strict: bool) -> Result<Vec<Self>> {
        parse_address_list(text, Strictness::or_strict(strict, Strictness::NonStrict))
    }

    /// Parse a header value with [`Strictness::Strict`] or
    /// [`Strictness::ParseHeader`].
    pub fn parse_header(text: &str, strict: bool) -> Result<Vec<Self>> {
        parse_address_list(text, Strictness::or_strict(strict, Strictness::ParseHeader))
    }

    pub fn parse_list(text: &str, strictness: Strictness) -> Result<Vec<Self>> {
        parse_address_list(text, strictness)
    }

    /// The address of the local user: the configured `from` address, or
    /// `user@host`.
    pub fn local_address(settings: &MimeSettings) -> Option<Self> {
        let text = match settings.from.as_deref() {
            Some(from) => from.to_string(),
            None => settings.user_at_host()?,
        };
        match Self::new(&text) {
            Ok(address) => Some(address),
            Err(err) => {
                log::debug!("Invalid local address {:?}: {}", text, err);
                None
            }
        }
    }

    #[inline]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Replace the address. No validation is performed, see
    /// [`InternetAddress::validate`].
    pub fn set_address<A: Into<String>>(&mut self, address: A) {
        self.address = address.into();
    }

    /// The decoded display name. If decoding the encoded form fails, the
    /// encoded form is returned as is.
    pub fn personal(&self) -> Option<&str> {
        match &self.personal {
            Personal::Absent => None,
            Personal::Decoded { name, .. } => Some(name),
            Personal::Encoded { raw, decoded, .. } => Some(decoded.get_or_init(|| {
                decode_text(raw).unwrap_or_else(|err| {
                    log::debug!("Could not decode personal {:?}: {}", raw, err);
                    raw.clone()
                })
            })),
        }
    }

    /// The `RFC2047` form of the display name. `None` if there is no display
    /// name or it cannot be encoded. A parsed name with raw non-ASCII text is
    /// encoded as UTF-8.
    pub fn encoded_personal(&self) -> Option<&str> {
        match &self.personal {
            Personal::Absent => None,
            Personal::Encoded { raw, .. } if raw.is_ascii() => Some(raw),
            Personal::Encoded { ascii, .. } => ascii
                .get_or_init(|| {
                    let name = self.personal()?;
                    match encode_text(name, "utf-8", None) {
                        Ok(encoded) => Some(encoded),
                        Err(err) => {
                            log::debug!("Could not encode personal {:?}: {}", name, err);
                            None
                        }
                    }
                })
                .as_deref(),
            Personal::Decoded {
                name,
                charset,
                encoded,
            } => encoded
                .get_or_init(|| {
                    match encode_text(name, charset.as_deref().unwrap_or("utf-8"), None) {
                        Ok(encoded) => Some(encoded),
                        Err(err) => {
                            log::debug!("Could not encode personal {:?}: {}", name, err);
                            None
                        }
                    }
                })
                .as_deref(),
        }
    }

    /// Set the display name, encoded in `charset` (UTF-8 if `None`).
    ///
    /// The name is encoded first; if that fails nothing is modified.
    pub fn set_personal(&mut self, name: Option<&str>, charset: Option<&str>) -> Result<()> {
        let Some(name) = name else {
            self.personal = Personal::Absent;
            return Ok(());
        };
        let encoded = encode_text(name, charset.unwrap_or("utf-8"), None)?;
        self.personal = Personal::Decoded {
            name: name.to_string(),
            charset: charset.map(str::to_string),
            encoded: OnceLock::from(Some(encoded)),
        };
        Ok(())
    }

    /// Set the display name from its `RFC2047` form.
    pub fn set_encoded_personal(&mut self, raw: Option<&str>) {
        self.personal = raw.map_or(Personal::Absent, Personal::encoded);
    }

    /// `phrase ":" [#mailbox] ";"`
    pub fn is_group(&self) -> bool {
        is_group_text(&self.address)
    }

    /// The members of a group address, `None` if this is not a group.
    pub fn get_group(&self, strict: bool) -> Result<Option<Vec<Self>>> {
        extract_group_list(
            &self.address,
            Strictness::or_strict(strict, Strictness::NonStrict),
        )
    }

    /// Check the address with [`Strictness::Strict`].
    pub fn validate(&self) -> Result<()> {
        validate(self)
    }

    /// Like `to_string` but with the decoded display name.
    pub fn to_unicode_string(&self) -> String {
        self.render(self.personal())
    }

    fn render(&self, personal: Option<&str>) -> String {
        if self.is_group() {
            return self.address.clone();
        }
        match personal {
            Some(personal) => format!("{} <{}>", quote_string(personal), self.address),
            None => format_address(&self.address).into_owned(),
        }
    }
}

impl fmt::Display for InternetAddress {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.render(self.encoded_personal()))
    }
}

impl FromStr for InternetAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl PartialEq for InternetAddress {
    fn eq(&self, other: &Self) -> bool {
        self.address.to_lowercase() == other.address.to_lowercase()
    }
}

impl Eq for InternetAddress {}

impl Hash for InternetAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.to_lowercase().hash(state);
    }
}

impl Ord for InternetAddress {
    fn cmp(&self, other: &Self) -> Ordering {
        self.address
            .to_lowercase()
            .cmp(&other.address.to_lowercase())
    }
}

impl PartialOrd for InternetAddress {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn is_group_text(text: &str) -> bool {
    text.ends_with(';') && text.find(':').map_or(false, |idx| idx > 0)
}

/// Quote `text` if it contains an `RFC822` special or white space that
/// would not survive re-parsing, escaping `"` and `\`.
pub fn quote_string(text: &str) -> Cow<'_, str> {
    let loose_whitespace = text.starts_with(char::is_whitespace)
        || text.ends_with(char::is_whitespace)
        || text
            .chars()
            .zip(text.chars().skip(1))
            .any(|(a, b)| a.is_whitespace() && b.is_whitespace());
    if !text.is_empty() && !loose_whitespace && !text.contains(|c: char| SPECIALS.contains(c)) {
        return Cow::Borrowed(text);
    }
    let mut ret = String::with_capacity(text.len() + 2);
    ret.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            ret.push('\\');
        }
        ret.push(c);
    }
    ret.push('"');
    Cow::Owned(ret)
}

/// Bracket an address that is not a plain `local@domain`, eg. one with a
/// route or a quoted local part.
fn format_address(address: &str) -> Cow<'_, str> {
    if !is_group_text(address) && address.contains(|c: char| "()<>,;:\"[]".contains(c)) {
        Cow::Owned(format!("<{}>", address))
    } else {
        Cow::Borrowed(address)
    }
}

/// Parse a comma separated address list.
pub fn parse_address_list(text: &str, strictness: Strictness) -> Result<Vec<InternetAddress>> {
    Ok(AddressParser::new(text, strictness)?.parse_list()?)
}

/// Parse exactly one address.
pub fn parse_address(text: &str, strictness: Strictness) -> Result<InternetAddress> {
    Ok(AddressParser::new(text, strictness)?.parse_single()?)
}

/// The members of the group `text`, `None` if `text` is not a group.
pub fn extract_group_list(
    text: &str,
    strictness: Strictness,
) -> Result<Option<Vec<InternetAddress>>> {
    Ok(AddressParser::new(text, strictness)?.group_members()?)
}

/// Re-parse the formatted address with [`Strictness::Strict`].
pub fn validate(address: &InternetAddress) -> Result<()> {
    let text = format_address(&address.address);
    AddressParser::new(&text, Strictness::Strict)?.parse_single()?;
    Ok(())
}

/// Join addresses with `", "`, folding lines at [`DEFAULT_FOLD_COLUMN`].
/// `used` is the number of columns already taken on the first line, eg.
/// by the header name.
pub fn format_address_list(addresses: &[InternetAddress], used: usize) -> String {
    fold_address_list(
        addresses.iter().map(ToString::to_string),
        used,
        DEFAULT_FOLD_COLUMN,
    )
}

/// [`format_address_list`] with decoded display names.
pub fn format_address_list_unicode(addresses: &[InternetAddress], used: usize) -> String {
    fold_address_list(
        addresses.iter().map(InternetAddress::to_unicode_string),
        used,
        DEFAULT_FOLD_COLUMN,
    )
}

/// Join formatted addresses with `", "`. When the next address would end
/// past `column`, a line break and two spaces of indentation are inserted
/// before it instead. Addresses themselves are never split.
pub fn fold_address_list<I: IntoIterator<Item = String>>(
    addresses: I,
    mut used: usize,
    column: usize,
) -> String {
    let addresses = addresses.into_iter().collect::<Vec<String>>();
    if let [single] = addresses.as_slice() {
        if used + single.chars().count() > column {
            return format!("\r\n  {}", single);
        }
        return single.clone();
    }
    let mut ret = String::with_capacity(addresses.len() * 32);
    for (i, address) in addresses.iter().enumerate() {
        let len = address.chars().count();
        if used + len + 1 > column {
            ret.push_str(if i == 0 { "\r\n  " } else { ",\r\n  " });
            used = 2;
        } else if i > 0 {
            ret.push_str(", ");
            used += 2;
        }
        ret.push_str(address);
        used += len;
    }
    ret
}
