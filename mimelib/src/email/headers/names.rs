/*
 * meli - mimelib header names
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

//! E-mail header names. Also referred to as `Fields` in `RFC822`.

use std::{borrow::Borrow, convert::TryFrom, error::Error, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;

use crate::email::parser::BytesExt;

/// Case insensitive wrapper for a header name. As of `RFC822` it's
/// guaranteed to be ASCII.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct HeaderName {
    inner: Repr,
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
enum Repr {
    Standard(StandardHeader),
    /// Always lower case.
    Custom(SmallVec<[u8; 32]>),
}

/// A possible error when converting a `HeaderName` from another type.
pub struct InvalidHeaderName;

impl Error for InvalidHeaderName {}

impl std::fmt::Debug for InvalidHeaderName {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "Invalid header name.")
    }
}

impl std::fmt::Display for InvalidHeaderName {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "{}", stringify!(InvalidHeaderName))
    }
}

macro_rules! standard_headers {
    (
        $(
            $(#[$docs:meta])*
            ($konst:ident, $upcase:ident, $name:literal, $repeatable:literal);
        )+
    ) => {
        #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
        pub enum StandardHeader {
            $(
                $konst,
            )+
        }

        $(
            $(#[$docs])*
            pub const $upcase: HeaderName = HeaderName {
                inner: Repr::Standard(StandardHeader::$konst),
            };
        )+

        impl HeaderName {
            $(
                pub const $upcase: Self = $upcase;
            )+
        }

        impl StandardHeader {
            #[inline]
            pub const fn as_str(&self) -> &'static str {
                match *self {
                    $(
                        Self::$konst => $name,
                    )+
                }
            }

            /// Whether a message may carry this field more than once.
            #[inline]
            pub const fn is_repeatable(&self) -> bool {
                match *self {
                    $(
                        Self::$konst => $repeatable,
                    )+
                }
            }

            pub fn from_bytes(name_bytes: &[u8]) -> Option<Self> {
                match name_bytes {
                    $(
                        _ if name_bytes.eq_ignore_ascii_case($name.as_bytes()) => Some(Self::$konst),
                    )+
                    _ => None,
                }
            }
        }

        #[cfg(test)]
        pub(super) const TEST_HEADERS: &[(StandardHeader, &str)] = &[
            $(
                (StandardHeader::$konst, $name),
            )+
        ];
    }
}

// Generate constants for the header fields this crate interprets.
standard_headers! {
/*  Unit Variant                 |Constant ident                |Actual field value            |Repeatable */
/*  ------------------------------------------------------------------------------------------------------ */
    (ReturnPath,                  RETURN_PATH,                   "Return-Path",                 true);
    (Received,                    RECEIVED,                      "Received",                    true);
    (Date,                        DATE,                          "Date",                        false);
    (From,                        FROM,                          "From",                        false);
    (Sender,                      SENDER,                        "Sender",                      false);
    (ReplyTo,                     REPLY_TO,                      "Reply-To",                    false);
    (To,                          TO,                            "To",                          false);
    (Cc,                          CC,                            "Cc",                          false);
    (Bcc,                         BCC,                           "Bcc",                         false);
    (MessageId,                   MESSAGE_ID,                    "Message-ID",                  false);
    (InReplyTo,                   IN_REPLY_TO,                   "In-Reply-To",                 false);
    (References,                  REFERENCES,                    "References",                  false);
    (Subject,                     SUBJECT,                       "Subject",                     false);
    (Comments,                    COMMENTS,                      "Comments",                    false);
    (Keywords,                    KEYWORDS,                      "Keywords",                    false);
    (Newsgroups,                  NEWSGROUPS,                    "Newsgroups",                  false);
    (ResentDate,                  RESENT_DATE,                   "Resent-Date",                 false);
    (ResentFrom,                  RESENT_FROM,                   "Resent-From",                 false);
    (ResentSender,                RESENT_SENDER,                 "Resent-Sender",               false);
    (ResentTo,                    RESENT_TO,                     "Resent-To",                   false);
    (ResentCc,                    RESENT_CC,                     "Resent-Cc",                   false);
    (ResentBcc,                   RESENT_BCC,                    "Resent-Bcc",                  false);
    (ResentMessageId,             RESENT_MESSAGE_ID,             "Resent-Message-ID",           false);
    (MimeVersion,                 MIME_VERSION,                  "MIME-Version",                false);
    (ContentType,                 CONTENT_TYPE,                  "Content-Type",                false);
    (ContentTransferEncoding,     CONTENT_TRANSFER_ENCODING,     "Content-Transfer-Encoding",   false);
    (ContentId,                   CONTENT_ID,                    "Content-ID",                  false);
    (ContentDescription,          CONTENT_DESCRIPTION,           "Content-Description",         false);
    (ContentDisposition,          CONTENT_DISPOSITION,           "Content-Disposition",         false);
    (ContentLanguage,             CONTENT_LANGUAGE,              "Content-Language",            false);
    (UserAgent,                   USER_AGENT,                    "User-Agent",                  false);
    (XMailer,                     X_MAILER,                      "X-Mailer",                    false);
}

/// Valid header name ASCII bytes, lower cased.
///
/// ```text
/// field-name  =  1*<any CHAR, excluding CTLs, SPACE, and ":">
/// ```
fn header_char(b: u8) -> Option<u8> {
    if b > 32 && b < 127 && b != b':' {
        Some(b.to_ascii_lowercase())
    } else {
        None
    }
}

/* Chunks that are written in upper case when formatting a custom name. */
const UPPERCASE_TOKENS: &[&str] = &["ID", "MD5", "MIME", "SPF", "DKIM", "ARC", "MTA"];

impl HeaderName {
    /// Returns a `str` representation of the header.
    ///
    /// Custom names are always lower case. Use `Display` for a properly
    /// formatted representation.
    #[inline]
    pub fn as_str(&self) -> &str {
        match self.inner {
            Repr::Standard(v) => v.as_str(),
            // Only ASCII bytes are ever stored.
            Repr::Custom(ref v) => std::str::from_utf8(v).unwrap_or_default(),
        }
    }

    pub fn from_bytes(src: &[u8]) -> Result<Self, InvalidHeaderName> {
        let src = src.trim();
        if let Some(std) = StandardHeader::from_bytes(src) {
            return Ok(Self {
                inner: Repr::Standard(std),
            });
        }
        if src.is_empty() {
            return Err(InvalidHeaderName);
        }
        src.iter()
            .map(|b| header_char(*b))
            .collect::<Option<SmallVec<[u8; 32]>>>()
            .map(|buf| Self {
                inner: Repr::Custom(buf),
            })
            .ok_or(InvalidHeaderName)
    }

    pub const fn is_standard(&self) -> bool {
        matches!(self.inner, Repr::Standard(_))
    }

    /// Whether a message may carry this field more than once. Only
    /// `Return-Path` and `Received` may repeat.
    pub const fn is_repeatable(&self) -> bool {
        match self.inner {
            Repr::Standard(std) => std.is_repeatable(),
            Repr::Custom(_) => false,
        }
    }
}

impl FromStr for HeaderName {
    type Err = InvalidHeaderName;

    fn from_str(s: &str) -> Result<Self, InvalidHeaderName> {
        Self::from_bytes(s.as_bytes())
    }
}

impl AsRef<str> for HeaderName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for HeaderName {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for HeaderName {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner {
            Repr::Standard(std) => write!(fmt, "{}", std.as_str()),
            Repr::Custom(_) => {
                for (i, chunk) in self.as_str().split('-').enumerate() {
                    if i > 0 {
                        write!(fmt, "-")?;
                    }
                    if let Some(tok) = UPPERCASE_TOKENS
                        .iter()
                        .find(|tok| tok.eq_ignore_ascii_case(chunk))
                    {
                        write!(fmt, "{}", tok)?;
                    } else {
                        let mut chars = chunk.chars();
                        if let Some(first) = chars.next() {
                            write!(fmt, "{}{}", first.to_ascii_uppercase(), chars.as_str())?;
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

impl<'de> Deserialize<'de> for HeaderName {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = <String>::deserialize(deserializer)?;
        Self::from_bytes(s.as_bytes()).map_err(|_| de::Error::custom("invalid header name value"))
    }
}

impl Serialize for HeaderName {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'a> TryFrom<&'a str> for HeaderName {
    type Error = InvalidHeaderName;
    #[inline]
    fn try_from(s: &'a str) -> Result<Self, Self::Error> {
        Self::from_bytes(s.as_bytes())
    }
}

impl<'a> TryFrom<&'a String> for HeaderName {
    type Error = InvalidHeaderName;
    #[inline]
    fn try_from(s: &'a String) -> Result<Self, Self::Error> {
        Self::from_bytes(s.as_bytes())
    }
}

impl<'a> TryFrom<&'a [u8]> for HeaderName {
    type Error = InvalidHeaderName;
    #[inline]
    fn try_from(s: &'a [u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(s)
    }
}

impl TryFrom<String> for HeaderName {
    type Error = InvalidHeaderName;

    #[inline]
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_bytes(s.as_bytes())
    }
}

impl<'a> From<&'a HeaderName> for HeaderName {
    fn from(src: &'a HeaderName) -> Self {
        src.clone()
    }
}

impl From<StandardHeader> for HeaderName {
    fn from(src: StandardHeader) -> Self {
        Self {
            inner: Repr::Standard(src),
        }
    }
}

impl PartialEq<str> for HeaderName {
    /// Performs a case-insensitive comparison of the string against the header
    /// name
    ///
    /// # Examples
    ///
    /// ```
    /// use mimelib::email::headers::HeaderName;
    ///
    /// assert_eq!(HeaderName::CONTENT_TYPE, "content-type");
    /// assert_eq!(HeaderName::CONTENT_TYPE, "Content-Type");
    /// assert_ne!(HeaderName::CONTENT_TYPE, "content type");
    /// ```
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(other.trim())
    }
}

impl<'a> PartialEq<&'a str> for HeaderName {
    #[inline]
    fn eq(&self, other: &&'a str) -> bool {
        *self == **other
    }
}

impl PartialEq<HeaderName> for &str {
    #[inline]
    fn eq(&self, other: &HeaderName) -> bool {
        *other == **self
    }
}
