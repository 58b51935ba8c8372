/*
 * meli - mimelib error module
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

//! An error object for `mimelib`

use std::{borrow::Cow, fmt, io, result, str, string, sync::Arc};

use crate::email::address::{Strictness, SyntaxErrorKind};

pub type Result<T> = result::Result<T, Error>;

/// What went wrong, in a form callers can match on.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ErrorKind {
    #[default]
    None,
    /// Malformed address text. Carries the grammar rule that failed and the
    /// strictness level the input was parsed with.
    AddressSyntax {
        reason: SyntaxErrorKind,
        strictness: Strictness,
    },
    /// A charset label is unknown, or a character cannot be represented in
    /// the requested charset.
    UnsupportedEncoding,
    /// A header that may appear at most once was added a second time.
    DuplicateHeader,
    /// No content handler is registered for a MIME type, or the handler
    /// cannot encode the given content.
    UnsupportedContentType,
    /// Malformed encoded word, header block or content type value.
    Parse,
    ValueError,
    Io(io::ErrorKind),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::None => write!(fmt, "None"),
            Self::AddressSyntax { reason, strictness } => {
                write!(fmt, "Address syntax error ({reason}, {strictness})")
            }
            Self::UnsupportedEncoding => write!(fmt, "Unsupported encoding"),
            Self::DuplicateHeader => write!(fmt, "Duplicate header"),
            Self::UnsupportedContentType => write!(fmt, "Unsupported content type"),
            Self::Parse => write!(fmt, "Parse error"),
            Self::ValueError => write!(fmt, "Invalid value"),
            Self::Io(kind) => write!(fmt, "I/O error: {kind}"),
        }
    }
}

impl ErrorKind {
    pub const fn is_address_syntax(&self) -> bool {
        matches!(self, Self::AddressSyntax { .. })
    }
}

#[derive(Clone, Debug)]
pub struct Error {
    pub summary: Cow<'static, str>,
    pub details: Option<Cow<'static, str>>,
    pub source: Option<Arc<dyn std::error::Error + Send + Sync + 'static>>,
    pub kind: ErrorKind,
}

pub trait IntoError {
    fn set_err_summary<M>(self, msg: M) -> Error
    where
        M: Into<Cow<'static, str>>;

    fn set_err_kind(self, kind: ErrorKind) -> Error;
}

pub trait ResultIntoError<T> {
    fn chain_err_summary<M, F>(self, msg_fn: F) -> Result<T>
    where
        F: Fn() -> M,
        M: Into<Cow<'static, str>>;

    fn chain_err_kind(self, kind: ErrorKind) -> Result<T>;
}

impl<I: Into<Error>> IntoError for I {
    #[inline]
    fn set_err_summary<M>(self, msg: M) -> Error
    where
        M: Into<Cow<'static, str>>,
    {
        let err: Error = self.into();
        err.set_summary(msg)
    }

    #[inline]
    fn set_err_kind(self, kind: ErrorKind) -> Error {
        let err: Error = self.into();
        err.set_kind(kind)
    }
}

impl<T, I: Into<Error>> ResultIntoError<T> for result::Result<T, I> {
    #[inline]
    fn chain_err_summary<M, F>(self, msg_fn: F) -> Result<T>
    where
        F: Fn() -> M,
        M: Into<Cow<'static, str>>,
    {
        self.map_err(|err| err.set_err_summary(msg_fn()))
    }

    #[inline]
    fn chain_err_kind(self, kind: ErrorKind) -> Result<T> {
        self.map_err(|err| err.set_err_kind(kind))
    }
}

impl Error {
    pub fn new<M>(msg: M) -> Self
    where
        M: Into<Cow<'static, str>>,
    {
        Self {
            summary: msg.into(),
            details: None,
            source: None,
            kind: ErrorKind::None,
        }
    }

    /// Replace the summary, moving the previous one into the details.
    pub fn set_summary<M>(mut self, summary: M) -> Self
    where
        M: Into<Cow<'static, str>>,
    {
        let previous = std::mem::replace(&mut self.summary, summary.into());
        self.details = Some(match self.details.take() {
            Some(details) => format!("{previous}\n{details}").into(),
            None => previous,
        });
        self
    }

    pub fn set_details<M>(mut self, details: M) -> Self
    where
        M: Into<Cow<'static, str>>,
    {
        self.details = Some(details.into());
        self
    }

    pub fn set_source(
        mut self,
        new_val: Option<Arc<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        self.source = new_val;
        self
    }

    pub fn set_kind(mut self, new_val: ErrorKind) -> Self {
        self.kind = new_val;
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.summary)?;
        if let Some(details) = self.details.as_ref() {
            if !details.trim().is_empty() {
                write!(f, "\n{}", details)?;
            }
        }
        if let Some(source) = self.source.as_ref() {
            write!(f, "\nCaused by: {}", source)?;
        }
        if self.kind != ErrorKind::None {
            write!(f, "\nError kind: {}", self.kind)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|s| &(*(*s)) as _)
    }
}

impl From<io::Error> for Error {
    #[inline]
    fn from(err: io::Error) -> Self {
        let kind = err.kind();
        Self::new(err.to_string())
            .set_kind(ErrorKind::Io(kind))
            .set_source(Some(Arc::new(err)))
    }
}

impl From<string::FromUtf8Error> for Error {
    #[inline]
    fn from(err: string::FromUtf8Error) -> Self {
        Self::new(err.to_string())
            .set_kind(ErrorKind::UnsupportedEncoding)
            .set_source(Some(Arc::new(err)))
    }
}

impl From<str::Utf8Error> for Error {
    #[inline]
    fn from(err: str::Utf8Error) -> Self {
        Self::new(err.to_string())
            .set_kind(ErrorKind::UnsupportedEncoding)
            .set_source(Some(Arc::new(err)))
    }
}

impl From<chrono::ParseError> for Error {
    #[inline]
    fn from(err: chrono::ParseError) -> Self {
        Self::new(err.to_string())
            .set_kind(ErrorKind::Parse)
            .set_source(Some(Arc::new(err)))
    }
}

impl From<base64::DecodeError> for Error {
    #[inline]
    fn from(err: base64::DecodeError) -> Self {
        Self::new(err.to_string())
            .set_kind(ErrorKind::Parse)
            .set_source(Some(Arc::new(err)))
    }
}

impl From<data_encoding::DecodeError> for Error {
    #[inline]
    fn from(err: data_encoding::DecodeError) -> Self {
        Self::new(err.to_string())
            .set_kind(ErrorKind::Parse)
            .set_source(Some(Arc::new(err)))
    }
}

impl From<&str> for Error {
    #[inline]
    fn from(msg: &str) -> Self {
        Self::new(msg.to_string())
    }
}

impl From<String> for Error {
    #[inline]
    fn from(msg: String) -> Self {
        Self::new(msg)
    }
}
