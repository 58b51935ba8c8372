/*
 * meli - mimelib content module
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

//! Typed body content and the handlers that convert it from and to bytes.
//!
//! A [`HandlerRegistry`] maps MIME types to [`ContentHandler`]s. Lookup tries
//! the exact `type/subtype` first, then `type/*`, then the fallback handler.
//!
//! ```rust
//! use mimelib::{email::content::registry, ContentType, MimeSettings};
//!
//! let settings = MimeSettings::default();
//! let content_type = ContentType::parse("text/plain; charset=iso-8859-1").unwrap();
//! let content = registry()
//!     .decode(&b"caf\xe9"[..], &content_type, &settings)
//!     .unwrap();
//! assert_eq!(content.as_text(), Some("café"));
//!
//! let mut sink = vec![];
//! registry()
//!     .encode(&content, &content_type, &mut sink, &settings)
//!     .unwrap();
//! assert_eq!(sink, b"caf\xe9");
//! ```

use std::{
    io::{Read, Write},
    sync::{Arc, OnceLock},
};

use indexmap::IndexMap;

use crate::{
    conf::MimeSettings,
    email::{content_type::ContentType, encodings::Charset, message::Message},
    error::{Error, ErrorKind, Result},
};


/// A decoded body.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Content {
    Text(String),
    Message(Box<Message>),
    Bytes(Vec<u8>),
}

impl Content {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Self::Message(message) => Some(message.as_ref()),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes.as_slice()),
            _ => None,
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Message(_) => "message",
            Self::Bytes(_) => "bytes",
        }
    }
}

impl From<String> for Content {
    fn from(val: String) -> Self {
        Self::Text(val)
    }
}

impl From<&str> for Content {
    fn from(val: &str) -> Self {
        Self::Text(val.to_string())
    }
}

impl From<Message> for Content {
    fn from(val: Message) -> Self {
        Self::Message(Box::new(val))
    }
}

impl From<Vec<u8>> for Content {
    fn from(val: Vec<u8>) -> Self {
        Self::Bytes(val)
    }
}

/// Converts body bytes of some MIME type to [`Content`] and back.
pub trait ContentHandler: Send + Sync + std::fmt::Debug {
    fn decode(
        &self,
        source: &mut dyn Read,
        content_type: &ContentType,
        settings: &MimeSettings,
    ) -> Result<Content>;

    fn encode(
        &self,
        content: &Content,
        content_type: &ContentType,
        sink: &mut dyn Write,
        settings: &MimeSettings,
    ) -> Result<()>;
}

fn wrong_variant(handler: &str, content: &Content, content_type: &ContentType) -> Error {
    Error::new(format!(
        "Cannot encode {} content as {}",
        content.variant_name(),
        content_type.base_type()
    ))
    .set_details(format!("{} accepts other content.", handler))
    .set_kind(ErrorKind::UnsupportedContentType)
}

/// `text/*` bodies, decoded with the `charset` parameter.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextHandler;

impl TextHandler {
    fn charset(content_type: &ContentType, settings: &MimeSettings) -> Result<Charset> {
        Charset::resolve(
            content_type
                .charset()
                .unwrap_or(settings.default_text_charset.as_str()),
        )
    }
}

impl ContentHandler for TextHandler {
    fn decode(
        &self,
        source: &mut dyn Read,
        content_type: &ContentType,
        settings: &MimeSettings,
    ) -> Result<Content> {
        // The source is drained even if the charset turns out to be unknown.
        let mut bytes = vec![];
        source.read_to_end(&mut bytes)?;
        let charset = Self::charset(content_type, settings)?;
        Ok(Content::Text(charset.decode(&bytes)))
    }

    fn encode(
        &self,
        content: &Content,
        content_type: &ContentType,
        sink: &mut dyn Write,
        settings: &MimeSettings,
    ) -> Result<()> {
        let Content::Text(ref text) = content else {
            return Err(wrong_variant("TextHandler", content, content_type));
        };
        let bytes = Self::charset(content_type, settings)?.encode(text)?;
        sink.write_all(&bytes)?;
        Ok(())
    }
}

/// `message/rfc822` bodies, parsed as nested messages with the caller's
/// settings.
#[derive(Clone, Copy, Debug, Default)]
pub struct MessageHandler;

impl ContentHandler for MessageHandler {
    fn decode(
        &self,
        source: &mut dyn Read,
        _content_type: &ContentType,
        settings: &MimeSettings,
    ) -> Result<Content> {
        let mut bytes = vec![];
        source.read_to_end(&mut bytes)?;
        Ok(Content::Message(Box::new(Message::from_bytes(
            &bytes, settings,
        )?)))
    }

    fn encode(
        &self,
        content: &Content,
        content_type: &ContentType,
        sink: &mut dyn Write,
        _settings: &MimeSettings,
    ) -> Result<()> {
        let Content::Message(ref message) = content else {
            return Err(wrong_variant("MessageHandler", content, content_type));
        };
        message.write_to(sink)
    }
}

/// Raw bytes of any type.
#[derive(Clone, Copy, Debug, Default)]
pub struct BinaryHandler;

impl ContentHandler for BinaryHandler {
    fn decode(
        &self,
        source: &mut dyn Read,
        _content_type: &ContentType,
        _settings: &MimeSettings,
    ) -> Result<Content> {
        let mut bytes = vec![];
        source.read_to_end(&mut bytes)?;
        Ok(Content::Bytes(bytes))
    }

    fn encode(
        &self,
        content: &Content,
        content_type: &ContentType,
        sink: &mut dyn Write,
        _settings: &MimeSettings,
    ) -> Result<()> {
        let Content::Bytes(ref bytes) = content else {
            return Err(wrong_variant("BinaryHandler", content, content_type));
        };
        sink.write_all(bytes)?;
        Ok(())
    }
}

/// MIME type to [`ContentHandler`] table.
#[derive(Clone, Debug, Default)]
pub struct HandlerRegistry {
    handlers: IndexMap<String, Arc<dyn ContentHandler>>,
    fallback: Option<Arc<dyn ContentHandler>>,
}

impl HandlerRegistry {
    /// An empty registry: every lookup fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// `text/*` as text, `message/rfc822` as a nested message, anything else
    /// as bytes.
    pub fn with_defaults() -> Self {
        let mut ret = Self::new();
        ret.register("text/*", TextHandler);
        ret.register("message/rfc822", MessageHandler);
        ret.set_fallback(Some(Arc::new(BinaryHandler)));
        ret
    }

    /// Register `handler` for `mime_type`, either `type/subtype` or `type/*`.
    /// A previous handler for the same type is replaced.
    pub fn register<H: ContentHandler + 'static>(&mut self, mime_type: &str, handler: H) {
        self.register_arc(mime_type, Arc::new(handler));
    }

    pub fn register_arc(&mut self, mime_type: &str, handler: Arc<dyn ContentHandler>) {
        self.handlers
            .insert(mime_type.trim().to_ascii_lowercase(), handler);
    }

    /// Handler for types without an entry of their own.
    pub fn set_fallback(&mut self, fallback: Option<Arc<dyn ContentHandler>>) {
        self.fallback = fallback;
    }

    pub fn lookup(&self, content_type: &ContentType) -> Result<&Arc<dyn ContentHandler>> {
        if let Some(handler) = self.handlers.get(&content_type.base_type()) {
            return Ok(handler);
        }
        if let Some(handler) = self
            .handlers
            .get(&format!("{}/*", content_type.primary_type()))
        {
            return Ok(handler);
        }
        if let Some(ref handler) = self.fallback {
            log::debug!(
                "No handler for {}, using fallback {:?}",
                content_type.base_type(),
                handler
            );
            return Ok(handler);
        }
        Err(Error::new(format!(
            "No content handler for {}",
            content_type.base_type()
        ))
        .set_kind(ErrorKind::UnsupportedContentType))
    }

    /// Read all of `source` and decode it. `source` is dropped whether
    /// decoding succeeds or not.
    pub fn decode<R: Read>(
        &self,
        mut source: R,
        content_type: &ContentType,
        settings: &MimeSettings,
    ) -> Result<Content> {
        let handler = debug!(self.lookup(content_type)?);
        handler.decode(&mut source, content_type, settings)
    }

    /// Encode `content` and write it to `sink`. Nothing is written unless
    /// encoding succeeds as a whole.
    pub fn encode<W: Write>(
        &self,
        content: &Content,
        content_type: &ContentType,
        mut sink: W,
        settings: &MimeSettings,
    ) -> Result<()> {
        let handler = self.lookup(content_type)?;
        let mut buf = vec![];
        handler.encode(content, content_type, &mut buf, settings)?;
        sink.write_all(&buf)?;
        sink.flush()?;
        Ok(())
    }
}

/// The process wide default registry, [`HandlerRegistry::with_defaults`].
pub fn registry() -> &'static HandlerRegistry {
    static REGISTRY: OnceLock<HandlerRegistry> = OnceLock::new();
    REGISTRY.get_or_init(HandlerRegistry::with_defaults)
}
