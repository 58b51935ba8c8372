/*
 * meli - mimelib message module
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

//! A message: header fields followed by an undecoded body.

use std::io::{BufReader, Read, Write};

use chrono::{DateTime, FixedOffset};

use crate::{
    conf::MimeSettings,
    email::{
        address::{fold_address_list, InternetAddress},
        content::{Content, HandlerRegistry},
        content_type::ContentType,
        encodings::{decode_header_value, encode_text},
        headers::{HeaderMap, HeaderName},
        parser::{self, BytesExt},
        transfer_encoding::{ContentTransferEncoding, TransferCodec},
    },
    error::{Error, Result, ResultIntoError},
};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RecipientType {
    To,
    Cc,
    Bcc,
}

impl RecipientType {
    pub const ALL: [Self; 3] = [Self::To, Self::Cc, Self::Bcc];

    pub fn header(&self) -> HeaderName {
        match self {
            Self::To => HeaderName::TO,
            Self::Cc => HeaderName::CC,
            Self::Bcc => HeaderName::BCC,
        }
    }
}

impl std::fmt::Display for RecipientType {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "{}", self.header())
    }
}

/// Header fields and raw body bytes, plus the settings used to interpret
/// them. Address headers are parsed with
/// [`MimeSettings::header_strictness`] and nested messages inherit the
/// settings of their parent.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Message {
    headers: HeaderMap,
    body: Vec<u8>,
    settings: MimeSettings,
}

impl Message {
    pub fn new(settings: MimeSettings) -> Self {
        Self {
            headers: HeaderMap::new(),
            body: vec![],
            settings,
        }
    }

    /// Parse a whole message. Everything after the first empty line is the
    /// body.
    pub fn from_bytes(bytes: &[u8], settings: &MimeSettings) -> Result<Self> {
        let (fields, body) = parser::mail(bytes)?;
        let mut headers = HeaderMap::new();
        for (name, value) in fields {
            headers.add_header(name, String::from_utf8_lossy(value))?;
        }
        Ok(Self {
            headers,
            body: body.to_vec(),
            settings: settings.clone(),
        })
    }

    /// Read the header block, then the rest of `reader` as the body.
    pub fn from_reader<R: Read>(reader: R, settings: &MimeSettings) -> Result<Self> {
        let mut reader = BufReader::new(reader);
        let mut headers = HeaderMap::new();
        headers.load(&mut reader)?;
        let mut body = vec![];
        reader.read_to_end(&mut body)?;
        Ok(Self {
            headers,
            body,
            settings: settings.clone(),
        })
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Body bytes, still transfer encoded.
    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = body;
    }

    #[inline]
    pub fn settings(&self) -> &MimeSettings {
        &self.settings
    }

    /// Unfolded, trimmed value of the first field named `name`.
    fn header_text(&self, name: HeaderName) -> Option<String> {
        self.headers.get(name).map(|value| {
            String::from_utf8_lossy(parser::unfold(value.as_bytes()).trim()).into_owned()
        })
    }

    /// Every address in every `name` field.
    pub fn address_header(&self, name: HeaderName) -> Result<Vec<InternetAddress>> {
        let mut ret = vec![];
        for value in self.headers.get_all(&name) {
            let unfolded = parser::unfold(value.as_bytes());
            let text = String::from_utf8_lossy(unfolded.trim());
            if text.is_empty() {
                continue;
            }
            ret.extend(
                InternetAddress::parse_list(&text, self.settings.header_strictness)
                    .chain_err_summary(|| format!("Could not parse {} header", name))?,
            );
        }
        Ok(ret)
    }

    /// Authors from `From`, or from `Sender` if there is no `From`.
    pub fn from(&self) -> Result<Vec<InternetAddress>> {
        let ret = self.address_header(HeaderName::FROM)?;
        if ret.is_empty() {
            return self.address_header(HeaderName::SENDER);
        }
        Ok(ret)
    }

    pub fn recipients(&self, kind: RecipientType) -> Result<Vec<InternetAddress>> {
        self.address_header(kind.header())
    }

    /// `To`, `Cc` and `Bcc` recipients in that order.
    pub fn all_recipients(&self) -> Result<Vec<InternetAddress>> {
        let mut ret = vec![];
        for kind in RecipientType::ALL {
            ret.extend(self.recipients(kind)?);
        }
        Ok(ret)
    }

    /// `Reply-To` addresses, or [`Message::from`] if there are none.
    pub fn reply_to(&self) -> Result<Vec<InternetAddress>> {
        let ret = self.address_header(HeaderName::REPLY_TO)?;
        if ret.is_empty() {
            return self.from();
        }
        Ok(ret)
    }

    fn set_address_header(
        &mut self,
        name: HeaderName,
        addresses: &[InternetAddress],
    ) -> Result<()> {
        if addresses.is_empty() {
            self.headers.remove(&name);
            return Ok(());
        }
        // "Name: "
        let used = name.as_str().len() + 2;
        let value = fold_address_list(
            addresses.iter().map(ToString::to_string),
            used,
            self.settings.fold_column,
        );
        self.headers.set_header(name, value)
    }

    /// Replace `From`. `None` removes it.
    pub fn set_from(&mut self, from: Option<&InternetAddress>) -> Result<()> {
        self.set_address_header(
            HeaderName::FROM,
            from.map(std::slice::from_ref).unwrap_or_default(),
        )
    }

    /// Replace a recipient field with a folded list. An empty list removes
    /// the field.
    pub fn set_recipients(
        &mut self,
        kind: RecipientType,
        addresses: &[InternetAddress],
    ) -> Result<()> {
        self.set_address_header(kind.header(), addresses)
    }

    /// Append to a recipient field.
    pub fn add_recipients(
        &mut self,
        kind: RecipientType,
        addresses: &[InternetAddress],
    ) -> Result<()> {
        let mut all = self.recipients(kind)?;
        all.extend_from_slice(addresses);
        self.set_recipients(kind, &all)
    }

    /// `Subject` with encoded words decoded.
    pub fn subject(&self) -> Result<Option<String>> {
        self.headers
            .get(HeaderName::SUBJECT)
            .map(|value| decode_header_value(value.as_bytes()))
            .transpose()
    }

    /// Replace `Subject`, encoding it in
    /// [`MimeSettings::personal_charset`] if it is not plain ASCII. `None`
    /// removes it.
    pub fn set_subject(&mut self, subject: Option<&str>) -> Result<()> {
        let Some(subject) = subject else {
            self.headers.remove(HeaderName::SUBJECT);
            return Ok(());
        };
        let value = encode_text(subject, &self.settings.personal_charset, None)?;
        self.headers.set_header(HeaderName::SUBJECT, value)
    }

    /// `Date` as an `RFC2822` date. A trailing comment such as `(CET)` is
    /// ignored.
    pub fn sent_date(&self) -> Result<Option<DateTime<FixedOffset>>> {
        let Some(value) = self.header_text(HeaderName::DATE) else {
            return Ok(None);
        };
        let date = match (value.ends_with(')'), value.rfind('(')) {
            (true, Some(pos)) => value[..pos].trim_end(),
            _ => value.as_str(),
        };
        DateTime::parse_from_rfc2822(date)
            .map(Some)
            .map_err(|err| Error::from(err).set_summary(format!("Invalid date: {:?}", value)))
    }

    pub fn set_sent_date(&mut self, date: Option<DateTime<FixedOffset>>) -> Result<()> {
        match date {
            Some(date) => self.headers.set_header(HeaderName::DATE, date.to_rfc2822()),
            None => {
                self.headers.remove(HeaderName::DATE);
                Ok(())
            }
        }
    }

    pub fn message_id(&self) -> Option<String> {
        self.header_text(HeaderName::MESSAGE_ID)
    }

    /// `Content-Type`, or `text/plain; charset=us-ascii` if absent.
    pub fn content_type(&self) -> Result<ContentType> {
        match self.header_text(HeaderName::CONTENT_TYPE) {
            Some(value) => ContentType::parse(&value),
            None => Ok(ContentType::default()),
        }
    }

    /// `Content-Transfer-Encoding`, or `7bit` if absent.
    pub fn transfer_encoding(&self) -> ContentTransferEncoding {
        self.headers
            .get(HeaderName::CONTENT_TRANSFER_ENCODING)
            .map(|value| ContentTransferEncoding::from(value.as_bytes()))
            .unwrap_or_default()
    }

    /// Undo the transfer encoding and decode the body with the handler
    /// `registry` selects for [`Message::content_type`].
    pub fn content(
        &self,
        registry: &HandlerRegistry,
        codec: &dyn TransferCodec,
    ) -> Result<Content> {
        let content_type = self.content_type()?;
        let decoded = codec.decode(&self.transfer_encoding(), &self.body)?;
        registry.decode(decoded.as_slice(), &content_type, &self.settings)
    }

    /// Encode `content` as `content_type` and make it the body, updating
    /// `Content-Type`, `Content-Transfer-Encoding` and `MIME-Version`. Text
    /// without a `charset` parameter gets `us-ascii` or `utf-8`. On error the
    /// message is left unchanged.
    pub fn set_content(
        &mut self,
        content: &Content,
        content_type: &ContentType,
        registry: &HandlerRegistry,
        codec: &dyn TransferCodec,
    ) -> Result<()> {
        let mut content_type = content_type.clone();
        if let (true, None, Content::Text(text)) =
            (content_type.is_text(), content_type.charset(), content)
        {
            content_type.set_parameter(
                "charset",
                if text.is_ascii() { "us-ascii" } else { "utf-8" },
            );
        }
        let mut raw = vec![];
        registry.encode(content, &content_type, &mut raw, &self.settings)?;
        let encoding = if content_type.match_type("message/*")
            || content_type.match_type("multipart/*")
        {
            // RFC 2046 forbids other encodings for composite types.
            if raw.is_ascii() {
                ContentTransferEncoding::_7Bit
            } else {
                ContentTransferEncoding::_8Bit
            }
        } else if content_type.is_text() {
            ContentTransferEncoding::for_body(&raw)
        } else {
            ContentTransferEncoding::for_binary_body(&raw)
        };
        let body = codec.encode(&encoding, &raw)?;

        let mut headers = self.headers.clone();
        if !headers.contains_key(HeaderName::MIME_VERSION) {
            headers.set_header(HeaderName::MIME_VERSION, "1.0")?;
        }
        headers.set_header(HeaderName::CONTENT_TYPE, content_type.to_string())?;
        headers.set_header(HeaderName::CONTENT_TRANSFER_ENCODING, encoding.to_string())?;
        self.headers = headers;
        self.body = body;
        Ok(())
    }

    /// Header fields, an empty line, then the body.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        self.headers.write_to(writer)?;
        writer.write_all(b"\r\n")?;
        writer.write_all(&self.body)?;
        writer.flush()?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut ret = Vec::with_capacity(self.body.len() + 512);
        self.write_to(&mut ret)?;
        Ok(ret)
    }
}

impl TryFrom<&[u8]> for Message {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes(bytes, &MimeSettings::default())
    }
}

#[cfg(test)]
mod tests;
