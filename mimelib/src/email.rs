/*
 * meli - mimelib email module
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

//! Email parsing, handling and composing.
//!
//! # Addresses
//!
//! [`InternetAddress`] holds a single mailbox (`"Joe User" <user@host>`) or a
//! whole group (`friends: a@x.com, b@x.com;`). See [`address`] for the three
//! parsing strictness levels.
//!
//! # Headers
//!
//! [`HeaderMap`] keeps header values in insertion order, indexed by the case
//! insensitive [`HeaderName`].
//!
//! # Bodies
//!
//! A [`Message`] body is turned into [`Content`] by the [`ContentHandler`]
//! that the [`HandlerRegistry`] selects for its [`ContentType`], after the
//! [`TransferCodec`] has undone its `Content-Transfer-Encoding`.

pub mod address;
pub mod content;
pub mod content_type;
pub mod encodings;
pub mod flags;
pub mod headers;
pub mod message;
pub mod parser;
pub mod transfer_encoding;

pub use address::{InternetAddress, Strictness};
pub use content::{Content, ContentHandler, HandlerRegistry};
pub use content_type::ContentType;
pub use encodings::Charset;
pub use flags::{Flag, Flags};
pub use headers::{HeaderMap, HeaderName};
pub use message::{Message, RecipientType};
pub use parser::BytesExt;
pub use transfer_encoding::{ContentTransferEncoding, DefaultTransferCodec, TransferCodec};
