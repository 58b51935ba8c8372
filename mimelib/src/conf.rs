/*
 * meli - mimelib configuration module.
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

//! Settings that affect how messages are parsed and composed.
//!
//! [`MimeSettings`] plays the part of the mail session: it is handed down to
//! content handlers and to nested messages so that a decoded
//! `message/rfc822` part behaves exactly like its parent.

use crate::email::address::Strictness;

/// Line length used when folding address lists.
pub const DEFAULT_FOLD_COLUMN: usize = 72;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct MimeSettings {
    /// Charset assumed for `text/*` bodies without a `charset` parameter.
    #[serde(default = "us_ascii_val")]
    pub default_text_charset: String,
    /// Charset of the encoded words a message writes in its `Subject`.
    /// Address display names carry their own charset, UTF-8 unless given.
    #[serde(default = "utf8_val")]
    pub personal_charset: String,
    /// Column after which address lists are folded.
    #[serde(default = "fold_column_val")]
    pub fold_column: usize,
    /// Strictness used when reading address headers of a message.
    #[serde(default)]
    pub header_strictness: Strictness,
    /// Local address, takes precedence over `user` and `host`.
    #[serde(default = "none")]
    pub from: Option<String>,
    #[serde(default = "none")]
    pub user: Option<String>,
    #[serde(default = "none")]
    pub host: Option<String>,
}

impl Default for MimeSettings {
    fn default() -> Self {
        Self {
            default_text_charset: us_ascii_val(),
            personal_charset: utf8_val(),
            fold_column: fold_column_val(),
            header_strictness: Strictness::default(),
            from: None,
            user: None,
            host: None,
        }
    }
}

impl MimeSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// The local address as `user@host`, if both parts are configured.
    pub fn user_at_host(&self) -> Option<String> {
        match (self.user.as_deref(), self.host.as_deref()) {
            (Some(user), Some(host)) if !user.is_empty() && !host.is_empty() => {
                Some(format!("{user}@{host}"))
            }
            _ => None,
        }
    }
}

fn us_ascii_val() -> String {
    "us-ascii".to_string()
}

fn utf8_val() -> String {
    "utf-8".to_string()
}

const fn fold_column_val() -> usize {
    DEFAULT_FOLD_COLUMN
}

const fn none<T>() -> Option<T> {
    None
}
