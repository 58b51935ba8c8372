//
// meli
//
// Copyright 2017 Manos Pitsidianakis
//
// This file is part of meli.
//
// meli is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// meli is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with meli. If not, see <http://www.gnu.org/licenses/>.
//
// SPDX-License-Identifier: EUPL-1.2 OR GPL-3.0-or-later


use mimelib::{Message, MimeSettings, RecipientType, Strictness};

#[test]
fn test_settings_from_toml_drive_parsing() {
    let settings: MimeSettings = toml::from_str(
        r#"
header_strictness = "non-strict"
fold_column = 30
personal_charset = "iso-8859-1"
"#,
    )
    .unwrap();
    assert_eq!(settings.header_strictness, Strictness::NonStrict);

    let mut message = Message::from_bytes(
        b"To: ann@example.com bob@example.com\r\n\r\n",
        &settings,
    )
    .unwrap();
    let to = message.recipients(RecipientType::To).unwrap();
    assert_eq!(to.len(), 2);

    message.set_recipients(RecipientType::Cc, &to).unwrap();
    assert_eq!(
        message.headers().get("cc"),
        Some("ann@example.com,\r\n  bob@example.com")
    );

    message.set_subject(Some("Café")).unwrap();
    assert_eq!(
        message.headers().get("subject"),
        Some("=?windows-1252?Q?Caf=E9?=")
    );
}

#[test]
fn test_settings_invalid_values() {
    assert!(toml::from_str::<MimeSettings>(r#"header_strictness = "lenient""#).is_err());
    assert!(toml::from_str::<MimeSettings>(r#"fold_column = "wide""#).is_err());
}
