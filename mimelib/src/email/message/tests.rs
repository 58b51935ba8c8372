/*
 * meli - mimelib message tests
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

use chrono::TimeZone;

use super::*;
use crate::{
    email::{
        address::Strictness, content::registry, transfer_encoding::DefaultTransferCodec,
    },
    error::ErrorKind,
};

const RAW: &[u8] = b"From: \"Joe Q. Public\" <john.q.public@example.com>\r\n\
To: Mary Smith <mary@x.test>, jdoe@example.org,\r\n \
  Who? <one@y.test>\r\n\
Cc: <boss@nil.test>, \"Giant; \\\"Big\\\" Box\" <sysservices@example.net>\r\n\
Subject: =?ISO-8859-1?Q?Caf=E9?= au lait\r\n\
Date: Tue, 1 Jul 2003 10:52:37 +0200 (CEST)\r\n\
Message-ID: <5678.21-Nov-1997@example.com>\r\n\
\r\n\
Hi everyone.\r\n";

#[test]
fn test_message_parse_headers() {
    let message = Message::from_bytes(RAW, &MimeSettings::default()).unwrap();
    let from = message.from().unwrap();
    assert_eq!(from.len(), 1);
    assert_eq!(from[0].address(), "john.q.public@example.com");
    assert_eq!(from[0].personal(), Some("Joe Q. Public"));

    let to = message.recipients(RecipientType::To).unwrap();
    assert_eq!(
        to.iter().map(InternetAddress::address).collect::<Vec<_>>(),
        vec!["mary@x.test", "jdoe@example.org", "one@y.test"]
    );
    assert_eq!(to[2].personal(), Some("Who?"));
    assert!(message.recipients(RecipientType::Bcc).unwrap().is_empty());
    assert_eq!(message.all_recipients().unwrap().len(), 5);
    assert_eq!(message.reply_to().unwrap(), from);

    assert_eq!(message.subject().unwrap().as_deref(), Some("Café au lait"));
    assert_eq!(
        message.sent_date().unwrap(),
        Some(
            FixedOffset::east_opt(2 * 3600)
                .unwrap()
                .with_ymd_and_hms(2003, 7, 1, 10, 52, 37)
                .unwrap()
        )
    );
    assert_eq!(
        message.message_id().as_deref(),
        Some("<5678.21-Nov-1997@example.com>")
    );
    assert_eq!(message.body(), b"Hi everyone.\r\n");
    assert_eq!(message.content_type().unwrap(), ContentType::default());
    assert_eq!(
        message.transfer_encoding(),
        ContentTransferEncoding::_7Bit
    );
}

#[test]
fn test_message_from_reader() {
    let from_reader = Message::from_reader(RAW, &MimeSettings::default()).unwrap();
    let from_bytes = Message::try_from(RAW).unwrap();
    assert_eq!(from_reader, from_bytes);
    assert_eq!(from_reader.to_bytes().unwrap(), RAW);
}

#[test]
fn test_message_address_strictness() {
    let raw = b"From: joe@x.com\r\nTo: a b c@x.com\r\n\r\n";
    let mut settings = MimeSettings::default();
    let message = Message::from_bytes(raw, &settings).unwrap();
    assert_eq!(message.recipients(RecipientType::To).unwrap().len(), 1);

    settings.header_strictness = Strictness::Strict;
    let message = Message::from_bytes(raw, &settings).unwrap();
    let err = message.recipients(RecipientType::To).unwrap_err();
    assert!(err.kind.is_address_syntax());
    assert_eq!(err.summary, "Could not parse To header");
    /* other headers are still usable */
    assert_eq!(message.from().unwrap()[0].address(), "joe@x.com");
}

#[test]
fn test_message_set_headers() {
    let mut message = Message::new(MimeSettings::default());
    let joe = InternetAddress::with_personal("joe@x.com", "Joe", None).unwrap();
    message.set_from(Some(&joe)).unwrap();
    assert_eq!(message.headers().get(HeaderName::FROM), Some("Joe <joe@x.com>"));
    assert_eq!(message.from().unwrap(), vec![joe]);
    message.set_from(None).unwrap();
    assert!(!message.headers().contains_key(HeaderName::FROM));
    assert!(message.from().unwrap().is_empty());

    let recipients = (0..8)
        .map(|i| InternetAddress::new(&format!("recipient{}@example.com", i)).unwrap())
        .collect::<Vec<_>>();
    message
        .set_recipients(RecipientType::To, &recipients[..4])
        .unwrap();
    message
        .add_recipients(RecipientType::To, &recipients[4..])
        .unwrap();
    // An address goes on the current line while `used + len + 1` stays
    // within the fold column, so a line may reach 73 with its comma.
    assert_eq!(
        message.headers().get(HeaderName::TO),
        Some(
            "recipient0@example.com, recipient1@example.com,\r\n  \
             recipient2@example.com, recipient3@example.com, recipient4@example.com,\r\n  \
             recipient5@example.com, recipient6@example.com, recipient7@example.com"
        )
    );
    assert_eq!(message.recipients(RecipientType::To).unwrap(), recipients);
    message.set_recipients(RecipientType::To, &[]).unwrap();
    assert!(!message.headers().contains_key(HeaderName::TO));

    message.set_subject(Some("plain subject")).unwrap();
    assert_eq!(
        message.headers().get(HeaderName::SUBJECT),
        Some("plain subject")
    );
    message.set_subject(Some("Grüße")).unwrap();
    assert!(message
        .headers()
        .get(HeaderName::SUBJECT)
        .unwrap()
        .starts_with("=?UTF-8?"));
    assert_eq!(message.subject().unwrap().as_deref(), Some("Grüße"));
    message.set_subject(None).unwrap();
    assert_eq!(message.subject().unwrap(), None);

    let date = FixedOffset::west_opt(5 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 2, 29, 23, 59, 0)
        .unwrap();
    message.set_sent_date(Some(date)).unwrap();
    assert_eq!(
        message.headers().get(HeaderName::DATE),
        Some("Thu, 29 Feb 2024 23:59:00 -0500")
    );
    assert_eq!(message.sent_date().unwrap(), Some(date));
}

#[test]
fn test_message_invalid_date() {
    let message =
        Message::from_bytes(b"Date: yesterday\r\n\r\n", &MimeSettings::default()).unwrap();
    assert_eq!(message.sent_date().unwrap_err().kind, ErrorKind::Parse);
}

#[test]
fn test_message_content_round_trip() {
    let codec = DefaultTransferCodec;
    let mut message = Message::new(MimeSettings::default());
    message
        .set_content(
            &Content::from("Grüße aus Köln\r\n"),
            &ContentType::new("text", "plain"),
            registry(),
            &codec,
        )
        .unwrap();
    assert_eq!(
        message.headers().get(HeaderName::CONTENT_TYPE),
        Some("text/plain; charset=utf-8")
    );
    assert_eq!(
        message.headers().get(HeaderName::CONTENT_TRANSFER_ENCODING),
        Some("quoted-printable")
    );
    assert_eq!(message.headers().get(HeaderName::MIME_VERSION), Some("1.0"));
    assert_eq!(message.body(), b"Gr=C3=BC=C3=9Fe aus K=C3=B6ln\r\n");
    assert_eq!(
        message.content(registry(), &codec).unwrap(),
        Content::Text("Grüße aus Köln\r\n".to_string())
    );

    let mut latin1 = ContentType::new("text", "plain");
    latin1.set_parameter("charset", "iso-8859-1");
    message
        .set_content(&Content::from("Grüße aus Köln"), &latin1, registry(), &codec)
        .unwrap();
    assert_eq!(message.body(), b"Gr=FC=DFe aus K=F6ln");
    assert_eq!(
        message.content(registry(), &codec).unwrap().as_text(),
        Some("Grüße aus Köln")
    );
}

#[test]
fn test_message_set_content_failure_keeps_message() {
    let codec = DefaultTransferCodec;
    let mut message = Message::from_bytes(RAW, &MimeSettings::default()).unwrap();
    let before = message.clone();
    let mut ascii = ContentType::new("text", "plain");
    ascii.set_parameter("charset", "us-ascii");
    let err = message
        .set_content(&Content::from("naïve"), &ascii, registry(), &codec)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnsupportedEncoding);
    let err = message
        .set_content(
            &Content::Bytes(vec![1, 2, 3]),
            &ContentType::new("text", "plain"),
            registry(),
            &codec,
        )
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnsupportedContentType);
    assert_eq!(message, before);
}

#[test]
fn test_message_nested_inherits_settings() {
    let mut settings = MimeSettings::default();
    settings.header_strictness = Strictness::NonStrict;
    let raw = b"Content-Type: message/rfc822\r\n\r\n\
From: inner@x.com\r\n\
To: a@x.com b@x.com\r\n\
\r\n\
inner body\r\n";
    let outer = Message::from_bytes(raw, &settings).unwrap();
    let content = outer.content(registry(), &DefaultTransferCodec).unwrap();
    let inner = content.as_message().unwrap();
    assert_eq!(inner.settings(), &settings);
    assert_eq!(inner.body(), b"inner body\r\n");
    /* whitespace separated addresses are only accepted in NonStrict mode */
    assert_eq!(inner.recipients(RecipientType::To).unwrap().len(), 2);

    let mut rewrapped = Message::new(settings.clone());
    rewrapped
        .set_content(
            &content,
            &ContentType::new("message", "rfc822"),
            registry(),
            &DefaultTransferCodec,
        )
        .unwrap();
    assert_eq!(
        rewrapped.transfer_encoding(),
        ContentTransferEncoding::_7Bit
    );
    assert_eq!(rewrapped.body(), &raw[32..]);
}

#[test]
fn test_message_binary_content_round_trip() {
    let codec = DefaultTransferCodec;
    let bytes = b"line one\nline two\0\nend".to_vec();
    let mut message = Message::new(MimeSettings::default());
    message
        .set_content(
            &Content::Bytes(bytes.clone()),
            &ContentType::new("application", "octet-stream"),
            registry(),
            &codec,
        )
        .unwrap();
    assert_eq!(message.transfer_encoding(), ContentTransferEncoding::Base64);
    assert_eq!(
        message.content(registry(), &codec).unwrap(),
        Content::Bytes(bytes)
    );
}

#[test]
fn test_message_base64_body() {
    let raw = b"Content-Type: application/octet-stream\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
AAEC/w==\r\n";
    let message = Message::from_bytes(raw, &MimeSettings::default()).unwrap();
    assert_eq!(
        message.content(registry(), &DefaultTransferCodec).unwrap(),
        Content::Bytes(vec![0, 1, 2, 255])
    );
    let message = Message::from_bytes(
        b"Content-Transfer-Encoding: x-uuencode\r\n\r\nbegin 644 x\r\n",
        &MimeSettings::default(),
    )
    .unwrap();
    assert_eq!(
        message
            .content(registry(), &DefaultTransferCodec)
            .unwrap_err()
            .kind,
        ErrorKind::UnsupportedEncoding
    );
}
