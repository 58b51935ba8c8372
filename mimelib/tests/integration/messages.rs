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


use mimelib::{
    email::content::registry,
    search::{Comparison, Query, QueryTrait},
    Content, ContentType, DefaultTransferCodec, ErrorKind, InternetAddress, Message,
    MimeSettings, RecipientType,
};

const RAW: &[u8] = b"Return-Path: <owner@lists.example.org>\r\n\
Received: from mx1.example.org by mail.example.com; Mon, 3 Jun 2024 07:00:05 +0000\r\n\
Received: from localhost by mx1.example.org; Mon, 3 Jun 2024 07:00:01 +0000\r\n\
From: =?ISO-8859-1?Q?Andr=E9?= Pirard <PIRARD@vm1.ulg.ac.be>\r\n\
To: undisclosed-recipients:;\r\n\
Subject: =?ISO-8859-1?B?SWYgeW91IGNhbiByZWFkIHRoaXMgeW8=?=\r\n \
=?ISO-8859-2?B?dSB1bmRlcnN0YW5kIHRoZSBleGFtcGxlLg==?=\r\n\
Date: Mon, 3 Jun 2024 09:00:00 +0200\r\n\
MIME-Version: 1.0\r\n\
Content-Type: text/plain; charset=ISO-8859-1\r\n\
Content-Transfer-Encoding: quoted-printable\r\n\
\r\n\
Voil=E0 un message =\r\n\
cod=E9.\r\n";

#[test]
fn test_read_message() {
    let message = Message::from_reader(RAW, &MimeSettings::default()).unwrap();
    assert_eq!(message.headers().get_all("received").len(), 2);

    let from = message.from().unwrap();
    assert_eq!(from[0].personal(), Some("André Pirard"));
    assert_eq!(from[0].address(), "PIRARD@vm1.ulg.ac.be");

    let to = message.recipients(RecipientType::To).unwrap();
    assert_eq!(to.len(), 1);
    assert!(to[0].is_group());
    assert_eq!(to[0].get_group(true).unwrap(), Some(vec![]));

    assert_eq!(
        message.subject().unwrap().as_deref(),
        Some("If you can read this you understand the example.")
    );

    let content = message.content(registry(), &DefaultTransferCodec).unwrap();
    assert_eq!(content, Content::Text("Voilà un message codé.\r\n".into()));
}

#[test]
fn test_search_message() {
    let message = Message::from_bytes(RAW, &MimeSettings::default()).unwrap();
    let pirard = InternetAddress::new("pirard@VM1.ulg.ac.be").unwrap();
    let query = Query::From(pirard)
        .and(Query::Subject("understand".into()))
        .and(Query::SentDate(
            Comparison::Eq,
            chrono::DateTime::parse_from_rfc3339("2024-06-03T07:00:00Z").unwrap(),
        ));
    assert!(message.is_match(&query));
    assert!(!message.is_match(&Query::FromString("andre".into())));
    assert!(message.is_match(&Query::FromString("andré".into())));
}

#[test]
fn test_reply() {
    let original = Message::from_bytes(RAW, &MimeSettings::default()).unwrap();
    let mut reply = Message::new(original.settings().clone());
    let me = InternetAddress::with_personal("me@example.com", "Me", None).unwrap();
    reply.set_from(Some(&me)).unwrap();
    reply
        .set_recipients(RecipientType::To, &original.reply_to().unwrap())
        .unwrap();
    reply
        .set_subject(Some(
            format!("Re: {}", original.subject().unwrap().unwrap_or_default()).as_str(),
        ))
        .unwrap();
    reply
        .set_content(
            &Content::from("Merci!\r\n"),
            &ContentType::new("text", "plain"),
            registry(),
            &DefaultTransferCodec,
        )
        .unwrap();

    let bytes = reply.to_bytes().unwrap();
    assert_eq!(
        String::from_utf8(bytes.clone()).unwrap(),
        "From: Me <me@example.com>\r\n\
To: =?ISO-8859-1?Q?Andr=E9?= Pirard <PIRARD@vm1.ulg.ac.be>\r\n\
Subject: Re: If you can read this you understand the example.\r\n\
MIME-Version: 1.0\r\n\
Content-Type: text/plain; charset=us-ascii\r\n\
Content-Transfer-Encoding: 7bit\r\n\
\r\n\
Merci!\r\n"
    );

    let parsed = Message::from_bytes(&bytes, reply.settings()).unwrap();
    assert_eq!(parsed, reply);
    assert_eq!(
        parsed.recipients(RecipientType::To).unwrap()[0].personal(),
        Some("André Pirard")
    );
}

#[test]
fn test_duplicate_fields_are_rejected() {
    let err = Message::from_bytes(
        b"Subject: one\r\nSubject: two\r\n\r\n",
        &MimeSettings::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateHeader);
}
