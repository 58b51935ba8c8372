/*
 * meli - mimelib headers tests
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

use std::convert::TryFrom;

use super::*;

#[test]
fn test_email_headers_names_headername_display() {
    assert_eq!(&HeaderName::SUBJECT.to_string(), "Subject");
    assert_eq!(&HeaderName::CC.to_string(), "Cc");
    assert_eq!(&HeaderName::MESSAGE_ID.to_string(), "Message-ID");
    assert_eq!(
        &HeaderName::try_from("x-user-agent").unwrap().to_string(),
        "X-User-Agent"
    );
    assert_eq!(
        &HeaderName::try_from("x-mime-autoconverted")
            .unwrap()
            .to_string(),
        "X-MIME-Autoconverted"
    );
    assert_eq!(
        &HeaderName::try_from("OTHER").unwrap().to_string(),
        "Other"
    );
    HeaderName::try_from("").unwrap_err();
    HeaderName::try_from("with space").unwrap_err();
    HeaderName::try_from("colon:").unwrap_err();
}

#[test]
fn test_email_headers_names_parse_standard_headers() {
    use super::names::TEST_HEADERS;

    for &(standard, name) in TEST_HEADERS {
        assert_eq!(
            HeaderName::from_bytes(name.to_ascii_lowercase().as_bytes()).unwrap(),
            HeaderName::from(standard)
        );
        assert_eq!(
            HeaderName::from_bytes(name.to_ascii_uppercase().as_bytes()).unwrap(),
            HeaderName::from(standard)
        );
        assert!(HeaderName::from(standard).is_standard());
        assert_eq!(
            HeaderName::from(standard).is_repeatable(),
            matches!(
                standard,
                StandardHeader::Received | StandardHeader::ReturnPath
            )
        );
    }
}

#[test]
fn test_email_headers_case_sensitivity() {
    let mut headers = HeaderMap::default();
    headers.add_header("from", "Myself <a@b.c>").unwrap();
    assert_eq!(headers.get("From"), Some("Myself <a@b.c>"));
    assert_eq!(headers.get("From"), headers.get("from"));
    assert_eq!(headers.get("fROm"), headers.get("from"));
    assert_eq!(headers.get(HeaderName::FROM), headers.get("from"));
    headers.set_header("frOM", "nada").unwrap();
    assert_eq!(headers.get("From"), Some("nada"));
    assert_eq!(headers.len(), 1);

    headers.add_header("X-Custom", "1").unwrap();
    assert!(headers.contains_key("x-CUSTOM"));
    assert!(!headers.contains_key("not a valid name"));
    assert_eq!(headers.get("x-custom"), Some("1"));
}

#[test]
fn test_email_headers_duplicates() {
    let mut headers = HeaderMap::new();
    headers.add_header("Other", "first").unwrap();
    let err = headers.add_header("Other", "second").unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateHeader);
    assert_eq!(
        err.summary,
        "Header map cannot contain more than one value for header: Other"
    );
    assert_eq!(headers.get_all("Other"), &["first".to_string()]);

    headers.add_header("Received", "from a").unwrap();
    headers.add_header("received", "from b").unwrap();
    headers.add_header("Return-Path", "<a@b>").unwrap();
    headers.add_header("Return-Path", "<c@d>").unwrap();
    assert_eq!(
        headers.get_all("Received"),
        &["from a".to_string(), "from b".to_string()]
    );
    assert_eq!(headers.get("Received"), Some("from a"));
    assert_eq!(headers.get_all("Return-Path").len(), 2);
    assert!(headers.get_all("Missing").is_empty());

    assert_eq!(
        headers.add_header("bad name", "x").unwrap_err().kind,
        ErrorKind::ValueError
    );
}

#[test]
fn test_email_headers_order_and_remove() {
    let mut headers = HeaderMap::new();
    headers.add_header("Received", "one").unwrap();
    headers.add_header("From", "a@b.c").unwrap();
    headers.add_header("Received", "two").unwrap();
    headers.add_header("Subject", "hi").unwrap();
    assert_eq!(
        headers
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>(),
        vec!["Received=one", "Received=two", "From=a@b.c", "Subject=hi"]
    );
    assert_eq!(headers.remove("from").unwrap().as_slice(), &["a@b.c"]);
    assert!(headers.remove("from").is_none());
    assert_eq!(
        headers.to_string(),
        "Received: one\r\nReceived: two\r\nSubject: hi\r\n"
    );
}

#[test]
fn test_email_headers_from_bytes() {
    let headers = HeaderMap::from_bytes(
        b"Received: from x\r\n\tby y\r\nReceived: from z\r\nSubject: Test\r\n\r\nbody",
    )
    .unwrap();
    assert_eq!(headers.get_all("received").len(), 2);
    assert_eq!(headers.get("received"), Some("from x\r\n\tby y"));
    assert_eq!(headers.get("subject"), Some("Test"));

    let err = HeaderMap::from_bytes(b"Other: a\r\nOther: b\r\n\r\n").unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateHeader);
}

#[test]
fn test_email_headers_load_and_write() {
    let raw = b"From: a@b.c\nSubject: hello\n world\n\nthe body\n";
    let mut reader = &raw[..];
    let mut headers = HeaderMap::new();
    headers.load(&mut reader).unwrap();
    assert_eq!(reader, b"the body\n");
    assert_eq!(headers.get("subject"), Some("hello\n world"));

    let mut out = vec![];
    headers.write_to(&mut out).unwrap();
    assert_eq!(out, b"From: a@b.c\r\nSubject: hello\n world\r\n");

    let mut reader = &b"not a header\n\n"[..];
    assert_eq!(
        HeaderMap::new().load(&mut reader).unwrap_err().kind,
        ErrorKind::Parse
    );
}
