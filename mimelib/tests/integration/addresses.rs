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
    email::address::{
        format_address_list, parse_address, parse_address_list, SyntaxErrorKind,
    },
    ErrorKind, InternetAddress, Strictness,
};

#[test]
fn test_address_header_round_trip() {
    let header = "Pete(A wonderful \\) chap) <pete(his account)@silly.test(his host)>, \
                  A Group:Ed Jones <c@a.test>,joe@where.test,John <jdoe@one.test>;, \
                  \"Mary Smith\" <mary@x.test>, (Chris) chris@example.org";
    let addresses = parse_address_list(header, Strictness::ParseHeader).unwrap();
    assert_eq!(addresses.len(), 4);

    assert_eq!(addresses[0].address(), "pete@silly.test");
    assert_eq!(addresses[0].personal(), Some("Pete"));

    assert!(addresses[1].is_group());
    let members = addresses[1].get_group(false).unwrap().unwrap();
    assert_eq!(
        members
            .iter()
            .map(InternetAddress::address)
            .collect::<Vec<_>>(),
        vec!["c@a.test", "joe@where.test", "jdoe@one.test"]
    );

    assert_eq!(addresses[2].personal(), Some("Mary Smith"));
    assert_eq!(addresses[3].personal(), Some("Chris"));

    let formatted = format_address_list(&addresses, "To: ".len());
    let reparsed = parse_address_list(&formatted, Strictness::Strict).unwrap();
    assert_eq!(reparsed, addresses);
    assert_eq!(
        reparsed
            .iter()
            .map(|a| a.personal().map(str::to_string))
            .collect::<Vec<_>>(),
        addresses
            .iter()
            .map(|a| a.personal().map(str::to_string))
            .collect::<Vec<_>>()
    );
}

#[test]
fn test_address_strictness_levels() {
    for (input, strict, non_strict, header) in [
        ("joe", false, true, true),
        ("joe@x.com bob@y.com", false, true, true),
        ("Joe <joe@x.com", false, false, true),
        ("<>", false, false, true),
        ("a@b.c; d@e.f", false, false, true),
        ("joe@[127.0.0.1]", true, true, true),
    ] {
        assert_eq!(
            parse_address_list(input, Strictness::Strict).is_ok(),
            strict,
            "{input} strict"
        );
        assert_eq!(
            parse_address_list(input, Strictness::NonStrict).is_ok(),
            non_strict,
            "{input} non-strict"
        );
        assert_eq!(
            parse_address_list(input, Strictness::ParseHeader).is_ok(),
            header,
            "{input} parse-header"
        );
    }

    let err = parse_address_list("joe", Strictness::Strict).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::AddressSyntax {
            reason: SyntaxErrorKind::MissingDomain,
            strictness: Strictness::Strict,
        }
    );
    assert!(err.details.as_deref().unwrap_or_default().contains("\"joe\""));
}

#[test]
fn test_address_single() {
    let address = parse_address(" \"Joe\" <joe@x.com> ", Strictness::Strict).unwrap();
    assert_eq!(address.to_string(), "Joe <joe@x.com>");
    let err = parse_address("a@x.com, b@x.com", Strictness::Strict).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::AddressSyntax {
            reason: SyntaxErrorKind::MultipleAddresses,
            ..
        }
    ));
    let err = parse_address("", Strictness::ParseHeader).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::AddressSyntax {
            reason: SyntaxErrorKind::EmptyAddress,
            ..
        }
    ));
    assert_eq!("joe@x.com".parse::<InternetAddress>().unwrap(), address);
}

#[test]
fn test_address_personal_charsets() {
    let mut address =
        InternetAddress::with_personal("jm@example.de", "Jörg Müller", Some("iso-8859-1"))
            .unwrap();
    assert_eq!(
        address.to_string(),
        "=?windows-1252?Q?J=F6rg_M=FCller?= <jm@example.de>"
    );
    assert_eq!(address.to_unicode_string(), "Jörg Müller <jm@example.de>");

    let reparsed = parse_address(&address.to_string(), Strictness::Strict).unwrap();
    assert_eq!(reparsed.personal(), Some("Jörg Müller"));

    /* a charset that cannot hold the name leaves the address as it was */
    let err = address
        .set_personal(Some("Jörg 日本"), Some("iso-8859-1"))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnsupportedEncoding);
    assert_eq!(address.personal(), Some("Jörg Müller"));

    address.set_personal(None, None).unwrap();
    assert_eq!(address.to_string(), "jm@example.de");
}
