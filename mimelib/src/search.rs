/*
 * meli - mimelib search module
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

//! Predicates over messages.
//!
//! ```rust
//! use mimelib::{
//!     search::{Query, QueryTrait},
//!     Message, MimeSettings, RecipientType,
//! };
//!
//! let message = Message::from_bytes(
//!     b"From: Joe <joe@example.com>\r\nTo: ann@example.com\r\n\r\n",
//!     &MimeSettings::default(),
//! )
//! .unwrap();
//! let query = Query::FromString("JOE".into())
//!     .and(Query::RecipientString(RecipientType::To, "ann@".into()));
//! assert!(message.is_match(&query));
//! assert!(!message.is_match(&query.not()));
//! ```

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use Query::*;

use crate::email::{
    address::InternetAddress,
    encodings::decode_header_value,
    headers::HeaderName,
    message::{Message, RecipientType},
};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Comparison {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

impl Comparison {
    /// Whether `lhs` is `self` relative to `rhs`, eg. `Lt.holds(1, 2)`.
    pub fn holds<T: Ord>(&self, lhs: T, rhs: T) -> bool {
        let ord = lhs.cmp(&rhs);
        match self {
            Self::Lt => ord == Ordering::Less,
            Self::Le => ord != Ordering::Greater,
            Self::Eq => ord == Ordering::Equal,
            Self::Ne => ord != Ordering::Equal,
            Self::Ge => ord != Ordering::Less,
            Self::Gt => ord == Ordering::Greater,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Query {
    /// An author equal to this address.
    From(InternetAddress),
    /// An author whose unicode form contains this text, case insensitively.
    FromString(String),
    Recipient(RecipientType, InternetAddress),
    RecipientString(RecipientType, String),
    /// Decoded subject contains this text, case insensitively.
    Subject(String),
    /// Decoded value of a field contains this text, case insensitively.
    Header(HeaderName, String),
    /// `Date` compared to an instant.
    SentDate(Comparison, DateTime<FixedOffset>),
    And(Box<Query>, Box<Query>),
    Or(Box<Query>, Box<Query>),
    Not(Box<Query>),
}

impl Query {
    pub fn and(self, other: Self) -> Self {
        And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Self) -> Self {
        Or(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Not(Box::new(self))
    }
}

pub trait QueryTrait {
    fn is_match(&self, query: &Query) -> bool;
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn any_address(
    addresses: crate::Result<Vec<InternetAddress>>,
    pred: impl Fn(&InternetAddress) -> bool,
) -> bool {
    match addresses {
        Ok(addresses) => addresses.iter().any(pred),
        Err(err) => {
            log::debug!("Search skips unparsable address field: {}", err);
            false
        }
    }
}

fn contains_address_text(address: &InternetAddress, needle: &str) -> bool {
    contains_ignore_case(&address.to_unicode_string(), needle)
}

impl QueryTrait for Message {
    fn is_match(&self, query: &Query) -> bool {
        match query {
            From(address) => any_address(self.from(), |a| a == address),
            FromString(s) => any_address(self.from(), |a| contains_address_text(a, s)),
            Recipient(kind, address) => any_address(self.recipients(*kind), |a| a == address),
            RecipientString(kind, s) => {
                any_address(self.recipients(*kind), |a| contains_address_text(a, s))
            }
            Subject(s) => <Self as QueryTrait>::is_match(
                self,
                &Query::Header(HeaderName::SUBJECT, s.to_string()),
            ),
            Header(name, needle) => self.headers().get_all(name).iter().any(|value| {
                match decode_header_value(value.as_bytes()) {
                    Ok(value) => contains_ignore_case(&value, needle),
                    Err(err) => {
                        log::debug!("Search skips undecodable {} field: {}", name, err);
                        false
                    }
                }
            }),
            SentDate(comparison, date) => match self.sent_date() {
                Ok(Some(sent)) => comparison.holds(sent, *date),
                Ok(None) => false,
                Err(err) => {
                    log::debug!("Search skips unparsable date: {}", err);
                    false
                }
            },
            And(q_a, q_b) => self.is_match(q_a) && self.is_match(q_b),
            Or(q_a, q_b) => self.is_match(q_a) || self.is_match(q_b),
            Not(q) => !self.is_match(q),
        }
    }
}
