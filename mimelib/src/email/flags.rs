/*
 * meli - mimelib flags module
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

//! Message state: a fixed set of system [`Flag`]s plus any number of
//! case-insensitive user flags, combined in [`Flags`].
//!
//! ```rust
//! use mimelib::email::flags::{Flag, Flags};
//!
//! let mut flags = Flags::from(Flag::SEEN);
//! flags.add("$Forwarded");
//! assert!(flags.contains("$forwarded"));
//! assert!(flags.contains(Flag::SEEN));
//! assert_eq!(flags.user_flags(), vec!["$Forwarded"]);
//! ```

use std::{
    collections::HashMap,
    hash::{Hash, Hasher},
};

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
    pub struct Flag: u32 {
        const ANSWERED = 0x0000_0001;
        const DELETED  = 0x0000_0002;
        const DRAFT    = 0x0000_0004;
        const FLAGGED  = 0x0000_0008;
        const RECENT   = 0x0000_0010;
        const SEEN     = 0x0000_0020;
        /// The folder supports user-defined flags.
        const USER     = 0x8000_0000;
    }
}

impl PartialEq<&str> for Flag {
    fn eq(&self, other: &&str) -> bool {
        (other.eq_ignore_ascii_case("answered") && self.contains(Self::ANSWERED))
            || (other.eq_ignore_ascii_case("deleted") && self.contains(Self::DELETED))
            || (other.eq_ignore_ascii_case("draft") && self.contains(Self::DRAFT))
            || (other.eq_ignore_ascii_case("flagged") && self.contains(Self::FLAGGED))
            || (other.eq_ignore_ascii_case("recent") && self.contains(Self::RECENT))
            || (other.eq_ignore_ascii_case("seen") && self.contains(Self::SEEN))
            || (other.eq_ignore_ascii_case("user") && self.contains(Self::USER))
    }
}

macro_rules! flag_impl {
    (fn $name:ident, $val:expr) => {
        pub const fn $name(&self) -> bool {
            self.contains($val)
        }
    };
}

impl Flag {
    /// Every system flag, in the order [`Flags::system_flags`] reports them.
    pub const ORDERED: [Self; 7] = [
        Self::ANSWERED,
        Self::DELETED,
        Self::DRAFT,
        Self::FLAGGED,
        Self::RECENT,
        Self::SEEN,
        Self::USER,
    ];

    flag_impl!(fn is_answered, Self::ANSWERED);
    flag_impl!(fn is_deleted, Self::DELETED);
    flag_impl!(fn is_draft, Self::DRAFT);
    flag_impl!(fn is_flagged, Self::FLAGGED);
    flag_impl!(fn is_recent, Self::RECENT);
    flag_impl!(fn is_seen, Self::SEEN);
}

/// A set of system flags and user flags.
///
/// User flags are compared case-insensitively but keep the spelling they were
/// first added with.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Flags {
    system: Flag,
    /// Lower case key to display form.
    user: HashMap<String, String>,
}

/// Anything that can be added to, removed from, or looked up in a [`Flags`]
/// set: a [`Flag`], a user flag name or another [`Flags`].
pub trait FlagOperand {
    fn add_to(self, flags: &mut Flags);
    fn remove_from(self, flags: &mut Flags);
    fn is_contained_in(self, flags: &Flags) -> bool;
}

impl FlagOperand for Flag {
    fn add_to(self, flags: &mut Flags) {
        flags.system |= self;
    }

    fn remove_from(self, flags: &mut Flags) {
        flags.system &= !self;
    }

    /// True if any of the given bits is set.
    fn is_contained_in(self, flags: &Flags) -> bool {
        flags.system.intersects(self)
    }
}

impl FlagOperand for &str {
    fn add_to(self, flags: &mut Flags) {
        // The latest spelling is the one displayed.
        flags.user.insert(self.to_lowercase(), self.to_string());
    }

    fn remove_from(self, flags: &mut Flags) {
        flags.user.remove(&self.to_lowercase());
    }

    fn is_contained_in(self, flags: &Flags) -> bool {
        flags.user.contains_key(&self.to_lowercase())
    }
}

impl FlagOperand for &String {
    fn add_to(self, flags: &mut Flags) {
        self.as_str().add_to(flags)
    }

    fn remove_from(self, flags: &mut Flags) {
        self.as_str().remove_from(flags)
    }

    fn is_contained_in(self, flags: &Flags) -> bool {
        self.as_str().is_contained_in(flags)
    }
}

impl FlagOperand for &Flags {
    fn add_to(self, flags: &mut Flags) {
        flags.system |= self.system;
        for (key, display) in &self.user {
            flags.user.insert(key.clone(), display.clone());
        }
    }

    fn remove_from(self, flags: &mut Flags) {
        flags.system &= !self.system;
        flags.user.retain(|key, _| !self.user.contains_key(key));
    }

    /// True if every system flag and every user flag of `self` is set.
    fn is_contained_in(self, flags: &Flags) -> bool {
        flags.system.contains(self.system)
            && self.user.keys().all(|key| flags.user.contains_key(key))
    }
}

impl Flags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<T: FlagOperand>(&mut self, flag: T) {
        flag.add_to(self);
    }

    pub fn remove<T: FlagOperand>(&mut self, flag: T) {
        flag.remove_from(self);
    }

    pub fn contains<T: FlagOperand>(&self, flag: T) -> bool {
        flag.is_contained_in(self)
    }

    /// Keep only what `other` holds: the system flags become exactly
    /// `other`'s, user flags missing from `other` are dropped. Returns whether
    /// anything changed.
    pub fn retain_all(&mut self, other: &Self) -> bool {
        let mut changed = false;
        if self.system != other.system {
            self.system = other.system;
            changed = true;
        }
        let before = self.user.len();
        self.user.retain(|key, _| other.user.contains_key(key));
        changed || before != self.user.len()
    }

    pub fn clear_system_flags(&mut self) {
        self.system = Flag::empty();
    }

    pub fn clear_user_flags(&mut self) {
        self.user.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.system.is_empty() && self.user.is_empty()
    }

    /// The raw system flag bits.
    pub fn bits(&self) -> Flag {
        self.system
    }

    /// Set system flags in the order of [`Flag::ORDERED`].
    pub fn system_flags(&self) -> Vec<Flag> {
        Flag::ORDERED
            .into_iter()
            .filter(|flag| self.system.contains(*flag))
            .collect()
    }

    /// User flags as they were spelled when added, in no particular order.
    pub fn user_flags(&self) -> Vec<&str> {
        self.user.values().map(String::as_str).collect()
    }
}

impl PartialEq for Flags {
    fn eq(&self, other: &Self) -> bool {
        self.system == other.system
            && self.user.len() == other.user.len()
            && self.user.keys().all(|key| other.user.contains_key(key))
    }
}

impl Eq for Flags {}

impl Hash for Flags {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.system.hash(state);
        let mut keys = self.user.keys().collect::<Vec<_>>();
        keys.sort_unstable();
        keys.hash(state);
    }
}

impl From<Flag> for Flags {
    fn from(system: Flag) -> Self {
        Self {
            system,
            ..Self::default()
        }
    }
}

impl From<&str> for Flags {
    fn from(user_flag: &str) -> Self {
        let mut ret = Self::default();
        ret.add(user_flag);
        ret
    }
}
