//-
// Copyright (c) 2024, the davhome authors
//
// This file is part of davhome.
//
// davhome is free software: you can  redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// davhome is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// davhome. If not, see <http://www.gnu.org/licenses/>.

//! Generic record persistence.
//!
//! Records are flat maps of string fields. Each record belongs to one of a
//! fixed set of kinds, and the kind decides which fields exist; reading or
//! writing any other field is `Error::NoSuchField`. The account layer builds
//! its typed entities on top of this and never touches SQL.
//!
//! Two stores are provided: `MemoryStore`, used by tests and anything that
//! doesn't need durability, and `SqliteStore`, used by the CLI. Both support
//! `atomically()`, which the account layer relies on to make its cascading
//! operations all-or-nothing.

mod memory;
mod query;
mod record;
mod sqlite;

use std::fmt;

pub use self::memory::MemoryStore;
pub use self::query::{Query, ResultSet};
pub use self::record::Record;
pub use self::sqlite::SqliteStore;

use crate::support::error::Error;

/// The primary key of a stored record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKind {
    User,
    Principal,
    Calendar,
    AddressBook,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::User,
        RecordKind::Principal,
        RecordKind::Calendar,
        RecordKind::AddressBook,
    ];

    pub fn table(self) -> &'static str {
        match self {
            RecordKind::User => "users",
            RecordKind::Principal => "principals",
            RecordKind::Calendar => "calendars",
            RecordKind::AddressBook => "addressbooks",
        }
    }

    /// The fields carried by records of this kind, excluding the primary key.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            RecordKind::User => &["username", "digesta1"],
            RecordKind::Principal => &["uri", "email", "displayname"],
            RecordKind::Calendar => &[
                "principaluri",
                "displayname",
                "uri",
                "description",
                "components",
                "calendarcolor",
            ],
            RecordKind::AddressBook => {
                &["principaluri", "displayname", "uri", "description"]
            },
        }
    }

    /// Return the canonical `'static` name of `field`, or `None` if records
    /// of this kind do not have it.
    pub fn field(self, field: &str) -> Option<&'static str> {
        self.fields().iter().copied().find(|&f| f == field)
    }

    pub fn knows(self, field: &str) -> bool {
        self.field(field).is_some()
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.table())
    }
}

/// The persistence contract consumed by the account layer.
pub trait RecordStore {
    /// Load the record of the given kind with the given primary key.
    ///
    /// Returns `Error::NotFound` if there is no such record.
    fn load(&mut self, kind: RecordKind, id: RecordId)
        -> Result<Record, Error>;

    /// Insert `record` if it is floating, assigning it a primary key, or
    /// update the stored copy otherwise.
    ///
    /// Returns `Error::NotFound` if a non-floating record no longer exists.
    fn save(&mut self, record: &mut Record) -> Result<(), Error>;

    /// Delete the stored copy of `record`.
    ///
    /// Returns `Error::Floating` if the record was never stored, and
    /// `Error::NotFound` if it has already been deleted.
    fn delete(&mut self, record: &Record) -> Result<(), Error>;

    /// Return every record matching `query`, ordered by primary key.
    fn execute(&mut self, query: &Query) -> Result<ResultSet, Error>;

    /// Run `f` such that either all of its changes to the store take effect
    /// or, if it returns an error, none of them do.
    ///
    /// Nested calls join the outermost one.
    fn atomically<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error>;
}
