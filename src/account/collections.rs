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

//! Calendars and address books, as far as account management cares about
//! them: creating the default collections and finding or destroying the
//! collections a principal owns.
//!
//! Calendar objects and contacts inside these collections are managed by the
//! DAV server and are not touched here. In particular, destroying a
//! collection does not remove its contents.

use crate::store::{Query, Record, RecordKind, RecordStore};
use crate::support::error::Error;

/// The local URI of the collections created with every account.
pub const DEFAULT_COLLECTION_URI: &str = "default";

/// The component types supported by the default calendar.
pub const DEFAULT_CALENDAR_COMPONENTS: &str = "VEVENT,VTODO";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Calendar {
    record: Record,
}

impl Calendar {
    /// Create (but don't store) the default calendar for the given principal.
    pub fn new_default(principal_uri: &str) -> Result<Self, Error> {
        let mut record = Record::floating(RecordKind::Calendar);
        record
            .set("principaluri", principal_uri)?
            .set("displayname", "Default calendar")?
            .set("uri", DEFAULT_COLLECTION_URI)?
            .set("description", "Default calendar")?
            .set("components", DEFAULT_CALENDAR_COMPONENTS)?;
        Ok(Calendar { record })
    }

    /// A query for all calendars owned by the given principal.
    pub fn owned_by(principal_uri: &str) -> Query {
        Query::new(RecordKind::Calendar).where_eq("principaluri", principal_uri)
    }

    pub fn from_record(record: Record) -> Self {
        debug_assert_eq!(RecordKind::Calendar, record.kind());
        Calendar { record }
    }

    pub fn get(&self, field: &str) -> &str {
        self.record.get(field).unwrap_or("")
    }

    pub fn uri(&self) -> &str {
        self.get("uri")
    }

    pub fn display_name(&self) -> &str {
        self.get("displayname")
    }

    pub fn components(&self) -> impl Iterator<Item = &str> + '_ {
        self.get("components").split(',').filter(|c| !c.is_empty())
    }

    pub fn persist(
        &mut self,
        store: &mut impl RecordStore,
    ) -> Result<(), Error> {
        store.save(&mut self.record)
    }

    pub fn destroy(&self, store: &mut impl RecordStore) -> Result<(), Error> {
        store.delete(&self.record)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressBook {
    record: Record,
}

impl AddressBook {
    /// Create (but don't store) the default address book for the given
    /// principal, whose owner is called `owner_name`.
    pub fn new_default(
        principal_uri: &str,
        owner_name: &str,
    ) -> Result<Self, Error> {
        let mut record = Record::floating(RecordKind::AddressBook);
        record
            .set("principaluri", principal_uri)?
            .set("displayname", "Default Address Book")?
            .set("uri", DEFAULT_COLLECTION_URI)?
            .set(
                "description",
                format!("Default Address Book for {}", owner_name),
            )?;
        Ok(AddressBook { record })
    }

    /// A query for all address books owned by the given principal.
    pub fn owned_by(principal_uri: &str) -> Query {
        Query::new(RecordKind::AddressBook)
            .where_eq("principaluri", principal_uri)
    }

    pub fn from_record(record: Record) -> Self {
        debug_assert_eq!(RecordKind::AddressBook, record.kind());
        AddressBook { record }
    }

    pub fn get(&self, field: &str) -> &str {
        self.record.get(field).unwrap_or("")
    }

    pub fn uri(&self) -> &str {
        self.get("uri")
    }

    pub fn display_name(&self) -> &str {
        self.get("displayname")
    }

    pub fn persist(
        &mut self,
        store: &mut impl RecordStore,
    ) -> Result<(), Error> {
        store.save(&mut self.record)
    }

    pub fn destroy(&self, store: &mut impl RecordStore) -> Result<(), Error> {
        store.delete(&self.record)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn default_calendar() {
        let calendar = Calendar::new_default("principals/jane").unwrap();
        assert_eq!("default", calendar.uri());
        assert_eq!("Default calendar", calendar.display_name());
        assert_eq!("Default calendar", calendar.get("description"));
        assert_eq!("principals/jane", calendar.get("principaluri"));
        assert_eq!(
            vec!["VEVENT", "VTODO"],
            calendar.components().collect::<Vec<_>>()
        );
    }

    #[test]
    fn default_address_book() {
        let book =
            AddressBook::new_default("principals/jane", "Jane Doe").unwrap();
        assert_eq!("default", book.uri());
        assert_eq!("Default Address Book", book.display_name());
        assert_eq!(
            "Default Address Book for Jane Doe",
            book.get("description")
        );
        assert_eq!("principals/jane", book.get("principaluri"));
    }

    #[test]
    fn owned_by_selects_only_that_principal() {
        let mut store = MemoryStore::new();
        Calendar::new_default("principals/jane")
            .unwrap()
            .persist(&mut store)
            .unwrap();
        Calendar::new_default("principals/john")
            .unwrap()
            .persist(&mut store)
            .unwrap();
        AddressBook::new_default("principals/jane", "Jane")
            .unwrap()
            .persist(&mut store)
            .unwrap();

        let calendars = store
            .execute(&Calendar::owned_by("principals/jane"))
            .unwrap();
        assert_eq!(1, calendars.len());
        let calendar = Calendar::from_record(calendars.first().unwrap());
        assert_eq!("principals/jane", calendar.get("principaluri"));

        calendar.destroy(&mut store).unwrap();
        assert!(store
            .execute(&Calendar::owned_by("principals/jane"))
            .unwrap()
            .is_empty());
        assert_eq!(
            1,
            store
                .execute(&AddressBook::owned_by("principals/jane"))
                .unwrap()
                .len()
        );
    }
}
