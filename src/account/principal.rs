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

use crate::store::{Query, Record, RecordId, RecordKind, RecordStore};
use crate::support::error::Error;

const PRINCIPAL_URI_PREFIX: &str = "principals/";

/// Return the URI of the principal belonging to `username`.
pub fn principal_uri(username: &str) -> String {
    format!("{}{}", PRINCIPAL_URI_PREFIX, username)
}

/// The protocol-level identity of an account.
///
/// Calendars and address books refer to their owner by the principal's URI.
/// The principal also carries the profile fields (`email`, `displayname`)
/// that DAV clients read through principal properties.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    record: Record,
}

impl Principal {
    /// Create a new, empty principal which has not been stored.
    pub fn floating() -> Self {
        Principal {
            record: Record::floating(RecordKind::Principal),
        }
    }

    /// Find the principal with the given URI.
    ///
    /// If there are several (which the SQLite schema forbids), the one with
    /// the lowest id wins.
    pub fn find_by_uri(
        store: &mut impl RecordStore,
        uri: &str,
    ) -> Result<Option<Self>, Error> {
        Ok(store
            .execute(&Query::new(RecordKind::Principal).where_eq("uri", uri))?
            .first()
            .map(|record| Principal { record }))
    }

    pub fn id(&self) -> Option<RecordId> {
        self.record.id()
    }

    pub(super) fn set_id(&mut self, id: Option<RecordId>) {
        self.record.set_id(id);
    }

    pub fn uri(&self) -> &str {
        self.record.get("uri").unwrap_or("")
    }

    pub fn knows(&self, field: &str) -> bool {
        self.record.knows(field)
    }

    pub fn get(&self, field: &str) -> Result<&str, Error> {
        self.record.get(field)
    }

    pub fn set(&mut self, field: &str, value: &str) -> Result<(), Error> {
        self.record.set(field, value).map(|_| ())
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
    fn uri_format() {
        assert_eq!("principals/jane", principal_uri("jane"));
        assert_eq!(
            "principals/jane@example.com",
            principal_uri("jane@example.com")
        );
    }

    #[test]
    fn persist_and_find() {
        let mut store = MemoryStore::new();
        let mut principal = Principal::floating();
        assert_eq!("", principal.uri());
        principal.set("uri", "principals/jane").unwrap();
        principal.set("email", "jane@example.com").unwrap();
        assert_matches!(
            Err(Error::NoSuchField(..)),
            principal.set("username", "jane")
        );
        principal.persist(&mut store).unwrap();
        assert!(principal.id().is_some());

        let found = Principal::find_by_uri(&mut store, "principals/jane")
            .unwrap()
            .unwrap();
        assert_eq!(principal, found);
        assert_eq!("jane@example.com", found.get("email").unwrap());

        assert_eq!(
            None,
            Principal::find_by_uri(&mut store, "principals/john").unwrap()
        );

        found.destroy(&mut store).unwrap();
        assert_eq!(
            None,
            Principal::find_by_uri(&mut store, "principals/jane").unwrap()
        );
    }
}
