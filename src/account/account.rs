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

//! User accounts.
//!
//! An account is two records kept in step with each other: the `users` row,
//! which holds the login name and password hash, and the principal, which is
//! the identity the DAV server exposes and which owns the profile fields.
//! `Account` presents both as a single set of properties. Fields the `users`
//! row knows are read and written there; everything else goes to the
//! principal.
//!
//! Creating an account also creates its principal, a default calendar, and a
//! default address book. Destroying it removes all of those plus any other
//! collections the principal owns. Both operations run inside
//! `RecordStore::atomically()`.

use log::{info, warn};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::collections::{AddressBook, Calendar};
use super::digest::DigestRealm;
use super::principal::{principal_uri, Principal};
use crate::store::{Query, Record, RecordId, RecordKind, RecordStore};
use crate::support::error::Error;
use crate::support::safe_name::is_safe_username;

/// Characters left alone by PHP-style `rawurlencode`: alphanumerics and
/// `-_.~`.
const RAWURLENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Write-only pseudo-property which sets the password hash.
const PASSWORD: &str = "password";
/// Pseudo-property for form confirmation; never stored.
const PASSWORD_CONFIRM: &str = "passwordconfirm";
const DIGEST_A1: &str = "digesta1";
const USERNAME: &str = "username";

#[derive(Clone, Debug)]
pub struct Account {
    record: Record,
    /// Accounts loaded from a store whose principal has gone missing have
    /// `None` here. Such an account can be read and destroyed but not
    /// persisted.
    principal: Option<Principal>,
    realm: DigestRealm,
}

impl Account {
    /// Create a new account which has not been stored, along with its
    /// principal.
    pub fn floating(realm: DigestRealm) -> Self {
        Account {
            record: Record::floating(RecordKind::User),
            principal: Some(Principal::floating()),
            realm,
        }
    }

    /// Load the account with the given primary key and its principal.
    ///
    /// Fails with `Error::NotFound` if there is no such account. A missing
    /// principal is not an error.
    pub fn load(
        store: &mut impl RecordStore,
        id: RecordId,
        realm: DigestRealm,
    ) -> Result<Self, Error> {
        let record = store.load(RecordKind::User, id)?;
        Self::bind(store, record, realm)
    }

    /// Load the account with the given user name.
    pub fn find_by_username(
        store: &mut impl RecordStore,
        username: &str,
        realm: DigestRealm,
    ) -> Result<Self, Error> {
        let record = store
            .execute(
                &Query::new(RecordKind::User).where_eq(USERNAME, username),
            )?
            .first()
            .ok_or_else(|| Error::NoSuchUser(username.to_owned()))?;
        Self::bind(store, record, realm)
    }

    /// Load every account, ordered by primary key.
    pub fn list(
        store: &mut impl RecordStore,
        realm: &DigestRealm,
    ) -> Result<Vec<Self>, Error> {
        let records = store.execute(&Query::new(RecordKind::User))?;
        let mut accounts = Vec::with_capacity(records.len());
        for record in records {
            accounts.push(Self::bind(store, record, realm.clone())?);
        }
        Ok(accounts)
    }

    fn bind(
        store: &mut impl RecordStore,
        record: Record,
        realm: DigestRealm,
    ) -> Result<Self, Error> {
        let uri = principal_uri(record.get(USERNAME)?);
        let principal = Principal::find_by_uri(store, &uri)?;
        if principal.is_none() {
            warn!(
                "Account {} has no principal at '{}'",
                record.id().map_or(0, |id| id.0),
                uri
            );
        }

        Ok(Account {
            record,
            principal,
            realm,
        })
    }

    pub fn id(&self) -> Option<RecordId> {
        self.record.id()
    }

    pub fn is_floating(&self) -> bool {
        self.record.is_floating()
    }

    pub fn username(&self) -> &str {
        self.get(USERNAME)
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// The URI of this account's principal, derived from the current user
    /// name.
    pub fn principal_uri(&self) -> String {
        principal_uri(self.username())
    }

    /// Read a property of the account or, failing that, of its principal.
    ///
    /// The password pseudo-properties always read as empty, as does any
    /// property neither record has.
    pub fn get(&self, prop: &str) -> &str {
        if PASSWORD == prop || PASSWORD_CONFIRM == prop {
            return "";
        }

        if self.record.knows(prop) {
            return self.record.get(prop).unwrap_or("");
        }

        self.principal
            .as_ref()
            .filter(|principal| principal.knows(prop))
            .and_then(|principal| principal.get(prop).ok())
            .unwrap_or("")
    }

    /// Write a property of the account or, failing that, of its principal.
    ///
    /// Setting `password` to a non-empty value replaces the password hash;
    /// the hash incorporates the user name, so the user name must be set
    /// first. An empty `password` and any `passwordconfirm` are ignored.
    /// `digesta1` cannot be set directly, and `username` is read-only once
    /// the account has been stored.
    ///
    /// A property unknown to both records is `Error::NoSuchField`, unless
    /// there is no principal, in which case the write is dropped.
    pub fn set(&mut self, prop: &str, value: &str) -> Result<&mut Self, Error> {
        match prop {
            PASSWORD => {
                if !value.is_empty() {
                    let hash = self.password_hash_for(value)?;
                    self.record.set(DIGEST_A1, hash)?;
                }
            },

            PASSWORD_CONFIRM => (),

            DIGEST_A1 => return Err(Error::DerivedField(prop.to_owned())),

            USERNAME if !self.is_floating() => {
                return Err(Error::ReadOnlyField(prop.to_owned()))
            },

            _ if self.record.knows(prop) => {
                self.record.set(prop, value)?;
            },

            _ => match self.principal {
                Some(ref mut principal) => principal.set(prop, value)?,
                None => warn!(
                    "Dropping write to '{}' on account '{}', which has \
                     no principal",
                    prop,
                    self.record.get(USERNAME).unwrap_or("")
                ),
            },
        }

        Ok(self)
    }

    /// Compute the value `digesta1` would have for `password`, given the
    /// current user name and the configured realm.
    pub fn password_hash_for(&self, password: &str) -> Result<String, Error> {
        self.realm.a1_hash(self.username(), password)
    }

    /// Check `password` against the stored hash.
    pub fn verify_password(&self, password: &str) -> Result<bool, Error> {
        self.realm
            .verify(self.username(), password, self.get(DIGEST_A1))
    }

    /// A query for the calendars this account's principal owns.
    pub fn calendars_query(&self) -> Query {
        Calendar::owned_by(&self.principal_uri())
    }

    /// A query for the address books this account's principal owns.
    pub fn address_books_query(&self) -> Query {
        AddressBook::owned_by(&self.principal_uri())
    }

    pub fn calendars(
        &self,
        store: &mut impl RecordStore,
    ) -> Result<Vec<Calendar>, Error> {
        Ok(store
            .execute(&self.calendars_query())?
            .into_iter()
            .map(Calendar::from_record)
            .collect())
    }

    pub fn address_books(
        &self,
        store: &mut impl RecordStore,
    ) -> Result<Vec<AddressBook>, Error> {
        Ok(store
            .execute(&self.address_books_query())?
            .into_iter()
            .map(AddressBook::from_record)
            .collect())
    }

    /// Store the account and its principal.
    ///
    /// The principal's URI is brought in line with the user name and the
    /// principal is stored before the account itself. If the account was
    /// floating, its default calendar and address book are created
    /// afterwards.
    ///
    /// Nothing is written if the account has no principal, the user name is
    /// unacceptable, or another account already has it. If any step fails,
    /// all changes are rolled back and the account and its principal keep
    /// the primary keys and principal URI they had before.
    pub fn persist(
        &mut self,
        store: &mut impl RecordStore,
    ) -> Result<(), Error> {
        let floating = self.is_floating();
        let saved_id = self.record.id();
        let saved_principal = self
            .principal
            .as_ref()
            .map(|principal| (principal.id(), principal.uri().to_owned()));

        let result =
            store.atomically(|store| self.persist_steps(store, floating));

        if result.is_err() {
            self.record.set_id(saved_id);
            if let (Some(principal), Some((id, uri))) =
                (self.principal.as_mut(), saved_principal)
            {
                principal.set_id(id);
                principal.set("uri", &uri)?;
            }
        }

        result
    }

    fn persist_steps(
        &mut self,
        store: &mut impl RecordStore,
        floating: bool,
    ) -> Result<(), Error> {
        let username = self.username().to_owned();
        if self.principal.is_none() {
            return Err(Error::NoPrincipal(username));
        }
        if !is_safe_username(&username) {
            return Err(Error::InvalidUsername(username));
        }
        self.ensure_username_available(store, &username)?;

        let principal_uri = principal_uri(&username);
        if let Some(ref mut principal) = self.principal {
            principal.set("uri", &principal_uri)?;
            principal.persist(store)?;
        }

        store.save(&mut self.record)?;

        if floating {
            Calendar::new_default(&principal_uri)?.persist(store)?;
            AddressBook::new_default(&principal_uri, self.get("displayname"))?
                .persist(store)?;
            info!(
                "Created account '{}' with default calendar and address book",
                username
            );
        }

        Ok(())
    }

    fn ensure_username_available(
        &self,
        store: &mut impl RecordStore,
        username: &str,
    ) -> Result<(), Error> {
        let taken = store
            .execute(
                &Query::new(RecordKind::User).where_eq(USERNAME, username),
            )?
            .iter()
            .any(|other| other.id() != self.record.id());

        if taken {
            Err(Error::UsernameTaken(username.to_owned()))
        } else {
            Ok(())
        }
    }

    /// Remove the account, its principal, and every calendar and address book
    /// owned by the principal.
    ///
    /// Calendar objects and contacts inside those collections are left in
    /// place.
    pub fn destroy(self, store: &mut impl RecordStore) -> Result<(), Error> {
        if self.is_floating() {
            return Err(Error::Floating);
        }

        store.atomically(|store| {
            if let Some(ref principal) = self.principal {
                principal.destroy(store)?;
            }

            for calendar in self.calendars(store)? {
                calendar.destroy(store)?;
            }

            for address_book in self.address_books(store)? {
                address_book.destroy(store)?;
            }

            store.delete(&self.record)
        })?;

        info!("Destroyed account '{}'", self.username());
        Ok(())
    }

    /// Build a `mailto:` URI of the form `"Display Name <email>"`.
    pub fn mailto_uri(&self) -> String {
        let mailbox = format!(
            "{} <{}>",
            self.get("displayname"),
            self.get("email")
        );
        format!("mailto:{}", utf8_percent_encode(&mailbox, RAWURLENCODE))
    }
}
