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

use std::collections::BTreeMap;

use super::{RecordId, RecordKind};
use crate::support::error::Error;

/// A single stored (or to-be-stored) record.
///
/// A record without a primary key is "floating": it exists only in memory
/// until a store saves it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    kind: RecordKind,
    id: Option<RecordId>,
    fields: BTreeMap<&'static str, String>,
}

impl Record {
    /// Create a floating record with every field empty.
    pub fn floating(kind: RecordKind) -> Self {
        Record {
            kind,
            id: None,
            fields: kind
                .fields()
                .iter()
                .map(|&field| (field, String::new()))
                .collect(),
        }
    }

    /// Reconstitute a stored record.
    ///
    /// Fields not present in `values` are left empty; values for fields the
    /// kind doesn't know are ignored.
    pub(super) fn stored<'a>(
        kind: RecordKind,
        id: RecordId,
        values: impl IntoIterator<Item = (&'a str, String)>,
    ) -> Self {
        let mut record = Record::floating(kind);
        record.id = Some(id);
        for (field, value) in values {
            if let Some(field) = kind.field(field) {
                record.fields.insert(field, value);
            }
        }
        record
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    /// Overwrite the primary key.
    ///
    /// Stores use this to assign keys on insert. The account layer uses it to
    /// put keys back after a rolled-back insert.
    pub(crate) fn set_id(&mut self, id: Option<RecordId>) {
        self.id = id;
    }

    pub fn is_floating(&self) -> bool {
        self.id.is_none()
    }

    /// Whether records of this kind have a field named `field`.
    pub fn knows(&self, field: &str) -> bool {
        self.kind.knows(field)
    }

    pub fn get(&self, field: &str) -> Result<&str, Error> {
        self.fields
            .get(field)
            .map(String::as_str)
            .ok_or_else(|| Error::NoSuchField(field.to_owned()))
    }

    pub fn set(
        &mut self,
        field: &str,
        value: impl Into<String>,
    ) -> Result<&mut Self, Error> {
        let field = self
            .kind
            .field(field)
            .ok_or_else(|| Error::NoSuchField(field.to_owned()))?;
        self.fields.insert(field, value.into());
        Ok(self)
    }

    /// Iterate over all fields and their values, in the order given by
    /// `RecordKind::fields()`.
    pub fn values(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.kind.fields().iter().map(move |&field| {
            (
                field,
                self.fields.get(field).map(String::as_str).unwrap_or(""),
            )
        })
    }
}
