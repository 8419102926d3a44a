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

use std::vec;

use super::{Record, RecordKind};
use crate::support::error::Error;

/// A conjunction of equality clauses over records of one kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    kind: RecordKind,
    clauses: Vec<(&'static str, String)>,
}

impl Query {
    /// A query matching every record of `kind`.
    pub fn new(kind: RecordKind) -> Self {
        Query {
            kind,
            clauses: Vec::new(),
        }
    }

    /// Further restrict the query to records whose `field` equals `value`.
    ///
    /// The field is not checked here; executing a query over a field the
    /// kind doesn't have fails with `Error::NoSuchField`.
    pub fn where_eq(
        mut self,
        field: &'static str,
        value: impl Into<String>,
    ) -> Self {
        self.clauses.push((field, value.into()));
        self
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn clauses(&self) -> &[(&'static str, String)] {
        &self.clauses
    }

    /// Ensure every clause names a field of the queried kind.
    ///
    /// Stores must call this before executing the query. For the SQLite
    /// store this is also what keeps arbitrary text out of column names.
    pub fn validate(&self) -> Result<(), Error> {
        match self
            .clauses
            .iter()
            .find(|&&(field, _)| !self.kind.knows(field))
        {
            Some(&(field, _)) => Err(Error::NoSuchField(field.to_owned())),
            None => Ok(()),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        record.kind() == self.kind
            && self
                .clauses
                .iter()
                .all(|&(field, ref value)| {
                    record.get(field).map_or(false, |v| v == value.as_str())
                })
    }
}

/// The records returned by executing a `Query`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultSet {
    records: Vec<Record>,
}

impl ResultSet {
    pub fn first(self) -> Option<Record> {
        self.records.into_iter().next()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> + '_ {
        self.records.iter()
    }
}

impl From<Vec<Record>> for ResultSet {
    fn from(records: Vec<Record>) -> Self {
        ResultSet { records }
    }
}

impl IntoIterator for ResultSet {
    type Item = Record;
    type IntoIter = vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
