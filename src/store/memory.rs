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

use super::{Query, Record, RecordId, RecordKind, RecordStore, ResultSet};
use crate::support::error::Error;

type Row = BTreeMap<&'static str, String>;

#[derive(Clone, Debug, Default)]
struct Tables {
    rows: BTreeMap<RecordKind, BTreeMap<RecordId, Row>>,
    next_id: i64,
}

/// A `RecordStore` that keeps everything in process memory.
///
/// `atomically()` snapshots all tables on entry and restores the snapshot if
/// the operation fails.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Tables,
    depth: u32,
    #[cfg(test)]
    writes_before_failure: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of stored records of the given kind.
    pub fn count(&self, kind: RecordKind) -> usize {
        self.tables.rows.get(&kind).map_or(0, BTreeMap::len)
    }

    /// Make the write after the next `writes` writes fail.
    #[cfg(test)]
    pub fn fail_after_writes(&mut self, writes: usize) {
        self.writes_before_failure = Some(writes);
    }

    #[cfg(test)]
    fn check_write(&mut self) -> Result<(), Error> {
        match self.writes_before_failure {
            Some(0) => Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "injected write failure",
            ))),
            Some(ref mut n) => {
                *n -= 1;
                Ok(())
            },
            None => Ok(()),
        }
    }

    #[cfg(not(test))]
    fn check_write(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn table(&mut self, kind: RecordKind) -> &mut BTreeMap<RecordId, Row> {
        self.tables.rows.entry(kind).or_default()
    }
}

fn row_of(record: &Record) -> Row {
    record
        .values()
        .map(|(field, value)| (field, value.to_owned()))
        .collect()
}

impl RecordStore for MemoryStore {
    fn load(
        &mut self,
        kind: RecordKind,
        id: RecordId,
    ) -> Result<Record, Error> {
        self.table(kind)
            .get(&id)
            .map(|row| {
                Record::stored(
                    kind,
                    id,
                    row.iter().map(|(&field, value)| (field, value.clone())),
                )
            })
            .ok_or(Error::NotFound)
    }

    fn save(&mut self, record: &mut Record) -> Result<(), Error> {
        self.check_write()?;

        let row = row_of(record);
        match record.id() {
            None => {
                self.tables.next_id += 1;
                let id = RecordId(self.tables.next_id);
                self.table(record.kind()).insert(id, row);
                record.set_id(Some(id));
            },
            Some(id) => match self.table(record.kind()).get_mut(&id) {
                Some(existing) => *existing = row,
                None => return Err(Error::NotFound),
            },
        }

        Ok(())
    }

    fn delete(&mut self, record: &Record) -> Result<(), Error> {
        let id = record.id().ok_or(Error::Floating)?;
        self.check_write()?;
        self.table(record.kind())
            .remove(&id)
            .map(|_| ())
            .ok_or(Error::NotFound)
    }

    fn execute(&mut self, query: &Query) -> Result<ResultSet, Error> {
        query.validate()?;

        let kind = query.kind();
        Ok(self
            .table(kind)
            .iter()
            .map(|(&id, row)| {
                Record::stored(
                    kind,
                    id,
                    row.iter().map(|(&field, value)| (field, value.clone())),
                )
            })
            .filter(|record| query.matches(record))
            .collect::<Vec<_>>()
            .into())
    }

    fn atomically<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let snapshot = self.tables.clone();
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;

        if result.is_err() && 0 == self.depth {
            self.tables = snapshot;
        }

        result
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn user(name: &str) -> Record {
        let mut record = Record::floating(RecordKind::User);
        record.set("username", name).unwrap();
        record
    }

    #[test]
    fn crud() {
        let mut store = MemoryStore::new();

        let mut jane = user("jane");
        store.save(&mut jane).unwrap();
        let id = jane.id().unwrap();
        assert_eq!(jane, store.load(RecordKind::User, id).unwrap());

        jane.set("digesta1", "abc").unwrap();
        store.save(&mut jane).unwrap();
        assert_eq!(id, jane.id().unwrap());
        assert_eq!(
            "abc",
            store
                .load(RecordKind::User, id)
                .unwrap()
                .get("digesta1")
                .unwrap()
        );

        assert_matches!(
            Err(Error::NotFound),
            store.load(RecordKind::Principal, id)
        );

        store.delete(&jane).unwrap();
        assert_matches!(Err(Error::NotFound), store.load(RecordKind::User, id));
        assert_matches!(Err(Error::NotFound), store.delete(&jane));
        assert_matches!(Err(Error::NotFound), store.save(&mut jane));
        assert_matches!(Err(Error::Floating), store.delete(&user("john")));
    }

    #[test]
    fn execute_filters_and_orders() {
        let mut store = MemoryStore::new();
        for name in &["jane", "john", "jane"] {
            store.save(&mut user(name)).unwrap();
        }

        let janes = store
            .execute(&Query::new(RecordKind::User).where_eq("username", "jane"))
            .unwrap();
        assert_eq!(2, janes.len());
        let ids = janes.iter().map(|r| r.id().unwrap()).collect::<Vec<_>>();
        assert!(ids[0] < ids[1]);

        assert_eq!(
            3,
            store.execute(&Query::new(RecordKind::User)).unwrap().len()
        );
        assert!(store
            .execute(&Query::new(RecordKind::Calendar))
            .unwrap()
            .is_empty());
        assert_matches!(
            Err(Error::NoSuchField(..)),
            store.execute(&Query::new(RecordKind::User).where_eq("uri", "x"))
        );
    }

    #[test]
    fn atomically_rolls_back_on_error() {
        let mut store = MemoryStore::new();
        store.save(&mut user("jane")).unwrap();

        let result: Result<(), Error> = store.atomically(|store| {
            store.save(&mut user("john"))?;
            store.atomically(|store| store.save(&mut user("jack")))?;
            Err(Error::NotFound)
        });
        assert_matches!(Err(Error::NotFound), result);
        assert_eq!(1, store.count(RecordKind::User));

        store
            .atomically(|store| store.save(&mut user("john")))
            .unwrap();
        assert_eq!(2, store.count(RecordKind::User));
    }

    #[test]
    fn injected_failure() {
        let mut store = MemoryStore::new();
        store.fail_after_writes(1);
        store.save(&mut user("jane")).unwrap();
        assert_matches!(Err(Error::Io(..)), store.save(&mut user("john")));
        assert_eq!(1, store.count(RecordKind::User));
    }
}
