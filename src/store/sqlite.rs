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

use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use log::{error, info};
use rusqlite::types::Value;
use rusqlite::OptionalExtension as _;

use super::{Query, Record, RecordId, RecordKind, RecordStore, ResultSet};
use crate::support::error::Error;

static MIGRATIONS: &[&str] = &[include_str!("sqlite.v1.sql")];

/// A `RecordStore` backed by a SQLite database.
///
/// `atomically()` maps onto an immediate SQLite transaction.
pub struct SqliteStore {
    cxn: rusqlite::Connection,
}

impl SqliteStore {
    /// Open (creating if necessary) the database at `path` and bring its
    /// schema up to date.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let cxn = rusqlite::Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE,
        )?;
        Self::init(cxn, &path.display().to_string())
    }

    pub fn open_in_memory() -> Result<Self, Error> {
        Self::init(rusqlite::Connection::open_in_memory()?, ":memory:")
    }

    fn init(mut cxn: rusqlite::Connection, name: &str) -> Result<Self, Error> {
        cxn.pragma_update(None, "foreign_keys", true)?;
        cxn.busy_timeout(Duration::from_secs(10))?;
        apply_migrations(&mut cxn, name)?;
        Ok(Self { cxn })
    }
}

fn apply_migrations(
    cxn: &mut rusqlite::Connection,
    name: &str,
) -> Result<(), Error> {
    let txn = cxn
        .transaction_with_behavior(rusqlite::TransactionBehavior::Exclusive)?;
    txn.execute(
        "CREATE TABLE IF NOT EXISTS `migration` (\
           `version` INTEGER NOT NULL PRIMARY KEY, \
           `applied_at` INTEGER NOT NULL\
         ) STRICT",
        (),
    )?;

    let current_version = txn
        .query_row("SELECT MAX(`version`) FROM `migration`", (), |row| {
            row.get::<_, Option<usize>>(0)
        })?
        .unwrap_or(0);

    let now = chrono::Utc::now().timestamp();
    for (version, migration) in MIGRATIONS
        .iter()
        .copied()
        .enumerate()
        .map(|(ix, migration)| (ix + 1, migration))
        .skip(current_version)
    {
        info!("Applying #{} migration to {}", version, name);
        txn.execute_batch(migration)?;
        txn.execute(
            "INSERT INTO `migration` (`version`, `applied_at`) VALUES (?, ?)",
            (version, now),
        )?;
    }

    txn.commit()?;
    Ok(())
}

fn record_from_row(
    kind: RecordKind,
    row: &rusqlite::Row<'_>,
) -> rusqlite::Result<Record> {
    let id = RecordId(row.get("id")?);
    let mut values = Vec::with_capacity(kind.fields().len());
    for &field in kind.fields() {
        values.push((field, row.get::<_, String>(field)?));
    }
    Ok(Record::stored(kind, id, values))
}

impl RecordStore for SqliteStore {
    fn load(
        &mut self,
        kind: RecordKind,
        id: RecordId,
    ) -> Result<Record, Error> {
        self.cxn
            .prepare_cached(&format!(
                "SELECT * FROM `{}` WHERE `id` = ?",
                kind.table()
            ))?
            .query_row((id.0,), |row| record_from_row(kind, row))
            .optional()?
            .ok_or(Error::NotFound)
    }

    fn save(&mut self, record: &mut Record) -> Result<(), Error> {
        let kind = record.kind();
        let (columns, values): (Vec<&str>, Vec<&str>) = record.values().unzip();

        match record.id() {
            None => {
                let mut sql = format!("INSERT INTO `{}` (", kind.table());
                for (ix, column) in columns.iter().enumerate() {
                    if ix > 0 {
                        sql.push_str(", ");
                    }
                    let _ = write!(sql, "`{}`", column);
                }
                sql.push_str(") VALUES (");
                sql.push_str(&vec!["?"; columns.len()].join(", "));
                sql.push(')');

                self.cxn
                    .prepare_cached(&sql)?
                    .execute(rusqlite::params_from_iter(values))?;
                let id = RecordId(self.cxn.last_insert_rowid());
                record.set_id(Some(id));
            },

            Some(id) => {
                let mut sql = format!("UPDATE `{}` SET ", kind.table());
                for (ix, column) in columns.iter().enumerate() {
                    if ix > 0 {
                        sql.push_str(", ");
                    }
                    let _ = write!(sql, "`{}` = ?", column);
                }
                sql.push_str(" WHERE `id` = ?");

                let updated = self.cxn.prepare_cached(&sql)?.execute(
                    rusqlite::params_from_iter(
                        values
                            .into_iter()
                            .map(|v| Value::Text(v.to_owned()))
                            .chain(std::iter::once(Value::Integer(id.0))),
                    ),
                )?;
                if 0 == updated {
                    return Err(Error::NotFound);
                }
            },
        }

        Ok(())
    }

    fn delete(&mut self, record: &Record) -> Result<(), Error> {
        let id = record.id().ok_or(Error::Floating)?;
        let deleted = self
            .cxn
            .prepare_cached(&format!(
                "DELETE FROM `{}` WHERE `id` = ?",
                record.kind().table()
            ))?
            .execute((id.0,))?;

        if 0 == deleted {
            Err(Error::NotFound)
        } else {
            Ok(())
        }
    }

    fn execute(&mut self, query: &Query) -> Result<ResultSet, Error> {
        query.validate()?;

        let kind = query.kind();
        let mut sql = format!("SELECT * FROM `{}`", kind.table());
        for (ix, &(field, _)) in query.clauses().iter().enumerate() {
            sql.push_str(if 0 == ix { " WHERE " } else { " AND " });
            let _ = write!(sql, "`{}` = ?", field);
        }
        sql.push_str(" ORDER BY `id`");

        self.cxn
            .prepare_cached(&sql)?
            .query_map(
                rusqlite::params_from_iter(
                    query.clauses().iter().map(|&(_, ref value)| value),
                ),
                move |row| record_from_row(kind, row),
            )?
            .collect::<Result<Vec<Record>, _>>()
            .map(ResultSet::from)
            .map_err(Into::into)
    }

    fn atomically<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        if !self.cxn.is_autocommit() {
            return f(self);
        }

        self.cxn.execute_batch("BEGIN IMMEDIATE")?;
        match f(self) {
            Ok(value) => {
                self.cxn.execute_batch("COMMIT")?;
                Ok(value)
            },
            Err(e) => {
                if let Err(rollback_err) = self.cxn.execute_batch("ROLLBACK") {
                    error!("Failed to roll back transaction: {}", rollback_err);
                }
                Err(e)
            },
        }
    }
}
