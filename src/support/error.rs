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

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Record not found")]
    NotFound,
    #[error("No such user: {0}")]
    NoSuchUser(String),
    #[error("No such field: {0}")]
    NoSuchField(String),
    #[error("Field '{0}' is derived and cannot be set directly")]
    DerivedField(String),
    #[error("Field '{0}' cannot be changed once the record is stored")]
    ReadOnlyField(String),
    #[error("Account '{0}' has no principal")]
    NoPrincipal(String),
    #[error("Record has not been persisted")]
    Floating,
    #[error("Invalid user name: {0:?}")]
    InvalidUsername(String),
    #[error("User name already in use: {0}")]
    UsernameTaken(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Ssl(#[from] openssl::error::ErrorStack),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    ConfigSyntax(#[from] toml::de::Error),
}
