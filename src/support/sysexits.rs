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

//! Exit codes from `sysexits.h`, and the mapping from crate errors onto them.

use super::error::Error;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Sysexit(pub i32);

pub const EX_USAGE: Sysexit = Sysexit(64);
pub const EX_DATAERR: Sysexit = Sysexit(65);
pub const EX_NOINPUT: Sysexit = Sysexit(66);
pub const EX_NOUSER: Sysexit = Sysexit(67);
pub const EX_SOFTWARE: Sysexit = Sysexit(70);
pub const EX_CANTCREAT: Sysexit = Sysexit(73);
pub const EX_IOERR: Sysexit = Sysexit(74);
pub const EX_CONFIG: Sysexit = Sysexit(78);

impl Sysexit {
    pub fn exit(self) -> ! {
        std::process::exit(self.0)
    }
}

impl From<&Error> for Sysexit {
    fn from(e: &Error) -> Self {
        match *e {
            Error::NotFound | Error::NoSuchUser(..) => EX_NOUSER,
            Error::InvalidUsername(..)
            | Error::UsernameTaken(..)
            | Error::NoSuchField(..)
            | Error::DerivedField(..)
            | Error::ReadOnlyField(..) => EX_DATAERR,
            Error::Io(..) | Error::Sqlite(..) => EX_IOERR,
            Error::ConfigSyntax(..) => EX_CONFIG,
            Error::NoPrincipal(..) | Error::Floating | Error::Ssl(..) => {
                EX_SOFTWARE
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn errors_map_to_sysexits() {
        assert_eq!(EX_NOUSER, Sysexit::from(&Error::NoSuchUser("x".into())));
        assert_eq!(
            EX_DATAERR,
            Sysexit::from(&Error::UsernameTaken("x".into()))
        );
        assert_eq!(
            EX_SOFTWARE,
            Sysexit::from(&Error::NoPrincipal("x".into()))
        );
    }
}
