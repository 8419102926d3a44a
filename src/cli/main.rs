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

use std::mem;
use std::path::{Path, PathBuf};

use structopt::StructOpt;

use crate::store::SqliteStore;
use crate::support::sysexits::*;
use crate::support::system_config::{SystemConfig, CONFIG_FILE_NAME};

#[derive(StructOpt)]
#[structopt(max_term_width = 80)]
enum Command {
    /// Commands to be run on the DAV server system.
    Server(ServerSubcommand),
}

#[derive(StructOpt, Default)]
pub(super) struct ServerCommonOptions {
    /// The directory containing `davhome.toml` etc
    /// [default: /etc/davhome or /usr/local/etc/davhome]
    #[structopt(long, parse(from_os_str))]
    root: Option<PathBuf>,
}

#[derive(StructOpt)]
enum ServerSubcommand {
    /// Manage user accounts.
    User(ServerUserSubcommand),
}

impl ServerSubcommand {
    fn common_options(&mut self) -> ServerCommonOptions {
        match *self {
            ServerSubcommand::User(ref mut c) => c.common_options(),
        }
    }
}

#[derive(StructOpt)]
pub(super) enum ServerUserSubcommand {
    /// Create a new user account.
    ///
    /// This also creates the user's principal, a default calendar, and a
    /// default address book.
    Add(ServerUserAddSubcommand),
    /// Delete a user account.
    ///
    /// The user's principal and all calendars and address books it owns are
    /// deleted along with it. Calendar objects and contacts inside those
    /// collections are not.
    Remove(ServerUserNameSubcommand),
    /// Set a new password for a user.
    Passwd(ServerUserPasswdSubcommand),
    /// List all user accounts.
    List(ServerCommonOptions),
    /// Show a user account and the collections it owns.
    Show(ServerUserNameSubcommand),
}

impl ServerUserSubcommand {
    fn common_options(&mut self) -> ServerCommonOptions {
        match *self {
            ServerUserSubcommand::Add(ref mut c) => mem::take(&mut c.common),
            ServerUserSubcommand::Remove(ref mut c)
            | ServerUserSubcommand::Show(ref mut c) => {
                mem::take(&mut c.common)
            },
            ServerUserSubcommand::Passwd(ref mut c) => {
                mem::take(&mut c.common)
            },
            ServerUserSubcommand::List(ref mut c) => mem::take(c),
        }
    }
}

#[derive(StructOpt)]
pub(super) struct ServerUserAddSubcommand {
    #[structopt(flatten)]
    pub(super) common: ServerCommonOptions,

    /// Prompt for the password instead of generating one.
    #[structopt(long)]
    pub(super) prompt_password: bool,

    /// The name shown in CalDAV/CardDAV clients.
    /// If not given, the user name is used.
    #[structopt(short, long)]
    pub(super) display_name: Option<String>,

    /// The user's email address.
    #[structopt(short, long)]
    pub(super) email: Option<String>,

    /// Name of the user to create. This is the login name and may be an email
    /// address.
    pub(super) name: String,
}

#[derive(StructOpt)]
pub(super) struct ServerUserPasswdSubcommand {
    #[structopt(flatten)]
    pub(super) common: ServerCommonOptions,

    /// Prompt for the password instead of generating one.
    #[structopt(long)]
    pub(super) prompt_password: bool,

    /// Name of the user whose password to change.
    pub(super) name: String,
}

#[derive(StructOpt)]
pub(super) struct ServerUserNameSubcommand {
    #[structopt(flatten)]
    pub(super) common: ServerCommonOptions,

    /// Name of the user.
    pub(super) name: String,
}

pub fn main() {
    // Clap exits with status 1 instead of EX_USAGE if we use the more concise
    // API
    let cmd = Command::from_clap(&match Command::clap().get_matches_safe() {
        Ok(matches) => matches,
        Err(
            e @ clap::Error {
                kind: clap::ErrorKind::HelpDisplayed,
                ..
            },
        )
        | Err(
            e @ clap::Error {
                kind: clap::ErrorKind::VersionDisplayed,
                ..
            },
        ) => {
            println!("{}", e.message);
            return;
        },
        Err(e) => {
            eprintln!("{}", e.message);
            EX_USAGE.exit()
        },
    });

    match cmd {
        Command::Server(cmd) => server(cmd),
    }
}

fn server(mut cmd: ServerSubcommand) {
    let common = cmd.common_options();
    let root = common.root.unwrap_or_else(|| {
        if Path::new("/etc/davhome").join(CONFIG_FILE_NAME).is_file() {
            "/etc/davhome".to_owned().into()
        } else if Path::new("/usr/local/etc/davhome")
            .join(CONFIG_FILE_NAME)
            .is_file()
        {
            "/usr/local/etc/davhome".to_owned().into()
        } else {
            die!(
                EX_CONFIG,
                "Neither /etc/davhome nor /usr/local/etc/davhome looks like\n\
                 the davhome root; use --root=/path/to/davhome if your\n\
                 installation is elsewhere."
            )
        }
    });

    let log_config_file = root.join("logging.toml");
    if log_config_file.is_file() {
        if let Err(e) = log4rs::init_file(
            &log_config_file,
            log4rs::file::Deserializers::new(),
        ) {
            die!(
                EX_CONFIG,
                "Error in logging config at '{}': {}",
                log_config_file.display(),
                e
            );
        }
    } else {
        crate::init_simple_log();
    }

    let system_config =
        SystemConfig::load_or_default(&root.join(CONFIG_FILE_NAME));

    let db_path = root.join(&system_config.database.path);
    let mut store = match SqliteStore::open(&db_path) {
        Ok(store) => store,
        Err(e) => die!(
            EX_CANTCREAT,
            "Failed to open database '{}': {}",
            db_path.display(),
            e
        ),
    };

    let realm = system_config.digest_realm();

    match cmd {
        ServerSubcommand::User(ServerUserSubcommand::Add(cmd)) => {
            super::user::add(cmd, &mut store, realm);
        },
        ServerSubcommand::User(ServerUserSubcommand::Remove(cmd)) => {
            super::user::remove(cmd, &mut store, realm);
        },
        ServerSubcommand::User(ServerUserSubcommand::Passwd(cmd)) => {
            super::user::passwd(cmd, &mut store, realm);
        },
        ServerSubcommand::User(ServerUserSubcommand::List(_)) => {
            super::user::list(&mut store, realm);
        },
        ServerSubcommand::User(ServerUserSubcommand::Show(cmd)) => {
            super::user::show(cmd, &mut store, realm);
        },
    }
}
