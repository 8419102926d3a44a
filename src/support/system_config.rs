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

use std::fs;
use std::path::{Path, PathBuf};

use log::{error, warn};
use serde::{Deserialize, Serialize};

use super::error::Error;
use crate::account::digest::{DigestAlgorithm, DigestRealm};

/// The name of the system configuration file under the system root.
pub const CONFIG_FILE_NAME: &str = "davhome.toml";

/// The system-wide configuration for davhome.
///
/// This is stored in a file named `davhome.toml` under the system root, which
/// is typically `/usr/local/etc/davhome` or `/etc/davhome`.
#[derive(Clone, Debug, Deserialize, Serialize, Default)]
pub struct SystemConfig {
    /// Options shared with the DAV server itself.
    #[serde(default)]
    pub system: SystemSection,

    /// Where account data is stored.
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SystemSection {
    /// The HTTP authentication realm.
    ///
    /// This must be byte-for-byte identical to the realm the DAV server
    /// announces in its `WWW-Authenticate` challenges. Every stored password
    /// hash incorporates it, so changing it invalidates all passwords.
    #[serde(default)]
    pub auth_realm: Option<String>,

    /// The hash algorithm the DAV server expects for stored `A1` digests.
    #[serde(default)]
    pub digest_algorithm: DigestAlgorithm,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database, relative to the system root.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("davhome.sqlite"),
        }
    }
}

impl SystemConfig {
    /// Read and parse the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Like `load`, but a file that cannot be read or parsed is logged and
    /// the defaults are used instead.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            error!(
                "Error reading '{}', using defaults: {}",
                path.display(),
                e
            );
            Self::default()
        })
    }

    pub fn parse(text: &str) -> Result<Self, Error> {
        toml::from_str(text).map_err(Into::into)
    }

    /// Build the digest parameters for password hashing.
    ///
    /// A missing realm is not an error. It is logged, and hashes are computed
    /// with an empty realm, which the server will almost certainly not
    /// accept.
    pub fn digest_realm(&self) -> DigestRealm {
        match self.system.auth_realm {
            Some(ref realm) => {
                DigestRealm::new(realm.clone(), self.system.digest_algorithm)
            },
            None => {
                warn!(
                    "system.auth_realm is not set in {}; \
                     password hashes will use an empty realm",
                    CONFIG_FILE_NAME
                );
                DigestRealm::missing(self.system.digest_algorithm)
            },
        }
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::*;

    #[test]
    fn parse_full_config() {
        let config = SystemConfig::parse(
            "[system]\n\
             auth_realm = \"ExampleDAV\"\n\
             digest_algorithm = \"sha-256\"\n\
             \n\
             [database]\n\
             path = \"/var/lib/davhome/db.sqlite\"\n",
        )
        .unwrap();

        assert_eq!(Some("ExampleDAV"), config.system.auth_realm.as_deref());
        assert_eq!(DigestAlgorithm::Sha256, config.system.digest_algorithm);
        assert_eq!(
            Path::new("/var/lib/davhome/db.sqlite"),
            config.database.path
        );

        let realm = config.digest_realm();
        assert_eq!(Some("ExampleDAV"), realm.realm());
        assert_eq!(DigestAlgorithm::Sha256, realm.algorithm());
    }

    #[test]
    fn parse_empty_config_uses_defaults() {
        let config = SystemConfig::parse("").unwrap();
        assert_eq!(None, config.system.auth_realm);
        assert_eq!(DigestAlgorithm::Md5, config.system.digest_algorithm);
        assert_eq!(Path::new("davhome.sqlite"), config.database.path);

        let realm = config.digest_realm();
        assert_eq!(None, realm.realm());
    }

    #[test]
    fn reject_unknown_algorithm() {
        assert_matches!(
            Err(Error::ConfigSyntax(..)),
            SystemConfig::parse("[system]\ndigest_algorithm = \"crc32\"\n")
        );
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::File::create(&path)
            .unwrap()
            .write_all(b"[system]\nauth_realm = \"FileDAV\"\n")
            .unwrap();

        let config = SystemConfig::load(&path).unwrap();
        assert_eq!(Some("FileDAV"), config.system.auth_realm.as_deref());

        assert_matches!(
            Err(Error::Io(..)),
            SystemConfig::load(&dir.path().join("nonexistent.toml"))
        );
    }

    #[test]
    fn unreadable_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("nonexistent.toml");
        let config = SystemConfig::load_or_default(&missing);
        assert_eq!(None, config.system.auth_realm);
        assert_eq!(PathBuf::from("davhome.sqlite"), config.database.path);
        assert_eq!(None, config.digest_realm().realm());

        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[system\nauth_realm = ").unwrap();
        let config = SystemConfig::load_or_default(&path);
        assert_eq!(None, config.system.auth_realm);
        assert_eq!(PathBuf::from("davhome.sqlite"), config.database.path);
    }
}
