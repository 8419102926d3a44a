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

//! Realm-scoped password digests, as used by HTTP Digest authentication.
//!
//! The DAV server never sees a stored password. It stores
//! `H(username ":" realm ":" password)` (the `A1` hash of RFC 2617 and
//! RFC 7616) and compares it directly against what it derives from the
//! client's challenge response, so the construction here must match the
//! server's byte-for-byte: same field order, same `:` delimiters, same
//! algorithm, lowercase hex.

use log::warn;
use openssl::hash::{Hasher, MessageDigest};
use serde::{Deserialize, Serialize};

use crate::support::error::Error;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    /// `MD5`, the only algorithm RFC 2617 clients understand.
    #[serde(rename = "md5")]
    Md5,
    /// `SHA-256` from RFC 7616.
    #[serde(rename = "sha-256")]
    Sha256,
}

impl Default for DigestAlgorithm {
    fn default() -> Self {
        DigestAlgorithm::Md5
    }
}

impl DigestAlgorithm {
    fn message_digest(self) -> MessageDigest {
        match self {
            DigestAlgorithm::Md5 => MessageDigest::md5(),
            DigestAlgorithm::Sha256 => MessageDigest::sha256(),
        }
    }
}

/// Everything besides the user name and password that goes into an `A1`
/// hash.
///
/// The realm may be absent if it could not be determined from the system
/// configuration. Hashes are then computed over an empty realm rather than
/// refusing to hash at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestRealm {
    realm: Option<String>,
    algorithm: DigestAlgorithm,
}

impl DigestRealm {
    pub fn new(realm: String, algorithm: DigestAlgorithm) -> Self {
        DigestRealm {
            realm: Some(realm),
            algorithm,
        }
    }

    pub fn missing(algorithm: DigestAlgorithm) -> Self {
        DigestRealm {
            realm: None,
            algorithm,
        }
    }

    pub fn realm(&self) -> Option<&str> {
        self.realm.as_deref()
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Compute the hex-encoded `A1` hash for the given credentials.
    pub fn a1_hash(
        &self,
        username: &str,
        password: &str,
    ) -> Result<String, Error> {
        let realm = match self.realm {
            Some(ref realm) => realm.as_str(),
            None => {
                warn!(
                    "Hashing password for '{}' without an authentication \
                     realm",
                    username
                );
                ""
            },
        };

        a1_hash(self.algorithm, username, realm, password)
    }

    /// Check `password` against a stored `A1` hash.
    pub fn verify(
        &self,
        username: &str,
        password: &str,
        stored: &str,
    ) -> Result<bool, Error> {
        let computed = self.a1_hash(username, password)?;
        Ok(computed.len() == stored.len()
            && openssl::memcmp::eq(computed.as_bytes(), stored.as_bytes()))
    }
}

/// Compute `hex(H(username ":" realm ":" password))`.
pub fn a1_hash(
    algorithm: DigestAlgorithm,
    username: &str,
    realm: &str,
    password: &str,
) -> Result<String, Error> {
    let mut hasher = Hasher::new(algorithm.message_digest())?;
    hasher.update(username.as_bytes())?;
    hasher.update(b":")?;
    hasher.update(realm.as_bytes())?;
    hasher.update(b":")?;
    hasher.update(password.as_bytes())?;
    let digest = hasher.finish()?;
    Ok(hex::encode(&*digest))
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn md5_matches_rfc2617_example() {
        assert_eq!(
            "939e7578ed9e3c518a452acee763bce9",
            a1_hash(
                DigestAlgorithm::Md5,
                "Mufasa",
                "testrealm@host.com",
                "Circle Of Life"
            )
            .unwrap()
        );
    }

    #[test]
    fn sha256_matches_rfc7616_credentials() {
        assert_eq!(
            "7987c64c30e25f1b74be53f966b49b90\
             f2808aa92faf9a00262392d7b4794232",
            a1_hash(
                DigestAlgorithm::Sha256,
                "Mufasa",
                "http-auth@example.org",
                "Circle of Life"
            )
            .unwrap()
        );
    }

    #[test]
    fn missing_realm_hashes_as_empty() {
        let realm = DigestRealm::missing(DigestAlgorithm::Md5);
        assert_eq!(
            "9b058caa0cdb6bd5b061d0e65cc80bee",
            realm.a1_hash("jane", "secret").unwrap()
        );
    }

    #[test]
    fn verify_password() {
        let realm =
            DigestRealm::new("ExampleDAV".to_owned(), DigestAlgorithm::Md5);
        let stored = realm.a1_hash("jane", "secret").unwrap();
        assert_eq!("e057e4f34a843d13f06f3a1c3c25743e", stored);

        assert!(realm.verify("jane", "secret", &stored).unwrap());
        assert!(!realm.verify("jane", "Secret", &stored).unwrap());
        assert!(!realm.verify("john", "secret", &stored).unwrap());
        assert!(!realm.verify("jane", "secret", "").unwrap());
    }

    proptest! {
        #[test]
        fn hash_is_deterministic_and_input_sensitive(
            username in "[a-z]{1,12}",
            realm in "[A-Za-z ]{0,12}",
            password in "[ -~]{0,16}",
        ) {
            let md5 = DigestAlgorithm::Md5;
            let hash = a1_hash(md5, &username, &realm, &password).unwrap();
            prop_assert_eq!(32, hash.len());
            prop_assert_eq!(
                &hash,
                &a1_hash(md5, &username, &realm, &password).unwrap());

            let other_user = format!("{}x", username);
            let other_realm = format!("{}x", realm);
            let other_password = format!("{}x", password);
            prop_assert_ne!(
                &hash,
                &a1_hash(md5, &other_user, &realm, &password).unwrap());
            prop_assert_ne!(
                &hash,
                &a1_hash(md5, &username, &other_realm, &password).unwrap());
            prop_assert_ne!(
                &hash,
                &a1_hash(md5, &username, &realm, &other_password).unwrap());
        }
    }
}
