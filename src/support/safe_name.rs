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

/// Determine whether the given name is acceptable as a user name.
///
/// The user name becomes the last path segment of the principal URI
/// (`principals/<name>`) and the first field of the digest `A1` string
/// (`name:realm:password`), so anything that would break either is rejected:
/// path separators, `:`, control characters, and names that begin with `.`
/// (directory traversal in clients that resolve the URI naïvely).
///
/// Leading and trailing white space is also rejected, since clients tend to
/// strip it and would then fail to authenticate.
///
/// Email addresses are fine.
pub fn is_safe_username(name: &str) -> bool {
    !name.is_empty()
        && name.trim() == name
        && !name.starts_with('.')
        && name.find(|c| c == '/' || c == '\\' || c == ':').is_none()
        && name.find(|c: char| c.is_control()).is_none()
}

#[cfg(test)]
mod test {
    use super::is_safe_username;

    #[test]
    fn test_is_safe_username() {
        assert!(is_safe_username("jane"));
        assert!(is_safe_username("jane@example.com"));
        assert!(is_safe_username("Jürgen"));
        assert!(is_safe_username("郵便"));
        assert!(is_safe_username("jane.doe"));
        assert!(is_safe_username("jane doe"));
        assert!(!is_safe_username(""));
        assert!(!is_safe_username("."));
        assert!(!is_safe_username(".."));
        assert!(!is_safe_username(".jane"));
        assert!(!is_safe_username("jane/doe"));
        assert!(!is_safe_username("/jane"));
        assert!(!is_safe_username("jane\\doe"));
        assert!(!is_safe_username("jane:doe"));
        assert!(!is_safe_username(" jane"));
        assert!(!is_safe_username("jane\n"));
        assert!(!is_safe_username("ja\0ne"));
        assert!(!is_safe_username("ja\x7Fne"));
    }
}
