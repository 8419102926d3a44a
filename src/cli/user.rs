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

use rand::{rngs::OsRng, Rng};

use super::main::{
    ServerUserAddSubcommand, ServerUserNameSubcommand,
    ServerUserPasswdSubcommand,
};
use crate::account::account::Account;
use crate::account::digest::DigestRealm;
use crate::store::SqliteStore;
use crate::support::error::Error;
use crate::support::safe_name::is_safe_username;
use crate::support::sysexits::*;

pub(super) fn add(
    cmd: ServerUserAddSubcommand,
    store: &mut SqliteStore,
    realm: DigestRealm,
) {
    if !is_safe_username(&cmd.name) {
        die!(EX_USAGE, "Invalid user name: {}", cmd.name);
    }

    match Account::find_by_username(store, &cmd.name, realm.clone()) {
        Ok(_) => die!(EX_CANTCREAT, "User '{}' already exists", cmd.name),
        Err(Error::NoSuchUser(_)) => (),
        Err(e) => die_with(&e, "Error looking up user"),
    }

    let password = obtain_password(cmd.prompt_password);
    let display_name = cmd.display_name.as_deref().unwrap_or(&cmd.name);

    let mut account = Account::floating(realm);
    let result = account
        .set("username", &cmd.name)
        .and_then(|a| a.set("displayname", display_name))
        .and_then(|a| a.set("email", cmd.email.as_deref().unwrap_or("")))
        .and_then(|a| a.set("password", &password))
        .and_then(|a| a.persist(store));
    if let Err(e) = result {
        die_with(&e, "Error creating account");
    }

    if !cmd.prompt_password {
        println!("Password: {}", password);
    }
}

pub(super) fn remove(
    cmd: ServerUserNameSubcommand,
    store: &mut SqliteStore,
    realm: DigestRealm,
) {
    let account = find(store, &cmd.name, realm);
    if let Err(e) = account.destroy(store) {
        die_with(&e, "Error removing account");
    }
}

pub(super) fn passwd(
    cmd: ServerUserPasswdSubcommand,
    store: &mut SqliteStore,
    realm: DigestRealm,
) {
    let mut account = find(store, &cmd.name, realm);
    let password = obtain_password(cmd.prompt_password);

    let result = account
        .set("password", &password)
        .and_then(|a| a.persist(store));
    if let Err(e) = result {
        die_with(&e, "Error changing password");
    }

    if !cmd.prompt_password {
        println!("Password: {}", password);
    }
}

pub(super) fn list(store: &mut SqliteStore, realm: DigestRealm) {
    let accounts = match Account::list(store, &realm) {
        Ok(accounts) => accounts,
        Err(e) => die_with(&e, "Error listing accounts"),
    };

    for account in accounts {
        println!(
            "{}\t{}\t{}",
            account.username(),
            account.get("displayname"),
            account.get("email"),
        );
    }
}

pub(super) fn show(
    cmd: ServerUserNameSubcommand,
    store: &mut SqliteStore,
    realm: DigestRealm,
) {
    let account = find(store, &cmd.name, realm);
    let (calendars, address_books) = match account
        .calendars(store)
        .and_then(|c| account.address_books(store).map(|a| (c, a)))
    {
        Ok(collections) => collections,
        Err(e) => die_with(&e, "Error reading collections"),
    };

    println!("User name:    {}", account.username());
    println!("Display name: {}", account.get("displayname"));
    println!("Email:        {}", account.get("email"));
    println!("Contact:      {}", account.mailto_uri());
    match account.principal() {
        Some(principal) => println!("Principal:    {}", principal.uri()),
        None => println!("Principal:    (missing)"),
    }

    println!("Calendars:");
    for calendar in &calendars {
        println!(
            "  {}\t{}\t{}",
            calendar.uri(),
            calendar.display_name(),
            calendar.components().collect::<Vec<_>>().join(","),
        );
    }

    println!("Address books:");
    for address_book in &address_books {
        println!("  {}\t{}", address_book.uri(), address_book.display_name());
    }
}

fn find(store: &mut SqliteStore, name: &str, realm: DigestRealm) -> Account {
    match Account::find_by_username(store, name, realm) {
        Ok(account) => account,
        Err(e) => die_with(&e, "Error loading account"),
    }
}

fn obtain_password(prompt: bool) -> String {
    if prompt {
        match rpassword::prompt_password("Password: ").and_then(|a| {
            rpassword::prompt_password("Confirm: ").map(|b| (a, b))
        }) {
            Err(e) => die!(EX_NOINPUT, "Failed to read password: {}", e),
            Ok((a, b)) if a != b => die!(EX_DATAERR, "Passwords don't match"),
            Ok((a, _)) if a.is_empty() => die!(EX_NOINPUT, "No password given"),
            Ok((a, _)) => a,
        }
    } else {
        let data: [u8; 12] = OsRng.gen();
        base64::encode_config(data, base64::URL_SAFE_NO_PAD)
    }
}

fn die_with(e: &Error, what: &str) -> ! {
    eprintln!("{}: {}", what, e);
    Sysexit::from(e).exit()
}
