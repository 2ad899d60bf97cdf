// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Credential storage.
//!
//! Passwords live in the system keychain by default, keyed by the JSS URL
//! and the API user. CI/CD environments often have no keychain to speak of,
//! so the password can be kept __in plaintext__ inside the preferences file
//! instead.

use crate::session::{PrefsFile, Result, SessionError};

use keyring::Entry;
use tracing::{debug, instrument};

/// Somewhere to keep the API user's password.
pub trait CredentialStore {
    /// Fetch password of user on server, if one is stored.
    fn get(&self, url: &str, user: &str) -> Result<Option<String>>;

    /// Store password of user on server.
    fn set(&mut self, url: &str, user: &str, password: &str) -> Result<()>;

    /// Whether passwords end up in the preferences file.
    fn is_plaintext(&self) -> bool {
        false
    }
}

/// Credential storage through the operating system's keychain.
#[derive(Debug, Default, Clone, Copy)]
pub struct Keychain;

impl CredentialStore for Keychain {
    #[instrument(skip(self), level = "debug")]
    fn get(&self, url: &str, user: &str) -> Result<Option<String>> {
        match Entry::new(url, user)?.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => {
                debug!("no keychain entry for {user} on {url}");
                Ok(None)
            }
            Err(error) => Err(SessionError::Keyring(error)),
        }
    }

    #[instrument(skip(self, password), level = "debug")]
    fn set(&mut self, url: &str, user: &str, password: &str) -> Result<()> {
        Entry::new(url, user)?.set_password(password)?;
        Ok(())
    }
}

/// Credential storage in plaintext inside the preferences file.
#[derive(Debug, Clone)]
pub struct PlaintextStore {
    file: PrefsFile,
}

impl PlaintextStore {
    /// Construct new plaintext store backed by preferences file.
    pub fn new(file: PrefsFile) -> Self {
        Self { file }
    }
}

impl CredentialStore for PlaintextStore {
    fn get(&self, _url: &str, _user: &str) -> Result<Option<String>> {
        if !self.file.exists() {
            return Ok(None);
        }

        Ok(self.file.load()?.server.password)
    }

    #[instrument(skip(self, password), level = "debug")]
    fn set(&mut self, _url: &str, _user: &str, password: &str) -> Result<()> {
        let mut prefs = self.file.load_raw()?;
        prefs.server.password = Some(password.to_owned());
        self.file.save(&prefs)
    }

    fn is_plaintext(&self) -> bool {
        true
    }
}
