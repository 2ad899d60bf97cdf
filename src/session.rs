// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! JSS session resolution.
//!
//! Before anything can be pushed, git2jss needs three things: the URL of the
//! JSS, an API user, and that user's password. The URL and user come from the
//! __preferences file__, the password from a [`CredentialStore`]. Whatever is
//! missing is asked for interactively and persisted, so the next run does not
//! have to ask again.
//!
//! # First Run
//!
//! If the preferences file does not exist yet, the user is walked through
//! creating one. The password goes to the credential store, never into the
//! file, unless the plaintext store was selected explicitly.
//!
//! # Plaintext Passwords
//!
//! Older setups may have left a plaintext password in the preferences file.
//! When the keychain is in use, the user is offered to move it there. Refusing
//! stops the run.

pub mod prompt;
pub mod store;

use crate::{
    config::{ConfigError, Preferences},
    session::{prompt::Prompter, store::CredentialStore},
};

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    fs::{read_to_string, write},
    path::{Path, PathBuf},
};
use tracing::{info, instrument, warn};

/// Authenticated identity used for every JSS call of a run.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub url: String,
    pub user: String,
    pub password: String,
}

impl Debug for Session {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.debug_struct("Session")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Preferences file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefsFile {
    path: PathBuf,
}

impl PrefsFile {
    /// Construct new handle to preferences file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Construct new handle with shell expansion performed on path.
    ///
    /// # Errors
    ///
    /// - Return [`SessionError::ShellExpansion`] if a referenced variable is
    ///   not set.
    pub fn expand(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_string_lossy().into_owned();
        let expanded = shellexpand::full(&path)?;

        Ok(Self::new(expanded.into_owned()))
    }

    /// Path to preferences file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if preferences file exists.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read and parse preferences, expanding environment variables.
    ///
    /// # Errors
    ///
    /// - Return [`SessionError::ReadPrefs`] if file cannot be read.
    /// - Return [`SessionError::InvalidPrefs`] if file cannot be parsed.
    pub fn load(&self) -> Result<Preferences> {
        self.read()?.parse().map_err(|err| self.invalid(err))
    }

    /// Read and parse preferences as written on disk.
    ///
    /// Anything that modifies the file goes through here, so `$VAR`
    /// references are written back untouched.
    ///
    /// # Errors
    ///
    /// - Return [`SessionError::ReadPrefs`] if file cannot be read.
    /// - Return [`SessionError::InvalidPrefs`] if file cannot be parsed.
    pub fn load_raw(&self) -> Result<Preferences> {
        Preferences::parse_raw(&self.read()?).map_err(|err| self.invalid(err))
    }

    fn read(&self) -> Result<String> {
        read_to_string(&self.path).map_err(|err| SessionError::ReadPrefs {
            source: err,
            path: self.path.clone(),
        })
    }

    fn invalid(&self, err: ConfigError) -> SessionError {
        SessionError::InvalidPrefs {
            source: err,
            path: self.path.clone(),
        }
    }

    /// Write preferences, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// - Return [`SessionError::WritePrefs`] if file or its parent
    ///   directories cannot be written.
    pub fn save(&self, prefs: &Preferences) -> Result<()> {
        let write_err = |err: std::io::Error| SessionError::WritePrefs {
            source: err,
            path: self.path.clone(),
        };

        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            mkdirp::mkdirp(parent).map_err(write_err)?;
        }

        write(&self.path, prefs.to_string()).map_err(write_err)
    }
}

/// Load preferences, walking the user through setup if there are none yet.
///
/// # Errors
///
/// - Return [`SessionError`] if preferences cannot be read, written, or
///   prompted for.
#[instrument(skip_all, level = "debug")]
pub fn load_or_configure(
    file: &PrefsFile,
    store: &mut dyn CredentialStore,
    prompter: &mut dyn Prompter,
) -> Result<Preferences> {
    if file.exists() {
        return file.load();
    }

    info!(
        "no preferences found, answer the following questions to create {}",
        file.path().display()
    );
    configure(file, store, prompter)
}

/// Prompt for connection settings, and persist them.
///
/// # Errors
///
/// - Return [`SessionError`] if preferences cannot be written, or prompted
///   for.
pub fn configure(
    file: &PrefsFile,
    store: &mut dyn CredentialStore,
    prompter: &mut dyn Prompter,
) -> Result<Preferences> {
    let url = prompter.text("Complete URL to your JSS, with port (e.g. https://jss.example.org:8443):")?;
    let user = prompter.text("API username:")?;
    let password = prompter.password("API user's password:")?;

    let prefs = Preferences::new(url, user);
    file.save(&prefs)?;
    store.set(&prefs.server.url, &prefs.server.user, &password)?;
    info!("preferences created at {}", file.path().display());

    // INVARIANT: Return what is actually on disk now.
    //   - The plaintext store may have written the password into the file.
    file.load()
}

/// Resolve session for configured JSS.
///
/// # Errors
///
/// - Return [`SessionError::PlaintextRefused`] if a plaintext password was
///   found, and the user declined to move it into the credential store.
/// - Return [`SessionError`] if credentials cannot be read, written, or
///   prompted for.
#[instrument(skip_all, level = "debug")]
pub fn resolve(
    file: &PrefsFile,
    prefs: &Preferences,
    store: &mut dyn CredentialStore,
    prompter: &mut dyn Prompter,
) -> Result<Session> {
    let url = prefs.server.url.clone();
    let user = prefs.server.user.clone();

    if !store.is_plaintext() {
        if let Some(password) = &prefs.server.password {
            migrate_plaintext(file, prefs, password, store, prompter)?;
        }
    }

    let password = match store.get(&url, &user)? {
        Some(password) => password,
        None => {
            warn!("no password stored for {user} on {url}");
            let password = prompter.password(&format!("Password for {user} on {url}:"))?;
            store.set(&url, &user, &password)?;
            password
        }
    };

    Ok(Session {
        url,
        user,
        password,
    })
}

fn migrate_plaintext(
    file: &PrefsFile,
    prefs: &Preferences,
    password: &str,
    store: &mut dyn CredentialStore,
    prompter: &mut dyn Prompter,
) -> Result<()> {
    warn!(
        "found plaintext password in {}, but keychain is in use",
        file.path().display()
    );

    if !prompter.confirm("Move the password out of the preferences file and into the keychain?")? {
        return Err(SessionError::PlaintextRefused {
            path: file.path().to_path_buf(),
        });
    }

    store.set(&prefs.server.url, &prefs.server.user, password)?;
    let mut stripped = file.load_raw()?;
    stripped.server.password = None;
    file.save(&stripped)?;
    info!("password moved into keychain");

    Ok(())
}

/// All possible error types for session resolution.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Preferences file cannot be read.
    #[error("failed to read preferences at {:?}", path.display())]
    ReadPrefs {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Preferences file cannot be written.
    #[error("failed to write preferences at {:?}", path.display())]
    WritePrefs {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Preferences file contents are invalid.
    #[error("invalid preferences at {:?}", path.display())]
    InvalidPrefs {
        #[source]
        source: ConfigError,
        path: PathBuf,
    },

    /// Plaintext password found, and user refused to move it.
    #[error(
        "plaintext password in {:?} without --no-keychain, move it or pass --no-keychain",
        path.display()
    )]
    PlaintextRefused { path: PathBuf },

    /// Failed to perform shell expansion on preferences path.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// System keychain operations fail.
    #[error(transparent)]
    Keyring(#[from] keyring::Error),

    /// Interactive prompt fails or is cancelled.
    #[error(transparent)]
    Prompt(#[from] inquire::InquireError),
}

/// Friendly result alias :3
pub type Result<T, E = SessionError> = std::result::Result<T, E>;
