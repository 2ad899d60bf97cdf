// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the preferences file that git2jss uses to simplify
//! the process of serialization and deserialization. File I/O is left to the
//! caller to figure out.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    str::FromStr,
};

/// Preferences layout.
///
/// # General Layout
///
/// Preferences are composed of two parts: server settings and sync settings.
/// The server section identifies the JSS to talk to and the API account used
/// to talk to it. The sync section tunes how files are picked up from the
/// local repository when every matching file is pushed at once.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Preferences {
    /// Connection settings for the JSS.
    pub server: ServerSettings,

    /// Settings for batch synchronisation.
    #[serde(default)]
    pub sync: SyncSettings,
}

impl Preferences {
    /// Construct new preferences for target server and API user.
    pub fn new(url: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            server: ServerSettings {
                url: url.into(),
                user: user.into(),
                password: None,
            },
            sync: SyncSettings::default(),
        }
    }

    /// Parse preferences exactly as written, without expanding anything.
    ///
    /// Use this to edit and write back a preferences file, so variable
    /// references in it survive.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Deserialize`] if data is not valid TOML of the
    ///   expected layout.
    pub fn parse_raw(data: &str) -> Result<Self> {
        toml::de::from_str(data).map_err(ConfigError::Deserialize)
    }

    /// Expand environment variables in connection settings.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::ShellExpansion`] if a referenced variable is not
    ///   set.
    /// - Return [`ConfigError::MissingServer`] if url or user end up blank.
    pub fn expand_env(mut self) -> Result<Self> {
        // INVARIANT: Expand environment variables in connection settings.
        //   - CI/CD pipelines inject these instead of committing them.
        self.server.url = shellexpand::env(&self.server.url)
            .map_err(ConfigError::ShellExpansion)?
            .into_owned();
        self.server.user = shellexpand::env(&self.server.user)
            .map_err(ConfigError::ShellExpansion)?
            .into_owned();

        if self.server.url.is_empty() || self.server.user.is_empty() {
            return Err(ConfigError::MissingServer);
        }

        Ok(self)
    }
}

impl FromStr for Preferences {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        Self::parse_raw(data)?.expand_env()
    }
}

impl Display for Preferences {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// JSS connection settings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    /// Complete URL to the JSS, with port.
    pub url: String,

    /// API username.
    pub user: String,

    /// Plaintext password, only kept here when the keychain is not used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Batch synchronisation settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct SyncSettings {
    /// Glob patterns matching candidate files at the top of the local repo.
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            patterns: default_patterns(),
        }
    }
}

fn default_patterns() -> Vec<String> {
    vec!["*.sh".into(), "*.py".into(), "*.pl".into()]
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Server URL or API user is blank.
    #[error("preferences must name both a server url and an api user")]
    MissingServer,
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
