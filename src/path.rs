// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine where the preferences file lives when the user does not point
//! git2jss at one explicitly.

use std::path::{Component, Path, PathBuf};

/// Determine default absolute path to the preferences file.
///
/// Uses XDG Base Directory path `$XDG_CONFIG_HOME/git2jss/prefs.toml` as the
/// default, or the platform equivalent outside of Linux. Does not check if the
/// path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if configuration directory cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_prefs_file() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("git2jss").join("prefs.toml"))
        .ok_or(NoWayHome)
}

/// Express path with forward slashes.
///
/// Git always names tree entries with `/`, no matter the platform.
pub fn to_slash(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// No way to determine user's configuration directory.
///
/// # See Also
///
/// - [`dirs::config_dir`](https://docs.rs/dirs/latest/dirs/fn.config_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's configuration directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
