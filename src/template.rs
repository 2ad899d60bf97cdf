// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Placeholder templating.
//!
//! Scripts pushed to the JSS can carry __placeholders__ that are filled in
//! with information from Git right before upload. A placeholder is the `@@`
//! delimiter followed by its name, e.g., `@@VERSION`. The braced form
//! `@@{VERSION}` may be used when the placeholder runs straight into other
//! word characters.
//!
//! | Placeholder | Replacement                                            |
//! |-------------|--------------------------------------------------------|
//! | `@@VERSION` | Tag name, or commit and branch the file was pushed from |
//! | `@@ORIGIN`  | URL of the `origin` remote                             |
//! | `@@PATH`    | Path of the file relative to the repository root       |
//! | `@@DATE`    | Date of the last commit touching the file              |
//! | `@@USER`    | JSS user that pushed the file                          |
//! | `@@LOG`     | Full commit log of the file                            |
//!
//! Anything else that looks like a placeholder is left alone.

use regex::{Captures, Regex};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
    sync::LazyLock,
};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@@(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
        .expect("placeholder pattern is valid")
});

/// Resolved metadata of one file.
///
/// Every field is always populated, possibly with an empty string, so a
/// placeholder is never left half resolved.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct MetadataBundle {
    pub version: String,
    pub origin: String,
    pub path: String,
    pub date: String,
    pub user: String,
    pub log: String,
}

impl MetadataBundle {
    /// Value a placeholder expands to.
    pub fn value(&self, placeholder: Placeholder) -> &str {
        match placeholder {
            Placeholder::Version => &self.version,
            Placeholder::Origin => &self.origin,
            Placeholder::Path => &self.path,
            Placeholder::Date => &self.date,
            Placeholder::User => &self.user,
            Placeholder::Log => &self.log,
        }
    }
}

/// Recognized placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Version,
    Origin,
    Path,
    Date,
    User,
    Log,
}

impl FromStr for Placeholder {
    type Err = UnknownPlaceholder;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "VERSION" => Ok(Self::Version),
            "ORIGIN" => Ok(Self::Origin),
            "PATH" => Ok(Self::Path),
            "DATE" => Ok(Self::Date),
            "USER" => Ok(Self::User),
            "LOG" => Ok(Self::Log),
            _ => Err(UnknownPlaceholder(name.into())),
        }
    }
}

impl Display for Placeholder {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Version => "VERSION",
            Self::Origin => "ORIGIN",
            Self::Path => "PATH",
            Self::Date => "DATE",
            Self::User => "USER",
            Self::Log => "LOG",
        };
        write!(fmt, "@@{name}")
    }
}

/// Name after `@@` is not a placeholder git2jss knows about.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown placeholder @@{0}")]
pub struct UnknownPlaceholder(pub String);

/// Substitute every recognized placeholder in content.
///
/// Performs a single pass over the content. Text coming from the bundle is
/// never scanned again, so a commit subject mentioning `@@DATE` stays as is
/// inside the expanded `@@LOG`.
pub fn substitute(content: &str, bundle: &MetadataBundle) -> String {
    PLACEHOLDER
        .replace_all(content, |caps: &Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|name| name.as_str())
                .unwrap_or_default();

            match name.parse::<Placeholder>() {
                Ok(placeholder) => bundle.value(placeholder).to_owned(),
                Err(_) => caps[0].to_owned(),
            }
        })
        .into_owned()
}
