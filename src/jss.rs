// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! JSS object access.
//!
//! git2jss only ever needs three things from the JSS: find an object by name,
//! create an object, and overwrite an existing one. These are modeled through
//! the [`JssApi`] trait for the two kinds of object git2jss knows how to
//! write, so the upload logic does not care whether it talks to a real
//! server or to something else entirely.
//!
//! # See Also
//!
//! 1. [`ClassicClient`](crate::jss::classic::ClassicClient)
//! 2. [Jamf Pro Classic API](https://developer.jamf.com/jamf-pro/reference/classic-api)

pub mod classic;
pub mod xml;

use clap::ValueEnum;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Kind of JSS object to write.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ObjectKind {
    /// Script used by policies.
    #[default]
    #[value(name = "Script")]
    Script,

    /// Computer extension attribute whose value comes from a script.
    #[value(name = "ComputerExtensionAttribute")]
    ComputerExtensionAttribute,
}

impl ObjectKind {
    /// Resource name of kind in the Classic API.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Script => "scripts",
            Self::ComputerExtensionAttribute => "computerextensionattributes",
        }
    }

    /// Root element name of a single object of this kind.
    pub fn element(&self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::ComputerExtensionAttribute => "computer_extension_attribute",
        }
    }
}

impl Display for ObjectKind {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Script => fmt.write_str("Script"),
            Self::ComputerExtensionAttribute => fmt.write_str("ComputerExtensionAttribute"),
        }
    }
}

/// Server-side identifier of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub u64);

impl Display for ObjectId {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "{}", self.0)
    }
}

/// Content written to a JSS object.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ObjectRecord {
    /// Display name of the object.
    pub name: String,

    /// Script body, already templated.
    pub body: String,

    /// Notes of a script, or description of an extension attribute.
    pub notes: String,
}

/// Layer of indirection for JSS access.
pub trait JssApi {
    /// Name of the user the session authenticates as.
    fn user(&self) -> &str;

    /// Find object by exact, case-sensitive name.
    fn find_by_name(&self, kind: ObjectKind, name: &str) -> Result<Option<ObjectId>>;

    /// Create new object.
    fn create(&self, kind: ObjectKind, record: &ObjectRecord) -> Result<ObjectId>;

    /// Overwrite existing object.
    fn update(&self, kind: ObjectKind, id: ObjectId, record: &ObjectRecord) -> Result<()>;
}

/// All possible error types for JSS interaction.
#[derive(Debug, thiserror::Error)]
pub enum JssError {
    /// Server rejects credentials.
    #[error("jss rejected credentials at {url}")]
    Auth { url: String },

    /// Server answers with an error status.
    #[error("jss answered {status} at {url}: {message}")]
    Status {
        status: u16,
        url: String,
        message: String,
    },

    /// Request never got an answer.
    #[error(transparent)]
    Transport(#[from] Box<ureq::Transport>),

    /// Response body cannot be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Response body is not what the Classic API should send.
    #[error("unexpected response from {url}")]
    Malformed { url: String },
}

impl JssError {
    /// Credentials are wrong, so every further call will fail too.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

/// Friendly result alias :3
pub type Result<T, E = JssError> = std::result::Result<T, E>;
