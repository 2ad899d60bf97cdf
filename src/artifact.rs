// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Target artifact resolution.
//!
//! Every upload writes to exactly one JSS object, identified by its kind and
//! its display name. Whether that object is updated, created, skipped, or
//! considered missing depends on how the upload was requested:
//!
//! - Pushing every file at once only ever updates objects that already exist.
//!   Files without a matching object are skipped.
//! - Pushing a single file updates the matching object, or creates it when
//!   explicitly asked to. Otherwise a missing object is an error.
//!
//! Objects are looked up fresh for every upload. Nothing is cached.

use crate::jss::{JssApi, JssError, ObjectId, ObjectKind};

use tracing::{debug, instrument};

/// JSS object an upload writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetArtifact {
    pub kind: ObjectKind,
    pub name: String,
}

/// What to do when no object matches the target.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OnMissing {
    /// Create a new object with the target's name.
    Create,

    /// Leave the file alone.
    Skip,

    /// Report the object as not found.
    #[default]
    Fail,
}

/// Outcome of resolving a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Overwrite existing object.
    Update(ObjectId),

    /// Create new object.
    Create,

    /// Do not write anything.
    Skip,
}

impl TargetArtifact {
    /// Construct new target artifact.
    pub fn new(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Look up matching object by exact name.
    ///
    /// # Errors
    ///
    /// - Return [`JssError`] if the JSS cannot be queried.
    pub fn lookup<A>(&self, api: &A) -> Result<Option<ObjectId>, JssError>
    where
        A: JssApi + ?Sized,
    {
        api.find_by_name(self.kind, &self.name)
    }

    /// Decide how to write to target.
    ///
    /// # Errors
    ///
    /// - Return [`ResolveError::NotFound`] if no object matches, and missing
    ///   objects are not to be created or skipped.
    /// - Return [`ResolveError::Lookup`] if the JSS cannot be queried.
    #[instrument(skip(self, api), fields(kind = %self.kind, name = %self.name), level = "debug")]
    pub fn resolve<A>(&self, api: &A, on_missing: OnMissing) -> Result<Resolution>
    where
        A: JssApi + ?Sized,
    {
        let resolution = match (self.lookup(api)?, on_missing) {
            (Some(id), _) => Resolution::Update(id),
            (None, OnMissing::Create) => Resolution::Create,
            (None, OnMissing::Skip) => Resolution::Skip,
            (None, OnMissing::Fail) => {
                return Err(ResolveError::NotFound {
                    kind: self.kind,
                    name: self.name.clone(),
                })
            }
        };
        debug!("resolved to {resolution:?}");

        Ok(resolution)
    }
}

/// Target resolution error types.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No object matches, and creation was not requested.
    #[error("cannot find a {kind} called {name:?} on the jss")]
    NotFound { kind: ObjectKind, name: String },

    /// JSS cannot be queried.
    #[error(transparent)]
    Lookup(#[from] JssError),
}

/// Friendly result alias :3
type Result<T, E = ResolveError> = std::result::Result<T, E>;
