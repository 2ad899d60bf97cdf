// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Upload orchestration.
//!
//! Each file goes through the same linear steps, without any retry:
//!
//! 1. Resolve metadata of the file from Git.
//! 2. Substitute placeholders in the file content.
//! 3. Resolve the target object on the JSS.
//! 4. Write the templated content and change log to that object.
//!
//! Files picked up in batch mode resolve their target first, and are skipped
//! right away when no object matches.
//!
//! Failing any step fails the file. When pushing many files at once, files
//! are processed one after the other, and a failing file does not stop the
//! rest, unless the JSS rejects the credentials. Nothing that follows could
//! succeed in that case.

use crate::{
    artifact::{OnMissing, Resolution, ResolveError, TargetArtifact},
    jss::{JssApi, JssError, ObjectId, ObjectKind, ObjectRecord},
    path::to_slash,
    template::{substitute, MetadataBundle},
    vcs::{GitRepo, VcsError},
};

use glob::{glob_with, MatchOptions, Pattern};
use std::{
    collections::BTreeSet,
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};
use tracing::{debug, error, info, info_span, instrument};

/// Single file to push to the JSS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadJob {
    /// Path to file in local repository.
    pub local_path: PathBuf,

    /// Object to write to.
    pub target: TargetArtifact,

    /// What to do if object does not exist.
    pub on_missing: OnMissing,
}

impl UploadJob {
    /// Construct job for a single, explicitly selected file.
    ///
    /// Target name defaults to the file name. Missing targets are only created
    /// if asked to.
    pub fn single(
        path: impl Into<PathBuf>,
        kind: ObjectKind,
        name: Option<String>,
        create: bool,
    ) -> Self {
        let local_path = path.into();
        let name = name.unwrap_or_else(|| file_name(&local_path));

        Self {
            target: TargetArtifact::new(kind, name),
            on_missing: if create {
                OnMissing::Create
            } else {
                OnMissing::Fail
            },
            local_path,
        }
    }

    /// Construct job for a file picked up by batch mode.
    ///
    /// Target name is always the file name, and missing targets are skipped.
    pub fn batch(path: impl Into<PathBuf>, kind: ObjectKind) -> Self {
        let local_path = path.into();

        Self {
            target: TargetArtifact::new(kind, file_name(&local_path)),
            on_missing: OnMissing::Skip,
            local_path,
        }
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Existing object was overwritten.
    Updated(ObjectId),

    /// New object was created.
    Created(ObjectId),

    /// No matching object, nothing written.
    Skipped,
}

/// Tally of a batch upload.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Summary {
    /// Check if no file failed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl Display for Summary {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(
            fmt,
            "{} succeeded, {} failed, {} skipped",
            self.succeeded, self.failed, self.skipped
        )
    }
}

/// Push files from a Git repository to the JSS.
pub struct Uploader<'a, A>
where
    A: JssApi + ?Sized,
{
    repo: &'a GitRepo,
    api: &'a A,
}

impl<'a, A> Uploader<'a, A>
where
    A: JssApi + ?Sized,
{
    /// Construct new uploader.
    pub fn new(repo: &'a GitRepo, api: &'a A) -> Self {
        Self { repo, api }
    }

    /// Build the record that would be written for a job.
    ///
    /// Resolves metadata, and substitutes placeholders. Does not talk to
    /// the JSS.
    ///
    /// # Errors
    ///
    /// - Return [`UploadError::Vcs`] if the file has no history at the
    ///   resolved reference, or cannot be read.
    pub fn prepare(&self, job: &UploadJob) -> Result<ObjectRecord> {
        let path = self.repo.relative_path(&job.local_path);
        debug!("resolve metadata of {}", to_slash(&path));
        let metadata = self.repo.file_metadata(&path)?;
        let content = self.repo.read(&path)?;

        let bundle = MetadataBundle {
            version: metadata.version,
            origin: metadata.origin,
            path: metadata.path,
            date: metadata.date,
            user: self.api.user().to_owned(),
            log: metadata.log,
        };

        debug!("substitute placeholders as version {}", bundle.version);
        Ok(ObjectRecord {
            name: job.target.name.clone(),
            body: substitute(&content, &bundle),
            notes: bundle.log,
        })
    }

    /// Push one file to the JSS.
    ///
    /// # Errors
    ///
    /// - Return [`UploadError::Vcs`] if the file has no history at the
    ///   resolved reference, or cannot be read.
    /// - Return [`UploadError::TargetNotFound`] if no object matches, and the
    ///   job does not allow creating or skipping.
    /// - Return [`UploadError::Auth`] if the JSS rejects the credentials.
    /// - Return [`UploadError::Lookup`] or [`UploadError::RemoteWrite`] if
    ///   any other JSS call fails.
    #[instrument(skip(self, job), fields(file = %job.local_path.display()), level = "debug")]
    pub fn upload(&self, job: &UploadJob) -> Result<Outcome> {
        let target = &job.target;

        // INVARIANT: Jobs that may skip resolve their target before touching Git.
        //   - A file without a matching object counts as skipped, even if it
        //     has no history at the resolved reference.
        let (record, resolution) = match job.on_missing {
            OnMissing::Skip => {
                let resolution = self.resolve(job)?;
                if resolution == Resolution::Skip {
                    info!(
                        "skip {}, no {} called {:?} on the jss",
                        job.local_path.display(),
                        target.kind,
                        target.name
                    );
                    return Ok(Outcome::Skipped);
                }
                (self.prepare(job)?, resolution)
            }
            OnMissing::Create | OnMissing::Fail => {
                let record = self.prepare(job)?;
                (record, self.resolve(job)?)
            }
        };

        let outcome = match resolution {
            Resolution::Skip => Outcome::Skipped,
            Resolution::Update(id) => {
                self.api
                    .update(target.kind, id, &record)
                    .map_err(|err| UploadError::remote(target, err, true))?;
                info!("saved {} to {} {:?}", job.local_path.display(), target.kind, target.name);
                Outcome::Updated(id)
            }
            Resolution::Create => {
                let id = self
                    .api
                    .create(target.kind, &record)
                    .map_err(|err| UploadError::remote(target, err, true))?;
                info!(
                    "created {} {:?} (id {id}) from {}",
                    target.kind,
                    target.name,
                    job.local_path.display()
                );
                Outcome::Created(id)
            }
        };

        Ok(outcome)
    }

    fn resolve(&self, job: &UploadJob) -> Result<Resolution> {
        let target = &job.target;
        target
            .resolve(self.api, job.on_missing)
            .map_err(|err| match err {
                ResolveError::NotFound { kind, name } => UploadError::TargetNotFound { kind, name },
                ResolveError::Lookup(source) => UploadError::remote(target, source, false),
            })
    }

    /// Push many files to the JSS, one after the other.
    ///
    /// Per-file failures are logged and counted. Skipped files count as
    /// skipped, never as failed.
    ///
    /// # Errors
    ///
    /// - Return [`UploadError::Auth`] as soon as the JSS rejects the
    ///   credentials. Files already pushed stay pushed.
    pub fn upload_all(&self, jobs: impl IntoIterator<Item = UploadJob>) -> Result<Summary> {
        let mut summary = Summary::default();

        for job in jobs {
            let span = info_span!("upload", file = %job.local_path.display());
            let _guard = span.enter();

            match self.upload(&job) {
                Ok(Outcome::Skipped) => summary.skipped += 1,
                Ok(_) => summary.succeeded += 1,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    error!("failed to push {}: {err}", job.local_path.display());
                    summary.failed += 1;
                }
            }
        }

        info!("{summary}");
        Ok(summary)
    }
}

/// List candidate files for batch mode.
///
/// Only looks at the top level of the directory. Hidden files never match.
/// Result is sorted, and free of duplicates.
///
/// # Errors
///
/// - Return [`UploadError::Pattern`] if a pattern is invalid.
/// - Return [`UploadError::Glob`] if a matching path cannot be inspected.
#[instrument(skip(dir), level = "debug")]
pub fn list_candidates(dir: impl AsRef<Path>, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };
    let base = Pattern::escape(&dir.as_ref().to_string_lossy());

    let mut files = BTreeSet::new();
    for pattern in patterns {
        for entry in glob_with(&format!("{base}/{pattern}"), options)? {
            let path = entry?;
            if path.is_file() {
                files.insert(path);
            }
        }
    }

    debug!("{} candidate files", files.len());
    Ok(files.into_iter().collect())
}

/// Build batch jobs for every candidate file in directory.
///
/// # Errors
///
/// - Return [`UploadError`] if candidate files cannot be listed.
pub fn batch_jobs(
    dir: impl AsRef<Path>,
    patterns: &[String],
    kind: ObjectKind,
) -> Result<Vec<UploadJob>> {
    Ok(list_candidates(dir, patterns)?
        .into_iter()
        .map(|path| UploadJob::batch(path, kind))
        .collect())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| to_slash(path))
}

/// All possible error types for uploads.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// File cannot be resolved in Git.
    #[error(transparent)]
    Vcs(#[from] VcsError),

    /// No matching object, and not allowed to create one.
    #[error("cannot find a {kind} called {name:?} on the jss")]
    TargetNotFound { kind: ObjectKind, name: String },

    /// JSS rejects credentials.
    #[error(transparent)]
    Auth(JssError),

    /// Looking up the target object fails.
    #[error("failed to look up {kind} {name:?}")]
    Lookup {
        kind: ObjectKind,
        name: String,
        #[source]
        source: JssError,
    },

    /// Creating or updating the target object fails.
    #[error("failed to write {kind} {name:?}")]
    RemoteWrite {
        kind: ObjectKind,
        name: String,
        #[source]
        source: JssError,
    },

    /// Batch pattern is invalid.
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    /// Batch candidate cannot be inspected.
    #[error(transparent)]
    Glob(#[from] glob::GlobError),
}

impl UploadError {
    fn remote(target: &TargetArtifact, source: JssError, write: bool) -> Self {
        let kind = target.kind;
        let name = target.name.clone();

        match (source.is_auth(), write) {
            (true, _) => Self::Auth(source),
            (false, true) => Self::RemoteWrite { kind, name, source },
            (false, false) => Self::Lookup { kind, name, source },
        }
    }

    /// Check if no further upload can succeed after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Check if error means something could not be found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TargetNotFound { .. } | Self::Vcs(VcsError::NoHistory { .. })
        )
    }
}

/// Friendly result alias :3
pub type Result<T, E = UploadError> = std::result::Result<T, E>;
