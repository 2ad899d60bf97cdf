// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Git metadata reader.
//!
//! Everything git2jss learns about a file comes from the local repository at
//! one particular point in history: a tag, or the head of a branch. The file
//! content is read straight out of the tree of that commit rather than from
//! the working tree, so what gets pushed to the JSS always matches the version
//! it is stamped with.
//!
//! # File History
//!
//! A commit __touches__ a path when the blob at that path differs from every
//! one of its parents. Root commits touch every path they contain. This is the
//! same history simplification `git log <path>` performs by default, so the
//! change log git2jss produces lines up with what developers see locally.

use crate::path::to_slash;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use git2::{BranchType, Commit, Oid, Repository, Sort};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};
use tracing::{debug, instrument, warn};

/// Point in history to read files from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefTarget {
    /// A tag, used verbatim as the version of every file.
    Tag(String),

    /// Head of a branch.
    Branch(String),

    /// Head of whatever branch is currently checked out.
    Head,
}

impl RefTarget {
    /// Select target from optional tag and branch names.
    ///
    /// Tag wins if both are somehow given. Callers are expected to reject that
    /// combination before getting here.
    pub fn from_options(tag: Option<String>, branch: Option<String>) -> Self {
        match (tag, branch) {
            (Some(tag), _) => Self::Tag(tag),
            (None, Some(branch)) => Self::Branch(branch),
            (None, None) => Self::Head,
        }
    }
}

impl Display for RefTarget {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Tag(tag) => write!(fmt, "tag {tag}"),
            Self::Branch(branch) => write!(fmt, "branch {branch}"),
            Self::Head => fmt.write_str("HEAD"),
        }
    }
}

/// Metadata Git knows about a single file.
///
/// Everything templated into a script except the JSS user.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct FileMetadata {
    /// Tag name, or abbreviated commit plus branch name.
    pub version: String,

    /// URL of the `origin` remote, empty if there is none.
    pub origin: String,

    /// Path relative to the repository root.
    pub path: String,

    /// Commit date of the newest commit touching the file.
    pub date: String,

    /// Formatted log of every commit touching the file, newest first.
    pub log: String,
}

/// Single entry of a file's change log.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct LogEntry {
    pub short_id: String,
    pub date: String,
    pub email: String,
    pub subject: String,
}

impl Display for LogEntry {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(
            fmt,
            "{} - {} {}: \n {}\n",
            self.short_id, self.date, self.email, self.subject
        )
    }
}

/// Local Git repository pinned to a resolved reference.
pub struct GitRepo {
    repository: Repository,
    target: RefTarget,
    branch: Option<String>,
    commit: Oid,
}

impl std::fmt::Debug for GitRepo {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.debug_struct("GitRepo")
            .field("path", &self.repository.path())
            .field("target", &self.target)
            .field("commit", &self.commit)
            .finish()
    }
}

impl GitRepo {
    /// Open repository containing path, and resolve target reference.
    ///
    /// # Errors
    ///
    /// - Return [`VcsError::Git2`] if no repository contains the path.
    /// - Return [`VcsError::RefNotFound`] if the tag or branch does not exist.
    /// - Return [`VcsError::DetachedHead`] if no branch was requested and HEAD
    ///   does not point at one.
    #[instrument(skip(path), level = "debug")]
    pub fn open(path: impl AsRef<Path>, target: RefTarget) -> Result<Self> {
        debug!("open repository at {:?}", path.as_ref().display());
        let repository = Repository::discover(path.as_ref())?;
        let (commit, branch) = resolve_target(&repository, &target)?;
        debug!("{target} resolves to {commit}");

        Ok(Self {
            repository,
            target,
            branch,
            commit,
        })
    }

    /// Reference this repository was opened at.
    pub fn target(&self) -> &RefTarget {
        &self.target
    }

    /// Working tree of the repository, if it has one.
    pub fn workdir(&self) -> Option<&Path> {
        self.repository.workdir()
    }

    /// URL of the `origin` remote with any `.git` suffix removed.
    ///
    /// # Errors
    ///
    /// - Return [`VcsError::NoOrigin`] if there is no remote named `origin`, or
    ///   it has no usable URL.
    pub fn origin_url(&self) -> Result<String> {
        let remote = self
            .repository
            .find_remote("origin")
            .map_err(|_| VcsError::NoOrigin)?;
        let url = remote.url().ok_or(VcsError::NoOrigin)?;

        Ok(url.strip_suffix(".git").unwrap_or(url).to_owned())
    }

    /// Map local path onto path relative to repository root.
    ///
    /// Paths that exist locally are resolved against the current directory.
    /// So are deleted files whose parent directory still exists. Anything else
    /// is assumed to already be relative to the repository root, e.g., a file
    /// that only exists at an older tag.
    pub fn relative_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        let workdir = self.workdir().and_then(|dir| dir.canonicalize().ok());

        match (absolute_path(path), workdir) {
            (Some(full), Some(root)) => match full.strip_prefix(&root) {
                Ok(relative) => relative.to_path_buf(),
                Err(_) => path.to_path_buf(),
            },
            _ => path.to_path_buf(),
        }
    }

    /// Read file content at resolved reference.
    ///
    /// # Errors
    ///
    /// - Return [`VcsError::NoHistory`] if the file does not exist at the
    ///   resolved reference.
    /// - Return [`VcsError::NotUtf8`] if the file is not UTF-8 text.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = to_slash(path);
        let commit = self.repository.find_commit(self.commit)?;
        let entry = commit
            .tree()?
            .get_path(Path::new(&path))
            .map_err(|_| self.no_history(&path))?;
        let blob = entry.to_object(&self.repository)?.peel_to_blob()?;

        String::from_utf8(blob.content().to_vec()).map_err(|_| VcsError::NotUtf8 { path })
    }

    /// Change log of file at resolved reference, newest first.
    ///
    /// # Errors
    ///
    /// - Return [`VcsError::NoHistory`] if no commit reachable from the
    ///   resolved reference touched the file, or the file is absent there.
    #[instrument(skip(self, path), level = "debug")]
    pub fn history(&self, path: impl AsRef<Path>) -> Result<Vec<LogEntry>> {
        let path = to_slash(path);
        let tip = self.repository.find_commit(self.commit)?;
        if tip.tree()?.get_path(Path::new(&path)).is_err() {
            return Err(self.no_history(&path));
        }

        let mut walk = self.repository.revwalk()?;
        walk.push(self.commit)?;
        walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

        let mut entries = Vec::new();
        for oid in walk {
            let commit = self.repository.find_commit(oid?)?;
            if touches(&commit, Path::new(&path))? {
                entries.push(log_entry(&commit)?);
            }
        }

        debug!("{} commits touch {path:?}", entries.len());
        if entries.is_empty() {
            return Err(self.no_history(&path));
        }

        Ok(entries)
    }

    /// Gather every piece of metadata Git has about a file.
    ///
    /// A missing `origin` remote is only logged, and leaves the origin blank.
    ///
    /// # Errors
    ///
    /// - Return [`VcsError::NoHistory`] if the file has no history at the
    ///   resolved reference.
    pub fn file_metadata(&self, path: impl AsRef<Path>) -> Result<FileMetadata> {
        let path = to_slash(path);
        let history = self.history(&path)?;
        let newest = &history[0];

        let version = match &self.target {
            RefTarget::Tag(tag) => tag.clone(),
            RefTarget::Branch(_) | RefTarget::Head => format!(
                "{} (branch: {})",
                newest.short_id,
                self.branch.as_deref().unwrap_or_default()
            ),
        };

        let origin = self.origin_url().unwrap_or_else(|error| {
            warn!("{error}, leaving origin blank");
            String::new()
        });

        Ok(FileMetadata {
            version,
            origin,
            date: newest.date.clone(),
            log: history.iter().map(ToString::to_string).collect(),
            path,
        })
    }

    fn no_history(&self, path: &str) -> VcsError {
        VcsError::NoHistory {
            path: path.into(),
            target: self.target.to_string(),
        }
    }
}

fn resolve_target(repository: &Repository, target: &RefTarget) -> Result<(Oid, Option<String>)> {
    let not_found = || VcsError::RefNotFound(target.to_string());

    match target {
        RefTarget::Tag(tag) => {
            let commit = repository
                .find_reference(&format!("refs/tags/{tag}"))
                .map_err(|_| not_found())?
                .peel_to_commit()?;
            Ok((commit.id(), None))
        }
        RefTarget::Branch(branch) => {
            // INVARIANT: Prefer local branch, then fall back to remote-tracking branch.
            let found = repository
                .find_branch(branch, BranchType::Local)
                .or_else(|_| repository.find_branch(&format!("origin/{branch}"), BranchType::Remote))
                .map_err(|_| not_found())?;
            let commit = found.get().peel_to_commit()?;
            Ok((commit.id(), Some(branch.clone())))
        }
        RefTarget::Head => {
            let head = repository.head().map_err(|_| not_found())?;
            if !head.is_branch() {
                return Err(VcsError::DetachedHead);
            }
            let branch = head.shorthand().map(ToOwned::to_owned);
            let commit = head.peel_to_commit()?;
            Ok((commit.id(), branch))
        }
    }
}

fn absolute_path(path: &Path) -> Option<PathBuf> {
    if let Ok(full) = path.canonicalize() {
        return Some(full);
    }

    let name = path.file_name()?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    parent.canonicalize().ok().map(|dir| dir.join(name))
}

fn touches(commit: &Commit<'_>, path: &Path) -> Result<bool> {
    let current = commit.tree()?.get_path(path).ok().map(|entry| entry.id());
    if commit.parent_count() == 0 {
        return Ok(current.is_some());
    }

    for parent in commit.parents() {
        let previous = parent.tree()?.get_path(path).ok().map(|entry| entry.id());
        if previous == current {
            return Ok(false);
        }
    }

    Ok(true)
}

fn log_entry(commit: &Commit<'_>) -> Result<LogEntry> {
    let short_id = commit
        .as_object()
        .short_id()?
        .as_str()
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| commit.id().to_string());
    let committer = commit.committer();

    Ok(LogEntry {
        short_id,
        date: format_time(&committer.when()),
        email: committer.email().unwrap_or_default().to_owned(),
        subject: commit.summary().unwrap_or_default().to_owned(),
    })
}

/// Format commit time as RFC 2822, keeping committer's own offset.
pub fn format_time(time: &git2::Time) -> String {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60)
        .unwrap_or_else(|| Utc.fix());

    DateTime::from_timestamp(time.seconds(), 0)
        .map(|utc| utc.with_timezone(&offset).to_rfc2822())
        .unwrap_or_default()
}

/// Git metadata error types.
#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    /// Tag or branch cannot be found.
    #[error("cannot find {0} in local repository")]
    RefNotFound(String),

    /// HEAD does not point at a branch.
    #[error("HEAD is detached, specify a tag or branch explicitly")]
    DetachedHead,

    /// No usable remote named `origin`.
    #[error("no remote named origin configured")]
    NoOrigin,

    /// File does not exist at reference, or no commit touched it.
    #[error("cannot find history for {path:?} at {target}")]
    NoHistory { path: String, target: String },

    /// File content is not valid UTF-8.
    #[error("file {path:?} is not valid UTF-8")]
    NotUtf8 { path: String },

    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),
}

/// Friendly result alias :3
pub type Result<T, E = VcsError> = std::result::Result<T, E>;
