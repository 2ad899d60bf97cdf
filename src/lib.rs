// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Keep scripts on a JAMF JSS in sync with a Git repository.
//!
//! Scripts and computer extension attributes on the JSS are pushed from a
//! single tag or branch head of a local repository. Before a file is pushed,
//! placeholders inside of it are replaced with metadata Git knows about that
//! file:
//!
//! | Placeholder | Value                                                  |
//! |-------------|--------------------------------------------------------|
//! | `@@VERSION` | Tag name, or short commit id plus branch name          |
//! | `@@ORIGIN`  | URL of the `origin` remote                             |
//! | `@@PATH`    | Path of the file relative to the repository root       |
//! | `@@DATE`    | Date of the last commit touching the file              |
//! | `@@USER`    | JSS user pushing the file                              |
//! | `@@LOG`     | Change log of the file, newest first                   |
//!
//! The change log also ends up in the notes of a script, or the description
//! of an extension attribute.
//!
//! # Modes
//!
//! Either a single file is pushed, optionally under another name and
//! optionally creating a missing object, or every matching file at the top of
//! the repository is pushed to the object of the same name. The latter only
//! ever updates objects that already exist.

pub mod artifact;
pub mod config;
pub mod jss;
pub mod path;
pub mod session;
pub mod template;
pub mod upload;
pub mod vcs;
