// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use git2jss::{
    jss::{classic::ClassicClient, ObjectKind},
    path::default_prefs_file,
    session::{
        self,
        prompt::InquirePrompter,
        store::{CredentialStore, Keychain, PlaintextStore},
        PrefsFile,
    },
    upload::{batch_jobs, Outcome, UploadJob, Uploader},
    vcs::{GitRepo, RefTarget},
};

use anyhow::{bail, Result};
use clap::Parser;
use std::{
    path::{Path, PathBuf},
    process::exit,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Push scripts and extension attributes from a Git repository to a JSS.
///
/// Placeholders @@VERSION, @@ORIGIN, @@PATH, @@DATE, @@USER, and @@LOG are
/// replaced with metadata from Git before a file is pushed.
#[derive(Debug, Clone, Parser)]
#[command(
    about,
    long_about,
    override_usage = "\n  git2jss [options] --file <file>\n  git2jss [options] --all\n  git2jss --jss-info",
    version
)]
struct Cli {
    /// File to push.
    #[arg(
        short,
        long,
        value_name = "file",
        conflicts_with = "all",
        required_unless_present_any = ["all", "jss_info"]
    )]
    pub file: Option<PathBuf>,

    /// Push every matching file to the object of the same name.
    ///
    /// Objects that do not exist yet are skipped, never created.
    #[arg(long)]
    pub all: bool,

    /// Name of the object to push to instead of the file name.
    #[arg(short, long, value_name = "name")]
    pub name: Option<String>,

    /// Tag to push files from.
    #[arg(short, long, value_name = "tag", conflicts_with = "branch")]
    pub tag: Option<String>,

    /// Branch to push files from instead of the current one.
    #[arg(short, long, value_name = "branch")]
    pub branch: Option<String>,

    /// Kind of object to push to.
    #[arg(short, long, value_enum, default_value_t = ObjectKind::Script)]
    pub mode: ObjectKind,

    /// Create the object if it does not exist yet.
    #[arg(short, long, conflicts_with = "all")]
    pub create: bool,

    /// Show the configured JSS and user, then quit.
    #[arg(short = 'i', long)]
    pub jss_info: bool,

    /// Path to local repository.
    #[arg(long, value_name = "path", default_value = ".")]
    pub local_repo: PathBuf,

    /// Path to preferences file.
    #[arg(long, value_name = "path")]
    pub prefs_file: Option<String>,

    /// Keep password in preferences file instead of the system keychain.
    #[arg(long)]
    pub no_keychain: bool,
}

impl Cli {
    fn run(self) -> Result<()> {
        let file = match &self.prefs_file {
            Some(path) => PrefsFile::expand(path)?,
            None => PrefsFile::new(default_prefs_file()?),
        };
        let mut store: Box<dyn CredentialStore> = if self.no_keychain {
            Box::new(PlaintextStore::new(file.clone()))
        } else {
            Box::new(Keychain)
        };
        let mut prompter = InquirePrompter;

        let prefs = session::load_or_configure(&file, store.as_mut(), &mut prompter)?;
        if self.jss_info {
            println!("JSS: {}", prefs.server.url);
            println!("User: {}", prefs.server.user);
            println!("Preferences: {}", file.path().display());
            return Ok(());
        }

        let session = session::resolve(&file, &prefs, store.as_mut(), &mut prompter)?;
        let client = ClassicClient::new(&session);
        let repo = GitRepo::open(
            &self.local_repo,
            RefTarget::from_options(self.tag.clone(), self.branch.clone()),
        )?;
        info!("pushing from {} to {}", repo.target(), client.base_url());
        let uploader = Uploader::new(&repo, &client);

        if self.all {
            if let Some(name) = &self.name {
                warn!("ignoring --name {name:?}, every file is pushed under its own name");
            }

            let jobs = batch_jobs(&self.local_repo, &prefs.sync.patterns, self.mode)?;
            let summary = uploader.upload_all(jobs)?;
            if !summary.is_success() {
                bail!("failed to push {} of the files", summary.failed);
            }

            return Ok(());
        }

        let Some(path) = self.file else {
            bail!("nothing to push, pass --file or --all");
        };
        let job = UploadJob::single(
            local_file(&self.local_repo, path),
            self.mode,
            self.name,
            self.create,
        );
        if uploader.upload(&job)? == Outcome::Skipped {
            warn!("nothing was pushed");
        }

        Ok(())
    }
}

/// Locate file selected with `--file` inside the local repository.
///
/// Files missing from the working tree are passed on as given, so they are
/// looked up relative to the repository root.
fn local_file(local_repo: &Path, file: PathBuf) -> PathBuf {
    let joined = local_repo.join(&file);
    if joined.exists() {
        joined
    } else {
        file
    }
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}
