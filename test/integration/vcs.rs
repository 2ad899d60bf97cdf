// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{RepoFixture, EMAIL};

use anyhow::Result;
use git2jss::vcs::{format_time, GitRepo, RefTarget, VcsError};
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::fs::create_dir;

fn commit_time(fixture: &RepoFixture, oid: git2::Oid) -> Result<String> {
    let commit = fixture.repo().find_commit(oid)?;
    let time = format_time(&commit.committer().when());
    Ok(time)
}

#[sealed_test]
fn tag_pins_content_and_version() -> Result<()> {
    let fixture = RepoFixture::new(".")?;
    let initial = fixture.stage_and_commit("check_firewall.sh", "echo @@VERSION\n", "Initial")?;
    fixture.tag("v0.0.9")?;
    fixture.stage_and_commit("check_firewall.sh", "echo newer\n", "Rewrite")?;

    let repo = GitRepo::open(".", RefTarget::Tag("v0.0.9".into()))?;
    let metadata = repo.file_metadata("check_firewall.sh")?;
    assert_eq!(metadata.version, "v0.0.9");
    assert_eq!(metadata.path, "check_firewall.sh");
    assert_eq!(metadata.date, commit_time(&fixture, initial)?);
    assert_eq!(
        metadata.log,
        format!(
            "{} - {} {EMAIL}: \n Initial\n",
            fixture.short_id(initial)?,
            commit_time(&fixture, initial)?
        )
    );
    assert_eq!(repo.read("check_firewall.sh")?, "echo @@VERSION\n");

    Ok(())
}

#[sealed_test]
fn branch_version_uses_last_commit_touching_file() -> Result<()> {
    let fixture = RepoFixture::new(".")?;
    let touched = fixture.stage_and_commit("a.sh", "echo a\n", "Add a")?;
    fixture.stage_and_commit("b.sh", "echo b\n", "Add b")?;

    let repo = GitRepo::open(".", RefTarget::Branch("master".into()))?;
    let metadata = repo.file_metadata("a.sh")?;
    assert_eq!(
        metadata.version,
        format!("{} (branch: master)", fixture.short_id(touched)?)
    );

    Ok(())
}

#[sealed_test]
fn head_follows_checked_out_branch() -> Result<()> {
    let fixture = RepoFixture::new(".")?;
    fixture.stage_and_commit("a.sh", "echo a\n", "Add a")?;
    fixture.checkout_new_branch("feature")?;
    let latest = fixture.stage_and_commit("a.sh", "echo feature\n", "Tweak a")?;

    let repo = GitRepo::open(".", RefTarget::Head)?;
    assert_eq!(
        repo.file_metadata("a.sh")?.version,
        format!("{} (branch: feature)", fixture.short_id(latest)?)
    );

    fixture.checkout("master")?;
    let repo = GitRepo::open(".", RefTarget::Branch("feature".into()))?;
    assert_eq!(repo.read("a.sh")?, "echo feature\n");

    Ok(())
}

#[sealed_test]
fn detached_head_needs_explicit_ref() -> Result<()> {
    let fixture = RepoFixture::new(".")?;
    fixture.stage_and_commit("a.sh", "echo a\n", "Add a")?;
    fixture.detach()?;

    let result = GitRepo::open(".", RefTarget::Head);
    assert!(matches!(result, Err(VcsError::DetachedHead)));

    Ok(())
}

#[sealed_test]
fn missing_refs_are_reported() -> Result<()> {
    let fixture = RepoFixture::new(".")?;
    fixture.stage_and_commit("a.sh", "echo a\n", "Add a")?;

    let result = GitRepo::open(".", RefTarget::Tag("v9.9.9".into()));
    assert!(matches!(result, Err(VcsError::RefNotFound(_))));
    let result = GitRepo::open(".", RefTarget::Branch("nope".into()));
    assert!(matches!(result, Err(VcsError::RefNotFound(_))));

    Ok(())
}

#[sealed_test]
fn branch_falls_back_to_remote_tracking() -> Result<()> {
    let fixture = RepoFixture::new(".")?;
    let oid = fixture.stage_and_commit("a.sh", "echo a\n", "Add a")?;
    fixture
        .repo()
        .reference("refs/remotes/origin/release", oid, false, "fetch")?;

    let repo = GitRepo::open(".", RefTarget::Branch("release".into()))?;
    assert_eq!(
        repo.file_metadata("a.sh")?.version,
        format!("{} (branch: release)", fixture.short_id(oid)?)
    );

    Ok(())
}

#[sealed_test]
fn log_is_newest_first() -> Result<()> {
    let fixture = RepoFixture::new(".")?;
    let first = fixture.stage_and_commit("a.sh", "echo 1\n", "Initial")?;
    fixture.stage_and_commit("b.sh", "echo b\n", "Unrelated")?;
    let second = fixture.stage_and_commit("a.sh", "echo 2\n", "Fix firewall")?;

    let repo = GitRepo::open(".", RefTarget::Head)?;
    let history = repo.history("a.sh")?;
    let subjects = history.iter().map(|entry| entry.subject.as_str()).collect::<Vec<_>>();
    assert_eq!(subjects, vec!["Fix firewall", "Initial"]);

    let expect = format!(
        "{} - {} {EMAIL}: \n Fix firewall\n{} - {} {EMAIL}: \n Initial\n",
        fixture.short_id(second)?,
        commit_time(&fixture, second)?,
        fixture.short_id(first)?,
        commit_time(&fixture, first)?,
    );
    assert_eq!(repo.file_metadata("a.sh")?.log, expect);

    Ok(())
}

#[sealed_test]
fn origin_url_drops_git_suffix() -> Result<()> {
    let fixture = RepoFixture::new(".")?;
    fixture.stage_and_commit("a.sh", "echo a\n", "Add a")?;

    let repo = GitRepo::open(".", RefTarget::Head)?;
    assert!(matches!(repo.origin_url(), Err(VcsError::NoOrigin)));
    assert_eq!(repo.file_metadata("a.sh")?.origin, "");

    fixture.add_remote("origin", "https://github.com/example/scripts.git")?;
    let repo = GitRepo::open(".", RefTarget::Head)?;
    assert_eq!(repo.origin_url()?, "https://github.com/example/scripts");

    Ok(())
}

#[sealed_test]
fn nested_paths_are_relative_to_root() -> Result<()> {
    let fixture = RepoFixture::new(".")?;
    create_dir("scripts")?;
    fixture.stage_and_commit("scripts/a.sh", "echo a\n", "Add a")?;

    let repo = GitRepo::open("scripts", RefTarget::Head)?;
    let relative = repo.relative_path("scripts/a.sh");
    assert_eq!(relative, std::path::PathBuf::from("scripts/a.sh"));
    assert_eq!(repo.file_metadata(&relative)?.path, "scripts/a.sh");

    Ok(())
}

#[sealed_test]
fn file_without_history_is_not_found() -> Result<()> {
    let fixture = RepoFixture::new(".")?;
    fixture.stage_and_commit("a.sh", "echo a\n", "Add a")?;
    std::fs::write("untracked.sh", "echo nope\n")?;

    let repo = GitRepo::open(".", RefTarget::Head)?;
    assert!(matches!(
        repo.file_metadata("untracked.sh"),
        Err(VcsError::NoHistory { .. })
    ));
    assert!(matches!(
        repo.read("untracked.sh"),
        Err(VcsError::NoHistory { .. })
    ));

    Ok(())
}
