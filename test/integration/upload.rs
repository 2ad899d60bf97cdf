// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{FakeJss, RepoFixture, EMAIL};

use anyhow::Result;
use git2jss::{
    jss::{ObjectId, ObjectKind},
    upload::{batch_jobs, Outcome, Summary, UploadError, UploadJob, Uploader},
    vcs::{format_time, GitRepo, RefTarget},
};
use indoc::indoc;
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::path::Path;

fn patterns() -> Vec<String> {
    vec!["*.sh".into(), "*.py".into(), "*.pl".into()]
}

#[sealed_test]
fn tagged_script_is_templated_and_logged() -> Result<()> {
    let fixture = RepoFixture::new(".")?;
    let script = indoc! {"
        #!/bin/sh
        # Version: @@VERSION
        # Pushed by @@USER from @@ORIGIN/@@PATH
        echo firewall
    "};
    let initial = fixture.stage_and_commit("check_firewall.sh", script, "Initial")?;
    fixture.tag("v0.0.9")?;
    fixture.add_remote("origin", "https://github.com/example/scripts.git")?;

    let jss = FakeJss::with_objects([(ObjectKind::Script, "check_firewall.sh")]);
    let repo = GitRepo::open(".", RefTarget::Tag("v0.0.9".into()))?;
    let job = UploadJob::single("check_firewall.sh", ObjectKind::Script, None, false);
    let outcome = Uploader::new(&repo, &jss).upload(&job)?;
    assert_eq!(outcome, Outcome::Updated(ObjectId(1)));

    let record = jss
        .record(ObjectKind::Script, "check_firewall.sh")
        .expect("object exists");
    let expect = indoc! {"
        #!/bin/sh
        # Version: v0.0.9
        # Pushed by api from https://github.com/example/scripts/check_firewall.sh
        echo firewall
    "};
    assert_eq!(record.body, expect);

    let commit = fixture.repo().find_commit(initial)?;
    assert_eq!(
        record.notes,
        format!(
            "{} - {} {EMAIL}: \n Initial\n",
            fixture.short_id(initial)?,
            format_time(&commit.committer().when())
        )
    );
    assert_eq!(jss.writes(), 1);

    Ok(())
}

#[sealed_test]
fn branch_version_token_lands_in_body() -> Result<()> {
    let fixture = RepoFixture::new(".")?;
    let oid = fixture.stage_and_commit("a.sh", "VERSION='@@VERSION'\n", "Add a")?;

    let jss = FakeJss::with_objects([(ObjectKind::Script, "a.sh")]);
    let repo = GitRepo::open(".", RefTarget::Branch("master".into()))?;
    let job = UploadJob::single("a.sh", ObjectKind::Script, None, false);
    let record = Uploader::new(&repo, &jss).prepare(&job)?;
    assert_eq!(
        record.body,
        format!("VERSION='{} (branch: master)'\n", fixture.short_id(oid)?)
    );
    assert_eq!(jss.writes(), 0);

    Ok(())
}

#[sealed_test]
fn missing_target_without_create_writes_nothing() -> Result<()> {
    let fixture = RepoFixture::new(".")?;
    fixture.stage_and_commit("do_something_great.sh", "echo great\n", "Add script")?;

    let jss = FakeJss::with_objects([(ObjectKind::Script, "check_firewall.sh")]);
    let repo = GitRepo::open(".", RefTarget::Head)?;
    let job = UploadJob::single("do_something_great.sh", ObjectKind::Script, None, false);
    let result = Uploader::new(&repo, &jss).upload(&job);

    let error = result.expect_err("target does not exist");
    assert!(matches!(error, UploadError::TargetNotFound { .. }));
    assert!(error.is_not_found());
    assert!(!error.is_fatal());
    assert_eq!(jss.writes(), 0);

    Ok(())
}

#[sealed_test]
fn missing_target_with_create_is_created_under_name() -> Result<()> {
    let fixture = RepoFixture::new(".")?;
    fixture.stage_and_commit("firewall.sh", "echo @@PATH\n", "Add attribute")?;

    let jss = FakeJss::with_objects([(ObjectKind::Script, "Firewall State")]);
    let repo = GitRepo::open(".", RefTarget::Head)?;
    let job = UploadJob::single(
        "firewall.sh",
        ObjectKind::ComputerExtensionAttribute,
        Some("Firewall State".into()),
        true,
    );
    let outcome = Uploader::new(&repo, &jss).upload(&job)?;
    assert_eq!(outcome, Outcome::Created(ObjectId(2)));

    let record = jss
        .record(ObjectKind::ComputerExtensionAttribute, "Firewall State")
        .expect("object was created");
    assert_eq!(record.body, "echo firewall.sh\n");
    assert!(record.notes.ends_with(": \n Add attribute\n"));

    Ok(())
}

#[sealed_test]
fn batch_never_creates_and_counts_skips() -> Result<()> {
    let fixture = RepoFixture::new(".")?;
    fixture.stage_and_commit("a.sh", "echo a\n", "Add a")?;
    fixture.stage_and_commit("b.py", "print('b')\n", "Add b")?;
    fixture.stage_and_commit("c.pl", "print 'c';\n", "Add c")?;
    fixture.stage_and_commit("README.md", "# scripts\n", "Add readme")?;

    let jss = FakeJss::with_objects([
        (ObjectKind::Script, "a.sh"),
        (ObjectKind::Script, "c.pl"),
        (ObjectKind::Script, "README.md"),
        (ObjectKind::ComputerExtensionAttribute, "b.py"),
    ]);
    let repo = GitRepo::open(".", RefTarget::Head)?;
    let jobs = batch_jobs(".", &patterns(), ObjectKind::Script)?;
    let summary = Uploader::new(&repo, &jss).upload_all(jobs)?;

    assert_eq!(
        summary,
        Summary {
            succeeded: 2,
            failed: 0,
            skipped: 1,
        }
    );
    assert!(summary.is_success());
    assert_eq!(jss.writes(), 2);
    assert!(jss.record(ObjectKind::Script, "b.py").is_none());
    assert_eq!(
        jss.record(ObjectKind::Script, "README.md")
            .map(|record| record.body),
        Some(String::new())
    );

    Ok(())
}

#[sealed_test]
fn batch_continues_past_failures() -> Result<()> {
    let fixture = RepoFixture::new(".")?;
    fixture.stage_and_commit("a.sh", "echo a\n", "Add a")?;
    fixture.stage_and_commit("c.pl", "print 'c';\n", "Add c")?;
    std::fs::write("uncommitted.sh", "echo nope\n")?;

    let jss = FakeJss::with_objects([
        (ObjectKind::Script, "a.sh"),
        (ObjectKind::Script, "c.pl"),
        (ObjectKind::Script, "uncommitted.sh"),
    ])
    .breaking("a.sh");
    let repo = GitRepo::open(".", RefTarget::Head)?;
    let jobs = batch_jobs(".", &patterns(), ObjectKind::Script)?;
    let summary = Uploader::new(&repo, &jss).upload_all(jobs)?;

    assert_eq!(
        summary,
        Summary {
            succeeded: 1,
            failed: 2,
            skipped: 0,
        }
    );
    assert_eq!(summary.to_string(), "1 succeeded, 2 failed, 0 skipped");
    assert_eq!(jss.writes(), 1);

    Ok(())
}

#[sealed_test]
fn batch_skips_uncommitted_file_without_object() -> Result<()> {
    let fixture = RepoFixture::new(".")?;
    fixture.stage_and_commit("a.sh", "echo a\n", "Add a")?;
    std::fs::write("wip.sh", "echo work in progress\n")?;

    let jss = FakeJss::with_objects([(ObjectKind::Script, "a.sh")]);
    let repo = GitRepo::open(".", RefTarget::Head)?;
    let jobs = batch_jobs(".", &patterns(), ObjectKind::Script)?;
    let summary = Uploader::new(&repo, &jss).upload_all(jobs)?;

    assert_eq!(
        summary,
        Summary {
            succeeded: 1,
            failed: 0,
            skipped: 1,
        }
    );
    assert!(summary.is_success());
    assert_eq!(jss.writes(), 1);

    Ok(())
}

#[sealed_test]
fn file_deleted_from_working_tree_is_read_from_tag() -> Result<()> {
    let fixture = RepoFixture::new("repo")?;
    fixture.stage_and_commit("old.sh", "echo @@VERSION\n", "Add old")?;
    fixture.tag("v1")?;
    std::fs::remove_file("repo/old.sh")?;

    let jss = FakeJss::with_objects([(ObjectKind::Script, "old.sh")]);
    let repo = GitRepo::open("repo", RefTarget::Tag("v1".into()))?;
    let job = UploadJob::single(Path::new("repo").join("old.sh"), ObjectKind::Script, None, false);
    let outcome = Uploader::new(&repo, &jss).upload(&job)?;
    assert_eq!(outcome, Outcome::Updated(ObjectId(1)));

    let record = jss.record(ObjectKind::Script, "old.sh").expect("object exists");
    assert_eq!(record.body, "echo v1\n");

    Ok(())
}

#[sealed_test]
fn rejected_credentials_abort_batch() -> Result<()> {
    let fixture = RepoFixture::new(".")?;
    fixture.stage_and_commit("a.sh", "echo a\n", "Add a")?;
    fixture.stage_and_commit("b.sh", "echo b\n", "Add b")?;

    let jss = FakeJss::with_objects([(ObjectKind::Script, "a.sh"), (ObjectKind::Script, "b.sh")])
        .rejecting_auth();
    let repo = GitRepo::open(".", RefTarget::Head)?;
    let jobs = batch_jobs(".", &patterns(), ObjectKind::Script)?;
    let result = Uploader::new(&repo, &jss).upload_all(jobs);

    let error = result.expect_err("credentials are rejected");
    assert!(matches!(error, UploadError::Auth(_)));
    assert!(error.is_fatal());
    assert_eq!(jss.writes(), 0);

    Ok(())
}

#[sealed_test]
fn templating_is_stable_across_runs() -> Result<()> {
    let fixture = RepoFixture::new(".")?;
    fixture.stage_and_commit("a.sh", "@@VERSION @@DATE\n@@LOG", "Add a")?;
    fixture.tag("v1.0.0")?;

    let jss = FakeJss::with_objects([(ObjectKind::Script, "a.sh")]);
    let repo = GitRepo::open(".", RefTarget::Tag("v1.0.0".into()))?;
    let job = UploadJob::single("a.sh", ObjectKind::Script, None, false);
    let uploader = Uploader::new(&repo, &jss);
    assert_eq!(uploader.prepare(&job)?, uploader.prepare(&job)?);

    Ok(())
}
