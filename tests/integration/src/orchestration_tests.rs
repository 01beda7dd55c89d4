//! End-to-end orchestration tests
//!
//! These drive the full path a real invocation takes: manifest parsing
//! (including merge-key templates), source fetching from pinned
//! upstream repositories, instance resolution, stage gating, execution
//! and aggregation into a single exit code.

use hook_engine::{HookStatus, RunConfig, Runner, SkipReason, SnapshotMode};
use hook_fs::CacheLayout;
use hook_model::{Manifest, Stage};
use hook_test_utils::{HookSourceRepo, TestRepo};
use pretty_assertions::assert_eq;
use std::path::Path;
use tokio::sync::watch;

async fn run_manifest(
    repo: &TestRepo,
    cache: &Path,
    manifest_yaml: &str,
    stage: Stage,
) -> hook_engine::RunReport {
    let manifest = Manifest::parse(manifest_yaml, Path::new(".hooks.yaml")).unwrap();
    let runner = Runner::new(repo.path(), CacheLayout::at(cache));
    let config = RunConfig {
        stage,
        mode: SnapshotMode::AllTracked,
        max_workers: Some(4),
        skip: Default::default(),
    };
    let (_cancel_tx, cancel_rx) = watch::channel(false);
    runner.run(&manifest, &config, cancel_rx).await.unwrap()
}

/// Upstream with a single script hook that exits with `code`.
fn upstream_exiting(code: i32) -> HookSourceRepo {
    let upstream = HookSourceRepo::new();
    upstream.write_registry(concat!(
        "- id: check\n",
        "  entry: ./check.sh\n",
        "  language: script\n",
        "  pass_filenames: false\n",
    ));
    upstream.write_script("check.sh", &format!("#!/bin/sh\nexit {code}\n"));
    upstream
}

#[tokio::test]
async fn manual_hook_in_first_block_skips_and_second_block_decides_exit() {
    let first = upstream_exiting(0);
    let first_rev = first.commit_tagged("v1.0.0");
    let second = upstream_exiting(1);
    let second_rev = second.commit_tagged("v1.0.0");

    let repo = TestRepo::new();
    repo.commit_files(&[("README.md", "# demo\n")]);

    let manifest = format!(
        r#"
repos:
  - repo: {first_locator}
    rev: {first_rev}
    hooks:
      - id: check
        alias: manual-check
        stages: [manual]
  - repo: {second_locator}
    rev: {second_rev}
    hooks:
      - id: check
        alias: default-check
"#,
        first_locator = first.locator(),
        second_locator = second.locator(),
    );

    let cache = tempfile::tempdir().unwrap();
    let report = run_manifest(&repo, cache.path(), &manifest, Stage::Commit).await;

    assert_eq!(
        report.outcomes[0].status,
        HookStatus::Skipped {
            reason: SkipReason::StageMismatch
        }
    );
    assert_eq!(report.outcomes[1].status, HookStatus::Failed { exit_code: 1 });
    // The skipped hook contributes nothing; the second block's failure
    // alone decides the exit code.
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn override_exclude_fully_replaces_the_definition_default() {
    let upstream = HookSourceRepo::new();
    upstream.write_registry(concat!(
        "- id: record\n",
        "  entry: ./record.sh\n",
        "  language: script\n",
        "  exclude: ^generated/\n",
    ));
    upstream.write_script("record.sh", "#!/bin/sh\nprintf '%s\\n' \"$@\" > seen.log\n");
    let rev = upstream.commit_tagged("v2.0.0");

    let repo = TestRepo::new();
    repo.commit_files(&[
        ("generated/schema.txt", "machine written\n"),
        ("src/lib.txt", "hand written\n"),
        ("third_party/dep.txt", "vendored\n"),
    ]);

    let manifest = format!(
        r#"
repos:
  - repo: {locator}
    rev: {rev}
    hooks:
      - id: record
        exclude: ^third_party/
"#,
        locator = upstream.locator(),
    );

    let cache = tempfile::tempdir().unwrap();
    let report = run_manifest(&repo, cache.path(), &manifest, Stage::Commit).await;
    assert_eq!(report.outcomes[0].status, HookStatus::Passed);

    let seen = std::fs::read_to_string(repo.path().join("seen.log")).unwrap();
    let mut lines: Vec<_> = seen.lines().collect();
    lines.sort();
    // The definition's ^generated/ exclude must not apply once overridden
    assert_eq!(lines, vec!["generated/schema.txt", "src/lib.txt"]);
}

#[tokio::test]
async fn passing_modifier_is_distinct_from_failing_checker() {
    let repo = TestRepo::new();
    repo.write_file("notes.txt", "raw\n");
    repo.write_file("stable.txt", "left alone\n");
    repo.write_script("rewrite.sh", "#!/bin/sh\necho cooked > notes.txt\nexit 0\n");
    repo.write_script("complain.sh", "#!/bin/sh\necho wrong >&2\nexit 1\n");
    repo.commit_all("setup");

    let cache = tempfile::tempdir().unwrap();
    let report = run_manifest(
        &repo,
        cache.path(),
        r#"
repos:
  - repo: local
    hooks:
      - id: rewriter
        entry: ./rewrite.sh
        language: system
        files: notes\.txt$
      - id: complainer
        entry: ./complain.sh
        language: system
        files: stable\.txt$
"#,
        Stage::Commit,
    )
    .await;

    // Exit zero plus a changed fingerprint: passed but modified
    let rewriter = &report.outcomes[0];
    assert_eq!(rewriter.status, HookStatus::Passed);
    assert!(rewriter.files_modified);

    // Exit one without touching anything: a plain failure
    let complainer = &report.outcomes[1];
    assert_eq!(complainer.status, HookStatus::Failed { exit_code: 1 });
    assert!(!complainer.files_modified);

    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn merge_key_template_yields_two_independent_instances() {
    let upstream = HookSourceRepo::new();
    upstream.write_registry(concat!(
        "- id: lint\n",
        "  entry: ./lint.sh\n",
        "  language: script\n",
        "  pass_filenames: false\n",
    ));
    upstream.write_script("lint.sh", "#!/bin/sh\necho \"$1\" >> selections.log\n");
    let rev = upstream.commit_tagged("v1.0.0");

    let repo = TestRepo::new();
    repo.commit_files(&[("README.md", "# demo\n")]);

    // The first block is the template; the second reuses it through a
    // merge key and replaces only the alias and arguments.
    let manifest = format!(
        r#"
repos:
  - repo: {locator}
    rev: {rev}
    hooks:
      - &lint-template
        id: lint
        alias: lint-style
        args: ["--style"]
      - <<: *lint-template
        alias: lint-docs
        args: ["--docs"]
"#,
        locator = upstream.locator(),
    );

    let cache = tempfile::tempdir().unwrap();
    let report = run_manifest(&repo, cache.path(), &manifest, Stage::Commit).await;

    let keys: Vec<_> = report.outcomes.iter().map(|o| o.key.to_string()).collect();
    assert_eq!(keys, vec!["lint-style", "lint-docs"]);
    assert!(report.all_clean());

    let selections = std::fs::read_to_string(repo.path().join("selections.log")).unwrap();
    let mut lines: Vec<_> = selections.lines().collect();
    lines.sort();
    assert_eq!(lines, vec!["--docs", "--style"]);
}

#[tokio::test]
async fn cancellation_kills_in_flight_hooks_but_keeps_finished_outcomes() {
    let repo = TestRepo::new();
    repo.write_script("fast.sh", "#!/bin/sh\nexit 0\n");
    repo.write_script("slow.sh", "#!/bin/sh\nsleep 30\n");
    repo.commit_all("setup");

    let manifest = Manifest::parse(
        r#"
repos:
  - repo: local
    hooks:
      - id: fast
        entry: ./fast.sh
        language: system
        pass_filenames: false
      - id: slow
        entry: ./slow.sh
        language: system
        pass_filenames: false
"#,
        Path::new(".hooks.yaml"),
    )
    .unwrap();

    let cache = tempfile::tempdir().unwrap();
    let runner = Runner::new(repo.path(), CacheLayout::at(cache.path()));
    let config = RunConfig {
        stage: Stage::Commit,
        mode: SnapshotMode::AllTracked,
        max_workers: Some(4),
        skip: Default::default(),
    };

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        let _ = cancel_tx.send(true);
    });

    let started = std::time::Instant::now();
    let report = runner.run(&manifest, &config, cancel_rx).await.unwrap();

    // The abort must actually terminate the 30s child, not wait it out
    assert!(started.elapsed() < std::time::Duration::from_secs(20));
    assert!(report.cancelled);
    assert_eq!(report.outcomes[0].status, HookStatus::Passed);
    assert_eq!(report.outcomes[1].status, HookStatus::Incomplete);
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn mixed_remote_and_local_blocks_report_in_declaration_order() {
    let upstream = upstream_exiting(0);
    let rev = upstream.commit_tagged("v1.0.0");

    let repo = TestRepo::new();
    repo.write_script("local.sh", "#!/bin/sh\nexit 0\n");
    repo.commit_files(&[("app.py", "print('hi')\n"), ("logo.png", "\u{0}binary")]);

    let manifest = format!(
        r#"
repos:
  - repo: {locator}
    rev: {rev}
    hooks:
      - id: check
  - repo: local
    hooks:
      - id: python-only
        entry: ./local.sh
        language: system
        types: [python]
      - id: binary-only
        entry: ./local.sh
        language: system
        types: [rust]
"#,
        locator = upstream.locator(),
    );

    let cache = tempfile::tempdir().unwrap();
    let report = run_manifest(&repo, cache.path(), &manifest, Stage::Commit).await;

    let ids: Vec<_> = report.outcomes.iter().map(|o| o.key.id.as_str()).collect();
    assert_eq!(ids, vec!["check", "python-only", "binary-only"]);
    assert_eq!(report.outcomes[0].status, HookStatus::Passed);
    assert_eq!(report.outcomes[1].status, HookStatus::Passed);
    assert_eq!(
        report.outcomes[2].status,
        HookStatus::Skipped {
            reason: SkipReason::NoFiles
        }
    );
    assert_eq!(report.exit_code(), 0);
}
