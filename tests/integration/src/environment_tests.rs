//! Environment sharing and isolation across a whole run
//!
//! Exercises the environment resolver through the runner rather than in
//! isolation: instances resolved from a real manifest must share or
//! split materialized environments purely by their effective
//! (language, version, dependency set), and concurrent hooks racing on
//! one cache key must trigger exactly one materialization.

use async_trait::async_trait;
use hook_engine::{RunConfig, Runner, SnapshotMode};
use hook_fs::CacheLayout;
use hook_model::{Language, Manifest, Stage};
use hook_store::{EnvBackend, EnvResolver, EnvSpec};
use hook_test_utils::TestRepo;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::watch;

/// Backend that counts materializations and records the keys it built.
struct CountingBackend {
    materializations: Arc<AtomicUsize>,
}

#[async_trait]
impl EnvBackend for CountingBackend {
    fn language(&self) -> Language {
        Language::Python
    }

    async fn materialize(
        &self,
        _spec: &EnvSpec,
        _source: Option<&Path>,
        dest: &Path,
    ) -> hook_store::Result<()> {
        // Overlap with the other workers before finishing
        tokio::task::yield_now().await;
        std::fs::create_dir_all(dest).unwrap();
        self.materializations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn bin_dirs(&self, _dest: &Path) -> Vec<PathBuf> {
        Vec::new()
    }
}

fn counting_runner(repo: &TestRepo, cache: &Path) -> (Runner, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let backend = CountingBackend {
        materializations: Arc::clone(&count),
    };
    let resolver = EnvResolver::with_backends(CacheLayout::at(cache), vec![Arc::new(backend)]);
    let runner = Runner::with_env_resolver(repo.path(), CacheLayout::at(cache), resolver);
    (runner, count)
}

async fn run(runner: &Runner, manifest_yaml: &str) -> hook_engine::RunReport {
    let manifest = Manifest::parse(manifest_yaml, Path::new(".hooks.yaml")).unwrap();
    let config = RunConfig {
        stage: Stage::Commit,
        mode: SnapshotMode::AllTracked,
        max_workers: Some(8),
        skip: Default::default(),
    };
    let (_cancel_tx, cancel_rx) = watch::channel(false);
    runner.run(&manifest, &config, cancel_rx).await.unwrap()
}

#[tokio::test]
async fn hooks_with_identical_dependency_sets_share_one_environment() {
    let repo = TestRepo::new();
    repo.write_script("ok.sh", "#!/bin/sh\nexit 0\n");
    repo.commit_all("setup");

    let cache = tempfile::tempdir().unwrap();
    let (runner, count) = counting_runner(&repo, cache.path());

    // Four concurrent hooks, all with the same effective dependency
    // set: one materialization, the rest join it or hit the cache.
    let report = run(
        &runner,
        r#"
repos:
  - repo: local
    hooks:
      - id: a
        entry: ./ok.sh
        language: python
        pass_filenames: false
        additional_dependencies: [flake8]
      - id: b
        entry: ./ok.sh
        language: python
        pass_filenames: false
        additional_dependencies: [flake8]
      - id: c
        entry: ./ok.sh
        language: python
        pass_filenames: false
        additional_dependencies: [flake8]
      - id: d
        entry: ./ok.sh
        language: python
        pass_filenames: false
        additional_dependencies: [flake8]
"#,
    )
    .await;

    assert!(report.all_clean());
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn an_extra_dependency_isolates_the_environment() {
    let repo = TestRepo::new();
    repo.write_script("ok.sh", "#!/bin/sh\nexit 0\n");
    repo.commit_all("setup");

    let cache = tempfile::tempdir().unwrap();
    let (runner, count) = counting_runner(&repo, cache.path());

    // Same definition shape, but the second instance appends darglint:
    // distinct dependency sets, distinct environments.
    let report = run(
        &runner,
        r#"
repos:
  - repo: local
    hooks:
      - id: checker
        alias: checker-plain
        entry: ./ok.sh
        language: python
        pass_filenames: false
        additional_dependencies: [flake8]
      - id: checker
        alias: checker-docs
        entry: ./ok.sh
        language: python
        pass_filenames: false
        additional_dependencies: [flake8, darglint]
"#,
    )
    .await;

    assert!(report.all_clean());
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn environments_persist_across_invocations() {
    let repo = TestRepo::new();
    repo.write_script("ok.sh", "#!/bin/sh\nexit 0\n");
    repo.commit_all("setup");

    let manifest = r#"
repos:
  - repo: local
    hooks:
      - id: checker
        entry: ./ok.sh
        language: python
        pass_filenames: false
        additional_dependencies: [flake8]
"#;

    let cache = tempfile::tempdir().unwrap();
    let (first_runner, first_count) = counting_runner(&repo, cache.path());
    run(&first_runner, manifest).await;
    assert_eq!(first_count.load(Ordering::SeqCst), 1);

    // A fresh runner over the same cache root sees the persisted
    // environment and never rebuilds it.
    let (second_runner, second_count) = counting_runner(&repo, cache.path());
    run(&second_runner, manifest).await;
    assert_eq!(second_count.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn environment_failure_is_scoped_to_the_instances_sharing_its_key() {
    struct FailingBackend;

    #[async_trait]
    impl EnvBackend for FailingBackend {
        fn language(&self) -> Language {
            Language::Python
        }

        async fn materialize(
            &self,
            spec: &EnvSpec,
            _source: Option<&Path>,
            _dest: &Path,
        ) -> hook_store::Result<()> {
            Err(hook_store::Error::environment(
                spec.cache_key(),
                "install failed",
            ))
        }

        fn bin_dirs(&self, _dest: &Path) -> Vec<PathBuf> {
            Vec::new()
        }
    }

    let repo = TestRepo::new();
    repo.write_script("ok.sh", "#!/bin/sh\nexit 0\n");
    repo.commit_all("setup");

    let cache = tempfile::tempdir().unwrap();
    let resolver =
        EnvResolver::with_backends(CacheLayout::at(cache.path()), vec![Arc::new(FailingBackend)]);
    let runner = Runner::with_env_resolver(repo.path(), CacheLayout::at(cache.path()), resolver);

    let report = run(
        &runner,
        r#"
repos:
  - repo: local
    hooks:
      - id: broken-env
        entry: ./ok.sh
        language: python
        pass_filenames: false
        additional_dependencies: [flake8]
      - id: unaffected
        entry: ./ok.sh
        language: system
        pass_filenames: false
"#,
    )
    .await;

    assert!(matches!(
        report.outcomes[0].status,
        hook_engine::HookStatus::Error { .. }
    ));
    assert_eq!(report.outcomes[1].status, hook_engine::HookStatus::Passed);
    assert_eq!(report.exit_code(), 2);
}
