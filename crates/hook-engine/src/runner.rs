//! Run orchestration
//!
//! Builds the manifest model into hook instances, snapshots the tree,
//! then executes the stage-gated instances on a bounded worker pool.
//! Instances are independent in data; the environment store is the only
//! shared mutable state and serializes itself per cache key. The final
//! report is ordered by declaration index regardless of which worker
//! finished first.

use crate::executor::{self, ExecRequest};
use crate::outcome::{ErrorKind, HookStatus, Outcome, SkipReason};
use crate::report::RunReport;
use crate::selector;
use crate::snapshot::{FileRecord, SnapshotMode, snapshot};
use crate::Result;
use hook_fs::CacheLayout;
use hook_model::{
    DefinitionRegistry, HookInstance, InstanceKey, Manifest, RepoBlock, Stage, local_definition,
    resolve_instance,
};
use hook_store::{EnvResolver, EnvSpec, SourceCache};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Semaphore, watch};

/// Environment variable naming hooks to skip, comma-separated.
pub const SKIP_ENV: &str = "HOOK_SKIP";

/// Per-run configuration.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// The one stage this run selects
    pub stage: Stage,
    /// How the universal file set is taken
    pub mode: SnapshotMode,
    /// Worker pool bound; defaults to available parallelism
    pub max_workers: Option<usize>,
    /// Hook ids/aliases to skip
    pub skip: HashSet<String>,
}

impl RunConfig {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            mode: SnapshotMode::default(),
            max_workers: None,
            skip: skip_from_env(),
        }
    }
}

/// Parse the skip list from [`SKIP_ENV`].
pub fn skip_from_env() -> HashSet<String> {
    std::env::var(SKIP_ENV)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// One declaration-ordered unit of work after resolution.
enum Work {
    Ready {
        instance: Box<HookInstance>,
        checkout: Option<PathBuf>,
    },
    /// Resolution already failed; carries the ready-made outcome status
    Unresolved {
        key: InstanceKey,
        name: String,
        status: HookStatus,
    },
}

/// One resolved (or unresolvable) instance, as shown by `hook list`
/// and checked by `hook validate`.
#[derive(Debug, serde::Serialize)]
pub struct InstanceSummary {
    pub key: InstanceKey,
    pub name: String,
    pub source: String,
    pub language: Option<hook_model::Language>,
    pub stages: Vec<Stage>,
    /// Resolution error, if the instance cannot run
    pub error: Option<String>,
}

/// Executes manifests against one repository.
pub struct Runner {
    repo_root: PathBuf,
    sources: Arc<SourceCache>,
    envs: Arc<EnvResolver>,
}

impl Runner {
    pub fn new(repo_root: impl Into<PathBuf>, layout: CacheLayout) -> Self {
        Self {
            repo_root: repo_root.into(),
            sources: Arc::new(SourceCache::new(layout.clone())),
            envs: Arc::new(EnvResolver::new(layout)),
        }
    }

    /// Runner with an injected environment resolver (tests).
    pub fn with_env_resolver(
        repo_root: impl Into<PathBuf>,
        layout: CacheLayout,
        envs: EnvResolver,
    ) -> Self {
        Self {
            repo_root: repo_root.into(),
            sources: Arc::new(SourceCache::new(layout)),
            envs: Arc::new(envs),
        }
    }

    /// Execute every instance the manifest declares for the selected
    /// stage and fold the outcomes into a report.
    ///
    /// Per-instance failures (fetch, environment, the hook itself) are
    /// recorded in their outcomes; only a snapshot that cannot be taken
    /// at all aborts the run.
    pub async fn run(
        &self,
        manifest: &Manifest,
        config: &RunConfig,
        cancel: watch::Receiver<bool>,
    ) -> Result<RunReport> {
        let universal = Arc::new(snapshot(&self.repo_root, &config.mode)?);
        tracing::info!(
            stage = %config.stage,
            files = universal.len(),
            "starting run"
        );

        let work = self.resolve_blocks(manifest).await;
        self.execute(work, universal, config, cancel).await
    }

    /// Resolve the manifest without executing anything, summarizing
    /// every instance in declaration order.
    pub async fn list(&self, manifest: &Manifest) -> Vec<InstanceSummary> {
        self.resolve_blocks(manifest)
            .await
            .into_iter()
            .map(|item| match item {
                Work::Ready { instance, .. } => InstanceSummary {
                    key: instance.key.clone(),
                    name: instance.name.clone(),
                    source: instance.source.to_string(),
                    language: Some(instance.language),
                    stages: instance.stages.clone(),
                    error: None,
                },
                Work::Unresolved { key, name, status } => {
                    let error = match status {
                        HookStatus::Error { kind, message } => {
                            Some(format!("{kind}: {message}"))
                        }
                        _ => None,
                    };
                    InstanceSummary {
                        key,
                        name,
                        source: String::new(),
                        language: None,
                        stages: Vec::new(),
                        error,
                    }
                }
            })
            .collect()
    }

    /// Resolve every override block into work items, declaration order
    /// preserved. Fetch and registry failures are scoped to their
    /// repository block; lookup failures to their single instance.
    async fn resolve_blocks(&self, manifest: &Manifest) -> Vec<Work> {
        let mut work = Vec::new();
        for (repo_index, block) in manifest.repos.iter().enumerate() {
            if block.is_local() {
                for overrides in &block.hooks {
                    work.push(self.resolve_local(repo_index, block, overrides));
                }
                continue;
            }

            let locator = block.repo.clone();
            let rev = block.rev.clone().unwrap_or_default();
            let sources = Arc::clone(&self.sources);
            let fetched = tokio::task::spawn_blocking(move || sources.fetch(&locator, &rev))
                .await
                .unwrap_or_else(|e| {
                    Err(hook_store::Error::source_fetch(
                        &block.repo,
                        block.rev.clone().unwrap_or_default(),
                        e.to_string(),
                    ))
                });

            match fetched {
                Ok(checkout) => match DefinitionRegistry::load(&checkout) {
                    Ok(registry) => {
                        for overrides in &block.hooks {
                            work.push(self.resolve_remote(
                                repo_index, block, overrides, &registry, &checkout,
                            ));
                        }
                    }
                    Err(e) => {
                        // No usable registry: fatal to the whole block
                        for overrides in &block.hooks {
                            work.push(unresolved(
                                repo_index,
                                overrides,
                                ErrorKind::Manifest,
                                e.to_string(),
                            ));
                        }
                    }
                },
                Err(e) => {
                    for overrides in &block.hooks {
                        work.push(unresolved(
                            repo_index,
                            overrides,
                            ErrorKind::SourceFetch,
                            e.to_string(),
                        ));
                    }
                }
            }
        }
        work
    }

    fn resolve_local(
        &self,
        repo_index: usize,
        block: &RepoBlock,
        overrides: &hook_model::HookOverride,
    ) -> Work {
        let definition = match local_definition(overrides) {
            Ok(definition) => Arc::new(definition),
            Err(e) => {
                return unresolved(repo_index, overrides, ErrorKind::Manifest, e.to_string());
            }
        };
        match resolve_instance(repo_index, block, overrides, definition) {
            Ok(instance) => Work::Ready {
                instance: Box::new(instance),
                checkout: None,
            },
            Err(e) => unresolved(repo_index, overrides, ErrorKind::Manifest, e.to_string()),
        }
    }

    fn resolve_remote(
        &self,
        repo_index: usize,
        block: &RepoBlock,
        overrides: &hook_model::HookOverride,
        registry: &DefinitionRegistry,
        checkout: &PathBuf,
    ) -> Work {
        let Some(definition) = registry.get(&overrides.id) else {
            let error = hook_model::Error::DefinitionNotFound {
                repo: block.repo.clone(),
                id: overrides.id.clone(),
            };
            return unresolved(
                repo_index,
                overrides,
                ErrorKind::DefinitionNotFound,
                error.to_string(),
            );
        };
        match resolve_instance(repo_index, block, overrides, Arc::new(definition.clone())) {
            Ok(instance) => Work::Ready {
                instance: Box::new(instance),
                checkout: Some(checkout.clone()),
            },
            Err(e) => unresolved(repo_index, overrides, ErrorKind::Manifest, e.to_string()),
        }
    }

    /// Run the work items, bounded by the worker pool, and emit the
    /// report in declaration order.
    async fn execute(
        &self,
        work: Vec<Work>,
        universal: Arc<Vec<FileRecord>>,
        config: &RunConfig,
        cancel: watch::Receiver<bool>,
    ) -> Result<RunReport> {
        let workers = config.max_workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        });
        let pool = Arc::new(Semaphore::new(workers.max(1)));

        let mut slots: Vec<Option<Outcome>> = Vec::with_capacity(work.len());
        slots.resize_with(work.len(), || None);
        let mut tasks = tokio::task::JoinSet::new();

        for (index, item) in work.into_iter().enumerate() {
            match item {
                Work::Unresolved { key, name, status } => {
                    slots[index] = Some(Outcome::unstarted(key, name, status));
                }
                Work::Ready { instance, checkout } => {
                    if config.skip.contains(&instance.key.id)
                        || instance
                            .key
                            .alias
                            .as_ref()
                            .is_some_and(|a| config.skip.contains(a))
                    {
                        slots[index] = Some(skipped(&instance, SkipReason::UserSkip));
                        continue;
                    }
                    if !instance.runs_in(config.stage) {
                        slots[index] = Some(skipped(&instance, SkipReason::StageMismatch));
                        continue;
                    }

                    let universal = Arc::clone(&universal);
                    let envs = Arc::clone(&self.envs);
                    let pool = Arc::clone(&pool);
                    let repo_root = self.repo_root.clone();
                    let cancel = cancel.clone();
                    tasks.spawn(async move {
                        let _permit = pool.acquire_owned().await;
                        let outcome =
                            run_instance(*instance, checkout, universal, envs, repo_root, cancel)
                                .await;
                        (index, outcome)
                    });
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Ok((index, outcome)) = joined {
                slots[index] = Some(outcome);
            }
        }

        let outcomes = slots.into_iter().flatten().collect();
        Ok(RunReport {
            stage: config.stage,
            cancelled: *cancel.borrow(),
            outcomes,
        })
    }
}

fn unresolved(
    repo_index: usize,
    overrides: &hook_model::HookOverride,
    kind: ErrorKind,
    message: String,
) -> Work {
    Work::Unresolved {
        key: InstanceKey {
            repo: repo_index,
            id: overrides.id.clone(),
            alias: overrides.alias.clone(),
        },
        name: overrides.name.clone().unwrap_or_else(|| overrides.id.clone()),
        status: HookStatus::Error {
            kind,
            message,
        },
    }
}

fn skipped(instance: &HookInstance, reason: SkipReason) -> Outcome {
    Outcome::unstarted(
        instance.key.clone(),
        instance.name.clone(),
        HookStatus::Skipped { reason },
    )
}

/// One worker's whole journey: select files, resolve the environment,
/// invoke the program.
async fn run_instance(
    instance: HookInstance,
    checkout: Option<PathBuf>,
    universal: Arc<Vec<FileRecord>>,
    envs: Arc<EnvResolver>,
    repo_root: PathBuf,
    cancel: watch::Receiver<bool>,
) -> Outcome {
    if *cancel.borrow() {
        return Outcome::unstarted(
            instance.key.clone(),
            instance.name.clone(),
            HookStatus::Incomplete,
        );
    }

    let files = match selector::select(&universal, &instance) {
        Ok(files) => files,
        Err(e) => {
            return Outcome::unstarted(
                instance.key.clone(),
                instance.name.clone(),
                HookStatus::Error {
                    kind: ErrorKind::Manifest,
                    message: e.to_string(),
                },
            );
        }
    };
    if files.is_empty() && instance.pass_filenames {
        return skipped(&instance, SkipReason::NoFiles);
    }

    let spec = EnvSpec::for_instance(&instance);
    let env = match envs.resolve(&spec, checkout.as_deref()).await {
        Ok(env) => env,
        Err(e) => {
            return Outcome::unstarted(
                instance.key.clone(),
                instance.name.clone(),
                HookStatus::Error {
                    kind: ErrorKind::Environment,
                    message: e.to_string(),
                },
            );
        }
    };

    executor::run(
        ExecRequest {
            instance: &instance,
            files: &files,
            env: &env,
            repo_root: &repo_root,
            checkout: checkout.as_deref(),
        },
        cancel,
    )
    .await
}
