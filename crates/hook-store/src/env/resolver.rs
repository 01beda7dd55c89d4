//! Lazy, single-flight environment resolution
//!
//! `resolve` is deterministic per cache key: a hit returns the persisted
//! environment untouched, a miss materializes it exactly once even under
//! concurrent requests for the same key. The per-key async mutex is the
//! one mandatory coordination point in the system; everything else a run
//! shares is read-only.

use crate::env::{EnvBackend, EnvSpec, NodeBackend, PythonBackend};
use crate::{Error, Result};
use hook_fs::CacheLayout;
use hook_model::Language;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Marker file written after materialization completes.
const READY_MARKER: &str = ".ready";

/// File recording the spec an environment was built from.
const SPEC_FILE: &str = "env.yaml";

/// Handle to a resolved environment, consumed by the hook executor.
#[derive(Debug, Clone, Default)]
pub struct EnvHandle {
    /// Cache key; `None` for runtimes that need no environment
    pub cache_key: Option<String>,
    /// Directories to prepend to PATH
    pub bin_dirs: Vec<PathBuf>,
    /// Extra environment variables
    pub env_vars: Vec<(String, String)>,
}

impl EnvHandle {
    /// The no-op handle for `system` and `script` hooks.
    pub fn passthrough() -> Self {
        Self::default()
    }
}

/// Resolves environment specs to materialized environments.
pub struct EnvResolver {
    layout: CacheLayout,
    backends: HashMap<Language, Arc<dyn EnvBackend>>,
    inflight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl EnvResolver {
    /// Resolver with the production backends registered.
    pub fn new(layout: CacheLayout) -> Self {
        Self::with_backends(
            layout,
            vec![Arc::new(PythonBackend), Arc::new(NodeBackend)],
        )
    }

    /// Resolver with injected backends (tests use counting fakes).
    pub fn with_backends(layout: CacheLayout, backends: Vec<Arc<dyn EnvBackend>>) -> Self {
        Self {
            layout,
            backends: backends.into_iter().map(|b| (b.language(), b)).collect(),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve `spec`, materializing it on first use.
    ///
    /// Concurrent calls for one cache key serialize on a per-key lock:
    /// one caller materializes, the rest block and then observe the
    /// completed environment as a cache hit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Environment`] tagged with the cache key; the
    /// caller attributes it to every instance sharing the key.
    pub async fn resolve(&self, spec: &EnvSpec, source: Option<&Path>) -> Result<EnvHandle> {
        if !spec.language.needs_environment() {
            return Ok(EnvHandle::passthrough());
        }
        let backend = self
            .backends
            .get(&spec.language)
            .ok_or_else(|| {
                Error::environment(spec.cache_key(), format!("no backend for {}", spec.language))
            })?
            .clone();

        let key = spec.cache_key();
        let dest = self.layout.envs_dir().join(&key);

        if dest.join(READY_MARKER).is_file() {
            tracing::debug!(key, "environment cache hit");
            return Ok(self.handle(&key, backend.as_ref(), &dest));
        }

        let lock = self.key_lock(&key);
        let _guard = lock.lock().await;

        // Built while this caller waited on the lock
        if dest.join(READY_MARKER).is_file() {
            return Ok(self.handle(&key, backend.as_ref(), &dest));
        }

        // A directory without the marker is torn; rebuild it.
        if dest.exists() {
            std::fs::remove_dir_all(&dest)
                .map_err(|e| hook_fs::Error::io(&dest, e))?;
        }
        self.layout.ensure()?;

        tracing::info!(key, language = %spec.language, "materializing environment");
        backend.materialize(spec, source, &dest).await.map_err(|e| {
            let _ = std::fs::remove_dir_all(&dest);
            e
        })?;

        let spec_yaml = serde_yaml::to_string(spec)
            .map_err(|e| Error::environment(&key, e.to_string()))?;
        hook_fs::io::write_text(&dest.join(SPEC_FILE), &spec_yaml)?;
        hook_fs::io::write_text(&dest.join(READY_MARKER), "")?;

        Ok(self.handle(&key, backend.as_ref(), &dest))
    }

    fn handle(&self, key: &str, backend: &dyn EnvBackend, dest: &Path) -> EnvHandle {
        EnvHandle {
            cache_key: Some(key.to_string()),
            bin_dirs: backend.bin_dirs(dest),
            env_vars: backend.env_vars(dest),
        }
    }

    fn key_lock(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut inflight = self.inflight.lock().expect("inflight lock poisoned");
        inflight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend that records how many times it materialized.
    struct CountingBackend {
        language: Language,
        materializations: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EnvBackend for CountingBackend {
        fn language(&self) -> Language {
            self.language
        }

        async fn materialize(
            &self,
            _spec: &EnvSpec,
            _source: Option<&Path>,
            dest: &Path,
        ) -> Result<()> {
            // Yield so concurrent resolvers genuinely overlap
            tokio::task::yield_now().await;
            std::fs::create_dir_all(dest).unwrap();
            self.materializations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn bin_dirs(&self, dest: &Path) -> Vec<PathBuf> {
            vec![dest.join("bin")]
        }
    }

    fn counting_resolver(dir: &Path) -> (EnvResolver, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let backend = CountingBackend {
            language: Language::Python,
            materializations: Arc::clone(&count),
        };
        let resolver =
            EnvResolver::with_backends(CacheLayout::at(dir), vec![Arc::new(backend)]);
        (resolver, count)
    }

    fn python_spec(deps: &[&str]) -> EnvSpec {
        EnvSpec {
            language: Language::Python,
            version: None,
            dependencies: deps.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn cache_hit_skips_materialization() {
        let dir = tempfile::tempdir().unwrap();
        let (resolver, count) = counting_resolver(dir.path());
        let spec = python_spec(&["flake8"]);

        resolver.resolve(&spec, None).await.unwrap();
        resolver.resolve(&spec, None).await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_resolution_materializes_once() {
        let dir = tempfile::tempdir().unwrap();
        let (resolver, count) = counting_resolver(dir.path());
        let resolver = Arc::new(resolver);
        let spec = python_spec(&["flake8", "darglint"]);

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let resolver = Arc::clone(&resolver);
            let spec = spec.clone();
            tasks.spawn(async move { resolver.resolve(&spec, None).await });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap().unwrap();
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_keys_materialize_independently() {
        let dir = tempfile::tempdir().unwrap();
        let (resolver, count) = counting_resolver(dir.path());

        resolver.resolve(&python_spec(&["flake8"]), None).await.unwrap();
        resolver
            .resolve(&python_spec(&["flake8", "darglint"]), None)
            .await
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn passthrough_languages_never_touch_backends() {
        let dir = tempfile::tempdir().unwrap();
        let (resolver, count) = counting_resolver(dir.path());
        let spec = EnvSpec {
            language: Language::System,
            version: None,
            dependencies: Default::default(),
        };

        let handle = resolver.resolve(&spec, None).await.unwrap();
        assert!(handle.cache_key.is_none());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn handle_exposes_backend_layout() {
        let dir = tempfile::tempdir().unwrap();
        let (resolver, _) = counting_resolver(dir.path());
        let spec = python_spec(&[]);

        let handle = resolver.resolve(&spec, None).await.unwrap();
        let key = spec.cache_key();
        assert_eq!(handle.cache_key.as_deref(), Some(key.as_str()));
        assert_eq!(
            handle.bin_dirs,
            vec![dir.path().join("envs").join(&key).join("bin")]
        );
    }
}
