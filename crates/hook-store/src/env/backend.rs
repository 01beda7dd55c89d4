//! Environment materialization backends
//!
//! One backend per runtime language, behind an async trait so the
//! resolver can be exercised with injected fakes. Backends install the
//! runtime and the spec's dependency set into a destination directory;
//! they never touch the cache bookkeeping (markers, locks), which is
//! the resolver's job.

use crate::env::EnvSpec;
use crate::{Error, Result};
use async_trait::async_trait;
use hook_model::Language;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Materializes environments for one runtime language.
#[async_trait]
pub trait EnvBackend: Send + Sync {
    fn language(&self) -> Language;

    /// Install the runtime and dependencies into `dest`.
    ///
    /// `source` is the hook source checkout, installed alongside the
    /// dependencies when the runtime packages it (a Python hook repo
    /// with a `pyproject.toml`, a Node repo with a `package.json`).
    async fn materialize(&self, spec: &EnvSpec, source: Option<&Path>, dest: &Path) -> Result<()>;

    /// Directories prepended to PATH when executing inside `dest`.
    fn bin_dirs(&self, dest: &Path) -> Vec<PathBuf>;

    /// Extra environment variables for processes running inside `dest`.
    fn env_vars(&self, dest: &Path) -> Vec<(String, String)> {
        let _ = dest;
        Vec::new()
    }
}

/// Run a materialization step, mapping spawn failure and non-zero exit
/// into an environment failure for `cache_key`.
async fn run_step(cmd: &mut Command, cache_key: &str, what: &str) -> Result<()> {
    let output = cmd
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| Error::environment(cache_key, format!("{what}: {e}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::environment(
            cache_key,
            format!("{what}: {}", stderr.trim()),
        ));
    }
    Ok(())
}

/// Probe whether a program responds to `--version`.
async fn probe(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Python environments: a virtualenv per spec, dependencies installed
/// with pip. Prefers uv when available, falls back to the built-in
/// venv module.
pub struct PythonBackend;

impl PythonBackend {
    fn python_path(dest: &Path) -> PathBuf {
        if cfg!(windows) {
            dest.join("Scripts").join("python.exe")
        } else {
            dest.join("bin").join("python")
        }
    }
}

#[async_trait]
impl EnvBackend for PythonBackend {
    fn language(&self) -> Language {
        Language::Python
    }

    async fn materialize(&self, spec: &EnvSpec, source: Option<&Path>, dest: &Path) -> Result<()> {
        let key = spec.cache_key();

        if probe("uv").await {
            let mut cmd = Command::new("uv");
            cmd.arg("venv");
            if let Some(version) = &spec.version {
                cmd.args(["--python", version]);
            }
            cmd.arg(dest);
            run_step(&mut cmd, &key, "uv venv").await?;
        } else {
            let program = spec.version.as_deref().map_or_else(
                || "python3".to_string(),
                |v| format!("python{v}"),
            );
            if !probe(&program).await {
                return Err(Error::environment(
                    &key,
                    format!("runtime {program} not found on PATH"),
                ));
            }
            let mut cmd = Command::new(&program);
            cmd.args(["-m", "venv"]).arg(dest);
            run_step(&mut cmd, &key, "python -m venv").await?;
        }

        let python = Self::python_path(dest);
        let mut installs: Vec<String> = Vec::new();
        if let Some(source) = source
            && source.join("pyproject.toml").is_file()
        {
            installs.push(source.display().to_string());
        }
        installs.extend(spec.dependencies.iter().cloned());

        if !installs.is_empty() {
            let mut cmd = Command::new(&python);
            cmd.args(["-m", "pip", "install", "--quiet"]).args(&installs);
            run_step(&mut cmd, &key, "pip install").await?;
        }
        Ok(())
    }

    fn bin_dirs(&self, dest: &Path) -> Vec<PathBuf> {
        if cfg!(windows) {
            vec![dest.join("Scripts")]
        } else {
            vec![dest.join("bin")]
        }
    }

    fn env_vars(&self, dest: &Path) -> Vec<(String, String)> {
        vec![("VIRTUAL_ENV".to_string(), dest.display().to_string())]
    }
}

/// Node environments: dependencies installed into a prefix with npm,
/// executables exposed through `node_modules/.bin`.
pub struct NodeBackend;

#[async_trait]
impl EnvBackend for NodeBackend {
    fn language(&self) -> Language {
        Language::Node
    }

    async fn materialize(&self, spec: &EnvSpec, source: Option<&Path>, dest: &Path) -> Result<()> {
        let key = spec.cache_key();
        if !probe("npm").await {
            return Err(Error::environment(&key, "npm not found on PATH"));
        }
        std::fs::create_dir_all(dest).map_err(|e| hook_fs::Error::io(dest, e))?;

        let mut installs: Vec<String> = Vec::new();
        if let Some(source) = source
            && source.join("package.json").is_file()
        {
            installs.push(source.display().to_string());
        }
        installs.extend(spec.dependencies.iter().cloned());

        if !installs.is_empty() {
            let mut cmd = Command::new("npm");
            cmd.args(["install", "--no-save", "--prefix"])
                .arg(dest)
                .args(&installs);
            run_step(&mut cmd, &key, "npm install").await?;
        }
        Ok(())
    }

    fn bin_dirs(&self, dest: &Path) -> Vec<PathBuf> {
        vec![dest.join("node_modules").join(".bin")]
    }
}
