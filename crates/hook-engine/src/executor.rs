//! Hook invocation
//!
//! Runs one hook instance's program against its selected files inside
//! its resolved environment, captures output and exit status, and
//! detects side-effect file modifications by fingerprinting the
//! selected set before and after.

use crate::outcome::{ErrorKind, HookStatus, Outcome};
use hook_model::{HookInstance, Language};
use hook_store::EnvHandle;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::watch;

/// Upper bound on the bytes of file arguments per invocation. A
/// filtered set that does not fit is split into several batches, each
/// invoked separately; every file lands in exactly one batch.
const ARG_BYTE_BUDGET: usize = 8 * 1024;

/// Everything needed to invoke one hook.
pub struct ExecRequest<'a> {
    pub instance: &'a HookInstance,
    pub files: &'a [PathBuf],
    pub env: &'a EnvHandle,
    /// Root of the repository being checked; the child's working dir
    pub repo_root: &'a Path,
    /// Source checkout, for resolving `script` entries
    pub checkout: Option<&'a Path>,
}

/// Run one hook instance to an [`Outcome`].
///
/// With `pass_filenames` unset the program is invoked exactly once and
/// discovers its own file set; otherwise it is invoked once per batch.
/// A non-zero exit is a routine hook failure; a program that cannot be
/// spawned is an environment failure, since rerunning it on the same
/// environment cannot help.
pub async fn run(request: ExecRequest<'_>, mut cancel: watch::Receiver<bool>) -> Outcome {
    let instance = request.instance;
    let started = Instant::now();

    let before = hook_fs::fingerprint_files(request.repo_root, request.files);

    let batches: Vec<&[PathBuf]> = if instance.pass_filenames {
        batch_files(request.files, ARG_BYTE_BUDGET)
    } else {
        vec![&[]]
    };

    let mut stdout = String::new();
    let mut stderr = String::new();
    let mut first_failure: Option<i32> = None;

    for batch in batches {
        if *cancel.borrow() {
            return finish(
                &request,
                HookStatus::Incomplete,
                stdout,
                stderr,
                before,
                started,
            );
        }
        match invoke(&request, batch, &mut cancel).await {
            Invocation::Completed { status, out, err } => {
                stdout.push_str(&out);
                stderr.push_str(&err);
                // A failing batch must not suppress the remaining
                // batches' reporting, so keep going.
                if status != 0 {
                    first_failure.get_or_insert(status);
                }
            }
            Invocation::SpawnFailed(message) => {
                return finish(
                    &request,
                    HookStatus::Error {
                        kind: ErrorKind::Environment,
                        message,
                    },
                    stdout,
                    stderr,
                    before,
                    started,
                );
            }
            Invocation::Cancelled { out, err } => {
                stdout.push_str(&out);
                stderr.push_str(&err);
                return finish(&request, HookStatus::Incomplete, stdout, stderr, before, started);
            }
        }
    }

    let status = match first_failure {
        Some(code) => HookStatus::Failed { exit_code: code },
        None => HookStatus::Passed,
    };
    finish(&request, status, stdout, stderr, before, started)
}

fn finish(
    request: &ExecRequest<'_>,
    status: HookStatus,
    stdout: String,
    stderr: String,
    before: String,
    started: Instant,
) -> Outcome {
    let after = hook_fs::fingerprint_files(request.repo_root, request.files);
    Outcome {
        key: request.instance.key.clone(),
        name: request.instance.name.clone(),
        status,
        files_modified: before != after,
        stdout,
        stderr,
        duration_ms: started.elapsed().as_millis() as u64,
    }
}

enum Invocation {
    Completed { status: i32, out: String, err: String },
    SpawnFailed(String),
    Cancelled { out: String, err: String },
}

async fn invoke(
    request: &ExecRequest<'_>,
    batch: &[PathBuf],
    cancel: &mut watch::Receiver<bool>,
) -> Invocation {
    let instance = request.instance;
    let mut words = instance.entry.split_whitespace();
    let Some(program) = words.next() else {
        return Invocation::SpawnFailed(format!("hook {} has an empty entry", instance.key));
    };
    let program = resolve_program(request, program);
    let entry_args: Vec<&str> = words.collect();

    let mut cmd = Command::new(&program);
    cmd.args(&entry_args)
        .args(&instance.args)
        .args(batch)
        .current_dir(request.repo_root)
        .env("PATH", prepend_path(&request.env.bin_dirs))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (name, value) in &request.env.env_vars {
        cmd.env(name, value);
    }

    tracing::debug!(hook = %instance.key, program = %program.display(), files = batch.len(), "invoking");
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            return Invocation::SpawnFailed(format!("{}: {e}", program.display()));
        }
    };

    let mut out_pipe = child.stdout.take();
    let mut err_pipe = child.stderr.take();

    let out_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(pipe) = out_pipe.as_mut() {
            let _ = pipe.read_to_end(&mut buf).await;
        }
        buf
    });
    let err_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(pipe) = err_pipe.as_mut() {
            let _ = pipe.read_to_end(&mut buf).await;
        }
        buf
    });

    tokio::select! {
        status = child.wait() => {
            let out = String::from_utf8_lossy(&out_task.await.unwrap_or_default()).into_owned();
            let err = String::from_utf8_lossy(&err_task.await.unwrap_or_default()).into_owned();
            match status {
                Ok(status) => Invocation::Completed {
                    status: status.code().unwrap_or(-1),
                    out,
                    err,
                },
                Err(e) => Invocation::SpawnFailed(e.to_string()),
            }
        }
        _ = cancellation(cancel) => {
            let _ = child.kill().await;
            let out = String::from_utf8_lossy(&out_task.await.unwrap_or_default()).into_owned();
            let err = String::from_utf8_lossy(&err_task.await.unwrap_or_default()).into_owned();
            Invocation::Cancelled { out, err }
        }
    }
}

/// Resolves when a cancellation is requested; pends forever if the
/// sender goes away without one, so an orphaned channel never kills a
/// healthy child.
async fn cancellation(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Resolve the entry's program name.
///
/// `script` hooks name a file inside their source checkout; everything
/// else resolves through PATH (with the environment's bin dirs
/// prepended).
fn resolve_program(request: &ExecRequest<'_>, program: &str) -> PathBuf {
    if request.instance.language == Language::Script {
        let base = request.checkout.unwrap_or(request.repo_root);
        return base.join(program);
    }
    PathBuf::from(program)
}

/// Prepend the environment's bin dirs to the inherited PATH.
fn prepend_path(bin_dirs: &[PathBuf]) -> std::ffi::OsString {
    let inherited = std::env::var_os("PATH").unwrap_or_default();
    let dirs = bin_dirs
        .iter()
        .cloned()
        .chain(std::env::split_paths(&inherited));
    std::env::join_paths(dirs).unwrap_or(inherited)
}

/// Split `files` into argv batches under `budget` bytes each.
///
/// Every file appears in exactly one batch; a single oversized path
/// still gets its own batch rather than being dropped.
pub fn batch_files(files: &[PathBuf], budget: usize) -> Vec<&[PathBuf]> {
    if files.is_empty() {
        return Vec::new();
    }
    let mut batches = Vec::new();
    let mut start = 0;
    let mut bytes = 0;
    for (index, file) in files.iter().enumerate() {
        let cost = file.as_os_str().len() + 1;
        if index > start && bytes + cost > budget {
            batches.push(&files[start..index]);
            start = index;
            bytes = 0;
        }
        bytes += cost;
    }
    batches.push(&files[start..]);
    batches
}
