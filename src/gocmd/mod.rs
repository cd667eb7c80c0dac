//! Subprocess layer for the Go toolchain and the external analyzers
//!
//! All external commands run through [`GoTool`], which provides:
//! - a fixed working directory (the consuming module root)
//! - an isolated environment (only an explicit allow-list is forwarded,
//!   so ambient variables never leak into analysis subprocesses)
//! - cancellation-aware execution (an in-flight child is killed and
//!   awaited before the error is reported, leaving no orphans)

use crate::core::error::{InspectError, InspectResult, ResolutionError, ResultExt};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Environment variables forwarded to every subprocess.
///
/// The Go toolchain and the analyzers need the user's caches and PATH;
/// everything else is withheld.
const ENV_ALLOWLIST: &[&str] = &["HOME", "PATH", "GOPATH", "GOCACHE", "GOMODCACHE"];

/// External cancellation signal shared across the pipeline
#[derive(Clone, Default)]
pub struct CancelToken {
  inner: Arc<AtomicBool>,
}

impl CancelToken {
  /// Create a token that has not been triggered
  pub fn new() -> Self {
    Self::default()
  }

  /// Trigger cancellation; every stage observes it at its next checkpoint
  pub fn cancel(&self) {
    self.inner.store(true, Ordering::SeqCst);
  }

  /// Whether cancellation has been requested
  pub fn is_cancelled(&self) -> bool {
    self.inner.load(Ordering::SeqCst)
  }

  /// Error out if cancellation has been requested
  pub fn check(&self) -> InspectResult<()> {
    if self.is_cancelled() {
      return Err(InspectError::Cancelled);
    }
    Ok(())
  }
}

/// Captured result of a finished subprocess
#[derive(Debug)]
pub struct ToolOutput {
  pub stdout: Vec<u8>,
  pub stderr: String,
  pub code: Option<i32>,
}

impl ToolOutput {
  /// Whether the process exited with the given code
  pub fn exited_with(&self, code: i32) -> bool {
    self.code == Some(code)
  }
}

/// Command runner rooted at the consuming module directory
#[derive(Clone)]
pub struct GoTool {
  module_root: PathBuf,
  cancel: CancelToken,
}

impl GoTool {
  /// Create a runner for the module at `module_root`
  pub fn new(module_root: &Path, cancel: CancelToken) -> Self {
    Self {
      module_root: module_root.to_path_buf(),
      cancel,
    }
  }

  /// The consuming module root every command runs in
  pub fn module_root(&self) -> &Path {
    &self.module_root
  }

  /// The cancellation token shared with this runner
  pub fn cancel_token(&self) -> &CancelToken {
    &self.cancel
  }

  /// Resolve the module cache location via `go env GOMODCACHE`
  pub fn mod_cache(&self) -> InspectResult<PathBuf> {
    let out = self.run(&["go", "env", "GOMODCACHE"])?;
    let cache = String::from_utf8(out.stdout)?;
    let cache = cache.trim_end_matches('\n');
    if cache.is_empty() {
      return Err(InspectError::Resolution(ResolutionError::ModCacheUnset));
    }
    Ok(PathBuf::from(cache))
  }

  /// Run a Go toolchain command, treating any non-zero exit as failure
  pub fn run_go(&self, args: &[&str]) -> InspectResult<()> {
    let out = self.run(args)?;
    if !out.exited_with(0) {
      return Err(InspectError::Command {
        command: args.join(" "),
        stderr: out.stderr,
        code: out.code,
      });
    }
    Ok(())
  }

  /// Run a command and capture its output.
  ///
  /// Exit status is reported in the returned [`ToolOutput`]; only spawn
  /// failures and cancellation produce an error here, since some analyzers
  /// use a non-zero code to mean "findings reported" rather than "failure".
  pub fn run(&self, args: &[&str]) -> InspectResult<ToolOutput> {
    self.cancel.check()?;

    let (program, rest) = args.split_first().ok_or_else(|| InspectError::message("empty command"))?;
    let mut cmd = Command::new(program);
    cmd
      .args(rest)
      .current_dir(&self.module_root)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped());

    // Isolated environment: forward only the allow-list
    cmd.env_clear();
    for var in ENV_ALLOWLIST {
      if let Ok(value) = std::env::var(var) {
        cmd.env(var, value);
      }
    }

    debug!(command = %args.join(" "), "running command");

    let mut child = cmd
      .spawn()
      .with_context(|| format!("failed to run {}", program))?;

    let stdout = child.stdout.take().expect("stdout was piped");
    let stderr = child.stderr.take().expect("stderr was piped");
    let stdout_reader = spawn_reader(stdout);
    let stderr_reader = spawn_reader(stderr);

    let status = self.wait_with_cancel(&mut child, args)?;

    let stdout = join_reader(stdout_reader);
    let stderr = String::from_utf8_lossy(&join_reader(stderr_reader)).into_owned();

    Ok(ToolOutput {
      stdout,
      stderr,
      code: status,
    })
  }

  /// Poll the child until it exits, killing and awaiting it on cancellation
  fn wait_with_cancel(&self, child: &mut Child, args: &[&str]) -> InspectResult<Option<i32>> {
    loop {
      if self.cancel.is_cancelled() {
        // Terminate and reap before reporting so no orphan survives
        let _ = child.kill();
        let _ = child.wait();
        return Err(InspectError::Cancelled);
      }
      match child.try_wait().with_context(|| format!("waiting for {}", args[0]))? {
        Some(status) => return Ok(status.code()),
        None => thread::sleep(Duration::from_millis(25)),
      }
    }
  }
}

fn spawn_reader<R: Read + Send + 'static>(mut source: R) -> thread::JoinHandle<Vec<u8>> {
  thread::spawn(move || {
    let mut buf = Vec::new();
    let _ = source.read_to_end(&mut buf);
    buf
  })
}

fn join_reader(handle: thread::JoinHandle<Vec<u8>>) -> Vec<u8> {
  handle.join().unwrap_or_default()
}
