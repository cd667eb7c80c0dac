//! Error types for dep-inspector with contextual messages and exit codes
//!
//! This module provides a unified error type that mirrors the failure
//! taxonomy of an inspection run: setup failures around the module files,
//! resolution failures in the package graph, analyzer subprocess failures,
//! and version-consistency failures. Analyzer failures from concurrent
//! tasks are joined into an aggregate error so that neither is lost.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for dep-inspector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (invalid args, missing module files, dep not used)
  User = 1,
  /// System error (subprocess, I/O, restore failure)
  System = 2,
  /// Analysis failure (analyzer errored or produced undecodable output)
  Analysis = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for dep-inspector
#[derive(Debug)]
pub enum InspectError {
  /// Module file setup/restore errors
  Setup(SetupError),

  /// Package graph resolution errors
  Resolution(ResolutionError),

  /// Subprocess failure (non-benign exit code or spawn failure)
  Command {
    command: String,
    stderr: String,
    code: Option<i32>,
  },

  /// An analyzer's contribution failed
  Analyzer {
    analyzer: String,
    source: Box<InspectError>,
  },

  /// The resolved version after pin+tidy does not match the requested one
  VersionMismatch {
    dep: String,
    requested: String,
    resolved: String,
  },

  /// The run was cancelled by an external signal
  Cancelled,

  /// Multiple underlying failures, in the order they were observed
  Joined(Vec<InspectError>),

  /// An underlying error with a stage/operation description attached;
  /// classification stays with the wrapped error
  Context {
    context: String,
    source: Box<InspectError>,
  },

  /// I/O errors
  Io(io::Error),

  /// Structured-output decode errors
  Json(serde_json::Error),

  /// Generic error with message and optional context
  Message { message: String, context: Option<String> },
}

impl InspectError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    InspectError::Message {
      message: msg.into(),
      context: None,
    }
  }

  /// Join multiple errors, flattening the single-error case
  pub fn join(mut errors: Vec<InspectError>) -> Self {
    if errors.len() == 1 {
      return errors.remove(0);
    }
    InspectError::Joined(errors)
  }

  /// Add context to an existing error, keeping its classification
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      InspectError::Message { message, context } => InspectError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
      },
      other => InspectError::Context {
        context: ctx_str,
        source: Box::new(other),
      },
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      InspectError::Setup(SetupError::ManifestNotFound { .. }) => ExitCode::User,
      InspectError::Setup(_) => ExitCode::System,
      InspectError::Resolution(_) => ExitCode::User,
      InspectError::Command { .. } => ExitCode::System,
      InspectError::Analyzer { .. } => ExitCode::Analysis,
      InspectError::VersionMismatch { .. } => ExitCode::User,
      InspectError::Cancelled => ExitCode::System,
      InspectError::Joined(errors) => errors
        .iter()
        .map(InspectError::exit_code)
        .find(|c| *c != ExitCode::Analysis)
        .unwrap_or(ExitCode::Analysis),
      InspectError::Context { source, .. } => source.exit_code(),
      InspectError::Io(_) => ExitCode::System,
      InspectError::Json(_) => ExitCode::Analysis,
      InspectError::Message { .. } => ExitCode::User,
    }
  }
}

impl fmt::Display for InspectError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      InspectError::Setup(e) => write!(f, "{}", e),
      InspectError::Resolution(e) => write!(f, "{}", e),
      InspectError::Command { command, stderr, code } => {
        write!(f, "command failed: {}", command)?;
        if let Some(code) = code {
          write!(f, " (exit code {})", code)?;
        }
        if !stderr.is_empty() {
          write!(f, "\n{}", stderr.trim_end())?;
        }
        Ok(())
      }
      InspectError::Analyzer { analyzer, source } => {
        write!(f, "running {}: {}", analyzer, source)
      }
      InspectError::VersionMismatch {
        dep,
        requested,
        resolved,
      } => {
        write!(
          f,
          "version of {} is {} after resolving, expected {}",
          dep, resolved, requested
        )
      }
      InspectError::Cancelled => write!(f, "inspection cancelled"),
      InspectError::Joined(errors) => {
        for (i, err) in errors.iter().enumerate() {
          if i > 0 {
            writeln!(f)?;
          }
          write!(f, "{}", err)?;
        }
        Ok(())
      }
      InspectError::Context { context, source } => write!(f, "{}: {}", context, source),
      InspectError::Io(e) => write!(f, "I/O error: {}", e),
      InspectError::Json(e) => write!(f, "decoding JSON: {}", e),
      InspectError::Message { message, context } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for InspectError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      InspectError::Io(e) => Some(e),
      InspectError::Json(e) => Some(e),
      InspectError::Analyzer { source, .. } => Some(source.as_ref()),
      InspectError::Context { source, .. } => Some(source.as_ref()),
      _ => None,
    }
  }
}

impl From<io::Error> for InspectError {
  fn from(err: io::Error) -> Self {
    InspectError::Io(err)
  }
}

impl From<serde_json::Error> for InspectError {
  fn from(err: serde_json::Error) -> Self {
    InspectError::Json(err)
  }
}

impl From<String> for InspectError {
  fn from(msg: String) -> Self {
    InspectError::message(msg)
  }
}

impl From<&str> for InspectError {
  fn from(msg: &str) -> Self {
    InspectError::message(msg)
  }
}

impl From<std::string::FromUtf8Error> for InspectError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    InspectError::message(format!("UTF-8 conversion error: {}", err))
  }
}

impl From<semver::Error> for InspectError {
  fn from(err: semver::Error) -> Self {
    InspectError::message(format!("invalid version: {}", err))
  }
}

/// Setup errors around the live module files
#[derive(Debug)]
pub enum SetupError {
  /// go.mod or go.sum is missing
  ManifestNotFound { path: PathBuf },

  /// Restoring a live module file failed; the working tree state is unknown
  RestoreFailed { path: PathBuf, reason: String },

  /// Restored bytes do not match the backup
  RestoreMismatch { path: PathBuf },
}

impl fmt::Display for SetupError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SetupError::ManifestNotFound { path } => {
        write!(f, "module file not found: {}", path.display())
      }
      SetupError::RestoreFailed { path, reason } => {
        write!(
          f,
          "restoring {} failed, the file may be in an unknown state: {}",
          path.display(),
          reason
        )
      }
      SetupError::RestoreMismatch { path } => {
        write!(f, "restored contents of {} do not match the backup", path.display())
      }
    }
  }
}

/// Package graph resolution errors
#[derive(Debug)]
pub enum ResolutionError {
  /// An import path claimed as used is absent from the resolved package set
  PackageNotFound { import_path: String },

  /// The module cache location could not be determined
  ModCacheUnset,
}

impl fmt::Display for ResolutionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ResolutionError::PackageNotFound { import_path } => {
        write!(f, "could not find package {}", import_path)
      }
      ResolutionError::ModCacheUnset => write!(f, "GOMODCACHE is empty"),
    }
  }
}

/// Result type alias for dep-inspector
pub type InspectResult<T> = Result<T, InspectError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> InspectResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> InspectResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<InspectError>,
{
  fn context(self, ctx: impl Into<String>) -> InspectResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> InspectResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}
