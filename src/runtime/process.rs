//! Subprocess invocation and program lookup.

use anyhow::{Context, Result};
use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{RealRuntime, Runtime};
use crate::error::EverlayError;

/// A fully described subprocess call.
///
/// Kept as plain data so that callers can be tested by inspecting what they
/// would have run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Wrap this invocation so it runs through `wrapper` (e.g. `sudo`).
    pub fn wrapped_in(self, wrapper: &str) -> Self {
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push(self.program);
        args.extend(self.args);
        Self {
            program: wrapper.to_string(),
            args,
            cwd: self.cwd,
            env: self.env,
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Run `invocation` and turn any non-zero or signal exit into
/// [`EverlayError::CommandFailed`].
#[tracing::instrument(skip(runtime))]
pub fn run_checked<R: Runtime>(runtime: &R, invocation: &Invocation) -> Result<()> {
    let status = runtime
        .run(invocation)
        .with_context(|| format!("Failed to start `{}`", invocation))?;

    match status {
        Some(0) => Ok(()),
        Some(code) => Err(EverlayError::CommandFailed {
            command: invocation.to_string(),
            status: format!("exit code {}", code),
        }
        .into()),
        None => Err(EverlayError::CommandFailed {
            command: invocation.to_string(),
            status: "a signal".to_string(),
        }
        .into()),
    }
}

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn find_program_impl(&self, name: &str) -> Option<PathBuf> {
        let candidate = Path::new(name);
        if candidate.components().count() > 1 {
            return is_executable(candidate).then(|| candidate.to_path_buf());
        }

        let path = std::env::var_os("PATH")?;
        std::env::split_paths(&path)
            .map(|dir| dir.join(name))
            .find(|p| is_executable(p))
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn run_impl(&self, invocation: &Invocation) -> Result<Option<i32>> {
        debug!("Running `{}` in {:?}", invocation, invocation.cwd);

        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(cwd) = &invocation.cwd {
            command.current_dir(cwd);
        }
        for (key, value) in &invocation.env {
            command.env(key, value);
        }

        let status = command
            .status()
            .with_context(|| format!("Failed to execute {}", invocation.program))?;
        Ok(status.code())
    }
}

fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path)
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        path.is_file()
    }
}
