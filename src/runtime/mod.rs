//! Runtime abstraction for system operations.
//!
//! Every filesystem, environment, prompt and subprocess access made by the
//! launcher goes through [`Runtime`], so the resolver and the install state
//! machine can be exercised against mocks or a sandboxed directory.
//!
//! # Structure
//!
//! - `path` - Lexical path helpers (normalize, is_path_under)
//! - `env` - Environment variables, well-known directories, privilege
//! - `fs` - File system operations (read, write, directory trees)
//! - `symlink` - Symlink operations (create, read, resolve, remove)
//! - `process` - Subprocess invocation and program lookup
//! - `user` - User interaction (confirmation and free-form prompts)

mod env;
mod fs;
pub mod path;
mod process;
mod symlink;
mod user;

use anyhow::Result;
use std::env as std_env;
use std::path::{Path, PathBuf};

pub use path::is_path_under;
pub use process::{Invocation, run_checked};

#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;

    // File System
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Recursively copy the contents of `from` into `to`, creating `to` if
    /// needed and overwriting files that already exist. Symlinks are recreated
    /// rather than followed. Returns the number of files copied.
    fn copy_dir_all(&self, from: &Path, to: &Path) -> Result<u64>;

    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
    fn symlink(&self, original: &Path, link: &Path) -> Result<()>;
    fn read_link(&self, path: &Path) -> Result<PathBuf>;

    /// Resolve a symlink to an absolute path (without recursively resolving symlinks).
    /// If the link target is relative, it is resolved relative to the link's parent directory.
    fn resolve_link(&self, path: &Path) -> Result<PathBuf>;

    fn is_symlink(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;

    /// Set file permissions (mode) on Unix systems. No-op elsewhere.
    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()>;

    /// Remove a symlink if its target is under the given prefix directory.
    /// Dangling links are judged by where they point, not by whether the
    /// target still exists.
    /// Returns Ok(true) if removed, Ok(false) if skipped, Err if removal failed.
    fn remove_symlink_if_target_under(
        &self,
        link_path: &Path,
        target_prefix: &Path,
        description: &str,
    ) -> Result<bool>;

    // Directories
    fn current_dir(&self) -> Result<PathBuf>;
    fn config_dir(&self) -> Option<PathBuf>;
    fn data_dir(&self) -> Option<PathBuf>;

    // Privilege
    fn is_privileged(&self) -> bool;

    // Processes
    /// Locate an executable on `PATH`.
    fn find_program(&self, name: &str) -> Option<PathBuf>;

    /// Run a subprocess to completion, inheriting stdio.
    /// Returns the exit code, or `None` if the process was killed by a signal.
    fn run(&self, invocation: &Invocation) -> Result<Option<i32>>;

    // User interaction
    /// Prompt user for confirmation. Returns true if user confirms (y/yes), false otherwise.
    fn confirm(&self, prompt: &str) -> Result<bool>;

    /// Prompt user for a line of input, returned trimmed.
    fn prompt(&self, prompt: &str) -> Result<String>;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.write_impl(path, contents)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.rename_impl(from, to)
    }

    fn copy_dir_all(&self, from: &Path, to: &Path) -> Result<u64> {
        self.copy_dir_all_impl(from, to)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.create_dir_all_impl(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.remove_file_impl(path)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.remove_dir_all_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.read_dir_impl(path)
    }

    fn symlink(&self, original: &Path, link: &Path) -> Result<()> {
        self.symlink_impl(original, link)
    }

    fn read_link(&self, path: &Path) -> Result<PathBuf> {
        self.read_link_impl(path)
    }

    fn resolve_link(&self, path: &Path) -> Result<PathBuf> {
        self.resolve_link_impl(path)
    }

    fn is_symlink(&self, path: &Path) -> bool {
        self.is_symlink_impl(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.is_dir_impl(path)
    }

    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()> {
        self.set_permissions_impl(path, mode)
    }

    fn remove_symlink_if_target_under(
        &self,
        link_path: &Path,
        target_prefix: &Path,
        description: &str,
    ) -> Result<bool> {
        self.remove_symlink_if_target_under_impl(link_path, target_prefix, description)
    }

    fn current_dir(&self) -> Result<PathBuf> {
        self.current_dir_impl()
    }

    fn config_dir(&self) -> Option<PathBuf> {
        self.config_dir_impl()
    }

    fn data_dir(&self) -> Option<PathBuf> {
        self.data_dir_impl()
    }

    fn is_privileged(&self) -> bool {
        self.is_privileged_impl()
    }

    fn find_program(&self, name: &str) -> Option<PathBuf> {
        self.find_program_impl(name)
    }

    fn run(&self, invocation: &Invocation) -> Result<Option<i32>> {
        self.run_impl(invocation)
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        self.confirm_impl(prompt)
    }

    fn prompt(&self, prompt: &str) -> Result<String> {
        self.prompt_impl(prompt)
    }
}
