//! File system operations (read, write, directory trees, permissions).

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self, contents))]
    pub(crate) fn write_impl(&self, path: &Path, contents: &[u8]) -> Result<()> {
        fs::write(path, contents).context("Failed to write to file")?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn read_to_string_impl(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).context("Failed to read file to string")
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn rename_impl(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to).context("Failed to rename file")?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn copy_dir_all_impl(&self, from: &Path, to: &Path) -> Result<u64> {
        fs::create_dir_all(to)
            .with_context(|| format!("Failed to create directory {}", to.display()))?;

        let mut copied = 0;
        for entry in fs::read_dir(from)
            .with_context(|| format!("Failed to read directory {}", from.display()))?
        {
            let entry = entry?;
            let source = entry.path();
            let dest = to.join(entry.file_name());
            let file_type = entry.file_type()?;

            if file_type.is_symlink() {
                let target = fs::read_link(&source).context("Failed to read symlink")?;
                if fs::symlink_metadata(&dest).is_ok() {
                    fs::remove_file(&dest).context("Failed to replace existing file")?;
                }
                self.symlink_impl(&target, &dest)?;
            } else if file_type.is_dir() {
                copied += self.copy_dir_all_impl(&source, &dest)?;
            } else {
                fs::copy(&source, &dest).with_context(|| {
                    format!("Failed to copy {} to {}", source.display(), dest.display())
                })?;
                copied += 1;
            }
        }

        Ok(copied)
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn create_dir_all_impl(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).context("Failed to create directory")?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn remove_file_impl(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).context("Failed to remove file")?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn exists_impl(&self, path: &Path) -> bool {
        path.exists()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn read_dir_impl(&self, path: &Path) -> Result<Vec<PathBuf>> {
        fs::read_dir(path)?.map(|entry| Ok(entry?.path())).collect()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn remove_dir_all_impl(&self, path: &Path) -> Result<()> {
        fs::remove_dir_all(path).context("Failed to remove directory and its contents")?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn is_dir_impl(&self, path: &Path) -> bool {
        path.is_dir()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn set_permissions_impl(&self, path: &Path, mode: u32) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(mode);
            fs::set_permissions(path, permissions).context("Failed to set permissions")?;
        }
        #[cfg(not(unix))]
        {
            let _ = (path, mode);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{RealRuntime, Runtime};
    use tempfile::tempdir;

    #[test]
    fn test_real_runtime_file_ops() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.txt");

        runtime.write(&file_path, b"hello").unwrap();
        assert!(runtime.exists(&file_path));
        assert_eq!(runtime.read_to_string(&file_path).unwrap(), "hello");

        let new_path = dir.path().join("renamed.txt");
        runtime.rename(&file_path, &new_path).unwrap();
        assert!(!runtime.exists(&file_path));
        assert!(runtime.exists(&new_path));

        runtime.remove_file(&new_path).unwrap();
        assert!(!runtime.exists(&new_path));
    }

    #[test]
    fn test_real_runtime_dir_ops() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let sub_dir = dir.path().join("sub/nested");

        runtime.create_dir_all(&sub_dir).unwrap();
        assert!(runtime.is_dir(&sub_dir));

        let parent = dir.path().join("sub");
        let entries = runtime.read_dir(&parent).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].ends_with("nested"));

        runtime.remove_dir_all(&parent).unwrap();
        assert!(!runtime.exists(&parent));
    }

    #[test]
    fn test_copy_dir_all_merges_into_existing_tree() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let from = dir.path().join("from");
        let to = dir.path().join("to");

        runtime.create_dir_all(&from.join("lib64-linux")).unwrap();
        runtime.write(&from.join("Everest.dll"), b"new").unwrap();
        runtime
            .write(&from.join("lib64-linux/libfoo.so"), b"so")
            .unwrap();

        runtime.create_dir_all(&to).unwrap();
        runtime.write(&to.join("Everest.dll"), b"old").unwrap();
        runtime.write(&to.join("Celeste.dll"), b"game").unwrap();

        let copied = runtime.copy_dir_all(&from, &to).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(runtime.read_to_string(&to.join("Everest.dll")).unwrap(), "new");
        assert_eq!(runtime.read_to_string(&to.join("Celeste.dll")).unwrap(), "game");
        assert!(runtime.exists(&to.join("lib64-linux/libfoo.so")));
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_dir_all_recreates_symlinks() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let from = dir.path().join("from");
        let to = dir.path().join("to");

        runtime.create_dir_all(&from).unwrap();
        runtime.write(&from.join("libfoo.so.1"), b"so").unwrap();
        runtime
            .symlink(std::path::Path::new("libfoo.so.1"), &from.join("libfoo.so"))
            .unwrap();

        runtime.copy_dir_all(&from, &to).unwrap();

        assert!(runtime.is_symlink(&to.join("libfoo.so")));
        assert_eq!(
            runtime.read_link(&to.join("libfoo.so")).unwrap(),
            std::path::PathBuf::from("libfoo.so.1")
        );
    }

    #[test]
    fn test_real_runtime_errors() {
        let runtime = RealRuntime;

        let result = runtime.read_to_string(std::path::Path::new("/nonexistent/path/file.txt"));
        assert!(result.is_err());

        let result = runtime.remove_file(std::path::Path::new("/nonexistent/path/file.txt"));
        assert!(result.is_err());
    }
}
