//! Symlink operations (create, read, resolve, remove).

use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use super::RealRuntime;
use super::path::{is_path_under, normalize_path};

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn symlink_impl(&self, original: &Path, link: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::symlink as unix_symlink;
            unix_symlink(original, link).context("Failed to create symlink")?;
        }
        #[cfg(not(unix))]
        {
            anyhow::bail!(
                "Symlinks are only supported on Unix: link={:?} target={:?}",
                link,
                original
            );
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn read_link_impl(&self, path: &Path) -> Result<PathBuf> {
        fs::read_link(path).context("Failed to read symlink")
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn resolve_link_impl(&self, path: &Path) -> Result<PathBuf> {
        let target = fs::read_link(path).context("Failed to read symlink")?;
        if target.is_absolute() {
            Ok(target)
        } else {
            let parent = path
                .parent()
                .context("Failed to get parent directory of symlink")?;
            Ok(normalize_path(&parent.join(&target)))
        }
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn is_symlink_impl(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn remove_symlink_impl(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).context("Failed to remove symlink")?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn remove_symlink_if_target_under_impl(
        &self,
        link_path: &Path,
        target_prefix: &Path,
        description: &str,
    ) -> Result<bool> {
        debug!(
            "Validating {} {:?} (expected prefix: {:?})",
            description, link_path, target_prefix
        );

        if !self.is_symlink_impl(link_path) {
            debug!("{} {:?} is not a symlink, skipping", description, link_path);
            return Ok(false);
        }

        let resolved_target = match self.resolve_link_impl(link_path) {
            Ok(target) => target,
            Err(e) => {
                warn!(
                    "{} {:?} is a symlink but cannot read its target: {}, skipping",
                    description, link_path, e
                );
                return Ok(false);
            }
        };

        // A dangling link cannot be canonicalized, so both the lexical and the
        // canonical forms are checked against both forms of the prefix.
        let canonical_target =
            fs::canonicalize(&resolved_target).unwrap_or_else(|_| resolved_target.clone());
        let canonical_prefix =
            fs::canonicalize(target_prefix).unwrap_or_else(|_| target_prefix.to_path_buf());

        let under = [&resolved_target, &canonical_target].iter().any(|target| {
            is_path_under(target, target_prefix) || is_path_under(target, &canonical_prefix)
        });

        if !under {
            debug!(
                "{} {:?} points to {:?} which is not within {:?}, skipping",
                description, link_path, canonical_target, canonical_prefix
            );
            return Ok(false);
        }

        debug!("Removing {} {:?}", description, link_path);
        self.remove_symlink_impl(link_path)
            .with_context(|| format!("Failed to remove {} {:?}", description, link_path))?;
        Ok(true)
    }
}
