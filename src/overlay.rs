//! Mounting the copy-on-write view over the base installation.

use anyhow::{Result, bail};
use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::config::StateLayout;
use crate::runtime::{Invocation, Runtime, run_checked};

/// Kernel mount table of the current process.
pub const MOUNTS_FILE: &str = "/proc/self/mounts";

/// An overlayfs mount: the read-only game directory below, a writable upper
/// layer above, merged into one tree.
pub struct Overlay<'a, R: Runtime> {
    runtime: &'a R,
    lower: PathBuf,
    upper: PathBuf,
    work: PathBuf,
    merged: PathBuf,
}

impl<'a, R: Runtime> Overlay<'a, R> {
    pub fn new(runtime: &'a R, game_dir: &Path, layout: &StateLayout) -> Self {
        Self {
            runtime,
            lower: game_dir.to_path_buf(),
            upper: layout.upper_dir(),
            work: layout.work_dir(),
            merged: layout.merged_dir(),
        }
    }

    pub fn merged(&self) -> &Path {
        &self.merged
    }

    /// Whether the merged directory is a mount point right now.
    #[tracing::instrument(skip(self))]
    pub fn is_mounted(&self) -> Result<bool> {
        let mounts = Path::new(MOUNTS_FILE);
        if !self.runtime.exists(mounts) {
            debug!("{} not available, assuming nothing is mounted", MOUNTS_FILE);
            return Ok(false);
        }
        let table = self.runtime.read_to_string(mounts)?;
        let mounted = mount_points(&table).any(|point| point == self.merged);
        Ok(mounted)
    }

    /// Mount unless already mounted. Returns true if a mount was performed.
    #[tracing::instrument(skip(self))]
    pub fn ensure_mounted(&self) -> Result<bool> {
        if self.is_mounted()? {
            debug!("{:?} is already mounted", self.merged);
            return Ok(false);
        }

        for dir in [&self.upper, &self.work, &self.merged] {
            self.runtime.create_dir_all(dir)?;
        }

        let mut invocation = self.mount_invocation()?;
        if !self.runtime.is_privileged() {
            invocation = invocation.wrapped_in("sudo");
        }

        println!("   mounting overlay at {}", self.merged.display());
        run_checked(self.runtime, &invocation)?;
        info!("Mounted {:?} over {:?}", self.merged, self.lower);
        Ok(true)
    }

    fn mount_invocation(&self) -> Result<Invocation> {
        for layer in [&self.lower, &self.upper, &self.work] {
            let text = layer.to_string_lossy();
            if text.contains([',', ':']) {
                bail!("{:?} cannot be used as an overlay layer", layer);
            }
        }

        let options = format!(
            "lowerdir={},upperdir={},workdir={}",
            self.lower.display(),
            self.upper.display(),
            self.work.display()
        );
        Ok(Invocation::new("mount")
            .args(["-t", "overlay", "overlay", "-o"])
            .arg(options)
            .path_arg(&self.merged))
    }
}

/// Mount points listed in a mounts table, with octal escapes decoded.
fn mount_points(table: &str) -> impl Iterator<Item = PathBuf> + '_ {
    table
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(|field| PathBuf::from(unescape_octal(field)))
}

fn unescape_octal(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let digits = std::str::from_utf8(&bytes[i + 1..i + 4]).unwrap_or("");
            if let Ok(value) = u8::from_str_radix(digits, 8) {
                out.push(value);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
