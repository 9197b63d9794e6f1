//! The framework install/update state machine.
//!
//! ```text
//! CheckVersion ─┬─▶ Done(UpToDate)
//!               └─▶ Confirm ─┬─▶ Done(Declined)
//!                            └─▶ Fetch ▶ Patch ▶ Build ▶ Prune ▶ Install ▶ Finalize ▶ Done(Installed)
//! ```
//!
//! Any failing step aborts the run with an error. The scratch directory of a
//! failed run is left in place and the installed version is unchanged; the
//! next run starts over in a fresh scratch directory.

use anyhow::{Context, Result, bail};
use log::{debug, info};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use super::patch::{local_version_string, stamp_version};
use super::platform::Platform;
use super::version::{VersionStore, is_newer};
use super::{FrameworkLayout, Toolchain};
use crate::error::EverlayError;
use crate::release::{ReleaseIndex, RemoteRelease};
use crate::runtime::{Invocation, Runtime, run_checked};

/// How a run that did not fail ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    UpToDate,
    Declined,
    Installed { version: String },
}

/// Filesystem locations the orchestrator works with.
#[derive(Debug, Clone)]
pub struct InstallPaths {
    /// File holding the installed version token.
    pub version_file: PathBuf,
    /// Parent of per-run scratch directories.
    pub build_root: PathBuf,
    /// The live game tree the framework is installed into.
    pub game_tree: PathBuf,
    /// Optional patch applied to the source before building.
    pub user_patch: PathBuf,
}

/// Work carried from one step to the next once a release was accepted.
#[derive(Debug)]
struct Job {
    release: RemoteRelease,
    toolchain: Toolchain,
    scratch: PathBuf,
}

#[derive(Debug)]
enum Step {
    CheckVersion,
    Confirm {
        release: RemoteRelease,
        installed: Option<String>,
    },
    Fetch(Job),
    Patch(Job),
    Build(Job),
    Prune(Job),
    Install(Job),
    Finalize(Job),
    Done(Outcome),
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::CheckVersion => "check-version",
            Step::Confirm { .. } => "confirm",
            Step::Fetch(_) => "fetch",
            Step::Patch(_) => "patch",
            Step::Build(_) => "build",
            Step::Prune(_) => "prune",
            Step::Install(_) => "install",
            Step::Finalize(_) => "finalize",
            Step::Done(_) => "done",
        }
    }
}

pub struct InstallOrchestrator<'a, R: Runtime, I: ReleaseIndex> {
    runtime: &'a R,
    index: &'a I,
    versions: VersionStore<'a, R>,
    paths: InstallPaths,
    layout: FrameworkLayout,
    platform: Platform,
}

impl<'a, R: Runtime, I: ReleaseIndex> InstallOrchestrator<'a, R, I> {
    pub fn new(runtime: &'a R, index: &'a I, paths: InstallPaths) -> Self {
        Self {
            runtime,
            index,
            versions: VersionStore::new(runtime, paths.version_file.clone()),
            paths,
            layout: FrameworkLayout::default(),
            platform: Platform::detect(),
        }
    }

    pub fn with_layout(mut self, layout: FrameworkLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Drive the state machine to a terminal state.
    ///
    /// `forced` skips the confirmation prompt; it does not skip the version
    /// check.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self, forced: bool) -> Result<Outcome> {
        let mut step = Step::CheckVersion;

        loop {
            debug!("Install step: {}", step.name());
            step = match step {
                Step::CheckVersion => self.check_version().await?,
                Step::Confirm { release, installed } => {
                    self.confirm(release, installed, forced)?
                }
                Step::Fetch(job) => self.fetch(job)?,
                Step::Patch(job) => self.patch(job)?,
                Step::Build(job) => self.build(job)?,
                Step::Prune(job) => self.prune(job)?,
                Step::Install(job) => self.install(job)?,
                Step::Finalize(job) => self.finalize(job)?,
                Step::Done(outcome) => return Ok(outcome),
            };
        }
    }

    async fn check_version(&self) -> Result<Step> {
        println!("   checking latest Everest release");
        let release = self
            .index
            .latest()
            .await
            .context("Failed to look up the latest Everest release")?;
        let installed = self.versions.load()?;

        if !is_newer(&release.version, installed.as_deref()) {
            info!(
                "Installed Everest {} is up to date (latest {})",
                installed.as_deref().unwrap_or("-"),
                release.version
            );
            return Ok(Step::Done(Outcome::UpToDate));
        }

        Ok(Step::Confirm { release, installed })
    }

    fn confirm(
        &self,
        release: RemoteRelease,
        installed: Option<String>,
        forced: bool,
    ) -> Result<Step> {
        if !forced {
            println!();
            println!(
                "Everest {} -> {} ({})",
                installed.as_deref().unwrap_or("(not installed)"),
                release.version,
                release.short_revision()
            );
            if let Some(published) = &release.published_at {
                println!("Published: {}", published);
            }
            println!();
            if !self.runtime.confirm("Build and install it?")? {
                println!("Update cancelled.");
                return Ok(Step::Done(Outcome::Declined));
            }
        }

        let toolchain = self.check_tooling()?;
        let scratch = self.scratch_dir(&release);
        Ok(Step::Fetch(Job {
            release,
            toolchain,
            scratch,
        }))
    }

    fn check_tooling(&self) -> Result<Toolchain> {
        let mut missing = Vec::new();
        if self.runtime.find_program("git").is_none() {
            missing.push("git".to_string());
        }
        let toolchain = Toolchain::detect(self.runtime);
        if toolchain.is_none() {
            missing.push("dotnet or msbuild".to_string());
        }

        match toolchain {
            Some(toolchain) if missing.is_empty() => Ok(toolchain),
            _ => Err(EverlayError::ToolingMissing(missing).into()),
        }
    }

    fn scratch_dir(&self, release: &RemoteRelease) -> PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.unused_scratch_dir(release, stamp)
    }

    /// A build directory no earlier run has used, including failed ones.
    fn unused_scratch_dir(&self, release: &RemoteRelease, stamp: u64) -> PathBuf {
        let version: String = release
            .version
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        let base = format!("everest-{}-{}-{}", version, release.short_revision(), stamp);

        let mut candidate = self.paths.build_root.join(&base);
        let mut attempt = 1;
        while self.runtime.exists(&candidate) {
            candidate = self.paths.build_root.join(format!("{}-{}", base, attempt));
            attempt += 1;
        }
        candidate
    }

    fn fetch(&self, job: Job) -> Result<Step> {
        println!(
            "   fetching Everest {} ({})",
            job.release.version,
            job.release.short_revision()
        );
        self.runtime
            .create_dir_all(&job.scratch)
            .with_context(|| format!("Failed to create build directory {:?}", job.scratch))?;

        let git = |args: &[&str]| {
            Invocation::new("git")
                .args(args.iter().copied())
                .current_dir(&job.scratch)
        };

        run_checked(self.runtime, &git(&["init", "--quiet"]))?;
        run_checked(
            self.runtime,
            &git(&["fetch", "--depth", "1"])
                .arg(job.release.source_url.as_str())
                .arg(job.release.revision.as_str()),
        )?;
        run_checked(
            self.runtime,
            &git(&["checkout", "--quiet", "--detach", "FETCH_HEAD"]),
        )?;
        run_checked(
            self.runtime,
            &git(&["submodule", "update", "--init", "--recursive", "--depth", "1"]),
        )?;

        Ok(Step::Patch(job))
    }

    fn patch(&self, job: Job) -> Result<Step> {
        let source = job.scratch.join(&self.layout.version_file);
        let text = self
            .runtime
            .read_to_string(&source)
            .with_context(|| format!("Failed to read {:?}", source))?;

        let stamp = local_version_string(&job.release.version, job.release.short_revision());
        let patched =
            stamp_version(&text, &stamp).ok_or_else(|| EverlayError::MarkerNotFound(source.clone()))?;
        self.runtime.write(&source, patched.as_bytes())?;
        debug!("Stamped {:?} with {}", source, stamp);

        let user_patch = &self.paths.user_patch;
        if self.runtime.exists(user_patch) {
            println!("   applying {}", user_patch.display());
            run_checked(
                self.runtime,
                &Invocation::new("git")
                    .arg("apply")
                    .path_arg(user_patch)
                    .current_dir(&job.scratch),
            )?;
        } else {
            info!("No user patch at {:?}", user_patch);
        }

        Ok(Step::Build(job))
    }

    fn build(&self, job: Job) -> Result<Step> {
        println!("   building with {}", job.toolchain.program());
        run_checked(self.runtime, &job.toolchain.build(&job.scratch))?;
        Ok(Step::Prune(job))
    }

    fn prune(&self, job: Job) -> Result<Step> {
        for dir in &self.layout.artifact_dirs {
            let dir = job.scratch.join(dir);
            if !self.runtime.is_dir(&dir) {
                continue;
            }

            for entry in self.runtime.read_dir(&dir)? {
                let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if !self.platform.is_foreign_artifact(name) {
                    continue;
                }

                debug!("Pruning {:?}", entry);
                if self.runtime.is_dir(&entry) && !self.runtime.is_symlink(&entry) {
                    self.runtime.remove_dir_all(&entry)?;
                } else {
                    self.runtime.remove_file(&entry)?;
                }
            }
        }

        Ok(Step::Install(job))
    }

    fn install(&self, job: Job) -> Result<Step> {
        let game_tree = &self.paths.game_tree;
        println!("   installing into {}", game_tree.display());

        let mut found = false;
        for dir in &self.layout.artifact_dirs {
            let dir = job.scratch.join(dir);
            if !self.runtime.is_dir(&dir) {
                debug!("No artifacts in {:?}", dir);
                continue;
            }
            found = true;
            let copied = self
                .runtime
                .copy_dir_all(&dir, game_tree)
                .with_context(|| format!("Failed to copy {:?} into {:?}", dir, game_tree))?;
            debug!("Copied {} file(s) from {:?}", copied, dir);
        }
        if !found {
            bail!("The build produced no artifacts under {:?}", job.scratch);
        }

        let installer = self.installer_invocation()?;
        run_checked(self.runtime, &installer)?;

        Ok(Step::Finalize(job))
    }

    /// Native installer, then the managed one through `dotnet`, then `mono`.
    fn installer_invocation(&self) -> Result<Invocation> {
        let game_tree = &self.paths.game_tree;

        if let Some(native) = self.platform.native_installer() {
            let path = game_tree.join(native);
            if self.runtime.exists(&path) {
                self.runtime.set_permissions(&path, 0o755)?;
                return Ok(Invocation::new(path.to_string_lossy()).current_dir(game_tree));
            }
        }

        let candidates = [("dotnet", "MiniInstaller.dll"), ("mono", "MiniInstaller.exe")];
        for (host, assembly) in candidates {
            if self.runtime.exists(&game_tree.join(assembly))
                && self.runtime.find_program(host).is_some()
            {
                return Ok(Invocation::new(host).arg(assembly).current_dir(game_tree));
            }
        }

        Err(EverlayError::ToolingMissing(vec!["MiniInstaller".to_string()]).into())
    }

    fn finalize(&self, job: Job) -> Result<Step> {
        self.runtime
            .remove_dir_all(&job.scratch)
            .with_context(|| format!("Failed to remove build directory {:?}", job.scratch))?;
        self.versions.save(&job.release.version)?;

        println!("   installed Everest {}", job.release.version);
        Ok(Step::Done(Outcome::Installed {
            version: job.release.version,
        }))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::release::MockReleaseIndex;
    use crate::test_utils::SandboxRuntime;
    use std::fs;
    use std::path::Path;
    use tempfile::{TempDir, tempdir};

    const EVEREST_CS: &str =
        "public static partial class Everest {\n    public readonly static string VersionString = \"0.0.0-dev\";\n}\n";

    fn release(version: &str) -> RemoteRelease {
        RemoteRelease {
            version: version.into(),
            source_url: "https://github.com/EverestAPI/Everest.git".into(),
            revision: "a1b2c3d4e5f60718293a4b5c6d7e8f9012345678".into(),
            published_at: Some("2024-01-02T03:04:05Z".into()),
        }
    }

    fn index(version: &'static str) -> MockReleaseIndex {
        let mut index = MockReleaseIndex::new();
        index.expect_latest().returning(move || Ok(release(version)));
        index
    }

    fn paths(dir: &TempDir) -> InstallPaths {
        InstallPaths {
            version_file: dir.path().join("everest-version"),
            build_root: dir.path().join("build"),
            game_tree: dir.path().join("overlay/merged"),
            user_patch: dir.path().join("config/everest.patch"),
        }
    }

    /// Pretends to be git and dotnet: checkout produces the version source,
    /// a build produces artifacts for every platform.
    fn simulate_toolchain(inv: &Invocation) -> Result<Option<i32>> {
        let cwd = inv.cwd.clone().unwrap_or_default();
        let layout = FrameworkLayout::default();

        match (inv.program.as_str(), inv.args.first().map(String::as_str)) {
            ("git", Some("checkout")) => {
                let source = cwd.join(&layout.version_file);
                fs::create_dir_all(source.parent().unwrap())?;
                fs::write(source, EVEREST_CS)?;
            }
            ("dotnet", Some("build")) => {
                let core = cwd.join(&layout.artifact_dirs[0]);
                let installer = cwd.join(&layout.artifact_dirs[1]);
                fs::create_dir_all(core.join("win-x64"))?;
                fs::write(core.join("Celeste.Mod.mm.dll"), "mm")?;
                fs::write(core.join("win-x64/native.dll"), "win")?;
                fs::create_dir_all(&installer)?;
                fs::write(installer.join("MiniInstaller.dll"), "mi")?;
                fs::write(installer.join("MiniInstaller-linux"), "elf")?;
                fs::write(installer.join("MiniInstaller-osx"), "macho")?;
            }
            _ => {}
        }
        Ok(Some(0))
    }

    fn scratch_dirs(paths: &InstallPaths) -> Vec<PathBuf> {
        fs::read_dir(&paths.build_root)
            .map(|rd| rd.map(|e| e.unwrap().path()).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_up_to_date_does_nothing() {
        let dir = tempdir().unwrap();
        let paths = paths(&dir);
        fs::write(&paths.version_file, "1.2.0\n").unwrap();

        let runtime = SandboxRuntime::new();
        let index = index("1.2.0");
        let orchestrator = InstallOrchestrator::new(&runtime, &index, paths.clone());

        let outcome = orchestrator.run(false).await.unwrap();

        assert_eq!(outcome, Outcome::UpToDate);
        assert!(runtime.prompts().is_empty());
        assert!(runtime.invocations().is_empty());
        assert!(!paths.build_root.exists());
    }

    #[tokio::test]
    async fn test_older_remote_is_up_to_date_even_when_forced() {
        let dir = tempdir().unwrap();
        let paths = paths(&dir);
        fs::write(&paths.version_file, "1.3.0").unwrap();

        let runtime = SandboxRuntime::new();
        let index = index("1.2.0");
        let outcome = InstallOrchestrator::new(&runtime, &index, paths)
            .run(true)
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::UpToDate);
    }

    #[tokio::test]
    async fn test_declined_has_no_side_effects() {
        let dir = tempdir().unwrap();
        let paths = paths(&dir);
        fs::write(&paths.version_file, "1.2.0").unwrap();

        let runtime = SandboxRuntime::new()
            .with_programs(&["git", "dotnet"])
            .with_answers(&["n"]);
        let index = index("1.3.0");
        let outcome = InstallOrchestrator::new(&runtime, &index, paths.clone())
            .run(false)
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Declined);
        assert_eq!(runtime.prompts().len(), 1);
        assert!(runtime.invocations().is_empty());
        assert_eq!(fs::read_to_string(&paths.version_file).unwrap(), "1.2.0");
    }

    #[tokio::test]
    async fn test_missing_tooling_aborts_before_mutation() {
        let dir = tempdir().unwrap();
        let paths = paths(&dir);

        let runtime = SandboxRuntime::new().with_programs(&["msbuild"]);
        let index = index("1.3.0");
        let err = InstallOrchestrator::new(&runtime, &index, paths.clone())
            .run(true)
            .await
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<EverlayError>(),
            Some(&EverlayError::ToolingMissing(vec!["git".into()]))
        );
        assert!(runtime.invocations().is_empty());
        assert!(!paths.build_root.exists());
        assert!(!paths.version_file.exists());
    }

    #[test_log::test(tokio::test)]
    async fn test_full_install() {
        let dir = tempdir().unwrap();
        let paths = paths(&dir);
        fs::create_dir_all(&paths.game_tree).unwrap();
        fs::write(paths.game_tree.join("Celeste.dll"), "game").unwrap();

        let runtime = SandboxRuntime::new()
            .with_programs(&["git", "dotnet"])
            .with_handler(simulate_toolchain);
        let index = index("stable-1.4465.0");
        let outcome = InstallOrchestrator::new(&runtime, &index, paths.clone())
            .with_platform(Platform::Linux)
            .run(true)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Installed {
                version: "stable-1.4465.0".into()
            }
        );

        let commands: Vec<String> = runtime
            .invocations()
            .iter()
            .map(|inv| inv.to_string())
            .collect();
        let installer = paths.game_tree.join("MiniInstaller-linux");
        assert_eq!(
            commands,
            vec![
                "git init --quiet".to_string(),
                "git fetch --depth 1 https://github.com/EverestAPI/Everest.git a1b2c3d4e5f60718293a4b5c6d7e8f9012345678".to_string(),
                "git checkout --quiet --detach FETCH_HEAD".to_string(),
                "git submodule update --init --recursive --depth 1".to_string(),
                "dotnet build --configuration Release".to_string(),
                installer.display().to_string(),
            ]
        );

        let invocations = runtime.invocations();
        assert_eq!(invocations[5].cwd.as_deref(), Some(paths.game_tree.as_path()));

        // Artifacts copied, foreign ones pruned, game files kept
        assert!(paths.game_tree.join("Celeste.Mod.mm.dll").exists());
        assert!(paths.game_tree.join("MiniInstaller.dll").exists());
        assert!(paths.game_tree.join("Celeste.dll").exists());
        assert!(!paths.game_tree.join("MiniInstaller-osx").exists());
        assert!(!paths.game_tree.join("win-x64").exists());

        assert_eq!(
            fs::read_to_string(&paths.version_file).unwrap().trim(),
            "stable-1.4465.0"
        );
        assert!(scratch_dirs(&paths).is_empty());
    }

    #[tokio::test]
    async fn test_user_patch_is_applied() {
        let dir = tempdir().unwrap();
        let paths = paths(&dir);
        fs::create_dir_all(paths.user_patch.parent().unwrap()).unwrap();
        fs::write(&paths.user_patch, "diff --git a/x b/x\n").unwrap();

        let runtime = SandboxRuntime::new()
            .with_programs(&["git", "dotnet"])
            .with_handler(simulate_toolchain);
        let index = index("1.3.0");
        InstallOrchestrator::new(&runtime, &index, paths.clone())
            .with_platform(Platform::Linux)
            .run(true)
            .await
            .unwrap();

        let apply = format!("git apply {}", paths.user_patch.display());
        let commands: Vec<String> = runtime
            .invocations()
            .iter()
            .map(|inv| inv.to_string())
            .collect();
        let apply_at = commands.iter().position(|c| *c == apply).unwrap();
        let build_at = commands
            .iter()
            .position(|c| c.starts_with("dotnet build"))
            .unwrap();
        assert!(apply_at < build_at);
    }

    #[tokio::test]
    async fn test_failed_build_keeps_version_and_scratch() {
        let dir = tempdir().unwrap();
        let paths = paths(&dir);
        fs::write(&paths.version_file, "1.2.0").unwrap();

        let runtime = SandboxRuntime::new()
            .with_programs(&["git", "dotnet"])
            .with_answers(&["yes"])
            .with_handler(|inv| {
                if inv.program == "dotnet" {
                    return Ok(Some(1));
                }
                simulate_toolchain(inv)
            });
        let index = index("1.3.0");
        let err = InstallOrchestrator::new(&runtime, &index, paths.clone())
            .run(false)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<EverlayError>(),
            Some(EverlayError::CommandFailed { command, status })
                if command == "dotnet build --configuration Release" && status == "exit code 1"
        ));
        assert_eq!(fs::read_to_string(&paths.version_file).unwrap(), "1.2.0");

        let scratch = scratch_dirs(&paths);
        assert_eq!(scratch.len(), 1);
        let name = scratch[0].file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("everest-1.3.0-a1b2c3d-"));
    }

    #[tokio::test]
    async fn test_missing_version_marker_fails() {
        let dir = tempdir().unwrap();
        let paths = paths(&dir);

        let runtime = SandboxRuntime::new()
            .with_programs(&["git", "dotnet"])
            .with_handler(|inv| {
                if inv.program == "git" && inv.args[0] == "checkout" {
                    let source = inv
                        .cwd
                        .as_deref()
                        .unwrap()
                        .join(FrameworkLayout::default().version_file);
                    fs::create_dir_all(source.parent().unwrap())?;
                    fs::write(source, "class Everest {}\n")?;
                }
                Ok(Some(0))
            });
        let index = index("1.3.0");
        let err = InstallOrchestrator::new(&runtime, &index, paths.clone())
            .run(true)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<EverlayError>(),
            Some(EverlayError::MarkerNotFound(path)) if path.ends_with("Everest.cs")
        ));
        assert!(!paths.version_file.exists());
        assert!(
            !runtime
                .invocations()
                .iter()
                .any(|inv| inv.program == "dotnet")
        );
    }

    #[test]
    fn test_scratch_dir_skips_leftover_from_failed_run() {
        let dir = tempdir().unwrap();
        let paths = paths(&dir);
        let leftover = paths.build_root.join("everest-1.3.0-a1b2c3d-42");
        fs::create_dir_all(&leftover).unwrap();

        let runtime = SandboxRuntime::new();
        let index = index("1.3.0");
        let orchestrator = InstallOrchestrator::new(&runtime, &index, paths.clone());

        let first = orchestrator.unused_scratch_dir(&release("1.3.0"), 42);
        assert_eq!(first, paths.build_root.join("everest-1.3.0-a1b2c3d-42-1"));

        fs::create_dir_all(&first).unwrap();
        let second = orchestrator.unused_scratch_dir(&release("1.3.0"), 42);
        assert_eq!(second, paths.build_root.join("everest-1.3.0-a1b2c3d-42-2"));

        let fresh = orchestrator.unused_scratch_dir(&release("1.3.0"), 43);
        assert_eq!(fresh, paths.build_root.join("everest-1.3.0-a1b2c3d-43"));
    }

    #[tokio::test]
    async fn test_installer_falls_back_to_dotnet_host() {
        let dir = tempdir().unwrap();
        let paths = paths(&dir);
        fs::create_dir_all(&paths.game_tree).unwrap();
        fs::write(paths.game_tree.join("MiniInstaller.dll"), "mi").unwrap();

        let runtime = SandboxRuntime::new().with_programs(&["dotnet"]);
        let index = index("1.3.0");
        let orchestrator = InstallOrchestrator::new(&runtime, &index, paths.clone())
            .with_platform(Platform::Linux);

        let invocation = orchestrator.installer_invocation().unwrap();
        assert_eq!(invocation.to_string(), "dotnet MiniInstaller.dll");
        assert_eq!(invocation.cwd.as_deref(), Some(Path::new(&paths.game_tree)));
    }

    #[tokio::test]
    async fn test_no_installer_is_tooling_missing() {
        let dir = tempdir().unwrap();
        let paths = paths(&dir);

        let runtime = SandboxRuntime::new().with_programs(&["dotnet", "mono"]);
        let index = index("1.3.0");
        let orchestrator = InstallOrchestrator::new(&runtime, &index, paths)
            .with_platform(Platform::Windows);

        let err = orchestrator.installer_invocation().unwrap_err();
        assert_eq!(
            err.downcast_ref::<EverlayError>(),
            Some(&EverlayError::ToolingMissing(vec!["MiniInstaller".into()]))
        );
    }
}
