//! Fetching, building and installing the Everest mod loader.
//!
//! The lifecycle is driven by [`InstallOrchestrator`]; this module holds the
//! pieces it is configured with: where things live in the framework's source
//! tree ([`FrameworkLayout`]) and which build toolchain is available
//! ([`Toolchain`]).

pub mod orchestrator;
pub mod patch;
pub mod platform;
pub mod version;

use std::path::{Path, PathBuf};

use crate::runtime::{Invocation, Runtime};

pub use orchestrator::{InstallOrchestrator, InstallPaths, Outcome};
pub use platform::Platform;
pub use version::{VersionStore, is_newer};

/// Name of the optional user patch applied on top of every build.
pub const USER_PATCH_FILE_NAME: &str = "everest.patch";

/// Locations inside a checked-out framework source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkLayout {
    /// Source file declaring `VersionString`.
    pub version_file: PathBuf,
    /// Build output directories, copied into the game tree in order.
    pub artifact_dirs: Vec<PathBuf>,
}

impl Default for FrameworkLayout {
    fn default() -> Self {
        Self {
            version_file: PathBuf::from("Celeste.Mod.mm/Mod/Everest/Everest.cs"),
            artifact_dirs: vec![
                PathBuf::from("Celeste.Mod.mm/bin/Release/net7.0"),
                PathBuf::from("MiniInstaller/bin/Release/net7.0"),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toolchain {
    Dotnet,
    MsBuild,
}

impl Toolchain {
    /// First toolchain found on `PATH`, `dotnet` preferred.
    pub fn detect<R: Runtime>(runtime: &R) -> Option<Self> {
        [Toolchain::Dotnet, Toolchain::MsBuild]
            .into_iter()
            .find(|t| runtime.find_program(t.program()).is_some())
    }

    pub fn program(self) -> &'static str {
        match self {
            Toolchain::Dotnet => "dotnet",
            Toolchain::MsBuild => "msbuild",
        }
    }

    /// Release build of the solution in `source_dir`.
    pub fn build(self, source_dir: &Path) -> Invocation {
        let invocation = Invocation::new(self.program()).current_dir(source_dir);
        match self {
            Toolchain::Dotnet => invocation.args(["build", "--configuration", "Release"]),
            Toolchain::MsBuild => invocation.args(["/restore", "/p:Configuration=Release"]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;

    #[test]
    fn test_toolchain_prefers_dotnet() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_find_program()
            .with(eq("dotnet"))
            .returning(|_| Some(PathBuf::from("/usr/bin/dotnet")));

        assert_eq!(Toolchain::detect(&runtime), Some(Toolchain::Dotnet));
    }

    #[test]
    fn test_toolchain_falls_back_to_msbuild() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_find_program()
            .with(eq("dotnet"))
            .returning(|_| None);
        runtime
            .expect_find_program()
            .with(eq("msbuild"))
            .returning(|_| Some(PathBuf::from("/usr/bin/msbuild")));

        assert_eq!(Toolchain::detect(&runtime), Some(Toolchain::MsBuild));

        let build = Toolchain::MsBuild.build(Path::new("/build/everest"));
        assert_eq!(build.to_string(), "msbuild /restore /p:Configuration=Release");
        assert_eq!(build.cwd.as_deref(), Some(Path::new("/build/everest")));
    }

    #[test]
    fn test_no_toolchain() {
        let mut runtime = MockRuntime::new();
        runtime.expect_find_program().returning(|_| None);
        assert_eq!(Toolchain::detect(&runtime), None);
    }
}
