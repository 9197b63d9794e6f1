/// Operating system a framework build is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
}

const LINUX_MARKERS: &[&str] = &["linux"];
const MACOS_MARKERS: &[&str] = &["osx", "macos", "darwin"];
const WINDOWS_MARKERS: &[&str] = &["win", "win32", "win64", "windows"];

impl Platform {
    /// Detect the current platform
    pub fn detect() -> Self {
        #[cfg(target_os = "macos")]
        {
            Platform::MacOs
        }
        #[cfg(target_os = "windows")]
        {
            Platform::Windows
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            Platform::Linux
        }
    }

    fn markers(self) -> &'static [&'static str] {
        match self {
            Platform::Linux => LINUX_MARKERS,
            Platform::MacOs => MACOS_MARKERS,
            Platform::Windows => WINDOWS_MARKERS,
        }
    }

    /// File name of the framework's native installer, if one is shipped.
    pub fn native_installer(self) -> Option<&'static str> {
        match self {
            Platform::Linux => Some("MiniInstaller-linux"),
            Platform::MacOs => Some("MiniInstaller-osx"),
            Platform::Windows => None,
        }
    }

    /// True when `name` is marked for another platform and not for this one.
    ///
    /// Markers are matched against whole tokens of the lowercased name, so
    /// `win-x64` is foreign on Linux while `winmm.dll` is not.
    pub fn is_foreign_artifact(self, name: &str) -> bool {
        let lower = name.to_lowercase();
        let tokens: Vec<&str> = lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        let carries = |markers: &[&str]| tokens.iter().any(|t| markers.contains(t));

        if carries(self.markers()) {
            return false;
        }

        [Platform::Linux, Platform::MacOs, Platform::Windows]
            .into_iter()
            .filter(|other| *other != self)
            .any(|other| carries(other.markers()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_detect() {
        let platform = Platform::detect();

        #[cfg(target_os = "macos")]
        assert_eq!(platform, Platform::MacOs);

        #[cfg(target_os = "linux")]
        assert_eq!(platform, Platform::Linux);

        #[cfg(target_os = "windows")]
        assert_eq!(platform, Platform::Windows);
    }

    #[test]
    fn test_foreign_artifacts_on_linux() {
        let linux = Platform::Linux;

        assert!(linux.is_foreign_artifact("win-x64"));
        assert!(linux.is_foreign_artifact("MiniInstaller-win.exe"));
        assert!(linux.is_foreign_artifact("MiniInstaller-osx"));
        assert!(linux.is_foreign_artifact("libSDL2.macos.dylib"));

        assert!(!linux.is_foreign_artifact("MiniInstaller-linux"));
        assert!(!linux.is_foreign_artifact("Celeste.Mod.mm.dll"));
        assert!(!linux.is_foreign_artifact("winmm.dll"));
        assert!(!linux.is_foreign_artifact("lib-linux-win-shared"));
    }

    #[test]
    fn test_foreign_artifacts_on_other_platforms() {
        assert!(Platform::MacOs.is_foreign_artifact("MiniInstaller-linux"));
        assert!(!Platform::MacOs.is_foreign_artifact("MiniInstaller-osx"));
        assert!(Platform::Windows.is_foreign_artifact("MiniInstaller-osx"));
        assert!(!Platform::Windows.is_foreign_artifact("win-x86"));
    }

    #[test]
    fn test_native_installer() {
        assert_eq!(
            Platform::Linux.native_installer(),
            Some("MiniInstaller-linux")
        );
        assert_eq!(Platform::MacOs.native_installer(), Some("MiniInstaller-osx"));
        assert_eq!(Platform::Windows.native_installer(), None);
    }
}
