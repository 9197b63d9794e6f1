//! Marking a local build in the framework's version source.

use regex::Regex;
use std::sync::OnceLock;

fn version_string_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^(?P<head>.*\bVersionString\s*=\s*)"[^"]*""#).expect("valid regex")
    })
}

/// The version string a local build reports: `<version>-local+<short rev>`.
pub fn local_version_string(version: &str, short_revision: &str) -> String {
    format!("{}-local+{}", version, short_revision)
}

/// Replace the literal assigned to `VersionString` with `stamp`.
///
/// Returns `None` when the source has no such declaration. Only the first
/// declaration is rewritten.
pub fn stamp_version(source: &str, stamp: &str) -> Option<String> {
    let re = version_string_line();
    if !re.is_match(source) {
        return None;
    }
    let replaced = re.replacen(source, 1, |caps: &regex::Captures| {
        format!("{}\"{}\"", &caps["head"], stamp)
    });
    Some(replaced.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVEREST_CS: &str = r#"namespace Celeste.Mod {
    public static partial class Everest {
        public readonly static string VersionString = "0.0.0-dev";
        public static string VersionTag;
    }
}
"#;

    #[test]
    fn test_stamp_version_rewrites_literal() {
        let stamp = local_version_string("stable-1.4465.0", "a1b2c3d");
        let patched = stamp_version(EVEREST_CS, &stamp).unwrap();

        assert!(patched.contains(
            r#"public readonly static string VersionString = "stable-1.4465.0-local+a1b2c3d";"#
        ));
        assert!(!patched.contains("0.0.0-dev"));
        assert!(patched.contains("public static string VersionTag;"));
    }

    #[test]
    fn test_stamp_version_missing_marker() {
        assert_eq!(stamp_version("class Everest {}", "1.0-local+abc"), None);
        // Not an assignment of the declaration we look for
        assert_eq!(
            stamp_version("string MyVersionString = \"x\";", "1.0-local+abc"),
            None
        );
    }

    #[test]
    fn test_stamp_version_is_repeatable() {
        let once = stamp_version(EVEREST_CS, "1.0-local+aaaaaaa").unwrap();
        let twice = stamp_version(&once, "1.1-local+bbbbbbb").unwrap();
        assert!(twice.contains("\"1.1-local+bbbbbbb\""));
        assert!(!twice.contains("aaaaaaa"));
    }
}
