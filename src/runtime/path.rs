//! Lexical path helpers used when deciding which links belong to the mod store.

use std::path::{Component, Path, PathBuf};

/// Normalize a path by processing `.` and `..` components lexically.
/// This does not access the filesystem and does not follow symlinks.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match result.components().next_back() {
                // `..` at the root stays at the root
                Some(Component::RootDir | Component::Prefix(_)) => {}
                Some(Component::Normal(_)) => {
                    result.pop();
                }
                _ => result.push(component),
            },
            _ => result.push(component),
        }
    }
    result
}

/// Returns true if `path` lies inside `dir` (or is `dir`), comparing
/// normalized components rather than string prefixes.
///
/// `/data/mods-old/A` is not under `/data/mods`, and
/// `/data/mods/../secret` is not under `/data/mods` either.
pub fn is_path_under(path: &Path, dir: &Path) -> bool {
    let normalized_path = normalize_path(path);
    let normalized_dir = normalize_path(dir);
    normalized_path.starts_with(&normalized_dir)
}
