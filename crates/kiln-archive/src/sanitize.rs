use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Resolve an archive entry name to a path relative to the install root.
///
/// Returns `Ok(None)` for names that resolve to the root itself (`./`).
/// Absolute names and names climbing above the root are rejected.
pub fn entry_path(entry: &Path) -> Result<Option<PathBuf>> {
    let relative = normalize(entry).ok_or_else(|| Error::PathEscape {
        entry: entry.to_path_buf(),
    })?;
    Ok((!relative.as_os_str().is_empty()).then_some(relative))
}

/// Check that a symlink at `link` (relative to the root) pointing at
/// `target` stays inside the root.
pub fn symlink_target(link: &Path, target: &Path) -> Result<()> {
    let base = link.parent().unwrap_or(Path::new(""));
    match normalize(&base.join(target)) {
        Some(resolved) if !resolved.as_os_str().is_empty() && !target.is_absolute() => Ok(()),
        _ => Err(Error::PathEscape {
            entry: link.to_path_buf(),
        }),
    }
}

/// Lexically normalize a relative path. `None` if it is absolute or climbs
/// above its starting point.
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => result.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(result)
}
