use std::path::{Path, PathBuf};

/// Resolve the board config file.
///
/// Priority:
/// 1. An absolute path, or a relative one that exists from `cwd`
/// 2. Walk upward from `cwd` looking for a file with the same relative path
/// 3. Fall back to `cwd/<path>` (where `board init` will create it)
pub fn resolve_config(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let direct = cwd.join(path);
    if direct.exists() {
        return direct;
    }

    let mut dir = cwd.clone();
    while let Some(parent) = dir.parent() {
        dir = parent.to_path_buf();
        let candidate = dir.join(path);
        if candidate.is_file() {
            return candidate;
        }
    }

    direct
}

/// Directory that relative paths inside the config resolve against.
pub fn config_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
