use gardener::GardenerConfig;
use std::path::{Path, PathBuf};

/// Resolve `path` against the application root unless it is absolute
pub fn from_base(config: &GardenerConfig, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        config.base_path.join(path)
    }
}

/// Directories to search for seeds
///
/// `--path` values are taken relative to the application root; without any,
/// the configured seeds directory is used.
pub fn seed_paths(config: &GardenerConfig, requested: &[PathBuf]) -> Vec<PathBuf> {
    if requested.is_empty() {
        return vec![config.seeds_path()];
    }

    requested
        .iter()
        .map(|path| from_base(config, path))
        .collect()
}

/// Location of a single seed file given with `--file`
pub fn seed_file(config: &GardenerConfig, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        config.seeds_path().join(file)
    }
}
