//! Seed file discovery
//!
//! Lists candidate seed files under one or more search roots. With an
//! environment set only `<root>/<env>/*` is considered, otherwise `<root>/*`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GardenerError, GardenerResult};
use crate::naming;

/// A discovered seed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedFile {
    pub identifier: String,
    pub path: PathBuf,
}

impl SeedFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let identifier = naming::identifier_from_path(&path)?;
        Some(Self { identifier, path })
    }

    /// Class name of the unit behind this file
    pub fn class_name(&self) -> String {
        naming::class_name(&self.identifier)
    }

    pub fn is_sql(&self) -> bool {
        self.path.extension().map_or(false, |ext| ext == "sql")
    }
}

/// Discovered seeds keyed and ordered by identifier
pub type SeedFiles = BTreeMap<String, SeedFile>;

#[derive(Debug, Clone, Copy, Default)]
pub struct SeedLocator;

impl SeedLocator {
    pub fn new() -> Self {
        Self
    }

    /// Discover seed files under `paths`, optionally inside the `env` subdirectory
    ///
    /// A missing directory contributes nothing. When two roots hold the same
    /// identifier the later root wins and a warning is logged.
    pub fn discover<P: AsRef<Path>>(
        &self,
        paths: &[P],
        env: Option<&str>,
    ) -> GardenerResult<SeedFiles> {
        let mut files = SeedFiles::new();

        for root in paths {
            let dir = match env {
                Some(env) => root.as_ref().join(env),
                None => root.as_ref().to_path_buf(),
            };

            for file in self.list_dir(&dir)? {
                if !naming::is_conventional(&file.identifier) {
                    tracing::warn!(
                        seed = %file.identifier,
                        "seed file name does not start with a YYYY_MM_DD_HHMMSS timestamp"
                    );
                }

                if let Some(previous) = files.get(&file.identifier) {
                    tracing::warn!(
                        seed = %file.identifier,
                        first = %previous.path.display(),
                        second = %file.path.display(),
                        "duplicate seed identifier, using the later file"
                    );
                }
                files.insert(file.identifier.clone(), file);
            }
        }

        Ok(files)
    }

    /// Resolve a single seed file; a path without extension tries each seed extension
    pub fn locate(&self, path: &Path) -> GardenerResult<SeedFile> {
        let candidates: Vec<PathBuf> = if path.extension().is_some() {
            vec![path.to_path_buf()]
        } else {
            naming::SEED_EXTENSIONS
                .iter()
                .map(|ext| path.with_extension(ext))
                .collect()
        };

        candidates
            .into_iter()
            .filter(|candidate| candidate.is_file())
            .find_map(SeedFile::from_path)
            .ok_or_else(|| GardenerError::FileNotFound {
                path: path.to_path_buf(),
            })
    }

    fn list_dir(&self, dir: &Path) -> GardenerResult<Vec<SeedFile>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if let Some(file) = SeedFile::from_path(path) {
                files.push(file);
            }
        }

        files.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "-- up\n").unwrap();
    }

    #[test]
    fn test_discover_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("2024_01_02_000000_b.sql"));
        touch(&dir.path().join("2024_01_01_000000_a.rs"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join("staging/2024_01_03_000000_c.sql"));

        let files = SeedLocator::new().discover(&[dir.path()], None).unwrap();
        let ids: Vec<&String> = files.keys().collect();
        assert_eq!(ids, vec!["2024_01_01_000000_a", "2024_01_02_000000_b"]);
        assert_eq!(files["2024_01_01_000000_a"].class_name(), "A");
        assert!(files["2024_01_02_000000_b"].is_sql());
    }

    #[test]
    fn test_env_subdirectory_excludes_base_and_siblings() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("2024_01_01_000000_base.sql"));
        touch(&dir.path().join("staging/2024_01_02_000000_staging_only.sql"));
        touch(&dir.path().join("production/2024_01_03_000000_prod_only.sql"));

        let files = SeedLocator::new()
            .discover(&[dir.path()], Some("staging"))
            .unwrap();
        assert_eq!(
            files.keys().collect::<Vec<_>>(),
            vec!["2024_01_02_000000_staging_only"]
        );
    }

    #[test]
    fn test_missing_directories_are_empty() {
        let dir = TempDir::new().unwrap();
        let files = SeedLocator::new()
            .discover(&[dir.path().join("nope")], Some("testing"))
            .unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_later_root_wins_on_duplicates() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        touch(&first.path().join("2024_01_01_000000_a.sql"));
        touch(&second.path().join("2024_01_01_000000_a.sql"));
        touch(&second.path().join("2024_01_02_000000_b.sql"));

        let files = SeedLocator::new()
            .discover(&[first.path(), second.path()], None)
            .unwrap();
        assert_eq!(files.len(), 2);
        assert!(files["2024_01_01_000000_a"].path.starts_with(second.path()));
    }

    #[test]
    fn test_locate_with_and_without_extension() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("2024_01_01_000000_a.sql"));

        let locator = SeedLocator::new();
        let found = locator
            .locate(&dir.path().join("2024_01_01_000000_a"))
            .unwrap();
        assert_eq!(found.identifier, "2024_01_01_000000_a");

        let found = locator
            .locate(&dir.path().join("2024_01_01_000000_a.sql"))
            .unwrap();
        assert_eq!(found.identifier, "2024_01_01_000000_a");

        let err = locator
            .locate(&dir.path().join("2024_01_09_000000_missing"))
            .unwrap_err();
        assert!(matches!(err, GardenerError::FileNotFound { .. }));
    }
}
