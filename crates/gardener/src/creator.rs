//! Seed scaffolding
//!
//! Writes new timestamped seed files from templates.

use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tinytemplate::{format_unescaped, TinyTemplate};

use crate::error::{GardenerError, GardenerResult};
use crate::locator::SeedLocator;
use crate::naming;
use crate::registry::SeedRegistry;

const SQL_STUB: &str = r#"-- Seed: {class}

-- up


-- down

"#;

const RUST_STUB: &str = r#"use async_trait::async_trait;
use gardener::\{GardenerResult, Seed, SeedContext};

#[derive(Debug, Default)]
pub struct {class};

#[async_trait]
impl Seed for {class} \{
    async fn up(&self, _ctx: &mut SeedContext) -> GardenerResult<()> \{
        Ok(())
    }

    async fn down(&self, _ctx: &mut SeedContext) -> GardenerResult<()> \{
        Ok(())
    }
}

// Register in the host binary:
// SeedRegistry::new().register::<{class}>("{name}")
"#;

/// Kind of seed file to scaffold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SeedKind {
    #[default]
    Sql,
    Rust,
}

impl SeedKind {
    pub fn extension(&self) -> &'static str {
        match self {
            SeedKind::Sql => "sql",
            SeedKind::Rust => "rs",
        }
    }

    fn stub(&self) -> &'static str {
        match self {
            SeedKind::Sql => SQL_STUB,
            SeedKind::Rust => RUST_STUB,
        }
    }
}

#[derive(Serialize)]
struct StubContext<'a> {
    name: &'a str,
    class: &'a str,
}

type CreateHook = Box<dyn Fn(&str, &Path) + Send + Sync>;

/// Creates seed files
pub struct SeedCreator {
    registry: Arc<SeedRegistry>,
    locator: SeedLocator,
    hooks: Vec<CreateHook>,
}

impl SeedCreator {
    pub fn new(registry: Arc<SeedRegistry>) -> Self {
        Self {
            registry,
            locator: SeedLocator::new(),
            hooks: Vec::new(),
        }
    }

    /// Register a callback fired with the seed name and path after each create
    pub fn after_create<F>(&mut self, hook: F)
    where
        F: Fn(&str, &Path) + Send + Sync + 'static,
    {
        self.hooks.push(Box::new(hook));
    }

    /// Create `<root>[/<env>]/<YYYY_MM_DD_HHMMSS>_<name>.<ext>`
    ///
    /// Nothing is written when the class name is already taken, either by a
    /// registered seed or by a file in `root` or any environment directory
    /// directly under it.
    pub fn create(
        &self,
        name: &str,
        root: &Path,
        env: Option<&str>,
        kind: SeedKind,
    ) -> GardenerResult<PathBuf> {
        if !naming::is_valid_seed_name(name) {
            return Err(GardenerError::configuration(format!(
                "Invalid seed name '{}': use letters, digits and underscores, starting with a letter",
                name
            )));
        }

        let class = naming::studly(name);
        self.ensure_seed_doesnt_already_exist(&class, root)?;

        let dir = match env.map(str::trim).filter(|env| !env.is_empty()) {
            Some(env) => root.join(env),
            None => root.to_path_buf(),
        };
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!(
            "{}_{}.{}",
            naming::date_prefix(),
            name,
            kind.extension()
        ));
        fs::write(&path, self.populate_stub(kind, name, &class)?)?;

        tracing::info!(seed = name, path = %path.display(), "created seed");

        for hook in &self.hooks {
            hook(name, &path);
        }

        Ok(path)
    }

    fn ensure_seed_doesnt_already_exist(&self, class: &str, root: &Path) -> GardenerResult<()> {
        if self.registry.contains(class) {
            return Err(GardenerError::duplicate(class));
        }

        let mut dirs = vec![root.to_path_buf()];
        if root.is_dir() {
            for entry in fs::read_dir(root)? {
                let path = entry?.path();
                if path.is_dir() {
                    dirs.push(path);
                }
            }
        }

        let existing = self.locator.discover(&dirs, None)?;
        if existing.values().any(|file| file.class_name() == class) {
            return Err(GardenerError::duplicate(class));
        }

        Ok(())
    }

    fn populate_stub(&self, kind: SeedKind, name: &str, class: &str) -> GardenerResult<String> {
        let mut tt = TinyTemplate::new();
        tt.set_default_formatter(&format_unescaped);
        tt.add_template("seed", kind.stub())?;

        Ok(tt.render("seed", &StubContext { name, class })?)
    }
}

impl fmt::Debug for SeedCreator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedCreator")
            .field("registry", &self.registry)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GardenerResult;
    use crate::seed::{Seed, SeedContext};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct AdminUser;

    #[async_trait]
    impl Seed for AdminUser {
        async fn up(&self, _ctx: &mut SeedContext) -> GardenerResult<()> {
            Ok(())
        }
    }

    fn file_count(dir: &Path) -> usize {
        fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
    }

    #[test]
    fn test_create_sql_seed() {
        let dir = TempDir::new().unwrap();
        let seeds = dir.path().join("database/gardener");
        let creator = SeedCreator::new(Arc::new(SeedRegistry::new()));

        let path = creator.create("default_roles", &seeds, None, SeedKind::Sql).unwrap();
        let file_name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(file_name.ends_with("_default_roles.sql"));
        assert!(naming::is_conventional(file_name.trim_end_matches(".sql")));

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("-- Seed: DefaultRoles"));
        assert!(content.contains("-- up"));
        assert!(content.contains("-- down"));
    }

    #[test]
    fn test_create_rust_seed_renders_braces() {
        let dir = TempDir::new().unwrap();
        let creator = SeedCreator::new(Arc::new(SeedRegistry::new()));

        let path = creator.create("admin_user", dir.path(), None, SeedKind::Rust).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("pub struct AdminUser;"));
        assert!(content.contains("impl Seed for AdminUser {"));
        assert!(content.contains("use gardener::{GardenerResult, Seed, SeedContext};"));
        assert!(content.contains(".register::<AdminUser>(\"admin_user\")"));
    }

    #[test]
    fn test_duplicate_file_class_writes_nothing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("2023_05_01_120000_admin_user.sql"), "-- up\n").unwrap();
        let creator = SeedCreator::new(Arc::new(SeedRegistry::new()));

        let err = creator.create("admin_user", dir.path(), None, SeedKind::Sql).unwrap_err();
        assert_eq!(err.to_string(), "A AdminUser seed already exists.");
        assert_eq!(file_count(dir.path()), 1);
    }

    #[test]
    fn test_duplicate_class_across_environments() {
        let dir = TempDir::new().unwrap();
        let creator = SeedCreator::new(Arc::new(SeedRegistry::new()));

        let path = creator
            .create("default_roles", dir.path(), None, SeedKind::Sql)
            .unwrap();
        assert_eq!(path.parent(), Some(dir.path()));

        let err = creator
            .create("default_roles", dir.path(), Some("staging"), SeedKind::Sql)
            .unwrap_err();
        assert_eq!(err.to_string(), "A DefaultRoles seed already exists.");
        assert!(!dir.path().join("staging").exists());

        let staged = creator
            .create("countries", dir.path(), Some("staging"), SeedKind::Sql)
            .unwrap();
        assert_eq!(staged.parent(), Some(dir.path().join("staging").as_path()));

        let err = creator
            .create("countries", dir.path(), None, SeedKind::Rust)
            .unwrap_err();
        assert!(matches!(err, GardenerError::DuplicateDefinition { .. }));
        assert_eq!(file_count(dir.path()), 2);
    }

    #[test]
    fn test_duplicate_registered_class_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let seeds = dir.path().join("gardener");
        let registry = SeedRegistry::new().register::<AdminUser>("AdminUser");
        let creator = SeedCreator::new(Arc::new(registry));

        let err = creator.create("admin_user", &seeds, None, SeedKind::Rust).unwrap_err();
        assert!(matches!(err, GardenerError::DuplicateDefinition { .. }));
        assert!(!seeds.exists());
    }

    #[test]
    fn test_invalid_name_is_rejected() {
        let dir = TempDir::new().unwrap();
        let creator = SeedCreator::new(Arc::new(SeedRegistry::new()));
        assert!(creator.create("../escape", dir.path(), None, SeedKind::Sql).is_err());
        assert_eq!(file_count(dir.path()), 0);
    }

    #[test]
    fn test_after_create_hooks_fire() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut creator = SeedCreator::new(Arc::new(SeedRegistry::new()));

        let counter = Arc::clone(&calls);
        creator.after_create(move |name, path| {
            assert_eq!(name, "countries");
            assert!(path.exists());
            counter.fetch_add(1, Ordering::SeqCst);
        });

        creator.create("countries", dir.path(), None, SeedKind::Sql).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
