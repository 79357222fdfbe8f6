//! Seed migrator
//!
//! Diffs the seed files found on disk against the ledger and runs or reverts
//! the difference, one seed at a time. No transaction wraps a batch: when seed
//! N fails, seeds 1..N-1 stay logged and the error is returned.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::GardenerConfig;
use crate::connection::ConnectionResolver;
use crate::error::{GardenerError, GardenerResult};
use crate::locator::{SeedFile, SeedFiles, SeedLocator};
use crate::naming;
use crate::registry::SeedRegistry;
use crate::repository::{GardenerRepository, SeedRecord};
use crate::seed::{Seed, SeedContext};
use crate::sql_seed::SqlSeed;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Capture statements instead of executing and logging
    pub pretend: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollbackOptions {
    pub pretend: bool,
    /// Roll back this many most recent seeds; 0 means the last batch
    pub step: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    Info,
    Seeding,
    Seeded,
    RollingBack,
    RolledBack,
    Pretend,
}

/// A line of user-facing output produced by an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub kind: NoteKind,
    pub message: String,
}

impl Note {
    pub fn new(kind: NoteKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoteKind::Info, message)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NoteKind::Seeding => write!(f, "Seeding: {}", self.message),
            NoteKind::Seeded => write!(f, "Seeded: {}", self.message),
            NoteKind::RollingBack => write!(f, "Rolling back: {}", self.message),
            NoteKind::RolledBack => write!(f, "Rolled back: {}", self.message),
            NoteKind::Info | NoteKind::Pretend => f.write_str(&self.message),
        }
    }
}

/// Ledger state of one seed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedStatus {
    pub seed: String,
    pub ran: bool,
    pub batch: Option<i32>,
    /// Whether a file for this seed was found on disk
    pub present: bool,
}

#[derive(Clone, Copy)]
enum Direction {
    Up,
    Down,
}

/// Runs and reverts seeds against the ledger
pub struct SeedMigrator {
    repository: GardenerRepository,
    registry: Arc<SeedRegistry>,
    locator: SeedLocator,
    paths: Vec<PathBuf>,
    notes: Vec<Note>,
}

impl SeedMigrator {
    pub fn new(repository: GardenerRepository, registry: Arc<SeedRegistry>) -> Self {
        Self {
            repository,
            registry,
            locator: SeedLocator::new(),
            paths: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Build a migrator over the configured ledger table and connections
    pub fn from_config(config: &GardenerConfig, registry: Arc<SeedRegistry>) -> Self {
        let resolver = ConnectionResolver::from_config(config);
        let repository = GardenerRepository::new(
            resolver,
            config.table.clone(),
            config.environment.clone(),
        );
        Self::new(repository, registry)
    }

    /// Scope the ledger and discovery to an environment
    pub fn set_env(&mut self, env: Option<String>) {
        self.repository.set_env(env);
    }

    /// Scope the ledger and seed execution to a named connection
    pub fn set_connection(&mut self, name: Option<String>) {
        self.repository.set_source(name);
    }

    /// Register an extra search path, appended to those passed per call
    pub fn path(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn repository(&self) -> &GardenerRepository {
        &self.repository
    }

    pub fn registry(&self) -> &SeedRegistry {
        &self.registry
    }

    pub async fn repository_exists(&self) -> GardenerResult<bool> {
        self.repository.repository_exists().await
    }

    /// Notes emitted by the last operation
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Run every outstanding seed under `paths` in a new batch
    ///
    /// Returns the identifiers that ran (or would run, when pretending).
    pub async fn run<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
        options: RunOptions,
    ) -> GardenerResult<Vec<String>> {
        self.notes.clear();

        let files = self.discover(paths)?;
        let ran: HashSet<String> = self.repository.get_ran().await?.into_iter().collect();

        let pending: Vec<SeedFile> = files
            .into_values()
            .filter(|file| !ran.contains(&file.identifier))
            .collect();

        self.run_pending(pending, options).await
    }

    /// Run exactly one seed file, skipping it when already logged
    pub async fn run_single_file(
        &mut self,
        path: &Path,
        options: RunOptions,
    ) -> GardenerResult<Vec<String>> {
        self.notes.clear();

        let file = self.locator.locate(path)?;
        let ran = self.repository.get_ran().await?;
        if ran.contains(&file.identifier) {
            self.note(Note::info(format!(
                "Seed {} has already been run.",
                file.identifier
            )));
            return Ok(Vec::new());
        }

        self.run_pending(vec![file], options).await
    }

    /// Roll back the last batch, or the `step` most recent seeds
    pub async fn rollback<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
        options: RollbackOptions,
    ) -> GardenerResult<Vec<String>> {
        self.notes.clear();

        let records = if options.step > 0 {
            self.repository.get_migrations(options.step).await?
        } else {
            self.repository.get_last().await?
        };

        if records.is_empty() {
            self.note(Note::info("Nothing to rollback."));
            return Ok(Vec::new());
        }

        let files = self.discover(paths)?;
        let identifiers: Vec<String> = records.into_iter().map(|record| record.seed).collect();
        self.rollback_seeds(identifiers, &files, options.pretend).await
    }

    /// Roll back every seed of the environment, newest identifier first
    pub async fn reset<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
        pretend: bool,
    ) -> GardenerResult<Vec<String>> {
        self.notes.clear();

        let mut identifiers = self.repository.get_ran().await?;
        if identifiers.is_empty() {
            self.note(Note::info("Nothing to rollback."));
            return Ok(Vec::new());
        }
        identifiers.sort_by(|a, b| b.cmp(a));

        let files = self.discover(paths)?;
        self.rollback_seeds(identifiers, &files, pretend).await
    }

    /// Every seed known on disk or in the ledger, by identifier
    pub async fn status<P: AsRef<Path>>(&self, paths: &[P]) -> GardenerResult<Vec<SeedStatus>> {
        let files = self.discover(paths)?;
        let records: Vec<SeedRecord> = self.repository.get_records().await?;

        let mut statuses: BTreeMap<String, SeedStatus> = files
            .into_keys()
            .map(|seed| {
                let status = SeedStatus {
                    seed: seed.clone(),
                    ran: false,
                    batch: None,
                    present: true,
                };
                (seed, status)
            })
            .collect();

        for record in records {
            let status = statuses
                .entry(record.seed.clone())
                .or_insert_with(|| SeedStatus {
                    seed: record.seed.clone(),
                    ran: false,
                    batch: None,
                    present: false,
                });
            status.ran = true;
            status.batch = Some(record.batch);
        }

        Ok(statuses.into_values().collect())
    }

    /// Map an identifier to an executable seed
    ///
    /// A registered Rust seed wins over a `.sql` file of the same name.
    pub fn resolve(
        &self,
        identifier: &str,
        file: Option<&SeedFile>,
    ) -> GardenerResult<Box<dyn Seed>> {
        let class = naming::class_name(identifier);

        if let Some(seed) = self.registry.instantiate(&class) {
            return Ok(seed);
        }

        match file {
            Some(file) if file.is_sql() => Ok(Box::new(SqlSeed::load(&file.path)?)),
            _ => Err(GardenerError::resolution(identifier, class)),
        }
    }

    fn discover<P: AsRef<Path>>(&self, paths: &[P]) -> GardenerResult<SeedFiles> {
        let mut search: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
        search.extend(self.paths.iter().cloned());
        self.locator.discover(&search, self.repository.env())
    }

    async fn run_pending(
        &mut self,
        pending: Vec<SeedFile>,
        options: RunOptions,
    ) -> GardenerResult<Vec<String>> {
        if pending.is_empty() {
            self.note(Note::info("Nothing to seed."));
            return Ok(Vec::new());
        }

        let batch = self.repository.get_next_batch_number().await?;
        tracing::info!(
            env = self.repository.effective_env(),
            batch,
            count = pending.len(),
            "running seeds"
        );

        let mut ran = Vec::with_capacity(pending.len());
        for file in pending {
            self.run_up(&file, batch, options.pretend).await?;
            ran.push(file.identifier);
        }
        Ok(ran)
    }

    async fn run_up(&mut self, file: &SeedFile, batch: i32, pretend: bool) -> GardenerResult<()> {
        let name = file.identifier.as_str();
        let seed = self.resolve(name, Some(file))?;

        if pretend {
            return self.pretend_to_run(name, seed.as_ref(), Direction::Up).await;
        }

        self.note(Note::new(NoteKind::Seeding, name));
        tracing::info!(seed = name, batch, "seeding");

        self.run_in_transaction(name, seed.as_ref(), Direction::Up)
            .await?;
        self.repository.log(name, batch).await?;
        self.note(Note::new(NoteKind::Seeded, name));
        Ok(())
    }

    async fn rollback_seeds(
        &mut self,
        identifiers: Vec<String>,
        files: &SeedFiles,
        pretend: bool,
    ) -> GardenerResult<Vec<String>> {
        tracing::info!(
            env = self.repository.effective_env(),
            count = identifiers.len(),
            "rolling back seeds"
        );

        let mut rolled_back = Vec::with_capacity(identifiers.len());
        for identifier in identifiers {
            self.run_down(&identifier, files.get(&identifier), pretend)
                .await?;
            rolled_back.push(identifier);
        }
        Ok(rolled_back)
    }

    async fn run_down(
        &mut self,
        name: &str,
        file: Option<&SeedFile>,
        pretend: bool,
    ) -> GardenerResult<()> {
        let seed = self.resolve(name, file)?;

        if pretend {
            return self.pretend_to_run(name, seed.as_ref(), Direction::Down).await;
        }

        self.note(Note::new(NoteKind::RollingBack, name));
        tracing::info!(seed = name, "rolling back");

        self.run_in_transaction(name, seed.as_ref(), Direction::Down)
            .await?;
        self.repository.delete(name).await?;
        self.note(Note::new(NoteKind::RolledBack, name));
        Ok(())
    }

    /// Run one direction of a seed on its own transaction
    ///
    /// The transaction commits before the ledger is touched; on failure it
    /// rolls back and the ledger is left as it was.
    async fn run_in_transaction(
        &self,
        name: &str,
        seed: &dyn Seed,
        direction: Direction,
    ) -> GardenerResult<()> {
        let mut ctx = SeedContext::begin(self.repository.connection()?).await?;
        let result = match direction {
            Direction::Up => seed.up(&mut ctx).await,
            Direction::Down => seed.down(&mut ctx).await,
        };

        match result {
            Ok(()) => {
                ctx.commit().await?;
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = ctx.rollback().await {
                    tracing::warn!(seed = name, error = %rollback, "failed to roll back seed");
                }
                Err(GardenerError::execution(name, e))
            }
        }
    }

    async fn pretend_to_run(
        &mut self,
        name: &str,
        seed: &dyn Seed,
        direction: Direction,
    ) -> GardenerResult<()> {
        let mut ctx = SeedContext::pretend(self.repository.connection()?);
        let result = match direction {
            Direction::Up => seed.up(&mut ctx).await,
            Direction::Down => seed.down(&mut ctx).await,
        };
        result.map_err(|e| GardenerError::execution(name, e))?;

        for statement in ctx.into_statements() {
            self.note(Note::new(
                NoteKind::Pretend,
                format!("{}: {}", name, statement),
            ));
        }
        Ok(())
    }

    fn note(&mut self, note: Note) {
        self.notes.push(note);
    }
}

impl fmt::Debug for SeedMigrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedMigrator")
            .field("repository", &self.repository)
            .field("registry", &self.registry)
            .field("paths", &self.paths)
            .finish()
    }
}
