//! Seed registry
//!
//! Maps class names (the StudlyCase slug of a seed identifier) to factories
//! producing executable units. Applications register their Rust seeds at
//! startup; the migrator looks them up by the name derived from each file.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::naming;
use crate::seed::Seed;

/// Builds a fresh seed instance
pub type SeedFactory = Arc<dyn Fn() -> Box<dyn Seed> + Send + Sync>;

#[derive(Clone, Default)]
pub struct SeedRegistry {
    factories: BTreeMap<String, SeedFactory>,
}

impl SeedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a seed type under `name`
    ///
    /// `name` may be the class name (`DefaultRoles`) or the slug
    /// (`default_roles`); both normalise to the same key.
    pub fn register<S>(self, name: &str) -> Self
    where
        S: Seed + Default + 'static,
    {
        self.register_with(name, || Box::new(S::default()) as Box<dyn Seed>)
    }

    /// Register a factory under `name`
    pub fn register_with<F>(mut self, name: &str, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Seed> + Send + Sync + 'static,
    {
        let class = naming::studly(name);
        if self.factories.contains_key(&class) {
            tracing::warn!(class = %class, "seed registered twice, keeping the last registration");
        }
        self.factories.insert(class, Arc::new(factory));
        self
    }

    pub fn contains(&self, class: &str) -> bool {
        self.factories.contains_key(class)
    }

    /// Instantiate the seed registered under `class`
    pub fn instantiate(&self, class: &str) -> Option<Box<dyn Seed>> {
        self.factories.get(class).map(|factory| factory())
    }

    /// Registered class names, sorted
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for SeedRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedRegistry")
            .field("classes", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GardenerResult;
    use crate::seed::SeedContext;
    use async_trait::async_trait;

    #[derive(Default)]
    struct DefaultRoles;

    #[async_trait]
    impl Seed for DefaultRoles {
        async fn up(&self, _ctx: &mut SeedContext) -> GardenerResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_register_normalises_names() {
        let registry = SeedRegistry::new()
            .register::<DefaultRoles>("default_roles")
            .register::<DefaultRoles>("AdminUser");

        assert!(registry.contains("DefaultRoles"));
        assert!(registry.contains("AdminUser"));
        assert!(!registry.contains("default_roles"));
        assert_eq!(registry.classes().collect::<Vec<_>>(), vec!["AdminUser", "DefaultRoles"]);
    }

    #[test]
    fn test_instantiate() {
        let registry = SeedRegistry::new().register::<DefaultRoles>("DefaultRoles");
        assert!(registry.instantiate("DefaultRoles").is_some());
        assert!(registry.instantiate("Missing").is_none());
        assert_eq!(registry.len(), 1);
        assert!(SeedRegistry::new().is_empty());
    }
}
