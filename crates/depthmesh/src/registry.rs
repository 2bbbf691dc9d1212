//! Engine registry.

use std::collections::HashMap;

use depthmesh_core::{DepthmeshError, Result};

use crate::engine::Engine;

/// Registry of available engines, keyed by engine name.
///
/// Registration order is kept so listings are stable; the first registered
/// engine is the default unless another one is chosen.
#[derive(Default)]
pub struct EngineRegistry {
    engines: HashMap<String, Box<dyn Engine>>,
    order: Vec<String>,
    default: Option<String>,
}

impl EngineRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an engine.
    ///
    /// Returns an error if an engine with the same name already exists.
    pub fn register(&mut self, engine: Box<dyn Engine>) -> Result<()> {
        let name = engine.name().to_string();
        if self.engines.contains_key(&name) {
            return Err(DepthmeshError::EngineExists(name));
        }
        log::info!("registered engine '{name}'");
        self.order.push(name.clone());
        self.engines.insert(name, engine);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, engine: Box<dyn Engine>) -> Result<Self> {
        self.register(engine)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&dyn Engine> {
        self.engines.get(name).map(|e| e.as_ref())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Box<dyn Engine>> {
        self.engines.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.engines.contains_key(name)
    }

    /// Engine names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Chooses the default engine.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.contains(name) {
            return Err(DepthmeshError::EngineNotFound(name.to_string()));
        }
        self.default = Some(name.to_string());
        Ok(())
    }

    /// The chosen default engine, or the first registered one.
    pub fn default_engine(&self) -> Option<&str> {
        self.default
            .as_deref()
            .or_else(|| self.order.first().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depthmesh_core::{OptionSet, RawModelOutput, RgbImage};

    struct Named(&'static str);

    impl Engine for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn process(&mut self, _: &RgbImage, _: &OptionSet) -> Result<RawModelOutput> {
            Ok(RawModelOutput::Unrecognized)
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = EngineRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.default_engine(), None);

        registry.register(Box::new(Named("b"))).unwrap();
        registry.register(Box::new(Named("a"))).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("a"));
        assert_eq!(registry.get("b").map(|e| e.name()), Some("b"));
        assert!(registry.get("c").is_none());
        assert_eq!(registry.names().collect::<Vec<_>>(), ["b", "a"]);
        assert_eq!(registry.default_engine(), Some("b"));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = EngineRegistry::new().with(Box::new(Named("x"))).unwrap();
        assert!(matches!(
            registry.register(Box::new(Named("x"))),
            Err(DepthmeshError::EngineExists(name)) if name == "x"
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_set_default() {
        let mut registry = EngineRegistry::new()
            .with(Box::new(Named("x")))
            .unwrap()
            .with(Box::new(Named("y")))
            .unwrap();
        registry.set_default("y").unwrap();
        assert_eq!(registry.default_engine(), Some("y"));
        assert!(matches!(
            registry.set_default("z"),
            Err(DepthmeshError::EngineNotFound(_))
        ));
    }
}
