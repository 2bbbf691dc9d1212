//! Cache keys for the pipeline's mesh and raw-output caches.

use depthmesh_core::{OptionSchema, OptionSet};

/// Options that change the image an engine sees, and so its output.
pub const INPUT_OPTIONS: [&str; 2] = ["resize_to", "bg_removal"];

/// Identifies one pipeline request: image source, engine and options.
///
/// Options are stored sorted by name with values rendered as text, so equal
/// option sets always produce equal keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    source: String,
    engine: String,
    options: Vec<(String, String)>,
}

impl CacheKey {
    pub fn new(source: impl Into<String>, engine: impl Into<String>, options: &OptionSet) -> Self {
        Self {
            source: source.into(),
            engine: engine.into(),
            options: options
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }

    /// Key for a finished mesh: every option counts.
    pub fn for_mesh(source: &str, engine: &str, options: &OptionSet) -> Self {
        Self::new(source, engine, options)
    }

    /// Key for raw engine output: only the engine's own options and the
    /// input-shaping options count.
    pub fn for_raw(source: &str, engine: &str, options: &OptionSet, schema: &OptionSchema) -> Self {
        let relevant: OptionSet = options
            .iter()
            .filter(|(name, _)| schema.contains(name) || INPUT_OPTIONS.contains(name))
            .map(|(name, value)| (name, value.clone()))
            .collect();
        Self::new(source, engine, &relevant)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    pub fn options(&self) -> &[(String, String)] {
        &self.options
    }
}
