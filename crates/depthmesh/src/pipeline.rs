//! The image-to-mesh pipeline.

use std::path::Path;
use std::sync::Arc;

use depthmesh_core::{
    pipeline_schema, BoundedCache, DepthmeshError, GrayImage, OptionSchema, OptionSet,
    RawModelOutput, Reconstruction, Result, RgbImage,
};
use depthmesh_geometry::GeometryBuilder;

use crate::cache::CacheKey;
use crate::config::PipelineConfig;
use crate::engine::Engine;
use crate::preprocess::{apply_resize, ForegroundExtractor, ResizeTarget};
use crate::registry::EngineRegistry;

/// Runs images through preprocessing, an engine and the geometry builder.
///
/// Two caches sit in front of the expensive steps. The mesh cache answers
/// repeated requests outright. The raw-output cache is keyed only by options
/// that change inference, so changing a geometry option such as
/// `quality_filters` rebuilds the mesh without running the engine again.
pub struct Pipeline {
    engines: EngineRegistry,
    builder: GeometryBuilder,
    extractor: Option<Box<dyn ForegroundExtractor>>,
    mesh_cache: BoundedCache<CacheKey, Arc<Reconstruction>>,
    raw_cache: BoundedCache<CacheKey, Arc<RawModelOutput>>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, engines: EngineRegistry) -> Self {
        Self {
            engines,
            builder: GeometryBuilder::new(config.settings),
            extractor: None,
            mesh_cache: BoundedCache::new(config.mesh_cache_capacity),
            raw_cache: BoundedCache::new(config.raw_cache_capacity),
        }
    }

    /// Installs the background-removal model used when `bg_removal` is on.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Box<dyn ForegroundExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn engines(&self) -> &EngineRegistry {
        &self.engines
    }

    pub fn engines_mut(&mut self) -> &mut EngineRegistry {
        &mut self.engines
    }

    pub fn builder(&self) -> &GeometryBuilder {
        &self.builder
    }

    /// Every option an engine accepts: the shared pipeline options plus its own.
    pub fn option_schema(&self, engine_name: &str) -> Result<OptionSchema> {
        let engine = self.engine(engine_name)?;
        Ok(pipeline_schema().merged(&engine.option_schema()))
    }

    /// Processes the image file at `path`.
    pub fn process(
        &mut self,
        path: impl AsRef<Path>,
        engine_name: &str,
        options: &OptionSet,
    ) -> Result<Arc<Reconstruction>> {
        let path = path.as_ref();
        let source = path.display().to_string();
        let options = self.effective_options(engine_name, options)?;

        let mesh_key = CacheKey::for_mesh(&source, engine_name, &options);
        if let Some(hit) = self.mesh_cache.get(&mesh_key) {
            log::debug!("mesh cache hit for {source} with '{engine_name}'");
            return Ok(Arc::clone(hit));
        }

        let image = image::open(path)?.to_rgb8();
        self.run(&source, image, engine_name, &options, mesh_key)
    }

    /// Processes an in-memory image; `source` names it in cache keys.
    pub fn process_image(
        &mut self,
        source: &str,
        image: RgbImage,
        engine_name: &str,
        options: &OptionSet,
    ) -> Result<Arc<Reconstruction>> {
        let options = self.effective_options(engine_name, options)?;
        let mesh_key = CacheKey::for_mesh(source, engine_name, &options);
        if let Some(hit) = self.mesh_cache.get(&mesh_key) {
            log::debug!("mesh cache hit for {source} with '{engine_name}'");
            return Ok(Arc::clone(hit));
        }
        self.run(source, image, engine_name, &options, mesh_key)
    }

    /// Cached raw output of an earlier request, if still held.
    pub fn cached_raw_output(
        &self,
        source: &str,
        engine_name: &str,
        options: &OptionSet,
    ) -> Option<Arc<RawModelOutput>> {
        let engine = self.engines.get(engine_name)?;
        let options = options
            .clone()
            .with_defaults(&pipeline_schema().merged(&engine.option_schema()));
        let key = CacheKey::for_raw(source, engine_name, &options, &engine.option_schema());
        self.raw_cache.peek(&key).cloned()
    }

    pub fn mesh_cache_len(&self) -> usize {
        self.mesh_cache.len()
    }

    pub fn raw_cache_len(&self) -> usize {
        self.raw_cache.len()
    }

    pub fn clear_caches(&mut self) {
        self.mesh_cache.clear();
        self.raw_cache.clear();
    }

    fn engine(&self, name: &str) -> Result<&dyn Engine> {
        self.engines
            .get(name)
            .ok_or_else(|| DepthmeshError::EngineNotFound(name.to_string()))
    }

    /// Fills in defaults and validates against the engine's schema.
    fn effective_options(&self, engine_name: &str, options: &OptionSet) -> Result<OptionSet> {
        let schema = self.option_schema(engine_name)?;
        let options = options.clone().with_defaults(&schema);
        schema.validate(&options)?;
        Ok(options)
    }

    fn run(
        &mut self,
        source: &str,
        image: RgbImage,
        engine_name: &str,
        options: &OptionSet,
        mesh_key: CacheKey,
    ) -> Result<Arc<Reconstruction>> {
        log::info!("processing {source} with '{engine_name}'");

        let image = apply_resize(image, ResizeTarget::from_options(options)?);
        let (image, fg_mask) = self.remove_background(image, options)?;

        let raw = self.infer(source, &image, engine_name, options)?;
        let reconstruction = self
            .builder
            .build(&raw, &image, fg_mask.as_ref(), options)?
            .ok_or_else(|| DepthmeshError::GeometryUnavailable(engine_name.to_string()))?;

        let reconstruction = Arc::new(reconstruction);
        self.mesh_cache.insert(mesh_key, Arc::clone(&reconstruction));
        Ok(reconstruction)
    }

    fn remove_background(
        &mut self,
        image: RgbImage,
        options: &OptionSet,
    ) -> Result<(RgbImage, Option<GrayImage>)> {
        if options.get_bool("bg_removal") != Some(true) {
            return Ok((image, None));
        }
        match self.extractor.as_mut() {
            Some(extractor) => {
                log::info!("removing background");
                let foreground = extractor.extract(&image)?;
                Ok((foreground.image, Some(foreground.mask)))
            }
            None => {
                log::debug!("bg_removal requested but no extractor installed");
                Ok((image, None))
            }
        }
    }

    fn infer(
        &mut self,
        source: &str,
        image: &RgbImage,
        engine_name: &str,
        options: &OptionSet,
    ) -> Result<Arc<RawModelOutput>> {
        let engine = self
            .engines
            .get_mut(engine_name)
            .ok_or_else(|| DepthmeshError::EngineNotFound(engine_name.to_string()))?;
        let raw_key = CacheKey::for_raw(source, engine_name, options, &engine.option_schema());
        if let Some(hit) = self.raw_cache.get(&raw_key) {
            log::debug!("raw output cache hit for {source} with '{engine_name}'");
            return Ok(Arc::clone(hit));
        }

        engine.load_if_needed()?;
        let raw = Arc::new(engine.process(image, options)?);
        log::info!("'{engine_name}' produced {}", raw.kind_name());
        self.raw_cache.insert(raw_key, Arc::clone(&raw));
        Ok(raw)
    }
}
