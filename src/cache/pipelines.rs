//! Pipeline and shader-stage caching with reference counting.
//!
//! # Two cache layers
//!
//! **Programs** ([`ProgrammableStage`]) are keyed by the xxh3-128 of
//! their source text: two materials producing identical shader text
//! share one compiled stage. **Pipelines** are keyed by a cache-key
//! string combining the stage ids with the backend's render-state
//! fingerprint; two unrelated render objects with equal shader text and
//! state share one linked pipeline.
//!
//! Both layers are reference counted. The invariant that keeps GPU
//! object growth bounded: *an entry is present in its cache map iff its
//! `used_times > 0`.* Dropping to zero releases the native object
//! immediately; an identical later request compiles/links anew.
//!
//! # Asynchronous compiles
//!
//! Compile-ahead callers pass a `pending` list; every pipeline whose
//! native compile was started asynchronously pushes its cache key there,
//! and the caller polls [`Backend::is_pipeline_ready`] for each key
//! before treating the pipeline as usable. Concurrent requests for one
//! not-yet-ready key find the cached entry and share the same compile.

use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;
use xxhash_rust::xxh3::xxh3_128;

use crate::backend::{Backend, ShaderCompileError};
use crate::objects::{ComputeNode, RenderObject, ShaderGenerator};
use crate::utils::shader_error_context;

use super::side_table::SideTable;

static NEXT_STAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Source lines shown on each side of a failing line in compile
/// diagnostics.
const ERROR_CONTEXT_LINES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

/// One compiled shader stage, shared by every pipeline built from the
/// same source text.
#[derive(Debug)]
pub struct ProgrammableStage {
    id: u64,
    pub code: String,
    pub stage: ShaderStage,
    /// Material/node name, used for shader labels and diagnostics.
    pub name: String,
    used_times: u32,
}

impl ProgrammableStage {
    fn new(code: String, stage: ShaderStage, name: String) -> Self {
        Self {
            id: NEXT_STAGE_ID.fetch_add(1, Ordering::Relaxed),
            code,
            stage,
            name,
            used_times: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn used_times(&self) -> u32 {
        self.used_times
    }
}

/// A linked render pipeline: vertex + fragment stages + fixed-function
/// state.
#[derive(Debug)]
pub struct RenderPipeline {
    cache_key: String,
    vertex: u128,
    fragment: u128,
    used_times: u32,
}

impl RenderPipeline {
    #[must_use]
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    #[must_use]
    pub fn used_times(&self) -> u32 {
        self.used_times
    }
}

/// A linked compute pipeline.
#[derive(Debug)]
pub struct ComputePipeline {
    cache_key: String,
    compute: u128,
    used_times: u32,
}

impl ComputePipeline {
    #[must_use]
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    #[must_use]
    pub fn used_times(&self) -> u32 {
        self.used_times
    }
}

#[derive(Debug)]
enum ObjectRecord {
    Render { key: String },
    Compute { key: String, node_version: u64 },
}

/// User hook receiving shader compile failures after they are logged.
pub type CompileErrorHook = Box<dyn Fn(&ShaderCompileError, &ProgrammableStage) + Send + Sync>;

/// Top-level cache: compiled stages by source, linked pipelines by
/// cache key, both reference counted.
#[derive(Default)]
pub struct PipelineCache {
    vertex_programs: FxHashMap<u128, ProgrammableStage>,
    fragment_programs: FxHashMap<u128, ProgrammableStage>,
    compute_programs: FxHashMap<u128, ProgrammableStage>,
    render_pipelines: FxHashMap<String, RenderPipeline>,
    compute_pipelines: FxHashMap<String, ComputePipeline>,
    objects: SideTable<ObjectRecord>,
    on_compile_error: Option<CompileErrorHook>,
}

impl PipelineCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a hook called on shader compile failures, after the
    /// diagnostic is logged.
    pub fn set_compile_error_hook(&mut self, hook: CompileErrorHook) {
        self.on_compile_error = Some(hook);
    }

    // ── Render path ──────────────────────────────────────────────────────

    /// Returns the pipeline for a render object, creating or reusing as
    /// needed.
    ///
    /// With `pending` set, native pipeline compiles run asynchronously
    /// and each freshly created pipeline's cache key is pushed for the
    /// caller to poll.
    pub fn get_for_render(
        &mut self,
        backend: &mut dyn Backend,
        generator: &mut dyn ShaderGenerator,
        object: &RenderObject,
        mut pending: Option<&mut Vec<String>>,
    ) -> &RenderPipeline {
        if self.needs_render_update(backend, object) {
            // The object held a pipeline before; drop its claims. Zeroed
            // entries are released only after the new pipeline is
            // resolved, so a reuse never destroys and recreates.
            let previous = self.objects.remove(object.id()).and_then(|record| {
                match record {
                    ObjectRecord::Render { key } => self.decrement_render(&key),
                    ObjectRecord::Compute { .. } => None,
                }
            });

            let shaders = generator.render_shaders(object);
            let vertex_hash = self.obtain_program(
                backend,
                ShaderStage::Vertex,
                shaders.vertex,
                &object.material.name,
            );
            let fragment_hash = self.obtain_program(
                backend,
                ShaderStage::Fragment,
                shaders.fragment,
                &object.material.name,
            );

            let vertex_id = self.program(ShaderStage::Vertex, vertex_hash).id;
            let fragment_id = self.program(ShaderStage::Fragment, fragment_hash).id;
            let state_key = backend.render_cache_key(object);
            let cache_key = format!("{vertex_id},{fragment_id},{state_key}");

            if !self.render_pipelines.contains_key(&cache_key) {
                let pipeline = RenderPipeline {
                    cache_key: cache_key.clone(),
                    vertex: vertex_hash,
                    fragment: fragment_hash,
                    used_times: 0,
                };
                let async_compile = pending.is_some();
                backend.create_render_pipeline(object, &pipeline, async_compile);
                if let Some(list) = pending.as_mut() {
                    list.push(cache_key.clone());
                }
                self.render_pipelines.insert(cache_key.clone(), pipeline);
            }

            {
                let pipeline = self
                    .render_pipelines
                    .get_mut(&cache_key)
                    .expect("render pipeline inserted above");
                pipeline.used_times += 1;
            }
            self.program_mut(ShaderStage::Vertex, vertex_hash).used_times += 1;
            self.program_mut(ShaderStage::Fragment, fragment_hash).used_times += 1;

            self.objects.insert(
                object.id(),
                ObjectRecord::Render {
                    key: cache_key.clone(),
                },
            );

            // Release whatever the decrement left at zero. A reused
            // pipeline or program was re-incremented above and survives.
            if let Some((key, vertex, fragment)) = previous {
                self.release_render_if_unused(backend, &key);
                self.release_program_if_unused(backend, ShaderStage::Vertex, vertex);
                self.release_program_if_unused(backend, ShaderStage::Fragment, fragment);
            }
        }

        let key = match self.objects.get(object.id()) {
            Some(ObjectRecord::Render { key }) => key,
            _ => unreachable!("record written above"),
        };
        self.render_pipelines
            .get(key)
            .expect("cached pipelines exist while referenced")
    }

    /// Draw-loop entry point: makes sure the object's pipeline is
    /// current without inspecting it.
    pub fn update_for_render(
        &mut self,
        backend: &mut dyn Backend,
        generator: &mut dyn ShaderGenerator,
        object: &RenderObject,
    ) {
        self.get_for_render(backend, generator, object, None);
    }

    fn needs_render_update(&self, backend: &mut dyn Backend, object: &RenderObject) -> bool {
        match self.objects.get(object.id()) {
            Some(ObjectRecord::Render { .. }) => backend.needs_render_update(object),
            _ => true,
        }
    }

    // ── Compute path ─────────────────────────────────────────────────────

    /// Returns the pipeline for a compute node. Also serves the
    /// transform-feedback emulation path, where the "compute" stage is a
    /// vertex shader driving capture with rasterization discarded.
    pub fn get_for_compute(
        &mut self,
        backend: &mut dyn Backend,
        generator: &mut dyn ShaderGenerator,
        node: &ComputeNode,
    ) -> &ComputePipeline {
        if self.needs_compute_update(node) {
            let previous = self.objects.remove(node.id()).and_then(|record| {
                match record {
                    ObjectRecord::Compute { key, .. } => self.decrement_compute(&key),
                    ObjectRecord::Render { .. } => None,
                }
            });

            let code = generator.compute_shader(node);
            let compute_hash =
                self.obtain_program(backend, ShaderStage::Compute, code, &node.name);

            let stage_id = self.program(ShaderStage::Compute, compute_hash).id;
            let cache_key = format!("compute,{stage_id}");

            if !self.compute_pipelines.contains_key(&cache_key) {
                let pipeline = ComputePipeline {
                    cache_key: cache_key.clone(),
                    compute: compute_hash,
                    used_times: 0,
                };
                backend.create_compute_pipeline(&pipeline, &node.bind_groups);
                self.compute_pipelines.insert(cache_key.clone(), pipeline);
            }

            self.compute_pipelines
                .get_mut(&cache_key)
                .expect("compute pipeline inserted above")
                .used_times += 1;
            self.program_mut(ShaderStage::Compute, compute_hash).used_times += 1;

            self.objects.insert(
                node.id(),
                ObjectRecord::Compute {
                    key: cache_key.clone(),
                    node_version: node.version(),
                },
            );

            if let Some((key, compute)) = previous {
                self.release_compute_if_unused(backend, &key);
                self.release_program_if_unused(backend, ShaderStage::Compute, compute);
            }
        }

        let key = match self.objects.get(node.id()) {
            Some(ObjectRecord::Compute { key, .. }) => key,
            _ => unreachable!("record written above"),
        };
        self.compute_pipelines
            .get(key)
            .expect("cached pipelines exist while referenced")
    }

    fn needs_compute_update(&self, node: &ComputeNode) -> bool {
        match self.objects.get(node.id()) {
            Some(ObjectRecord::Compute { node_version, .. }) => *node_version != node.version(),
            _ => true,
        }
    }

    // ── Teardown ─────────────────────────────────────────────────────────

    /// Symmetric teardown for a deleted render object or compute node:
    /// decrement the pipeline and its programs, release whatever hits
    /// zero, drop the side-table record.
    pub fn delete(&mut self, backend: &mut dyn Backend, object_id: u64) {
        match self.objects.remove(object_id) {
            Some(ObjectRecord::Render { key }) => {
                if let Some((key, vertex, fragment)) = self.decrement_render(&key) {
                    self.release_render_if_unused(backend, &key);
                    self.release_program_if_unused(backend, ShaderStage::Vertex, vertex);
                    self.release_program_if_unused(backend, ShaderStage::Fragment, fragment);
                }
            }
            Some(ObjectRecord::Compute { key, .. }) => {
                if let Some((key, compute)) = self.decrement_compute(&key) {
                    self.release_compute_if_unused(backend, &key);
                    self.release_program_if_unused(backend, ShaderStage::Compute, compute);
                }
            }
            None => {}
        }
    }

    /// Whether the object currently holds a pipeline.
    #[must_use]
    pub fn has_pipeline(&self, object_id: u64) -> bool {
        self.objects.has(object_id)
    }

    // ── Telemetry ────────────────────────────────────────────────────────

    /// Number of live compiled stages across all kinds.
    #[must_use]
    pub fn program_count(&self) -> usize {
        self.vertex_programs.len() + self.fragment_programs.len() + self.compute_programs.len()
    }

    #[must_use]
    pub fn render_pipeline_count(&self) -> usize {
        self.render_pipelines.len()
    }

    #[must_use]
    pub fn compute_pipeline_count(&self) -> usize {
        self.compute_pipelines.len()
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    fn programs(&self, stage: ShaderStage) -> &FxHashMap<u128, ProgrammableStage> {
        match stage {
            ShaderStage::Vertex => &self.vertex_programs,
            ShaderStage::Fragment => &self.fragment_programs,
            ShaderStage::Compute => &self.compute_programs,
        }
    }

    fn programs_mut(&mut self, stage: ShaderStage) -> &mut FxHashMap<u128, ProgrammableStage> {
        match stage {
            ShaderStage::Vertex => &mut self.vertex_programs,
            ShaderStage::Fragment => &mut self.fragment_programs,
            ShaderStage::Compute => &mut self.compute_programs,
        }
    }

    fn program(&self, stage: ShaderStage, hash: u128) -> &ProgrammableStage {
        self.programs(stage)
            .get(&hash)
            .expect("program exists while referenced")
    }

    fn program_mut(&mut self, stage: ShaderStage, hash: u128) -> &mut ProgrammableStage {
        self.programs_mut(stage)
            .get_mut(&hash)
            .expect("program exists while referenced")
    }

    /// Looks up the stage for `code`, compiling it on first sight.
    fn obtain_program(
        &mut self,
        backend: &mut dyn Backend,
        stage: ShaderStage,
        code: String,
        name: &str,
    ) -> u128 {
        let hash = xxh3_128(code.as_bytes());
        if !self.programs(stage).contains_key(&hash) {
            let program = ProgrammableStage::new(code, stage, name.to_string());
            if let Err(error) = backend.create_program(&program) {
                self.report_compile_error(&error, &program);
            }
            self.programs_mut(stage).insert(hash, program);
        }
        hash
    }

    /// Compile failures never halt the frame loop: the diagnostic is
    /// logged with source context, the user hook runs, and the broken
    /// stage stays cached so the object renders (visibly wrong) instead
    /// of crashing.
    fn report_compile_error(&self, error: &ShaderCompileError, stage: &ProgrammableStage) {
        match error.line {
            Some(line) => log::error!(
                "shader compile failed for {:?} ({:?}): {}\n{}",
                stage.name,
                stage.stage,
                error.message,
                shader_error_context(&stage.code, line, ERROR_CONTEXT_LINES)
            ),
            None => log::error!(
                "shader compile failed for {:?} ({:?}): {}",
                stage.name,
                stage.stage,
                error.message
            ),
        }
        if let Some(hook) = &self.on_compile_error {
            hook(error, stage);
        }
    }

    /// Decrements a render pipeline and its two programs. Returns the
    /// keys for a later release pass, or `None` when the key vanished.
    fn decrement_render(&mut self, key: &str) -> Option<(String, u128, u128)> {
        let pipeline = self.render_pipelines.get_mut(key)?;
        pipeline.used_times = pipeline.used_times.saturating_sub(1);
        let (vertex, fragment) = (pipeline.vertex, pipeline.fragment);
        let vertex_program = self.program_mut(ShaderStage::Vertex, vertex);
        vertex_program.used_times = vertex_program.used_times.saturating_sub(1);
        let fragment_program = self.program_mut(ShaderStage::Fragment, fragment);
        fragment_program.used_times = fragment_program.used_times.saturating_sub(1);
        Some((key.to_string(), vertex, fragment))
    }

    fn decrement_compute(&mut self, key: &str) -> Option<(String, u128)> {
        let pipeline = self.compute_pipelines.get_mut(key)?;
        pipeline.used_times = pipeline.used_times.saturating_sub(1);
        let compute = pipeline.compute;
        let program = self.program_mut(ShaderStage::Compute, compute);
        program.used_times = program.used_times.saturating_sub(1);
        Some((key.to_string(), compute))
    }

    fn release_render_if_unused(&mut self, backend: &mut dyn Backend, key: &str) {
        if self
            .render_pipelines
            .get(key)
            .is_some_and(|p| p.used_times == 0)
        {
            self.render_pipelines.remove(key);
            backend.destroy_pipeline(key);
            log::debug!("render pipeline released: {key}");
        }
    }

    fn release_compute_if_unused(&mut self, backend: &mut dyn Backend, key: &str) {
        if self
            .compute_pipelines
            .get(key)
            .is_some_and(|p| p.used_times == 0)
        {
            self.compute_pipelines.remove(key);
            backend.destroy_pipeline(key);
            log::debug!("compute pipeline released: {key}");
        }
    }

    fn release_program_if_unused(&mut self, backend: &mut dyn Backend, stage: ShaderStage, hash: u128) {
        if self
            .programs(stage)
            .get(&hash)
            .is_some_and(|p| p.used_times == 0)
            && let Some(program) = self.programs_mut(stage).remove(&hash)
        {
            backend.destroy_program(&program);
        }
    }
}
