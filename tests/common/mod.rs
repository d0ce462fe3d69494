//! Shared test doubles: a call-recording backend and a scripted shader
//! generator.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use weft::{
    Attribute, Backend, BindGroup, Binding, ComputeNode, ComputePipeline, ProgrammableStage,
    RenderObject, RenderPipeline, RenderShaderSet, ShaderCompileError, ShaderGenerator,
    TextureRef,
};

/// Backend double that records every driver call.
#[derive(Default)]
pub struct RecordingBackend {
    pub created_vertex: Vec<u64>,
    pub created_index: Vec<u64>,
    pub created_storage: Vec<u64>,
    pub created_indirect: Vec<u64>,
    pub updated_attributes: Vec<u64>,
    pub destroyed_attributes: Vec<u64>,

    pub created_programs: Vec<u64>,
    pub destroyed_programs: Vec<u64>,
    pub created_render_pipelines: Vec<String>,
    pub created_compute_pipelines: Vec<String>,
    pub destroyed_pipelines: Vec<String>,

    pub created_bindings: Vec<u64>,
    /// (group id, cache index, version) per native rebuild.
    pub updated_bindings: Vec<(u64, u64, u64)>,
    pub updated_binding_ids: Vec<u64>,

    pub updated_textures: Vec<u64>,
    pub generated_mipmaps: Vec<u64>,

    /// Object ids that report a stale pipeline exactly once.
    pub force_update: HashSet<u64>,
    /// Per-object state fingerprint; objects without an entry share one
    /// default fingerprint.
    pub state_keys: HashMap<u64, String>,
    /// Cache keys whose async compile has not finished yet.
    pub pending_compiles: HashSet<String>,
    /// When set, every `create_program` reports this failure.
    pub compile_failure: Option<ShaderCompileError>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completes all in-flight async compiles.
    pub fn finish_compiles(&mut self) {
        self.pending_compiles.clear();
    }
}

impl Backend for RecordingBackend {
    fn create_program(&mut self, stage: &ProgrammableStage) -> Result<(), ShaderCompileError> {
        self.created_programs.push(stage.id());
        match &self.compile_failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }

    fn destroy_program(&mut self, stage: &ProgrammableStage) {
        self.destroyed_programs.push(stage.id());
    }

    fn create_render_pipeline(
        &mut self,
        _object: &RenderObject,
        pipeline: &RenderPipeline,
        async_compile: bool,
    ) {
        self.created_render_pipelines
            .push(pipeline.cache_key().to_string());
        if async_compile {
            self.pending_compiles
                .insert(pipeline.cache_key().to_string());
        }
    }

    fn create_compute_pipeline(&mut self, pipeline: &ComputePipeline, _bind_groups: &[BindGroup]) {
        self.created_compute_pipelines
            .push(pipeline.cache_key().to_string());
    }

    fn destroy_pipeline(&mut self, cache_key: &str) {
        self.destroyed_pipelines.push(cache_key.to_string());
    }

    fn is_pipeline_ready(&self, cache_key: &str) -> bool {
        !self.pending_compiles.contains(cache_key)
    }

    fn create_bindings(&mut self, group: &BindGroup, _cache_index: u64, _version: u64) {
        self.created_bindings.push(group.id());
    }

    fn update_bindings(&mut self, group: &BindGroup, cache_index: u64, version: u64) {
        self.updated_bindings.push((group.id(), cache_index, version));
    }

    fn update_binding(&mut self, binding: &Binding) {
        self.updated_binding_ids.push(binding.id());
    }

    fn create_attribute(&mut self, attribute: &Attribute) {
        self.created_vertex.push(attribute.buffer_id());
    }

    fn create_index_attribute(&mut self, attribute: &Attribute) {
        self.created_index.push(attribute.buffer_id());
    }

    fn create_storage_attribute(&mut self, attribute: &Attribute) {
        self.created_storage.push(attribute.buffer_id());
    }

    fn create_indirect_attribute(&mut self, attribute: &Attribute) {
        self.created_indirect.push(attribute.buffer_id());
    }

    fn update_attribute(&mut self, attribute: &Attribute) {
        self.updated_attributes.push(attribute.buffer_id());
    }

    fn destroy_attribute(&mut self, attribute: &Attribute) {
        self.destroyed_attributes.push(attribute.buffer_id());
    }

    fn update_texture(&mut self, texture: &TextureRef) {
        self.updated_textures.push(texture.id());
    }

    fn generate_mipmaps(&mut self, texture: &TextureRef) {
        self.generated_mipmaps.push(texture.id());
    }

    fn needs_render_update(&mut self, object: &RenderObject) -> bool {
        self.force_update.remove(&object.id())
    }

    fn render_cache_key(&self, object: &RenderObject) -> String {
        self.state_keys
            .get(&object.id())
            .cloned()
            .unwrap_or_else(|| "blend=none,depth=less,cull=back,samples=1".to_string())
    }
}

/// Generator double returning fixed shader text per material name.
#[derive(Default)]
pub struct ScriptedGenerator {
    /// material name → (vertex, fragment); unknown names fall back to a
    /// shared default.
    pub render_sources: HashMap<String, (String, String)>,
    pub compute_sources: HashMap<u64, String>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShaderGenerator for ScriptedGenerator {
    fn render_shaders(&mut self, object: &RenderObject) -> RenderShaderSet {
        let (vertex, fragment) = self
            .render_sources
            .get(&object.material.name)
            .cloned()
            .unwrap_or_else(|| ("fn vs_main() {}".to_string(), "fn fs_main() {}".to_string()));
        RenderShaderSet { vertex, fragment }
    }

    fn compute_shader(&mut self, node: &ComputeNode) -> String {
        self.compute_sources
            .get(&node.id())
            .cloned()
            .unwrap_or_else(|| "fn main() {}".to_string())
    }
}
