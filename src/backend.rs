//! The injected GPU driver seam.
//!
//! One [`Backend`] implementation exists per GPU API (a modern explicit
//! API, or a legacy-style API emulating compute via transform feedback).
//! All cache components call only this trait; the implementation chosen
//! at renderer construction owns every native object it creates.

use crate::bindings::{BindGroup, Binding};
use crate::cache::pipelines::{ComputePipeline, ProgrammableStage, RenderPipeline};
use crate::objects::RenderObject;
use crate::resources::{Attribute, TextureRef};

/// Diagnostic payload of a failed shader compile. Not a [`WeftError`]:
/// compile failures never halt the frame loop.
///
/// [`WeftError`]: crate::errors::WeftError
#[derive(Debug, Clone)]
pub struct ShaderCompileError {
    pub message: String,
    /// 1-based line in the shader source, when the driver reported one.
    pub line: Option<u32>,
}

pub trait Backend {
    // ── Programs & pipelines ─────────────────────────────────────────────

    /// Compiles one shader stage. Errors are reported back for
    /// diagnostics; the cache keeps the stage either way.
    fn create_program(&mut self, stage: &ProgrammableStage) -> Result<(), ShaderCompileError>;

    fn destroy_program(&mut self, stage: &ProgrammableStage);

    /// Links/realizes a render pipeline. With `async_compile` the backend
    /// may return before the native compile finishes; readiness is polled
    /// via [`is_pipeline_ready`](Self::is_pipeline_ready).
    fn create_render_pipeline(
        &mut self,
        object: &RenderObject,
        pipeline: &RenderPipeline,
        async_compile: bool,
    );

    fn create_compute_pipeline(&mut self, pipeline: &ComputePipeline, bind_groups: &[BindGroup]);

    fn destroy_pipeline(&mut self, cache_key: &str);

    /// Poll point for asynchronous compiles. Synchronous backends are
    /// always ready.
    fn is_pipeline_ready(&self, cache_key: &str) -> bool {
        let _ = cache_key;
        true
    }

    // ── Bind groups ──────────────────────────────────────────────────────

    fn create_bindings(&mut self, group: &BindGroup, cache_index: u64, version: u64);

    /// Rebuilds the native bind-group object after a structural change.
    /// `cache_index == 0` means caching is disabled for this group.
    fn update_bindings(&mut self, group: &BindGroup, cache_index: u64, version: u64);

    /// Pushes one binding's CPU bytes to its existing GPU buffer.
    fn update_binding(&mut self, binding: &Binding);

    // ── Buffers ──────────────────────────────────────────────────────────

    fn create_attribute(&mut self, attribute: &Attribute);
    fn create_index_attribute(&mut self, attribute: &Attribute);
    fn create_storage_attribute(&mut self, attribute: &Attribute);
    fn create_indirect_attribute(&mut self, attribute: &Attribute);
    fn update_attribute(&mut self, attribute: &Attribute);
    fn destroy_attribute(&mut self, attribute: &Attribute);

    // ── Textures ─────────────────────────────────────────────────────────

    fn update_texture(&mut self, texture: &TextureRef);
    fn generate_mipmaps(&mut self, texture: &TextureRef);

    // ── Render state ─────────────────────────────────────────────────────

    /// Whether the object's fixed-function state changed since the last
    /// pipeline request (render-target format, blend mode, …).
    fn needs_render_update(&mut self, object: &RenderObject) -> bool;

    /// Deterministic fingerprint of the object's fixed-function state
    /// (blend, depth/stencil, cull mode, sample count, target formats).
    fn render_cache_key(&self, object: &RenderObject) -> String;
}
