//! weft — GPU resource and pipeline cache for node-material renderers.
//!
//! Sits between a node-based material/shader description and an
//! injected GPU [`Backend`], guaranteeing at-most-one compiled pipeline
//! per distinct shader/state combination, reference-counted release,
//! and version-gated re-upload of CPU data.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod backend;
pub mod bindings;
pub mod cache;
pub mod compute;
pub mod errors;
pub mod objects;
pub mod resources;
pub mod settings;
pub mod stats;
pub mod utils;

pub use backend::{Backend, ShaderCompileError};
pub use bindings::{
    BindGroup, Binding, SampledTexture, StorageBuffer, TextureSampler, TextureUpdate,
    Uniform, UniformBuffer, UniformValue, UniformsGroup,
};
pub use cache::pipelines::{ComputePipeline, ProgrammableStage, RenderPipeline, ShaderStage};
pub use cache::{
    AttributeBuffers, BindingCache, GeometryCache, PipelineCache, Rect, RenderContext,
    RenderContextCache, RenderTarget, SideTable,
};
pub use compute::{ComputePhase, ComputeSequencer, DisposeFlag, DualBuffer};
pub use errors::{Result, WeftError};
pub use objects::{
    ComputeNode, DirectUniforms, MaterialState, RenderObject, RenderShaderSet, ShaderGenerator,
    UniformSource,
};
pub use resources::{Attribute, AttributeKind, AttributeUsage, BufferRef, Geometry, TextureRef};
pub use settings::CacheSettings;
pub use stats::RenderStats;
