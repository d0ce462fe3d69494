//! Bind groups and the binding kinds they hold.
//!
//! A [`BindGroup`] is an ordered list of [`Binding`]s sharing one
//! GPU-visibility scope. Render objects and compute nodes own their
//! groups; the cache layer (`cache::bindings`) realizes the native
//! objects exactly once and rebuilds them only on structural change.

pub mod group;
pub mod uniform;

use std::sync::atomic::{AtomicU64, Ordering};

pub use group::{UniformBuffer, UniformsGroup};
pub use uniform::{GPU_CHUNK_BYTES, Uniform, UniformValue};

use crate::resources::{Attribute, TextureRef};

static NEXT_BINDING_ID: AtomicU64 = AtomicU64::new(1);

fn next_binding_id() -> u64 {
    NEXT_BINDING_ID.fetch_add(1, Ordering::Relaxed)
}

/// Storage buffer binding backed by an [`Attribute`].
#[derive(Debug)]
pub struct StorageBuffer {
    id: u64,
    pub name: String,
    pub visibility: wgpu::ShaderStages,
    pub attribute: Attribute,
    pub read_only: bool,
}

impl StorageBuffer {
    #[must_use]
    pub fn new(name: &str, visibility: wgpu::ShaderStages, attribute: Attribute) -> Self {
        Self {
            id: next_binding_id(),
            name: name.to_string(),
            visibility,
            attribute,
            read_only: false,
        }
    }

    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Sampler binding. Tracks the sampled texture's generation so a swapped
/// native object triggers a bind-group rebuild.
#[derive(Debug)]
pub struct TextureSampler {
    id: u64,
    pub name: String,
    pub visibility: wgpu::ShaderStages,
    pub texture: TextureRef,
    generation: Option<u64>,
}

impl TextureSampler {
    #[must_use]
    pub fn new(name: &str, visibility: wgpu::ShaderStages, texture: TextureRef) -> Self {
        Self {
            id: next_binding_id(),
            name: name.to_string(),
            visibility,
            texture,
            generation: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Refreshes the sampler's texture reference. Returns true when the
    /// native object changed underneath (rebuild required). Cheap, run
    /// every update.
    pub fn update(&mut self) -> bool {
        let generation = self.texture.generation();
        if self.generation == Some(generation) {
            return false;
        }
        self.generation = Some(generation);
        true
    }
}

/// Outcome of a [`SampledTexture::update`] pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextureUpdate {
    /// The native texture object changed; the containing bind group must
    /// be rebuilt.
    pub rebound: bool,
    /// Pixel contents changed; data must be re-uploaded.
    pub uploaded: bool,
}

/// Sampled (or storage-accessed) texture binding.
#[derive(Debug)]
pub struct SampledTexture {
    id: u64,
    pub name: String,
    pub visibility: wgpu::ShaderStages,
    pub texture: TextureRef,
    /// True when the shader writes the texture (storage access) rather
    /// than sampling it.
    pub store: bool,
    generation: Option<u64>,
    version: u64,
}

impl SampledTexture {
    #[must_use]
    pub fn new(name: &str, visibility: wgpu::ShaderStages, texture: TextureRef) -> Self {
        Self {
            id: next_binding_id(),
            name: name.to_string(),
            visibility,
            texture,
            store: false,
            generation: None,
            version: 0,
        }
    }

    /// Storage-access variant (written by a compute pass).
    #[must_use]
    pub fn for_store(name: &str, visibility: wgpu::ShaderStages, texture: TextureRef) -> Self {
        let mut binding = Self::new(name, visibility, texture);
        binding.store = true;
        binding
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Compares the tracked generation and version against the texture's
    /// current counters and snapshots them.
    pub fn update(&mut self) -> TextureUpdate {
        let mut result = TextureUpdate::default();
        let generation = self.texture.generation();
        if self.generation != Some(generation) {
            self.generation = Some(generation);
            result.rebound = true;
        }
        let version = self.texture.version();
        if self.version != version {
            self.version = version;
            result.uploaded = true;
        }
        result
    }
}

/// One resource binding within a bind group.
#[derive(Debug)]
pub enum Binding {
    Uniforms(UniformsGroup),
    UniformBuffer(UniformBuffer),
    Storage(StorageBuffer),
    Texture(SampledTexture),
    Sampler(TextureSampler),
}

impl Binding {
    #[must_use]
    pub fn id(&self) -> u64 {
        match self {
            Self::Uniforms(b) => b.id(),
            Self::UniformBuffer(b) => b.id(),
            Self::Storage(b) => b.id(),
            Self::Texture(b) => b.id(),
            Self::Sampler(b) => b.id(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Uniforms(b) => &b.name,
            Self::UniformBuffer(b) => &b.name,
            Self::Storage(b) => &b.name,
            Self::Texture(b) => &b.name,
            Self::Sampler(b) => &b.name,
        }
    }

    #[must_use]
    pub fn visibility(&self) -> wgpu::ShaderStages {
        match self {
            Self::Uniforms(b) => b.visibility,
            Self::UniformBuffer(b) => b.visibility,
            Self::Storage(b) => b.visibility,
            Self::Texture(b) => b.visibility,
            Self::Sampler(b) => b.visibility,
        }
    }
}

static NEXT_BIND_GROUP_ID: AtomicU64 = AtomicU64::new(1);

/// Ordered list of bindings realized as one native bind group.
#[derive(Debug)]
pub struct BindGroup {
    id: u64,
    pub name: String,
    /// Group slot in the pipeline layout.
    pub index: u32,
    pub bindings: Vec<Binding>,
}

impl BindGroup {
    #[must_use]
    pub fn new(name: &str, index: u32, bindings: Vec<Binding>) -> Self {
        Self {
            id: NEXT_BIND_GROUP_ID.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
            index,
            bindings,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}
