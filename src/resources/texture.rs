use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity and change-tracking state of a texture.
///
/// The pixel data itself lives with the host's texture system; the cache
/// only needs two counters to stay correct:
///
/// - `version` — bumped on pixel edits, gates data re-upload;
/// - `generation` — bumped when the native object is reallocated or
///   hot-swapped, forces bind-group rebuilds.
#[derive(Debug)]
pub struct TextureSource {
    id: u64,
    label: String,
    version: AtomicU64,
    generation: AtomicU64,
    storage: bool,
    external: bool,
    generate_mipmaps: bool,
    mipmap_dirty: AtomicBool,
}

/// Cheaply clonable texture handle. Equality and hashing go by id.
#[derive(Debug, Clone)]
pub struct TextureRef(Arc<TextureSource>);

impl PartialEq for TextureRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for TextureRef {}

impl std::hash::Hash for TextureRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl TextureRef {
    #[must_use]
    pub fn new(label: &str) -> Self {
        Self(Arc::new(TextureSource {
            id: NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed),
            label: label.to_string(),
            version: AtomicU64::new(1),
            generation: AtomicU64::new(1),
            storage: false,
            external: false,
            generate_mipmaps: false,
            mipmap_dirty: AtomicBool::new(false),
        }))
    }

    /// Marks the texture as a storage texture writable from compute.
    /// Builder-style, valid before the handle is shared.
    #[must_use]
    pub fn storage(mut self) -> Self {
        if let Some(source) = Arc::get_mut(&mut self.0) {
            source.storage = true;
        }
        self
    }

    /// Marks the texture as externally owned (video-element style). Such
    /// textures can change under the cache's feet, so bind-group caching
    /// is disabled for groups that sample them.
    #[must_use]
    pub fn external(mut self) -> Self {
        if let Some(source) = Arc::get_mut(&mut self.0) {
            source.external = true;
        }
        self
    }

    /// Enables mipmap generation for the texture.
    #[must_use]
    pub fn with_mipmaps(mut self) -> Self {
        if let Some(source) = Arc::get_mut(&mut self.0) {
            source.generate_mipmaps = true;
        }
        self
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.0.label
    }

    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.0.version.load(Ordering::Relaxed)
    }

    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.0.generation.load(Ordering::Relaxed)
    }

    /// Signals that pixel contents changed (re-upload needed).
    pub fn bump_version(&self) {
        self.0.version.fetch_add(1, Ordering::Relaxed);
    }

    /// Signals that the native texture object was replaced (views into it
    /// are stale, bind groups referencing it must be rebuilt).
    pub fn reallocate(&self) {
        self.0.generation.fetch_add(1, Ordering::Relaxed);
        self.0.version.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_storage(&self) -> bool {
        self.0.storage
    }

    #[must_use]
    pub fn is_external(&self) -> bool {
        self.0.external
    }

    #[must_use]
    pub fn generates_mipmaps(&self) -> bool {
        self.0.generate_mipmaps
    }

    #[must_use]
    pub fn mipmap_dirty(&self) -> bool {
        self.0.mipmap_dirty.load(Ordering::Relaxed)
    }

    pub fn set_mipmap_dirty(&self, dirty: bool) {
        self.0.mipmap_dirty.store(dirty, Ordering::Relaxed);
    }
}
