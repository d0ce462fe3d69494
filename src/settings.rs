/// Cache-wide policies.
#[derive(Debug, Clone, Copy)]
pub struct CacheSettings {
    /// When true (default), a storage texture written by a compute pass
    /// is only flagged for mipmap regeneration; the mips are rebuilt when
    /// the texture is next *sampled*, not on every write. When false,
    /// mips regenerate immediately after the write.
    pub lazy_mipmaps: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { lazy_mipmaps: true }
    }
}
