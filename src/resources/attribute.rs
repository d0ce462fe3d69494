use bytemuck::Pod;
use wgpu::{BufferUsages, IndexFormat, VertexFormat};

use crate::errors::{Result, WeftError};

use super::buffer::BufferRef;

/// Upload policy hint for an attribute.
///
/// `Dynamic` buffers are re-synced on every cache update regardless of
/// version, because some producers rewrite contents every frame without
/// honoring the version-bump contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeUsage {
    #[default]
    Static,
    Dynamic,
}

/// Buffer class an attribute is uploaded as. Selects the backend creation
/// call on first sight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Vertex,
    Index,
    Storage,
    Indirect,
}

/// A typed view over a [`BufferRef`].
///
/// Interleaved layouts are expressed as several `Attribute`s cloning one
/// backing buffer with distinct offsets; the cache layer keys everything
/// by `buffer_id()`, so redundant uploads of a shared physical buffer are
/// impossible by construction.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub buffer: BufferRef,
    pub format: VertexFormat,
    pub offset: u64,
    pub count: u32,
    pub stride: u64,
    pub usage: AttributeUsage,
}

impl Attribute {
    /// Planar vertex attribute owning its backing buffer.
    pub fn from_data<T: Pod>(data: &[T], format: VertexFormat) -> Self {
        Self {
            buffer: BufferRef::new(
                data,
                BufferUsages::VERTEX | BufferUsages::COPY_DST,
                Some("VertexAttribute"),
            ),
            format,
            offset: 0,
            count: data.len() as u32,
            stride: std::mem::size_of::<T>() as u64,
            usage: AttributeUsage::Static,
        }
    }

    #[must_use]
    pub fn for_index_u16(indices: &[u16]) -> Self {
        Self {
            buffer: BufferRef::new(
                indices,
                BufferUsages::INDEX | BufferUsages::COPY_DST,
                Some("IndexAttribute"),
            ),
            format: VertexFormat::Uint16,
            offset: 0,
            count: indices.len() as u32,
            stride: 2,
            usage: AttributeUsage::Static,
        }
    }

    #[must_use]
    pub fn for_index_u32(indices: &[u32]) -> Self {
        Self {
            buffer: BufferRef::new(
                indices,
                BufferUsages::INDEX | BufferUsages::COPY_DST,
                Some("IndexAttribute"),
            ),
            format: VertexFormat::Uint32,
            offset: 0,
            count: indices.len() as u32,
            stride: 4,
            usage: AttributeUsage::Static,
        }
    }

    /// Storage attribute, readable/writable from compute.
    pub fn for_storage<T: Pod>(data: &[T], format: VertexFormat) -> Self {
        Self {
            buffer: BufferRef::new(
                data,
                BufferUsages::STORAGE | BufferUsages::VERTEX | BufferUsages::COPY_DST,
                Some("StorageAttribute"),
            ),
            format,
            offset: 0,
            count: data.len() as u32,
            stride: std::mem::size_of::<T>() as u64,
            usage: AttributeUsage::Static,
        }
    }

    /// Indirect draw arguments (`[vertex_count, instance_count, first_vertex,
    /// first_instance]` per draw).
    #[must_use]
    pub fn for_indirect(args: &[u32]) -> Self {
        Self {
            buffer: BufferRef::new(
                args,
                BufferUsages::INDIRECT | BufferUsages::STORAGE | BufferUsages::COPY_DST,
                Some("IndirectAttribute"),
            ),
            format: VertexFormat::Uint32,
            offset: 0,
            count: args.len() as u32,
            stride: 4,
            usage: AttributeUsage::Static,
        }
    }

    /// View into a shared interleaved buffer.
    #[must_use]
    pub fn interleaved(
        buffer: BufferRef,
        format: VertexFormat,
        offset: u64,
        count: u32,
        stride: u64,
    ) -> Self {
        Self {
            buffer,
            format,
            offset,
            count,
            stride,
            usage: AttributeUsage::Static,
        }
    }

    /// Marks the attribute as dynamically updated.
    #[must_use]
    pub fn dynamic(mut self) -> Self {
        self.usage = AttributeUsage::Dynamic;
        self
    }

    /// Id of the physical backing buffer. All cache bookkeeping keys on
    /// this, never on the view.
    #[inline]
    #[must_use]
    pub fn buffer_id(&self) -> u64 {
        self.buffer.id()
    }

    /// Data version of the backing buffer.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.buffer.version()
    }

    #[must_use]
    pub fn is_storage(&self) -> bool {
        self.buffer.usage().contains(BufferUsages::STORAGE)
    }

    #[must_use]
    pub fn is_indirect(&self) -> bool {
        self.buffer.usage().contains(BufferUsages::INDIRECT)
    }

    /// GPU index format of this attribute, or an error if the format can
    /// not index anything.
    pub fn index_format(&self) -> Result<IndexFormat> {
        match self.format {
            VertexFormat::Uint16 => Ok(IndexFormat::Uint16),
            VertexFormat::Uint32 => Ok(IndexFormat::Uint32),
            format => Err(WeftError::UnsupportedIndexFormat {
                label: self.buffer.label().to_string(),
                format,
            }),
        }
    }
}
