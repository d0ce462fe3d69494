//! CPU-side resource handles tracked by the cache layer.

pub mod attribute;
pub mod buffer;
pub mod geometry;
pub mod texture;

pub use attribute::{Attribute, AttributeKind, AttributeUsage};
pub use buffer::{BufferRef, DataBuffer};
pub use geometry::Geometry;
pub use texture::{TextureRef, TextureSource};
