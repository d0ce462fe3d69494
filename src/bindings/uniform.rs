//! Scalar/vector/matrix uniform values and their STD140 placement rules.

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

/// STD140 chunk size. Uniform-buffer byte lengths are rounded up to a
/// multiple of this, and no uniform may straddle a chunk boundary.
pub const GPU_CHUNK_BYTES: usize = 16;

/// Bytes per buffer element (`f32`/`i32`/`u32` all occupy one slot).
pub const BYTES_PER_ELEMENT: usize = 4;

/// A single uniform value.
///
/// `Color` is layout-identical to `Vec3` but kept distinct so host-side
/// color types map onto a dedicated updater, mirroring the usual
/// float/vector/color/matrix updater split of uniform systems.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Uint(u32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Color(Vec3),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl UniformValue {
    /// STD140 alignment boundary in bytes.
    #[must_use]
    pub fn boundary(&self) -> usize {
        match self {
            Self::Float(_) | Self::Int(_) | Self::Uint(_) => 4,
            Self::Vec2(_) => 8,
            Self::Vec3(_) | Self::Vec4(_) | Self::Color(_) => 16,
            // column-major, each column padded to a vec4
            Self::Mat3(_) => 48,
            Self::Mat4(_) => 64,
        }
    }

    /// Occupied size in buffer elements (4-byte slots), padding included.
    #[must_use]
    pub fn item_size(&self) -> usize {
        match self {
            Self::Float(_) | Self::Int(_) | Self::Uint(_) => 1,
            Self::Vec2(_) => 2,
            Self::Vec3(_) | Self::Color(_) => 3,
            Self::Vec4(_) => 4,
            Self::Mat3(_) => 12,
            Self::Mat4(_) => 16,
        }
    }

    /// Kind name for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
            Self::Vec4(_) => "vec4",
            Self::Color(_) => "color",
            Self::Mat3(_) => "mat3",
            Self::Mat4(_) => "mat4",
        }
    }
}

/// A named uniform plus its resolved element offset within the group
/// buffer. Offsets are assigned by the owning group's layout pass.
#[derive(Debug, Clone)]
pub struct Uniform {
    pub name: String,
    pub(crate) value: UniformValue,
    pub(crate) offset: usize,
}

impl Uniform {
    #[must_use]
    pub fn new(name: &str, value: UniformValue) -> Self {
        Self {
            name: name.to_string(),
            value,
            offset: 0,
        }
    }

    #[must_use]
    pub fn value(&self) -> UniformValue {
        self.value
    }

    /// Offset in buffer elements (multiply by [`BYTES_PER_ELEMENT`] for
    /// bytes).
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }
}
