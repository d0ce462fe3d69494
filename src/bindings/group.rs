//! STD140 uniform group with dirty-diff updates.
//!
//! A [`UniformsGroup`] owns an ordered list of scalar/vector/matrix
//! uniforms and a backing element buffer laid out per STD140 rules. The
//! layout is recomputed whenever the uniform list changes; `update()`
//! diffs staged values against the buffer component-by-component and only
//! writes (and reports a change) on an actual difference — the bindings
//! layer uses that flag to decide whether bytes are pushed to the GPU.

use std::sync::atomic::{AtomicU64, Ordering};

use glam::Mat3;

use crate::errors::{Result, WeftError};

use super::uniform::{BYTES_PER_ELEMENT, GPU_CHUNK_BYTES, Uniform, UniformValue};

static NEXT_GROUP_ID: AtomicU64 = AtomicU64::new(1);

/// Ordered list of uniforms sharing one GPU-visible uniform buffer.
#[derive(Debug)]
pub struct UniformsGroup {
    id: u64,
    pub name: String,
    pub visibility: wgpu::ShaderStages,
    uniforms: Vec<Uniform>,
    /// Backing store; integer uniforms are bit-reinterpreted into the
    /// same slots.
    data: Vec<f32>,
    byte_length: usize,
}

impl UniformsGroup {
    #[must_use]
    pub fn new(name: &str, visibility: wgpu::ShaderStages) -> Self {
        Self {
            id: NEXT_GROUP_ID.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
            visibility,
            uniforms: Vec::new(),
            data: Vec::new(),
            byte_length: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Appends a uniform and recomputes the layout.
    pub fn add_uniform(&mut self, name: &str, value: UniformValue) {
        self.uniforms.push(Uniform::new(name, value));
        self.compute_layout();
    }

    /// Builder-style [`add_uniform`](Self::add_uniform).
    #[must_use]
    pub fn with_uniform(mut self, name: &str, value: UniformValue) -> Self {
        self.add_uniform(name, value);
        self
    }

    pub fn remove_uniform(&mut self, name: &str) -> Option<Uniform> {
        let position = self.uniforms.iter().position(|u| u.name == name)?;
        let removed = self.uniforms.remove(position);
        self.compute_layout();
        Some(removed)
    }

    #[must_use]
    pub fn uniform(&self, name: &str) -> Option<&Uniform> {
        self.uniforms.iter().find(|u| u.name == name)
    }

    #[must_use]
    pub fn uniforms(&self) -> &[Uniform] {
        &self.uniforms
    }

    /// Stages a new value. The buffer is untouched until the next
    /// `update()`. Changing the value kind is an error — it would shift
    /// every following offset.
    pub fn set(&mut self, name: &str, value: UniformValue) -> Result<()> {
        let uniform = self
            .uniforms
            .iter_mut()
            .find(|u| u.name == name)
            .ok_or_else(|| WeftError::UnknownUniform(name.to_string()))?;
        if std::mem::discriminant(&uniform.value) != std::mem::discriminant(&value) {
            return Err(WeftError::UniformTypeMismatch {
                name: name.to_string(),
                declared: uniform.value.kind(),
                provided: value.kind(),
            });
        }
        uniform.value = value;
        Ok(())
    }

    /// Total byte length of the group buffer, rounded up to a whole
    /// STD140 chunk.
    #[must_use]
    pub fn byte_length(&self) -> usize {
        self.byte_length
    }

    /// Raw bytes of the backing buffer, sized to `byte_length()`.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Assigns STD140 offsets for the current uniform list.
    ///
    /// For each uniform: if the space left in the current 16-byte chunk
    /// is smaller than the uniform's boundary, advance to the next chunk;
    /// otherwise pad to the boundary alignment.
    fn compute_layout(&mut self) {
        let mut offset = 0usize; // bytes
        for uniform in &mut self.uniforms {
            let boundary = uniform.value.boundary();
            let chunk_offset = offset % GPU_CHUNK_BYTES;
            if chunk_offset != 0 && GPU_CHUNK_BYTES - chunk_offset < boundary {
                offset += GPU_CHUNK_BYTES - chunk_offset;
            } else if chunk_offset % boundary != 0 {
                offset += boundary - chunk_offset % boundary;
            }
            uniform.offset = offset / BYTES_PER_ELEMENT;
            offset += uniform.value.item_size() * BYTES_PER_ELEMENT;
        }
        self.byte_length = offset.div_ceil(GPU_CHUNK_BYTES) * GPU_CHUNK_BYTES;
        // Old contents are discarded; the next update() rewrites every
        // slot that differs from zero.
        self.data = vec![0.0; self.byte_length / BYTES_PER_ELEMENT];
    }

    /// Flushes staged values into the buffer. Returns true iff at least
    /// one component actually changed.
    pub fn update(&mut self) -> bool {
        let mut updated = false;
        for i in 0..self.uniforms.len() {
            let offset = self.uniforms[i].offset;
            let value = self.uniforms[i].value;
            if self.apply(offset, value) {
                updated = true;
            }
        }
        updated
    }

    fn apply(&mut self, offset: usize, value: UniformValue) -> bool {
        match value {
            UniformValue::Float(v) => self.write_floats(offset, &[v]),
            UniformValue::Int(v) => self.write_bits(offset, &[v as u32]),
            UniformValue::Uint(v) => self.write_bits(offset, &[v]),
            UniformValue::Vec2(v) => self.write_floats(offset, &v.to_array()),
            UniformValue::Vec3(v) | UniformValue::Color(v) => {
                self.write_floats(offset, &v.to_array())
            }
            UniformValue::Vec4(v) => self.write_floats(offset, &v.to_array()),
            UniformValue::Mat3(m) => self.write_mat3(offset, &m),
            UniformValue::Mat4(m) => self.write_floats(offset, &m.to_cols_array()),
        }
    }

    fn write_floats(&mut self, offset: usize, values: &[f32]) -> bool {
        let slots = &mut self.data[offset..offset + values.len()];
        if slots == values {
            return false;
        }
        slots.copy_from_slice(values);
        true
    }

    /// Integer uniforms share the float backing store; comparison and
    /// write go through the bit pattern.
    fn write_bits(&mut self, offset: usize, values: &[u32]) -> bool {
        let mut changed = false;
        for (slot, &bits) in self.data[offset..offset + values.len()]
            .iter_mut()
            .zip(values)
        {
            if slot.to_bits() != bits {
                *slot = f32::from_bits(bits);
                changed = true;
            }
        }
        changed
    }

    /// Each mat3 column occupies a padded vec4 slot.
    fn write_mat3(&mut self, offset: usize, m: &Mat3) -> bool {
        let cols = m.to_cols_array();
        let mut changed = false;
        for col in 0..3 {
            let src = &cols[col * 3..col * 3 + 3];
            if self.write_floats(offset + col * 4, src) {
                changed = true;
            }
        }
        changed
    }
}

/// Raw byte-blob uniform buffer binding over a shared [`BufferRef`].
///
/// Unlike [`UniformsGroup`] there is no per-field diffing; a version
/// bump on the backing buffer marks the whole range for re-upload.
#[derive(Debug)]
pub struct UniformBuffer {
    id: u64,
    pub name: String,
    pub visibility: wgpu::ShaderStages,
    pub buffer: crate::resources::BufferRef,
    last_version: Option<u64>,
}

impl UniformBuffer {
    #[must_use]
    pub fn new(
        name: &str,
        visibility: wgpu::ShaderStages,
        buffer: crate::resources::BufferRef,
    ) -> Self {
        Self {
            id: NEXT_GROUP_ID.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
            visibility,
            buffer,
            last_version: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Version-gated change check. True on first call and after every
    /// buffer mutation since the last call.
    pub fn update(&mut self) -> bool {
        let version = self.buffer.version();
        if self.last_version == Some(version) {
            return false;
        }
        self.last_version = Some(version);
        true
    }
}
