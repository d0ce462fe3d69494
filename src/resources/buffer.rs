use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::Pod;
use parking_lot::{RwLock, RwLockReadGuard};

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// CPU-side byte store shared between attribute views and the upload path.
///
/// Vertex, index, uniform, storage and indirect data all live in a
/// `DataBuffer`. The `version` counter is bumped on every mutation and is
/// the single source of truth for "does the GPU copy need a re-upload".
#[derive(Debug)]
pub struct DataBuffer {
    id: u64,
    label: String,
    version: AtomicU64,
    data: RwLock<Vec<u8>>,
    usage: wgpu::BufferUsages,
}

/// Cheaply clonable handle to a [`DataBuffer`].
///
/// Several attribute views over one interleaved buffer hold clones of the
/// same `BufferRef`, so version checks and cache keys always resolve to
/// the physical buffer. Equality and hashing go by id.
#[derive(Debug, Clone)]
pub struct BufferRef(Arc<DataBuffer>);

impl PartialEq for BufferRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for BufferRef {}

impl std::hash::Hash for BufferRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl BufferRef {
    pub fn new<T: Pod>(data: &[T], usage: wgpu::BufferUsages, label: Option<&str>) -> Self {
        Self::from_bytes(bytemuck::cast_slice(data), usage, label)
    }

    pub fn from_bytes(data: &[u8], usage: wgpu::BufferUsages, label: Option<&str>) -> Self {
        Self(Arc::new(DataBuffer {
            id: NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed),
            label: label.unwrap_or("Buffer").to_string(),
            version: AtomicU64::new(1),
            data: RwLock::new(data.to_vec()),
            usage,
        }))
    }

    /// Zero-filled buffer of `len` bytes (compute capture targets).
    #[must_use]
    pub fn zeroed(len: usize, usage: wgpu::BufferUsages, label: Option<&str>) -> Self {
        Self::from_bytes(&vec![0u8; len], usage, label)
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Current data version. Lock-free.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.0.version.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn usage(&self) -> wgpu::BufferUsages {
        self.0.usage
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.0.label
    }

    #[must_use]
    pub fn byte_length(&self) -> usize {
        self.0.data.read().len()
    }

    /// Replaces the entire contents and bumps the version.
    pub fn update<T: Pod>(&self, data: &[T]) {
        {
            let mut inner = self.0.data.write();
            let bytes: &[u8] = bytemuck::cast_slice(data);
            if inner.len() != bytes.len() {
                inner.resize(bytes.len(), 0);
            }
            inner.copy_from_slice(bytes);
        }
        self.0.version.fetch_add(1, Ordering::Relaxed);
    }

    /// Overwrites a byte range in place and bumps the version.
    ///
    /// Out-of-range writes are ignored with a log entry rather than
    /// panicking mid-frame.
    pub fn update_region<T: Pod>(&self, offset_bytes: usize, data: &[T]) {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let mut inner = self.0.data.write();
        let end = offset_bytes + bytes.len();
        if end <= inner.len() {
            inner[offset_bytes..end].copy_from_slice(bytes);
            drop(inner);
            self.0.version.fetch_add(1, Ordering::Relaxed);
        } else {
            log::warn!(
                "update_region past end of buffer {:?} ({} > {})",
                self.0.label,
                end,
                inner.len()
            );
        }
    }

    /// Read access to the raw bytes.
    #[must_use]
    pub fn read(&self) -> RwLockReadGuard<'_, Vec<u8>> {
        self.0.data.read()
    }
}

#[cfg(test)]
mod tests {
    use super::BufferRef;

    #[test]
    fn updates_bump_the_version() {
        let buffer = BufferRef::new(&[0u32; 4], wgpu::BufferUsages::VERTEX, None);
        let v0 = buffer.version();

        buffer.update(&[1u32; 4]);
        assert_eq!(buffer.version(), v0 + 1);

        buffer.update_region(4, &[9u32]);
        assert_eq!(buffer.version(), v0 + 2);
        assert_eq!(buffer.read()[4..8], 9u32.to_le_bytes());
    }

    #[test]
    fn out_of_range_region_writes_are_dropped() {
        let buffer = BufferRef::new(&[0u32; 2], wgpu::BufferUsages::VERTEX, None);
        let v0 = buffer.version();
        buffer.update_region(6, &[1u32]);
        assert_eq!(buffer.version(), v0, "failed write must not dirty");
    }

    #[test]
    fn interleaved_clones_share_identity() {
        let buffer = BufferRef::new(&[0u32; 2], wgpu::BufferUsages::VERTEX, None);
        let view = buffer.clone();
        assert_eq!(buffer, view);
        assert_eq!(buffer.id(), view.id());
        buffer.update(&[1u32; 2]);
        assert_eq!(view.version(), buffer.version());
    }
}
