//! GPU buffer bookkeeping per CPU attribute.
//!
//! One GPU buffer exists per *physical* [`BufferRef`]; all records are
//! keyed by the backing buffer's id, so any number of interleaved
//! attribute views normalize to a single entry before any version check.
//!
//! [`BufferRef`]: crate::resources::BufferRef

use crate::backend::Backend;
use crate::errors::Result;
use crate::resources::{Attribute, AttributeKind, AttributeUsage};

use super::side_table::SideTable;

#[derive(Debug)]
struct AttributeRecord {
    /// Last uploaded data version.
    version: u64,
    kind: AttributeKind,
}

/// Creates, re-uploads and destroys one GPU buffer per attribute.
#[derive(Debug, Default)]
pub struct AttributeBuffers {
    table: SideTable<AttributeRecord>,
}

impl AttributeBuffers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn has(&self, attribute: &Attribute) -> bool {
        self.table.has(attribute.buffer_id())
    }

    /// Kind the buffer was created as, if it exists.
    #[must_use]
    pub fn kind_of(&self, attribute: &Attribute) -> Option<AttributeKind> {
        self.table.get(attribute.buffer_id()).map(|r| r.kind)
    }

    /// Ensures the GPU buffer exists and is current.
    ///
    /// First sight dispatches to the creation call matching `kind` and
    /// snapshots the version. Later calls re-upload iff the tracked
    /// version is stale or the attribute is dynamic-usage (dynamic
    /// buffers are re-synced every call: frame-to-frame rewrites without
    /// a version bump are part of their contract).
    pub fn update(
        &mut self,
        backend: &mut dyn Backend,
        attribute: &Attribute,
        kind: AttributeKind,
    ) -> Result<()> {
        if kind == AttributeKind::Index {
            attribute.index_format()?;
        }

        let id = attribute.buffer_id();
        if let Some(record) = self.table.get_mut(id) {
            let stale = record.version != attribute.version();
            if stale || attribute.usage == AttributeUsage::Dynamic {
                backend.update_attribute(attribute);
                record.version = attribute.version();
            }
            return Ok(());
        }

        match kind {
            AttributeKind::Vertex => backend.create_attribute(attribute),
            AttributeKind::Index => backend.create_index_attribute(attribute),
            AttributeKind::Storage => backend.create_storage_attribute(attribute),
            AttributeKind::Indirect => backend.create_indirect_attribute(attribute),
        }
        self.table.insert(
            id,
            AttributeRecord {
                version: attribute.version(),
                kind,
            },
        );
        Ok(())
    }

    /// Destroys the GPU buffer if one exists; the record is removed
    /// either way.
    pub fn delete(&mut self, backend: &mut dyn Backend, attribute: &Attribute) {
        if self.table.remove(attribute.buffer_id()).is_some() {
            backend.destroy_attribute(attribute);
        }
    }

    /// Number of live GPU buffers.
    #[must_use]
    pub fn buffer_count(&self) -> usize {
        self.table.len()
    }
}
