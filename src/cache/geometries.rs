//! Per-geometry GPU state: one-shot initialization, attribute
//! forwarding with per-call de-duplication, and the derived wireframe
//! index.

use rustc_hash::FxHashMap;

use crate::backend::Backend;
use crate::errors::{Result, WeftError};
use crate::objects::RenderObject;
use crate::resources::{Attribute, AttributeKind, Geometry};
use crate::stats::RenderStats;
use crate::utils::warn_once;

use super::attributes::AttributeBuffers;
use super::side_table::SideTable;

#[derive(Debug, Default)]
struct GeometryRecord {
    wireframe: Option<WireframeIndex>,
}

#[derive(Debug)]
struct WireframeIndex {
    attribute: Attribute,
    /// Version of the source index (or position) the line list was
    /// derived from.
    source_version: u64,
}

/// Owns per-geometry lifecycle and forwards attribute uploads.
#[derive(Debug, Default)]
pub struct GeometryCache {
    table: SideTable<GeometryRecord>,
    /// Physical buffer id → call id of its last upload this pass.
    attribute_calls: FxHashMap<u64, u64>,
}

impl GeometryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn has(&self, geometry: &Geometry) -> bool {
        self.table.has(geometry.id())
    }

    /// Initialization happens exactly once per geometry instance.
    fn init(&mut self, stats: &mut RenderStats, geometry: &Geometry) {
        if self.table.has(geometry.id()) {
            return;
        }
        self.table.insert(geometry.id(), GeometryRecord::default());
        stats.geometries += 1;
        log::debug!("geometry {} initialized", geometry.id());
    }

    /// Refreshes every GPU buffer the object's draw will read.
    pub fn update_for_render(
        &mut self,
        backend: &mut dyn Backend,
        attributes: &mut AttributeBuffers,
        stats: &mut RenderStats,
        object: &RenderObject,
    ) -> Result<()> {
        let geometry = &object.geometry;
        self.init(stats, geometry);
        let call_id = stats.calls;

        for attribute in geometry.attributes().values() {
            let kind = if attribute.is_storage() {
                AttributeKind::Storage
            } else {
                AttributeKind::Vertex
            };
            self.update_attribute(backend, attributes, attribute, kind, call_id)?;
        }

        if let Some(index) = self.index_for_render(backend, attributes, object)? {
            self.update_attribute(backend, attributes, &index, AttributeKind::Index, call_id)?;
        }

        if let Some(indirect) = geometry.indirect() {
            self.update_attribute(backend, attributes, indirect, AttributeKind::Indirect, call_id)?;
        }

        Ok(())
    }

    /// Forwards to [`AttributeBuffers::update`] unless this physical
    /// buffer was already uploaded under the same call id — an attribute
    /// shared by several render objects in one pass uploads at most once
    /// per pass, dynamic buffers included.
    fn update_attribute(
        &mut self,
        backend: &mut dyn Backend,
        attributes: &mut AttributeBuffers,
        attribute: &Attribute,
        kind: AttributeKind,
        call_id: u64,
    ) -> Result<()> {
        let buffer_id = attribute.buffer_id();
        if self.attribute_calls.get(&buffer_id) == Some(&call_id) {
            return Ok(());
        }
        attributes.update(backend, attribute, kind)?;
        self.attribute_calls.insert(buffer_id, call_id);
        Ok(())
    }

    /// The index the draw actually uses: the geometry's own index, or a
    /// derived line-list index when the material renders wireframe.
    pub fn index_for_render(
        &mut self,
        backend: &mut dyn Backend,
        attributes: &mut AttributeBuffers,
        object: &RenderObject,
    ) -> Result<Option<Attribute>> {
        if object.material.wireframe {
            return Ok(Some(self.wireframe_index(backend, attributes, &object.geometry)?));
        }
        Ok(object.geometry.index().cloned())
    }

    /// Memoized wireframe index, re-derived when the source version
    /// changes. The stale GPU buffer is destroyed before regeneration.
    fn wireframe_index(
        &mut self,
        backend: &mut dyn Backend,
        attributes: &mut AttributeBuffers,
        geometry: &Geometry,
    ) -> Result<Attribute> {
        let source_version = wireframe_source_version(geometry);
        let record = self
            .table
            .get_or_insert_with(geometry.id(), GeometryRecord::default);

        if let Some(wireframe) = &record.wireframe
            && wireframe.source_version == source_version
        {
            return Ok(wireframe.attribute.clone());
        }

        if let Some(stale) = record.wireframe.take() {
            attributes.delete(backend, &stale.attribute);
        }

        let attribute = build_wireframe_index(geometry)?;
        record.wireframe = Some(WireframeIndex {
            attribute: attribute.clone(),
            source_version,
        });
        Ok(attribute)
    }

    /// Releases every GPU buffer the geometry holds: index, vertex and
    /// storage attributes, the indirect buffer, and the derived wireframe
    /// index. One-shot — a second call finds no record and does nothing.
    /// Decrements the geometry memory counter.
    pub fn dispose(
        &mut self,
        backend: &mut dyn Backend,
        attributes: &mut AttributeBuffers,
        stats: &mut RenderStats,
        geometry: &Geometry,
    ) {
        let Some(record) = self.table.remove(geometry.id()) else {
            return;
        };

        for attribute in geometry.attributes().values() {
            attributes.delete(backend, attribute);
            self.attribute_calls.remove(&attribute.buffer_id());
        }
        if let Some(index) = geometry.index() {
            attributes.delete(backend, index);
            self.attribute_calls.remove(&index.buffer_id());
        }
        if let Some(indirect) = geometry.indirect() {
            attributes.delete(backend, indirect);
            self.attribute_calls.remove(&indirect.buffer_id());
        }
        if let Some(wireframe) = record.wireframe {
            attributes.delete(backend, &wireframe.attribute);
            self.attribute_calls.remove(&wireframe.attribute.buffer_id());
        }

        stats.geometries = stats.geometries.saturating_sub(1);
        log::debug!("geometry {} disposed", geometry.id());
    }
}

/// The wireframe line list derives from the index when present, else
/// from the position attribute.
fn wireframe_source_version(geometry: &Geometry) -> u64 {
    if let Some(index) = geometry.index() {
        index.version()
    } else if let Some(position) = geometry.position() {
        position.version()
    } else {
        0
    }
}

/// For each triangle `(a, b, c)` emits the edges `(a, b)`, `(b, c)`,
/// `(c, a)` as a flat line-list index.
///
/// Storage is 16-bit unless any emitted index reaches 65535 — that value
/// is the 16-bit primitive-restart sentinel and must not appear as a
/// real index.
fn build_wireframe_index(geometry: &Geometry) -> Result<Attribute> {
    let triangles: Vec<u32> = if let Some(index) = geometry.index() {
        read_indices(index)?
    } else if let Some(position) = geometry.position() {
        (0..position.count).collect()
    } else {
        warn_once(
            "wireframe-no-source",
            "wireframe requested for a geometry with neither index nor position; drawing nothing",
        );
        Vec::new()
    };

    let mut edges: Vec<u32> = Vec::with_capacity(triangles.len() * 2);
    for triangle in triangles.chunks_exact(3) {
        let (a, b, c) = (triangle[0], triangle[1], triangle[2]);
        edges.extend_from_slice(&[a, b, b, c, c, a]);
    }

    let needs_u32 = edges.iter().any(|&i| i >= u32::from(u16::MAX));
    if needs_u32 {
        Ok(Attribute::for_index_u32(&edges))
    } else {
        let narrow: Vec<u16> = edges.iter().map(|&i| i as u16).collect();
        Ok(Attribute::for_index_u16(&narrow))
    }
}

/// Widens the index attribute's contents to `u32`.
fn read_indices(index: &Attribute) -> Result<Vec<u32>> {
    let guard = index.buffer.read();
    let offset = (index.offset as usize).min(guard.len());
    let end = (offset + index.count as usize * index.stride as usize).min(guard.len());
    let bytes = &guard[offset..end];
    match index.format {
        wgpu::VertexFormat::Uint16 => {
            let values: &[u16] = bytemuck::cast_slice(bytes);
            Ok(values.iter().map(|&i| u32::from(i)).collect())
        }
        wgpu::VertexFormat::Uint32 => {
            let values: &[u32] = bytemuck::cast_slice(bytes);
            Ok(values.to_vec())
        }
        format => Err(WeftError::UnsupportedIndexFormat {
            label: index.buffer.label().to_string(),
            format,
        }),
    }
}
