//! Bind-group realization and refresh.
//!
//! Native bind-group objects are created exactly once per [`BindGroup`]
//! and rebuilt **only** on structural change (a texture hot-swap, a
//! sampler identity change) — never per-frame for unchanged resources.
//! Data-only changes (uniform bytes, texture pixels) flow through
//! `update_binding` / `update_texture` and leave the native object
//! untouched.

use crate::backend::Backend;
use crate::bindings::{BindGroup, Binding};
use crate::errors::Result;
use crate::objects::{ComputeNode, RenderObject, UniformSource};
use crate::resources::AttributeKind;
use crate::settings::CacheSettings;

use super::attributes::AttributeBuffers;
use super::side_table::SideTable;

/// Multiplier folding texture ids into the group cache index.
const CACHE_INDEX_PRIME: u64 = 4919;

/// Presence marks the group as realized; the native object and its
/// caching state live with the backend.
#[derive(Debug, Default)]
struct BindGroupRecord;

/// Builds and refreshes bind groups for render objects and compute
/// nodes.
#[derive(Debug, Default)]
pub struct BindingCache {
    groups: SideTable<BindGroupRecord>,
    settings: CacheSettings,
}

impl BindingCache {
    #[must_use]
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            groups: SideTable::new(),
            settings,
        }
    }

    /// Lazily realizes every bind group of the object. Idempotent.
    pub fn get_for_render(
        &mut self,
        backend: &mut dyn Backend,
        attributes: &mut AttributeBuffers,
        object: &mut RenderObject,
    ) -> Result<()> {
        for group in &mut object.bind_groups {
            self.init_group(backend, attributes, group)?;
        }
        Ok(())
    }

    /// Compute-node counterpart of [`get_for_render`](Self::get_for_render).
    pub fn get_for_compute(
        &mut self,
        backend: &mut dyn Backend,
        attributes: &mut AttributeBuffers,
        node: &mut ComputeNode,
    ) -> Result<()> {
        for group in &mut node.bind_groups {
            self.init_group(backend, attributes, group)?;
        }
        Ok(())
    }

    /// First-sight realization: snapshot every binding's tracked state,
    /// materialize backing resources, then create the native object.
    fn init_group(
        &mut self,
        backend: &mut dyn Backend,
        attributes: &mut AttributeBuffers,
        group: &mut BindGroup,
    ) -> Result<()> {
        if self.groups.has(group.id()) {
            return Ok(());
        }

        for binding in &mut group.bindings {
            match binding {
                Binding::Uniforms(uniforms) => {
                    uniforms.update();
                }
                Binding::UniformBuffer(buffer) => {
                    buffer.update();
                }
                Binding::Sampler(sampler) => {
                    sampler.update();
                }
                Binding::Texture(texture) => {
                    texture.update();
                    backend.update_texture(&texture.texture);
                }
                Binding::Storage(storage) => {
                    let kind = if storage.attribute.is_indirect() {
                        AttributeKind::Indirect
                    } else {
                        AttributeKind::Storage
                    };
                    attributes.update(backend, &storage.attribute, kind)?;
                }
            }
        }

        backend.create_bindings(group, 0, 0);
        self.groups.insert(group.id(), BindGroupRecord::default());
        log::debug!("bind group {} ({}) created", group.id(), group.name);
        Ok(())
    }

    pub fn update_for_render(
        &mut self,
        backend: &mut dyn Backend,
        attributes: &mut AttributeBuffers,
        uniforms: &mut dyn UniformSource,
        object: &mut RenderObject,
    ) -> Result<()> {
        for group in &mut object.bind_groups {
            self.update_group(backend, attributes, uniforms, group)?;
        }
        Ok(())
    }

    pub fn update_for_compute(
        &mut self,
        backend: &mut dyn Backend,
        attributes: &mut AttributeBuffers,
        uniforms: &mut dyn UniformSource,
        node: &mut ComputeNode,
    ) -> Result<()> {
        for group in &mut node.bind_groups {
            self.update_group(backend, attributes, uniforms, group)?;
        }
        Ok(())
    }

    fn update_group(
        &mut self,
        backend: &mut dyn Backend,
        attributes: &mut AttributeBuffers,
        uniforms: &mut dyn UniformSource,
        group: &mut BindGroup,
    ) -> Result<()> {
        self.init_group(backend, attributes, group)?;

        let mut needs_bindings_update = false;
        let mut cache_index: u64 = 0;
        let mut cacheable = true;
        let mut version: u64 = 0;

        for binding in &mut group.bindings {
            let mut push_bytes = false;
            match binding {
                Binding::Uniforms(group_uniforms) => {
                    if !uniforms.refresh(group_uniforms) {
                        continue;
                    }
                    if group_uniforms.update() {
                        push_bytes = true;
                    }
                }
                Binding::UniformBuffer(buffer) => {
                    if buffer.update() {
                        push_bytes = true;
                    }
                }
                Binding::Sampler(sampler) => {
                    if sampler.update() {
                        needs_bindings_update = true;
                    }
                }
                Binding::Texture(texture) => {
                    let result = texture.update();
                    if result.rebound {
                        needs_bindings_update = true;
                    }
                    if result.uploaded {
                        backend.update_texture(&texture.texture);
                    }

                    if texture.store {
                        // Written by a compute pass; regenerate mips when
                        // next sampled, not on every write.
                        if texture.texture.generates_mipmaps() {
                            if self.settings.lazy_mipmaps {
                                texture.texture.set_mipmap_dirty(true);
                            } else {
                                backend.generate_mipmaps(&texture.texture);
                            }
                        }
                    } else if texture.texture.mipmap_dirty()
                        && texture.texture.generates_mipmaps()
                    {
                        backend.generate_mipmaps(&texture.texture);
                        texture.texture.set_mipmap_dirty(false);
                    }

                    if texture.texture.is_external() {
                        // Externally-owned contents can change without a
                        // version bump; caching is unsound for this group.
                        cacheable = false;
                    } else {
                        cache_index = cache_index
                            .wrapping_mul(CACHE_INDEX_PRIME)
                            .wrapping_add(texture.texture.id());
                        version = version.wrapping_add(texture.texture.version());
                    }
                }
                Binding::Storage(storage) => {
                    let kind = if storage.attribute.is_indirect() {
                        AttributeKind::Indirect
                    } else {
                        AttributeKind::Storage
                    };
                    attributes.update(backend, &storage.attribute, kind)?;
                }
            }
            if push_bytes {
                backend.update_binding(binding);
            }
        }

        if needs_bindings_update {
            let index = if cacheable { cache_index } else { 0 };
            backend.update_bindings(group, index, version);
        }

        Ok(())
    }

    /// Drops the record of a disposed object's groups. The backend owns
    /// and frees the native objects.
    pub fn delete_groups(&mut self, groups: &[BindGroup]) {
        for group in groups {
            self.groups.remove(group.id());
        }
    }

    /// Number of realized bind groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}
