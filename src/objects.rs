//! Render objects, compute nodes, and the collaborator seams to the
//! node/material system.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::bindings::{BindGroup, UniformsGroup};
use crate::resources::Geometry;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

fn next_object_id() -> u64 {
    NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Material facts the cache layer needs: a display name for shader
/// labels and the wireframe flag driving derived-index selection. The
/// full material description lives with the node system.
#[derive(Debug, Clone, Default)]
pub struct MaterialState {
    pub name: String,
    pub wireframe: bool,
}

/// One drawable: geometry plus material plus the bind groups produced by
/// the node system.
#[derive(Debug)]
pub struct RenderObject {
    id: u64,
    pub geometry: Arc<Geometry>,
    pub material: MaterialState,
    pub bind_groups: Vec<BindGroup>,
}

impl RenderObject {
    #[must_use]
    pub fn new(geometry: Arc<Geometry>, material: MaterialState) -> Self {
        Self {
            id: next_object_id(),
            geometry,
            material,
            bind_groups: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// One compute dispatch source. `version` bumps on node-graph edits and
/// staleness-checks the cached compute pipeline.
#[derive(Debug)]
pub struct ComputeNode {
    id: u64,
    pub name: String,
    version: u64,
    pub bind_groups: Vec<BindGroup>,
}

impl ComputeNode {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            id: next_object_id(),
            name: name.to_string(),
            version: 1,
            bind_groups: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Marks the node graph as edited; the next pipeline request rebuilds.
    pub fn invalidate(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}

/// Shader text for one render object, as produced by the external code
/// generator.
#[derive(Debug, Clone)]
pub struct RenderShaderSet {
    pub vertex: String,
    pub fragment: String,
}

/// The node/material code generator. Treated as a black box that turns a
/// render object or compute node into shader source text.
pub trait ShaderGenerator {
    fn render_shaders(&mut self, object: &RenderObject) -> RenderShaderSet;
    fn compute_shader(&mut self, node: &ComputeNode) -> String;
}

/// The node system's uniform refresh hook.
///
/// Called once per uniforms-group binding per update; returning `false`
/// means the group's values cannot have changed and the rest of that
/// binding's update is skipped.
pub trait UniformSource {
    fn refresh(&mut self, group: &mut UniformsGroup) -> bool;
}

/// [`UniformSource`] for hosts that stage uniform values directly via
/// [`UniformsGroup::set`]: every group is considered worth diffing.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectUniforms;

impl UniformSource for DirectUniforms {
    fn refresh(&mut self, _group: &mut UniformsGroup) -> bool {
        true
    }
}
