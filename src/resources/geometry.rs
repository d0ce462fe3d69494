use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;

use super::attribute::Attribute;

static NEXT_GEOMETRY_ID: AtomicU64 = AtomicU64::new(1);

/// A set of named vertex/storage attributes plus optional index and
/// indirect-draw attributes.
///
/// Geometries carry a stable id minted at construction; the cache layer
/// keeps all GPU-side state in side tables keyed by that id. Releasing a
/// geometry's GPU buffers is an explicit [`GeometryCache::dispose`] call.
///
/// [`GeometryCache::dispose`]: crate::cache::GeometryCache::dispose
#[derive(Debug, Default)]
pub struct Geometry {
    id: u64,
    attributes: FxHashMap<String, Attribute>,
    index: Option<Attribute>,
    indirect: Option<Attribute>,
}

impl Geometry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed),
            attributes: FxHashMap::default(),
            index: None,
            indirect: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn set_attribute(&mut self, name: &str, attribute: Attribute) {
        self.attributes.insert(name.to_string(), attribute);
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<Attribute> {
        self.attributes.remove(name)
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    #[must_use]
    pub fn attributes(&self) -> &FxHashMap<String, Attribute> {
        &self.attributes
    }

    /// The `position` attribute, when present. Wireframe derivation falls
    /// back to it for non-indexed geometry.
    #[must_use]
    pub fn position(&self) -> Option<&Attribute> {
        self.attributes.get("position")
    }

    pub fn set_index(&mut self, index: Attribute) {
        self.index = Some(index);
    }

    #[must_use]
    pub fn index(&self) -> Option<&Attribute> {
        self.index.as_ref()
    }

    pub fn set_indirect(&mut self, indirect: Attribute) {
        self.indirect = Some(indirect);
    }

    #[must_use]
    pub fn indirect(&self) -> Option<&Attribute> {
        self.indirect.as_ref()
    }
}
