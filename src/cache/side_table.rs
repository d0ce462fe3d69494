use rustc_hash::FxHashMap;

/// Per-entity side table.
///
/// Every cacheable entity (buffer, geometry, texture, bind group, render
/// object, compute node) carries a stable `u64` id minted at
/// construction; backend-private state lives here, keyed by that id.
/// Removal is explicit and driven by the owning entity's disposal — the
/// table itself never owns GPU resources.
///
/// No iteration is exposed; callers that need enumeration track their
/// own key sets.
#[derive(Debug)]
pub struct SideTable<V> {
    entries: FxHashMap<u64, V>,
}

impl<V> Default for SideTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> SideTable<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<&V> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut V> {
        self.entries.get_mut(&id)
    }

    /// The "create if absent" path of the side-table contract.
    pub fn get_or_insert_with(&mut self, id: u64, create: impl FnOnce() -> V) -> &mut V {
        self.entries.entry(id).or_insert_with(create)
    }

    pub fn insert(&mut self, id: u64, value: V) -> Option<V> {
        self.entries.insert(id, value)
    }

    #[must_use]
    pub fn has(&self, id: u64) -> bool {
        self.entries.contains_key(&id)
    }

    /// Removes and returns the record; unknown ids return `None`, never
    /// an error.
    pub fn remove(&mut self, id: u64) -> Option<V> {
        self.entries.remove(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
