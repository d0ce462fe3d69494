/// Frame and memory telemetry.
///
/// `calls` doubles as the geometry-update call id: the renderer bumps it
/// once per render call, and attribute uploads are de-duplicated against
/// it. Call ids are never reset — monotonicity is what makes the
/// de-duplication sound across frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderStats {
    /// Monotonic render-call counter.
    pub calls: u64,
    /// Draw commands issued this frame.
    pub draws: u64,
    /// Live geometries holding GPU buffers.
    pub geometries: u32,
    /// Live textures holding GPU memory.
    pub textures: u32,
}

impl RenderStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new render call; attribute updates within one call id
    /// upload each physical buffer at most once.
    pub fn next_call(&mut self) {
        self.calls += 1;
    }

    /// Per-frame reset. Memory counters and the call counter persist.
    pub fn reset(&mut self) {
        self.draws = 0;
    }
}
