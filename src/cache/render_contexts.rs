//! Current-frame render-target descriptors, cached by attachment
//! signature.

use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

static NEXT_TARGET_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Host-owned description of an offscreen render target.
#[derive(Debug)]
pub struct RenderTarget {
    id: u64,
    pub color_formats: SmallVec<[wgpu::TextureFormat; 4]>,
    pub depth_format: Option<wgpu::TextureFormat>,
    pub sample_count: u32,
    pub width: u32,
    pub height: u32,
}

impl RenderTarget {
    #[must_use]
    pub fn new(color_formats: &[wgpu::TextureFormat], width: u32, height: u32) -> Self {
        Self {
            id: NEXT_TARGET_ID.fetch_add(1, Ordering::Relaxed),
            color_formats: SmallVec::from_slice(color_formats),
            depth_format: Some(wgpu::TextureFormat::Depth24PlusStencil8),
            sample_count: 1,
            width,
            height,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Fingerprint of everything a pipeline or pass depends on: target
    /// identity, attachment formats and sample count.
    #[must_use]
    pub fn attachment_signature(&self) -> String {
        let mut signature = format!("t{}|", self.id);
        for format in &self.color_formats {
            signature.push_str(&format!("{format:?},"));
        }
        signature.push_str(&format!("|{:?}|s{}", self.depth_format, self.sample_count));
        signature
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Mutable per-call state of one render-target configuration.
#[derive(Debug)]
pub struct RenderContext {
    id: u64,
    pub color_formats: SmallVec<[wgpu::TextureFormat; 4]>,
    pub depth_format: Option<wgpu::TextureFormat>,
    pub sample_count: u32,
    pub width: u32,
    pub height: u32,
    pub viewport: Option<Rect>,
    pub scissor: Option<Rect>,
    pub clear_color: Option<[f64; 4]>,
    pub clear_depth: Option<f32>,
    pub clear_stencil: Option<u32>,
    pub depth: bool,
    pub stencil: bool,
    pub occlusion_query_count: u32,
}

impl RenderContext {
    fn for_target(target: Option<&RenderTarget>) -> Self {
        let (color_formats, depth_format, sample_count, width, height) = match target {
            Some(t) => (
                t.color_formats.clone(),
                t.depth_format,
                t.sample_count,
                t.width,
                t.height,
            ),
            None => (
                SmallVec::from_slice(&[wgpu::TextureFormat::Bgra8UnormSrgb]),
                Some(wgpu::TextureFormat::Depth24PlusStencil8),
                1,
                0,
                0,
            ),
        };
        Self {
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
            color_formats,
            depth_format,
            sample_count,
            width,
            height,
            viewport: None,
            scissor: None,
            clear_color: None,
            clear_depth: None,
            clear_stencil: None,
            depth: depth_format.is_some(),
            stencil: depth_format == Some(wgpu::TextureFormat::Depth24PlusStencil8),
            occlusion_query_count: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Cache of [`RenderContext`]s keyed by
/// `attachment signature : mrt id : call depth`.
///
/// A format change on a target yields a new signature (and thus a fresh
/// context); nested render calls at different depths never share state.
#[derive(Debug, Default)]
pub struct RenderContextCache {
    contexts: FxHashMap<String, RenderContext>,
}

impl RenderContextCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &mut self,
        target: Option<&RenderTarget>,
        mrt_id: Option<u64>,
        call_depth: u32,
    ) -> &mut RenderContext {
        let key = Self::key(target, mrt_id, call_depth);
        self.contexts
            .entry(key)
            .or_insert_with(|| RenderContext::for_target(target))
    }

    fn key(target: Option<&RenderTarget>, mrt_id: Option<u64>, call_depth: u32) -> String {
        let signature = target.map_or_else(
            || "default".to_string(),
            RenderTarget::attachment_signature,
        );
        format!("{signature}:{}:{call_depth}", mrt_id.unwrap_or(0))
    }

    /// Drops every context derived from the given target.
    pub fn dispose_target(&mut self, target: &RenderTarget) {
        let prefix = format!("t{}|", target.id);
        self.contexts.retain(|key, _| !key.starts_with(&prefix));
    }

    #[must_use]
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }
}
