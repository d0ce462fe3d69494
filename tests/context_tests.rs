//! Render-context cache tests.
//!
//! Tests for:
//! - Context identity per attachment signature, MRT id and call depth
//! - Format changes yielding fresh contexts
//! - Target disposal dropping derived contexts

use wgpu::TextureFormat;

use weft::{RenderContextCache, RenderTarget};

#[test]
fn same_target_and_depth_share_one_context() {
    let mut contexts = RenderContextCache::new();
    let target = RenderTarget::new(&[TextureFormat::Rgba16Float], 512, 512);

    let id = contexts.get(Some(&target), None, 0).id();
    assert_eq!(contexts.get(Some(&target), None, 0).id(), id);
    assert_eq!(contexts.context_count(), 1);
}

#[test]
fn call_depth_and_mrt_id_split_contexts() {
    let mut contexts = RenderContextCache::new();
    let target = RenderTarget::new(&[TextureFormat::Rgba16Float], 512, 512);

    let base = contexts.get(Some(&target), None, 0).id();
    assert_ne!(contexts.get(Some(&target), None, 1).id(), base);
    assert_ne!(contexts.get(Some(&target), Some(7), 0).id(), base);
    assert_eq!(contexts.context_count(), 3);
}

#[test]
fn default_framebuffer_has_its_own_context() {
    let mut contexts = RenderContextCache::new();
    let target = RenderTarget::new(&[TextureFormat::Rgba16Float], 512, 512);

    let on_target = contexts.get(Some(&target), None, 0).id();
    let on_screen = contexts.get(None, None, 0).id();
    assert_ne!(on_target, on_screen);

    let context = contexts.get(None, None, 0);
    assert_eq!(context.color_formats[0], TextureFormat::Bgra8UnormSrgb);
    assert!(context.depth && context.stencil);
}

#[test]
fn format_change_yields_a_fresh_context() {
    let mut contexts = RenderContextCache::new();
    let mut target = RenderTarget::new(&[TextureFormat::Rgba16Float], 512, 512);

    let before = contexts.get(Some(&target), None, 0).id();

    target.color_formats[0] = TextureFormat::Rgba8Unorm;
    let after = contexts.get(Some(&target), None, 0).id();
    assert_ne!(before, after);
}

#[test]
fn context_carries_the_target_attachments() {
    let mut contexts = RenderContextCache::new();
    let mut target = RenderTarget::new(
        &[TextureFormat::Rgba16Float, TextureFormat::Rgba8Unorm],
        256,
        128,
    );
    target.sample_count = 4;

    let context = contexts.get(Some(&target), None, 0);
    assert_eq!(context.color_formats.len(), 2);
    assert_eq!(context.sample_count, 4);
    assert_eq!((context.width, context.height), (256, 128));
}

#[test]
fn dispose_target_drops_only_its_contexts() {
    let mut contexts = RenderContextCache::new();
    let doomed = RenderTarget::new(&[TextureFormat::Rgba16Float], 512, 512);
    let kept = RenderTarget::new(&[TextureFormat::Rgba16Float], 512, 512);

    contexts.get(Some(&doomed), None, 0);
    contexts.get(Some(&doomed), None, 1);
    contexts.get(Some(&kept), None, 0);
    contexts.get(None, None, 0);
    assert_eq!(contexts.context_count(), 4);

    contexts.dispose_target(&doomed);
    assert_eq!(contexts.context_count(), 2);
}
