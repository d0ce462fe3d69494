//! Uniform layout and dirty-diff tests.
//!
//! Tests for:
//! - UniformsGroup: STD140 offsets, chunk rounding, padded mat3 columns
//! - UniformsGroup::update: component-level diffing, integer slots
//! - UniformBuffer: version-gated updates

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use wgpu::ShaderStages;

use weft::{BufferRef, UniformBuffer, UniformValue, UniformsGroup, WeftError};

fn group() -> UniformsGroup {
    UniformsGroup::new("test", ShaderStages::FRAGMENT)
}

// ============================================================================
// STD140 Layout
// ============================================================================

#[test]
fn layout_vec3_float_vec4() {
    let group = group()
        .with_uniform("direction", UniformValue::Vec3(Vec3::ZERO))
        .with_uniform("intensity", UniformValue::Float(0.0))
        .with_uniform("color", UniformValue::Vec4(Vec4::ZERO));

    let offsets: Vec<usize> = group.uniforms().iter().map(|u| u.offset() * 4).collect();
    assert_eq!(offsets, vec![0, 12, 16], "byte offsets follow STD140");
    assert_eq!(group.byte_length(), 32);
}

#[test]
fn layout_float_then_vec2_pads_to_boundary() {
    let group = group()
        .with_uniform("scale", UniformValue::Float(0.0))
        .with_uniform("offset", UniformValue::Vec2(Vec2::ZERO));

    let offsets: Vec<usize> = group.uniforms().iter().map(|u| u.offset() * 4).collect();
    assert_eq!(offsets, vec![0, 8]);
    assert_eq!(group.byte_length(), 16);
}

#[test]
fn layout_vec3_never_straddles_a_chunk() {
    // After a float at 0, a vec3 cannot fit in the 12 remaining bytes of
    // the first chunk.
    let group = group()
        .with_uniform("time", UniformValue::Float(0.0))
        .with_uniform("normal", UniformValue::Vec3(Vec3::ZERO));

    assert_eq!(group.uniforms()[1].offset() * 4, 16);
    assert_eq!(group.byte_length(), 32);
}

#[test]
fn layout_single_float_rounds_up_to_one_chunk() {
    let group = group().with_uniform("time", UniformValue::Float(0.0));
    assert_eq!(group.byte_length(), 16);
}

#[test]
fn layout_mat3_occupies_three_padded_columns() {
    let group = group()
        .with_uniform("opacity", UniformValue::Float(0.0))
        .with_uniform("uv_transform", UniformValue::Mat3(Mat3::IDENTITY));

    // mat3 aligns to a fresh chunk and spans 48 bytes.
    assert_eq!(group.uniforms()[1].offset() * 4, 16);
    assert_eq!(group.byte_length(), 64);
}

#[test]
fn layout_mat4_is_contiguous() {
    let group = group().with_uniform("mvp", UniformValue::Mat4(Mat4::IDENTITY));
    assert_eq!(group.byte_length(), 64);
}

// ============================================================================
// Dirty-diff update
// ============================================================================

#[test]
fn update_reports_change_only_once() {
    let mut group = group()
        .with_uniform("color", UniformValue::Vec3(Vec3::new(1.0, 0.5, 0.25)))
        .with_uniform("intensity", UniformValue::Float(2.0));

    assert!(group.update(), "first update writes staged values");
    assert!(!group.update(), "unchanged values produce no writes");
    assert!(!group.update());
}

#[test]
fn update_detects_a_single_component_change() {
    let mut group = group()
        .with_uniform("color", UniformValue::Vec3(Vec3::ONE))
        .with_uniform("direction", UniformValue::Vec4(Vec4::ONE));

    group.update();
    let before = group.bytes().to_vec();

    group
        .set("color", UniformValue::Vec3(Vec3::new(1.0, 0.0, 1.0)))
        .unwrap();
    assert!(group.update());

    let after = group.bytes();
    // Only the y component of `color` (bytes 4..8) differs.
    assert_ne!(&after[4..8], &before[4..8]);
    assert_eq!(&after[0..4], &before[0..4]);
    assert_eq!(&after[8..], &before[8..]);
}

#[test]
fn update_mat3_writes_into_padded_columns() {
    let matrix = Mat3::from_cols_array(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    let mut group = group().with_uniform("m", UniformValue::Mat3(matrix));
    assert!(group.update());

    let floats: &[f32] = bytemuck::cast_slice(group.bytes());
    assert_eq!(&floats[0..3], &[1.0, 2.0, 3.0]);
    assert_eq!(floats[3], 0.0, "column padding stays zero");
    assert_eq!(&floats[4..7], &[4.0, 5.0, 6.0]);
    assert_eq!(&floats[8..11], &[7.0, 8.0, 9.0]);
}

#[test]
fn integer_uniforms_share_the_float_store_bitwise() {
    let mut group = group()
        .with_uniform("count", UniformValue::Uint(7))
        .with_uniform("mode", UniformValue::Int(-3));

    assert!(group.update());
    assert!(!group.update());

    let slots: &[u32] = bytemuck::cast_slice(group.bytes());
    assert_eq!(slots[0], 7);
    assert_eq!(slots[1] as i32, -3);

    group.set("count", UniformValue::Uint(8)).unwrap();
    assert!(group.update());
}

#[test]
fn set_unknown_uniform_is_an_error() {
    let mut group = group().with_uniform("color", UniformValue::Vec3(Vec3::ZERO));
    assert!(matches!(
        group.set("colour", UniformValue::Vec3(Vec3::ZERO)),
        Err(WeftError::UnknownUniform(_))
    ));
}

#[test]
fn set_with_mismatched_kind_is_an_error() {
    let mut group = group().with_uniform("color", UniformValue::Vec3(Vec3::ZERO));
    assert!(matches!(
        group.set("color", UniformValue::Float(1.0)),
        Err(WeftError::UniformTypeMismatch { .. })
    ));
}

#[test]
fn removing_a_uniform_recomputes_the_layout() {
    let mut group = group()
        .with_uniform("a", UniformValue::Float(1.0))
        .with_uniform("b", UniformValue::Vec4(Vec4::ONE));

    assert_eq!(group.byte_length(), 32);
    group.remove_uniform("a");
    assert_eq!(group.byte_length(), 16);
    assert_eq!(group.uniforms()[0].offset(), 0);
}

// ============================================================================
// UniformBuffer (raw blob, version-gated)
// ============================================================================

#[test]
fn uniform_buffer_updates_once_per_version() {
    let buffer = BufferRef::new(
        &[0.0f32; 4],
        wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        Some("Params"),
    );
    let mut binding = UniformBuffer::new("params", ShaderStages::VERTEX, buffer.clone());

    assert!(binding.update(), "first sight uploads");
    assert!(!binding.update());

    buffer.update(&[1.0f32, 2.0, 3.0, 4.0]);
    assert!(binding.update(), "version bump re-uploads");
    assert!(!binding.update());
}
