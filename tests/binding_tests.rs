//! Buffer Binding Tests
//!
//! Tests for:
//! - Layout scenarios: plain values, single array tail, interleaved groups
//! - Layout properties: alignment, array end/stride relation, total size
//! - Updates: dirty tracking, idempotence, rejected values, round trips
//! - Shader text: struct mode, flat mode, interleaved nesting
//! - Offset children: dynamic offsets, parent flush, error cases

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

use myth_layout::layout::table;
use myth_layout::{
    AccessMode, BufferBinding, BufferBindingDescriptor, Element, Input, InputValue, LayoutError, LayoutSettings,
    LayoutWarning, OffsetChildBinding, OffsetChildDescriptor,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn build(descriptor: BufferBindingDescriptor) -> BufferBinding {
    init_logger();
    BufferBinding::new(descriptor).expect("binding should build")
}

fn particles(count: usize) -> BufferBinding {
    build(
        BufferBindingDescriptor::storage("particles", AccessMode::ReadWrite)
            .with_input("position", Input::new("array<vec3f>", vec![Vec3::ONE; count]))
            .with_input("normal", Input::new("array<vec3f>", vec![Vec3::Y; count])),
    )
}

// ============================================================================
// Layout Scenarios
// ============================================================================

#[test]
fn scalar_and_vec3_fill_two_rows() {
    let binding = build(
        BufferBindingDescriptor::uniform("material")
            .flat()
            .with_input("opacity", Input::new("f32", 1.0_f32))
            .with_input("color", Input::new("vec3f", Vec3::new(1.0, 0.0, 0.0))),
    );

    assert_eq!(binding.byte_size(), 32);

    let opacity = binding.element("opacity").unwrap();
    assert_eq!(opacity.start_offset(), 0);
    assert_eq!(opacity.end_offset(), 3);

    let color = binding.element("color").unwrap();
    assert_eq!(color.start_offset(), 16);
    assert_eq!(color.end_offset(), 27);

    let bytes = binding.bytes();
    assert_eq!(&bytes[0..4], &1.0_f32.to_le_bytes());
    assert_eq!(&bytes[4..16], &[0; 12]);
    assert_eq!(&bytes[16..20], &1.0_f32.to_le_bytes());
    assert_eq!(&bytes[28..32], &[0; 4]);
}

#[test]
fn equal_arrays_interleave_with_32_byte_stride() {
    let binding = particles(100);

    assert!(binding.is_interleaved());
    assert_eq!(binding.elements().len(), 2);
    for element in binding.elements() {
        assert!(element.is_interleaved());
        assert_eq!(element.num_elements(), Some(100));
        assert_eq!(element.stride(), Some(32));
    }
    assert_eq!(binding.byte_size(), 3200);
    assert!(binding.warnings().is_empty());
}

#[test]
fn interleaved_group_follows_plain_values() {
    let binding = build(
        BufferBindingDescriptor::storage("particles", AccessMode::Read)
            .with_input("position", Input::new("array<vec3f>", vec![Vec3::ONE; 4]))
            .with_input("time", Input::new("f32", 0.5_f32))
            .with_input("weight", Input::new("array<f32>", vec![1.0_f32; 4])),
    );

    let keys: Vec<_> = binding.elements().iter().map(Element::key).collect();
    assert_eq!(keys, ["time", "position", "weight"]);
    assert_eq!(binding.element("position").unwrap().start_offset(), 16);
    assert_eq!(binding.element("weight").unwrap().start_offset(), 28);
    assert_eq!(binding.element("weight").unwrap().stride(), Some(16));
    assert!(!binding.is_interleaved());
}

#[test]
fn mismatched_interleaved_lengths_drop_the_group() {
    let mut binding = build(
        BufferBindingDescriptor::storage("mixed", AccessMode::Read)
            .with_input("scale", Input::new("f32", 2.0_f32))
            .with_input("a", Input::new("array<vec4f>", vec![0.0_f32; 12]))
            .with_input("b", Input::new("array<vec4f>", vec![0.0_f32; 16])),
    );

    assert_eq!(
        binding.warnings(),
        &[LayoutWarning::InterleavedLengthMismatch {
            inputs: vec!["a".into(), "b".into()],
            counts: vec![3, 4],
        }]
    );
    assert_eq!(binding.elements().len(), 1);
    assert!(binding.element("a").is_none());
    assert!(binding.element("b").is_none());
    assert!(!binding.set_value("a", vec![0.0_f32; 12]));

    assert_eq!(binding.byte_size(), 16);
    assert!(binding.set_value("scale", 3.0_f32));
    assert_eq!(binding.update(), 1);
}

#[test]
fn declared_length_wins_over_value_length() {
    let binding = build(
        BufferBindingDescriptor::uniform("lights")
            .with_input("colors", Input::new("array<vec4f, 8>", vec![Vec4::ONE; 2])),
    );

    let colors = binding.element("colors").unwrap();
    assert_eq!(colors.num_elements(), Some(8));
    assert_eq!(binding.byte_size(), 128);

    let values = binding.extract("colors").unwrap();
    assert_eq!(values.len(), 32);
    assert_eq!(&values[..8], &[1.0; 8]);
    assert_eq!(&values[8..], &[0.0; 24]);
}

#[test]
fn matrix_lists_fill_padded_arrays() {
    let normal = Mat3::from_cols_array(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    let binding = build(
        BufferBindingDescriptor::storage("normals", AccessMode::Read)
            .with_input("matrices", Input::new("array<mat3x3f>", vec![Mat3::IDENTITY, normal])),
    );

    let values = binding.extract("matrices").unwrap();
    assert_eq!(values.len(), 24);
    assert_eq!(&values[..4], &[1.0, 0.0, 0.0, 0.0]);
    assert_eq!(&values[12..], &[1.0, 2.0, 3.0, 0.0, 4.0, 5.0, 6.0, 0.0, 7.0, 8.0, 9.0, 0.0]);

    // nine real components per matrix, as `Mat3::to_cols_array` gives them
    let columns: Vec<f32> = [Mat3::IDENTITY, normal, normal]
        .iter()
        .flat_map(Mat3::to_cols_array)
        .collect();
    let binding = build(
        BufferBindingDescriptor::storage("normals", AccessMode::Read)
            .with_input("matrices", Input::new("array<mat3x3f>", columns)),
    );
    assert_eq!(binding.element("matrices").unwrap().num_elements(), Some(3));
    let values = binding.extract("matrices").unwrap();
    assert_eq!(&values[12..24], &values[24..]);
    assert_eq!(&values[20..24], &[7.0, 8.0, 9.0, 0.0]);
}

#[test]
fn uniform_array_with_short_stride_is_reported() {
    let binding = build(
        BufferBindingDescriptor::uniform("weights")
            .with_input("count", Input::new("u32", 4_u32))
            .with_input("values", Input::new("array<f32, 4>", vec![0.25_f32; 4])),
    );

    let values = binding.element("values").unwrap();
    assert_eq!(values.start_offset(), 16);
    assert_eq!(
        binding.warnings(),
        &[LayoutWarning::UniformArrayStride {
            input: "values".into(),
            stride: 4,
        }]
    );

    let quiet = build(
        BufferBindingDescriptor::uniform("weights")
            .with_settings(LayoutSettings {
                warn_on_uniform_array_stride: false,
                ..LayoutSettings::default()
            })
            .with_input("values", Input::new("array<f32, 4>", vec![0.25_f32; 4])),
    );
    assert!(quiet.warnings().is_empty());
}

#[test]
fn empty_binding_has_no_bytes_and_no_text() {
    let binding = build(BufferBindingDescriptor::uniform("nothing"));
    assert_eq!(binding.byte_size(), 0);
    assert!(binding.elements().is_empty());
    assert!(binding.declaration().is_empty());
    assert!(!binding.should_upload());
}

#[test]
fn unknown_types_fail_construction() {
    init_logger();
    let result = BufferBinding::new(
        BufferBindingDescriptor::uniform("broken")
            .with_input("ok", Input::new("f32", 1.0_f32))
            .with_input("flag", Input::new("bool", 1.0_f32)),
    );
    assert_eq!(
        result.err(),
        Some(LayoutError::UnknownType {
            input: "flag".into(),
            type_name: "bool".into(),
        })
    );

    let result = BufferBinding::new(
        BufferBindingDescriptor::uniform("broken").with_input("list", Input::new("array<f32", vec![1.0_f32])),
    );
    assert!(matches!(result, Err(LayoutError::MalformedType { .. })));
}

// ============================================================================
// Layout Properties
// ============================================================================

#[test]
fn every_type_starts_aligned_after_every_prefix() {
    for prefix in ["f32", "vec2f", "vec3f", "f16", "mat3x3f", "vec3h"] {
        for layout in table::all() {
            let binding = build(
                BufferBindingDescriptor::storage("probe", AccessMode::ReadWrite)
                    .with_input("prefix", Input::new(prefix, 0.0_f32))
                    .with_input("value", Input::new(layout.name, 0.0_f32)),
            );
            let element = binding.element("value").unwrap();
            assert_eq!(element.start_offset() % layout.alignment, 0, "{prefix} + {}", layout.name);
            assert!(element.start_offset() > binding.element("prefix").unwrap().end_offset());
            assert_eq!(binding.byte_size(), element.padded_byte_count());
        }
    }
}

#[test]
fn array_span_matches_stride() {
    for layout in table::all() {
        for n in [1_usize, 3, 10] {
            let binding = build(
                BufferBindingDescriptor::storage("probe", AccessMode::Read)
                    .with_input("head", Input::new("f32", 0.0_f32))
                    .with_input("items", Input::new(format!("array<{}, {n}>", layout.name), vec![0.0_f32])),
            );
            let items = binding.element("items").unwrap();
            let stride = items.stride().unwrap();
            assert_eq!(items.byte_count(), stride * (n - 1) + layout.size, "{} x {n}", layout.name);
            assert_eq!(items.start_offset() % layout.alignment, 0);
            assert!(stride >= layout.size);
        }
    }
}

#[test]
fn total_size_is_last_element_padded() {
    let binding = build(
        BufferBindingDescriptor::uniform("frame")
            .with_input("view", Input::of(Mat4::IDENTITY))
            .with_input("time", Input::of(0.0_f32))
            .with_input("resolution", Input::of(Vec2::new(800.0, 600.0))),
    );
    let last = binding.elements().last().unwrap();
    assert_eq!(last.key(), "resolution");
    assert_eq!(last.start_offset(), 72);
    assert_eq!(binding.byte_size(), last.padded_byte_count());
    assert_eq!(binding.byte_size(), 80);
}

// ============================================================================
// Updates
// ============================================================================

#[test]
fn second_update_is_a_no_op() {
    let mut binding = particles(3);
    binding.clear_should_upload();
    let version = binding.region().version();

    assert_eq!(binding.update(), 0);
    assert_eq!(binding.update(), 0);
    assert!(!binding.should_upload());
    assert_eq!(binding.region().version(), version);
}

#[test]
fn rejected_array_update_keeps_previous_bytes() {
    let mut binding = particles(2);
    binding.clear_should_upload();
    let before = binding.bytes().to_vec();

    assert!(binding.set_value("position", Vec3::ZERO));
    assert_eq!(binding.update(), 0);
    assert!(!binding.should_upload());
    assert_eq!(*binding.bytes(), *before);
    assert!(!binding.is_dirty("position"));
}

#[test]
fn values_round_trip_through_every_element_kind() {
    let normal = Mat3::from_cols_array(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    let model = Mat4::from_cols_array(&std::array::from_fn(|i| i as f32));

    let mut binding = build(
        BufferBindingDescriptor::storage("everything", AccessMode::Read)
            .with_input("time", Input::of(1.5_f32))
            .with_input("frame", Input::of(7_u32))
            .with_input("offset", Input::of(glam::IVec2::new(-3, 9)))
            .with_input("color", Input::of(Vec3::new(0.1, 0.2, 0.3)))
            .with_input("normal_matrix", Input::of(normal))
            .with_input("model", Input::of(model))
            .with_input("half", Input::of(half::f16::from_f32(0.5)))
            .with_input("uv", Input::new("array<vec2f>", vec![Vec2::new(0.0, 1.0), Vec2::new(2.0, 3.0)]))
            .with_input("ids", Input::new("array<u32>", vec![10_u32, 20])),
    );

    assert_eq!(binding.extract("time"), Some(vec![1.5]));
    assert_eq!(binding.extract("frame"), Some(vec![7.0]));
    assert_eq!(binding.extract("offset"), Some(vec![-3.0, 9.0]));
    assert_eq!(
        binding.extract("color"),
        Some(vec![f64::from(0.1_f32), f64::from(0.2_f32), f64::from(0.3_f32)])
    );
    assert_eq!(
        binding.extract("normal_matrix"),
        Some((1..=9).map(f64::from).collect())
    );
    assert_eq!(binding.extract("model"), Some((0..16).map(f64::from).collect()));
    assert_eq!(binding.extract("half"), Some(vec![0.5]));
    assert_eq!(binding.extract("uv"), Some(vec![0.0, 1.0, 2.0, 3.0]));
    assert_eq!(binding.extract("ids"), Some(vec![10.0, 20.0]));

    binding.set_value("ids", vec![30_u32, 40]);
    binding.set_value("uv", vec![4.0_f32, 5.0, 6.0, 7.0]);
    assert_eq!(binding.update(), 2);
    assert_eq!(binding.extract("ids"), Some(vec![30.0, 40.0]));
    assert_eq!(binding.extract("uv"), Some(vec![4.0, 5.0, 6.0, 7.0]));
}

#[test]
fn interleaved_members_keep_their_own_values() {
    let mut binding = particles(3);
    let positions: Vec<Vec3> = (0..3).map(|i| Vec3::splat(i as f32)).collect();
    binding.set_value("position", positions.as_slice());
    binding.update();

    assert_eq!(
        binding.extract("position"),
        Some(vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0])
    );
    assert_eq!(binding.extract("normal"), Some(vec![0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0]));

    // repetition 1: position at 32, normal at 48
    let bytes = binding.bytes();
    assert_eq!(&bytes[32..36], &1.0_f32.to_le_bytes());
    assert_eq!(&bytes[52..56], &1.0_f32.to_le_bytes());
}

#[test]
fn sequences_feed_vector_inputs() {
    let mut binding = build(
        BufferBindingDescriptor::uniform("params").with_input("tint", Input::new("vec4f", vec![1.0_f32, 0.5])),
    );
    assert_eq!(binding.extract("tint"), Some(vec![1.0, 0.5, 0.0, 0.0]));

    binding.set_value("tint", InputValue::Vector4(Vec4::new(0.0, 0.0, 0.0, 1.0)));
    binding.update();
    assert_eq!(binding.extract("tint"), Some(vec![0.0, 0.0, 0.0, 1.0]));
}

// ============================================================================
// Shader Text
// ============================================================================

#[test]
fn struct_mode_emits_one_struct_and_one_variable() {
    let binding = build(
        BufferBindingDescriptor::uniform("material")
            .with_input("opacity", Input::new("f32", 1.0_f32))
            .with_input("color", Input::new("vec3<f32>", Vec3::ONE)),
    );

    let decl = binding.declaration();
    assert_eq!(
        decl.struct_text,
        "struct Material {\n    opacity: f32,\n    color: vec3f,\n}\n"
    );
    assert_eq!(decl.variable_text, "var<uniform> material: Material;\n");
}

#[test]
fn flat_mode_emits_one_variable_per_element() {
    let binding = build(
        BufferBindingDescriptor::storage("data", AccessMode::ReadWrite)
            .flat()
            .with_input("count", Input::new("atomic<u32>", 0_u32))
            .with_input("values", Input::new("array<f32>", vec![0.0_f32; 8])),
    );

    let decl = binding.declaration();
    assert!(decl.struct_text.is_empty());
    assert_eq!(
        decl.variable_text,
        "var<storage, read_write> count: atomic<u32>;\nvar<storage, read_write> values: array<f32>;\n"
    );
}

#[test]
fn flat_mode_over_one_buffer_is_reported() {
    let shared = build(
        BufferBindingDescriptor::storage("data", AccessMode::ReadWrite)
            .flat()
            .with_input("count", Input::new("atomic<u32>", 0_u32))
            .with_input("values", Input::new("array<f32>", vec![0.0_f32; 8])),
    );
    assert_eq!(
        shared.warnings(),
        &[LayoutWarning::FlatSharedBuffer {
            binding: "data".into(),
            variables: 2,
        }]
    );

    let single = build(
        BufferBindingDescriptor::storage("counter", AccessMode::ReadWrite)
            .flat()
            .with_input("hits", Input::new("atomic<u32>", 0_u32)),
    );
    assert!(single.warnings().is_empty());
}

#[test]
fn clashing_field_names_are_rejected() {
    init_logger();
    let err = BufferBinding::new(
        BufferBindingDescriptor::storage("cloud", AccessMode::Read)
            .with_input("elements", Input::new("u32", 0_u32))
            .with_input("position", Input::new("array<vec3f>", vec![Vec3::ZERO; 4]))
            .with_input("color", Input::new("array<vec3f>", vec![Vec3::ONE; 4])),
    )
    .unwrap_err();
    assert_eq!(
        err,
        LayoutError::DuplicateField {
            binding: "cloud".into(),
            field: "elements".into(),
        }
    );

    let err = BufferBinding::new(
        BufferBindingDescriptor::uniform("light")
            .with_input("color", Input::new("vec3f", Vec3::ONE))
            .with_input("tint", Input::new("vec3f", Vec3::ONE).named("color")),
    )
    .unwrap_err();
    assert!(matches!(err, LayoutError::DuplicateField { field, .. } if field == "color"));

    // the group field can be renamed out of the way
    let binding = build(
        BufferBindingDescriptor::storage("cloud", AccessMode::Read)
            .with_settings(LayoutSettings {
                interleaved_field_name: "points".into(),
                ..LayoutSettings::default()
            })
            .with_input("elements", Input::new("u32", 0_u32))
            .with_input("position", Input::new("array<vec3f>", vec![Vec3::ZERO; 4]))
            .with_input("color", Input::new("array<vec3f>", vec![Vec3::ONE; 4])),
    );
    assert!(binding.declaration().struct_text.contains("    points: array<CloudElement>,"));
}

#[test]
fn interleaved_group_becomes_nested_struct() {
    let binding = build(
        BufferBindingDescriptor::uniform("particles")
            .with_input("time", Input::new("f32", 0.0_f32))
            .with_input("position", Input::new("array<vec3f>", vec![Vec3::ZERO; 100]))
            .with_input("normal", Input::new("array<vec3f>", vec![Vec3::ZERO; 100])),
    );

    assert_eq!(
        binding.declaration().to_wgsl(),
        "struct ParticlesElement {\n    position: vec3f,\n    normal: vec3f,\n}\n\n\
         struct Particles {\n    time: f32,\n    elements: array<ParticlesElement, 100>,\n}\n\n\
         var<uniform> particles: Particles;\n"
    );

    let storage = particles(4);
    assert!(storage.declaration().struct_text.contains("elements: array<ParticlesElement>,"));
    assert_eq!(
        storage.declaration().variable_text,
        "var<storage, read_write> particles: Particles;\n"
    );
}

#[test]
fn settings_rename_interleaved_items() {
    let binding = build(
        BufferBindingDescriptor::storage("instances", AccessMode::Read)
            .with_settings(LayoutSettings {
                interleaved_field_name: "items".into(),
                interleaved_struct_suffix: "Item".into(),
                ..LayoutSettings::default()
            })
            .with_input("a", Input::new("array<f32>", vec![0.0_f32; 2]))
            .with_input("b", Input::new("array<f32>", vec![0.0_f32; 2])),
    );
    let text = binding.declaration().to_wgsl();
    assert!(text.contains("struct InstancesItem {"));
    assert!(text.contains("items: array<InstancesItem>,"));
}

// ============================================================================
// Offset Children
// ============================================================================

fn instance_descriptor() -> BufferBindingDescriptor {
    BufferBindingDescriptor::uniform("instance")
        .with_input("tint", Input::of(Vec4::ONE))
        .with_input("offset", Input::of(Vec4::ZERO))
        .with_input("scale", Input::of(Vec4::splat(2.0)))
}

#[test]
fn offset_child_rounds_to_dynamic_alignment() {
    let parent = particles(64);
    let child = OffsetChildBinding::new(OffsetChildDescriptor::new(instance_descriptor()).with_parent(&parent, 2))
        .expect("child should build");

    assert_eq!(child.byte_size(), 48);
    assert_eq!(child.offset(), 256);

    let layout = child.resource_layout_descriptor();
    assert_eq!(layout.offset, Some(256));
    assert_eq!(layout.size, Some(48));
    assert_eq!(layout.kind, parent.kind());
    assert_eq!(layout.access, AccessMode::ReadWrite);
}

#[test]
fn offset_child_writes_into_parent_region() {
    let parent = particles(64);
    parent.clear_should_upload();

    let mut child =
        OffsetChildBinding::new(OffsetChildDescriptor::new(instance_descriptor()).with_parent(&parent, 1)).unwrap();
    assert!(parent.should_upload());
    assert!(!child.should_upload());
    assert_eq!(&parent.bytes()[256..260], &1.0_f32.to_le_bytes());
    assert_eq!(&parent.bytes()[288..292], &2.0_f32.to_le_bytes());

    parent.clear_should_upload();
    child.set_value("offset", Vec4::new(5.0, 0.0, 0.0, 0.0));
    assert_eq!(child.update(), 1);
    assert!(parent.should_upload());
    assert!(!child.should_upload());
    assert_eq!(&parent.bytes()[272..276], &5.0_f32.to_le_bytes());

    parent.clear_should_upload();
    assert_eq!(child.update(), 0);
    assert!(!parent.should_upload());
}

#[test]
fn offset_child_construction_errors() {
    init_logger();
    let err = OffsetChildBinding::new(OffsetChildDescriptor::new(instance_descriptor())).unwrap_err();
    assert_eq!(err, LayoutError::MissingParent { child: "instance".into() });

    let plain = build(BufferBindingDescriptor::uniform("plain").with_input("x", Input::of(1.0_f32)));
    let err = OffsetChildBinding::new(OffsetChildDescriptor::new(instance_descriptor()).with_parent(&plain, 0))
        .unwrap_err();
    assert_eq!(err, LayoutError::ParentNotInterleaved { parent: "plain".into() });

    let small = particles(2);
    let err = OffsetChildBinding::new(OffsetChildDescriptor::new(instance_descriptor()).with_parent(&small, 3))
        .unwrap_err();
    assert!(matches!(err, LayoutError::ChildOutOfBounds { offset: 256, size: 48, parent_size: 64 }));

    let err = OffsetChildBinding::new(OffsetChildDescriptor::new(instance_descriptor()).with_parent(&small, usize::MAX))
        .unwrap_err();
    assert!(matches!(err, LayoutError::ChildOutOfBounds { offset: u64::MAX, size: 48, .. }));
}

#[test]
fn offset_child_survives_parent_drop() {
    let parent = particles(64);
    let mut child =
        OffsetChildBinding::new(OffsetChildDescriptor::new(instance_descriptor()).with_parent(&parent, 0)).unwrap();
    assert!(child.has_parent());

    drop(parent);
    assert!(!child.has_parent());
    child.set_value("tint", Vec4::ZERO);
    assert_eq!(child.update(), 0);
}
