use std::borrow::Cow;

use rustc_hash::FxHashMap;

use super::region::ByteRegion;
use super::shader::{DeclarationSource, ShaderDeclaration};
use super::{
    AccessMode, BindingKind, BufferBindingDescriptor, InputValue, LogicalInput, ResourceLayoutDescriptor,
};
use crate::elements::{ArrayElement, Element, GroupMember, InterleavedArrayElement, ScalarElement};
use crate::errors::{LayoutError, LayoutWarning, Result};
use crate::layout::{BYTES_PER_ROW, TypeDecl};
use crate::settings::LayoutSettings;

/// A block of shader-visible values packed into one byte region.
///
/// # Layout
///
/// Non-array inputs are placed first, in declaration order. Array inputs
/// follow:
/// - one array input is appended last as an [`ArrayElement`]
/// - several array inputs of equal repetition count become one interleaved
///   "array of struct" group
/// - several array inputs of unequal counts are dropped with a
///   [`LayoutWarning::InterleavedLengthMismatch`]
///
/// The byte size is the padded size of the last element, rounded to a whole
/// 16-byte row.
///
/// Construction fails when two fields of the declaration would share a
/// name, e.g. a plain input called like the interleaved group field.
///
/// # Updates
///
/// [`set_value`](Self::set_value) stores a value and marks the input dirty;
/// [`update`](Self::update) writes every dirty input and raises the
/// region's upload flag when anything was written.
pub struct BufferBinding {
    name: String,
    label: String,
    kind: BindingKind,
    access: AccessMode,
    visibility: wgpu::ShaderStages,
    use_struct: bool,
    settings: LayoutSettings,

    inputs: Vec<LogicalInput>,
    lookup: FxHashMap<String, usize>,
    elements: Vec<Element>,

    region: ByteRegion,
    declaration: ShaderDeclaration,
    warnings: Vec<LayoutWarning>,
    layout_version: u64,
}

impl BufferBinding {
    /// Computes the layout, allocates the region, writes the initial values
    /// and generates the shader text.
    ///
    /// Fails when an input type is unknown or malformed.
    pub fn new(descriptor: BufferBindingDescriptor) -> Result<Self> {
        let BufferBindingDescriptor {
            label,
            name,
            kind,
            access,
            visibility,
            use_struct,
            settings,
            inputs,
        } = descriptor;

        let access = match kind {
            BindingKind::Uniform => AccessMode::Read,
            BindingKind::Storage => access,
        };

        let mut parsed = Vec::with_capacity(inputs.len());
        for (key, input) in inputs {
            let decl = TypeDecl::parse(&key, &input.type_name)?;
            parsed.push(LogicalInput::new(key, input, decl));
        }

        let (plain, arrays): (Vec<_>, Vec<_>) = parsed.into_iter().partition(|input| !input.decl.is_array());

        let mut layout = Layouter {
            kind,
            settings: &settings,
            elements: Vec::with_capacity(plain.len() + arrays.len()),
            warnings: Vec::new(),
            cursor: 0,
        };

        let mut inputs = layout.place_plain(plain);
        inputs.extend(match arrays.len() {
            0 => Vec::new(),
            1 => layout.place_array(arrays),
            _ => layout.place_interleaved(arrays),
        });
        let Layouter {
            elements, mut warnings, ..
        } = layout;

        let source = DeclarationSource {
            name: &name,
            kind,
            access,
            use_struct,
            settings: &settings,
            elements: &elements,
        };
        if let Some(field) = source.duplicate_identifier() {
            return Err(LayoutError::DuplicateField {
                binding: name.clone(),
                field,
            });
        }
        let variables = source.variable_count();
        if variables > 1 {
            let warning = LayoutWarning::FlatSharedBuffer {
                binding: name.clone(),
                variables,
            };
            log::warn!("{warning}");
            warnings.push(warning);
        }
        let declaration = source.generate();

        let total = elements.last().map_or(0, Element::padded_byte_count);
        let label = label.unwrap_or_else(|| name.clone());
        let region = ByteRegion::new(total, &label);

        let lookup = inputs
            .iter()
            .enumerate()
            .map(|(index, input)| (input.key.clone(), index))
            .collect();

        let mut binding = Self {
            name,
            label,
            kind,
            access,
            visibility,
            use_struct,
            settings,
            inputs,
            lookup,
            elements,
            region,
            declaration,
            warnings,
            layout_version: 0,
        };

        binding.update();

        log::info!(
            "Built binding `{}`: {} elements, {} bytes, {} warnings",
            binding.name,
            binding.elements.len(),
            total,
            binding.warnings.len()
        );

        Ok(binding)
    }

    // ========================================================================
    // Updates
    // ========================================================================

    /// Writes every dirty input into the region.
    ///
    /// Pre-update callbacks transform a copy of the stored value; the value
    /// itself stays as assigned, so rewriting it packs the same bytes.
    /// Returns the number of inputs written. Rejected values are logged,
    /// their previous bytes stay in place.
    pub fn update(&mut self) -> usize {
        let mut written = 0;
        let mut state = self.region.write();

        for input in self.inputs.iter_mut().filter(|input| input.dirty) {
            input.dirty = false;
            let value = match &input.on_before_update {
                Some(callback) => {
                    let mut value = input.value.clone();
                    callback(&mut value);
                    Cow::Owned(value)
                }
                None => Cow::Borrowed(&input.value),
            };

            let Some(element) = self.elements.get_mut(input.element) else {
                continue;
            };
            match element.write(&mut state.bytes, &value) {
                Ok(()) => written += 1,
                Err(warning) => log::warn!("Binding `{}`: {warning}", self.name),
            }
        }

        if written > 0 {
            state.mark_written();
        }
        written
    }

    /// Stores a new value and marks the input dirty.
    ///
    /// Unknown keys are logged and ignored; returns whether the key existed.
    pub fn set_value(&mut self, key: &str, value: impl Into<InputValue>) -> bool {
        match self.try_set_value(key, value) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("{err}");
                false
            }
        }
    }

    pub fn try_set_value(&mut self, key: &str, value: impl Into<InputValue>) -> Result<()> {
        let input = self.input_mut(key)?;
        input.value = value.into();
        input.dirty = true;
        Ok(())
    }

    /// Forces the input to be rewritten on the next update, e.g. after its
    /// callback starts producing different values.
    pub fn mark_dirty(&mut self, key: &str) -> bool {
        match self.input_mut(key) {
            Ok(input) => {
                input.dirty = true;
                true
            }
            Err(err) => {
                log::warn!("{err}");
                false
            }
        }
    }

    /// Current logical value of an input.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&InputValue> {
        self.input(key).map(|input| &input.value)
    }

    /// `true` while the input waits for the next update.
    #[must_use]
    pub fn is_dirty(&self, key: &str) -> bool {
        self.input(key).is_some_and(|input| input.dirty)
    }

    fn input(&self, key: &str) -> Option<&LogicalInput> {
        self.lookup.get(key).map(|&index| &self.inputs[index])
    }

    fn input_mut(&mut self, key: &str) -> Result<&mut LogicalInput> {
        match self.lookup.get(key) {
            Some(&index) => Ok(&mut self.inputs[index]),
            None => Err(LayoutError::UnknownInput {
                binding: self.name.clone(),
                input: key.to_string(),
            }),
        }
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn access(&self) -> AccessMode {
        self.access
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Element packing the input `key`.
    #[must_use]
    pub fn element(&self, key: &str) -> Option<&Element> {
        self.input(key).and_then(|input| self.elements.get(input.element))
    }

    /// Reads the packed value of `key` back in logical order.
    #[must_use]
    pub fn extract(&self, key: &str) -> Option<Vec<f64>> {
        let element = self.element(key)?;
        Some(element.extract(&self.region.bytes()))
    }

    /// `true` when the binding is made of one interleaved group only.
    #[must_use]
    pub fn is_interleaved(&self) -> bool {
        !self.elements.is_empty() && self.elements.iter().all(Element::is_interleaved)
    }

    /// Problems recorded while laying out the binding.
    #[inline]
    #[must_use]
    pub fn warnings(&self) -> &[LayoutWarning] {
        &self.warnings
    }

    // ========================================================================
    // Upload collaborator
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn region(&self) -> &ByteRegion {
        &self.region
    }

    #[inline]
    #[must_use]
    pub fn byte_size(&self) -> usize {
        self.region.len()
    }

    #[inline]
    pub fn bytes(&self) -> parking_lot::MappedRwLockReadGuard<'_, [u8]> {
        self.region.bytes()
    }

    #[inline]
    #[must_use]
    pub fn should_upload(&self) -> bool {
        self.region.should_upload()
    }

    #[inline]
    pub fn clear_should_upload(&self) {
        self.region.clear_should_upload();
    }

    #[inline]
    #[must_use]
    pub fn declaration(&self) -> &ShaderDeclaration {
        &self.declaration
    }

    #[must_use]
    pub fn resource_layout_descriptor(&self) -> ResourceLayoutDescriptor {
        ResourceLayoutDescriptor {
            kind: self.kind,
            access: self.access,
            visibility: self.visibility,
            offset: None,
            size: None,
        }
    }

    /// Bumped whenever [`resource_layout_descriptor`](Self::resource_layout_descriptor)
    /// changes; cached binding table entries built from an older version are stale.
    #[inline]
    #[must_use]
    pub fn layout_version(&self) -> u64 {
        self.layout_version
    }

    /// Switches address space and access mode.
    ///
    /// An access change alone only regenerates the shader text. Changing the
    /// address space rebuilds the layout from the current values, since
    /// uniform and storage arrays follow different rules; the region is then
    /// a new one.
    pub fn set_binding_kind(&mut self, kind: BindingKind, access: AccessMode) -> Result<()> {
        let access = match kind {
            BindingKind::Uniform => AccessMode::Read,
            BindingKind::Storage => access,
        };
        if kind == self.kind && access == self.access {
            return Ok(());
        }

        let layout_version = self.layout_version + 1;
        if kind == self.kind {
            self.access = access;
            self.declaration = self.generate_declaration(&self.name);
        } else {
            let mut descriptor = self.to_descriptor();
            descriptor.kind = kind;
            descriptor.access = access;
            *self = Self::new(descriptor)?;
        }
        self.layout_version = layout_version;

        log::debug!("Binding `{}` switched to {kind:?} / {access:?}", self.name);
        Ok(())
    }

    // ========================================================================
    // Cloning
    // ========================================================================

    /// Descriptor that rebuilds this binding with its current values.
    #[must_use]
    pub fn to_descriptor(&self) -> BufferBindingDescriptor {
        BufferBindingDescriptor {
            label: Some(self.label.clone()),
            name: self.name.clone(),
            kind: self.kind,
            access: self.access,
            visibility: self.visibility,
            use_struct: self.use_struct,
            settings: self.settings.clone(),
            inputs: self
                .inputs
                .iter()
                .map(|input| (input.key.clone(), input.to_input()))
                .collect(),
        }
    }

    /// Structural copy under another name.
    ///
    /// Spans are copied verbatim, the bytes are deep-copied into a new
    /// region and the shader text is only regenerated when the name differs.
    #[must_use]
    pub fn clone_with_name(&self, name: &str) -> Self {
        let (label, declaration) = if name == self.name {
            (self.label.clone(), self.declaration.clone())
        } else {
            (name.to_string(), self.generate_declaration(name))
        };

        Self {
            name: name.to_string(),
            region: self.region.duplicate(&label),
            label,
            kind: self.kind,
            access: self.access,
            visibility: self.visibility,
            use_struct: self.use_struct,
            settings: self.settings.clone(),
            inputs: self.inputs.clone(),
            lookup: self.lookup.clone(),
            elements: self.elements.clone(),
            declaration,
            warnings: self.warnings.clone(),
            layout_version: self.layout_version,
        }
    }

    fn generate_declaration(&self, name: &str) -> ShaderDeclaration {
        DeclarationSource {
            name,
            kind: self.kind,
            access: self.access,
            use_struct: self.use_struct,
            settings: &self.settings,
            elements: &self.elements,
        }
        .generate()
    }
}

impl Clone for BufferBinding {
    fn clone(&self) -> Self {
        self.clone_with_name(&self.name)
    }
}

impl std::fmt::Debug for BufferBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferBinding")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("access", &self.access)
            .field("elements", &self.elements.len())
            .field("byte_size", &self.byte_size())
            .field("warnings", &self.warnings)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Layout pass
// ============================================================================

/// Places elements one after another and records warnings.
struct Layouter<'a> {
    kind: BindingKind,
    settings: &'a LayoutSettings,
    elements: Vec<Element>,
    warnings: Vec<LayoutWarning>,
    /// First free byte after the last placed element.
    cursor: usize,
}

impl Layouter<'_> {
    fn push(&mut self, input: &mut LogicalInput, element: Element) {
        self.cursor = element.end_offset() + 1;
        input.element = self.elements.len();
        self.elements.push(element);
    }

    fn warn(&mut self, warning: LayoutWarning) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    fn place_plain(&mut self, mut inputs: Vec<LogicalInput>) -> Vec<LogicalInput> {
        for input in &mut inputs {
            let element = ScalarElement::new(&input.key, &input.name, input.decl.layout, self.cursor);
            self.push(input, Element::Scalar(element));
        }
        inputs
    }

    fn place_array(&mut self, mut inputs: Vec<LogicalInput>) -> Vec<LogicalInput> {
        let min_alignment = match self.kind {
            BindingKind::Uniform => BYTES_PER_ROW,
            BindingKind::Storage => 1,
        };

        for input in &mut inputs {
            let element = ArrayElement::new(
                &input.key,
                &input.name,
                input.decl.layout,
                input.decl.declared_length(),
                input.decl.repetitions(input.value.len()),
                self.cursor,
                min_alignment,
            );

            if self.kind == BindingKind::Uniform
                && self.settings.warn_on_uniform_array_stride
                && element.stride() % BYTES_PER_ROW != 0
            {
                self.warn(LayoutWarning::UniformArrayStride {
                    input: input.key.clone(),
                    stride: element.stride(),
                });
            }

            self.push(input, Element::Array(element));
        }
        inputs
    }

    fn place_interleaved(&mut self, mut inputs: Vec<LogicalInput>) -> Vec<LogicalInput> {
        let counts: Vec<usize> = inputs
            .iter()
            .map(|input| input.decl.repetitions(input.value.len()))
            .collect();

        if counts.windows(2).any(|pair| pair[0] != pair[1]) {
            self.warn(LayoutWarning::InterleavedLengthMismatch {
                inputs: inputs.iter().map(|input| input.key.clone()).collect(),
                counts,
            });
            return Vec::new();
        }

        let members: Vec<GroupMember<'_>> = inputs
            .iter()
            .map(|input| GroupMember {
                key: &input.key,
                name: &input.name,
                layout: input.decl.layout,
            })
            .collect();

        let group = InterleavedArrayElement::layout_group(
            &members,
            counts[0],
            self.cursor,
            self.kind == BindingKind::Uniform,
        );

        for (input, element) in inputs.iter_mut().zip(group) {
            self.push(input, Element::Interleaved(element));
        }
        inputs
    }
}
