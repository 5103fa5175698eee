//! WGSL declaration text
//!
//! Struct mode emits one struct with a field per element and a single
//! variable of that struct type. Interleaved members move into a nested
//! struct that the outer struct holds as an array field:
//!
//! ```wgsl
//! struct ParticlesElement {
//!     position: vec3f,
//!     normal: vec3f,
//! }
//!
//! struct Particles {
//!     time: f32,
//!     elements: array<ParticlesElement, 100>,
//! }
//!
//! var<uniform> particles: Particles;
//! ```
//!
//! Flat mode emits one variable per element (the interleaved group being one
//! variable holding the array of the nested struct).
//!
//! Members placed past their natural WGSL offset carry `@align(16)` so the
//! shader sees the exact byte layout of the region.

use std::fmt::Write as _;

use rustc_hash::FxHashSet;

use super::{AccessMode, BindingKind};
use crate::elements::{Element, ElementInfo};
use crate::settings::LayoutSettings;

/// Generated declaration text of one binding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ShaderDeclaration {
    /// Struct definitions, empty in flat mode without interleaved members.
    pub struct_text: String,
    /// `var<…>` declarations, one per line.
    pub variable_text: String,
}

impl ShaderDeclaration {
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.struct_text.is_empty() && self.variable_text.is_empty()
    }

    /// Struct text followed by the variables.
    #[must_use]
    pub fn to_wgsl(&self) -> String {
        match (self.struct_text.is_empty(), self.variable_text.is_empty()) {
            (true, _) => self.variable_text.clone(),
            (false, true) => self.struct_text.clone(),
            (false, false) => format!("{}\n{}", self.struct_text, self.variable_text),
        }
    }

    /// Prefixes every variable with `@group(group) @binding(n)`, numbering
    /// consecutive variables from `binding`.
    #[must_use]
    pub fn with_location(&self, group: u32, binding: u32) -> Self {
        let mut variable_text = String::with_capacity(self.variable_text.len() + 32);
        let mut next = binding;
        for line in self.variable_text.lines() {
            if line.starts_with("var") {
                let _ = writeln!(variable_text, "@group({group}) @binding({next}) {line}");
                next += 1;
            } else {
                let _ = writeln!(variable_text, "{line}");
            }
        }

        Self {
            struct_text: self.struct_text.clone(),
            variable_text,
        }
    }
}

/// Inputs of the generator, borrowed from the binding.
pub(crate) struct DeclarationSource<'a> {
    pub name: &'a str,
    pub kind: BindingKind,
    pub access: AccessMode,
    pub use_struct: bool,
    pub settings: &'a LayoutSettings,
    pub elements: &'a [Element],
}

impl DeclarationSource<'_> {
    pub fn generate(&self) -> ShaderDeclaration {
        if self.elements.is_empty() {
            return ShaderDeclaration::default();
        }

        let struct_name = struct_name(self.name);
        let group_struct = format!("{struct_name}{}", self.settings.interleaved_struct_suffix);

        let interleaved: Vec<&Element> = self.elements.iter().filter(|e| e.is_interleaved()).collect();
        let plain: Vec<&Element> = self.elements.iter().filter(|e| !e.is_interleaved()).collect();

        let mut struct_text = String::new();
        let group_type = interleaved.first().map(|first| {
            let fields = interleaved.iter().map(|e| field_line(e.info(), e.layout().name));
            push_struct(&mut struct_text, &group_struct, fields);
            self.array_type(&group_struct, first.num_elements(), None)
        });

        let address_space = self.address_space();
        let mut variable_text = String::new();

        if self.use_struct {
            let mut fields: Vec<String> = plain.iter().map(|e| field_line(e.info(), &self.type_text(e))).collect();
            if let Some(group_type) = &group_type {
                fields.push(format!("    {}: {group_type},", self.settings.interleaved_field_name));
            }

            if !struct_text.is_empty() {
                struct_text.push('\n');
            }
            push_struct(&mut struct_text, &struct_name, fields.into_iter());

            let _ = writeln!(variable_text, "var<{address_space}> {}: {struct_name};", self.name);
        } else {
            for element in &plain {
                let _ = writeln!(
                    variable_text,
                    "var<{address_space}> {}: {};",
                    element.name(),
                    self.type_text(element)
                );
            }
            if let Some(group_type) = &group_type {
                let _ = writeln!(variable_text, "var<{address_space}> {}: {group_type};", self.name);
            }
        }

        ShaderDeclaration {
            struct_text,
            variable_text,
        }
    }

    /// Number of top-level `var` declarations [`generate`](Self::generate) emits.
    pub fn variable_count(&self) -> usize {
        if self.use_struct {
            return usize::from(!self.elements.is_empty());
        }
        let plain = self.elements.iter().filter(|e| !e.is_interleaved()).count();
        plain + usize::from(self.elements.iter().any(Element::is_interleaved))
    }

    /// First identifier declared twice in one scope: the outer struct (or
    /// the flat variables) and the nested group struct.
    pub fn duplicate_identifier(&self) -> Option<String> {
        let (interleaved, plain): (Vec<&Element>, Vec<&Element>) =
            self.elements.iter().partition(|e| e.is_interleaved());
        let group_name = if self.use_struct {
            self.settings.interleaved_field_name.as_str()
        } else {
            self.name
        };

        let outer = plain
            .into_iter()
            .map(Element::name)
            .chain((!interleaved.is_empty()).then_some(group_name));
        first_duplicate(outer)
            .or_else(|| first_duplicate(interleaved.into_iter().map(Element::name)))
            .map(str::to_string)
    }

    fn address_space(&self) -> String {
        match self.kind {
            BindingKind::Uniform => "uniform".to_string(),
            BindingKind::Storage => format!("storage, {}", self.access.wgsl_name()),
        }
    }

    /// `array<T, N>` for uniform bindings (and declared lengths), `array<T>`
    /// otherwise.
    fn array_type(&self, element_type: &str, num_elements: Option<usize>, declared: Option<usize>) -> String {
        let length = match self.kind {
            BindingKind::Uniform => num_elements,
            BindingKind::Storage => declared,
        };
        match length {
            Some(n) => format!("array<{element_type}, {n}>"),
            None => format!("array<{element_type}>"),
        }
    }

    fn type_text(&self, element: &Element) -> String {
        match element {
            Element::Array(array) => {
                self.array_type(array.info().layout.name, Some(array.num_elements()), array.declared_length())
            }
            _ => element.layout().name.to_string(),
        }
    }
}

fn field_line(info: &ElementInfo, type_text: &str) -> String {
    match info.align_attribute {
        Some(align) => format!("    @align({align}) {}: {type_text},", info.name),
        None => format!("    {}: {type_text},", info.name),
    }
}

fn first_duplicate<'n>(mut names: impl Iterator<Item = &'n str>) -> Option<&'n str> {
    let mut seen = FxHashSet::default();
    names.find(|name| !seen.insert(*name))
}

fn push_struct(out: &mut String, name: &str, fields: impl Iterator<Item = String>) {
    let _ = writeln!(out, "struct {name} {{");
    for field in fields {
        out.push_str(&field);
        out.push('\n');
    }
    out.push_str("}\n");
}

/// `PascalCase` struct name of a binding name (`model_params` -> `ModelParams`).
pub(crate) fn struct_name(binding_name: &str) -> String {
    binding_name
        .split(|c: char| c == '_' || c == '-' || c == ' ')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
                .unwrap_or_default()
        })
        .collect()
}
