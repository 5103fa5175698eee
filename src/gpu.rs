//! Upload collaborator
//!
//! The packing engine never talks to a GPU directly. A binding hands its
//! region to an [`UploadSink`] whenever the region's upload flag is set;
//! [`GpuBindingBuffer`] is the `wgpu` implementation, a `Vec<u8>` works as
//! a CPU-side mirror.

use std::num::NonZeroU64;

use wgpu::util::DeviceExt;

use crate::binding::{BindingKind, BufferBinding, ResourceLayoutDescriptor};
use crate::layout::BYTES_PER_ROW;

/// Destination of region uploads.
pub trait UploadSink {
    /// Copies `bytes` to `offset` of the destination.
    fn write(&mut self, offset: u64, bytes: &[u8]);
}

impl UploadSink for Vec<u8> {
    fn write(&mut self, offset: u64, bytes: &[u8]) {
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        let end = start.saturating_add(bytes.len());
        if self.len() < end {
            self.resize(end, 0);
        }
        self[start..end].copy_from_slice(bytes);
    }
}

impl BufferBinding {
    /// Hands the region to `sink` when it holds changes, then clears the
    /// upload flag. Returns whether anything was sent.
    pub fn flush(&self, sink: &mut dyn UploadSink) -> bool {
        if !self.should_upload() {
            return false;
        }
        {
            let bytes = self.bytes();
            sink.write(0, &bytes);
        }
        self.clear_should_upload();
        true
    }
}

struct QueueWriter<'a> {
    queue: &'a wgpu::Queue,
    buffer: &'a wgpu::Buffer,
}

impl UploadSink for QueueWriter<'_> {
    fn write(&mut self, offset: u64, bytes: &[u8]) {
        self.queue.write_buffer(self.buffer, offset, bytes);
    }
}

// ============================================================================
// GPU buffer wrapper
// ============================================================================

/// GPU copy of one binding's region.
pub struct GpuBindingBuffer {
    pub buffer: wgpu::Buffer,
    pub size: u64,
    pub usage: wgpu::BufferUsages,
    pub label: String,
    /// Region the buffer was created for; a rebuilt binding gets a new one.
    region_id: u64,
    pub last_uploaded_version: u64,
}

impl GpuBindingBuffer {
    /// Creates the buffer initialised with the binding's current bytes.
    pub fn new(device: &wgpu::Device, binding: &BufferBinding) -> Self {
        let usage = usage_for(binding.kind());
        let region = binding.region();

        let buffer = {
            let bytes = region.bytes();
            let mut contents = bytes.to_vec();
            contents.resize(contents.len().max(BYTES_PER_ROW), 0);
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(region.label()),
                contents: &contents,
                usage,
            })
        };
        binding.clear_should_upload();

        log::debug!("Created GPU buffer `{}` ({} bytes)", region.label(), buffer.size());

        Self {
            size: buffer.size(),
            buffer,
            usage,
            label: region.label().to_string(),
            region_id: region.id(),
            last_uploaded_version: region.version(),
        }
    }

    /// Uploads pending changes of `binding`.
    ///
    /// The buffer is recreated when the binding was rebuilt (new region or
    /// address space) or outgrew it. Returns `true` when the buffer object
    /// changed and bind groups referencing it must be rebuilt.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, binding: &BufferBinding) -> bool {
        let region = binding.region();
        let usage = usage_for(binding.kind());

        if region.id() != self.region_id || region.len() as u64 > self.size || usage != self.usage {
            *self = Self::new(device, binding);
            log::info!("Recreated GPU buffer `{}`", self.label);
            return true;
        }

        let mut writer = QueueWriter {
            queue,
            buffer: &self.buffer,
        };
        if binding.flush(&mut writer) {
            self.last_uploaded_version = region.version();
        }
        false
    }

    /// Resource for a bind group entry built from `layout`.
    #[must_use]
    pub fn binding_resource(&self, layout: &ResourceLayoutDescriptor) -> wgpu::BindingResource<'_> {
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: 0,
            size: layout.size.and_then(NonZeroU64::new),
        })
    }
}

fn usage_for(kind: BindingKind) -> wgpu::BufferUsages {
    match kind {
        BindingKind::Uniform => wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        BindingKind::Storage => wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
    }
}
