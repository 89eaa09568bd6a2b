use wgpu::util::DeviceExt;

use crate::batch::PackedGeometry;
use crate::device::BufferError;

/// Device-resident vertex and index buffers, written once at setup.
///
/// Offsets recorded in the batches stay valid for the lifetime of the buffers;
/// a new scene means a new `StaticGeometry`.
pub struct StaticGeometry {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    vertex_count: u32,
    index_count: u32,
}

impl StaticGeometry {
    /// Allocates both buffers sized to `packed` and fills them in one write each.
    pub fn upload(device: &wgpu::Device, packed: &PackedGeometry) -> Result<Self, BufferError> {
        let limit = device.limits().max_buffer_size;
        check_size("vertex buffer", packed.vertex_bytes().len(), limit)?;
        check_size("index buffer", packed.index_bytes().len(), limit)?;

        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("prism static vertex buffer"),
            contents: non_empty(packed.vertex_bytes()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("prism static index buffer"),
            contents: non_empty(packed.index_bytes()),
            usage: wgpu::BufferUsages::INDEX,
        });

        log::info!(
            "uploaded static geometry: {} vertices ({} bytes), {} indices ({} bytes)",
            packed.vertices.len(),
            packed.vertex_bytes().len(),
            packed.indices.len(),
            packed.index_bytes().len()
        );

        Ok(Self {
            vertex,
            index,
            vertex_count: packed.vertices.len() as u32,
            index_count: packed.indices.len() as u32,
        })
    }

    pub fn vertex(&self) -> &wgpu::Buffer {
        &self.vertex
    }

    pub fn index(&self) -> &wgpu::Buffer {
        &self.index
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

fn check_size(label: &'static str, size: usize, limit: u64) -> Result<(), BufferError> {
    let size = size as u64;
    if size > limit {
        return Err(BufferError::TooLarge { label, size, limit });
    }
    Ok(())
}

// Empty slices cannot be bound, so an empty scene still gets a minimal buffer.
fn non_empty(bytes: &[u8]) -> &[u8] {
    const PLACEHOLDER: [u8; 4] = [0; 4];
    if bytes.is_empty() { &PLACEHOLDER } else { bytes }
}
