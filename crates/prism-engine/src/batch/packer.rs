use glam::Vec3;

use crate::asset::{IngestError, Mesh, Vertex};

/// Draw unit covering one mesh's range in the packed buffers.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Batch {
    pub material_index: usize,
    /// First vertex of the mesh in the packed vertex array.
    pub vertex_offset: u32,
    pub vertex_count: u32,
    /// First index of the mesh in the packed index array.
    pub index_offset: u32,
    pub primitive_count: u32,
}

impl Batch {
    pub fn index_range(&self) -> std::ops::Range<u32> {
        self.index_offset..self.index_offset + self.primitive_count * 3
    }
}

/// Meshes concatenated in material order.
///
/// Indices are already rebased onto the global vertex array, so draws use a
/// base vertex of zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackedGeometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub batches: Vec<Batch>,
}

impl PackedGeometry {
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Axis-aligned bounds of every packed position, `None` when empty.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        self.vertices.iter().map(|v| Vec3::from(v.position)).fold(None, |acc, p| {
            Some(match acc {
                Some((min, max)) => (p.min(min), p.max(max)),
                None => (p, p),
            })
        })
    }
}

/// Packs `meshes` into shared vertex/index arrays plus one batch per mesh.
///
/// Meshes are stably sorted by material index, so ties keep their original
/// order. Fails only when the totals cannot be addressed with 32-bit indices.
pub fn pack(meshes: &[Mesh]) -> Result<PackedGeometry, IngestError> {
    let total_vertices: usize = meshes.iter().map(|m| m.vertices().len()).sum();
    let total_indices: usize = meshes.iter().map(|m| m.indices().len()).sum();

    if u32::try_from(total_vertices).is_err() || u32::try_from(total_indices).is_err() {
        return Err(IngestError::GeometryTooLarge {
            vertices: total_vertices,
            indices: total_indices,
        });
    }

    let mut order: Vec<&Mesh> = meshes.iter().collect();
    order.sort_by_key(|m| m.material_index());

    let mut packed = PackedGeometry {
        vertices: Vec::with_capacity(total_vertices),
        indices: Vec::with_capacity(total_indices),
        batches: Vec::with_capacity(meshes.len()),
    };

    // Both totals fit in u32, so every running offset below does too.
    let mut vertex_offset = 0u32;
    let mut index_offset = 0u32;

    for mesh in order {
        let vertex_count = mesh.vertices().len() as u32;
        let index_count = mesh.indices().len() as u32;

        packed.vertices.extend_from_slice(mesh.vertices());
        packed
            .indices
            .extend(mesh.indices().iter().map(|&i| i + vertex_offset));

        packed.batches.push(Batch {
            material_index: mesh.material_index(),
            vertex_offset,
            vertex_count,
            index_offset,
            primitive_count: index_count / 3,
        });

        vertex_offset += vertex_count;
        index_offset += index_count;
    }

    log::debug!(
        "packed {} batches: {} vertices, {} indices",
        packed.batches.len(),
        packed.vertices.len(),
        packed.indices.len()
    );
    Ok(packed)
}
