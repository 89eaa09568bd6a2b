use std::path::{Path, PathBuf};

use bytemuck::{Pod, Zeroable};

use super::{IngestError, Material};

/// Interleaved vertex shared by every mesh in a packed buffer.
///
/// Attributes the source did not provide are zero-filled so every vertex in a
/// buffer keeps the same 14-float stride.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl Vertex {
    pub const FLOATS: usize = 14;
    pub const STRIDE: u64 = (Self::FLOATS * std::mem::size_of::<f32>()) as u64;

    const ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // normal
        2 => Float32x2, // tex_coord
        3 => Float32x3, // tangent
        4 => Float32x3  // bitangent
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Flattened triangle mesh.
///
/// Invariants (checked by [`Mesh::new`]): the index count is a multiple of three
/// and every index addresses a vertex of this mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    name: String,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    material_index: usize,
}

impl Mesh {
    pub fn new(
        name: impl Into<String>,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        material_index: usize,
    ) -> Result<Self, IngestError> {
        let name = name.into();

        if indices.len() % 3 != 0 {
            return Err(IngestError::NonTriangleFace {
                mesh: name,
                face: indices.len() / 3,
                arity: indices.len() % 3,
            });
        }

        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(IngestError::IndexOutOfRange {
                mesh: name,
                index,
                vertex_count: vertices.len(),
            });
        }

        Ok(Self {
            name,
            vertices,
            indices,
            material_index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn material_index(&self) -> usize {
        self.material_index
    }
}

/// Totals reported after a scene load.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ModelStats {
    pub meshes: usize,
    pub materials: usize,
    pub vertices: usize,
    pub triangles: usize,
}

/// One imported asset: meshes, the materials they share, and the directory
/// relative texture paths were resolved against.
///
/// Built once at scene load and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    meshes: Vec<Mesh>,
    materials: Vec<Material>,
    source_dir: PathBuf,
}

impl Model {
    /// Assembles a model, rejecting meshes that point past the material list.
    pub fn new(
        meshes: Vec<Mesh>,
        materials: Vec<Material>,
        source_dir: impl Into<PathBuf>,
    ) -> Result<Self, IngestError> {
        if let Some(mesh) = meshes.iter().find(|m| m.material_index >= materials.len()) {
            return Err(IngestError::MaterialOutOfRange {
                mesh: mesh.name.clone(),
                index: mesh.material_index,
                material_count: materials.len(),
            });
        }

        Ok(Self {
            meshes,
            materials,
            source_dir: source_dir.into(),
        })
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn material(&self, index: usize) -> Option<&Material> {
        self.materials.get(index)
    }

    /// Shared material of `mesh`.
    pub fn material_of(&self, mesh: &Mesh) -> Option<&Material> {
        self.material(mesh.material_index)
    }

    pub fn stats(&self) -> ModelStats {
        ModelStats {
            meshes: self.meshes.len(),
            materials: self.materials.len(),
            vertices: self.meshes.iter().map(|m| m.vertices.len()).sum(),
            triangles: self.meshes.iter().map(Mesh::triangle_count).sum(),
        }
    }
}
