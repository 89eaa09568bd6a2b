//! In-memory scene graph handed over by an import collaborator.
//!
//! These types describe the asset *after* the import post-process pipeline ran.
//! They stay close to what importers naturally produce (parallel attribute
//! arrays, flat index lists) and are validated by the extractor, not here.

use std::path::Path;

use super::IngestError;

/// Texture binding semantics an importer can report for a material.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SourceTextureKind {
    Diffuse,
    Specular,
    Ambient,
    Height,
    Normals,
    Shininess,
    Opacity,
}

/// One material as reported by the importer.
///
/// `textures` keeps declaration order; the first binding of a kind wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMaterial {
    pub name: String,
    pub textures: Vec<(SourceTextureKind, String)>,
}

impl SourceMaterial {
    /// Material without any texture binding.
    pub fn untextured(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            textures: Vec::new(),
        }
    }

    /// Adds a texture binding (builder style).
    pub fn with_texture(mut self, kind: SourceTextureKind, path: impl Into<String>) -> Self {
        self.textures.push((kind, path.into()));
        self
    }

    /// Returns the first texture path bound for `kind`.
    pub fn first_texture(&self, kind: SourceTextureKind) -> Option<&str> {
        self.textures
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, path)| path.as_str())
    }

    pub fn texture_count(&self, kind: SourceTextureKind) -> usize {
        self.textures.iter().filter(|(k, _)| *k == kind).count()
    }
}

/// One sub-mesh as reported by the importer.
///
/// Optional attributes are either absent or carry exactly one entry per
/// position. An empty `normals` array means the source had none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// First UV channel.
    pub tex_coords: Option<Vec<[f32; 2]>>,
    pub tangents: Option<Vec<[f32; 3]>>,
    pub bitangents: Option<Vec<[f32; 3]>>,
    /// Flattened face indices.
    pub indices: Vec<u32>,
    /// Vertex count per face. Empty means every face is a triangle.
    pub face_arities: Vec<u32>,
    pub material_index: usize,
}

impl SourceMesh {
    pub fn has_tex_coords(&self) -> bool {
        self.tex_coords.is_some()
    }

    pub fn has_tangents_and_bitangents(&self) -> bool {
        self.tangents.is_some() && self.bitangents.is_some()
    }

    pub fn is_triangulated(&self) -> bool {
        self.face_arities.iter().all(|&arity| arity == 3) && self.indices.len() % 3 == 0
    }

    /// Iterates faces as index slices.
    ///
    /// When `face_arities` is empty the index list is read as triples; a trailing
    /// partial triple is yielded as a short face so callers can reject it.
    pub fn faces(&self) -> Faces<'_> {
        Faces {
            indices: &self.indices,
            arities: (!self.face_arities.is_empty()).then(|| self.face_arities.iter()),
        }
    }
}

/// Iterator returned by [`SourceMesh::faces`].
pub struct Faces<'a> {
    indices: &'a [u32],
    arities: Option<std::slice::Iter<'a, u32>>,
}

impl<'a> Iterator for Faces<'a> {
    type Item = &'a [u32];

    fn next(&mut self) -> Option<&'a [u32]> {
        if self.indices.is_empty() {
            return None;
        }

        let arity = match self.arities.as_mut() {
            Some(arities) => *arities.next()? as usize,
            None => 3,
        };

        let (face, rest) = self.indices.split_at(arity.min(self.indices.len()));
        self.indices = rest;
        Some(face)
    }
}

/// Post-processed scene: ordered meshes plus ordered materials.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceScene {
    pub meshes: Vec<SourceMesh>,
    pub materials: Vec<SourceMaterial>,
}

/// Import collaborator contract.
///
/// Implementations read a scene file and return the post-processed scene graph
/// (triangulated, identical vertices joined, tangent space computed where the
/// data allows, left-handed, V-flipped UVs).
pub trait SceneImporter {
    fn import(&self, path: &Path) -> Result<SourceScene, IngestError>;
}
