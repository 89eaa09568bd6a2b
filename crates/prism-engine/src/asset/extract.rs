//! Mesh/material extraction: post-processed scene graph to [`Model`].

use std::path::{Path, PathBuf};

use super::source::{SourceMaterial, SourceMesh, SourceScene};
use super::{
    DefaultTextures, IngestError, Material, Mesh, Model, SlotOrigin, TextureSemantic,
    TextureSlot, Vertex,
};

/// Flattens every source mesh and resolves every material of `scene`.
///
/// Materials are extracted once per material slot of the asset, never per mesh.
pub fn extract_model(
    scene: &SourceScene,
    source_dir: &Path,
    defaults: &DefaultTextures,
) -> Result<Model, IngestError> {
    let materials: Vec<Material> = scene
        .materials
        .iter()
        .map(|m| extract_material(m, source_dir, defaults))
        .collect();

    let meshes = scene
        .meshes
        .iter()
        .map(extract_mesh)
        .collect::<Result<Vec<_>, _>>()?;

    Model::new(meshes, materials, source_dir)
}

/// Copies one source mesh into the uniform vertex layout.
pub fn extract_mesh(source: &SourceMesh) -> Result<Mesh, IngestError> {
    let count = source.positions.len();

    check_len(source, "normal", source.normals.len(), count, true)?;
    if let Some(uvs) = &source.tex_coords {
        check_len(source, "tex_coord", uvs.len(), count, false)?;
    }
    if let Some(tangents) = &source.tangents {
        check_len(source, "tangent", tangents.len(), count, false)?;
    }
    if let Some(bitangents) = &source.bitangents {
        check_len(source, "bitangent", bitangents.len(), count, false)?;
    }

    if source.normals.is_empty() && count > 0 {
        log::warn!("mesh `{}` has no normals; zero-filling", source.name);
    }
    if !source.has_tex_coords() && count > 0 {
        log::debug!("mesh `{}` has no texture coordinates; zero-filling", source.name);
    }

    let tangent_frame = source.tangents.as_deref().zip(source.bitangents.as_deref());

    let vertices = (0..count)
        .map(|i| {
            let (tangent, bitangent) = tangent_frame
                .map(|(t, b)| (t[i], b[i]))
                .unwrap_or_default();

            Vertex {
                position: source.positions[i],
                normal: source.normals.get(i).copied().unwrap_or_default(),
                tex_coord: source
                    .tex_coords
                    .as_deref()
                    .map(|uvs| uvs[i])
                    .unwrap_or_default(),
                tangent,
                bitangent,
            }
        })
        .collect();

    let face_total: u64 = source.face_arities.iter().map(|&a| u64::from(a)).sum();
    if !source.face_arities.is_empty() && face_total != source.indices.len() as u64 {
        return Err(IngestError::AttributeLength {
            mesh: source.name.clone(),
            attribute: "face index",
            found: source.indices.len(),
            expected: face_total as usize,
        });
    }

    let mut indices = Vec::with_capacity(source.indices.len());
    for (face, corners) in source.faces().enumerate() {
        if corners.len() != 3 {
            return Err(IngestError::NonTriangleFace {
                mesh: source.name.clone(),
                face,
                arity: corners.len(),
            });
        }
        indices.extend_from_slice(corners);
    }

    Mesh::new(source.name.clone(), vertices, indices, source.material_index)
}

/// Resolves every texture slot of `source` to a loadable path.
///
/// Bound paths are joined onto `source_dir`; unbound slots get the semantic's
/// default asset.
pub fn extract_material(
    source: &SourceMaterial,
    source_dir: &Path,
    defaults: &DefaultTextures,
) -> Material {
    let slots = TextureSemantic::ALL.map(|semantic| {
        let bound = source.texture_count(semantic.source_kind());
        if bound > 1 {
            log::warn!(
                "material `{}` binds {bound} {semantic:?} textures; using the first",
                source.name
            );
        }
        match source.first_texture(semantic.source_kind()) {
            Some(relative) => TextureSlot {
                path: source_dir.join(normalize_separators(relative)),
                origin: SlotOrigin::Bound,
            },
            None => TextureSlot {
                path: defaults.path(semantic).to_path_buf(),
                origin: SlotOrigin::Default,
            },
        }
    });

    Material::new(source.name.clone(), slots)
}

fn check_len(
    source: &SourceMesh,
    attribute: &'static str,
    found: usize,
    expected: usize,
    allow_empty: bool,
) -> Result<(), IngestError> {
    if found == expected || (allow_empty && found == 0) {
        return Ok(());
    }
    Err(IngestError::AttributeLength {
        mesh: source.name.clone(),
        attribute,
        found,
        expected,
    })
}

// Exporters on Windows write `textures\brick.png`.
fn normalize_separators(path: &str) -> PathBuf {
    PathBuf::from(path.replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::source::SourceTextureKind;

    fn triangle(name: &str, material_index: usize) -> SourceMesh {
        SourceMesh {
            name: name.to_string(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, -1.0]; 3],
            indices: vec![0, 1, 2],
            material_index,
            ..Default::default()
        }
    }

    #[test]
    fn positions_and_normals_copy_verbatim() {
        let mesh = extract_mesh(&triangle("tri", 0)).unwrap();
        assert_eq!(mesh.vertices()[1].position, [1.0, 0.0, 0.0]);
        assert!(mesh.vertices().iter().all(|v| v.normal == [0.0, 0.0, -1.0]));
        assert_eq!(mesh.indices(), &[0, 1, 2]);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn missing_uv_channel_zero_fills() {
        let mesh = extract_mesh(&triangle("tri", 0)).unwrap();
        assert!(mesh.vertices().iter().all(|v| v.tex_coord == [0.0, 0.0]));
    }

    #[test]
    fn missing_tangents_zero_fill_both_vectors() {
        let mut source = triangle("tri", 0);
        source.tex_coords = Some(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let mesh = extract_mesh(&source).unwrap();

        assert_eq!(mesh.vertices()[2].tex_coord, [0.0, 1.0]);
        assert!(mesh
            .vertices()
            .iter()
            .all(|v| v.tangent == [0.0; 3] && v.bitangent == [0.0; 3]));
    }

    #[test]
    fn tangent_frame_is_copied_when_present() {
        let mut source = triangle("tri", 0);
        source.tangents = Some(vec![[1.0, 0.0, 0.0]; 3]);
        source.bitangents = Some(vec![[0.0, 1.0, 0.0]; 3]);
        let mesh = extract_mesh(&source).unwrap();
        assert!(mesh
            .vertices()
            .iter()
            .all(|v| v.tangent == [1.0, 0.0, 0.0] && v.bitangent == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn quad_face_is_fatal() {
        let mut source = triangle("quad", 0);
        source.positions.push([1.0, 1.0, 0.0]);
        source.normals.push([0.0, 0.0, -1.0]);
        source.indices = vec![0, 1, 3, 2];
        source.face_arities = vec![4];

        let err = extract_mesh(&source).unwrap_err();
        assert!(matches!(
            err,
            IngestError::NonTriangleFace { face: 0, arity: 4, .. }
        ));
    }

    #[test]
    fn mismatched_uv_count_is_rejected() {
        let mut source = triangle("tri", 0);
        source.tex_coords = Some(vec![[0.0, 0.0]]);
        let err = extract_mesh(&source).unwrap_err();
        assert!(matches!(
            err,
            IngestError::AttributeLength { attribute: "tex_coord", found: 1, expected: 3, .. }
        ));
    }

    #[test]
    fn unbound_slots_resolve_to_defaults_independently() {
        let defaults = DefaultTextures::default();
        let dir = Path::new("scenes/sponza");

        let bare = extract_material(&SourceMaterial::untextured("bare"), dir, &defaults);
        for semantic in TextureSemantic::ALL {
            let slot = bare.slot(semantic);
            assert_eq!(slot.origin, SlotOrigin::Default);
            assert_eq!(slot.path, defaults.path(semantic));
        }

        let partial = SourceMaterial::untextured("partial")
            .with_texture(SourceTextureKind::Diffuse, "textures\\brick.png")
            .with_texture(SourceTextureKind::Opacity, "mask.png");
        let material = extract_material(&partial, dir, &defaults);

        assert_eq!(
            material.slot(TextureSemantic::Diffuse).path,
            dir.join("textures/brick.png")
        );
        assert_eq!(material.slot(TextureSemantic::Opacity).path, dir.join("mask.png"));
        assert_eq!(material.slot(TextureSemantic::Normal).origin, SlotOrigin::Default);
        assert_eq!(
            material.slot(TextureSemantic::Specular).path,
            defaults.path(TextureSemantic::Specular)
        );
    }

    #[test]
    fn extra_bindings_of_one_kind_use_the_first() {
        let source = SourceMaterial::untextured("layered")
            .with_texture(SourceTextureKind::Diffuse, "base.png")
            .with_texture(SourceTextureKind::Diffuse, "detail.png");
        assert_eq!(source.texture_count(SourceTextureKind::Diffuse), 2);

        let dir = Path::new("scene");
        let material = extract_material(&source, dir, &DefaultTextures::default());
        assert_eq!(material.slot(TextureSemantic::Diffuse).path, dir.join("base.png"));
        assert_eq!(material.slot(TextureSemantic::Diffuse).origin, SlotOrigin::Bound);
    }

    #[test]
    fn height_and_shininess_feed_normal_and_specular() {
        let source = SourceMaterial::untextured("m")
            .with_texture(SourceTextureKind::Normals, "ignored_normals.png")
            .with_texture(SourceTextureKind::Height, "bump.png")
            .with_texture(SourceTextureKind::Specular, "ignored_spec.png")
            .with_texture(SourceTextureKind::Shininess, "gloss.png");
        let material = extract_material(&source, Path::new(""), &DefaultTextures::default());

        assert_eq!(material.slot(TextureSemantic::Normal).path, Path::new("bump.png"));
        assert_eq!(material.slot(TextureSemantic::Specular).path, Path::new("gloss.png"));
    }

    #[test]
    fn model_keeps_one_material_per_slot() {
        let scene = SourceScene {
            meshes: vec![triangle("a", 1), triangle("b", 1), triangle("c", 0)],
            materials: vec![SourceMaterial::untextured("m0"), SourceMaterial::untextured("m1")],
        };
        let model = extract_model(&scene, Path::new("dir"), &DefaultTextures::default()).unwrap();

        assert_eq!(model.materials().len(), 2);
        assert_eq!(model.meshes().len(), 3);
        assert_eq!(model.material_of(&model.meshes()[0]).unwrap().name(), "m1");
        assert_eq!(model.source_dir(), Path::new("dir"));
    }

    #[test]
    fn dangling_material_index_aborts_load() {
        let scene = SourceScene {
            meshes: vec![triangle("a", 3)],
            materials: vec![SourceMaterial::untextured("m0")],
        };
        let err = extract_model(&scene, Path::new(""), &DefaultTextures::default()).unwrap_err();
        assert!(matches!(err, IngestError::MaterialOutOfRange { index: 3, .. }));
    }
}
