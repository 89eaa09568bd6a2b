//! Wavefront OBJ importer.

use std::path::Path;

use super::IngestError;
use super::postprocess;
use super::source::{
    SceneImporter, SourceMaterial, SourceMesh, SourceScene, SourceTextureKind,
};

/// [`SceneImporter`] reading `.obj` files and their MTL libraries with `tobj`.
///
/// Faces are triangulated and identical vertices joined on load; the result
/// then runs through [`postprocess::apply`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjImporter;

impl SceneImporter for ObjImporter {
    fn import(&self, path: &Path) -> Result<SourceScene, IngestError> {
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|e| IngestError::Import {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut materials: Vec<SourceMaterial> = match materials {
            Ok(materials) => materials.iter().map(convert_material).collect(),
            Err(e) => {
                log::warn!("no material library for {}: {e}", path.display());
                Vec::new()
            }
        };

        let fallback = materials.len();
        let mut needs_fallback = false;

        let meshes = models
            .into_iter()
            .map(|model| {
                let material_index = match model.mesh.material_id {
                    Some(id) => id,
                    None => {
                        needs_fallback = true;
                        fallback
                    }
                };
                convert_mesh(model.name, model.mesh, material_index)
            })
            .collect();

        if needs_fallback {
            materials.push(SourceMaterial::untextured("default"));
        }

        let mut scene = SourceScene { meshes, materials };
        postprocess::apply(&mut scene)?;
        Ok(scene)
    }
}

fn convert_mesh(name: String, mesh: tobj::Mesh, material_index: usize) -> SourceMesh {
    let triples = |data: &[f32]| -> Vec<[f32; 3]> {
        data.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
    };

    let tex_coords = (!mesh.texcoords.is_empty()).then(|| {
        mesh.texcoords
            .chunks_exact(2)
            .map(|c| [c[0], c[1]])
            .collect()
    });

    SourceMesh {
        name,
        positions: triples(&mesh.positions),
        normals: triples(&mesh.normals),
        tex_coords,
        tangents: None,
        bitangents: None,
        indices: mesh.indices,
        face_arities: mesh.face_arities,
        material_index,
    }
}

fn convert_material(material: &tobj::Material) -> SourceMaterial {
    let bindings = [
        (SourceTextureKind::Diffuse, &material.diffuse_texture),
        (SourceTextureKind::Height, &material.normal_texture),
        (SourceTextureKind::Shininess, &material.shininess_texture),
        (SourceTextureKind::Specular, &material.specular_texture),
        (SourceTextureKind::Opacity, &material.dissolve_texture),
        (SourceTextureKind::Ambient, &material.ambient_texture),
    ];

    bindings
        .into_iter()
        .filter_map(|(kind, path)| path.as_ref().map(|p| (kind, p)))
        .fold(SourceMaterial::untextured(material.name.clone()), |m, (kind, path)| {
            m.with_texture(kind, path.clone())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = "\
mtllib scene.mtl
o loose
v 2 0 0
v 3 0 0
v 2 1 0
f 1 2 3
o panel
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
usemtl brick
f 4/1/1 5/2/1 6/3/1 7/4/1
";

    const MTL: &str = "\
newmtl brick
map_Kd textures/brick.png
map_Bump textures/brick_n.png
map_d textures/brick_mask.png
newmtl unused
map_Kd textures/other.png
";

    fn write_scene(obj: &str, mtl: Option<&str>) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("scene.obj"), obj).unwrap();
        if let Some(mtl) = mtl {
            std::fs::write(dir.path().join("scene.mtl"), mtl).unwrap();
        }
        dir
    }

    #[test]
    fn imports_triangulated_left_handed_scene() {
        let dir = write_scene(SCENE, Some(MTL));
        let scene = ObjImporter.import(&dir.path().join("scene.obj")).unwrap();

        assert_eq!(scene.meshes.len(), 2);
        let panel = &scene.meshes[1];
        assert_eq!(panel.name, "panel");
        assert_eq!(panel.indices.len(), 6);
        assert!(panel.is_triangulated());
        assert!(panel.has_tangents_and_bitangents());
        assert!(panel.normals.iter().all(|n| n[2] == -1.0));

        let brick = &scene.materials[panel.material_index];
        assert_eq!(brick.name, "brick");
        assert_eq!(
            brick.first_texture(SourceTextureKind::Diffuse),
            Some("textures/brick.png")
        );
        assert_eq!(
            brick.first_texture(SourceTextureKind::Height),
            Some("textures/brick_n.png")
        );
        assert_eq!(
            brick.first_texture(SourceTextureKind::Opacity),
            Some("textures/brick_mask.png")
        );
    }

    #[test]
    fn unused_materials_are_dropped_and_missing_ones_synthesized() {
        let dir = write_scene(SCENE, Some(MTL));
        let scene = ObjImporter.import(&dir.path().join("scene.obj")).unwrap();

        let names: Vec<_> = scene.materials.iter().map(|m| m.name.as_str()).collect();
        assert!(!names.contains(&"unused"));
        assert!(scene.meshes.iter().all(|m| m.material_index < scene.materials.len()));
    }

    #[test]
    fn missing_library_still_imports() {
        let dir = write_scene(SCENE, None);
        let scene = ObjImporter.import(&dir.path().join("scene.obj")).unwrap();

        assert_eq!(scene.materials.len(), 1);
        assert_eq!(scene.materials[0].name, "default");
        assert!(scene.meshes.iter().all(|m| m.material_index == 0));
    }

    #[test]
    fn unreadable_file_is_an_import_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ObjImporter.import(&dir.path().join("absent.obj")).unwrap_err();
        assert!(matches!(err, IngestError::Import { .. }));
    }
}
