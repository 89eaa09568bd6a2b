//! Scene ingestion: import, extraction, texture resolution.

mod error;
mod extract;
mod material;
mod model;
mod obj;
pub mod postprocess;
mod source;
mod texture;

pub use error::IngestError;
pub use extract::{extract_material, extract_mesh, extract_model};
pub use material::{DefaultTextures, Material, SlotOrigin, TextureSemantic, TextureSlot};
pub use model::{Mesh, Model, ModelStats, Vertex};
pub use obj::ObjImporter;
pub use source::{
    Faces, SceneImporter, SourceMaterial, SourceMesh, SourceScene, SourceTextureKind,
};
pub use texture::{
    load_material_images, ImageLoader, MaterialImages, Substitute, TextureError, TextureImage,
    TextureLoader, TextureWarning,
};

use std::path::Path;

use crate::batch::{self, PackedGeometry};

/// Everything the renderer needs from one scene file, built before the first
/// frame and immutable afterwards.
#[derive(Debug)]
pub struct LoadedScene {
    pub model: Model,
    pub packed: PackedGeometry,
    /// Decoded images, indexed like `model.materials()`.
    pub materials: Vec<MaterialImages>,
    pub warnings: Vec<TextureWarning>,
}

/// Runs the ingestion pipeline: import, extract, pack, resolve textures.
///
/// Structural problems abort the load. Texture failures are substituted and
/// reported in [`LoadedScene::warnings`].
pub fn load_scene(
    path: &Path,
    importer: &dyn SceneImporter,
    loader: &mut dyn TextureLoader,
    defaults: &DefaultTextures,
) -> Result<LoadedScene, IngestError> {
    let source = importer.import(path)?;
    let source_dir = path.parent().unwrap_or_else(|| Path::new(""));

    let model = extract_model(&source, source_dir, defaults)?;
    let packed = batch::pack(model.meshes())?;

    let mut warnings = Vec::new();
    let materials = model
        .materials()
        .iter()
        .map(|m| load_material_images(m, defaults, loader, &mut warnings))
        .collect();

    for warning in &warnings {
        log::warn!("{warning}");
    }

    let stats = model.stats();
    log::info!(
        "loaded {}: {} meshes, {} materials, {} vertices, {} triangles",
        path.display(),
        stats.meshes,
        stats.materials,
        stats.vertices,
        stats.triangles
    );

    Ok(LoadedScene {
        model,
        packed,
        materials,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedImporter(SourceScene);

    impl SceneImporter for FixedImporter {
        fn import(&self, _path: &Path) -> Result<SourceScene, IngestError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn load_scene_packs_and_substitutes_textures() {
        let dir = tempfile::tempdir().unwrap();
        let scene = SourceScene {
            meshes: vec![SourceMesh {
                name: "tri".into(),
                positions: vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                indices: vec![0, 1, 2],
                ..Default::default()
            }],
            materials: vec![SourceMaterial::untextured("plain")
                .with_texture(SourceTextureKind::Diffuse, "missing.png")],
        };

        let loaded = load_scene(
            &dir.path().join("scene.obj"),
            &FixedImporter(scene),
            &mut ImageLoader::new(),
            &DefaultTextures::default(),
        )
        .unwrap();

        assert_eq!(loaded.packed.batches.len(), 1);
        assert_eq!(loaded.materials.len(), 1);
        assert_eq!(
            loaded.model.materials()[0].slot(TextureSemantic::Diffuse).path,
            dir.path().join("missing.png")
        );
        // Neither the bound file nor the repository defaults exist here.
        assert_eq!(loaded.warnings.len(), 4);
        assert_eq!(
            **loaded.materials[0].get(TextureSemantic::Normal),
            TextureImage::solid([128, 128, 255, 255])
        );
    }

    #[test]
    fn import_failure_aborts_load() {
        struct Broken;
        impl SceneImporter for Broken {
            fn import(&self, path: &Path) -> Result<SourceScene, IngestError> {
                Err(IngestError::Import {
                    path: path.to_path_buf(),
                    reason: "truncated".into(),
                })
            }
        }

        let err = load_scene(
            Path::new("broken.obj"),
            &Broken,
            &mut ImageLoader::new(),
            &DefaultTextures::default(),
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::Import { .. }));
    }
}
