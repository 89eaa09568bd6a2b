//! Texture decoding and per-slot fallback resolution.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use super::{DefaultTextures, Material, TextureSemantic};

/// Decoded RGBA8 image ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureImage {
    /// 1x1 image holding `texel`.
    pub fn solid(texel: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: texel.to_vec(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to decode texture {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Source of decoded texture images.
pub trait TextureLoader {
    fn load(&mut self, path: &Path) -> Result<Arc<TextureImage>, TextureError>;
}

/// [`TextureLoader`] backed by the `image` crate.
///
/// Successful decodes are cached by path, so default assets shared by many
/// materials are decoded once.
#[derive(Default)]
pub struct ImageLoader {
    cache: HashMap<PathBuf, Arc<TextureImage>>,
}

impl ImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

impl TextureLoader for ImageLoader {
    fn load(&mut self, path: &Path) -> Result<Arc<TextureImage>, TextureError> {
        if let Some(image) = self.cache.get(path) {
            return Ok(image.clone());
        }

        let decoded = image::open(path).map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = decoded.to_rgba8();

        let image = Arc::new(TextureImage {
            width: rgba.width(),
            height: rgba.height(),
            rgba: rgba.into_raw(),
        });
        log::debug!("decoded texture {} ({}x{})", path.display(), image.width, image.height);

        self.cache.insert(path.to_path_buf(), image.clone());
        Ok(image)
    }
}

/// Decoded images of one material, in [`TextureSemantic::ALL`] order.
#[derive(Debug, Clone)]
pub struct MaterialImages(pub [Arc<TextureImage>; 4]);

impl MaterialImages {
    pub fn get(&self, semantic: TextureSemantic) -> &Arc<TextureImage> {
        &self.0[semantic.index()]
    }
}

/// What replaced a texture that failed to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Substitute {
    DefaultAsset(PathBuf),
    BuiltIn,
}

/// Recoverable texture resolution failure.
#[derive(Debug)]
pub struct TextureWarning {
    pub material: String,
    pub semantic: TextureSemantic,
    pub error: TextureError,
    pub substitute: Substitute,
}

impl fmt::Display for TextureWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "material `{}` {} texture: {}; using ",
            self.material,
            self.semantic.label(),
            self.error
        )?;
        match &self.substitute {
            Substitute::DefaultAsset(path) => write!(f, "default {}", path.display()),
            Substitute::BuiltIn => f.write_str("built-in texel"),
        }
    }
}

/// Loads every slot of `material`, substituting on failure.
///
/// Chain per slot: resolved path, then the semantic's default asset, then the
/// built-in texel. Each substitution appends one warning.
pub fn load_material_images(
    material: &Material,
    defaults: &DefaultTextures,
    loader: &mut dyn TextureLoader,
    warnings: &mut Vec<TextureWarning>,
) -> MaterialImages {
    let images = TextureSemantic::ALL.map(|semantic| {
        let slot = material.slot(semantic);
        let error = match loader.load(&slot.path) {
            Ok(image) => return image,
            Err(error) => error,
        };

        let default_path = defaults.path(semantic);
        if slot.path != default_path {
            if let Ok(image) = loader.load(default_path) {
                warnings.push(TextureWarning {
                    material: material.name().to_string(),
                    semantic,
                    error,
                    substitute: Substitute::DefaultAsset(default_path.to_path_buf()),
                });
                return image;
            }
        }

        warnings.push(TextureWarning {
            material: material.name().to_string(),
            semantic,
            error,
            substitute: Substitute::BuiltIn,
        });
        Arc::new(TextureImage::solid(semantic.fallback_texel()))
    });

    MaterialImages(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{SlotOrigin, TextureSlot};

    fn write_png(path: &Path, texel: [u8; 4]) {
        image::RgbaImage::from_pixel(2, 2, image::Rgba(texel))
            .save(path)
            .unwrap();
    }

    fn material(paths: [&Path; 4]) -> Material {
        Material::new(
            "m",
            paths.map(|p| TextureSlot {
                path: p.to_path_buf(),
                origin: SlotOrigin::Bound,
            }),
        )
    }

    #[test]
    fn loader_decodes_and_caches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brick.png");
        write_png(&path, [10, 20, 30, 255]);

        let mut loader = ImageLoader::new();
        let first = loader.load(&path).unwrap();
        let second = loader.load(&path).unwrap();

        assert_eq!((first.width, first.height), (2, 2));
        assert_eq!(&first.rgba[..4], &[10, 20, 30, 255]);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.cached(), 1);
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = ImageLoader::new();
        let err = loader.load(&dir.path().join("nope.png")).unwrap_err();
        assert!(matches!(err, TextureError::Decode { .. }));
        assert_eq!(loader.cached(), 0);
    }

    #[test]
    fn broken_slot_falls_back_to_default_asset() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.png");
        let default_normal = dir.path().join("default_normal.png");
        let corrupt = dir.path().join("corrupt.png");
        write_png(&good, [1, 2, 3, 255]);
        write_png(&default_normal, [128, 128, 255, 255]);
        std::fs::write(&corrupt, b"not a png").unwrap();

        let defaults = DefaultTextures {
            normal: default_normal.clone(),
            ..DefaultTextures::default()
        };
        let material = material([&good, &corrupt, &good, &good]);

        let mut warnings = Vec::new();
        let images =
            load_material_images(&material, &defaults, &mut ImageLoader::new(), &mut warnings);

        assert_eq!(&images.get(TextureSemantic::Diffuse).rgba[..4], &[1, 2, 3, 255]);
        assert_eq!(
            &images.get(TextureSemantic::Normal).rgba[..4],
            &[128, 128, 255, 255]
        );
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].semantic, TextureSemantic::Normal);
        assert_eq!(warnings[0].substitute, Substitute::DefaultAsset(default_normal));
    }

    #[test]
    fn missing_default_uses_built_in_texel() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("absent.png");
        let defaults = DefaultTextures {
            diffuse: dir.path().join("d.png"),
            normal: dir.path().join("n.png"),
            specular: dir.path().join("s.png"),
            opacity: dir.path().join("o.png"),
        };
        let material = material([&absent, &absent, &absent, &absent]);

        let mut warnings = Vec::new();
        let images =
            load_material_images(&material, &defaults, &mut ImageLoader::new(), &mut warnings);

        for semantic in TextureSemantic::ALL {
            assert_eq!(
                **images.get(semantic),
                TextureImage::solid(semantic.fallback_texel())
            );
        }
        assert_eq!(warnings.len(), 4);
        assert!(warnings.iter().all(|w| w.substitute == Substitute::BuiltIn));
        assert!(warnings[0].to_string().contains("built-in texel"));
    }

    #[test]
    fn failing_default_slot_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let defaults = DefaultTextures {
            diffuse: dir.path().join("missing_default.png"),
            ..DefaultTextures::default()
        };
        let slot_path = defaults.diffuse.clone();
        let material = material([&slot_path, &slot_path, &slot_path, &slot_path]);

        let mut warnings = Vec::new();
        load_material_images(&material, &defaults, &mut ImageLoader::new(), &mut warnings);

        let diffuse: Vec<_> = warnings
            .iter()
            .filter(|w| w.semantic == TextureSemantic::Diffuse)
            .collect();
        assert_eq!(diffuse.len(), 1);
        assert_eq!(diffuse[0].substitute, Substitute::BuiltIn);
    }
}
