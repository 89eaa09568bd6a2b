use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::source::SourceTextureKind;

/// Texture slots every material exposes to the shader.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureSemantic {
    Diffuse,
    Normal,
    Specular,
    Opacity,
}

impl TextureSemantic {
    /// Slot order; also the material bind group binding order.
    pub const ALL: [TextureSemantic; 4] = [
        TextureSemantic::Diffuse,
        TextureSemantic::Normal,
        TextureSemantic::Specular,
        TextureSemantic::Opacity,
    ];

    pub fn index(self) -> usize {
        match self {
            TextureSemantic::Diffuse => 0,
            TextureSemantic::Normal => 1,
            TextureSemantic::Specular => 2,
            TextureSemantic::Opacity => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TextureSemantic::Diffuse => "diffuse",
            TextureSemantic::Normal => "normal",
            TextureSemantic::Specular => "specular",
            TextureSemantic::Opacity => "opacity",
        }
    }

    /// Importer binding that feeds this slot.
    ///
    /// Normal maps come in as height bindings and specular maps as shininess
    /// bindings, matching how common exporters tag bump and gloss maps.
    pub fn source_kind(self) -> SourceTextureKind {
        match self {
            TextureSemantic::Diffuse => SourceTextureKind::Diffuse,
            TextureSemantic::Normal => SourceTextureKind::Height,
            TextureSemantic::Specular => SourceTextureKind::Shininess,
            TextureSemantic::Opacity => SourceTextureKind::Opacity,
        }
    }

    /// Texel used when neither the bound texture nor the default asset loads.
    pub fn fallback_texel(self) -> [u8; 4] {
        match self {
            TextureSemantic::Diffuse => [255, 255, 255, 255],
            TextureSemantic::Normal => [128, 128, 255, 255],
            TextureSemantic::Specular => [0, 0, 0, 255],
            TextureSemantic::Opacity => [255, 255, 255, 255],
        }
    }

    /// Whether texel data should be sampled as sRGB.
    pub fn is_color(self) -> bool {
        matches!(self, TextureSemantic::Diffuse)
    }
}

/// Well-known asset paths substituted for unbound or unloadable slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultTextures {
    pub diffuse: PathBuf,
    pub normal: PathBuf,
    pub specular: PathBuf,
    pub opacity: PathBuf,
}

impl Default for DefaultTextures {
    fn default() -> Self {
        Self {
            diffuse: PathBuf::from("data/DefaultTex/default_diffuse.png"),
            normal: PathBuf::from("data/DefaultTex/default_normal.png"),
            specular: PathBuf::from("data/DefaultTex/default_specular.png"),
            opacity: PathBuf::from("data/DefaultTex/default_opacity.png"),
        }
    }
}

impl DefaultTextures {
    pub fn path(&self, semantic: TextureSemantic) -> &Path {
        match semantic {
            TextureSemantic::Diffuse => &self.diffuse,
            TextureSemantic::Normal => &self.normal,
            TextureSemantic::Specular => &self.specular,
            TextureSemantic::Opacity => &self.opacity,
        }
    }
}

/// Where a slot's path came from.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SlotOrigin {
    /// Bound by the asset, resolved against the scene directory.
    Bound,
    /// Nothing bound; the semantic's default asset.
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureSlot {
    pub path: PathBuf,
    pub origin: SlotOrigin,
}

/// Resolved material: one loadable path per [`TextureSemantic`].
///
/// Owned by the [`Model`](super::Model); meshes refer to it by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    name: String,
    slots: [TextureSlot; 4],
}

impl Material {
    pub fn new(name: impl Into<String>, slots: [TextureSlot; 4]) -> Self {
        Self {
            name: name.into(),
            slots,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slot(&self, semantic: TextureSemantic) -> &TextureSlot {
        &self.slots[semantic.index()]
    }

    pub fn slots(&self) -> impl Iterator<Item = (TextureSemantic, &TextureSlot)> {
        TextureSemantic::ALL.into_iter().zip(self.slots.iter())
    }
}
