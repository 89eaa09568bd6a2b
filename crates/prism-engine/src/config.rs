//! Renderer configuration, loaded from TOML.
//!
//! Every field has a default, so a file only needs the values it changes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::asset::DefaultTextures;
use crate::device::{ClearValues, PresentRequest, ShaderModel};
use crate::render::Projection;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// `env_logger` filter directives; `RUST_LOG` applies when unset.
    pub log_filter: Option<String>,
    pub display: DisplayConfig,
    pub device: DeviceConfig,
    pub assets: AssetConfig,
    pub shader: ShaderConfig,
}

impl RendererConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn present_request(&self) -> PresentRequest {
        PresentRequest {
            width: self.display.width,
            height: self.display.height,
            prefer_srgb: self.display.prefer_srgb,
            vsync: self.display.vsync,
            sample_count: self.device.sample_count,
            depth_format: self.device.depth_format.to_wgpu(),
            shader_model: self.device.shader_model,
        }
    }

    pub fn projection(&self) -> Projection {
        Projection {
            fov_y_degrees: self.display.fov_y_degrees,
            aspect: self.display.width as f32 / self.display.height.max(1) as f32,
            near: self.display.near,
            far: self.display.far,
        }
    }

    pub fn clear_values(&self) -> ClearValues {
        let [r, g, b] = self.display.clear_color.map(|c| c as f64 / 255.0);
        ClearValues {
            color: wgpu::Color { r, g, b, a: 1.0 },
            ..ClearValues::default()
        }
    }

    pub fn lost_backoff(&self) -> Duration {
        Duration::from_millis(self.device.lost_backoff_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub prefer_srgb: bool,
    pub vsync: bool,
    /// 8-bit RGB.
    pub clear_color: [u8; 3],
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: "prism".to_string(),
            width: 1280,
            height: 720,
            prefer_srgb: true,
            vsync: true,
            clear_color: [169, 255, 255],
            fov_y_degrees: 45.0,
            near: 1.0,
            far: 100_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Requested multisample count; halved until the adapter supports it.
    pub sample_count: u32,
    pub depth_format: DepthFormat,
    pub shader_model: ShaderModel,
    pub lost_backoff_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            sample_count: 8,
            depth_format: DepthFormat::Depth24PlusStencil8,
            shader_model: ShaderModel::Sm5,
            lost_backoff_ms: 200,
        }
    }
}

/// Depth/stencil formats accepted in config files.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthFormat {
    Depth24Plus,
    Depth24PlusStencil8,
    Depth32Float,
    Depth32FloatStencil8,
}

impl DepthFormat {
    pub fn to_wgpu(self) -> wgpu::TextureFormat {
        match self {
            DepthFormat::Depth24Plus => wgpu::TextureFormat::Depth24Plus,
            DepthFormat::Depth24PlusStencil8 => wgpu::TextureFormat::Depth24PlusStencil8,
            DepthFormat::Depth32Float => wgpu::TextureFormat::Depth32Float,
            DepthFormat::Depth32FloatStencil8 => wgpu::TextureFormat::Depth32FloatStencil8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub scene: PathBuf,
    pub default_textures: DefaultTextures,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            scene: PathBuf::from("data/scene.obj"),
            default_textures: DefaultTextures::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    pub path: PathBuf,
    pub hot_reload: bool,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("shaders/textured.wgsl"),
            hot_reload: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = RendererConfig::from_toml_str("").unwrap();
        assert_eq!(config, RendererConfig::default());
        assert_eq!(config.device.sample_count, 8);
        assert_eq!(config.lost_backoff(), Duration::from_millis(200));
        assert_eq!(
            config.assets.default_textures.opacity,
            PathBuf::from("data/DefaultTex/default_opacity.png")
        );
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = RendererConfig::from_toml_str(
            r#"
            log_filter = "prism_engine=debug"

            [display]
            width = 800
            height = 600
            clear_color = [0, 0, 0]

            [device]
            depth_format = "depth32_float"
            shader_model = "Sm4"

            [assets.default_textures]
            diffuse = "tex/white.png"
            "#,
        )
        .unwrap();

        assert_eq!(config.display.width, 800);
        assert!(config.display.vsync);
        assert_eq!(config.device.depth_format, DepthFormat::Depth32Float);
        assert_eq!(config.device.shader_model, ShaderModel::Sm4);
        assert_eq!(config.device.sample_count, 8);
        assert_eq!(
            config.assets.default_textures.diffuse,
            PathBuf::from("tex/white.png")
        );
        assert_eq!(
            config.assets.default_textures.normal,
            PathBuf::from("data/DefaultTex/default_normal.png")
        );
        assert_eq!(config.log_filter.as_deref(), Some("prism_engine=debug"));

        let request = config.present_request();
        assert_eq!(request.depth_format, wgpu::TextureFormat::Depth32Float);
        assert!((config.projection().aspect - 800.0 / 600.0).abs() < 1e-6);
        assert_eq!(config.clear_values().color.r, 0.0);
    }

    #[test]
    fn unknown_depth_format_is_rejected() {
        let err = RendererConfig::from_toml_str("[device]\ndepth_format = \"d16\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prism.toml");
        std::fs::write(&path, "[shader]\nhot_reload = false\n").unwrap();

        let config = RendererConfig::load(&path).unwrap();
        assert!(!config.shader.hot_reload);

        let missing = RendererConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }

    #[test]
    fn defaults_round_trip_through_toml() {
        let text = toml::to_string(&RendererConfig::default()).unwrap();
        assert_eq!(
            RendererConfig::from_toml_str(&text).unwrap(),
            RendererConfig::default()
        );
    }
}
