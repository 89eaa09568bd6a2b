//! Capability probes consulted before the device is created.

use serde::{Deserialize, Serialize};

use super::DeviceError;
use super::surface;

/// Shader model tiers, ordered by capability.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum ShaderModel {
    Sm2,
    Sm4,
    Sm5,
}

/// Read-only adapter queries used to pick presentation parameters.
pub trait AdapterProbe {
    fn shader_model(&self) -> ShaderModel;

    /// Whether a render target of `format` can be multisampled `count` times.
    fn supports_sample_count(&self, format: wgpu::TextureFormat, count: u32) -> bool;
}

impl AdapterProbe for wgpu::Adapter {
    fn shader_model(&self) -> ShaderModel {
        match self.get_downlevel_capabilities().shader_model {
            wgpu::ShaderModel::Sm2 => ShaderModel::Sm2,
            wgpu::ShaderModel::Sm4 => ShaderModel::Sm4,
            wgpu::ShaderModel::Sm5 => ShaderModel::Sm5,
        }
    }

    fn supports_sample_count(&self, format: wgpu::TextureFormat, count: u32) -> bool {
        match count {
            1 => true,
            // 4x is guaranteed for renderable formats without adapter features.
            4 => format
                .guaranteed_format_features(self.features())
                .flags
                .sample_count_supported(4),
            _ => {
                self.features()
                    .contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES)
                    && self
                        .get_texture_format_features(format)
                        .flags
                        .sample_count_supported(count)
            }
        }
    }
}

/// Inputs for [`PresentParams::choose`].
#[derive(Debug, Clone)]
pub struct PresentRequest {
    pub width: u32,
    pub height: u32,
    pub prefer_srgb: bool,
    pub vsync: bool,
    pub sample_count: u32,
    pub depth_format: wgpu::TextureFormat,
    pub shader_model: ShaderModel,
}

/// Presentation parameters fixed at setup.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentParams {
    pub width: u32,
    pub height: u32,
    pub surface_format: wgpu::TextureFormat,
    pub depth_format: wgpu::TextureFormat,
    pub sample_count: u32,
    pub present_mode: wgpu::PresentMode,
    pub alpha_mode: wgpu::CompositeAlphaMode,
}

impl PresentParams {
    /// Picks parameters the adapter and surface can honor.
    ///
    /// The multisample count starts at the request and halves until both the
    /// surface and depth formats support it.
    pub fn choose(
        probe: &dyn AdapterProbe,
        caps: &wgpu::SurfaceCapabilities,
        request: &PresentRequest,
    ) -> Result<Self, DeviceError> {
        let found = probe.shader_model();
        if found < request.shader_model {
            return Err(DeviceError::ShaderModelUnsupported {
                required: request.shader_model,
                found,
            });
        }

        let surface_format = surface::choose_surface_format(caps, request.prefer_srgb)
            .ok_or(DeviceError::NoSurfaceFormat)?;

        let sample_count = sample_counts(request.sample_count)
            .find(|&count| {
                probe.supports_sample_count(surface_format, count)
                    && probe.supports_sample_count(request.depth_format, count)
            })
            .unwrap_or(1);

        if sample_count != request.sample_count {
            log::info!(
                "{}x multisampling unsupported, using {}x",
                request.sample_count,
                sample_count
            );
        }

        Ok(Self {
            width: request.width,
            height: request.height,
            surface_format,
            depth_format: request.depth_format,
            sample_count,
            present_mode: surface::choose_present_mode(caps, request.vsync),
            alpha_mode: surface::choose_alpha_mode(caps, None),
        })
    }

    /// Device features these parameters rely on.
    pub fn required_features(&self) -> wgpu::Features {
        match self.sample_count {
            1 | 4 => wgpu::Features::empty(),
            _ => wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES,
        }
    }
}

fn sample_counts(requested: u32) -> impl Iterator<Item = u32> {
    std::iter::successors(Some(requested.max(1)), |&n| (n > 1).then_some(n / 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeProbe {
        model: ShaderModel,
        max_samples: u32,
    }

    impl AdapterProbe for FakeProbe {
        fn shader_model(&self) -> ShaderModel {
            self.model
        }

        fn supports_sample_count(&self, _format: wgpu::TextureFormat, count: u32) -> bool {
            count <= self.max_samples
        }
    }

    fn caps() -> wgpu::SurfaceCapabilities {
        wgpu::SurfaceCapabilities {
            formats: vec![
                wgpu::TextureFormat::Bgra8Unorm,
                wgpu::TextureFormat::Bgra8UnormSrgb,
            ],
            present_modes: vec![wgpu::PresentMode::Fifo, wgpu::PresentMode::Immediate],
            alpha_modes: vec![wgpu::CompositeAlphaMode::Opaque],
            usages: wgpu::TextureUsages::RENDER_ATTACHMENT,
        }
    }

    fn request() -> PresentRequest {
        PresentRequest {
            width: 1280,
            height: 720,
            prefer_srgb: true,
            vsync: true,
            sample_count: 8,
            depth_format: wgpu::TextureFormat::Depth24PlusStencil8,
            shader_model: ShaderModel::Sm5,
        }
    }

    #[test]
    fn takes_requested_samples_when_supported() {
        let probe = FakeProbe { model: ShaderModel::Sm5, max_samples: 8 };
        let params = PresentParams::choose(&probe, &caps(), &request()).unwrap();

        assert_eq!(params.sample_count, 8);
        assert_eq!(params.surface_format, wgpu::TextureFormat::Bgra8UnormSrgb);
        assert_eq!(params.present_mode, wgpu::PresentMode::Fifo);
        assert_eq!((params.width, params.height), (1280, 720));
        assert!(params
            .required_features()
            .contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES));
    }

    #[test]
    fn falls_back_to_lower_sample_counts() {
        let four = FakeProbe { model: ShaderModel::Sm5, max_samples: 4 };
        let params = PresentParams::choose(&four, &caps(), &request()).unwrap();
        assert_eq!(params.sample_count, 4);
        assert_eq!(params.required_features(), wgpu::Features::empty());

        let none = FakeProbe { model: ShaderModel::Sm5, max_samples: 1 };
        assert_eq!(
            PresentParams::choose(&none, &caps(), &request()).unwrap().sample_count,
            1
        );
    }

    #[test]
    fn rejects_insufficient_shader_model() {
        let probe = FakeProbe { model: ShaderModel::Sm4, max_samples: 8 };
        let err = PresentParams::choose(&probe, &caps(), &request()).unwrap_err();
        assert!(matches!(
            err,
            DeviceError::ShaderModelUnsupported {
                required: ShaderModel::Sm5,
                found: ShaderModel::Sm4,
            }
        ));
    }

    #[test]
    fn no_vsync_prefers_uncapped_modes() {
        let probe = FakeProbe { model: ShaderModel::Sm5, max_samples: 1 };
        let params = PresentParams::choose(
            &probe,
            &caps(),
            &PresentRequest { vsync: false, ..request() },
        )
        .unwrap();
        assert_eq!(params.present_mode, wgpu::PresentMode::Immediate);
    }

    #[test]
    fn empty_surface_caps_fail() {
        let probe = FakeProbe { model: ShaderModel::Sm5, max_samples: 1 };
        let empty = wgpu::SurfaceCapabilities {
            formats: vec![],
            ..caps()
        };
        let err = PresentParams::choose(&probe, &empty, &request()).unwrap_err();
        assert!(matches!(err, DeviceError::NoSurfaceFormat));
    }
}
