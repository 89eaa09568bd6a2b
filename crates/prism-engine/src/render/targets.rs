use winit::dpi::PhysicalSize;

use crate::device::PresentParams;

/// Size-dependent attachments: depth/stencil and the optional MSAA color
/// buffer resolved into the back buffer.
///
/// Rebuilt on every device reset.
pub struct RenderTargets {
    depth: wgpu::TextureView,
    msaa: Option<wgpu::TextureView>,
    has_stencil: bool,
}

impl RenderTargets {
    pub fn new(device: &wgpu::Device, params: &PresentParams, size: PhysicalSize<u32>) -> Self {
        let extent = wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        };

        let depth = attachment(
            device,
            "prism depth target",
            extent,
            params.depth_format,
            params.sample_count,
        );
        let msaa = (params.sample_count > 1).then(|| {
            attachment(
                device,
                "prism msaa target",
                extent,
                params.surface_format,
                params.sample_count,
            )
        });

        Self {
            depth,
            msaa,
            has_stencil: params.depth_format.has_stencil_aspect(),
        }
    }

    pub fn depth(&self) -> &wgpu::TextureView {
        &self.depth
    }

    /// Multisampled color view, `None` when rendering straight to the back buffer.
    pub fn msaa(&self) -> Option<&wgpu::TextureView> {
        self.msaa.as_ref()
    }

    pub fn has_stencil(&self) -> bool {
        self.has_stencil
    }
}

fn attachment(
    device: &wgpu::Device,
    label: &str,
    size: wgpu::Extent3d,
    format: wgpu::TextureFormat,
    sample_count: u32,
) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}
