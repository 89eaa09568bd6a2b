use std::collections::HashMap;
use std::sync::Arc;

use crate::asset::{MaterialImages, TextureImage, TextureSemantic};
use crate::device::BufferError;

use super::shader::SAMPLER_BINDING;

/// Layout of the material bind group: four 2D textures plus one sampler.
pub fn material_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    };

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("prism material bgl"),
        entries: &[
            texture(0),
            texture(1),
            texture(2),
            texture(3),
            wgpu::BindGroupLayoutEntry {
                binding: SAMPLER_BINDING,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

pub fn material_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("prism material sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    })
}

/// Uploads every material's textures and builds one bind group per material.
///
/// Images shared between materials (default assets, built-in texels) are
/// uploaded once.
pub fn upload_materials(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    materials: &[MaterialImages],
) -> Result<Vec<wgpu::BindGroup>, BufferError> {
    let max_dimension = device.limits().max_texture_dimension_2d;
    let mut uploaded: HashMap<(usize, bool), wgpu::TextureView> = HashMap::new();

    let mut groups = Vec::with_capacity(materials.len());
    for (index, images) in materials.iter().enumerate() {
        let mut views = Vec::with_capacity(TextureSemantic::ALL.len());
        for semantic in TextureSemantic::ALL {
            let image = images.get(semantic);
            let key = (Arc::as_ptr(image) as usize, semantic.is_color());
            let view = match uploaded.get(&key) {
                Some(view) => view.clone(),
                None => {
                    let view =
                        upload_texture(device, queue, image, semantic.is_color(), max_dimension)?;
                    uploaded.insert(key, view.clone());
                    view
                }
            };
            views.push(view);
        }

        let label = format!("prism material {index}");
        groups.push(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&views[0]),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&views[1]),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&views[2]),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&views[3]),
                },
                wgpu::BindGroupEntry {
                    binding: SAMPLER_BINDING,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        }));
    }

    log::info!(
        "uploaded {} material textures for {} materials",
        uploaded.len(),
        materials.len()
    );
    Ok(groups)
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    image: &TextureImage,
    srgb: bool,
    max_dimension: u32,
) -> Result<wgpu::TextureView, BufferError> {
    if image.width > max_dimension || image.height > max_dimension {
        return Err(BufferError::TextureTooLarge {
            width: image.width,
            height: image.height,
            limit: max_dimension,
        });
    }

    let size = wgpu::Extent3d {
        width: image.width,
        height: image.height,
        depth_or_array_layers: 1,
    };
    let format = if srgb {
        wgpu::TextureFormat::Rgba8UnormSrgb
    } else {
        wgpu::TextureFormat::Rgba8Unorm
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("prism material texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &image.rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * image.width),
            rows_per_image: Some(image.height),
        },
        size,
    );

    Ok(texture.create_view(&wgpu::TextureViewDescriptor::default()))
}
