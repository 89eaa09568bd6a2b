//! WGSL shader programs made of techniques and passes.
//!
//! A technique is declared by its fragment entry points: `fs_<technique>_p<N>`
//! is pass `N` of `<technique>`. Every pass shares the `vs_main` vertex stage.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::asset::Vertex;

pub const VERTEX_ENTRY: &str = "vs_main";
const FRAGMENT_PREFIX: &str = "fs_";

/// Slot of the frame constants uniform.
pub const FRAME_GROUP: u32 = 0;
/// Slot of the material textures and sampler.
pub const MATERIAL_GROUP: u32 = 1;
/// Sampler binding inside [`MATERIAL_GROUP`]; textures occupy 0..4.
pub const SAMPLER_BINDING: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechniqueDesc {
    pub name: String,
    pub passes: usize,
}

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to read shader {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("shader parse error:\n{0}")]
    Parse(String),

    #[error("shader validation error: {0}")]
    Validation(String),

    #[error("shader has no vertex entry point `vs_main`")]
    MissingVertexEntry,

    #[error("shader declares no techniques (expected fragment entry points named fs_<technique>_p<pass>)")]
    NoTechniques,

    #[error("technique `{technique}` is missing pass {missing}")]
    PassGap { technique: String, missing: usize },

    #[error("@group({group}) @binding({binding}): {reason}")]
    Binding {
        group: u32,
        binding: u32,
        reason: String,
    },
}

/// Splits `fs_<technique>_p<N>` into its technique name and pass number.
pub fn parse_fragment_entry(name: &str) -> Option<(&str, usize)> {
    let rest = name.strip_prefix(FRAGMENT_PREFIX)?;
    let (technique, pass) = rest.rsplit_once("_p")?;
    if technique.is_empty() {
        return None;
    }
    Some((technique, pass.parse().ok()?))
}

/// Groups fragment entry points into techniques.
///
/// Techniques keep first-declaration order; passes must run 0..N without gaps.
/// Entry points that do not follow the naming scheme are ignored.
pub fn technique_layout<'a>(
    fragment_entries: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<TechniqueDesc>, ShaderError> {
    let mut found: Vec<(String, Vec<usize>)> = Vec::new();

    for entry in fragment_entries {
        let Some((technique, pass)) = parse_fragment_entry(entry) else {
            log::debug!("ignoring fragment entry point `{entry}`");
            continue;
        };
        match found.iter_mut().find(|(name, _)| name == technique) {
            Some((_, passes)) => passes.push(pass),
            None => found.push((technique.to_string(), vec![pass])),
        }
    }

    if found.is_empty() {
        return Err(ShaderError::NoTechniques);
    }

    found
        .into_iter()
        .map(|(name, mut passes)| {
            passes.sort_unstable();
            passes.dedup();
            if let Some(missing) = (0..passes.len()).find(|&i| passes[i] != i) {
                return Err(ShaderError::PassGap {
                    technique: name,
                    missing,
                });
            }
            Ok(TechniqueDesc {
                name,
                passes: passes.len(),
            })
        })
        .collect()
}

/// Fragment entry point name of `pass` in `technique`.
pub fn fragment_entry(technique: &str, pass: usize) -> String {
    format!("{FRAGMENT_PREFIX}{technique}_p{pass}")
}

/// Parses and validates WGSL against the baseline capability set, returning
/// the technique layout it declares.
pub fn compile_wgsl(source: &str) -> Result<Vec<TechniqueDesc>, ShaderError> {
    compile_wgsl_with(source, naga::valid::Capabilities::default())
}

/// Like [`compile_wgsl`], validating against `capabilities`.
///
/// Runs before any GPU object is created, so a broken source never reaches
/// the device.
pub fn compile_wgsl_with(
    source: &str,
    capabilities: naga::valid::Capabilities,
) -> Result<Vec<TechniqueDesc>, ShaderError> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| ShaderError::Parse(e.emit_to_string(source)))?;

    naga::valid::Validator::new(naga::valid::ValidationFlags::all(), capabilities)
        .validate(&module)
        .map_err(|e| ShaderError::Validation(e.to_string()))?;

    let has_vertex = module
        .entry_points
        .iter()
        .any(|ep| ep.stage == naga::ShaderStage::Vertex && ep.name == VERTEX_ENTRY);
    if !has_vertex {
        return Err(ShaderError::MissingVertexEntry);
    }

    check_bindings(&module)?;

    technique_layout(
        module
            .entry_points
            .iter()
            .filter(|ep| ep.stage == naga::ShaderStage::Fragment)
            .map(|ep| ep.name.as_str()),
    )
}

/// Shader capabilities the device actually enabled.
pub fn device_capabilities(features: wgpu::Features) -> naga::valid::Capabilities {
    use naga::valid::Capabilities as Caps;

    let mut caps = Caps::default();
    let mapping = [
        (wgpu::Features::IMMEDIATES, Caps::IMMEDIATES),
        (wgpu::Features::SHADER_F64, Caps::FLOAT64),
        (wgpu::Features::SHADER_F16, Caps::SHADER_FLOAT16),
        (wgpu::Features::SHADER_INT64, Caps::SHADER_INT64),
        (wgpu::Features::SHADER_PRIMITIVE_INDEX, Caps::PRIMITIVE_INDEX),
        (wgpu::Features::SHADER_EARLY_DEPTH_TEST, Caps::EARLY_DEPTH_TEST),
        (wgpu::Features::MULTIVIEW, Caps::MULTIVIEW),
        (wgpu::Features::DUAL_SOURCE_BLENDING, Caps::DUAL_SOURCE_BLENDING),
        (
            wgpu::Features::TEXTURE_BINDING_ARRAY,
            Caps::TEXTURE_AND_SAMPLER_BINDING_ARRAY,
        ),
    ];
    for (feature, cap) in mapping {
        caps.set(cap, features.contains(feature));
    }
    caps
}

/// Rejects resources that do not match the renderer's bind group layouts.
fn check_bindings(module: &naga::Module) -> Result<(), ShaderError> {
    for (_, var) in module.global_variables.iter() {
        let Some(binding) = &var.binding else { continue };
        let (group, index) = (binding.group, binding.binding);
        let inner = &module.types[var.ty].inner;

        let mismatch = |reason: &str| ShaderError::Binding {
            group,
            binding: index,
            reason: reason.to_string(),
        };

        match (group, index) {
            (FRAME_GROUP, 0) => {
                if var.space != naga::AddressSpace::Uniform {
                    return Err(mismatch("frame constants must be a uniform buffer"));
                }
            }
            (MATERIAL_GROUP, 0..=3) => {
                let sampled_2d = matches!(
                    inner,
                    naga::TypeInner::Image {
                        dim: naga::ImageDimension::D2,
                        arrayed: false,
                        class: naga::ImageClass::Sampled { multi: false, .. },
                    }
                );
                if !sampled_2d {
                    return Err(mismatch("material slots must be texture_2d<f32>"));
                }
            }
            (MATERIAL_GROUP, SAMPLER_BINDING) => {
                if !matches!(inner, naga::TypeInner::Sampler { comparison: false }) {
                    return Err(mismatch("material sampler must be a filtering sampler"));
                }
            }
            _ => return Err(mismatch("not provided by the renderer")),
        }
    }
    Ok(())
}

/// Fixed pipeline inputs shared by every technique pass.
pub struct PipelineSetup<'a> {
    pub layout: &'a wgpu::PipelineLayout,
    pub color_format: wgpu::TextureFormat,
    pub depth_format: wgpu::TextureFormat,
    pub sample_count: u32,
}

/// Compiled shader: one render pipeline per technique pass.
pub struct ShaderProgram {
    techniques: Vec<TechniqueDesc>,
    pipelines: Vec<Vec<wgpu::RenderPipeline>>,
}

impl ShaderProgram {
    /// Reads, validates and builds the program at `path`.
    pub fn load(
        device: &wgpu::Device,
        path: &Path,
        setup: &PipelineSetup<'_>,
    ) -> Result<Self, ShaderError> {
        let source = std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let program = Self::build(device, &source, setup)?;

        log::info!(
            "compiled {}: {}",
            path.display(),
            program
                .techniques
                .iter()
                .map(|t| format!("{} ({} passes)", t.name, t.passes))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(program)
    }

    /// Validates `source` and creates its pipelines.
    ///
    /// Module and pipeline creation run inside a validation error scope, so
    /// source that naga accepts but the device rejects comes back as
    /// [`ShaderError::Validation`] instead of reaching the uncaptured error
    /// handler.
    pub fn build(
        device: &wgpu::Device,
        source: &str,
        setup: &PipelineSetup<'_>,
    ) -> Result<Self, ShaderError> {
        let techniques = compile_wgsl_with(source, device_capabilities(device.features()))?;

        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("prism scene shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let pipelines: Vec<Vec<_>> = techniques
            .iter()
            .map(|t| {
                (0..t.passes)
                    .map(|pass| build_pipeline(device, &module, setup, &t.name, pass))
                    .collect()
            })
            .collect();

        if let Some(error) = pollster::block_on(scope.pop()) {
            return Err(ShaderError::Validation(error.to_string()));
        }

        Ok(Self {
            techniques,
            pipelines,
        })
    }

    pub fn techniques(&self) -> &[TechniqueDesc] {
        &self.techniques
    }

    pub fn pipeline(&self, technique: usize, pass: usize) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(technique)?.get(pass)
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    module: &wgpu::ShaderModule,
    setup: &PipelineSetup<'_>,
    technique: &str,
    pass: usize,
) -> wgpu::RenderPipeline {
    let entry = fragment_entry(technique, pass);
    let label = format!("prism {technique} pass {pass}");

    // First pass lays down depth; later passes add onto it.
    let (blend, depth_write_enabled, depth_compare) = if pass == 0 {
        (wgpu::BlendState::REPLACE, true, wgpu::CompareFunction::Less)
    } else {
        (additive_blend(), false, wgpu::CompareFunction::LessEqual)
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(setup.layout),

        vertex: wgpu::VertexState {
            module,
            entry_point: Some(VERTEX_ENTRY),
            compilation_options: Default::default(),
            buffers: &[Vertex::layout()],
        },

        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some(&entry),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: setup.color_format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Cw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: Some(wgpu::DepthStencilState {
            format: setup.depth_format,
            depth_write_enabled,
            depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),

        multisample: wgpu::MultisampleState {
            count: setup.sample_count,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },

        multiview_mask: None,
        cache: None,
    })
}

fn additive_blend() -> wgpu::BlendState {
    let add = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: add,
        alpha: add,
    }
}
