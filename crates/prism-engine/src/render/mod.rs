//! Frame loop and the wgpu resources behind it.
//!
//! [`Renderer`] runs the per-frame protocol against any
//! [`GraphicsBackend`](crate::device::GraphicsBackend); [`WgpuBackend`] is the
//! implementation that talks to the GPU.

mod buffers;
mod camera;
mod hot_reload;
mod materials;
mod renderer;
mod shader;
mod targets;
mod wgpu_backend;

pub use buffers::StaticGeometry;
pub use camera::{FrameConstants, OrbitCamera, Projection, ViewSource};
pub use hot_reload::{FileWatch, NotifyWatch, ShaderHotReload, WatchError, WatchHandle};
pub use materials::{material_bind_group_layout, material_sampler, upload_materials};
pub use renderer::{FrameOutcome, Renderer, RendererSettings, SetupError};
pub use shader::{
    compile_wgsl, compile_wgsl_with, device_capabilities, PipelineSetup, ShaderError,
    ShaderProgram, TechniqueDesc, FRAME_GROUP, MATERIAL_GROUP, SAMPLER_BINDING, VERTEX_ENTRY,
};
pub use targets::RenderTargets;
pub use wgpu_backend::WgpuBackend;
