use crate::asset::MaterialImages;
use crate::batch::{Batch, PackedGeometry};
use crate::render::{FrameConstants, ShaderError, TechniqueDesc};

use super::{BufferError, DeviceError, DeviceState, DeviceStatus};

/// Values the back buffer and depth/stencil target are cleared to.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClearValues {
    pub color: wgpu::Color,
    pub depth: f32,
    pub stencil: u32,
}

impl Default for ClearValues {
    fn default() -> Self {
        Self {
            color: wgpu::Color {
                r: 169.0 / 255.0,
                g: 1.0,
                b: 1.0,
                a: 1.0,
            },
            depth: 1.0,
            stencil: 0,
        }
    }
}

/// Capability set the renderer drives.
///
/// One implementation talks to wgpu; tests script a fake. Call order within a
/// frame is fixed by the renderer:
/// `check_status`, `begin_scene`, `bind_static_buffers`, then per batch and
/// pass `begin_pass`, `set_frame_constants`, `bind_material`, `draw_indexed`,
/// `end_pass`, and finally `end_scene`, `present`.
pub trait GraphicsBackend {
    /// Handle to the uploaded vertex and index buffers.
    type StaticBuffers;

    /// Allocates and fills the static buffers in one bulk write.
    fn create_static_buffers(
        &mut self,
        packed: &PackedGeometry,
    ) -> Result<Self::StaticBuffers, BufferError>;

    /// Uploads decoded material textures, indexed like the model's materials.
    fn upload_materials(&mut self, materials: &[MaterialImages]) -> Result<(), BufferError>;

    /// The single per-frame device status query.
    fn check_status(&mut self) -> DeviceStatus;

    /// Device went away; drop anything tied to the current frame.
    fn on_device_lost(&mut self);

    /// Rebuilds device-dependent, non-static resources.
    fn on_device_available(&mut self) -> Result<(), DeviceError>;

    /// Surfaces an unrecoverable failure to the user.
    fn notify_fatal(&mut self, message: &str);

    fn on_state_changed(&mut self, _from: DeviceState, _to: DeviceState) {}

    /// Techniques of the active shader, each with its pass count.
    fn techniques(&self) -> &[TechniqueDesc];

    /// Recompiles the shader from source. On error the previous program stays
    /// active.
    fn recompile_shader(&mut self) -> Result<(), ShaderError>;

    fn begin_scene(&mut self, clear: &ClearValues);
    fn bind_static_buffers(&mut self, buffers: &Self::StaticBuffers);
    fn begin_pass(&mut self, technique: usize, pass: usize);
    fn set_frame_constants(&mut self, constants: &FrameConstants);
    fn bind_material(&mut self, material_index: usize);
    fn draw_indexed(&mut self, batch: &Batch);
    fn end_pass(&mut self);
    fn end_scene(&mut self);
    fn present(&mut self);
}
