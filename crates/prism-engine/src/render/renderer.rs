use std::time::Duration;

use glam::Mat4;
use thiserror::Error;

use crate::asset::{IngestError, LoadedScene};
use crate::batch::Batch;
use crate::device::{
    BufferError, ClearValues, DeviceError, DeviceLifecycle, DeviceState, FrameGate,
    GraphicsBackend,
};

use super::camera::{FrameConstants, Projection, ViewSource};
use super::hot_reload::ShaderHotReload;
use super::shader::ShaderError;

/// Anything that stops the renderer from reaching its first frame.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("static buffer setup failed: {0}")]
    Buffer(#[from] BufferError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Shader(#[from] ShaderError),
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RendererSettings {
    pub clear: ClearValues,
    pub projection: Projection,
    /// Wait applied on every frame that finds the device lost.
    pub lost_backoff: Duration,
}

/// What happened to one call of [`Renderer::render_frame`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameOutcome {
    Presented { draws: usize },
    /// The device was not usable; nothing was submitted.
    Skipped(DeviceState),
    /// The device failed for good. No further frames will render.
    Halted,
}

/// Owns the device lifecycle and the static scene resources, and runs the
/// per-frame protocol over them.
pub struct Renderer<B: GraphicsBackend> {
    device: DeviceLifecycle<B>,
    buffers: B::StaticBuffers,
    batches: Vec<Batch>,
    world: Mat4,
    settings: RendererSettings,
    shader_reload: Option<ShaderHotReload>,
}

impl<B: GraphicsBackend> Renderer<B> {
    /// Uploads the scene's geometry and textures. Allocation failures here are
    /// fatal; the frame loop never starts with partial resources.
    pub fn new(
        mut backend: B,
        scene: &LoadedScene,
        settings: RendererSettings,
    ) -> Result<Self, SetupError> {
        let buffers = backend.create_static_buffers(&scene.packed)?;
        backend.upload_materials(&scene.materials)?;

        log::info!(
            "renderer ready: {} batches, {} techniques",
            scene.packed.batches.len(),
            backend.techniques().len()
        );

        Ok(Self {
            device: DeviceLifecycle::new(backend, settings.lost_backoff),
            buffers,
            batches: scene.packed.batches.clone(),
            world: Mat4::IDENTITY,
            settings,
            shader_reload: None,
        })
    }

    pub fn set_shader_reload(&mut self, reload: ShaderHotReload) {
        self.shader_reload = Some(reload);
    }

    pub fn set_world(&mut self, world: Mat4) {
        self.world = world;
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.settings.projection.aspect = aspect;
    }

    pub fn device_state(&self) -> DeviceState {
        self.device.state()
    }

    pub fn backend(&self) -> &B {
        self.device.backend()
    }

    pub fn backend_mut(&mut self) -> &mut B {
        self.device.backend_mut()
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Runs one frame: status query and clear, draws, then present.
    ///
    /// If the device is not operational the frame stops after the status
    /// query. Nothing from a skipped frame carries into the next one.
    pub fn render_frame(&mut self, view: &dyn ViewSource) -> FrameOutcome {
        let constants = FrameConstants::new(self.world, view, &self.settings.projection);

        match self.device.begin_frame() {
            FrameGate::Proceed => {}
            FrameGate::Skip => return FrameOutcome::Skipped(self.device.state()),
            FrameGate::Halt => return FrameOutcome::Halted,
        }

        let backend = self.device.backend_mut();
        backend.begin_scene(&self.settings.clear);

        if self.shader_reload.as_mut().is_some_and(ShaderHotReload::poll) {
            match backend.recompile_shader() {
                Ok(()) => log::info!("shader reloaded"),
                Err(e) => log::error!("shader reload failed, keeping previous shader: {e}"),
            }
        }

        backend.bind_static_buffers(&self.buffers);

        let passes: Vec<usize> = backend.techniques().iter().map(|t| t.passes).collect();
        let mut draws = 0;
        for batch in &self.batches {
            for (technique, &count) in passes.iter().enumerate() {
                for pass in 0..count {
                    backend.begin_pass(technique, pass);
                    backend.set_frame_constants(&constants);
                    backend.bind_material(batch.material_index);
                    backend.draw_indexed(batch);
                    backend.end_pass();
                    draws += 1;
                }
            }
        }

        backend.end_scene();
        backend.present();
        log::trace!("frame presented with {draws} draws");

        FrameOutcome::Presented { draws }
    }
}
