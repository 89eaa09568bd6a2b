use std::path::PathBuf;

use winit::dpi::PhysicalSize;

use crate::asset::MaterialImages;
use crate::batch::{Batch, PackedGeometry};
use crate::device::surface::status_for;
use crate::device::{
    BufferError, ClearValues, DeviceError, DeviceState, DeviceStatus, Gpu, GpuFrame,
    GraphicsBackend,
};

use super::buffers::StaticGeometry;
use super::camera::FrameConstants;
use super::materials::{material_bind_group_layout, material_sampler, upload_materials};
use super::shader::{PipelineSetup, ShaderError, ShaderProgram, TechniqueDesc};
use super::targets::RenderTargets;

/// [`GraphicsBackend`] on top of wgpu.
///
/// A scene is one wgpu render pass. Technique passes switch pipelines inside
/// it, so pass boundaries cost a pipeline change rather than a new attachment
/// load/store.
pub struct WgpuBackend {
    gpu: Gpu,
    shader_path: PathBuf,

    pipeline_layout: wgpu::PipelineLayout,
    material_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    frame_buffer: wgpu::Buffer,
    frame_group: wgpu::BindGroup,

    program: ShaderProgram,
    targets: RenderTargets,
    materials: Vec<wgpu::BindGroup>,

    frame: Option<GpuFrame>,
    pass: Option<wgpu::RenderPass<'static>>,
    last_constants: Option<FrameConstants>,
    bound_material: Option<usize>,
    needs_reconfigure: bool,
    fatal: Option<String>,
}

impl WgpuBackend {
    /// Builds layouts, targets and the initial shader program.
    ///
    /// A shader that fails to compile here is a setup error; later reloads
    /// only log.
    pub fn new(gpu: Gpu, shader_path: impl Into<PathBuf>) -> Result<Self, ShaderError> {
        let shader_path = shader_path.into();
        let device = gpu.device();

        let frame_layout = frame_bind_group_layout(device);
        let material_layout = material_bind_group_layout(device);
        let pipeline_layout = scene_pipeline_layout(device, &frame_layout, &material_layout);

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("prism frame constants"),
            size: FrameConstants::SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("prism frame bind group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let sampler = material_sampler(device);
        let targets = RenderTargets::new(device, gpu.params(), gpu.size());
        let program = ShaderProgram::load(
            device,
            &shader_path,
            &pipeline_setup(&gpu, &pipeline_layout),
        )?;

        Ok(Self {
            gpu,
            shader_path,
            pipeline_layout,
            material_layout,
            sampler,
            frame_buffer,
            frame_group,
            program,
            targets,
            materials: Vec::new(),
            frame: None,
            pass: None,
            last_constants: None,
            bound_material: None,
            needs_reconfigure: false,
            fatal: None,
        })
    }

    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    /// Records a new drawable size. The next status query reports the device
    /// as needing a reset so targets are rebuilt at the new size.
    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        if size != self.gpu.size() {
            self.gpu.resize(size);
            self.needs_reconfigure = true;
        }
    }

    /// Message passed to the last fatal notification, if any.
    pub fn fatal_message(&self) -> Option<&str> {
        self.fatal.as_deref()
    }

    fn release_frame(&mut self) {
        self.pass = None;
        self.frame = None;
        self.last_constants = None;
        self.bound_material = None;
    }
}

/// Layout of the per-frame constants uniform.
pub(crate) fn frame_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("prism frame bgl"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(FrameConstants::SIZE),
            },
            count: None,
        }],
    })
}

pub(crate) fn scene_pipeline_layout(
    device: &wgpu::Device,
    frame_layout: &wgpu::BindGroupLayout,
    material_layout: &wgpu::BindGroupLayout,
) -> wgpu::PipelineLayout {
    device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("prism pipeline layout"),
        bind_group_layouts: &[frame_layout, material_layout],
        immediate_size: 0,
    })
}

fn pipeline_setup<'a>(gpu: &Gpu, layout: &'a wgpu::PipelineLayout) -> PipelineSetup<'a> {
    let params = gpu.params();
    PipelineSetup {
        layout,
        color_format: params.surface_format,
        depth_format: params.depth_format,
        sample_count: params.sample_count,
    }
}

impl GraphicsBackend for WgpuBackend {
    type StaticBuffers = StaticGeometry;

    fn create_static_buffers(
        &mut self,
        packed: &PackedGeometry,
    ) -> Result<StaticGeometry, BufferError> {
        if self.gpu.driver_faulted() {
            return Err(BufferError::DeviceUnavailable);
        }
        StaticGeometry::upload(self.gpu.device(), packed)
    }

    fn upload_materials(&mut self, materials: &[MaterialImages]) -> Result<(), BufferError> {
        if self.gpu.driver_faulted() {
            return Err(BufferError::DeviceUnavailable);
        }
        self.materials = upload_materials(
            self.gpu.device(),
            self.gpu.queue(),
            &self.material_layout,
            &self.sampler,
            materials,
        )?;
        Ok(())
    }

    fn check_status(&mut self) -> DeviceStatus {
        self.release_frame();

        if self.gpu.driver_faulted() {
            return DeviceStatus::DriverInternalError;
        }
        if !self.gpu.has_drawable_size() {
            return DeviceStatus::Lost;
        }
        if self.needs_reconfigure {
            return DeviceStatus::NotReset;
        }

        match self.gpu.acquire_frame() {
            Ok(frame) => {
                self.frame = Some(frame);
                DeviceStatus::Ok
            }
            Err(e) => {
                log::debug!("frame acquisition failed: {e}");
                status_for(&e)
            }
        }
    }

    fn on_device_lost(&mut self) {
        self.release_frame();
    }

    fn on_device_available(&mut self) -> Result<(), DeviceError> {
        self.release_frame();
        self.gpu.reset()?;
        self.targets = RenderTargets::new(self.gpu.device(), self.gpu.params(), self.gpu.size());
        self.needs_reconfigure = false;
        log::debug!(
            "rebuilt render targets at {}x{}",
            self.gpu.size().width,
            self.gpu.size().height
        );
        Ok(())
    }

    fn notify_fatal(&mut self, message: &str) {
        self.release_frame();
        log::error!("fatal graphics error: {message}");
        self.gpu.window().set_title(&format!("prism: fatal error: {message}"));
        self.fatal = Some(message.to_string());
    }

    fn on_state_changed(&mut self, _from: DeviceState, to: DeviceState) {
        if to == DeviceState::Operational {
            self.gpu.window().request_redraw();
        }
    }

    fn techniques(&self) -> &[TechniqueDesc] {
        self.program.techniques()
    }

    fn recompile_shader(&mut self) -> Result<(), ShaderError> {
        let program = ShaderProgram::load(
            self.gpu.device(),
            &self.shader_path,
            &pipeline_setup(&self.gpu, &self.pipeline_layout),
        )?;
        self.program = program;
        Ok(())
    }

    fn begin_scene(&mut self, clear: &ClearValues) {
        let Some(frame) = self.frame.as_mut() else {
            log::warn!("begin_scene without an acquired frame");
            return;
        };

        let (view, resolve_target) = match self.targets.msaa() {
            Some(msaa) => (msaa, Some(&frame.view)),
            None => (&frame.view, None),
        };

        let pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("prism scene pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear.color),
                    store: if resolve_target.is_some() {
                        wgpu::StoreOp::Discard
                    } else {
                        wgpu::StoreOp::Store
                    },
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: self.targets.depth(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear.depth),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: self.targets.has_stencil().then_some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear.stencil),
                    store: wgpu::StoreOp::Store,
                }),
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        self.pass = Some(pass.forget_lifetime());
    }

    fn bind_static_buffers(&mut self, buffers: &StaticGeometry) {
        let Some(pass) = self.pass.as_mut() else { return };
        pass.set_vertex_buffer(0, buffers.vertex().slice(..));
        pass.set_index_buffer(buffers.index().slice(..), wgpu::IndexFormat::Uint32);
        pass.set_bind_group(0, &self.frame_group, &[]);
    }

    fn begin_pass(&mut self, technique: usize, pass_index: usize) {
        let Some(pass) = self.pass.as_mut() else { return };
        match self.program.pipeline(technique, pass_index) {
            Some(pipeline) => pass.set_pipeline(pipeline),
            None => log::warn!("no pipeline for technique {technique} pass {pass_index}"),
        }
    }

    fn set_frame_constants(&mut self, constants: &FrameConstants) {
        if self.last_constants.as_ref() == Some(constants) {
            return;
        }
        self.gpu
            .queue()
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(constants));
        self.last_constants = Some(*constants);
    }

    fn bind_material(&mut self, material_index: usize) {
        if self.bound_material == Some(material_index) {
            return;
        }
        let Some(pass) = self.pass.as_mut() else { return };
        let Some(group) = self.materials.get(material_index) else {
            log::warn!("material {material_index} has no bind group");
            return;
        };
        pass.set_bind_group(1, group, &[]);
        self.bound_material = Some(material_index);
    }

    fn draw_indexed(&mut self, batch: &Batch) {
        let Some(pass) = self.pass.as_mut() else { return };
        pass.draw_indexed(batch.index_range(), 0, 0..1);
    }

    // Passes are pipeline switches inside the single scene render pass.
    fn end_pass(&mut self) {}

    fn end_scene(&mut self) {
        self.pass = None;
    }

    fn present(&mut self) {
        self.pass = None;
        if let Some(frame) = self.frame.take() {
            self.gpu.submit(frame);
        }
    }
}
