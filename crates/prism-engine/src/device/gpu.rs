use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::caps::{AdapterProbe, PresentParams, PresentRequest};
use super::{DeviceError, GpuFrame};

/// Owns the wgpu adapter, device, queue and the window surface.
///
/// The surface borrows nothing: it keeps its own handle on the window, so the
/// context can live in the same struct as the window it presents to.
pub struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    params: PresentParams,
    size: PhysicalSize<u32>,
    /// Set from the device-lost callback when the driver drops the device.
    driver_fault: Arc<AtomicBool>,
}

impl Gpu {
    /// Creates a GPU context presenting to `window`.
    ///
    /// Capability probes run against the adapter before the device is
    /// requested, so the device is created with exactly the features the
    /// chosen presentation parameters need.
    pub async fn new(window: Arc<Window>, request: PresentRequest) -> Result<Self, DeviceError> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(DeviceError::SurfaceUnavailable {
                width: size.width,
                height: size.height,
            });
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let info = adapter.get_info();
        log::info!(
            "adapter: {} ({:?}, {:?}), shader model {:?}",
            info.name,
            info.backend,
            info.device_type,
            adapter.shader_model()
        );

        let caps = surface.get_capabilities(&adapter);
        let params = PresentParams::choose(&adapter, &caps, &request)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("prism device"),
                required_features: params.required_features(),
                required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await?;

        let driver_fault = Arc::new(AtomicBool::new(false));
        let flag = driver_fault.clone();
        device.set_device_lost_callback(move |reason, message| {
            if !matches!(reason, wgpu::DeviceLostReason::Destroyed) {
                log::error!("device lost: {message}");
                flag.store(true, Ordering::SeqCst);
            }
        });

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: params.surface_format,
            width: size.width,
            height: size.height,
            present_mode: params.present_mode,
            alpha_mode: params.alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        log::info!(
            "surface {}x{} {:?}, {}x MSAA, {:?}",
            size.width,
            size.height,
            params.surface_format,
            params.sample_count,
            params.present_mode
        );

        Ok(Gpu {
            window,
            surface,
            adapter,
            device,
            queue,
            config,
            params,
            size,
            driver_fault,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn params(&self) -> &PresentParams {
        &self.params
    }

    /// Current drawable size in physical pixels.
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn has_drawable_size(&self) -> bool {
        self.size.width > 0 && self.size.height > 0
    }

    /// True once the driver has dropped the device for good.
    pub fn driver_faulted(&self) -> bool {
        self.driver_fault.load(Ordering::SeqCst)
    }

    /// Records a new drawable size; the surface is reconfigured on the next
    /// reset.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.size = new_size;
    }

    /// Reconfigures the surface for the current drawable size.
    pub fn reset(&mut self) -> Result<(), DeviceError> {
        if !self.has_drawable_size() {
            return Err(DeviceError::SurfaceUnavailable {
                width: self.size.width,
                height: self.size.height,
            });
        }

        self.config.width = self.size.width;
        self.config.height = self.size.height;
        self.surface.configure(&self.device, &self.config);
        Ok(())
    }

    /// Acquires the next back buffer and a command encoder for it.
    pub fn acquire_frame(&self) -> Result<GpuFrame, wgpu::SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("prism frame encoder"),
            });

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    /// Submits the recorded commands and presents the back buffer.
    pub fn submit(&self, frame: GpuFrame) {
        self.queue.submit(std::iter::once(frame.encoder.finish()));
        drop(frame.view);
        frame.surface_texture.present();
    }
}
