use thiserror::Error;

use super::ShaderModel;

/// Failure while creating or resetting the graphics device.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("failed to create window surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("adapter supports shader model {found:?}, {required:?} is required")]
    ShaderModelUnsupported {
        required: ShaderModel,
        found: ShaderModel,
    },

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,

    #[error("surface is unavailable ({width}x{height}); cannot reset")]
    SurfaceUnavailable { width: u32, height: u32 },
}

/// Failure while allocating the static buffers or material textures.
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("{label} needs {size} bytes; device allows {limit}")]
    TooLarge {
        label: &'static str,
        size: u64,
        limit: u64,
    },

    #[error("texture {width}x{height} exceeds the device limit of {limit}")]
    TextureTooLarge { width: u32, height: u32, limit: u32 },

    #[error("device unavailable during buffer setup")]
    DeviceUnavailable,
}
