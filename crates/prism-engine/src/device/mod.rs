//! Graphics device ownership and the lost/reset state machine.
//!
//! This module is responsible for:
//! - creating the wgpu adapter/device/queue and configuring the surface
//! - probing adapter capabilities before the device exists
//! - gating every frame on the device status query

mod backend;
mod caps;
mod error;
mod frame;
mod gpu;
mod lifecycle;
mod status;
pub(crate) mod surface;

pub use backend::{ClearValues, GraphicsBackend};
pub use caps::{AdapterProbe, PresentParams, PresentRequest, ShaderModel};
pub use error::{BufferError, DeviceError};
pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use lifecycle::{DeviceLifecycle, FrameGate};
pub use status::{DeviceState, DeviceStatus};
