//! Scripted [`GraphicsBackend`] for tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;

use crate::asset::MaterialImages;
use crate::batch::{Batch, PackedGeometry};
use crate::device::{
    BufferError, ClearValues, DeviceError, DeviceState, DeviceStatus, GraphicsBackend,
};
use crate::render::{
    FileWatch, FrameConstants, ShaderError, TechniqueDesc, WatchError, WatchHandle,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateStaticBuffers { vertices: usize, indices: usize },
    UploadMaterials(usize),
    CheckStatus,
    DeviceLost,
    DeviceAvailable,
    Fatal(String),
    StateChanged(DeviceState, DeviceState),
    Recompile,
    BeginScene,
    BindStaticBuffers,
    BeginPass { technique: usize, pass: usize },
    SetFrameConstants,
    BindMaterial(usize),
    Draw { index_offset: u32, primitive_count: u32 },
    EndPass,
    EndScene,
    Present,
}

/// Records every call and answers status queries from a script. Once the
/// script runs out every query reports [`DeviceStatus::Ok`].
pub struct FakeBackend {
    pub calls: Vec<Call>,
    pub script: VecDeque<DeviceStatus>,
    pub techniques: Vec<TechniqueDesc>,
    /// Techniques installed by the next successful recompile.
    pub recompiled: Vec<TechniqueDesc>,
    /// Number of upcoming resets that fail.
    pub fail_resets: u32,
    pub fail_buffers: bool,
    pub fail_recompile: bool,
}

impl Default for FakeBackend {
    fn default() -> Self {
        let single = vec![TechniqueDesc {
            name: "textured".into(),
            passes: 1,
        }];
        Self {
            calls: Vec::new(),
            script: VecDeque::new(),
            techniques: single.clone(),
            recompiled: single,
            fail_resets: 0,
            fail_buffers: false,
            fail_recompile: false,
        }
    }
}

impl FakeBackend {
    pub fn scripted(statuses: &[DeviceStatus]) -> Self {
        Self {
            script: statuses.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn transitions(&self) -> Vec<(DeviceState, DeviceState)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::StateChanged(from, to) => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    /// `(index_offset, primitive_count)` of every draw, in order.
    pub fn draws(&self) -> Vec<(u32, u32)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Draw {
                    index_offset,
                    primitive_count,
                } => Some((*index_offset, *primitive_count)),
                _ => None,
            })
            .collect()
    }
}

impl GraphicsBackend for FakeBackend {
    type StaticBuffers = ();

    fn create_static_buffers(&mut self, packed: &PackedGeometry) -> Result<(), BufferError> {
        self.calls.push(Call::CreateStaticBuffers {
            vertices: packed.vertices.len(),
            indices: packed.indices.len(),
        });
        if self.fail_buffers {
            return Err(BufferError::DeviceUnavailable);
        }
        Ok(())
    }

    fn upload_materials(&mut self, materials: &[MaterialImages]) -> Result<(), BufferError> {
        self.calls.push(Call::UploadMaterials(materials.len()));
        Ok(())
    }

    fn check_status(&mut self) -> DeviceStatus {
        self.calls.push(Call::CheckStatus);
        self.script.pop_front().unwrap_or(DeviceStatus::Ok)
    }

    fn on_device_lost(&mut self) {
        self.calls.push(Call::DeviceLost);
    }

    fn on_device_available(&mut self) -> Result<(), DeviceError> {
        self.calls.push(Call::DeviceAvailable);
        if self.fail_resets > 0 {
            self.fail_resets -= 1;
            return Err(DeviceError::SurfaceUnavailable {
                width: 0,
                height: 0,
            });
        }
        Ok(())
    }

    fn notify_fatal(&mut self, message: &str) {
        self.calls.push(Call::Fatal(message.to_string()));
    }

    fn on_state_changed(&mut self, from: DeviceState, to: DeviceState) {
        self.calls.push(Call::StateChanged(from, to));
    }

    fn techniques(&self) -> &[TechniqueDesc] {
        &self.techniques
    }

    fn recompile_shader(&mut self) -> Result<(), ShaderError> {
        self.calls.push(Call::Recompile);
        if self.fail_recompile {
            return Err(ShaderError::Parse("unexpected token".into()));
        }
        self.techniques = self.recompiled.clone();
        Ok(())
    }

    fn begin_scene(&mut self, _clear: &ClearValues) {
        self.calls.push(Call::BeginScene);
    }

    fn bind_static_buffers(&mut self, _buffers: &()) {
        self.calls.push(Call::BindStaticBuffers);
    }

    fn begin_pass(&mut self, technique: usize, pass: usize) {
        self.calls.push(Call::BeginPass { technique, pass });
    }

    fn set_frame_constants(&mut self, _constants: &FrameConstants) {
        self.calls.push(Call::SetFrameConstants);
    }

    fn bind_material(&mut self, material_index: usize) {
        self.calls.push(Call::BindMaterial(material_index));
    }

    fn draw_indexed(&mut self, batch: &Batch) {
        self.calls.push(Call::Draw {
            index_offset: batch.index_offset,
            primitive_count: batch.primitive_count,
        });
    }

    fn end_pass(&mut self) {
        self.calls.push(Call::EndPass);
    }

    fn end_scene(&mut self) {
        self.calls.push(Call::EndScene);
    }

    fn present(&mut self) {
        self.calls.push(Call::Present);
    }
}

/// [`FileWatch`] whose change flags are flipped by hand through a shared handle.
#[derive(Default)]
pub struct ManualWatch {
    pub flags: Rc<RefCell<Vec<bool>>>,
}

impl FileWatch for ManualWatch {
    fn watch(&mut self, _path: &Path) -> Result<WatchHandle, WatchError> {
        let mut flags = self.flags.borrow_mut();
        flags.push(false);
        Ok(WatchHandle(flags.len() - 1))
    }

    fn changed(&mut self, handle: WatchHandle) -> bool {
        std::mem::take(&mut self.flags.borrow_mut()[handle.0])
    }
}
