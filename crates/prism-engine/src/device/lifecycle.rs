use std::time::Duration;

use super::{DeviceState, DeviceStatus, GraphicsBackend};

/// Whether the current frame may run.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameGate {
    Proceed,
    /// Device not usable this tick; try again next frame.
    Skip,
    /// Device is gone for good.
    Halt,
}

/// Sole owner of the device state.
///
/// Each frame starts with [`begin_frame`](Self::begin_frame), which issues the
/// status query and applies the resulting transition. Recovery is retried every
/// frame without a cutoff until the device comes back or reports a fatal error.
pub struct DeviceLifecycle<B> {
    backend: B,
    state: DeviceState,
    lost_backoff: Duration,
}

impl<B: GraphicsBackend> DeviceLifecycle<B> {
    /// Starts in [`DeviceState::Operational`]; setup has already succeeded.
    pub fn new(backend: B, lost_backoff: Duration) -> Self {
        Self {
            backend,
            state: DeviceState::Operational,
            lost_backoff,
        }
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Queries the device and advances the state machine.
    pub fn begin_frame(&mut self) -> FrameGate {
        if self.state.is_terminal() {
            return FrameGate::Halt;
        }

        match self.backend.check_status() {
            DeviceStatus::Ok => match self.state {
                DeviceState::Operational => FrameGate::Proceed,
                DeviceState::Lost => {
                    self.transition(DeviceState::Operational);
                    FrameGate::Proceed
                }
                DeviceState::NeedsReset => {
                    self.try_reset();
                    FrameGate::Skip
                }
                DeviceState::Fatal => FrameGate::Halt,
            },
            DeviceStatus::Lost => {
                if self.state != DeviceState::Lost {
                    self.transition(DeviceState::Lost);
                    self.backend.on_device_lost();
                }
                // Bounded wait so a missing device does not spin the loop.
                if !self.lost_backoff.is_zero() {
                    std::thread::sleep(self.lost_backoff);
                }
                FrameGate::Skip
            }
            DeviceStatus::NotReset => {
                self.transition(DeviceState::NeedsReset);
                self.try_reset();
                FrameGate::Skip
            }
            DeviceStatus::DriverInternalError => {
                self.transition(DeviceState::Fatal);
                self.backend
                    .notify_fatal("the graphics driver reported an internal error");
                FrameGate::Halt
            }
        }
    }

    fn try_reset(&mut self) {
        match self.backend.on_device_available() {
            Ok(()) => self.transition(DeviceState::Operational),
            Err(e) => log::warn!("device reset failed, retrying next frame: {e}"),
        }
    }

    fn transition(&mut self, to: DeviceState) {
        let from = self.state;
        if from == to {
            return;
        }

        match to {
            DeviceState::Operational => log::info!("device {from} -> {to}"),
            DeviceState::Fatal => log::error!("device {from} -> {to}"),
            _ => log::warn!("device {from} -> {to}"),
        }

        self.state = to;
        self.backend.on_state_changed(from, to);
    }
}
