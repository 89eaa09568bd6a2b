use std::fmt;

/// Per-frame answer of the device-status query.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DeviceStatus {
    Ok,
    /// Device unavailable; resources must not be touched this frame.
    Lost,
    /// Device is back and device-dependent resources can be rebuilt.
    NotReset,
    /// Unrecoverable driver failure.
    DriverInternalError,
}

/// Lifecycle state owned by [`DeviceLifecycle`](super::DeviceLifecycle).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DeviceState {
    Operational,
    Lost,
    NeedsReset,
    Fatal,
}

impl DeviceState {
    pub fn is_terminal(self) -> bool {
        self == DeviceState::Fatal
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceState::Operational => "operational",
            DeviceState::Lost => "lost",
            DeviceState::NeedsReset => "needs reset",
            DeviceState::Fatal => "fatal",
        })
    }
}
