use std::time::{Duration, Instant};

/// Timing for one rendered frame.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,
    pub frame_index: u64,
}

/// Per-loop frame timer.
///
/// Delta time is clamped so a stall (debugger pause, a long device-lost wait)
/// does not turn into a huge camera jump on the next frame. The clock also
/// keeps a rolling frame rate over [`FrameClock::REPORT_INTERVAL`].
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_max: Duration,
    window_start: Instant,
    window_frames: u32,
    fps: Option<f32>,
}

impl FrameClock {
    pub const REPORT_INTERVAL: Duration = Duration::from_secs(2);

    pub fn new() -> Self {
        Self::with_max_dt(Duration::from_millis(100))
    }

    pub fn with_max_dt(dt_max: Duration) -> Self {
        let now = Instant::now();
        Self {
            last: now,
            frame_index: 0,
            dt_max,
            window_start: now,
            window_frames: 0,
            fps: None,
        }
    }

    /// Restarts timing without counting the gap, e.g. after frames were
    /// skipped.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.last = now;
        self.window_start = now;
        self.window_frames = 0;
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Frames per second over the last completed interval.
    pub fn fps(&self) -> Option<f32> {
        self.fps
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now.saturating_duration_since(self.last).min(self.dt_max);
        self.last = now;

        self.window_frames += 1;
        let window = now.saturating_duration_since(self.window_start);
        if window >= Self::REPORT_INTERVAL {
            let fps = self.window_frames as f32 / window.as_secs_f32();
            log::debug!("{fps:.1} fps");
            self.fps = Some(fps);
            self.window_start = now;
            self.window_frames = 0;
        }

        let time = FrameTime {
            dt: dt.as_secs_f32(),
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        time
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
