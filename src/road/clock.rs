// --- Frame Clock ------------------------------------------------------------

/// FrameClock turns animation-frame timestamps into clamped elapsed times.
pub struct FrameClock {
    max_frame_ms: f64,
    last_ms: Option<f64>, // timestamp of the previous frame, None before the first
}

impl FrameClock {
    pub fn new(max_frame_ms: f64) -> Self {
        Self {
            max_frame_ms,
            last_ms: None,
        }
    }

    /// Elapsed ms since the previous call, clamped to `[0, max_frame_ms]`.
    /// The first call has nothing to measure against and returns 0.
    pub fn tick(&mut self, now_ms: f64) -> f64 {
        let dt = match self.last_ms {
            Some(last) => (now_ms - last).clamp(0.0, self.max_frame_ms),
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        dt
    }
}
