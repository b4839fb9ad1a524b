use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Number of recent frames the readout averages over
const WINDOW: usize = 120;

/// Rolling frame-timing readout shown in the metrics panel
#[derive(Debug, Clone, Default)]
pub struct FrameMetrics {
    frame_times: VecDeque<Duration>,
    work_times: VecDeque<Duration>,
    last_frame: Option<Instant>,
    total_frames: u64,
}

fn push_capped(queue: &mut VecDeque<Duration>, value: Duration) {
    if queue.len() == WINDOW {
        queue.pop_front();
    }
    queue.push_back(value);
}

fn average(queue: &VecDeque<Duration>) -> Option<Duration> {
    if queue.is_empty() {
        return None;
    }
    Some(queue.iter().sum::<Duration>() / queue.len() as u32)
}

impl FrameMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the start of a frame
    pub fn record_frame(&mut self, now: Instant) {
        if let Some(last) = self.last_frame {
            push_capped(&mut self.frame_times, now.saturating_duration_since(last));
        }
        self.last_frame = Some(now);
        self.total_frames += 1;
    }

    /// Record how long the simulation and painting took this frame
    pub fn record_work(&mut self, spent: Duration) {
        push_capped(&mut self.work_times, spent);
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn average_frame(&self) -> Option<Duration> {
        average(&self.frame_times)
    }

    pub fn worst_frame(&self) -> Option<Duration> {
        self.frame_times.iter().max().copied()
    }

    pub fn average_work(&self) -> Option<Duration> {
        average(&self.work_times)
    }

    /// Frames per second over the window
    pub fn fps(&self) -> Option<f64> {
        self.average_frame()
            .filter(|d| !d.is_zero())
            .map(|d| 1.0 / d.as_secs_f64())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Milliseconds with one decimal, or a dash when unknown
pub fn format_ms(duration: Option<Duration>) -> String {
    match duration {
        Some(d) => format!("{:.1}ms", d.as_secs_f64() * 1000.0),
        None => "-".to_string(),
    }
}
