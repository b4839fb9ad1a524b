use std::time::{Duration, Instant};

/// Quiet period after the last resize before the renderer is repopulated
pub const RESIZE_QUIET: Duration = Duration::from_millis(250);

/// Coalesces bursts of viewport resize events into a single resize that
/// fires once no new event has arrived for the quiet period.
#[derive(Debug, Clone)]
pub struct ResizeDebouncer {
    quiet: Duration,
    pending: Option<((u16, u16), Instant)>,
}

impl Default for ResizeDebouncer {
    fn default() -> Self {
        Self::new(RESIZE_QUIET)
    }
}

impl ResizeDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self { quiet, pending: None }
    }

    /// Record a resize; restarts the quiet timer
    pub fn signal(&mut self, size: (u16, u16), now: Instant) {
        self.pending = Some((size, now));
    }

    /// Latest size, once the quiet period has elapsed since the last signal
    pub fn poll(&mut self, now: Instant) -> Option<(u16, u16)> {
        match self.pending {
            Some((size, at)) if now.saturating_duration_since(at) >= self.quiet => {
                self.pending = None;
                Some(size)
            }
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_signal_fires_after_quiet_period() {
        let start = Instant::now();
        let mut debouncer = ResizeDebouncer::default();
        debouncer.signal((80, 24), start);

        assert_eq!(debouncer.poll(start + Duration::from_millis(100)), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(250)), Some((80, 24)));
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(start + Duration::from_millis(900)), None);
    }

    #[test]
    fn test_burst_coalesces_to_last_size() {
        let start = Instant::now();
        let mut debouncer = ResizeDebouncer::default();
        let mut fired = Vec::new();

        // Window drag: a new size every 50ms for a second
        for i in 0..20u16 {
            let now = start + Duration::from_millis(i as u64 * 50);
            debouncer.signal((100 + i, 40), now);
            if let Some(size) = debouncer.poll(now + Duration::from_millis(10)) {
                fired.push(size);
            }
        }
        assert!(fired.is_empty());

        let end = start + Duration::from_millis(19 * 50 + 250);
        assert_eq!(debouncer.poll(end), Some((119, 40)));
    }

    #[test]
    fn test_nothing_pending_polls_none() {
        let mut debouncer = ResizeDebouncer::new(Duration::from_millis(10));
        assert_eq!(debouncer.poll(Instant::now()), None);
    }
}
