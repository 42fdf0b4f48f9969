//! Global playback clock: play/pause/seek/rewind and pending-seek state

/// Tolerance when comparing the clock against the end of the timeline, so
/// float drift never blocks the replay-from-start path
pub const END_TOLERANCE_SECONDS: f64 = 0.1;

/// The transport owns the single global playback position shared by all
/// tracks. Time is frozen while paused and advances in real time while
/// playing (driven by `advance` from the render loop).
///
/// The pending seek is a one-shot slot: it is queued before a play/pause
/// transition and consumed exactly once by whoever performs the transition.
pub struct TransportController {
    position: f64,
    playing: bool,
    pending_seek: Option<f64>,
    total_duration: f64,
}

impl TransportController {
    /// Create a stopped transport at position zero
    pub fn new() -> Self {
        Self {
            position: 0.0,
            playing: false,
            pending_seek: None,
            total_duration: 0.0,
        }
    }

    /// Current position in seconds
    pub fn transport_time(&self) -> f64 {
        self.position
    }

    /// Directly move the clock (scrubbing). Does not touch the pending
    /// seek or the play state.
    pub fn set_transport_time(&mut self, seconds: f64) {
        self.position = seconds.max(0.0);
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// End of the shared timeline: max track duration, kept up to date by
    /// the engine whenever the track set changes
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn set_total_duration(&mut self, seconds: f64) {
        self.total_duration = seconds.max(0.0);
    }

    /// Queue a one-shot seek to be applied on the next play/pause
    /// transition. Must be set before any observable state flip so that
    /// synchronous subscribers find it already present.
    pub fn queue_seek(&mut self, seconds: f64) {
        self.pending_seek = Some(seconds);
    }

    /// Take the queued seek, leaving the slot empty. A second call after a
    /// single transition returns `None`.
    pub fn consume_pending_seek(&mut self) -> Option<f64> {
        self.pending_seek.take()
    }

    /// Flip between playing and paused. Toggling at the end of the
    /// timeline while paused is treated as replay-from-start: a seek to 0
    /// is queued, the clock resets, and playback starts.
    pub fn toggle_playback(&mut self) {
        let at_end = self.total_duration > 0.0
            && (self.position - self.total_duration).abs() <= END_TOLERANCE_SECONDS;
        if !self.playing && at_end {
            self.queue_seek(0.0);
            self.position = 0.0;
            self.playing = true;
        } else {
            self.playing = !self.playing;
        }
    }

    /// Stop (if playing) and rewind to the start, queueing a seek to 0 for
    /// the backend transition
    pub fn stop_and_rewind(&mut self) {
        self.queue_seek(0.0);
        self.playing = false;
        self.position = 0.0;
    }

    /// Start playing, optionally from a seek position
    pub fn start(&mut self, seek: Option<f64>) {
        if let Some(t) = seek {
            self.set_transport_time(t);
        }
        self.playing = true;
    }

    /// Pause, optionally at a seek position
    pub fn pause(&mut self, seek: Option<f64>) {
        if let Some(t) = seek {
            self.set_transport_time(t);
        }
        self.playing = false;
    }

    /// Advance the clock by `dt` seconds of rendered audio. When the clock
    /// reaches the end of the timeline this performs the equivalent of
    /// `stop_and_rewind` and returns true.
    pub fn advance(&mut self, dt: f64) -> bool {
        if !self.playing {
            return false;
        }
        self.position += dt;
        if self.total_duration > 0.0 && self.position >= self.total_duration {
            log::debug!("transport reached end of timeline, rewinding");
            self.stop_and_rewind();
            return true;
        }
        false
    }
}

impl Default for TransportController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_without_seek_mid_timeline() {
        let mut t = TransportController::new();
        t.set_total_duration(10.0);
        t.set_transport_time(4.0);
        t.toggle_playback();
        assert!(t.is_playing());
        assert_eq!(t.consume_pending_seek(), None);
        t.toggle_playback();
        assert!(!t.is_playing());
        assert_eq!(t.transport_time(), 4.0);
    }

    #[test]
    fn toggle_at_end_replays_from_start() {
        let mut t = TransportController::new();
        t.set_total_duration(2.0);
        // Within the float tolerance of the end
        t.set_transport_time(1.95);
        t.toggle_playback();
        assert!(t.is_playing());
        assert_eq!(t.transport_time(), 0.0);
        assert_eq!(t.consume_pending_seek(), Some(0.0));
        // Consume-once: the slot is empty afterwards
        assert_eq!(t.consume_pending_seek(), None);
    }

    #[test]
    fn toggle_at_end_while_playing_just_pauses() {
        let mut t = TransportController::new();
        t.set_total_duration(2.0);
        t.start(None);
        t.set_transport_time(2.0);
        t.toggle_playback();
        assert!(!t.is_playing());
        assert_eq!(t.consume_pending_seek(), None);
    }

    #[test]
    fn stop_and_rewind_queues_zero_seek() {
        let mut t = TransportController::new();
        t.set_total_duration(5.0);
        t.start(Some(3.0));
        t.stop_and_rewind();
        assert!(!t.is_playing());
        assert_eq!(t.transport_time(), 0.0);
        assert_eq!(t.consume_pending_seek(), Some(0.0));
    }

    #[test]
    fn advance_auto_stops_at_end() {
        let mut t = TransportController::new();
        t.set_total_duration(2.0);
        t.start(None);
        assert!(!t.advance(1.0));
        assert!(t.is_playing());
        assert!(t.advance(1.5));
        assert!(!t.is_playing());
        assert_eq!(t.transport_time(), 0.0);
        assert_eq!(t.consume_pending_seek(), Some(0.0));
    }

    #[test]
    fn advance_is_inert_while_paused() {
        let mut t = TransportController::new();
        t.set_total_duration(2.0);
        t.set_transport_time(1.0);
        assert!(!t.advance(5.0));
        assert_eq!(t.transport_time(), 1.0);
    }

    #[test]
    fn negative_time_is_clamped() {
        let mut t = TransportController::new();
        t.set_transport_time(-3.0);
        assert_eq!(t.transport_time(), 0.0);
    }
}
