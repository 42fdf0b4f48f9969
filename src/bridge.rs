//! Bridges declarative UI signals to the imperative audio backend
//!
//! The bridge owns the only path by which signal values reach the mixer and
//! transport. It subscribes one-way: UI writes signals, subscriptions apply
//! them to the engine synchronously within the same tick. The engine is
//! never mutated by any other component in response to UI state.

use crate::audio::engine::AudioEngine;
use crate::audio::registry::TrackId;
use crate::signal::{Signal, Subscription};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Quiet period after the last scrub input before the seek is applied
pub const SCRUB_SETTLE: Duration = Duration::from_millis(200);

/// Engine handle shared between the bridge (UI thread) and the output
/// stream (audio thread)
pub type SharedEngine = Arc<Mutex<AudioEngine>>;

/// Observable per-track state, created and disposed in lockstep with the
/// track itself. Independent of the registry's `Track` record: UI and
/// backend both react to these without polling.
pub struct TrackSignals {
    pub volume: Signal<u8>,
    pub muted: Signal<bool>,
    pub solo: Signal<bool>,
}

impl TrackSignals {
    /// Signals at track defaults: volume 100, unmuted, not soloed
    pub fn new() -> Self {
        Self {
            volume: Signal::new(100),
            muted: Signal::new(false),
            solo: Signal::new(false),
        }
    }
}

impl Default for TrackSignals {
    fn default() -> Self {
        Self::new()
    }
}

struct ScrubState {
    target: Option<f64>,
    last_input: Option<Instant>,
    /// Playback was paused for this scrub and must resume on settle
    resume: bool,
}

/// Keeps the reactive state model and the audio backend consistent.
///
/// One subscription watches the `is_playing` signal; per actual transition
/// it consumes the transport's pending seek exactly once and starts or
/// pauses playback. Per-track subscriptions forward volume/mute/solo
/// changes to the mixer until the track is detached.
pub struct ReactiveStateBridge {
    engine: SharedEngine,
    is_playing: Signal<bool>,
    _transport_sub: Subscription,
    track_subs: HashMap<TrackId, Vec<Subscription>>,
    scrub: ScrubState,
}

impl ReactiveStateBridge {
    /// Wire a bridge to an engine. The `is_playing` signal starts false.
    pub fn new(engine: SharedEngine) -> Self {
        let is_playing = Signal::new(false);

        let backend = Arc::clone(&engine);
        let transport_sub = is_playing.subscribe(move |playing: &bool| {
            if let Ok(mut eng) = backend.lock() {
                // Read-and-clear exactly once per transition; the seek was
                // queued before this flip by whoever initiated it
                let seek = eng.transport_mut().consume_pending_seek();
                if *playing {
                    eng.start_playback(seek);
                } else {
                    eng.pause_playback(seek);
                }
            }
        });

        Self {
            engine,
            is_playing,
            _transport_sub: transport_sub,
            track_subs: HashMap::new(),
            scrub: ScrubState {
                target: None,
                last_input: None,
                resume: false,
            },
        }
    }

    /// The playback signal the UI reads and writes
    pub fn is_playing(&self) -> &Signal<bool> {
        &self.is_playing
    }

    /// Current transport position, for per-frame cursor polling. Reading
    /// twice between clock updates returns the same value.
    pub fn transport_time(&self) -> f64 {
        self.engine
            .lock()
            .map(|e| e.transport().transport_time())
            .unwrap_or(0.0)
    }

    /// Attach a track's signal set: subsequent volume/mute/solo writes are
    /// applied to that track's mixer channel. Replaces any previous
    /// attachment for the id.
    pub fn attach_track(&mut self, id: TrackId, signals: &TrackSignals) {
        let volume_backend = Arc::clone(&self.engine);
        let mute_backend = Arc::clone(&self.engine);
        let solo_backend = Arc::clone(&self.engine);

        let subs = vec![
            signals.volume.subscribe(move |v: &u8| {
                if let Ok(mut eng) = volume_backend.lock() {
                    eng.mixer_mut().set_volume(id, *v);
                }
            }),
            signals.muted.subscribe(move |m: &bool| {
                if let Ok(mut eng) = mute_backend.lock() {
                    eng.mixer_mut().set_muted(id, *m);
                }
            }),
            signals.solo.subscribe(move |s: &bool| {
                if let Ok(mut eng) = solo_backend.lock() {
                    eng.mixer_mut().set_solo(id, *s);
                }
            }),
        ];

        self.track_subs.insert(id, subs);
    }

    /// Tear down a track's subscriptions. After this, mutating the track's
    /// signals no longer affects the channel.
    pub fn detach_track(&mut self, id: TrackId) {
        self.track_subs.remove(&id);
    }

    /// Tear down every track subscription (view unmount)
    pub fn detach_all_tracks(&mut self) {
        self.track_subs.clear();
    }

    /// Play/pause toggle from the UI. Reconciles any engine-initiated stop
    /// first, then runs the transport's transition logic (including
    /// replay-from-start at the end of the timeline) and syncs the signal
    /// so subscribers observe the flip and consume any queued seek.
    pub fn toggle_playback(&self) {
        // Without this, a toggle right after an end-of-timeline auto-stop
        // would write an unchanged `true` to the signal: the subscriber
        // never fires and the queued rewind seek survives to teleport a
        // later, unrelated pause
        self.reconcile_engine_stop();

        let playing = match self.engine.lock() {
            Ok(mut eng) => {
                eng.transport_mut().toggle_playback();
                eng.transport().is_playing()
            }
            Err(_) => return,
        };
        self.is_playing.set(playing);
    }

    /// Stop playback and rewind to the start
    pub fn stop_and_rewind(&self) {
        self.reconcile_engine_stop();
        if let Ok(mut eng) = self.engine.lock() {
            eng.transport_mut().stop_and_rewind();
        }
        // If this flips the signal, the transition consumes the queued
        // zero seek; if already paused the seek stays queued for the next
        // play transition, which then starts from zero as intended
        self.is_playing.set(false);
    }

    /// Scrub input (scroll/swipe) at wall-clock now
    pub fn scrub_to(&mut self, seconds: f64) {
        self.scrub_to_at(seconds, Instant::now());
    }

    /// Scrub input with an explicit timestamp.
    ///
    /// The first input while playing pauses immediately and records a
    /// resume obligation; the target time is only applied once input has
    /// settled (see `poll_at`). Scrubbing while paused records the target
    /// without any resume obligation.
    pub fn scrub_to_at(&mut self, seconds: f64, now: Instant) {
        if self.is_playing.get() && !self.scrub.resume {
            self.scrub.resume = true;
            self.is_playing.set(false);
        }
        self.scrub.target = Some(seconds.max(0.0));
        self.scrub.last_input = Some(now);
    }

    /// Per-frame update at wall-clock now
    pub fn poll(&mut self) {
        self.poll_at(Instant::now());
    }

    /// Per-frame update: settle scrubs past the quiet period and reconcile
    /// engine-initiated stops (end-of-timeline auto-stop) into the
    /// `is_playing` signal. Safe to call at any rate; skipped frames lose
    /// nothing.
    pub fn poll_at(&mut self, now: Instant) {
        self.settle_scrub(now);
        if self.scrub.target.is_none() {
            self.reconcile_engine_stop();
        }
    }

    /// Pull an engine-initiated stop (end-of-timeline auto-stop) into the
    /// `is_playing` signal. The resulting transition lets subscribers
    /// consume the queued rewind seek, so later transitions start from an
    /// empty slot.
    fn reconcile_engine_stop(&self) {
        if !self.is_playing.get() {
            return;
        }
        let engine_playing = self
            .engine
            .lock()
            .map(|e| e.transport().is_playing())
            .unwrap_or(false);
        if !engine_playing {
            self.is_playing.set(false);
        }
    }

    fn settle_scrub(&mut self, now: Instant) {
        let (Some(target), Some(last)) = (self.scrub.target, self.scrub.last_input) else {
            return;
        };
        if now.duration_since(last) < SCRUB_SETTLE {
            return;
        }

        self.scrub.target = None;
        self.scrub.last_input = None;
        let resume = std::mem::take(&mut self.scrub.resume);

        if resume {
            // Queue before the flip: the transport subscriber reacts
            // synchronously and expects the seek to be present already
            if let Ok(mut eng) = self.engine.lock() {
                eng.transport_mut().queue_seek(target);
            }
            log::debug!("scrub settled at {:.3}s, resuming playback", target);
            self.is_playing.set(true);
        } else {
            if let Ok(mut eng) = self.engine.lock() {
                eng.transport_mut().set_transport_time(target);
            }
            log::debug!("scrub settled at {:.3}s while paused", target);
        }
    }
}
