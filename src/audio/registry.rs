//! Track identity, decoded data ownership, colors, and ordering

use crate::audio::buffer::AudioBuffer;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Opaque track identifier. Assigned monotonically and never reused within
/// a session, so a stale id can never alias a newer track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Display color assigned to a track, consumed by waveform/spectrogram
/// renderers (the engine never draws pixels itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Fixed palette cycled through in creation order
pub const TRACK_PALETTE: [TrackColor; 8] = [
    TrackColor { r: 0xe6, g: 0x19, b: 0x4b },
    TrackColor { r: 0x3c, g: 0xb4, b: 0x4b },
    TrackColor { r: 0xff, g: 0xe1, b: 0x19 },
    TrackColor { r: 0x43, g: 0x63, b: 0xd8 },
    TrackColor { r: 0xf5, g: 0x82, b: 0x31 },
    TrackColor { r: 0x91, g: 0x1e, b: 0xb4 },
    TrackColor { r: 0x46, g: 0xf0, b: 0xf0 },
    TrackColor { r: 0xf0, g: 0x32, b: 0xe6 },
];

/// Canonical per-track record owned by the registry.
///
/// The playback channel is a parallel structure in `ChannelMixer`, keyed by
/// the same id; it is not embedded here.
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub buffer: Arc<AudioBuffer>,
    pub color: TrackColor,
}

/// Owns all track records and their ordering on the timeline.
pub struct TrackRegistry {
    tracks: HashMap<TrackId, Track>,
    order: Vec<TrackId>,
    next_id: u64,
    created_count: usize,
}

impl TrackRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            tracks: HashMap::new(),
            order: Vec::new(),
            next_id: 0,
            created_count: 0,
        }
    }

    /// Register a decoded buffer as a new track.
    ///
    /// Assigns the next id and the next palette color (cycling in creation
    /// order, independent of removals) and appends the track at the end of
    /// the ordering.
    pub fn add_track(&mut self, name: impl Into<String>, buffer: Arc<AudioBuffer>) -> TrackId {
        let id = TrackId(self.next_id);
        self.next_id += 1;

        let color = TRACK_PALETTE[self.created_count % TRACK_PALETTE.len()];
        self.created_count += 1;

        self.tracks.insert(
            id,
            Track {
                id,
                name: name.into(),
                buffer,
                color,
            },
        );
        self.order.push(id);
        id
    }

    /// Shared handle to a track's decoded audio, `None` for unknown ids.
    /// Rendering consumers clone the `Arc` instead of re-decoding.
    pub fn buffer(&self, id: TrackId) -> Option<Arc<AudioBuffer>> {
        self.tracks.get(&id).map(|t| Arc::clone(&t.buffer))
    }

    /// Track record lookup, `None` for unknown ids
    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    /// Display color, `None` for unknown ids
    pub fn color(&self, id: TrackId) -> Option<TrackColor> {
        self.tracks.get(&id).map(|t| t.color)
    }

    /// Ordinal position on the timeline (dense 0..N-1), `None` if unknown
    pub fn position(&self, id: TrackId) -> Option<usize> {
        self.order.iter().position(|&t| t == id)
    }

    /// Track ids in timeline order
    pub fn ordered_ids(&self) -> &[TrackId] {
        &self.order
    }

    /// Remove a track. Remaining ordinals stay dense because positions are
    /// derived from the ordering vector. No-op returning `None` if unknown.
    pub fn remove_track(&mut self, id: TrackId) -> Option<Track> {
        let track = self.tracks.remove(&id)?;
        self.order.retain(|&t| t != id);
        Some(track)
    }

    /// Move the track at position `from` to position `to`, preserving the
    /// relative order of all other tracks. Out-of-range positions are a
    /// no-op.
    pub fn reorder(&mut self, from: usize, to: usize) {
        if from >= self.order.len() || to >= self.order.len() {
            return;
        }
        let id = self.order.remove(from);
        self.order.insert(to, id);
    }

    /// Max duration over all tracks, 0.0 when empty
    pub fn total_duration(&self) -> f64 {
        self.tracks
            .values()
            .map(|t| t.buffer.duration_seconds())
            .fold(0.0, f64::max)
    }

    /// Number of live tracks
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// True when no tracks exist
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl Default for TrackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(seconds: f64) -> Arc<AudioBuffer> {
        let rate = 100;
        let frames = (seconds * rate as f64) as usize;
        Arc::new(AudioBuffer::new(vec![0.0; frames], 1, rate))
    }

    #[test]
    fn colors_cycle_in_creation_order() {
        let mut reg = TrackRegistry::new();
        let ids: Vec<TrackId> = (0..10).map(|_| reg.add_track("t", buf(1.0))).collect();
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(reg.color(*id), Some(TRACK_PALETTE[i % TRACK_PALETTE.len()]));
        }
    }

    #[test]
    fn ids_are_never_reused() {
        let mut reg = TrackRegistry::new();
        let a = reg.add_track("a", buf(1.0));
        reg.remove_track(a);
        let b = reg.add_track("b", buf(1.0));
        assert_ne!(a, b);
    }

    #[test]
    fn reorder_is_dense_and_preserves_multiset() {
        let mut reg = TrackRegistry::new();
        let a = reg.add_track("a", buf(1.0));
        let b = reg.add_track("b", buf(1.0));
        let c = reg.add_track("c", buf(1.0));
        reg.reorder(0, 2);
        assert_eq!(reg.ordered_ids(), &[b, c, a]);
        assert_eq!(reg.position(b), Some(0));
        assert_eq!(reg.position(c), Some(1));
        assert_eq!(reg.position(a), Some(2));
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn removal_renumbers_densely() {
        let mut reg = TrackRegistry::new();
        let a = reg.add_track("a", buf(1.0));
        let b = reg.add_track("b", buf(1.0));
        let c = reg.add_track("c", buf(1.0));
        reg.remove_track(b);
        assert_eq!(reg.position(a), Some(0));
        assert_eq!(reg.position(c), Some(1));
    }

    #[test]
    fn unknown_id_lookups_are_none() {
        let mut reg = TrackRegistry::new();
        let id = reg.add_track("a", buf(1.0));
        reg.remove_track(id);
        assert!(reg.buffer(id).is_none());
        assert!(reg.color(id).is_none());
        assert!(reg.position(id).is_none());
        assert!(reg.remove_track(id).is_none());
    }

    #[test]
    fn total_duration_is_max() {
        let mut reg = TrackRegistry::new();
        assert_eq!(reg.total_duration(), 0.0);
        reg.add_track("a", buf(1.0));
        reg.add_track("b", buf(2.5));
        assert!((reg.total_duration() - 2.5).abs() < 1e-9);
    }
}
