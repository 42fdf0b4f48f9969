//! Channel ownership and mute-by-solo resolution

use crate::audio::buffer::AudioBuffer;
use crate::audio::channel::Channel;
use crate::audio::registry::TrackId;
use crate::error::EngineError;
use std::collections::HashMap;
use std::sync::Arc;

/// Owns one playback channel per live track, keyed by the same ids the
/// registry uses. Creation and disposal happen in lockstep with track
/// lifecycle; the mixer never learns about the UI layer.
pub struct ChannelMixer {
    channels: HashMap<TrackId, Channel>,
    /// Registration order, used for mixing and for `muted_track_ids`
    order: Vec<TrackId>,
}

impl ChannelMixer {
    /// Create an empty mixer
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Create the channel for a track. Creating twice for the same id is a
    /// programmer error and fails with `DuplicateChannel`, leaving the
    /// existing channel untouched.
    pub fn create_channel(
        &mut self,
        id: TrackId,
        buffer: Arc<AudioBuffer>,
    ) -> Result<(), EngineError> {
        if self.channels.contains_key(&id) {
            log::warn!("channel already exists for track {}", id);
            return Err(EngineError::DuplicateChannel(id));
        }
        self.channels.insert(id, Channel::new(buffer));
        self.order.push(id);
        Ok(())
    }

    /// Channel lookup, `None` for unknown ids
    pub fn channel(&self, id: TrackId) -> Option<&Channel> {
        self.channels.get(&id)
    }

    /// Mutable channel lookup, `None` for unknown ids
    pub fn channel_mut(&mut self, id: TrackId) -> Option<&mut Channel> {
        self.channels.get_mut(&id)
    }

    /// Dispose a track's channel and its buffer reference. Safe no-op for
    /// unknown ids.
    pub fn remove_channel(&mut self, id: TrackId) {
        if self.channels.remove(&id).is_some() {
            self.order.retain(|&t| t != id);
        }
    }

    /// Whether any channel is currently soloed. Computed fresh on each
    /// call; nothing caches this.
    pub fn any_solo(&self) -> bool {
        self.channels.values().any(|c| c.is_solo())
    }

    /// Ids of all effectively muted channels, in registration order: a
    /// channel is excluded from the mix when it is explicitly muted or when
    /// some other channel is soloed and this one is not.
    pub fn muted_track_ids(&self) -> Vec<TrackId> {
        let any_solo = self.any_solo();
        self.order
            .iter()
            .copied()
            .filter(|id| {
                self.channels
                    .get(id)
                    .map(|c| !c.is_active(any_solo))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Set a channel's volume step; no-op for unknown ids
    pub fn set_volume(&mut self, id: TrackId, volume: u8) {
        if let Some(ch) = self.channels.get_mut(&id) {
            ch.set_volume(volume);
        }
    }

    /// Set a channel's mute flag; no-op for unknown ids
    pub fn set_muted(&mut self, id: TrackId, muted: bool) {
        if let Some(ch) = self.channels.get_mut(&id) {
            ch.set_muted(muted);
        }
    }

    /// Set a channel's solo flag; no-op for unknown ids
    pub fn set_solo(&mut self, id: TrackId, solo: bool) {
        if let Some(ch) = self.channels.get_mut(&id) {
            ch.set_solo(solo);
        }
    }

    /// Number of live channels
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// True when no channels exist
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Mix every audible channel into `output` at a timeline position.
    /// The buffer is zeroed first; channels accumulate on top.
    pub fn mix(
        &mut self,
        output: &mut [f32],
        playhead_seconds: f64,
        sample_rate: u32,
        channels: u32,
    ) {
        output.fill(0.0);

        let any_solo = self.any_solo();
        for id in &self.order {
            if let Some(ch) = self.channels.get_mut(id) {
                if ch.is_active(any_solo) {
                    ch.render(output, playhead_seconds, sample_rate, channels);
                }
            }
        }
    }
}

impl Default for ChannelMixer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::registry::TrackRegistry;

    fn buf(value: f32, frames: usize) -> Arc<AudioBuffer> {
        Arc::new(AudioBuffer::new(vec![value; frames], 1, 8))
    }

    fn mixer_with(n: usize) -> (ChannelMixer, Vec<TrackId>) {
        let mut reg = TrackRegistry::new();
        let mut mixer = ChannelMixer::new();
        let ids: Vec<TrackId> = (0..n)
            .map(|i| {
                let id = reg.add_track(format!("t{}", i), buf(0.25, 16));
                mixer.create_channel(id, reg.buffer(id).unwrap()).unwrap();
                id
            })
            .collect();
        (mixer, ids)
    }

    #[test]
    fn duplicate_channel_is_rejected() {
        let (mut mixer, ids) = mixer_with(1);
        let result = mixer.create_channel(ids[0], buf(0.0, 4));
        assert!(matches!(result, Err(EngineError::DuplicateChannel(_))));
        assert_eq!(mixer.len(), 1);
    }

    #[test]
    fn remove_unknown_channel_is_noop() {
        let (mut mixer, ids) = mixer_with(1);
        mixer.remove_channel(ids[0]);
        mixer.remove_channel(ids[0]);
        assert!(mixer.is_empty());
    }

    #[test]
    fn muted_set_matches_invariant_after_toggle_sequences() {
        let (mut mixer, ids) = mixer_with(4);
        // Exhaustive over the per-channel {mute, solo} combinations
        for mask in 0u32..256 {
            for (i, id) in ids.iter().enumerate() {
                mixer.set_muted(*id, mask & (1 << i) != 0);
                mixer.set_solo(*id, mask & (1 << (i + 4)) != 0);
            }
            let any_solo = ids.iter().any(|id| mixer.channel(*id).unwrap().is_solo());
            let expected: Vec<TrackId> = ids
                .iter()
                .copied()
                .filter(|id| {
                    let ch = mixer.channel(*id).unwrap();
                    ch.is_muted() || (any_solo && !ch.is_solo())
                })
                .collect();
            assert_eq!(mixer.muted_track_ids(), expected, "mask {:#x}", mask);
        }
    }

    #[test]
    fn muted_ids_are_in_registration_order() {
        let (mut mixer, ids) = mixer_with(3);
        mixer.set_muted(ids[2], true);
        mixer.set_muted(ids[0], true);
        assert_eq!(mixer.muted_track_ids(), vec![ids[0], ids[2]]);
    }

    #[test]
    fn solo_excludes_other_channels_from_mix() {
        let (mut mixer, ids) = mixer_with(2);
        mixer.set_solo(ids[0], true);
        let mut out = vec![0.0f32; 8];
        mixer.mix(&mut out, 0.0, 8, 1);
        // Only one channel of 0.25 contributes
        for s in &out {
            assert!((s - 0.25).abs() < 1e-4, "sample {}", s);
        }
    }

    #[test]
    fn muted_soloed_channel_stays_silent() {
        let (mut mixer, ids) = mixer_with(2);
        mixer.set_solo(ids[0], true);
        mixer.set_muted(ids[0], true);
        let mut out = vec![0.5f32; 8];
        mixer.mix(&mut out, 0.0, 8, 1);
        // Mix zeroes the buffer and nothing is audible
        for s in &out {
            assert_eq!(*s, 0.0);
        }
    }
}
