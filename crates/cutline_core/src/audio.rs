use crate::error::{CoreError, Result};
use crate::interval::Timed;
use crate::lane::Lane;
use crate::types::*;
use uuid::Uuid;

/// Partial update for an audio track. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioUpdate {
    pub volume: Option<u8>,
    pub muted: Option<bool>,
    pub fade_in: Option<TimeUs>,
    pub fade_out: Option<TimeUs>,
}

/// Audio tracks, independent of the video track. Tracks may overlap and are
/// never reflowed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioTracks {
    lane: Lane<AudioTrack>,
    active: Option<Uuid>,
}

impl AudioTracks {
    pub fn new(min_len: TimeUs) -> Self {
        Self {
            lane: Lane::new(min_len),
            active: None,
        }
    }

    pub fn tracks(&self) -> &[AudioTrack] {
        self.lane.items()
    }

    pub fn get(&self, id: Uuid) -> Option<&AudioTrack> {
        self.lane.get(id)
    }

    /// The track currently focused in the editor.
    pub fn active_track_id(&self) -> Option<Uuid> {
        self.active
    }

    /// Add a track; it becomes the active track.
    pub fn add(&mut self, mut track: AudioTrack) -> Result<Uuid> {
        track.volume = track.volume.min(100);
        clamp_fades(&mut track);
        let id = self.lane.add(track)?;
        self.active = Some(id);
        tracing::debug!(%id, "audio track added");
        Ok(id)
    }

    pub fn remove(&mut self, id: Uuid) -> Result<AudioTrack> {
        let removed = self.lane.remove(id)?;
        if self.active == Some(id) {
            self.active = None;
        }
        tracing::debug!(%id, "audio track removed");
        Ok(removed)
    }

    /// Split a track; each half keeps the fades, cut down to its own length.
    pub fn split(&mut self, id: Uuid, at: TimeUs) -> Result<Uuid> {
        let right = self.lane.split(id, at)?;
        clamp_fades(self.lane.get_mut(id)?);
        clamp_fades(self.lane.get_mut(right)?);
        Ok(right)
    }

    pub fn trim(&mut self, id: Uuid, edge: TrimEdge, new_time: TimeUs) -> Result<()> {
        self.lane.trim(id, edge, new_time)?;
        clamp_fades(self.lane.get_mut(id)?);
        Ok(())
    }

    pub fn update(&mut self, id: Uuid, update: &AudioUpdate) -> Result<()> {
        let track = self.lane.get_mut(id)?;
        apply_update(track, update);
        Ok(())
    }

    /// Apply volume and mute to every track. Fades are per-track only.
    pub fn update_all(&mut self, update: &AudioUpdate) {
        let shared = AudioUpdate {
            volume: update.volume,
            muted: update.muted,
            fade_in: None,
            fade_out: None,
        };
        for track in self.lane.iter_mut() {
            apply_update(track, &shared);
        }
    }

    /// Volume slider semantics: zero also mutes, anything else unmutes.
    pub fn set_volume(&mut self, id: Uuid, volume: u8) -> Result<()> {
        self.update(
            id,
            &AudioUpdate {
                volume: Some(volume),
                muted: Some(volume == 0),
                ..AudioUpdate::default()
            },
        )
    }

    pub fn set_active(&mut self, id: Option<Uuid>) -> Result<()> {
        if let Some(id) = id {
            if self.lane.get(id).is_none() {
                return Err(CoreError::NotFound(id));
            }
        }
        self.active = id;
        Ok(())
    }

    /// Tracks producing sound at `t`, with their current gain.
    pub fn audible_at(&self, t: TimeUs) -> Vec<(&AudioTrack, f64)> {
        self.lane
            .active_at(t)
            .into_iter()
            .map(|track| (track, track.gain_at(t)))
            .filter(|(_, gain)| *gain > 0.0)
            .collect()
    }
}

fn apply_update(track: &mut AudioTrack, update: &AudioUpdate) {
    if let Some(volume) = update.volume {
        track.volume = volume.min(100);
    }
    if let Some(muted) = update.muted {
        track.muted = muted;
    }
    if let Some(fade_in) = update.fade_in {
        track.fade_in = fade_in;
    }
    if let Some(fade_out) = update.fade_out {
        track.fade_out = fade_out;
    }
    clamp_fades(track);
}

/// Fades stay within `[0, length]`.
fn clamp_fades(track: &mut AudioTrack) {
    let length = track.duration();
    track.fade_in = track.fade_in.max_zero().min(length);
    track.fade_out = track.fade_out.max_zero().min(length);
}
