//! Playback clock: cursor advance, active-clip resolution and the frame
//! snapshot handed to render surfaces.
//!
//! The time math here is pure. Scheduling ticks in real time is the job of
//! the preview crate, which feeds measured wall-clock deltas into
//! [`advance`] through the store.

use crate::editing::VideoTrack;
use crate::types::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Timeline width of one second at zoom 1.0.
pub const PIXELS_PER_SECOND: f64 = 100.0;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClockState {
    #[default]
    Stopped,
    Playing,
}

/// Scalar playback state owned by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaybackState {
    pub cursor: TimeUs,
    /// Always `max(end)` over the video track; recomputed by the store.
    pub total_duration: TimeUs,
    pub zoom: f64,
    pub clock: ClockState,
    pub selected_clip_id: Option<Uuid>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            cursor: TimeUs::ZERO,
            total_duration: TimeUs::ZERO,
            zoom: 1.0,
            clock: ClockState::Stopped,
            selected_clip_id: None,
        }
    }
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        self.clock == ClockState::Playing
    }

    pub fn transport(&self) -> Transport {
        Transport {
            cursor: self.cursor,
            clock: self.clock,
        }
    }

    /// Horizontal timeline offset of `t` at the current zoom.
    pub fn time_to_px(&self, t: TimeUs) -> f64 {
        t.as_seconds() * PIXELS_PER_SECOND * self.zoom
    }

    pub fn px_to_time(&self, px: f64) -> TimeUs {
        TimeUs::from_seconds(px / (PIXELS_PER_SECOND * self.zoom)).max_zero()
    }
}

/// The part of the playback state the clock advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transport {
    pub cursor: TimeUs,
    pub clock: ClockState,
}

impl Transport {
    pub fn stopped_at_start() -> Self {
        Self {
            cursor: TimeUs::ZERO,
            clock: ClockState::Stopped,
        }
    }
}

/// The clip under the cursor and where inside its media the cursor falls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActiveClip {
    pub clip_id: Uuid,
    pub kind: ClipKind,
    pub media_ref: MediaRef,
    pub local_offset: TimeUs,
    pub overlay: Option<ClipOverlay>,
}

/// Resolve the clip containing `cursor` under the half-open rule.
pub fn resolve(track: &VideoTrack, cursor: TimeUs) -> Option<ActiveClip> {
    track.clip_at(cursor).map(|clip| ActiveClip {
        clip_id: clip.id,
        kind: clip.kind,
        media_ref: clip.media_ref.clone(),
        local_offset: cursor - clip.start,
        overlay: clip.overlay.clone(),
    })
}

/// Advance a playing transport by `dt` of wall-clock time.
///
/// Gaps between clips are skipped. Running past the last clip stops the clock
/// and rewinds to zero. A stopped transport is returned unchanged.
pub fn advance(transport: Transport, track: &VideoTrack, dt: TimeUs) -> Transport {
    if transport.clock == ClockState::Stopped {
        return transport;
    }

    let next = transport.cursor.saturating_add(dt.max_zero());
    if next > track.total_duration() {
        return Transport::stopped_at_start();
    }
    if track.clip_at(next).is_some() {
        return Transport {
            cursor: next,
            clock: ClockState::Playing,
        };
    }
    match track.next_clip_after(next) {
        Some(clip) => Transport {
            cursor: clip.start,
            clock: ClockState::Playing,
        },
        None => Transport::stopped_at_start(),
    }
}

/// An audio track sounding at the cursor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudibleTrack {
    pub track_id: Uuid,
    pub media_ref: MediaRef,
    pub local_offset: TimeUs,
    pub gain: f64,
}

/// Everything a render surface needs for one tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaybackFrame {
    pub cursor: TimeUs,
    pub is_playing: bool,
    /// `None` is a normal state: render a placeholder.
    pub active: Option<ActiveClip>,
    pub subtitles: Vec<Subtitle>,
    pub overlays: Vec<ImageOverlay>,
    pub audio: Vec<AudibleTrack>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(seconds: f64) -> TimeUs {
        TimeUs::from_seconds(seconds)
    }

    fn make_track(spans: &[(f64, f64)]) -> VideoTrack {
        let clips = spans
            .iter()
            .map(|&(a, b)| Clip {
                id: Uuid::new_v4(),
                kind: ClipKind::Video,
                media_ref: MediaRef::from("clip.mp4"),
                name: "clip".to_string(),
                start: s(a),
                end: s(b),
                overlay: None,
            })
            .collect();
        let mut track = VideoTrack::default();
        track.replace_all(clips).unwrap();
        track
    }

    fn playing_at(cursor: f64) -> Transport {
        Transport {
            cursor: s(cursor),
            clock: ClockState::Playing,
        }
    }

    #[test]
    fn boundary_resolves_to_second_clip() {
        let track = make_track(&[(0.0, 5.0), (5.0, 10.0)]);
        let active = resolve(&track, s(5.0)).unwrap();
        assert_eq!(active.clip_id, track.clips()[1].id);
        assert_eq!(active.local_offset, TimeUs::ZERO);
    }

    #[test]
    fn local_offset_is_relative_to_clip_start() {
        let track = make_track(&[(2.0, 6.0)]);
        assert_eq!(resolve(&track, s(3.5)).unwrap().local_offset, s(1.5));
        assert!(resolve(&track, s(1.0)).is_none());
    }

    #[test]
    fn advance_past_end_stops_and_rewinds() {
        let track = make_track(&[(0.0, 20.0)]);
        let next = advance(playing_at(19.9), &track, s(0.3));
        assert_eq!(next, Transport::stopped_at_start());
    }

    #[test]
    fn advance_reaching_exact_end_stops() {
        let track = make_track(&[(0.0, 2.0)]);
        let next = advance(playing_at(1.5), &track, s(0.5));
        assert_eq!(next, Transport::stopped_at_start());
    }

    #[test]
    fn advance_is_tick_rate_independent() {
        let track = make_track(&[(0.0, 10.0)]);
        let mut fine = playing_at(0.0);
        for _ in 0..10 {
            fine = advance(fine, &track, s(0.1));
        }
        let coarse = advance(playing_at(0.0), &track, s(1.0));
        assert_eq!(fine, coarse);
    }

    #[test]
    fn advance_skips_gaps() {
        let track = make_track(&[(0.0, 2.0), (5.0, 8.0)]);
        let next = advance(playing_at(1.9), &track, s(0.2));
        assert_eq!(next, playing_at(5.0));
    }

    #[test]
    fn huge_step_stops_and_rewinds() {
        let track = make_track(&[(0.0, 2.0)]);
        let next = advance(playing_at(1.0), &track, TimeUs(i64::MAX));
        assert_eq!(next, Transport::stopped_at_start());
    }

    #[test]
    fn stopped_transport_does_not_move() {
        let track = make_track(&[(0.0, 2.0)]);
        let stopped = Transport {
            cursor: s(1.0),
            clock: ClockState::Stopped,
        };
        assert_eq!(advance(stopped, &track, s(0.5)), stopped);
    }

    #[test]
    fn empty_track_stops_immediately() {
        let track = VideoTrack::default();
        assert_eq!(advance(playing_at(0.0), &track, TimeUs::ZERO), Transport::stopped_at_start());
    }

    #[test]
    fn pixel_mapping_follows_zoom() {
        let mut state = PlaybackState::default();
        assert_eq!(state.time_to_px(s(2.0)), 200.0);
        state.zoom = 2.0;
        assert_eq!(state.time_to_px(s(2.0)), 400.0);
        assert_eq!(state.px_to_time(400.0), s(2.0));
        assert_eq!(state.px_to_time(-50.0), TimeUs::ZERO);
    }
}
