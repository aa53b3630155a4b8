//! The timeline store: single owner of every collection and of the playback
//! state. All mutation goes through the named operations below; each one
//! either applies completely or returns an error with nothing changed.
//!
//! Cursor policy for edits under the cursor:
//! - removing the clip that contains the cursor pauses playback and parks the
//!   cursor where the removed clip started (after reflow that is the start of
//!   whatever slid into its place);
//! - trimming a clip so that it no longer contains the cursor pauses playback
//!   and moves the cursor to the clip's new start;
//! - after any change to the clip set the cursor is clamped to the new total
//!   duration.

use crate::audio::AudioTracks;
use crate::editing::VideoTrack;
use crate::error::{CoreError, Result};
use crate::history::*;
use crate::interval::Timed;
use crate::library::Library;
use crate::overlays::ImageOverlays;
use crate::playback::{self, ActiveClip, AudibleTrack, ClockState, PlaybackFrame, PlaybackState};
use crate::settings::EditorSettings;
use crate::snapping;
use crate::subtitles::Subtitles;
use crate::types::*;
use uuid::Uuid;

#[derive(Debug)]
pub struct TimelineStore {
    settings: EditorSettings,
    track: VideoTrack,
    audio: AudioTracks,
    subtitles: Subtitles,
    overlays: ImageOverlays,
    library: Library,
    playback: PlaybackState,
    history: History,
}

impl Default for TimelineStore {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}

impl TimelineStore {
    pub fn new(settings: EditorSettings) -> Self {
        let min_len = settings.min_clip_len;
        Self {
            track: VideoTrack::new(min_len),
            audio: AudioTracks::new(min_len),
            subtitles: Subtitles::new(min_len),
            overlays: ImageOverlays::new(min_len),
            library: Library::default(),
            playback: PlaybackState::default(),
            history: History::new(settings.history_depth),
            settings,
        }
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn track(&self) -> &VideoTrack {
        &self.track
    }

    pub fn clips(&self) -> &[Clip] {
        self.track.clips()
    }

    pub fn audio(&self) -> &AudioTracks {
        &self.audio
    }

    pub fn subtitles(&self) -> &Subtitles {
        &self.subtitles
    }

    pub fn overlays(&self) -> &ImageOverlays {
        &self.overlays
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    pub fn cursor(&self) -> TimeUs {
        self.playback.cursor
    }

    pub fn total_duration(&self) -> TimeUs {
        self.playback.total_duration
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.history.undo_description()
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.history.redo_description()
    }

    // -----------------------------------------------------------------------
    // Managers without reflow. They never touch the video track, so the
    // derived playback state cannot go stale through them.
    // -----------------------------------------------------------------------

    pub fn audio_mut(&mut self) -> &mut AudioTracks {
        &mut self.audio
    }

    pub fn subtitles_mut(&mut self) -> &mut Subtitles {
        &mut self.subtitles
    }

    pub fn overlays_mut(&mut self) -> &mut ImageOverlays {
        &mut self.overlays
    }

    pub fn library_mut(&mut self) -> &mut Library {
        &mut self.library
    }

    // -----------------------------------------------------------------------
    // Clip operations
    // -----------------------------------------------------------------------

    /// Place a library item on the video track. Appends when `insert_at` is
    /// `None`.
    pub fn add_clip(&mut self, item: &LibraryItem, insert_at: Option<TimeUs>) -> Result<Uuid> {
        let duration = item.duration().inspect_err(|e| {
            tracing::warn!(item = %item.id, error = %e, "add_clip rejected");
        })?;
        let clip = Clip {
            id: Uuid::new_v4(),
            kind: ClipKind::Video,
            media_ref: item.media_ref.clone(),
            name: item.name.clone(),
            start: TimeUs::ZERO,
            end: duration,
            overlay: None,
        };
        let id = clip.id;
        self.apply(Box::new(AddClipCommand::new(clip, insert_at)))?;
        Ok(id)
    }

    /// Place an item already in the library.
    pub fn add_from_library(&mut self, item_id: Uuid, insert_at: Option<TimeUs>) -> Result<Uuid> {
        let item = self
            .library
            .get(item_id)
            .cloned()
            .ok_or(CoreError::NotFound(item_id))?;
        self.add_clip(&item, insert_at)
    }

    /// Turn an overlay draft into an image clip on the video track, keeping
    /// its placement as clip overlay metadata.
    pub fn add_overlay_to_timeline(
        &mut self,
        overlay: &ImageOverlay,
        insert_at: Option<TimeUs>,
    ) -> Result<Uuid> {
        let duration = overlay.end.saturating_sub(overlay.start);
        let duration = if duration > TimeUs::ZERO {
            duration
        } else {
            ImageOverlay::DEFAULT_DURATION
        };
        let name = overlay
            .media_ref
            .as_str()
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        let clip = Clip {
            id: Uuid::new_v4(),
            kind: ClipKind::Image,
            media_ref: overlay.media_ref.clone(),
            name,
            start: TimeUs::ZERO,
            end: duration,
            overlay: Some(overlay.placement()),
        };
        let id = clip.id;
        self.apply(Box::new(AddClipCommand::new(clip, insert_at)))?;
        Ok(id)
    }

    /// Delete a clip and reflow the clips after it.
    pub fn remove_clip(&mut self, clip_id: Uuid) -> Result<Clip> {
        let removed = self
            .track
            .get(clip_id)
            .cloned()
            .ok_or(CoreError::NotFound(clip_id))?;
        let had_cursor = removed.contains(self.playback.cursor);

        self.apply(Box::new(RemoveClipCommand::new(clip_id)))?;

        if had_cursor {
            self.park_cursor(removed.start);
        }
        Ok(removed)
    }

    pub fn move_clip(&mut self, clip_id: Uuid, new_start: TimeUs) -> Result<()> {
        self.apply(Box::new(MoveClipCommand::new(clip_id, new_start)))
    }

    /// Move with snapping to zero, the cursor and the other clips' edges.
    pub fn move_clip_snapped(&mut self, clip_id: Uuid, proposed_start: TimeUs) -> Result<TimeUs> {
        let start = snapping::snap_clip_start(
            &self.track,
            clip_id,
            proposed_start,
            self.playback.cursor,
            self.settings.snap_threshold,
        );
        self.move_clip(clip_id, start)?;
        Ok(start)
    }

    pub fn trim_clip(&mut self, clip_id: Uuid, edge: TrimEdge, new_time: TimeUs) -> Result<()> {
        let had_cursor = self
            .track
            .get(clip_id)
            .map(|c| c.contains(self.playback.cursor))
            .ok_or(CoreError::NotFound(clip_id))?;

        self.apply(Box::new(TrimClipCommand::new(clip_id, edge, new_time)))?;

        if let Some(clip) = self.track.get(clip_id) {
            if had_cursor && !clip.contains(self.playback.cursor) {
                let start = clip.start;
                self.park_cursor(start);
            }
        }
        Ok(())
    }

    /// Split a clip; returns the id of the right-hand half.
    pub fn split_clip(&mut self, clip_id: Uuid, at: TimeUs) -> Result<Uuid> {
        let cmd = SplitClipCommand::new(clip_id, at);
        let right_id = cmd.right_id();
        self.apply(Box::new(cmd))?;
        Ok(right_id)
    }

    /// Split whichever clip is under the cursor.
    pub fn split_at_cursor(&mut self) -> Result<Uuid> {
        let cursor = self.playback.cursor;
        let clip_id = self
            .track
            .clip_at(cursor)
            .map(|c| c.id)
            .ok_or_else(|| CoreError::InvalidOperation(format!("no clip under cursor at {cursor}")))?;
        self.split_clip(clip_id, cursor)
    }

    /// Replace the whole clip set, e.g. after a drag-reorder.
    pub fn bulk_replace(&mut self, clips: Vec<Clip>) -> Result<()> {
        self.apply(Box::new(ReplaceClipsCommand::new(clips)))
    }

    pub fn undo(&mut self) -> Result<()> {
        self.history.undo(&mut self.track)?;
        self.sync_clip_state();
        tracing::debug!(total = %self.playback.total_duration, "undo");
        Ok(())
    }

    pub fn redo(&mut self) -> Result<()> {
        self.history.redo(&mut self.track)?;
        self.sync_clip_state();
        tracing::debug!(total = %self.playback.total_duration, "redo");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    /// Start playback. A no-op while already playing or when there is
    /// nothing to play; restarts from zero if the cursor sits at the end.
    pub fn play(&mut self) {
        if self.playback.is_playing() {
            return;
        }
        if self.track.is_empty() {
            tracing::debug!("play ignored on empty timeline");
            return;
        }
        if self.playback.cursor >= self.playback.total_duration {
            self.playback.cursor = TimeUs::ZERO;
        }
        self.playback.clock = ClockState::Playing;
        tracing::debug!(cursor = %self.playback.cursor, "playback started");
    }

    pub fn pause(&mut self) {
        if self.playback.is_playing() {
            self.playback.clock = ClockState::Stopped;
            tracing::debug!(cursor = %self.playback.cursor, "playback paused");
        }
    }

    /// Pause and rewind to zero.
    pub fn stop(&mut self) {
        self.pause();
        self.playback.cursor = TimeUs::ZERO;
    }

    pub fn toggle_play(&mut self) {
        if self.playback.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Direct cursor assignment, clamped to `[0, total_duration]`. Clip
    /// membership is resolved lazily on the next frame.
    pub fn seek(&mut self, t: TimeUs) {
        self.playback.cursor = t.max_zero().min(self.playback.total_duration);
    }

    pub fn skip_forward(&mut self) {
        self.seek(self.playback.cursor.saturating_add(self.settings.skip_step));
    }

    pub fn skip_backward(&mut self) {
        self.seek(self.playback.cursor - self.settings.skip_step);
    }

    /// Set the zoom factor, clamped to the configured range. Returns the
    /// applied value.
    pub fn set_zoom(&mut self, zoom: f64) -> Result<f64> {
        if zoom.is_nan() {
            return Err(CoreError::OutOfRange("zoom is NaN".into()));
        }
        let zoom = zoom.clamp(self.settings.zoom_min, self.settings.zoom_max);
        self.playback.zoom = zoom;
        Ok(zoom)
    }

    pub fn select_clip(&mut self, clip_id: Option<Uuid>) -> Result<()> {
        if let Some(id) = clip_id {
            if self.track.get(id).is_none() {
                return Err(CoreError::NotFound(id));
            }
        }
        self.playback.selected_clip_id = clip_id;
        Ok(())
    }

    /// Advance the clock by one tick of `dt` wall-clock time and return the
    /// frame to present.
    pub fn tick(&mut self, dt: TimeUs) -> PlaybackFrame {
        let before = self.playback.transport();
        let after = playback::advance(before, &self.track, dt);
        self.playback.cursor = after.cursor;
        self.playback.clock = after.clock;
        if before.clock != after.clock {
            tracing::debug!(cursor = %after.cursor, clock = ?after.clock, "clock state changed");
        }
        self.frame()
    }

    pub fn active_clip(&self) -> Option<ActiveClip> {
        playback::resolve(&self.track, self.playback.cursor)
    }

    /// Resolve everything visible or audible at the cursor without advancing.
    pub fn frame(&self) -> PlaybackFrame {
        let cursor = self.playback.cursor;
        PlaybackFrame {
            cursor,
            is_playing: self.playback.is_playing(),
            active: self.active_clip(),
            subtitles: self.subtitles.active_at(cursor).into_iter().cloned().collect(),
            overlays: self.overlays.active_at(cursor).into_iter().cloned().collect(),
            audio: self
                .audio
                .audible_at(cursor)
                .into_iter()
                .map(|(track, gain)| AudibleTrack {
                    track_id: track.id,
                    media_ref: track.media_ref.clone(),
                    local_offset: cursor - track.start,
                    gain,
                })
                .collect(),
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn apply(&mut self, cmd: Box<dyn Command>) -> Result<()> {
        let description = cmd.description().to_string();
        match self.history.execute(cmd, &mut self.track) {
            Ok(()) => {
                self.sync_clip_state();
                tracing::debug!(
                    op = %description,
                    clips = self.track.len(),
                    total = %self.playback.total_duration,
                    "clip edit applied"
                );
                Ok(())
            }
            Err(e) => {
                if !e.is_not_found() {
                    tracing::warn!(op = %description, error = %e, "clip edit rejected");
                }
                Err(e)
            }
        }
    }

    /// Recompute derived state after the clip set changed.
    fn sync_clip_state(&mut self) {
        self.playback.total_duration = self.track.total_duration();
        self.playback.cursor = self.playback.cursor.min(self.playback.total_duration);
        if let Some(id) = self.playback.selected_clip_id {
            if self.track.get(id).is_none() {
                self.playback.selected_clip_id = None;
            }
        }
    }

    fn park_cursor(&mut self, at: TimeUs) {
        self.pause();
        self.seek(at);
    }
}
