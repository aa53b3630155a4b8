use crate::error::Result;
use cutline_core::PlaybackFrame;
use uuid::Uuid;

/// Something that turns playback frames into pictures and sound.
///
/// The clock is the source of truth for time; a surface only follows the
/// frames it is given and reports nothing back except errors.
pub trait RenderSurface: Send {
    fn present(&mut self, frame: &PlaybackFrame) -> Result<()>;
}

/// Logs frame transitions instead of rendering. Used by the headless binary
/// when no player is attached.
#[derive(Debug, Default)]
pub struct TracingSurface {
    last_clip: Option<Uuid>,
    last_playing: bool,
    presented: u64,
}

impl TracingSurface {
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl RenderSurface for TracingSurface {
    fn present(&mut self, frame: &PlaybackFrame) -> Result<()> {
        self.presented += 1;

        let clip = frame.active.as_ref().map(|a| a.clip_id);
        if clip != self.last_clip {
            match &frame.active {
                Some(active) => tracing::info!(
                    cursor = %frame.cursor,
                    clip = %active.clip_id,
                    media = %active.media_ref,
                    offset = %active.local_offset,
                    "active clip"
                ),
                None => tracing::info!(cursor = %frame.cursor, "no active clip"),
            }
            self.last_clip = clip;
        }
        if frame.is_playing != self.last_playing {
            tracing::info!(cursor = %frame.cursor, playing = frame.is_playing, "transport");
            self.last_playing = frame.is_playing;
        }
        for subtitle in &frame.subtitles {
            tracing::trace!(text = %subtitle.text, "subtitle");
        }
        Ok(())
    }
}
