use crate::error::{CoreError, Result};
use crate::lane::Lane;
use crate::types::*;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubtitleStyleUpdate {
    pub font_family: Option<String>,
    pub font_size_px: Option<u32>,
    pub color: Option<String>,
    pub background_color: Option<String>,
}

/// Partial update for a subtitle; the style is merged field by field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubtitleUpdate {
    pub text: Option<String>,
    pub start: Option<TimeUs>,
    pub end: Option<TimeUs>,
    pub position: Option<SubtitlePosition>,
    pub style: Option<SubtitleStyleUpdate>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subtitles {
    lane: Lane<Subtitle>,
}

impl Subtitles {
    pub fn new(min_len: TimeUs) -> Self {
        Self {
            lane: Lane::new(min_len),
        }
    }

    pub fn items(&self) -> &[Subtitle] {
        self.lane.items()
    }

    pub fn get(&self, id: Uuid) -> Option<&Subtitle> {
        self.lane.get(id)
    }

    pub fn add(&mut self, subtitle: Subtitle) -> Result<Uuid> {
        let id = self.lane.add(subtitle)?;
        tracing::debug!(%id, "subtitle added");
        Ok(id)
    }

    pub fn remove(&mut self, id: Uuid) -> Result<Subtitle> {
        self.lane.remove(id)
    }

    /// Apply a partial update. A new interval is validated before anything
    /// else changes, so a rejected update leaves the subtitle untouched.
    pub fn update(&mut self, id: Uuid, update: SubtitleUpdate) -> Result<()> {
        let current = self.lane.get(id).ok_or(CoreError::NotFound(id))?;
        let start = update.start.unwrap_or(current.start);
        let end = update.end.unwrap_or(current.end);
        if update.start.is_some() || update.end.is_some() {
            self.lane.retime(id, start, end)?;
        }

        let subtitle = self.lane.get_mut(id)?;
        if let Some(text) = update.text {
            subtitle.text = text;
        }
        if let Some(position) = update.position {
            subtitle.position = position;
        }
        if let Some(style) = update.style {
            if let Some(font_family) = style.font_family {
                subtitle.style.font_family = font_family;
            }
            if let Some(font_size_px) = style.font_size_px {
                subtitle.style.font_size_px = font_size_px;
            }
            if let Some(color) = style.color {
                subtitle.style.color = color;
            }
            if let Some(background_color) = style.background_color {
                subtitle.style.background_color = background_color;
            }
        }
        Ok(())
    }

    /// All subtitles showing at `t`; overlapping cues stack.
    pub fn active_at(&self, t: TimeUs) -> Vec<&Subtitle> {
        self.lane.active_at(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(seconds: f64) -> TimeUs {
        TimeUs::from_seconds(seconds)
    }

    #[test]
    fn update_merges_style() {
        let mut subs = Subtitles::default();
        let id = subs.add(Subtitle::new("hello", s(0.0), s(2.0))).unwrap();
        subs.update(
            id,
            SubtitleUpdate {
                text: Some("bonjour".into()),
                position: Some(SubtitlePosition::Top),
                style: Some(SubtitleStyleUpdate {
                    color: Some("#ff0000".into()),
                    ..SubtitleStyleUpdate::default()
                }),
                ..SubtitleUpdate::default()
            },
        )
        .unwrap();

        let sub = subs.get(id).unwrap();
        assert_eq!(sub.text, "bonjour");
        assert_eq!(sub.position, SubtitlePosition::Top);
        assert_eq!(sub.style.color, "#ff0000");
        assert_eq!(sub.style.font_family, SubtitleStyle::default().font_family);
    }

    #[test]
    fn retime_below_minimum_length_is_rejected() {
        let mut subs = Subtitles::default();
        assert!(matches!(
            subs.add(Subtitle::new("y", TimeUs::ZERO, TimeUs(1))),
            Err(CoreError::DegenerateInterval)
        ));

        let id = subs.add(Subtitle::new("hello", s(0.0), s(2.0))).unwrap();
        let result = subs.update(
            id,
            SubtitleUpdate {
                start: Some(s(1.0)),
                end: Some(TimeUs(1_000_001)),
                ..SubtitleUpdate::default()
            },
        );
        assert!(matches!(result, Err(CoreError::DegenerateInterval)));
        let sub = subs.get(id).unwrap();
        assert_eq!((sub.start, sub.end), (s(0.0), s(2.0)));
    }

    #[test]
    fn invalid_retime_changes_nothing() {
        let mut subs = Subtitles::default();
        let id = subs.add(Subtitle::new("hello", s(1.0), s(3.0))).unwrap();
        let result = subs.update(
            id,
            SubtitleUpdate {
                text: Some("changed".into()),
                end: Some(s(0.5)),
                ..SubtitleUpdate::default()
            },
        );
        assert!(matches!(result, Err(CoreError::InvalidDuration(_))));
        let sub = subs.get(id).unwrap();
        assert_eq!(sub.text, "hello");
        assert_eq!(sub.end, s(3.0));
    }

    #[test]
    fn overlapping_subtitles_stack() {
        let mut subs = Subtitles::default();
        subs.add(Subtitle::new("a", s(0.0), s(4.0))).unwrap();
        subs.add(Subtitle::new("b", s(2.0), s(6.0))).unwrap();
        let texts: Vec<&str> = subs.active_at(s(3.0)).iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }
}
