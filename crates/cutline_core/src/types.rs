use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Sub};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// TimeUs
// ---------------------------------------------------------------------------

/// Timeline time in whole microseconds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeUs(pub i64);

impl TimeUs {
    pub const ZERO: Self = Self(0);

    pub fn from_seconds(s: f64) -> Self {
        Self((s * 1_000_000.0).round() as i64)
    }

    /// Like `from_seconds` but rejects NaN, infinities and negative values.
    pub fn try_from_seconds(s: f64) -> Option<Self> {
        if s.is_finite() && s >= 0.0 {
            Some(Self::from_seconds(s))
        } else {
            None
        }
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms * 1_000)
    }

    pub fn from_duration(d: Duration) -> Self {
        Self(i64::try_from(d.as_micros()).unwrap_or(i64::MAX))
    }

    pub fn as_seconds(&self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    pub fn max_zero(self) -> Self {
        Self(self.0.max(0))
    }

    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Add for TimeUs {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for TimeUs {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for TimeUs {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul<i64> for TimeUs {
    type Output = Self;
    fn mul(self, rhs: i64) -> Self {
        Self(self.0 * rhs)
    }
}

impl Div<i64> for TimeUs {
    type Output = Self;
    fn div(self, rhs: i64) -> Self {
        Self(self.0 / rhs)
    }
}

impl fmt::Display for TimeUs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_us = self.0.unsigned_abs();
        let total_ms = total_us / 1_000;
        let ms = total_ms % 1_000;
        let total_secs = total_ms / 1_000;
        let secs = total_secs % 60;
        let total_mins = total_secs / 60;
        let mins = total_mins % 60;
        let hours = total_mins / 60;
        if self.0 < 0 {
            write!(f, "-{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
        } else {
            write!(f, "{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
        }
    }
}

/// Parses `H:M:S[.f]`, `M:S[.f]` or plain seconds.
impl FromStr for TimeUs {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CoreError::OutOfRange(format!("invalid time: {:?}", s));
        let parts: Vec<&str> = s.trim().split(':').collect();
        let seconds = match parts.as_slice() {
            [h, m, sec] => {
                let h: u64 = h.trim().parse().map_err(|_| invalid())?;
                let m: u64 = m.trim().parse().map_err(|_| invalid())?;
                let sec: f64 = sec.trim().parse().map_err(|_| invalid())?;
                (h * 3600 + m * 60) as f64 + sec
            }
            [m, sec] => {
                let m: u64 = m.trim().parse().map_err(|_| invalid())?;
                let sec: f64 = sec.trim().parse().map_err(|_| invalid())?;
                (m * 60) as f64 + sec
            }
            [sec] => sec.trim().parse().map_err(|_| invalid())?,
            _ => return Err(invalid()),
        };
        TimeUs::try_from_seconds(seconds).ok_or_else(invalid)
    }
}

// ---------------------------------------------------------------------------
// MediaRef
// ---------------------------------------------------------------------------

/// Opaque handle (path or URL) to media owned by the ingestion side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MediaRef(pub String);

impl MediaRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MediaRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MediaRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

// ---------------------------------------------------------------------------
// Clip
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClipKind {
    Video,
    Image,
}

/// Placement metadata carried by image clips created from overlay drafts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClipOverlay {
    pub position: Position,
    pub size: Size,
    pub opacity: f64,
    pub rotation_deg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clip {
    pub id: Uuid,
    pub kind: ClipKind,
    pub media_ref: MediaRef,
    pub name: String,
    pub start: TimeUs,
    pub end: TimeUs,
    pub overlay: Option<ClipOverlay>,
}

impl Clip {
    /// Length of media covered by this clip.
    pub fn local_duration(&self) -> TimeUs {
        self.end - self.start
    }
}

// ---------------------------------------------------------------------------
// AudioTrack
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioTrack {
    pub id: Uuid,
    pub name: String,
    pub media_ref: MediaRef,
    pub start: TimeUs,
    pub end: TimeUs,
    /// 0..=100
    pub volume: u8,
    pub muted: bool,
    pub fade_in: TimeUs,
    pub fade_out: TimeUs,
}

impl AudioTrack {
    pub const DEFAULT_VOLUME: u8 = 80;

    pub fn new(name: impl Into<String>, media_ref: MediaRef, start: TimeUs, end: TimeUs) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            media_ref,
            start,
            end,
            volume: Self::DEFAULT_VOLUME,
            muted: false,
            fade_in: TimeUs::ZERO,
            fade_out: TimeUs::ZERO,
        }
    }

    /// Linear gain in `[0, 1]` at timeline time `t`, including fades.
    /// Zero outside the track's interval or when muted.
    pub fn gain_at(&self, t: TimeUs) -> f64 {
        if self.muted || t < self.start || t >= self.end {
            return 0.0;
        }
        let mut gain = f64::from(self.volume) / 100.0;
        let since_start = (t - self.start).0 as f64;
        let until_end = (self.end - t).0 as f64;
        if self.fade_in.0 > 0 && since_start < self.fade_in.0 as f64 {
            gain *= since_start / self.fade_in.0 as f64;
        }
        if self.fade_out.0 > 0 && until_end < self.fade_out.0 as f64 {
            gain *= until_end / self.fade_out.0 as f64;
        }
        gain
    }
}

// ---------------------------------------------------------------------------
// Subtitle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SubtitlePosition {
    Top,
    Middle,
    #[default]
    Bottom,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubtitleStyle {
    pub font_family: String,
    pub font_size_px: u32,
    pub color: String,
    pub background_color: String,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            font_size_px: 24,
            color: "#ffffff".to_string(),
            background_color: "rgba(0,0,0,0.5)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subtitle {
    pub id: Uuid,
    pub text: String,
    pub start: TimeUs,
    pub end: TimeUs,
    pub position: SubtitlePosition,
    pub style: SubtitleStyle,
}

impl Subtitle {
    pub fn new(text: impl Into<String>, start: TimeUs, end: TimeUs) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            start,
            end,
            position: SubtitlePosition::default(),
            style: SubtitleStyle::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// ImageOverlay
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageOverlay {
    pub id: Uuid,
    pub media_ref: MediaRef,
    pub start: TimeUs,
    pub end: TimeUs,
    /// Percent of the frame.
    pub position: Position,
    /// Pixels.
    pub size: Size,
    /// 0..=1
    pub opacity: f64,
    pub rotation_deg: f64,
}

impl ImageOverlay {
    /// Overlays dropped onto the preview default to the first ten seconds.
    pub const DEFAULT_DURATION: TimeUs = TimeUs(10_000_000);

    pub fn new(media_ref: MediaRef) -> Self {
        Self {
            id: Uuid::new_v4(),
            media_ref,
            start: TimeUs::ZERO,
            end: Self::DEFAULT_DURATION,
            position: Position { x: 50.0, y: 50.0 },
            size: Size {
                width: 200.0,
                height: 200.0,
            },
            opacity: 1.0,
            rotation_deg: 0.0,
        }
    }

    pub fn placement(&self) -> ClipOverlay {
        ClipOverlay {
            position: self.position,
            size: self.size,
            opacity: self.opacity,
            rotation_deg: self.rotation_deg,
        }
    }
}

// ---------------------------------------------------------------------------
// LibraryItem
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryItem {
    pub id: Uuid,
    pub name: String,
    pub media_ref: MediaRef,
    /// `None` until the media has been probed.
    pub native_duration: Option<TimeUs>,
}

impl LibraryItem {
    pub fn new(name: impl Into<String>, media_ref: MediaRef, native_duration: Option<TimeUs>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            media_ref,
            native_duration,
        }
    }

    /// Resolved, strictly positive duration.
    pub fn duration(&self) -> Result<TimeUs> {
        match self.native_duration {
            Some(d) if d > TimeUs::ZERO => Ok(d),
            Some(d) => Err(CoreError::InvalidDuration(format!(
                "{} has non-positive duration {}",
                self.name, d
            ))),
            None => Err(CoreError::InvalidDuration(format!(
                "{} has no resolved duration",
                self.name
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// TrimEdge
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TrimEdge {
    Start,
    End,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
