//! Half-open interval helpers shared by every timed entity.
//!
//! All containment tests use `[start, end)` so that adjacent intervals never
//! both match the same instant.

use crate::types::*;
use uuid::Uuid;

/// Minimum length of any interval on the timeline (0.1 s).
pub const MIN_CLIP_LEN: TimeUs = TimeUs(100_000);

/// Latest instant any interval may end at. Leaves headroom so that pushing a
/// whole track right can never overflow.
pub const MAX_TIMELINE: TimeUs = TimeUs(i64::MAX / 4);

pub fn contains(start: TimeUs, end: TimeUs, t: TimeUs) -> bool {
    t >= start && t < end
}

pub fn overlaps(a_start: TimeUs, a_end: TimeUs, b_start: TimeUs, b_end: TimeUs) -> bool {
    a_start < b_end && b_start < a_end
}

/// Clamp `t` into `[lo, hi]`. Returns `None` when the range is empty.
pub fn clamp(t: TimeUs, lo: TimeUs, hi: TimeUs) -> Option<TimeUs> {
    if lo > hi {
        None
    } else {
        Some(t.max(lo).min(hi))
    }
}

pub fn shift(start: TimeUs, end: TimeUs, delta: TimeUs) -> (TimeUs, TimeUs) {
    (start + delta, end + delta)
}

/// An entity occupying `[start, end)` on the timeline.
pub trait Timed {
    fn id(&self) -> Uuid;
    fn set_id(&mut self, id: Uuid);
    fn start(&self) -> TimeUs;
    fn end(&self) -> TimeUs;
    fn set_span(&mut self, start: TimeUs, end: TimeUs);

    fn duration(&self) -> TimeUs {
        self.end() - self.start()
    }

    fn contains(&self, t: TimeUs) -> bool {
        contains(self.start(), self.end(), t)
    }

    fn shift_by(&mut self, delta: TimeUs) {
        let (start, end) = shift(self.start(), self.end(), delta);
        self.set_span(start, end);
    }
}

macro_rules! impl_timed {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Timed for $ty {
                fn id(&self) -> Uuid {
                    self.id
                }

                fn set_id(&mut self, id: Uuid) {
                    self.id = id;
                }

                fn start(&self) -> TimeUs {
                    self.start
                }

                fn end(&self) -> TimeUs {
                    self.end
                }

                fn set_span(&mut self, start: TimeUs, end: TimeUs) {
                    self.start = start;
                    self.end = end;
                }
            }
        )*
    };
}

impl_timed!(Clip, AudioTrack, Subtitle, ImageOverlay);
