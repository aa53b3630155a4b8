use crate::error::{CoreError, Result};
use crate::interval::{self, Timed, MAX_TIMELINE, MIN_CLIP_LEN};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// The single video track.
///
/// Clips are kept sorted by `start` and never overlap: every operation that
/// could produce an overlap displaces neighbours before returning. Operations
/// either apply completely or return an error with the track untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoTrack {
    clips: Vec<Clip>,
    min_len: TimeUs,
}

impl Default for VideoTrack {
    fn default() -> Self {
        Self::new(MIN_CLIP_LEN)
    }
}

impl VideoTrack {
    pub fn new(min_len: TimeUs) -> Self {
        Self {
            clips: Vec::new(),
            min_len,
        }
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn min_len(&self) -> TimeUs {
        self.min_len
    }

    pub fn get(&self, clip_id: Uuid) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == clip_id)
    }

    /// End of the last clip in sequence order, where appends land.
    pub fn end_time(&self) -> TimeUs {
        self.clips.last().map(|c| c.end).unwrap_or(TimeUs::ZERO)
    }

    /// `max(end)` over all clips, or zero when empty.
    pub fn total_duration(&self) -> TimeUs {
        self.clips
            .iter()
            .map(|c| c.end)
            .max()
            .unwrap_or(TimeUs::ZERO)
    }

    /// First clip whose `[start, end)` contains `t`.
    pub fn clip_at(&self, t: TimeUs) -> Option<&Clip> {
        self.clips.iter().find(|c| c.contains(t))
    }

    /// First clip starting strictly after `t`.
    pub fn next_clip_after(&self, t: TimeUs) -> Option<&Clip> {
        self.clips.iter().find(|c| c.start > t)
    }

    /// Place a library item on the track. Appends after the last clip when
    /// `insert_at` is `None`.
    pub fn add_clip(&mut self, item: &LibraryItem, insert_at: Option<TimeUs>) -> Result<Uuid> {
        let duration = item.duration()?;
        let clip = Clip {
            id: Uuid::new_v4(),
            kind: ClipKind::Video,
            media_ref: item.media_ref.clone(),
            name: item.name.clone(),
            start: TimeUs::ZERO,
            end: duration,
            overlay: None,
        };
        self.insert_clip(clip, insert_at)
    }

    /// Insert a prepared clip, keeping its length.
    ///
    /// A start inside an existing clip is moved to that clip's end. Clips at or
    /// after the insertion point are pushed right to make room. Fails with
    /// `OutOfRange` if the result would end past `MAX_TIMELINE`.
    pub fn insert_clip(&mut self, mut clip: Clip, insert_at: Option<TimeUs>) -> Result<Uuid> {
        let duration = clip.local_duration();
        if duration <= TimeUs::ZERO {
            return Err(CoreError::InvalidDuration(format!(
                "clip {} has non-positive length",
                clip.name
            )));
        }
        if duration > MAX_TIMELINE {
            return Err(CoreError::OutOfRange(format!(
                "clip {} is longer than the timeline allows",
                clip.name
            )));
        }
        if self.get(clip.id).is_some() {
            return Err(CoreError::InvalidOperation(format!(
                "clip {} already on the timeline",
                clip.id
            )));
        }

        let mut start = within_timeline(insert_at.unwrap_or_else(|| self.end_time()).max_zero())?;
        if let Some(host) = self.clip_at(start) {
            if host.start < start {
                start = host.end;
            }
        }
        clip.set_span(start, start + duration);

        let id = clip.id;
        let mut layout = self.clips.clone();
        let idx = layout.partition_point(|c| c.start < start);
        layout.insert(idx, clip);
        push_right_from(&mut layout, idx + 1);
        ensure_fits(&layout)?;
        self.clips = layout;
        Ok(id)
    }

    /// Move a clip so it starts at `new_start` (clamped to zero), keeping its
    /// length. Overlapped neighbours are displaced in the direction of the
    /// move, cascading. A leftward cascade that would cross zero is resolved
    /// by displacing to the right instead.
    pub fn move_clip(&mut self, clip_id: Uuid, new_start: TimeUs) -> Result<()> {
        let idx = self.index_of(clip_id)?;
        let new_start = within_timeline(new_start.max_zero())?;
        let old_start = self.clips[idx].start;
        if new_start == old_start {
            return Ok(());
        }

        let mut others = self.clips.clone();
        let mut moved = others.remove(idx);
        let duration = moved.local_duration();
        moved.set_span(new_start, new_start + duration);

        let layout = if new_start < old_start {
            displace_left(&others, &moved).unwrap_or_else(|| displace_right(&others, &moved))
        } else {
            displace_right(&others, &moved)
        };
        debug_assert!(is_disjoint(&layout));
        ensure_fits(&layout)?;
        self.clips = layout;
        Ok(())
    }

    /// Move one edge of a clip.
    ///
    /// The start edge is bounded by the previous clip's end and `end - ε`; the
    /// end edge by `start + ε` and the next clip's start (or the total
    /// duration for the last clip). An empty bound range is rejected.
    pub fn trim_clip(&mut self, clip_id: Uuid, edge: TrimEdge, new_time: TimeUs) -> Result<()> {
        let idx = self.index_of(clip_id)?;
        let (start, end) = (self.clips[idx].start, self.clips[idx].end);

        let (new_start, new_end) = match edge {
            TrimEdge::Start => {
                let lo = if idx > 0 {
                    self.clips[idx - 1].end
                } else {
                    TimeUs::ZERO
                };
                let hi = end - self.min_len;
                let t = interval::clamp(new_time, lo, hi).ok_or(CoreError::DegenerateInterval)?;
                (t, end)
            }
            TrimEdge::End => {
                let lo = start + self.min_len;
                let hi = self
                    .clips
                    .get(idx + 1)
                    .map(|next| next.start)
                    .unwrap_or_else(|| self.total_duration());
                let t = interval::clamp(new_time, lo, hi).ok_or(CoreError::DegenerateInterval)?;
                (start, t)
            }
        };

        if new_end - new_start < self.min_len {
            return Err(CoreError::DegenerateInterval);
        }
        self.clips[idx].set_span(new_start, new_end);
        Ok(())
    }

    /// Split a clip at `at`. Returns the id of the new right-hand clip.
    pub fn split_clip(&mut self, clip_id: Uuid, at: TimeUs) -> Result<Uuid> {
        self.split_clip_with_id(clip_id, at, Uuid::new_v4())
    }

    /// Split keeping a caller-chosen id for the right half, so a redone split
    /// reproduces the same ids.
    pub(crate) fn split_clip_with_id(&mut self, clip_id: Uuid, at: TimeUs, right_id: Uuid) -> Result<Uuid> {
        let idx = self.index_of(clip_id)?;
        if self.get(right_id).is_some() {
            return Err(CoreError::InvalidOperation(format!(
                "clip {} already on the timeline",
                right_id
            )));
        }

        let clip = &self.clips[idx];
        if !(clip.start + self.min_len < at && at < clip.end - self.min_len) {
            return Err(CoreError::DegenerateInterval);
        }

        let mut right = clip.clone();
        right.set_id(right_id);
        right.set_span(at, clip.end);

        let left_start = clip.start;
        self.clips[idx].set_span(left_start, at);
        self.clips.insert(idx + 1, right);
        Ok(right_id)
    }

    /// Delete a clip and close the gap it leaves.
    pub fn remove_clip(&mut self, clip_id: Uuid) -> Result<Clip> {
        let idx = self.index_of(clip_id)?;
        let removed = self.clips.remove(idx);
        self.reflow(removed.start, removed.local_duration());
        Ok(removed)
    }

    /// Shift every clip starting after `pivot` left by `gap`, limited to the
    /// free space in front of the first shifted clip. Returns the applied
    /// shift.
    pub fn reflow(&mut self, pivot: TimeUs, gap: TimeUs) -> TimeUs {
        let first = self.clips.partition_point(|c| c.start <= pivot);
        let Some(first_shifted) = self.clips.get(first) else {
            return TimeUs::ZERO;
        };
        let floor = if first > 0 {
            self.clips[first - 1].end
        } else {
            TimeUs::ZERO
        };
        let applied = gap.min(first_shifted.start - floor).max_zero();
        for clip in &mut self.clips[first..] {
            clip.shift_by(TimeUs(-applied.0));
        }
        applied
    }

    /// Replace the whole clip set. Rejected if any clip is empty, lies outside
    /// `[0, MAX_TIMELINE]`, repeats an id or overlaps another.
    pub fn replace_all(&mut self, mut clips: Vec<Clip>) -> Result<()> {
        let mut seen = HashSet::new();
        for clip in &clips {
            if clip.start < TimeUs::ZERO {
                return Err(CoreError::OutOfRange(format!(
                    "clip {} starts before zero",
                    clip.id
                )));
            }
            if clip.end <= clip.start {
                return Err(CoreError::InvalidDuration(format!(
                    "clip {} has non-positive length",
                    clip.id
                )));
            }
            if !seen.insert(clip.id) {
                return Err(CoreError::InvalidOperation(format!(
                    "duplicate clip id {}",
                    clip.id
                )));
            }
        }
        ensure_fits(&clips)?;
        clips.sort_by_key(|c| c.start);
        if !is_disjoint(&clips) {
            return Err(CoreError::OverlapDetected);
        }
        self.clips = clips;
        Ok(())
    }

    /// Restore a previously captured clip set without validation.
    pub(crate) fn restore(&mut self, clips: Vec<Clip>) {
        self.clips = clips;
    }

    fn index_of(&self, clip_id: Uuid) -> Result<usize> {
        self.clips
            .iter()
            .position(|c| c.id == clip_id)
            .ok_or(CoreError::NotFound(clip_id))
    }
}

fn push_right_from(clips: &mut [Clip], from: usize) {
    for i in from.max(1)..clips.len() {
        let prev_end = clips[i - 1].end;
        let start = clips[i].start;
        if start < prev_end {
            clips[i].shift_by(prev_end - start);
        }
    }
}

fn within_timeline(t: TimeUs) -> Result<TimeUs> {
    if t > MAX_TIMELINE {
        return Err(CoreError::OutOfRange(format!("{} is past the end of the timeline", t)));
    }
    Ok(t)
}

fn ensure_fits(clips: &[Clip]) -> Result<()> {
    match clips.iter().map(|c| c.end).max() {
        Some(end) => within_timeline(end).map(|_| ()),
        None => Ok(()),
    }
}

/// Layout with `moved` pinned and every clip ending after its start pushed
/// to the right of it.
fn displace_right(others: &[Clip], moved: &Clip) -> Vec<Clip> {
    let mut layout = Vec::with_capacity(others.len() + 1);
    let mut displaced = Vec::new();
    for clip in others {
        if clip.end <= moved.start {
            layout.push(clip.clone());
        } else {
            displaced.push(clip.clone());
        }
    }
    layout.push(moved.clone());

    let mut cursor = moved.end;
    for mut clip in displaced {
        if clip.start < cursor {
            clip.shift_by(cursor - clip.start);
        }
        cursor = clip.end;
        layout.push(clip);
    }
    layout
}

/// Layout with `moved` pinned and every clip starting before its end pushed
/// to the left of it. `None` if that would cross zero.
fn displace_left(others: &[Clip], moved: &Clip) -> Option<Vec<Clip>> {
    let mut displaced = Vec::new();
    let mut after = Vec::new();
    for clip in others {
        if clip.start >= moved.end {
            after.push(clip.clone());
        } else {
            displaced.push(clip.clone());
        }
    }

    let mut cursor = moved.start;
    for clip in displaced.iter_mut().rev() {
        if clip.end > cursor {
            clip.shift_by(cursor - clip.end);
        }
        cursor = clip.start;
    }
    if displaced.first().is_some_and(|c| c.start < TimeUs::ZERO) {
        return None;
    }

    displaced.push(moved.clone());
    displaced.extend(after);
    Some(displaced)
}

fn is_disjoint(sorted: &[Clip]) -> bool {
    sorted
        .windows(2)
        .all(|pair| !interval::overlaps(pair[0].start, pair[0].end, pair[1].start, pair[1].end))
}
