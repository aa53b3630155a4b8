use crate::error::{CoreError, Result};
use crate::interval::{self, Timed, MAX_TIMELINE, MIN_CLIP_LEN};
use crate::types::*;
use uuid::Uuid;

/// An unordered collection of timed entities that may overlap each other.
///
/// Shares the interval rules of the video track (half-open containment, the
/// minimum length floor) but never reflows: removing an entry leaves every
/// other entry where it is.
#[derive(Debug, Clone, PartialEq)]
pub struct Lane<T> {
    items: Vec<T>,
    min_len: TimeUs,
}

impl<T: Timed + Clone> Default for Lane<T> {
    fn default() -> Self {
        Self::new(MIN_CLIP_LEN)
    }
}

impl<T: Timed + Clone> Lane<T> {
    pub fn new(min_len: TimeUs) -> Self {
        Self {
            items: Vec::new(),
            min_len,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&T> {
        self.items.iter().find(|i| i.id() == id)
    }

    /// Every entry whose `[start, end)` contains `t`, in insertion order.
    pub fn active_at(&self, t: TimeUs) -> Vec<&T> {
        self.items.iter().filter(|i| i.contains(t)).collect()
    }

    pub fn add(&mut self, item: T) -> Result<Uuid> {
        validate_span(item.start(), item.end(), self.min_len)?;
        if self.get(item.id()).is_some() {
            return Err(CoreError::InvalidOperation(format!(
                "{} already exists",
                item.id()
            )));
        }
        let id = item.id();
        self.items.push(item);
        Ok(id)
    }

    pub fn remove(&mut self, id: Uuid) -> Result<T> {
        let idx = self.index_of(id)?;
        Ok(self.items.remove(idx))
    }

    /// Move one edge, never letting the entry shrink below the length floor.
    pub fn trim(&mut self, id: Uuid, edge: TrimEdge, new_time: TimeUs) -> Result<()> {
        let idx = self.index_of(id)?;
        let item = &mut self.items[idx];
        let (start, end) = (item.start(), item.end());
        match edge {
            TrimEdge::Start => {
                let t = interval::clamp(new_time, TimeUs::ZERO, end - self.min_len)
                    .ok_or(CoreError::DegenerateInterval)?;
                item.set_span(t, end);
            }
            TrimEdge::End => {
                let t = interval::clamp(new_time, start + self.min_len, MAX_TIMELINE)
                    .ok_or(CoreError::DegenerateInterval)?;
                item.set_span(start, t);
            }
        }
        Ok(())
    }

    /// Split an entry at `at`; the right half gets a fresh id and is placed
    /// directly after the original.
    pub fn split(&mut self, id: Uuid, at: TimeUs) -> Result<Uuid> {
        let idx = self.index_of(id)?;
        let item = &self.items[idx];
        if !(item.start() + self.min_len < at && at < item.end() - self.min_len) {
            return Err(CoreError::DegenerateInterval);
        }

        let mut right = item.clone();
        let right_id = Uuid::new_v4();
        right.set_id(right_id);
        right.set_span(at, item.end());

        let start = item.start();
        self.items[idx].set_span(start, at);
        self.items.insert(idx + 1, right);
        Ok(right_id)
    }

    /// Replace an entry's interval outright, under the same rules as `add`.
    pub fn retime(&mut self, id: Uuid, start: TimeUs, end: TimeUs) -> Result<()> {
        let idx = self.index_of(id)?;
        validate_span(start, end, self.min_len)?;
        self.items[idx].set_span(start, end);
        Ok(())
    }

    pub(crate) fn get_mut(&mut self, id: Uuid) -> Result<&mut T> {
        let idx = self.index_of(id)?;
        Ok(&mut self.items[idx])
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    fn index_of(&self, id: Uuid) -> Result<usize> {
        self.items
            .iter()
            .position(|i| i.id() == id)
            .ok_or(CoreError::NotFound(id))
    }
}

/// An empty interval is an `InvalidDuration`; a non-empty one shorter than
/// `min_len` is a `DegenerateInterval`.
fn validate_span(start: TimeUs, end: TimeUs, min_len: TimeUs) -> Result<()> {
    if start < TimeUs::ZERO {
        return Err(CoreError::OutOfRange(format!("start {} is negative", start)));
    }
    if end > MAX_TIMELINE {
        return Err(CoreError::OutOfRange(format!(
            "end {} is past the end of the timeline",
            end
        )));
    }
    if end <= start {
        return Err(CoreError::InvalidDuration(format!(
            "interval {}..{} is empty",
            start, end
        )));
    }
    if end - start < min_len {
        return Err(CoreError::DegenerateInterval);
    }
    Ok(())
}
