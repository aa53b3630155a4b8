use crate::editing::VideoTrack;
use crate::error::{CoreError, Result};
use crate::types::*;
use std::collections::VecDeque;
use uuid::Uuid;

/// A reversible edit of the video track.
pub trait Command: std::fmt::Debug + Send {
    fn execute(&mut self, track: &mut VideoTrack) -> Result<()>;
    fn undo(&mut self, track: &mut VideoTrack) -> Result<()>;
    fn description(&self) -> &str;
}

/// Undo/redo history stack.
#[derive(Debug)]
pub struct History {
    undo_stack: VecDeque<Box<dyn Command>>,
    redo_stack: Vec<Box<dyn Command>>,
    max_size: usize,
}

impl History {
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_size,
        }
    }

    /// Execute a command and push it onto the undo stack. Clears redo stack.
    /// A failed command is dropped and leaves both stacks untouched.
    pub fn execute(&mut self, mut cmd: Box<dyn Command>, track: &mut VideoTrack) -> Result<()> {
        cmd.execute(track)?;
        self.redo_stack.clear();
        self.undo_stack.push_back(cmd);
        if self.undo_stack.len() > self.max_size {
            self.undo_stack.pop_front();
        }
        Ok(())
    }

    /// Undo the last command.
    pub fn undo(&mut self, track: &mut VideoTrack) -> Result<()> {
        let mut cmd = self.undo_stack.pop_back().ok_or(CoreError::NothingToUndo)?;
        cmd.undo(track)?;
        self.redo_stack.push(cmd);
        Ok(())
    }

    /// Redo the last undone command.
    pub fn redo(&mut self, track: &mut VideoTrack) -> Result<()> {
        let mut cmd = self.redo_stack.pop().ok_or(CoreError::NothingToRedo)?;
        cmd.execute(track)?;
        self.undo_stack.push_back(cmd);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|cmd| cmd.description())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|cmd| cmd.description())
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Clip set captured before a command runs. Moves and deletes can shift many
/// neighbours, so undo restores the whole set.
#[derive(Debug, Default)]
struct Snapshot(Option<Vec<Clip>>);

impl Snapshot {
    fn capture(&mut self, track: &VideoTrack) {
        self.0 = Some(track.clips().to_vec());
    }

    fn restore(&self, track: &mut VideoTrack) -> Result<()> {
        let clips = self
            .0
            .clone()
            .ok_or_else(|| CoreError::InvalidOperation("no snapshot saved".into()))?;
        track.restore(clips);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AddClipCommand
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AddClipCommand {
    clip: Clip,
    insert_at: Option<TimeUs>,
    before: Snapshot,
}

impl AddClipCommand {
    pub fn new(clip: Clip, insert_at: Option<TimeUs>) -> Self {
        Self {
            clip,
            insert_at,
            before: Snapshot::default(),
        }
    }
}

impl Command for AddClipCommand {
    fn execute(&mut self, track: &mut VideoTrack) -> Result<()> {
        self.before.capture(track);
        track.insert_clip(self.clip.clone(), self.insert_at).map(|_| ())
    }

    fn undo(&mut self, track: &mut VideoTrack) -> Result<()> {
        self.before.restore(track)
    }

    fn description(&self) -> &str {
        "Add clip"
    }
}

// ---------------------------------------------------------------------------
// RemoveClipCommand
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct RemoveClipCommand {
    clip_id: Uuid,
    before: Snapshot,
}

impl RemoveClipCommand {
    pub fn new(clip_id: Uuid) -> Self {
        Self {
            clip_id,
            before: Snapshot::default(),
        }
    }
}

impl Command for RemoveClipCommand {
    fn execute(&mut self, track: &mut VideoTrack) -> Result<()> {
        self.before.capture(track);
        track.remove_clip(self.clip_id).map(|_| ())
    }

    fn undo(&mut self, track: &mut VideoTrack) -> Result<()> {
        self.before.restore(track)
    }

    fn description(&self) -> &str {
        "Remove clip"
    }
}

// ---------------------------------------------------------------------------
// MoveClipCommand
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct MoveClipCommand {
    clip_id: Uuid,
    new_start: TimeUs,
    before: Snapshot,
}

impl MoveClipCommand {
    pub fn new(clip_id: Uuid, new_start: TimeUs) -> Self {
        Self {
            clip_id,
            new_start,
            before: Snapshot::default(),
        }
    }
}

impl Command for MoveClipCommand {
    fn execute(&mut self, track: &mut VideoTrack) -> Result<()> {
        self.before.capture(track);
        track.move_clip(self.clip_id, self.new_start)
    }

    fn undo(&mut self, track: &mut VideoTrack) -> Result<()> {
        self.before.restore(track)
    }

    fn description(&self) -> &str {
        "Move clip"
    }
}

// ---------------------------------------------------------------------------
// TrimClipCommand
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct TrimClipCommand {
    clip_id: Uuid,
    edge: TrimEdge,
    new_time: TimeUs,
    before: Snapshot,
}

impl TrimClipCommand {
    pub fn new(clip_id: Uuid, edge: TrimEdge, new_time: TimeUs) -> Self {
        Self {
            clip_id,
            edge,
            new_time,
            before: Snapshot::default(),
        }
    }
}

impl Command for TrimClipCommand {
    fn execute(&mut self, track: &mut VideoTrack) -> Result<()> {
        self.before.capture(track);
        track.trim_clip(self.clip_id, self.edge, self.new_time)
    }

    fn undo(&mut self, track: &mut VideoTrack) -> Result<()> {
        self.before.restore(track)
    }

    fn description(&self) -> &str {
        match self.edge {
            TrimEdge::Start => "Trim in-point",
            TrimEdge::End => "Trim out-point",
        }
    }
}

// ---------------------------------------------------------------------------
// SplitClipCommand
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct SplitClipCommand {
    clip_id: Uuid,
    at: TimeUs,
    right_id: Uuid,
    before: Snapshot,
}

impl SplitClipCommand {
    pub fn new(clip_id: Uuid, at: TimeUs) -> Self {
        Self {
            clip_id,
            at,
            right_id: Uuid::new_v4(),
            before: Snapshot::default(),
        }
    }

    /// Id the right half receives; stable across redo.
    pub fn right_id(&self) -> Uuid {
        self.right_id
    }
}

impl Command for SplitClipCommand {
    fn execute(&mut self, track: &mut VideoTrack) -> Result<()> {
        self.before.capture(track);
        track
            .split_clip_with_id(self.clip_id, self.at, self.right_id)
            .map(|_| ())
    }

    fn undo(&mut self, track: &mut VideoTrack) -> Result<()> {
        self.before.restore(track)
    }

    fn description(&self) -> &str {
        "Split clip"
    }
}

// ---------------------------------------------------------------------------
// ReplaceClipsCommand
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ReplaceClipsCommand {
    clips: Vec<Clip>,
    before: Snapshot,
}

impl ReplaceClipsCommand {
    pub fn new(clips: Vec<Clip>) -> Self {
        Self {
            clips,
            before: Snapshot::default(),
        }
    }
}

impl Command for ReplaceClipsCommand {
    fn execute(&mut self, track: &mut VideoTrack) -> Result<()> {
        self.before.capture(track);
        track.replace_all(self.clips.clone())
    }

    fn undo(&mut self, track: &mut VideoTrack) -> Result<()> {
        self.before.restore(track)
    }

    fn description(&self) -> &str {
        "Rearrange clips"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_clip(start_s: f64, end_s: f64) -> Clip {
        Clip {
            id: Uuid::new_v4(),
            kind: ClipKind::Video,
            media_ref: MediaRef::from("clip.mp4"),
            name: "clip".to_string(),
            start: TimeUs::from_seconds(start_s),
            end: TimeUs::from_seconds(end_s),
            overlay: None,
        }
    }

    fn make_test_track() -> (VideoTrack, Uuid, Uuid) {
        let a = make_clip(0.0, 5.0);
        let b = make_clip(5.0, 8.0);
        let (a_id, b_id) = (a.id, b.id);
        let mut track = VideoTrack::default();
        track.replace_all(vec![a, b]).unwrap();
        (track, a_id, b_id)
    }

    // -----------------------------------------------------------------------
    // AddClipCommand + undo/redo
    // -----------------------------------------------------------------------

    #[test]
    fn add_undo_redo() {
        let (mut track, _, _) = make_test_track();
        let original = track.clone();
        let mut history = History::new(100);

        let clip = make_clip(0.0, 2.0);
        let clip_id = clip.id;
        history
            .execute(Box::new(AddClipCommand::new(clip, Some(TimeUs::ZERO))), &mut track)
            .unwrap();
        assert_eq!(track.len(), 3);
        assert_eq!(track.clips()[0].id, clip_id);

        history.undo(&mut track).unwrap();
        assert_eq!(track, original);

        history.redo(&mut track).unwrap();
        assert_eq!(track.len(), 3);
        assert_eq!(track.clips()[0].id, clip_id);
    }

    // -----------------------------------------------------------------------
    // RemoveClipCommand
    // -----------------------------------------------------------------------

    #[test]
    fn remove_undo_restores_reflowed_neighbours() {
        let (mut track, a_id, _) = make_test_track();
        let original = track.clone();
        let mut history = History::new(100);

        history
            .execute(Box::new(RemoveClipCommand::new(a_id)), &mut track)
            .unwrap();
        assert_eq!(track.clips()[0].start, TimeUs::ZERO);

        history.undo(&mut track).unwrap();
        assert_eq!(track, original);
    }

    // -----------------------------------------------------------------------
    // MoveClipCommand / TrimClipCommand
    // -----------------------------------------------------------------------

    #[test]
    fn move_and_trim_undo_in_reverse_order() {
        let (mut track, a_id, b_id) = make_test_track();
        let original = track.clone();
        let mut history = History::new(100);

        history
            .execute(Box::new(MoveClipCommand::new(b_id, TimeUs::from_seconds(10.0))), &mut track)
            .unwrap();
        let moved = track.clone();
        history
            .execute(
                Box::new(TrimClipCommand::new(a_id, TrimEdge::End, TimeUs::from_seconds(3.0))),
                &mut track,
            )
            .unwrap();
        assert_eq!(history.undo_description(), Some("Trim out-point"));

        history.undo(&mut track).unwrap();
        assert_eq!(track, moved);
        history.undo(&mut track).unwrap();
        assert_eq!(track, original);
        assert!(!history.can_undo());
        assert!(history.can_redo());
    }

    // -----------------------------------------------------------------------
    // SplitClipCommand
    // -----------------------------------------------------------------------

    #[test]
    fn split_redo_reuses_right_id() {
        let (mut track, a_id, _) = make_test_track();
        let mut history = History::new(100);

        let cmd = SplitClipCommand::new(a_id, TimeUs::from_seconds(2.0));
        let right_id = cmd.right_id();
        history.execute(Box::new(cmd), &mut track).unwrap();
        assert!(track.get(right_id).is_some());

        history.undo(&mut track).unwrap();
        assert!(track.get(right_id).is_none());

        history.redo(&mut track).unwrap();
        assert!(track.get(right_id).is_some());
    }

    #[test]
    fn failed_command_is_not_recorded() {
        let (mut track, a_id, _) = make_test_track();
        let mut history = History::new(100);

        let result = history.execute(
            Box::new(SplitClipCommand::new(a_id, TimeUs::from_seconds(0.05))),
            &mut track,
        );
        assert!(matches!(result, Err(CoreError::DegenerateInterval)));
        assert!(!history.can_undo());
    }

    // -----------------------------------------------------------------------
    // ReplaceClipsCommand
    // -----------------------------------------------------------------------

    #[test]
    fn replace_undo() {
        let (mut track, _, _) = make_test_track();
        let original = track.clone();
        let mut history = History::new(100);

        history
            .execute(Box::new(ReplaceClipsCommand::new(vec![make_clip(1.0, 2.0)])), &mut track)
            .unwrap();
        assert_eq!(track.len(), 1);
        history.undo(&mut track).unwrap();
        assert_eq!(track, original);
    }

    // -----------------------------------------------------------------------
    // Edge cases
    // -----------------------------------------------------------------------

    #[test]
    fn undo_empty_fails() {
        let (mut track, _, _) = make_test_track();
        let mut history = History::new(100);
        assert!(matches!(history.undo(&mut track), Err(CoreError::NothingToUndo)));
        assert!(matches!(history.redo(&mut track), Err(CoreError::NothingToRedo)));
    }

    #[test]
    fn new_command_clears_redo() {
        let (mut track, a_id, b_id) = make_test_track();
        let mut history = History::new(100);

        history
            .execute(Box::new(MoveClipCommand::new(b_id, TimeUs::from_seconds(9.0))), &mut track)
            .unwrap();
        history.undo(&mut track).unwrap();
        assert!(history.can_redo());

        history
            .execute(Box::new(MoveClipCommand::new(a_id, TimeUs::from_seconds(20.0))), &mut track)
            .unwrap();
        assert!(!history.can_redo());
    }

    #[test]
    fn history_is_bounded() {
        let (mut track, _, b_id) = make_test_track();
        let mut history = History::new(2);
        for secs in [9.0, 10.0, 11.0] {
            history
                .execute(Box::new(MoveClipCommand::new(b_id, TimeUs::from_seconds(secs))), &mut track)
                .unwrap();
        }
        history.undo(&mut track).unwrap();
        history.undo(&mut track).unwrap();
        assert!(matches!(history.undo(&mut track), Err(CoreError::NothingToUndo)));
        assert_eq!(track.get(b_id).unwrap().start, TimeUs::from_seconds(9.0));
    }
}
