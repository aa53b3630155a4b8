use crate::editing::VideoTrack;
use crate::types::*;
use uuid::Uuid;

/// Find the nearest snap point within the threshold.
/// Returns the snapped position if within threshold, otherwise the original position.
pub fn find_snap_point(position: TimeUs, snap_points: &[TimeUs], threshold: TimeUs) -> TimeUs {
    snap_points
        .iter()
        .map(|&point| (point, position.0.abs_diff(point.0)))
        .filter(|&(_, dist)| dist <= threshold.max_zero().0.unsigned_abs())
        .min_by_key(|&(_, dist)| dist)
        .map(|(point, _)| point)
        .unwrap_or(position)
}

/// Collect snap points from the video track: zero, the cursor and every clip
/// edge except those of `exclude_clip_id`.
pub fn collect_snap_points(
    track: &VideoTrack,
    cursor: TimeUs,
    exclude_clip_id: Option<Uuid>,
) -> Vec<TimeUs> {
    let mut points = vec![TimeUs::ZERO, cursor];

    for clip in track.clips() {
        if Some(clip.id) == exclude_clip_id {
            continue;
        }
        points.push(clip.start);
        points.push(clip.end);
    }

    points.sort();
    points.dedup();
    points
}

/// Snap a clip move so either edge of the moved clip lands on a snap point.
/// The edge closer to its snap point wins; the start edge wins ties.
pub fn snap_clip_start(
    track: &VideoTrack,
    clip_id: Uuid,
    proposed_start: TimeUs,
    cursor: TimeUs,
    threshold: TimeUs,
) -> TimeUs {
    let Some(clip) = track.get(clip_id) else {
        return proposed_start;
    };
    let duration = clip.local_duration();
    let points = collect_snap_points(track, cursor, Some(clip_id));

    let by_start = find_snap_point(proposed_start, &points, threshold);
    let proposed_end = proposed_start.saturating_add(duration);
    let by_end = find_snap_point(proposed_end, &points, threshold);

    let start_dist = by_start.0.abs_diff(proposed_start.0);
    let end_dist = by_end.0.abs_diff(proposed_end.0);
    match (by_start != proposed_start, by_end != proposed_end) {
        (true, true) if end_dist < start_dist => by_end - duration,
        (true, _) => by_start,
        (false, true) => by_end - duration,
        (false, false) => proposed_start,
    }
    .max_zero()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_clip(start_us: i64, end_us: i64) -> Clip {
        Clip {
            id: Uuid::new_v4(),
            kind: ClipKind::Video,
            media_ref: MediaRef::from("clip.mp4"),
            name: "clip".to_string(),
            start: TimeUs(start_us),
            end: TimeUs(end_us),
            overlay: None,
        }
    }

    fn make_track(clips: Vec<Clip>) -> VideoTrack {
        let mut track = VideoTrack::default();
        track.replace_all(clips).unwrap();
        track
    }

    #[test]
    fn snap_to_nearest_point() {
        let points = vec![TimeUs(0), TimeUs(1_000_000), TimeUs(5_000_000)];
        let result = find_snap_point(TimeUs(1_100_000), &points, TimeUs(200_000));
        assert_eq!(result, TimeUs(1_000_000));
    }

    #[test]
    fn no_snap_beyond_threshold() {
        let points = vec![TimeUs(0), TimeUs(1_000_000), TimeUs(5_000_000)];
        let result = find_snap_point(TimeUs(3_000_000), &points, TimeUs(200_000));
        assert_eq!(result, TimeUs(3_000_000));
    }

    #[test]
    fn empty_snap_points_returns_original() {
        let result = find_snap_point(TimeUs(2_000_000), &[], TimeUs(500_000));
        assert_eq!(result, TimeUs(2_000_000));
    }

    #[test]
    fn snap_to_closest_of_two() {
        let points = vec![TimeUs(1_000_000), TimeUs(2_000_000)];
        let threshold = TimeUs(600_000);

        // 400k from 1M, 600k from 2M
        assert_eq!(find_snap_point(TimeUs(1_400_000), &points, threshold), TimeUs(1_000_000));
        // 700k from 1M (beyond threshold), 300k from 2M
        assert_eq!(find_snap_point(TimeUs(1_700_000), &points, threshold), TimeUs(2_000_000));
    }

    #[test]
    fn collect_includes_cursor_and_excludes_clip() {
        let moving = make_clip(1_000_000, 3_000_000);
        let other = make_clip(5_000_000, 6_000_000);
        let moving_id = moving.id;
        let track = make_track(vec![moving, other]);

        let points = collect_snap_points(&track, TimeUs(4_200_000), Some(moving_id));
        assert_eq!(
            points,
            vec![TimeUs(0), TimeUs(4_200_000), TimeUs(5_000_000), TimeUs(6_000_000)]
        );
    }

    #[test]
    fn clip_end_snaps_to_neighbour_start() {
        let moving = make_clip(0, 2_000_000);
        let other = make_clip(5_000_000, 6_000_000);
        let moving_id = moving.id;
        let track = make_track(vec![moving, other]);

        // end would land at 4.95s, 50ms short of the neighbour
        let start = snap_clip_start(&track, moving_id, TimeUs(2_950_000), TimeUs::ZERO, TimeUs(100_000));
        assert_eq!(start, TimeUs(3_000_000));
    }

    #[test]
    fn extreme_proposals_do_not_overflow() {
        let moving = make_clip(0, 1_000_000);
        let id = moving.id;
        let track = make_track(vec![moving]);
        let threshold = TimeUs(100_000);
        assert_eq!(
            snap_clip_start(&track, id, TimeUs(i64::MAX), TimeUs::ZERO, threshold),
            TimeUs(i64::MAX)
        );
        assert_eq!(
            snap_clip_start(&track, id, TimeUs(i64::MIN), TimeUs::ZERO, threshold),
            TimeUs::ZERO
        );
    }

    #[test]
    fn unknown_clip_is_not_snapped() {
        let track = make_track(vec![make_clip(0, 1_000_000)]);
        let start = snap_clip_start(&track, Uuid::new_v4(), TimeUs(1_050_000), TimeUs::ZERO, TimeUs(100_000));
        assert_eq!(start, TimeUs(1_050_000));
    }
}
