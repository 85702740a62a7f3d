//! Line consolidation and the first-pass grid.
//!
//! Near-collinear fragments are merged into single logical lines, the outer
//! frame is reconciled with where the crossing lines actually end, touching
//! collinear pieces are joined, and the result is intersected into cells.

use std::collections::BTreeMap;

use tracing::debug;

use crate::geometry::{Axis, LineOrigin, Rect, Ruling, interval_overlap};
use crate::tolerance::ToleranceProfile;

use super::intersections::grid_cells;
use super::lines::RegionLines;
use super::types::key_f64;

/// Consolidated lines of one region, sorted by position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConsolidatedLines {
    pub horizontal: Vec<Ruling>,
    pub vertical: Vec<Ruling>,
}

fn merge_pair(a: &Ruling, b: &Ruling) -> Ruling {
    Ruling {
        orientation: a.orientation,
        position: (a.position + b.position) / 2.0,
        start: a.start.min(b.start),
        end: a.end.max(b.end),
        origin: LineOrigin::Merged,
    }
}

/// Fold `lines` (in index order) into `seed`, merging each line into the
/// last kept one when `mergeable` says so.
fn merge_collinear<F>(seed: Ruling, lines: &[Ruling], min_length: f64, mergeable: F) -> Vec<Ruling>
where
    F: Fn(&Ruling, &Ruling) -> bool,
{
    let mut merged = vec![seed];
    for line in lines.iter().filter(|l| l.length() > min_length) {
        match merged.last_mut() {
            Some(last) if mergeable(last, line) => *last = merge_pair(last, line),
            _ => merged.push(*line),
        }
    }
    merged.sort_by(|a, b| a.position_order(b));
    merged
}

/// Merge the region's fragments into logical lines.
pub fn merge_lines(region: &Rect, lines: &RegionLines, profile: &ToleranceProfile) -> ConsolidatedLines {
    let horizontal = merge_collinear(
        Ruling::rect_edge(region, Axis::Y, false).with_origin(LineOrigin::Border),
        &lines.horizontal,
        profile.min_segment_length,
        |a, b| {
            (a.position - b.position).abs() < profile.h_merge
                && interval_overlap(a.start, a.end, b.start, b.end) > 0.0
        },
    );
    let vertical = merge_collinear(
        Ruling::rect_edge(region, Axis::X, false).with_origin(LineOrigin::Border),
        &lines.vertical,
        profile.min_segment_length,
        |a, b| {
            (a.position - b.position).abs() < profile.v_merge
                && b.start - a.end <= profile.v_merge_gap
                && a.span_overlap_ratio(b) > profile.v_merge_overlap
        },
    );
    ConsolidatedLines {
        horizontal,
        vertical,
    }
}

/// Snap the outermost lines to where the crossing lines really end.
///
/// The first vertical moves to the innermost left end among horizontals
/// starting within `frame_x` of it, the last vertical to the innermost right
/// end; the first and last horizontals likewise against the verticals'
/// spans with `frame_y`.
pub fn correct_border_lines(lines: &mut ConsolidatedLines, frame_x: f64, frame_y: f64) {
    if lines.horizontal.len() < 2 || lines.vertical.len() < 2 {
        return;
    }
    snap_outer(&mut lines.vertical, &lines.horizontal, frame_x);
    snap_outer(&mut lines.horizontal, &lines.vertical, frame_y);
}

fn snap_outer(outer: &mut [Ruling], crossing: &[Ruling], reach: f64) {
    let first = outer[0].position;
    let inner_start = crossing
        .iter()
        .filter(|l| (l.start - first).abs() < reach)
        .map(|l| l.start)
        .max_by(|a, b| a.total_cmp(b));
    if let Some(start) = inner_start {
        outer[0].position = start;
    }

    let last_idx = outer.len() - 1;
    let last = outer[last_idx].position;
    let inner_end = crossing
        .iter()
        .filter(|l| (l.end - last).abs() < reach)
        .map(|l| l.end)
        .min_by(|a, b| a.total_cmp(b));
    if let Some(end) = inner_end {
        outer[last_idx].position = end;
    }
}

/// Join collinear pieces at the same position whose spans touch within
/// `tolerance`.
pub fn join_collinear(lines: &[Ruling], tolerance: f64) -> Vec<Ruling> {
    let mut grouped: BTreeMap<_, Vec<Ruling>> = BTreeMap::new();
    for line in lines {
        grouped.entry(key_f64(line.position)).or_default().push(*line);
    }

    let mut joined: Vec<Ruling> = Vec::with_capacity(lines.len());
    for (_, mut group) in grouped {
        group.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.end.total_cmp(&b.end)));
        let first_of_group = joined.len();
        for line in group {
            let in_group = joined.len() > first_of_group;
            match joined.last_mut() {
                Some(last) if in_group && line.start <= last.end + tolerance => {
                    if line.end > last.end {
                        last.end = line.end;
                    }
                }
                _ => joined.push(line),
            }
        }
    }
    joined
}

/// Full consolidation of one region into candidate cells.
///
/// Cells narrower than `min_cell_width` or shorter than `min_cell_height`
/// are dropped.
pub fn fill_cells_by_lines(region: &Rect, lines: &RegionLines, profile: &ToleranceProfile) -> Vec<Rect> {
    let mut consolidated = merge_lines(region, lines, profile);
    correct_border_lines(&mut consolidated, profile.frame_x, profile.frame_y);
    let horizontal = join_collinear(&consolidated.horizontal, profile.intersection);
    let vertical = join_collinear(&consolidated.vertical, profile.intersection);

    let cells: Vec<Rect> = grid_cells(&horizontal, &vertical, profile.intersection)
        .into_iter()
        .filter(|c| c.width >= profile.min_cell_width && c.height >= profile.min_cell_height)
        .collect();
    debug!(
        horizontal = horizontal.len(),
        vertical = vertical.len(),
        cells = cells.len(),
        "consolidated region lines"
    );
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::border::complete_borders;

    fn lines_for(region: &Rect, rulings: Vec<Ruling>) -> RegionLines {
        let mut lines = RegionLines::from_rulings(region, rulings);
        complete_borders(&mut lines, region, 2.5);
        lines
    }

    #[test]
    fn test_close_horizontals_merge_at_midpoint() {
        let region = Rect::new(0.0, 0.0, 200.0, 100.0);
        let lines = lines_for(
            &region,
            vec![
                Ruling::horizontal(48.0, 0.0, 120.0),
                Ruling::horizontal(51.0, 80.0, 200.0),
            ],
        );
        let merged = merge_lines(&region, &lines, &ToleranceProfile::default());
        let ys: Vec<f64> = merged.horizontal.iter().map(|r| r.position).collect();
        assert_eq!(ys, vec![0.0, 49.5, 100.0]);
        assert_eq!((merged.horizontal[1].start, merged.horizontal[1].end), (0.0, 200.0));
    }

    #[test]
    fn test_disjoint_spans_do_not_merge() {
        let region = Rect::new(0.0, 0.0, 200.0, 100.0);
        let lines = lines_for(
            &region,
            vec![
                Ruling::horizontal(50.0, 0.0, 80.0),
                Ruling::horizontal(52.0, 120.0, 200.0),
            ],
        );
        let merged = merge_lines(&region, &lines, &ToleranceProfile::default());
        assert_eq!(merged.horizontal.len(), 4);
    }

    #[test]
    fn test_short_fragments_dropped() {
        let region = Rect::new(0.0, 0.0, 200.0, 100.0);
        let lines = lines_for(&region, vec![Ruling::vertical(90.0, 40.0, 44.0)]);
        let merged = merge_lines(&region, &lines, &ToleranceProfile::default());
        let xs: Vec<f64> = merged.vertical.iter().map(|r| r.position).collect();
        assert_eq!(xs, vec![0.0, 200.0]);
    }

    #[test]
    fn test_vertical_merge_needs_span_overlap() {
        let region = Rect::new(0.0, 0.0, 200.0, 100.0);
        let lines = lines_for(
            &region,
            vec![
                Ruling::vertical(100.0, 0.0, 100.0),
                Ruling::vertical(102.0, 0.0, 95.0),
                Ruling::vertical(150.0, 0.0, 40.0),
                Ruling::vertical(152.0, 60.0, 100.0),
            ],
        );
        let merged = merge_lines(&region, &lines, &ToleranceProfile::default());
        let xs: Vec<f64> = merged.vertical.iter().map(|r| r.position).collect();
        assert_eq!(xs, vec![0.0, 101.0, 150.0, 152.0, 200.0]);
    }

    #[test]
    fn test_correct_border_lines_pulls_frame_inward() {
        let mut lines = ConsolidatedLines {
            horizontal: vec![
                Ruling::horizontal(0.0, 2.0, 198.0),
                Ruling::horizontal(100.0, 1.0, 199.0),
            ],
            vertical: vec![
                Ruling::vertical(0.0, 1.0, 100.0),
                Ruling::vertical(200.0, 0.0, 99.0),
            ],
        };
        correct_border_lines(&mut lines, 7.0, 8.4);
        assert_eq!(lines.vertical[0].position, 2.0);
        assert_eq!(lines.vertical[1].position, 198.0);
        assert_eq!(lines.horizontal[0].position, 1.0);
        assert_eq!(lines.horizontal[1].position, 99.0);
    }

    #[test]
    fn test_join_collinear_touching_pieces() {
        let joined = join_collinear(
            &[
                Ruling::horizontal(50.0, 100.0, 200.0),
                Ruling::horizontal(50.0, 0.0, 99.0),
                Ruling::horizontal(80.0, 0.0, 40.0),
                Ruling::horizontal(80.0, 60.0, 100.0),
            ],
            3.0,
        );
        let spans: Vec<(f64, f64, f64)> = joined.iter().map(|r| (r.position, r.start, r.end)).collect();
        assert_eq!(spans, vec![(50.0, 0.0, 200.0), (80.0, 0.0, 40.0), (80.0, 60.0, 100.0)]);
    }

    #[test]
    fn test_fill_cells_for_borderless_region() {
        let region = Rect::new(10.0, 10.0, 120.0, 60.0);
        let lines = lines_for(&region, vec![]);
        let cells = fill_cells_by_lines(&region, &lines, &ToleranceProfile::default());
        assert_eq!(cells, vec![region]);
    }

    #[test]
    fn test_fill_cells_for_partial_grid() {
        let region = Rect::new(0.0, 0.0, 300.0, 100.0);
        let lines = lines_for(
            &region,
            vec![
                Ruling::horizontal(0.0, 0.0, 300.0),
                Ruling::horizontal(50.0, 0.0, 300.0),
                Ruling::horizontal(100.0, 0.0, 300.0),
                Ruling::vertical(0.0, 0.0, 100.0),
                Ruling::vertical(150.0, 0.0, 100.0),
            ],
        );
        let mut cells = fill_cells_by_lines(&region, &lines, &ToleranceProfile::default());
        cells.sort_by(|a, b| a.reading_order(b));
        assert_eq!(
            cells,
            vec![
                Rect::new(0.0, 0.0, 150.0, 50.0),
                Rect::new(150.0, 0.0, 150.0, 50.0),
                Rect::new(0.0, 50.0, 150.0, 50.0),
                Rect::new(150.0, 50.0, 150.0, 50.0),
            ]
        );
    }
}
