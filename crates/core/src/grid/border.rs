//! Border completion: every region gets a usable outer frame.
//!
//! For each orientation the first and last line are checked against the
//! region edges. A missing edge line is synthesized on the edge; an edge
//! line whose span falls short of the region is replaced by a full-span
//! one. Borderless tables therefore still consolidate into a grid.

use std::cmp::Ordering;

use tracing::trace;

use crate::geometry::{Axis, LineOrigin, Rect, Ruling, nearly_equal};

use super::lines::RegionLines;

/// Complete the frame of `lines` in place. Returns how many border lines
/// were synthesized.
pub fn complete_borders(lines: &mut RegionLines, region: &Rect, tolerance: f64) -> usize {
    let mut synthesized = 0;
    for axis in [Axis::Y, Axis::X] {
        synthesized += complete_axis(lines.lines_mut(axis.boundary()), region, axis, tolerance);
    }
    synthesized
}

fn complete_axis(lines: &mut Vec<Ruling>, region: &Rect, axis: Axis, tolerance: f64) -> usize {
    let lo_edge = Ruling::rect_edge(region, axis, false).with_origin(LineOrigin::Border);
    let hi_edge = Ruling::rect_edge(region, axis, true).with_origin(LineOrigin::Border);
    let full = region.extent(axis.cross());

    let Some(first) = lines.first().copied() else {
        lines.push(lo_edge);
        lines.push(hi_edge);
        trace!(?axis, "no rulings, synthesized both borders");
        return 2;
    };

    let mut synthesized = 0;
    if !nearly_equal(first.position, region.lo(axis), tolerance) {
        insert_sorted(lines, lo_edge);
        synthesized += 1;
    } else if !nearly_equal(first.length(), full, tolerance) {
        lines.remove(0);
        insert_sorted(lines, lo_edge);
        synthesized += 1;
    }

    let last_idx = lines.len() - 1;
    let last = lines[last_idx];
    if !nearly_equal(last.position, region.hi(axis), tolerance) {
        insert_sorted(lines, hi_edge);
        synthesized += 1;
    } else if !nearly_equal(last.length(), full, tolerance) {
        lines.remove(last_idx);
        insert_sorted(lines, hi_edge);
        synthesized += 1;
    }
    synthesized
}

/// Lines stay sorted by position even when a source line lies just outside
/// the region edge.
fn insert_sorted(lines: &mut Vec<Ruling>, line: Ruling) {
    let at = lines.partition_point(|l| l.position_order(&line) == Ordering::Less);
    lines.insert(at, line);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> Rect {
        Rect::new(0.0, 0.0, 300.0, 100.0)
    }

    #[test]
    fn test_empty_region_gets_full_frame() {
        let mut lines = RegionLines::default();
        assert_eq!(complete_borders(&mut lines, &region(), 2.5), 4);
        let h: Vec<f64> = lines.horizontal.iter().map(|r| r.position).collect();
        let v: Vec<f64> = lines.vertical.iter().map(|r| r.position).collect();
        assert_eq!(h, vec![0.0, 100.0]);
        assert_eq!(v, vec![0.0, 300.0]);
        assert!(
            lines
                .horizontal
                .iter()
                .all(|r| r.start == 0.0 && r.end == 300.0 && r.origin == LineOrigin::Border)
        );
    }

    #[test]
    fn test_missing_right_border_is_synthesized() {
        let mut lines = RegionLines::from_rulings(
            &region(),
            [
                Ruling::horizontal(0.0, 0.0, 300.0),
                Ruling::horizontal(100.0, 0.0, 300.0),
                Ruling::vertical(0.0, 0.0, 100.0),
                Ruling::vertical(150.0, 0.0, 100.0),
            ],
        );
        assert_eq!(complete_borders(&mut lines, &region(), 2.5), 1);
        let v: Vec<f64> = lines.vertical.iter().map(|r| r.position).collect();
        assert_eq!(v, vec![0.0, 150.0, 300.0]);
        assert_eq!(lines.vertical[2].origin, LineOrigin::Border);
    }

    #[test]
    fn test_short_edge_line_is_replaced() {
        let mut lines = RegionLines::from_rulings(
            &region(),
            [
                Ruling::horizontal(1.0, 0.0, 120.0),
                Ruling::horizontal(99.0, 0.0, 299.0),
            ],
        );
        assert_eq!(complete_borders(&mut lines, &region(), 2.5), 3);
        assert_eq!(lines.horizontal.len(), 2);
        assert_eq!(lines.horizontal[0].position, 0.0);
        assert_eq!(lines.horizontal[0].end, 300.0);
        // Near-complete bottom line is kept as drawn.
        assert_eq!(lines.horizontal[1].position, 99.0);
        assert_eq!(lines.horizontal[1].origin, LineOrigin::Source);
    }

    #[test]
    fn test_edge_outside_region_keeps_order() {
        let mut lines = RegionLines::from_rulings(
            &region(),
            [
                Ruling::horizontal(-0.8, 0.0, 300.0),
                Ruling::horizontal(50.0, 0.0, 300.0),
                Ruling::horizontal(100.8, 0.0, 300.0),
            ],
        );
        assert_eq!(complete_borders(&mut lines, &region(), 0.5), 4);
        let h: Vec<f64> = lines.horizontal.iter().map(|r| r.position).collect();
        assert_eq!(h, vec![-0.8, 0.0, 50.0, 100.0, 100.8]);
    }
}
