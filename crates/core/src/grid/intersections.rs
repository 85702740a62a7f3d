//! Grid intersection: line crossings and the cells they enclose.
//!
//! Crossings are found with a sweep over y: vertical lines enter the
//! active set at their top and leave at their bottom (both widened by the
//! tolerance), and each horizontal line queries the active verticals inside
//! its x range. Cells are then walked corner to corner; a cell is only
//! emitted when all four of its sides are backed by actual segments, so an
//! interrupted interior line yields one wide cell instead of two halves.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::geometry::{Rect, Ruling};

use super::types::{KeyF64, KeyPoint, key_f64, key_point};

/// Index of a vertical line in [`LineStore::v`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct VLineId(pub usize);

/// Index of a horizontal line in [`LineStore::h`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct HLineId(pub usize);

/// Lines participating in the sweep, in sweep order.
pub(crate) struct LineStore {
    pub v: Vec<Ruling>,
    pub h: Vec<Ruling>,
}

/// Lines meeting at one crossing point.
#[derive(Clone, Debug, Default)]
pub(crate) struct Crossing {
    pub v: SmallVec<[VLineId; 2]>,
    pub h: SmallVec<[HLineId; 2]>,
}

/// Find every crossing between `horizontal` and `vertical` lines.
pub(crate) fn find_crossings(
    horizontal: &[Ruling],
    vertical: &[Ruling],
    tolerance: f64,
) -> (LineStore, FxHashMap<KeyPoint, Crossing>) {
    enum EventKind {
        AddV,
        QueryH,
        RemoveV,
    }

    struct Event {
        y: f64,
        kind: EventKind,
        idx: usize,
    }

    let mut v_sorted = vertical.to_vec();
    let mut h_sorted = horizontal.to_vec();
    v_sorted.sort_by(|a, b| a.position_order(b));
    h_sorted.sort_by(|a, b| a.position_order(b));

    let mut events = Vec::with_capacity(v_sorted.len() * 2 + h_sorted.len());
    for (idx, v) in v_sorted.iter().enumerate() {
        events.push(Event {
            y: v.start - tolerance,
            kind: EventKind::AddV,
            idx,
        });
        events.push(Event {
            y: v.end + tolerance,
            kind: EventKind::RemoveV,
            idx,
        });
    }
    for (idx, h) in h_sorted.iter().enumerate() {
        events.push(Event {
            y: h.position,
            kind: EventKind::QueryH,
            idx,
        });
    }

    let kind_order = |kind: &EventKind| match kind {
        EventKind::AddV => 0,
        EventKind::QueryH => 1,
        EventKind::RemoveV => 2,
    };
    events.sort_by(|a, b| {
        a.y.total_cmp(&b.y)
            .then(kind_order(&a.kind).cmp(&kind_order(&b.kind)))
            .then(a.idx.cmp(&b.idx))
    });

    let mut active: BTreeMap<KeyF64, SmallVec<[usize; 4]>> = BTreeMap::new();
    let mut crossings: FxHashMap<KeyPoint, Crossing> = FxHashMap::default();

    for event in events {
        match event.kind {
            EventKind::AddV => {
                let v = &v_sorted[event.idx];
                active.entry(key_f64(v.position)).or_default().push(event.idx);
            }
            EventKind::RemoveV => {
                let key = key_f64(v_sorted[event.idx].position);
                if let Some(bucket) = active.get_mut(&key) {
                    bucket.retain(|idx| *idx != event.idx);
                    if bucket.is_empty() {
                        active.remove(&key);
                    }
                }
            }
            EventKind::QueryH => {
                let h = &h_sorted[event.idx];
                let x_min = key_f64(h.start - tolerance);
                let x_max = key_f64(h.end + tolerance);
                for (_x, bucket) in active.range(x_min..=x_max) {
                    for &v_idx in bucket {
                        let v = &v_sorted[v_idx];
                        if v.start <= h.position + tolerance && v.end >= h.position - tolerance {
                            let crossing = crossings.entry(key_point(v.position, h.position)).or_default();
                            crossing.v.push(VLineId(v_idx));
                            crossing.h.push(HLineId(event.idx));
                        }
                    }
                }
            }
        }
    }

    for crossing in crossings.values_mut() {
        crossing.v.sort();
        crossing.v.dedup();
        crossing.h.sort();
        crossing.h.dedup();
    }

    (
        LineStore {
            v: v_sorted,
            h: h_sorted,
        },
        crossings,
    )
}

fn sorted_lists_intersect<T: Ord>(a: &[T], b: &[T]) -> bool {
    let mut i = 0usize;
    let mut j = 0usize;
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Equal => return true,
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
        }
    }
    false
}

/// Walk crossings into cells.
///
/// From every crossing, try the crossings below it on a shared vertical
/// line (nearest first) against those to its right on a shared horizontal
/// line; the first pair whose bottom-right corner exists and connects back
/// to both along real segments closes a cell.
pub(crate) fn crossings_to_cells(
    store: &LineStore,
    crossings: &FxHashMap<KeyPoint, Crossing>,
) -> Vec<Rect> {
    let mut points: Vec<KeyPoint> = crossings.keys().copied().collect();
    points.sort();

    let point_index: FxHashMap<KeyPoint, usize> =
        points.iter().enumerate().map(|(idx, p)| (*p, idx)).collect();

    let mut points_on_v: Vec<Vec<usize>> = vec![Vec::new(); store.v.len()];
    let mut points_on_h: Vec<Vec<usize>> = vec![Vec::new(); store.h.len()];
    for (pid, point) in points.iter().enumerate() {
        let crossing = &crossings[point];
        for id in &crossing.v {
            points_on_v[id.0].push(pid);
        }
        for id in &crossing.h {
            points_on_h[id.0].push(pid);
        }
    }
    for pids in &mut points_on_v {
        pids.sort_by(|a, b| points[*a].1.cmp(&points[*b].1));
        pids.dedup();
    }
    for pids in &mut points_on_h {
        pids.sort_by(|a, b| points[*a].0.cmp(&points[*b].0));
        pids.dedup();
    }

    let connects = |p1: usize, p2: usize| -> bool {
        let (a, b) = (&crossings[&points[p1]], &crossings[&points[p2]]);
        if points[p1].0 == points[p2].0 {
            return sorted_lists_intersect(&a.v, &b.v);
        }
        if points[p1].1 == points[p2].1 {
            return sorted_lists_intersect(&a.h, &b.h);
        }
        false
    };

    let mut cells = Vec::new();
    for (idx, point) in points.iter().enumerate() {
        let crossing = &crossings[point];

        let mut below: Vec<usize> = Vec::new();
        for id in &crossing.v {
            let on_line = &points_on_v[id.0];
            if let Ok(pos) = on_line.binary_search_by(|pid| points[*pid].1.cmp(&point.1)) {
                below.extend(on_line[pos + 1..].iter().copied());
            }
        }
        below.sort_by(|a, b| points[*a].1.cmp(&points[*b].1).then(a.cmp(b)));
        below.dedup();

        let mut right: Vec<usize> = Vec::new();
        for id in &crossing.h {
            let on_line = &points_on_h[id.0];
            if let Ok(pos) = on_line.binary_search_by(|pid| points[*pid].0.cmp(&point.0)) {
                right.extend(on_line[pos + 1..].iter().copied());
            }
        }
        right.sort_by(|a, b| points[*a].0.cmp(&points[*b].0).then(a.cmp(b)));
        right.dedup();

        'below: for &below_id in &below {
            if !connects(idx, below_id) {
                continue;
            }
            for &right_id in &right {
                if !connects(idx, right_id) {
                    continue;
                }
                let corner = (points[right_id].0, points[below_id].1);
                if let Some(&corner_id) = point_index.get(&corner)
                    && connects(corner_id, right_id)
                    && connects(corner_id, below_id)
                {
                    cells.push(Rect::from_edges(
                        point.0.into_inner(),
                        point.1.into_inner(),
                        corner.0.into_inner(),
                        corner.1.into_inner(),
                    ));
                    break 'below;
                }
            }
        }
    }
    cells
}

/// Cells enclosed by `horizontal` and `vertical` lines.
pub fn grid_cells(horizontal: &[Ruling], vertical: &[Ruling], tolerance: f64) -> Vec<Rect> {
    let (store, crossings) = find_crossings(horizontal, vertical, tolerance);
    crossings_to_cells(&store, &crossings)
}
