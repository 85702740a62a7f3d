//! Coverage repair after the disjointness pass.
//!
//! The part of the region no cell covers is cut along every cell edge and
//! merged back into rectangles. A hole thinner than `adjacency` is slack
//! between neighbours and widens the cells bordering it, the way bridging
//! widens a base across a noise gap; one thin both ways is left alone. A
//! larger hole is consolidated on its own and falls back to one synthesized
//! cell when its lines do not tile it.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::arena::{Cell, CellArena, CellId, Edit};
use crate::geometry::{Axis, Rect, nearly_equal, within};

use super::border::complete_borders;
use super::consolidate::fill_cells_by_lines;
use super::gapfill::GapContext;

/// Hole edges are copied from cell edges, so neighbours match exactly.
const EDGE_EPS: f64 = 1e-6;

/// Share of a hole its consolidated cells must cover to be used as is.
const TILE_COVERAGE: f64 = 0.99;

/// Rectangles of `region` covered by none of `cells`.
///
/// The region is cut along every cell edge inside it. Free pieces are merged
/// greedily: along x first, then down while the whole run stays free.
pub(crate) fn uncovered(region: &Rect, cells: &[Rect]) -> Vec<Rect> {
    let xs = cut_points(region, Axis::X, cells);
    let ys = cut_points(region, Axis::Y, cells);
    let (nx, ny) = (xs.len() - 1, ys.len() - 1);

    let mut free = vec![false; nx * ny];
    for j in 0..ny {
        let cy = (ys[j] + ys[j + 1]) / 2.0;
        for i in 0..nx {
            let cx = (xs[i] + xs[i + 1]) / 2.0;
            free[j * nx + i] = !cells
                .iter()
                .any(|c| c.left < cx && cx < c.right() && c.top < cy && cy < c.bottom());
        }
    }

    let mut holes = Vec::new();
    for j in 0..ny {
        for i in 0..nx {
            if !free[j * nx + i] {
                continue;
            }
            let mut i_end = i + 1;
            while i_end < nx && free[j * nx + i_end] {
                i_end += 1;
            }
            let mut j_end = j + 1;
            while j_end < ny && (i..i_end).all(|k| free[j_end * nx + k]) {
                j_end += 1;
            }
            for row in j..j_end {
                free[row * nx + i..row * nx + i_end].fill(false);
            }
            holes.push(Rect::from_edges(xs[i], ys[j], xs[i_end], ys[j_end]));
        }
    }
    holes
}

/// Region edges plus every cell edge strictly inside the region, sorted.
fn cut_points(region: &Rect, axis: Axis, cells: &[Rect]) -> Vec<f64> {
    let (lo, hi) = (region.lo(axis), region.hi(axis));
    let mut points: Vec<f64> = cells
        .iter()
        .flat_map(|c| [c.lo(axis), c.hi(axis)])
        .filter(|v| *v > lo && *v < hi)
        .collect();
    points.push(lo);
    points.push(hi);
    points.sort_by(|a, b| a.total_cmp(b));
    points.dedup();
    points
}

/// Edits covering what the live cells of `arena` leave open.
pub(crate) fn coverage_edits(arena: &CellArena, ctx: &GapContext<'_>) -> Vec<Edit> {
    let cells: Vec<(CellId, Rect)> = arena.iter().map(|(id, c)| (id, c.rect)).collect();
    if cells.is_empty() {
        return vec![Edit::Insert(Cell::ruling(*ctx.region))];
    }
    let rects: Vec<Rect> = cells.iter().map(|(_, r)| *r).collect();
    let holes = uncovered(ctx.region, &rects);

    let mut widened: FxHashMap<CellId, Rect> = FxHashMap::default();
    let mut edits = Vec::new();
    let adjacency = ctx.profile.adjacency;
    for hole in &holes {
        if hole.width < adjacency && hole.height < adjacency {
            // Corner slack where thin gaps cross.
            continue;
        }
        if hole.width < adjacency || hole.height < adjacency {
            absorb(&cells, hole, &mut widened);
        } else {
            edits.extend(fill_hole(ctx, hole).into_iter().map(Edit::Insert));
        }
    }
    if !holes.is_empty() {
        debug!(
            holes = holes.len(),
            widened = widened.len(),
            inserted = edits.len(),
            "repaired coverage"
        );
    }

    let mut replaced: Vec<(CellId, Rect)> = widened.into_iter().collect();
    replaced.sort_by_key(|(id, _)| *id);
    edits.extend(replaced.into_iter().map(|(id, r)| Edit::Replace(id, r)));
    edits
}

/// Stretch the cells bordering a thin hole across it, along the hole's thin
/// axis. The side whose cells cover more of the hole wins, the low side on a
/// tie; a cell is stretched at most once.
fn absorb(cells: &[(CellId, Rect)], hole: &Rect, widened: &mut FxHashMap<CellId, Rect>) {
    let axis = if hole.width <= hole.height { Axis::X } else { Axis::Y };
    let cross = axis.cross();
    let fits = |r: &Rect| within(hole.lo(cross), r.lo(cross), EDGE_EPS) && within(r.hi(cross), hole.hi(cross), EDGE_EPS);

    let before: Vec<(CellId, Rect)> = cells
        .iter()
        .filter(|(id, r)| !widened.contains_key(id) && fits(r) && nearly_equal(r.hi(axis), hole.lo(axis), EDGE_EPS))
        .map(|(id, r)| (*id, r.with_span(axis, r.lo(axis), hole.hi(axis))))
        .collect();
    let after: Vec<(CellId, Rect)> = cells
        .iter()
        .filter(|(id, r)| !widened.contains_key(id) && fits(r) && nearly_equal(r.lo(axis), hole.hi(axis), EDGE_EPS))
        .map(|(id, r)| (*id, r.with_span(axis, hole.lo(axis), r.hi(axis))))
        .collect();
    let span = |side: &[(CellId, Rect)]| side.iter().map(|(_, r)| r.extent(cross)).sum::<f64>();
    let stretched = if span(&after) > span(&before) { after } else { before };
    if stretched.is_empty() {
        debug!(?hole, "no neighbour to absorb hole");
    }
    widened.extend(stretched);
}

/// Cells for a hole large enough to hold one: its own consolidated grid when
/// that tiles it, otherwise the hole itself.
fn fill_hole(ctx: &GapContext<'_>, hole: &Rect) -> Vec<Cell> {
    let p = ctx.profile;
    let mut lines = ctx.lines.clipped_to(hole);
    complete_borders(&mut lines, hole, p.border);
    let pieces: Vec<Rect> = fill_cells_by_lines(hole, &lines, p)
        .iter()
        .filter_map(|r| r.intersection(hole))
        .collect();

    let area: f64 = pieces.iter().map(Rect::area).sum();
    let disjoint = pieces
        .iter()
        .enumerate()
        .all(|(i, a)| pieces[i + 1..].iter().all(|b| a.overlap_ratio(b) < p.overlap_limit));
    if !pieces.is_empty() && disjoint && area >= TILE_COVERAGE * hole.area() {
        pieces.into_iter().map(Cell::ruling).collect()
    } else {
        vec![Cell::synthesized(*hole)]
    }
}
