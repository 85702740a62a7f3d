//! Bridging the gap between two neighbouring cells of a band.

use tracing::trace;

use crate::arena::{Cell, CellId, Edit};
use crate::geometry::{Axis, Rect, Ruling, within, nearly_equal};

use super::border::complete_borders;
use super::consolidate::fill_cells_by_lines;
use super::direction::{Direction, Side, Sign};
use super::gapfill::{GapContext, fill_toward, separated_cell};

/// Edits closing the gap along `axis` between `base` and the later `next`.
///
/// Cells adjacent within the profile's adjacency tolerance need nothing.
pub(crate) fn bridge(
    ctx: &GapContext<'_>,
    axis: Axis,
    (base_id, base): (CellId, &Rect),
    (next_id, next): (CellId, &Rect),
) -> Vec<Edit> {
    let p = ctx.profile;
    let cross = axis.cross();
    let gap_lo = base.hi(axis);
    let gap_hi = next.lo(axis);
    if gap_hi - gap_lo < p.adjacency {
        return Vec::new();
    }
    let anchor = base.lo(cross);
    let boundaries = ctx.lines.boundaries(axis);

    let dividers: Vec<&Ruling> = boundaries
        .iter()
        .filter(|l| {
            l.position >= gap_lo
                && l.position <= gap_hi
                && within(l.start, anchor, p.endpoint)
                && l.length() >= p.metrics.avg_char_width
        })
        .collect();
    if let [divider] = dividers.as_slice() {
        trace!(?axis, position = divider.position, "cells meet on divider");
        return vec![
            Edit::Replace(base_id, base.with_span(axis, base.lo(axis), divider.position)),
            Edit::Replace(next_id, next.with_span(axis, divider.position, next.hi(axis))),
        ];
    }

    let mut inner: Vec<f64> = Vec::new();
    for l in boundaries {
        if l.position - gap_lo > p.clearance
            && gap_hi - l.position > p.clearance
            && Side::Lo.covers(l, anchor, p.align)
            && l.end - anchor > p.clearance
            && inner.last().is_none_or(|prev| l.position - prev > p.separation)
        {
            inner.push(l.position);
        }
    }
    if !inner.is_empty() {
        let mut edits = Vec::with_capacity(inner.len() + 1);
        let mut prev = gap_lo;
        for pos in inner.into_iter().chain(std::iter::once(gap_hi)) {
            if let Some(cell) = gap_cell(ctx, base, axis, prev, pos) {
                edits.push(Edit::Insert(cell));
            }
            prev = pos;
        }
        return edits;
    }

    if gap_hi - gap_lo < p.noise_gap {
        return vec![Edit::Replace(base_id, base.with_span(axis, base.lo(axis), gap_hi))];
    }

    let closing = ctx.lines.boundaries(cross).iter().any(|l| {
        nearly_equal(l.position, anchor, p.align)
            && nearly_equal(l.position, next.lo(cross), p.align)
            && l.covers(gap_lo, gap_hi, p.endpoint)
    });
    if closing && let Some(cell) = gap_cell(ctx, base, axis, gap_lo, gap_hi) {
        return vec![Edit::Insert(cell)];
    }

    let dir = Direction::new(axis, Sign::Pos);
    if !closing && let Some(separated) = separated_cell(ctx, base, dir) {
        let stretched = dir.stretch(base, dir.near(&separated));
        return fill_toward(ctx, &stretched, dir).into_iter().map(Edit::Insert).collect();
    }
    reconsolidate(ctx, axis, gap_lo, gap_hi)
}

/// A cell over `lo..hi` hanging from the base's low cross side down to the
/// first crossing line that covers it.
fn gap_cell(ctx: &GapContext<'_>, base: &Rect, axis: Axis, lo: f64, hi: f64) -> Option<Cell> {
    let p = ctx.profile;
    let cross = axis.cross();
    let top = base.lo(cross);
    let terminator = ctx
        .lines
        .boundaries(cross)
        .iter()
        .find(|t| t.covers(lo, hi, p.endpoint) && t.position - top > p.clearance)?;
    let far = if nearly_equal(terminator.position, base.hi(cross), p.align) {
        base.hi(cross)
    } else {
        terminator.position
    };
    Some(Cell::ruling(Rect::from_spans(axis, lo, hi, top, far)))
}

/// Consolidate the strip `lo..hi` across the whole region on its own.
fn reconsolidate(ctx: &GapContext<'_>, axis: Axis, lo: f64, hi: f64) -> Vec<Edit> {
    let cross = axis.cross();
    let strip = Rect::from_spans(axis, lo, hi, ctx.region.lo(cross), ctx.region.hi(cross));
    if !strip.is_well_formed() {
        return Vec::new();
    }
    let mut lines = ctx.lines.clipped_to(&strip);
    complete_borders(&mut lines, &strip, ctx.profile.border);
    let cells = fill_cells_by_lines(&strip, &lines, ctx.profile);
    trace!(?axis, ?strip, cells = cells.len(), "re-consolidated gap");
    cells.into_iter().map(|r| Edit::Insert(Cell::ruling(r))).collect()
}
