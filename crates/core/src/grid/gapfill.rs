//! Directional gap-fill.
//!
//! Starting from a base cell, walk toward one side of the region and emit
//! the cells the ruling lines imply there. The walk first anchors on the
//! base's low cross side, then on its high cross side. When neither side
//! carries a usable anchor, a cell separated from the base by an empty
//! strip is looked for, and as a last resort a single cell is synthesized
//! up to a line sitting on the region edge.

use tracing::trace;

use crate::arena::{Cell, Provenance};
use crate::geometry::{LineOrigin, Rect, Ruling, nearly_equal};
use crate::tolerance::ToleranceProfile;

use super::direction::{Direction, Side};
use super::lines::RegionLines;

/// Bound on re-walks from a base stretched to a separated cell.
const MAX_SEPARATED_STEPS: usize = 3;

/// A new cell swallowing the previous one within this slack is not emitted.
const EMIT_CONTAIN_EPS: f64 = 1.0;

/// Everything a gap search reads.
#[derive(Clone, Copy)]
pub(crate) struct GapContext<'a> {
    pub region: &'a Rect,
    pub lines: &'a RegionLines,
    pub profile: &'a ToleranceProfile,
}

/// Cells found between `base` and the region edge in `dir`.
pub(crate) fn fill_toward(ctx: &GapContext<'_>, base: &Rect, dir: Direction) -> Vec<Cell> {
    fill_from(ctx, base, dir, 0)
}

fn fill_from(ctx: &GapContext<'_>, base: &Rect, dir: Direction, depth: usize) -> Vec<Cell> {
    let p = ctx.profile;
    let edge = dir.near(ctx.region);
    let mut out = Vec::new();

    let frontier = if walk(ctx, base, dir, Side::Lo, &mut out) {
        out.last().map_or(*base, |c| c.rect)
    } else {
        *base
    };
    if nearly_equal(dir.near(&frontier), edge, p.endpoint) {
        return out;
    }
    if walk(ctx, &frontier, dir, Side::Hi, &mut out) {
        return out;
    }

    if let Some(separated) = separated_cell(ctx, &frontier, dir) {
        let reach = dir.near(&separated);
        trace!(?dir, ?separated, "separated cell");
        if depth < MAX_SEPARATED_STEPS
            && dir.beyond(dir.near(&frontier), reach) > 0.0
            && !nearly_equal(reach, edge, p.endpoint)
        {
            let stretched = dir.stretch(&frontier, reach);
            out.extend(fill_from(ctx, &stretched, dir, depth + 1));
        }
        return out;
    }

    if let Some(cell) = virtual_cell(ctx, &frontier, dir) {
        trace!(?dir, rect = ?cell.rect, "virtual cell");
        out.push(cell);
    }
    out
}

/// One anchored walk. Returns whether it emitted a cell; an anchor that
/// closes nothing leaves the search to the fallbacks.
fn walk(ctx: &GapContext<'_>, base: &Rect, dir: Direction, side: Side, out: &mut Vec<Cell>) -> bool {
    let p = ctx.profile;
    let cross = dir.cross();
    let near = dir.near(base);
    let anchor_pos = side.of(base, cross);

    let Some(found) = ctx.lines.boundaries(cross).iter().find(|l| {
        nearly_equal(l.position, anchor_pos, p.align)
            && dir.beyond(near, dir.outer_end(l)) > p.clearance
            && dir.beyond(near, dir.inner_end(l)) < p.endpoint
    }) else {
        return false;
    };
    let anchor = if nearly_equal(found.position, side.of(ctx.region, cross), p.endpoint) {
        Ruling::rect_edge(ctx.region, cross, side == Side::Hi).with_origin(LineOrigin::Border)
    } else {
        *found
    };

    let inner = ctx
        .lines
        .boundaries(dir.axis)
        .iter()
        .find(|l| {
            nearly_equal(l.position, near, p.endpoint)
                && l.covers(base.lo(cross), base.hi(cross), p.endpoint)
        })
        .copied()
        .unwrap_or_else(|| {
            Ruling::new(
                dir.axis.boundary(),
                near,
                ctx.region.lo(cross),
                ctx.region.hi(cross),
            )
            .with_origin(LineOrigin::Virtual)
        });

    let emitted = out.len();
    let mut accepted = vec![inner];
    let mut last_pos = near;
    for line in dir.in_travel_order(ctx.lines.boundaries(dir.axis)) {
        if dir.beyond(near, line.position) <= p.clearance
            || !side.covers(line, anchor_pos, p.align)
            || dir.beyond(dir.outer_end(&anchor), line.position) >= p.endpoint
            || side.inward(anchor_pos, side.inner_end(line)) <= p.clearance
            || dir.beyond(last_pos, line.position) <= p.separation
        {
            continue;
        }
        accepted.push(*line);
        last_pos = line.position;
    }

    for pair in accepted.windows(2) {
        let Some(cell) = close_cell(ctx, base, side, anchor_pos, &pair[0], &pair[1]) else {
            continue;
        };
        if out
            .last()
            .is_some_and(|prev| cell.rect.nearly_contains(&prev.rect, EMIT_CONTAIN_EPS))
        {
            continue;
        }
        trace!(?dir, ?side, rect = ?cell.rect, "gap cell");
        out.push(cell);
    }
    out.len() > emitted
}

/// Close the cell between two consecutive boundary lines, searching the
/// cross lines inward from the anchor side for the far edge.
fn close_cell(
    ctx: &GapContext<'_>,
    base: &Rect,
    side: Side,
    anchor_pos: f64,
    inner: &Ruling,
    outer: &Ruling,
) -> Option<Cell> {
    let p = ctx.profile;
    let axis = inner.orientation.position_axis();
    let cross = axis.cross();
    let lo = inner.position.min(outer.position);
    let hi = inner.position.max(outer.position);

    let terminator = side
        .in_inward_order(ctx.lines.boundaries(cross))
        .into_iter()
        .find(|t| t.covers(lo, hi, p.endpoint) && side.inward(anchor_pos, t.position) > p.clearance)?;

    let far_side = side.opposite().of(base, cross);
    let (far, provenance) = if nearly_equal(terminator.position, far_side, p.align) {
        (far_side, Provenance::Ruling)
    } else if inner.spans(terminator.position, p.endpoint) && outer.spans(terminator.position, p.endpoint) {
        (terminator.position, Provenance::Ruling)
    } else {
        (far_side, Provenance::Synthesized)
    };

    let rect = Rect::from_spans(axis, lo, hi, anchor_pos.min(far), anchor_pos.max(far));
    (rect.extent(axis) > 0.0 && rect.extent(cross) > 0.0).then_some(Cell::new(rect, provenance))
}

/// A cell lying past `base` in `dir` and separated from it by an empty
/// strip, found by pairing boundary lines that extend well past the base's
/// low cross side.
pub(crate) fn separated_cell(ctx: &GapContext<'_>, base: &Rect, dir: Direction) -> Option<Rect> {
    let p = ctx.profile;
    let cross = dir.cross();
    let near = dir.near(base);
    let edge = dir.near(ctx.region);
    let anchor = base.lo(cross);

    let mut candidates: Vec<&Ruling> = Vec::new();
    for line in dir.in_travel_order(ctx.lines.boundaries(dir.axis)) {
        let gap = dir.beyond(near, line.position);
        if gap < -p.reach {
            continue;
        }
        let at_base = nearly_equal(line.position, near, p.endpoint);
        let at_edge = nearly_equal(line.position, edge, p.endpoint);
        if !(at_base || gap > p.clearance) || !(at_edge || dir.beyond(line.position, edge) > p.clearance) {
            continue;
        }
        if anchor - line.start <= p.clearance
            || line.length() <= p.clearance
            || line.end - anchor <= p.clearance
        {
            continue;
        }
        if candidates
            .last()
            .is_some_and(|prev| dir.beyond(prev.position, line.position) <= p.separation)
        {
            continue;
        }
        candidates.push(line);
    }

    let mut found = None;
    'pairs: for pair in candidates.windows(2) {
        let lo = pair[0].position.min(pair[1].position);
        let hi = pair[0].position.max(pair[1].position);
        let mut previous: Option<f64> = None;
        for t in ctx.lines.boundaries(cross) {
            if !t.covers(lo, hi, p.endpoint) {
                continue;
            }
            if t.position - anchor > p.reach {
                if let Some(start) = previous {
                    found = Some(Rect::from_spans(dir.axis, lo, hi, start, t.position));
                }
                break;
            }
            if nearly_equal(t.position, anchor, p.endpoint) {
                break 'pairs;
            }
            previous = Some(t.position);
        }
    }
    found
}

/// Synthesize one cell from `frontier` to the single boundary line sitting
/// on the region edge in `dir`.
fn virtual_cell(ctx: &GapContext<'_>, frontier: &Rect, dir: Direction) -> Option<Cell> {
    let p = ctx.profile;
    let near = dir.near(frontier);
    let edge = dir.near(ctx.region);
    let mut hits = ctx
        .lines
        .boundaries(dir.axis)
        .iter()
        .filter(|l| dir.beyond(near, l.position) > p.reach && nearly_equal(l.position, edge, p.align));
    let line = hits.next()?;
    if hits.next().is_some() {
        return None;
    }
    let cross = dir.cross();
    Some(Cell::synthesized(Rect::from_spans(
        dir.axis,
        near.min(line.position),
        near.max(line.position),
        frontier.lo(cross),
        frontier.hi(cross),
    )))
}
