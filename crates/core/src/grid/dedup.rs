//! Duplicate resolution, validity filtering and the final disjointness pass.

use tracing::debug;

use crate::arena::{Cell, CellArena, CellId, Edit, EditSummary, Provenance};
use crate::geometry::{Axis, Rect, interval_overlap, nearly_equal};
use crate::page::PageSource;
use crate::tolerance::ToleranceProfile;

use super::clustering::bands;
use super::lines::RegionLines;

/// Containment slack between two consecutive cells of a band.
const CONTAIN_EPS: f64 = 1.0;

/// Slack for a cell to count as the whole region.
const REGION_EPS: f64 = 1e-6;

/// Merge near-identical candidates and drop contained ones, first in row
/// bands and then in column bands.
pub fn resolve_duplicates(arena: &mut CellArena, profile: &ToleranceProfile) -> EditSummary {
    let mut summary = EditSummary::default();
    for axis in [Axis::X, Axis::Y] {
        let s = arena.apply(consensus_edits(arena, axis, profile));
        summary.inserted += s.inserted;
        summary.removed += s.removed;
        summary.replaced += s.replaced;
        summary.skipped += s.skipped;
    }
    if summary.changed() {
        debug!(?summary, "resolved duplicates");
    }
    summary
}

/// Edits for one banding: cells grouped by their low cross edge and walked
/// along `axis`.
fn consensus_edits(arena: &CellArena, axis: Axis, profile: &ToleranceProfile) -> Vec<Edit> {
    let cross = axis.cross();
    let items: Vec<(CellId, Rect)> = arena.iter().map(|(id, c)| (id, c.rect)).collect();
    let grouped = bands(
        items,
        |(_, r)| r.lo(cross),
        |a, b| a.0.cmp(&b.0),
        profile.dedup_band,
    );

    let mut edits = Vec::new();
    for mut band in grouped {
        band.sort_by(|a, b| a.1.lo(axis).total_cmp(&b.1.lo(axis)).then(a.0.cmp(&b.0)));

        let mut idx = 0;
        while idx < band.len() {
            let head = band[idx].1;
            let mut end = idx + 1;
            while end < band.len() && head.mutual_overlap_ratio(&band[end].1) > profile.consensus_overlap {
                end += 1;
            }
            let cluster = &band[idx..end];
            if cluster.len() > 1 {
                let rects: Vec<Rect> = cluster.iter().map(|(_, r)| *r).collect();
                edits.extend(cluster.iter().map(|(id, _)| Edit::Remove(*id)));
                edits.push(Edit::Insert(Cell::new(consensus(&rects), Provenance::Consensus)));
            } else if let Some(&(next_id, next)) = band.get(end)
                && end == idx + 1
            {
                // Singleton followed by a neighbour: the smaller of a
                // containing pair goes.
                let (id, rect) = cluster[0];
                if rect.nearly_contains(&next, CONTAIN_EPS) && rect.area() >= next.area() {
                    edits.push(Edit::Remove(next_id));
                } else if next.nearly_contains(&rect, CONTAIN_EPS) {
                    edits.push(Edit::Remove(id));
                }
            }
            idx = end;
        }
    }
    edits
}

/// Each edge at the midpoint of that edge's extremes across `rects`.
pub(crate) fn consensus(rects: &[Rect]) -> Rect {
    let mid = |f: fn(&Rect) -> f64| {
        let (lo, hi) = rects
            .iter()
            .map(f)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        (lo + hi) / 2.0
    };
    Rect::from_edges(
        mid(|r| r.left),
        mid(|r| r.top),
        mid(|r| r.right()),
        mid(|r| r.bottom()),
    )
}

/// Rank for the disjointness pass; lower is kept first.
fn provenance_rank(p: Provenance) -> u8 {
    match p {
        Provenance::Ruling | Provenance::Seed => 0,
        Provenance::Consensus => 1,
        Provenance::Synthesized => 2,
    }
}

/// Remove every cell that overlaps an already kept one by at least the
/// profile's overlap limit. Cells are kept greedily in order of provenance,
/// then area (largest first), then reading order.
pub(crate) fn disjoint_edits(arena: &CellArena, profile: &ToleranceProfile) -> Vec<Edit> {
    let mut order: Vec<(CellId, Cell)> = arena.iter().map(|(id, c)| (id, *c)).collect();
    order.sort_by(|(ia, a), (ib, b)| {
        provenance_rank(a.provenance)
            .cmp(&provenance_rank(b.provenance))
            .then(b.rect.area().total_cmp(&a.rect.area()))
            .then(a.rect.reading_order(&b.rect))
            .then(ia.cmp(ib))
    });

    let mut kept: Vec<Rect> = Vec::with_capacity(order.len());
    let mut edits = Vec::new();
    for (id, cell) in order {
        if kept.iter().any(|k| k.overlap_ratio(&cell.rect) >= profile.overlap_limit) {
            edits.push(Edit::Remove(id));
        } else {
            kept.push(cell.rect);
        }
    }
    edits
}

/// Empty cells too small to hold a line of text. A cell spanning the whole
/// region is the region's only cell and is never debris.
pub(crate) fn debris_edits<P: PageSource + ?Sized>(
    arena: &CellArena,
    page: &P,
    region: &Rect,
    profile: &ToleranceProfile,
) -> Vec<Edit> {
    let (min_w, min_h) = profile.min_empty_cell();
    arena
        .iter()
        .filter(|(_, c)| c.rect.width < min_w || c.rect.height < min_h)
        .filter(|(_, c)| !c.rect.nearly_equals(region, REGION_EPS))
        .filter(|(_, c)| page.text_in(&c.rect).iter().all(|t| t.is_blank()))
        .map(|(id, _)| Edit::Remove(id))
        .collect()
}

/// Seeds that are not framed by rulings, or that a ruling cuts through.
pub(crate) fn invalid_seed_edits(arena: &CellArena, lines: &RegionLines, profile: &ToleranceProfile) -> Vec<Edit> {
    arena
        .iter()
        .filter(|(_, c)| c.provenance == Provenance::Seed)
        .filter(|(_, c)| !is_framed(&c.rect, lines, profile) || has_stray_line(&c.rect, lines, profile))
        .map(|(id, _)| Edit::Remove(id))
        .collect()
}

fn is_framed(rect: &Rect, lines: &RegionLines, profile: &ToleranceProfile) -> bool {
    let a = profile.align;
    [Axis::X, Axis::Y].into_iter().all(|axis| {
        let cross = axis.cross();
        let edge = |v: f64| {
            lines
                .boundaries(axis)
                .iter()
                .any(|l| nearly_equal(l.position, v, a) && l.covers(rect.lo(cross), rect.hi(cross), a))
        };
        edge(rect.lo(axis)) && edge(rect.hi(axis))
    })
}

fn has_stray_line(rect: &Rect, lines: &RegionLines, profile: &ToleranceProfile) -> bool {
    [Axis::X, Axis::Y].into_iter().any(|axis| {
        let cross = axis.cross();
        lines.boundaries(axis).iter().any(|l| {
            l.position - rect.lo(axis) > profile.align
                && rect.hi(axis) - l.position > profile.align
                && interval_overlap(l.start, l.end, rect.lo(cross), rect.hi(cross)) > profile.clearance
        })
    })
}
