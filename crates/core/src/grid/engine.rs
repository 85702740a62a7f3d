//! Region engine: from rulings and text to a disjoint set of cells.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::arena::{Cell, CellArena, CellId, Edit, Provenance};
use crate::error::{GridError, Result};
use crate::geometry::{Axis, Rect};
use crate::page::PageSource;
use crate::tolerance::ToleranceProfile;

use super::border::complete_borders;
use super::bridge::bridge;
use super::clustering::bands;
use super::consolidate::fill_cells_by_lines;
use super::coverage::coverage_edits;
use super::dedup::{debris_edits, disjoint_edits, invalid_seed_edits, resolve_duplicates};
use super::direction::{Direction, Sign};
use super::gapfill::{GapContext, fill_toward};
use super::lines::RegionLines;

pub const DEFAULT_MAX_PASSES: usize = 4;

/// Per-region configuration.
#[derive(Clone, Debug)]
pub struct RegionOptions {
    /// Thresholds to use instead of the ones measured from the region.
    pub profile: Option<ToleranceProfile>,
    /// Language code overriding the page's.
    pub language: Option<String>,
    /// Upper bound on repair passes.
    pub max_passes: usize,
    /// Cells proposed by an upstream detector; only those inside the region
    /// are used.
    pub seeds: Vec<Rect>,
}

impl Default for RegionOptions {
    fn default() -> Self {
        Self {
            profile: None,
            language: None,
            max_passes: DEFAULT_MAX_PASSES,
            seeds: Vec::new(),
        }
    }
}

/// Cells reconstructed for one region, in reading order.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionCells {
    pub region: Rect,
    pub cells: Vec<Cell>,
}

impl RegionCells {
    pub fn rects(&self) -> Vec<Rect> {
        self.cells.iter().map(|c| c.rect).collect()
    }
}

/// Thresholds for `region`: the explicit profile when given, otherwise one
/// measured from the region's text.
pub fn region_profile<P: PageSource + ?Sized>(page: &P, region: &Rect, options: &RegionOptions) -> ToleranceProfile {
    if let Some(profile) = &options.profile {
        return profile.clone();
    }
    ToleranceProfile::for_region(page, region, options.language.as_deref())
}

/// Reconstruct the cell grid of one table region.
pub fn reconstruct_region<P: PageSource + ?Sized>(
    page: &P,
    region: &Rect,
    options: &RegionOptions,
) -> Result<RegionCells> {
    if !region.is_well_formed() {
        return Err(GridError::InvalidRegion {
            left: region.left,
            top: region.top,
            width: region.width,
            height: region.height,
        });
    }
    let profile = region_profile(page, region, options);

    let mut lines = RegionLines::collect(page, region);
    let source_lines = lines.len();
    let synthesized = complete_borders(&mut lines, region, profile.border);
    debug!(?region, source_lines, synthesized, script = ?profile.script, "region lines");

    let mut arena = CellArena::new();
    let seeds: Vec<Rect> = options
        .seeds
        .iter()
        .filter(|s| s.is_well_formed() && region.nearly_contains(s, profile.containment))
        .copied()
        .collect();
    let mut line_only = seeds.is_empty();
    if !line_only {
        for seed in &seeds {
            arena.insert(Cell::new(*seed, Provenance::Seed));
        }
        let invalid = invalid_seed_edits(&arena, &lines, &profile);
        if !invalid.is_empty() {
            debug!(invalid = invalid.len(), seeds = seeds.len(), "dropping invalid seeds");
            arena.apply(invalid);
            line_only = true;
        }
    }
    if line_only || arena.is_empty() {
        let found: Vec<Edit> = fill_cells_by_lines(region, &lines, &profile)
            .into_iter()
            .filter(|r| region.nearly_contains(r, profile.containment))
            .map(|r| Edit::Insert(Cell::ruling(r)))
            .collect();
        arena.apply(found);
    }
    resolve_duplicates(&mut arena, &profile);

    let ctx = GapContext {
        region,
        lines: &lines,
        profile: &profile,
    };
    for pass in 0..options.max_passes {
        let before = arena.snapshot();
        for axis in [Axis::X, Axis::Y] {
            let edits = band_pass(&arena, &ctx, axis);
            let summary = arena.apply(edits);
            debug!(pass, ?axis, ?summary, "band pass");
            resolve_duplicates(&mut arena, &profile);
        }
        if arena.snapshot() == before {
            break;
        }
    }

    arena.apply(debris_edits(&arena, page, region, &profile));
    let summary = arena.apply(disjoint_edits(&arena, &profile));
    if summary.removed > 0 {
        debug!(removed = summary.removed, "removed overlapping cells");
    }
    arena.apply(coverage_edits(&arena, &ctx));

    let cells: Vec<Cell> = arena
        .snapshot()
        .into_iter()
        .filter(|c| region.nearly_contains(&c.rect, profile.containment))
        .collect();
    debug!(cells = cells.len(), "region reconstructed");
    Ok(RegionCells { region: *region, cells })
}

/// One pass over the bands of `axis`: row bands for `X`, column bands for
/// `Y`. Fills toward the region edges from the band's outermost cells and
/// bridges gaps between neighbours.
fn band_pass(arena: &CellArena, ctx: &GapContext<'_>, axis: Axis) -> Vec<Edit> {
    let p = ctx.profile;
    let cross = axis.cross();
    let tolerance = match axis {
        Axis::X => p.row_band,
        Axis::Y => p.column_band,
    };
    let items: Vec<(CellId, Rect)> = arena.iter().map(|(id, c)| (id, c.rect)).collect();
    let grouped = bands(items, |(_, r)| r.lo(cross), |a, b| a.0.cmp(&b.0), tolerance);

    let mut edits = Vec::new();
    let mut replaced: FxHashSet<CellId> = FxHashSet::default();
    for mut band in grouped {
        band.sort_by(|a, b| a.1.lo(axis).total_cmp(&b.1.lo(axis)).then(a.0.cmp(&b.0)));
        let band = without_conflicts(band, axis, p.band_overlap);
        let (Some(&(_, first)), Some(&(_, last))) = (band.first(), band.last()) else {
            continue;
        };

        if first.lo(axis) - ctx.region.lo(axis) > p.clearance {
            let found = fill_toward(ctx, &first, Direction::new(axis, Sign::Neg));
            edits.extend(found.into_iter().map(Edit::Insert));
        }
        for pair in band.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            for edit in bridge(ctx, axis, (a.0, &a.1), (b.0, &b.1)) {
                if let Edit::Replace(id, _) = &edit
                    && !replaced.insert(*id)
                {
                    continue;
                }
                edits.push(edit);
            }
        }
        if ctx.region.hi(axis) - last.hi(axis) > p.clearance {
            let found = fill_toward(ctx, &last, Direction::new(axis, Sign::Pos));
            edits.extend(found.into_iter().map(Edit::Insert));
        }
    }
    edits
}

/// Drop the larger of two consecutive cells overlapping by more than
/// `overlap` along `axis`.
fn without_conflicts(band: Vec<(CellId, Rect)>, axis: Axis, overlap: f64) -> Vec<(CellId, Rect)> {
    let mut kept: Vec<(CellId, Rect)> = Vec::with_capacity(band.len());
    for item in band {
        match kept.last() {
            Some(prev) if prev.1.hi(axis) - item.1.lo(axis) > overlap => {
                if item.1.area() < prev.1.area() {
                    kept.pop();
                    kept.push(item);
                }
            }
            _ => kept.push(item),
        }
    }
    kept
}
