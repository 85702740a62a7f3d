//! Page-level API: every table region of a page, reconstructed in parallel.
//!
//! - `reconstruct_page()` - cells for each region, cleaned across regions
//! - `page_cell_text()` - the same cells paired with their text

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::debug;

use crate::arena::Cell;
use crate::error::{GridError, Result};
use crate::geometry::{Rect, nearly_equal};
use crate::grid::engine::{RegionCells, RegionOptions, reconstruct_region, region_profile};
use crate::grid::text::{CellText, assign_text, split_wide_cells};
use crate::page::PageSource;
use crate::tolerance::ToleranceProfile;

/// Cells from different regions closer than this are the same cell.
const CROSS_REGION_EPS: f64 = 1e-6;

/// A ruling backs an edge column only when drawn this close to its side.
const BACKING_X_EPS: f64 = 2.0;

pub(crate) fn default_thread_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Options for a whole page.
#[derive(Debug, Clone)]
pub struct PageOptions {
    /// Options applied to every region; seeds are filtered per region.
    pub region: RegionOptions,
    /// Worker threads; `None` uses the available parallelism.
    pub threads: Option<usize>,
    /// Split cells holding two widely separated fragments.
    pub split_cells: bool,
    /// Remove phantom empty columns on region edges.
    pub clean_edge_columns: bool,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            region: RegionOptions::default(),
            threads: None,
            split_cells: true,
            clean_edge_columns: true,
        }
    }
}

/// Reconstruct every region of a page.
///
/// Regions are processed top to bottom and the results come back in that
/// order. Invalid regions fail the whole call before any work starts.
pub fn reconstruct_page<P: PageSource + Sync + ?Sized>(
    page: &P,
    regions: &[Rect],
    options: &PageOptions,
) -> Result<Vec<RegionCells>> {
    if let Some(bad) = regions.iter().find(|r| !r.is_well_formed()) {
        return Err(GridError::InvalidRegion {
            left: bad.left,
            top: bad.top,
            width: bad.width,
            height: bad.height,
        });
    }

    let mut ordered: Vec<(usize, Rect)> = regions.iter().copied().enumerate().collect();
    ordered.sort_by(|a, b| a.1.reading_order(&b.1).then(a.0.cmp(&b.0)));

    let thread_count = options.threads.unwrap_or_else(default_thread_count).max(1);
    let pool = ThreadPoolBuilder::new()
        .num_threads(thread_count)
        .build()
        .map_err(|e| GridError::ThreadPool(e.to_string()))?;

    let mut results: Vec<(usize, Result<RegionCells>)> = pool.install(|| {
        ordered
            .into_par_iter()
            .enumerate()
            .map(|(order, (_, region))| {
                let outcome = reconstruct_region(page, &region, &options.region).map(|mut out| {
                    if options.split_cells {
                        let profile = region_profile(page, &region, &options.region);
                        out.cells = split_wide_cells(out.cells, page, &profile);
                        out.cells.sort_by(|a, b| a.rect.reading_order(&b.rect));
                    }
                    out
                });
                (order, outcome)
            })
            .collect()
    });
    results.sort_by_key(|(order, _)| *order);

    let mut pages: Vec<RegionCells> = Vec::with_capacity(results.len());
    for (_, result) in results {
        pages.push(result?);
    }

    dedup_across_regions(&mut pages);
    if options.clean_edge_columns {
        for region_cells in &mut pages {
            let profile = region_profile(page, &region_cells.region, &options.region);
            clean_edge_columns(page, region_cells, &profile);
        }
    }
    debug!(
        regions = pages.len(),
        cells = pages.iter().map(|r| r.cells.len()).sum::<usize>(),
        threads = thread_count,
        "page reconstructed"
    );
    Ok(pages)
}

/// [`reconstruct_page`] with each cell's text attached.
pub fn page_cell_text<P: PageSource + Sync + ?Sized>(
    page: &P,
    regions: &[Rect],
    options: &PageOptions,
) -> Result<Vec<(Rect, Vec<CellText>)>> {
    let pages = reconstruct_page(page, regions, options)?;
    Ok(pages
        .into_iter()
        .map(|rc| {
            let profile = region_profile(page, &rc.region, &options.region);
            let text = page.text_in(&rc.region);
            (rc.region, assign_text(&rc.cells, &text, profile.same_line))
        })
        .collect())
}

/// Drop cells already produced by an earlier region.
fn dedup_across_regions(pages: &mut [RegionCells]) {
    let mut seen: Vec<Rect> = Vec::new();
    for region_cells in pages.iter_mut() {
        region_cells
            .cells
            .retain(|c| !seen.iter().any(|s| s.nearly_equals(&c.rect, CROSS_REGION_EPS)));
        seen.extend(region_cells.cells.iter().map(|c| c.rect));
    }
}

/// Remove phantom empty columns on the left or right edge of a region.
///
/// At most two text-free full-height cells touching a side are considered;
/// one goes when no vertical ruling running from the region's top to its
/// bottom backs its outer side and no other candidate overlaps it
/// horizontally. Regions without any vertical
/// ruling are left alone.
pub fn clean_edge_columns<P: PageSource + ?Sized>(page: &P, region_cells: &mut RegionCells, profile: &ToleranceProfile) {
    let region = region_cells.region;
    let verticals = page.vertical_rulings(&region);
    if verticals.is_empty() {
        return;
    }

    let edge = profile.edge_column;
    let candidates: Vec<(usize, Cell)> = region_cells
        .cells
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, c)| nearly_equal(c.rect.height, region.height, profile.clearance))
        .filter(|(_, c)| {
            nearly_equal(c.rect.left, region.left, edge) || nearly_equal(c.rect.right(), region.right(), edge)
        })
        .filter(|(_, c)| page.text_in(&c.rect).iter().all(|t| t.is_blank()))
        .collect();
    if candidates.is_empty() || candidates.len() > 2 {
        return;
    }

    let backed = |x: f64| {
        verticals.iter().any(|v| {
            nearly_equal(v.position, x, BACKING_X_EPS)
                && nearly_equal(v.start, region.top, edge)
                && nearly_equal(v.end, region.bottom(), edge)
        })
    };
    let mut doomed: Vec<usize> = Vec::new();
    for (idx, cell) in &candidates {
        let r = cell.rect;
        let outer = if nearly_equal(r.left, region.left, edge) {
            r.left
        } else {
            r.right()
        };
        let partnered = candidates
            .iter()
            .any(|(other, o)| other != idx && o.rect.horizontal_overlap_ratio(&r) > 0.5);
        if !backed(outer) && !partnered {
            doomed.push(*idx);
        }
    }
    if !doomed.is_empty() {
        debug!(region = ?region, removed = doomed.len(), "removed edge columns");
    }
    let mut idx = 0;
    region_cells.cells.retain(|_| {
        let keep = !doomed.contains(&idx);
        idx += 1;
        keep
    });
}
