//! Cell-grid reconstruction for one table region.
//!
//! The pipeline runs leaves first: the region's line index, border
//! completion, line consolidation into a first-pass grid, then repeated
//! row and column passes of directional gap-fill and bridging, each
//! followed by duplicate resolution, and finally the validity and
//! disjointness filters and a coverage repair of whatever they left open.

mod border;
mod bridge;
mod clustering;
mod consolidate;
mod coverage;
mod dedup;
mod direction;
pub mod engine;
mod gapfill;
mod intersections;
mod lines;
pub mod text;
mod types;

pub use border::complete_borders;
pub use consolidate::fill_cells_by_lines;
pub use dedup::resolve_duplicates;
pub use direction::{Direction, Side, Sign};
pub use engine::{DEFAULT_MAX_PASSES, RegionCells, RegionOptions, reconstruct_region, region_profile};
pub use intersections::grid_cells;
pub use lines::RegionLines;
pub use text::{CellText, assign_text, split_wide_cells};
