//! cellfill - table cell-grid reconstruction from rulings and text.
//!
//! Given a table region, the ruling segments and text fragments of a page,
//! the engine produces a complete, non-overlapping set of cells even when
//! border lines are missing, duplicated, slightly misaligned or
//! interrupted.

pub mod arena;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod high_level;
pub mod page;
pub mod tolerance;

pub use arena::{Cell, CellArena, CellId, Edit, EditSummary, Provenance};
pub use error::{GridError, Result};
pub use geometry::{Axis, LineOrigin, Orientation, Rect, Ruling};
pub use grid::{CellText, RegionCells, RegionOptions, reconstruct_region};
pub use high_level::{PageOptions, page_cell_text, reconstruct_page};
pub use page::{PageContent, PageSource, TextFragment};
pub use tolerance::{Script, TextMetrics, ToleranceProfile};
