//! Thresholds for one reconstruction, derived from the region's text.
//!
//! Absolute thresholds do not survive changes of font size or script, so
//! the merge distances and minimum cell sizes scale with the smallest and
//! average character box found in the region. Everything else is a named
//! constant so the whole profile can be inspected and overridden in one
//! place.

use crate::geometry::Rect;
use crate::page::{PageSource, TextFragment};

pub const DEFAULT_MIN_CHAR_WIDTH: f64 = 7.0;
pub const DEFAULT_MIN_CHAR_HEIGHT: f64 = 8.4;

pub(crate) const DEFAULT_BORDER_TOLERANCE: f64 = 2.5;
pub(crate) const DEFAULT_INTERSECTION_TOLERANCE: f64 = 3.0;
pub(crate) const DEFAULT_ALIGN_TOLERANCE: f64 = 3.5;
pub(crate) const DEFAULT_ENDPOINT_TOLERANCE: f64 = 2.0;
pub(crate) const DEFAULT_CLEARANCE: f64 = 10.0;
pub(crate) const DEFAULT_SEPARATION: f64 = 6.0;
pub(crate) const DEFAULT_MIN_SEGMENT_LENGTH: f64 = 5.0;

const LATIN_H_MERGE: f64 = 5.5;
const LATIN_V_MERGE: f64 = 3.5;
const LATIN_MIN_CELL_HEIGHT: f64 = 5.5;

/// Writing system of the region, used only to pick merge constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Script {
    #[default]
    Latin,
    Cjk,
}

impl Script {
    /// `en*` codes and unknown languages are treated as Latin.
    pub fn from_language(code: Option<&str>) -> Self {
        match code {
            None => Script::Latin,
            Some(code) if code.trim().is_empty() => Script::Latin,
            Some(code) if code.trim().to_ascii_lowercase().starts_with("en") => Script::Latin,
            Some(_) => Script::Cjk,
        }
    }
}

/// Character metrics of the text inside a region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextMetrics {
    pub min_char_width: f64,
    pub min_char_height: f64,
    pub avg_char_width: f64,
    pub avg_char_height: f64,
    /// Widest of: smallest char, leftmost fragment, rightmost fragment.
    pub frame_width: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            min_char_width: DEFAULT_MIN_CHAR_WIDTH,
            min_char_height: DEFAULT_MIN_CHAR_HEIGHT,
            avg_char_width: DEFAULT_MIN_CHAR_WIDTH,
            avg_char_height: DEFAULT_MIN_CHAR_HEIGHT,
            frame_width: DEFAULT_MIN_CHAR_WIDTH,
        }
    }
}

impl TextMetrics {
    /// Measure `fragments`; blank and zero-sized fragments are ignored and
    /// an empty set yields the defaults.
    pub fn measure(fragments: &[&TextFragment]) -> Self {
        let visible: Vec<&TextFragment> = fragments
            .iter()
            .copied()
            .filter(|t| !t.is_blank() && t.width() > 0.0 && t.height() > 0.0)
            .collect();
        if visible.is_empty() {
            return Self::default();
        }

        let mut min_w = f64::INFINITY;
        let mut min_h = f64::INFINITY;
        let mut sum_w = 0.0;
        let mut sum_h = 0.0;
        let mut chars = 0usize;
        for t in &visible {
            let n = t.text.chars().filter(|c| !c.is_whitespace()).count().max(1);
            let per_char = t.width() / n as f64;
            min_w = min_w.min(per_char);
            min_h = min_h.min(t.height());
            sum_w += t.width();
            sum_h += t.height() * n as f64;
            chars += n;
        }

        let leftmost = visible
            .iter()
            .min_by(|a, b| a.bbox.left.total_cmp(&b.bbox.left))
            .map_or(0.0, |t| t.width());
        let rightmost = visible
            .iter()
            .max_by(|a, b| a.bbox.right().total_cmp(&b.bbox.right()))
            .map_or(0.0, |t| t.width());

        Self {
            min_char_width: min_w,
            min_char_height: min_h,
            avg_char_width: sum_w / chars as f64,
            avg_char_height: sum_h / chars as f64,
            frame_width: min_w.max(leftmost).max(rightmost),
        }
    }
}

/// Every threshold used by one region's reconstruction.
#[derive(Clone, Debug, PartialEq)]
pub struct ToleranceProfile {
    pub script: Script,
    pub metrics: TextMetrics,

    /// Max y distance for two horizontal fragments to merge.
    pub h_merge: f64,
    /// Max x distance for two vertical fragments to merge.
    pub v_merge: f64,
    /// Max vertical gap between two collinear vertical fragments.
    pub v_merge_gap: f64,
    /// Min span overlap ratio for vertical fragments to merge.
    pub v_merge_overlap: f64,
    pub min_segment_length: f64,
    pub min_cell_width: f64,
    pub min_cell_height: f64,

    /// Outer-line correction reach, horizontally and vertically.
    pub frame_x: f64,
    pub frame_y: f64,

    pub border: f64,
    pub intersection: f64,
    /// Alignment of a line with a cell edge.
    pub align: f64,
    /// Slack at the ends of a span.
    pub endpoint: f64,
    /// Minimum distance separating a new boundary from the current cell.
    pub clearance: f64,
    /// Minimum distance between two accepted candidate boundaries.
    pub separation: f64,
    /// Short reach past an edge, used by the separated and virtual searches.
    pub reach: f64,
    /// Two cells closer than this along the band axis are adjacent.
    pub adjacency: f64,
    /// Gaps narrower than this are measurement slack.
    pub noise_gap: f64,

    pub row_band: f64,
    pub column_band: f64,
    pub dedup_band: f64,
    /// Overlap beyond which neighbours in a band conflict.
    pub band_overlap: f64,
    pub consensus_overlap: f64,
    pub overlap_limit: f64,
    /// Slack when deciding whether a seed lies inside the region.
    pub containment: f64,
    /// Distance from the region's side for an edge column.
    pub edge_column: f64,

    /// Split gap, in average character widths.
    pub split_gap_chars: f64,
    /// Max top difference for two fragments to share a line.
    pub same_line: f64,
}

impl Default for ToleranceProfile {
    fn default() -> Self {
        Self::derive(TextMetrics::default(), Script::Latin)
    }
}

impl ToleranceProfile {
    pub fn derive(metrics: TextMetrics, script: Script) -> Self {
        let (h_merge, v_merge, min_cell_height) = match script {
            Script::Latin => (LATIN_H_MERGE, LATIN_V_MERGE, LATIN_MIN_CELL_HEIGHT),
            Script::Cjk => (
                0.5 * metrics.min_char_height,
                1.5 * metrics.min_char_width,
                metrics.min_char_height,
            ),
        };
        Self {
            script,
            metrics,
            h_merge,
            v_merge,
            v_merge_gap: metrics.min_char_height,
            v_merge_overlap: 0.8,
            min_segment_length: DEFAULT_MIN_SEGMENT_LENGTH,
            min_cell_width: DEFAULT_MIN_SEGMENT_LENGTH,
            min_cell_height,
            frame_x: metrics.frame_width.min(DEFAULT_CLEARANCE),
            frame_y: metrics.min_char_height,
            border: DEFAULT_BORDER_TOLERANCE,
            intersection: DEFAULT_INTERSECTION_TOLERANCE,
            align: DEFAULT_ALIGN_TOLERANCE,
            endpoint: DEFAULT_ENDPOINT_TOLERANCE,
            clearance: DEFAULT_CLEARANCE,
            separation: DEFAULT_SEPARATION,
            reach: 5.0,
            adjacency: DEFAULT_ALIGN_TOLERANCE,
            noise_gap: DEFAULT_CLEARANCE,
            row_band: 1.5,
            column_band: 2.0,
            dedup_band: DEFAULT_BORDER_TOLERANCE,
            band_overlap: 3.0,
            consensus_overlap: 0.9,
            overlap_limit: 0.1,
            containment: 3.0,
            edge_column: 5.0,
            split_gap_chars: 100.0,
            same_line: 4.0,
        }
    }

    /// Profile for `region` measured from the page's text. `language`
    /// overrides the page's own.
    pub fn for_region<P: PageSource + ?Sized>(page: &P, region: &Rect, language: Option<&str>) -> Self {
        let text = page.text_in(region);
        Self::derive(
            TextMetrics::measure(&text),
            Script::from_language(language.or(page.language())),
        )
    }

    /// Smallest box an empty cell may have before it counts as debris.
    pub fn min_empty_cell(&self) -> (f64, f64) {
        (self.clearance, self.metrics.min_char_height + 0.5)
    }
}
