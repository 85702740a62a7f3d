//! Read-only page model consumed by the engine.
//!
//! The engine never parses documents. It asks a [`PageSource`] for the
//! rulings around a region and the text inside a rectangle. [`PageContent`]
//! is the in-memory implementation used by the CLI and the tests.

use rstar::{AABB, RTree, RTreeObject};

use crate::error::{GridError, Result};
use crate::geometry::{Orientation, Rect, Ruling};

/// Rulings this close to a region still count as touching it.
pub const RULING_QUERY_SLACK: f64 = 1.0;

/// A positioned run of text.
#[derive(Clone, Debug, PartialEq)]
pub struct TextFragment {
    pub bbox: Rect,
    pub text: String,
}

impl TextFragment {
    pub fn new(bbox: Rect, text: impl Into<String>) -> Self {
        Self {
            bbox,
            text: text.into(),
        }
    }

    pub fn width(&self) -> f64 {
        self.bbox.width
    }

    pub fn height(&self) -> f64 {
        self.bbox.height
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Queries the engine issues against the document model.
pub trait PageSource {
    /// Horizontal rulings intersecting or touching `region`.
    fn horizontal_rulings(&self, region: &Rect) -> Vec<Ruling>;

    /// Vertical rulings intersecting or touching `region`.
    fn vertical_rulings(&self, region: &Rect) -> Vec<Ruling>;

    /// Fragments whose centre lies inside `rect`, in page order.
    fn text_in(&self, rect: &Rect) -> Vec<&TextFragment>;

    /// Detected language code, e.g. `"en"` or `"zh"`.
    fn language(&self) -> Option<&str> {
        None
    }
}

struct TextEntry {
    idx: usize,
    centre: [f64; 2],
}

impl RTreeObject for TextEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.centre)
    }
}

/// A page held in memory: rulings split by orientation and text indexed
/// by fragment centre.
pub struct PageContent {
    bounds: Rect,
    horizontal: Vec<Ruling>,
    vertical: Vec<Ruling>,
    text: Vec<TextFragment>,
    text_index: RTree<TextEntry>,
    language: Option<String>,
}

impl PageContent {
    pub fn new(bounds: Rect, rulings: Vec<Ruling>, text: Vec<TextFragment>) -> Result<Self> {
        if !bounds.is_well_formed() {
            return Err(GridError::InvalidRegion {
                left: bounds.left,
                top: bounds.top,
                width: bounds.width,
                height: bounds.height,
            });
        }
        if rulings.iter().any(|r| !r.is_finite()) {
            return Err(GridError::NonFiniteGeometry("ruling"));
        }
        let finite_bbox = |b: &Rect| {
            b.left.is_finite() && b.top.is_finite() && b.width.is_finite() && b.height.is_finite()
        };
        if text.iter().any(|t| !finite_bbox(&t.bbox)) {
            return Err(GridError::NonFiniteGeometry("text fragment"));
        }

        let (horizontal, vertical): (Vec<Ruling>, Vec<Ruling>) = rulings
            .into_iter()
            .partition(|r| r.orientation == Orientation::Horizontal);
        let entries = text
            .iter()
            .enumerate()
            .map(|(idx, t)| {
                let (cx, cy) = t.bbox.center();
                TextEntry {
                    idx,
                    centre: [cx, cy],
                }
            })
            .collect();

        Ok(Self {
            bounds,
            horizontal,
            vertical,
            text,
            text_index: RTree::bulk_load(entries),
            language: None,
        })
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn text(&self) -> &[TextFragment] {
        &self.text
    }

    fn touching(rulings: &[Ruling], region: &Rect) -> Vec<Ruling> {
        let s = RULING_QUERY_SLACK;
        rulings
            .iter()
            .filter(|r| {
                let axis = r.orientation.position_axis();
                let cross = axis.cross();
                r.position >= region.lo(axis) - s
                    && r.position <= region.hi(axis) + s
                    && r.end >= region.lo(cross) - s
                    && r.start <= region.hi(cross) + s
            })
            .copied()
            .collect()
    }
}

impl PageSource for PageContent {
    fn horizontal_rulings(&self, region: &Rect) -> Vec<Ruling> {
        Self::touching(&self.horizontal, region)
    }

    fn vertical_rulings(&self, region: &Rect) -> Vec<Ruling> {
        Self::touching(&self.vertical, region)
    }

    fn text_in(&self, rect: &Rect) -> Vec<&TextFragment> {
        let envelope = AABB::from_corners([rect.left, rect.top], [rect.right(), rect.bottom()]);
        let mut hits: Vec<usize> = self
            .text_index
            .locate_in_envelope(&envelope)
            .map(|e| e.idx)
            .collect();
        hits.sort_unstable();
        hits.into_iter().map(|idx| &self.text[idx]).collect()
    }

    fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}
