//! Geometry primitives shared by every stage of the engine.
//!
//! All coordinates live in one page space: origin top-left, y grows
//! downward. Every predicate that takes a tolerance is monotonic in it:
//! widening the tolerance never turns a `true` into a `false`.

use std::cmp::Ordering;

/// `|a - b| < eps`.
#[inline]
pub fn nearly_equal(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() < eps
}

/// `a` lies at or before `b`, allowing `eps` of overshoot.
#[inline]
pub fn within(a: f64, b: f64, eps: f64) -> bool {
    a - b < eps
}

/// Length of the overlap of two closed 1-D intervals (0 when disjoint).
#[inline]
pub fn interval_overlap(a0: f64, a1: f64, b0: f64, b1: f64) -> f64 {
    (a1.min(b1) - a0.max(b0)).max(0.0)
}

/// Overlap of two intervals as a fraction of the shorter one.
pub fn interval_overlap_ratio(a0: f64, a1: f64, b0: f64, b1: f64) -> f64 {
    let shorter = (a1 - a0).min(b1 - b0);
    if shorter <= 0.0 {
        return 0.0;
    }
    interval_overlap(a0, a1, b0, b1) / shorter
}

/// Coordinate axis. `X` grows rightward, `Y` grows downward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub const fn cross(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }

    /// Orientation of the rulings whose position is measured on this axis.
    ///
    /// Vertical rulings sit at an x; horizontal rulings sit at a y.
    pub const fn boundary(self) -> Orientation {
        match self {
            Axis::X => Orientation::Vertical,
            Axis::Y => Orientation::Horizontal,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Axis the ruling's position is measured on.
    pub const fn position_axis(self) -> Axis {
        match self {
            Orientation::Horizontal => Axis::Y,
            Orientation::Vertical => Axis::X,
        }
    }
}

/// Axis-aligned rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn center(&self) -> (f64, f64) {
        (self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Finite coordinates with strictly positive size.
    pub fn is_well_formed(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    pub fn lo(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.left,
            Axis::Y => self.top,
        }
    }

    pub fn hi(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.right(),
            Axis::Y => self.bottom(),
        }
    }

    pub fn extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.width,
            Axis::Y => self.height,
        }
    }

    /// Copy of `self` with the `axis` span replaced by `lo..hi`.
    pub fn with_span(&self, axis: Axis, lo: f64, hi: f64) -> Rect {
        match axis {
            Axis::X => Rect::from_edges(lo, self.top, hi, self.bottom()),
            Axis::Y => Rect::from_edges(self.left, lo, self.right(), hi),
        }
    }

    /// Build a rectangle from its span on `axis` and on the cross axis.
    pub fn from_spans(axis: Axis, lo: f64, hi: f64, cross_lo: f64, cross_hi: f64) -> Rect {
        match axis {
            Axis::X => Rect::from_edges(lo, cross_lo, hi, cross_hi),
            Axis::Y => Rect::from_edges(cross_lo, lo, cross_hi, hi),
        }
    }

    /// The overlapping part of two rectangles, if it has an area.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let r = Rect::from_edges(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right().min(other.right()),
            self.bottom().min(other.bottom()),
        );
        r.is_well_formed().then_some(r)
    }

    pub fn intersection_area(&self, other: &Rect) -> f64 {
        interval_overlap(self.left, self.right(), other.left, other.right())
            * interval_overlap(self.top, self.bottom(), other.top, other.bottom())
    }

    /// Intersection area over the smaller of the two areas.
    pub fn overlap_ratio(&self, other: &Rect) -> f64 {
        let smaller = self.area().min(other.area());
        if smaller <= 0.0 {
            return 0.0;
        }
        self.intersection_area(other) / smaller
    }

    /// Intersection area over the larger of the two areas: both rectangles
    /// are covered at least this much.
    pub fn mutual_overlap_ratio(&self, other: &Rect) -> f64 {
        let larger = self.area().max(other.area());
        if larger <= 0.0 {
            return 0.0;
        }
        self.intersection_area(other) / larger
    }

    pub fn horizontal_overlap_ratio(&self, other: &Rect) -> f64 {
        interval_overlap_ratio(self.left, self.right(), other.left, other.right())
    }

    pub fn vertical_overlap_ratio(&self, other: &Rect) -> f64 {
        interval_overlap_ratio(self.top, self.bottom(), other.top, other.bottom())
    }

    /// `other` lies inside `self` with `eps` of slack on every side.
    pub fn nearly_contains(&self, other: &Rect, eps: f64) -> bool {
        within(self.left, other.left, eps)
            && within(self.top, other.top, eps)
            && within(other.right(), self.right(), eps)
            && within(other.bottom(), self.bottom(), eps)
    }

    pub fn nearly_equals(&self, other: &Rect, eps: f64) -> bool {
        nearly_equal(self.left, other.left, eps)
            && nearly_equal(self.top, other.top, eps)
            && nearly_equal(self.right(), other.right(), eps)
            && nearly_equal(self.bottom(), other.bottom(), eps)
    }

    /// Total order used wherever cells are sorted: top, then left, then size.
    pub fn reading_order(&self, other: &Rect) -> Ordering {
        self.top
            .total_cmp(&other.top)
            .then(self.left.total_cmp(&other.left))
            .then(self.height.total_cmp(&other.height))
            .then(self.width.total_cmp(&other.width))
    }
}

/// Where a ruling came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LineOrigin {
    /// Drawn in the source document.
    Source,
    /// Synthesized on a region edge by border completion.
    Border,
    /// Midpoint of several collinear fragments.
    Merged,
    /// Extrapolated from a neighbouring cell.
    Virtual,
}

/// Axis-aligned line segment.
///
/// `position` is the y of a horizontal ruling or the x of a vertical one;
/// `start..end` is the span along the other axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ruling {
    pub orientation: Orientation,
    pub position: f64,
    pub start: f64,
    pub end: f64,
    pub origin: LineOrigin,
}

impl Ruling {
    pub fn new(orientation: Orientation, position: f64, a: f64, b: f64) -> Self {
        Self {
            orientation,
            position,
            start: a.min(b),
            end: a.max(b),
            origin: LineOrigin::Source,
        }
    }

    pub fn horizontal(y: f64, x0: f64, x1: f64) -> Self {
        Self::new(Orientation::Horizontal, y, x0, x1)
    }

    pub fn vertical(x: f64, y0: f64, y1: f64) -> Self {
        Self::new(Orientation::Vertical, x, y0, y1)
    }

    pub fn with_origin(mut self, origin: LineOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// The edge of `rect` on the `lo` (or `hi`) side of `axis`, as a ruling
    /// spanning the rectangle.
    pub fn rect_edge(rect: &Rect, axis: Axis, hi: bool) -> Self {
        let position = if hi { rect.hi(axis) } else { rect.lo(axis) };
        let cross = axis.cross();
        Self::new(axis.boundary(), position, rect.lo(cross), rect.hi(cross))
    }

    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.start.is_finite() && self.end.is_finite()
    }

    pub fn span_overlap(&self, other: &Ruling) -> f64 {
        interval_overlap(self.start, self.end, other.start, other.end)
    }

    /// Span overlap over the shorter span.
    pub fn span_overlap_ratio(&self, other: &Ruling) -> f64 {
        interval_overlap_ratio(self.start, self.end, other.start, other.end)
    }

    /// Span reaches from `lo` to `hi`, each end allowed to fall short by `eps`.
    pub fn covers(&self, lo: f64, hi: f64, eps: f64) -> bool {
        within(self.start, lo, eps) && within(hi, self.end, eps)
    }

    /// `v` lies on the span, with `eps` of slack at both ends.
    pub fn spans(&self, v: f64, eps: f64) -> bool {
        within(self.start, v, eps) && within(v, self.end, eps)
    }

    /// The part of the span inside `lo..=hi`, if any.
    pub fn clipped(&self, lo: f64, hi: f64) -> Option<Ruling> {
        let start = self.start.max(lo);
        let end = self.end.min(hi);
        (end >= start).then_some(Ruling {
            start,
            end,
            ..*self
        })
    }

    /// Stable order: position, then span start, then span end.
    pub fn position_order(&self, other: &Ruling) -> Ordering {
        self.position
            .total_cmp(&other.position)
            .then(self.start.total_cmp(&other.start))
            .then(self.end.total_cmp(&other.end))
    }
}
