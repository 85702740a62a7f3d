//! Region line index: the rulings of one region, clipped and sorted.

use crate::geometry::{Axis, Orientation, Rect, Ruling};
use crate::page::{PageSource, RULING_QUERY_SLACK};

/// Fragments shorter than this after clipping carry no evidence.
pub(crate) const MIN_CLIPPED_LENGTH: f64 = 1.0;

/// Horizontal and vertical rulings of one region, each sorted ascending by
/// position (then span start). Every directional search relies on this
/// order for its first-match-wins semantics.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionLines {
    pub horizontal: Vec<Ruling>,
    pub vertical: Vec<Ruling>,
}

impl RegionLines {
    pub fn collect<P: PageSource + ?Sized>(page: &P, region: &Rect) -> Self {
        let rulings = page
            .horizontal_rulings(region)
            .into_iter()
            .chain(page.vertical_rulings(region));
        Self::from_rulings(region, rulings)
    }

    /// Clip `rulings` to `region` and sort them.
    pub fn from_rulings(region: &Rect, rulings: impl IntoIterator<Item = Ruling>) -> Self {
        let mut index = Self::default();
        for ruling in rulings {
            let Some(clipped) = clip_to(region, &ruling) else {
                continue;
            };
            index.lines_mut(clipped.orientation).push(clipped);
        }
        index.sort();
        index
    }

    /// The same index restricted to `sub`.
    pub fn clipped_to(&self, sub: &Rect) -> Self {
        Self::from_rulings(
            sub,
            self.horizontal.iter().chain(self.vertical.iter()).copied(),
        )
    }

    pub fn lines(&self, orientation: Orientation) -> &[Ruling] {
        match orientation {
            Orientation::Horizontal => &self.horizontal,
            Orientation::Vertical => &self.vertical,
        }
    }

    pub fn lines_mut(&mut self, orientation: Orientation) -> &mut Vec<Ruling> {
        match orientation {
            Orientation::Horizontal => &mut self.horizontal,
            Orientation::Vertical => &mut self.vertical,
        }
    }

    /// Rulings whose position is measured on `axis`: vertical rulings for
    /// `X`, horizontal ones for `Y`.
    pub fn boundaries(&self, axis: Axis) -> &[Ruling] {
        self.lines(axis.boundary())
    }

    pub fn sort(&mut self) {
        self.horizontal.sort_by(|a, b| a.position_order(b));
        self.vertical.sort_by(|a, b| a.position_order(b));
    }

    pub fn len(&self) -> usize {
        self.horizontal.len() + self.vertical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn clip_to(region: &Rect, ruling: &Ruling) -> Option<Ruling> {
    let axis = ruling.orientation.position_axis();
    let cross = axis.cross();
    if ruling.position < region.lo(axis) - RULING_QUERY_SLACK
        || ruling.position > region.hi(axis) + RULING_QUERY_SLACK
    {
        return None;
    }
    ruling
        .clipped(region.lo(cross), region.hi(cross))
        .filter(|r| r.length() >= MIN_CLIPPED_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_are_clipped_and_sorted() {
        let region = Rect::new(0.0, 0.0, 100.0, 50.0);
        let index = RegionLines::from_rulings(
            &region,
            [
                Ruling::horizontal(40.0, -20.0, 200.0),
                Ruling::horizontal(10.0, 50.0, 80.0),
                Ruling::horizontal(10.0, 5.0, 30.0),
                Ruling::vertical(60.0, 0.0, 80.0),
                Ruling::vertical(300.0, 0.0, 50.0),
            ],
        );
        let h: Vec<(f64, f64, f64)> = index
            .horizontal
            .iter()
            .map(|r| (r.position, r.start, r.end))
            .collect();
        assert_eq!(
            h,
            vec![(10.0, 5.0, 30.0), (10.0, 50.0, 80.0), (40.0, 0.0, 100.0)]
        );
        assert_eq!(index.vertical.len(), 1);
        assert_eq!(index.vertical[0].end, 50.0);
    }

    #[test]
    fn test_corner_touch_is_dropped() {
        let region = Rect::new(0.0, 0.0, 100.0, 50.0);
        let index = RegionLines::from_rulings(&region, [Ruling::vertical(50.0, 50.0, 90.0)]);
        assert!(index.is_empty());
    }

    #[test]
    fn test_clipped_to_sub_region() {
        let region = Rect::new(0.0, 0.0, 100.0, 100.0);
        let index = RegionLines::from_rulings(
            &region,
            [
                Ruling::horizontal(50.0, 0.0, 100.0),
                Ruling::vertical(70.0, 0.0, 100.0),
            ],
        );
        let sub = index.clipped_to(&Rect::new(0.0, 0.0, 60.0, 100.0));
        assert_eq!(sub.horizontal[0].end, 60.0);
        assert!(sub.vertical.is_empty());
    }
}
