//! Cell text: assigning fragments to finished cells, and splitting cells
//! that clearly hold two columns of text.

use itertools::Itertools;

use crate::arena::{Cell, Provenance};
use crate::geometry::Rect;
use crate::page::{PageSource, TextFragment};
use crate::tolerance::ToleranceProfile;

/// A cell with the text whose centre falls inside it.
#[derive(Clone, Debug, PartialEq)]
pub struct CellText {
    pub cell: Cell,
    pub text: String,
}

/// Assign every fragment to the cell containing its centre.
///
/// Cells are treated as half-open boxes so a centre on a shared edge lands
/// in exactly one cell. Fragments on one line (tops within `same_line`) are
/// joined by a space, lines by a newline.
pub fn assign_text(cells: &[Cell], fragments: &[&TextFragment], same_line: f64) -> Vec<CellText> {
    enum EventKind {
        Add,
        Remove,
    }

    struct Event {
        y: f64,
        kind: EventKind,
        cell: usize,
    }

    let mut events: Vec<Event> = Vec::with_capacity(cells.len() * 2);
    for (cell, c) in cells.iter().enumerate() {
        events.push(Event {
            y: c.rect.top,
            kind: EventKind::Add,
            cell,
        });
        events.push(Event {
            y: c.rect.bottom(),
            kind: EventKind::Remove,
            cell,
        });
    }
    let kind_order = |kind: &EventKind| match kind {
        EventKind::Add => 0,
        EventKind::Remove => 1,
    };
    events.sort_by(|a, b| {
        a.y.total_cmp(&b.y)
            .then(kind_order(&a.kind).cmp(&kind_order(&b.kind)))
            .then(a.cell.cmp(&b.cell))
    });

    let mut centres: Vec<(usize, f64, f64)> = fragments
        .iter()
        .enumerate()
        .filter(|(_, t)| !t.is_blank())
        .map(|(idx, t)| {
            let (x, y) = t.bbox.center();
            (idx, x, y)
        })
        .collect();
    centres.sort_by(|a, b| a.2.total_cmp(&b.2).then(a.0.cmp(&b.0)));

    let mut assigned: Vec<Vec<usize>> = vec![Vec::new(); cells.len()];
    let mut active: Vec<usize> = Vec::new();
    let mut next_event = 0usize;
    for (idx, x, y) in centres {
        while let Some(event) = events.get(next_event)
            && event.y <= y
        {
            match event.kind {
                EventKind::Add => active.push(event.cell),
                EventKind::Remove => active.retain(|c| *c != event.cell),
            }
            next_event += 1;
        }
        let hit = active
            .iter()
            .copied()
            .filter(|&c| {
                let r = &cells[c].rect;
                x >= r.left && x < r.right() && y >= r.top && y < r.bottom()
            })
            .min();
        if let Some(cell) = hit {
            assigned[cell].push(idx);
        }
    }

    cells
        .iter()
        .zip(assigned)
        .map(|(cell, indices)| {
            let picked: Vec<&TextFragment> = indices.into_iter().map(|i| fragments[i]).collect();
            CellText {
                cell: *cell,
                text: join_lines(&picked, same_line),
            }
        })
        .collect()
}

/// Join fragments into text: line by line from the top, left to right
/// within a line.
pub(crate) fn join_lines(fragments: &[&TextFragment], same_line: f64) -> String {
    let mut sorted: Vec<&TextFragment> = fragments.to_vec();
    sorted.sort_by(|a, b| a.bbox.top.total_cmp(&b.bbox.top).then(a.bbox.left.total_cmp(&b.bbox.left)));

    let mut lines: Vec<Vec<&TextFragment>> = Vec::new();
    for fragment in sorted {
        match lines.last_mut() {
            Some(line) if (fragment.bbox.top - line[0].bbox.top).abs() < same_line => line.push(fragment),
            _ => lines.push(vec![fragment]),
        }
    }

    lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| a.bbox.left.total_cmp(&b.bbox.left));
            line.iter().map(|t| t.text.trim()).join(" ")
        })
        .join("\n")
}

/// Split cells holding exactly two fragments on one line separated by a
/// gap wider than `profile.split_gap_chars` average characters.
///
/// The split falls in the middle of the gap; both halves are synthesized.
pub fn split_wide_cells<P: PageSource + ?Sized>(cells: Vec<Cell>, page: &P, profile: &ToleranceProfile) -> Vec<Cell> {
    let min_gap = profile.split_gap_chars * profile.metrics.avg_char_width;
    let mut out = Vec::with_capacity(cells.len());
    for cell in cells {
        match split_point(&cell.rect, page, profile.same_line, min_gap) {
            Some(x) => {
                let r = cell.rect;
                out.push(Cell::new(Rect::from_edges(r.left, r.top, x, r.bottom()), Provenance::Synthesized));
                out.push(Cell::new(Rect::from_edges(x, r.top, r.right(), r.bottom()), Provenance::Synthesized));
            }
            None => out.push(cell),
        }
    }
    out
}

fn split_point<P: PageSource + ?Sized>(rect: &Rect, page: &P, same_line: f64, min_gap: f64) -> Option<f64> {
    let text: Vec<&TextFragment> = page.text_in(rect).into_iter().filter(|t| !t.is_blank()).collect();
    let [a, b] = text.as_slice() else {
        return None;
    };
    if (a.bbox.top - b.bbox.top).abs() >= same_line {
        return None;
    }
    let (left, right) = if a.bbox.left <= b.bbox.left { (a, b) } else { (b, a) };
    let gap = right.bbox.left - left.bbox.right();
    (gap > min_gap).then_some((left.bbox.right() + right.bbox.left) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageContent;

    #[test]
    fn test_text_goes_to_one_cell() {
        let cells = vec![
            Cell::ruling(Rect::new(0.0, 0.0, 100.0, 50.0)),
            Cell::ruling(Rect::new(100.0, 0.0, 100.0, 50.0)),
        ];
        let a = TextFragment::new(Rect::new(10.0, 10.0, 30.0, 10.0), "Name");
        let b = TextFragment::new(Rect::new(45.0, 11.0, 20.0, 10.0), "first");
        let c = TextFragment::new(Rect::new(10.0, 30.0, 30.0, 10.0), "second");
        // Centre exactly on x=100 belongs to the right cell.
        let d = TextFragment::new(Rect::new(90.0, 10.0, 20.0, 10.0), "edge");
        let texts = assign_text(&cells, &[&c, &b, &a, &d], 4.0);
        assert_eq!(texts[0].text, "Name first\nsecond");
        assert_eq!(texts[1].text, "edge");
    }

    #[test]
    fn test_empty_cell_has_empty_text() {
        let cells = vec![Cell::ruling(Rect::new(0.0, 0.0, 10.0, 10.0))];
        assert_eq!(assign_text(&cells, &[], 4.0)[0].text, "");
    }

    #[test]
    fn test_split_wide_cell() {
        let page = PageContent::new(
            Rect::new(0.0, 0.0, 1000.0, 100.0),
            vec![],
            vec![
                TextFragment::new(Rect::new(10.0, 10.0, 4.0, 10.0), "ab"),
                TextFragment::new(Rect::new(900.0, 10.0, 4.0, 10.0), "cd"),
            ],
        )
        .unwrap();
        let profile = ToleranceProfile::for_region(&page, &page.bounds(), None);
        let cells = split_wide_cells(vec![Cell::ruling(Rect::new(0.0, 0.0, 1000.0, 50.0))], &page, &profile);
        assert_eq!(
            cells,
            vec![
                Cell::synthesized(Rect::new(0.0, 0.0, 457.0, 50.0)),
                Cell::synthesized(Rect::new(457.0, 0.0, 543.0, 50.0)),
            ]
        );
    }

    #[test]
    fn test_narrow_gap_is_not_split() {
        let page = PageContent::new(
            Rect::new(0.0, 0.0, 300.0, 100.0),
            vec![],
            vec![
                TextFragment::new(Rect::new(10.0, 10.0, 20.0, 10.0), "ab"),
                TextFragment::new(Rect::new(200.0, 10.0, 20.0, 10.0), "cd"),
            ],
        )
        .unwrap();
        let profile = ToleranceProfile::for_region(&page, &page.bounds(), None);
        let cell = Cell::ruling(Rect::new(0.0, 0.0, 300.0, 50.0));
        assert_eq!(split_wide_cells(vec![cell], &page, &profile), vec![cell]);
    }
}
