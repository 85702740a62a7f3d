//! Region reconstruction end to end.
//!
//! Covers the properties a finished grid must have:
//! - complete rulings reproduce their own intersection
//! - missing borders and segments are filled without overlap
//! - re-running on any produced cell yields that cell
//! - output is deterministic and stable under larger merge tolerances

use cellfill_core::grid::{RegionOptions, grid_cells, reconstruct_region};
use cellfill_core::{GridError, PageContent, Rect, Ruling, TextFragment, ToleranceProfile};

fn page(width: f64, height: f64, rulings: Vec<Ruling>) -> PageContent {
    PageContent::new(Rect::new(0.0, 0.0, width, height), rulings, vec![]).unwrap()
}

fn full_grid(xs: &[f64], ys: &[f64]) -> Vec<Ruling> {
    let (x0, x1) = (xs[0], xs[xs.len() - 1]);
    let (y0, y1) = (ys[0], ys[ys.len() - 1]);
    ys.iter()
        .map(|&y| Ruling::horizontal(y, x0, x1))
        .chain(xs.iter().map(|&x| Ruling::vertical(x, y0, y1)))
        .collect()
}

/// Three rows by three columns with the middle third of x=100 missing.
fn interrupted_grid() -> Vec<Ruling> {
    let mut rulings = full_grid(&[0.0, 100.0, 200.0, 300.0], &[0.0, 33.0, 66.0, 100.0]);
    rulings.retain(|r| !(r.orientation == cellfill_core::Orientation::Vertical && r.position == 100.0));
    rulings.push(Ruling::vertical(100.0, 0.0, 33.0));
    rulings.push(Ruling::vertical(100.0, 66.0, 100.0));
    rulings
}

fn cells_of(page: &PageContent, region: Rect) -> Vec<Rect> {
    reconstruct_region(page, &region, &RegionOptions::default())
        .unwrap()
        .rects()
}

fn assert_disjoint(cells: &[Rect]) {
    for (i, a) in cells.iter().enumerate() {
        for b in &cells[i + 1..] {
            assert!(a.overlap_ratio(b) < 0.1, "{a:?} overlaps {b:?}");
        }
    }
}

/// Share of sample points in `region` that no cell covers.
fn uncovered_share(region: &Rect, cells: &[Rect]) -> f64 {
    let step = 2.0;
    let (mut total, mut open) = (0usize, 0usize);
    let mut y = region.top + step / 2.0;
    while y < region.bottom() {
        let mut x = region.left + step / 2.0;
        while x < region.right() {
            total += 1;
            if !cells
                .iter()
                .any(|c| c.left <= x && x <= c.right() && c.top <= y && y <= c.bottom())
            {
                open += 1;
            }
            x += step;
        }
        y += step;
    }
    open as f64 / total as f64
}

/// Small deterministic generator so noisy layouts are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next_unit(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    fn jitter(&mut self, amplitude: f64) -> f64 {
        (self.next_unit() * 2.0 - 1.0) * amplitude
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_unit() < p
    }
}

const GRID_XS: [f64; 5] = [0.0, 80.0, 160.0, 240.0, 320.0];
const GRID_YS: [f64; 5] = [0.0, 40.0, 80.0, 120.0, 160.0];
const GRID_REGION: Rect = Rect::new(0.0, 0.0, 320.0, 160.0);

/// A 4x4 grid drawn one segment per cell side, every segment displaced and
/// its ends moved by up to `amplitude`. Interior segments are dropped with
/// probability `drop`.
fn jittered_grid(rng: &mut Lcg, amplitude: f64, drop: f64) -> Vec<Ruling> {
    let last = GRID_XS.len() - 1;
    let mut rulings = Vec::new();
    for (row, &y) in GRID_YS.iter().enumerate() {
        for col in 0..last {
            let interior = row != 0 && row != last;
            if interior && rng.chance(drop) {
                continue;
            }
            rulings.push(Ruling::horizontal(
                y + rng.jitter(amplitude),
                GRID_XS[col] + rng.jitter(amplitude),
                GRID_XS[col + 1] + rng.jitter(amplitude),
            ));
        }
    }
    for (col, &x) in GRID_XS.iter().enumerate() {
        for row in 0..last {
            let interior = col != 0 && col != last;
            if interior && rng.chance(drop) {
                continue;
            }
            rulings.push(Ruling::vertical(
                x + rng.jitter(amplitude),
                GRID_YS[row] + rng.jitter(amplitude),
                GRID_YS[row + 1] + rng.jitter(amplitude),
            ));
        }
    }
    rulings
}

/// Whole grid lines displaced by up to `amplitude`, about half of them
/// stroked twice a fraction of a point apart.
fn doubled_grid(rng: &mut Lcg, amplitude: f64) -> Vec<Ruling> {
    let (x0, x1) = (GRID_XS[0], GRID_XS[GRID_XS.len() - 1]);
    let (y0, y1) = (GRID_YS[0], GRID_YS[GRID_YS.len() - 1]);
    let mut rulings = Vec::new();
    for &y in &GRID_YS {
        let y = y + rng.jitter(amplitude);
        rulings.push(Ruling::horizontal(y, x0, x1));
        if rng.chance(0.5) {
            rulings.push(Ruling::horizontal(y + 0.3 + rng.next_unit() * 0.6, x0, x1));
        }
    }
    for &x in &GRID_XS {
        let x = x + rng.jitter(amplitude);
        rulings.push(Ruling::vertical(x, y0, y1));
        if rng.chance(0.5) {
            rulings.push(Ruling::vertical(x + 0.3 + rng.next_unit() * 0.6, y0, y1));
        }
    }
    rulings
}

fn render(cells: &[Rect]) -> String {
    cells
        .iter()
        .map(|r| format!("{} {} {} {}", r.left, r.top, r.width, r.height))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_missing_right_border_is_completed() {
    let p = page(
        300.0,
        100.0,
        vec![
            Ruling::horizontal(0.0, 0.0, 300.0),
            Ruling::horizontal(50.0, 0.0, 300.0),
            Ruling::horizontal(100.0, 0.0, 300.0),
            Ruling::vertical(0.0, 0.0, 100.0),
            Ruling::vertical(150.0, 0.0, 100.0),
        ],
    );
    let cells = cells_of(&p, Rect::new(0.0, 0.0, 300.0, 100.0));
    insta::assert_snapshot!(render(&cells), @r"
    0 0 150 50
    150 0 150 50
    0 50 150 50
    150 50 150 50
    ");
}

#[test]
fn test_no_rulings_yields_region() {
    let p = page(400.0, 300.0, vec![]);
    let region = Rect::new(20.0, 30.0, 200.0, 120.0);
    assert_eq!(cells_of(&p, region), vec![region]);
}

#[test]
fn test_complete_grid_equals_intersection() {
    let xs = [0.0, 80.0, 160.0, 240.0, 320.0];
    let ys = [0.0, 40.0, 80.0, 120.0];
    let rulings = full_grid(&xs, &ys);
    let p = page(320.0, 120.0, rulings.clone());

    let (h, v): (Vec<Ruling>, Vec<Ruling>) = rulings
        .into_iter()
        .partition(|r| r.orientation == cellfill_core::Orientation::Horizontal);
    let mut expected = grid_cells(&h, &v, 3.0);
    expected.sort_by(|a, b| a.reading_order(b));

    let cells = cells_of(&p, Rect::new(0.0, 0.0, 320.0, 120.0));
    assert_eq!(cells.len(), 12);
    assert_eq!(cells, expected);
}

#[test]
fn test_interrupted_segment_yields_wide_cell() {
    let p = page(300.0, 100.0, interrupted_grid());
    let cells = cells_of(&p, Rect::new(0.0, 0.0, 300.0, 100.0));
    assert_eq!(cells.len(), 8);
    assert!(cells.contains(&Rect::new(0.0, 33.0, 200.0, 33.0)));
    assert!(!cells.contains(&Rect::new(0.0, 33.0, 100.0, 33.0)));
    assert_disjoint(&cells);
}

#[test]
fn test_doubled_ruling_merges() {
    let p = page(
        300.0,
        100.0,
        vec![
            Ruling::horizontal(0.0, 0.0, 300.0),
            Ruling::horizontal(50.0, 0.0, 300.0),
            Ruling::horizontal(100.0, 0.0, 300.0),
            Ruling::vertical(0.0, 0.0, 100.0),
            Ruling::vertical(149.0, 0.0, 100.0),
            Ruling::vertical(151.0, 0.0, 100.0),
            Ruling::vertical(300.0, 0.0, 100.0),
        ],
    );
    let cells = cells_of(&p, Rect::new(0.0, 0.0, 300.0, 100.0));
    assert_eq!(
        cells,
        vec![
            Rect::new(0.0, 0.0, 150.0, 50.0),
            Rect::new(150.0, 0.0, 150.0, 50.0),
            Rect::new(0.0, 50.0, 150.0, 50.0),
            Rect::new(150.0, 50.0, 150.0, 50.0),
        ]
    );
}

#[test]
fn test_outputs_never_overlap() {
    let layouts = vec![
        interrupted_grid(),
        full_grid(&[0.0, 100.0, 300.0], &[0.0, 50.0, 100.0]),
        vec![
            Ruling::horizontal(50.0, 0.0, 120.0),
            Ruling::vertical(100.0, 0.0, 100.0),
            Ruling::vertical(200.0, 0.0, 60.0),
        ],
        vec![Ruling::vertical(300.0, 80.0, 100.0), Ruling::horizontal(40.0, 30.0, 260.0)],
    ];
    for rulings in layouts {
        let p = page(300.0, 100.0, rulings);
        let cells = cells_of(&p, Rect::new(0.0, 0.0, 300.0, 100.0));
        assert!(!cells.is_empty());
        assert_disjoint(&cells);
    }
}

#[test]
fn test_reconstruction_is_idempotent() {
    for rulings in [interrupted_grid(), full_grid(&[0.0, 150.0, 300.0], &[0.0, 50.0, 100.0])] {
        let p = page(300.0, 100.0, rulings);
        for cell in cells_of(&p, Rect::new(0.0, 0.0, 300.0, 100.0)) {
            assert_eq!(cells_of(&p, cell), vec![cell]);
        }
    }
}

#[test]
fn test_larger_merge_tolerance_never_adds_cells() {
    let p = page(
        200.0,
        100.0,
        full_grid(&[0.0, 200.0], &[0.0, 48.0, 51.0, 100.0]),
    );
    let region = Rect::new(0.0, 0.0, 200.0, 100.0);
    let mut previous = usize::MAX;
    for h_merge in [0.5, 1.0, 2.0, 4.0, 6.0] {
        let options = RegionOptions {
            profile: Some(ToleranceProfile {
                h_merge,
                ..ToleranceProfile::default()
            }),
            ..RegionOptions::default()
        };
        let count = reconstruct_region(&p, &region, &options).unwrap().cells.len();
        assert!(count <= previous, "h_merge {h_merge}: {count} > {previous}");
        previous = count;
    }
}

#[test]
fn test_reconstruction_is_deterministic() {
    let text = vec![
        TextFragment::new(Rect::new(10.0, 10.0, 40.0, 9.0), "Item"),
        TextFragment::new(Rect::new(210.0, 40.0, 50.0, 9.0), "Total"),
    ];
    let p = PageContent::new(Rect::new(0.0, 0.0, 300.0, 100.0), interrupted_grid(), text).unwrap();
    let region = Rect::new(0.0, 0.0, 300.0, 100.0);
    let first = reconstruct_region(&p, &region, &RegionOptions::default()).unwrap();
    let second = reconstruct_region(&p, &region, &RegionOptions::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_invalid_region_is_rejected() {
    let p = page(100.0, 100.0, vec![]);
    for region in [
        Rect::new(0.0, 0.0, -5.0, 10.0),
        Rect::new(0.0, 0.0, 10.0, 0.0),
        Rect::new(f64::NAN, 0.0, 10.0, 10.0),
    ] {
        let err = reconstruct_region(&p, &region, &RegionOptions::default());
        assert!(matches!(err, Err(GridError::InvalidRegion { .. })), "{region:?}");
    }
}

// ============================================================================
// Seeded layouts
// ============================================================================

#[test]
fn test_jittered_grid_is_covered_without_overlap() {
    for seed in 1..=20u64 {
        let mut rng = Lcg(seed);
        let p = page(330.0, 170.0, jittered_grid(&mut rng, 1.5, 0.0));
        let cells = cells_of(&p, GRID_REGION);
        assert_disjoint(&cells);
        assert!(
            cells.iter().all(|c| GRID_REGION.nearly_contains(c, 3.0)),
            "seed {seed}: cell outside region"
        );
        let open = uncovered_share(&GRID_REGION, &cells);
        assert!(open < 0.05, "seed {seed}: {open} uncovered\n{}", render(&cells));
    }
}

#[test]
fn test_noisy_grid_is_covered_without_overlap() {
    for seed in 1..=20u64 {
        let mut rng = Lcg(seed);
        let p = page(330.0, 170.0, jittered_grid(&mut rng, 1.0, 0.15));
        let cells = cells_of(&p, GRID_REGION);
        assert!(!cells.is_empty(), "seed {seed}");
        assert_disjoint(&cells);
        let open = uncovered_share(&GRID_REGION, &cells);
        assert!(open < 0.1, "seed {seed}: {open} uncovered\n{}", render(&cells));
    }
}

#[test]
fn test_jittered_cells_reconstruct_to_themselves() {
    for seed in [3u64, 11] {
        let mut rng = Lcg(seed);
        let p = page(330.0, 170.0, jittered_grid(&mut rng, 1.5, 0.0));
        for cell in cells_of(&p, GRID_REGION) {
            let again = cells_of(&p, cell);
            assert_eq!(again.len(), 1, "seed {seed}: {cell:?} -> {again:?}");
            assert!(again[0].nearly_equals(&cell, 2.5), "seed {seed}: {cell:?} -> {again:?}");
        }
    }
}

#[test]
fn test_merge_tolerance_is_monotone_on_doubled_strokes() {
    for seed in 1..=12u64 {
        let mut rng = Lcg(seed);
        let p = page(330.0, 170.0, doubled_grid(&mut rng, 1.5));
        let mut previous = usize::MAX;
        for merge in [0.5, 1.0, 2.0, 4.0, 5.0, 6.0] {
            let options = RegionOptions {
                profile: Some(ToleranceProfile {
                    h_merge: merge,
                    v_merge: merge,
                    ..ToleranceProfile::default()
                }),
                ..RegionOptions::default()
            };
            let cells = reconstruct_region(&p, &GRID_REGION, &options).unwrap().rects();
            assert_disjoint(&cells);
            assert!(
                cells.len() <= previous,
                "seed {seed}, merge {merge}: {} > {previous}",
                cells.len()
            );
            previous = cells.len();
        }
    }
}
