//! Tolerance banding of cells.

use std::cmp::Ordering;

/// Group `items` into bands of similar `key`.
///
/// Items are stably sorted by `key` (ties by `tie`); an item joins the
/// current band while its key is within `tolerance` of the band's first
/// item, so bands never chain across a slow drift.
pub(crate) fn bands<T, K, O>(mut items: Vec<T>, key: K, tie: O, tolerance: f64) -> Vec<Vec<T>>
where
    K: Fn(&T) -> f64,
    O: Fn(&T, &T) -> Ordering,
{
    items.sort_by(|a, b| key(a).total_cmp(&key(b)).then_with(|| tie(a, b)));
    let mut out: Vec<Vec<T>> = Vec::new();
    let mut head = f64::NAN;
    for item in items {
        let k = key(&item);
        match out.last_mut() {
            Some(band) if (k - head).abs() < tolerance => band.push(item),
            _ => {
                head = k;
                out.push(vec![item]);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands_anchor_on_head() {
        let xs = vec![0.0, 1.0, 2.0, 3.0, 10.0, 10.5];
        let grouped = bands(xs, |x| *x, |_, _| Ordering::Equal, 2.5);
        assert_eq!(grouped, vec![vec![0.0, 1.0, 2.0], vec![3.0], vec![10.0, 10.5]]);
    }

    #[test]
    fn test_bands_are_stable() {
        let items = vec![(5.0, 'b'), (0.0, 'z'), (5.2, 'a'), (0.1, 'y')];
        let grouped = bands(items, |p| p.0, |a, b| a.1.cmp(&b.1), 1.0);
        assert_eq!(
            grouped,
            vec![vec![(0.0, 'z'), (0.1, 'y')], vec![(5.0, 'b'), (5.2, 'a')]]
        );
    }
}
