use crate::rect::Rect;
use nalgebra::DMatrix;

/*-----------------------------------------------------------------------------
CostMatrix
-----------------------------------------------------------------------------*/

/// Square association weights between previous tracks (rows) and current
/// detections (columns).
///
/// The matrix is padded to `max(P, C)` on both axes. Rows `>= P` and columns
/// `>= C` are padding and hold the sentinel; a cell is never padding on both
/// axes at once.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    weights: DMatrix<i64>,
    real_rows: usize,
    real_cols: usize,
}

impl CostMatrix {
    pub fn build(
        previous: &[Rect<f32>],
        current: &[Rect<f32>],
        scale: i64,
        sentinel: i64,
    ) -> Self {
        let real_rows = previous.len();
        let real_cols = current.len();
        let n = real_rows.max(real_cols);

        let mut weights = DMatrix::from_element(n, n, sentinel);
        for (i, prev) in previous.iter().enumerate() {
            for (j, curr) in current.iter().enumerate() {
                weights[(i, j)] = Self::scaled_iou(prev, curr, scale);
            }
        }

        Self {
            weights,
            real_rows,
            real_cols,
        }
    }

    /// `round(IoU * scale)` with IoU clamped to `[0, 1]`.
    pub fn scaled_iou(a: &Rect<f32>, b: &Rect<f32>, scale: i64) -> i64 {
        let iou = a.calc_iou(b).clamp(0.0, 1.0) as f64;
        (iou * scale as f64).round() as i64
    }

    pub fn dim(&self) -> usize {
        self.weights.nrows()
    }

    pub fn real_rows(&self) -> usize {
        self.real_rows
    }

    pub fn real_cols(&self) -> usize {
        self.real_cols
    }

    #[inline(always)]
    pub fn is_real_row(&self, i: usize) -> bool {
        i < self.real_rows
    }

    #[inline(always)]
    pub fn is_real_col(&self, j: usize) -> bool {
        j < self.real_cols
    }

    pub fn get(&self, i: usize, j: usize) -> i64 {
        self.weights[(i, j)]
    }

    pub fn weights(&self) -> &DMatrix<i64> {
        &self.weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x1: f32, y1: f32, x2: f32, y2: f32) -> Rect<f32> {
        Rect::from_corners(x1, y1, x2, y2)
    }

    #[test]
    fn test_more_tracks_than_detections() {
        let previous = vec![
            rect(0.0, 0.0, 10.0, 10.0),
            rect(100.0, 100.0, 110.0, 110.0),
            rect(200.0, 0.0, 220.0, 20.0),
        ];
        let current = vec![rect(0.0, 0.0, 10.0, 10.0)];
        let cost = CostMatrix::build(&previous, &current, 1000, -1000);

        assert_eq!(cost.dim(), 3);
        assert_eq!(cost.get(0, 0), 1000);
        assert_eq!(cost.get(1, 0), 0);
        assert_eq!(cost.get(2, 0), 0);
        for i in 0..3 {
            for j in 1..3 {
                assert!(!cost.is_real_col(j));
                assert_eq!(cost.get(i, j), -1000);
            }
        }
    }

    #[test]
    fn test_more_detections_than_tracks() {
        let previous = vec![rect(0.0, 0.0, 10.0, 10.0)];
        let current =
            vec![rect(2.0, 0.0, 12.0, 10.0), rect(50.0, 50.0, 60.0, 60.0)];
        let cost = CostMatrix::build(&previous, &current, 1000, -1000);

        assert_eq!(cost.dim(), 2);
        assert_eq!((cost.real_rows(), cost.real_cols()), (1, 2));
        // 99 / 143
        assert_eq!(cost.get(0, 0), 692);
        assert_eq!(cost.get(0, 1), 0);
        assert!(!cost.is_real_row(1));
        assert_eq!(cost.get(1, 0), -1000);
        assert_eq!(cost.get(1, 1), -1000);
    }

    #[test]
    fn test_real_cells_in_range_and_square() {
        let previous: Vec<_> = (0..4)
            .map(|i| rect(i as f32 * 7.0, 0.0, i as f32 * 7.0 + 12.0, 12.0))
            .collect();
        let current: Vec<_> = (0..6)
            .map(|i| rect(i as f32 * 5.0, 1.0, i as f32 * 5.0 + 10.0, 13.0))
            .collect();
        let cost = CostMatrix::build(&previous, &current, 1000, -1000);

        assert_eq!(cost.weights().nrows(), 6);
        assert_eq!(cost.weights().ncols(), 6);
        for i in 0..cost.dim() {
            for j in 0..cost.dim() {
                let v = cost.get(i, j);
                if cost.is_real_row(i) && cost.is_real_col(j) {
                    assert!((0..=1000).contains(&v));
                    let iou =
                        CostMatrix::scaled_iou(&previous[i], &current[j], 1000);
                    assert_eq!(v, iou);
                } else {
                    assert_eq!(v, -1000);
                }
            }
        }
    }

    #[test]
    fn test_empty_sides() {
        let cost = CostMatrix::build(&[], &[], 1000, -1000);
        assert_eq!(cost.dim(), 0);

        let only_track = [rect(0.0, 0.0, 1.0, 1.0)];
        let cost = CostMatrix::build(&only_track, &[], 1000, -1000);
        assert_eq!(cost.dim(), 1);
        assert_eq!((cost.real_rows(), cost.real_cols()), (1, 0));
        assert_eq!(cost.get(0, 0), -1000);
    }
}
