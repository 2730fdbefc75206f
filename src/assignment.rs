use crate::{cost_matrix::CostMatrix, error::TrackError};
use nalgebra::DMatrix;

/* -----------------------------------------------------------------------------
 * assignment.rs - Kuhn-Munkres maximum-weight perfect matching
 * ----------------------------------------------------------------------------- */

/// Solve the tracker's association matrix. `perm[row]` is the matched column.
pub fn solve(cost: &CostMatrix) -> Result<Vec<usize>, TrackError> {
    max_weight_assignment(cost.weights())
}

/// Maximum-weight perfect matching on a square integer matrix, O(n^3).
///
/// Runs the potential-based Hungarian method on the negated weights. Ties are
/// broken by whichever optimum the search reaches first.
pub fn max_weight_assignment(
    weights: &DMatrix<i64>,
) -> Result<Vec<usize>, TrackError> {
    let n = weights.nrows();
    if n != weights.ncols() {
        return Err(TrackError::AssignmentError(format!(
            "cost matrix must be square, got {}x{}",
            n,
            weights.ncols()
        )));
    }
    if n == 0 {
        return Ok(Vec::new());
    }

    // keep potentials and slack sums far from overflow
    let limit = i64::MAX / 4 / (n as i64 + 1);
    if let Some(v) =
        weights.iter().find(|v| v.unsigned_abs() > limit.unsigned_abs())
    {
        return Err(TrackError::AssignmentError(format!(
            "weight {} exceeds the solvable magnitude {}",
            v, limit
        )));
    }

    let inf = i64::MAX / 2;
    // 1-based; index 0 is the virtual root column
    let mut u = vec![0i64; n + 1];
    let mut v = vec![0i64; n + 1];
    let mut p = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0;
        let mut minv = vec![inf; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = inf;
            let mut j1 = 0;
            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let cur = -weights[(i0 - 1, j - 1)] - u[i0] - v[j];
                if cur < minv[j] {
                    minv[j] = cur;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            for j in 0..=n {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        // augment along the alternating path
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut perm = vec![usize::MAX; n];
    for j in 1..=n {
        perm[p[j] - 1] = j - 1;
    }
    check_permutation(&perm)?;
    Ok(perm)
}

fn check_permutation(perm: &[usize]) -> Result<(), TrackError> {
    let mut seen = vec![false; perm.len()];
    for (row, &col) in perm.iter().enumerate() {
        if col >= perm.len() || seen[col] {
            return Err(TrackError::AssignmentError(format!(
                "row {} received invalid column {}",
                row, col
            )));
        }
        seen[col] = true;
    }
    Ok(())
}
