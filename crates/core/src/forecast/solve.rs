// Dense linear solves for small normal-equation systems.

const PIVOT_EPS: f64 = 1e-12;

/// Solves `a * x = b` in place with partial pivoting. `a` is row-major `n x n`.
/// Returns `None` when the system is singular (or numerically close to it).
pub(crate) fn gaussian_solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    if a.len() != n || a.iter().any(|row| row.len() != n) {
        return None;
    }

    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
        .max(1.0);

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&i, &j| {
            a[i][col]
                .abs()
                .partial_cmp(&a[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot_row][col].abs() <= PIVOT_EPS * scale {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    x.iter().all(|v| v.is_finite()).then_some(x)
}

/// Ordinary least squares with an optional per-coefficient ridge penalty.
pub(crate) fn least_squares(rows: &[Vec<f64>], y: &[f64], ridge: &[f64]) -> Option<Vec<f64>> {
    let p = ridge.len();
    if rows.len() != y.len() || rows.iter().any(|r| r.len() != p) {
        return None;
    }

    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];
    for (row, &target) in rows.iter().zip(y) {
        for i in 0..p {
            xty[i] += row[i] * target;
            for j in 0..p {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for (i, penalty) in ridge.iter().enumerate() {
        xtx[i][i] += penalty;
    }

    gaussian_solve(xtx, xty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_small_system() {
        // 2x + y = 5, x - y = 1
        let x = gaussian_solve(vec![vec![2.0, 1.0], vec![1.0, -1.0]], vec![5.0, 1.0]).unwrap();
        assert!((x[0] - 2.0).abs() < 1e-9);
        assert!((x[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn needs_pivoting() {
        let x = gaussian_solve(vec![vec![0.0, 1.0], vec![1.0, 0.0]], vec![3.0, 4.0]).unwrap();
        assert!((x[0] - 4.0).abs() < 1e-9);
        assert!((x[1] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn detects_singular_system() {
        assert!(gaussian_solve(vec![vec![1.0, 2.0], vec![2.0, 4.0]], vec![1.0, 2.0]).is_none());
    }

    #[test]
    fn least_squares_recovers_line() {
        let rows: Vec<Vec<f64>> = (0..5).map(|t| vec![1.0, t as f64]).collect();
        let y: Vec<f64> = (0..5).map(|t| 3.0 + 2.0 * t as f64).collect();
        let beta = least_squares(&rows, &y, &[0.0, 0.0]).unwrap();
        assert!((beta[0] - 3.0).abs() < 1e-9);
        assert!((beta[1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn least_squares_rejects_rank_deficient_design() {
        // Second column duplicates the first.
        let rows: Vec<Vec<f64>> = (0..4).map(|_| vec![1.0, 1.0]).collect();
        let y = vec![1.0, 2.0, 3.0, 4.0];
        assert!(least_squares(&rows, &y, &[0.0, 0.0]).is_none());
    }

    #[test]
    fn ridge_makes_duplicate_columns_solvable() {
        let rows: Vec<Vec<f64>> = (0..4).map(|_| vec![1.0, 1.0]).collect();
        let y = vec![2.0; 4];
        let beta = least_squares(&rows, &y, &[0.0, 0.1]).unwrap();
        let fitted = beta[0] + beta[1];
        assert!((fitted - 2.0).abs() < 1e-9, "got {fitted}");
    }
}
