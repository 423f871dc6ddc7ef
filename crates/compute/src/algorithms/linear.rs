//! Ridge-regularised least squares via the normal equations.

/// Fit `y ≈ X·β` with an L2 penalty `lambda` on every coefficient except the
/// intercept (column 0 when `intercept` is true).
///
/// Returns `None` when the system is singular even after regularisation.
pub fn ridge_fit(rows: &[Vec<f64>], y: &[f64], lambda: f64, intercept: bool) -> Option<Vec<f64>> {
    let n = rows.len().min(y.len());
    if n == 0 {
        return None;
    }
    let p = rows[0].len();
    if p == 0 || rows.iter().any(|r| r.len() != p) {
        return None;
    }

    // Gram matrix XᵀX + λI and right-hand side Xᵀy.
    let mut a = vec![vec![0.0; p]; p];
    let mut b = vec![0.0; p];
    for (row, &target) in rows.iter().zip(y).take(n) {
        for i in 0..p {
            b[i] += row[i] * target;
            for j in i..p {
                a[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..p {
        for j in 0..i {
            a[i][j] = a[j][i];
        }
        if !(intercept && i == 0) {
            a[i][i] += lambda;
        }
    }

    solve(a, b)
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

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
    for i in (0..n).rev() {
        let tail: f64 = ((i + 1)..n).map(|k| a[i][k] * x[k]).sum();
        x[i] = (b[i] - tail) / a[i][i];
    }
    x.iter().all(|v| v.is_finite()).then_some(x)
}
