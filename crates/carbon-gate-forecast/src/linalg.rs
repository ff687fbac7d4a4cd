//! Dense least squares via the normal equations.

/// Pivots smaller than this are treated as zero.
const SINGULAR_EPS: f64 = 1e-12;

/// Row-major dense matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Creates a `rows × cols` matrix filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.; rows * cols],
        }
    }

    /// Builds a matrix from a slice of rows.
    ///
    /// # Panics
    ///
    /// Panics if the rows differ in length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let cols = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            assert_eq!(row.len(), cols, "ragged matrix rows");
            data.extend_from_slice(row);
        }
        Self {
            rows: rows.len(),
            cols,
            data,
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the element at row `i`, column `j`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    /// Overwrites the element at row `i`, column `j`.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.cols + j] = value;
    }

    /// Returns row `i` as a slice.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Returns `Xᵀ X`.
    pub fn gram(&self) -> Matrix {
        let mut out = Matrix::zeros(self.cols, self.cols);
        for r in 0..self.rows {
            let row = self.row(r);
            for i in 0..self.cols {
                for j in i..self.cols {
                    out.data[i * self.cols + j] += row[i] * row[j];
                }
            }
        }
        for i in 0..self.cols {
            for j in 0..i {
                out.data[i * self.cols + j] = out.data[j * self.cols + i];
            }
        }
        out
    }

    /// Returns `Xᵀ y`.
    ///
    /// # Panics
    ///
    /// Panics if `y.len()` differs from the number of rows.
    pub fn transpose_mul(&self, y: &[f64]) -> Vec<f64> {
        assert_eq!(y.len(), self.rows);
        let mut out = vec![0.; self.cols];
        for (r, y) in y.iter().enumerate() {
            for (acc, x) in out.iter_mut().zip(self.row(r)) {
                *acc += x * y;
            }
        }
        out
    }

    /// Returns `X b`.
    ///
    /// # Panics
    ///
    /// Panics if `b.len()` differs from the number of columns.
    pub fn mul_vec(&self, b: &[f64]) -> Vec<f64> {
        assert_eq!(b.len(), self.cols);
        (0..self.rows).map(|r| dot(self.row(r), b)).collect()
    }
}

/// Dot product over the common prefix of `a` and `b`.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Solves the square system `A x = b` by Gauss-Jordan elimination with partial pivoting.
///
/// Returns `None` if the matrix is singular.
///
/// # Panics
///
/// Panics if `a` is not square or `b` does not match its size.
pub fn solve(mut a: Matrix, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = a.rows;
    assert_eq!(a.cols, n, "matrix must be square");
    assert_eq!(b.len(), n);

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a.get(i, col).abs().total_cmp(&a.get(j, col).abs()))?;
        if a.get(pivot, col).abs() < SINGULAR_EPS {
            return None;
        }
        if pivot != col {
            for j in 0..n {
                a.data.swap(pivot * n + j, col * n + j);
            }
            b.swap(pivot, col);
        }

        let p = a.get(col, col);
        for j in col..n {
            a.data[col * n + j] /= p;
        }
        b[col] /= p;

        for i in 0..n {
            if i == col {
                continue;
            }
            let factor = a.get(i, col);
            if factor == 0. {
                continue;
            }
            for j in col..n {
                a.data[i * n + j] -= factor * a.data[col * n + j];
            }
            b[i] -= factor * b[col];
        }
    }
    Some(b)
}

/// Ordinary least squares: minimizes `|X β - y|²` through the normal equations `XᵀX β = Xᵀy`.
pub fn least_squares(x: &Matrix, y: &[f64]) -> Option<Vec<f64>> {
    solve(x.gram(), x.transpose_mul(y))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_solve_needs_pivoting() {
        // zero in the top-left corner
        let a = Matrix::from_rows(&[vec![0., 2., 1.], vec![1., -2., -3.], vec![-1., 1., 2.]]);
        let x = solve(a, vec![-8., 0., 3.]).unwrap();
        assert_abs_diff_eq!(x[0], -4., epsilon = 1e-12);
        assert_abs_diff_eq!(x[1], -5., epsilon = 1e-12);
        assert_abs_diff_eq!(x[2], 2., epsilon = 1e-12);
    }

    #[test]
    fn test_solve_singular() {
        let a = Matrix::from_rows(&[vec![1., 2.], vec![2., 4.]]);
        assert!(solve(a, vec![1., 2.]).is_none());
    }

    #[test]
    fn test_least_squares_line() {
        // y = 3 + 2x, exactly
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![1., i as f64]).collect();
        let y: Vec<f64> = (0..10).map(|i| 3. + 2. * i as f64).collect();
        let beta = least_squares(&Matrix::from_rows(&rows), &y).unwrap();
        assert_abs_diff_eq!(beta[0], 3., epsilon = 1e-9);
        assert_abs_diff_eq!(beta[1], 2., epsilon = 1e-9);
    }

    #[test]
    fn test_least_squares_overdetermined() {
        // best constant fit is the mean
        let x = Matrix::from_rows(&[vec![1.], vec![1.], vec![1.], vec![1.]]);
        let beta = least_squares(&x, &[1., 2., 3., 6.]).unwrap();
        assert_abs_diff_eq!(beta[0], 3., epsilon = 1e-12);
        assert_eq!(x.mul_vec(&beta), vec![beta[0]; 4]);
    }

    #[test]
    #[should_panic(expected = "ragged matrix rows")]
    fn test_ragged_rows_panic() {
        Matrix::from_rows(&[vec![1., 2.], vec![3.]]);
    }

    #[test]
    #[should_panic]
    fn test_solve_non_square_panics() {
        solve(Matrix::zeros(2, 3), vec![0., 0.]);
    }

    #[test]
    fn test_gram() {
        let x = Matrix::from_rows(&[vec![1., 2.], vec![3., 4.], vec![5., 6.]]);
        let g = x.gram();
        assert_eq!(g, Matrix::from_rows(&[vec![35., 44.], vec![44., 56.]]));
        assert_eq!(x.transpose_mul(&[1., 1., 1.]), vec![9., 12.]);
    }
}
