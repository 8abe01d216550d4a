use crate::error::ShapeError;
use crate::traits::{euclidean_norm, Norm};
use crate::vector::Vector;
use approx::{AbsDiffEq, RelativeEq};
use nalgebra::SMatrix;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign};

/// Dense row-major matrix with `H` rows and `W` columns.
///
/// Products check inner dimensions at compile time: `Matrix<H, K> * Matrix<K, W>`
/// is the only matrix product that type-checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Matrix<const H: usize, const W: usize> {
    rows: [[f64; W]; H],
}

impl<const H: usize, const W: usize> Matrix<H, W> {
    pub const HEIGHT: usize = H;
    pub const WIDTH: usize = W;

    pub fn new(rows: [[f64; W]; H]) -> Self {
        Self { rows }
    }

    pub fn zeros() -> Self {
        Self {
            rows: [[0.0; W]; H],
        }
    }

    /// Builds a matrix from `H * W` values listed row by row.
    pub fn from_row_slice(values: &[f64]) -> Result<Self, ShapeError> {
        ShapeError::check(H * W, values.len())?;
        let mut out = Self::zeros();
        if W > 0 {
            for (row, chunk) in out.rows.iter_mut().zip(values.chunks_exact(W)) {
                row.copy_from_slice(chunk);
            }
        }
        Ok(out)
    }

    /// Builds a matrix whose columns are the given vectors.
    pub fn from_columns(columns: [Vector<H>; W]) -> Self {
        let mut out = Self::zeros();
        for (c, column) in columns.iter().enumerate() {
            out.set_column(c, column);
        }
        out
    }

    pub const fn height(&self) -> usize {
        H
    }

    pub const fn width(&self) -> usize {
        W
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        self.rows.get(row).and_then(|r| r.get(column)).copied()
    }

    pub fn rows(&self) -> &[[f64; W]; H] {
        &self.rows
    }

    /// Copies column `index` out as a vector. Panics if `index >= W`.
    pub fn column(&self, index: usize) -> Vector<H> {
        assert!(index < W, "column index {index} out of range for width {W}");
        let mut out = Vector::zeros();
        for (r, row) in self.rows.iter().enumerate() {
            out[r] = row[index];
        }
        out
    }

    /// Copies row `index` out as a vector. Panics if `index >= H`.
    pub fn row(&self, index: usize) -> Vector<W> {
        assert!(index < H, "row index {index} out of range for height {H}");
        Vector::new(self.rows[index])
    }

    /// Overwrites column `index` with `values`.
    pub fn set_column(&mut self, index: usize, values: &Vector<H>) {
        assert!(index < W, "column index {index} out of range for width {W}");
        for (r, row) in self.rows.iter_mut().enumerate() {
            row[index] = values[r];
        }
    }

    pub fn transpose(&self) -> Matrix<W, H> {
        let mut out = Matrix::<W, H>::zeros();
        for r in 0..H {
            for c in 0..W {
                out.rows[c][r] = self.rows[r][c];
            }
        }
        out
    }

    fn map(mut self, op: impl Fn(f64) -> f64) -> Self {
        for value in self.rows.iter_mut().flatten() {
            *value = op(*value);
        }
        self
    }

    fn zip_map(mut self, other: Self, op: impl Fn(f64, f64) -> f64) -> Self {
        for (lhs, rhs) in self.rows.iter_mut().flatten().zip(other.rows.iter().flatten()) {
            *lhs = op(*lhs, *rhs);
        }
        self
    }
}

impl<const N: usize> Matrix<N, N> {
    pub fn identity() -> Self {
        let mut out = Self::zeros();
        for i in 0..N {
            out.rows[i][i] = 1.0;
        }
        out
    }
}

impl<const H: usize, const W: usize> Default for Matrix<H, W> {
    fn default() -> Self {
        Self::zeros()
    }
}

/// Frobenius norm.
impl<const H: usize, const W: usize> Norm for Matrix<H, W> {
    fn norm(&self) -> f64 {
        euclidean_norm(self.rows.iter().flatten().copied())
    }
}

impl<const H: usize, const W: usize> Index<(usize, usize)> for Matrix<H, W> {
    type Output = f64;

    fn index(&self, (row, column): (usize, usize)) -> &f64 {
        &self.rows[row][column]
    }
}

impl<const H: usize, const W: usize> IndexMut<(usize, usize)> for Matrix<H, W> {
    fn index_mut(&mut self, (row, column): (usize, usize)) -> &mut f64 {
        &mut self.rows[row][column]
    }
}

impl<const H: usize, const W: usize> Add for Matrix<H, W> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        self.zip_map(rhs, |a, b| a + b)
    }
}

impl<const H: usize, const W: usize> Sub for Matrix<H, W> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        self.zip_map(rhs, |a, b| a - b)
    }
}

impl<const H: usize, const W: usize> Neg for Matrix<H, W> {
    type Output = Self;
    fn neg(self) -> Self {
        self.map(|a| -a)
    }
}

impl<const H: usize, const W: usize> Mul<f64> for Matrix<H, W> {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        self.map(|a| a * rhs)
    }
}

impl<const H: usize, const W: usize> Mul<Matrix<H, W>> for f64 {
    type Output = Matrix<H, W>;
    fn mul(self, rhs: Matrix<H, W>) -> Matrix<H, W> {
        rhs * self
    }
}

impl<const H: usize, const W: usize> AddAssign for Matrix<H, W> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}
impl<const H: usize, const W: usize> SubAssign for Matrix<H, W> {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}
impl<const H: usize, const W: usize> MulAssign<f64> for Matrix<H, W> {
    fn mul_assign(&mut self, rhs: f64) {
        *self = *self * rhs;
    }
}

// (AB)[r][c] = Σ_k A[r][k]·B[k][c]
impl<const H: usize, const K: usize, const W: usize> Mul<Matrix<K, W>> for Matrix<H, K> {
    type Output = Matrix<H, W>;
    fn mul(self, rhs: Matrix<K, W>) -> Matrix<H, W> {
        let mut out = Matrix::<H, W>::zeros();
        for r in 0..H {
            for c in 0..W {
                let mut sum = 0.0;
                for k in 0..K {
                    sum += self.rows[r][k] * rhs.rows[k][c];
                }
                out.rows[r][c] = sum;
            }
        }
        out
    }
}

/// Matrix times column vector.
impl<const H: usize, const W: usize> Mul<Vector<W>> for Matrix<H, W> {
    type Output = Vector<H>;
    fn mul(self, rhs: Vector<W>) -> Vector<H> {
        let mut out = Vector::zeros();
        for (r, row) in self.rows.iter().enumerate() {
            out[r] = row.iter().zip(rhs.iter()).map(|(a, b)| a * b).sum();
        }
        out
    }
}

/// Row vector times matrix.
impl<const H: usize, const W: usize> Mul<Matrix<H, W>> for Vector<H> {
    type Output = Vector<W>;
    fn mul(self, rhs: Matrix<H, W>) -> Vector<W> {
        let mut out = Vector::zeros();
        for c in 0..W {
            let mut sum = 0.0;
            for r in 0..H {
                sum += self[r] * rhs.rows[r][c];
            }
            out[c] = sum;
        }
        out
    }
}

impl<const H: usize, const W: usize> Zero for Matrix<H, W> {
    fn zero() -> Self {
        Self::zeros()
    }
    fn is_zero(&self) -> bool {
        self.rows.iter().flatten().all(|v| *v == 0.0)
    }
}

/// One line per row; each element as `{:4.2}` followed by a space.
impl<const H: usize, const W: usize> fmt::Display for Matrix<H, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            for value in row {
                write!(f, "{value:4.2} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl<const H: usize, const W: usize> From<[[f64; W]; H]> for Matrix<H, W> {
    fn from(rows: [[f64; W]; H]) -> Self {
        Self::new(rows)
    }
}

impl<const H: usize, const W: usize> From<Matrix<H, W>> for Vec<f64> {
    fn from(value: Matrix<H, W>) -> Self {
        value.rows.iter().flatten().copied().collect()
    }
}

impl<const H: usize, const W: usize> TryFrom<Vec<f64>> for Matrix<H, W> {
    type Error = ShapeError;
    fn try_from(values: Vec<f64>) -> Result<Self, ShapeError> {
        Self::from_row_slice(&values)
    }
}

impl<const H: usize, const W: usize> From<Matrix<H, W>> for SMatrix<f64, H, W> {
    fn from(value: Matrix<H, W>) -> Self {
        SMatrix::from_fn(|r, c| value.rows[r][c])
    }
}

impl<const H: usize, const W: usize> From<SMatrix<f64, H, W>> for Matrix<H, W> {
    fn from(value: SMatrix<f64, H, W>) -> Self {
        let mut out = Self::zeros();
        for r in 0..H {
            for c in 0..W {
                out.rows[r][c] = value[(r, c)];
            }
        }
        out
    }
}

impl<const H: usize, const W: usize> AbsDiffEq for Matrix<H, W> {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.rows
            .iter()
            .flatten()
            .zip(other.rows.iter().flatten())
            .all(|(a, b)| a.abs_diff_eq(b, epsilon))
    }
}

impl<const H: usize, const W: usize> RelativeEq for Matrix<H, W> {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.rows
            .iter()
            .flatten()
            .zip(other.rows.iter().flatten())
            .all(|(a, b)| a.relative_eq(b, epsilon, max_relative))
    }
}

#[cfg(test)]
mod tests {
    use super::Matrix;
    use crate::error::ShapeError;
    use crate::traits::norm;
    use crate::vector::Vector;
    use approx::assert_relative_eq;
    use nalgebra::SMatrix;
    use num_traits::Zero;

    fn m23() -> Matrix<2, 3> {
        Matrix::new([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]])
    }

    fn m32() -> Matrix<3, 2> {
        Matrix::new([[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]])
    }

    #[test]
    fn element_access_is_row_major() {
        let m = Matrix::<2, 3>::from_row_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
            .expect("six values fit a 2x3 matrix");
        assert_eq!(m, m23());
        assert_eq!(m[(0, 2)], 3.0);
        assert_eq!(m[(1, 0)], 4.0);
        assert_eq!(m.get(1, 3), None);
        assert_eq!(m.height(), 2);
        assert_eq!(Matrix::<2, 3>::WIDTH, 3);
    }

    #[test]
    fn from_row_slice_rejects_wrong_length() {
        let err = Matrix::<2, 2>::from_row_slice(&[1.0, 2.0, 3.0]).expect_err("too few values");
        assert_eq!(err, ShapeError::ElementCount { expected: 4, found: 3 });
    }

    #[test]
    fn addition_and_negation_cancel() {
        let a = m23();
        let b = Matrix::new([[2.0, 3.0, 4.0], [5.0, 6.0, 7.0]]);
        assert_relative_eq!((a + b) - b, a);
        assert!((a + (-a)).is_zero());
    }

    #[test]
    fn scalar_multiplication_commutes() {
        let mut a = m23();
        assert_eq!(a * 2.0, 2.0 * a);
        a *= 0.5;
        a += m23();
        a -= m23() * 0.25;
        assert_relative_eq!(a, m23() * 1.25);
    }

    #[test]
    fn product_follows_linear_algebra_definition() {
        let m = -m23();
        let p: Matrix<2, 2> = m * m32();
        assert_eq!(p, Matrix::new([[-22.0, -28.0], [-49.0, -64.0]]));

        let v = Vector::new([1.0, 2.0, 3.0]);
        assert_eq!(m23() * v, Vector::new([14.0, 32.0]));
        assert_eq!(v * m32(), Vector::new([22.0, 28.0]));
    }

    #[test]
    fn product_is_associative() {
        let a = Matrix::new([[0.5, -1.25], [2.0, 3.5], [1e-3, 7.0]]);
        let b = Matrix::new([[1.0, 2.0, -3.0, 0.1], [4.0, -0.5, 6.0, 2.2]]);
        let c = Matrix::new([[1.5, 0.0], [-2.0, 3.0], [0.25, 1.0], [9.0, -4.0]]);
        let left: Matrix<3, 2> = (a * b) * c;
        let right: Matrix<3, 2> = a * (b * c);
        assert_relative_eq!(left, right, epsilon = 1e-12, max_relative = 1e-12);
    }

    #[test]
    fn products_agree_with_nalgebra() {
        let a = m23();
        let b = m32();
        let na_a: SMatrix<f64, 2, 3> = a.into();
        let na_b: SMatrix<f64, 3, 2> = b.into();
        assert_eq!(Matrix::from(na_a * na_b), a * b);
        assert_eq!(na_a[(1, 2)], a[(1, 2)]);
    }

    #[test]
    fn columns_and_rows_are_extracted() {
        let m = m23();
        assert_eq!(m.column(0), Vector::new([1.0, 4.0]));
        assert_eq!(m.row(1), Vector::new([4.0, 5.0, 6.0]));
        assert_eq!(m.transpose().row(2), m.column(2));

        let rebuilt = Matrix::from_columns([m.column(0), m.column(1), m.column(2)]);
        assert_eq!(rebuilt, m);

        let mut n = Matrix::<2, 3>::zeros();
        n.set_column(1, &Vector::new([7.0, 8.0]));
        assert_eq!(n.column(1), Vector::new([7.0, 8.0]));
    }

    #[test]
    #[should_panic(expected = "column index 3 out of range")]
    fn column_out_of_range_panics() {
        let _ = m23().column(3);
    }

    #[test]
    #[should_panic(expected = "row index 2 out of range for height 2")]
    fn row_out_of_range_panics() {
        let _ = m23().row(2);
    }

    #[test]
    fn identity_is_neutral() {
        let i = Matrix::<3, 3>::identity();
        assert_eq!(m23() * i, m23());
    }

    #[test]
    fn frobenius_norm() {
        let m = Matrix::new([[3.0, 0.0], [0.0, 4.0]]);
        assert_eq!(norm(&m), 5.0);
        assert_eq!(norm(&Matrix::<2, 2>::zeros()), 0.0);

        let tiny = Matrix::new([[0.0, 0.0], [1e-200, 0.0]]);
        assert_eq!(norm(&tiny), 1e-200);
        let huge = Matrix::new([[3e200], [-4e200]]);
        assert_relative_eq!(norm(&huge), 5e200, max_relative = 1e-15);
    }

    #[test]
    fn display_prints_one_line_per_row() {
        let m = Matrix::new([[1.0, -2.0], [0.5, 12.346]]);
        assert_eq!(m.to_string(), "1.00 -2.00 \n0.50 12.35 \n");
    }

    #[test]
    fn serde_uses_flat_row_major_sequence() {
        let json = serde_json::to_string(&m23()).expect("serialize");
        assert_eq!(json, "[1.0,2.0,3.0,4.0,5.0,6.0]");

        let back: Matrix<2, 3> = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, m23());

        let err = serde_json::from_str::<Matrix<2, 2>>(&json).expect_err("length mismatch");
        assert!(err.to_string().contains("expected 4 elements, got 6"));
    }
}
