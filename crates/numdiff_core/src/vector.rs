use crate::error::ShapeError;
use crate::traits::{euclidean_norm, Norm};
use approx::{AbsDiffEq, RelativeEq};
use nalgebra::SVector;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{
    Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign,
};

/// Dense vector of `D` real values.
///
/// The dimension is part of the type, so adding a `Vector<2>` to a
/// `Vector<3>` does not compile. Vectors are plain `Copy` values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Vector<const D: usize> {
    data: [f64; D],
}

impl<const D: usize> Vector<D> {
    pub const DIMENSION: usize = D;

    pub fn new(data: [f64; D]) -> Self {
        Self { data }
    }

    pub fn zeros() -> Self {
        Self { data: [0.0; D] }
    }

    /// Builds a vector from a slice, rejecting slices of the wrong length.
    pub fn from_slice(values: &[f64]) -> Result<Self, ShapeError> {
        ShapeError::check(D, values.len())?;
        let mut data = [0.0; D];
        data.copy_from_slice(values);
        Ok(Self { data })
    }

    pub const fn dimension(&self) -> usize {
        D
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.data.get(index).copied()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.data.iter()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    fn map(self, op: impl Fn(f64) -> f64) -> Self {
        Self {
            data: self.data.map(op),
        }
    }

    fn zip_map(mut self, other: Self, op: impl Fn(f64, f64) -> f64) -> Self {
        for (lhs, rhs) in self.data.iter_mut().zip(other.data) {
            *lhs = op(*lhs, rhs);
        }
        self
    }
}

/// Inner product `Σ u[i]·v[i]`.
pub fn dot<const D: usize>(lhs: &Vector<D>, rhs: &Vector<D>) -> f64 {
    lhs.dot(rhs)
}

impl<const D: usize> Default for Vector<D> {
    fn default() -> Self {
        Self::zeros()
    }
}

impl<const D: usize> Norm for Vector<D> {
    fn norm(&self) -> f64 {
        euclidean_norm(self.data.iter().copied())
    }
}

impl<const D: usize> Index<usize> for Vector<D> {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.data[index]
    }
}

impl<const D: usize> IndexMut<usize> for Vector<D> {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.data[index]
    }
}

impl<const D: usize> Add for Vector<D> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        self.zip_map(rhs, |a, b| a + b)
    }
}

impl<const D: usize> Sub for Vector<D> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        self.zip_map(rhs, |a, b| a - b)
    }
}

impl<const D: usize> Neg for Vector<D> {
    type Output = Self;
    fn neg(self) -> Self {
        self.map(|a| -a)
    }
}

impl<const D: usize> Mul<f64> for Vector<D> {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        self.map(|a| a * rhs)
    }
}

impl<const D: usize> Mul<Vector<D>> for f64 {
    type Output = Vector<D>;
    fn mul(self, rhs: Vector<D>) -> Vector<D> {
        rhs * self
    }
}

impl<const D: usize> Div<f64> for Vector<D> {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        self.map(|a| a / rhs)
    }
}

impl<const D: usize> AddAssign for Vector<D> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}
impl<const D: usize> SubAssign for Vector<D> {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}
impl<const D: usize> MulAssign<f64> for Vector<D> {
    fn mul_assign(&mut self, rhs: f64) {
        *self = *self * rhs;
    }
}
impl<const D: usize> DivAssign<f64> for Vector<D> {
    fn div_assign(&mut self, rhs: f64) {
        *self = *self / rhs;
    }
}

impl<const D: usize> Zero for Vector<D> {
    fn zero() -> Self {
        Self::zeros()
    }
    fn is_zero(&self) -> bool {
        self.data.iter().all(|v| *v == 0.0)
    }
}

/// Each element as `{:4.2}` followed by a space, then a newline.
impl<const D: usize> fmt::Display for Vector<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for value in &self.data {
            write!(f, "{value:4.2} ")?;
        }
        writeln!(f)
    }
}

impl<const D: usize> From<[f64; D]> for Vector<D> {
    fn from(data: [f64; D]) -> Self {
        Self::new(data)
    }
}

impl<const D: usize> From<Vector<D>> for Vec<f64> {
    fn from(value: Vector<D>) -> Self {
        value.data.to_vec()
    }
}

impl<const D: usize> TryFrom<Vec<f64>> for Vector<D> {
    type Error = ShapeError;
    fn try_from(values: Vec<f64>) -> Result<Self, ShapeError> {
        Self::from_slice(&values)
    }
}

impl<const D: usize> TryFrom<&[f64]> for Vector<D> {
    type Error = ShapeError;
    fn try_from(values: &[f64]) -> Result<Self, ShapeError> {
        Self::from_slice(values)
    }
}

impl<const D: usize> From<Vector<D>> for SVector<f64, D> {
    fn from(value: Vector<D>) -> Self {
        SVector::from_column_slice(&value.data)
    }
}

impl<const D: usize> From<SVector<f64, D>> for Vector<D> {
    fn from(value: SVector<f64, D>) -> Self {
        let mut data = [0.0; D];
        data.copy_from_slice(value.as_slice());
        Self { data }
    }
}

impl<const D: usize> AbsDiffEq for Vector<D> {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.data
            .iter()
            .zip(other.data.iter())
            .all(|(a, b)| a.abs_diff_eq(b, epsilon))
    }
}

impl<const D: usize> RelativeEq for Vector<D> {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.data
            .iter()
            .zip(other.data.iter())
            .all(|(a, b)| a.relative_eq(b, epsilon, max_relative))
    }
}
