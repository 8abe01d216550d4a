use std::ops::{Mul, Sub};

/// Magnitude of a value, as seen by the adaptive step-size search.
///
/// For `f64` the norm is the value itself rather than its absolute value, so
/// scalar and vector valued functions go through the same code path. Callers
/// that need a magnitude of a scalar should take `abs()` themselves.
pub trait Norm {
    fn norm(&self) -> f64;
}

impl Norm for f64 {
    fn norm(&self) -> f64 {
        *self
    }
}

/// Output of a function that can be differentiated by central differences.
///
/// Anything that can be subtracted, scaled by an `f64` and measured with a
/// [`Norm`] qualifies: `f64`, `Vector<D>` and `Matrix<H, W>`.
pub trait Differentiable: Copy + Sub<Output = Self> + Mul<f64, Output = Self> + Norm {}

impl<T> Differentiable for T where T: Copy + Sub<Output = T> + Mul<f64, Output = T> + Norm {}

/// Free-function form of [`Norm::norm`].
pub fn norm<T: Norm>(value: &T) -> f64 {
    value.norm()
}

/// `sqrt(Σ v²)` scaled by the largest magnitude, so neither tiny nor huge
/// elements lose the result to underflow or overflow.
pub(crate) fn euclidean_norm<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
    I::IntoIter: Clone,
{
    let values = values.into_iter();
    let scale = values.clone().map(f64::abs).fold(0.0, f64::max);
    if scale == 0.0 || scale.is_infinite() {
        // f64::max skips NaN, so it has to be looked for separately here.
        return if values.clone().any(f64::is_nan) {
            f64::NAN
        } else {
            scale
        };
    }
    scale * values.map(|v| (v / scale).powi(2)).sum::<f64>().sqrt()
}
