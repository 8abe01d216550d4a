//! Lie derivatives of scalar fields along vector fields.
//!
//! `lie(f, v, x)` differentiates `t ↦ v(x + t·d)` at `t = 0` for each
//! direction `d` supplied by `f(x)`. Which form applies is decided by the
//! return type of `f`:
//!
//! - `Vector<N>`: a single direction, the result is an `f64`;
//! - `Matrix<N, K>`: one direction per column, the result is a `Vector<K>`.

use crate::differential::{estimate, DifferentialSettings};
use crate::matrix::Matrix;
use crate::vector::Vector;
use anyhow::{Context, Result};

/// Value of a field that can act as the direction(s) of a Lie derivative.
pub trait LieDirection<const N: usize> {
    type Output;

    fn derivative_along<V>(
        &self,
        scalar_field: &V,
        variable: Vector<N>,
        settings: &DifferentialSettings,
    ) -> Self::Output
    where
        V: Fn(Vector<N>) -> f64;
}

impl<const N: usize> LieDirection<N> for Vector<N> {
    type Output = f64;

    fn derivative_along<V>(
        &self,
        scalar_field: &V,
        variable: Vector<N>,
        settings: &DifferentialSettings,
    ) -> f64
    where
        V: Fn(Vector<N>) -> f64,
    {
        directional(scalar_field, variable, *self, settings)
    }
}

impl<const N: usize, const K: usize> LieDirection<N> for Matrix<N, K> {
    type Output = Vector<K>;

    fn derivative_along<V>(
        &self,
        scalar_field: &V,
        variable: Vector<N>,
        settings: &DifferentialSettings,
    ) -> Vector<K>
    where
        V: Fn(Vector<N>) -> f64,
    {
        Vector::new(std::array::from_fn(|i| {
            directional(scalar_field, variable, self.column(i), settings)
        }))
    }
}

fn directional<V, const N: usize>(
    scalar_field: &V,
    variable: Vector<N>,
    direction: Vector<N>,
    settings: &DifferentialSettings,
) -> f64
where
    V: Fn(Vector<N>) -> f64,
{
    let path = |t: f64| scalar_field(variable + direction * t);
    estimate(&path, 0.0, settings).value
}

/// Lie derivative `L_f v` at `variable`.
pub fn lie<F, R, V, const N: usize>(field: F, scalar_field: V, variable: Vector<N>) -> R::Output
where
    F: Fn(Vector<N>) -> R,
    R: LieDirection<N>,
    V: Fn(Vector<N>) -> f64,
{
    field(variable).derivative_along(&scalar_field, variable, &DifferentialSettings::default())
}

pub fn lie_with<F, R, V, const N: usize>(
    field: F,
    scalar_field: V,
    variable: Vector<N>,
    settings: &DifferentialSettings,
) -> Result<R::Output>
where
    F: Fn(Vector<N>) -> R,
    R: LieDirection<N>,
    V: Fn(Vector<N>) -> f64,
{
    settings
        .validate()
        .context("Invalid settings for Lie derivative.")?;
    Ok(field(variable).derivative_along(&scalar_field, variable, settings))
}
