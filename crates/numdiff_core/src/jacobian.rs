use crate::differential::{estimate, DifferentialSettings};
use crate::matrix::Matrix;
use crate::traits::Differentiable;
use crate::vector::Vector;
use anyhow::{Context, Result};

/// Jacobian of a vector-valued function: column `i` holds `∂f/∂x_i`.
///
/// The row count `M` comes from the function's output type.
pub fn jacobian_matrix<F, const N: usize, const M: usize>(
    function: F,
    variable: Vector<N>,
) -> Matrix<M, N>
where
    F: Fn(Vector<N>) -> Vector<M>,
{
    Matrix::from_columns(partials(&function, variable, &DifferentialSettings::default()))
}

/// Gradient of a scalar-valued function.
pub fn jacobian_vector<F, const N: usize>(function: F, variable: Vector<N>) -> Vector<N>
where
    F: Fn(Vector<N>) -> f64,
{
    Vector::new(partials(&function, variable, &DifferentialSettings::default()))
}

pub fn jacobian_matrix_with<F, const N: usize, const M: usize>(
    function: F,
    variable: Vector<N>,
    settings: &DifferentialSettings,
) -> Result<Matrix<M, N>>
where
    F: Fn(Vector<N>) -> Vector<M>,
{
    settings
        .validate()
        .context("Invalid settings for Jacobian matrix.")?;
    Ok(Matrix::from_columns(partials(&function, variable, settings)))
}

pub fn jacobian_vector_with<F, const N: usize>(
    function: F,
    variable: Vector<N>,
    settings: &DifferentialSettings,
) -> Result<Vector<N>>
where
    F: Fn(Vector<N>) -> f64,
{
    settings
        .validate()
        .context("Invalid settings for gradient.")?;
    Ok(Vector::new(partials(&function, variable, settings)))
}

/// Differentiates `function` along each coordinate of `variable` in turn,
/// holding the others fixed.
fn partials<F, T, const N: usize>(
    function: &F,
    variable: Vector<N>,
    settings: &DifferentialSettings,
) -> [T; N]
where
    F: Fn(Vector<N>) -> T,
    T: Differentiable,
{
    std::array::from_fn(|i| {
        let slice = |x: f64| {
            let mut shifted = variable;
            shifted[i] = x;
            function(shifted)
        };
        estimate(&slice, variable[i], settings).value
    })
}

#[cfg(test)]
mod tests {
    use super::{jacobian_matrix, jacobian_matrix_with, jacobian_vector, jacobian_vector_with};
    use crate::differential::{AdaptiveSettings, DifferentialSettings};
    use crate::matrix::Matrix;
    use crate::vector::{dot, Vector};
    use approx::assert_relative_eq;

    #[test]
    fn linear_map_jacobian_is_its_matrix() {
        let m = Matrix::new([[1.0, -2.0, 0.5], [3.0, 4.0, -1.5]]);
        for x in [
            Vector::new([1.0, -2.0, 0.5]),
            Vector::new([10.0, 3.0, -7.0]),
            Vector::new([1e-3, 250.0, 0.0]),
        ] {
            let jac = jacobian_matrix(|v: Vector<3>| m * v, x);
            assert_relative_eq!(jac, m, epsilon = 1e-9, max_relative = 1e-7);
        }
    }

    #[test]
    fn linear_map_jacobian_at_origin() {
        // The search cannot settle at the origin, but the best-effort
        // estimate of a linear map is still exact.
        let m = Matrix::new([[2.0, 0.0], [-1.0, 3.0]]);
        let jac = jacobian_matrix(|v: Vector<2>| m * v, Vector::zeros());
        assert_relative_eq!(jac, m, epsilon = 1e-9, max_relative = 1e-9);
    }

    #[test]
    fn linear_functional_gradient_is_its_coefficients() {
        let c = Vector::new([0.25, -3.0, 8.0, 1.0]);
        for x in [Vector::new([1.0, 2.0, 3.0, 4.0]), Vector::new([-5.0, 0.1, 7.0, 2.0])] {
            let grad = jacobian_vector(|v: Vector<4>| dot(&c, &v), x);
            assert_relative_eq!(grad, c, epsilon = 1e-9, max_relative = 1e-7);
        }
    }

    #[test]
    fn linear_maps_vanishing_at_the_point() {
        // Each coordinate slice is zero at x with a non-zero slope.
        let c = Vector::new([1.0, 1.0]);
        let x = Vector::new([1.0, -1.0]);
        assert_eq!(dot(&c, &x), 0.0);
        let grad = jacobian_vector(|v: Vector<2>| dot(&c, &v), x);
        assert_relative_eq!(grad, c, epsilon = 1e-9, max_relative = 1e-7);

        let m = Matrix::new([[1.0, 1.0], [2.0, 2.0], [-3.0, -3.0]]);
        assert!((m * x).iter().all(|v| *v == 0.0));
        let jac = jacobian_matrix(|v: Vector<2>| m * v, x);
        assert_relative_eq!(jac, m, epsilon = 1e-9, max_relative = 1e-7);

        let far = Vector::new([250.0, -250.0]);
        let grad = jacobian_vector(|v: Vector<2>| dot(&c, &v), far);
        assert_relative_eq!(grad, c, epsilon = 1e-9, max_relative = 1e-7);
    }

    #[test]
    fn nonlinear_jacobian_matches_analytic_values() {
        let f = |x: Vector<2>| Vector::new([x[0] * x[1] * x[1], x[0].sin() * x[1].cos()]);
        let df = |x: Vector<2>| {
            Matrix::new([
                [x[1] * x[1], 2.0 * x[0] * x[1]],
                [x[0].cos() * x[1].cos(), -x[0].sin() * x[1].sin()],
            ])
        };
        let x = Vector::new([2.0, 3.0]);
        let jac = jacobian_matrix(f, x);
        let expected = df(x);
        assert_relative_eq!(
            expected,
            Matrix::new([
                [9.0, 12.0],
                [2f64.cos() * 3f64.cos(), -2f64.sin() * 3f64.sin()],
            ])
        );
        for r in 0..2 {
            for c in 0..2 {
                assert_relative_eq!(jac[(r, c)], expected[(r, c)], max_relative = 1e-6);
            }
        }
    }

    #[test]
    fn nonlinear_gradient_matches_analytic_values() {
        let f = |x: Vector<2>| x[0] * x[1].sin();
        let x = Vector::new([2.0, 3.0]);
        let grad = jacobian_vector(f, x);
        assert_relative_eq!(
            grad,
            Vector::new([3f64.sin(), 2.0 * 3f64.cos()]),
            max_relative = 1e-6
        );
    }

    #[test]
    fn explicit_settings_are_validated_and_used() {
        let m = Matrix::new([[1.0, 2.0], [3.0, 4.0]]);
        let x = Vector::new([0.5, -0.5]);

        let jac = jacobian_matrix_with(|v: Vector<2>| m * v, x, &DifferentialSettings::fixed(1e-4))
            .expect("fixed settings are valid");
        assert_relative_eq!(jac, m, epsilon = 1e-9, max_relative = 1e-9);

        let err = jacobian_vector_with(
            |v: Vector<2>| v[0] * v[1],
            x,
            &DifferentialSettings::Adaptive(AdaptiveSettings {
                max_iterations: 0,
                ..AdaptiveSettings::default()
            }),
        )
        .expect_err("zero iteration budget should fail");
        assert!(format!("{err:#}").contains("max_iterations must be greater than zero"));
    }
}
