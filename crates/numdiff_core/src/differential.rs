use crate::traits::Differentiable;
use anyhow::{bail, Result};
use log::{trace, warn};
use serde::{Deserialize, Serialize};

/// Displacement used by the fixed-step central difference.
pub const DEFAULT_DISPLACEMENT: f64 = 1e-7;

/// Parameters of the adaptive step-size search.
///
/// The search looks at the binary exponent of `norm(f(x-h)) / norm(Δf)`.
/// When it lies in `exponent_band` the difference carries enough digits
/// relative to the function's own magnitude and the estimate is accepted;
/// otherwise `h` is rescaled by `2^(exponent - target_exponent)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveSettings {
    pub initial_step: f64,
    pub max_iterations: usize,
    pub exponent_band: (i32, i32),
    pub target_exponent: i32,
}

impl Default for AdaptiveSettings {
    fn default() -> Self {
        Self {
            initial_step: 1e-6,
            max_iterations: 10,
            exponent_band: (20, 22),
            target_exponent: 21,
        }
    }
}

impl AdaptiveSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.initial_step.is_finite() && self.initial_step > 0.0) {
            bail!(
                "initial_step must be positive and finite (got {}).",
                self.initial_step
            );
        }
        if self.max_iterations == 0 {
            bail!("max_iterations must be greater than zero.");
        }
        let (low, high) = self.exponent_band;
        if low > high {
            bail!("exponent_band is empty ({} > {}).", low, high);
        }
        if !(low..=high).contains(&self.target_exponent) {
            bail!(
                "target_exponent {} lies outside exponent_band [{}, {}].",
                self.target_exponent,
                low,
                high
            );
        }
        Ok(())
    }
}

/// How [`differential_with`] picks its displacement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum DifferentialSettings {
    Fixed { displacement: f64 },
    Adaptive(AdaptiveSettings),
}

impl Default for DifferentialSettings {
    fn default() -> Self {
        DifferentialSettings::Adaptive(AdaptiveSettings::default())
    }
}

impl DifferentialSettings {
    pub fn fixed(displacement: f64) -> Self {
        DifferentialSettings::Fixed { displacement }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            DifferentialSettings::Fixed { displacement } => {
                if !(displacement.is_finite() && *displacement > 0.0) {
                    bail!(
                        "displacement must be positive and finite (got {}).",
                        displacement
                    );
                }
                Ok(())
            }
            DifferentialSettings::Adaptive(settings) => settings.validate(),
        }
    }
}

/// Outcome of a single derivative estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifferentialEstimate<T> {
    pub value: T,
    /// Displacement `h` the returned value was computed with.
    pub displacement: f64,
    /// Number of `(f(x+h), f(x-h))` pairs evaluated.
    pub iterations: usize,
    /// False when the adaptive search stopped without an acceptable step;
    /// `value` is then the last estimate it produced.
    pub converged: bool,
}

/// `(f(x+h) - f(x-h)) / 2h` with a caller-chosen `h`.
pub fn central_difference<F, T>(function: F, variable: f64, displacement: f64) -> T
where
    F: Fn(f64) -> T,
    T: Differentiable,
{
    (function(variable + displacement) - function(variable - displacement))
        * (1.0 / (2.0 * displacement))
}

/// Derivative of `function` at `variable` using the default adaptive search.
///
/// Never fails: if the search does not settle, a warning is logged and the
/// last estimate is returned.
pub fn differential<F, T>(function: F, variable: f64) -> T
where
    F: Fn(f64) -> T,
    T: Differentiable,
{
    estimate(&function, variable, &DifferentialSettings::default()).value
}

/// Derivative of `function` at `variable` with explicit settings.
///
/// Only invalid settings produce an error.
pub fn differential_with<F, T>(
    function: F,
    variable: f64,
    settings: &DifferentialSettings,
) -> Result<DifferentialEstimate<T>>
where
    F: Fn(f64) -> T,
    T: Differentiable,
{
    settings.validate()?;
    Ok(estimate(&function, variable, settings))
}

/// Runs the estimator for already validated settings.
pub(crate) fn estimate<F, T>(
    function: &F,
    variable: f64,
    settings: &DifferentialSettings,
) -> DifferentialEstimate<T>
where
    F: Fn(f64) -> T,
    T: Differentiable,
{
    match settings {
        DifferentialSettings::Fixed { displacement } => DifferentialEstimate {
            value: central_difference(function, variable, *displacement),
            displacement: *displacement,
            iterations: 1,
            converged: true,
        },
        DifferentialSettings::Adaptive(adaptive) => adaptive_difference(function, variable, adaptive),
    }
}

fn adaptive_difference<F, T>(
    function: &F,
    variable: f64,
    settings: &AdaptiveSettings,
) -> DifferentialEstimate<T>
where
    F: Fn(f64) -> T,
    T: Differentiable,
{
    let (band_low, band_high) = settings.exponent_band;
    // Below this step the rounding of x ± h itself dominates the difference.
    let floor = variable.abs() * f64::EPSILON.sqrt();
    let mut step = settings.initial_step;
    if !resolves(variable, step) {
        trace!(
            "Central difference at x = {}: h = {:e} is below the spacing of x; starting at {:e}.",
            variable,
            step,
            floor
        );
        step = floor;
    }
    let mut iterations = 0usize;

    loop {
        iterations += 1;
        let lower = function(variable - step);
        let delta = function(variable + step) - lower;
        let value = delta * (1.0 / (2.0 * step));
        let outcome = |converged| DifferentialEstimate {
            value,
            displacement: step,
            iterations,
            converged,
        };

        let spread = delta.norm();
        if spread == 0.0 {
            // Flat at this resolution; rescaling cannot produce a nonzero slope.
            return outcome(true);
        }
        let ratio = lower.norm() / spread;
        if ratio == 0.0 {
            // f(x-h) vanishes, so there is no magnitude to tune against.
            return outcome(true);
        }
        if !ratio.is_finite() {
            warn!(
                "Central difference at x = {} hit a non-finite value (h = {:e}); returning last estimate.",
                variable, step
            );
            return outcome(false);
        }

        let (_, exponent) = libm::frexp(ratio);
        trace!(
            "Central difference at x = {}: iteration {}, h = {:e}, exponent {}.",
            variable,
            iterations,
            step,
            exponent
        );
        if (band_low..=band_high).contains(&exponent) {
            return outcome(true);
        }
        if iterations >= settings.max_iterations {
            warn!(
                "Central difference at x = {} did not settle in {} iterations (h = {:e}, exponent {}); returning last estimate.",
                variable, settings.max_iterations, step, exponent
            );
            return outcome(false);
        }

        let proposed = step * 2f64.powi(exponent - settings.target_exponent);
        if proposed == 0.0 || !proposed.is_finite() {
            warn!(
                "Central difference at x = {}: step left the representable range after {} iterations; returning last estimate.",
                variable, iterations
            );
            return outcome(false);
        }
        let next = proposed.max(floor);
        if next == step {
            trace!(
                "Central difference at x = {}: h = {:e} is at the resolution of x; accepting.",
                variable,
                step
            );
            return outcome(true);
        }
        if !resolves(variable, next) {
            warn!(
                "Central difference at x = {}: h = {:e} no longer separates x - h from x + h after {} iterations; returning last estimate.",
                variable, next, iterations
            );
            return outcome(false);
        }
        step = next;
    }
}

/// True when `x - h` and `x + h` both differ from `x`.
fn resolves(variable: f64, step: f64) -> bool {
    variable - step != variable && variable + step != variable
}
