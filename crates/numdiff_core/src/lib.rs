//! The `numdiff_core` crate provides fixed-size linear algebra and numerical
//! differentiation built on top of it.
//!
//! Key components:
//! - **Containers**: `Matrix<H, W>` and `Vector<D>`, with dimensions checked at compile time.
//! - **Differential**: central-difference derivatives with fixed or adaptive step size.
//! - **Jacobian**: Jacobian matrices of vector-valued functions and gradients of scalar ones.
//! - **Lie**: Lie derivatives of scalar fields along vector or matrix-valued fields.
pub mod differential;
pub mod error;
pub mod jacobian;
pub mod lie;
pub mod matrix;
pub mod traits;
pub mod vector;
