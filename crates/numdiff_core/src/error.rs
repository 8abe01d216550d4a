use thiserror::Error;

/// Raised when a runtime sequence of values does not fit a fixed-size container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("shape mismatch: expected {expected} elements, got {found}")]
    ElementCount { expected: usize, found: usize },
}

impl ShapeError {
    pub(crate) fn check(expected: usize, found: usize) -> Result<(), ShapeError> {
        if expected == found {
            Ok(())
        } else {
            Err(ShapeError::ElementCount { expected, found })
        }
    }
}
