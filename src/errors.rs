//! Error types that are reported by various array operations.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Error in an array operation if the dimension count is incorrect.
#[derive(Debug, PartialEq)]
pub struct DimensionError {
    /// Actual number of dimensions the array has.
    pub actual: usize,

    /// Number of dimensions that the operation requires.
    pub expected: usize,
}

impl Display for DimensionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "expected {} dims but found {}",
            self.expected, self.actual
        )
    }
}

impl Error for DimensionError {}

/// Errors that can occur when constructing an array from existing data.
#[derive(Debug, PartialEq)]
pub enum FromDataError {
    /// Some indices will map to offsets that are beyond the end of the storage.
    StorageTooShort,

    /// The storage length was expected to exactly match the product of the
    /// shape, and it did not.
    StorageLengthMismatch,

    /// Some indices will map to the same offset within the storage.
    ///
    /// This error can only occur when the storage is mutable.
    MayOverlap,

    /// Some indices will map to offsets before the start of the storage.
    ///
    /// This can happen when negative strides are combined with a base offset
    /// that is too small.
    NegativeOffset,
}

impl Display for FromDataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FromDataError::StorageTooShort => write!(f, "data too short"),
            FromDataError::StorageLengthMismatch => write!(f, "data length mismatch"),
            FromDataError::MayOverlap => write!(f, "may have internal overlap"),
            FromDataError::NegativeOffset => write!(f, "indices resolve before start of data"),
        }
    }
}

impl Error for FromDataError {}

/// Errors that can occur while reshaping or ravelling an array.
#[derive(Clone, Debug, PartialEq)]
pub enum ReshapeError {
    /// Attempted to reshape an array without copying data, but the layout
    /// is not contiguous.
    NotContiguous,

    /// The reshaped layout would have a different length than the current
    /// layout.
    LengthMismatch,
}

impl Display for ReshapeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReshapeError::NotContiguous => write!(f, "view is not contiguous"),
            ReshapeError::LengthMismatch => write!(f, "new shape has a different length"),
        }
    }
}

impl Error for ReshapeError {}

/// Error when two shapes cannot be broadcast to a common shape.
///
/// The shapes of both operands are reported so the failing dimension pair can
/// be identified from the message.
#[derive(Clone, Debug, PartialEq)]
pub struct BroadcastError {
    pub lhs: Vec<usize>,
    pub rhs: Vec<usize>,
}

impl Display for BroadcastError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cannot broadcast shape {:?} with shape {:?}",
            self.lhs, self.rhs
        )
    }
}

impl Error for BroadcastError {}

#[cfg(test)]
mod tests {
    use super::{BroadcastError, DimensionError, FromDataError, ReshapeError};

    #[test]
    fn test_error_messages() {
        struct Case<'a> {
            error: Box<dyn std::error::Error>,
            expected: &'a str,
        }

        let cases = [
            Case {
                error: Box::new(DimensionError {
                    actual: 2,
                    expected: 1,
                }),
                expected: "expected 1 dims but found 2",
            },
            Case {
                error: Box::new(FromDataError::StorageTooShort),
                expected: "data too short",
            },
            Case {
                error: Box::new(FromDataError::NegativeOffset),
                expected: "indices resolve before start of data",
            },
            Case {
                error: Box::new(ReshapeError::NotContiguous),
                expected: "view is not contiguous",
            },
            Case {
                error: Box::new(BroadcastError {
                    lhs: vec![3, 4],
                    rhs: vec![3, 5],
                }),
                expected: "cannot broadcast shape [3, 4] with shape [3, 5]",
            },
        ];

        for Case { error, expected } in cases {
            assert_eq!(error.to_string(), expected);
        }
    }
}
