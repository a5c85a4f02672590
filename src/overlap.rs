//! Helpers to determine whether a layout may map multiple indices to the
//! same storage offset ("internal overlap").
//!
//! Mutable arrays must have layouts where every valid index maps to a unique
//! offset, otherwise it would be possible to obtain two mutable references to
//! the same element. Verifying this exactly for arbitrary strides is
//! non-trivial (see `mem_overlap.c` in the NumPy source), so this module
//! implements a conservative check: it may report that a layout overlaps when
//! it does not, but never the opposite.

/// Return true if a layout with the given shape and strides is C-contiguous
/// with unit stride, ie. iterating over it in row-major order visits storage
/// offsets `0..len` in sequence.
pub fn is_contiguous(shape: &[usize], strides: &[isize]) -> bool {
    let mut product = 1;
    for (&size, &stride) in shape.iter().zip(strides.iter()).rev() {
        if size > 1 && stride != product {
            return false;
        }
        product *= size as isize;
    }
    true
}

/// Return true if a layout with the given shape and strides may map multiple
/// indices to the same offset.
pub fn may_have_internal_overlap(shape: &[usize], strides: &[isize]) -> bool {
    // Empty layouts have no valid indices, so no overlap.
    if shape.iter().any(|&size| size == 0) {
        return false;
    }

    if is_contiguous(shape, strides) {
        return false;
    }

    // Sort the dimensions that can be stepped along by ascending absolute
    // stride. Size-1 dims are skipped since their stride is never used.
    let mut stride_shape: Vec<(usize, usize)> = shape
        .iter()
        .zip(strides.iter())
        .filter(|(&size, _)| size > 1)
        .map(|(&size, &stride)| (stride.unsigned_abs(), size))
        .collect();
    stride_shape.sort_unstable();

    // Check that the extent covered by all inner dimensions fits within one
    // step of each outer dimension.
    let mut max_offset = 0;
    for (stride, size) in stride_shape {
        if stride <= max_offset {
            return true;
        }
        max_offset += stride * (size - 1);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::{is_contiguous, may_have_internal_overlap};

    #[test]
    fn test_is_contiguous() {
        struct Case<'a> {
            shape: &'a [usize],
            strides: &'a [isize],
            contiguous: bool,
        }

        let cases = [
            Case {
                shape: &[2, 3],
                strides: &[3, 1],
                contiguous: true,
            },
            Case {
                shape: &[2, 3],
                strides: &[1, 2],
                contiguous: false,
            },
            // Strides of size-1 dims don't matter.
            Case {
                shape: &[1, 3],
                strides: &[100, 1],
                contiguous: true,
            },
            // Scalar
            Case {
                shape: &[],
                strides: &[],
                contiguous: true,
            },
        ];

        for Case {
            shape,
            strides,
            contiguous,
        } in cases
        {
            assert_eq!(is_contiguous(shape, strides), contiguous);
        }
    }

    #[test]
    fn test_may_have_internal_overlap() {
        struct Case<'a> {
            shape: &'a [usize],
            strides: &'a [isize],
            overlap: bool,
        }

        let cases = [
            // Contiguous layout
            Case {
                shape: &[2, 3],
                strides: &[3, 1],
                overlap: false,
            },
            // Transposed layout
            Case {
                shape: &[3, 2],
                strides: &[1, 3],
                overlap: false,
            },
            // Broadcast layout
            Case {
                shape: &[2, 3],
                strides: &[0, 1],
                overlap: true,
            },
            // Strides smaller than inner extent
            Case {
                shape: &[4, 4],
                strides: &[2, 1],
                overlap: true,
            },
            // Reversed layout. Offsets are distinct even though the stride is
            // negative.
            Case {
                shape: &[4],
                strides: &[-1],
                overlap: false,
            },
            // Empty layout
            Case {
                shape: &[0, 4],
                strides: &[0, 0],
                overlap: false,
            },
        ];

        for Case {
            shape,
            strides,
            overlap,
        } in cases
        {
            assert_eq!(may_have_internal_overlap(shape, strides), overlap);
        }
    }
}
