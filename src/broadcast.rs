//! Shape broadcasting rules, following the NumPy convention: shapes are
//! aligned from their trailing dimensions, and a dimension of size 1 (or a
//! missing leading dimension) stretches to match its counterpart.

use crate::errors::BroadcastError;

/// Compute the common shape that both `a` and `b` broadcast to.
///
/// Fails if some aligned pair of dimensions differs with neither side being
/// size 1.
pub fn broadcast_shapes(a: &[usize], b: &[usize]) -> Result<Vec<usize>, BroadcastError> {
    let mismatch = || BroadcastError {
        lhs: a.to_vec(),
        rhs: b.to_vec(),
    };

    let rank = a.len().max(b.len());
    let mut shape = vec![0; rank];
    for i in 0..rank {
        // Aligned from the trailing end; missing dims behave as size 1.
        let dim_a = if i < a.len() { a[a.len() - 1 - i] } else { 1 };
        let dim_b = if i < b.len() { b[b.len() - 1 - i] } else { 1 };
        shape[rank - 1 - i] = match (dim_a, dim_b) {
            (a, b) if a == b => a,
            (1, b) => b,
            (a, 1) => a,
            _ => return Err(mismatch()),
        };
    }
    Ok(shape)
}
