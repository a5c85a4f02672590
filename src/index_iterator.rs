use std::iter::FusedIterator;

use smallvec::{smallvec, SmallVec};

use crate::layout::Order;

/// The index type yielded by [DynIndices].
pub type DynIndex = SmallVec<[usize; 4]>;

/// Iterator over the N-dimensional indices of a shape, in a chosen traversal
/// order.
///
/// The number of dimensions may be zero, in which case the iterator will
/// yield a single empty index. This is consistent with eg. `ndindex` in
/// NumPy.
pub struct DynIndices {
    shape: DynIndex,
    order: Order,
    next: Option<DynIndex>,

    /// Remaining iteration steps.
    steps: usize,
}

impl DynIndices {
    /// Return an iterator over all indices of `shape` in row-major order.
    pub fn from_shape(shape: &[usize]) -> DynIndices {
        Self::from_shape_in(Order::C, shape)
    }

    /// Return an iterator over all indices of `shape`, varying the last
    /// dimension fastest for [`Order::C`] or the first for [`Order::F`].
    pub fn from_shape_in(order: Order, shape: &[usize]) -> DynIndices {
        let steps = shape.iter().product();
        DynIndices {
            // An empty shape yields a single empty index even though the
            // step product is 1 either way; a zero-size dim yields nothing.
            next: (steps > 0).then(|| smallvec![0; shape.len()]),
            shape: shape.into(),
            order,
            steps,
        }
    }
}

impl Iterator for DynIndices {
    type Item = DynIndex;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.clone()?;

        let mut next = current.clone();
        let mut has_next = false;

        // Odometer increment over the fastest-varying dimension first.
        let advance = |(&size, index): (&usize, &mut usize)| -> bool {
            *index += 1;
            if *index == size {
                *index = 0;
                false
            } else {
                true
            }
        };
        let dims = self.shape.iter().zip(next.iter_mut());
        match self.order {
            Order::C => {
                for dim in dims.rev() {
                    if advance(dim) {
                        has_next = true;
                        break;
                    }
                }
            }
            Order::F => {
                for dim in dims {
                    if advance(dim) {
                        has_next = true;
                        break;
                    }
                }
            }
        }

        self.next = has_next.then_some(next);
        self.steps -= 1;

        Some(current)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.steps, Some(self.steps))
    }
}

impl ExactSizeIterator for DynIndices {}

impl FusedIterator for DynIndices {}
