//! Element iterators over strided arrays.
//!
//! Iterators have two paths: a direct path which wraps a slice iterator and
//! is used whenever the traversal covers a contiguous storage range, and a
//! strided path driven by a [LoopDescriptor] offset stream. Tight loops over
//! dense arrays therefore optimize the same as iterating a `Vec`.

use std::iter::FusedIterator;
use std::slice;

use crate::layout::{Order, StrideLayout};
use crate::loops::{LoopDescriptor, Offsets};
use crate::storage::{Storage, StorageMut, ViewData, ViewMutData};

/// Iterator over the elements of an array in a given traversal order.
pub struct Iter<'a, T> {
    kind: IterKind<'a, T>,
}

enum IterKind<'a, T> {
    Direct(slice::Iter<'a, T>),
    Strided {
        data: ViewData<'a, T>,
        offsets: Offsets,
    },
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(layout: &StrideLayout, data: ViewData<'a, T>) -> Iter<'a, T> {
        Self::new_in(Order::C, layout, data)
    }

    pub(crate) fn new_in(order: Order, layout: &StrideLayout, data: ViewData<'a, T>) -> Iter<'a, T> {
        let kind = if let Some(range) = layout.contiguous_range(order) {
            // Safety: the iterator borrows the array immutably, so no
            // mutable references to these elements can exist.
            let slice = unsafe { data.slice(range).as_slice() };
            IterKind::Direct(slice.iter())
        } else {
            IterKind::Strided {
                data,
                offsets: LoopDescriptor::new(layout, order).into_offsets(),
            }
        };
        Iter { kind }
    }
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        let kind = match &self.kind {
            IterKind::Direct(iter) => IterKind::Direct(iter.clone()),
            IterKind::Strided { data, offsets } => IterKind::Strided {
                data: *data,
                offsets: offsets.clone(),
            },
        };
        Iter { kind }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        match &mut self.kind {
            IterKind::Direct(iter) => iter.next(),
            IterKind::Strided { data, offsets } => offsets.next().map(|offset| {
                // Safety: offsets produced by a loop descriptor are within
                // the layout's offset range, which constructors check
                // against the storage length. The array is immutably
                // borrowed for 'a.
                unsafe { data.get_unchecked(offset) }
            }),
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.kind {
            IterKind::Direct(iter) => iter.size_hint(),
            IterKind::Strided { offsets, .. } => offsets.size_hint(),
        }
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

/// Mutable iterator over the elements of an array.
///
/// Only constructed for layouts without internal overlap, so each element is
/// yielded exactly once.
pub struct IterMut<'a, T> {
    kind: IterMutKind<'a, T>,
}

enum IterMutKind<'a, T> {
    Direct(slice::IterMut<'a, T>),
    Strided {
        data: ViewMutData<'a, T>,
        offsets: Offsets,
    },
}

impl<'a, T> IterMut<'a, T> {
    pub(crate) fn new(layout: &StrideLayout, data: ViewMutData<'a, T>) -> IterMut<'a, T> {
        let kind = if let Some(range) = layout.contiguous_range(Order::C) {
            // Safety: `data` is the unique live reference to this storage.
            let slice = unsafe { data.into_slice_range(range).to_slice_mut() };
            IterMutKind::Direct(slice.iter_mut())
        } else {
            IterMutKind::Strided {
                data,
                offsets: LoopDescriptor::new(layout, Order::C).into_offsets(),
            }
        };
        IterMut { kind }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<&'a mut T> {
        match &mut self.kind {
            IterMutKind::Direct(iter) => iter.next(),
            IterMutKind::Strided { data, offsets } => offsets.next().map(|offset| {
                debug_assert!(offset < data.len());
                // Safety: the layout has no internal overlap, so each offset
                // is yielded once and the references do not alias.
                unsafe { &mut *data.as_mut_ptr().add(offset) }
            }),
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.kind {
            IterMutKind::Direct(iter) => iter.size_hint(),
            IterMutKind::Strided { offsets, .. } => offsets.size_hint(),
        }
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

impl<T> FusedIterator for IterMut<'_, T> {}

#[cfg(test)]
mod tests {
    use super::{Iter, IterMut};
    use crate::layout::{Order, StrideLayout};
    use crate::storage::IntoStorage;

    #[test]
    fn test_iter_dense() {
        let data = vec![1, 2, 3, 4, 5, 6];
        let layout = StrideLayout::from_shape(&[2, 3]);
        let iter = Iter::new(&layout, data.as_slice().into_storage());
        assert_eq!(iter.len(), 6);
        assert_eq!(iter.copied().collect::<Vec<_>>(), data);
    }

    #[test]
    fn test_iter_strided() {
        let data = vec![1, 2, 3, 4, 5, 6];
        // Transposed view: C-order traversal walks storage columns.
        let layout = StrideLayout::from_shape(&[2, 3]).reverted();
        let iter = Iter::new(&layout, data.as_slice().into_storage());
        assert_eq!(iter.copied().collect::<Vec<_>>(), &[1, 4, 2, 5, 3, 6]);

        // F-order traversal of the transposed view is dense again.
        let iter = Iter::new_in(Order::F, &layout, data.as_slice().into_storage());
        assert_eq!(iter.copied().collect::<Vec<_>>(), data);
    }

    #[test]
    fn test_iter_broadcast() {
        let data = vec![1, 2];
        let layout = StrideLayout::from_shape(&[2, 1]).expanded(1, 3);
        let iter = Iter::new(&layout, data.as_slice().into_storage());
        assert_eq!(iter.copied().collect::<Vec<_>>(), &[1, 1, 1, 2, 2, 2]);
    }

    #[test]
    fn test_iter_mut_write_through() {
        let mut data = vec![1, 2, 3, 4, 5, 6];
        // A strided column view: every second element.
        let layout =
            StrideLayout::try_from_shape_and_strides(&[3], &[2], 1, crate::OverlapPolicy::DisallowOverlap)
                .unwrap();
        let iter = IterMut::new(&layout, data.as_mut_slice().into_storage());
        for x in iter {
            *x = -*x;
        }
        assert_eq!(data, &[1, -2, 3, -4, 5, -6]);
    }

    #[test]
    fn test_iter_empty() {
        let data: Vec<i32> = Vec::new();
        let layout = StrideLayout::from_shape(&[0, 3]);
        let mut iter = Iter::new(&layout, data.as_slice().into_storage());
        assert_eq!(iter.next(), None);
    }
}
