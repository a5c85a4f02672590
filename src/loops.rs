//! Loop descriptors compile a strided layout into a flat iteration plan: a
//! list of run start offsets plus a single (size, step) pair for the inner
//! run. Kernels then reduce to "for each offset, walk `size` elements with
//! stride `step`", with no per-element index arithmetic.

use crate::index_iterator::DynIndices;
use crate::layout::{compact_axes, Order, StrideLayout};

/// Iteration plan for visiting every element of a strided layout.
///
/// Each offset in `offsets` is the storage position of the first element of
/// one inner run; the run then has `size` elements spaced `step` apart. For
/// layouts that are contiguous in the requested order the plan collapses to
/// a single run with unit step, which callers detect via
/// [`is_unit_run`](Self::is_unit_run) to dispatch dense slice kernels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoopDescriptor {
    offsets: Vec<usize>,
    size: usize,
    step: isize,
}

impl LoopDescriptor {
    /// Build the plan that visits `layout`'s elements in `order`.
    pub fn new(layout: &StrideLayout, order: Order) -> LoopDescriptor {
        Self::from_axes(layout.offset(), layout.fortran_axes(order))
    }

    /// Build the cheapest plan for `layout`, ignoring element order.
    ///
    /// Axes are sorted by ascending absolute stride before compaction, so
    /// any layout whose elements happen to occupy a contiguous storage range
    /// gets a unit-step run even if it is neither C- nor F-ordered.
    pub fn fast(layout: &StrideLayout) -> LoopDescriptor {
        Self::from_axes(layout.offset(), layout.fortran_axes_fast())
    }

    fn from_axes(
        base: usize,
        axes: (
            smallvec::SmallVec<[usize; 4]>,
            smallvec::SmallVec<[isize; 4]>,
        ),
    ) -> LoopDescriptor {
        let (dims, strides) = compact_axes(axes);
        if dims.iter().product::<usize>() == 0 {
            return LoopDescriptor {
                offsets: Vec::new(),
                size: 0,
                step: 1,
            };
        }
        let (size, step) = match dims.first() {
            Some(&size) => (size, strides[0]),
            // Rank 0: one run of one element.
            None => (1, 1),
        };
        let outer_dims = &dims[dims.len().min(1)..];
        let outer_strides = &strides[strides.len().min(1)..];
        let offsets = DynIndices::from_shape_in(Order::F, outer_dims)
            .map(|index| {
                let mut offset = base as isize;
                for (&idx, &stride) in index.iter().zip(outer_strides) {
                    offset += idx as isize * stride;
                }
                offset as usize
            })
            .collect();
        LoopDescriptor {
            offsets,
            size,
            step,
        }
    }

    /// Storage offsets of the first element of each run.
    #[inline]
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Number of elements in each run.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Signed storage distance between consecutive elements of a run.
    #[inline]
    pub fn step(&self) -> isize {
        self.step
    }

    /// Total number of elements visited by the plan.
    pub fn len(&self) -> usize {
        self.offsets.len() * self.size
    }

    /// Return true if the plan visits no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return true if the whole plan is a single run stepping one element at
    /// a time, ie. the elements form one contiguous slice of storage.
    pub fn is_unit_run(&self) -> bool {
        self.offsets.len() == 1 && self.step == 1
    }

    /// Iterate over every element offset in plan order. Used by the strided
    /// slow paths; dense kernels use [`is_unit_run`](Self::is_unit_run) and
    /// slice directly.
    pub fn iter_offsets(&self) -> impl Iterator<Item = usize> + '_ {
        let size = self.size;
        let step = self.step;
        self.offsets.iter().flat_map(move |&start| {
            (0..size).map(move |i| (start as isize + i as isize * step) as usize)
        })
    }

    /// Consuming version of [`iter_offsets`](Self::iter_offsets), for
    /// iterators that need to own their traversal state.
    pub fn into_offsets(self) -> Offsets {
        Offsets {
            remaining: self.len(),
            run: 0,
            pos: 0,
            plan: self,
        }
    }
}

/// Owned iterator over the element offsets of a [LoopDescriptor].
#[derive(Clone)]
pub struct Offsets {
    plan: LoopDescriptor,
    run: usize,
    pos: usize,
    remaining: usize,
}

impl Iterator for Offsets {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let start = self.plan.offsets[self.run] as isize;
        let offset = (start + self.pos as isize * self.plan.step) as usize;
        self.pos += 1;
        if self.pos == self.plan.size {
            self.pos = 0;
            self.run += 1;
        }
        self.remaining -= 1;
        Some(offset)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Offsets {}

impl std::iter::FusedIterator for Offsets {}
