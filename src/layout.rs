//! Layouts describe the geometry of a strided array: the size of each
//! dimension, the per-dimension stride and the base offset into storage.
//! All structural transforms (transpose, slice, broadcast, permute) are pure
//! layout operations which never touch the data.

use std::iter::zip;
use std::ops::Range;

use smallvec::{smallvec, SmallVec};

use crate::errors::{BroadcastError, FromDataError};
use crate::overlap::may_have_internal_overlap;

/// Inline storage for dimension sizes.
pub(crate) type ShapeVec = SmallVec<[usize; 4]>;

/// Inline storage for dimension strides.
///
/// Strides are signed: a zero stride marks a broadcast dimension where many
/// indices map to one element, a negative stride walks storage backwards.
pub(crate) type StrideVec = SmallVec<[isize; 4]>;

/// Element traversal order for iteration and materialization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Order {
    /// Row-major: the last dimension varies fastest.
    #[default]
    C,

    /// Column-major: the first dimension varies fastest.
    F,
}

impl Order {
    /// The order used when callers express no preference.
    pub fn default_order() -> Order {
        Order::C
    }
}

/// Return true if `permutation` is a valid permutation of dimensions for
/// an array of rank `ndim`.
pub fn is_valid_permutation(ndim: usize, permutation: &[usize]) -> bool {
    permutation.len() == ndim
        && (0..ndim).all(|dim| permutation.iter().filter(|d| **d == dim).count() == 1)
}

/// Specifies whether a layout may have internal overlap.
///
/// An overlapping layout is one in which multiple valid indices map to the
/// same offset in storage. To comply with Rust's rules for mutable aliases,
/// mutable arrays must disallow overlap. Immutable views (eg. broadcasts) may
/// allow it.
pub enum OverlapPolicy {
    AllowOverlap,
    DisallowOverlap,
}

/// Maps indices of an N-dimensional array to offsets in a linear storage
/// buffer.
///
/// A multi-index `(i_0 .. i_k)` resolves to the storage offset
/// `offset + Σ i_d * stride_d`. Strides may be zero (broadcast dimensions)
/// or negative (reversed dimensions); constructors guarantee that every
/// valid index resolves to a non-negative offset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrideLayout {
    shape: ShapeVec,
    strides: StrideVec,
    offset: usize,
}

impl StrideLayout {
    /// Create a layout with a given shape, base offset zero and contiguous
    /// row-major strides.
    pub fn from_shape(shape: &[usize]) -> StrideLayout {
        Self::from_shape_in(Order::C, shape)
    }

    /// Create a layout with a given shape, base offset zero and contiguous
    /// strides in the given order.
    pub fn from_shape_in(order: Order, shape: &[usize]) -> StrideLayout {
        StrideLayout {
            shape: shape.into(),
            strides: contiguous_strides(order, shape),
            offset: 0,
        }
    }

    /// Create a layout with explicit shape, strides and base offset.
    ///
    /// `overlap` controls whether the layout may map several indices to the
    /// same offset. This can be allowed for immutable views but must not be
    /// for owned or mutable arrays.
    ///
    /// Panics if `shape` and `strides` have different lengths. Fails if some
    /// index would resolve to an offset before the start of storage, or if
    /// overlap is disallowed but cannot be ruled out.
    pub fn try_from_shape_and_strides(
        shape: &[usize],
        strides: &[isize],
        offset: usize,
        overlap: OverlapPolicy,
    ) -> Result<StrideLayout, FromDataError> {
        assert!(
            shape.len() == strides.len(),
            "shape has {} dims but strides has {}",
            shape.len(),
            strides.len()
        );
        let layout = StrideLayout {
            shape: shape.into(),
            strides: strides.into(),
            offset,
        };
        if !layout.is_empty() && layout.offset_range().start < 0 {
            return Err(FromDataError::NegativeOffset);
        }
        match overlap {
            OverlapPolicy::DisallowOverlap => {
                if may_have_internal_overlap(shape, strides) {
                    return Err(FromDataError::MayOverlap);
                }
            }
            OverlapPolicy::AllowOverlap => {}
        }
        Ok(layout)
    }

    /// Return the number of dimensions.
    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Return the number of elements: the product of all dimension sizes.
    ///
    /// This is 1 for rank-0 (scalar) layouts and 0 if any dimension is 0.
    #[inline]
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// Return true if the layout has no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the sizes of each dimension.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Return the size of dimension `dim`.
    #[inline]
    pub fn size(&self, dim: usize) -> usize {
        self.shape[dim]
    }

    /// Return the strides of each dimension.
    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Return the stride of dimension `dim`.
    #[inline]
    pub fn stride(&self, dim: usize) -> isize {
        self.strides[dim]
    }

    /// Return the base offset: the storage position of the all-zeros index.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Map an index to a storage offset.
    ///
    /// Panics if any dimension of the index is out of bounds.
    pub fn offset_of(&self, index: &[usize]) -> usize {
        self.try_offset(index).unwrap_or_else(|| {
            panic!(
                "index {:?} out of bounds for shape {:?}",
                index,
                self.shape()
            );
        })
    }

    /// Map an index to a storage offset, or return `None` if the index has
    /// the wrong rank or is out of bounds along any dimension.
    #[inline]
    pub fn try_offset(&self, index: &[usize]) -> Option<usize> {
        let mut valid = index.len() == self.rank();
        let mut offset = self.offset as isize;
        for (&idx, (&size, &stride)) in index
            .iter()
            .zip(self.shape.iter().zip(self.strides.iter()))
        {
            valid = valid && idx < size;
            offset += idx as isize * stride;
        }
        // Constructors guarantee valid indices map to non-negative offsets.
        valid.then_some(offset as usize)
    }

    /// Map an index to a storage offset without validating it against the
    /// shape.
    ///
    /// This method is not itself unsafe, because it only computes an offset
    /// but does not access any data.
    #[inline]
    pub fn offset_unchecked(&self, index: &[usize]) -> usize {
        let mut offset = self.offset as isize;
        for (&idx, &stride) in index.iter().zip(self.strides.iter()) {
            offset += idx as isize * stride;
        }
        offset as usize
    }

    /// Return the range of storage offsets reachable from valid indices, as
    /// signed values. `start` is the minimum reachable offset and `end` is
    /// one past the maximum.
    ///
    /// For empty layouts this is the degenerate range `offset..offset`.
    pub fn offset_range(&self) -> Range<isize> {
        if self.is_empty() {
            return self.offset as isize..self.offset as isize;
        }
        let mut min = self.offset as isize;
        let mut max = self.offset as isize;
        for (&size, &stride) in zip(self.shape.iter(), self.strides.iter()) {
            let reach = (size as isize - 1) * stride;
            if reach < 0 {
                min += reach;
            } else {
                max += reach;
            }
        }
        min..max + 1
    }

    /// Return the minimum storage length required by this layout.
    pub fn min_data_len(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        self.offset_range().end as usize
    }

    /// Return true if iterating over elements in this layout will visit
    /// elements multiple times.
    pub fn is_broadcast(&self) -> bool {
        !self.is_empty() && self.strides.iter().any(|&stride| stride == 0)
    }

    /// Return true if the strides match row-major nesting of the shape.
    ///
    /// The innermost stride may be any value, so a uniformly strided slice
    /// is still C-ordered; [`is_dense`](StrideLayout::is_dense) additionally
    /// requires unit steps. Degenerate layouts of rank < 2 are both
    /// C-ordered and F-ordered.
    pub fn is_c_ordered(&self) -> bool {
        for i in (0..self.rank().saturating_sub(1)).rev() {
            if self.strides[i] != self.strides[i + 1] * self.shape[i + 1] as isize {
                return false;
            }
        }
        true
    }

    /// Return true if the strides match column-major nesting of the shape.
    pub fn is_f_ordered(&self) -> bool {
        for i in 1..self.rank() {
            if self.strides[i] != self.strides[i - 1] * self.shape[i - 1] as isize {
                return false;
            }
        }
        true
    }

    /// Return true if the layout is ordered and additionally steps through
    /// storage one element at a time.
    pub fn is_dense(&self) -> bool {
        if self.rank() == 0 {
            return true;
        }
        (self.is_c_ordered() && self.strides[self.rank() - 1] == 1)
            || (self.is_f_ordered() && self.strides[0] == 1)
    }

    /// Return whichever of the C/F orders this layout satisfies, preferring
    /// F when both apply and the layout is genuinely column-contiguous.
    ///
    /// When the layout is neither C- nor F-ordered, the default order is
    /// returned; callers that only need *some* cheap traversal should use
    /// [`LoopDescriptor::fast`](crate::LoopDescriptor::fast) instead, which
    /// can exploit arbitrary stride patterns.
    pub fn fast_order(&self) -> Order {
        if self.rank() < 2 {
            return Order::default_order();
        }
        if self.is_f_ordered() {
            return Order::F;
        }
        Order::C
    }

    /// Return the contiguous storage range covered by this layout if
    /// traversing it in `order` visits storage offsets sequentially.
    ///
    /// This is the precondition for the zero-copy paths of `ravel` and for
    /// dense iteration.
    pub fn contiguous_range(&self, order: Order) -> Option<Range<usize>> {
        if self.is_empty() {
            return Some(self.offset..self.offset);
        }
        let (dims, strides) = compact_axes(self.fortran_axes(order));
        match dims.len() {
            0 => Some(self.offset..self.offset + 1),
            1 if dims[0] == 1 || strides[0] == 1 => Some(self.offset..self.offset + dims[0]),
            _ => None,
        }
    }

    /// Return the shape and strides re-ordered so that the requested
    /// traversal order becomes column-major (first axis fastest).
    pub(crate) fn fortran_axes(&self, order: Order) -> (ShapeVec, StrideVec) {
        let mut dims: ShapeVec = self.shape.clone();
        let mut strides: StrideVec = self.strides.clone();
        if order == Order::C {
            dims.reverse();
            strides.reverse();
        }
        (dims, strides)
    }

    /// Like [`fortran_axes`](Self::fortran_axes) but sorted by ascending
    /// absolute stride, which yields the cheapest traversal when the caller
    /// does not care about element order. Broadcast (stride 0) axes sort
    /// last so that inner runs stay dense.
    pub(crate) fn fortran_axes_fast(&self) -> (ShapeVec, StrideVec) {
        let mut axes: SmallVec<[(usize, isize); 4]> = self
            .shape
            .iter()
            .copied()
            .zip(self.strides.iter().copied())
            .collect();
        axes.sort_by_key(|&(size, stride)| {
            if stride == 0 {
                (1, 0, size)
            } else {
                (0, stride.unsigned_abs(), size)
            }
        });
        axes.into_iter().unzip()
    }

    /// Re-express this layout with axes in the fortran order for the
    /// requested traversal, optionally merging axes that form a single
    /// contiguous run.
    ///
    /// A layout that is contiguous in `order` compacts to rank 1 (or 0),
    /// which is how callers detect the dense fast path.
    pub fn fortran_layout(&self, order: Order, compact: bool) -> StrideLayout {
        let axes = self.fortran_axes(order);
        let (dims, strides) = if compact { compact_axes(axes) } else { axes };
        StrideLayout {
            shape: dims,
            strides,
            offset: self.offset,
        }
    }

    /// Return a copy of this layout with the given size-1 axes removed.
    ///
    /// Axes in `axes` whose size is not 1 are left in place. Panics if an
    /// axis is out of bounds or appears twice.
    pub fn squeezed(&self, axes: &[usize]) -> StrideLayout {
        let mut named: SmallVec<[bool; 4]> = smallvec![false; self.rank()];
        for &axis in axes {
            self.check_axis(axis);
            assert!(!named[axis], "axes contain duplicates");
            named[axis] = true;
        }
        let mut shape = ShapeVec::new();
        let mut strides = StrideVec::new();
        for i in 0..self.rank() {
            if named[i] && self.shape[i] == 1 {
                continue;
            }
            shape.push(self.shape[i]);
            strides.push(self.strides[i]);
        }
        StrideLayout {
            shape,
            strides,
            offset: self.offset,
        }
    }

    /// Return a copy of this layout with all size-1 axes removed.
    pub fn squeezed_all(&self) -> StrideLayout {
        let axes: ShapeVec = (0..self.rank()).collect();
        self.squeezed(&axes)
    }

    /// Return a copy of this layout with new size-1 axes inserted so that
    /// they occupy positions `axes` in the result.
    ///
    /// The inserted axes have stride 0; remaining axes keep their strides.
    /// Panics if an axis is out of bounds for the resulting rank or appears
    /// twice.
    pub fn stretched(&self, axes: &[usize]) -> StrideLayout {
        let new_rank = self.rank() + axes.len();
        let mut named: SmallVec<[bool; 4]> = smallvec![false; new_rank];
        for &axis in axes {
            assert!(
                axis < new_rank,
                "axis {} out of bounds for array of rank {}",
                axis,
                new_rank
            );
            assert!(!named[axis], "axes contain duplicates");
            named[axis] = true;
        }
        let mut shape: ShapeVec = smallvec![1; new_rank];
        let mut strides: StrideVec = smallvec![0; new_rank];
        let mut src = 0;
        for i in 0..new_rank {
            if !named[i] {
                shape[i] = self.shape[src];
                strides[i] = self.strides[src];
                src += 1;
            }
        }
        StrideLayout {
            shape,
            strides,
            offset: self.offset,
        }
    }

    /// Broadcast a size-1 axis to `size` by setting its stride to 0.
    ///
    /// Panics if the axis does not have size 1.
    pub fn expanded(&self, axis: usize, size: usize) -> StrideLayout {
        self.check_axis(axis);
        assert!(
            self.shape[axis] == 1,
            "axis {} must have size 1 to expand, but has size {}",
            axis,
            self.shape[axis]
        );
        let mut layout = self.clone();
        layout.shape[axis] = size;
        layout.strides[axis] = 0;
        layout
    }

    /// Return a copy of this layout with dimensions re-ordered according to
    /// `dims`.
    ///
    /// Panics if `dims` is not a permutation of `0..self.rank()`.
    pub fn permuted(&self, dims: &[usize]) -> StrideLayout {
        assert!(
            is_valid_permutation(self.rank(), dims),
            "permutation {:?} is invalid for array of rank {}",
            dims,
            self.rank()
        );
        StrideLayout {
            shape: dims.iter().map(|&d| self.shape[d]).collect(),
            strides: dims.iter().map(|&d| self.strides[d]).collect(),
            offset: self.offset,
        }
    }

    /// Return a copy of this layout with the order of dimensions reversed.
    pub fn reverted(&self) -> StrideLayout {
        let mut layout = self.clone();
        layout.shape.reverse();
        layout.strides.reverse();
        layout
    }

    /// Move the axis at position `from` to `to`, keeping the relative order
    /// of other dimensions the same. This is like NumPy's `moveaxis`.
    pub fn moved_axis(&self, from: usize, to: usize) -> StrideLayout {
        self.check_axis(from);
        self.check_axis(to);
        let mut layout = self.clone();
        let size = layout.shape.remove(from);
        let stride = layout.strides.remove(from);
        layout.shape.insert(to, size);
        layout.strides.insert(to, stride);
        layout
    }

    /// Re-sample `axis` as an arithmetic progression of indices: `count`
    /// indices starting at `start`, spaced `step` apart. A zero step turns
    /// the axis into a broadcast of the element at `start`.
    ///
    /// The caller guarantees every sampled index is in bounds for the axis.
    pub(crate) fn resampled_axis(
        &self,
        axis: usize,
        start: usize,
        count: usize,
        step: isize,
    ) -> StrideLayout {
        self.check_axis(axis);
        let mut layout = self.clone();
        layout.offset = (self.offset as isize + start as isize * self.strides[axis]) as usize;
        layout.shape[axis] = count;
        layout.strides[axis] *= step;
        layout
    }

    /// Return a copy of this layout with `axis` removed, regardless of its
    /// size. The remaining axes address the sub-array at index 0 of `axis`.
    pub(crate) fn removed_axis(&self, axis: usize) -> StrideLayout {
        self.check_axis(axis);
        let mut layout = self.clone();
        layout.shape.remove(axis);
        layout.strides.remove(axis);
        layout
    }

    /// Swap two axes of this layout.
    pub fn swapped_axes(&self, a: usize, b: usize) -> StrideLayout {
        self.check_axis(a);
        self.check_axis(b);
        let mut layout = self.clone();
        layout.shape.swap(a, b);
        layout.strides.swap(a, b);
        layout
    }

    /// Restrict `axis` to the index range `start..end`.
    ///
    /// The base offset advances by `start` strides and the axis size becomes
    /// `end - start`. If `keep_dim` is false and the narrowed axis has size
    /// 1, it is dropped from the result.
    ///
    /// Panics if the range is out of bounds; narrowing never clamps.
    pub fn narrowed(&self, axis: usize, keep_dim: bool, start: usize, end: usize) -> StrideLayout {
        self.check_axis(axis);
        assert!(
            start <= end && end <= self.shape[axis],
            "narrow range {}..{} is out of bounds for axis {} with size {}",
            start,
            end,
            axis,
            self.shape[axis]
        );
        let mut layout = self.clone();
        layout.shape[axis] = end - start;
        layout.offset = (self.offset as isize + start as isize * self.strides[axis]) as usize;
        if !keep_dim && layout.shape[axis] == 1 {
            layout.squeezed(&[axis])
        } else {
            layout
        }
    }

    /// Restrict every axis to its `starts[i]..ends[i]` range.
    ///
    /// If `keep_dim` is false, axes narrowed to a single index are dropped.
    pub fn narrowed_all(&self, keep_dim: bool, starts: &[usize], ends: &[usize]) -> StrideLayout {
        assert!(
            starts.len() == self.rank() && ends.len() == self.rank(),
            "expected {} start/end pairs but found {}/{}",
            self.rank(),
            starts.len(),
            ends.len()
        );
        let mut layout = self.clone();
        for axis in 0..self.rank() {
            layout = layout.narrowed(axis, true, starts[axis], ends[axis]);
        }
        if keep_dim {
            layout
        } else {
            let dropped: ShapeVec = (0..self.rank())
                .filter(|&axis| ends[axis] - starts[axis] == 1)
                .collect();
            layout.squeezed(&dropped)
        }
    }

    /// Return true if this layout's shape can be broadcast to `target_shape`
    /// under the trailing-alignment rule.
    pub fn can_broadcast_to(&self, target_shape: &[usize]) -> bool {
        if self.shape() == target_shape {
            return true;
        }
        if self.rank() > target_shape.len() {
            return false;
        }
        let target_dims = target_shape[target_shape.len() - self.rank()..].iter();
        zip(self.shape.iter(), target_dims).all(|(&a, &b)| a == b || a == 1)
    }

    /// Construct a layout which broadcasts elements to `to_shape`.
    ///
    /// Missing leading dimensions are inserted and size-1 dimensions are
    /// stretched by setting their stride to 0. Never copies.
    pub fn broadcast_to(&self, to_shape: &[usize]) -> Result<StrideLayout, BroadcastError> {
        if !self.can_broadcast_to(to_shape) {
            return Err(BroadcastError {
                lhs: self.shape.to_vec(),
                rhs: to_shape.to_vec(),
            });
        }
        let pad = to_shape.len() - self.rank();
        let mut strides: StrideVec = smallvec![0; pad];
        for (i, (&size, &stride)) in zip(self.shape.iter(), self.strides.iter()).enumerate() {
            if size == 1 && to_shape[i + pad] > 1 {
                strides.push(0);
            } else {
                strides.push(stride);
            }
        }
        Ok(StrideLayout {
            shape: to_shape.into(),
            strides,
            offset: self.offset,
        })
    }

    /// Replace this layout's shape with `shape`, keeping contiguous strides
    /// in the requested order. Only valid when the layout covers a single
    /// contiguous run in that order; the caller checks this.
    pub(crate) fn reshaped_unchecked(&self, order: Order, shape: &[usize]) -> StrideLayout {
        let mut layout = StrideLayout::from_shape_in(order, shape);
        layout.offset = self.offset;
        layout
    }

    fn check_axis(&self, axis: usize) {
        assert!(
            axis < self.rank(),
            "axis {} out of bounds for array of rank {}",
            axis,
            self.rank()
        );
    }
}

/// Return the strides that a contiguous layout with a given shape and order
/// would have.
fn contiguous_strides(order: Order, shape: &[usize]) -> StrideVec {
    let mut strides: StrideVec = smallvec![0; shape.len()];
    let mut stride = 1;
    match order {
        Order::C => {
            for i in (0..shape.len()).rev() {
                strides[i] = stride;
                stride *= shape[i] as isize;
            }
        }
        Order::F => {
            for i in 0..shape.len() {
                strides[i] = stride;
                stride *= shape[i] as isize;
            }
        }
    }
    strides
}

/// Merge consecutive axes of fortran-ordered (first-fastest) shape/strides
/// where stepping off the end of one axis lands at the start of the next.
///
/// This minimizes the number of dimensions while preserving the traversal
/// order, so contiguous layouts compact to a single run.
pub(crate) fn compact_axes((dims, strides): (ShapeVec, StrideVec)) -> (ShapeVec, StrideVec) {
    if dims.len() < 2 {
        return (dims, strides);
    }
    let mut out_dims: ShapeVec = smallvec![dims[0]];
    let mut out_strides: StrideVec = smallvec![strides[0]];
    for i in 1..dims.len() {
        let last = out_dims.len() - 1;
        if out_dims[last] as isize * out_strides[last] == strides[i] {
            out_dims[last] *= dims[i];
        } else if out_dims[last] == 1 {
            // A leading size-1 axis imposes no constraint; replace it.
            out_dims[last] = dims[i];
            out_strides[last] = strides[i];
        } else {
            out_dims.push(dims[i]);
            out_strides.push(strides[i]);
        }
    }
    (out_dims, out_strides)
}

#[cfg(test)]
mod tests {
    use super::{Order, OverlapPolicy, StrideLayout};
    use crate::errors::FromDataError;

    fn layout_with_strides(shape: &[usize], strides: &[isize], offset: usize) -> StrideLayout {
        StrideLayout::try_from_shape_and_strides(shape, strides, offset, OverlapPolicy::AllowOverlap)
            .unwrap()
    }

    #[test]
    fn test_from_shape() {
        let layout = StrideLayout::from_shape(&[2, 4, 8]);
        assert_eq!(layout.shape(), &[2, 4, 8]);
        assert_eq!(layout.strides(), &[32, 8, 1]);
        assert_eq!(layout.offset(), 0);
        assert_eq!(layout.len(), 64);

        let layout = StrideLayout::from_shape_in(Order::F, &[2, 4, 8]);
        assert_eq!(layout.strides(), &[1, 2, 8]);
    }

    #[test]
    fn test_offset_of() {
        let layout = StrideLayout::from_shape(&[2, 3]);
        assert_eq!(layout.offset_of(&[0, 0]), 0);
        assert_eq!(layout.offset_of(&[1, 2]), 5);
        assert_eq!(layout.try_offset(&[2, 0]), None);
        assert_eq!(layout.try_offset(&[0]), None);
    }

    #[test]
    #[should_panic(expected = "index [0, 3] out of bounds for shape [2, 3]")]
    fn test_offset_of_invalid() {
        let layout = StrideLayout::from_shape(&[2, 3]);
        layout.offset_of(&[0, 3]);
    }

    #[test]
    fn test_negative_strides() {
        // A reversed vector view of 4 elements starting at offset 3.
        let layout = layout_with_strides(&[4], &[-1], 3);
        assert_eq!(layout.offset_of(&[0]), 3);
        assert_eq!(layout.offset_of(&[3]), 0);
        assert_eq!(layout.offset_range(), 0..4);
        assert_eq!(layout.min_data_len(), 4);

        // Same view with an offset that underflows storage.
        let result = StrideLayout::try_from_shape_and_strides(
            &[4],
            &[-1],
            2,
            OverlapPolicy::AllowOverlap,
        );
        assert_eq!(result, Err(FromDataError::NegativeOffset));
    }

    #[test]
    fn test_ordering_classification() {
        struct Case<'a> {
            shape: &'a [usize],
            strides: &'a [isize],
            c_ordered: bool,
            f_ordered: bool,
            dense: bool,
        }

        let cases = [
            Case {
                shape: &[2, 3],
                strides: &[3, 1],
                c_ordered: true,
                f_ordered: false,
                dense: true,
            },
            Case {
                shape: &[2, 3],
                strides: &[1, 2],
                c_ordered: false,
                f_ordered: true,
                dense: true,
            },
            // Rank < 2 layouts are both C- and F-ordered.
            Case {
                shape: &[5],
                strides: &[2],
                c_ordered: true,
                f_ordered: true,
                dense: false,
            },
            Case {
                shape: &[],
                strides: &[],
                c_ordered: true,
                f_ordered: true,
                dense: true,
            },
            // Uniformly strided slice: nesting still matches row-major,
            // but the non-unit inner step rules out density.
            Case {
                shape: &[2, 3],
                strides: &[6, 2],
                c_ordered: true,
                f_ordered: false,
                dense: false,
            },
            // Transposed slice of the above.
            Case {
                shape: &[3, 2],
                strides: &[2, 6],
                c_ordered: false,
                f_ordered: true,
                dense: false,
            },
            // Gap between rows: ordered in neither direction.
            Case {
                shape: &[2, 3],
                strides: &[8, 2],
                c_ordered: false,
                f_ordered: false,
                dense: false,
            },
        ];

        for Case {
            shape,
            strides,
            c_ordered,
            f_ordered,
            dense,
        } in cases
        {
            let layout = layout_with_strides(shape, strides, 0);
            assert_eq!(layout.is_c_ordered(), c_ordered, "shape {:?}", shape);
            assert_eq!(layout.is_f_ordered(), f_ordered, "shape {:?}", shape);
            assert_eq!(layout.is_dense(), dense, "shape {:?}", shape);
        }
    }

    #[test]
    fn test_fast_order() {
        assert_eq!(StrideLayout::from_shape(&[2, 3]).fast_order(), Order::C);
        assert_eq!(
            StrideLayout::from_shape_in(Order::F, &[2, 3]).fast_order(),
            Order::F
        );
        assert_eq!(StrideLayout::from_shape(&[5]).fast_order(), Order::C);
    }

    #[test]
    fn test_contiguous_range() {
        let layout = StrideLayout::from_shape(&[2, 3]);
        assert_eq!(layout.contiguous_range(Order::C), Some(0..6));
        assert_eq!(layout.contiguous_range(Order::F), None);

        let transposed = layout.reverted();
        assert_eq!(transposed.contiguous_range(Order::C), None);
        assert_eq!(transposed.contiguous_range(Order::F), Some(0..6));

        // A narrowed view is contiguous but begins at a non-zero offset.
        let narrowed = layout.narrowed(0, true, 1, 2);
        assert_eq!(narrowed.contiguous_range(Order::C), Some(3..6));

        // Empty layouts are trivially contiguous.
        let empty = StrideLayout::from_shape(&[0, 3]);
        assert_eq!(empty.contiguous_range(Order::C), Some(0..0));
    }

    #[test]
    fn test_fortran_layout_compaction() {
        // C-contiguous layout compacts to a single run when traversed in C
        // order.
        let layout = StrideLayout::from_shape(&[2, 4, 8]);
        let compact = layout.fortran_layout(Order::C, true);
        assert_eq!(compact.shape(), &[64]);
        assert_eq!(compact.strides(), &[1]);

        // ...but not when traversed in F order.
        let fortran = layout.fortran_layout(Order::F, true);
        assert_eq!(fortran.rank(), 3);

        // Leading size-1 axes do not prevent compaction.
        let layout = layout_with_strides(&[2, 1, 2], &[2, 2, 1], 0);
        let compact = layout.fortran_layout(Order::C, true);
        assert_eq!(compact.shape(), &[4]);
        assert_eq!(compact.strides(), &[1]);
    }

    #[test]
    fn test_squeezed() {
        let layout = StrideLayout::from_shape(&[1, 1, 10, 20]);
        let squeezed = layout.squeezed_all();
        assert_eq!(squeezed.shape(), &[10, 20]);
        assert_eq!(squeezed.strides(), &[20, 1]);

        // Named axes whose size is not 1 are kept.
        let squeezed = layout.squeezed(&[0, 2]);
        assert_eq!(squeezed.shape(), &[1, 10, 20]);

        // Squeezing nothing returns an identical layout.
        let layout = StrideLayout::from_shape(&[3, 4]);
        assert_eq!(layout.squeezed_all(), layout);

        // Rank is not bounded by any fixed mask size.
        let mut shape = vec![1; 70];
        shape[69] = 5;
        let tall = StrideLayout::from_shape(&shape);
        assert_eq!(tall.squeezed_all().shape(), &[5]);
        assert_eq!(tall.stretched(&[70]).rank(), 71);
    }

    #[test]
    fn test_stretched() {
        let layout = StrideLayout::from_shape(&[10, 20]);
        let stretched = layout.stretched(&[0, 3]);
        assert_eq!(stretched.shape(), &[1, 10, 20, 1]);
        assert_eq!(stretched.strides(), &[0, 20, 1, 0]);
        assert_eq!(stretched.squeezed_all(), layout);
    }

    #[test]
    #[should_panic(expected = "axes contain duplicates")]
    fn test_stretched_duplicate_axes() {
        StrideLayout::from_shape(&[10]).stretched(&[1, 1]);
    }

    #[test]
    fn test_expanded() {
        let layout = StrideLayout::from_shape(&[1, 5]);
        let expanded = layout.expanded(0, 3);
        assert_eq!(expanded.shape(), &[3, 5]);
        assert_eq!(expanded.strides(), &[0, 1]);
        assert!(expanded.is_broadcast());
    }

    #[test]
    #[should_panic(expected = "axis 1 must have size 1 to expand, but has size 5")]
    fn test_expanded_invalid_axis() {
        StrideLayout::from_shape(&[1, 5]).expanded(1, 3);
    }

    #[test]
    fn test_permuted_round_trip() {
        let layout = layout_with_strides(&[2, 3, 4], &[12, 4, 1], 5);
        let perm = [2, 0, 1];
        let inverse = [1, 2, 0];
        let permuted = layout.permuted(&perm);
        assert_eq!(permuted.shape(), &[4, 2, 3]);
        assert_eq!(permuted.strides(), &[1, 12, 4]);
        assert_eq!(permuted.offset(), 5);
        assert_eq!(permuted.permuted(&inverse), layout);
    }

    #[test]
    #[should_panic(expected = "permutation [1, 1] is invalid")]
    fn test_permuted_invalid() {
        StrideLayout::from_shape(&[2, 3]).permuted(&[1, 1]);
    }

    #[test]
    fn test_reverted() {
        let layout = StrideLayout::from_shape(&[2, 3]);
        let reverted = layout.reverted();
        assert_eq!(reverted.shape(), &[3, 2]);
        assert_eq!(reverted.strides(), &[1, 3]);
        assert_eq!(reverted.reverted(), layout);
    }

    #[test]
    fn test_moved_axis() {
        let layout = StrideLayout::from_shape(&[2, 4, 8]);

        let moved = layout.moved_axis(1, 0);
        assert_eq!(moved.shape(), &[4, 2, 8]);
        assert_eq!(moved.strides(), &[8, 32, 1]);

        let moved = layout.moved_axis(0, 2);
        assert_eq!(moved.shape(), &[4, 8, 2]);
        assert_eq!(moved.strides(), &[8, 1, 32]);
    }

    #[test]
    fn test_swapped_axes() {
        let layout = StrideLayout::from_shape(&[2, 4, 8]);
        let swapped = layout.swapped_axes(0, 2);
        assert_eq!(swapped.shape(), &[8, 4, 2]);
        assert_eq!(swapped.strides(), &[1, 8, 32]);
    }

    #[test]
    fn test_narrowed() {
        let layout = StrideLayout::from_shape(&[4, 6]);

        let narrowed = layout.narrowed(1, true, 2, 5);
        assert_eq!(narrowed.shape(), &[4, 3]);
        assert_eq!(narrowed.strides(), &[6, 1]);
        assert_eq!(narrowed.offset(), 2);

        // Narrowing to a single index drops the axis when keep_dim is false.
        let narrowed = layout.narrowed(0, false, 3, 4);
        assert_eq!(narrowed.shape(), &[6]);
        assert_eq!(narrowed.offset(), 18);

        let narrowed = layout.narrowed(0, true, 3, 4);
        assert_eq!(narrowed.shape(), &[1, 6]);
    }

    #[test]
    #[should_panic(expected = "narrow range 2..7 is out of bounds for axis 1 with size 6")]
    fn test_narrowed_invalid() {
        StrideLayout::from_shape(&[4, 6]).narrowed(1, true, 2, 7);
    }

    #[test]
    fn test_narrowed_all() {
        let layout = StrideLayout::from_shape(&[4, 6]);
        let narrowed = layout.narrowed_all(true, &[1, 2], &[3, 3]);
        assert_eq!(narrowed.shape(), &[2, 1]);
        assert_eq!(narrowed.offset(), 8);

        let narrowed = layout.narrowed_all(false, &[1, 2], &[3, 3]);
        assert_eq!(narrowed.shape(), &[2]);
    }

    #[test]
    fn test_broadcast_to() {
        let layout = StrideLayout::from_shape(&[3, 1, 5]);
        let broadcast = layout.broadcast_to(&[2, 3, 4, 5]).unwrap();
        assert_eq!(broadcast.shape(), &[2, 3, 4, 5]);
        assert_eq!(broadcast.strides(), &[0, 5, 0, 1]);

        // A size-1 axis stretches without changing rank.
        let broadcast = layout.broadcast_to(&[3, 2, 5]).unwrap();
        assert_eq!(broadcast.strides(), &[5, 0, 1]);

        let err = layout.broadcast_to(&[2, 3, 5]).unwrap_err();
        assert_eq!(err.lhs, &[3, 1, 5]);
        assert_eq!(err.rhs, &[2, 3, 5]);
    }

    #[test]
    fn test_offset_range_broadcast() {
        let layout = layout_with_strides(&[4, 3], &[0, 1], 2);
        assert_eq!(layout.offset_range(), 2..5);
        assert_eq!(layout.min_data_len(), 5);
    }
}
