//! The array types: an owned array, immutable and mutable views, and a
//! conditionally-owned array for operations that copy only when they must.
//!
//! All of them are instances of [TensorBase], which pairs a [Storage] with a
//! [StrideLayout]. Structural operations (permute, narrow, broadcast,
//! squeeze...) adjust only the layout; numeric operations are dispatched
//! through the operator catalog in [crate::ops].

use std::borrow::Cow;
use std::ops::{Index, IndexMut, Range};

use rayon::prelude::*;

use crate::broadcast::broadcast_shapes;
use crate::copy::{copy_into_vec, map_into_vec, zip_map_into_vec, PARALLEL_THRESHOLD};
use crate::errors::{BroadcastError, DimensionError, FromDataError, ReshapeError};
use crate::index_iterator::DynIndices;
use crate::iterators::{Iter, IterMut};
use crate::layout::{Order, OverlapPolicy, StrideLayout};
use crate::loops::LoopDescriptor;
use crate::ops::{
    Abs, AddOp, AssocOp, BinaryOp, CastFrom, Ceil, Cos, DivOp, Element, Exp, FloatElement, Floor,
    Ln, Max, Min, MulOp, NanMax, NanMin, NanProd, NanSum, Neg, Prod, Round, Sin, Sqrt, SubOp, Sum,
    Tan, UnaryOp,
};
use crate::storage::{IntoStorage, Storage, StorageMut, ViewData, ViewMutData};

/// N-dimensional array of elements of type `S::Elem`, parameterized by its
/// storage.
///
/// The named concrete forms are [Tensor] (owned), [TensorView] /
/// [TensorViewMut] (borrowed) and [CowTensor] (borrowed or owned).
pub struct TensorBase<S: Storage> {
    data: S,
    layout: StrideLayout,
}

/// An array which owns its elements.
pub type Tensor<T> = TensorBase<Vec<T>>;

/// An immutable view of an array.
pub type TensorView<'a, T> = TensorBase<ViewData<'a, T>>;

/// A mutable view of an array.
pub type TensorViewMut<'a, T> = TensorBase<ViewMutData<'a, T>>;

/// An array which either borrows or owns its elements.
///
/// Returned by operations such as [`ravel`](TensorBase::ravel) and
/// [`take`](TensorBase::take) which are zero-copy when the geometry allows
/// and copy otherwise.
pub type CowTensor<'a, T> = TensorBase<Cow<'a, [T]>>;

/// Methods available on both owned arrays and views.
///
/// This trait exists so that the structural transforms, which always return
/// a [TensorView], can be written once. [TensorView] additionally has
/// inherent versions of these methods which preserve the view's lifetime
/// rather than borrowing from the view object itself.
pub trait AsView {
    type Elem;

    /// Return an immutable view of this array.
    fn view(&self) -> TensorView<'_, Self::Elem>;

    /// Return a view with the dimensions re-ordered according to `dims`.
    fn permuted(&self, dims: &[usize]) -> TensorView<'_, Self::Elem> {
        self.view().permuted(dims)
    }

    /// Return a view with the order of dimensions reversed.
    fn transposed(&self) -> TensorView<'_, Self::Elem> {
        self.view().transposed()
    }

    /// Return a view with the axis at `from` moved to position `to`.
    fn moved_axis(&self, from: usize, to: usize) -> TensorView<'_, Self::Elem> {
        self.view().moved_axis(from, to)
    }

    /// Return a view with axes `a` and `b` swapped.
    fn swapped_axes(&self, a: usize, b: usize) -> TensorView<'_, Self::Elem> {
        self.view().swapped_axes(a, b)
    }

    /// Return a view with the given size-1 axes removed.
    fn squeezed(&self, axes: &[usize]) -> TensorView<'_, Self::Elem> {
        self.view().squeezed(axes)
    }

    /// Return a view with all size-1 axes removed.
    fn squeezed_all(&self) -> TensorView<'_, Self::Elem> {
        self.view().squeezed_all()
    }

    /// Return a view with new size-1 axes inserted at positions `axes`.
    fn stretched(&self, axes: &[usize]) -> TensorView<'_, Self::Elem> {
        self.view().stretched(axes)
    }

    /// Return a view with the size-1 axis `axis` broadcast to `size`.
    fn expanded(&self, axis: usize, size: usize) -> TensorView<'_, Self::Elem> {
        self.view().expanded(axis, size)
    }

    /// Return a view restricted to `range` along `axis`.
    fn narrowed(&self, axis: usize, range: Range<usize>) -> TensorView<'_, Self::Elem> {
        self.view().narrowed(axis, range)
    }

    /// Return a view restricted to `ranges` along every axis.
    fn narrowed_all(&self, ranges: &[Range<usize>]) -> TensorView<'_, Self::Elem> {
        self.view().narrowed_all(ranges)
    }

    /// Return the sub-array at `index` along `axis`, with that axis removed.
    fn index_axis(&self, axis: usize, index: usize) -> TensorView<'_, Self::Elem> {
        self.view().index_axis(axis, index)
    }

    /// Return a view broadcast to `shape`.
    ///
    /// Panics if this array's shape cannot broadcast to `shape`.
    fn broadcast(&self, shape: &[usize]) -> TensorView<'_, Self::Elem> {
        self.view().broadcast(shape)
    }

    /// Fallible version of [`broadcast`](AsView::broadcast).
    fn try_broadcast(
        &self,
        shape: &[usize],
    ) -> Result<TensorView<'_, Self::Elem>, BroadcastError> {
        self.view().try_broadcast(shape)
    }
}

impl<S: Storage> AsView for TensorBase<S> {
    type Elem = S::Elem;

    fn view(&self) -> TensorView<'_, S::Elem> {
        TensorBase {
            data: self.data.view(),
            layout: self.layout.clone(),
        }
    }
}

impl<S: Storage> TensorBase<S> {
    /// Create an array with a given shape and row-major element order.
    ///
    /// Panics if the storage length does not match the shape's element
    /// count.
    pub fn from_data<D: IntoStorage<Output = S>>(shape: &[usize], data: D) -> TensorBase<S> {
        Self::try_from_data(shape, data).unwrap_or_else(|_| {
            panic!("data length does not match shape {:?}", shape);
        })
    }

    /// Fallible version of [`from_data`](TensorBase::from_data).
    pub fn try_from_data<D: IntoStorage<Output = S>>(
        shape: &[usize],
        data: D,
    ) -> Result<TensorBase<S>, FromDataError> {
        let data = data.into_storage();
        let layout = StrideLayout::from_shape(shape);
        if layout.len() != data.len() {
            return Err(FromDataError::StorageLengthMismatch);
        }
        Ok(TensorBase { data, layout })
    }

    /// Create an array with explicit strides and base offset.
    ///
    /// The layout may not have internal overlap, since this constructor is
    /// also used for mutable storage. Use
    /// [`TensorView::from_slice_with_strides`] to build immutable views of
    /// overlapping data (eg. manual broadcasts).
    pub fn try_from_data_with_strides<D: IntoStorage<Output = S>>(
        shape: &[usize],
        data: D,
        strides: &[isize],
        offset: usize,
    ) -> Result<TensorBase<S>, FromDataError> {
        let data = data.into_storage();
        let layout = StrideLayout::try_from_shape_and_strides(
            shape,
            strides,
            offset,
            OverlapPolicy::DisallowOverlap,
        )?;
        if layout.min_data_len() > data.len() {
            return Err(FromDataError::StorageTooShort);
        }
        Ok(TensorBase { data, layout })
    }

    /// Return the layout which maps indices to storage offsets.
    pub fn layout(&self) -> &StrideLayout {
        &self.layout
    }

    /// Return the size of each dimension.
    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    /// Return the stride of each dimension.
    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    /// Return the number of dimensions.
    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    /// Return the number of elements.
    pub fn len(&self) -> usize {
        self.layout.len()
    }

    /// Return true if the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    /// Return the size of dimension `axis`.
    pub fn size(&self, axis: usize) -> usize {
        self.layout.size(axis)
    }

    /// Return the stride of dimension `axis`.
    pub fn stride(&self, axis: usize) -> isize {
        self.layout.stride(axis)
    }

    /// Return a reference to the element at `index`, or None if the index
    /// is out of bounds.
    pub fn get(&self, index: &[usize]) -> Option<&S::Elem> {
        let offset = self.layout.try_offset(index)?;
        // Safety: valid offsets are checked against the storage length at
        // construction, and the array is immutably borrowed here.
        unsafe { self.data.get(offset) }
    }

    /// Return the single element of the array, if it has exactly one.
    pub fn item(&self) -> Option<&S::Elem> {
        if self.len() == 1 {
            // Safety: as for `get`.
            unsafe { self.data.get(self.layout.offset()) }
        } else {
            None
        }
    }

    /// Iterate over the elements in row-major order.
    pub fn iter(&self) -> Iter<'_, S::Elem> {
        Iter::new(&self.layout, self.data.view())
    }

    /// Iterate over the elements in the given order.
    pub fn iter_in(&self, order: Order) -> Iter<'_, S::Elem> {
        Iter::new_in(order, &self.layout, self.data.view())
    }

    /// Return the underlying data as a slice, if the elements are laid out
    /// contiguously in row-major order.
    pub fn data(&self) -> Option<&[S::Elem]> {
        let range = self.layout.contiguous_range(Order::C)?;
        // Safety: the array is immutably borrowed.
        Some(unsafe { self.data.view().slice(range).as_slice() })
    }

    /// Return the whole backing storage as a slice, with this array's
    /// layout addressing into it.
    fn storage_slice(&self) -> &[S::Elem] {
        // Safety: the array is immutably borrowed.
        unsafe { self.data.view().as_slice() }
    }
}

impl<T: Element, S: Storage<Elem = T>> TensorBase<S> {
    /// Return the scalar value of a rank-0 array.
    pub fn to_scalar(&self) -> Result<T, DimensionError> {
        match self.item() {
            Some(&value) if self.rank() == 0 => Ok(value),
            _ => Err(DimensionError {
                actual: self.rank(),
                expected: 0,
            }),
        }
    }

    /// Copy the elements into a vector in row-major order.
    pub fn to_vec(&self) -> Vec<T> {
        self.to_vec_in(Order::C)
    }

    /// Copy the elements into a vector in the given order.
    pub fn to_vec_in(&self, order: Order) -> Vec<T> {
        copy_into_vec(&self.layout, self.data.view(), order)
    }

    /// Copy this array into a new owned array with contiguous row-major
    /// storage.
    pub fn to_tensor(&self) -> Tensor<T> {
        Tensor::from_data(self.shape(), self.to_vec())
    }

    /// Return this array with contiguous row-major storage, borrowing when
    /// it already is contiguous and copying otherwise.
    pub fn to_contiguous(&self) -> CowTensor<'_, T> {
        match self.layout.contiguous_range(Order::C) {
            Some(range) => TensorBase {
                data: Cow::Borrowed(&self.storage_slice()[range]),
                layout: StrideLayout::from_shape(self.shape()),
            },
            None => TensorBase {
                data: Cow::Owned(self.to_vec()),
                layout: StrideLayout::from_shape(self.shape()),
            },
        }
    }

    /// Flatten this array to a vector in the given traversal order,
    /// borrowing if that traversal already walks storage sequentially.
    pub fn ravel(&self, order: Order) -> CowTensor<'_, T> {
        let layout = StrideLayout::from_shape(&[self.len()]);
        match self.layout.contiguous_range(order) {
            Some(range) => TensorBase {
                data: Cow::Borrowed(&self.storage_slice()[range]),
                layout,
            },
            None => TensorBase {
                data: Cow::Owned(self.to_vec_in(order)),
                layout,
            },
        }
    }

    /// Shorthand for `self.ravel(Order::C)`.
    pub fn flattened(&self) -> CowTensor<'_, T> {
        self.ravel(Order::C)
    }

    /// Return this array with a new shape of the same element count,
    /// borrowing if the elements are contiguous in row-major order and
    /// copying otherwise.
    ///
    /// Panics if `shape` has a different element count.
    pub fn reshaped(&self, shape: &[usize]) -> CowTensor<'_, T> {
        let layout = StrideLayout::from_shape(shape);
        assert!(
            layout.len() == self.len(),
            "cannot reshape array of length {} into shape {:?}",
            self.len(),
            shape
        );
        match self.layout.contiguous_range(Order::C) {
            Some(range) => TensorBase {
                data: Cow::Borrowed(&self.storage_slice()[range]),
                layout,
            },
            None => TensorBase {
                data: Cow::Owned(self.to_vec()),
                layout,
            },
        }
    }

    /// Convert the elements to another kind, with `as`-cast semantics.
    pub fn cast<U: Element + CastFrom<T>>(&self) -> Tensor<U> {
        let data = map_into_vec(&self.layout, self.data.view(), Order::C, U::cast_from);
        Tensor::from_data(self.shape(), data)
    }

    /// Apply a unary operator from the catalog to every element, producing
    /// a new owned array.
    pub fn unary<O: UnaryOp<T>>(&self) -> Tensor<T> {
        let data = map_into_vec(&self.layout, self.data.view(), Order::C, O::apply);
        Tensor::from_data(self.shape(), data)
    }

    /// Elementwise absolute value.
    pub fn abs(&self) -> Tensor<T> {
        self.unary::<Abs>()
    }

    /// Elementwise negation.
    pub fn neg(&self) -> Tensor<T> {
        self.unary::<Neg>()
    }

    /// Elementwise floor.
    pub fn floor(&self) -> Tensor<T> {
        self.unary::<Floor>()
    }

    /// Elementwise ceil.
    pub fn ceil(&self) -> Tensor<T> {
        self.unary::<Ceil>()
    }

    /// Elementwise rounding, half-cases away from zero.
    pub fn round(&self) -> Tensor<T> {
        self.unary::<Round>()
    }

    /// Elementwise clamp to `[min, max]`. NaN values pass through.
    pub fn clamp(&self, min: Option<T>, max: Option<T>) -> Tensor<T> {
        let data = map_into_vec(&self.layout, self.data.view(), Order::C, |x| {
            clamp_elem(x, min, max)
        });
        Tensor::from_data(self.shape(), data)
    }

    /// Apply a binary operator from the catalog to the aligned elements of
    /// `self` and `rhs`, broadcasting both to a common shape.
    ///
    /// Panics if the shapes do not broadcast.
    pub fn binary<O: BinaryOp<T>, S2: Storage<Elem = T>>(&self, rhs: &TensorBase<S2>) -> Tensor<T> {
        self.try_binary::<O, S2>(rhs).unwrap_or_else(|err| {
            panic!("{}", err);
        })
    }

    /// Fallible version of [`binary`](TensorBase::binary).
    pub fn try_binary<O: BinaryOp<T>, S2: Storage<Elem = T>>(
        &self,
        rhs: &TensorBase<S2>,
    ) -> Result<Tensor<T>, BroadcastError> {
        let shape = broadcast_shapes(self.shape(), rhs.shape())?;
        // The common shape is broadcastable from both sides by construction.
        let lhs_layout = self.layout.broadcast_to(&shape)?;
        let rhs_layout = rhs.layout.broadcast_to(&shape)?;
        let data = zip_map_into_vec(
            &lhs_layout,
            self.data.view(),
            &rhs_layout,
            rhs.data.view(),
            O::apply,
        );
        Ok(Tensor::from_data(&shape, data))
    }

    /// Elementwise addition with broadcasting.
    pub fn add<S2: Storage<Elem = T>>(&self, rhs: &TensorBase<S2>) -> Tensor<T> {
        self.binary::<AddOp, S2>(rhs)
    }

    /// Elementwise subtraction with broadcasting.
    pub fn sub<S2: Storage<Elem = T>>(&self, rhs: &TensorBase<S2>) -> Tensor<T> {
        self.binary::<SubOp, S2>(rhs)
    }

    /// Elementwise multiplication with broadcasting.
    pub fn mul<S2: Storage<Elem = T>>(&self, rhs: &TensorBase<S2>) -> Tensor<T> {
        self.binary::<MulOp, S2>(rhs)
    }

    /// Elementwise division with broadcasting.
    pub fn div<S2: Storage<Elem = T>>(&self, rhs: &TensorBase<S2>) -> Tensor<T> {
        self.binary::<DivOp, S2>(rhs)
    }

    /// Apply a binary operator with a scalar right-hand side.
    pub fn binary_scalar<O: BinaryOp<T>>(&self, rhs: T) -> Tensor<T> {
        let data = map_into_vec(&self.layout, self.data.view(), Order::C, |x| {
            O::apply(x, rhs)
        });
        Tensor::from_data(self.shape(), data)
    }

    /// Add a scalar to every element.
    pub fn add_scalar(&self, rhs: T) -> Tensor<T> {
        self.binary_scalar::<AddOp>(rhs)
    }

    /// Subtract a scalar from every element.
    pub fn sub_scalar(&self, rhs: T) -> Tensor<T> {
        self.binary_scalar::<SubOp>(rhs)
    }

    /// Multiply every element by a scalar.
    pub fn mul_scalar(&self, rhs: T) -> Tensor<T> {
        self.binary_scalar::<MulOp>(rhs)
    }

    /// Divide every element by a scalar.
    pub fn div_scalar(&self, rhs: T) -> Tensor<T> {
        self.binary_scalar::<DivOp>(rhs)
    }

    /// Reduce all elements with an associative operator from the catalog.
    ///
    /// Elements are visited in the storage's fastest order, so this must
    /// only be used with operators that do not depend on traversal order.
    pub fn reduce<O: AssocOp<T>>(&self) -> T {
        let plan = LoopDescriptor::fast(&self.layout);
        if plan.is_unit_run() && plan.size() >= PARALLEL_THRESHOLD {
            let start = plan.offsets()[0];
            let slice = &self.storage_slice()[start..start + plan.size()];
            return slice
                .par_chunks(PARALLEL_THRESHOLD)
                .map(|chunk| chunk.iter().fold(O::identity(), |acc, &x| O::combine(acc, x)))
                // Partial results are ordinary values of T, so the fold
                // itself merges them.
                .reduce(O::identity, O::combine);
        }
        let data = self.data.view();
        plan.iter_offsets().fold(O::identity(), |acc, offset| {
            // Safety: loop descriptor offsets are in bounds.
            O::combine(acc, unsafe { *data.get_unchecked(offset) })
        })
    }

    /// Sum of all elements, or 0 for an empty array.
    pub fn sum(&self) -> T {
        self.reduce::<Sum>()
    }

    /// Product of all elements, or 1 for an empty array.
    pub fn prod(&self) -> T {
        self.reduce::<Prod>()
    }

    /// Largest element. NaN if any element is NaN; the kind's minimum for
    /// an empty array.
    pub fn max(&self) -> T {
        self.reduce::<Max>()
    }

    /// Smallest element. NaN if any element is NaN; the kind's maximum for
    /// an empty array.
    pub fn min(&self) -> T {
        self.reduce::<Min>()
    }

    /// Reduce along `axis`, removing it from the result (or keeping it with
    /// size 1 if `keep_dim` is set).
    pub fn reduce_axis<O: AssocOp<T>>(&self, axis: usize, keep_dim: bool) -> Tensor<T> {
        let values: Vec<T> = self
            .lanes(axis)
            .map(|lane| lane.fold(O::identity(), O::combine))
            .collect();
        Tensor::from_data(&reduced_shape(self.shape(), axis, keep_dim), values)
    }

    /// Sum along `axis`.
    pub fn sum_axis(&self, axis: usize) -> Tensor<T> {
        self.reduce_axis::<Sum>(axis, false)
    }

    /// Product along `axis`.
    pub fn prod_axis(&self, axis: usize) -> Tensor<T> {
        self.reduce_axis::<Prod>(axis, false)
    }

    /// Maximum along `axis`.
    pub fn max_axis(&self, axis: usize) -> Tensor<T> {
        self.reduce_axis::<Max>(axis, false)
    }

    /// Minimum along `axis`.
    pub fn min_axis(&self, axis: usize) -> Tensor<T> {
        self.reduce_axis::<Min>(axis, false)
    }

    /// Select the given indices along `axis`.
    ///
    /// This is zero-copy when the selection can be expressed as a strided
    /// view: a single index, or indices forming an arithmetic progression
    /// (including a constant repetition, which becomes a stride-0 axis).
    /// Other selections gather into a new owned array.
    ///
    /// Panics if any index is out of bounds.
    pub fn take(&self, axis: usize, indices: &[usize]) -> CowTensor<'_, T> {
        let size = self.size(axis);
        for &index in indices {
            assert!(
                index < size,
                "take index {} out of bounds for axis {} with size {}",
                index,
                axis,
                size
            );
        }

        if let Some(layout) = self.take_view_layout(axis, indices) {
            return TensorBase {
                data: Cow::Borrowed(self.storage_slice()),
                layout,
            };
        }

        // Gather copy: map each output index back to a source index.
        let mut out_shape = self.shape().to_vec();
        out_shape[axis] = indices.len();
        let data = DynIndices::from_shape(&out_shape)
            .map(|mut index| {
                index[axis] = indices[index[axis]];
                self[&index[..]]
            })
            .collect();
        TensorBase {
            data: Cow::Owned(data),
            layout: StrideLayout::from_shape(&out_shape),
        }
    }

    fn take_view_layout(&self, axis: usize, indices: &[usize]) -> Option<StrideLayout> {
        match indices {
            [] => None,
            [index] => Some(self.layout.resampled_axis(axis, *index, 1, 1)),
            [first, rest @ ..] => {
                let delta = rest[0] as isize - *first as isize;
                let arithmetic = indices
                    .windows(2)
                    .all(|pair| pair[1] as isize - pair[0] as isize == delta);
                arithmetic
                    .then(|| self.layout.resampled_axis(axis, *first, indices.len(), delta))
            }
        }
    }

    /// Repeat the whole array `count` times along `axis`.
    ///
    /// With `stack` set the copies are stacked along a new axis inserted at
    /// `axis`, otherwise they are concatenated along the existing `axis`.
    pub fn repeat(&self, axis: usize, count: usize, stack: bool) -> Tensor<T> {
        let copies: Vec<TensorView<T>> = (0..count).map(|_| self.view()).collect();
        if stack {
            self::stack(axis, &copies)
        } else {
            self::concat(axis, &copies)
        }
    }

    /// Iterate over the 1-D lanes along `axis`, in row-major order of the
    /// remaining dimensions.
    fn lanes(&self, axis: usize) -> impl Iterator<Item = Lane<'_, T>> {
        let outer = self.layout.removed_axis(axis);
        let len = self.size(axis);
        let step = self.stride(axis);
        let data = self.data.view();
        LoopDescriptor::new(&outer, Order::C)
            .into_offsets()
            .map(move |offset| Lane {
                data,
                offset: offset as isize,
                step,
                remaining: len,
            })
    }

    /// Return the indices that sort each lane along `axis`.
    ///
    /// The sort is stable and uses the kind's total order, so NaN values
    /// sort after all others.
    pub fn argsort(&self, axis: usize, descending: bool) -> Tensor<i32> {
        let mut out = vec![0i32; self.len()];
        let out_layout = StrideLayout::from_shape(self.shape());
        let out_step = out_layout.stride(axis);
        let out_lanes = LoopDescriptor::new(&out_layout.removed_axis(axis), Order::C).into_offsets();

        for (lane, out_base) in self.lanes(axis).zip(out_lanes) {
            let values: Vec<T> = lane.collect();
            let mut order: Vec<usize> = (0..values.len()).collect();
            order.sort_by(|&a, &b| {
                let ord = values[a].total_cmp(&values[b]);
                if descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
            for (rank, index) in order.into_iter().enumerate() {
                out[(out_base as isize + rank as isize * out_step) as usize] = index as i32;
            }
        }
        Tensor::from_data(self.shape(), out)
    }
}

impl<T: FloatElement, S: Storage<Elem = T>> TensorBase<S> {
    /// Elementwise square root.
    pub fn sqrt(&self) -> Tensor<T> {
        self.unary::<Sqrt>()
    }

    /// Elementwise exponential.
    pub fn exp(&self) -> Tensor<T> {
        self.unary::<Exp>()
    }

    /// Elementwise natural logarithm.
    pub fn ln(&self) -> Tensor<T> {
        self.unary::<Ln>()
    }

    /// Elementwise sine.
    pub fn sin(&self) -> Tensor<T> {
        self.unary::<Sin>()
    }

    /// Elementwise cosine.
    pub fn cos(&self) -> Tensor<T> {
        self.unary::<Cos>()
    }

    /// Elementwise tangent.
    pub fn tan(&self) -> Tensor<T> {
        self.unary::<Tan>()
    }

    /// Sum of all non-NaN elements.
    pub fn nan_sum(&self) -> T {
        self.reduce::<NanSum>()
    }

    /// Product of all non-NaN elements.
    pub fn nan_prod(&self) -> T {
        self.reduce::<NanProd>()
    }

    /// Largest non-NaN element.
    pub fn nan_max(&self) -> T {
        self.reduce::<NanMax>()
    }

    /// Smallest non-NaN element.
    pub fn nan_min(&self) -> T {
        self.reduce::<NanMin>()
    }

    /// Arithmetic mean of all elements, or NaN for an empty array.
    pub fn mean(&self) -> T {
        if self.is_empty() {
            return T::NAN;
        }
        self.sum() / T::from_usize(self.len())
    }

    /// Arithmetic mean of the non-NaN elements, or NaN if there are none.
    pub fn nan_mean(&self) -> T {
        let (sum, count) = self.iter().fold((T::ZERO, 0usize), |(sum, count), &x| {
            if x.is_nan() {
                (sum, count)
            } else {
                (sum + x, count + 1)
            }
        });
        if count == 0 {
            T::NAN
        } else {
            sum / T::from_usize(count)
        }
    }

    /// Variance of all elements with `ddof` delta degrees of freedom (0 for
    /// the population variance, 1 for the sample variance).
    pub fn var(&self, ddof: usize) -> T {
        self.var_with_mean(ddof, self.mean())
    }

    /// Variance around an externally supplied mean.
    pub fn var_with_mean(&self, ddof: usize, mean: T) -> T {
        if self.len() <= ddof {
            return T::NAN;
        }
        // Corrected two-pass: subtract the residual mean error to cancel
        // accumulated rounding.
        let (sum_sq, sum) = self.iter().fold((T::ZERO, T::ZERO), |(sum_sq, sum), &x| {
            let dev = x - mean;
            (sum_sq + dev * dev, sum + dev)
        });
        let n = T::from_usize(self.len());
        (sum_sq - sum * sum / n) / T::from_usize(self.len() - ddof)
    }

    /// Standard deviation with `ddof` delta degrees of freedom.
    pub fn std(&self, ddof: usize) -> T {
        self.var(ddof).sqrt()
    }

    /// Mean along `axis`.
    pub fn mean_axis(&self, axis: usize) -> Tensor<T> {
        let len = self.size(axis);
        let values: Vec<T> = self
            .lanes(axis)
            .map(|lane| {
                if len == 0 {
                    T::NAN
                } else {
                    lane.fold(T::ZERO, |acc, x| acc + x) / T::from_usize(len)
                }
            })
            .collect();
        Tensor::from_data(&reduced_shape(self.shape(), axis, false), values)
    }

    /// Variance along `axis` with `ddof` delta degrees of freedom.
    pub fn var_axis(&self, axis: usize, ddof: usize) -> Tensor<T> {
        let values: Vec<T> = self
            .lanes(axis)
            .map(|lane| {
                let lane: Vec<T> = lane.collect();
                lane_var(&lane, ddof)
            })
            .collect();
        Tensor::from_data(&reduced_shape(self.shape(), axis, false), values)
    }

    /// Standard deviation along `axis`.
    pub fn std_axis(&self, axis: usize, ddof: usize) -> Tensor<T> {
        let mut var = self.var_axis(axis, ddof);
        var.apply(|x| x.sqrt());
        var
    }
}

/// Variance of a 1-D slice of values, using the corrected two-pass formula.
fn lane_var<T: FloatElement>(values: &[T], ddof: usize) -> T {
    if values.len() <= ddof {
        return T::NAN;
    }
    let n = T::from_usize(values.len());
    let mean = values.iter().fold(T::ZERO, |acc, &x| acc + x) / n;
    let (sum_sq, sum) = values.iter().fold((T::ZERO, T::ZERO), |(sum_sq, sum), &x| {
        let dev = x - mean;
        (sum_sq + dev * dev, sum + dev)
    });
    (sum_sq - sum * sum / n) / T::from_usize(values.len() - ddof)
}

fn clamp_elem<T: Element>(x: T, min: Option<T>, max: Option<T>) -> T {
    // NaN compares false with both bounds and passes through.
    if let Some(min) = min {
        if x < min {
            return min;
        }
    }
    if let Some(max) = max {
        if x > max {
            return max;
        }
    }
    x
}

/// Shape of a reduction result along `axis`.
fn reduced_shape(shape: &[usize], axis: usize, keep_dim: bool) -> Vec<usize> {
    let mut out: Vec<usize> = shape.to_vec();
    if keep_dim {
        out[axis] = 1;
    } else {
        out.remove(axis);
    }
    out
}

/// Iterator over the values of one 1-D lane of an array.
struct Lane<'a, T> {
    data: ViewData<'a, T>,
    offset: isize,
    step: isize,
    remaining: usize,
}

impl<T: Copy> Iterator for Lane<'_, T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        if self.remaining == 0 {
            return None;
        }
        // Safety: lane offsets stay within the layout's offset range, which
        // is checked against the storage at construction.
        let value = unsafe { *self.data.get_unchecked(self.offset as usize) };
        self.offset += self.step;
        self.remaining -= 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Copy> ExactSizeIterator for Lane<'_, T> {}

impl<'a, T> TensorView<'a, T> {
    /// Create a view with explicit strides and base offset over a slice.
    ///
    /// Unlike [TensorBase::try_from_data_with_strides] the layout may map
    /// several indices to one element, which is safe because the view is
    /// immutable.
    pub fn from_slice_with_strides(
        shape: &[usize],
        data: &'a [T],
        strides: &[isize],
        offset: usize,
    ) -> Result<TensorView<'a, T>, FromDataError> {
        let layout = StrideLayout::try_from_shape_and_strides(
            shape,
            strides,
            offset,
            OverlapPolicy::AllowOverlap,
        )?;
        if layout.min_data_len() > data.len() {
            return Err(FromDataError::StorageTooShort);
        }
        Ok(TensorBase {
            data: data.into_storage(),
            layout,
        })
    }

    fn with_layout(&self, layout: StrideLayout) -> TensorView<'a, T> {
        TensorBase {
            data: self.data,
            layout,
        }
    }

    /// See [AsView::permuted]. Preserves the view's lifetime.
    pub fn permuted(&self, dims: &[usize]) -> TensorView<'a, T> {
        self.with_layout(self.layout.permuted(dims))
    }

    /// See [AsView::transposed]. Preserves the view's lifetime.
    pub fn transposed(&self) -> TensorView<'a, T> {
        self.with_layout(self.layout.reverted())
    }

    /// See [AsView::moved_axis]. Preserves the view's lifetime.
    pub fn moved_axis(&self, from: usize, to: usize) -> TensorView<'a, T> {
        self.with_layout(self.layout.moved_axis(from, to))
    }

    /// See [AsView::swapped_axes]. Preserves the view's lifetime.
    pub fn swapped_axes(&self, a: usize, b: usize) -> TensorView<'a, T> {
        self.with_layout(self.layout.swapped_axes(a, b))
    }

    /// See [AsView::squeezed]. Preserves the view's lifetime.
    pub fn squeezed(&self, axes: &[usize]) -> TensorView<'a, T> {
        self.with_layout(self.layout.squeezed(axes))
    }

    /// See [AsView::squeezed_all]. Preserves the view's lifetime.
    pub fn squeezed_all(&self) -> TensorView<'a, T> {
        self.with_layout(self.layout.squeezed_all())
    }

    /// See [AsView::stretched]. Preserves the view's lifetime.
    pub fn stretched(&self, axes: &[usize]) -> TensorView<'a, T> {
        self.with_layout(self.layout.stretched(axes))
    }

    /// See [AsView::expanded]. Preserves the view's lifetime.
    pub fn expanded(&self, axis: usize, size: usize) -> TensorView<'a, T> {
        self.with_layout(self.layout.expanded(axis, size))
    }

    /// See [AsView::narrowed]. Preserves the view's lifetime.
    pub fn narrowed(&self, axis: usize, range: Range<usize>) -> TensorView<'a, T> {
        self.with_layout(self.layout.narrowed(axis, true, range.start, range.end))
    }

    /// See [AsView::narrowed_all]. Preserves the view's lifetime.
    pub fn narrowed_all(&self, ranges: &[Range<usize>]) -> TensorView<'a, T> {
        let starts: Vec<usize> = ranges.iter().map(|r| r.start).collect();
        let ends: Vec<usize> = ranges.iter().map(|r| r.end).collect();
        self.with_layout(self.layout.narrowed_all(true, &starts, &ends))
    }

    /// See [AsView::index_axis]. Preserves the view's lifetime.
    pub fn index_axis(&self, axis: usize, index: usize) -> TensorView<'a, T> {
        self.with_layout(self.layout.narrowed(axis, false, index, index + 1))
    }

    /// See [AsView::broadcast]. Preserves the view's lifetime.
    pub fn broadcast(&self, shape: &[usize]) -> TensorView<'a, T> {
        self.try_broadcast(shape).unwrap_or_else(|err| {
            panic!("{}", err);
        })
    }

    /// See [AsView::try_broadcast]. Preserves the view's lifetime.
    pub fn try_broadcast(&self, shape: &[usize]) -> Result<TensorView<'a, T>, BroadcastError> {
        Ok(self.with_layout(self.layout.broadcast_to(shape)?))
    }

    /// Split this view into consecutive chunks along `axis`, with chunk `i`
    /// covering `points[i]..points[i + 1]` (the last chunk runs to the end
    /// of the axis).
    ///
    /// Panics unless `points` starts at 0 and is strictly increasing.
    pub fn split(&self, axis: usize, points: &[usize]) -> Vec<TensorView<'a, T>> {
        assert!(
            points.first() == Some(&0) && points.windows(2).all(|pair| pair[0] < pair[1]),
            "split points {:?} must start at 0 and increase",
            points
        );
        let size = self.size(axis);
        points
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let end = points.get(i + 1).copied().unwrap_or(size);
                self.narrowed(axis, start..end)
            })
            .collect()
    }

    /// Split this view into `n` chunks of near-equal size along `axis`.
    /// All chunks have the same size except possibly the last.
    pub fn chunk(&self, axis: usize, n: usize) -> Vec<TensorView<'a, T>> {
        assert!(n > 0, "chunk count must be positive");
        let size = self.size(axis);
        let chunk_size = size.div_ceil(n).max(1);
        let points: Vec<usize> = (0..size.max(1)).step_by(chunk_size).collect();
        self.split(axis, &points)
    }

    /// Split this view into a grid of blocks, one axis at a time: element
    /// `points[d]` holds the split points for axis `d`. Blocks are returned
    /// in row-major order of their grid position.
    pub fn split_all(&self, points: &[&[usize]]) -> Vec<TensorView<'a, T>> {
        assert!(
            points.len() == self.rank(),
            "expected split points for {} axes but found {}",
            self.rank(),
            points.len()
        );
        let mut blocks = vec![self.clone()];
        for (axis, axis_points) in points.iter().enumerate() {
            blocks = blocks
                .iter()
                .flat_map(|block| block.split(axis, axis_points))
                .collect();
        }
        blocks
    }

    /// Return the sub-views along `axis`, each with that axis removed.
    pub fn unbind(&self, axis: usize) -> Vec<TensorView<'a, T>> {
        (0..self.size(axis))
            .map(|index| self.index_axis(axis, index))
            .collect()
    }
}

impl<T: Element, S: StorageMut<Elem = T>> TensorBase<S> {
    /// Return a mutable view of this array.
    pub fn view_mut(&mut self) -> TensorViewMut<'_, T> {
        TensorBase {
            layout: self.layout.clone(),
            data: self.data.view_mut(),
        }
    }

    /// Return a mutable reference to the element at `index`, or None if the
    /// index is out of bounds.
    pub fn get_mut(&mut self, index: &[usize]) -> Option<&mut T> {
        let offset = self.layout.try_offset(index)?;
        // Safety: mutable arrays have non-overlapping layouts, and `self`
        // is exclusively borrowed.
        unsafe { self.data.get_mut(offset) }
    }

    /// Iterate mutably over the elements in row-major order.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(&self.layout, self.data.view_mut())
    }

    /// Return the underlying data as a mutable slice, if the elements are
    /// laid out contiguously in row-major order.
    pub fn data_mut(&mut self) -> Option<&mut [T]> {
        let range = self.layout.contiguous_range(Order::C)?;
        // Safety: `self` is exclusively borrowed and the layout does not
        // overlap.
        Some(unsafe { self.data.view_mut().into_slice_range(range).to_slice_mut() })
    }

    /// Replace every element with `f` applied to it.
    ///
    /// Elements are visited in the storage's fastest order.
    pub fn apply<F: Fn(T) -> T + Sync>(&mut self, f: F) {
        let plan = LoopDescriptor::fast(&self.layout);
        if plan.is_unit_run() {
            let start = plan.offsets()[0];
            let range = start..start + plan.size();
            // Safety: as for `data_mut`.
            let slice = unsafe { self.data.view_mut().into_slice_range(range).to_slice_mut() };
            if slice.len() >= PARALLEL_THRESHOLD {
                slice.par_iter_mut().for_each(|x| *x = f(*x));
            } else {
                for x in slice {
                    *x = f(*x);
                }
            }
            return;
        }
        let mut data = self.data.view_mut();
        for offset in plan.iter_offsets() {
            // Safety: offsets are in bounds and, because the layout has no
            // overlap, each is visited once.
            unsafe {
                let x = data.get_unchecked_mut(offset);
                *x = f(*x);
            }
        }
    }

    /// Set every element to `value`.
    pub fn fill(&mut self, value: T) {
        self.apply(|_| value);
    }

    /// In-place version of [`clamp`](TensorBase::clamp).
    pub fn clamp_mut(&mut self, min: Option<T>, max: Option<T>) {
        self.apply(|x| clamp_elem(x, min, max));
    }

    /// Apply a unary operator from the catalog in place.
    pub fn unary_mut<O: UnaryOp<T>>(&mut self) {
        self.apply(O::apply);
    }

    /// Apply a binary operator in place, with `rhs` broadcast to this
    /// array's shape.
    ///
    /// Panics if `rhs` does not broadcast to this array's shape.
    pub fn binary_mut<O: BinaryOp<T>, S2: Storage<Elem = T>>(&mut self, rhs: &TensorBase<S2>) {
        let rhs_layout = rhs.layout.broadcast_to(self.shape()).unwrap_or_else(|err| {
            panic!("{}", err);
        });
        let dst_offsets = LoopDescriptor::new(&self.layout, Order::C).into_offsets();
        let src_offsets = LoopDescriptor::new(&rhs_layout, Order::C).into_offsets();
        let src = rhs.data.view();
        let mut dst = self.data.view_mut();
        for (i, j) in dst_offsets.zip(src_offsets) {
            // Safety: offsets are in bounds for their respective storages;
            // destination offsets are visited once.
            unsafe {
                let x = dst.get_unchecked_mut(i);
                *x = O::apply(*x, *src.get_unchecked(j));
            }
        }
    }

    /// In-place elementwise addition.
    pub fn add_mut<S2: Storage<Elem = T>>(&mut self, rhs: &TensorBase<S2>) {
        self.binary_mut::<AddOp, S2>(rhs);
    }

    /// In-place elementwise subtraction.
    pub fn sub_mut<S2: Storage<Elem = T>>(&mut self, rhs: &TensorBase<S2>) {
        self.binary_mut::<SubOp, S2>(rhs);
    }

    /// In-place elementwise multiplication.
    pub fn mul_mut<S2: Storage<Elem = T>>(&mut self, rhs: &TensorBase<S2>) {
        self.binary_mut::<MulOp, S2>(rhs);
    }

    /// In-place elementwise division.
    pub fn div_mut<S2: Storage<Elem = T>>(&mut self, rhs: &TensorBase<S2>) {
        self.binary_mut::<DivOp, S2>(rhs);
    }

    /// Apply a binary operator in place with a scalar right-hand side.
    pub fn binary_scalar_mut<O: BinaryOp<T>>(&mut self, rhs: T) {
        self.apply(|x| O::apply(x, rhs));
    }

    /// Return a mutable view restricted to `range` along `axis`.
    pub fn narrowed_mut(&mut self, axis: usize, range: Range<usize>) -> TensorViewMut<'_, T> {
        TensorBase {
            layout: self.layout.narrowed(axis, true, range.start, range.end),
            data: self.data.view_mut(),
        }
    }

    /// Copy the elements of `src` into this array.
    ///
    /// Panics if the shapes differ.
    pub fn copy_from<S2: Storage<Elem = T>>(&mut self, src: &TensorBase<S2>) {
        assert!(
            self.shape() == src.shape(),
            "copy source shape {:?} does not match {:?}",
            src.shape(),
            self.shape()
        );
        for (dst, src) in self.iter_mut().zip(src.iter()) {
            *dst = *src;
        }
    }

    /// Sort each lane along `axis` in place.
    ///
    /// Uses the kind's total order: NaN values sort after all others.
    pub fn sort(&mut self, axis: usize, descending: bool) {
        let lane_len = self.size(axis);
        let step = self.stride(axis);
        let outer = self.layout.removed_axis(axis);
        let bases: Vec<usize> = LoopDescriptor::new(&outer, Order::C).into_offsets().collect();
        let mut buf: Vec<T> = Vec::with_capacity(lane_len);
        let mut data = self.data.view_mut();
        for base in bases {
            buf.clear();
            for i in 0..lane_len {
                let offset = (base as isize + i as isize * step) as usize;
                // Safety: lane offsets are in bounds, see `Lane`.
                buf.push(unsafe { *data.get_unchecked_mut(offset) });
            }
            buf.sort_by(|a, b| {
                let ord = a.total_cmp(b);
                if descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
            for (i, &value) in buf.iter().enumerate() {
                let offset = (base as isize + i as isize * step) as usize;
                // Safety: as above; the layout has no overlap.
                unsafe {
                    *data.get_unchecked_mut(offset) = value;
                }
            }
        }
    }
}

impl<'a, T: Element> TensorViewMut<'a, T> {
    /// Re-shape this mutable view without copying.
    ///
    /// Fails if the elements are not contiguous in row-major order, or if
    /// `shape` has a different element count.
    pub fn reshaped_mut(self, shape: &[usize]) -> Result<TensorViewMut<'a, T>, ReshapeError> {
        let layout = StrideLayout::from_shape(shape);
        if layout.len() != self.layout.len() {
            return Err(ReshapeError::LengthMismatch);
        }
        if self.layout.contiguous_range(Order::C).is_none() {
            return Err(ReshapeError::NotContiguous);
        }
        Ok(TensorBase {
            layout: self.layout.reshaped_unchecked(Order::C, shape),
            data: self.data,
        })
    }
}

impl<T: Element> Tensor<T> {
    /// Create an array of zeros.
    pub fn zeros(shape: &[usize]) -> Tensor<T> {
        Self::full(shape, T::ZERO)
    }

    /// Create an array filled with `value`.
    pub fn full(shape: &[usize], value: T) -> Tensor<T> {
        let len = shape.iter().product();
        Tensor::from_data(shape, vec![value; len])
    }

    /// Create an array by calling `f` with each index in row-major order.
    pub fn from_fn<F: Fn(&[usize]) -> T>(shape: &[usize], f: F) -> Tensor<T> {
        let data: Vec<T> = DynIndices::from_shape(shape).map(|index| f(&index)).collect();
        Tensor::from_data(shape, data)
    }

    /// Create a 1-D array from a vector.
    pub fn from_vec(data: Vec<T>) -> Tensor<T> {
        let layout = StrideLayout::from_shape(&[data.len()]);
        Tensor { data, layout }
    }

    /// Create a 0-D array from a single value.
    pub fn from_scalar(value: T) -> Tensor<T> {
        Tensor::from_data(&[], vec![value])
    }

    /// Create a 1-D array of values from `start` (inclusive) to `end`
    /// (exclusive), spaced by `step` (default 1).
    ///
    /// Panics if `step` is zero.
    pub fn arange(start: T, end: T, step: Option<T>) -> Tensor<T> {
        let step = step.unwrap_or(T::ONE);
        assert!(step != T::ZERO, "arange step must be non-zero");
        let mut data = Vec::new();
        let mut current = start;
        if step > T::ZERO {
            while current < end {
                data.push(current);
                current = current + step;
            }
        } else {
            while current > end {
                data.push(current);
                current = current + step;
            }
        }
        Tensor::from_vec(data)
    }

    /// Change the shape of this array in place, re-arranging storage into
    /// row-major order first if it is not already contiguous.
    ///
    /// Panics if `shape` has a different element count.
    pub fn reshape(&mut self, shape: &[usize]) {
        let layout = StrideLayout::from_shape(shape);
        assert!(
            layout.len() == self.len(),
            "cannot reshape array of length {} into shape {:?}",
            self.len(),
            shape
        );
        if self.layout.contiguous_range(Order::C) != Some(0..self.len()) {
            self.data = self.to_vec();
        }
        self.layout = layout;
    }

    /// Consume the array and return its elements in row-major order.
    pub fn into_data(self) -> Vec<T> {
        if self.layout.contiguous_range(Order::C) == Some(0..self.data.len()) {
            self.data
        } else {
            self.to_vec()
        }
    }
}

impl<'a, T: Element> CowTensor<'a, T> {
    /// Return true if this array borrows its elements.
    pub fn is_borrowed(&self) -> bool {
        matches!(self.data, Cow::Borrowed(_))
    }

    /// Convert into an owned array, copying only if the elements are
    /// borrowed or not in row-major order.
    pub fn into_tensor(self) -> Tensor<T> {
        let TensorBase { data, layout } = self;
        match data {
            Cow::Owned(data) if layout.contiguous_range(Order::C) == Some(0..data.len()) => {
                Tensor { data, layout }
            }
            data => TensorBase { data, layout }.to_tensor(),
        }
    }
}

/// Concatenate `inputs` along `axis`. Inputs must have equal shapes on all
/// other axes.
pub fn concat<T: Element>(axis: usize, inputs: &[TensorView<T>]) -> Tensor<T> {
    assert!(!inputs.is_empty(), "concat requires at least one input");
    let mut shape = inputs[0].shape().to_vec();
    for input in &inputs[1..] {
        let compatible = input.rank() == shape.len()
            && input
                .shape()
                .iter()
                .enumerate()
                .all(|(dim, &size)| dim == axis || size == shape[dim]);
        assert!(
            compatible,
            "cannot concatenate shapes {:?} and {:?} along axis {}",
            &shape[..],
            input.shape(),
            axis
        );
        shape[axis] += input.size(axis);
    }

    let mut output = Tensor::zeros(&shape);
    let mut start = 0;
    for input in inputs {
        let end = start + input.size(axis);
        output.narrowed_mut(axis, start..end).copy_from(input);
        start = end;
    }
    output
}

/// Stack `inputs` along a new axis at position `axis`. Inputs must all have
/// the same shape.
pub fn stack<T: Element>(axis: usize, inputs: &[TensorView<T>]) -> Tensor<T> {
    assert!(!inputs.is_empty(), "stack requires at least one input");
    for input in &inputs[1..] {
        assert!(
            input.shape() == inputs[0].shape(),
            "cannot stack shapes {:?} and {:?}",
            inputs[0].shape(),
            input.shape()
        );
    }
    let stretched: Vec<TensorView<T>> = inputs.iter().map(|v| v.stretched(&[axis])).collect();
    concat(axis, &stretched)
}

impl<S: Storage + Clone> Clone for TensorBase<S> {
    fn clone(&self) -> Self {
        TensorBase {
            data: self.data.clone(),
            layout: self.layout.clone(),
        }
    }
}

impl<S1: Storage, S2: Storage<Elem = S1::Elem>> PartialEq<TensorBase<S2>> for TensorBase<S1>
where
    S1::Elem: PartialEq,
{
    fn eq(&self, other: &TensorBase<S2>) -> bool {
        self.shape() == other.shape() && self.iter().eq(other.iter())
    }
}

impl<S: Storage> Index<&[usize]> for TensorBase<S> {
    type Output = S::Elem;

    /// Return the element at `index`, panicking if it is out of bounds.
    fn index(&self, index: &[usize]) -> &S::Elem {
        let offset = self.layout.offset_of(index);
        // Safety: valid offsets are in bounds for the storage.
        unsafe { self.data.get_unchecked(offset) }
    }
}

impl<S: Storage, const N: usize> Index<[usize; N]> for TensorBase<S> {
    type Output = S::Elem;

    fn index(&self, index: [usize; N]) -> &S::Elem {
        &self[index.as_slice()]
    }
}

impl<S: StorageMut> IndexMut<&[usize]> for TensorBase<S> {
    fn index_mut(&mut self, index: &[usize]) -> &mut S::Elem {
        let offset = self.layout.offset_of(index);
        // Safety: valid offsets are in bounds, and mutable arrays have
        // non-overlapping layouts.
        unsafe { self.data.get_unchecked_mut(offset) }
    }
}

impl<S: StorageMut, const N: usize> IndexMut<[usize; N]> for TensorBase<S> {
    fn index_mut(&mut self, index: [usize; N]) -> &mut S::Elem {
        &mut self[index.as_slice()]
    }
}

#[cfg(test)]
mod tests {
    use super::{concat, stack, AsView, Tensor, TensorView};
    use crate::layout::Order;
    use crate::test_util::{eq_with_nans, expect_equal};

    fn steps(shape: &[usize]) -> Tensor<f32> {
        let len = shape.iter().product();
        Tensor::from_data(shape, (0..len).map(|x| x as f32).collect::<Vec<_>>())
    }

    #[test]
    fn test_from_data() {
        let t = Tensor::from_data(&[2, 3], vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(t.shape(), &[2, 3]);
        assert_eq!(t.strides(), &[3, 1]);
        assert_eq!(t[[1, 2]], 6);
        assert_eq!(t.get(&[2, 0]), None);
    }

    #[test]
    #[should_panic(expected = "data length does not match shape [2, 3]")]
    fn test_from_data_length_mismatch() {
        Tensor::from_data(&[2, 3], vec![1, 2, 3]);
    }

    #[test]
    fn test_item_and_scalar() {
        let scalar = Tensor::from_scalar(42.0);
        assert_eq!(scalar.rank(), 0);
        assert_eq!(scalar.item(), Some(&42.0));
        assert_eq!(scalar.to_scalar(), Ok(42.0));

        let vector = Tensor::from_data(&[1], vec![42.0]);
        assert_eq!(vector.item(), Some(&42.0));
        assert!(vector.to_scalar().is_err());
    }

    #[test]
    fn test_transposed_round_trip() {
        let t = steps(&[2, 3]);
        let tt = t.transposed();
        assert_eq!(tt.shape(), &[3, 2]);
        assert_eq!(tt[[2, 1]], 5.0);
        assert_eq!(tt.transposed().to_tensor(), t);
    }

    #[test]
    fn test_permuted() {
        let t = steps(&[2, 3, 4]);
        let p = t.permuted(&[2, 0, 1]);
        assert_eq!(p.shape(), &[4, 2, 3]);
        assert_eq!(p[[3, 1, 2]], t[[1, 2, 3]]);
        assert_eq!(p.permuted(&[1, 2, 0]).to_tensor(), t);
    }

    #[test]
    fn test_squeeze_stretch_expand() {
        let t = steps(&[1, 3, 1]);
        assert_eq!(t.squeezed(&[0]).shape(), &[3, 1]);
        assert_eq!(t.squeezed_all().shape(), &[3]);

        let s = t.squeezed_all().stretched(&[0]).expanded(0, 2);
        assert_eq!(s.shape(), &[2, 3]);
        assert_eq!(s.stride(0), 0);
        assert_eq!(s.to_vec(), &[0., 1., 2., 0., 1., 2.]);
    }

    #[test]
    fn test_narrowed_and_index_axis() {
        let t = steps(&[3, 4]);
        let n = t.narrowed(1, 1..3);
        assert_eq!(n.shape(), &[3, 2]);
        assert_eq!(n.to_vec(), &[1., 2., 5., 6., 9., 10.]);

        let row = t.index_axis(0, 2);
        assert_eq!(row.shape(), &[4]);
        assert_eq!(row.to_vec(), &[8., 9., 10., 11.]);

        let block = t.narrowed_all(&[1..3, 0..2]);
        assert_eq!(block.to_vec(), &[4., 5., 8., 9.]);
    }

    #[test]
    fn test_view_mut_writes_through() {
        let mut t = steps(&[2, 3]);
        t.narrowed_mut(1, 1..3).fill(0.);
        assert_eq!(t.to_vec(), &[0., 0., 0., 3., 0., 0.]);

        let mut view = t.view_mut();
        if let Some(x) = view.get_mut(&[1, 0]) {
            *x = 7.;
        }
        assert_eq!(t[[1, 0]], 7.);
    }

    #[test]
    fn test_to_vec_strided_matches_dense() {
        let t = steps(&[2, 3]);
        let tt = t.transposed();
        assert_eq!(tt.to_vec(), &[0., 3., 1., 4., 2., 5.]);
        assert_eq!(tt.to_vec_in(Order::F), &[0., 1., 2., 3., 4., 5.]);
        assert_eq!(tt.to_tensor().to_vec(), tt.to_vec());
    }

    #[test]
    fn test_to_contiguous_and_ravel() {
        let t = steps(&[2, 3]);
        assert!(t.to_contiguous().is_borrowed());
        assert!(!t.transposed().to_contiguous().is_borrowed());

        // A transposed C-contiguous array is F-contiguous.
        assert!(t.transposed().ravel(Order::F).is_borrowed());
        assert!(!t.transposed().ravel(Order::C).is_borrowed());
        assert_eq!(t.flattened().to_vec(), &[0., 1., 2., 3., 4., 5.]);
    }

    #[test]
    fn test_reshaped() {
        let t = steps(&[2, 3]);
        let r = t.reshaped(&[3, 2]);
        assert!(r.is_borrowed());
        assert_eq!(r[[2, 1]], 5.);

        let transposed = t.transposed();
        let r = transposed.reshaped(&[6]);
        assert!(!r.is_borrowed());
        assert_eq!(r.to_vec(), &[0., 3., 1., 4., 2., 5.]);
    }

    #[test]
    fn test_reshape_in_place() {
        let mut t = steps(&[2, 3]);
        t.reshape(&[6]);
        assert_eq!(t.shape(), &[6]);

        let mut t = steps(&[2, 3]).transposed().to_tensor();
        t.reshape(&[2, 3]);
        assert_eq!(t.to_vec(), &[0., 3., 1., 4., 2., 5.]);
    }

    #[test]
    fn test_broadcast_binary_ops() {
        let a = steps(&[3, 1]);
        let b = Tensor::from_data(&[2], vec![10., 20.]);
        let sum = a.add(&b);
        assert_eq!(sum.shape(), &[3, 2]);
        assert_eq!(sum.to_vec(), &[10., 20., 11., 21., 12., 22.]);

        let diff = sum.sub(&b);
        expect_equal(&diff, &a.broadcast(&[3, 2]).to_tensor()).unwrap();

        let prod = Tensor::from_vec(vec![1., 2.]).mul(&Tensor::from_vec(vec![3., 4.]));
        assert_eq!(prod.to_vec(), &[3., 8.]);
        let quot = Tensor::from_vec(vec![8., 9.]).div(&Tensor::from_vec(vec![2., 3.]));
        assert_eq!(quot.to_vec(), &[4., 3.]);
    }

    #[test]
    fn test_try_binary_shape_mismatch() {
        let a = Tensor::<f32>::zeros(&[3, 4]);
        let b = Tensor::<f32>::zeros(&[3, 5]);
        let err = a.try_binary::<crate::ops::AddOp, _>(&b).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot broadcast shape [3, 4] with shape [3, 5]"
        );
    }

    #[test]
    fn test_scalar_ops() {
        let t = Tensor::from_vec(vec![1., 2., 3.]);
        assert_eq!(t.add_scalar(1.).to_vec(), &[2., 3., 4.]);
        assert_eq!(t.sub_scalar(1.).to_vec(), &[0., 1., 2.]);
        assert_eq!(t.mul_scalar(2.).to_vec(), &[2., 4., 6.]);
        assert_eq!(t.div_scalar(2.).to_vec(), &[0.5, 1., 1.5]);
    }

    #[test]
    fn test_unary_ops() {
        let t = Tensor::from_vec(vec![-1.5, 0.5, 2.5]);
        assert_eq!(t.abs().to_vec(), &[1.5, 0.5, 2.5]);
        assert_eq!(t.neg().to_vec(), &[1.5, -0.5, -2.5]);
        assert_eq!(t.floor().to_vec(), &[-2., 0., 2.]);
        assert_eq!(t.ceil().to_vec(), &[-1., 1., 3.]);
        assert_eq!(t.round().to_vec(), &[-2., 1., 3.]);

        let i = Tensor::from_vec(vec![-3i32, 4]);
        assert_eq!(i.abs().to_vec(), &[3, 4]);
        assert_eq!(i.neg().to_vec(), &[3, -4]);
    }

    #[test]
    fn test_clamp() {
        let t = Tensor::from_vec(vec![0., 2., 5., f32::NAN]);
        let clamped = t.clamp(Some(1.), Some(3.));
        assert!(eq_with_nans(
            clamped.view(),
            Tensor::from_vec(vec![1., 2., 3., f32::NAN]).view()
        ));

        let mut t = Tensor::from_vec(vec![0., 2., 5.]);
        t.clamp_mut(None, Some(3.));
        assert_eq!(t.to_vec(), &[0., 2., 3.]);
    }

    #[test]
    fn test_cast() {
        let t = Tensor::from_vec(vec![1.9f32, -1.9]);
        assert_eq!(t.cast::<i32>().to_vec(), &[1, -1]);

        let t = Tensor::from_vec(vec![-1.0f32, 300.0, f32::NAN]);
        assert_eq!(t.cast::<u8>().to_vec(), &[0, 255, 0]);

        let t = Tensor::from_vec(vec![1u8, 2]);
        assert_eq!(t.cast::<f64>().to_vec(), &[1.0, 2.0]);
    }

    #[test]
    fn test_reductions() {
        let t = steps(&[2, 3]);
        assert_eq!(t.sum(), 15.);
        assert_eq!(t.max(), 5.);
        assert_eq!(t.min(), 0.);
        assert_eq!(Tensor::from_vec(vec![2., 3., 4.]).prod(), 24.);

        // A strided view reduces to the same values as its dense copy.
        let tt = t.transposed();
        assert_eq!(tt.sum(), 15.);
        assert_eq!(tt.max(), 5.);
    }

    #[test]
    fn test_reductions_empty() {
        let t = Tensor::<f32>::zeros(&[0]);
        assert_eq!(t.sum(), 0.);
        assert_eq!(t.prod(), 1.);
        assert_eq!(t.max(), f32::NEG_INFINITY);
        assert_eq!(t.min(), f32::INFINITY);
        assert!(t.mean().is_nan());
    }

    #[test]
    fn test_reductions_nan() {
        let t = Tensor::from_vec(vec![1., f32::NAN, 3.]);
        assert!(t.sum().is_nan());
        assert!(t.max().is_nan());
        assert!(t.min().is_nan());

        assert_eq!(t.nan_sum(), 4.);
        assert_eq!(t.nan_prod(), 3.);
        assert_eq!(t.nan_max(), 3.);
        assert_eq!(t.nan_min(), 1.);
        assert_eq!(t.nan_mean(), 2.);

        let all_nan = Tensor::from_vec(vec![f32::NAN, f32::NAN]);
        assert!(all_nan.nan_mean().is_nan());
    }

    #[test]
    fn test_reduce_parallel_matches_serial() {
        let t = Tensor::<f64>::from_fn(&[100_000], |index| (index[0] % 7) as f64);
        let serial: f64 = t.iter().sum();
        assert_eq!(t.sum(), serial);
    }

    #[test]
    fn test_axis_reductions() {
        let t = steps(&[2, 3]);
        assert_eq!(t.sum_axis(0).to_vec(), &[3., 5., 7.]);
        assert_eq!(t.sum_axis(1).to_vec(), &[3., 12.]);
        assert_eq!(t.max_axis(0).to_vec(), &[3., 4., 5.]);
        assert_eq!(t.min_axis(1).to_vec(), &[0., 3.]);
        assert_eq!(t.prod_axis(1).to_vec(), &[0., 60.]);

        let kept = t.reduce_axis::<crate::ops::Sum>(1, true);
        assert_eq!(kept.shape(), &[2, 1]);

        // Reducing an empty axis yields the identity in each lane.
        let empty = Tensor::<f32>::zeros(&[2, 0]);
        assert_eq!(empty.sum_axis(1).to_vec(), &[0., 0.]);
    }

    #[test]
    fn test_mean_var_std() {
        let t = Tensor::from_vec(vec![1.0f32, 2., 3., 4.]);
        assert_eq!(t.mean(), 2.5);
        assert!((t.var(0) - 1.25).abs() < 1e-6);
        assert!((t.var(1) - 5. / 3.).abs() < 1e-6);
        assert!((t.std(0) - 1.25f64.sqrt() as f32).abs() < 1e-6);

        // n <= ddof has no defined variance.
        assert!(Tensor::from_vec(vec![1.0f32]).var(1).is_nan());

        let m = steps(&[2, 2]);
        assert_eq!(m.mean_axis(0).to_vec(), &[1., 2.]);
        expect_equal(&m.var_axis(0, 0), &Tensor::from_vec(vec![1., 1.])).unwrap();
        expect_equal(&m.std_axis(1, 0), &Tensor::from_vec(vec![0.5, 0.5])).unwrap();
    }

    #[test]
    fn test_float_unary_ops() {
        let t = Tensor::from_vec(vec![1.0f64, 4.0]);
        expect_equal(&t.sqrt(), &Tensor::from_vec(vec![1.0, 2.0])).unwrap();
        expect_equal(&t.ln().exp(), &t).unwrap();

        let angles = Tensor::from_vec(vec![0.0f64]);
        assert_eq!(angles.sin().to_vec(), &[0.0]);
        assert_eq!(angles.cos().to_vec(), &[1.0]);
        assert_eq!(angles.tan().to_vec(), &[0.0]);
    }

    #[test]
    fn test_take_single_index_is_view() {
        let t = steps(&[3, 4]);
        let taken = t.take(0, &[1]);
        assert!(taken.is_borrowed());
        assert_eq!(taken.shape(), &[1, 4]);
        assert_eq!(taken.to_vec(), &[4., 5., 6., 7.]);
    }

    #[test]
    fn test_take_progression_is_view() {
        let t = steps(&[6]);
        let taken = t.take(0, &[1, 3, 5]);
        assert!(taken.is_borrowed());
        assert_eq!(taken.to_vec(), &[1., 3., 5.]);

        // Decreasing progressions become negative strides.
        let taken = t.take(0, &[4, 2, 0]);
        assert!(taken.is_borrowed());
        assert_eq!(taken.to_vec(), &[4., 2., 0.]);

        // Constant repetition becomes a stride-0 axis.
        let taken = t.take(0, &[2, 2, 2]);
        assert!(taken.is_borrowed());
        assert_eq!(taken.to_vec(), &[2., 2., 2.]);
    }

    #[test]
    fn test_take_gather_copies() {
        let t = steps(&[2, 3]);
        let taken = t.take(1, &[0, 2, 1]);
        assert!(!taken.is_borrowed());
        assert_eq!(taken.shape(), &[2, 3]);
        assert_eq!(taken.to_vec(), &[0., 2., 1., 3., 5., 4.]);

        let empty = t.take(1, &[]);
        assert_eq!(empty.shape(), &[2, 0]);
    }

    #[test]
    #[should_panic(expected = "take index 3 out of bounds for axis 1 with size 3")]
    fn test_take_index_out_of_bounds() {
        steps(&[2, 3]).take(1, &[3]);
    }

    #[test]
    fn test_repeat() {
        let t = Tensor::from_vec(vec![1., 2., 3.]);
        assert_eq!(t.repeat(0, 2, false).to_vec(), &[1., 2., 3., 1., 2., 3.]);

        let m = steps(&[2, 2]);
        let repeated = m.repeat(0, 2, false);
        assert_eq!(repeated.shape(), &[4, 2]);
        assert_eq!(repeated.to_vec(), &[0., 1., 2., 3., 0., 1., 2., 3.]);

        let stacked = m.repeat(0, 3, true);
        assert_eq!(stacked.shape(), &[3, 2, 2]);
        assert_eq!(stacked.to_vec(), &[0., 1., 2., 3., 0., 1., 2., 3., 0., 1., 2., 3.]);

        let stacked = m.repeat(2, 2, true);
        assert_eq!(stacked.shape(), &[2, 2, 2]);
        assert_eq!(stacked.to_vec(), &[0., 0., 1., 1., 2., 2., 3., 3.]);
    }

    #[test]
    fn test_sort() {
        let mut t = Tensor::from_data(&[2, 3], vec![3., 1., 2., 6., 5., 4.]);
        t.sort(1, false);
        assert_eq!(t.to_vec(), &[1., 2., 3., 4., 5., 6.]);
        t.sort(0, true);
        assert_eq!(t.to_vec(), &[4., 5., 6., 1., 2., 3.]);

        let mut nans = Tensor::from_vec(vec![f32::NAN, 1., 2.]);
        nans.sort(0, false);
        assert_eq!(nans.to_vec()[..2], [1., 2.]);
        assert!(nans.to_vec()[2].is_nan());
    }

    #[test]
    fn test_argsort() {
        let t = Tensor::from_data(&[2, 3], vec![3., 1., 2., 6., 4., 5.]);
        assert_eq!(t.argsort(1, false).to_vec(), &[1, 2, 0, 1, 2, 0]);
        assert_eq!(t.argsort(1, true).to_vec(), &[0, 2, 1, 0, 2, 1]);

        // Ties keep their original order.
        let ties = Tensor::from_vec(vec![1., 1., 0.]);
        assert_eq!(ties.argsort(0, false).to_vec(), &[2, 0, 1]);

        // NaN values sort after all others.
        let nans = Tensor::from_vec(vec![f32::NAN, 2., 1.]);
        assert_eq!(nans.argsort(0, false).to_vec(), &[2, 1, 0]);
    }

    #[test]
    fn test_split_and_chunk() {
        let t = steps(&[2, 5]);
        let view = t.view();

        let parts = view.split(1, &[0, 2, 3]);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].shape(), &[2, 2]);
        assert_eq!(parts[1].to_vec(), &[2., 7.]);
        assert_eq!(parts[2].shape(), &[2, 2]);

        let chunks = view.chunk(1, 2);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].shape(), &[2, 3]);
        assert_eq!(chunks[1].shape(), &[2, 2]);
    }

    #[test]
    fn test_split_all() {
        let t = steps(&[2, 4]);
        let view = t.view();
        let blocks = view.split_all(&[&[0, 1], &[0, 2]]);
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0].to_vec(), &[0., 1.]);
        assert_eq!(blocks[1].to_vec(), &[2., 3.]);
        assert_eq!(blocks[2].to_vec(), &[4., 5.]);
        assert_eq!(blocks[3].to_vec(), &[6., 7.]);
    }

    #[test]
    fn test_unbind() {
        let t = steps(&[2, 3]);
        let view = t.view();
        let rows = view.unbind(0);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].shape(), &[3]);
        assert_eq!(rows[1].to_vec(), &[3., 4., 5.]);
    }

    #[test]
    fn test_concat() {
        let a = steps(&[2, 2]);
        let b = Tensor::from_data(&[2, 1], vec![8., 9.]);
        let joined = concat(1, &[a.view(), b.view()]);
        assert_eq!(joined.shape(), &[2, 3]);
        assert_eq!(joined.to_vec(), &[0., 1., 8., 2., 3., 9.]);
    }

    #[test]
    #[should_panic(expected = "cannot concatenate shapes [2, 2] and [3, 1] along axis 1")]
    fn test_concat_shape_mismatch() {
        let a = Tensor::<f32>::zeros(&[2, 2]);
        let b = Tensor::<f32>::zeros(&[3, 1]);
        concat(1, &[a.view(), b.view()]);
    }

    #[test]
    fn test_stack() {
        let a = Tensor::from_vec(vec![1., 2.]);
        let b = Tensor::from_vec(vec![3., 4.]);
        let stacked = stack(0, &[a.view(), b.view()]);
        assert_eq!(stacked.shape(), &[2, 2]);
        assert_eq!(stacked.to_vec(), &[1., 2., 3., 4.]);

        let stacked = stack(1, &[a.view(), b.view()]);
        assert_eq!(stacked.shape(), &[2, 2]);
        assert_eq!(stacked.to_vec(), &[1., 3., 2., 4.]);
    }

    #[test]
    fn test_apply_and_fill() {
        let mut t = steps(&[2, 3]);
        t.apply(|x| x * 2.);
        assert_eq!(t.to_vec(), &[0., 2., 4., 6., 8., 10.]);

        // The strided path visits each element exactly once.
        t.narrowed_mut(1, 0..2).apply(|x| x + 1.);
        assert_eq!(t.to_vec(), &[1., 3., 4., 7., 9., 10.]);

        t.fill(0.);
        assert_eq!(t.to_vec(), &[0.; 6]);
    }

    #[test]
    fn test_binary_mut() {
        let mut t = steps(&[2, 3]);
        let row = Tensor::from_vec(vec![1., 2., 3.]);
        t.add_mut(&row);
        assert_eq!(t.to_vec(), &[1., 3., 5., 4., 6., 8.]);
        t.sub_mut(&row);
        t.mul_mut(&row);
        assert_eq!(t.to_vec(), &[0., 2., 6., 3., 8., 15.]);
        t.div_mut(&row);
        t.binary_scalar_mut::<crate::ops::AddOp>(1.);
        assert_eq!(t.to_vec(), &[1., 2., 3., 4., 5., 6.]);
    }

    #[test]
    fn test_copy_from() {
        let mut t = Tensor::<f32>::zeros(&[2, 2]);
        let src = steps(&[2, 2]);
        t.copy_from(&src.transposed().to_tensor());
        assert_eq!(t.to_vec(), &[0., 2., 1., 3.]);
    }

    #[test]
    fn test_data_slices() {
        let mut t = steps(&[2, 3]);
        assert_eq!(t.data(), Some(&[0., 1., 2., 3., 4., 5.][..]));
        assert_eq!(t.transposed().data(), None);

        if let Some(data) = t.data_mut() {
            data[0] = 9.;
        }
        assert_eq!(t[[0, 0]], 9.);
    }

    #[test]
    fn test_reshaped_mut() {
        let mut t = steps(&[2, 3]);
        let mut flat = t.view_mut().reshaped_mut(&[6]).unwrap();
        flat[[4]] = 0.;
        assert_eq!(t[[1, 1]], 0.);

        let result = t.view_mut().reshaped_mut(&[5]);
        assert!(result.is_err());
    }

    #[test]
    fn test_constructors() {
        let zeros = Tensor::<i32>::zeros(&[2, 2]);
        assert_eq!(zeros.to_vec(), &[0; 4]);

        let full = Tensor::full(&[3], 7.);
        assert_eq!(full.to_vec(), &[7., 7., 7.]);

        let fn_t = Tensor::from_fn(&[2, 3], |index| (index[0] * 10 + index[1]) as i32);
        assert_eq!(fn_t.to_vec(), &[0, 1, 2, 10, 11, 12]);
    }

    #[test]
    fn test_arange() {
        assert_eq!(Tensor::arange(0, 5, None).to_vec(), &[0, 1, 2, 3, 4]);
        assert_eq!(Tensor::arange(5, 0, Some(-2)).to_vec(), &[5, 3, 1]);
        assert_eq!(Tensor::arange(0., 1., Some(0.25)).len(), 4);
        assert!(Tensor::arange(3, 3, None).is_empty());
    }

    #[test]
    fn test_into_data() {
        let t = steps(&[2, 2]);
        assert_eq!(t.into_data(), &[0., 1., 2., 3.]);

        let t = steps(&[2, 2]).transposed().to_tensor();
        assert_eq!(t.into_data(), &[0., 2., 1., 3.]);
    }

    #[test]
    fn test_cow_into_tensor() {
        let t = steps(&[2, 3]);
        let owned = t.reshaped(&[3, 2]).into_tensor();
        assert_eq!(owned.shape(), &[3, 2]);
        assert_eq!(owned.to_vec(), &[0., 1., 2., 3., 4., 5.]);
    }

    #[test]
    fn test_eq_across_storage() {
        let t = steps(&[2, 2]);
        assert_eq!(t.view(), t);
        assert_eq!(t.transposed().to_tensor(), t.transposed().to_tensor());
        assert!(t != t.transposed().to_tensor());
    }

    #[test]
    fn test_from_slice_with_strides_overlap() {
        let data = [1., 2., 3.];
        // A broadcast row: every row maps to the same three elements.
        let view = TensorView::from_slice_with_strides(&[4, 3], &data, &[0, 1], 0).unwrap();
        assert_eq!(view.shape(), &[4, 3]);
        assert_eq!(view[[3, 2]], 3.);
        assert_eq!(view.sum(), 24.);
    }

    // Every operator in the catalog must produce the same result whether it
    // runs over a dense layout or a strided view of the same values.
    #[test]
    fn test_operator_catalog_layout_equivalence() {
        use crate::ops::{
            Abs, AddOp, AssocOp, BinaryOp, Ceil, Cos, DivOp, Exp, Floor, Ln, Max, Min, MulOp,
            NanMax, NanMin, NanProd, NanSum, Neg, Prod, Round, Sin, Sqrt, SubOp, Sum, Tan,
            UnaryOp,
        };

        fn check_unary<O: UnaryOp<f64>>(dense: &Tensor<f64>, strided: &TensorView<f64>) {
            expect_equal(&dense.unary::<O>(), &strided.unary::<O>()).unwrap();
        }

        fn check_binary<O: BinaryOp<f64>>(dense: &Tensor<f64>, strided: &TensorView<f64>) {
            expect_equal(&dense.binary::<O, _>(dense), &strided.binary::<O, _>(strided)).unwrap();
        }

        fn check_reduce<O: AssocOp<f64>>(dense: &Tensor<f64>, strided: &TensorView<f64>) {
            let (full, strided_full) = (dense.reduce::<O>(), strided.reduce::<O>());
            assert!(
                (full - strided_full).abs() <= 1e-9 * full.abs(),
                "full reduction: {} vs {}",
                full,
                strided_full
            );
            expect_equal(
                &dense.reduce_axis::<O>(0, false),
                &strided.reduce_axis::<O>(0, false),
            )
            .unwrap();
        }

        let base = Tensor::from_fn(&[4, 6], |ix| 0.25 + (ix[0] * 6 + ix[1]) as f64 * 0.25);
        let taken = base.take(1, &[0, 2, 4]);
        assert!(taken.is_borrowed());

        for strided in [taken.view(), base.transposed()] {
            assert!(strided.data().is_none());
            let dense = strided.to_tensor();

            check_unary::<Abs>(&dense, &strided);
            check_unary::<Neg>(&dense, &strided);
            check_unary::<Floor>(&dense, &strided);
            check_unary::<Ceil>(&dense, &strided);
            check_unary::<Round>(&dense, &strided);
            check_unary::<Sqrt>(&dense, &strided);
            check_unary::<Exp>(&dense, &strided);
            check_unary::<Ln>(&dense, &strided);
            check_unary::<Sin>(&dense, &strided);
            check_unary::<Cos>(&dense, &strided);
            check_unary::<Tan>(&dense, &strided);

            check_binary::<AddOp>(&dense, &strided);
            check_binary::<SubOp>(&dense, &strided);
            check_binary::<MulOp>(&dense, &strided);
            check_binary::<DivOp>(&dense, &strided);

            check_reduce::<Sum>(&dense, &strided);
            check_reduce::<Prod>(&dense, &strided);
            check_reduce::<Max>(&dense, &strided);
            check_reduce::<Min>(&dense, &strided);
            check_reduce::<NanSum>(&dense, &strided);
            check_reduce::<NanProd>(&dense, &strided);
            check_reduce::<NanMax>(&dense, &strided);
            check_reduce::<NanMin>(&dense, &strided);
        }
    }
}
