//! Kernels that materialize strided data into contiguous buffers.
//!
//! All copies are planned with a [LoopDescriptor]: contiguous sources reduce
//! to a slice copy, strided sources walk their runs. Large copies fan the
//! runs out across the rayon worker pool; each run writes a disjoint range
//! of the output, so no synchronization is needed beyond the join.

use rayon::prelude::*;

use crate::layout::{Order, StrideLayout};
use crate::loops::LoopDescriptor;
use crate::ops::Element;
use crate::storage::ViewData;

/// Minimum number of elements before a copy is worth parallelizing.
pub(crate) const PARALLEL_THRESHOLD: usize = 32_768;

/// Read every element of `layout` over `data` in `order` and collect the
/// results of `f` into a vector.
pub(crate) fn map_into_vec<T: Element, U: Element, F: Fn(T) -> U + Sync>(
    layout: &StrideLayout,
    data: ViewData<T>,
    order: Order,
    f: F,
) -> Vec<U> {
    if let Some(range) = layout.contiguous_range(order) {
        // Safety: callers hold an immutable borrow of the source array.
        let src = unsafe { data.slice(range).as_slice() };
        if src.len() >= PARALLEL_THRESHOLD {
            return src.par_iter().map(|&x| f(x)).collect();
        }
        return src.iter().map(|&x| f(x)).collect();
    }

    let plan = LoopDescriptor::new(layout, order);
    if plan.len() >= PARALLEL_THRESHOLD && plan.size() > 0 {
        let mut out = vec![U::default(); plan.len()];
        out.par_chunks_mut(plan.size())
            .zip(plan.offsets().par_iter())
            .for_each(|(chunk, &start)| {
                for (i, slot) in chunk.iter_mut().enumerate() {
                    let offset = (start as isize + i as isize * plan.step()) as usize;
                    // Safety: loop descriptor offsets are in bounds for the
                    // storage backing `layout`.
                    *slot = f(unsafe { *data.get_unchecked(offset) });
                }
            });
        out
    } else {
        plan.iter_offsets()
            // Safety: as above.
            .map(|offset| f(unsafe { *data.get_unchecked(offset) }))
            .collect()
    }
}

/// Materialize the elements of `layout` over `data` in `order`.
pub(crate) fn copy_into_vec<T: Element>(
    layout: &StrideLayout,
    data: ViewData<T>,
    order: Order,
) -> Vec<T> {
    map_into_vec(layout, data, order, |x| x)
}

/// Collect `f(a, b)` for every aligned element pair of two same-shaped
/// layouts, in C order.
pub(crate) fn zip_map_into_vec<T: Element, F: Fn(T, T) -> T + Sync>(
    lhs_layout: &StrideLayout,
    lhs: ViewData<T>,
    rhs_layout: &StrideLayout,
    rhs: ViewData<T>,
    f: F,
) -> Vec<T> {
    debug_assert_eq!(lhs_layout.shape(), rhs_layout.shape());

    // Fast path: both sides contiguous in C order, zip the slices.
    if let (Some(lhs_range), Some(rhs_range)) = (
        lhs_layout.contiguous_range(Order::C),
        rhs_layout.contiguous_range(Order::C),
    ) {
        // Safety: callers hold immutable borrows of both source arrays.
        let (a, b) = unsafe { (lhs.slice(lhs_range).as_slice(), rhs.slice(rhs_range).as_slice()) };
        if a.len() >= PARALLEL_THRESHOLD {
            return a
                .par_iter()
                .zip(b.par_iter())
                .map(|(&x, &y)| f(x, y))
                .collect();
        }
        return a.iter().zip(b.iter()).map(|(&x, &y)| f(x, y)).collect();
    }

    let lhs_plan = LoopDescriptor::new(lhs_layout, Order::C);
    let rhs_plan = LoopDescriptor::new(rhs_layout, Order::C);
    lhs_plan
        .iter_offsets()
        .zip(rhs_plan.iter_offsets())
        // Safety: as above.
        .map(|(i, j)| f(unsafe { *lhs.get_unchecked(i) }, unsafe { *rhs.get_unchecked(j) }))
        .collect()
}
