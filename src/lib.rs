//! darray provides multi-dimensional arrays over a small closed set of
//! element kinds (`u8`, `i32`, `f32`, `f64`), built around explicit strided
//! layouts.
//!
//! ## Key concepts
//!
//! - [StrideLayout] maps N-dimensional indices to offsets in a flat storage
//!   buffer via a shape, signed per-dimension strides and a base offset.
//!   Structural transforms (transpose, narrow, broadcast, permute...) are
//!   pure layout arithmetic and never copy elements.
//! - [TensorBase] pairs a layout with a [Storage]. Its concrete forms are
//!   the owned [Tensor], the borrowed [TensorView] / [TensorViewMut], and
//!   [CowTensor] for operations that copy only when the geometry forces it.
//! - [LoopDescriptor] compiles a layout into a flat iteration plan, so that
//!   kernels run one tight constant-stride inner loop per run and collapse
//!   to plain slice traversals for contiguous data.
//! - The operator catalog in [ops] defines elementwise and reduction
//!   operators as zero-sized strategy types; float-only operators are
//!   rejected for integer arrays at compile time.
//!
//! ## Example
//!
//! ```
//! use darray::{AsView, Tensor};
//!
//! let m = Tensor::from_data(&[2, 3], vec![1., 2., 3., 4., 5., 6.]);
//! let col_sums = m.sum_axis(0);
//! assert_eq!(col_sums.to_vec(), &[5., 7., 9.]);
//!
//! // Views share storage with the arrays they come from.
//! let t = m.transposed();
//! assert_eq!(t[[2, 1]], 6.);
//! ```

mod broadcast;
mod copy;
mod errors;
mod fmt;
mod index_iterator;
mod iterators;
mod layout;
mod loops;
pub mod ops;
mod overlap;
mod storage;
mod tensor;

pub mod test_util;

pub use broadcast::broadcast_shapes;
pub use errors::{BroadcastError, DimensionError, FromDataError, ReshapeError};
pub use index_iterator::{DynIndex, DynIndices};
pub use iterators::{Iter, IterMut};
pub use layout::{is_valid_permutation, Order, OverlapPolicy, StrideLayout};
pub use loops::{LoopDescriptor, Offsets};
pub use storage::{IntoStorage, Storage, StorageMut, ViewData, ViewMutData};
pub use tensor::{
    concat, stack, AsView, CowTensor, Tensor, TensorBase, TensorView, TensorViewMut,
};
