//! Element kinds and the operator catalog.
//!
//! Arrays are generic over a closed set of element types (`u8`, `i32`,
//! `f32`, `f64`). Operators are zero-sized strategy types grouped by arity:
//! [unary], [binary] and associative reductions ([reduce]). Float-only
//! operators are gated on [FloatElement] so that eg. `sqrt` on an integer
//! array is rejected at compile time rather than at runtime.

use std::cmp::Ordering;
use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Sub};

mod binary;
mod reduce;
mod unary;

pub use binary::{AddOp, BinaryOp, DivOp, MulOp, SubOp};
pub use reduce::{AssocOp, Max, Min, NanMax, NanMin, NanProd, NanSum, Prod, Sum};
pub use unary::{Abs, Ceil, Cos, Exp, Floor, Ln, Neg, Round, Sin, Sqrt, Tan, UnaryOp};

/// Trait implemented by the element types arrays can hold.
///
/// This is a closed set: `u8`, `i32`, `f32` and `f64`. The trait provides
/// the constants and primitives shared by all kinds; operations that only
/// make sense for floats live on [FloatElement].
pub trait Element:
    Copy
    + PartialOrd
    + PartialEq
    + Debug
    + Default
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
{
    /// The additive identity.
    const ZERO: Self;

    /// The multiplicative identity.
    const ONE: Self;

    /// The smallest value of the kind. For floats this is negative infinity,
    /// so that it is the identity of `max`.
    const MIN_ELEM: Self;

    /// The largest value of the kind. For floats this is positive infinity.
    const MAX_ELEM: Self;

    /// Return true if this value is a float NaN. Always false for integer
    /// kinds.
    fn is_nan(self) -> bool;

    /// Absolute value. Signed integers wrap on overflow (`i32::MIN` maps to
    /// itself); unsigned kinds return the value unchanged.
    fn abs_elem(self) -> Self;

    /// Arithmetic negation. Integer kinds wrap (two's complement).
    fn neg_elem(self) -> Self;

    /// Largest integral value not above `self`. Identity for integer kinds.
    fn floor_elem(self) -> Self;

    /// Smallest integral value not below `self`. Identity for integer kinds.
    fn ceil_elem(self) -> Self;

    /// Nearest integral value, half-cases away from zero. Identity for
    /// integer kinds.
    fn round_elem(self) -> Self;

    /// Total ordering over all values of the kind, including NaN, which
    /// sorts after every non-NaN value.
    fn total_cmp(&self, other: &Self) -> Ordering;
}

/// Marker plus float primitives for the floating point element kinds.
pub trait FloatElement: Element {
    const NAN: Self;

    fn sqrt(self) -> Self;
    fn exp(self) -> Self;
    fn ln(self) -> Self;
    fn sin(self) -> Self;
    fn cos(self) -> Self;
    fn tan(self) -> Self;

    /// Convert an element count to this kind, for means and variances.
    fn from_usize(n: usize) -> Self;
}

macro_rules! impl_int_element {
    ($type:ty, $abs:ident, $neg:ident) => {
        impl Element for $type {
            const ZERO: Self = 0;
            const ONE: Self = 1;
            const MIN_ELEM: Self = <$type>::MIN;
            const MAX_ELEM: Self = <$type>::MAX;

            fn is_nan(self) -> bool {
                false
            }

            fn abs_elem(self) -> Self {
                self.$abs()
            }

            fn neg_elem(self) -> Self {
                self.$neg()
            }

            fn floor_elem(self) -> Self {
                self
            }

            fn ceil_elem(self) -> Self {
                self
            }

            fn round_elem(self) -> Self {
                self
            }

            fn total_cmp(&self, other: &Self) -> Ordering {
                self.cmp(other)
            }
        }
    };
}

impl_int_element!(i32, wrapping_abs, wrapping_neg);

impl Element for u8 {
    const ZERO: Self = 0;
    const ONE: Self = 1;
    const MIN_ELEM: Self = u8::MIN;
    const MAX_ELEM: Self = u8::MAX;

    fn is_nan(self) -> bool {
        false
    }

    fn abs_elem(self) -> Self {
        self
    }

    fn neg_elem(self) -> Self {
        self.wrapping_neg()
    }

    fn floor_elem(self) -> Self {
        self
    }

    fn ceil_elem(self) -> Self {
        self
    }

    fn round_elem(self) -> Self {
        self
    }

    fn total_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

macro_rules! impl_float_element {
    ($type:ty) => {
        impl Element for $type {
            const ZERO: Self = 0.;
            const ONE: Self = 1.;
            const MIN_ELEM: Self = <$type>::NEG_INFINITY;
            const MAX_ELEM: Self = <$type>::INFINITY;

            fn is_nan(self) -> bool {
                <$type>::is_nan(self)
            }

            fn abs_elem(self) -> Self {
                self.abs()
            }

            fn neg_elem(self) -> Self {
                -self
            }

            fn floor_elem(self) -> Self {
                self.floor()
            }

            fn ceil_elem(self) -> Self {
                self.ceil()
            }

            fn round_elem(self) -> Self {
                self.round()
            }

            fn total_cmp(&self, other: &Self) -> Ordering {
                <$type>::total_cmp(self, other)
            }
        }

        impl FloatElement for $type {
            const NAN: Self = <$type>::NAN;

            fn sqrt(self) -> Self {
                <$type>::sqrt(self)
            }

            fn exp(self) -> Self {
                <$type>::exp(self)
            }

            fn ln(self) -> Self {
                <$type>::ln(self)
            }

            fn sin(self) -> Self {
                <$type>::sin(self)
            }

            fn cos(self) -> Self {
                <$type>::cos(self)
            }

            fn tan(self) -> Self {
                <$type>::tan(self)
            }

            fn from_usize(n: usize) -> Self {
                n as $type
            }
        }
    };
}

impl_float_element!(f32);
impl_float_element!(f64);

/// Conversion between element kinds with `as`-cast semantics.
///
/// Float to int conversions truncate towards zero and saturate at the
/// target's bounds; NaN converts to zero. Int to float conversions round to
/// the nearest representable value.
pub trait CastFrom<U> {
    fn cast_from(x: U) -> Self;
}

macro_rules! impl_cast_from {
    ($dest:ty) => {
        impl_cast_from!($dest, u8);
        impl_cast_from!($dest, i32);
        impl_cast_from!($dest, f32);
        impl_cast_from!($dest, f64);
    };
    ($dest:ty, $src:ty) => {
        impl CastFrom<$src> for $dest {
            fn cast_from(x: $src) -> Self {
                x as $dest
            }
        }
    };
}

impl_cast_from!(u8);
impl_cast_from!(i32);
impl_cast_from!(f32);
impl_cast_from!(f64);
