use crate::ops::{Element, FloatElement};

/// An associative reduction with an identity element.
///
/// Reducing an empty array yields the identity (0 for sums, 1 for products,
/// the kind's extremes for max/min). The plain operators propagate NaN; the
/// `Nan*` variants skip NaN inputs and are only defined for float kinds.
pub trait AssocOp<T: Element> {
    /// The value of reducing zero elements.
    fn identity() -> T;

    /// Fold one element into the accumulator.
    fn combine(acc: T, x: T) -> T;
}

/// Sum of all elements. NaN inputs make the result NaN.
#[derive(Clone, Copy, Debug)]
pub struct Sum;

impl<T: Element> AssocOp<T> for Sum {
    fn identity() -> T {
        T::ZERO
    }

    fn combine(acc: T, x: T) -> T {
        acc + x
    }
}

/// Product of all elements. NaN inputs make the result NaN.
#[derive(Clone, Copy, Debug)]
pub struct Prod;

impl<T: Element> AssocOp<T> for Prod {
    fn identity() -> T {
        T::ONE
    }

    fn combine(acc: T, x: T) -> T {
        acc * x
    }
}

/// Largest element. NaN inputs make the result NaN.
#[derive(Clone, Copy, Debug)]
pub struct Max;

impl<T: Element> AssocOp<T> for Max {
    fn identity() -> T {
        T::MIN_ELEM
    }

    fn combine(acc: T, x: T) -> T {
        if acc.is_nan() {
            acc
        } else if x.is_nan() || x > acc {
            x
        } else {
            acc
        }
    }
}

/// Smallest element. NaN inputs make the result NaN.
#[derive(Clone, Copy, Debug)]
pub struct Min;

impl<T: Element> AssocOp<T> for Min {
    fn identity() -> T {
        T::MAX_ELEM
    }

    fn combine(acc: T, x: T) -> T {
        if acc.is_nan() {
            acc
        } else if x.is_nan() || x < acc {
            x
        } else {
            acc
        }
    }
}

macro_rules! nan_skipping_op {
    ($name:ident, $inner:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug)]
        pub struct $name;

        impl<T: FloatElement> AssocOp<T> for $name {
            fn identity() -> T {
                <$inner as AssocOp<T>>::identity()
            }

            fn combine(acc: T, x: T) -> T {
                if x.is_nan() {
                    acc
                } else {
                    <$inner as AssocOp<T>>::combine(acc, x)
                }
            }
        }
    };
}

nan_skipping_op!(NanSum, Sum, "Sum of all non-NaN elements.");
nan_skipping_op!(NanProd, Prod, "Product of all non-NaN elements.");
nan_skipping_op!(
    NanMax,
    Max,
    "Largest non-NaN element, or negative infinity if there is none."
);
nan_skipping_op!(
    NanMin,
    Min,
    "Smallest non-NaN element, or positive infinity if there is none."
);
