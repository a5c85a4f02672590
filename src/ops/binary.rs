use crate::ops::Element;

/// An elementwise operator combining two values of the same kind.
///
/// Implementations are zero-sized types used as generic arguments to
/// [`binary`](crate::TensorBase::binary) and its broadcasting and in-place
/// variants.
pub trait BinaryOp<T: Element> {
    fn apply(lhs: T, rhs: T) -> T;
}

macro_rules! binary_op {
    ($name:ident, $op:tt, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug)]
        pub struct $name;

        impl<T: Element> BinaryOp<T> for $name {
            fn apply(lhs: T, rhs: T) -> T {
                lhs $op rhs
            }
        }
    };
}

binary_op!(AddOp, +, "Elementwise addition.");
binary_op!(SubOp, -, "Elementwise subtraction.");
binary_op!(MulOp, *, "Elementwise multiplication.");
binary_op!(DivOp, /, "Elementwise division. Integer division by zero panics, \
as it does for the scalar types.");
