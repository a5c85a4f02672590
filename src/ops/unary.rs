use crate::ops::{Element, FloatElement};

/// An elementwise operator mapping each element to a new value of the same
/// kind.
///
/// Implementations are zero-sized types used as generic arguments to
/// [`unary`](crate::TensorBase::unary) and
/// [`unary_mut`](crate::TensorBase::unary_mut).
pub trait UnaryOp<T: Element> {
    fn apply(x: T) -> T;
}

macro_rules! unary_op {
    ($name:ident, $bound:ident, $method:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug)]
        pub struct $name;

        impl<T: $bound> UnaryOp<T> for $name {
            fn apply(x: T) -> T {
                x.$method()
            }
        }
    };
}

unary_op!(Abs, Element, abs_elem, "Absolute value.");
unary_op!(Neg, Element, neg_elem, "Arithmetic negation.");
unary_op!(
    Floor,
    Element,
    floor_elem,
    "Round down to the nearest integral value."
);
unary_op!(
    Ceil,
    Element,
    ceil_elem,
    "Round up to the nearest integral value."
);
unary_op!(
    Round,
    Element,
    round_elem,
    "Round to the nearest integral value, half-cases away from zero."
);

unary_op!(Sqrt, FloatElement, sqrt, "Square root.");
unary_op!(Exp, FloatElement, exp, "Base-e exponential.");
unary_op!(Ln, FloatElement, ln, "Natural logarithm.");
unary_op!(Sin, FloatElement, sin, "Sine.");
unary_op!(Cos, FloatElement, cos, "Cosine.");
unary_op!(Tan, FloatElement, tan, "Tangent.");

#[cfg(test)]
mod tests {
    use super::{Abs, Ceil, Neg, Sqrt, UnaryOp};

    #[test]
    fn test_unary_ops() {
        assert_eq!(<Abs as UnaryOp<i32>>::apply(-3), 3);
        assert_eq!(<Neg as UnaryOp<f64>>::apply(2.5), -2.5);
        assert_eq!(<Ceil as UnaryOp<f32>>::apply(1.1), 2.);
        assert_eq!(<Sqrt as UnaryOp<f64>>::apply(9.), 3.);
    }
}
