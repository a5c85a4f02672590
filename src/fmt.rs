//! Text rendering of arrays.
//!
//! The [Debug] impl and [`to_content`](TensorBase::to_content) elide long
//! dimensions with `...`; [`to_full_content`](TensorBase::to_full_content)
//! renders every element.

use std::fmt::{Debug, Error, Formatter, Write};

use crate::{AsView, Storage, TensorBase, TensorView};

/// Entry in the formatted representation of an array's data.
enum Entry<T: Debug> {
    Value(T),

    /// "..." used to elide long dimensions.
    Ellipsis,
}

impl<T: Debug> Debug for Entry<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            Entry::Value(val) => write!(f, "{:?}", val),
            Entry::Ellipsis => write!(f, "..."),
        }
    }
}

/// Configuration for formatting of an array.
struct FormatOptions {
    /// Maximum number of columns to print before eliding.
    pub max_columns: usize,

    /// Maximum number of rows to print before eliding.
    pub max_rows: usize,

    /// Maximum number of sub-matrices to print before eliding.
    pub max_matrices: usize,
}

impl FormatOptions {
    /// Limits used by [`to_content`](TensorBase::to_content) and the
    /// [Debug] impl.
    fn elided() -> FormatOptions {
        FormatOptions {
            max_columns: 21,
            max_rows: 41,
            max_matrices: 41,
        }
    }

    /// No limits: render every element.
    fn full() -> FormatOptions {
        FormatOptions {
            max_columns: usize::MAX,
            max_rows: usize::MAX,
            max_matrices: usize::MAX,
        }
    }
}

/// A [`Debug`]-implementing wrapper around an array view with custom
/// formatting options.
struct FormatTensor<'a, T> {
    tensor: TensorView<'a, T>,
    opts: FormatOptions,

    /// Append `shape=..., strides=...` after the data.
    suffix: bool,
}

impl<T: Debug> FormatTensor<'_, T> {
    /// Format a single vector of an array as a list (`[0, 1, 2, ... n]`).
    fn write_vector<'b>(
        &self,
        f: &mut Formatter<'_>,
        row: impl ExactSizeIterator<Item = &'b T> + Clone,
    ) -> Result<(), Error>
    where
        T: 'b,
    {
        let len = row.len();

        let head = row.clone().take(self.opts.max_columns / 2);
        let tail = row
            .clone()
            .skip(self.opts.max_columns / 2)
            .skip(len.saturating_sub(self.opts.max_columns));

        let mut data_fmt = f.debug_list();
        data_fmt.entries(head.map(Entry::Value));
        if len > self.opts.max_columns {
            data_fmt.entry(&Entry::<&T>::Ellipsis);
        }
        data_fmt.entries(tail.map(Entry::Value));
        data_fmt.finish()
    }

    /// Format a single rank-2 sub-view of an array.
    ///
    /// `extra_indent` specifies the amount of additional indentation to
    /// apply to rows after the first one. The first row is assumed not to
    /// require any indentation.
    fn write_matrix(
        &self,
        f: &mut Formatter<'_>,
        mat: TensorView<'_, T>,
        extra_indent: usize,
    ) -> Result<(), Error> {
        let rows = mat.size(0);
        write!(f, "[")?;
        for row in 0..rows.min(self.opts.max_rows) {
            self.write_vector(f, mat.index_axis(0, row).iter())?;

            if row < rows.min(self.opts.max_rows) - 1 {
                write!(f, ",\n{:>width$}", ' ', width = extra_indent + 1)?;
            } else if rows > self.opts.max_rows {
                write!(f, ",\n{}...", " ".repeat(extra_indent + 1))?;
            }
        }
        write!(f, "]")?;
        Ok(())
    }
}

impl<T: Debug> Debug for FormatTensor<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let tensor = &self.tensor;

        match tensor.rank() {
            0 => write!(f, "({:?})", tensor.item().ok_or(Error)?)?,
            1 => self.write_vector(f, tensor.iter())?,
            n => {
                // Format arrays with >= 2 dims as a sequence of matrices.
                let outer_dims = n - 2;
                write!(f, "{}", "[".repeat(outer_dims))?;

                let n_matrices: usize = tensor.shape().iter().take(outer_dims).product();

                for (i, mat) in matrices(tensor).enumerate().take(self.opts.max_matrices) {
                    if i > 0 {
                        write!(f, "{}", " ".repeat(outer_dims))?;
                    }

                    self.write_matrix(f, mat, outer_dims)?;

                    if i < n_matrices.min(self.opts.max_matrices) - 1 {
                        write!(f, ",\n\n")?;
                    } else if n_matrices > self.opts.max_matrices {
                        write!(f, "\n\n{}...\n\n", " ".repeat(outer_dims))?;
                    }
                }

                write!(f, "{}", "]".repeat(outer_dims))?;
            }
        }

        if self.suffix {
            write!(
                f,
                ", shape={:?}, strides={:?}",
                tensor.shape(),
                tensor.strides()
            )?;
        }
        Ok(())
    }
}

/// Iterate over the rank-2 trailing sub-views of an array of rank >= 2, in
/// row-major order of the leading dimensions.
fn matrices<'a, T>(tensor: &TensorView<'a, T>) -> impl Iterator<Item = TensorView<'a, T>> {
    let outer_dims = tensor.rank() - 2;
    let outer_shape = tensor.shape()[..outer_dims].to_vec();
    let tensor = tensor.clone();
    crate::DynIndices::from_shape(&outer_shape).map(move |index| {
        let mut mat = tensor.clone();
        for &i in index.iter() {
            mat = mat.index_axis(0, i);
        }
        mat
    })
}

impl<S: Storage> TensorBase<S>
where
    S::Elem: Debug,
{
    /// Render the array's values as text, eliding dimensions longer than
    /// the display caps with `...`.
    pub fn to_content(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = write!(
            out,
            "{:?}",
            FormatTensor {
                tensor: self.view(),
                opts: FormatOptions::elided(),
                suffix: false,
            }
        );
        out
    }

    /// Render every value of the array as text, with no elision.
    pub fn to_full_content(&self) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            "{:?}",
            FormatTensor {
                tensor: self.view(),
                opts: FormatOptions::full(),
                suffix: false,
            }
        );
        out
    }
}

impl<S: Storage> Debug for TensorBase<S>
where
    S::Elem: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(
            f,
            "{:?}",
            FormatTensor {
                tensor: self.view(),
                opts: FormatOptions::elided(),
                suffix: true,
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::{AsView, Tensor};

    #[test]
    fn test_debug() {
        struct Case<'a> {
            tensor: Tensor<f32>,
            expected: &'a str,
        }

        let cases = [
            // Scalar
            Case {
                tensor: Tensor::from_data(&[], vec![2.]),
                expected: "(2.0), shape=[], strides=[]",
            },
            // Empty vector
            Case {
                tensor: Tensor::from_vec(Vec::new()),
                expected: "[], shape=[0], strides=[1]",
            },
            // Short vector
            Case {
                tensor: Tensor::from_vec(vec![1., 2., 3., 4.]),
                expected: "[1.0, 2.0, 3.0, 4.0], shape=[4], strides=[1]",
            },
            // Matrix
            Case {
                tensor: Tensor::from_data(&[2, 2], vec![1., 2., 3., 4.]),
                expected: "
[[1.0, 2.0],
 [3.0, 4.0]], shape=[2, 2], strides=[2, 1]"
                    .trim(),
            },
            // 3D
            Case {
                tensor: Tensor::from_data(&[1, 2, 2], vec![1., 2., 3., 4.]),
                expected: "
[[[1.0, 2.0],
  [3.0, 4.0]]], shape=[1, 2, 2], strides=[4, 2, 1]"
                    .trim(),
            },
        ];

        for Case { tensor, expected } in cases {
            assert_eq!(format!("{:?}", tensor), expected);
        }
    }

    #[test]
    fn test_to_content_elides_long_rows() {
        let tensor = Tensor::<f32>::arange(0., 30., None);
        let content = tensor.to_content();
        assert!(content.contains("..."));
        // 21-column cap: 10 shown at each end.
        assert!(content.starts_with("[0.0, 1.0,"));
        assert!(content.ends_with("28.0, 29.0]"));

        let full = tensor.to_full_content();
        assert!(!full.contains("..."));
        assert!(full.contains("15.0"));
    }

    #[test]
    fn test_to_content_elides_long_columns() {
        let tensor = Tensor::<i32>::zeros(&[50, 2]);
        let content = tensor.to_content();
        assert!(content.contains("..."));

        let full = tensor.to_full_content();
        assert!(!full.contains("..."));
    }

    #[test]
    fn test_debug_strided_view() {
        let tensor = Tensor::from_data(&[2, 2], vec![1, 2, 3, 4]);
        let debug_str = format!("{:?}", tensor.transposed());
        assert_eq!(
            debug_str,
            "
[[1, 3],
 [2, 4]], shape=[2, 2], strides=[1, 2]"
                .trim()
        );
    }
}
