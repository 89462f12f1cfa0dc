use num_traits::{One, Zero};

use crate::utils::get_flat_index;

/// Iterator which provides the indices of nonzero columns for a given row of a matrix
#[derive(Debug)]
pub struct MatrixOpIterator<'a, P>
where
    P: Clone + Zero,
{
    data: &'a [P],
    next_col: usize,
}

impl<'a, P> MatrixOpIterator<'a, P>
where
    P: Clone + Zero,
{
    /// Build a new iterator using the row index, the number of qubits in the matrix, and the
    /// values of the matrix.
    pub fn new(row: usize, n: usize, data: &'a [P]) -> MatrixOpIterator<'a, P> {
        let lower = get_flat_index(n, row, 0);
        let upper = get_flat_index(n, row, 1 << n);
        MatrixOpIterator {
            data: &data[lower..upper],
            next_col: 0,
        }
    }
}

impl<'a, P> Iterator for MatrixOpIterator<'a, P>
where
    P: Clone + Zero,
{
    type Item = (usize, P);

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_col < self.data.len() {
            let col = self.next_col;
            self.next_col += 1;
            let val = &self.data[col];
            if !val.is_zero() {
                return Some((col, val.clone()));
            }
        }
        None
    }
}

/// Iterator which provides the indices of nonzero columns for a given row of a controlled op.
/// Rows whose control bits match the control state are forwarded to the op iterator, all other
/// rows are the identity.
#[derive(Debug)]
pub struct ControlledOpIterator<P, It>
where
    It: Iterator<Item = (usize, P)>,
{
    row: usize,
    col_offset: usize,
    op_iter: Option<It>,
    done: bool,
}

impl<P, It> ControlledOpIterator<P, It>
where
    It: Iterator<Item = (usize, P)>,
{
    /// Build a new iterator using the row index, the control state, the number of op indices,
    /// and a builder for the op iterator. The control indices are the high bits of `row`.
    pub fn new<F: FnOnce(usize) -> It>(
        row: usize,
        ctrl_state: usize,
        n_op_indices: usize,
        iter_builder: F,
    ) -> ControlledOpIterator<P, It> {
        let op_mask = (1 << n_op_indices) - 1;
        let col_offset = ctrl_state << n_op_indices;
        let op_iter = if row >> n_op_indices == ctrl_state {
            Some(iter_builder(row & op_mask))
        } else {
            None
        };
        ControlledOpIterator {
            row,
            col_offset,
            op_iter,
            done: false,
        }
    }
}

impl<P, It> Iterator for ControlledOpIterator<P, It>
where
    P: One,
    It: Iterator<Item = (usize, P)>,
{
    type Item = (usize, P);

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.op_iter {
            Some(it) => it.next().map(|(col, val)| (col + self.col_offset, val)),
            None if self.done => None,
            None => {
                self.done = true;
                Some((self.row, P::one()))
            }
        }
    }
}
