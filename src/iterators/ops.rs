use crate::iterators::{ControlledOpIterator, MatrixOpIterator};
use num_traits::{One, Zero};
use std::fmt;
use std::iter::Sum;

/// Ops which can be applied to quantum states.
#[derive(Clone)]
pub enum MatrixOp<P> {
    /// Indices, row-major matrix data
    Matrix(Vec<usize>, Vec<P>),
    /// Number of control indices, control state, all indices (controls first), Op on the
    /// trailing indices
    Control(usize, usize, Vec<usize>, Box<MatrixOp<P>>),
}

impl<P> MatrixOp<P> {
    /// Get the number of indices represented by `op`
    pub fn num_indices(&self) -> usize {
        self.indices().len()
    }

    /// Get the indices acted on by this op, control indices included.
    pub fn indices(&self) -> &[usize] {
        match self {
            MatrixOp::Matrix(i, _) => i,
            MatrixOp::Control(_, _, i, _) => i,
        }
    }

    /// Make a new dense matrix op
    pub fn new_matrix<Indx, Dat>(indices: Indx, data: Dat) -> Self
    where
        Indx: Into<Vec<usize>>,
        Dat: Into<Vec<P>>,
    {
        Self::Matrix(indices.into(), data.into())
    }
}

impl<P> MatrixOp<P>
where
    P: Clone + Zero + One,
{
    /// The function `f` maps a column to a value (given the `row`) for the op matrix.
    /// Sums `f` over all nonzero entries of the row.
    pub fn sum_for_op_cols<T, F>(&self, nindices: usize, row: usize, f: F) -> T
    where
        T: Sum,
        F: Fn((usize, P)) -> T,
    {
        match self {
            MatrixOp::Matrix(_, data) => MatrixOpIterator::new(row, nindices, data).map(f).sum(),
            MatrixOp::Control(n_control_indices, ctrl_state, indices, op) => {
                let n_op_indices = indices.len() - n_control_indices;
                op.sum_for_control_iterator(row, *n_control_indices, *ctrl_state, n_op_indices, f)
            }
        }
    }

    fn sum_for_control_iterator<T, F>(
        &self,
        row: usize,
        n_control_indices: usize,
        ctrl_state: usize,
        n_op_indices: usize,
        f: F,
    ) -> T
    where
        T: Sum,
        F: Fn((usize, P)) -> T,
    {
        match self {
            MatrixOp::Matrix(_, data) => {
                let iter_builder = |row: usize| MatrixOpIterator::new(row, n_op_indices, data);
                ControlledOpIterator::new(row, ctrl_state, n_op_indices, iter_builder)
                    .map(f)
                    .sum()
            }
            // Nested controls are collapsed by `make_control_op`, handle them anyway.
            MatrixOp::Control(inner_n_control, inner_state, indices, op) => {
                let n_control_indices = n_control_indices + inner_n_control;
                let ctrl_state = (ctrl_state << inner_n_control) | inner_state;
                let n_op_indices = indices.len() - inner_n_control;
                op.sum_for_control_iterator(row, n_control_indices, ctrl_state, n_op_indices, f)
            }
        }
    }
}

impl<P> fmt::Debug for MatrixOp<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (name, indices) = match self {
            MatrixOp::Matrix(indices, _) => ("Matrix".to_string(), indices.clone()),
            MatrixOp::Control(num_c_indices, ctrl_state, indices, op) => {
                let name = format!("C{:b}({:?})", ctrl_state, *op);
                (name, indices[..*num_c_indices].to_vec())
            }
        };
        let int_strings = indices
            .iter()
            .map(|x| x.to_string())
            .collect::<Vec<String>>();

        write!(f, "{}[{}]", name, int_strings.join(", "))
    }
}
