use crate::errors::{CircuitError, CircuitResult};
use crate::iterators::MatrixOp;
use crate::utils::{full_to_sub, get_flat_index, sub_to_full};
use crate::{Complex, Precision};
use num_traits::{One, Zero};
use std::iter::Sum;
use std::ops::Mul;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Make a Matrix MatrixOp
pub fn make_matrix_op<P>(indices: Vec<usize>, dat: Vec<P>) -> CircuitResult<MatrixOp<P>> {
    let n = indices.len();
    let expected_mat_size = 1 << (2 * n);
    if indices.is_empty() {
        Err(CircuitError::new("Must supply at least one op index"))
    } else if dat.len() != expected_mat_size {
        let message = format!(
            "Matrix data has {:?} entries versus expected 2^2*{:?}",
            dat.len(),
            n
        );
        Err(CircuitError::new(message))
    } else {
        Ok(MatrixOp::Matrix(indices, dat))
    }
}

/// Make a Control MatrixOp which applies `op` when the qubits at `c_indices` hold `ctrl_state`
/// (first index is the most significant bit). Nested controls are merged into a single control.
pub fn make_control_op<P>(
    mut c_indices: Vec<usize>,
    ctrl_state: usize,
    op: MatrixOp<P>,
) -> CircuitResult<MatrixOp<P>> {
    if c_indices.is_empty() {
        return Err(CircuitError::new("Must supply at least one control index"));
    }
    let num_c_indices = c_indices.len();
    if ctrl_state >= 1 << num_c_indices {
        let message = format!(
            "Control state {:?} does not fit in {:?} control qubits",
            ctrl_state, num_c_indices
        );
        return Err(CircuitError::new(message));
    }
    match op {
        MatrixOp::Control(num_oc_indices, oc_state, oo_indices, op) => {
            c_indices.extend(oo_indices);
            let ctrl_state = (ctrl_state << num_oc_indices) | oc_state;
            Ok(MatrixOp::Control(
                num_c_indices + num_oc_indices,
                ctrl_state,
                c_indices,
                op,
            ))
        }
        op => {
            c_indices.extend(op.indices());
            Ok(MatrixOp::Control(
                num_c_indices,
                ctrl_state,
                c_indices,
                Box::new(op),
            ))
        }
    }
}

/// Apply `op` to the `input`, storing the results in `output`. Both are full state vectors of
/// `n` qubits.
pub fn apply_op<P>(n: usize, op: &MatrixOp<P>, input: &[P], output: &mut [P])
where
    P: Clone + One + Zero + Sum + Mul<Output = P> + Send + Sync,
{
    let mat_indices = op.indices();
    let nindices = mat_indices.len();

    let row_fn = |(row, outputloc): (usize, &mut P)| {
        let matrow = full_to_sub(n, mat_indices, row);
        // Maps from a op matrix column (from 0 to 2^nindices) to the value at that column
        // for the row calculated above.
        let f = |(i, val): (usize, P)| -> P {
            let colbits = sub_to_full(n, mat_indices, i, row);
            val * input[colbits].clone()
        };
        *outputloc = op.sum_for_op_cols(nindices, matrow, f);
    };

    state_iter_mut!(output).enumerate().for_each(row_fn);
}

/// Conjugate transpose of a row-major `2^n x 2^n` matrix.
pub fn adjoint_matrix<P: Precision>(n: usize, mat: &[Complex<P>]) -> Vec<Complex<P>> {
    let side = 1 << n;
    (0..side * side)
        .map(|i| {
            let (row, col) = (i / side, i % side);
            mat[get_flat_index(n, col, row)].conj()
        })
        .collect()
}

/// Make a vector of complex numbers whose reals are given by `data`
pub fn from_reals<P: Precision>(data: &[P]) -> Vec<Complex<P>> {
    data.iter()
        .map(|x| Complex::<P> {
            re: *x,
            im: P::zero(),
        })
        .collect()
}

/// Make a vector of complex numbers whose reals are given by the first tuple entry in `data` and
/// whose imaginaries are from the second.
pub fn from_tuples<P: Precision>(data: &[(P, P)]) -> Vec<Complex<P>> {
    data.iter()
        .map(|(r, i)| Complex::<P> { re: *r, im: *i })
        .collect()
}

/// Build a unitary (row-major, `2^n x 2^n`) which maps `|0...0>` onto the normalized
/// `amplitudes`. The unitary is a Householder reflection times the phase of the first amplitude.
///
/// # Example
/// ```
/// use qip_cv::state_ops::matrix_ops::{from_reals, make_state_prep_matrix};
///
/// let mat = make_state_prep_matrix(&from_reals(&[0.0_f64, 1.0])).unwrap();
/// // First column is the target state.
/// assert!((mat[0].re - 0.0).abs() < 1e-12);
/// assert!((mat[2].re - 1.0).abs() < 1e-12);
/// ```
pub fn make_state_prep_matrix<P: Precision>(
    amplitudes: &[Complex<P>],
) -> CircuitResult<Vec<Complex<P>>> {
    let side = amplitudes.len();
    if side < 2 || !side.is_power_of_two() {
        let message = format!(
            "expected a power of two number of amplitudes, found {:?}",
            side
        );
        return Err(CircuitError::InvalidAmplitudes(message));
    }
    let norm = amplitudes
        .iter()
        .map(|c| c.norm_sqr())
        .sum::<P>()
        .sqrt();
    if norm <= P::epsilon() {
        return Err(CircuitError::InvalidAmplitudes(
            "amplitudes must have a nonzero norm".to_string(),
        ));
    }

    let first_norm = amplitudes[0].norm();
    let phase = if first_norm <= P::epsilon() {
        Complex::one()
    } else {
        amplitudes[0] / first_norm
    };
    // Target with the first amplitude rotated onto the positive reals.
    let target = amplitudes
        .iter()
        .map(|c| *c / (phase * norm))
        .collect::<Vec<_>>();
    let w = target
        .iter()
        .enumerate()
        .map(|(i, c)| if i == 0 { Complex::<P>::one() - *c } else { -*c })
        .collect::<Vec<_>>();
    let w_norm_sqr = w.iter().map(|c| c.norm_sqr()).sum::<P>();

    let two = P::one() + P::one();
    let mat = (0..side * side)
        .map(|i| {
            let (row, col) = (i / side, i % side);
            let delta = if row == col {
                Complex::one()
            } else {
                Complex::zero()
            };
            if w_norm_sqr <= P::epsilon() {
                phase * delta
            } else {
                phase * (delta - w[row] * w[col].conj() * two / w_norm_sqr)
            }
        })
        .collect();
    Ok(mat)
}
