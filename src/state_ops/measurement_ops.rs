use crate::utils::{full_to_sub, sub_to_full};
use crate::{Complex, Precision};
use num_traits::Zero;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Get total magnitude of state.
pub fn prob_magnitude<P: Precision>(input: &[Complex<P>]) -> P {
    state_iter!(input).map(Complex::<P>::norm_sqr).sum()
}

/// Calculate the probability of a given measurement. `measured` gives the value read from the
/// qubits at `indices`, the first index being the most significant bit. `input` gives the state
/// from which to measure, representing a total of `n` qubits.
///
/// Keep in mind that qubits are big-endian to match kron product standards.
/// `|abc>` means `q0=a`, `q1=b`, `q2=c`
///
/// # Examples
/// ```
/// use qip_cv::state_ops::matrix_ops::from_reals;
/// use qip_cv::state_ops::measurement_ops::measure_prob;
///
/// // Make the state |10>, index 0 is always |1> and index 1 is always |0>
/// let input = from_reals(&[0.0, 0.0, 1.0, 0.0]);
///
/// let p = measure_prob(2, 0, &[0], &input);
/// assert_eq!(p, 0.0);
///
/// let p = measure_prob(2, 1, &[0], &input);
/// assert_eq!(p, 1.0);
///
/// let p = measure_prob(2, 0b10, &[0, 1], &input);
/// assert_eq!(p, 1.0);
///
/// let p = measure_prob(2, 0b01, &[1, 0], &input);
/// assert_eq!(p, 1.0);
/// ```
pub fn measure_prob<P: Precision>(
    n: usize,
    measured: usize,
    indices: &[usize],
    input: &[Complex<P>],
) -> P {
    state_iter!(input)
        .enumerate()
        .filter(|(row, _)| full_to_sub(n, indices, *row) == measured)
        .map(|(_, c)| c.norm_sqr())
        .sum()
}

/// Get probability for each possible measurement of `indices` on `input`.
pub fn measure_probs<P: Precision>(n: usize, indices: &[usize], input: &[Complex<P>]) -> Vec<P> {
    input
        .iter()
        .enumerate()
        .fold(vec![P::zero(); 1 << indices.len()], |mut acc, (row, c)| {
            acc[full_to_sub(n, indices, row)] += c.norm_sqr();
            acc
        })
}

/// Sample a measurement from a state `input`.
/// Sample from qubits at `indices` and return the value they hold, first index most
/// significant. See `measure_prob` for details.
///
/// # Examples
/// ```
/// use qip_cv::state_ops::matrix_ops::from_reals;
/// use qip_cv::state_ops::measurement_ops::soft_measure;
///
/// // Make the state |10>, index 0 is always |1> and index 1 is always |0>
/// let input = from_reals(&[0.0, 0.0, 1.0, 0.0]);
///
/// assert_eq!(soft_measure(2, &[0], &input), 1);
/// assert_eq!(soft_measure(2, &[1], &input), 0);
/// assert_eq!(soft_measure(2, &[0, 1], &input), 0b10);
/// assert_eq!(soft_measure(2, &[1, 0], &input), 0b01);
/// ```
pub fn soft_measure<P: Precision>(n: usize, indices: &[usize], input: &[Complex<P>]) -> usize {
    let total = prob_magnitude(input);
    let mut r = P::from(rand::random::<f64>()).unwrap_or_else(P::zero) * total;
    // Rounding may leave some probability unclaimed, fall back on the last populated row.
    let mut measured_indx = input
        .iter()
        .rposition(|c| !c.is_zero())
        .unwrap_or_default();
    for (i, c) in input.iter().enumerate() {
        let p = c.norm_sqr();
        if p.is_zero() {
            continue;
        }
        r -= p;
        if r <= P::zero() {
            measured_indx = i;
            break;
        }
    }
    full_to_sub(n, indices, measured_indx)
}

/// A set of measured results we want to receive (used to avoid the randomness of measurement if
/// a given result is desired).
#[derive(Debug, Clone, Copy)]
pub struct MeasuredCondition<P: Precision> {
    /// Value which was measured
    pub measured: usize,
    /// Chance of having received that value if known.
    pub prob: Option<P>,
}

/// Selects a measured state from `input`, then calls `measure_state` to manipulate the output.
/// Returns the measured state and probability.
pub fn measure<P: Precision>(
    n: usize,
    indices: &[usize],
    input: &[Complex<P>],
    output: &mut [Complex<P>],
    measured: Option<MeasuredCondition<P>>,
) -> (usize, P) {
    let m = match &measured {
        Some(measured) => measured.measured,
        None => soft_measure(n, indices, input),
    };
    let p = match measured.and_then(|m| m.prob) {
        Some(p) => p,
        None => measure_prob(n, m, indices, input),
    };
    let measured = (m, p);

    measure_state(n, indices, measured, input, output);
    measured
}

/// Normalize the output state such that it matches only states which produce the `measured`
/// result and has the same magnitude.
/// This is done by zeroing out the states which cannot give `measured`, and dividing the remaining
/// by the `sqrt(p)` for p=`measured_prob`. See `measure_prob` for details.
pub fn measure_state<P: Precision>(
    n: usize,
    indices: &[usize],
    measured: (usize, P),
    input: &[Complex<P>],
    output: &mut [Complex<P>],
) {
    let (measured, measured_prob) = measured;
    let p_mult = if measured_prob.is_zero() {
        P::zero()
    } else {
        P::one() / measured_prob.sqrt()
    };

    state_iter_mut!(output)
        .enumerate()
        .for_each(|(row, out)| {
            *out = if full_to_sub(n, indices, row) == measured {
                input[row] * p_mult
            } else {
                Complex::zero()
            };
        });
}

/// Move the amplitudes of a register holding `measured` onto the register value `0`. `input`
/// must already be collapsed onto `measured`, see `measure_state`.
pub fn reset_state<P: Precision>(
    n: usize,
    indices: &[usize],
    measured: usize,
    input: &[Complex<P>],
    output: &mut [Complex<P>],
) {
    state_iter_mut!(output)
        .enumerate()
        .for_each(|(row, out)| {
            *out = if full_to_sub(n, indices, row) == 0 {
                input[sub_to_full(n, indices, measured, row)]
            } else {
                Complex::zero()
            };
        });
}

#[cfg(test)]
mod measurement_tests {
    use super::*;
    use crate::state_ops::matrix_ops::from_reals;

    #[test]
    fn test_measure_probs() {
        let s = 0.5f64;
        // |00> + |01> + |10> + |11> with weights 0.25, 0.25, 0.5, 0.0
        let input = from_reals(&[s, s, (0.5f64).sqrt(), 0.0]);
        let probs = measure_probs(2, &[0], &input);
        assert!((probs[0] - 0.5).abs() < 1e-12);
        assert!((probs[1] - 0.5).abs() < 1e-12);

        let probs = measure_probs(2, &[1, 0], &input);
        assert!((probs[0b00] - 0.25).abs() < 1e-12);
        assert!((probs[0b10] - 0.25).abs() < 1e-12);
        assert!((probs[0b01] - 0.5).abs() < 1e-12);
        assert!(probs[0b11].abs() < 1e-12);
    }

    #[test]
    fn test_measure_state() {
        let s = 1.0 / 2f64.sqrt();
        let input = from_reals(&[s, 0.0, 0.0, s]);
        let mut output = input.clone();
        let (m, p) = measure(2, &[0], &input, &mut output, None);
        assert!((p - 0.5).abs() < 1e-12);
        let expected = if m == 0 {
            from_reals(&[1.0, 0.0, 0.0, 0.0])
        } else {
            from_reals(&[0.0, 0.0, 0.0, 1.0])
        };
        output
            .iter()
            .zip(expected.iter())
            .for_each(|(a, b)| assert!((a - b).norm() < 1e-12));
    }

    #[test]
    fn test_forced_measurement() {
        let s = 1.0 / 2f64.sqrt();
        let input = from_reals(&[s, s]);
        let mut output = input.clone();
        let condition = MeasuredCondition {
            measured: 1,
            prob: None,
        };
        let (m, p) = measure(1, &[0], &input, &mut output, Some(condition));
        assert_eq!(m, 1);
        assert!((p - 0.5).abs() < 1e-12);
        assert!((output[1].re - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_reset_state() {
        // |q0 q1> = |1 1> -> reset q1 -> |1 0>
        let input = from_reals(&[0.0, 0.0, 0.0, 1.0]);
        let mut output = input.clone();
        reset_state(2, &[1], 1, &input, &mut output);
        assert_eq!(output, from_reals(&[0.0, 0.0, 1.0, 0.0]));
    }
}
