/// Get the index into an op matrix stored row-major.
#[inline]
pub fn get_flat_index(nindices: usize, i: usize, j: usize) -> usize {
    let mat_side = 1 << nindices;
    (i * mat_side) + j
}

/// Flips the bits in `num` from `i`th position to `(n-i)`th position.
///
/// # Example
///
/// ```
/// use qip_cv::utils::flip_bits;
///
/// assert_eq!(flip_bits(3, 0b100), 0b001);
/// assert_eq!(flip_bits(3, 0b010), 0b010);
/// assert_eq!(flip_bits(4, 0b1010), 0b0101);
/// ```
#[inline]
pub fn flip_bits(n: usize, num: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let leading_zeros = 8 * size_of::<usize>() - n;
    num.reverse_bits() >> leading_zeros
}

/// Set the `bit_index` bit in `num` to `value`.
///
/// # Example
/// ```
/// use qip_cv::utils::set_bit;
/// assert_eq!(set_bit(0, 1, true), 2);
/// assert_eq!(set_bit(1, 1, true), 3);
/// assert_eq!(set_bit(1, 0, false), 0);
/// ```
#[inline]
pub fn set_bit(num: usize, bit_index: usize, value: bool) -> usize {
    let v = 1 << bit_index;
    if value {
        num | v
    } else {
        num & !v
    }
}

/// Get the `bit_index` bit value from `num`.
///
/// # Example
/// ```
/// use qip_cv::utils::get_bit;
/// assert!(get_bit(2, 1));
/// ```
#[inline]
pub fn get_bit(num: usize, bit_index: usize) -> bool {
    ((num >> bit_index) & 1) != 0
}

/// Read the value held by the qubits at `indices` out of the state index `full_index` of an `n`
/// qubit state. The first entry of `indices` is the most significant bit of the result.
///
/// Qubits are big-endian within the state: `|abc>` means `q0=a`, `q1=b`, `q2=c`.
///
/// # Example
/// ```
/// use qip_cv::utils::full_to_sub;
///
/// // |q0 q1 q2> = |101>
/// assert_eq!(full_to_sub(3, &[0, 2], 0b101), 0b11);
/// assert_eq!(full_to_sub(3, &[1, 0], 0b101), 0b01);
/// ```
pub fn full_to_sub(n: usize, indices: &[usize], full_index: usize) -> usize {
    let nindices = indices.len();
    indices
        .iter()
        .enumerate()
        .fold(0, |acc, (j, indx)| -> usize {
            let bit = get_bit(full_index, n - 1 - *indx);
            set_bit(acc, nindices - 1 - j, bit)
        })
}

/// Write the value `sub_index` into the qubits at `indices` of the state index `base`. Inverse
/// of [`full_to_sub`] on the selected qubits, all other bits of `base` are kept.
///
/// # Example
/// ```
/// use qip_cv::utils::sub_to_full;
///
/// assert_eq!(sub_to_full(3, &[0, 2], 0b11, 0b000), 0b101);
/// assert_eq!(sub_to_full(3, &[0], 0b0, 0b111), 0b011);
/// ```
pub fn sub_to_full(n: usize, indices: &[usize], sub_index: usize, base: usize) -> usize {
    let nindices = indices.len();
    indices.iter().enumerate().fold(base, |acc, (j, indx)| {
        let bit = get_bit(sub_index, nindices - 1 - j);
        set_bit(acc, n - 1 - *indx, bit)
    })
}

/// Number of qubits needed to hold `cutoff` levels, `ceil(log2(cutoff))`.
///
/// # Example
/// ```
/// use qip_cv::utils::qubits_for_cutoff;
///
/// assert_eq!(qubits_for_cutoff(2), 1);
/// assert_eq!(qubits_for_cutoff(4), 2);
/// assert_eq!(qubits_for_cutoff(5), 3);
/// ```
pub fn qubits_for_cutoff(cutoff: usize) -> usize {
    if cutoff <= 1 {
        0
    } else {
        (usize::BITS - (cutoff - 1).leading_zeros()) as usize
    }
}

#[cfg(test)]
mod utils_tests {
    use super::*;

    #[test]
    fn test_get_bit() {
        assert!(!get_bit(1, 1));
        assert!(get_bit(1, 0));
    }

    #[test]
    fn test_set_bit() {
        assert_eq!(set_bit(1, 0, true), 1);
        assert_eq!(set_bit(1, 1, true), 3);
    }

    #[test]
    fn test_sub_full_inverse() {
        let n = 5;
        let indices = [3, 1, 4];
        (0..1 << indices.len()).for_each(|sub| {
            let full = sub_to_full(n, &indices, sub, 0);
            assert_eq!(full_to_sub(n, &indices, full), sub);
        });
    }

    #[test]
    fn test_qubits_for_cutoff() {
        assert_eq!(qubits_for_cutoff(1), 0);
        assert_eq!(qubits_for_cutoff(3), 2);
        assert_eq!(qubits_for_cutoff(8), 3);
        assert_eq!(qubits_for_cutoff(9), 4);
    }
}
