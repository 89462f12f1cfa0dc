use crate::errors::{CircuitError, CircuitResult};
use crate::types::Precision;
use crate::utils::qubits_for_cutoff;
use crate::Complex;
use ndarray::Array2;
use num_traits::{One, Zero};
use std::ops::Range;

/// Largest number of qubits a single qumode may be stored in. Gate matrices on one qumode are
/// dense with `4^k` entries.
pub const MAX_QUBITS_PER_MODE: usize = 12;

/// A register of qumodes, each stored in a fixed number of qubits.
///
/// Qumode `i` owns qubits `[i * k, (i + 1) * k)` of the register where `k` is
/// `num_qubits_per_mode`. The Fock number of a qumode is the binary value of its qubits, first
/// qubit most significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QumodeRegister {
    num_qumodes: usize,
    num_qubits_per_mode: usize,
    cutoff: usize,
}

impl QumodeRegister {
    /// A register of `num_qumodes` qumodes with `num_qubits_per_mode` qubits each, giving a cutoff
    /// of `2^num_qubits_per_mode`.
    pub fn new(num_qumodes: usize, num_qubits_per_mode: usize) -> CircuitResult<Self> {
        if num_qumodes == 0 {
            return Err(CircuitError::InvalidRegister(
                "register needs at least one qumode".to_string(),
            ));
        }
        if num_qubits_per_mode == 0 || num_qubits_per_mode > MAX_QUBITS_PER_MODE {
            return Err(CircuitError::InvalidRegister(format!(
                "cannot hold a qumode in {} qubits, expected 1 to {}",
                num_qubits_per_mode, MAX_QUBITS_PER_MODE
            )));
        }
        match num_qumodes.checked_mul(num_qubits_per_mode) {
            Some(n) if n < usize::BITS as usize => {}
            _ => {
                return Err(CircuitError::InvalidRegister(format!(
                    "{} qumodes of {} qubits do not fit in a state vector",
                    num_qumodes, num_qubits_per_mode
                )))
            }
        }
        Ok(Self {
            num_qumodes,
            num_qubits_per_mode,
            cutoff: 1 << num_qubits_per_mode,
        })
    }

    /// A register of `num_qumodes` qumodes with `cutoff` levels each, stored in
    /// `ceil(log2(cutoff))` qubits per qumode.
    pub fn with_cutoff(num_qumodes: usize, cutoff: usize) -> CircuitResult<Self> {
        if cutoff < 2 {
            return Err(CircuitError::InvalidRegister(format!(
                "cutoff must be at least 2, found {}",
                cutoff
            )));
        }
        let register = Self::new(num_qumodes, qubits_for_cutoff(cutoff))?;
        Ok(Self { cutoff, ..register })
    }

    /// Number of qumodes.
    pub fn num_qumodes(&self) -> usize {
        self.num_qumodes
    }

    /// Number of qubits holding each qumode.
    pub fn num_qubits_per_mode(&self) -> usize {
        self.num_qubits_per_mode
    }

    /// Number of Fock levels of each qumode.
    pub fn cutoff(&self) -> usize {
        self.cutoff
    }

    /// Total number of qubits in the register.
    pub fn size(&self) -> usize {
        self.num_qumodes * self.num_qubits_per_mode
    }

    /// Qubits of the register which hold `qumode`.
    pub fn qubit_indices(&self, qumode: usize) -> CircuitResult<Range<usize>> {
        if qumode >= self.num_qumodes {
            return Err(CircuitError::QumodeOutOfRange {
                index: qumode,
                num_qumodes: self.num_qumodes,
            });
        }
        let start = qumode * self.num_qubits_per_mode;
        Ok(start..start + self.num_qubits_per_mode)
    }

    /// The qumode holding qubit `qubit` of the register.
    pub fn qumode_of_qubit(&self, qubit: usize) -> Option<usize> {
        if qubit < self.size() {
            Some(qubit / self.num_qubits_per_mode)
        } else {
            None
        }
    }

    /// Fock number of each of `num_modes` qumodes packed in `index`, first qumode in the most
    /// significant qubits. Levels at or above the cutoff give `None`.
    fn fock_numbers(&self, num_modes: usize, index: usize) -> Option<usize> {
        let k = self.num_qubits_per_mode;
        let mask = (1 << k) - 1;
        (0..num_modes).try_fold(0, |acc, mode| {
            let level = (index >> (k * (num_modes - 1 - mode))) & mask;
            if level < self.cutoff {
                Some(acc * self.cutoff + level)
            } else {
                None
            }
        })
    }

    /// Embed an operator on `num_modes` qumodes, of size `cutoff^num_modes` with rows indexed
    /// by the Fock numbers (first qumode most significant), into the `2^(num_modes * k)`
    /// dimensional qubit space. Levels which only exist in the qubit space are left unchanged.
    /// Returns the row-major matrix.
    pub fn embed_operator<P: Precision>(
        &self,
        op: &Array2<Complex<P>>,
        num_modes: usize,
    ) -> CircuitResult<Vec<Complex<P>>> {
        let too_large = || {
            CircuitError::new(format!(
                "operator on {} qumodes is too large to embed",
                num_modes
            ))
        };
        let fock_dim = u32::try_from(num_modes)
            .ok()
            .and_then(|m| self.cutoff.checked_pow(m))
            .ok_or_else(too_large)?;
        let side = num_modes
            .checked_mul(self.num_qubits_per_mode)
            .and_then(|n| u32::try_from(n).ok())
            .and_then(|n| 1usize.checked_shl(n))
            .ok_or_else(too_large)?;
        let entries = side.checked_mul(side).ok_or_else(too_large)?;
        if op.dim() != (fock_dim, fock_dim) {
            return Err(CircuitError::new(format!(
                "operator on {} qumodes must be {}x{}, found {:?}",
                num_modes,
                fock_dim,
                fock_dim,
                op.dim()
            )));
        }
        if side == fock_dim {
            return Ok(op.iter().cloned().collect());
        }
        let fock_indices = (0..side)
            .map(|i| self.fock_numbers(num_modes, i))
            .collect::<Vec<_>>();
        let mat = (0..entries)
            .map(|i| {
                let (row, col) = (i / side, i % side);
                match (fock_indices[row], fock_indices[col]) {
                    (Some(frow), Some(fcol)) => op[[frow, fcol]],
                    _ if row == col => Complex::one(),
                    _ => Complex::zero(),
                }
            })
            .collect();
        Ok(mat)
    }
}
