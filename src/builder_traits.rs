use crate::errors::{CircuitError, CircuitResult};
use crate::state_ops::matrix_ops::make_state_prep_matrix;
use crate::types::Precision;
use num_complex::Complex;
use num_traits::{One, Zero};
use std::fmt::Debug;
use std::num::NonZeroUsize;

/// Standard functions needed by registers containing multiple qubits.
pub trait QubitRegister {
    /// Size of the register in qubits.
    fn n(&self) -> usize;
    /// Size of the register in qubits.
    fn n_nonzero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.n()).unwrap_or(NonZeroUsize::MIN)
    }
    /// Absolute indices represented by the register.
    fn indices(&self) -> &[usize];
}

/// Result of splitting a register in two.
#[derive(Debug)]
pub enum SplitResult<R: QubitRegister + Debug> {
    /// All registers were selected
    SELECTED(R),
    /// None of the registers were selected
    UNSELECTED(R),
    /// Some registers were selected, some were not selected.
    SPLIT(R, R),
}

/// Result of splitting a register into multiple registers.
#[derive(Debug)]
pub enum SplitManyResult<R: QubitRegister + Debug> {
    /// All registers were selected.
    AllSelected(Vec<R>),
    /// Some were selected, remaining were not.
    Remaining(Vec<R>, R),
}

/// A base-level circuit builder trait, requiring definitions of registers, base circuit objects,
/// and end-result quantum state.
pub trait CircuitBuilder {
    /// The register type used for the circuit.
    type Register: QubitRegister + Debug;
    /// The struct used to represent circuit objects.
    type CircuitObject;
    /// Return type for state calculations.
    type StateCalculation;

    /// Number of qubits in circuit.
    fn n(&self) -> usize;

    /// Construct a single qubit.
    fn qubit(&mut self) -> Self::Register {
        self.register(NonZeroUsize::MIN)
    }

    /// Construct a register with multiple qubits. Fails if n=0.
    fn qudit(&mut self, n: usize) -> Option<Self::Register> {
        NonZeroUsize::new(n).map(|n| self.register(n))
    }

    /// Construct a register with multiple qubits.
    fn register(&mut self, n: NonZeroUsize) -> Self::Register;

    /// Merge two registers into a single register with first the r1 indices, then the r2 indices.
    fn merge_two_registers(&mut self, r1: Self::Register, r2: Self::Register) -> Self::Register;

    /// Merge multiple registers together into a single register, returns None if none given.
    fn merge_registers<It>(&mut self, rs: It) -> Option<Self::Register>
    where
        It: IntoIterator<Item = Self::Register>,
    {
        rs.into_iter().fold(None, |acc, r1| match acc {
            Some(r2) => Some(self.merge_two_registers(r2, r1)),
            None => Some(r1),
        })
    }

    /// Split a register into two, selecting the relative indices from the `indices` iterator.
    fn split_register_relative<It>(
        &mut self,
        r: Self::Register,
        indices: It,
    ) -> SplitResult<Self::Register>
    where
        It: IntoIterator<Item = usize>;

    /// Split the register into `r.n()` individual registers of 1 qubit each.
    fn split_all_register(&mut self, r: Self::Register) -> Vec<Self::Register> {
        split_helper(self, r, vec![])
    }

    /// Split into multiple qubits, each with relative indices given by the sub-iterators.
    /// Fails if a relative index is out of range or selected twice.
    ///
    /// # Example
    /// ```
    /// use qip_cv::prelude::*;
    ///
    /// # fn main() -> CircuitResult<()> {
    /// let mut b = LocalBuilder::<f64>::default();
    /// let ra = b.qudit(5).unwrap();
    /// let rb = b.qudit(5).unwrap();
    /// assert_eq!(ra.indices(), &[0, 1, 2, 3, 4]);
    /// let split_res = b.split_relative_index_groups(rb, [[0, 1], [2, 3]])?;
    /// if let SplitManyResult::Remaining(groups, remaining) = split_res {
    ///     assert_eq!(groups[0].indices(), &[5, 6]);
    ///     assert_eq!(groups[1].indices(), &[7, 8]);
    ///     assert_eq!(remaining.indices(), &[9])
    /// } else {
    ///     panic!("Expected a remaining register");
    /// };
    /// # Ok(())
    /// # }
    /// ```
    fn split_relative_index_groups<
        It: IntoIterator<Item = Itt>,
        Itt: IntoIterator<Item = usize>,
    >(
        &mut self,
        r: Self::Register,
        indices: It,
    ) -> CircuitResult<SplitManyResult<Self::Register>> {
        let mut rs = self
            .split_all_register(r)
            .into_iter()
            .map(Some)
            .collect::<Vec<_>>();
        let mut selected_rs = vec![];
        for is in indices {
            let subrs = is
                .into_iter()
                .map(|i| {
                    rs.get_mut(i).and_then(Option::take).ok_or_else(|| {
                        CircuitError::RegisterInUse(format!(
                            "relative index {} missing or already selected",
                            i
                        ))
                    })
                })
                .collect::<CircuitResult<Vec<_>>>()?;
            if let Some(r) = self.merge_registers(subrs) {
                selected_rs.push(r);
            }
        }
        let remaining_rs = self.merge_registers(rs.into_iter().flatten());
        Ok(match remaining_rs {
            None => SplitManyResult::AllSelected(selected_rs),
            Some(r) => SplitManyResult::Remaining(selected_rs, r),
        })
    }

    /// Apply a circuit object to the circuit directly.
    fn apply_circuit_object(
        &mut self,
        r: Self::Register,
        c: Self::CircuitObject,
    ) -> CircuitResult<Self::Register>;

    /// Calculate the quantum state at the end of the circuit, using |0> as input.
    fn calculate_state(&mut self) -> CircuitResult<Self::StateCalculation> {
        self.calculate_state_with_init(None)
    }

    /// Calculate the state at the end of the circuit using an initial state given by each register
    /// and the classical state in that register. The first qubit of a register is the most
    /// significant bit of its value.
    fn calculate_state_with_init<'a, It>(
        &mut self,
        it: It,
    ) -> CircuitResult<Self::StateCalculation>
    where
        Self::Register: 'a,
        It: IntoIterator<Item = (&'a Self::Register, usize)>;
}

fn split_helper<CB>(cb: &mut CB, r: CB::Register, mut acc: Vec<CB::Register>) -> Vec<CB::Register>
where
    CB: CircuitBuilder + ?Sized,
{
    match cb.split_register_relative(r, Some(0)) {
        SplitResult::SELECTED(r) => {
            acc.push(r);
            acc
        }
        SplitResult::SPLIT(r0, r) => {
            acc.push(r0);
            split_helper(cb, r, acc)
        }
        SplitResult::UNSELECTED(_) => unreachable!(),
    }
}

/// Standard functions for building unitary circuits.
pub trait UnitaryBuilder<P: Precision>: CircuitBuilder {
    /// Apply an arbitrary matrix to the circuit given by a vector.
    fn apply_vec_matrix(
        &mut self,
        r: Self::Register,
        data: Vec<Complex<P>>,
    ) -> CircuitResult<Self::Register> {
        let n = r.n();
        self.apply_circuit_object(r, Self::vec_matrix_to_circuitobject(n, data))
    }

    /// Apply an arbitrary matrix to the circuit and attach a name to it.
    fn apply_labeled_vec_matrix(
        &mut self,
        r: Self::Register,
        data: Vec<Complex<P>>,
        label: &str,
    ) -> CircuitResult<Self::Register> {
        let n = r.n();
        let co = Self::labeled_vec_matrix_to_circuitobject(n, data, label);
        self.apply_circuit_object(r, co)
    }

    /// Make a circuit object out of an arbitrary matrix
    /// Single Qubit matrix is organized as  |0><0|, |0><1|, |1><0|, |1><1|
    fn matrix_to_circuitobject<const N: usize>(
        n: usize,
        data: [Complex<P>; N],
    ) -> Self::CircuitObject {
        Self::vec_matrix_to_circuitobject(n, data.to_vec())
    }

    /// Make a circuit object out of an arbitrary matrix
    /// Single Qubit matrix is organized as  |0><0|, |0><1|, |1><0|, |1><1|
    fn vec_matrix_to_circuitobject(n: usize, data: Vec<Complex<P>>) -> Self::CircuitObject;

    /// Make a named circuit object out of an arbitrary matrix. Builders which do not keep names
    /// drop the label.
    fn labeled_vec_matrix_to_circuitobject(
        n: usize,
        data: Vec<Complex<P>>,
        _label: &str,
    ) -> Self::CircuitObject {
        Self::vec_matrix_to_circuitobject(n, data)
    }
}

/// A Builder which can construct Clifford Circuit Elements.
pub trait CliffordTBuilder<P: Precision>: UnitaryBuilder<P> {
    /// Make a circuit object representing the X gate on a single qubit.
    /// Equivalent to calling `matrix_to_circuitobject` with \[0, 1, 1, 0\]
    fn make_x(&self) -> Self::CircuitObject {
        Self::matrix_to_circuitobject(
            1,
            [
                Complex::zero(),
                Complex::one(),
                Complex::one(),
                Complex::zero(),
            ],
        )
    }

    /// Make a circuit object representing the Y gate on a single qubit.
    /// Equivalent to calling `matrix_to_circuitobject` with \[0, -i, i, 0\]
    fn make_y(&self) -> Self::CircuitObject {
        Self::matrix_to_circuitobject(
            1,
            [
                Complex::zero(),
                -Complex::i(),
                Complex::i(),
                Complex::zero(),
            ],
        )
    }

    /// Make a circuit object representing the Z gate on a single qubit.
    /// Equivalent to calling `matrix_to_circuitobject` with \[1, 0, 0, -1\]
    fn make_z(&self) -> Self::CircuitObject {
        Self::matrix_to_circuitobject(
            1,
            [
                Complex::one(),
                Complex::zero(),
                Complex::zero(),
                -Complex::one(),
            ],
        )
    }

    /// Make a circuit object representing the H gate on a single qubit.
    /// Equivalent to calling `matrix_to_circuitobject` with \[1, 1, 1, -1\]/sqrt(2)
    fn make_h(&self) -> Self::CircuitObject {
        let l = Complex::one() * P::from(std::f64::consts::FRAC_1_SQRT_2).unwrap_or_else(P::zero);
        Self::matrix_to_circuitobject(1, [l, l, l, -l])
    }

    /// Make a circuit object representing the S (phase) gate on a single qubit.
    /// Equivalent to calling `matrix_to_circuitobject` with \[1, 0, 0, i\]
    fn make_s(&self) -> Self::CircuitObject {
        Self::matrix_to_circuitobject(
            1,
            [
                Complex::one(),
                Complex::zero(),
                Complex::zero(),
                Complex::i(),
            ],
        )
    }

    /// Make a circuit object representing the T gate on a single qubit.
    /// Equivalent to calling `matrix_to_circuitobject` with \[1, 0, 0, e^{i pi / 4} \]
    fn make_t(&self) -> Self::CircuitObject {
        let phase = P::from(std::f64::consts::FRAC_PI_4).unwrap_or_else(P::zero);
        Self::matrix_to_circuitobject(
            1,
            [
                Complex::one(),
                Complex::zero(),
                Complex::zero(),
                Complex::from_polar(P::one(), phase),
            ],
        )
    }

    /// Make a circuit object representing the CNOT gate on a pair of qubits
    /// Equivalent to calling `matrix_to_circuitobject` with \[ I, 0, 0, X \]
    /// where I is the identity matrix and X is the x-gate.
    fn make_cnot(&self) -> Self::CircuitObject {
        let l = Complex::one();
        let o = Complex::zero();
        Self::matrix_to_circuitobject(2, [l, o, o, o, o, l, o, o, o, o, o, l, o, o, l, o])
    }

    /// Create and apply an X (or NOT) gate circuit object.
    fn x(&mut self, r: Self::Register) -> CircuitResult<Self::Register> {
        self.apply_circuit_object(r, self.make_x())
    }

    /// Create and apply a Y gate circuit object.
    fn y(&mut self, r: Self::Register) -> CircuitResult<Self::Register> {
        self.apply_circuit_object(r, self.make_y())
    }

    /// Create and apply a Z gate circuit object.
    fn z(&mut self, r: Self::Register) -> CircuitResult<Self::Register> {
        self.apply_circuit_object(r, self.make_z())
    }

    /// Create and apply an H gate circuit object.
    fn h(&mut self, r: Self::Register) -> CircuitResult<Self::Register> {
        self.apply_circuit_object(r, self.make_h())
    }

    /// Create and apply a T gate circuit object.
    fn t(&mut self, r: Self::Register) -> CircuitResult<Self::Register> {
        self.apply_circuit_object(r, self.make_t())
    }

    /// Create and apply an S gate circuit object.
    fn s(&mut self, r: Self::Register) -> CircuitResult<Self::Register> {
        self.apply_circuit_object(r, self.make_s())
    }

    /// Create and apply a CNOT gate circuit object, one per qubit of `r`.
    fn cnot(
        &mut self,
        cr: Self::Register,
        r: Self::Register,
    ) -> CircuitResult<(Self::Register, Self::Register)> {
        if cr.n() > 1 {
            return Err(CircuitError::new(
                "Clifford CNOT can only have a single control qubit.",
            ));
        }
        let rs = self.split_all_register(r);
        let (cr, rs) = rs.into_iter().try_fold((cr, vec![]), |(cr, mut acc), r| {
            let r = self.merge_two_registers(cr, r);
            let circuit_object = self.make_cnot();
            let r = self.apply_circuit_object(r, circuit_object)?;
            let (cr, r) = match self.split_register_relative(r, Some(0)) {
                SplitResult::SPLIT(cr, r) => (cr, r),
                SplitResult::SELECTED(_) => unreachable!(),
                SplitResult::UNSELECTED(_) => unreachable!(),
            };
            acc.push(r);
            Ok::<_, CircuitError>((cr, acc))
        })?;
        let r = self
            .merge_registers(rs)
            .ok_or_else(|| CircuitError::new("CNOT requires a target register"))?;
        Ok((cr, r))
    }
}

/// A builder that can take destructive measurements.
pub trait MeasurementBuilder: CircuitBuilder {
    /// Handle which points to measurements.
    type MeasurementHandle;
    /// Take a measurement of `r`, return `r` and a handle to fetch the result later.
    fn measure(&mut self, r: Self::Register) -> (Self::Register, Self::MeasurementHandle);
}

/// A builder which can reset registers and prepare them in arbitrary states.
pub trait ResetBuilder<P: Precision>: UnitaryBuilder<P> {
    /// Reset `r` to `|0...0>`. The register is measured, the state collapses, and the measured
    /// value is moved onto zero.
    fn reset(&mut self, r: Self::Register) -> CircuitResult<Self::Register>;

    /// Reset `r` then prepare it in the normalized state given by `amplitudes`, indexed by the
    /// register value (first qubit most significant).
    fn initialize(
        &mut self,
        r: Self::Register,
        amplitudes: &[Complex<P>],
    ) -> CircuitResult<Self::Register> {
        let expected = 1 << r.n();
        if amplitudes.len() != expected {
            return Err(CircuitError::InvalidAmplitudes(format!(
                "register of {} qubits needs {} amplitudes, found {}",
                r.n(),
                expected,
                amplitudes.len()
            )));
        }
        let mat = make_state_prep_matrix(amplitudes)?;
        let r = self.reset(r)?;
        self.apply_labeled_vec_matrix(r, mat, "Initialize")
    }
}

/// A builder which can export its circuit for use later, and can apply a circuit to itself.
pub trait Subcircuitable: CircuitBuilder {
    /// The export type for the circuit.
    type Subcircuit;

    /// Export the circuit as a subcircuit if able.
    fn make_subcircuit(&self) -> CircuitResult<Self::Subcircuit>;
    /// Append the subcircuit to the register `r`.
    fn apply_subcircuit(
        &mut self,
        sc: Self::Subcircuit,
        r: Self::Register,
    ) -> CircuitResult<Self::Register>;
}

/// Create the matrix for the circuit given by `r`, one row per initial value of `r`.
pub fn make_circuit_matrix<CB, P, F>(
    cb: &mut CB,
    r: &CB::Register,
    f: F,
) -> CircuitResult<Vec<Vec<Complex<P>>>>
where
    CB: CircuitBuilder,
    P: Precision,
    F: Fn(CB::StateCalculation) -> Vec<Complex<P>>,
{
    (0..1 << r.n())
        .map(|indx| cb.calculate_state_with_init(Some((r, indx))).map(&f))
        .collect()
}
