use std::num::NonZeroUsize;

use num_traits::{One, Zero};
use tracing::{debug, trace};

use crate::builder_traits::*;
use crate::conditioning::{Conditionable, ConditionableSubcircuit};
use crate::errors::{CircuitError, CircuitResult};
use crate::inverter::Invertable;
use crate::iterators::MatrixOp;
use crate::state_ops::matrix_ops::{adjoint_matrix, apply_op, make_control_op, make_matrix_op};
use crate::state_ops::measurement_ops::{measure, reset_state};
use crate::types::Precision;
use crate::utils::sub_to_full;
use crate::Complex;

/// A local circuit builder for constructing circuits out of standard gates and dense matrices,
/// and for running them on a state vector.
#[derive(Default, Debug)]
pub struct LocalBuilder<P: Precision> {
    pipeline: Vec<(Vec<usize>, BuilderCircuitObject<P>)>,
    n: usize,
    measurements: usize,
}

impl<P: Precision> LocalBuilder<P> {
    /// Returns the depth of the current circuit (pipeline).
    pub fn pipeline_depth(&self) -> usize {
        self.pipeline.len()
    }

    /// The instructions attached so far, with the qubits each one acts on.
    pub fn instructions(&self) -> &[(Vec<usize>, BuilderCircuitObject<P>)] {
        &self.pipeline
    }

    /// Number of measurements attached so far.
    pub fn num_measurements(&self) -> usize {
        self.measurements
    }
}

/// The register implementation for the LocalBuilder.
#[derive(Debug)]
pub struct Qudit {
    indices: Vec<usize>,
}

impl QubitRegister for Qudit {
    fn n(&self) -> usize {
        self.indices.len()
    }

    fn indices(&self) -> &[usize] {
        self.indices.as_ref()
    }
}

impl Qudit {
    fn new_from_iter<It>(indices: It) -> Option<Self>
    where
        It: IntoIterator<Item = usize>,
    {
        let indices = indices.into_iter().collect::<Vec<_>>();
        if indices.is_empty() {
            None
        } else {
            Some(Self { indices })
        }
    }
}

/// A pipeline object for the LocalBuilder.
#[derive(Debug, Clone, PartialEq)]
pub struct BuilderCircuitObject<P: Precision> {
    n: usize,
    label: Option<String>,
    object: BuilderCircuitObjectType<P>,
}

impl<P: Precision> BuilderCircuitObject<P> {
    /// Number of qubits the object acts on.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Name attached to the object, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// What the object does.
    pub fn object(&self) -> &BuilderCircuitObjectType<P> {
        &self.object
    }

    fn unitary(n: usize, object: UnitaryMatrixObject<P>) -> Self {
        Self {
            n,
            label: None,
            object: BuilderCircuitObjectType::Unitary(object),
        }
    }
}

/// The type of pipeline object for LocalBuilder.
#[derive(Debug, Clone, PartialEq)]
pub enum BuilderCircuitObjectType<P: Precision> {
    /// A unitary operation on the circuit.
    Unitary(UnitaryMatrixObject<P>),
    /// Performs a single measurement and collapses the wavefunction.
    Measurement,
    /// Measures, collapses, then moves the register back to `|0...0>`.
    Reset,
}

/// The type of unitary matrix for LocalBuilder.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitaryMatrixObject<P: Precision> {
    /// A pauli X gate.
    X,
    /// A pauli Y gate.
    Y,
    /// A pauli Z gate.
    Z,
    /// A hadamard gate.
    H,
    /// A conditional phase gate by pi/2.
    S,
    /// A conditional phase gate by pi/4.
    T,
    /// A controlled pauli X gate, first qubit is control.
    CNOT,
    /// A Generic Matrix
    MAT(Vec<Complex<P>>),
    /// `op` applied to the trailing qubits when the leading `num_controls` qubits hold
    /// `ctrl_state`.
    Controlled {
        /// Number of leading control qubits.
        num_controls: usize,
        /// Value the control qubits must hold, first control most significant.
        ctrl_state: usize,
        /// Unitary applied to the remaining qubits.
        op: Box<UnitaryMatrixObject<P>>,
    },
}

/// A series of measurement results at the end of the circuit.
#[derive(Debug)]
pub struct Measurements<P: Precision> {
    measurements: Vec<(usize, P)>,
}

impl<P: Precision> Measurements<P> {
    /// Get a measurement result given a handle: the measured value and its likelihood.
    pub fn get_measurement(&self, handle: MeasurementHandle) -> (usize, P) {
        self.measurements[handle.id]
    }

    /// Number of measurements which were taken.
    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    /// Whether the circuit took no measurements.
    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }
}

/// Build the op for `object` acting on `indices`.
fn make_unitary_op<P: Precision>(
    indices: Vec<usize>,
    object: &UnitaryMatrixObject<P>,
) -> CircuitResult<MatrixOp<Complex<P>>> {
    let l = Complex::one();
    let o = Complex::zero();
    let i = Complex::i();
    match object {
        UnitaryMatrixObject::X => make_matrix_op(indices, vec![o, l, l, o]),
        UnitaryMatrixObject::Y => make_matrix_op(indices, vec![o, -i, i, o]),
        UnitaryMatrixObject::Z => make_matrix_op(indices, vec![l, o, o, -l]),
        UnitaryMatrixObject::H => {
            let nl = l * P::from(std::f64::consts::FRAC_1_SQRT_2).unwrap_or_else(P::zero);
            make_matrix_op(indices, vec![nl, nl, nl, -nl])
        }
        UnitaryMatrixObject::S => make_matrix_op(indices, vec![l, o, o, i]),
        UnitaryMatrixObject::T => {
            let t = Complex::from_polar(
                P::one(),
                P::from(std::f64::consts::FRAC_PI_4).unwrap_or_else(P::zero),
            );
            make_matrix_op(indices, vec![l, o, o, t])
        }
        UnitaryMatrixObject::CNOT => {
            let (cindex, indices) = indices.split_at(1);
            make_control_op(
                cindex.to_vec(),
                1,
                make_matrix_op(indices.to_vec(), vec![o, l, l, o])?,
            )
        }
        UnitaryMatrixObject::MAT(data) => make_matrix_op(indices, data.clone()),
        UnitaryMatrixObject::Controlled {
            num_controls,
            ctrl_state,
            op,
        } => {
            if *num_controls >= indices.len() {
                return Err(CircuitError::new(
                    "Controlled object needs at least one target qubit",
                ));
            }
            let (cindices, indices) = indices.split_at(*num_controls);
            let op = make_unitary_op(indices.to_vec(), op)?;
            make_control_op(cindices.to_vec(), *ctrl_state, op)
        }
    }
}

impl<P: Precision> CircuitBuilder for LocalBuilder<P> {
    type Register = Qudit;
    type CircuitObject = BuilderCircuitObject<P>;
    type StateCalculation = (Vec<Complex<P>>, Measurements<P>);

    fn n(&self) -> usize {
        self.n
    }

    fn register(&mut self, n: NonZeroUsize) -> Self::Register {
        let n: usize = n.into();
        let r = Qudit {
            indices: (self.n..self.n + n).collect(),
        };
        self.n += n;
        r
    }

    fn merge_two_registers(&mut self, r1: Self::Register, r2: Self::Register) -> Self::Register {
        let mut indices = r1.indices;
        indices.extend(r2.indices);
        Qudit { indices }
    }

    fn split_register_relative<It>(
        &mut self,
        r: Self::Register,
        indices: It,
    ) -> SplitResult<Self::Register>
    where
        It: IntoIterator<Item = usize>,
    {
        let selected_indices = indices
            .into_iter()
            .filter_map(|i| r.indices.get(i).cloned());
        let r1 = Qudit::new_from_iter(selected_indices);

        let remaining_indices = r.indices.into_iter().filter(|oi| match &r1 {
            Some(r1) => !r1.indices.contains(oi),
            None => true,
        });
        let r2 = Qudit::new_from_iter(remaining_indices);

        match (r1, r2) {
            (Some(r1), None) => SplitResult::SELECTED(r1),
            (None, Some(r2)) => SplitResult::UNSELECTED(r2),
            (Some(r1), Some(r2)) => SplitResult::SPLIT(r1, r2),
            (None, None) => unreachable!(),
        }
    }

    fn apply_circuit_object(
        &mut self,
        r: Self::Register,
        c: Self::CircuitObject,
    ) -> CircuitResult<Self::Register> {
        if let BuilderCircuitObjectType::Unitary(UnitaryMatrixObject::MAT(data)) = &c.object {
            if data.len() != 1 << (2 * c.n) {
                return Err(CircuitError::new(format!(
                    "Matrix has {} entries but acts on {} qubits",
                    data.len(),
                    c.n
                )));
            }
        }
        if c.n == 1 && r.n() > 1 {
            // Do broadcasting
            let rs = self.split_all_register(r);
            rs.iter()
                .for_each(|r| self.pipeline.push((r.indices.clone(), c.clone())));
            self.merge_registers(rs)
                .ok_or_else(|| CircuitError::new("Cannot broadcast onto an empty register"))
        } else if c.n == r.n() {
            trace!(indices = ?r.indices, label = ?c.label, "attaching circuit object");
            self.pipeline.push((r.indices.clone(), c));
            Ok(r)
        } else {
            Err(CircuitError::new(
                "Matrix has incorrect N and cannot be broadcast",
            ))
        }
    }

    fn calculate_state_with_init<'a, It>(
        &mut self,
        it: It,
    ) -> CircuitResult<Self::StateCalculation>
    where
        Self::Register: 'a,
        It: IntoIterator<Item = (&'a Self::Register, usize)>,
    {
        let n = self.n();
        let initial_index = it
            .into_iter()
            .fold(0, |acc, (r, x)| sub_to_full(n, &r.indices, x, acc));
        debug!(
            n,
            depth = self.pipeline.len(),
            initial_index,
            "simulating circuit"
        );

        let mut state = vec![Complex::zero(); 1 << n];
        state[initial_index] = Complex::one();
        let mut arena = state.clone();
        let mut measurements = vec![];

        for (step, (indices, obj)) in self.pipeline.iter().enumerate() {
            trace!(step, ?indices, label = ?obj.label, "applying pipeline object");
            match &obj.object {
                BuilderCircuitObjectType::Unitary(object) => {
                    let uop = make_unitary_op(indices.clone(), object)?;
                    apply_op(n, &uop, &state, &mut arena);
                    std::mem::swap(&mut state, &mut arena);
                }
                BuilderCircuitObjectType::Measurement => {
                    let measured = measure(n, indices, &state, &mut arena, None);
                    measurements.push(measured);
                    std::mem::swap(&mut state, &mut arena);
                }
                BuilderCircuitObjectType::Reset => {
                    let (measured, _) = measure(n, indices, &state, &mut arena, None);
                    reset_state(n, indices, measured, &arena, &mut state);
                }
            }
        }
        Ok((state, Measurements { measurements }))
    }
}

impl<P: Precision> UnitaryBuilder<P> for LocalBuilder<P> {
    fn vec_matrix_to_circuitobject(n: usize, data: Vec<Complex<P>>) -> Self::CircuitObject {
        BuilderCircuitObject::unitary(n, UnitaryMatrixObject::MAT(data))
    }

    fn labeled_vec_matrix_to_circuitobject(
        n: usize,
        data: Vec<Complex<P>>,
        label: &str,
    ) -> Self::CircuitObject {
        BuilderCircuitObject {
            label: Some(label.to_string()),
            ..Self::vec_matrix_to_circuitobject(n, data)
        }
    }
}

impl<P: Precision> CliffordTBuilder<P> for LocalBuilder<P> {
    fn make_x(&self) -> Self::CircuitObject {
        BuilderCircuitObject::unitary(1, UnitaryMatrixObject::X)
    }
    fn make_y(&self) -> Self::CircuitObject {
        BuilderCircuitObject::unitary(1, UnitaryMatrixObject::Y)
    }
    fn make_z(&self) -> Self::CircuitObject {
        BuilderCircuitObject::unitary(1, UnitaryMatrixObject::Z)
    }
    fn make_h(&self) -> Self::CircuitObject {
        BuilderCircuitObject::unitary(1, UnitaryMatrixObject::H)
    }
    fn make_s(&self) -> Self::CircuitObject {
        BuilderCircuitObject::unitary(1, UnitaryMatrixObject::S)
    }
    fn make_t(&self) -> Self::CircuitObject {
        BuilderCircuitObject::unitary(1, UnitaryMatrixObject::T)
    }
    fn make_cnot(&self) -> Self::CircuitObject {
        BuilderCircuitObject::unitary(2, UnitaryMatrixObject::CNOT)
    }
}

/// A handle which points to a measurement result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementHandle {
    id: usize,
}

impl<P: Precision> MeasurementBuilder for LocalBuilder<P> {
    type MeasurementHandle = MeasurementHandle;

    fn measure(&mut self, r: Self::Register) -> (Self::Register, Self::MeasurementHandle) {
        let obj = BuilderCircuitObject {
            n: r.n(),
            label: None,
            object: BuilderCircuitObjectType::Measurement,
        };
        self.pipeline.push((r.indices.clone(), obj));
        let m = self.measurements;
        self.measurements += 1;
        (r, Self::MeasurementHandle { id: m })
    }
}

impl<P: Precision> ResetBuilder<P> for LocalBuilder<P> {
    fn reset(&mut self, r: Self::Register) -> CircuitResult<Self::Register> {
        let obj = BuilderCircuitObject {
            n: r.n(),
            label: Some("Reset".to_string()),
            object: BuilderCircuitObjectType::Reset,
        };
        self.pipeline.push((r.indices.clone(), obj));
        Ok(r)
    }
}

impl<P: Precision> Conditionable for LocalBuilder<P> {
    fn try_apply_with_condition(
        &mut self,
        cr: Self::Register,
        ctrl_state: usize,
        r: Self::Register,
        co: Self::CircuitObject,
    ) -> CircuitResult<(Self::Register, Self::Register)> {
        let BuilderCircuitObject { n, label, object } = co;
        let op = match object {
            BuilderCircuitObjectType::Unitary(op) => op,
            BuilderCircuitObjectType::Measurement | BuilderCircuitObjectType::Reset => {
                return Err(CircuitError::new("Cannot condition measurements."))
            }
        };
        if ctrl_state >= 1 << cr.n() {
            return Err(CircuitError::new(format!(
                "Control state {} does not fit in {} control qubits",
                ctrl_state,
                cr.n()
            )));
        }
        if n == 1 && r.n() > 1 {
            // Broadcast the condition over each qubit.
            let rs = self.split_all_register(r);
            let (cr, rs) = rs.into_iter().try_fold((cr, vec![]), |(cr, mut acc), r| {
                let co = BuilderCircuitObject {
                    n,
                    label: label.clone(),
                    object: BuilderCircuitObjectType::Unitary(op.clone()),
                };
                let (cr, r) = self.try_apply_with_condition(cr, ctrl_state, r, co)?;
                acc.push(r);
                Ok::<_, CircuitError>((cr, acc))
            })?;
            let r = self
                .merge_registers(rs)
                .ok_or_else(|| CircuitError::new("Cannot broadcast onto an empty register"))?;
            return Ok((cr, r));
        }
        if n != r.n() {
            return Err(CircuitError::new(
                "Matrix has incorrect N and cannot be broadcast",
            ));
        }

        let num_controls = cr.n();
        let r = self.merge_two_registers(cr, r);
        let co = BuilderCircuitObject {
            n: r.n(),
            label,
            object: BuilderCircuitObjectType::Unitary(UnitaryMatrixObject::Controlled {
                num_controls,
                ctrl_state,
                op: Box::new(op),
            }),
        };
        let r = self.apply_circuit_object(r, co)?;
        match self.split_register_relative(r, 0..num_controls) {
            SplitResult::SPLIT(cr, r) => Ok((cr, r)),
            SplitResult::SELECTED(_) => unreachable!(),
            SplitResult::UNSELECTED(_) => unreachable!(),
        }
    }
}

impl<P: Precision> Subcircuitable for LocalBuilder<P> {
    type Subcircuit = Vec<(Vec<usize>, Self::CircuitObject)>;

    fn make_subcircuit(&self) -> CircuitResult<Self::Subcircuit> {
        Ok(self.pipeline.clone())
    }

    fn apply_subcircuit(
        &mut self,
        sc: Self::Subcircuit,
        r: Self::Register,
    ) -> CircuitResult<Self::Register> {
        apply_pipeline_objects(self, sc, r)
    }
}

impl<P: Precision> Invertable for LocalBuilder<P> {
    type SimilarBuilder = Self;

    fn new_similar(&self) -> Self {
        Self::default()
    }

    fn invert_subcircuit(sc: Self::Subcircuit) -> CircuitResult<Self::Subcircuit> {
        sc.into_iter()
            .rev()
            .try_fold(vec![], |mut acc, (indices, co)| {
                invert_circuit_object(co)?
                    .into_iter()
                    .for_each(|co| acc.push((indices.clone(), co)));
                Ok(acc)
            })
    }
}

impl<P: Precision> ConditionableSubcircuit for LocalBuilder<P> {
    fn apply_conditioned_subcircuit(
        &mut self,
        sc: Self::Subcircuit,
        cr: Self::Register,
        ctrl_state: usize,
        r: Self::Register,
    ) -> CircuitResult<(Self::Register, Self::Register)> {
        let mut cb = self.condition_with_state(cr, ctrl_state)?;
        let r = apply_pipeline_objects(&mut cb, sc, r)?;
        let cr = cb.dissolve()?;
        Ok((cr, r))
    }
}

/// Apply the pipeline `sc` onto `r`, subcircuit index `i` being qubit `i` of `r`.
fn apply_pipeline_objects<CB, CO>(
    cb: &mut CB,
    sc: Vec<(Vec<usize>, CO)>,
    r: CB::Register,
) -> CircuitResult<CB::Register>
where
    CB: CircuitBuilder<CircuitObject = CO>,
{
    let rn = r.n();
    let max_index = sc.iter().flat_map(|(indices, _)| indices.iter().max()).max();
    if let Some(max_index) = max_index {
        if *max_index >= rn {
            return Err(CircuitError::new(format!(
                "Subcircuit uses qubit {} but the register only has {} qubits",
                max_index, rn
            )));
        }
    }
    let mut rs = cb
        .split_all_register(r)
        .into_iter()
        .map(Some)
        .collect::<Vec<_>>();
    for (indices, co) in sc {
        let sub_rs = indices
            .iter()
            .map(|index| {
                rs[*index].take().ok_or_else(|| {
                    CircuitError::RegisterInUse(format!(
                        "subcircuit object uses qubit {} twice",
                        index
                    ))
                })
            })
            .collect::<CircuitResult<Vec<_>>>()?;
        let sub_r = cb
            .merge_registers(sub_rs)
            .ok_or_else(|| CircuitError::new("Subcircuit object acts on no qubits"))?;
        let sub_r = cb.apply_circuit_object(sub_r, co)?;
        let sub_rs = cb.split_all_register(sub_r);
        indices
            .into_iter()
            .zip(sub_rs)
            .for_each(|(index, r)| rs[index] = Some(r));
    }
    let rs = rs
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| CircuitError::new("Not all qubits returned by subcircuit"))?;
    cb.merge_registers(rs)
        .ok_or_else(|| CircuitError::new("Subcircuit applied to an empty register"))
}

/// Inverse of a unitary acting on `n` qubits, as a sequence of unitaries.
fn invert_unitary<P: Precision>(
    n: usize,
    u: UnitaryMatrixObject<P>,
) -> Vec<UnitaryMatrixObject<P>> {
    match u {
        UnitaryMatrixObject::X
        | UnitaryMatrixObject::Y
        | UnitaryMatrixObject::Z
        | UnitaryMatrixObject::H
        | UnitaryMatrixObject::CNOT => vec![u],
        UnitaryMatrixObject::S => vec![UnitaryMatrixObject::Z, u],
        UnitaryMatrixObject::T => vec![UnitaryMatrixObject::Z, UnitaryMatrixObject::S, u],
        // Matrix is unitary, inverse is just dagger
        UnitaryMatrixObject::MAT(data) => vec![UnitaryMatrixObject::MAT(adjoint_matrix(n, &data))],
        UnitaryMatrixObject::Controlled {
            num_controls,
            ctrl_state,
            op,
        } => invert_unitary(n - num_controls, *op)
            .into_iter()
            .map(|op| UnitaryMatrixObject::Controlled {
                num_controls,
                ctrl_state,
                op: Box::new(op),
            })
            .collect(),
    }
}

fn invert_circuit_object<P: Precision>(
    co: BuilderCircuitObject<P>,
) -> CircuitResult<Vec<BuilderCircuitObject<P>>> {
    let BuilderCircuitObject { n, label, object } = co;
    match object {
        BuilderCircuitObjectType::Unitary(u) => Ok(invert_unitary(n, u)
            .into_iter()
            .map(|new_obj| BuilderCircuitObject {
                n,
                label: label.clone(),
                object: BuilderCircuitObjectType::Unitary(new_obj),
            })
            .collect()),
        BuilderCircuitObjectType::Measurement | BuilderCircuitObjectType::Reset => {
            Err(CircuitError::new("Cannot invert measurement."))
        }
    }
}

#[cfg(test)]
mod builder_tests {
    use super::*;
    use crate::state_ops::matrix_ops::from_reals;

    fn assert_state_eq(a: &[Complex<f64>], b: &[Complex<f64>]) {
        assert_eq!(a.len(), b.len());
        a.iter()
            .zip(b)
            .for_each(|(a, b)| assert!((a - b).norm() < 1e-10, "{:?} != {:?}", a, b));
    }

    #[test]
    fn test_initial_value_msb_first() -> CircuitResult<()> {
        let mut b = LocalBuilder::<f64>::default();
        let r = b.qudit(2).unwrap();
        let (state, _) = b.calculate_state_with_init([(&r, 0b10)])?;
        assert_state_eq(&state, &from_reals(&[0.0, 0.0, 1.0, 0.0]));
        Ok(())
    }

    #[test]
    fn test_broadcast_x() -> CircuitResult<()> {
        let mut b = LocalBuilder::<f64>::default();
        let r = b.qudit(2).unwrap();
        let _r = b.x(r)?;
        assert_eq!(b.pipeline_depth(), 2);
        let (state, _) = b.calculate_state()?;
        assert_state_eq(&state, &from_reals(&[0.0, 0.0, 0.0, 1.0]));
        Ok(())
    }

    #[test]
    fn test_conditioned_on_zero() -> CircuitResult<()> {
        let mut b = LocalBuilder::<f64>::default();
        let cr = b.qubit();
        let r = b.qubit();
        let mut cb = b.condition_with_state(cr, 0)?;
        let _r = cb.x(r)?;
        let _cr = cb.dissolve()?;
        let (state, _) = b.calculate_state()?;
        assert_state_eq(&state, &from_reals(&[0.0, 1.0, 0.0, 0.0]));
        Ok(())
    }

    #[test]
    fn test_nested_condition() -> CircuitResult<()> {
        let mut b = LocalBuilder::<f64>::default();
        let ca = b.qubit();
        let cb_r = b.qubit();
        let r = b.qubit();
        let ca = b.x(ca)?;
        let mut outer = b.condition_with(ca);
        let mut inner = outer.condition_with_state(cb_r, 0)?;
        let _r = inner.x(r)?;
        let _cb_r = inner.dissolve()?;
        let _ca = outer.dissolve()?;
        let (state, _) = b.calculate_state()?;
        // |1 0 1>
        let mut expected = vec![Complex::zero(); 8];
        expected[0b101] = Complex::one();
        assert_state_eq(&state, &expected);
        Ok(())
    }

    #[test]
    fn test_condition_measurement_fails() {
        let mut b = LocalBuilder::<f64>::default();
        let cr = b.qubit();
        let r = b.qubit();
        let co = BuilderCircuitObject {
            n: 1,
            label: None,
            object: BuilderCircuitObjectType::Measurement,
        };
        assert!(b.try_apply_with_condition(cr, 1, r, co).is_err());
    }

    #[test]
    fn test_reset() -> CircuitResult<()> {
        let mut b = LocalBuilder::<f64>::default();
        let ra = b.qubit();
        let rb = b.qubit();
        let ra = b.x(ra)?;
        let rb = b.h(rb)?;
        let rb = b.reset(rb)?;
        let (state, _) = b.calculate_state()?;
        assert_state_eq(&state, &from_reals(&[0.0, 0.0, 1.0, 0.0]));
        drop((ra, rb));
        Ok(())
    }

    #[test]
    fn test_initialize() -> CircuitResult<()> {
        let mut b = LocalBuilder::<f64>::default();
        let r = b.qudit(2).unwrap();
        let r = b.x(r)?;
        let amps = from_reals(&[0.0, 0.6, 0.8, 0.0]);
        let _r = b.initialize(r, &amps)?;
        let (state, _) = b.calculate_state()?;
        assert_state_eq(&state, &amps);
        Ok(())
    }

    #[test]
    fn test_initialize_wrong_length() {
        let mut b = LocalBuilder::<f64>::default();
        let r = b.qudit(2).unwrap();
        let err = b.initialize(r, &from_reals(&[1.0, 0.0])).unwrap_err();
        assert!(matches!(err, CircuitError::InvalidAmplitudes(_)));
    }

    #[test]
    fn test_subcircuit_out_of_range() -> CircuitResult<()> {
        let mut sub = LocalBuilder::<f64>::default();
        let r = sub.qudit(2).unwrap();
        let _r = sub.x(r)?;
        let sc = sub.make_subcircuit()?;

        let mut b = LocalBuilder::<f64>::default();
        let r = b.qubit();
        assert!(b.apply_subcircuit(sc, r).is_err());
        Ok(())
    }

    #[test]
    fn test_invert_measurement_fails() {
        let mut b = LocalBuilder::<f64>::default();
        let r = b.qubit();
        let (_r, _m) = b.measure(r);
        let sc = b.make_subcircuit().unwrap();
        assert!(LocalBuilder::<f64>::invert_subcircuit(sc).is_err());
    }

    #[test]
    fn test_labels_survive_subcircuits() -> CircuitResult<()> {
        let mut sub = LocalBuilder::<f64>::default();
        let r = sub.qubit();
        let mat = from_reals(&[0.0, 1.0, 1.0, 0.0]);
        let _r = sub.apply_labeled_vec_matrix(r, mat, "flip")?;
        let sc = sub.make_subcircuit()?;

        let mut b = LocalBuilder::<f64>::default();
        let r = b.qubit();
        let _r = b.apply_subcircuit(sc, r)?;
        assert_eq!(b.instructions()[0].1.label(), Some("flip"));
        Ok(())
    }
}
