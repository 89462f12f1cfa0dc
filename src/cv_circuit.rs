//! Hybrid circuits of qumodes and qubits.
//!
//! A [`CvCircuit`] owns a [`LocalBuilder`] holding first the qubits of every qumode, then the
//! plain qubits. Gates on qumodes are dense unitaries fetched from [`CvOperators`] and embedded
//! in the qubits of the qumodes they act on.

use crate::builder::{BuilderCircuitObject, LocalBuilder, MeasurementHandle, Qudit};
use crate::builder_traits::*;
use crate::conditioning::Conditionable;
use crate::errors::{CircuitError, CircuitResult};
use crate::inverter::Invertable;
use crate::operators::CvOperators;
use crate::qumode::QumodeRegister;
use crate::state_ops::matrix_ops::make_state_prep_matrix;
use crate::state_ops::measurement_ops::measure_probs;
use crate::types::{Precision, Representation};
use crate::utils::flip_bits;
use crate::Complex;
use ndarray::Array2;
use num_traits::{One, Zero};
use tracing::debug;

/// A wire of the circuit: a single qubit or all the qubits of a qumode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wire {
    Qubit(usize),
    Qumode(usize),
}

/// A circuit of qumodes, qubits and classical slots.
#[derive(Debug)]
pub struct CvCircuit<P: Precision> {
    name: Option<String>,
    builder: LocalBuilder<P>,
    qmr: QumodeRegister,
    ops: CvOperators<P>,
    qumodes: Vec<Option<Qudit>>,
    qubits: Vec<Option<Qudit>>,
    clbits: Vec<Option<MeasurementHandle>>,
}

/// A reusable piece of circuit acting on some qubits followed by some qumodes.
#[derive(Debug, Clone)]
pub struct CvInstruction<P: Precision> {
    name: String,
    num_qubits: usize,
    num_qumodes: usize,
    width: usize,
    subcircuit: Vec<(Vec<usize>, BuilderCircuitObject<P>)>,
}

impl<P: Precision> CvInstruction<P> {
    /// Name of the instruction.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of plain qubits the instruction expects, placed first.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Number of qumodes the instruction expects, placed after the qubits.
    pub fn num_qumodes(&self) -> usize {
        self.num_qumodes
    }

    /// Total number of qubits the instruction acts on.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Objects of the instruction with indices relative to its wires.
    pub fn instructions(&self) -> &[(Vec<usize>, BuilderCircuitObject<P>)] {
        &self.subcircuit
    }

    /// The inverse instruction: objects in reverse order, each replaced by its inverse.
    pub fn inverse(&self) -> CircuitResult<Self> {
        let subcircuit = LocalBuilder::<P>::invert_subcircuit(self.subcircuit.clone())?;
        Ok(Self {
            name: format!("{}_dg", self.name),
            subcircuit,
            ..self.clone()
        })
    }
}

impl<P: Precision> CvCircuit<P> {
    /// A circuit with the qumodes of `qmr`, `num_qubits` plain qubits and `num_clbits`
    /// classical slots.
    pub fn new(qmr: QumodeRegister, num_qubits: usize, num_clbits: usize) -> Self {
        let mut builder = LocalBuilder::default();
        let qumodes = (0..qmr.num_qumodes())
            .map(|_| builder.qudit(qmr.num_qubits_per_mode()))
            .collect();
        let qubits = (0..num_qubits).map(|_| Some(builder.qubit())).collect();
        Self {
            name: None,
            builder,
            qmr,
            ops: CvOperators::new(qmr.cutoff()),
            qumodes,
            qubits,
            clbits: vec![None; num_clbits],
        }
    }

    /// Same as `new` with a name for the circuit.
    pub fn named(qmr: QumodeRegister, num_qubits: usize, num_clbits: usize, name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::new(qmr, num_qubits, num_clbits)
        }
    }

    /// Name of the circuit, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The qumode register.
    pub fn qmr(&self) -> &QumodeRegister {
        &self.qmr
    }

    /// The operators used to build gates, at the register cutoff.
    pub fn ops(&self) -> &CvOperators<P> {
        &self.ops
    }

    /// Number of plain qubits.
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Number of classical slots.
    pub fn num_clbits(&self) -> usize {
        self.clbits.len()
    }

    /// The underlying circuit builder.
    pub fn builder(&self) -> &LocalBuilder<P> {
        &self.builder
    }

    /// Absolute qubit index of plain qubit `qubit`.
    pub fn qubit_index(&self, qubit: usize) -> CircuitResult<usize> {
        self.wire_size(Wire::Qubit(qubit))?;
        Ok(self.qmr.size() + qubit)
    }

    fn wire_size(&self, wire: Wire) -> CircuitResult<usize> {
        match wire {
            Wire::Qubit(index) if index < self.qubits.len() => Ok(1),
            Wire::Qubit(index) => Err(CircuitError::QubitOutOfRange {
                index,
                num_qubits: self.qubits.len(),
            }),
            Wire::Qumode(index) => self.qmr.qubit_indices(index).map(|r| r.len()),
        }
    }

    fn slot(&mut self, wire: Wire) -> &mut Option<Qudit> {
        match wire {
            Wire::Qubit(index) => &mut self.qubits[index],
            Wire::Qumode(index) => &mut self.qumodes[index],
        }
    }

    /// Size in qubits of each of `wires`, failing on unknown, repeated or missing wires.
    fn check_wires(&mut self, wires: &[Wire]) -> CircuitResult<Vec<usize>> {
        let sizes = wires
            .iter()
            .map(|w| self.wire_size(*w))
            .collect::<CircuitResult<Vec<_>>>()?;
        for (i, wire) in wires.iter().enumerate() {
            if wires[..i].contains(wire) {
                return Err(CircuitError::RegisterInUse(format!("{:?}", wire)));
            }
            if self.slot(*wire).is_none() {
                return Err(CircuitError::RegisterInUse(format!(
                    "{:?} was lost by an earlier failure",
                    wire
                )));
            }
        }
        Ok(sizes)
    }

    /// Merge the registers of `wires` in order, hand them to `f`, then put them back. Every
    /// wire is checked before anything is attached. Registers handed to a failing `f` are
    /// lost, so callers validate the arguments of `f` first.
    fn apply_on<F>(&mut self, wires: &[Wire], f: F) -> CircuitResult<()>
    where
        F: FnOnce(&mut LocalBuilder<P>, Qudit) -> CircuitResult<Qudit>,
    {
        let sizes = self.check_wires(wires)?;
        let rs = wires
            .iter()
            .filter_map(|w| self.slot(*w).take())
            .collect::<Vec<_>>();
        let r = self
            .builder
            .merge_registers(rs)
            .ok_or_else(|| CircuitError::new("Operation needs at least one wire"))?;
        let r = f(&mut self.builder, r)?;

        let (_, ranges) = sizes.iter().fold((0, vec![]), |(n, mut acc), size| {
            acc.push(n..n + size);
            (n + size, acc)
        });
        let rs = match self.builder.split_relative_index_groups(r, ranges)? {
            SplitManyResult::AllSelected(rs) => rs,
            SplitManyResult::Remaining(_, _) => unreachable!(),
        };
        wires
            .iter()
            .zip(rs)
            .for_each(|(w, r)| *self.slot(*w) = Some(r));
        Ok(())
    }

    fn one_hot(&self, n: usize) -> Vec<Complex<P>> {
        let mut vector = vec![Complex::zero(); 1 << self.qmr.num_qubits_per_mode()];
        vector[n] = Complex::one();
        vector
    }

    fn check_fock(&self, n: usize) -> CircuitResult<()> {
        if n >= self.qmr.cutoff() {
            Err(CircuitError::FockStateOutOfRange {
                n,
                cutoff: self.qmr.cutoff(),
            })
        } else {
            Ok(())
        }
    }

    /// Initialize qumode `i` to the Fock state `fock_states[i]`. Nothing is attached unless every
    /// entry is below the cutoff.
    pub fn cv_initialize(&mut self, fock_states: &[usize]) -> CircuitResult<()> {
        if fock_states.len() > self.qmr.num_qumodes() {
            return Err(CircuitError::QumodeOutOfRange {
                index: self.qmr.num_qumodes(),
                num_qumodes: self.qmr.num_qumodes(),
            });
        }
        fock_states.iter().try_for_each(|n| self.check_fock(*n))?;
        fock_states
            .iter()
            .enumerate()
            .try_for_each(|(qumode, n)| self.cv_initialize_qumode(*n, qumode))
    }

    /// Initialize a single qumode to the Fock state `n`.
    pub fn cv_initialize_qumode(&mut self, n: usize, qumode: usize) -> CircuitResult<()> {
        self.check_fock(n)?;
        let vector = self.one_hot(n);
        debug!(qumode, n, "initializing qumode");
        self.apply_on(&[Wire::Qumode(qumode)], |b, r| b.initialize(r, &vector))
    }

    /// Reset a plain qubit and prepare it in the state given by `amplitudes`.
    pub fn initialize(&mut self, amplitudes: &[Complex<P>], qubit: usize) -> CircuitResult<()> {
        if amplitudes.len() != 2 {
            return Err(CircuitError::InvalidAmplitudes(format!(
                "a qubit needs 2 amplitudes, found {}",
                amplitudes.len()
            )));
        }
        make_state_prep_matrix(amplitudes)?;
        debug!(qubit, "initializing qubit");
        self.apply_on(&[Wire::Qubit(qubit)], |b, r| b.initialize(r, amplitudes))
    }

    /// Apply an operator on the Fock space of `qumodes` (size `cutoff^m` for `m` qumodes, first
    /// qumode most significant), labeled `label`.
    pub fn cv_unitary(
        &mut self,
        op: &Array2<Complex<P>>,
        qumodes: &[usize],
        label: &str,
    ) -> CircuitResult<()> {
        let wires = qumodes.iter().map(|q| Wire::Qumode(*q)).collect::<Vec<_>>();
        self.check_wires(&wires)?;
        let mat = self.qmr.embed_operator(op, qumodes.len())?;
        debug!(label, ?qumodes, "attaching cv gate");
        self.apply_on(&wires, |b, r| b.apply_labeled_vec_matrix(r, mat, label))
    }

    /// Beamsplitter between `qumode_a` and `qumode_b`.
    pub fn cv_bs(&mut self, theta: P, phi: P, qumode_a: usize, qumode_b: usize) -> CircuitResult<()> {
        let op = self.ops.bs(theta, phi);
        self.cv_unitary(&op, &[qumode_a, qumode_b], "BS")
    }

    /// Displacement of `qumode` by `alpha`.
    pub fn cv_d(&mut self, alpha: Complex<P>, qumode: usize) -> CircuitResult<()> {
        let op = self.ops.d(alpha);
        self.cv_unitary(&op, &[qumode], "D")
    }

    /// Phase space rotation of `qumode` by `theta`.
    pub fn cv_r(&mut self, theta: P, qumode: usize) -> CircuitResult<()> {
        let op = self.ops.r(theta);
        self.cv_unitary(&op, &[qumode], "R")
    }

    /// Squeezing of `qumode` by `z`.
    pub fn cv_s(&mut self, z: Complex<P>, qumode: usize) -> CircuitResult<()> {
        let op = self.ops.s(z);
        self.cv_unitary(&op, &[qumode], "S")
    }

    /// Two mode squeezing of `qumode_a` and `qumode_b` by `z`.
    pub fn cv_s2(&mut self, z: Complex<P>, qumode_a: usize, qumode_b: usize) -> CircuitResult<()> {
        let op = self.ops.s2(z);
        self.cv_unitary(&op, &[qumode_a, qumode_b], "S2")
    }

    /// Build an instruction on one control qubit followed by `m` qumodes which applies `op_a`
    /// when the control is `|0>` and `op_b` when it is `|1>`. Both operators act on the Fock
    /// space of the same qumodes.
    pub fn cv_conditional(
        &self,
        name: &str,
        op_a: &Array2<Complex<P>>,
        op_b: &Array2<Complex<P>>,
    ) -> CircuitResult<CvInstruction<P>> {
        if op_a.dim() != op_b.dim() {
            return Err(CircuitError::new(format!(
                "conditional operators differ in size: {:?} and {:?}",
                op_a.dim(),
                op_b.dim()
            )));
        }
        let cutoff = self.qmr.cutoff();
        let (dim, _) = op_a.dim();
        let mut num_qumodes = 1;
        let mut fock_dim = cutoff;
        while fock_dim < dim {
            fock_dim *= cutoff;
            num_qumodes += 1;
        }
        if fock_dim != dim {
            return Err(CircuitError::new(format!(
                "operator of size {} does not act on qumodes of cutoff {}",
                dim, cutoff
            )));
        }
        let mat_a = self.qmr.embed_operator(op_a, num_qumodes)?;
        let mat_b = self.qmr.embed_operator(op_b, num_qumodes)?;
        let num_targets = num_qumodes * self.qmr.num_qubits_per_mode();

        let mut b = LocalBuilder::<P>::default();
        let mut ctrl = b.qubit();
        let mut target = b
            .qudit(num_targets)
            .ok_or_else(|| CircuitError::new("conditional needs at least one qumode"))?;
        for (ctrl_state, mat) in [(0, mat_a), (1, mat_b)] {
            let mut cb = b.condition_with_state(ctrl, ctrl_state)?;
            target = cb.apply_labeled_vec_matrix(target, mat, name)?;
            ctrl = cb.dissolve()?;
        }
        debug_assert_eq!(ctrl.n() + target.n(), b.n());

        debug!(name, num_qumodes, "built conditional instruction");
        Ok(CvInstruction {
            name: name.to_string(),
            num_qubits: 1,
            num_qumodes,
            width: 1 + num_targets,
            subcircuit: b.make_subcircuit()?,
        })
    }

    /// Apply `instruction` on `qubits` followed by the qubits of `qumodes`.
    pub fn append(
        &mut self,
        instruction: &CvInstruction<P>,
        qubits: &[usize],
        qumodes: &[usize],
    ) -> CircuitResult<()> {
        let width = qubits.len() + qumodes.len() * self.qmr.num_qubits_per_mode();
        if width != instruction.width
            || qubits.len() != instruction.num_qubits
            || qumodes.len() != instruction.num_qumodes
        {
            return Err(CircuitError::new(format!(
                "instruction {} expects {} qubits and {} qumodes ({} wires), found {} qubits and {} qumodes",
                instruction.name,
                instruction.num_qubits,
                instruction.num_qumodes,
                instruction.width,
                qubits.len(),
                qumodes.len()
            )));
        }
        let wires = qubits
            .iter()
            .map(|q| Wire::Qubit(*q))
            .chain(qumodes.iter().map(|q| Wire::Qumode(*q)))
            .collect::<Vec<_>>();
        debug!(name = instruction.name.as_str(), ?qubits, ?qumodes, "appending instruction");
        let subcircuit = instruction.subcircuit.clone();
        self.apply_on(&wires, |b, r| b.apply_subcircuit(subcircuit, r))
    }

    /// Displace `qumode` by `alpha` if `ctrl` is `|0>` and by `beta` if it is `|1>`.
    pub fn cv_cnd_d(
        &mut self,
        alpha: Complex<P>,
        beta: Complex<P>,
        ctrl: usize,
        qumode: usize,
    ) -> CircuitResult<()> {
        let instruction = self.cv_conditional("Dc", &self.ops.d(alpha), &self.ops.d(beta))?;
        self.append(&instruction, &[ctrl], &[qumode])
    }

    /// Squeeze `qumode` by `z_a` if `ctrl` is `|0>` and by `z_b` if it is `|1>`.
    pub fn cv_cnd_s(
        &mut self,
        z_a: Complex<P>,
        z_b: Complex<P>,
        ctrl: usize,
        qumode: usize,
    ) -> CircuitResult<()> {
        let instruction = self.cv_conditional("Sc", &self.ops.s(z_a), &self.ops.s(z_b))?;
        self.append(&instruction, &[ctrl], &[qumode])
    }

    /// Rotate `qumode` by `theta_a` if `ctrl` is `|0>` and by `theta_b` if it is `|1>`.
    pub fn cv_cnd_r(&mut self, theta_a: P, theta_b: P, ctrl: usize, qumode: usize) -> CircuitResult<()> {
        let instruction = self.cv_conditional("Rc", &self.ops.r(theta_a), &self.ops.r(theta_b))?;
        self.append(&instruction, &[ctrl], &[qumode])
    }

    /// Beamsplitter by `theta_a` if `ctrl` is `|0>` and by `theta_b` if it is `|1>`.
    pub fn cv_cnd_bs(
        &mut self,
        theta_a: P,
        theta_b: P,
        ctrl: usize,
        qumode_a: usize,
        qumode_b: usize,
    ) -> CircuitResult<()> {
        let phi = P::zero();
        let instruction = self.cv_conditional(
            "BSc",
            &self.ops.bs(theta_a, phi),
            &self.ops.bs(theta_b, phi),
        )?;
        self.append(&instruction, &[ctrl], &[qumode_a, qumode_b])
    }

    /// Pauli X on a plain qubit.
    pub fn x(&mut self, qubit: usize) -> CircuitResult<()> {
        self.apply_on(&[Wire::Qubit(qubit)], |b, r| b.x(r))
    }

    /// Pauli Y on a plain qubit.
    pub fn y(&mut self, qubit: usize) -> CircuitResult<()> {
        self.apply_on(&[Wire::Qubit(qubit)], |b, r| b.y(r))
    }

    /// Pauli Z on a plain qubit.
    pub fn z(&mut self, qubit: usize) -> CircuitResult<()> {
        self.apply_on(&[Wire::Qubit(qubit)], |b, r| b.z(r))
    }

    /// Hadamard on a plain qubit.
    pub fn h(&mut self, qubit: usize) -> CircuitResult<()> {
        self.apply_on(&[Wire::Qubit(qubit)], |b, r| b.h(r))
    }

    /// S gate on a plain qubit.
    pub fn s(&mut self, qubit: usize) -> CircuitResult<()> {
        self.apply_on(&[Wire::Qubit(qubit)], |b, r| b.s(r))
    }

    /// T gate on a plain qubit.
    pub fn t(&mut self, qubit: usize) -> CircuitResult<()> {
        self.apply_on(&[Wire::Qubit(qubit)], |b, r| b.t(r))
    }

    /// CNOT between two plain qubits.
    pub fn cnot(&mut self, ctrl: usize, target: usize) -> CircuitResult<()> {
        self.apply_on(&[Wire::Qubit(ctrl), Wire::Qubit(target)], |b, r| {
            let co = b.make_cnot();
            b.apply_circuit_object(r, co)
        })
    }

    fn measure_wire(&mut self, wire: Wire, clbit: usize) -> CircuitResult<()> {
        if clbit >= self.clbits.len() {
            return Err(CircuitError::ClbitOutOfRange {
                index: clbit,
                num_clbits: self.clbits.len(),
            });
        }
        let mut handle = None;
        self.apply_on(&[wire], |b, r| {
            let (r, h) = b.measure(r);
            handle = Some(h);
            Ok(r)
        })?;
        self.clbits[clbit] = handle;
        Ok(())
    }

    /// Measure a plain qubit into classical slot `clbit`.
    pub fn measure(&mut self, qubit: usize, clbit: usize) -> CircuitResult<()> {
        self.measure_wire(Wire::Qubit(qubit), clbit)
    }

    /// Measure the Fock number of a qumode into classical slot `clbit`.
    pub fn cv_measure(&mut self, qumode: usize, clbit: usize) -> CircuitResult<()> {
        self.measure_wire(Wire::Qumode(qumode), clbit)
    }

    /// Run the circuit from `|0...0>`.
    pub fn calculate_state(&mut self) -> CircuitResult<CvState<P>> {
        debug!(name = ?self.name, "running cv circuit");
        let (state, measurements) = self.builder.calculate_state()?;
        let clbits = self
            .clbits
            .iter()
            .map(|h| h.map(|h| measurements.get_measurement(h)))
            .collect();
        Ok(CvState {
            n: self.builder.n(),
            qmr: self.qmr,
            state,
            clbits,
        })
    }
}

/// The result of running a [`CvCircuit`].
#[derive(Debug, Clone)]
pub struct CvState<P: Precision> {
    n: usize,
    qmr: QumodeRegister,
    state: Vec<Complex<P>>,
    clbits: Vec<Option<(usize, P)>>,
}

impl<P: Precision> CvState<P> {
    /// Total number of qubits.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Final state vector, qubit 0 most significant.
    pub fn statevector(&self) -> &[Complex<P>] {
        &self.state
    }

    /// Final state vector in the requested qubit order.
    pub fn into_statevector(self, order: Representation) -> Vec<Complex<P>> {
        match order {
            Representation::BigEndian => self.state,
            Representation::LittleEndian => {
                let n = self.n;
                (0..self.state.len())
                    .map(|i| self.state[flip_bits(n, i)])
                    .collect()
            }
        }
    }

    /// Value and probability of the measurement stored in classical slot `clbit`, if any.
    pub fn clbit(&self, clbit: usize) -> Option<(usize, P)> {
        self.clbits.get(clbit).cloned().flatten()
    }

    /// Photon number distribution of `qumode`, one entry per Fock level below the cutoff.
    pub fn fock_probabilities(&self, qumode: usize) -> CircuitResult<Vec<P>> {
        let indices = self.qmr.qubit_indices(qumode)?.collect::<Vec<_>>();
        let mut probs = measure_probs(self.n, &indices, &self.state);
        probs.truncate(self.qmr.cutoff());
        Ok(probs)
    }
}
