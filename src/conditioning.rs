use crate::builder_traits::{
    CircuitBuilder, CliffordTBuilder, QubitRegister, SplitResult, Subcircuitable, UnitaryBuilder,
};
use crate::errors::{CircuitError, CircuitResult};
use crate::inverter::Invertable;
use crate::types::Precision;
use num_complex::Complex;
use std::num::NonZeroUsize;

/// A CircuitBuilder is conditionable if it can condition all unitaries with a given register.
pub trait Conditionable: CircuitBuilder {
    /// Attempt to condition a circuit object `co` applied to `r` with the register `cr`. The
    /// object acts when `cr` holds `ctrl_state`, first qubit of `cr` being the most significant.
    fn try_apply_with_condition(
        &mut self,
        cr: Self::Register,
        ctrl_state: usize,
        r: Self::Register,
        co: Self::CircuitObject,
    ) -> CircuitResult<(Self::Register, Self::Register)>;

    /// Construct a new circuitbuilder which conditions all unitaries with `cr` being all ones.
    fn condition_with(&mut self, cr: Self::Register) -> Conditioned<Self> {
        let ctrl_state = (1 << cr.n()) - 1;
        Conditioned::new(self, cr, ctrl_state)
    }

    /// Construct a new circuitbuilder which conditions all unitaries with `cr` holding
    /// `ctrl_state`.
    fn condition_with_state(
        &mut self,
        cr: Self::Register,
        ctrl_state: usize,
    ) -> CircuitResult<Conditioned<Self>> {
        if ctrl_state >= 1 << cr.n() {
            Err(CircuitError::new(format!(
                "Control state {} does not fit in {} control qubits",
                ctrl_state,
                cr.n()
            )))
        } else {
            Ok(Conditioned::new(self, cr, ctrl_state))
        }
    }
}

/// A CircuitBuilder which conditions all unitaries with a given register.
#[derive(Debug)]
pub struct Conditioned<'a, CB: Conditionable + ?Sized> {
    parent: &'a mut CB,
    cr: Option<CB::Register>,
    ctrl_state: usize,
}

impl<'a, CB: Conditionable + ?Sized> Conditioned<'a, CB> {
    fn new(cb: &'a mut CB, cr: CB::Register, ctrl_state: usize) -> Self {
        Self {
            parent: cb,
            cr: Some(cr),
            ctrl_state,
        }
    }

    /// Dissolve the Conditioned circuit builder and retrieve the conditioning register.
    pub fn dissolve(self) -> CircuitResult<CB::Register> {
        self.cr.ok_or_else(lost_condition)
    }

    fn take_cr(&mut self) -> CircuitResult<CB::Register> {
        self.cr.take().ok_or_else(lost_condition)
    }
}

fn lost_condition() -> CircuitError {
    CircuitError::new("Conditioning register was lost by a failed operation.")
}

impl<'a, CB: Conditionable + ?Sized> CircuitBuilder for Conditioned<'a, CB> {
    type Register = CB::Register;
    type CircuitObject = CB::CircuitObject;
    type StateCalculation = CB::StateCalculation;

    fn n(&self) -> usize {
        self.parent.n()
    }

    fn register(&mut self, n: NonZeroUsize) -> Self::Register {
        self.parent.register(n)
    }

    fn merge_two_registers(&mut self, r1: Self::Register, r2: Self::Register) -> Self::Register {
        self.parent.merge_two_registers(r1, r2)
    }

    fn split_register_relative<It>(
        &mut self,
        r: Self::Register,
        indices: It,
    ) -> SplitResult<Self::Register>
    where
        It: IntoIterator<Item = usize>,
    {
        self.parent.split_register_relative(r, indices)
    }

    fn apply_circuit_object(
        &mut self,
        r: Self::Register,
        c: Self::CircuitObject,
    ) -> CircuitResult<Self::Register> {
        let cr = self.take_cr()?;
        let (cr, r) = self
            .parent
            .try_apply_with_condition(cr, self.ctrl_state, r, c)?;
        self.cr = Some(cr);
        Ok(r)
    }

    fn calculate_state_with_init<'b, It>(
        &mut self,
        it: It,
    ) -> CircuitResult<Self::StateCalculation>
    where
        Self::Register: 'b,
        It: IntoIterator<Item = (&'b Self::Register, usize)>,
    {
        self.parent.calculate_state_with_init(it)
    }
}

impl<'a, P: Precision, CB: Conditionable + UnitaryBuilder<P> + ?Sized> UnitaryBuilder<P>
    for Conditioned<'a, CB>
{
    fn vec_matrix_to_circuitobject(n: usize, data: Vec<Complex<P>>) -> Self::CircuitObject {
        CB::vec_matrix_to_circuitobject(n, data)
    }

    fn labeled_vec_matrix_to_circuitobject(
        n: usize,
        data: Vec<Complex<P>>,
        label: &str,
    ) -> Self::CircuitObject {
        CB::labeled_vec_matrix_to_circuitobject(n, data, label)
    }
}

impl<'a, P: Precision, CB: Conditionable + CliffordTBuilder<P> + ?Sized> CliffordTBuilder<P>
    for Conditioned<'a, CB>
{
    fn make_x(&self) -> Self::CircuitObject {
        self.parent.make_x()
    }
    fn make_y(&self) -> Self::CircuitObject {
        self.parent.make_y()
    }
    fn make_z(&self) -> Self::CircuitObject {
        self.parent.make_z()
    }
    fn make_h(&self) -> Self::CircuitObject {
        self.parent.make_h()
    }
    fn make_s(&self) -> Self::CircuitObject {
        self.parent.make_s()
    }
    fn make_t(&self) -> Self::CircuitObject {
        self.parent.make_t()
    }
    fn make_cnot(&self) -> Self::CircuitObject {
        self.parent.make_cnot()
    }
}

/// Merge an outer condition (`cr`, `ctrl_state`) with the condition held by `conditioned`, call
/// `f` with the merged condition, then hand the outer condition back.
fn with_merged_condition<CB, F>(
    conditioned: &mut Conditioned<CB>,
    cr: CB::Register,
    ctrl_state: usize,
    r: CB::Register,
    f: F,
) -> CircuitResult<(CB::Register, CB::Register)>
where
    CB: Conditionable + ?Sized,
    F: FnOnce(
        &mut CB,
        CB::Register,
        usize,
        CB::Register,
    ) -> CircuitResult<(CB::Register, CB::Register)>,
{
    let ncr = cr.n();
    let ccr = conditioned.take_cr()?;
    let ctrl_state = (ctrl_state << ccr.n()) | conditioned.ctrl_state;
    let cr = conditioned.parent.merge_two_registers(cr, ccr);
    let (cr, r) = f(&mut *conditioned.parent, cr, ctrl_state, r)?;
    let (cr, ccr) = match conditioned.parent.split_register_relative(cr, 0..ncr) {
        SplitResult::SPLIT(cr, ccr) => (cr, ccr),
        SplitResult::SELECTED(_) => unreachable!(),
        SplitResult::UNSELECTED(_) => unreachable!(),
    };
    conditioned.cr = Some(ccr);
    Ok((cr, r))
}

impl<'a, CB: Conditionable> Conditionable for Conditioned<'a, CB> {
    fn try_apply_with_condition(
        &mut self,
        cr: CB::Register,
        ctrl_state: usize,
        r: CB::Register,
        co: CB::CircuitObject,
    ) -> CircuitResult<(CB::Register, CB::Register)> {
        with_merged_condition(self, cr, ctrl_state, r, |cb, cr, ctrl_state, r| {
            cb.try_apply_with_condition(cr, ctrl_state, r, co)
        })
    }
}

/// A ConditionableSubcircuit may apply an entire subcircuit under the condition of `cr`.
pub trait ConditionableSubcircuit: Subcircuitable {
    /// Apply `sc` to register `r` when `cr` holds `ctrl_state`.
    fn apply_conditioned_subcircuit(
        &mut self,
        sc: Self::Subcircuit,
        cr: Self::Register,
        ctrl_state: usize,
        r: Self::Register,
    ) -> CircuitResult<(Self::Register, Self::Register)>;
}

impl<'a, CB: ConditionableSubcircuit + Conditionable> Subcircuitable for Conditioned<'a, CB> {
    type Subcircuit = CB::Subcircuit;

    fn make_subcircuit(&self) -> CircuitResult<Self::Subcircuit> {
        self.parent.make_subcircuit()
    }

    fn apply_subcircuit(
        &mut self,
        sc: Self::Subcircuit,
        r: Self::Register,
    ) -> CircuitResult<Self::Register> {
        let cr = self.take_cr()?;
        let (cr, r) = self
            .parent
            .apply_conditioned_subcircuit(sc, cr, self.ctrl_state, r)?;
        self.cr = Some(cr);
        Ok(r)
    }
}

impl<'a, CB: Invertable + ConditionableSubcircuit + Conditionable> Invertable
    for Conditioned<'a, CB>
{
    type SimilarBuilder = CB::SimilarBuilder;

    fn new_similar(&self) -> Self::SimilarBuilder {
        self.parent.new_similar()
    }

    fn invert_subcircuit(sc: Self::Subcircuit) -> CircuitResult<Self::Subcircuit> {
        CB::invert_subcircuit(sc)
    }
}

impl<'a, CB: ConditionableSubcircuit + Conditionable> ConditionableSubcircuit
    for Conditioned<'a, CB>
{
    fn apply_conditioned_subcircuit(
        &mut self,
        sc: Self::Subcircuit,
        cr: Self::Register,
        ctrl_state: usize,
        r: Self::Register,
    ) -> CircuitResult<(Self::Register, Self::Register)> {
        with_merged_condition(self, cr, ctrl_state, r, |cb, cr, ctrl_state, r| {
            cb.apply_conditioned_subcircuit(sc, cr, ctrl_state, r)
        })
    }
}
