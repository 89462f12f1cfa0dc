use crate::builder_traits::{CircuitBuilder, QubitRegister, SplitManyResult, Subcircuitable};
use crate::errors::{CircuitError, CircuitResult};

/// An Invertable circuit builder must be able to produce a similar circuit builder with the
/// `new_similar` call. This subcircuit builder can be used to make circuits that Self can invert
/// and then apply.
pub trait Invertable: Subcircuitable {
    /// A similar circuit builder which can be used to construct circuits for the parent.
    type SimilarBuilder: Subcircuitable<Subcircuit = Self::Subcircuit>;

    /// Make a similar circuit builder.
    fn new_similar(&self) -> Self::SimilarBuilder;
    /// Take the output of the similar circuit builder and invert it.
    fn invert_subcircuit(sc: Self::Subcircuit) -> CircuitResult<Self::Subcircuit>;
    /// Apply the inverted subcircuit to a register.
    fn apply_inverted_subcircuit(
        &mut self,
        sc: Self::Subcircuit,
        r: Self::Register,
    ) -> CircuitResult<Self::Register> {
        let sc = Self::invert_subcircuit(sc)?;
        self.apply_subcircuit(sc, r)
    }
}

/// Invert the circuit made by `f` using arguments `t`. Apply the inverted circuit to registers `rs`
/// using circuitbuilder `cb`.
pub fn inverter_args<T, CB, F>(
    cb: &mut CB,
    rs: Vec<CB::Register>,
    f: F,
    t: T,
) -> CircuitResult<Vec<CB::Register>>
where
    CB: Invertable,
    F: Fn(
        &mut CB::SimilarBuilder,
        Vec<<CB::SimilarBuilder as CircuitBuilder>::Register>,
        T,
    ) -> CircuitResult<Vec<<CB::SimilarBuilder as CircuitBuilder>::Register>>,
{
    let mut sub_cb = cb.new_similar();
    let sub_rs = rs
        .iter()
        .map(|r| sub_cb.register(r.n_nonzero()))
        .collect::<_>();
    let _ = f(&mut sub_cb, sub_rs, t)?;
    let subcircuit = sub_cb.make_subcircuit()?;
    let (_, ranges) = rs
        .iter()
        .map(|r| r.n())
        .fold((0, vec![]), |(n, mut acc), rn| {
            acc.push(n..n + rn);
            (n + rn, acc)
        });
    let r = cb
        .merge_registers(rs)
        .ok_or_else(|| CircuitError::new("Need at least one register to invert onto."))?;
    let r = cb.apply_inverted_subcircuit(subcircuit, r)?;
    match cb.split_relative_index_groups(r, ranges)? {
        SplitManyResult::AllSelected(rs) => Ok(rs),
        SplitManyResult::Remaining(_, _) => unreachable!(),
    }
}

/// Invert the circuit made by `f`. Apply the inverted circuit to registers `rs` using
/// circuitbuilder `cb`.
pub fn inverter<CB, F>(cb: &mut CB, r: Vec<CB::Register>, f: F) -> CircuitResult<Vec<CB::Register>>
where
    CB: Invertable,
    F: Fn(
        &mut CB::SimilarBuilder,
        Vec<<CB::SimilarBuilder as CircuitBuilder>::Register>,
    ) -> CircuitResult<Vec<<CB::SimilarBuilder as CircuitBuilder>::Register>>,
{
    inverter_args(cb, r, |r, cb, _| f(r, cb), ())
}
