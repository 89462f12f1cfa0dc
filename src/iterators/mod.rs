/// Ops which can be applied to a state vector.
pub mod ops;
/// Iterators over the nonzero columns of a row of an op.
pub mod qubit_iterators;

pub use ops::*;
pub use qubit_iterators::*;
