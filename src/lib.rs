#![forbid(unsafe_code)]
#![deny(
    unreachable_pub,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    missing_docs
)]

//! Hybrid qubit and qumode circuits. Each qumode is a bosonic mode truncated to `cutoff` Fock
//! levels and stored in the binary value of a group of qubits, so continuous-variable gates
//! become dense unitaries on those qubits and run on the same state vector as ordinary qubit
//! gates.
//!
//! Circuits are made with a [`CvCircuit`](cv_circuit::CvCircuit) which wraps a
//! [`LocalBuilder`](builder::LocalBuilder). The builder can also be used on its own to make
//! qubit circuits, condition them on control registers and invert them.
//!
//! # Example
//! A qumode displaced conditionally on a qubit in superposition:
//! ```
//! use qip_cv::prelude::*;
//!
//! # fn main() -> CircuitResult<()> {
//! // One qumode in 3 qubits (cutoff 8), one qubit, one classical slot.
//! let qmr = QumodeRegister::new(1, 3)?;
//! let mut circuit = CvCircuit::<f64>::new(qmr, 1, 1);
//!
//! circuit.cv_initialize(&[0])?;
//! circuit.h(0)?;
//! // Displace by +alpha when the qubit is |0> and by -alpha when it is |1>.
//! let alpha = Complex::new(0.5, 0.0);
//! circuit.cv_cnd_d(alpha, -alpha, 0, 0)?;
//! circuit.measure(0, 0)?;
//!
//! let state = circuit.calculate_state()?;
//! let probs = state.fock_probabilities(0)?;
//! let total: f64 = probs.iter().sum();
//! assert!((total - 1.0).abs() < 1e-8);
//! assert!(state.clbit(0).is_some());
//! # Ok(())
//! # }
//! ```

#[macro_use]
mod rayon_helper;

/// Circuit builder which records and runs qubit circuits.
pub mod builder;
/// Traits shared by circuit builders.
pub mod builder_traits;
/// Conditioning circuit objects on the state of control registers.
pub mod conditioning;
pub mod cv_circuit;
/// Error types.
pub mod errors;
/// Inverting subcircuits.
pub mod inverter;
/// Ops and the iterators over their nonzero entries.
pub mod iterators;
pub mod operators;
/// Qumode registers and the embedding of Fock space operators into qubits.
pub mod qumode;
/// Functions which act on state vectors.
pub mod state_ops;
/// Precision and qubit ordering types.
pub mod types;
/// Bit manipulation helpers.
pub mod utils;

pub use errors::{CircuitError, CircuitResult};
pub use num_complex::Complex;
pub use types::{Precision, Representation};

/// Commonly used types and traits.
pub mod prelude {
    pub use crate::builder::{LocalBuilder, MeasurementHandle, Qudit};
    pub use crate::builder_traits::*;
    pub use crate::conditioning::{Conditionable, ConditionableSubcircuit, Conditioned};
    pub use crate::cv_circuit::{CvCircuit, CvInstruction, CvState};
    pub use crate::errors::{CircuitError, CircuitResult};
    pub use crate::inverter::{inverter, inverter_args, Invertable};
    pub use crate::operators::CvOperators;
    pub use crate::qumode::QumodeRegister;
    pub use crate::types::{Precision, Representation};
    pub use num_complex::Complex;
}
