use thiserror::Error;

/// An error from building or running the circuit.
#[derive(Debug, Error)]
pub enum CircuitError {
    /// A Fock state was requested which the qumode cutoff cannot represent.
    #[error("The parameter n should be lower than the cutoff (n = {n}, cutoff = {cutoff})")]
    FockStateOutOfRange {
        /// Requested Fock index.
        n: usize,
        /// Cutoff of the qumode register.
        cutoff: usize,
    },

    /// A qumode register with an unusable shape.
    #[error("invalid qumode register: {0}")]
    InvalidRegister(String),

    /// A qumode index past the end of the qumode register.
    #[error("qumode {index} out of range for register of {num_qumodes} qumodes")]
    QumodeOutOfRange {
        /// Requested qumode.
        index: usize,
        /// Number of qumodes in the register.
        num_qumodes: usize,
    },

    /// A qubit index past the end of the qubit register.
    #[error("qubit {index} out of range for register of {num_qubits} qubits")]
    QubitOutOfRange {
        /// Requested qubit.
        index: usize,
        /// Number of qubits in the register.
        num_qubits: usize,
    },

    /// A classical slot past the end of the classical register.
    #[error("classical bit {index} out of range for register of {num_clbits} bits")]
    ClbitOutOfRange {
        /// Requested slot.
        index: usize,
        /// Number of classical slots.
        num_clbits: usize,
    },

    /// The same register was named more than once in a single operation.
    #[error("register used more than once: {0}")]
    RegisterInUse(String),

    /// An amplitude vector which cannot be used to initialize a register.
    #[error("invalid amplitudes: {0}")]
    InvalidAmplitudes(String),

    /// A generic error.
    #[error("{0}")]
    Generic(String),
}

impl CircuitError {
    /// Construct a new generic error.
    pub fn new<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::Generic(msg.into())
    }
}

/// A result which may contain a circuit error.
pub type CircuitResult<T> = Result<T, CircuitError>;
