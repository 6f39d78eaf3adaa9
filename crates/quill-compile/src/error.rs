//! Error types for the compile crate.

use quill_ir::IrError;
use thiserror::Error;

/// Errors that can occur during layout and routing.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Pass requires a coupling map but none was supplied.
    #[error("No coupling map available")]
    MissingCouplingMap,

    /// Pass requires a layout but none was computed.
    #[error("No layout available")]
    MissingLayout,

    /// The circuit needs more qubits than the device provides.
    #[error("Circuit requires {required} qubits but the device has {available}")]
    CircuitTooLarge {
        /// Number of logical qubits in the circuit.
        required: usize,
        /// Number of physical qubits on the device.
        available: u32,
    },

    /// The coupling graph has no path between two required qubits.
    #[error("No path between physical qubits {qubit1} and {qubit2} in the coupling graph")]
    RoutingFailed {
        /// First physical qubit of the unreachable pair.
        qubit1: u32,
        /// Second physical qubit of the unreachable pair.
        qubit2: u32,
    },

    /// A supplied initial layout does not cover the circuit.
    #[error("Initial layout has no binding for logical qubit {0}")]
    IncompleteLayout(u32),

    /// Error from the circuit IR.
    #[error("Circuit error: {0}")]
    Ir(#[from] IrError),
}

/// Result type for compile operations.
pub type CompileResult<T> = Result<T, CompileError>;
