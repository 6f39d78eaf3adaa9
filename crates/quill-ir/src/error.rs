//! Error types for the IR crate.

use crate::bit::{ClbitId, QubitId};
use thiserror::Error;

/// Errors that can occur in IR operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Qubit not found in circuit.
    #[error("Qubit {qubit:?} not found in circuit{}", format_gate_context(.gate_name))]
    QubitNotFound {
        /// The qubit that was not found.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Classical bit not found in circuit.
    #[error("Classical bit {clbit:?} not found in circuit{}", format_gate_context(.gate_name))]
    ClbitNotFound {
        /// The classical bit that was not found.
        clbit: ClbitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Duplicate qubit in one operation (aliasing).
    #[error("Duplicate qubit {qubit:?} in operation{}", format_gate_context(.gate_name))]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Gate requires a different number of qubits.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits.
        expected: u32,
        /// Actual number of qubits provided.
        got: u32,
    },

    /// A register with this name already exists in the circuit.
    #[error("Register '{0}' already exists in circuit")]
    RegisterExists(String),

    /// Referenced register is not declared in the circuit.
    #[error("Register '{0}' not found in circuit")]
    UnknownRegister(String),

    /// Register index out of range.
    #[error("Index {index} out of range for register '{register}' of size {size}")]
    IndexOutOfRange {
        /// The register name.
        register: String,
        /// The offending index.
        index: u32,
        /// The declared register size.
        size: u32,
    },

    /// Register name violates the naming rule.
    #[error("Invalid register name '{0}': expected [a-z][a-zA-Z0-9_]*")]
    InvalidRegisterName(String),

    /// Registers must have at least one bit.
    #[error("Register '{0}' must have a positive size")]
    EmptyRegister(String),

    /// Operation has no algebraic inverse.
    #[error("Operation '{0}' is not invertible")]
    NonInvertible(String),

    /// Invalid DAG structure.
    #[error("Invalid DAG structure: {0}")]
    InvalidDag(String),
}

/// Helper function to format optional gate context.
#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
