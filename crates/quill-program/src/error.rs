//! Unified error type for the compile entry point.

use thiserror::Error;

use quill_compile::CompileError;
use quill_ir::IrError;
use quill_qasm2::{ParseError, UnrollError};

use crate::export::ExportError;

/// Any failure surfaced by the compiler entry point.
///
/// Wraps the per-stage error types: syntax ([`ParseError`]), semantic
/// ([`UnrollError`]), routing ([`CompileError`]), and serialization
/// ([`ExportError`]), plus the façade's own bookkeeping failures. All
/// are deterministic functions of the input; nothing is retried.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompilerError {
    /// Malformed source text.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Semantic violation found while unrolling.
    #[error(transparent)]
    Unroll(#[from] UnrollError),

    /// Layout or routing failure.
    #[error(transparent)]
    Routing(#[from] CompileError),

    /// Malformed structured circuit input.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Error from the circuit IR.
    #[error(transparent)]
    Ir(#[from] IrError),

    /// No circuit stored under this name.
    #[error("No circuit named '{name}'")]
    MissingCircuit {
        /// The requested circuit name.
        name: String,
    },

    /// A circuit with this name already exists.
    #[error("Circuit '{name}' already exists")]
    DuplicateCircuit {
        /// The conflicting circuit name.
        name: String,
    },

    /// No register stored under this name.
    #[error("No register named '{name}'")]
    MissingRegister {
        /// The requested register name.
        name: String,
    },

    /// Register re-created with a different size.
    #[error(
        "Register '{name}' already exists with size {existing}, requested size {requested}"
    )]
    RegisterSizeConflict {
        /// The register name.
        name: String,
        /// The size of the existing register.
        existing: u32,
        /// The conflicting requested size.
        requested: u32,
    },

    /// Compile called with an empty circuit list.
    #[error("No circuits given to compile")]
    NoCircuits,

    /// Batch compilation stopped at this circuit.
    ///
    /// Wraps the underlying failure so callers see both which circuit
    /// failed and why.
    #[error("Compilation of circuit '{name}' failed")]
    CircuitFailed {
        /// The failing circuit's name.
        name: String,
        /// The underlying failure.
        #[source]
        source: Box<CompilerError>,
    },
}

/// Result type for compiler entry-point operations.
pub type CompilerResult<T> = Result<T, CompilerError>;
