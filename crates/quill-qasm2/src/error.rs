//! Error types for the OpenQASM 2.0 front end.
//!
//! Syntax errors ([`ParseError`]) carry source position; semantic
//! errors ([`UnrollError`]) are raised in one pass over the AST by the
//! unroller, which lets a caller see structural problems without
//! re-running the parser.

use quill_ir::IrError;
use thiserror::Error;

/// Errors raised while tokenizing or parsing program text.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Invalid token in the source.
    #[error("{}:{line}:{column}: invalid token: {message}", file_or_input(.file))]
    Lexer {
        /// Line of the offending text (1-based).
        line: usize,
        /// Column of the offending text (1-based).
        column: usize,
        /// Source file name, if parsing a file.
        file: Option<String>,
        /// Description of the invalid text.
        message: String,
    },

    /// Unexpected token.
    #[error("{}:{line}:{column}: expected {expected}, found {found}", file_or_input(.file))]
    UnexpectedToken {
        /// Line of the offending token (1-based).
        line: usize,
        /// Column of the offending token (1-based).
        column: usize,
        /// Source file name, if parsing a file.
        file: Option<String>,
        /// What the parser expected.
        expected: String,
        /// What it found instead.
        found: String,
    },

    /// Input ended in the middle of a construct.
    #[error("Unexpected end of input: expected {expected}")]
    UnexpectedEof {
        /// What the parser expected.
        expected: String,
    },

    /// The version header is missing or not 2.0.
    #[error("Unsupported OPENQASM version: {found} (only 2.0 is supported)")]
    UnsupportedVersion {
        /// The version text found.
        found: String,
    },

    /// Failed to read a source file.
    #[error("Cannot read '{path}': {source}")]
    Io {
        /// The path that could not be read.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

fn file_or_input(file: &Option<String>) -> &str {
    file.as_deref().unwrap_or("<input>")
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Semantic errors raised while unrolling an AST.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UnrollError {
    /// Invocation of a gate that was never declared.
    #[error("line {line}: gate '{name}' is not defined")]
    UndefinedGate {
        /// The gate name.
        name: String,
        /// Source line of the invocation.
        line: usize,
    },

    /// Reference to a register that was never declared.
    #[error("line {line}: register '{name}' is not defined")]
    UndefinedRegister {
        /// The register name.
        name: String,
        /// Source line of the reference.
        line: usize,
    },

    /// Register re-declared with a different size.
    #[error(
        "line {line}: register '{name}' already declared with size {existing}, \
         re-declared with size {requested}"
    )]
    RegisterSizeConflict {
        /// The register name.
        name: String,
        /// The size of the existing declaration.
        existing: u32,
        /// The size of the conflicting declaration.
        requested: u32,
        /// Source line of the re-declaration.
        line: usize,
    },

    /// Gate declared twice.
    #[error("line {line}: gate '{name}' is already defined")]
    DuplicateGate {
        /// The gate name.
        name: String,
        /// Source line of the re-declaration.
        line: usize,
    },

    /// Register index outside the declared size.
    #[error("line {line}: index {index} out of range for register '{register}' of size {size}")]
    IndexOutOfRange {
        /// The register name.
        register: String,
        /// The offending index.
        index: u32,
        /// The declared size.
        size: u32,
        /// Source line of the reference.
        line: usize,
    },

    /// Wrong number of parameters in a gate invocation.
    #[error("line {line}: gate '{gate}' takes {expected} parameters, got {got}")]
    ParameterArityMismatch {
        /// The gate name.
        gate: String,
        /// Declared parameter count.
        expected: usize,
        /// Supplied parameter count.
        got: usize,
        /// Source line of the invocation.
        line: usize,
    },

    /// Wrong number of qubit arguments in a gate invocation.
    #[error("line {line}: gate '{gate}' acts on {expected} qubits, got {got}")]
    QubitArityMismatch {
        /// The gate name.
        gate: String,
        /// Declared qubit count.
        expected: usize,
        /// Supplied qubit count.
        got: usize,
        /// Source line of the invocation.
        line: usize,
    },

    /// One qubit used twice in a single operation.
    #[error("line {line}: gate '{gate}' uses qubit {register}[{index}] more than once")]
    QubitAliasing {
        /// The gate name.
        gate: String,
        /// Register of the repeated qubit.
        register: String,
        /// Lane of the repeated qubit.
        index: u32,
        /// Source line of the invocation.
        line: usize,
    },

    /// Register-valued arguments of one call disagree in size.
    #[error("line {line}: gate '{gate}' applied to registers of different sizes")]
    BroadcastMismatch {
        /// The gate name.
        gate: String,
        /// Source line of the invocation.
        line: usize,
    },

    /// Gate declarations may not reference themselves, directly or
    /// mutually; expansion would not terminate.
    #[error("line {line}: gate '{name}' is defined recursively")]
    RecursiveGate {
        /// The gate name.
        name: String,
        /// Source line of the offending invocation.
        line: usize,
    },

    /// Parameter expression references a name with no binding.
    #[error("line {line}: unknown parameter '{name}' in expression")]
    UnboundParameter {
        /// The unresolved name.
        name: String,
        /// Source line of the expression.
        line: usize,
    },

    /// Gate cannot be expressed in the configured basis.
    #[error("gate '{name}' cannot be expanded into the target basis")]
    BasisUnreachable {
        /// The gate name.
        name: String,
    },

    /// Only the bundled standard library can be included.
    #[error("line {line}: cannot include '{path}': only \"qelib1.inc\" is available")]
    UnknownInclude {
        /// The requested include path.
        path: String,
        /// Source line of the include.
        line: usize,
    },

    /// Gate bodies may only reference the declared formal qubits.
    #[error("line {line}: gate '{gate}' body references '{name}', which is not a formal argument")]
    UnknownFormal {
        /// The enclosing gate.
        gate: String,
        /// The unresolved name.
        name: String,
        /// Source line of the reference.
        line: usize,
    },

    /// Indexed references are not allowed inside gate bodies.
    #[error("line {line}: gate '{gate}' body may not index register arguments")]
    IndexedFormal {
        /// The enclosing gate.
        gate: String,
        /// Source line of the reference.
        line: usize,
    },

    /// Error from the circuit builder.
    #[error("Circuit error: {0}")]
    Ir(#[from] IrError),
}

/// Result type for unrolling operations.
pub type UnrollResult<T> = Result<T, UnrollError>;
