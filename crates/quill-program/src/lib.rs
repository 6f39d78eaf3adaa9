//! Quill Program Management
//!
//! The top of the compiler stack: named registers and circuits, the
//! batch compile entry point, and the structured interchange form that
//! execution layers ship to a remote service.
//!
//! # Example: compiling a Bell pair for a linear device
//!
//! ```rust
//! use quill_compile::CouplingMap;
//! use quill_program::{CompileOptions, QuantumProgram};
//!
//! let mut program = QuantumProgram::new();
//! program.load_qasm_text("bell", r#"
//! OPENQASM 2.0;
//! include "qelib1.inc";
//! qreg q[2];
//! creg c[2];
//! h q[0];
//! cx q[0],q[1];
//! measure q -> c;
//! "#).unwrap();
//!
//! let options = CompileOptions::default()
//!     .with_coupling_map(CouplingMap::from_adjacency([(0, vec![1])]));
//! let batch = program.compile(&["bell"], &options).unwrap();
//!
//! let bell = batch.get("bell").unwrap();
//! assert_eq!(bell.swaps_inserted, 0);
//! assert!(bell.operations.iter().any(|op| op.name == "cx"));
//! ```
//!
//! Errors surface synchronously through [`CompilerError`], which wraps
//! the per-stage taxonomy: syntax, semantic, routing, serialization.
//! Batch compilation stops at the first failing circuit and names it.

pub mod error;
pub mod export;
pub mod program;

pub use error::{CompilerError, CompilerResult};
pub use export::{
    CompiledBatch, CompiledCircuit, CompiledOp, ExportError, LayoutEntry, dag_operations,
};
pub use program::{CompileOptions, QuantumProgram, compile_qasm};
