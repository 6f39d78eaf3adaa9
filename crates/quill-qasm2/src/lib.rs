//! `OpenQASM` 2.0 front end for Quill
//!
//! This crate turns quantum assembly text into the circuit DAG that the
//! rest of the compiler works on, and renders DAGs back to text.
//!
//! # Pipeline
//!
//! ```text
//! source text ──parse──▶ AST ──unroll(basis)──▶ CircuitDag ──emit──▶ source text
//! ```
//!
//! - [`parse`] / [`parse_file`] tokenize and parse a program into an
//!   AST of typed nodes, failing on the first syntax error with
//!   file/line/column context.
//! - [`Unroller`] walks the AST and expands every composite gate down
//!   to a caller-supplied basis set (default `u1,u2,u3,cx,id`),
//!   reporting all semantic errors in one pass. Backends are
//!   pluggable: [`DagBackend`] builds a [`quill_ir::CircuitDag`],
//!   [`TextBackend`] renders the flat program.
//! - [`emit`] serializes a DAG back to OpenQASM 2.0 that re-parses to
//!   an equivalent circuit.
//!
//! # Example
//!
//! ```rust
//! use quill_qasm2::{parse, unroll_to_dag, DEFAULT_BASIS};
//!
//! let source = r#"
//! OPENQASM 2.0;
//! include "qelib1.inc";
//! qreg q[2];
//! creg c[2];
//! h q[0];
//! cx q[0],q[1];
//! measure q -> c;
//! "#;
//!
//! let program = parse(source).unwrap();
//! let dag = unroll_to_dag(&program, DEFAULT_BASIS).unwrap();
//! assert_eq!(dag.num_qubits(), 2);
//! assert_eq!(dag.num_ops(), 4); // u2, cx, measure, measure
//! ```
//!
//! # Supported grammar
//!
//! Version header (`OPENQASM 2.0;`), `include "qelib1.inc";` (resolved
//! to the bundled standard library), `qreg`/`creg` declarations, `gate`
//! declarations with parameter and qubit formals, `opaque`
//! declarations, gate invocations with register broadcast, builtin `U`
//! and `CX`, `measure`, `reset`, `barrier`, `if (creg == n) qop;`, and
//! an arithmetic sublanguage over `+ - * / ^`, unary minus, `pi`, and
//! `sin/cos/tan/exp/ln/sqrt`.

pub mod ast;
pub mod emitter;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod qelib;
pub mod unroll;

pub use ast::{DEFAULT_PRECISION, MainProgram};
pub use emitter::{emit, emit_with_precision};
pub use error::{ParseError, ParseResult, UnrollError, UnrollResult};
pub use parser::{parse, parse_file};
pub use unroll::{
    Backend, DEFAULT_BASIS, DagBackend, GateDefinition, RegisterTuple, TextBackend, Unroller,
    unroll_to_dag,
};
