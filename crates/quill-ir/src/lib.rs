//! Quill Circuit Intermediate Representation
//!
//! This crate provides the core data structures for representing quantum
//! circuits in Quill. It is the canonical form every other stage of the
//! compiler produces or consumes.
//!
//! # Overview
//!
//! A circuit is a DAG (Directed Acyclic Graph): one input/output node
//! pair per quantum or classical wire, one node per operation, and
//! edges that chain each wire through the operations touching it in
//! program order. Two operations commute exactly when they share no
//! wire, which is what layout and routing passes exploit.
//!
//! # Core Components
//!
//! - **Wires**: [`QubitId`], [`ClbitId`] flat wire ids; [`QuantumRegister`]
//!   and [`ClassicalRegister`] give wires their declared names
//! - **Gates**: [`StandardGate`] for the known gate surface (with
//!   algebraic [`StandardGate::inverse`]) and [`CustomGate`] for opaque
//!   operations
//! - **Instructions**: [`Instruction`] combining a gate, its operands,
//!   and an optional [`ClassicalCondition`]
//! - **DAG**: [`CircuitDag`] with `apply`, `compose`, `front_layer`,
//!   and `successors`
//!
//! # Example: Building a Bell Pair
//!
//! ```rust
//! use quill_ir::{
//!     CircuitDag, ClassicalRegister, Instruction, QuantumRegister, QubitId, StandardGate,
//! };
//!
//! let mut dag = CircuitDag::new();
//! dag.add_qreg(QuantumRegister::new("q", 2).unwrap()).unwrap();
//! dag.add_creg(ClassicalRegister::new("c", 2).unwrap()).unwrap();
//!
//! dag.apply(Instruction::single_qubit_gate(StandardGate::H, QubitId(0))).unwrap();
//! dag.apply(Instruction::two_qubit_gate(StandardGate::CX, QubitId(0), QubitId(1))).unwrap();
//!
//! assert_eq!(dag.num_ops(), 2);
//! assert_eq!(dag.depth(), 2);
//! ```

pub mod bit;
pub mod dag;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod register;

pub use bit::{ClbitId, QubitId};
pub use dag::{CircuitDag, DagEdge, DagNode, NodeIndex, WireId};
pub use error::{IrError, IrResult};
pub use gate::{CustomGate, Gate, StandardGate};
pub use instruction::{ClassicalCondition, Instruction, InstructionKind};
pub use register::{ClassicalRegister, QuantumRegister};
