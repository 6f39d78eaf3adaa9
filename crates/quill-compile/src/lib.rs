//! Quill Mapping Framework
//!
//! Rewrites circuit DAGs to satisfy hardware connectivity constraints.
//! The pipeline is pass-based: a layout pass computes the
//! logical-to-physical qubit binding and a routing pass inserts
//! exchange (swap) operations so every two-qubit operation acts on an
//! adjacent pair.
//!
//! ```text
//! CircuitDag ──TrivialLayout──▶ PropertySet.layout
//!            ──SwapRouting───▶ CircuitDag on physical wires
//!                              + final layout + RoutingSummary
//! ```
//!
//! # Example
//!
//! ```rust
//! use quill_compile::{BasisGates, CouplingMap, PassManagerBuilder, RoutingSummary};
//! use quill_ir::{CircuitDag, Instruction, QuantumRegister, QubitId, StandardGate};
//!
//! // A circuit with a long-range CX.
//! let mut dag = CircuitDag::new();
//! dag.add_qreg(QuantumRegister::new("q", 3).unwrap()).unwrap();
//! dag.apply(Instruction::two_qubit_gate(StandardGate::CX, QubitId(0), QubitId(2))).unwrap();
//!
//! // Map it onto a linear chain.
//! let (pm, mut props) = PassManagerBuilder::new()
//!     .with_target(CouplingMap::linear(3), BasisGates::default())
//!     .build();
//! pm.run(&mut dag, &mut props).unwrap();
//!
//! assert_eq!(props.get::<RoutingSummary>().unwrap().swaps_inserted, 1);
//! ```
//!
//! A missing coupling map means all-to-all connectivity: the builder
//! then produces an empty pipeline and circuits pass through untouched.

pub mod error;
pub mod manager;
pub mod pass;
pub mod property;

// Built-in passes
pub mod passes;

pub use error::{CompileError, CompileResult};
pub use manager::{PassManager, PassManagerBuilder};
pub use pass::{Pass, PassKind};
pub use passes::{SwapRouting, TrivialLayout};
pub use property::{BasisGates, CouplingMap, Layout, PropertySet, RoutingSummary};
