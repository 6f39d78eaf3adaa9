//! Structured interchange form of a compiled circuit.
//!
//! A [`CompiledCircuit`] is what the execution layer ships to a remote
//! service: the flat operation list with parameters at fixed
//! precision, the register header, the final layout, and the basis the
//! circuit was compiled against. Deserialization validates shape and
//! operand ranges, so malformed input surfaces as [`ExportError`]
//! instead of a panic downstream.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use quill_ir::{CircuitDag, ClassicalCondition, ClassicalRegister, QuantumRegister};

/// Errors raised when building or reading the structured form.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExportError {
    /// The input is not valid JSON for this schema.
    #[error("Malformed compiled circuit: {0}")]
    Json(#[from] serde_json::Error),

    /// The circuit name is empty.
    #[error("Compiled circuit has an empty name")]
    EmptyName,

    /// An operation references a qubit outside the register header.
    #[error("Operation {op_index} references qubit {qubit}, but only {available} are declared")]
    QubitOutOfRange {
        /// Index of the offending operation.
        op_index: usize,
        /// The out-of-range qubit.
        qubit: u32,
        /// Number of declared qubits.
        available: u32,
    },

    /// An operation references a classical bit outside the header.
    #[error(
        "Operation {op_index} references classical bit {clbit}, but only {available} are declared"
    )]
    ClbitOutOfRange {
        /// Index of the offending operation.
        op_index: usize,
        /// The out-of-range classical bit.
        clbit: u32,
        /// Number of declared classical bits.
        available: u32,
    },
}

/// One operation of a compiled circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledOp {
    /// Operation name: a basis gate, `measure`, `barrier`, or `reset`.
    pub name: String,
    /// Real parameters, rounded to the export precision.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<f64>,
    /// Flat qubit wire indices.
    pub qubits: Vec<u32>,
    /// Flat classical wire indices (measurement targets).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clbits: Vec<u32>,
    /// Classical gating condition, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ClassicalCondition>,
}

/// One binding of the final layout: a logical register lane on a
/// physical qubit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutEntry {
    /// Logical register name.
    pub register: String,
    /// Logical lane index.
    pub index: u32,
    /// Physical qubit carrying this lane at the end of the circuit.
    pub physical: u32,
}

/// A compiled circuit in interchange form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledCircuit {
    /// Caller-chosen circuit name.
    pub name: String,
    /// The basis the circuit was compiled against.
    pub basis_gates: Vec<String>,
    /// Quantum registers of the compiled circuit.
    pub qregs: Vec<QuantumRegister>,
    /// Classical registers of the compiled circuit.
    pub cregs: Vec<ClassicalRegister>,
    /// Final logical → physical layout, present when a coupling map
    /// was supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Vec<LayoutEntry>>,
    /// Number of exchange operations routing inserted.
    #[serde(default)]
    pub swaps_inserted: usize,
    /// Flat operation list in topological order.
    pub operations: Vec<CompiledOp>,
    /// The circuit re-rendered as OpenQASM 2.0.
    pub qasm: String,
}

impl CompiledCircuit {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON, validating shape and operand ranges.
    pub fn from_json(text: &str) -> Result<CompiledCircuit, ExportError> {
        let circuit: CompiledCircuit = serde_json::from_str(text)?;
        circuit.validate()?;
        Ok(circuit)
    }

    /// Check structural invariants of the interchange form.
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.name.is_empty() {
            return Err(ExportError::EmptyName);
        }

        let num_qubits: u32 = self.qregs.iter().map(|r| r.size).sum();
        let num_clbits: u32 = self.cregs.iter().map(|r| r.size).sum();

        for (op_index, op) in self.operations.iter().enumerate() {
            for &qubit in &op.qubits {
                if qubit >= num_qubits {
                    return Err(ExportError::QubitOutOfRange {
                        op_index,
                        qubit,
                        available: num_qubits,
                    });
                }
            }
            for &clbit in &op.clbits {
                if clbit >= num_clbits {
                    return Err(ExportError::ClbitOutOfRange {
                        op_index,
                        clbit,
                        available: num_clbits,
                    });
                }
            }
        }

        Ok(())
    }
}

/// A compiled batch: one entry per requested circuit, plus the
/// caller's opaque request identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledBatch {
    /// Opaque request identifier chosen by the caller, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Compiled circuits in request order.
    pub circuits: Vec<CompiledCircuit>,
}

impl CompiledBatch {
    /// Find a compiled circuit by name.
    pub fn get(&self, name: &str) -> Option<&CompiledCircuit> {
        self.circuits.iter().find(|c| c.name == name)
    }
}

/// Project a DAG's operations into interchange form, rounding
/// parameters to `precision` decimal digits.
pub fn dag_operations(dag: &CircuitDag, precision: usize) -> Vec<CompiledOp> {
    dag.topological_ops()
        .map(|(_, instruction)| {
            let params = match &instruction.kind {
                quill_ir::InstructionKind::Gate(gate) => gate
                    .params()
                    .into_iter()
                    .map(|p| round_to(p, precision))
                    .collect(),
                _ => vec![],
            };
            CompiledOp {
                name: instruction.name().to_string(),
                params,
                qubits: instruction.qubits.iter().map(|q| q.0).collect(),
                clbits: instruction.clbits.iter().map(|c| c.0).collect(),
                condition: instruction.condition.clone(),
            }
        })
        .collect()
}

/// Round a value to the given number of decimal digits.
fn round_to(value: f64, digits: usize) -> f64 {
    let digits = u32::try_from(digits.min(15)).expect("precision bounded by 15");
    let scale = 10f64.powi(i32::try_from(digits).expect("precision fits i32"));
    (value * scale).round() / scale
}
