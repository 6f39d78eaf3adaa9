//! Program management façade and the compile entry point.
//!
//! A [`QuantumProgram`] owns named registers and named circuits
//! (OpenQASM 2.0 sources) and compiles batches of them:
//! parse → unroll to the basis → map to the coupling graph → emit
//! text and the structured interchange form. Each compilation is
//! independent and synchronous; the only state shared between circuits
//! is the read-only coupling map and basis list in the options.

use rustc_hash::FxHashMap;
use tracing::{info, instrument};

use quill_compile::{BasisGates, CouplingMap, Layout, PassManagerBuilder, RoutingSummary};
use quill_ir::{ClassicalRegister, QuantumRegister, QubitId};
use quill_qasm2::{DEFAULT_BASIS, DEFAULT_PRECISION, emit_with_precision, parse, unroll_to_dag};

use crate::error::{CompilerError, CompilerResult};
use crate::export::{CompiledBatch, CompiledCircuit, LayoutEntry, dag_operations};

/// Typed compile configuration.
///
/// One struct with named optional fields instead of a loose dictionary;
/// everything is validated once, inside `compile`.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// The basis-gate stopping set for unrolling.
    pub basis_gates: Vec<String>,
    /// Hardware connectivity; absent means all-to-all, and mapping is
    /// skipped entirely.
    pub coupling_map: Option<CouplingMap>,
    /// Caller-supplied initial logical → physical binding; identity
    /// when absent.
    pub initial_layout: Option<Layout>,
    /// Decimal digits for parameters in emitted text and the
    /// interchange form.
    pub precision: usize,
    /// Opaque request identifier echoed into the compiled batch.
    pub request_id: Option<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            basis_gates: DEFAULT_BASIS.iter().map(ToString::to_string).collect(),
            coupling_map: None,
            initial_layout: None,
            precision: DEFAULT_PRECISION,
            request_id: None,
        }
    }
}

impl CompileOptions {
    /// Set the basis gates.
    #[must_use]
    pub fn with_basis_gates(mut self, basis: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.basis_gates = basis.into_iter().map(Into::into).collect();
        self
    }

    /// Set the coupling map.
    #[must_use]
    pub fn with_coupling_map(mut self, coupling_map: CouplingMap) -> Self {
        self.coupling_map = Some(coupling_map);
        self
    }

    /// Set the initial layout.
    #[must_use]
    pub fn with_initial_layout(mut self, layout: Layout) -> Self {
        self.initial_layout = Some(layout);
        self
    }

    /// Set the request identifier.
    #[must_use]
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }
}

/// Registry of named registers and circuits with a batch compiler.
#[derive(Debug, Default)]
pub struct QuantumProgram {
    quantum_registers: FxHashMap<String, QuantumRegister>,
    classical_registers: FxHashMap<String, ClassicalRegister>,
    circuits: FxHashMap<String, String>,
}

impl QuantumProgram {
    /// Create an empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or fetch) a quantum register.
    ///
    /// Re-creation with the same size is idempotent; a different size
    /// is an error.
    pub fn create_quantum_register(
        &mut self,
        name: &str,
        size: u32,
    ) -> CompilerResult<&QuantumRegister> {
        if let Some(existing) = self.quantum_registers.get(name) {
            if existing.size != size {
                return Err(CompilerError::RegisterSizeConflict {
                    name: name.to_string(),
                    existing: existing.size,
                    requested: size,
                });
            }
        } else {
            let register = QuantumRegister::new(name, size)?;
            self.quantum_registers.insert(name.to_string(), register);
        }
        Ok(&self.quantum_registers[name])
    }

    /// Create (or fetch) a classical register.
    ///
    /// Same idempotency rule as [`Self::create_quantum_register`].
    pub fn create_classical_register(
        &mut self,
        name: &str,
        size: u32,
    ) -> CompilerResult<&ClassicalRegister> {
        if let Some(existing) = self.classical_registers.get(name) {
            if existing.size != size {
                return Err(CompilerError::RegisterSizeConflict {
                    name: name.to_string(),
                    existing: existing.size,
                    requested: size,
                });
            }
        } else {
            let register = ClassicalRegister::new(name, size)?;
            self.classical_registers.insert(name.to_string(), register);
        }
        Ok(&self.classical_registers[name])
    }

    /// Start a circuit over previously created registers.
    ///
    /// The stored source declares the registers and nothing else;
    /// callers extend it with [`Self::append_qasm`].
    pub fn create_circuit(
        &mut self,
        name: &str,
        qregs: &[&str],
        cregs: &[&str],
    ) -> CompilerResult<()> {
        if self.circuits.contains_key(name) {
            return Err(CompilerError::DuplicateCircuit {
                name: name.to_string(),
            });
        }

        let mut source = String::from("OPENQASM 2.0;\ninclude \"qelib1.inc\";\n");
        for &qreg in qregs {
            let register =
                self.quantum_registers
                    .get(qreg)
                    .ok_or_else(|| CompilerError::MissingRegister {
                        name: qreg.to_string(),
                    })?;
            source.push_str(&format!("qreg {}[{}];\n", register.name, register.size));
        }
        for &creg in cregs {
            let register =
                self.classical_registers
                    .get(creg)
                    .ok_or_else(|| CompilerError::MissingRegister {
                        name: creg.to_string(),
                    })?;
            source.push_str(&format!("creg {}[{}];\n", register.name, register.size));
        }

        self.circuits.insert(name.to_string(), source);
        Ok(())
    }

    /// Append statements to a stored circuit, validating the result.
    pub fn append_qasm(&mut self, name: &str, statements: &str) -> CompilerResult<()> {
        let source = self
            .circuits
            .get(name)
            .ok_or_else(|| CompilerError::MissingCircuit {
                name: name.to_string(),
            })?;
        let mut extended = source.clone();
        extended.push_str(statements);
        if !extended.ends_with('\n') {
            extended.push('\n');
        }
        parse(&extended)?;
        self.circuits.insert(name.to_string(), extended);
        Ok(())
    }

    /// Store a circuit from QASM text, validating that it parses.
    pub fn load_qasm_text(&mut self, name: &str, source: &str) -> CompilerResult<()> {
        if self.circuits.contains_key(name) {
            return Err(CompilerError::DuplicateCircuit {
                name: name.to_string(),
            });
        }
        parse(source)?;
        self.circuits.insert(name.to_string(), source.to_string());
        Ok(())
    }

    /// Store a circuit from a QASM file, validating that it parses.
    pub fn load_qasm_file(&mut self, name: &str, path: &str) -> CompilerResult<()> {
        let source =
            std::fs::read_to_string(path).map_err(|source| quill_qasm2::ParseError::Io {
                path: path.to_string(),
                source,
            })?;
        self.load_qasm_text(name, &source)
    }

    /// Get the stored source of a circuit.
    pub fn get_qasm(&self, name: &str) -> CompilerResult<&str> {
        self.circuits
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| CompilerError::MissingCircuit {
                name: name.to_string(),
            })
    }

    /// Names of stored circuits, sorted.
    pub fn circuit_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.circuits.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Names of created quantum registers, sorted.
    pub fn quantum_register_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.quantum_registers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Names of created classical registers, sorted.
    pub fn classical_register_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classical_registers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Compile a batch of stored circuits.
    ///
    /// Stops at the first failing circuit and reports which one failed;
    /// no partial result is returned for it.
    #[instrument(skip(self, options))]
    pub fn compile(&self, names: &[&str], options: &CompileOptions) -> CompilerResult<CompiledBatch> {
        if names.is_empty() {
            return Err(CompilerError::NoCircuits);
        }

        let mut circuits = Vec::with_capacity(names.len());
        for &name in names {
            let source =
                self.circuits
                    .get(name)
                    .ok_or_else(|| CompilerError::MissingCircuit {
                        name: name.to_string(),
                    })?;
            let compiled =
                compile_qasm(name, source, options).map_err(|error| CompilerError::CircuitFailed {
                    name: name.to_string(),
                    source: Box::new(error),
                })?;
            circuits.push(compiled);
        }

        Ok(CompiledBatch {
            id: options.request_id.clone(),
            circuits,
        })
    }
}

/// Compile one circuit from source text.
///
/// The full pipeline: parse, unroll into the basis, map against the
/// coupling graph when one is supplied, then project into text and
/// interchange form.
pub fn compile_qasm(
    name: &str,
    source: &str,
    options: &CompileOptions,
) -> CompilerResult<CompiledCircuit> {
    let program = parse(source)?;
    let mut dag = unroll_to_dag(&program, options.basis_gates.iter().map(String::as_str))?;

    // Logical register labels, captured before mapping rewrites the
    // wires to physical indices.
    let num_logical = u32::try_from(dag.num_qubits()).expect("qubit count exceeds u32");
    let logical_labels: Vec<(String, u32)> = (0..num_logical)
        .map(|id| {
            let (register, index) = dag
                .qubit_label(QubitId(id))
                .expect("every qubit wire belongs to a register");
            (register.to_string(), index)
        })
        .collect();

    let mut layout_entries = None;
    let mut swaps_inserted = 0;

    if let Some(coupling_map) = &options.coupling_map {
        let mut builder = PassManagerBuilder::new().with_target(
            coupling_map.clone(),
            BasisGates::new(options.basis_gates.iter().cloned()),
        );
        if let Some(initial) = &options.initial_layout {
            builder = builder.with_initial_layout(initial.clone());
        }
        let (pass_manager, mut properties) = builder.build();
        pass_manager.run(&mut dag, &mut properties)?;

        let layout = properties
            .layout
            .take()
            .expect("mapping pipeline always leaves a layout");
        swaps_inserted = properties
            .get::<RoutingSummary>()
            .map_or(0, |summary| summary.swaps_inserted);

        let mut entries = Vec::with_capacity(logical_labels.len());
        for (id, (register, index)) in logical_labels.iter().enumerate() {
            let logical = QubitId(u32::try_from(id).expect("qubit count exceeds u32"));
            let physical = layout
                .get_physical(logical)
                .ok_or(quill_compile::CompileError::IncompleteLayout(logical.0))?;
            entries.push(LayoutEntry {
                register: register.clone(),
                index: *index,
                physical,
            });
        }
        layout_entries = Some(entries);
    }

    info!(
        "compiled '{name}': {} ops, depth {}, {swaps_inserted} exchanges",
        dag.num_ops(),
        dag.depth()
    );

    Ok(CompiledCircuit {
        name: name.to_string(),
        basis_gates: options.basis_gates.clone(),
        qregs: dag.qregs().to_vec(),
        cregs: dag.cregs().to_vec(),
        layout: layout_entries,
        swaps_inserted,
        operations: dag_operations(&dag, options.precision),
        qasm: emit_with_precision(&dag, options.precision),
    })
}
