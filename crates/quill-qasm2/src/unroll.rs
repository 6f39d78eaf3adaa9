//! Unroller: lowers an AST into basis-gate operations on a backend.
//!
//! The unroller walks the program depth-first, keeping symbol tables
//! for registers and gate definitions. Invocations of gates in the
//! basis set are emitted directly; everything else is expanded through
//! its declared body, substituting actual parameters and qubits for
//! the formals. Recursion is detected with an explicit call stack of
//! gate names, so a self- or mutually-recursive declaration is a
//! compile error rather than a hang.

use rustc_hash::{FxHashMap, FxHashSet};

use quill_ir::{
    CircuitDag, ClassicalCondition, ClassicalRegister, CustomGate, Gate, Instruction,
    QuantumRegister, StandardGate,
};

use crate::ast::{
    Argument, GateBodyStatement, GateCall, MainProgram, Qop, Statement, format_real,
};
use crate::error::{UnrollError, UnrollResult};
use crate::qelib;

/// The default target basis: the four primitives plus identity.
pub const DEFAULT_BASIS: [&str; 5] = ["u1", "u2", "u3", "cx", "id"];

/// One lane of a register: the atomic unit operations act on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegisterTuple {
    /// The register name.
    pub register: String,
    /// The lane index within the register.
    pub index: u32,
}

impl RegisterTuple {
    /// Create a new register tuple.
    pub fn new(register: impl Into<String>, index: u32) -> Self {
        Self {
            register: register.into(),
            index,
        }
    }
}

impl std::fmt::Display for RegisterTuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.register, self.index)
    }
}

/// A registered gate: formal names plus an optional body.
///
/// Opaque declarations have no body and can only be emitted when their
/// name is in the basis.
#[derive(Debug, Clone)]
pub struct GateDefinition {
    /// Formal parameter names.
    pub params: Vec<String>,
    /// Formal qubit names.
    pub qubits: Vec<String>,
    /// Body statements, or `None` for opaque gates.
    pub body: Option<Vec<GateBodyStatement>>,
    /// Source line of the declaration.
    pub line: usize,
}

/// Target of the unroller: receives declarations and the flat stream
/// of basis operations.
pub trait Backend {
    /// Record the program version.
    fn version(&mut self, _version: &str) {}

    /// Declare a quantum register.
    fn new_qreg(&mut self, name: &str, size: u32) -> UnrollResult<()>;

    /// Declare a classical register.
    fn new_creg(&mut self, name: &str, size: u32) -> UnrollResult<()>;

    /// Record a gate definition. Most backends ignore these; they are
    /// offered so a backend can reproduce declarations in its output.
    fn define_gate(&mut self, _name: &str, _definition: &GateDefinition) -> UnrollResult<()> {
        Ok(())
    }

    /// Emit one basis-gate operation.
    fn basis_gate(
        &mut self,
        name: &str,
        params: &[f64],
        qubits: &[RegisterTuple],
        condition: Option<&ClassicalCondition>,
    ) -> UnrollResult<()>;

    /// Emit a measurement.
    fn measure(
        &mut self,
        qubit: &RegisterTuple,
        target: &RegisterTuple,
        condition: Option<&ClassicalCondition>,
    ) -> UnrollResult<()>;

    /// Emit a reset.
    fn reset(
        &mut self,
        qubit: &RegisterTuple,
        condition: Option<&ClassicalCondition>,
    ) -> UnrollResult<()>;

    /// Emit a barrier.
    fn barrier(&mut self, qubits: &[RegisterTuple]) -> UnrollResult<()>;
}

/// Bindings of a gate body being expanded: actual values for the
/// declared formals.
struct Scope {
    gate: String,
    params: FxHashMap<String, f64>,
    qubits: FxHashMap<String, RegisterTuple>,
}

/// Walks an AST and drives a [`Backend`].
pub struct Unroller<B: Backend> {
    backend: B,
    basis: FxHashSet<String>,
    qregs: FxHashMap<String, u32>,
    cregs: FxHashMap<String, u32>,
    gates: FxHashMap<String, GateDefinition>,
}

impl<B: Backend> Unroller<B> {
    /// Create an unroller with the given backend and basis set.
    pub fn new(backend: B, basis: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            backend,
            basis: basis.into_iter().map(Into::into).collect(),
            qregs: FxHashMap::default(),
            cregs: FxHashMap::default(),
            gates: FxHashMap::default(),
        }
    }

    /// Create an unroller with the default `u1,u2,u3,cx,id` basis.
    pub fn with_default_basis(backend: B) -> Self {
        Self::new(backend, DEFAULT_BASIS)
    }

    /// Unroll a program, consuming the unroller and returning the
    /// backend with the lowered circuit.
    pub fn unroll(mut self, program: &MainProgram) -> UnrollResult<B> {
        self.backend.version(&program.version);
        self.process_statements(&program.statements)?;
        Ok(self.backend)
    }

    fn process_statements(&mut self, statements: &[Statement]) -> UnrollResult<()> {
        for statement in statements {
            self.process_statement(statement)?;
        }
        Ok(())
    }

    fn process_statement(&mut self, statement: &Statement) -> UnrollResult<()> {
        match statement {
            Statement::Include { path, line } => {
                if path == "qelib1.inc" {
                    let library = qelib::standard_library();
                    self.process_statements(&library.statements)
                } else {
                    Err(UnrollError::UnknownInclude {
                        path: path.clone(),
                        line: *line,
                    })
                }
            }

            Statement::QregDecl { name, size, line } => match self.qregs.get(name) {
                Some(&existing) if existing == *size => Ok(()),
                Some(&existing) => Err(UnrollError::RegisterSizeConflict {
                    name: name.clone(),
                    existing,
                    requested: *size,
                    line: *line,
                }),
                None => {
                    self.qregs.insert(name.clone(), *size);
                    self.backend.new_qreg(name, *size)
                }
            },

            Statement::CregDecl { name, size, line } => match self.cregs.get(name) {
                Some(&existing) if existing == *size => Ok(()),
                Some(&existing) => Err(UnrollError::RegisterSizeConflict {
                    name: name.clone(),
                    existing,
                    requested: *size,
                    line: *line,
                }),
                None => {
                    self.cregs.insert(name.clone(), *size);
                    self.backend.new_creg(name, *size)
                }
            },

            Statement::GateDecl(decl) => {
                if self.gates.contains_key(&decl.name) {
                    return Err(UnrollError::DuplicateGate {
                        name: decl.name.clone(),
                        line: decl.line,
                    });
                }
                let definition = GateDefinition {
                    params: decl.params.clone(),
                    qubits: decl.qubits.clone(),
                    body: Some(decl.body.clone()),
                    line: decl.line,
                };
                self.backend.define_gate(&decl.name, &definition)?;
                self.gates.insert(decl.name.clone(), definition);
                Ok(())
            }

            Statement::OpaqueDecl {
                name,
                params,
                qubits,
                line,
            } => {
                if self.gates.contains_key(name) {
                    return Err(UnrollError::DuplicateGate {
                        name: name.clone(),
                        line: *line,
                    });
                }
                let definition = GateDefinition {
                    params: params.clone(),
                    qubits: qubits.clone(),
                    body: None,
                    line: *line,
                };
                self.backend.define_gate(name, &definition)?;
                self.gates.insert(name.clone(), definition);
                Ok(())
            }

            Statement::Barrier { args, .. } => {
                let mut lanes = Vec::new();
                for arg in args {
                    lanes.extend(self.resolve_qubit_arg(arg)?);
                }
                dedup_lanes(&mut lanes);
                self.backend.barrier(&lanes)
            }

            Statement::If {
                register,
                value,
                op,
                line,
            } => {
                if !self.cregs.contains_key(register) {
                    return Err(UnrollError::UndefinedRegister {
                        name: register.clone(),
                        line: *line,
                    });
                }
                let condition = ClassicalCondition::new(register.clone(), *value);
                self.process_qop(op, Some(&condition))
            }

            Statement::Qop(op) => self.process_qop(op, None),
        }
    }

    fn process_qop(
        &mut self,
        op: &Qop,
        condition: Option<&ClassicalCondition>,
    ) -> UnrollResult<()> {
        match op {
            Qop::Measure {
                qubit,
                target,
                line,
            } => {
                let qubits = self.resolve_qubit_arg(qubit)?;
                let targets = self.resolve_clbit_arg(target)?;
                if qubits.len() != targets.len() {
                    return Err(UnrollError::BroadcastMismatch {
                        gate: "measure".into(),
                        line: *line,
                    });
                }
                for (q, c) in qubits.iter().zip(targets.iter()) {
                    self.backend.measure(q, c, condition)?;
                }
                Ok(())
            }

            Qop::Reset { arg, .. } => {
                for lane in self.resolve_qubit_arg(arg)? {
                    self.backend.reset(&lane, condition)?;
                }
                Ok(())
            }

            Qop::Call(call) => {
                let mut stack = Vec::new();
                self.expand_call(call, None, condition, &mut stack)
            }
        }
    }

    /// Expand one gate invocation down to the basis.
    ///
    /// `scope` holds the formal bindings of the enclosing gate body, if
    /// any; `stack` is the chain of gate names currently being expanded
    /// and is how recursive declarations are caught.
    fn expand_call(
        &mut self,
        call: &GateCall,
        scope: Option<&Scope>,
        condition: Option<&ClassicalCondition>,
        stack: &mut Vec<String>,
    ) -> UnrollResult<()> {
        let name = call.name.as_str();

        // Declared shape of the invocation target.
        let (expected_params, expected_qubits, definition) = match name {
            "U" => (3, 1, None),
            "CX" => (0, 2, None),
            _ => {
                let def =
                    self.gates
                        .get(name)
                        .cloned()
                        .ok_or_else(|| UnrollError::UndefinedGate {
                            name: name.to_string(),
                            line: call.line,
                        })?;
                (def.params.len(), def.qubits.len(), Some(def))
            }
        };

        if call.params.len() != expected_params {
            return Err(UnrollError::ParameterArityMismatch {
                gate: name.to_string(),
                expected: expected_params,
                got: call.params.len(),
                line: call.line,
            });
        }
        if call.args.len() != expected_qubits {
            return Err(UnrollError::QubitArityMismatch {
                gate: name.to_string(),
                expected: expected_qubits,
                got: call.args.len(),
                line: call.line,
            });
        }

        // Evaluate actual parameters to real values.
        let empty = FxHashMap::default();
        let bindings = scope.map_or(&empty, |s| &s.params);
        let params = call
            .params
            .iter()
            .map(|expr| {
                expr.eval(bindings).map_err(|unbound| UnrollError::UnboundParameter {
                    name: unbound,
                    line: call.line,
                })
            })
            .collect::<UnrollResult<Vec<f64>>>()?;

        // Resolve qubit arguments, broadcasting whole registers.
        let lane_sets = self.resolve_call_args(call, scope)?;

        for lanes in lane_sets {
            // No qubit may appear twice in one operation.
            let mut seen = FxHashSet::default();
            for lane in &lanes {
                if !seen.insert(lane.clone()) {
                    return Err(UnrollError::QubitAliasing {
                        gate: name.to_string(),
                        register: lane.register.clone(),
                        index: lane.index,
                        line: call.line,
                    });
                }
            }

            if self.basis.contains(name) {
                self.backend.basis_gate(name, &params, &lanes, condition)?;
            } else if name == "U" {
                // The primitives lower to their qelib names so the
                // emitted stream stays inside the caller's basis.
                if self.basis.contains("u3") {
                    self.backend.basis_gate("u3", &params, &lanes, condition)?;
                } else {
                    return Err(UnrollError::BasisUnreachable {
                        name: "U".to_string(),
                    });
                }
            } else if name == "CX" {
                if self.basis.contains("cx") {
                    self.backend.basis_gate("cx", &params, &lanes, condition)?;
                } else {
                    return Err(UnrollError::BasisUnreachable {
                        name: "CX".to_string(),
                    });
                }
            } else {
                let definition = definition
                    .as_ref()
                    .expect("non-builtin gates carry a definition");
                let Some(body) = &definition.body else {
                    // Opaque gate outside the basis: nothing to expand.
                    return Err(UnrollError::BasisUnreachable {
                        name: name.to_string(),
                    });
                };

                if stack.iter().any(|frame| frame == name) {
                    return Err(UnrollError::RecursiveGate {
                        name: name.to_string(),
                        line: call.line,
                    });
                }
                stack.push(name.to_string());

                let child = Scope {
                    gate: name.to_string(),
                    params: definition
                        .params
                        .iter()
                        .cloned()
                        .zip(params.iter().copied())
                        .collect(),
                    qubits: definition
                        .qubits
                        .iter()
                        .cloned()
                        .zip(lanes.iter().cloned())
                        .collect(),
                };

                for statement in body {
                    match statement {
                        GateBodyStatement::Call(inner) => {
                            self.expand_call(inner, Some(&child), condition, stack)?;
                        }
                        GateBodyStatement::Barrier { args, line } => {
                            let mut barrier_lanes = Vec::new();
                            for arg in args {
                                barrier_lanes.push(resolve_formal(&child, arg, *line)?);
                            }
                            dedup_lanes(&mut barrier_lanes);
                            self.backend.barrier(&barrier_lanes)?;
                        }
                    }
                }

                stack.pop();
            }
        }

        Ok(())
    }

    /// Resolve the arguments of one call into broadcast lane sets.
    ///
    /// At top level, whole-register arguments fan out lane-wise and all
    /// register-valued arguments must agree in size. Inside a gate body
    /// every argument is a formal name bound to a single lane.
    fn resolve_call_args(
        &self,
        call: &GateCall,
        scope: Option<&Scope>,
    ) -> UnrollResult<Vec<Vec<RegisterTuple>>> {
        if let Some(scope) = scope {
            let mut lanes = Vec::with_capacity(call.args.len());
            for arg in &call.args {
                lanes.push(resolve_formal(scope, arg, call.line)?);
            }
            return Ok(vec![lanes]);
        }

        // Top level: arguments reference declared registers.
        let mut resolved: Vec<Vec<RegisterTuple>> = Vec::with_capacity(call.args.len());
        let mut broadcast: Option<usize> = None;
        for arg in &call.args {
            let lanes = self.resolve_qubit_arg(arg)?;
            if lanes.len() > 1 {
                match broadcast {
                    None => broadcast = Some(lanes.len()),
                    Some(size) if size == lanes.len() => {}
                    Some(_) => {
                        return Err(UnrollError::BroadcastMismatch {
                            gate: call.name.clone(),
                            line: call.line,
                        });
                    }
                }
            }
            resolved.push(lanes);
        }

        let reps = broadcast.unwrap_or(1);
        Ok((0..reps)
            .map(|rep| {
                resolved
                    .iter()
                    .map(|lanes| {
                        if lanes.len() == 1 {
                            lanes[0].clone()
                        } else {
                            lanes[rep].clone()
                        }
                    })
                    .collect()
            })
            .collect())
    }

    /// Resolve a top-level argument against the quantum registers.
    fn resolve_qubit_arg(&self, arg: &Argument) -> UnrollResult<Vec<RegisterTuple>> {
        let size = *self
            .qregs
            .get(&arg.register)
            .ok_or_else(|| UnrollError::UndefinedRegister {
                name: arg.register.clone(),
                line: arg.line,
            })?;
        resolve_lanes(arg, size)
    }

    /// Resolve a top-level argument against the classical registers.
    fn resolve_clbit_arg(&self, arg: &Argument) -> UnrollResult<Vec<RegisterTuple>> {
        let size = *self
            .cregs
            .get(&arg.register)
            .ok_or_else(|| UnrollError::UndefinedRegister {
                name: arg.register.clone(),
                line: arg.line,
            })?;
        resolve_lanes(arg, size)
    }
}

/// Expand an argument into lanes, validating any index.
fn resolve_lanes(arg: &Argument, size: u32) -> UnrollResult<Vec<RegisterTuple>> {
    match arg.index {
        Some(index) => {
            if index >= size {
                return Err(UnrollError::IndexOutOfRange {
                    register: arg.register.clone(),
                    index,
                    size,
                    line: arg.line,
                });
            }
            Ok(vec![RegisterTuple::new(arg.register.clone(), index)])
        }
        None => Ok((0..size)
            .map(|index| RegisterTuple::new(arg.register.clone(), index))
            .collect()),
    }
}

/// Resolve a gate-body argument through the enclosing scope.
fn resolve_formal(scope: &Scope, arg: &Argument, line: usize) -> UnrollResult<RegisterTuple> {
    if arg.index.is_some() {
        return Err(UnrollError::IndexedFormal {
            gate: scope.gate.clone(),
            line,
        });
    }
    scope
        .qubits
        .get(&arg.register)
        .cloned()
        .ok_or_else(|| UnrollError::UnknownFormal {
            gate: scope.gate.clone(),
            name: arg.register.clone(),
            line,
        })
}

/// Remove repeated lanes, keeping first occurrences in order.
fn dedup_lanes(lanes: &mut Vec<RegisterTuple>) {
    let mut seen = FxHashSet::default();
    lanes.retain(|lane| seen.insert(lane.clone()));
}

/// Backend that builds a [`CircuitDag`].
#[derive(Debug, Default)]
pub struct DagBackend {
    dag: CircuitDag,
}

impl DagBackend {
    /// Create a new DAG-building backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the backend, returning the built circuit.
    pub fn into_dag(self) -> CircuitDag {
        self.dag
    }

    fn qubit_ids(&self, lanes: &[RegisterTuple]) -> UnrollResult<Vec<quill_ir::QubitId>> {
        lanes
            .iter()
            .map(|lane| Ok(self.dag.qubit_id(&lane.register, lane.index)?))
            .collect()
    }
}

impl Backend for DagBackend {
    fn new_qreg(&mut self, name: &str, size: u32) -> UnrollResult<()> {
        self.dag.add_qreg(QuantumRegister::new(name, size)?)?;
        Ok(())
    }

    fn new_creg(&mut self, name: &str, size: u32) -> UnrollResult<()> {
        self.dag.add_creg(ClassicalRegister::new(name, size)?)?;
        Ok(())
    }

    fn basis_gate(
        &mut self,
        name: &str,
        params: &[f64],
        qubits: &[RegisterTuple],
        condition: Option<&ClassicalCondition>,
    ) -> UnrollResult<()> {
        let gate = StandardGate::from_name(name, params).map_or_else(
            || {
                let count = u32::try_from(qubits.len()).expect("qubit count exceeds u32");
                Gate::Custom(CustomGate::new(name, count, params.to_vec()))
            },
            Gate::Standard,
        );
        let mut instruction = Instruction::gate(gate, self.qubit_ids(qubits)?);
        if let Some(condition) = condition {
            instruction = instruction.with_condition(condition.clone());
        }
        self.dag.apply(instruction)?;
        Ok(())
    }

    fn measure(
        &mut self,
        qubit: &RegisterTuple,
        target: &RegisterTuple,
        condition: Option<&ClassicalCondition>,
    ) -> UnrollResult<()> {
        let q = self.dag.qubit_id(&qubit.register, qubit.index)?;
        let c = self.dag.clbit_id(&target.register, target.index)?;
        let mut instruction = Instruction::measure(q, c);
        if let Some(condition) = condition {
            instruction = instruction.with_condition(condition.clone());
        }
        self.dag.apply(instruction)?;
        Ok(())
    }

    fn reset(
        &mut self,
        qubit: &RegisterTuple,
        condition: Option<&ClassicalCondition>,
    ) -> UnrollResult<()> {
        let q = self.dag.qubit_id(&qubit.register, qubit.index)?;
        let mut instruction = Instruction::reset(q);
        if let Some(condition) = condition {
            instruction = instruction.with_condition(condition.clone());
        }
        self.dag.apply(instruction)?;
        Ok(())
    }

    fn barrier(&mut self, qubits: &[RegisterTuple]) -> UnrollResult<()> {
        let ids = self.qubit_ids(qubits)?;
        self.dag.apply(Instruction::barrier(ids))?;
        Ok(())
    }
}

/// Backend that renders the flat lowered program as text lines.
///
/// Used in tests and diagnostics; also the simplest demonstration that
/// the unroller is backend-agnostic.
#[derive(Debug)]
pub struct TextBackend {
    precision: usize,
    lines: Vec<String>,
}

impl TextBackend {
    /// Create a text backend with the given numeric precision.
    pub fn new(precision: usize) -> Self {
        Self {
            precision,
            lines: vec![],
        }
    }

    /// Consume the backend, returning the rendered lines.
    pub fn into_text(self) -> String {
        self.lines.join("\n")
    }

    fn prefix(condition: Option<&ClassicalCondition>) -> String {
        condition.map_or_else(String::new, |c| format!("if({}=={}) ", c.register, c.value))
    }
}

impl Backend for TextBackend {
    fn new_qreg(&mut self, name: &str, size: u32) -> UnrollResult<()> {
        self.lines.push(format!("qreg {name}[{size}];"));
        Ok(())
    }

    fn new_creg(&mut self, name: &str, size: u32) -> UnrollResult<()> {
        self.lines.push(format!("creg {name}[{size}];"));
        Ok(())
    }

    fn basis_gate(
        &mut self,
        name: &str,
        params: &[f64],
        qubits: &[RegisterTuple],
        condition: Option<&ClassicalCondition>,
    ) -> UnrollResult<()> {
        let args: Vec<_> = qubits.iter().map(ToString::to_string).collect();
        let line = if params.is_empty() {
            format!("{}{} {};", Self::prefix(condition), name, args.join(","))
        } else {
            let rendered: Vec<_> = params
                .iter()
                .map(|p| format_real(*p, self.precision))
                .collect();
            format!(
                "{}{}({}) {};",
                Self::prefix(condition),
                name,
                rendered.join(","),
                args.join(",")
            )
        };
        self.lines.push(line);
        Ok(())
    }

    fn measure(
        &mut self,
        qubit: &RegisterTuple,
        target: &RegisterTuple,
        condition: Option<&ClassicalCondition>,
    ) -> UnrollResult<()> {
        self.lines.push(format!(
            "{}measure {qubit} -> {target};",
            Self::prefix(condition)
        ));
        Ok(())
    }

    fn reset(
        &mut self,
        qubit: &RegisterTuple,
        condition: Option<&ClassicalCondition>,
    ) -> UnrollResult<()> {
        self.lines
            .push(format!("{}reset {qubit};", Self::prefix(condition)));
        Ok(())
    }

    fn barrier(&mut self, qubits: &[RegisterTuple]) -> UnrollResult<()> {
        let args: Vec<_> = qubits.iter().map(ToString::to_string).collect();
        self.lines.push(format!("barrier {};", args.join(",")));
        Ok(())
    }
}

/// Parse-free convenience: unroll an already parsed program into a DAG.
pub fn unroll_to_dag(
    program: &MainProgram,
    basis: impl IntoIterator<Item = impl Into<String>>,
) -> UnrollResult<CircuitDag> {
    let backend = Unroller::new(DagBackend::new(), basis).unroll(program)?;
    Ok(backend.into_dag())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn unroll_default(source: &str) -> UnrollResult<CircuitDag> {
        let program = parse(source).expect("test source must parse");
        unroll_to_dag(&program, DEFAULT_BASIS)
    }

    const BELL: &str = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\ncreg c[2];\nh q[0];\ncx q[0],q[1];\nmeasure q[0] -> c[0];\nmeasure q[1] -> c[1];";

    #[test]
    fn test_bell_unrolls_to_basis() {
        let dag = unroll_default(BELL).unwrap();
        let names: Vec<_> = dag.topological_ops().map(|(_, i)| i.name().to_string()).collect();
        // h lowers to u2; cx is already in the basis.
        assert_eq!(names, vec!["u2", "cx", "measure", "measure"]);
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_basis_closure() {
        let source = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[3];\ncreg c[3];\nccx q[0],q[1],q[2];\nswap q[0],q[2];\nt q[1];\nbarrier q;\nmeasure q[0] -> c[0];";
        let dag = unroll_default(source).unwrap();
        let basis: FxHashSet<&str> = DEFAULT_BASIS.iter().copied().collect();
        for (_, inst) in dag.topological_ops() {
            let name = inst.name();
            assert!(
                basis.contains(name) || matches!(name, "measure" | "barrier" | "reset"),
                "operation '{name}' escaped the basis"
            );
        }
    }

    #[test]
    fn test_builtin_u_lowers_to_u3() {
        let source = "OPENQASM 2.0;\nqreg q[1];\nU(0.1,0.2,0.3) q[0];";
        let dag = unroll_default(source).unwrap();
        let ops: Vec<_> = dag.topological_ops().map(|(_, i)| i.clone()).collect();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].name(), "u3");
    }

    #[test]
    fn test_user_gate_expansion() {
        let source = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\ngate bell a,b { h a; cx a,b; }\nbell q[0],q[1];";
        let dag = unroll_default(source).unwrap();
        let names: Vec<_> = dag.topological_ops().map(|(_, i)| i.name().to_string()).collect();
        assert_eq!(names, vec!["u2", "cx"]);
    }

    #[test]
    fn test_parameter_substitution() {
        let source = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\ngate twist(t) a { u1(t/2) a; }\ntwist(pi) q[0];";
        let dag = unroll_default(source).unwrap();
        let ops: Vec<_> = dag.topological_ops().map(|(_, i)| i.clone()).collect();
        assert_eq!(ops[0].name(), "u1");
        let gate = ops[0].as_gate().unwrap();
        assert!((gate.params()[0] - std::f64::consts::PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_register_broadcast() {
        let source =
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[3];\nh q;";
        let dag = unroll_default(source).unwrap();
        assert_eq!(dag.num_ops(), 3);
    }

    #[test]
    fn test_two_register_broadcast() {
        let source =
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg a[2];\nqreg b[2];\ncx a,b;";
        let dag = unroll_default(source).unwrap();
        let ops: Vec<_> = dag.topological_ops().map(|(_, i)| i.clone()).collect();
        assert_eq!(ops.len(), 2);
        assert!(ops.iter().all(|op| op.name() == "cx"));
    }

    #[test]
    fn test_broadcast_size_mismatch() {
        let source =
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg a[2];\nqreg b[3];\ncx a,b;";
        assert!(matches!(
            unroll_default(source),
            Err(UnrollError::BroadcastMismatch { .. })
        ));
    }

    #[test]
    fn test_measure_broadcast() {
        let source = "OPENQASM 2.0;\nqreg q[2];\ncreg c[2];\nmeasure q -> c;";
        let dag = unroll_default(source).unwrap();
        assert_eq!(dag.num_ops(), 2);
    }

    #[test]
    fn test_condition_recorded() {
        let source = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\ncreg c[1];\nif(c==1) x q[0];";
        let dag = unroll_default(source).unwrap();
        let ops: Vec<_> = dag.topological_ops().map(|(_, i)| i.clone()).collect();
        assert_eq!(ops.len(), 1);
        let condition = ops[0].condition.as_ref().unwrap();
        assert_eq!(condition.register, "c");
        assert_eq!(condition.value, 1);
    }

    #[test]
    fn test_undefined_gate() {
        let source = "OPENQASM 2.0;\nqreg q[1];\nh q[0];";
        assert!(matches!(
            unroll_default(source),
            Err(UnrollError::UndefinedGate { .. })
        ));
    }

    #[test]
    fn test_undefined_register() {
        let source = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nh q[0];";
        assert!(matches!(
            unroll_default(source),
            Err(UnrollError::UndefinedRegister { .. })
        ));
    }

    #[test]
    fn test_duplicate_register_same_size_idempotent() {
        let source = "OPENQASM 2.0;\nqreg q[2];\nqreg q[2];";
        assert!(unroll_default(source).is_ok());
    }

    #[test]
    fn test_duplicate_register_size_conflict() {
        let source = "OPENQASM 2.0;\nqreg q[4];\nqreg q[3];";
        match unroll_default(source) {
            Err(UnrollError::RegisterSizeConflict {
                name,
                existing,
                requested,
                ..
            }) => {
                assert_eq!(name, "q");
                assert_eq!(existing, 4);
                assert_eq!(requested, 3);
            }
            other => panic!("expected RegisterSizeConflict, got {other:?}"),
        }
    }

    #[test]
    fn test_index_out_of_range() {
        let source = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\nh q[2];";
        match unroll_default(source) {
            Err(UnrollError::IndexOutOfRange { register, index, size, .. }) => {
                assert_eq!(register, "q");
                assert_eq!(index, 2);
                assert_eq!(size, 2);
            }
            other => panic!("expected IndexOutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn test_parameter_arity_mismatch() {
        let source = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\nu1(1,2) q[0];";
        assert!(matches!(
            unroll_default(source),
            Err(UnrollError::ParameterArityMismatch { expected: 1, got: 2, .. })
        ));
    }

    #[test]
    fn test_qubit_arity_mismatch() {
        let source = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\ncx q[0];";
        assert!(matches!(
            unroll_default(source),
            Err(UnrollError::QubitArityMismatch { expected: 2, got: 1, .. })
        ));
    }

    #[test]
    fn test_qubit_aliasing() {
        let source = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\ncx q[0],q[0];";
        match unroll_default(source) {
            Err(UnrollError::QubitAliasing { gate, register, index, .. }) => {
                assert_eq!(gate, "cx");
                assert_eq!(register, "q");
                assert_eq!(index, 0);
            }
            other => panic!("expected QubitAliasing, got {other:?}"),
        }
    }

    #[test]
    fn test_recursive_gate() {
        let source = "OPENQASM 2.0;\nqreg q[1];\ngate spin a { spin a; }\nspin q[0];";
        assert!(matches!(
            unroll_default(source),
            Err(UnrollError::RecursiveGate { .. })
        ));
    }

    #[test]
    fn test_mutually_recursive_gates() {
        // pong is declared before ping references it at expansion time;
        // the cycle is only reachable through the call stack.
        let source = "OPENQASM 2.0;\nqreg q[1];\ngate pong a { ping a; }\ngate ping a { pong a; }\nping q[0];";
        match unroll_default(source) {
            Err(UnrollError::RecursiveGate { name, .. }) => assert_eq!(name, "ping"),
            other => panic!("expected RecursiveGate, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_gate() {
        let source = "OPENQASM 2.0;\ngate twice a { U(0,0,0) a; }\ngate twice a { U(0,0,0) a; }";
        assert!(matches!(
            unroll_default(source),
            Err(UnrollError::DuplicateGate { .. })
        ));
    }

    #[test]
    fn test_unbound_parameter() {
        let source = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\nrz(theta) q[0];";
        match unroll_default(source) {
            Err(UnrollError::UnboundParameter { name, .. }) => assert_eq!(name, "theta"),
            other => panic!("expected UnboundParameter, got {other:?}"),
        }
    }

    #[test]
    fn test_opaque_outside_basis() {
        let source = "OPENQASM 2.0;\nqreg q[1];\nopaque pulse(t) a;\npulse(0.5) q[0];";
        assert!(matches!(
            unroll_default(source),
            Err(UnrollError::BasisUnreachable { .. })
        ));
    }

    #[test]
    fn test_opaque_in_basis_emits_custom() {
        let source = "OPENQASM 2.0;\nqreg q[1];\nopaque pulse(t) a;\npulse(0.5) q[0];";
        let program = parse(source).unwrap();
        let dag = unroll_to_dag(&program, ["u1", "u2", "u3", "cx", "id", "pulse"]).unwrap();
        let ops: Vec<_> = dag.topological_ops().map(|(_, i)| i.clone()).collect();
        assert_eq!(ops[0].name(), "pulse");
        assert!(matches!(
            ops[0].as_gate(),
            Some(Gate::Custom(custom)) if custom.params == vec![0.5]
        ));
    }

    #[test]
    fn test_unknown_include() {
        let source = "OPENQASM 2.0;\ninclude \"other.inc\";";
        assert!(matches!(
            unroll_default(source),
            Err(UnrollError::UnknownInclude { .. })
        ));
    }

    #[test]
    fn test_unknown_formal() {
        let source = "OPENQASM 2.0;\nqreg q[1];\ngate bad a { U(0,0,0) b; }\nbad q[0];";
        assert!(matches!(
            unroll_default(source),
            Err(UnrollError::UnknownFormal { .. })
        ));
    }

    #[test]
    fn test_text_backend() {
        let program = parse(BELL).unwrap();
        let backend = Unroller::with_default_basis(TextBackend::new(crate::ast::DEFAULT_PRECISION))
            .unroll(&program)
            .unwrap();
        let text = backend.into_text();
        assert!(text.contains("qreg q[2];"));
        assert!(text.contains("cx q[0],q[1];"));
        assert!(text.contains("measure q[0] -> c[0];"));
    }

    #[test]
    fn test_expansion_depth() {
        // cz expands through h (u2) and cx: 3 basis ops.
        let source = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\ncz q[0],q[1];";
        let dag = unroll_default(source).unwrap();
        let names: Vec<_> = dag.topological_ops().map(|(_, i)| i.name().to_string()).collect();
        assert_eq!(names, vec!["u2", "cx", "u2"]);
    }
}
