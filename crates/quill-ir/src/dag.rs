//! DAG-based circuit representation.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex as PetNodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::bit::{ClbitId, QubitId};
use crate::error::{IrError, IrResult};
use crate::instruction::{ClassicalCondition, Instruction, InstructionKind};
use crate::register::{ClassicalRegister, QuantumRegister};

/// Node index type for the circuit DAG.
pub type NodeIndex = PetNodeIndex<u32>;

/// A node in the circuit DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DagNode {
    /// Input node for a wire.
    In(WireId),
    /// Output node for a wire.
    Out(WireId),
    /// Operation node containing an instruction.
    Op(Instruction),
}

impl DagNode {
    /// Check if this is an input node.
    #[inline]
    pub fn is_input(&self) -> bool {
        matches!(self, DagNode::In(_))
    }

    /// Check if this is an operation node.
    #[inline]
    pub fn is_op(&self) -> bool {
        matches!(self, DagNode::Op(_))
    }

    /// Get the instruction if this is an operation node.
    #[inline]
    pub fn instruction(&self) -> Option<&Instruction> {
        match self {
            DagNode::Op(inst) => Some(inst),
            _ => None,
        }
    }
}

/// Identifier for a wire in the DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireId {
    /// A quantum wire.
    Qubit(QubitId),
    /// A classical wire.
    Clbit(ClbitId),
}

impl From<QubitId> for WireId {
    fn from(q: QubitId) -> Self {
        WireId::Qubit(q)
    }
}

impl From<ClbitId> for WireId {
    fn from(c: ClbitId) -> Self {
        WireId::Clbit(c)
    }
}

/// An edge in the circuit DAG representing a wire segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DagEdge {
    /// The wire this edge belongs to.
    pub wire: WireId,
}

/// DAG-based circuit representation.
///
/// The circuit is a directed graph where:
/// - Nodes are either input nodes, output nodes, or operation nodes
/// - Edges represent wires (quantum or classical)
/// - Each wire runs from its input node through every operation
///   touching it, in program order, to its output node
///
/// Two operations are independent (reorderable) iff they share no wire;
/// the graph is acyclic by construction since edges are only spliced
/// into each wire's existing chain tail.
///
/// Wires are allocated by registers: `add_qreg`/`add_creg` reserve one
/// flat id per lane and remember the register so operations can be
/// rendered back with their declared names.
///
/// ## Performance
///
/// The DAG maintains a `wire_front` index that maps each wire to the
/// last node before the output node, so `apply()` needs no edge scans
/// of the output node.
#[derive(Debug)]
pub struct CircuitDag {
    /// The underlying graph.
    graph: DiGraph<DagNode, DagEdge, u32>,
    /// Quantum registers in declaration order.
    qregs: Vec<QuantumRegister>,
    /// Classical registers in declaration order.
    cregs: Vec<ClassicalRegister>,
    /// Map from quantum register name to its first wire id.
    qreg_offsets: FxHashMap<String, u32>,
    /// Map from classical register name to its first wire id.
    creg_offsets: FxHashMap<String, u32>,
    /// Map from qubit to its input node.
    qubit_inputs: FxHashMap<QubitId, NodeIndex>,
    /// Map from qubit to its output node.
    qubit_outputs: FxHashMap<QubitId, NodeIndex>,
    /// Map from classical bit to its input node.
    clbit_inputs: FxHashMap<ClbitId, NodeIndex>,
    /// Map from classical bit to its output node.
    clbit_outputs: FxHashMap<ClbitId, NodeIndex>,
    /// Wire front: maps each wire to the node just before the output.
    wire_front: FxHashMap<WireId, NodeIndex>,
}

impl CircuitDag {
    /// Create a new empty circuit DAG.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::default(),
            qregs: vec![],
            cregs: vec![],
            qreg_offsets: FxHashMap::default(),
            creg_offsets: FxHashMap::default(),
            qubit_inputs: FxHashMap::default(),
            qubit_outputs: FxHashMap::default(),
            clbit_inputs: FxHashMap::default(),
            clbit_outputs: FxHashMap::default(),
            wire_front: FxHashMap::default(),
        }
    }

    /// Declare a quantum register, allocating one wire per lane.
    pub fn add_qreg(&mut self, register: QuantumRegister) -> IrResult<()> {
        if self.qreg_offsets.contains_key(&register.name) {
            return Err(IrError::RegisterExists(register.name));
        }
        let offset = u32::try_from(self.qubit_inputs.len()).expect("qubit count exceeds u32");
        self.qreg_offsets.insert(register.name.clone(), offset);
        for lane in 0..register.size {
            self.add_qubit_wire(QubitId(offset + lane));
        }
        self.qregs.push(register);
        Ok(())
    }

    /// Declare a classical register, allocating one wire per lane.
    pub fn add_creg(&mut self, register: ClassicalRegister) -> IrResult<()> {
        if self.creg_offsets.contains_key(&register.name) {
            return Err(IrError::RegisterExists(register.name));
        }
        let offset = u32::try_from(self.clbit_inputs.len()).expect("clbit count exceeds u32");
        self.creg_offsets.insert(register.name.clone(), offset);
        for lane in 0..register.size {
            self.add_clbit_wire(ClbitId(offset + lane));
        }
        self.cregs.push(register);
        Ok(())
    }

    fn add_qubit_wire(&mut self, qubit: QubitId) {
        let wire = WireId::Qubit(qubit);
        let in_node = self.graph.add_node(DagNode::In(wire));
        let out_node = self.graph.add_node(DagNode::Out(wire));
        self.graph.add_edge(in_node, out_node, DagEdge { wire });
        self.qubit_inputs.insert(qubit, in_node);
        self.qubit_outputs.insert(qubit, out_node);
        self.wire_front.insert(wire, in_node);
    }

    fn add_clbit_wire(&mut self, clbit: ClbitId) {
        let wire = WireId::Clbit(clbit);
        let in_node = self.graph.add_node(DagNode::In(wire));
        let out_node = self.graph.add_node(DagNode::Out(wire));
        self.graph.add_edge(in_node, out_node, DagEdge { wire });
        self.clbit_inputs.insert(clbit, in_node);
        self.clbit_outputs.insert(clbit, out_node);
        self.wire_front.insert(wire, in_node);
    }

    /// Resolve a register lane to its flat qubit id.
    pub fn qubit_id(&self, register: &str, index: u32) -> IrResult<QubitId> {
        let offset = self
            .qreg_offsets
            .get(register)
            .ok_or_else(|| IrError::UnknownRegister(register.to_string()))?;
        let reg = self
            .qregs
            .iter()
            .find(|r| r.name == register)
            .expect("offset table and register list must agree");
        if index >= reg.size {
            return Err(IrError::IndexOutOfRange {
                register: register.to_string(),
                index,
                size: reg.size,
            });
        }
        Ok(QubitId(offset + index))
    }

    /// Resolve a register lane to its flat classical bit id.
    pub fn clbit_id(&self, register: &str, index: u32) -> IrResult<ClbitId> {
        let offset = self
            .creg_offsets
            .get(register)
            .ok_or_else(|| IrError::UnknownRegister(register.to_string()))?;
        let reg = self
            .cregs
            .iter()
            .find(|r| r.name == register)
            .expect("offset table and register list must agree");
        if index >= reg.size {
            return Err(IrError::IndexOutOfRange {
                register: register.to_string(),
                index,
                size: reg.size,
            });
        }
        Ok(ClbitId(offset + index))
    }

    /// Look up the register name and lane index of a qubit wire.
    pub fn qubit_label(&self, qubit: QubitId) -> Option<(&str, u32)> {
        for reg in &self.qregs {
            let offset = self.qreg_offsets[&reg.name];
            if qubit.0 >= offset && qubit.0 < offset + reg.size {
                return Some((reg.name.as_str(), qubit.0 - offset));
            }
        }
        None
    }

    /// Look up the register name and lane index of a classical wire.
    pub fn clbit_label(&self, clbit: ClbitId) -> Option<(&str, u32)> {
        for reg in &self.cregs {
            let offset = self.creg_offsets[&reg.name];
            if clbit.0 >= offset && clbit.0 < offset + reg.size {
                return Some((reg.name.as_str(), clbit.0 - offset));
            }
        }
        None
    }

    /// Quantum registers in declaration order.
    pub fn qregs(&self) -> &[QuantumRegister] {
        &self.qregs
    }

    /// Classical registers in declaration order.
    pub fn cregs(&self) -> &[ClassicalRegister] {
        &self.cregs
    }

    /// All classical wires of a condition's register, for ordering
    /// conditioned operations against the measurements they read.
    fn condition_clbits(&self, condition: &ClassicalCondition) -> IrResult<Vec<ClbitId>> {
        let offset = self
            .creg_offsets
            .get(&condition.register)
            .ok_or_else(|| IrError::UnknownRegister(condition.register.clone()))?;
        let reg = self
            .cregs
            .iter()
            .find(|r| r.name == condition.register)
            .expect("offset table and register list must agree");
        Ok((0..reg.size).map(|lane| ClbitId(offset + lane)).collect())
    }

    /// Apply an instruction to the circuit.
    ///
    /// Validates that the operands exist, that gate arity matches, and
    /// that no qubit appears twice (aliasing), then splices the new
    /// operation node into every touched wire's chain. An instruction
    /// with a classical condition is also chained through every wire of
    /// the condition register, so it stays ordered against measurements
    /// writing that register.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<NodeIndex> {
        let gate_name = match &instruction.kind {
            InstructionKind::Gate(gate) => Some(gate.name().to_string()),
            _ => None,
        };

        if let InstructionKind::Gate(gate) = &instruction.kind {
            let expected = gate.num_qubits();
            let got = u32::try_from(instruction.qubits.len()).expect("qubit count exceeds u32");
            if expected != got {
                return Err(IrError::QubitCountMismatch {
                    gate_name: gate.name().to_string(),
                    expected,
                    got,
                });
            }
        }

        for &qubit in &instruction.qubits {
            if !self.qubit_inputs.contains_key(&qubit) {
                return Err(IrError::QubitNotFound {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        for &clbit in &instruction.clbits {
            if !self.clbit_inputs.contains_key(&clbit) {
                return Err(IrError::ClbitNotFound {
                    clbit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        let mut seen = FxHashSet::default();
        for &qubit in &instruction.qubits {
            if !seen.insert(qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        // Classical wires: explicit operands plus the condition register.
        let mut clbits = instruction.clbits.clone();
        if let Some(cond) = &instruction.condition {
            for clbit in self.condition_clbits(cond)? {
                if !clbits.contains(&clbit) {
                    clbits.push(clbit);
                }
            }
        }

        let qubits = instruction.qubits.clone();
        let op_node = self.graph.add_node(DagNode::Op(instruction));

        for &qubit in &qubits {
            self.splice(op_node, WireId::Qubit(qubit), self.qubit_outputs[&qubit])?;
        }
        for &clbit in &clbits {
            self.splice(op_node, WireId::Clbit(clbit), self.clbit_outputs[&clbit])?;
        }

        Ok(op_node)
    }

    /// Splice `op_node` into a wire's chain just before its output node.
    fn splice(&mut self, op_node: NodeIndex, wire: WireId, out_node: NodeIndex) -> IrResult<()> {
        let prev_node = self.wire_front[&wire];

        let edge_id = self
            .graph
            .edges_directed(prev_node, Direction::Outgoing)
            .find(|e| e.weight().wire == wire && e.target() == out_node)
            .map(|e| e.id());

        let eid = edge_id.ok_or_else(|| {
            IrError::InvalidDag(format!(
                "Missing edge from predecessor to output for wire {wire:?}"
            ))
        })?;
        self.graph.remove_edge(eid);
        self.graph.add_edge(prev_node, op_node, DagEdge { wire });
        self.graph.add_edge(op_node, out_node, DagEdge { wire });
        self.wire_front.insert(wire, op_node);
        Ok(())
    }

    /// Append another DAG's operations to this one.
    ///
    /// Wires are matched by register name and lane; every register of
    /// `other` must be declared here with the same size.
    pub fn compose(&mut self, other: &CircuitDag) -> IrResult<()> {
        for reg in other.qregs() {
            match self.qregs.iter().find(|r| r.name == reg.name) {
                None => return Err(IrError::UnknownRegister(reg.name.clone())),
                Some(mine) if mine.size != reg.size => {
                    return Err(IrError::InvalidDag(format!(
                        "compose: register '{}' has size {} here but {} in the appended circuit",
                        reg.name, mine.size, reg.size
                    )));
                }
                Some(_) => {}
            }
        }
        for reg in other.cregs() {
            match self.cregs.iter().find(|r| r.name == reg.name) {
                None => return Err(IrError::UnknownRegister(reg.name.clone())),
                Some(mine) if mine.size != reg.size => {
                    return Err(IrError::InvalidDag(format!(
                        "compose: register '{}' has size {} here but {} in the appended circuit",
                        reg.name, mine.size, reg.size
                    )));
                }
                Some(_) => {}
            }
        }

        for (_, inst) in other.topological_ops() {
            let mut remapped = inst.clone();
            remapped.qubits = inst
                .qubits
                .iter()
                .map(|&q| {
                    let (name, lane) = other
                        .qubit_label(q)
                        .ok_or_else(|| IrError::InvalidDag("unlabeled qubit wire".into()))?;
                    self.qubit_id(name, lane)
                })
                .collect::<IrResult<_>>()?;
            remapped.clbits = inst
                .clbits
                .iter()
                .map(|&c| {
                    let (name, lane) = other
                        .clbit_label(c)
                        .ok_or_else(|| IrError::InvalidDag("unlabeled classical wire".into()))?;
                    self.clbit_id(name, lane)
                })
                .collect::<IrResult<_>>()?;
            self.apply(remapped)?;
        }
        Ok(())
    }

    /// Iterate over operations in topological order.
    pub fn topological_ops(&self) -> impl Iterator<Item = (NodeIndex, &Instruction)> {
        petgraph::algo::toposort(&self.graph, None)
            .expect("DAG must be acyclic — cycle detected in circuit graph")
            .into_iter()
            .filter_map(|idx| {
                if let DagNode::Op(inst) = &self.graph[idx] {
                    Some((idx, inst))
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Operations with no operation predecessors: the first layer of
    /// the circuit, ready to be scheduled.
    pub fn front_layer(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph[idx].is_op()
                    && self
                        .graph
                        .edges_directed(idx, Direction::Incoming)
                        .all(|e| self.graph[e.source()].is_input())
            })
            .collect()
    }

    /// Direct operation successors of a node, deduplicated.
    pub fn successors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut seen = FxHashSet::default();
        let mut result = vec![];
        for edge in self.graph.edges_directed(node, Direction::Outgoing) {
            let target = edge.target();
            if self.graph[target].is_op() && seen.insert(target) {
                result.push(target);
            }
        }
        result
    }

    /// Get an instruction by node index.
    #[inline]
    pub fn get_instruction(&self, node: NodeIndex) -> Option<&Instruction> {
        self.graph.node_weight(node).and_then(|n| n.instruction())
    }

    /// Get the number of qubits.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.qubit_inputs.len()
    }

    /// Get the number of classical bits.
    #[inline]
    pub fn num_clbits(&self) -> usize {
        self.clbit_inputs.len()
    }

    /// Get the number of operations.
    #[inline]
    pub fn num_ops(&self) -> usize {
        let io_nodes = 2 * (self.qubit_inputs.len() + self.clbit_inputs.len());
        self.graph.node_count().saturating_sub(io_nodes)
    }

    /// Iterate over qubit wires.
    pub fn qubits(&self) -> impl Iterator<Item = QubitId> + '_ {
        self.qubit_inputs.keys().copied()
    }

    /// Calculate the circuit depth.
    pub fn depth(&self) -> usize {
        let node_count = self.graph.node_count();
        let mut depths: FxHashMap<NodeIndex, usize> =
            FxHashMap::with_capacity_and_hasher(node_count, Default::default());

        let mut max_depth = 0usize;

        for node in petgraph::algo::toposort(&self.graph, None)
            .expect("DAG must be acyclic — cycle detected in circuit graph")
        {
            let max_pred_depth = self
                .graph
                .edges_directed(node, Direction::Incoming)
                .map(|e| depths.get(&e.source()).copied().unwrap_or(0))
                .max()
                .unwrap_or(0);

            let node_depth = if matches!(self.graph[node], DagNode::Op(_)) {
                max_pred_depth + 1
            } else {
                max_pred_depth
            };

            if node_depth > max_depth {
                max_depth = node_depth;
            }
            depths.insert(node, node_depth);
        }

        max_depth
    }

    /// Get a reference to the underlying graph.
    pub fn graph(&self) -> &DiGraph<DagNode, DagEdge, u32> {
        &self.graph
    }

    /// Verify the structural integrity of the DAG.
    ///
    /// Checks that:
    /// - The graph is acyclic
    /// - Every wire has an In and an Out node
    /// - Wire edges form a valid chain from In to Out for each wire
    pub fn verify_integrity(&self) -> IrResult<()> {
        if petgraph::algo::is_cyclic_directed(&self.graph) {
            return Err(IrError::InvalidDag("Graph contains a cycle".into()));
        }

        for &qubit in self.qubit_inputs.keys() {
            if !self.qubit_outputs.contains_key(&qubit) {
                return Err(IrError::InvalidDag(format!(
                    "Qubit {qubit:?} has an In node but no Out node"
                )));
            }
        }
        for &clbit in self.clbit_inputs.keys() {
            if !self.clbit_outputs.contains_key(&clbit) {
                return Err(IrError::InvalidDag(format!(
                    "Clbit {clbit:?} has an In node but no Out node"
                )));
            }
        }

        let walk_wire = |wire: WireId, in_node: NodeIndex, out_node: NodeIndex| -> IrResult<()> {
            let mut current = in_node;
            let mut steps = 0;
            let max_steps = self.graph.node_count();

            while current != out_node {
                let next = self
                    .graph
                    .edges_directed(current, Direction::Outgoing)
                    .find(|e| e.weight().wire == wire)
                    .map(|e| e.target());

                match next {
                    Some(n) => current = n,
                    None => {
                        return Err(IrError::InvalidDag(format!(
                            "Wire {wire:?} is broken: no outgoing edge from node {current:?}"
                        )));
                    }
                }

                steps += 1;
                if steps > max_steps {
                    return Err(IrError::InvalidDag(format!(
                        "Wire {wire:?} has too many steps (possible loop)"
                    )));
                }
            }
            Ok(())
        };

        for (&qubit, &in_node) in &self.qubit_inputs {
            walk_wire(WireId::Qubit(qubit), in_node, self.qubit_outputs[&qubit])?;
        }
        for (&clbit, &in_node) in &self.clbit_inputs {
            walk_wire(WireId::Clbit(clbit), in_node, self.clbit_outputs[&clbit])?;
        }

        Ok(())
    }
}

impl Default for CircuitDag {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for CircuitDag {
    fn clone(&self) -> Self {
        Self {
            graph: self.graph.clone(),
            qregs: self.qregs.clone(),
            cregs: self.cregs.clone(),
            qreg_offsets: self.qreg_offsets.clone(),
            creg_offsets: self.creg_offsets.clone(),
            qubit_inputs: self.qubit_inputs.clone(),
            qubit_outputs: self.qubit_outputs.clone(),
            clbit_inputs: self.clbit_inputs.clone(),
            clbit_outputs: self.clbit_outputs.clone(),
            wire_front: self.wire_front.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::StandardGate;

    fn two_qubit_dag() -> CircuitDag {
        let mut dag = CircuitDag::new();
        dag.add_qreg(QuantumRegister::new("q", 2).unwrap()).unwrap();
        dag.add_creg(ClassicalRegister::new("c", 2).unwrap())
            .unwrap();
        dag
    }

    #[test]
    fn test_empty_dag() {
        let dag = CircuitDag::new();
        assert_eq!(dag.num_qubits(), 0);
        assert_eq!(dag.num_clbits(), 0);
        assert_eq!(dag.num_ops(), 0);
        assert_eq!(dag.depth(), 0);
        assert!(dag.front_layer().is_empty());
    }

    #[test]
    fn test_register_wires() {
        let mut dag = CircuitDag::new();
        dag.add_qreg(QuantumRegister::new("a", 2).unwrap()).unwrap();
        dag.add_qreg(QuantumRegister::new("b", 3).unwrap()).unwrap();

        assert_eq!(dag.num_qubits(), 5);
        assert_eq!(dag.qubit_id("a", 1).unwrap(), QubitId(1));
        assert_eq!(dag.qubit_id("b", 0).unwrap(), QubitId(2));
        assert_eq!(dag.qubit_label(QubitId(4)), Some(("b", 2)));
        assert!(matches!(
            dag.qubit_id("a", 2),
            Err(IrError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            dag.qubit_id("nope", 0),
            Err(IrError::UnknownRegister(_))
        ));
    }

    #[test]
    fn test_duplicate_register() {
        let mut dag = CircuitDag::new();
        dag.add_qreg(QuantumRegister::new("q", 2).unwrap()).unwrap();
        let result = dag.add_qreg(QuantumRegister::new("q", 2).unwrap());
        assert!(matches!(result, Err(IrError::RegisterExists(_))));
    }

    #[test]
    fn test_bell_state_depth() {
        let mut dag = two_qubit_dag();
        dag.apply(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        dag.apply(Instruction::two_qubit_gate(
            StandardGate::CX,
            QubitId(0),
            QubitId(1),
        ))
        .unwrap();

        assert_eq!(dag.num_ops(), 2);
        assert_eq!(dag.depth(), 2);
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_parallel_gates_depth() {
        let mut dag = two_qubit_dag();
        dag.apply(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        dag.apply(Instruction::single_qubit_gate(StandardGate::H, QubitId(1)))
            .unwrap();

        assert_eq!(dag.num_ops(), 2);
        assert_eq!(dag.depth(), 1);
    }

    #[test]
    fn test_gate_arity_mismatch() {
        let mut dag = two_qubit_dag();
        let inst = Instruction::gate(
            crate::gate::Gate::Standard(StandardGate::CX),
            [QubitId(0)],
        );
        let result = dag.apply(inst);

        match result {
            Err(IrError::QubitCountMismatch {
                gate_name,
                expected,
                got,
            }) => {
                assert_eq!(gate_name, "cx");
                assert_eq!(expected, 2);
                assert_eq!(got, 1);
            }
            other => panic!("Expected QubitCountMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_qubit_aliasing_rejected() {
        let mut dag = two_qubit_dag();
        let inst = Instruction::two_qubit_gate(StandardGate::CX, QubitId(0), QubitId(0));
        assert!(matches!(
            dag.apply(inst),
            Err(IrError::DuplicateQubit { .. })
        ));
    }

    #[test]
    fn test_qubit_not_found() {
        let mut dag = two_qubit_dag();
        let inst = Instruction::two_qubit_gate(StandardGate::CX, QubitId(0), QubitId(99));
        match dag.apply(inst) {
            Err(IrError::QubitNotFound { qubit, gate_name }) => {
                assert_eq!(qubit, QubitId(99));
                assert_eq!(gate_name, Some("cx".to_string()));
            }
            other => panic!("Expected QubitNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_front_layer_and_successors() {
        let mut dag = two_qubit_dag();
        let h = dag
            .apply(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        let cx = dag
            .apply(Instruction::two_qubit_gate(
                StandardGate::CX,
                QubitId(0),
                QubitId(1),
            ))
            .unwrap();

        // Only the H is in the front layer: the CX waits on q0.
        assert_eq!(dag.front_layer(), vec![h]);
        assert_eq!(dag.successors(h), vec![cx]);
        assert!(dag.successors(cx).is_empty());
    }

    #[test]
    fn test_condition_orders_against_measure() {
        let mut dag = two_qubit_dag();
        dag.apply(Instruction::measure(QubitId(0), ClbitId(0)))
            .unwrap();
        let conditioned = dag
            .apply(
                Instruction::single_qubit_gate(StandardGate::X, QubitId(1))
                    .with_condition(ClassicalCondition::new("c", 1)),
            )
            .unwrap();

        // The conditioned X reads c, so it cannot be in the front layer.
        assert!(!dag.front_layer().contains(&conditioned));
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_condition_unknown_register() {
        let mut dag = two_qubit_dag();
        let result = dag.apply(
            Instruction::single_qubit_gate(StandardGate::X, QubitId(0))
                .with_condition(ClassicalCondition::new("missing", 1)),
        );
        assert!(matches!(result, Err(IrError::UnknownRegister(_))));
    }

    #[test]
    fn test_compose() {
        let mut first = two_qubit_dag();
        first
            .apply(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();

        let mut second = two_qubit_dag();
        second
            .apply(Instruction::two_qubit_gate(
                StandardGate::CX,
                QubitId(0),
                QubitId(1),
            ))
            .unwrap();
        second
            .apply(Instruction::measure(QubitId(1), ClbitId(1)))
            .unwrap();

        first.compose(&second).unwrap();
        assert_eq!(first.num_ops(), 3);
        assert_eq!(first.depth(), 3);
        first.verify_integrity().unwrap();
    }

    #[test]
    fn test_compose_register_mismatch() {
        let mut first = two_qubit_dag();
        let mut second = CircuitDag::new();
        second
            .add_qreg(QuantumRegister::new("other", 2).unwrap())
            .unwrap();

        assert!(matches!(
            first.compose(&second),
            Err(IrError::UnknownRegister(_))
        ));
    }

    #[test]
    fn test_topological_order_respects_wires() {
        let mut dag = two_qubit_dag();
        dag.apply(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        dag.apply(Instruction::two_qubit_gate(
            StandardGate::CX,
            QubitId(0),
            QubitId(1),
        ))
        .unwrap();
        dag.apply(Instruction::measure(QubitId(0), ClbitId(0)))
            .unwrap();

        let names: Vec<_> = dag.topological_ops().map(|(_, i)| i.name()).collect();
        assert_eq!(names, vec!["h", "cx", "measure"]);
    }
}
