//! Swap routing: rewrite a circuit so every two-qubit operation acts
//! on hardware-adjacent qubits.

use tracing::debug;

use quill_ir::{
    CircuitDag, Instruction, InstructionKind, QuantumRegister, QubitId, StandardGate,
};

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::property::{Layout, PropertySet, RoutingSummary};

/// Greedy swap-insertion routing pass.
///
/// Rebuilds the DAG over the device's physical wires, processing the
/// source operations in topological order. Single-qubit operations are
/// relabeled through the current layout; a two-qubit operation on
/// non-adjacent physical qubits first gets one exchange per hop along
/// the shortest coupling-graph path (all but the final edge), each
/// updating the layout, and is then applied on the now-adjacent pair.
///
/// Paths are chosen per operation (greedy, not a whole-circuit
/// optimum) by edge count, ties broken toward lower physical indices.
/// The final layout stays in the `PropertySet`; the number of inserted
/// exchanges is published as [`RoutingSummary`].
pub struct SwapRouting;

impl Pass for SwapRouting {
    fn name(&self) -> &'static str {
        "SwapRouting"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
        let coupling = properties
            .coupling_map
            .as_ref()
            .ok_or(CompileError::MissingCouplingMap)?;
        let mut layout = properties.layout.take().ok_or(CompileError::MissingLayout)?;

        let mut mapped = CircuitDag::new();
        if coupling.num_qubits() > 0 {
            mapped.add_qreg(QuantumRegister::new("q", coupling.num_qubits())?)?;
        }
        for register in dag.cregs() {
            mapped.add_creg(register.clone())?;
        }

        let mut swaps_inserted = 0usize;

        for (_, instruction) in dag.topological_ops() {
            let is_two_qubit_gate = matches!(instruction.kind, InstructionKind::Gate(_))
                && instruction.qubits.len() == 2;

            if is_two_qubit_gate {
                let p0 = physical(&layout, instruction.qubits[0])?;
                let p1 = physical(&layout, instruction.qubits[1])?;

                if !coupling.is_connected(p0, p1) {
                    let path = coupling.shortest_path(p0, p1).ok_or(
                        CompileError::RoutingFailed {
                            qubit1: p0,
                            qubit2: p1,
                        },
                    )?;

                    // Exchange along the path until the pair is
                    // adjacent; the last edge carries the gate itself.
                    for hop in path.windows(2).take(path.len() - 2) {
                        mapped.apply(Instruction::two_qubit_gate(
                            StandardGate::Swap,
                            QubitId(hop[0]),
                            QubitId(hop[1]),
                        ))?;
                        layout.swap(hop[0], hop[1]);
                        swaps_inserted += 1;
                    }
                }
            }

            mapped.apply(relabel(instruction, &layout)?)?;
        }

        debug!(
            "routing complete: {} exchanges inserted, final depth {}",
            swaps_inserted,
            mapped.depth()
        );

        *dag = mapped;
        properties.layout = Some(layout);
        properties.insert(RoutingSummary { swaps_inserted });
        Ok(())
    }

    fn should_run(&self, _dag: &CircuitDag, properties: &PropertySet) -> bool {
        properties.coupling_map.is_some() && properties.layout.is_some()
    }
}

/// Resolve a logical qubit through the layout.
fn physical(layout: &Layout, logical: QubitId) -> CompileResult<u32> {
    layout
        .get_physical(logical)
        .ok_or(CompileError::IncompleteLayout(logical.0))
}

/// Rewrite an instruction onto the physical wires of the current
/// layout. Classical operands and conditions are untouched.
fn relabel(instruction: &Instruction, layout: &Layout) -> CompileResult<Instruction> {
    let mut relabeled = instruction.clone();
    relabeled.qubits = instruction
        .qubits
        .iter()
        .map(|&q| Ok(QubitId(physical(layout, q)?)))
        .collect::<CompileResult<_>>()?;
    Ok(relabeled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::TrivialLayout;
    use crate::property::{BasisGates, CouplingMap};
    use quill_ir::{ClassicalRegister, ClbitId, Gate, InstructionKind};

    fn dag_with(n: u32, build: impl FnOnce(&mut CircuitDag)) -> CircuitDag {
        let mut dag = CircuitDag::new();
        dag.add_qreg(QuantumRegister::new("q", n).unwrap()).unwrap();
        build(&mut dag);
        dag
    }

    fn route(dag: &mut CircuitDag, coupling: CouplingMap) -> CompileResult<PropertySet> {
        let mut props = PropertySet::new().with_target(coupling, BasisGates::default());
        TrivialLayout.run(dag, &mut props)?;
        SwapRouting.run(dag, &mut props)?;
        Ok(props)
    }

    fn assert_adjacency(dag: &CircuitDag, coupling: &CouplingMap) {
        for (_, inst) in dag.topological_ops() {
            if matches!(inst.kind, InstructionKind::Gate(_)) && inst.qubits.len() == 2 {
                assert!(
                    coupling.is_connected(inst.qubits[0].0, inst.qubits[1].0),
                    "{} on non-adjacent pair ({}, {})",
                    inst.name(),
                    inst.qubits[0].0,
                    inst.qubits[1].0
                );
            }
        }
    }

    #[test]
    fn test_adjacent_pair_needs_no_swap() {
        let mut dag = dag_with(2, |dag| {
            dag.apply(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
                .unwrap();
            dag.apply(Instruction::two_qubit_gate(
                StandardGate::CX,
                QubitId(0),
                QubitId(1),
            ))
            .unwrap();
        });

        let props = route(&mut dag, CouplingMap::linear(2)).unwrap();

        assert_eq!(dag.num_ops(), 2);
        assert_eq!(
            props.get::<RoutingSummary>(),
            Some(&RoutingSummary { swaps_inserted: 0 })
        );
        assert!(props.layout.as_ref().unwrap().is_identity());
    }

    #[test]
    fn test_distant_pair_gets_swaps() {
        let mut dag = dag_with(3, |dag| {
            dag.apply(Instruction::two_qubit_gate(
                StandardGate::CX,
                QubitId(0),
                QubitId(2),
            ))
            .unwrap();
        });

        let coupling = CouplingMap::linear(3);
        let props = route(&mut dag, coupling.clone()).unwrap();

        assert_eq!(
            props.get::<RoutingSummary>(),
            Some(&RoutingSummary { swaps_inserted: 1 })
        );
        assert_eq!(dag.num_ops(), 2); // swap + cx
        assert_adjacency(&dag, &coupling);

        // The swap moved logical 0 to physical 1.
        let layout = props.layout.as_ref().unwrap();
        assert_eq!(layout.get_physical(QubitId(0)), Some(1));
        assert_eq!(layout.get_physical(QubitId(1)), Some(0));
    }

    #[test]
    fn test_all_to_all_is_untouched() {
        let mut dag = dag_with(4, |dag| {
            for target in 1..4 {
                dag.apply(Instruction::two_qubit_gate(
                    StandardGate::CX,
                    QubitId(0),
                    QubitId(target),
                ))
                .unwrap();
            }
        });

        let props = route(&mut dag, CouplingMap::full(4)).unwrap();

        assert_eq!(dag.num_ops(), 3);
        assert_eq!(
            props.get::<RoutingSummary>(),
            Some(&RoutingSummary { swaps_inserted: 0 })
        );
        assert!(props.layout.as_ref().unwrap().is_identity());
    }

    #[test]
    fn test_disconnected_pair_fails() {
        let mut dag = dag_with(3, |dag| {
            dag.apply(Instruction::two_qubit_gate(
                StandardGate::CX,
                QubitId(0),
                QubitId(2),
            ))
            .unwrap();
        });

        let mut coupling = CouplingMap::new(3);
        coupling.add_edge(0, 1);

        match route(&mut dag, coupling) {
            Err(CompileError::RoutingFailed { qubit1, qubit2 }) => {
                assert_eq!((qubit1, qubit2), (0, 2));
            }
            other => panic!("expected RoutingFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_measure_follows_moved_qubit() {
        let mut dag = dag_with(3, |dag| {
            dag.add_creg(ClassicalRegister::new("c", 1).unwrap())
                .unwrap();
            dag.apply(Instruction::two_qubit_gate(
                StandardGate::CX,
                QubitId(0),
                QubitId(2),
            ))
            .unwrap();
            dag.apply(Instruction::measure(QubitId(0), ClbitId(0)))
                .unwrap();
        });

        route(&mut dag, CouplingMap::linear(3)).unwrap();

        let measure = dag
            .topological_ops()
            .map(|(_, i)| i.clone())
            .find(|i| i.is_measure())
            .unwrap();
        // Logical qubit 0 was swapped to physical 1 before the cx.
        assert_eq!(measure.qubits, vec![QubitId(1)]);
        assert_eq!(measure.clbits, vec![ClbitId(0)]);
    }

    #[test]
    fn test_long_chain_swap_count() {
        let mut dag = dag_with(5, |dag| {
            dag.apply(Instruction::two_qubit_gate(
                StandardGate::CX,
                QubitId(0),
                QubitId(4),
            ))
            .unwrap();
        });

        let coupling = CouplingMap::linear(5);
        let props = route(&mut dag, coupling.clone()).unwrap();

        // Distance 4 needs 3 exchanges before the gate.
        assert_eq!(
            props.get::<RoutingSummary>(),
            Some(&RoutingSummary { swaps_inserted: 3 })
        );
        assert_adjacency(&dag, &coupling);
    }

    #[test]
    fn test_supplied_initial_layout_respected() {
        let mut dag = dag_with(2, |dag| {
            dag.apply(Instruction::two_qubit_gate(
                StandardGate::CX,
                QubitId(0),
                QubitId(1),
            ))
            .unwrap();
        });

        let mut initial = Layout::new();
        initial.add(QubitId(0), 2);
        initial.add(QubitId(1), 1);

        let mut props = PropertySet::new()
            .with_target(CouplingMap::linear(3), BasisGates::default())
            .with_layout(initial);
        assert!(!TrivialLayout.should_run(&dag, &props));
        SwapRouting.run(&mut dag, &mut props).unwrap();

        let cx = dag.topological_ops().map(|(_, i)| i.clone()).next().unwrap();
        assert_eq!(cx.qubits, vec![QubitId(2), QubitId(1)]);
        assert_eq!(
            props.get::<RoutingSummary>(),
            Some(&RoutingSummary { swaps_inserted: 0 })
        );
    }

    #[test]
    fn test_swap_gates_are_swaps() {
        let mut dag = dag_with(3, |dag| {
            dag.apply(Instruction::two_qubit_gate(
                StandardGate::CX,
                QubitId(0),
                QubitId(2),
            ))
            .unwrap();
        });

        route(&mut dag, CouplingMap::linear(3)).unwrap();

        let names: Vec<_> = dag
            .topological_ops()
            .map(|(_, i)| i.name().to_string())
            .collect();
        assert_eq!(names, vec!["swap", "cx"]);
        let swap = dag.topological_ops().map(|(_, i)| i.clone()).next().unwrap();
        assert!(matches!(
            swap.kind,
            InstructionKind::Gate(Gate::Standard(StandardGate::Swap))
        ));
    }
}
