//! End-to-end compilation scenarios.

use quill_compile::{CompileError, CouplingMap};
use quill_program::{CompileOptions, CompiledCircuit, CompilerError, QuantumProgram};

const BELL: &str = r#"
OPENQASM 2.0;
include "qelib1.inc";
qreg q[2];
creg c[2];
h q[0];
cx q[0],q[1];
measure q[0] -> c[0];
measure q[1] -> c[1];
"#;

fn program_with(name: &str, source: &str) -> QuantumProgram {
    let mut program = QuantumProgram::new();
    program.load_qasm_text(name, source).unwrap();
    program
}

#[test]
fn bell_pair_on_connected_device() {
    let program = program_with("bell", BELL);
    let options = CompileOptions::default()
        .with_coupling_map(CouplingMap::from_adjacency([(0, vec![1])]));

    let batch = program.compile(&["bell"], &options).unwrap();
    let bell = batch.get("bell").unwrap();

    let cx_ops: Vec<_> = bell.operations.iter().filter(|op| op.name == "cx").collect();
    assert_eq!(cx_ops.len(), 1);
    assert_eq!(cx_ops[0].qubits, vec![0, 1]);

    let measures = bell
        .operations
        .iter()
        .filter(|op| op.name == "measure")
        .count();
    assert_eq!(measures, 2);

    assert_eq!(bell.swaps_inserted, 0);
    assert!(!bell.operations.iter().any(|op| op.name == "swap"));

    // Identity layout on both lanes.
    let layout = bell.layout.as_ref().unwrap();
    assert!(layout.iter().all(|entry| entry.index == entry.physical));
}

#[test]
fn disconnected_routing_fails_naming_the_pair() {
    let source = r#"
OPENQASM 2.0;
include "qelib1.inc";
qreg q[3];
cx q[0],q[2];
"#;
    let program = program_with("far", source);

    // Qubits {0, 1, 2} with only the 0-1 edge.
    let mut coupling = CouplingMap::new(3);
    coupling.add_edge(0, 1);
    let options = CompileOptions::default().with_coupling_map(coupling);

    match program.compile(&["far"], &options) {
        Err(CompilerError::CircuitFailed { name, source }) => {
            assert_eq!(name, "far");
            match *source {
                CompilerError::Routing(CompileError::RoutingFailed { qubit1, qubit2 }) => {
                    assert_eq!((qubit1, qubit2), (0, 2));
                }
                other => panic!("expected RoutingFailed, got {other:?}"),
            }
        }
        other => panic!("expected CircuitFailed, got {other:?}"),
    }
}

#[test]
fn duplicate_register_with_conflicting_size() {
    let source = "OPENQASM 2.0;\nqreg q[4];\nqreg q[3];";
    let program = program_with("dup", source);

    match program.compile(&["dup"], &CompileOptions::default()) {
        Err(CompilerError::CircuitFailed { source, .. }) => match *source {
            CompilerError::Unroll(quill_qasm2::UnrollError::RegisterSizeConflict {
                existing,
                requested,
                ..
            }) => {
                assert_eq!(existing, 4);
                assert_eq!(requested, 3);
            }
            other => panic!("expected RegisterSizeConflict, got {other:?}"),
        },
        other => panic!("expected CircuitFailed, got {other:?}"),
    }
}

#[test]
fn all_to_all_mapping_is_identity() {
    let source = r#"
OPENQASM 2.0;
include "qelib1.inc";
qreg q[4];
cx q[0],q[3];
cx q[1],q[2];
cx q[3],q[1];
"#;
    let program = program_with("dense", source);
    let options = CompileOptions::default().with_coupling_map(CouplingMap::full(4));

    let batch = program.compile(&["dense"], &options).unwrap();
    let dense = batch.get("dense").unwrap();

    assert_eq!(dense.swaps_inserted, 0);
    let layout = dense.layout.as_ref().unwrap();
    assert!(layout.iter().all(|entry| entry.index == entry.physical));
}

#[test]
fn linear_chain_routing_satisfies_adjacency() {
    let source = r#"
OPENQASM 2.0;
include "qelib1.inc";
qreg q[5];
creg c[5];
h q[0];
cx q[0],q[4];
cx q[1],q[3];
measure q[0] -> c[0];
"#;
    let program = program_with("spread", source);
    let coupling = CouplingMap::linear(5);
    let options = CompileOptions::default().with_coupling_map(coupling.clone());

    let batch = program.compile(&["spread"], &options).unwrap();
    let spread = batch.get("spread").unwrap();

    assert!(spread.swaps_inserted > 0);
    for op in &spread.operations {
        if op.name != "measure" && op.name != "barrier" && op.qubits.len() == 2 {
            assert!(
                coupling.is_connected(op.qubits[0], op.qubits[1]),
                "{} on non-adjacent pair {:?}",
                op.name,
                op.qubits
            );
        }
    }
}

#[test]
fn compiled_operations_stay_in_basis() {
    let source = r#"
OPENQASM 2.0;
include "qelib1.inc";
qreg q[3];
creg c[3];
ccx q[0],q[1],q[2];
barrier q;
swap q[0],q[2];
measure q -> c;
"#;
    let program = program_with("rich", source);
    let batch = program.compile(&["rich"], &CompileOptions::default()).unwrap();
    let rich = batch.get("rich").unwrap();

    for op in &rich.operations {
        assert!(
            rich.basis_gates.iter().any(|g| g == &op.name)
                || matches!(op.name.as_str(), "measure" | "barrier" | "reset"),
            "operation '{}' escaped the basis",
            op.name
        );
    }
}

#[test]
fn compiled_qasm_recompiles_to_same_shape() {
    let program = program_with("bell", BELL);
    let options = CompileOptions::default().with_coupling_map(CouplingMap::linear(2));

    let batch = program.compile(&["bell"], &options).unwrap();
    let first = batch.get("bell").unwrap();

    // The emitted text is itself a valid program over the same basis.
    let mut second_program = QuantumProgram::new();
    second_program.load_qasm_text("again", &first.qasm).unwrap();
    let second_batch = second_program
        .compile(&["again"], &CompileOptions::default())
        .unwrap();
    let second = second_batch.get("again").unwrap();

    assert_eq!(second.operations.len(), first.operations.len());
    fn names(circuit: &CompiledCircuit) -> Vec<&str> {
        let mut names: Vec<&str> = circuit
            .operations
            .iter()
            .map(|op| op.name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
    assert_eq!(names(first), names(second));
}

#[test]
fn conditional_survives_the_full_pipeline() {
    let source = r#"
OPENQASM 2.0;
include "qelib1.inc";
qreg q[2];
creg c[2];
h q[0];
measure q[0] -> c[0];
if(c==1) x q[1];
"#;
    let program = program_with("cond", source);
    let options = CompileOptions::default().with_coupling_map(CouplingMap::linear(2));

    let batch = program.compile(&["cond"], &options).unwrap();
    let cond = batch.get("cond").unwrap();

    let gated: Vec<_> = cond
        .operations
        .iter()
        .filter(|op| op.condition.is_some())
        .collect();
    assert_eq!(gated.len(), 1);
    let condition = gated[0].condition.as_ref().unwrap();
    assert_eq!(condition.register, "c");
    assert_eq!(condition.value, 1);
}

#[test]
fn structured_form_roundtrips_through_json() {
    let program = program_with("bell", BELL);
    let options = CompileOptions::default()
        .with_coupling_map(CouplingMap::linear(2))
        .with_request_id("req-7");

    let batch = program.compile(&["bell"], &options).unwrap();
    assert_eq!(batch.id.as_deref(), Some("req-7"));

    let bell = batch.get("bell").unwrap();
    let json = bell.to_json().unwrap();
    let restored = CompiledCircuit::from_json(&json).unwrap();
    assert_eq!(&restored, bell);
}

#[test]
fn batch_compiles_multiple_independent_circuits() {
    let mut program = QuantumProgram::new();
    program.load_qasm_text("bell", BELL).unwrap();
    program
        .load_qasm_text(
            "ghz",
            r#"
OPENQASM 2.0;
include "qelib1.inc";
qreg q[3];
creg c[3];
h q[0];
cx q[0],q[1];
cx q[1],q[2];
measure q -> c;
"#,
        )
        .unwrap();

    let batch = program
        .compile(&["bell", "ghz"], &CompileOptions::default())
        .unwrap();
    assert_eq!(batch.circuits.len(), 2);
    assert!(batch.get("bell").is_some());
    assert!(batch.get("ghz").is_some());
}
