//! Layout passes for binding logical qubits to physical qubits.

use quill_ir::CircuitDag;

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::property::{Layout, PropertySet};

/// Trivial layout pass.
///
/// Binds logical qubit i to physical qubit i. Skips itself when a
/// caller-supplied initial layout is already present.
pub struct TrivialLayout;

impl Pass for TrivialLayout {
    fn name(&self) -> &'static str {
        "TrivialLayout"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
        let coupling_map = properties
            .coupling_map
            .as_ref()
            .ok_or(CompileError::MissingCouplingMap)?;

        let num_logical = dag.num_qubits();
        let num_physical = coupling_map.num_qubits();

        if num_logical > num_physical as usize {
            return Err(CompileError::CircuitTooLarge {
                required: num_logical,
                available: num_physical,
            });
        }

        let num_logical = u32::try_from(num_logical).expect("qubit count exceeds u32");
        properties.layout = Some(Layout::trivial(num_logical));

        Ok(())
    }

    fn should_run(&self, _dag: &CircuitDag, properties: &PropertySet) -> bool {
        properties.layout.is_none() && properties.coupling_map.is_some()
    }
}
