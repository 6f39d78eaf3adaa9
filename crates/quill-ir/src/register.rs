//! Quantum and classical registers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};

/// Check a register name against the naming rule: a lowercase letter
/// followed by letters, digits, or underscores.
fn validate_name(name: &str) -> IrResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            first.is_ascii_lowercase()
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(IrError::InvalidRegisterName(name.to_string()))
    }
}

/// A named, sized collection of qubits.
///
/// Register identity is the name; one lane of a register (name plus
/// index) is the atomic unit operations act on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuantumRegister {
    /// The register name, unique within a circuit.
    pub name: String,
    /// Number of qubits in the register.
    pub size: u32,
}

impl QuantumRegister {
    /// Create a new quantum register.
    ///
    /// The name must start with a lowercase letter and contain only
    /// letters, digits, and underscores; the size must be at least 1.
    pub fn new(name: impl Into<String>, size: u32) -> IrResult<Self> {
        let name = name.into();
        validate_name(&name)?;
        if size == 0 {
            return Err(IrError::EmptyRegister(name));
        }
        Ok(Self { name, size })
    }
}

impl fmt::Display for QuantumRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.size)
    }
}

/// A named, sized collection of classical bits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassicalRegister {
    /// The register name, unique within a circuit.
    pub name: String,
    /// Number of bits in the register.
    pub size: u32,
}

impl ClassicalRegister {
    /// Create a new classical register.
    ///
    /// Naming and size rules match [`QuantumRegister::new`].
    pub fn new(name: impl Into<String>, size: u32) -> IrResult<Self> {
        let name = name.into();
        validate_name(&name)?;
        if size == 0 {
            return Err(IrError::EmptyRegister(name));
        }
        Ok(Self { name, size })
    }
}

impl fmt::Display for ClassicalRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.size)
    }
}
