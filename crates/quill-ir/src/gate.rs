//! Quantum gate types.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{IrError, IrResult};

/// Standard gates with known semantics and fixed real-valued parameters.
///
/// The `u1`/`u2`/`u3`/`cx`/`id` subset is the hardware target basis; the
/// rest is the standard-library surface the emitter can name directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    /// Identity gate.
    I,
    /// Diagonal phase gate u1(λ).
    U1(f64),
    /// Single-qubit gate u2(φ, λ) = U(π/2, φ, λ).
    U2(f64, f64),
    /// Universal single-qubit gate u3(θ, φ, λ).
    U3(f64, f64, f64),
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// Rotation around X axis.
    Rx(f64),
    /// Rotation around Y axis.
    Ry(f64),
    /// Rotation around Z axis.
    Rz(f64),
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Y gate.
    CY,
    /// Controlled-Z gate.
    CZ,
    /// Controlled-Hadamard gate.
    CH,
    /// Controlled rotation around Z.
    CRz(f64),
    /// Controlled phase gate cu1(λ).
    CU1(f64),
    /// Controlled universal gate cu3(θ, φ, λ).
    CU3(f64, f64, f64),
    /// SWAP gate, the exchange operation inserted by routing.
    Swap,
    /// Toffoli gate (CCX).
    CCX,
}

impl StandardGate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::U1(_) => "u1",
            StandardGate::U2(_, _) => "u2",
            StandardGate::U3(_, _, _) => "u3",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::CX => "cx",
            StandardGate::CY => "cy",
            StandardGate::CZ => "cz",
            StandardGate::CH => "ch",
            StandardGate::CRz(_) => "crz",
            StandardGate::CU1(_) => "cu1",
            StandardGate::CU3(_, _, _) => "cu3",
            StandardGate::Swap => "swap",
            StandardGate::CCX => "ccx",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::I
            | StandardGate::U1(_)
            | StandardGate::U2(_, _)
            | StandardGate::U3(_, _, _)
            | StandardGate::X
            | StandardGate::Y
            | StandardGate::Z
            | StandardGate::H
            | StandardGate::S
            | StandardGate::Sdg
            | StandardGate::T
            | StandardGate::Tdg
            | StandardGate::Rx(_)
            | StandardGate::Ry(_)
            | StandardGate::Rz(_) => 1,

            StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::CH
            | StandardGate::CRz(_)
            | StandardGate::CU1(_)
            | StandardGate::CU3(_, _, _)
            | StandardGate::Swap => 2,

            StandardGate::CCX => 3,
        }
    }

    /// Get the parameters of this gate.
    pub fn params(&self) -> Vec<f64> {
        match self {
            StandardGate::U1(l) | StandardGate::CU1(l) => vec![*l],
            StandardGate::U2(p, l) => vec![*p, *l],
            StandardGate::U3(t, p, l) | StandardGate::CU3(t, p, l) => vec![*t, *p, *l],
            StandardGate::Rx(t) | StandardGate::Ry(t) | StandardGate::Rz(t) => vec![*t],
            StandardGate::CRz(t) => vec![*t],
            _ => vec![],
        }
    }

    /// Produce the algebraic inverse of this gate.
    ///
    /// The inverse acts on the same qubits and undoes the gate exactly:
    /// `u1(λ)⁻¹ = u1(-λ)`, `u2(φ,λ)⁻¹ = u2(-λ-π, -φ+π)`,
    /// `u3(θ,φ,λ)⁻¹ = u3(-θ,-λ,-φ)`, rotations negate their angle, and
    /// the Paulis, `h`, `cx`, `cz`, `swap`, and `ccx` are self-inverse.
    pub fn inverse(&self) -> StandardGate {
        match self {
            StandardGate::U1(l) => StandardGate::U1(-l),
            StandardGate::U2(p, l) => StandardGate::U2(-l - PI, -p + PI),
            StandardGate::U3(t, p, l) => StandardGate::U3(-t, -l, -p),
            StandardGate::S => StandardGate::Sdg,
            StandardGate::Sdg => StandardGate::S,
            StandardGate::T => StandardGate::Tdg,
            StandardGate::Tdg => StandardGate::T,
            StandardGate::Rx(t) => StandardGate::Rx(-t),
            StandardGate::Ry(t) => StandardGate::Ry(-t),
            StandardGate::Rz(t) => StandardGate::Rz(-t),
            StandardGate::CRz(t) => StandardGate::CRz(-t),
            StandardGate::CU1(l) => StandardGate::CU1(-l),
            StandardGate::CU3(t, p, l) => StandardGate::CU3(-t, -l, -p),
            other => other.clone(),
        }
    }

    /// Build a standard gate from its name and parameter list.
    ///
    /// Returns `None` for unknown names or mismatched parameter counts,
    /// in which case the caller should fall back to a [`CustomGate`].
    pub fn from_name(name: &str, params: &[f64]) -> Option<StandardGate> {
        match (name, params) {
            ("id", []) => Some(StandardGate::I),
            ("u1", [l]) => Some(StandardGate::U1(*l)),
            ("u2", [p, l]) => Some(StandardGate::U2(*p, *l)),
            ("u3", [t, p, l]) => Some(StandardGate::U3(*t, *p, *l)),
            ("x", []) => Some(StandardGate::X),
            ("y", []) => Some(StandardGate::Y),
            ("z", []) => Some(StandardGate::Z),
            ("h", []) => Some(StandardGate::H),
            ("s", []) => Some(StandardGate::S),
            ("sdg", []) => Some(StandardGate::Sdg),
            ("t", []) => Some(StandardGate::T),
            ("tdg", []) => Some(StandardGate::Tdg),
            ("rx", [t]) => Some(StandardGate::Rx(*t)),
            ("ry", [t]) => Some(StandardGate::Ry(*t)),
            ("rz", [t]) => Some(StandardGate::Rz(*t)),
            ("cx", []) => Some(StandardGate::CX),
            ("cy", []) => Some(StandardGate::CY),
            ("cz", []) => Some(StandardGate::CZ),
            ("ch", []) => Some(StandardGate::CH),
            ("crz", [t]) => Some(StandardGate::CRz(*t)),
            ("cu1", [l]) => Some(StandardGate::CU1(*l)),
            ("cu3", [t, p, l]) => Some(StandardGate::CU3(*t, *p, *l)),
            ("swap", []) => Some(StandardGate::Swap),
            ("ccx", []) => Some(StandardGate::CCX),
            _ => None,
        }
    }
}

/// A gate the IR has no built-in semantics for: an opaque declaration or
/// a basis gate outside the standard surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomGate {
    /// The name of the gate.
    pub name: String,
    /// The number of qubits it operates on.
    pub num_qubits: u32,
    /// Real-valued parameters of the gate.
    pub params: Vec<f64>,
}

impl CustomGate {
    /// Create a new custom gate.
    pub fn new(name: impl Into<String>, num_qubits: u32, params: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            params,
        }
    }
}

/// A quantum gate, either standard or custom.
///
/// Gate identity is structural: two gates are equal when their name,
/// parameters, and qubit count agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    /// A standard gate with known semantics.
    Standard(StandardGate),
    /// A custom gate known only by name.
    Custom(CustomGate),
}

impl Gate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &str {
        match self {
            Gate::Standard(g) => g.name(),
            Gate::Custom(g) => &g.name,
        }
    }

    /// Get the number of qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            Gate::Standard(g) => g.num_qubits(),
            Gate::Custom(g) => g.num_qubits,
        }
    }

    /// Get the parameters of this gate.
    pub fn params(&self) -> Vec<f64> {
        match self {
            Gate::Standard(g) => g.params(),
            Gate::Custom(g) => g.params.clone(),
        }
    }

    /// Produce the algebraic inverse of this gate.
    ///
    /// Custom gates have unknown semantics and cannot be inverted.
    pub fn inverse(&self) -> IrResult<Gate> {
        match self {
            Gate::Standard(g) => Ok(Gate::Standard(g.inverse())),
            Gate::Custom(g) => Err(IrError::NonInvertible(g.name.clone())),
        }
    }
}

impl From<StandardGate> for Gate {
    fn from(gate: StandardGate) -> Self {
        Gate::Standard(gate)
    }
}

impl From<CustomGate> for Gate {
    fn from(gate: CustomGate) -> Self {
        Gate::Custom(gate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_properties() {
        assert_eq!(StandardGate::H.num_qubits(), 1);
        assert_eq!(StandardGate::CX.num_qubits(), 2);
        assert_eq!(StandardGate::CCX.num_qubits(), 3);
        assert_eq!(StandardGate::U2(0.0, PI).name(), "u2");
        assert_eq!(StandardGate::U3(1.0, 2.0, 3.0).params(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_self_inverse_gates() {
        for gate in [
            StandardGate::I,
            StandardGate::X,
            StandardGate::H,
            StandardGate::CX,
            StandardGate::CZ,
            StandardGate::Swap,
            StandardGate::CCX,
        ] {
            assert_eq!(gate.inverse(), gate);
        }
    }

    #[test]
    fn test_parameterized_inverse() {
        assert_eq!(StandardGate::U1(0.5).inverse(), StandardGate::U1(-0.5));
        assert_eq!(StandardGate::S.inverse(), StandardGate::Sdg);
        assert_eq!(
            StandardGate::U3(0.1, 0.2, 0.3).inverse(),
            StandardGate::U3(-0.1, -0.3, -0.2)
        );
        // u2(φ,λ)⁻¹ = u2(-λ-π, -φ+π)
        assert_eq!(
            StandardGate::U2(0.2, 0.3).inverse(),
            StandardGate::U2(-0.3 - PI, -0.2 + PI)
        );
    }

    #[test]
    fn test_inverse_roundtrip() {
        let gate = StandardGate::U3(0.7, -1.1, 2.3);
        let twice = gate.inverse().inverse();
        for (a, b) in gate.params().iter().zip(twice.params().iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(
            StandardGate::from_name("u1", &[0.5]),
            Some(StandardGate::U1(0.5))
        );
        assert_eq!(StandardGate::from_name("cx", &[]), Some(StandardGate::CX));
        // Wrong arity falls through to custom handling.
        assert_eq!(StandardGate::from_name("u1", &[]), None);
        assert_eq!(StandardGate::from_name("mygate", &[]), None);
    }

    #[test]
    fn test_custom_gate_not_invertible() {
        let gate = Gate::Custom(CustomGate::new("pulse", 1, vec![0.1]));
        assert!(matches!(gate.inverse(), Err(IrError::NonInvertible(_))));
    }
}
