//! Abstract syntax tree for `OpenQASM` 2.0.
//!
//! Nodes are plain sum types; each can render itself back to canonical
//! source text at a chosen numeric precision. Construction never
//! validates semantics (register sizes, duplicate names, arities):
//! that is the unroller's single-pass job.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default number of decimal digits used when rendering real numbers.
pub const DEFAULT_PRECISION: usize = 15;

/// Render a real number so it re-parses as a real (never a bare
/// integer literal).
pub fn format_real(value: f64, prec: usize) -> String {
    let mut text = if prec == DEFAULT_PRECISION {
        // Shortest representation that round-trips through parsing.
        format!("{value}")
    } else {
        format!("{value:.prec$}")
    };
    if !text.contains('.') && !text.contains('e') && !text.contains('E') {
        text.push_str(".0");
    }
    text
}

/// A complete OpenQASM 2.0 program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainProgram {
    /// The declared version, always "2.0".
    pub version: String,
    /// Top-level statements in source order.
    pub statements: Vec<Statement>,
}

impl MainProgram {
    /// Render the program as canonical source text.
    pub fn qasm(&self, prec: usize) -> String {
        let mut out = format!("OPENQASM {};\n", self.version);
        for stmt in &self.statements {
            out.push_str(&stmt.qasm(prec));
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for MainProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qasm(DEFAULT_PRECISION))
    }
}

/// A top-level statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// Include directive: `include "qelib1.inc";`
    Include {
        /// The include path.
        path: String,
        /// Source line.
        line: usize,
    },

    /// Quantum register declaration: `qreg q[n];`
    QregDecl {
        /// Register name.
        name: String,
        /// Register size.
        size: u32,
        /// Source line.
        line: usize,
    },

    /// Classical register declaration: `creg c[n];`
    CregDecl {
        /// Register name.
        name: String,
        /// Register size.
        size: u32,
        /// Source line.
        line: usize,
    },

    /// Gate declaration with a body.
    GateDecl(GateDecl),

    /// Opaque gate declaration (no body): `opaque name(params) qubits;`
    OpaqueDecl {
        /// Gate name.
        name: String,
        /// Formal parameter names.
        params: Vec<String>,
        /// Formal qubit names.
        qubits: Vec<String>,
        /// Source line.
        line: usize,
    },

    /// Barrier: `barrier q, r[0];`
    Barrier {
        /// Arguments, registers or single lanes.
        args: Vec<Argument>,
        /// Source line.
        line: usize,
    },

    /// Conditional: `if (creg == value) qop;`
    If {
        /// The compared classical register.
        register: String,
        /// The value it must equal.
        value: u64,
        /// The gated operation.
        op: Qop,
        /// Source line.
        line: usize,
    },

    /// An unconditioned quantum operation.
    Qop(Qop),
}

impl Statement {
    /// Render this statement as canonical source text.
    pub fn qasm(&self, prec: usize) -> String {
        match self {
            Statement::Include { path, .. } => format!("include \"{path}\";"),
            Statement::QregDecl { name, size, .. } => format!("qreg {name}[{size}];"),
            Statement::CregDecl { name, size, .. } => format!("creg {name}[{size}];"),
            Statement::GateDecl(decl) => decl.qasm(prec),
            Statement::OpaqueDecl {
                name,
                params,
                qubits,
                ..
            } => {
                if params.is_empty() {
                    format!("opaque {name} {};", qubits.join(","))
                } else {
                    format!("opaque {name}({}) {};", params.join(","), qubits.join(","))
                }
            }
            Statement::Barrier { args, .. } => {
                let rendered: Vec<_> = args.iter().map(Argument::qasm).collect();
                format!("barrier {};", rendered.join(","))
            }
            Statement::If {
                register,
                value,
                op,
                ..
            } => format!("if({register}=={value}) {}", op.qasm(prec)),
            Statement::Qop(op) => op.qasm(prec),
        }
    }
}

/// A gate declaration: `gate name(params) qubits { body }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDecl {
    /// Gate name.
    pub name: String,
    /// Formal parameter names.
    pub params: Vec<String>,
    /// Formal qubit names.
    pub qubits: Vec<String>,
    /// Body statements, in order.
    pub body: Vec<GateBodyStatement>,
    /// Source line.
    pub line: usize,
}

impl GateDecl {
    /// Render this declaration as canonical source text.
    pub fn qasm(&self, prec: usize) -> String {
        let header = if self.params.is_empty() {
            format!("gate {} {}", self.name, self.qubits.join(","))
        } else {
            format!(
                "gate {}({}) {}",
                self.name,
                self.params.join(","),
                self.qubits.join(",")
            )
        };
        let mut out = format!("{header}\n{{\n");
        for stmt in &self.body {
            out.push_str("  ");
            out.push_str(&stmt.qasm(prec));
            out.push('\n');
        }
        out.push('}');
        out
    }
}

/// A statement allowed inside a gate body: gate calls and barriers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateBodyStatement {
    /// A gate invocation over formal arguments.
    Call(GateCall),
    /// A barrier over formal arguments.
    Barrier {
        /// Arguments, formal qubit names.
        args: Vec<Argument>,
        /// Source line.
        line: usize,
    },
}

impl GateBodyStatement {
    /// Render this body statement as canonical source text.
    pub fn qasm(&self, prec: usize) -> String {
        match self {
            GateBodyStatement::Call(call) => call.qasm(prec),
            GateBodyStatement::Barrier { args, .. } => {
                let rendered: Vec<_> = args.iter().map(Argument::qasm).collect();
                format!("barrier {};", rendered.join(","))
            }
        }
    }
}

/// A quantum operation: the statements `if` may gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Qop {
    /// A gate invocation (built-in `U`/`CX` or declared gate).
    Call(GateCall),
    /// Measurement: `measure q[0] -> c[0];`
    Measure {
        /// The measured qubit argument.
        qubit: Argument,
        /// The classical target argument.
        target: Argument,
        /// Source line.
        line: usize,
    },
    /// Reset: `reset q[0];`
    Reset {
        /// The reset qubit argument.
        arg: Argument,
        /// Source line.
        line: usize,
    },
}

impl Qop {
    /// Render this operation as canonical source text.
    pub fn qasm(&self, prec: usize) -> String {
        match self {
            Qop::Call(call) => call.qasm(prec),
            Qop::Measure { qubit, target, .. } => {
                format!("measure {} -> {};", qubit.qasm(), target.qasm())
            }
            Qop::Reset { arg, .. } => format!("reset {};", arg.qasm()),
        }
    }
}

/// A gate invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateCall {
    /// Gate name; builtin `U` and `CX` keep their reserved names.
    pub name: String,
    /// Parameter expressions.
    pub params: Vec<Expr>,
    /// Qubit arguments.
    pub args: Vec<Argument>,
    /// Source line.
    pub line: usize,
}

impl GateCall {
    /// Render this call as canonical source text.
    pub fn qasm(&self, prec: usize) -> String {
        let args: Vec<_> = self.args.iter().map(Argument::qasm).collect();
        if self.params.is_empty() {
            format!("{} {};", self.name, args.join(","))
        } else {
            let params: Vec<_> = self.params.iter().map(|p| p.qasm(prec)).collect();
            format!("{}({}) {};", self.name, params.join(","), args.join(","))
        }
    }
}

/// A register reference, whole (`q`) or indexed (`q[0]`).
///
/// Carries the source line so semantic errors found during unrolling
/// can point back at the reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    /// The referenced register (or formal qubit) name.
    pub register: String,
    /// The lane index, or `None` for a whole register.
    pub index: Option<u32>,
    /// Source line.
    pub line: usize,
}

impl Argument {
    /// Render this argument as canonical source text.
    pub fn qasm(&self) -> String {
        match self.index {
            Some(index) => format!("{}[{index}]", self.register),
            None => self.register.clone(),
        }
    }
}

/// Unary math functions allowed in parameter expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MathFn {
    Sin,
    Cos,
    Tan,
    Exp,
    Ln,
    Sqrt,
}

impl MathFn {
    /// The source-level name of this function.
    pub fn name(self) -> &'static str {
        match self {
            MathFn::Sin => "sin",
            MathFn::Cos => "cos",
            MathFn::Tan => "tan",
            MathFn::Exp => "exp",
            MathFn::Ln => "ln",
            MathFn::Sqrt => "sqrt",
        }
    }

    /// Look up a function by its source-level name.
    pub fn from_name(name: &str) -> Option<MathFn> {
        match name {
            "sin" => Some(MathFn::Sin),
            "cos" => Some(MathFn::Cos),
            "tan" => Some(MathFn::Tan),
            "exp" => Some(MathFn::Exp),
            "ln" => Some(MathFn::Ln),
            "sqrt" => Some(MathFn::Sqrt),
            _ => None,
        }
    }

    /// Apply this function to a value.
    pub fn apply(self, value: f64) -> f64 {
        match self {
            MathFn::Sin => value.sin(),
            MathFn::Cos => value.cos(),
            MathFn::Tan => value.tan(),
            MathFn::Exp => value.exp(),
            MathFn::Ln => value.ln(),
            MathFn::Sqrt => value.sqrt(),
        }
    }
}

/// Binary operators in parameter expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinOp {
    fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Pow => "^",
        }
    }

    fn precedence(self) -> u8 {
        match self {
            BinOp::Add | BinOp::Sub => 1,
            BinOp::Mul | BinOp::Div => 2,
            BinOp::Pow => 3,
        }
    }
}

/// A parameter expression.
///
/// Parenthesized groups fold into tree structure during parsing, so
/// rendering re-inserts parentheses only where precedence demands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Non-negative integer literal.
    Int(u32),
    /// Real literal.
    Real(f64),
    /// The constant pi.
    Pi,
    /// Reference to a formal gate parameter.
    Ident(String),
    /// Unary negation.
    Neg(Box<Expr>),
    /// Binary operation.
    BinOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Call to a math function: `sin(expr)` etc.
    Call { func: MathFn, arg: Box<Expr> },
}

impl Expr {
    /// Ordered children of this node, for generic tree walks.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Neg(e) | Expr::Call { arg: e, .. } => vec![e],
            Expr::BinOp { left, right, .. } => vec![left, right],
            _ => vec![],
        }
    }

    /// Evaluate with the given parameter bindings.
    ///
    /// Returns the name of the first unbound identifier on failure.
    pub fn eval(&self, bindings: &FxHashMap<String, f64>) -> Result<f64, String> {
        match self {
            Expr::Int(v) => Ok(f64::from(*v)),
            Expr::Real(v) => Ok(*v),
            Expr::Pi => Ok(std::f64::consts::PI),
            Expr::Ident(name) => bindings
                .get(name)
                .copied()
                .ok_or_else(|| name.clone()),
            Expr::Neg(e) => Ok(-e.eval(bindings)?),
            Expr::BinOp { op, left, right } => {
                let l = left.eval(bindings)?;
                let r = right.eval(bindings)?;
                Ok(match op {
                    BinOp::Add => l + r,
                    BinOp::Sub => l - r,
                    BinOp::Mul => l * r,
                    BinOp::Div => l / r,
                    BinOp::Pow => l.powf(r),
                })
            }
            Expr::Call { func, arg } => Ok(func.apply(arg.eval(bindings)?)),
        }
    }

    /// Render this expression as canonical source text.
    pub fn qasm(&self, prec: usize) -> String {
        self.render(prec, 0)
    }

    fn render(&self, prec: usize, parent: u8) -> String {
        match self {
            Expr::Int(v) => format!("{v}"),
            Expr::Real(v) => format_real(*v, prec),
            Expr::Pi => "pi".into(),
            Expr::Ident(name) => name.clone(),
            Expr::Neg(e) => {
                // Negation binds tighter than any binary operator.
                let text = format!("-{}", e.render(prec, 4));
                if parent > 0 { format!("({text})") } else { text }
            }
            Expr::BinOp { op, left, right } => {
                let my_prec = op.precedence();
                // Left-associative except ^, which associates right.
                let (lp, rp) = if *op == BinOp::Pow {
                    (my_prec + 1, my_prec)
                } else {
                    (my_prec, my_prec + 1)
                };
                let text = format!(
                    "{}{}{}",
                    left.render(prec, lp),
                    op.symbol(),
                    right.render(prec, rp)
                );
                if my_prec < parent {
                    format!("({text})")
                } else {
                    text
                }
            }
            Expr::Call { func, arg } => format!("{}({})", func.name(), arg.render(prec, 0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn no_bindings() -> FxHashMap<String, f64> {
        FxHashMap::default()
    }

    #[test]
    fn test_eval_pi_over_two() {
        let expr = Expr::BinOp {
            op: BinOp::Div,
            left: Box::new(Expr::Pi),
            right: Box::new(Expr::Int(2)),
        };
        let value = expr.eval(&no_bindings()).unwrap();
        assert!((value - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_eval_with_bindings() {
        let mut bindings = FxHashMap::default();
        bindings.insert("theta".to_string(), 0.5);
        let expr = Expr::Call {
            func: MathFn::Sin,
            arg: Box::new(Expr::Ident("theta".into())),
        };
        let value = expr.eval(&bindings).unwrap();
        assert!((value - 0.5f64.sin()).abs() < 1e-12);
    }

    #[test]
    fn test_eval_unbound() {
        let expr = Expr::Ident("phi".into());
        assert_eq!(expr.eval(&no_bindings()), Err("phi".to_string()));
    }

    #[test]
    fn test_render_precedence() {
        // (pi + 1) * 2 needs parentheses
        let expr = Expr::BinOp {
            op: BinOp::Mul,
            left: Box::new(Expr::BinOp {
                op: BinOp::Add,
                left: Box::new(Expr::Pi),
                right: Box::new(Expr::Int(1)),
            }),
            right: Box::new(Expr::Int(2)),
        };
        assert_eq!(expr.qasm(DEFAULT_PRECISION), "(pi+1)*2");

        // pi / 2 does not
        let expr = Expr::BinOp {
            op: BinOp::Div,
            left: Box::new(Expr::Pi),
            right: Box::new(Expr::Int(2)),
        };
        assert_eq!(expr.qasm(DEFAULT_PRECISION), "pi/2");
    }

    #[test]
    fn test_render_negation() {
        let expr = Expr::BinOp {
            op: BinOp::Div,
            left: Box::new(Expr::Neg(Box::new(Expr::Pi))),
            right: Box::new(Expr::Int(2)),
        };
        assert_eq!(expr.qasm(DEFAULT_PRECISION), "(-pi)/2");
    }

    #[test]
    fn test_format_real_always_reparses_as_real() {
        assert_eq!(format_real(2.0, DEFAULT_PRECISION), "2.0");
        assert_eq!(format_real(0.5, DEFAULT_PRECISION), "0.5");
        let fixed = format_real(PI, 6);
        assert_eq!(fixed, "3.141593");
    }

    #[test]
    fn test_statement_rendering() {
        let stmt = Statement::QregDecl {
            name: "q".into(),
            size: 3,
            line: 2,
        };
        assert_eq!(stmt.qasm(DEFAULT_PRECISION), "qreg q[3];");

        let call = GateCall {
            name: "u2".into(),
            params: vec![Expr::Int(0), Expr::Pi],
            args: vec![Argument {
                register: "q".into(),
                index: Some(0),
                line: 3,
            }],
            line: 3,
        };
        assert_eq!(call.qasm(DEFAULT_PRECISION), "u2(0,pi) q[0];");
    }

    #[test]
    fn test_if_rendering() {
        let stmt = Statement::If {
            register: "c".into(),
            value: 3,
            op: Qop::Reset {
                arg: Argument {
                    register: "q".into(),
                    index: Some(0),
                    line: 4,
                },
                line: 4,
            },
            line: 4,
        };
        assert_eq!(stmt.qasm(DEFAULT_PRECISION), "if(c==3) reset q[0];");
    }

    #[test]
    fn test_children() {
        let expr = Expr::BinOp {
            op: BinOp::Add,
            left: Box::new(Expr::Pi),
            right: Box::new(Expr::Int(1)),
        };
        assert_eq!(expr.children().len(), 2);
        assert!(Expr::Pi.children().is_empty());
    }
}
