//! Parser for `OpenQASM` 2.0.

use crate::ast::{
    Argument, BinOp, Expr, GateBodyStatement, GateCall, GateDecl, MainProgram, MathFn, Qop,
    Statement,
};
use crate::error::{ParseError, ParseResult};
use crate::lexer::{SpannedToken, Token, tokenize};

/// Parse a QASM source string into an AST.
pub fn parse(source: &str) -> ParseResult<MainProgram> {
    Parser::new(source, None)?.parse_program()
}

/// Parse a QASM file into an AST, threading the file name into
/// diagnostics.
pub fn parse_file(path: &str) -> ParseResult<MainProgram> {
    let source = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_string(),
        source,
    })?;
    Parser::new(&source, Some(path.to_string()))?.parse_program()
}

/// Parser state.
struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    /// Byte offsets where each source line begins, for span → line/column.
    line_starts: Vec<usize>,
    file: Option<String>,
}

impl Parser {
    /// Create a new parser from source.
    fn new(source: &str, file: Option<String>) -> ParseResult<Self> {
        let mut line_starts = vec![0];
        for (offset, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset + 1);
            }
        }

        let mut tokens = Vec::new();
        for result in tokenize(source) {
            match result {
                Ok(t) => tokens.push(t),
                Err((span, message)) => {
                    let (line, column) = position(&line_starts, span.start);
                    return Err(ParseError::Lexer {
                        line,
                        column,
                        file,
                        message,
                    });
                }
            }
        }

        Ok(Self {
            tokens,
            pos: 0,
            line_starts,
            file,
        })
    }

    /// Check if we've reached the end.
    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Peek at the current token.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    /// Advance and return the current token.
    fn advance(&mut self) -> Option<Token> {
        if self.is_eof() {
            return None;
        }
        let token = self.tokens[self.pos].token.clone();
        self.pos += 1;
        Some(token)
    }

    /// Line and column of the current token (1-based).
    fn here(&self) -> (usize, usize) {
        let offset = self
            .tokens
            .get(self.pos.min(self.tokens.len().saturating_sub(1)))
            .map_or(0, |t| t.span.start);
        position(&self.line_starts, offset)
    }

    /// Line of the current token.
    fn line(&self) -> usize {
        self.here().0
    }

    /// Build an unexpected-token error at the current position.
    fn unexpected(&self, expected: impl Into<String>, found: &Token) -> ParseError {
        let (line, column) = self.here();
        ParseError::UnexpectedToken {
            line,
            column,
            file: self.file.clone(),
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    /// Expect a specific token.
    fn expect(&mut self, expected: &Token) -> ParseResult<()> {
        match self.peek().cloned() {
            Some(found) if std::mem::discriminant(&found) == std::mem::discriminant(expected) => {
                self.advance();
                Ok(())
            }
            Some(found) => Err(self.unexpected(expected.to_string(), &found)),
            None => Err(ParseError::UnexpectedEof {
                expected: expected.to_string(),
            }),
        }
    }

    /// Check if current token matches.
    fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(token))
    }

    /// Consume token if it matches.
    fn consume(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Parse the entire program.
    fn parse_program(&mut self) -> ParseResult<MainProgram> {
        self.expect(&Token::OpenQasm)?;
        let version = self.parse_version()?;
        self.expect(&Token::Semicolon)?;

        let mut statements = Vec::new();
        while !self.is_eof() {
            statements.push(self.parse_statement()?);
        }

        Ok(MainProgram {
            version,
            statements,
        })
    }

    /// Parse and check the version number.
    fn parse_version(&mut self) -> ParseResult<String> {
        match self.advance() {
            Some(Token::Real(v)) if (v - 2.0).abs() < f64::EPSILON => Ok("2.0".to_string()),
            Some(other) => Err(ParseError::UnsupportedVersion {
                found: other.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: "version number".into(),
            }),
        }
    }

    /// Parse a top-level statement.
    fn parse_statement(&mut self) -> ParseResult<Statement> {
        let token = self.peek().cloned().ok_or(ParseError::UnexpectedEof {
            expected: "statement".into(),
        })?;

        match token {
            Token::Include => self.parse_include(),
            Token::Qreg => self.parse_qreg_decl(),
            Token::Creg => self.parse_creg_decl(),
            Token::Gate => self.parse_gate_decl(),
            Token::Opaque => self.parse_opaque_decl(),
            Token::Barrier => self.parse_barrier(),
            Token::If => self.parse_if(),
            Token::Measure | Token::Reset | Token::Identifier(_) | Token::GateU | Token::GateCX => {
                Ok(Statement::Qop(self.parse_qop()?))
            }
            other => Err(self.unexpected("statement", &other)),
        }
    }

    /// Parse an include statement.
    fn parse_include(&mut self) -> ParseResult<Statement> {
        let line = self.line();
        self.expect(&Token::Include)?;
        let path = match self.advance() {
            Some(Token::StringLiteral(s)) => s,
            Some(other) => return Err(self.unexpected("string literal", &other)),
            None => {
                return Err(ParseError::UnexpectedEof {
                    expected: "include path".into(),
                });
            }
        };
        self.expect(&Token::Semicolon)?;
        Ok(Statement::Include { path, line })
    }

    /// Parse a quantum register declaration.
    fn parse_qreg_decl(&mut self) -> ParseResult<Statement> {
        let line = self.line();
        self.expect(&Token::Qreg)?;
        let name = self.parse_identifier()?;
        self.expect(&Token::LBracket)?;
        let size = self.parse_nninteger()?;
        self.expect(&Token::RBracket)?;
        self.expect(&Token::Semicolon)?;
        Ok(Statement::QregDecl { name, size, line })
    }

    /// Parse a classical register declaration.
    fn parse_creg_decl(&mut self) -> ParseResult<Statement> {
        let line = self.line();
        self.expect(&Token::Creg)?;
        let name = self.parse_identifier()?;
        self.expect(&Token::LBracket)?;
        let size = self.parse_nninteger()?;
        self.expect(&Token::RBracket)?;
        self.expect(&Token::Semicolon)?;
        Ok(Statement::CregDecl { name, size, line })
    }

    /// Parse a gate declaration with body.
    fn parse_gate_decl(&mut self) -> ParseResult<Statement> {
        let line = self.line();
        self.expect(&Token::Gate)?;
        let name = self.parse_identifier()?;

        let params = if self.consume(&Token::LParen) {
            let p = if self.check(&Token::RParen) {
                vec![]
            } else {
                self.parse_identifier_list()?
            };
            self.expect(&Token::RParen)?;
            p
        } else {
            vec![]
        };

        let qubits = self.parse_identifier_list()?;

        self.expect(&Token::LBrace)?;
        let mut body = Vec::new();
        while !self.check(&Token::RBrace) {
            body.push(self.parse_gate_body_statement()?);
        }
        self.expect(&Token::RBrace)?;

        Ok(Statement::GateDecl(GateDecl {
            name,
            params,
            qubits,
            body,
            line,
        }))
    }

    /// Parse a statement inside a gate body: a gate call or a barrier.
    fn parse_gate_body_statement(&mut self) -> ParseResult<GateBodyStatement> {
        let token = self.peek().cloned().ok_or(ParseError::UnexpectedEof {
            expected: "gate body statement".into(),
        })?;

        match token {
            Token::Barrier => {
                let line = self.line();
                self.advance();
                let args = self.parse_argument_list()?;
                self.expect(&Token::Semicolon)?;
                Ok(GateBodyStatement::Barrier { args, line })
            }
            Token::Identifier(_) | Token::GateU | Token::GateCX => {
                Ok(GateBodyStatement::Call(self.parse_gate_call()?))
            }
            other => Err(self.unexpected("gate call or barrier", &other)),
        }
    }

    /// Parse an opaque gate declaration.
    fn parse_opaque_decl(&mut self) -> ParseResult<Statement> {
        let line = self.line();
        self.expect(&Token::Opaque)?;
        let name = self.parse_identifier()?;

        let params = if self.consume(&Token::LParen) {
            let p = if self.check(&Token::RParen) {
                vec![]
            } else {
                self.parse_identifier_list()?
            };
            self.expect(&Token::RParen)?;
            p
        } else {
            vec![]
        };

        let qubits = self.parse_identifier_list()?;
        self.expect(&Token::Semicolon)?;

        Ok(Statement::OpaqueDecl {
            name,
            params,
            qubits,
            line,
        })
    }

    /// Parse a barrier statement.
    fn parse_barrier(&mut self) -> ParseResult<Statement> {
        let line = self.line();
        self.expect(&Token::Barrier)?;
        let args = self.parse_argument_list()?;
        self.expect(&Token::Semicolon)?;
        Ok(Statement::Barrier { args, line })
    }

    /// Parse a conditional statement.
    fn parse_if(&mut self) -> ParseResult<Statement> {
        let line = self.line();
        self.expect(&Token::If)?;
        self.expect(&Token::LParen)?;
        let register = self.parse_identifier()?;
        self.expect(&Token::EqEq)?;
        let value = u64::from(self.parse_nninteger()?);
        self.expect(&Token::RParen)?;
        let op = self.parse_qop()?;

        Ok(Statement::If {
            register,
            value,
            op,
            line,
        })
    }

    /// Parse a quantum operation: measure, reset, or gate call.
    fn parse_qop(&mut self) -> ParseResult<Qop> {
        let token = self.peek().cloned().ok_or(ParseError::UnexpectedEof {
            expected: "quantum operation".into(),
        })?;

        match token {
            Token::Measure => {
                let line = self.line();
                self.advance();
                let qubit = self.parse_argument()?;
                self.expect(&Token::Arrow)?;
                let target = self.parse_argument()?;
                self.expect(&Token::Semicolon)?;
                Ok(Qop::Measure {
                    qubit,
                    target,
                    line,
                })
            }
            Token::Reset => {
                let line = self.line();
                self.advance();
                let arg = self.parse_argument()?;
                self.expect(&Token::Semicolon)?;
                Ok(Qop::Reset { arg, line })
            }
            Token::Identifier(_) | Token::GateU | Token::GateCX => {
                Ok(Qop::Call(self.parse_gate_call()?))
            }
            other => Err(self.unexpected("quantum operation", &other)),
        }
    }

    /// Parse a gate invocation, including builtin `U` and `CX`.
    fn parse_gate_call(&mut self) -> ParseResult<GateCall> {
        let line = self.line();
        let name = match self.advance() {
            Some(Token::Identifier(s)) => s,
            Some(Token::GateU) => "U".to_string(),
            Some(Token::GateCX) => "CX".to_string(),
            Some(other) => return Err(self.unexpected("gate name", &other)),
            None => {
                return Err(ParseError::UnexpectedEof {
                    expected: "gate name".into(),
                });
            }
        };

        let params = if self.consume(&Token::LParen) {
            let p = if self.check(&Token::RParen) {
                vec![]
            } else {
                self.parse_expression_list()?
            };
            self.expect(&Token::RParen)?;
            p
        } else {
            vec![]
        };

        let args = self.parse_argument_list()?;
        self.expect(&Token::Semicolon)?;

        Ok(GateCall {
            name,
            params,
            args,
            line,
        })
    }

    /// Parse a comma-separated argument list.
    fn parse_argument_list(&mut self) -> ParseResult<Vec<Argument>> {
        let mut args = vec![self.parse_argument()?];
        while self.consume(&Token::Comma) {
            args.push(self.parse_argument()?);
        }
        Ok(args)
    }

    /// Parse a single argument: `reg` or `reg[index]`.
    fn parse_argument(&mut self) -> ParseResult<Argument> {
        let line = self.line();
        let register = self.parse_identifier()?;

        let index = if self.consume(&Token::LBracket) {
            let index = self.parse_nninteger()?;
            self.expect(&Token::RBracket)?;
            Some(index)
        } else {
            None
        };

        Ok(Argument {
            register,
            index,
            line,
        })
    }

    /// Parse a comma-separated expression list.
    fn parse_expression_list(&mut self) -> ParseResult<Vec<Expr>> {
        let mut exprs = vec![self.parse_expression()?];
        while self.consume(&Token::Comma) {
            exprs.push(self.parse_expression()?);
        }
        Ok(exprs)
    }

    /// Parse an expression.
    fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_binary_expr(0)
    }

    /// Parse a binary expression with precedence climbing.
    fn parse_binary_expr(&mut self, min_prec: u8) -> ParseResult<Expr> {
        let mut left = self.parse_unary_expr()?;

        while let Some(op) = self.peek_binary_op() {
            let prec = op_precedence(op);
            if prec < min_prec {
                break;
            }
            self.advance();

            // ^ is right-associative; everything else associates left.
            let next_min = if op == BinOp::Pow { prec } else { prec + 1 };
            let right = self.parse_binary_expr(next_min)?;
            left = Expr::BinOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse a unary expression.
    fn parse_unary_expr(&mut self) -> ParseResult<Expr> {
        if self.consume(&Token::Minus) {
            let expr = self.parse_unary_expr()?;
            return Ok(Expr::Neg(Box::new(expr)));
        }
        self.parse_primary_expr()
    }

    /// Parse a primary expression.
    fn parse_primary_expr(&mut self) -> ParseResult<Expr> {
        let token = self.peek().cloned().ok_or(ParseError::UnexpectedEof {
            expected: "expression".into(),
        })?;

        match token {
            Token::NNInteger(v) => {
                self.advance();
                Ok(Expr::Int(v))
            }
            Token::Real(v) => {
                self.advance();
                Ok(Expr::Real(v))
            }
            Token::Pi => {
                self.advance();
                Ok(Expr::Pi)
            }
            Token::Identifier(name) => {
                self.advance();
                if let Some(func) = MathFn::from_name(&name) {
                    self.expect(&Token::LParen)?;
                    let arg = self.parse_expression()?;
                    self.expect(&Token::RParen)?;
                    Ok(Expr::Call {
                        func,
                        arg: Box::new(arg),
                    })
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            Token::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&Token::RParen)?;
                // Grouping folds into tree structure; no node is kept.
                Ok(expr)
            }
            other => Err(self.unexpected("expression", &other)),
        }
    }

    /// Peek at a binary operator.
    fn peek_binary_op(&self) -> Option<BinOp> {
        match self.peek()? {
            Token::Plus => Some(BinOp::Add),
            Token::Minus => Some(BinOp::Sub),
            Token::Star => Some(BinOp::Mul),
            Token::Slash => Some(BinOp::Div),
            Token::Caret => Some(BinOp::Pow),
            _ => None,
        }
    }

    /// Parse a comma-separated identifier list.
    fn parse_identifier_list(&mut self) -> ParseResult<Vec<String>> {
        let mut ids = vec![self.parse_identifier()?];
        while self.consume(&Token::Comma) {
            ids.push(self.parse_identifier()?);
        }
        Ok(ids)
    }

    /// Parse an identifier.
    fn parse_identifier(&mut self) -> ParseResult<String> {
        match self.peek().cloned() {
            Some(Token::Identifier(s)) => {
                self.advance();
                Ok(s)
            }
            Some(other) => Err(self.unexpected("identifier", &other)),
            None => Err(ParseError::UnexpectedEof {
                expected: "identifier".into(),
            }),
        }
    }

    /// Parse a non-negative integer literal.
    fn parse_nninteger(&mut self) -> ParseResult<u32> {
        match self.peek().cloned() {
            Some(Token::NNInteger(v)) => {
                self.advance();
                Ok(v)
            }
            Some(other) => Err(self.unexpected("integer", &other)),
            None => Err(ParseError::UnexpectedEof {
                expected: "integer".into(),
            }),
        }
    }
}

/// Get operator precedence.
fn op_precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Add | BinOp::Sub => 1,
        BinOp::Mul | BinOp::Div => 2,
        BinOp::Pow => 3,
    }
}

/// Convert a byte offset to a 1-based (line, column) pair.
fn position(line_starts: &[usize], offset: usize) -> (usize, usize) {
    let line = line_starts.partition_point(|&start| start <= offset);
    let column = offset - line_starts[line - 1] + 1;
    (line, column)
}
