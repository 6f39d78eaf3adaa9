//! Lexer for `OpenQASM` 2.0.

use logos::Logos;

/// Tokens for `OpenQASM` 2.0.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
pub enum Token {
    // Keywords
    #[token("OPENQASM")]
    OpenQasm,

    #[token("include")]
    Include,

    #[token("qreg")]
    Qreg,

    #[token("creg")]
    Creg,

    #[token("gate")]
    Gate,

    #[token("opaque")]
    Opaque,

    #[token("barrier")]
    Barrier,

    #[token("if")]
    If,

    #[token("measure")]
    Measure,

    #[token("reset")]
    Reset,

    // Built-in gates (higher priority than identifier)
    #[token("U", priority = 3)]
    GateU,

    #[token("CX", priority = 3)]
    GateCX,

    // Constants
    #[token("pi")]
    Pi,

    // Literals
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Real(f64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u32>().ok())]
    NNInteger(u32),

    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        Some(s[1..s.len()-1].to_string())
    })]
    StringLiteral(String),

    // Identifiers
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // Operators and punctuation
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("^")]
    Caret,

    #[token("==")]
    EqEq,

    #[token("->")]
    Arrow,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::OpenQasm => write!(f, "OPENQASM"),
            Token::Include => write!(f, "include"),
            Token::Qreg => write!(f, "qreg"),
            Token::Creg => write!(f, "creg"),
            Token::Gate => write!(f, "gate"),
            Token::Opaque => write!(f, "opaque"),
            Token::Barrier => write!(f, "barrier"),
            Token::If => write!(f, "if"),
            Token::Measure => write!(f, "measure"),
            Token::Reset => write!(f, "reset"),
            Token::GateU => write!(f, "U"),
            Token::GateCX => write!(f, "CX"),
            Token::Pi => write!(f, "pi"),
            Token::Real(v) => write!(f, "{v}"),
            Token::NNInteger(v) => write!(f, "{v}"),
            Token::StringLiteral(s) => write!(f, "\"{s}\""),
            Token::Identifier(s) => write!(f, "{s}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::EqEq => write!(f, "=="),
            Token::Arrow => write!(f, "->"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
        }
    }
}

/// A token with its span information.
#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: std::ops::Range<usize>,
}

/// Tokenize a QASM source string.
pub fn tokenize(source: &str) -> Vec<Result<SpannedToken, (std::ops::Range<usize>, String)>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        if let Ok(token) = result {
            tokens.push(Ok(SpannedToken { token, span }));
        } else {
            let slice = &source[span.clone()];
            tokens.push(Err((span, format!("'{slice}'"))));
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header() {
        let source = "OPENQASM 2.0;";
        let tokens: Vec<_> = tokenize(source)
            .into_iter()
            .filter_map(Result::ok)
            .collect();

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].token, Token::OpenQasm);
        assert!(matches!(tokens[1].token, Token::Real(v) if (v - 2.0).abs() < 1e-9));
        assert_eq!(tokens[2].token, Token::Semicolon);
    }

    #[test]
    fn test_qreg_declaration() {
        let source = "qreg q[2];";
        let tokens: Vec<_> = tokenize(source)
            .into_iter()
            .filter_map(Result::ok)
            .collect();

        assert_eq!(tokens[0].token, Token::Qreg);
        assert!(matches!(tokens[1].token, Token::Identifier(ref s) if s == "q"));
        assert_eq!(tokens[2].token, Token::LBracket);
        assert!(matches!(tokens[3].token, Token::NNInteger(2)));
        assert_eq!(tokens[4].token, Token::RBracket);
        assert_eq!(tokens[5].token, Token::Semicolon);
    }

    #[test]
    fn test_builtin_gates() {
        let source = "U(0,0,pi) q[0]; CX q[0],q[1];";
        let tokens: Vec<_> = tokenize(source)
            .into_iter()
            .filter_map(Result::ok)
            .collect();

        assert_eq!(tokens[0].token, Token::GateU);
        assert!(tokens.iter().any(|t| t.token == Token::GateCX));
        assert!(tokens.iter().any(|t| t.token == Token::Pi));
    }

    #[test]
    fn test_measure_arrow() {
        let source = "measure q[0] -> c[0];";
        let tokens: Vec<_> = tokenize(source)
            .into_iter()
            .filter_map(Result::ok)
            .collect();

        assert_eq!(tokens[0].token, Token::Measure);
        assert!(tokens.iter().any(|t| t.token == Token::Arrow));
    }

    #[test]
    fn test_real_forms() {
        let source = "rx(0.5) q; ry(.25) q; rz(1e-3) q;";
        let reals: Vec<f64> = tokenize(source)
            .into_iter()
            .filter_map(Result::ok)
            .filter_map(|t| match t.token {
                Token::Real(v) => Some(v),
                _ => None,
            })
            .collect();

        assert_eq!(reals.len(), 3);
        assert!((reals[0] - 0.5).abs() < 1e-12);
        assert!((reals[1] - 0.25).abs() < 1e-12);
        assert!((reals[2] - 1e-3).abs() < 1e-12);
    }

    #[test]
    fn test_comments_skipped() {
        let source = r"
            // line comment
            qreg q[1];
            /* block
               comment */
            creg c[1];
        ";
        let tokens: Vec<_> = tokenize(source)
            .into_iter()
            .filter_map(Result::ok)
            .collect();

        // qreg q [ 1 ] ; creg c [ 1 ] ;
        assert_eq!(tokens.len(), 12);
    }

    #[test]
    fn test_invalid_token() {
        let source = "qreg q[2]; %";
        let results = tokenize(source);
        assert!(results.iter().any(Result::is_err));
    }
}
