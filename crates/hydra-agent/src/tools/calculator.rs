//! Tool: calculator — a restricted arithmetic grammar, not `eval`.
//!
//! Parses a small recursive-descent grammar that can only ever express
//! arithmetic plus a fixed set of named functions/constants. A denylist
//! substring check runs first anyway, even though the grammar itself cannot
//! express `import`/`exec`/etc.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::tool::{ParamType, Tool, ToolParameter, ToolResult};

const DENYLIST: &[&str] = &["__", "import", "exec", "eval", "open"];

static PARAMS: Lazy<Vec<ToolParameter>> = Lazy::new(|| {
    vec![ToolParameter::new(
        "expression",
        ParamType::String,
        "Mathematical expression to evaluate (e.g. '2 * 3 + 4', 'sqrt(16)', 'pow(2, 10)')",
        true,
    )]
});

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate a mathematical expression. Supports arithmetic, sqrt, sin, cos, log, pow, pi, e."
    }

    fn parameters(&self) -> &[ToolParameter] {
        &PARAMS
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let expr = match args.get("expression").and_then(|v| v.as_str()) {
            Some(e) => e,
            None => return ToolResult::error("missing required parameter: expression"),
        };

        if DENYLIST.iter().any(|bad| expr.contains(bad)) {
            return ToolResult::error("invalid expression");
        }

        match evaluate(expr) {
            Ok(value) => ToolResult::ok(serde_json::json!(value)),
            Err(e) => ToolResult::error(format!("calculation error: {e}")),
        }
    }
}

/// Parse and evaluate `expr` against the grammar:
///
/// ```text
/// expr   := term (('+' | '-') term)*
/// term   := factor (('*' | '/') factor)*
/// factor := power ('^' factor)?      -- right-associative
/// power  := '-' power | atom
/// atom   := number | const | func '(' expr (',' expr)* ')' | '(' expr ')'
/// ```
fn evaluate(expr: &str) -> Result<f64, String> {
    let mut parser = Parser { tokens: tokenize(expr)?, pos: 0 };
    let value = parser.parse_expr()?;
    if parser.pos != parser.tokens.len() {
        return Err("unexpected trailing input".to_string());
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
}

fn tokenize(expr: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = expr.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        match c {
            '+' => { tokens.push(Token::Plus); i += 1; }
            '-' => { tokens.push(Token::Minus); i += 1; }
            '*' => { tokens.push(Token::Star); i += 1; }
            '/' => { tokens.push(Token::Slash); i += 1; }
            '^' => { tokens.push(Token::Caret); i += 1; }
            '(' => { tokens.push(Token::LParen); i += 1; }
            ')' => { tokens.push(Token::RParen); i += 1; }
            ',' => { tokens.push(Token::Comma); i += 1; }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let n = text.parse::<f64>().map_err(|_| format!("bad number: {text}"))?;
                tokens.push(Token::Number(n));
            }
            c if c.is_ascii_alphabetic() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_alphanumeric() {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => return Err(format!("unexpected character: {other}")),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn parse_expr(&mut self) -> Result<f64, String> {
        let mut value = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => { self.advance(); value += self.parse_term()?; }
                Some(Token::Minus) => { self.advance(); value -= self.parse_term()?; }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_term(&mut self) -> Result<f64, String> {
        let mut value = self.parse_factor()?;
        loop {
            match self.peek() {
                Some(Token::Star) => { self.advance(); value *= self.parse_factor()?; }
                Some(Token::Slash) => {
                    self.advance();
                    let rhs = self.parse_factor()?;
                    if rhs == 0.0 {
                        return Err("division by zero".to_string());
                    }
                    value /= rhs;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_factor(&mut self) -> Result<f64, String> {
        let base = self.parse_unary()?;
        if matches!(self.peek(), Some(Token::Caret)) {
            self.advance();
            let exp = self.parse_factor()?; // right-associative
            return Ok(base.powf(exp));
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<f64, String> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.advance();
            return Ok(-self.parse_unary()?);
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<f64, String> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.parse_expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err("expected ')'".to_string()),
                }
            }
            Some(Token::Ident(name)) => self.parse_ident(&name),
            other => Err(format!("unexpected token: {other:?}")),
        }
    }

    fn parse_ident(&mut self, name: &str) -> Result<f64, String> {
        match name {
            "pi" => return Ok(std::f64::consts::PI),
            "e" => return Ok(std::f64::consts::E),
            _ => {}
        }

        if !matches!(self.peek(), Some(Token::LParen)) {
            return Err(format!("unknown identifier: {name}"));
        }
        self.advance(); // consume '('

        let mut args = vec![self.parse_expr()?];
        while matches!(self.peek(), Some(Token::Comma)) {
            self.advance();
            args.push(self.parse_expr()?);
        }
        match self.advance() {
            Some(Token::RParen) => {}
            _ => return Err("expected ')'".to_string()),
        }

        match (name, args.as_slice()) {
            ("sqrt", [x]) => Ok(x.sqrt()),
            ("sin", [x]) => Ok(x.sin()),
            ("cos", [x]) => Ok(x.cos()),
            ("log", [x]) => Ok(x.ln()),
            ("log", [x, base]) => Ok(x.log(*base)),
            ("pow", [base, exp]) => Ok(base.powf(*exp)),
            (name, _) => Err(format!("unknown function or wrong arity: {name}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_arithmetic() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(evaluate("2 ^ 3 ^ 2").unwrap(), 512.0);
    }

    #[test]
    fn named_functions_and_constants() {
        assert_eq!(evaluate("sqrt(16)").unwrap(), 4.0);
        assert_eq!(evaluate("pow(2, 10)").unwrap(), 1024.0);
        assert!((evaluate("pi").unwrap() - std::f64::consts::PI).abs() < 1e-9);
    }

    #[test]
    fn division_by_zero_is_rejected() {
        assert!(evaluate("1 / 0").is_err());
    }

    #[tokio::test]
    async fn denylisted_substrings_are_rejected_before_parsing() {
        let result = CalculatorTool.execute(serde_json::json!({"expression": "__import__('os')"})).await;
        assert!(!result.success);
        assert_eq!(result.error.unwrap(), "invalid expression");
    }

    #[tokio::test]
    async fn valid_expression_round_trips_through_the_tool() {
        let result = CalculatorTool.execute(serde_json::json!({"expression": "1 + 1"})).await;
        assert!(result.success);
        assert_eq!(result.output, serde_json::json!(2.0));
    }
}
