/// Arithmetic Expression Tool
///
/// A hand-written tokenizer and recursive-descent evaluator over f64. The
/// grammar is closed by construction: only numeric literals, the operators
/// + - * / % // ** with parentheses, and a fixed table of functions and
/// constants exist. There is no name lookup beyond that table, so arbitrary
/// identifiers cannot resolve to anything.
///
/// Operator semantics follow the conventional precedence rules, with
/// ** binding tighter than unary minus (-2**2 evaluates to -4) and
/// right-associating (2**3**2 evaluates to 512). Floor division and modulo
/// round toward negative infinity, so the remainder follows the divisor's
/// sign.

use futures_util::FutureExt;
use serde_json::{json, Value};

use crate::core::server::{ToolHandler, ToolOutcome, ToolRegistry, ToolSpec};

/// Register the calculate tool with the tool registry.
pub fn register(registry: &mut ToolRegistry) {
    let tool = ToolSpec {
        name: "calculate".to_string(),
        description: "Perform basic mathematical calculations".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Mathematical expression to evaluate (e.g., '2 + 2', 'sqrt(16)', 'sin(pi/2)')"
                }
            },
            "required": ["expression"],
        }),
    };

    let handler: ToolHandler = Box::new(|args: Value| async move { calculate(args) }.boxed());
    registry.register(tool, handler);
}

fn calculate(args: Value) -> ToolOutcome {
    let expression = match args.get("expression").and_then(|v| v.as_str()) {
        Some(e) if !e.trim().is_empty() => e,
        _ => return ToolOutcome::Failure("Expression is required".to_string()),
    };

    match evaluate(expression) {
        Ok(value) => {
            let (result, type_name) = number_value(value);
            ToolOutcome::Success(json!({
                "expression": expression,
                "result": result,
                "type": type_name,
            }))
        }
        Err(e) => ToolOutcome::Failure(format!("Calculation error: {}", e)),
    }
}

/// Largest magnitude at which every integer is exactly representable in f64.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

fn number_value(value: f64) -> (Value, &'static str) {
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        (json!(value as i64), "int")
    } else {
        (json!(value), "float")
    }
}

fn evaluate(expression: &str) -> Result<f64, String> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expression()?;
    if parser.pos != parser.tokens.len() {
        return Err("Unexpected trailing input".to_string());
    }
    if !value.is_finite() {
        return Err("result is not a finite number".to_string());
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
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    LParen,
    RParen,
    Comma,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            c if c.is_whitespace() => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    tokens.push(Token::DoubleStar);
                    i += 2;
                } else {
                    tokens.push(Token::Star);
                    i += 1;
                }
            }
            '/' => {
                if chars.get(i + 1) == Some(&'/') {
                    tokens.push(Token::DoubleSlash);
                    i += 2;
                } else {
                    tokens.push(Token::Slash);
                    i += 1;
                }
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                if i < chars.len() && chars[i] == '.' {
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                // Exponent suffix, only when followed by at least one digit
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| format!("Invalid number: {}", text))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            c => return Err(format!("Unexpected character '{}'", c)),
        }
    }

    if tokens.is_empty() {
        return Err("Expression is required".to_string());
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
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expression(&mut self) -> Result<f64, String> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, String> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err("Division by zero".to_string());
                    }
                    value /= rhs;
                }
                Some(Token::DoubleSlash) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err("Division by zero".to_string());
                    }
                    value = (value / rhs).floor();
                }
                Some(Token::Percent) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err("Modulo by zero".to_string());
                    }
                    value -= (value / rhs).floor() * rhs;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64, String> {
        match self.peek() {
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, String> {
        let base = self.atom()?;
        if matches!(self.peek(), Some(Token::DoubleStar)) {
            self.pos += 1;
            // Recursing through unary makes ** right-associative and lets
            // the exponent carry its own sign (2**-3)
            let exponent = self.unary()?;
            Ok(base.powf(exponent))
        } else {
            Ok(base)
        }
    }

    fn atom(&mut self) -> Result<f64, String> {
        match self.advance() {
            None => Err("Unexpected end of expression".to_string()),
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expression()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err("Expected ')'".to_string()),
                }
            }
            Some(Token::Ident(name)) => {
                if matches!(self.peek(), Some(Token::LParen)) {
                    self.pos += 1;
                    let args = self.arguments()?;
                    apply_function(&name, &args)
                } else {
                    constant(&name).ok_or_else(|| format!("Unknown constant: {}", name))
                }
            }
            Some(_) => Err("Unexpected token in expression".to_string()),
        }
    }

    fn arguments(&mut self) -> Result<Vec<f64>, String> {
        let mut args = Vec::new();
        if matches!(self.peek(), Some(Token::RParen)) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            match self.advance() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => break,
                _ => return Err("Expected ')'".to_string()),
            }
        }
        Ok(args)
    }
}

fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        _ => None,
    }
}

fn apply_function(name: &str, args: &[f64]) -> Result<f64, String> {
    fn single(name: &str, args: &[f64]) -> Result<f64, String> {
        match args {
            [x] => Ok(*x),
            _ => Err(format!("{}() takes exactly one argument", name)),
        }
    }

    match name {
        "abs" => Ok(single(name, args)?.abs()),
        "sqrt" => Ok(single(name, args)?.sqrt()),
        "sin" => Ok(single(name, args)?.sin()),
        "cos" => Ok(single(name, args)?.cos()),
        "tan" => Ok(single(name, args)?.tan()),
        "log10" => Ok(single(name, args)?.log10()),
        "exp" => Ok(single(name, args)?.exp()),
        "floor" => Ok(single(name, args)?.floor()),
        "ceil" => Ok(single(name, args)?.ceil()),
        "log" => match args {
            [x] => Ok(x.ln()),
            [x, base] => Ok(x.log(*base)),
            _ => Err("log() takes one or two arguments".to_string()),
        },
        "round" => match args {
            [x] => Ok(x.round()),
            [x, digits] if digits.fract() == 0.0 => {
                let factor = 10f64.powi(*digits as i32);
                Ok((x * factor).round() / factor)
            }
            _ => Err("round() expects an integer number of digits".to_string()),
        },
        "pow" => match args {
            [base, exponent] => Ok(base.powf(*exponent)),
            _ => Err("pow() takes exactly two arguments".to_string()),
        },
        "min" => args
            .iter()
            .copied()
            .reduce(f64::min)
            .ok_or_else(|| "min() expects at least one argument".to_string()),
        "max" => args
            .iter()
            .copied()
            .reduce(f64::max)
            .ok_or_else(|| "max() expects at least one argument".to_string()),
        "sum" => Ok(args.iter().sum()),
        _ => Err(format!("Unknown function: {}", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_of(expression: &str) -> Value {
        let outcome = calculate(json!({"expression": expression}));
        assert!(outcome.is_success(), "{} failed: {:?}", expression, outcome.payload());
        outcome.payload()
    }

    fn error_of(expression: &str) -> String {
        let outcome = calculate(json!({"expression": expression}));
        assert!(!outcome.is_success(), "{} unexpectedly succeeded", expression);
        outcome.payload()["error"].as_str().unwrap().to_string()
    }

    #[test]
    fn basic_arithmetic() {
        assert_eq!(result_of("2 + 2")["result"], 4);
        assert_eq!(result_of("2+3*4")["result"], 14);
        assert_eq!(result_of("(2+3)*4")["result"], 20);
        assert_eq!(result_of("10 / 4")["result"], 2.5);
    }

    #[test]
    fn integral_results_are_integers() {
        let payload = result_of("sqrt(16)");
        assert_eq!(payload["result"], 4);
        assert_eq!(payload["type"], "int");

        let payload = result_of("1 / 3");
        assert_eq!(payload["type"], "float");
    }

    #[test]
    fn power_binds_tighter_than_unary_minus() {
        assert_eq!(result_of("-2**2")["result"], -4);
        assert_eq!(result_of("(-2)**2")["result"], 4);
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(result_of("2**3**2")["result"], 512);
        assert_eq!(result_of("2**-1")["result"], 0.5);
    }

    #[test]
    fn floor_division_and_modulo_round_toward_negative_infinity() {
        assert_eq!(result_of("7//2")["result"], 3);
        assert_eq!(result_of("-7//2")["result"], -4);
        assert_eq!(result_of("-7 % 3")["result"], 2);
        assert_eq!(result_of("7 % -3")["result"], -2);
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(error_of("1/0"), "Calculation error: Division by zero");
        assert_eq!(error_of("5 // 0"), "Calculation error: Division by zero");
        assert_eq!(error_of("1 % 0"), "Calculation error: Modulo by zero");
    }

    #[test]
    fn function_table_is_available() {
        assert_eq!(result_of("abs(-3)")["result"], 3);
        assert_eq!(result_of("min(3, 1, 2)")["result"], 1);
        assert_eq!(result_of("max(3, 1, 2)")["result"], 3);
        assert_eq!(result_of("sum(1, 2, 3)")["result"], 6);
        assert_eq!(result_of("pow(2, 10)")["result"], 1024);
        let log2 = result_of("log(8, 2)")["result"].as_f64().unwrap();
        assert!((log2 - 3.0).abs() < 1e-9);
        assert_eq!(result_of("floor(2.9)")["result"], 2);
        assert_eq!(result_of("ceil(2.1)")["result"], 3);
        assert_eq!(result_of("round(2.567, 2)")["result"], 2.57);
    }

    #[test]
    fn constants_resolve() {
        let payload = result_of("cos(2 * pi)");
        assert_eq!(payload["result"], 1);
        let payload = result_of("log(e)");
        assert_eq!(payload["result"], 1);
    }

    #[test]
    fn trig_results_are_close() {
        let payload = result_of("sin(pi/2)");
        let value = payload["result"].as_f64().unwrap();
        assert!((value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn scientific_literals_parse() {
        assert_eq!(result_of("1e3 + 1")["result"], 1001);
        assert_eq!(result_of("2.5e-1")["result"], 0.25);
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(error_of("foo(1)"), "Calculation error: Unknown function: foo");
        assert_eq!(error_of("x + 1"), "Calculation error: Unknown constant: x");
    }

    #[test]
    fn dunder_escape_attempts_are_rejected() {
        let error = error_of("__import__('os')");
        assert!(error.starts_with("Calculation error:"));

        let error = error_of("eval(1)");
        assert_eq!(error, "Calculation error: Unknown function: eval");
    }

    #[test]
    fn malformed_expressions_are_rejected() {
        assert!(error_of("2 +").contains("Unexpected end"));
        assert!(error_of("(1 + 2").contains("Expected ')'"));
        assert!(error_of("2 2").contains("trailing"));
        assert!(error_of("$").contains("Unexpected character"));
    }

    #[test]
    fn blank_expression_is_rejected() {
        assert_eq!(error_of(""), "Expression is required");
        assert_eq!(error_of("   "), "Expression is required");

        let outcome = calculate(json!({}));
        assert_eq!(outcome.payload()["error"], "Expression is required");
    }

    #[test]
    fn overflowing_results_are_rejected() {
        assert!(error_of("2**10000").contains("finite"));
    }
}
