//! Arithmetic tool: digits, `+ - * /`, parentheses, decimals, whitespace.
//! Anything outside that alphabet is refused before parsing.

use mind_core::Tool;
use serde_json::Value;

const REJECTION: &str = "math: only arithmetic allowed";

pub struct MathEval;

#[async_trait::async_trait]
impl Tool for MathEval {
    fn name(&self) -> &str {
        "math"
    }

    async fn invoke(&self, input: &Value) -> Value {
        let expr = input.get("expr").and_then(|v| v.as_str()).unwrap_or("0");
        serde_json::json!({ "ok": true, "result": math_eval(expr) })
    }
}

/// Evaluates a whitelisted arithmetic expression to a display string.
/// Never panics; malformed input yields an error string instead.
pub fn math_eval(expr: &str) -> String {
    if !allowed(expr) {
        return REJECTION.to_string();
    }
    let mut parser = Parser::new(expr);
    match parser.expression() {
        Ok(value) if parser.at_end() => format_number(value),
        Ok(_) => "math error: unexpected trailing input".to_string(),
        Err(e) => format!("math error: {e}"),
    }
}

fn allowed(expr: &str) -> bool {
    expr.chars().all(|c| {
        c.is_ascii_digit() || c.is_whitespace() || matches!(c, '+' | '-' | '*' | '/' | '(' | ')' | '.')
    })
}

/// Integral results print without a fractional part; division by zero prints
/// as `Infinity`, matching what the canvas client renders.
fn format_number(x: f64) -> String {
    if x.is_nan() {
        "NaN".to_string()
    } else if x.is_infinite() {
        if x > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{x}")
    }
}

/// Recursive-descent parser with standard precedence:
/// expression := term (('+'|'-') term)*
/// term       := factor (('*'|'/') factor)*
/// factor     := ('+'|'-')* atom
/// atom       := number | '(' expression ')'
struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(expr: &str) -> Self {
        Self {
            chars: expr.chars().filter(|c| !c.is_whitespace()).collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn expression(&mut self) -> Result<f64, String> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                '+' => {
                    self.pos += 1;
                    value += self.term()?;
                }
                '-' => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, String> {
        let mut value = self.factor()?;
        while let Some(op) = self.peek() {
            match op {
                '*' => {
                    self.pos += 1;
                    value *= self.factor()?;
                }
                '/' => {
                    self.pos += 1;
                    value /= self.factor()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64, String> {
        match self.peek() {
            Some('+') => {
                self.pos += 1;
                self.factor()
            }
            Some('-') => {
                self.pos += 1;
                Ok(-self.factor()?)
            }
            _ => self.atom(),
        }
    }

    fn atom(&mut self) -> Result<f64, String> {
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                let value = self.expression()?;
                match self.peek() {
                    Some(')') => {
                        self.pos += 1;
                        Ok(value)
                    }
                    _ => Err("missing closing parenthesis".to_string()),
                }
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) => Err(format!("unexpected '{c}'")),
            None => Err("unexpected end of expression".to_string()),
        }
    }

    fn number(&mut self) -> Result<f64, String> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        literal
            .parse::<f64>()
            .map_err(|_| format!("bad number '{literal}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_multiplies_before_adding() {
        assert_eq!(math_eval("2 + 2 * 5"), "12");
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(math_eval("(2 + 2) * 5"), "20");
    }

    #[test]
    fn decimals_and_unary_minus() {
        assert_eq!(math_eval("1.5 * 2"), "3");
        assert_eq!(math_eval("-3 + 1"), "-2");
        assert_eq!(math_eval("2 * -3"), "-6");
        assert_eq!(math_eval("3 / 2"), "1.5");
    }

    #[test]
    fn division_by_zero_prints_infinity() {
        assert_eq!(math_eval("1 / 0"), "Infinity");
        assert_eq!(math_eval("-1 / 0"), "-Infinity");
    }

    #[test]
    fn letters_are_rejected_before_parsing() {
        assert_eq!(math_eval("2 + two"), REJECTION);
        assert_eq!(math_eval("process.exit()"), REJECTION);
        assert_eq!(math_eval("1; 2"), REJECTION);
    }

    #[test]
    fn malformed_input_is_an_error_string_not_a_panic() {
        assert!(math_eval("1 +").starts_with("math error:"));
        assert!(math_eval("(1 + 2").starts_with("math error:"));
        assert!(math_eval("").starts_with("math error:"));
        assert!(math_eval("1..2").starts_with("math error:"));
        assert!(math_eval(")(").starts_with("math error:"));
    }

    #[tokio::test]
    async fn tool_wraps_result_in_ok_envelope() {
        let out = MathEval
            .invoke(&serde_json::json!({ "expr": "2 + 2 * 5" }))
            .await;
        assert_eq!(out["ok"], true);
        assert_eq!(out["result"], "12");
    }

    #[tokio::test]
    async fn missing_expr_defaults_to_zero() {
        let out = MathEval.invoke(&serde_json::json!({})).await;
        assert_eq!(out["result"], "0");
    }
}
