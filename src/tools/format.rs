/// Number Formatting Tool
///
/// Fixed-point or scientific rendering of a number with a configurable
/// number of decimal places. Scientific notation uses a signed two-digit
/// exponent ("1.23e+03").

use futures_util::FutureExt;
use serde_json::{json, Value};

use crate::core::server::{ToolHandler, ToolOutcome, ToolRegistry, ToolSpec};

/// Register the format_number tool with the tool registry.
pub fn register(registry: &mut ToolRegistry) {
    let tool = ToolSpec {
        name: "format_number".to_string(),
        description: "Format a number with various options".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "number": {
                    "type": "number",
                    "description": "Number to format"
                },
                "decimals": {
                    "type": "integer",
                    "description": "Number of decimal places",
                    "default": 2
                },
                "scientific": {
                    "type": "boolean",
                    "description": "Use scientific notation",
                    "default": false
                }
            },
            "required": ["number"],
        }),
    };

    let handler: ToolHandler = Box::new(|args: Value| async move { format_number(args) }.boxed());
    registry.register(tool, handler);
}

fn format_number(args: Value) -> ToolOutcome {
    let original = match args.get("number") {
        None => return ToolOutcome::Failure("number is required".to_string()),
        Some(v) => v.clone(),
    };
    let number = match original.as_f64() {
        Some(n) => n,
        None => return ToolOutcome::Failure("number must be a number".to_string()),
    };

    let decimals = match args.get("decimals") {
        None => 2,
        Some(v) => match v.as_u64() {
            Some(d) => d as usize,
            None => {
                return ToolOutcome::Failure(
                    "decimals must be a non-negative integer".to_string(),
                );
            }
        },
    };

    let scientific = match args.get("scientific") {
        None => false,
        Some(v) => match v.as_bool() {
            Some(b) => b,
            None => return ToolOutcome::Failure("scientific must be a boolean".to_string()),
        },
    };

    let formatted = if scientific {
        scientific_notation(number, decimals)
    } else {
        format!("{:.*}", decimals, number)
    };

    ToolOutcome::Success(json!({
        "original": original,
        "formatted": formatted,
        "decimals": decimals,
        "scientific_notation": scientific,
    }))
}

/// Render with a signed, zero-padded exponent of at least two digits.
fn scientific_notation(number: f64, decimals: usize) -> String {
    let raw = format!("{:.*e}", decimals, number);
    match raw.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(rest) => ("-", rest),
                None => ("+", exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => raw,
    }
}
