/// Random Number Tool
///
/// Uniform draws over a closed range, singly or in batches. The batch size
/// is capped by MAX_RANDOM_NUMBERS from the configuration. Draws are not
/// cryptographically secure.

use std::sync::Arc;

use futures_util::FutureExt;
use rand::Rng;
use serde_json::{json, Value};

use crate::core::config::Config;
use crate::core::server::{ToolHandler, ToolOutcome, ToolRegistry, ToolSpec};

/// Register the generate_random_number tool with the tool registry.
pub fn register(registry: &mut ToolRegistry, config: &Arc<Config>) {
    let max_count = config.max_random_numbers;

    let tool = ToolSpec {
        name: "generate_random_number".to_string(),
        description: "Generate a random number within a specified range".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "min_value": {
                    "type": "number",
                    "description": "Minimum value (inclusive)",
                    "default": 1
                },
                "max_value": {
                    "type": "number",
                    "description": "Maximum value (inclusive)",
                    "default": 100
                },
                "count": {
                    "type": "integer",
                    "description": "Number of random numbers to generate",
                    "default": 1,
                    "minimum": 1,
                    "maximum": max_count
                }
            },
            "required": [],
        }),
    };

    let handler: ToolHandler =
        Box::new(move |args: Value| async move { generate(args, max_count) }.boxed());
    registry.register(tool, handler);
}

fn generate(args: Value, max_count: u64) -> ToolOutcome {
    let min_value = args.get("min_value").cloned().unwrap_or(json!(1));
    let max_value = args.get("max_value").cloned().unwrap_or(json!(100));

    let min = match min_value.as_f64() {
        Some(n) => n,
        None => return ToolOutcome::Failure("min_value must be a number".to_string()),
    };
    let max = match max_value.as_f64() {
        Some(n) => n,
        None => return ToolOutcome::Failure("max_value must be a number".to_string()),
    };
    if min >= max {
        return ToolOutcome::Failure("min_value must be less than max_value".to_string());
    }

    // Rejects floats and booleans, not just out-of-range integers
    let count = match args.get("count") {
        None => 1,
        Some(v) => match v.as_i64() {
            Some(c) if c >= 1 && c as u64 <= max_count => c as u64,
            _ => {
                return ToolOutcome::Failure(format!(
                    "count must be an integer between 1 and {}",
                    max_count
                ));
            }
        },
    };

    let mut rng = rand::thread_rng();
    if count == 1 {
        ToolOutcome::Success(json!({
            "random_number": rng.gen_range(min..=max),
            "min_value": min_value,
            "max_value": max_value,
            "type": "single",
        }))
    } else {
        let numbers: Vec<f64> = (0..count).map(|_| rng.gen_range(min..=max)).collect();
        ToolOutcome::Success(json!({
            "random_numbers": numbers,
            "count": count,
            "min_value": min_value,
            "max_value": max_value,
            "type": "multiple",
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_draw_stays_in_range() {
        let payload = generate(json!({"min_value": 5, "max_value": 10}), 100).payload();
        assert_eq!(payload["type"], "single");
        let n = payload["random_number"].as_f64().unwrap();
        assert!((5.0..=10.0).contains(&n));
        assert_eq!(payload["min_value"], 5);
        assert_eq!(payload["max_value"], 10);
    }

    #[test]
    fn defaults_cover_one_to_one_hundred() {
        let payload = generate(json!({}), 100).payload();
        let n = payload["random_number"].as_f64().unwrap();
        assert!((1.0..=100.0).contains(&n));
    }

    #[test]
    fn batch_draw_returns_requested_count() {
        let payload =
            generate(json!({"min_value": 0, "max_value": 1, "count": 7}), 100).payload();
        assert_eq!(payload["type"], "multiple");
        assert_eq!(payload["count"], 7);
        let numbers = payload["random_numbers"].as_array().unwrap();
        assert_eq!(numbers.len(), 7);
        for n in numbers {
            let n = n.as_f64().unwrap();
            assert!((0.0..=1.0).contains(&n));
        }
    }

    #[test]
    fn non_numeric_bounds_are_rejected() {
        let outcome = generate(json!({"min_value": "low"}), 100);
        assert_eq!(outcome.payload()["error"], "min_value must be a number");

        let outcome = generate(json!({"max_value": true}), 100);
        assert_eq!(outcome.payload()["error"], "max_value must be a number");
    }

    #[test]
    fn inverted_range_is_rejected() {
        let outcome = generate(json!({"min_value": 10, "max_value": 5}), 100);
        assert_eq!(
            outcome.payload()["error"],
            "min_value must be less than max_value"
        );
    }

    #[test]
    fn equal_bounds_are_rejected() {
        let outcome = generate(json!({"min_value": 5, "max_value": 5}), 100);
        assert!(!outcome.is_success());
    }

    #[test]
    fn count_bounds_are_enforced() {
        let message = "count must be an integer between 1 and 100";
        assert_eq!(generate(json!({"count": 0}), 100).payload()["error"], message);
        assert_eq!(generate(json!({"count": 101}), 100).payload()["error"], message);
        assert_eq!(generate(json!({"count": 2.5}), 100).payload()["error"], message);

        assert!(generate(json!({"count": 100}), 100).is_success());
    }
}
