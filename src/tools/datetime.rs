/// Date and Time Tools
///
/// Implements get_current_time, get_current_date and get_timezone_info.
/// Timezone lookup resolves IANA names through chrono-tz; date formats are
/// a closed enum validated against the declared schema.

use chrono::{Local, Utc};
use chrono_tz::{OffsetComponents, Tz};
use futures_util::FutureExt;
use serde_json::{json, Value};

use crate::core::server::{ToolHandler, ToolOutcome, ToolRegistry, ToolSpec};

const DATE_FORMATS: [&str; 4] = ["iso", "us", "european", "unix"];

/// Register the date/time tools with the tool registry.
pub fn register(registry: &mut ToolRegistry) {
    let current_time_tool = ToolSpec {
        name: "get_current_time".to_string(),
        description: "Get the current time in UTC and local timezone".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {},
            "required": [],
        }),
    };
    let current_time_handler: ToolHandler =
        Box::new(|args: Value| async move { current_time(args) }.boxed());
    registry.register(current_time_tool, current_time_handler);

    let current_date_tool = ToolSpec {
        name: "get_current_date".to_string(),
        description: "Get the current date in various formats".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "format": {
                    "type": "string",
                    "description": "Date format: 'iso', 'us', 'european', or 'unix'",
                    "enum": DATE_FORMATS,
                    "default": "iso"
                }
            },
            "required": [],
        }),
    };
    let current_date_handler: ToolHandler =
        Box::new(|args: Value| async move { current_date(args) }.boxed());
    registry.register(current_date_tool, current_date_handler);

    let timezone_tool = ToolSpec {
        name: "get_timezone_info".to_string(),
        description: "Get information about a timezone".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "timezone": {
                    "type": "string",
                    "description": "Timezone name (e.g., 'UTC', 'America/New_York', 'Europe/London')",
                    "default": "UTC"
                }
            },
            "required": [],
        }),
    };
    let timezone_handler: ToolHandler =
        Box::new(|args: Value| async move { timezone_info(args) }.boxed());
    registry.register(timezone_tool, timezone_handler);
}

fn current_time(_args: Value) -> ToolOutcome {
    let now = Utc::now();
    let local_now = Local::now();

    ToolOutcome::Success(json!({
        "utc_time": now.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        "local_time": local_now.format("%Y-%m-%d %H:%M:%S").to_string(),
        "unix_timestamp": now.timestamp(),
        "iso_format": now.to_rfc3339(),
    }))
}

fn current_date(args: Value) -> ToolOutcome {
    let format_type = match args.get("format") {
        None => "iso",
        Some(v) => match v.as_str() {
            Some(s) if DATE_FORMATS.contains(&s) => s,
            _ => {
                return ToolOutcome::Failure(format!(
                    "format must be one of: {}",
                    DATE_FORMATS.join(", ")
                ));
            }
        },
    };

    let now = Local::now();
    let formatted = match format_type {
        "us" => now.format("%m/%d/%Y").to_string(),
        "european" => now.format("%d/%m/%Y").to_string(),
        "unix" => now.timestamp().to_string(),
        _ => now.format("%Y-%m-%d").to_string(),
    };

    ToolOutcome::Success(json!({
        "date": formatted,
        "format": format_type,
        "unix_timestamp": now.timestamp(),
        "iso_format": now.format("%Y-%m-%d").to_string(),
    }))
}

fn timezone_info(args: Value) -> ToolOutcome {
    let timezone_name = match args.get("timezone") {
        None => "UTC",
        Some(v) => match v.as_str() {
            Some(s) => s,
            None => return ToolOutcome::Failure("timezone must be a string".to_string()),
        },
    };

    let tz: Tz = match timezone_name.parse() {
        Ok(tz) => tz,
        Err(_) => {
            return ToolOutcome::Failure(format!("Unknown timezone: {}", timezone_name));
        }
    };

    let now = Utc::now().with_timezone(&tz);
    let is_dst = !now.offset().dst_offset().is_zero();

    ToolOutcome::Success(json!({
        "timezone": timezone_name,
        "current_time": now.format("%Y-%m-%d %H:%M:%S %Z").to_string(),
        "utc_offset": now.format("%z").to_string(),
        "is_dst": is_dst,
        "timezone_info": tz.name(),
    }))
}
