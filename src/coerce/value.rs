use crate::coerce::discovery::{MacroName, format_discovery};
use crate::coerce::tag::TypeTag;
use crate::error::{ProbeError, Result};

use serde_json::{Number, Value};

/// Render `value` the way `tag` asks for.
///
/// `macro_name` is only read for `string_list`, where it names the discovery
/// placeholder each item is stored under.
pub fn coerce(value: &Value, tag: TypeTag, macro_name: Option<&MacroName>) -> Result<String> {
    match tag {
        TypeTag::Int => coerce_int(value),
        TypeTag::String => Ok(display_string(value)),
        TypeTag::Avg => coerce_avg(value),
        TypeTag::StringList => {
            let items = expect_array(value, tag)?;
            let macro_name = macro_name.ok_or_else(|| ProbeError::Coercion {
                tag: tag.as_str(),
                reason: "no discovery macro for this item".to_string(),
            })?;
            let names: Vec<String> = items.iter().map(display_string).collect();
            Ok(format_discovery(&names, macro_name))
        }
    }
}

/// Text for a scalar as the agent templates expect it (`True`, `False`,
/// `None`); containers fall back to compact JSON.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn coerce_int(value: &Value) -> Result<String> {
    let fail = |reason: String| ProbeError::Coercion {
        tag: TypeTag::Int.as_str(),
        reason,
    };

    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i.to_string());
            }
            if let Some(u) = n.as_u64() {
                return Ok(u.to_string());
            }
            // Truncate toward zero, refusing anything outside i64.
            match n.as_f64() {
                Some(f) if f.is_finite() && f.abs() < 9.2e18 => {
                    Ok((f.trunc() as i64).to_string())
                }
                _ => Err(fail(format!("{n} is out of integer range"))),
            }
        }
        Value::Bool(b) => Ok(if *b { "1" } else { "0" }.to_string()),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(|i| i.to_string())
            .map_err(|_| fail(format!("{s:?} is not an integer"))),
        other => Err(fail(format!("{} is not numeric", kind_of(other)))),
    }
}

fn coerce_avg(value: &Value) -> Result<String> {
    let items = expect_array(value, TypeTag::Avg)?;
    if items.is_empty() {
        return Err(ProbeError::EmptySeries);
    }

    let mut sum = 0.0f64;
    for (idx, item) in items.iter().enumerate() {
        sum += item.as_f64().ok_or_else(|| ProbeError::Coercion {
            tag: TypeTag::Avg.as_str(),
            reason: format!("element {idx} is {}, not a number", kind_of(item)),
        })?;
    }
    let mean = sum / items.len() as f64;

    Number::from_f64(mean)
        .map(|n| n.to_string())
        .ok_or_else(|| ProbeError::Coercion {
            tag: TypeTag::Avg.as_str(),
            reason: "mean is not finite".to_string(),
        })
}

fn expect_array(value: &Value, tag: TypeTag) -> Result<&Vec<Value>> {
    value.as_array().ok_or_else(|| ProbeError::Coercion {
        tag: tag.as_str(),
        reason: format!("expected a list, got {}", kind_of(value)),
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
