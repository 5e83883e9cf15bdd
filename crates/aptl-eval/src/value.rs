//! Runtime values for template evaluation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::output::OutputEvent;

/// Signature of a host function callable from templates.
pub type FunctionImpl = dyn Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync;

/// Produces a fresh event sequence each time a prompt value is rendered.
pub type PromptFactory = dyn Fn() -> Box<dyn Iterator<Item = OutputEvent>> + Send + Sync;

/// A runtime value.
///
/// Booleans, numbers and strings are primitives: operators on two
/// primitives use the built-in semantics, everything else goes through hooks.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The null value.
    Null,
    /// A string value.
    String(String),
    /// A numeric value (always f64, like JavaScript).
    Number(f64),
    /// A boolean value.
    Boolean(bool),
    /// An array of values.
    Array(Vec<Value>),
    /// An object with string keys.
    Object(HashMap<String, Value>),
    /// A host function.
    Function(NativeFunction),
    /// Nested prompt output, re-emitted event by event when rendered.
    Prompt(PromptSource),
}

#[derive(Clone)]
pub struct NativeFunction {
    name: String,
    func: Arc<FunctionImpl>,
}

impl NativeFunction {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> anyhow::Result<Value> {
        (self.func)(args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

#[derive(Clone)]
pub struct PromptSource(Arc<PromptFactory>);

impl PromptSource {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Box<dyn Iterator<Item = OutputEvent>> + Send + Sync + 'static,
    {
        Self(Arc::new(factory))
    }

    /// A prompt that replays a fixed list of events.
    pub fn from_events(events: Vec<OutputEvent>) -> Self {
        let events = Arc::new(events);
        Self::new(move || -> Box<dyn Iterator<Item = OutputEvent>> {
            Box::new(events.as_ref().clone().into_iter())
        })
    }

    pub fn events(&self) -> Box<dyn Iterator<Item = OutputEvent>> {
        (self.0)()
    }
}

impl fmt::Debug for PromptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PromptSource")
    }
}

impl PartialEq for PromptSource {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Value {
    /// Coerce this value to a string.
    pub fn to_string_value(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::String(s) => s.clone(),
            Value::Number(n) => format_number(*n),
            Value::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
            Value::Array(arr) => {
                let items: Vec<String> = arr.iter().map(|v| v.to_string_value()).collect();
                items.join(", ")
            }
            Value::Object(_) => "[object Object]".to_string(),
            Value::Function(func) => format!("[function {}]", func.name()),
            Value::Prompt(_) => "[prompt]".to_string(),
        }
    }

    /// Truthiness: false, 0, NaN, "" and null are false.
    pub fn to_bool(&self) -> bool {
        match self {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Boolean(b) => *b,
            Value::Array(_) | Value::Object(_) | Value::Function(_) | Value::Prompt(_) => true,
        }
    }

    /// Numeric coercion used by the built-in operators.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            _ => f64::NAN,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Value::String(_) | Value::Number(_) | Value::Boolean(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::Prompt(_) => "prompt",
        }
    }

    /// Parse a JSON string into a Value.
    pub fn from_json(s: &str) -> serde_json::Result<Value> {
        let json: JsonValue = serde_json::from_str(s)?;
        Ok(Value::from(json))
    }

    /// Convert this Value to a compact JSON string. Functions and prompts
    /// become `null`.
    pub fn to_json(&self) -> String {
        self.to_json_value().to_string()
    }

    /// Convert this Value to a serde_json Value.
    pub fn to_json_value(&self) -> JsonValue {
        match self {
            Value::Null | Value::Function(_) | Value::Prompt(_) => JsonValue::Null,
            Value::Boolean(b) => JsonValue::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Array(arr) => JsonValue::Array(arr.iter().map(|v| v.to_json_value()).collect()),
            Value::Object(obj) => {
                let map: serde_json::Map<String, JsonValue> = obj
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json_value()))
                    .collect();
                JsonValue::Object(map)
            }
        }
    }
}

/// Integral numbers serialize without a fraction, as `JSON.stringify` does.
/// Non-finite numbers become `null`.
fn number_to_json(n: f64) -> JsonValue {
    if n.is_finite() && n == n.trunc() && n.abs() < MAX_SAFE_INTEGER {
        JsonValue::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null)
    }
}

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == n.trunc() && n.abs() < 1e15 {
        // Integer-like numbers without decimal point
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Boolean(b),
            JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(arr) => Value::Array(arr.into_iter().map(Value::from).collect()),
            JsonValue::Object(obj) => {
                Value::Object(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_value())
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}
