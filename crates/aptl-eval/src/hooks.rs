//! Host-supplied operator implementations.
//!
//! Operators on two primitives use built-in semantics. Every other operand
//! combination, plus member access, indexing, calls, stringification and
//! iteration, is delegated to a hook. A missing hook is an evaluation error,
//! never a silent default, except for `objectify` which defaults to identity.

use std::collections::HashMap;
use std::fmt;

use anyhow::bail;
use aptl_parser::Operator;
use serde::Serialize;

use crate::value::Value;

/// Boxed iterator returned by the `iterate` hook.
pub type ValueIter = Box<dyn Iterator<Item = Value>>;

pub type BinaryHook = Box<dyn Fn(&Value, &Value) -> anyhow::Result<Value> + Send + Sync>;
pub type CallHook = Box<dyn Fn(&Value, &[Value]) -> anyhow::Result<Value> + Send + Sync>;
pub type ObjectifyHook = Box<dyn Fn(&Value) -> anyhow::Result<Value> + Send + Sync>;
pub type StringifyHook = Box<dyn Fn(&Value) -> anyhow::Result<String> + Send + Sync>;
pub type IterateHook = Box<dyn Fn(&Value) -> anyhow::Result<ValueIter> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HookName {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    GreaterOrEqual,
    LessOrEqual,
    Greater,
    Less,
    NotEqual,
    Equal,
    LogicalAnd,
    LogicalOr,
    Access,
    Indexor,
    Call,
    Objectify,
    Stringify,
    Iterate,
}

impl HookName {
    /// The hook consulted for `op` when an operand is not a primitive.
    pub fn for_operator(op: Operator) -> HookName {
        match op {
            Operator::Add => HookName::Add,
            Operator::Subtract => HookName::Subtract,
            Operator::Multiply => HookName::Multiply,
            Operator::Divide => HookName::Divide,
            Operator::Modulo => HookName::Modulo,
            Operator::GreaterOrEqual => HookName::GreaterOrEqual,
            Operator::LessOrEqual => HookName::LessOrEqual,
            Operator::Greater => HookName::Greater,
            Operator::Less => HookName::Less,
            Operator::NotEqual => HookName::NotEqual,
            Operator::Equal => HookName::Equal,
            Operator::LogicalAnd => HookName::LogicalAnd,
            Operator::LogicalOr => HookName::LogicalOr,
            Operator::Access => HookName::Access,
            Operator::Index => HookName::Indexor,
            Operator::Call => HookName::Call,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HookName::Add => "add",
            HookName::Subtract => "subtract",
            HookName::Multiply => "multiply",
            HookName::Divide => "divide",
            HookName::Modulo => "modulo",
            HookName::GreaterOrEqual => "greaterOrEqual",
            HookName::LessOrEqual => "lessOrEqual",
            HookName::Greater => "greater",
            HookName::Less => "less",
            HookName::NotEqual => "notEqual",
            HookName::Equal => "equal",
            HookName::LogicalAnd => "logicalAnd",
            HookName::LogicalOr => "logicalOr",
            HookName::Access => "access",
            HookName::Indexor => "indexor",
            HookName::Call => "call",
            HookName::Objectify => "objectify",
            HookName::Stringify => "stringify",
            HookName::Iterate => "iterate",
        }
    }

    /// Hooks taking `(lhs, rhs)`.
    pub fn is_binary(&self) -> bool {
        !matches!(
            self,
            HookName::Call | HookName::Objectify | HookName::Stringify | HookName::Iterate
        )
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The hook table. Every entry is optional.
#[derive(Default)]
pub struct Hooks {
    binary: HashMap<HookName, BinaryHook>,
    call: Option<CallHook>,
    objectify: Option<ObjectifyHook>,
    stringify: Option<StringifyHook>,
    iterate: Option<IterateHook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a two-operand hook (arithmetic, comparison, logical,
    /// `access` or `indexor`).
    pub fn with_binary<F>(mut self, name: HookName, hook: F) -> Self
    where
        F: Fn(&Value, &Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        debug_assert!(name.is_binary(), "{name} is not a binary hook");
        self.binary.insert(name, Box::new(hook));
        self
    }

    pub fn with_call<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.call = Some(Box::new(hook));
        self
    }

    pub fn with_objectify<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.objectify = Some(Box::new(hook));
        self
    }

    pub fn with_stringify<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        self.stringify = Some(Box::new(hook));
        self
    }

    pub fn with_iterate<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<ValueIter> + Send + Sync + 'static,
    {
        self.iterate = Some(Box::new(hook));
        self
    }

    pub fn binary(&self, name: HookName) -> Option<&BinaryHook> {
        self.binary.get(&name)
    }

    pub fn call(&self) -> Option<&CallHook> {
        self.call.as_ref()
    }

    pub fn objectify(&self) -> Option<&ObjectifyHook> {
        self.objectify.as_ref()
    }

    pub fn stringify(&self) -> Option<&StringifyHook> {
        self.stringify.as_ref()
    }

    pub fn iterate(&self) -> Option<&IterateHook> {
        self.iterate.as_ref()
    }

    /// Hooks over the built-in value types: member access and indexing on
    /// arrays, objects and strings, calls to [`Value::Function`], JSON
    /// stringification, iteration over arrays and object values (in key
    /// order), and structural equality.
    pub fn standard() -> Self {
        Hooks::new()
            .with_binary(HookName::Access, |target, key| Ok(member(target, key)))
            .with_binary(HookName::Indexor, |target, key| Ok(member(target, key)))
            .with_binary(HookName::Equal, |a, b| Ok(Value::Boolean(a == b)))
            .with_binary(HookName::NotEqual, |a, b| Ok(Value::Boolean(a != b)))
            .with_binary(HookName::LogicalAnd, |a, b| {
                Ok(if a.to_bool() { b.clone() } else { a.clone() })
            })
            .with_binary(HookName::LogicalOr, |a, b| {
                Ok(if a.to_bool() { a.clone() } else { b.clone() })
            })
            .with_call(|callee, args| match callee {
                Value::Function(func) => func.call(args),
                other => bail!("{} is not a function", other.type_name()),
            })
            .with_stringify(|value| {
                Ok(match value {
                    Value::Null => String::new(),
                    Value::Array(_) | Value::Object(_) => value.to_json(),
                    other => other.to_string_value(),
                })
            })
            .with_iterate(|value| {
                let items: ValueIter = match value {
                    Value::Array(items) => Box::new(items.clone().into_iter()),
                    Value::Object(map) => {
                        let mut entries: Vec<_> = map.iter().collect();
                        entries.sort_by(|a, b| a.0.cmp(b.0));
                        let values: Vec<Value> = entries.into_iter().map(|(_, v)| v.clone()).collect();
                        Box::new(values.into_iter())
                    }
                    other => bail!("{} is not iterable", other.type_name()),
                };
                Ok(items)
            })
    }
}

/// `target.key` / `target[key]` over the built-in containers. Missing
/// members are null.
fn member(target: &Value, key: &Value) -> Value {
    match (target, key) {
        (Value::Object(map), key) => map.get(&key.to_string_value()).cloned().unwrap_or_default(),
        (Value::Array(items), Value::String(name)) if name == "length" => {
            Value::Number(items.len() as f64)
        }
        (Value::Array(items), key) => index(key)
            .and_then(|i| items.get(i))
            .cloned()
            .unwrap_or_default(),
        (Value::String(s), Value::String(name)) if name == "length" => {
            Value::Number(s.chars().count() as f64)
        }
        (Value::String(s), key) => index(key)
            .and_then(|i| s.chars().nth(i))
            .map(|c| Value::String(c.to_string()))
            .unwrap_or_default(),
        _ => Value::Null,
    }
}

fn index(key: &Value) -> Option<usize> {
    let n = key.to_number();
    if n.is_finite() && n >= 0.0 && n == n.trunc() {
        Some(n as usize)
    } else {
        None
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&'static str> = self.binary.keys().map(|name| name.as_str()).collect();
        for (name, present) in [
            (HookName::Call, self.call.is_some()),
            (HookName::Objectify, self.objectify.is_some()),
            (HookName::Stringify, self.stringify.is_some()),
            (HookName::Iterate, self.iterate.is_some()),
        ] {
            if present {
                names.push(name.as_str());
            }
        }
        names.sort_unstable();
        f.debug_struct("Hooks").field("registered", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::NativeFunction;

    fn object(pairs: &[(&str, Value)]) -> Value {
        Value::Object(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_operator_hook_names() {
        assert_eq!(HookName::for_operator(Operator::GreaterOrEqual).as_str(), "greaterOrEqual");
        assert_eq!(HookName::for_operator(Operator::Index).as_str(), "indexor");
        assert_eq!(HookName::for_operator(Operator::LogicalOr).as_str(), "logicalOr");
    }

    #[test]
    fn test_registration() {
        let hooks = Hooks::new().with_binary(HookName::Add, |_, _| Ok(Value::Null));
        assert!(hooks.binary(HookName::Add).is_some());
        assert!(hooks.binary(HookName::Subtract).is_none());
        assert!(hooks.iterate().is_none());
        assert!(format!("{:?}", hooks).contains("add"));
    }

    #[test]
    fn test_standard_access_and_index() {
        let hooks = Hooks::standard();
        let access = hooks.binary(HookName::Access).unwrap();
        let user = object(&[("name", Value::from("Ada"))]);
        assert_eq!(access(&user, &Value::from("name")).unwrap(), Value::from("Ada"));
        assert_eq!(access(&user, &Value::from("missing")).unwrap(), Value::Null);

        let indexor = hooks.binary(HookName::Indexor).unwrap();
        let items = Value::Array(vec![Value::from("a"), Value::from("b")]);
        assert_eq!(indexor(&items, &Value::Number(1.0)).unwrap(), Value::from("b"));
        assert_eq!(indexor(&items, &Value::Number(5.0)).unwrap(), Value::Null);
        assert_eq!(access(&items, &Value::from("length")).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_standard_call() {
        let hooks = Hooks::standard();
        let call = hooks.call().unwrap();
        let double = Value::Function(NativeFunction::new("double", |args| {
            Ok(Value::Number(args[0].to_number() * 2.0))
        }));
        assert_eq!(call(&double, &[Value::Number(4.0)]).unwrap(), Value::Number(8.0));

        let err = call(&Value::Null, &[]).unwrap_err();
        assert_eq!(err.to_string(), "null is not a function");
    }

    #[test]
    fn test_standard_iterate_object_in_key_order() {
        let hooks = Hooks::standard();
        let iterate = hooks.iterate().unwrap();
        let map = object(&[("b", Value::Number(2.0)), ("a", Value::Number(1.0))]);
        let values: Vec<Value> = iterate(&map).unwrap().collect();
        assert_eq!(values, vec![Value::Number(1.0), Value::Number(2.0)]);
    }

    #[test]
    fn test_standard_stringify() {
        let hooks = Hooks::standard();
        let stringify = hooks.stringify().unwrap();
        assert_eq!(stringify(&Value::Null).unwrap(), "");
        assert_eq!(
            stringify(&Value::Array(vec![Value::Number(1.5), Value::from("x")])).unwrap(),
            r#"[1.5,"x"]"#
        );
    }
}
