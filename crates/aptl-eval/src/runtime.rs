//! Loop scopes for a single execution.

use std::collections::HashMap;
use std::fmt;

use crate::hooks::ValueIter;
use crate::value::Value;

struct LoopIterator {
    items: ValueIter,
    done: bool,
}

/// Scope stack of one execution.
///
/// Each scope holds loop variables and the iterators bound by
/// `IterateInit`. Variable lookups search from the innermost scope outward;
/// iterators are only visible in the scope that bound them.
pub struct Runtime {
    /// Variable bindings, organized as a stack of scopes.
    scopes: Vec<HashMap<String, Value>>,
    iterators: Vec<HashMap<String, LoopIterator>>,
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
            iterators: vec![HashMap::new()],
        }
    }

    /// Push a new scope onto the scope stack (entering a loop).
    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
        self.iterators.push(HashMap::new());
        tracing::trace!(depth = self.scopes.len(), "enter scope");
    }

    /// Pop the current scope. The root scope is never popped.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
            self.iterators.pop();
        }
        tracing::trace!(depth = self.scopes.len(), "exit scope");
    }

    /// Define a variable in the current scope, shadowing outer bindings.
    pub fn define_var(&mut self, name: &str, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), value);
        }
    }

    /// Get a variable's value, searching from innermost to outermost scope.
    pub fn get_var(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Bind a fresh iterator in the current scope.
    pub fn bind_iterator(&mut self, name: &str, items: ValueIter) {
        if let Some(frame) = self.iterators.last_mut() {
            frame.insert(name.to_string(), LoopIterator { items, done: false });
        }
    }

    pub fn has_iterator(&self, name: &str) -> bool {
        self.iterators
            .last()
            .is_some_and(|frame| frame.contains_key(name))
    }

    /// Advance the iterator bound in the current scope. Returns `None` once
    /// exhausted (or when nothing is bound), marking it done.
    pub fn next_item(&mut self, name: &str) -> Option<Value> {
        let iterator = self.iterators.last_mut()?.get_mut(name)?;
        let item = iterator.items.next();
        iterator.done = item.is_none();
        item
    }

    /// Whether the iterator has run out, or `None` if nothing is bound.
    pub fn is_done(&self, name: &str) -> Option<bool> {
        self.iterators.last()?.get(name).map(|it| it.done)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let iterators: Vec<Vec<&String>> = self.iterators.iter().map(|frame| frame.keys().collect()).collect();
        f.debug_struct("Runtime")
            .field("scopes", &self.scopes)
            .field("iterators", &iterators)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_shadowing() {
        let mut runtime = Runtime::new();
        runtime.define_var("x", Value::Number(1.0));
        runtime.push_scope();
        runtime.define_var("x", Value::Number(2.0));
        assert_eq!(runtime.get_var("x"), Some(&Value::Number(2.0)));
        runtime.pop_scope();
        assert_eq!(runtime.get_var("x"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn test_outer_variables_visible() {
        let mut runtime = Runtime::new();
        runtime.push_scope();
        runtime.define_var("outer", Value::from("a"));
        runtime.push_scope();
        assert_eq!(runtime.get_var("outer"), Some(&Value::from("a")));
        runtime.pop_scope();
        runtime.pop_scope();
        assert_eq!(runtime.get_var("outer"), None);
    }

    #[test]
    fn test_root_scope_survives() {
        let mut runtime = Runtime::new();
        runtime.pop_scope();
        runtime.define_var("x", Value::Null);
        runtime.pop_scope();
        assert_eq!(runtime.get_var("x"), Some(&Value::Null));
    }

    #[test]
    fn test_iterator_lifecycle() {
        let mut runtime = Runtime::new();
        runtime.push_scope();
        runtime.bind_iterator("x", Box::new(vec![Value::Number(1.0)].into_iter()));
        assert!(runtime.has_iterator("x"));
        assert_eq!(runtime.is_done("x"), Some(false));
        assert_eq!(runtime.next_item("x"), Some(Value::Number(1.0)));
        assert_eq!(runtime.is_done("x"), Some(false));
        assert_eq!(runtime.next_item("x"), None);
        assert_eq!(runtime.is_done("x"), Some(true));
        runtime.pop_scope();
        assert!(!runtime.has_iterator("x"));
        assert_eq!(runtime.is_done("x"), None);
    }
}
