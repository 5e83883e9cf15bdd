//! Variables, built-ins and hooks a template runs against.

use std::collections::HashMap;

use crate::hooks::Hooks;
use crate::value::Value;

/// Everything an execution reads but never modifies.
///
/// `vars` are plain identifiers, `builtins` are the `:name` identifiers.
#[derive(Debug, Default)]
pub struct Environment {
    vars: HashMap<String, Value>,
    builtins: HashMap<String, Value>,
    hooks: Hooks,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn with_vars(mut self, vars: impl IntoIterator<Item = (String, Value)>) -> Self {
        self.vars.extend(vars);
        self
    }

    /// Register a built-in, referenced as `:name` in templates.
    pub fn with_builtin(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.builtins.insert(name.into(), value.into());
        self
    }

    pub fn with_builtins(mut self, builtins: impl IntoIterator<Item = (String, Value)>) -> Self {
        self.builtins.extend(builtins);
        self
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn var(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Look up a built-in by name, without the leading `:`.
    pub fn builtin(&self, name: &str) -> Option<&Value> {
        self.builtins.get(name)
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }
}
