//! Execution environment assembled from command-line options.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use aptl_eval::{Environment, Hooks, Value};
use clap::Args;

/// Where template variables and built-ins come from.
#[derive(Args, Debug, Default, Clone)]
pub struct EnvArgs {
    /// JSON object file with template variables
    #[arg(long, value_name = "FILE")]
    pub vars: Option<PathBuf>,

    /// JSON object file with built-ins (referenced as `:name`)
    #[arg(long, value_name = "FILE")]
    pub builtins: Option<PathBuf>,

    /// Built-in as KEY=VALUE; VALUE is parsed as JSON, falling back to a string
    #[arg(long = "builtin", value_name = "KEY=VALUE")]
    pub builtin: Vec<String>,
}

impl EnvArgs {
    /// Build the environment, with the standard hook set installed.
    /// `--builtin` pairs override entries from `--builtins`.
    pub fn environment(&self) -> Result<Environment> {
        let mut env = Environment::new().with_hooks(Hooks::standard());

        if let Some(path) = &self.vars {
            env = env.with_vars(load_object(path)?);
        }
        if let Some(path) = &self.builtins {
            env = env.with_builtins(load_object(path)?);
        }
        for pair in &self.builtin {
            let (key, value) = parse_pair(pair)?;
            env = env.with_builtin(key, value);
        }
        Ok(env)
    }
}

/// Read a file holding a single JSON object.
pub fn load_object(path: &Path) -> Result<HashMap<String, Value>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value = Value::from_json(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        other => bail!(
            "{} must contain a JSON object, found {}",
            path.display(),
            other.type_name()
        ),
    }
}

/// Split `KEY=VALUE`. Values that are not valid JSON are taken as strings.
pub fn parse_pair(pair: &str) -> Result<(String, Value)> {
    let Some((key, raw)) = pair.split_once('=') else {
        bail!("expected KEY=VALUE, got '{}'", pair);
    };
    let key = key.trim().trim_start_matches(':');
    if key.is_empty() {
        bail!("empty key in '{}'", pair);
    }
    let value = Value::from_json(raw).unwrap_or_else(|_| Value::from(raw));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_pair() {
        assert_eq!(parse_pair("n=3").unwrap(), ("n".to_string(), Value::Number(3.0)));
        assert_eq!(parse_pair("name=Ada").unwrap(), ("name".to_string(), Value::from("Ada")));
        assert_eq!(parse_pair(":today=Monday").unwrap().0, "today");
        assert_eq!(parse_pair("eq=a=b").unwrap().1, Value::from("a=b"));
        assert!(parse_pair("novalue").is_err());
        assert!(parse_pair("=1").is_err());
    }

    #[test]
    fn test_load_object() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"name": "test", "items": [1, 2]}}"#).unwrap();

        let vars = load_object(file.path()).unwrap();
        assert_eq!(vars["name"], Value::from("test"));
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn test_load_object_rejects_arrays() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[1, 2]").unwrap();

        let err = load_object(file.path()).unwrap_err();
        assert!(err.to_string().contains("must contain a JSON object"));
    }

    #[test]
    fn test_environment_from_args() {
        let mut vars = NamedTempFile::new().unwrap();
        writeln!(vars, r#"{{"user": "Ada"}}"#).unwrap();
        let mut builtins = NamedTempFile::new().unwrap();
        writeln!(builtins, r#"{{"today": "Monday", "lang": "en"}}"#).unwrap();

        let args = EnvArgs {
            vars: Some(vars.path().to_path_buf()),
            builtins: Some(builtins.path().to_path_buf()),
            builtin: vec!["today=Friday".to_string()],
        };
        let env = args.environment().unwrap();
        assert_eq!(env.var("user"), Some(&Value::from("Ada")));
        assert_eq!(env.builtin("today"), Some(&Value::from("Friday")));
        assert_eq!(env.builtin("lang"), Some(&Value::from("en")));
        assert!(env.hooks().iterate().is_some());
    }

    #[test]
    fn test_missing_file() {
        let args = EnvArgs {
            vars: Some(PathBuf::from("/nonexistent/vars.json")),
            ..EnvArgs::default()
        };
        let err = args.environment().unwrap_err();
        assert!(err.to_string().starts_with("failed to read"));
    }
}
