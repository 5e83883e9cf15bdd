//! APTL command-line tool
//!
//! Checks, dumps and renders prompt templates.

mod config;
mod report;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use aptl_compiler::{dump_instructions, CompileOptions, CompileOutput, Compiler};
use aptl_eval::{execute, Error, OutputEvent, PromptFormatter};
use aptl_parser::{dump_expr, parse_expression};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::config::EnvArgs;

#[derive(Parser, Debug)]
#[command(name = "aptl")]
#[command(author, version, about = "APTL prompt template compiler and renderer", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a template and report every error with its location.
    Check(TemplateArgs),

    /// Print the compiled instruction tree.
    Dump {
        #[command(flatten)]
        template: TemplateArgs,

        /// Print instructions as JSON instead of a tree
        #[arg(long)]
        json: bool,
    },

    /// Parse a single expression and print its syntax tree.
    Expr {
        /// Expression text, e.g. `user.name + 1`
        expression: String,

        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compile and run a template.
    Render {
        #[command(flatten)]
        template: TemplateArgs,

        #[command(flatten)]
        env: EnvArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = RenderFormat::Text)]
        format: RenderFormat,
    },
}

#[derive(Args, Debug)]
struct TemplateArgs {
    /// Template file, or `-` for stdin
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Reject the legacy `{{:: keyword}}` directive spelling
    #[arg(long)]
    no_legacy: bool,
}

impl TemplateArgs {
    fn name(&self) -> String {
        if self.is_stdin() {
            "<stdin>".to_string()
        } else {
            self.input.display().to_string()
        }
    }

    fn is_stdin(&self) -> bool {
        self.input.as_os_str() == "-"
    }

    fn read(&self) -> Result<String> {
        if self.is_stdin() {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("failed to read template from stdin")?;
            Ok(source)
        } else {
            fs::read_to_string(&self.input)
                .with_context(|| format!("failed to read {}", self.input.display()))
        }
    }

    fn compile(&self, source: &str) -> CompileOutput {
        let options = CompileOptions::new().legacy_directives(!self.no_legacy);
        Compiler::new(options).compile(source)
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum RenderFormat {
    /// Concatenated text, ignoring roles and attachments
    Text,
    /// Raw output events as a JSON array
    Events,
    /// Role messages as a JSON array
    Messages,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Run a command. `Ok(false)` means the template itself was rejected and
/// the diagnostics are already printed.
fn run(command: Command) -> Result<bool> {
    match command {
        Command::Check(template) => {
            let source = template.read()?;
            let output = template.compile(&source);
            if report_build_errors(&template, &source, &output) {
                println!("{}: ok", template.name());
                Ok(true)
            } else {
                Ok(false)
            }
        }
        Command::Dump { template, json } => {
            let source = template.read()?;
            let output = template.compile(&source);
            if !report_build_errors(&template, &source, &output) {
                return Ok(false);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&output.instructions)?);
            } else {
                print!("{}", dump_instructions(&output.instructions));
            }
            Ok(true)
        }
        Command::Expr { expression, json } => match parse_expression(&expression) {
            Ok(expr) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&expr)?);
                } else {
                    print!("{}", dump_expr(&expr));
                }
                Ok(true)
            }
            Err(err) => {
                eprintln!("error: {}", err);
                Ok(false)
            }
        },
        Command::Render {
            template,
            env,
            format,
        } => render(&template, &env, format),
    }
}

/// Print every compile error. Returns whether the template compiled cleanly.
fn report_build_errors(template: &TemplateArgs, source: &str, output: &CompileOutput) -> bool {
    let name = template.name();
    for err in &output.errors {
        eprintln!("{}", report::build_error(&name, source, err));
    }
    tracing::debug!(errors = output.errors.len(), "compiled {}", name);
    output.ok
}

fn render(template: &TemplateArgs, env_args: &EnvArgs, format: RenderFormat) -> Result<bool> {
    let source = template.read()?;
    let output = template.compile(&source);
    if !report_build_errors(template, &source, &output) {
        return Ok(false);
    }
    let env = env_args.environment()?;

    let mut events = Vec::new();
    for event in execute(&output.instructions, &env) {
        match event {
            Ok(event) => events.push(event),
            Err(Error::Evaluate(err)) => {
                eprintln!("{}", report::eval_error(&template.name(), &source, &err));
                return Ok(false);
            }
            Err(err) => return Err(err.into()),
        }
    }

    match format {
        RenderFormat::Text => {
            let text: String = events
                .iter()
                .filter_map(|event| match event {
                    OutputEvent::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect();
            println!("{}", text);
        }
        RenderFormat::Events => println!("{}", serde_json::to_string_pretty(&events)?),
        RenderFormat::Messages => {
            let mut formatter = PromptFormatter::new();
            for event in events {
                formatter.push(event);
            }
            println!("{}", serde_json::to_string_pretty(&formatter.finish())?);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render_args() {
        let cli = Cli::try_parse_from([
            "aptl",
            "render",
            "prompt.aptl",
            "--builtin",
            "today=Monday",
            "--builtin",
            "n=2",
            "--format",
            "messages",
            "--no-legacy",
        ])
        .unwrap();
        match cli.command {
            Command::Render {
                template,
                env,
                format,
            } => {
                assert_eq!(template.input, PathBuf::from("prompt.aptl"));
                assert!(template.no_legacy);
                assert_eq!(env.builtin, vec!["today=Monday", "n=2"]);
                assert_eq!(format, RenderFormat::Messages);
            }
            other => panic!("expected render, got {:?}", other),
        }
    }

    #[test]
    fn test_stdin_name() {
        let cli = Cli::try_parse_from(["aptl", "check", "-"]).unwrap();
        match cli.command {
            Command::Check(template) => assert_eq!(template.name(), "<stdin>"),
            other => panic!("expected check, got {:?}", other),
        }
    }
}
