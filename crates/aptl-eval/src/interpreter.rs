//! The instruction VM.
//!
//! An [`Execution`] walks a compiled instruction tree with a stack of frames,
//! one per nested group, and yields output events on demand. The tree itself
//! is only borrowed, so any number of executions can share it.

use aptl_compiler::{Action, CompileOptions, Compiler, Instruction, Single};
use aptl_lexer::Span;

use crate::environment::Environment;
use crate::error::{Error, EvalError, EvalErrorKind};
use crate::eval::{self, Rendered};
use crate::output::OutputEvent;
use crate::runtime::Runtime;

type EventIter = Box<dyn Iterator<Item = OutputEvent>>;

struct Frame<'p> {
    instructions: &'p [Instruction],
    pointer: usize,
}

/// A running template. Pull events with [`Iterator::next`]; dropping it
/// cancels the run.
///
/// After the first error the execution is fused and yields nothing more.
pub struct Execution<'p> {
    env: &'p Environment,
    runtime: Runtime,
    frames: Vec<Frame<'p>>,
    /// Events of a prompt value still being re-emitted.
    pending: Option<EventIter>,
    failed: bool,
}

/// Start executing `instructions` against `env`.
///
/// The instructions must come from a successful compile.
pub fn execute<'p>(instructions: &'p [Instruction], env: &'p Environment) -> Execution<'p> {
    Execution {
        env,
        runtime: Runtime::new(),
        frames: vec![Frame {
            instructions,
            pointer: 0,
        }],
        pending: None,
        failed: false,
    }
}

impl<'p> Execution<'p> {
    /// Run one instruction. Returns the event it produced, if any.
    fn step(&mut self) -> Result<Option<OutputEvent>, EvalError> {
        let Some(frame) = self.frames.last() else {
            return Ok(None);
        };
        let instructions = frame.instructions;
        let Some(instruction) = instructions.get(frame.pointer) else {
            self.frames.pop();
            self.advance();
            return Ok(None);
        };

        match instruction {
            Instruction::Group { instructions } => {
                self.frames.push(Frame {
                    instructions,
                    pointer: 0,
                });
                Ok(None)
            }
            Instruction::Single(single) => {
                self.advance();
                self.emit(single)
            }
            Instruction::Action(action) => {
                self.act(action)?;
                Ok(None)
            }
        }
    }

    fn emit(&mut self, single: &Single) -> Result<Option<OutputEvent>, EvalError> {
        let event = match single {
            Single::Text { text, .. } => OutputEvent::text(text.as_str()),
            Single::Expression { expr, .. } => match eval::eval_rendered(expr, self.env, &self.runtime)? {
                Rendered::Text(text) => OutputEvent::Text { text },
                Rendered::Prompt(prompt) => {
                    self.pending = Some(prompt.events());
                    return Ok(None);
                }
            },
            Single::Role { role, .. } => OutputEvent::role(role.as_str()),
            Single::Split { .. } => OutputEvent::Split,
        };
        Ok(Some(event))
    }

    fn act(&mut self, action: &Action) -> Result<(), EvalError> {
        match action {
            Action::Jump { target } => self.jump(*target),
            Action::ConditionalJump { condition, target } => {
                if eval::eval_condition(condition, self.env, &self.runtime)? {
                    self.jump(*target);
                } else {
                    self.advance();
                }
            }
            Action::Break => {
                self.frames.pop();
                self.advance();
            }
            Action::EnterScope => {
                self.runtime.push_scope();
                self.advance();
            }
            Action::ExitScope => {
                self.runtime.pop_scope();
                self.advance();
            }
            Action::IterateInit { iterable, iterator } => {
                let items = eval::eval_iterable(iterable, self.env, &self.runtime)?;
                self.runtime.bind_iterator(iterator, items);
                self.advance();
            }
            Action::IterateNext { iterator, element } => {
                if !self.runtime.has_iterator(iterator) {
                    return Err(unbound(iterator));
                }
                if let Some(item) = self.runtime.next_item(iterator) {
                    tracing::trace!(%element, "next item");
                    self.runtime.define_var(element, item);
                }
                self.advance();
            }
            Action::JumpIfIterateDone { iterator, target } => {
                match self.runtime.is_done(iterator) {
                    Some(true) => self.jump(*target),
                    Some(false) => self.advance(),
                    None => return Err(unbound(iterator)),
                }
            }
        }
        Ok(())
    }

    fn advance(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.pointer += 1;
        }
    }

    fn jump(&mut self, target: usize) {
        if let Some(frame) = self.frames.last_mut() {
            frame.pointer = target;
        }
    }
}

fn unbound(iterator: &str) -> EvalError {
    EvalError::new(EvalErrorKind::UnboundIterator, Span::default(), iterator)
}

impl Iterator for Execution<'_> {
    type Item = Result<OutputEvent, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(pending) = self.pending.as_mut() {
                match pending.next() {
                    Some(event) => return Some(Ok(event)),
                    None => self.pending = None,
                }
            }
            if self.frames.is_empty() {
                return None;
            }
            match self.step() {
                Ok(Some(event)) => return Some(Ok(event)),
                Ok(None) => {}
                Err(err) => {
                    tracing::debug!(error = %err, "execution failed");
                    self.failed = true;
                    self.frames.clear();
                    return Some(Err(err.into()));
                }
            }
        }
    }
}

/// Compiles and runs templates against one environment.
#[derive(Debug, Default)]
pub struct Interpreter {
    env: Environment,
    compiler: Compiler,
}

impl Interpreter {
    pub fn new(env: Environment) -> Self {
        Self {
            env,
            compiler: Compiler::default(),
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.compiler = Compiler::new(options);
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Compile a template, refusing it if any error was found.
    pub fn compile(&self, source: &str) -> crate::Result<Vec<Instruction>> {
        let output = self.compiler.compile(source);
        if output.ok {
            Ok(output.instructions)
        } else {
            Err(Error::CompileFailed(output.errors))
        }
    }

    /// Compile and run a template, collecting every event.
    pub fn run(&self, source: &str) -> crate::Result<Vec<OutputEvent>> {
        let instructions = self.compile(source)?;
        execute(&instructions, &self.env).collect()
    }

    /// Compile and run a template, keeping only its text.
    pub fn render(&self, source: &str) -> crate::Result<String> {
        let mut text = String::new();
        for event in self.run(source)? {
            if let OutputEvent::Text { text: part } = event {
                text.push_str(&part);
            }
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{HookName, Hooks};
    use crate::value::Value;
    use aptl_compiler::compile;

    fn events(source: &str, env: &Environment) -> Vec<OutputEvent> {
        let output = compile(source);
        assert!(output.ok, "{:?}", output.errors);
        execute(&output.instructions, env)
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    fn text(events: &[OutputEvent]) -> String {
        events
            .iter()
            .filter_map(|event| match event {
                OutputEvent::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_plain_text() {
        let events = events("hello world", &Environment::new());
        assert_eq!(events, vec![OutputEvent::text("hello world")]);
    }

    #[test]
    fn test_if_else_branches() {
        let source = "{{#if n > 1}}big{{#elseif n == 1}}one{{#else}}small{{#endif}}";
        for (n, expected) in [(5.0, "big"), (1.0, "one"), (0.0, "small")] {
            let env = Environment::new().with_var("n", n);
            assert_eq!(text(&events(source, &env)), expected);
        }
    }

    #[test]
    fn test_if_without_match() {
        let env = Environment::new().with_var("n", 0.0);
        assert_eq!(text(&events("a{{#if n}}b{{#endif}}c", &env)), "ac");
    }

    #[test]
    fn test_foreach_binds_element() {
        let env = Environment::new()
            .with_var("items", Value::Array(vec![0.0.into(), 1.0.into(), 2.0.into(), 3.0.into()]))
            .with_hooks(Hooks::standard());
        let out = events("{{#foreach x in items}}{{x}}{{#endforeach}}", &env);
        assert_eq!(text(&out), "0123");
    }

    #[test]
    fn test_loop_variable_is_scoped() {
        let env = Environment::new()
            .with_var("x", "outer")
            .with_var("items", Value::Array(vec!["inner".into()]))
            .with_hooks(Hooks::standard());
        let out = events("{{#foreach_inline x in items}}{{x}} {{#endforeach}}{{x}}", &env);
        assert_eq!(text(&out), "inner outer");
    }

    #[test]
    fn test_nested_foreach() {
        let env = Environment::new()
            .with_var("rows", Value::Array(vec![
                Value::Array(vec!["a".into(), "b".into()]),
                Value::Array(vec!["c".into()]),
            ]))
            .with_hooks(Hooks::standard());
        let source = "{{#foreach_inline row in rows}}[{{#foreach_inline cell in row}}{{cell}}{{#endforeach}}]{{#endforeach}}";
        assert_eq!(text(&events(source, &env)), "[ab][c]");
    }

    #[test]
    fn test_role_and_split_events() {
        let out = events("{{#role system}}\nbe brief\n{{#split}}\nmore", &Environment::new());
        assert_eq!(
            out,
            vec![
                OutputEvent::role("system"),
                OutputEvent::text("be brief"),
                OutputEvent::Split,
                OutputEvent::text("more"),
            ]
        );
    }

    #[test]
    fn test_error_fuses_execution() {
        let output = compile("before {{missing}} after");
        let env = Environment::new();
        let mut execution = execute(&output.instructions, &env);

        assert_eq!(execution.next().unwrap().unwrap(), OutputEvent::text("before "));
        match execution.next() {
            Some(Err(Error::Evaluate(err))) => {
                assert_eq!(err.kind, EvalErrorKind::IdentifierResolveFail);
                assert_eq!(err.span, Span::new(9, 16));
            }
            other => panic!("expected evaluation error, got {:?}", other),
        }
        assert!(execution.next().is_none());
        assert!(execution.next().is_none());
    }

    #[test]
    fn test_foreach_without_iterate_hook() {
        let env = Environment::new().with_var("items", Value::Array(vec![]));
        let output = compile("{{#foreach x in items}}{{x}}{{#endforeach}}");
        let result: Result<Vec<_>, _> = execute(&output.instructions, &env).collect();
        match result {
            Err(Error::Evaluate(err)) => {
                assert_eq!(err.kind, EvalErrorKind::NoHook { hook: HookName::Iterate });
            }
            other => panic!("expected missing hook, got {:?}", other),
        }
    }

    #[test]
    fn test_unbound_iterator() {
        let instructions = vec![Instruction::action(Action::IterateNext {
            iterator: "x".to_string(),
            element: "x".to_string(),
        })];
        let env = Environment::new();
        let mut execution = execute(&instructions, &env);
        match execution.next() {
            Some(Err(Error::Evaluate(err))) => assert_eq!(err.kind, EvalErrorKind::UnboundIterator),
            other => panic!("expected unbound iterator, got {:?}", other),
        }
    }

    #[test]
    fn test_interpreter_refuses_failed_compile() {
        let interpreter = Interpreter::new(Environment::new());
        match interpreter.run("{{#if a}}never closed") {
            Err(Error::CompileFailed(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected compile failure, got {:?}", other),
        }
    }

    #[test]
    fn test_interpreter_render() {
        let interpreter = Interpreter::new(Environment::new().with_var("name", "Ada"));
        assert_eq!(interpreter.render("{{#role user}}\nhi {{name}}").unwrap(), "hi Ada");
    }
}
