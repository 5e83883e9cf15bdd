//! Integration tests for template compilation

use aptl_compiler::{compile, Action, BuildErrorKind, CompileOutput, Instruction, Single};
use aptl_lexer::Span;
use aptl_parser::{Expr, Operator, ParseErrorKind};

fn compile_ok(source: &str) -> Vec<Instruction> {
    let output = compile(source);
    assert!(output.ok, "unexpected errors: {:?}", output.errors);
    output.instructions
}

fn error_kinds(output: &CompileOutput) -> Vec<BuildErrorKind> {
    output.errors.iter().map(|e| e.kind).collect()
}

fn group(instruction: &Instruction) -> &[Instruction] {
    match instruction {
        Instruction::Group { instructions } => instructions,
        other => panic!("expected group, got {:?}", other),
    }
}

#[test]
fn test_plain_text() {
    let instructions = compile_ok("Hello, world");
    assert_eq!(
        instructions,
        vec![Instruction::text("Hello, world", Span::new(0, 12))]
    );
}

#[test]
fn test_whitespace_only_template() {
    assert!(compile_ok("  \n\t ").is_empty());
    assert!(compile_ok("").is_empty());
}

#[test]
fn test_roles_and_split() {
    let instructions = compile_ok("{{#role system}}\nBe brief.\n{{#split}}\nMore");
    assert_eq!(instructions.len(), 4);
    assert!(matches!(
        &instructions[0],
        Instruction::Single(Single::Role { role, .. }) if role == "system"
    ));
    assert!(matches!(
        &instructions[1],
        Instruction::Single(Single::Text { text, .. }) if text == "Be brief."
    ));
    assert!(matches!(
        &instructions[2],
        Instruction::Single(Single::Split { .. })
    ));
    assert!(matches!(
        &instructions[3],
        Instruction::Single(Single::Text { text, .. }) if text == "More"
    ));
}

#[test]
fn test_expression_spans_are_absolute() {
    let instructions = compile_ok("Hi {{ user.name }}");
    match &instructions[1] {
        Instruction::Single(Single::Expression { expr, span }) => {
            assert_eq!(*span, Span::new(3, 18));
            assert_eq!(expr.span(), Span::new(6, 15));
            assert!(matches!(expr, Expr::Call { op: Operator::Access, .. }));
        }
        other => panic!("expected expression, got {:?}", other),
    }
}

#[test]
fn test_single_if_layout() {
    let instructions = compile_ok("{{#if flag}}yes{{#endif}}");
    assert_eq!(instructions.len(), 1);
    let slots = group(&instructions[0]);
    assert_eq!(slots.len(), 4);
    assert!(matches!(
        &slots[0],
        Instruction::Action(Action::ConditionalJump { target: 2, .. })
    ));
    assert_eq!(slots[1], Instruction::action(Action::Break));
    assert_eq!(group(&slots[2]).len(), 1);
    assert_eq!(slots[3], Instruction::action(Action::Break));
}

#[test]
fn test_if_chain_layout() {
    let source = "{{#if a}}A{{#elseif b}}B{{#elif c}}C{{#else}}D{{#endif}}";
    let instructions = compile_ok(source);
    let slots = group(&instructions[0]);
    // 3 jumps, else group + break, 3 * (group + break)
    assert_eq!(slots.len(), 3 + 2 + 6);

    let targets: Vec<usize> = slots[..3]
        .iter()
        .map(|slot| match slot {
            Instruction::Action(Action::ConditionalJump { target, .. }) => *target,
            other => panic!("expected conditional jump, got {:?}", other),
        })
        .collect();
    assert_eq!(targets, vec![5, 7, 9]);

    assert_eq!(
        group(&slots[3]),
        &[Instruction::text("D", Span::new(45, 46))]
    );
    assert_eq!(slots[4], Instruction::action(Action::Break));
    for (slot, text) in [(5, "A"), (7, "B"), (9, "C")] {
        match &group(&slots[slot])[0] {
            Instruction::Single(Single::Text { text: t, .. }) => assert_eq!(t, text),
            other => panic!("expected text, got {:?}", other),
        }
        assert_eq!(slots[slot + 1], Instruction::action(Action::Break));
    }
}

#[test]
fn test_foreach_layout() {
    let instructions = compile_ok("{{#foreach item in items}}- {{item}}\n{{#endforeach}}");
    let slots = group(&instructions[0]);
    assert_eq!(slots.len(), 7);
    assert_eq!(slots[0], Instruction::action(Action::EnterScope));
    assert!(matches!(
        &slots[1],
        Instruction::Action(Action::IterateInit { iterator, iterable: Expr::Identifier { name, .. } })
            if iterator == "item" && name == "items"
    ));
    assert_eq!(
        slots[2],
        Instruction::action(Action::IterateNext {
            iterator: "item".to_string(),
            element: "item".to_string()
        })
    );
    assert_eq!(
        slots[3],
        Instruction::action(Action::JumpIfIterateDone {
            iterator: "item".to_string(),
            target: 6
        })
    );
    assert_eq!(group(&slots[4]).len(), 3);
    assert_eq!(slots[5], Instruction::action(Action::Jump { target: 2 }));
    assert_eq!(slots[6], Instruction::action(Action::ExitScope));
}

#[test]
fn test_inline_variants_compile_like_blocks() {
    let block = compile_ok("{{#foreach_inline x in xs}}{{x}}{{#endforeach}}");
    assert_eq!(group(&block[0]).len(), 7);
    let inline_if = compile_ok("a {{#if_inline x}}b{{#endif}} c");
    assert_eq!(inline_if.len(), 3);
    assert_eq!(group(&inline_if[1]).len(), 4);
}

#[test]
fn test_nested_blocks() {
    let source = "{{#foreach row in rows}}{{#if row.show}}{{row.name}}{{#endif}}{{#endforeach}}";
    let instructions = compile_ok(source);
    let body = group(&group(&instructions[0])[4]);
    assert_eq!(body.len(), 1);
    assert_eq!(group(&body[0]).len(), 4);
}

#[test]
fn test_directive_keywords_are_case_insensitive() {
    let instructions = compile_ok("{{#IF a}}x{{#EndIf}}");
    assert_eq!(group(&instructions[0]).len(), 4);
}

#[test]
fn test_missing_endif() {
    let output = compile("{{#if a}}never closed");
    assert_eq!(error_kinds(&output), vec![BuildErrorKind::MissingEndif]);
    assert_eq!(output.errors[0].span, Span::new(0, 9));
    assert_eq!(output.errors[0].text, "{{#if a}}");
}

#[test]
fn test_missing_endforeach() {
    let output = compile("{{#foreach x in xs}}{{x}}");
    assert_eq!(error_kinds(&output), vec![BuildErrorKind::MissingEndforeach]);
}

#[test]
fn test_duplicate_else() {
    let output = compile("{{#if a}}1{{#else}}2{{#else}}3{{#endif}}");
    assert_eq!(error_kinds(&output), vec![BuildErrorKind::DuplicateElse]);
    assert_eq!(output.errors[0].span, Span::new(20, 29));
}

#[test]
fn test_elseif_after_else() {
    let output = compile("{{#if a}}1{{#else}}2{{#elseif b}}3{{#endif}}");
    assert_eq!(error_kinds(&output), vec![BuildErrorKind::InvalidDirective]);
}

#[test]
fn test_unknown_and_stray_directives() {
    let output = compile("{{#bogus}} and {{#endif}}");
    assert_eq!(
        error_kinds(&output),
        vec![
            BuildErrorKind::InvalidDirective,
            BuildErrorKind::InvalidDirective
        ]
    );
    assert_eq!(output.errors[0].text, "{{#bogus}}");
}

#[test]
fn test_invalid_foreach_field() {
    let output = compile("{{#foreach items}}x{{#endforeach}}");
    assert_eq!(error_kinds(&output), vec![BuildErrorKind::InvalidForeachField]);

    let output = compile("{{#foreach a in b in c}}x{{#endforeach}}");
    assert_eq!(error_kinds(&output), vec![BuildErrorKind::InvalidForeachField]);
}

#[test]
fn test_invalid_loop_variable() {
    let output = compile("{{#foreach a.b in items}}x{{#endforeach}}");
    assert_eq!(error_kinds(&output), vec![BuildErrorKind::InvalidLoopVariable]);
    assert_eq!(output.errors[0].span, Span::new(11, 14));

    let output = compile("{{#foreach :x in items}}x{{#endforeach}}");
    assert_eq!(error_kinds(&output), vec![BuildErrorKind::InvalidLoopVariable]);
}

#[test]
fn test_expression_error_offsets() {
    let output = compile("Hello {{1 - }}");
    assert_eq!(
        error_kinds(&output),
        vec![BuildErrorKind::Expression(ParseErrorKind::InvalidFormula)]
    );
    assert_eq!(output.errors[0].span, Span::new(10, 11));

    let output = compile("{{data.1}}");
    assert_eq!(
        error_kinds(&output),
        vec![BuildErrorKind::Expression(ParseErrorKind::InvalidAccessor)]
    );
    assert_eq!(output.errors[0].span, Span::new(6, 7));
}

#[test]
fn test_condition_error_offsets() {
    let output = compile("{{#if a +}}x{{#endif}}");
    assert_eq!(
        error_kinds(&output),
        vec![BuildErrorKind::Expression(ParseErrorKind::InvalidFormula)]
    );
    assert_eq!(output.errors[0].span, Span::new(8, 9));
}

#[test]
fn test_multiple_errors_in_source_order() {
    let output = compile("{{ 1a }} middle {{ a , b }}");
    assert!(!output.ok);
    assert_eq!(
        error_kinds(&output),
        vec![
            BuildErrorKind::Expression(ParseErrorKind::InvalidToken),
            BuildErrorKind::Expression(ParseErrorKind::MultipleExpression),
        ]
    );
    assert_eq!(output.errors[0].span, Span::new(3, 5));
    assert_eq!(output.errors[1].span, Span::new(21, 22));
}

#[test]
fn test_error_in_block_does_not_cascade() {
    let output = compile("{{#foreach x in xs}}{{ x. }}{{#endforeach}} tail");
    assert_eq!(output.errors.len(), 1);
    assert_eq!(
        output.errors[0].kind,
        BuildErrorKind::Expression(ParseErrorKind::InvalidFormula)
    );
}

#[test]
fn test_compile_is_deterministic() {
    let source = "{{#role user}}\n{{#foreach x in xs}}{{#if x > 1}}{{x}}{{#endif}}{{#endforeach}}";
    assert_eq!(compile(source), compile(source));
}

#[test]
fn test_output_serializes_to_json() {
    let output = compile("{{#if a}}x{{#endif}}");
    let json = serde_json::to_value(&output).unwrap();
    assert_eq!(json["ok"], true);
    assert_eq!(json["instructions"][0]["type"], "group");
    assert_eq!(
        json["instructions"][0]["instructions"][0]["action"],
        "conditional_jump"
    );
}
