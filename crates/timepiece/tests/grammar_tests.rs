//! Tests for the time spec grammar.

use timepiece::grammar::{Args, Span};
use timepiece::{parse, ArgValue, Joiner, ParseNode, TimepieceError};

fn call_name(node: &ParseNode) -> &str {
    match node {
        ParseNode::Call { name, .. } => name,
        ParseNode::Join { .. } => panic!("expected a call, got {node}"),
    }
}

fn join_parts(node: &ParseNode) -> (Joiner, &ParseNode, &ParseNode) {
    match node {
        ParseNode::Join {
            joiner,
            left,
            right,
        } => (*joiner, left, right),
        ParseNode::Call { .. } => panic!("expected a join, got {node}"),
    }
}

fn syntax_position(text: &str) -> usize {
    match parse(text) {
        Err(TimepieceError::Syntax { position, .. }) => position,
        other => panic!("expected a syntax error for {text:?}, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Calls and arguments
// ---------------------------------------------------------------------------

#[test]
fn parses_a_call_with_arguments() {
    let node = parse("func1(attr1: val1, attr2: val2)").unwrap();

    let mut expected = Args::new();
    expected.insert("attr1".into(), ArgValue::Str("val1".into()));
    expected.insert("attr2".into(), ArgValue::Str("val2".into()));

    assert_eq!(
        node,
        ParseNode::Call {
            name: "func1".into(),
            args: expected,
            span: Span::new(0, 31),
        }
    );
}

#[test]
fn parses_a_call_without_arguments() {
    let node = parse("blah()").unwrap();
    match node {
        ParseNode::Call { name, args, .. } => {
            assert_eq!(name, "blah");
            assert!(args.is_empty());
        }
        other => panic!("expected a call, got {other}"),
    }
}

#[test]
fn whitespace_is_insignificant() {
    let spaced = parse("  func1 ( attr1 : val1 ,attr2:  val2 )  |  func2( ) ").unwrap();
    let tight = parse("func1(attr1:val1,attr2:val2)|func2()").unwrap();
    assert_eq!(spaced.to_string(), tight.to_string());
}

#[test]
fn classifies_bare_tokens() {
    let node = parse("f(a: 12, b: true, c: mon;tues, d: -3, e: sunset)").unwrap();
    let ParseNode::Call { args, .. } = node else {
        panic!("expected a call");
    };
    assert_eq!(args["a"], ArgValue::Int(12));
    assert_eq!(args["b"], ArgValue::Bool(true));
    assert_eq!(
        args["c"],
        ArgValue::List(vec!["mon".to_string(), "tues".to_string()])
    );
    assert_eq!(args["d"], ArgValue::Int(-3));
    assert_eq!(args["e"], ArgValue::Str("sunset".into()));
}

#[test]
fn nested_calls_become_call_values() {
    let node = parse("interval(every: amount(num: 1, size: minute))").unwrap();
    let ParseNode::Call { args, .. } = node else {
        panic!("expected a call");
    };
    match &args["every"] {
        ArgValue::Call { name, args } => {
            assert_eq!(name, "amount");
            assert_eq!(args["num"], ArgValue::Int(1));
            assert_eq!(args["size"], ArgValue::Str("minute".into()));
        }
        other => panic!("expected a nested call, got {other}"),
    }
}

#[test]
fn nested_call_with_no_arguments() {
    let node = parse("between(start: now())").unwrap();
    let ParseNode::Call { args, .. } = node else {
        panic!("expected a call");
    };
    assert_eq!(args["start"], ArgValue::call("now"));
}

#[test]
fn iso_literals_pass_through_unquoted() {
    let node = parse("iso8601(type: datetime, specification: 2020-01-31T10:30:00+02:00)").unwrap();
    let ParseNode::Call { args, .. } = node else {
        panic!("expected a call");
    };
    assert_eq!(
        args["specification"],
        ArgValue::Str("2020-01-31T10:30:00+02:00".into())
    );
}

// ---------------------------------------------------------------------------
// Joiners
// ---------------------------------------------------------------------------

#[test]
fn mixed_joiners_apply_left_to_right() {
    let node = parse("a() | b() & c()").unwrap();

    let (outer, left, right) = join_parts(&node);
    assert_eq!(outer, Joiner::And);
    assert_eq!(call_name(right), "c");

    let (inner, first, second) = join_parts(left);
    assert_eq!(inner, Joiner::Or);
    assert_eq!(call_name(first), "a");
    assert_eq!(call_name(second), "b");
}

#[test]
fn and_then_or_is_also_left_to_right() {
    let node = parse("a() & b() | c()").unwrap();
    let (outer, left, _) = join_parts(&node);
    assert_eq!(outer, Joiner::Or);
    assert_eq!(join_parts(left).0, Joiner::And);
}

#[test]
fn parentheses_group() {
    let node = parse("a() | (b() & c())").unwrap();

    let (outer, left, right) = join_parts(&node);
    assert_eq!(outer, Joiner::Or);
    assert_eq!(call_name(left), "a");
    assert_eq!(join_parts(right).0, Joiner::And);
}

#[test]
fn redundant_parentheses_are_transparent() {
    assert_eq!(
        parse("((a()))").unwrap().to_string(),
        parse("a()").unwrap().to_string()
    );
}

#[test]
fn join_span_covers_both_sides() {
    let node = parse("a() & b()").unwrap();
    assert_eq!(node.span(), Span::new(0, 9));
}

#[test]
fn renders_joins_with_parentheses() {
    let node = parse("a(x: 1) | b() & c()").unwrap();
    assert_eq!(node.to_string(), "((a(x: 1) | b()) & c())");
}

// ---------------------------------------------------------------------------
// Syntax errors
// ---------------------------------------------------------------------------

#[test]
fn unclosed_call_reports_end_of_input() {
    match parse("func1(") {
        Err(TimepieceError::Syntax {
            position, found, ..
        }) => {
            assert_eq!(position, 6);
            assert_eq!(found, "end of input");
        }
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

#[test]
fn missing_close_paren_after_value() {
    assert_eq!(syntax_position("func1(a: b"), 10);
}

#[test]
fn dangling_joiner() {
    assert_eq!(syntax_position("func1() &"), 9);
}

#[test]
fn trailing_garbage() {
    match parse("func1(a: b) x") {
        Err(TimepieceError::Syntax {
            position,
            expected,
            found,
        }) => {
            assert_eq!(position, 12);
            assert_eq!(expected, "'&', '|' or end of input");
            assert_eq!(found, "'x'");
        }
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

#[test]
fn empty_value_is_rejected() {
    assert_eq!(syntax_position("f(a: )"), 5);
}

#[test]
fn missing_colon_is_rejected() {
    assert_eq!(syntax_position("f(a 1)"), 4);
}

#[test]
fn parenthesis_inside_a_bare_token_is_rejected() {
    assert!(matches!(parse("f(a: 1(2))"), Err(TimepieceError::Syntax { .. })));
}

#[test]
fn duplicate_argument_names_are_rejected() {
    assert!(matches!(
        parse("f(a: 1, a: 2)"),
        Err(TimepieceError::Syntax { .. })
    ));
}

#[test]
fn empty_input_is_rejected() {
    assert_eq!(syntax_position(""), 0);
}
