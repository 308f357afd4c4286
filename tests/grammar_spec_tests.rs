//! End-to-end tests driving the public facade: compile a grammar source, then parse text against
//! it. Mirrors the scenarios spelled out in the distilled spec's worked examples (operator
//! precedence, `class` construction, ignored-token list parsing, farthest-failure choice,
//! `Commit`/`recover`), plus the template and builtin-transform machinery the compiler added.

use indoc::indoc;

use parselit::value::Infix;
use parselit::{Grammar, Value};

fn compile(src: &str) -> Grammar {
    Grammar::compile(src).unwrap_or_else(|e| panic!("grammar failed to compile: {e}"))
}

#[test]
fn left_assoc_nests_to_the_left() {
    let g = compile(indoc! {r#"
        start = OperatorPrecedence(int, LeftAssoc(plus))
        int = `[0-9]+`
        plus = `\+`
    "#});

    let value = g.parse("1+2+3").expect("parse failed");
    let Value::Infix(outer) = value else {
        panic!("expected Infix, got {value:?}");
    };
    assert_eq!(outer.op, Value::Text("+".to_string()));
    assert_eq!(outer.right, Value::Text("3".to_string()));
    let Value::Infix(inner) = outer.left else {
        panic!("expected a nested Infix on the left");
    };
    assert_eq!(*inner, Infix {
        left: Value::Text("1".to_string()),
        op: Value::Text("+".to_string()),
        right: Value::Text("2".to_string()),
    });
}

#[test]
fn right_assoc_nests_to_the_right() {
    let g = compile(indoc! {r#"
        start = OperatorPrecedence(int, RightAssoc(arrow))
        int = `[0-9]+`
        arrow = `->`
    "#});

    let value = g.parse("1->2->3").expect("parse failed");
    let Value::Infix(outer) = value else {
        panic!("expected Infix, got {value:?}");
    };
    assert_eq!(outer.left, Value::Text("1".to_string()));
    assert_eq!(outer.op, Value::Text("->".to_string()));
    let Value::Infix(inner) = outer.right else {
        panic!("expected a nested Infix on the right");
    };
    assert_eq!(*inner, Infix {
        left: Value::Text("2".to_string()),
        op: Value::Text("->".to_string()),
        right: Value::Text("3".to_string()),
    });
}

#[test]
fn class_builds_a_named_field_node() {
    let g = compile(indoc! {r#"
        start = Pair
        class Pair { left = int; comma = ','; right = int }
        int = `[0-9]+`
    "#});

    let value = g.parse("1,2").expect("parse failed");
    let Value::Node(node) = value else {
        panic!("expected Node, got {value:?}");
    };
    assert_eq!(node.type_name, "Pair");
    assert_eq!(node.get("left"), Some(&Value::Text("1".to_string())));
    assert_eq!(node.get("comma"), Some(&Value::Text(",".to_string())));
    assert_eq!(node.get("right"), Some(&Value::Text("2".to_string())));
}

#[test]
fn parametric_class_substitutes_its_arguments() {
    let g = compile(indoc! {r#"
        start = Pair(num, num)
        class Pair(A, B) { left = A; mid = ','; right = B }
        num = `[0-9]+`
    "#});

    let value = g.parse("1,2").expect("parse failed");
    let Value::Node(node) = value else {
        panic!("expected Node, got {value:?}");
    };
    assert_eq!(node.type_name, "Pair");
    assert_eq!(node.get("left"), Some(&Value::Text("1".to_string())));
    assert_eq!(node.get("right"), Some(&Value::Text("2".to_string())));
}

#[test]
fn ignored_whitespace_is_skipped_between_alternated_list_items() {
    let g = compile(indoc! {r#"
        start = int / comma
        ignored token ws = `[ \t\n]+`
        int = `[0-9]+`
        comma = `,`
    "#});

    let value = g.parse("1, 2,  3").expect("parse failed");
    assert_eq!(
        value,
        Value::List(vec![
            Value::Text("1".to_string()),
            Value::Text("2".to_string()),
            Value::Text("3".to_string()),
        ])
    );
}

#[test]
fn choice_reports_the_farthest_failure_not_the_first() {
    let g = compile(indoc! {r#"
        start = ("a" "b" "c") | ("a" "x" "z")
    "#});

    let err = g.parse("axy").unwrap_err();
    assert_eq!(err.pos, 2);
    assert_eq!(err.message, "Expected \"z\".");
}

#[test]
fn commit_disables_backtracking_out_of_its_rule() {
    let committed = compile(indoc! {r#"
        start = clause | "xq"
        clause = "x" "y"! "z"
    "#});
    // `clause` contains a commit, so once it starts failing the driver never backs out to try
    // the `"xq"` alternative, even though `"xq"` would otherwise match the whole input.
    assert!(committed.parse("xq").is_err());
    assert_eq!(
        committed.parse("xyz").unwrap(),
        Value::List(vec![
            Value::Text("x".to_string()),
            Value::Text("y".to_string()),
            Value::Text("z".to_string()),
        ])
    );

    let uncommitted = compile(indoc! {r#"
        start = clause | "xq"
        clause = "x" "y" "z"
    "#});
    assert_eq!(uncommitted.parse("xq").unwrap(), Value::Text("xq".to_string()));
}

#[test]
fn template_invocation_substitutes_its_body() {
    let g = compile(indoc! {r#"
        start = paren(num)
        template paren(inner) => "(" inner ")"
        num = `[0-9]+`
    "#});

    let value = g.parse("(5)").expect("parse failed");
    assert_eq!(
        value,
        Value::List(vec![
            Value::Text("(".to_string()),
            Value::Text("5".to_string()),
            Value::Text(")".to_string()),
        ])
    );
}

#[test]
fn expect_not_rejects_only_when_the_lookahead_matches() {
    let g = compile(indoc! {r#"
        start = expect_not("b") "a"
    "#});

    assert_eq!(
        g.parse("a").unwrap(),
        Value::List(vec![Value::Null, Value::Text("a".to_string())])
    );
    assert!(g.parse("ba").is_err());
}

#[test]
fn recover_falls_back_when_the_primary_body_fails() {
    let g = compile(indoc! {r#"
        start = digits
        digits = `[0-9]+`
        recover digits = "?"
    "#});

    assert_eq!(g.parse("42").unwrap(), Value::Text("42".to_string()));
    assert_eq!(g.parse("?").unwrap(), Value::Text("?".to_string()));
}

#[test]
fn where_rejects_values_failing_its_predicate() {
    let g = compile(indoc! {r#"
        start = where(num, is_not_empty)
        num = `[0-9]*`
    "#});

    assert_eq!(g.parse("5").unwrap(), Value::Text("5".to_string()));
    assert!(g.parse("").is_err());
}

#[test]
fn int_builtin_parses_matched_text_as_an_integer() {
    let g = compile(indoc! {r#"
        start = int(`[0-9]+`)
    "#});

    assert_eq!(g.parse("42").unwrap(), Value::Int(42));
}
