//! End-to-end behaviour of compiled formulas.

use pixform_core::{EvalContext, Formula, Node, ParseError};

fn eval(text: &str) -> f64 {
    Formula::new(text, false)
        .unwrap_or_else(|e| panic!("{text}: {e}"))
        .evaluate(&mut EvalContext::new())
}

fn xml(formula: &Formula) -> String {
    let mut out = Vec::new();
    formula.serialize(&mut out).expect("serialize");
    String::from_utf8(out).expect("utf8")
}

#[test]
fn test_precedence() {
    assert_eq!(eval("2+3*4"), 14.0);
    assert_eq!(eval("(2+3)*4"), 20.0);
}

#[test]
fn test_left_associativity() {
    assert_eq!(eval("2-3-4"), -5.0);
    assert_eq!(eval("10/2/5"), 1.0);
}

#[test]
fn test_unary_minus() {
    assert_eq!(eval("-5+3"), -2.0);
    assert_eq!(eval("--5"), 5.0);
}

#[test]
fn test_function_arity() {
    assert_eq!(eval("min(1,5,3)"), 1.0);
    let err = Formula::new("abs(1,2)", false).unwrap_err();
    assert!(matches!(err, ParseError::Arity { function: "abs", found: 2, .. }));
}

#[test]
fn test_unknown_tokens() {
    assert_eq!(
        Formula::new("foo(1)", false).unwrap_err(),
        ParseError::UnknownFunction("foo".into())
    );
    assert!(Formula::new("2+?", false).is_err());
}

#[test]
fn test_constant_folding_leaves_one_literal() {
    let mut f = Formula::new("2+3*sign(-1)", false).expect("parse");
    f.optimize();

    let out = xml(&f);
    assert_eq!(out.matches("<node ").count(), 1);
    assert!(out.contains("<text label=\"-1.000\"/>"));
    assert!(matches!(f.root(), Node::Literal(v) if *v == -1.0));
    assert_eq!(f.evaluate(&mut EvalContext::new()), -1.0);
}

#[test]
fn test_variables_survive_folding() {
    let mut f = Formula::new("x+1", false).expect("parse");
    f.optimize();

    assert!(xml(&f).contains("<text label=\"x\"/>"));
    let mut ctx = EvalContext::new();
    ctx.set_x(5.0);
    assert_eq!(f.evaluate(&mut ctx), 6.0);
}

#[test]
fn test_unclosed_parenthesis_is_tolerated() {
    assert_eq!(eval("(1+2"), 3.0);
}

#[test]
fn test_graph_edges_follow_tree() {
    let f = Formula::new("min(x,2)*y", false).expect("parse");
    let graph = f.graph();
    let labels: Vec<&str> = graph.nodes.iter().map(|n| n.label.as_str()).collect();
    assert_eq!(labels, ["*", "min()", "x", "2.000", "y"]);
    assert_eq!(graph.edges.len(), graph.nodes.len() - 1);
    assert!(graph.edges.iter().all(|e| e.src < e.dest));
}

#[test]
fn test_identity_channel_formula_reads_source() {
    use pixform_core::{Channel, ChannelSource};

    struct Ramp;

    impl ChannelSource for Ramp {
        fn sample(&self, channel: Channel, x: f64, y: f64) -> f64 {
            match channel {
                Channel::Red => x,
                Channel::Green => y,
                _ => 0.0,
            }
        }
    }

    let red = Formula::new("red(x,y)", false).expect("parse");
    let green = Formula::new("rgb(x, y) * 2", false).expect("parse");
    let source = Ramp;
    let mut ctx = EvalContext::with_source(&source);
    ctx.set_x(12.0);
    ctx.set_y(3.0);
    assert_eq!(red.evaluate(&mut ctx), 12.0);
    ctx.set_channel(Channel::Green);
    assert_eq!(green.evaluate(&mut ctx), 6.0);
}
