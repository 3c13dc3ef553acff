//! Formula tree nodes and their evaluation.
//!
//! A parsed tree owns its children outright. Leaves are literals or named
//! values; inner nodes are binary operators or function calls whose
//! argument count has already been checked against the function's arity.

use crate::context::EvalContext;
use crate::symbols::{Binding, FunctionDef, Native, OperatorDef, Reduction, ValueDef};

#[derive(Debug, Clone)]
pub enum Node {
    /// A parsed number or a folded result.
    Literal(f64),
    /// A named constant or coordinate variable.
    Variable(&'static ValueDef),
    Operator {
        op: &'static OperatorDef,
        left: Box<Node>,
        right: Box<Node>,
    },
    Function {
        func: &'static FunctionDef,
        args: Vec<Node>,
    },
}

impl Node {
    pub fn operator(op: &'static OperatorDef, left: Node, right: Node) -> Self {
        Self::Operator {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn function(func: &'static FunctionDef, args: Vec<Node>) -> Self {
        Self::Function { func, args }
    }

    /// Evaluate this subtree against the current pixel state.
    ///
    /// Never fails: domain errors surface as IEEE-754 infinities or NaN.
    pub fn evaluate(&self, ctx: &mut EvalContext<'_>) -> f64 {
        match self {
            Self::Literal(value) => *value,
            Self::Variable(def) => match def.binding {
                Binding::Fixed(value) => value,
                Binding::Slot(slot) => ctx.slot(slot),
            },
            Self::Operator { op, left, right } => {
                let l = left.evaluate(ctx);
                let r = right.evaluate(ctx);
                (op.apply)(l, r)
            }
            Self::Function { func, args } => call(func, args, ctx),
        }
    }

    /// Text shown for this node in graph dumps.
    pub fn label(&self) -> String {
        match self {
            Self::Literal(value) => format!("{value:.3}"),
            Self::Variable(def) => def.key.to_string(),
            Self::Operator { op, .. } => op.key.to_string(),
            Self::Function { func, .. } => format!("{})", func.key),
        }
    }

    /// Direct children, left to right.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Self::Literal(_) | Self::Variable(_) => Vec::new(),
            Self::Operator { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Self::Function { args, .. } => args.iter().collect(),
        }
    }

    /// Number of nodes in this subtree.
    pub fn size(&self) -> usize {
        1 + self.children().into_iter().map(Node::size).sum::<usize>()
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

/// Evaluate argument `index`, or NaN for a call built with too few arguments.
fn arg(args: &[Node], index: usize, ctx: &mut EvalContext<'_>) -> f64 {
    args.get(index).map_or(f64::NAN, |node| node.evaluate(ctx))
}

fn call(func: &FunctionDef, args: &[Node], ctx: &mut EvalContext<'_>) -> f64 {
    match func.native {
        Native::Unary(f) => f(arg(args, 0, ctx)),
        Native::Binary(f) => {
            let a = arg(args, 0, ctx);
            let b = arg(args, 1, ctx);
            f(a, b)
        }
        Native::Reduce(reduction) => reduce(reduction, args, ctx),
        Native::Sample(channel) => {
            let x = arg(args, 0, ctx);
            let y = arg(args, 1, ctx);
            ctx.sample(channel, x, y)
        }
        Native::SampleCurrent => {
            let x = arg(args, 0, ctx);
            let y = arg(args, 1, ctx);
            ctx.sample(ctx.channel(), x, y)
        }
        Native::Random => ctx.random(),
    }
}

fn reduce(reduction: Reduction, args: &[Node], ctx: &mut EvalContext<'_>) -> f64 {
    let Some((first, rest)) = args.split_first() else {
        return f64::NAN;
    };
    let mut acc = first.evaluate(ctx);
    for node in rest {
        let v = node.evaluate(ctx);
        match reduction {
            Reduction::Min => {
                if v < acc {
                    acc = v;
                }
            }
            Reduction::Max => {
                if v > acc {
                    acc = v;
                }
            }
            Reduction::Avg => acc += v,
        }
    }
    match reduction {
        Reduction::Avg => acc / args.len() as f64,
        Reduction::Min | Reduction::Max => acc,
    }
}
