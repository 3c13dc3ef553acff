//! Constant folding.
//!
//! Children are folded first. Each node then reports a [`Foldability`]:
//! an operator or function whose inputs are all known and whose symbol is
//! pure reports `CanFold` and lets its parent decide; anything else
//! replaces its own `CanFold` children with literals and reports
//! `CannotFold`. A root that reports `CanFold` becomes a single literal.

use crate::context::EvalContext;
use crate::node::Node;

/// Whether a subtree can be replaced by its value ahead of evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Foldability {
    /// Depends on per-pixel state: coordinates, channel samples, `rand()`.
    CannotFold,
    /// A literal or fixed constant; may join a fold but is not folded alone.
    Term,
    /// Pure, with every input known.
    CanFold,
}

/// Summary of a folding pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizeStats {
    /// Subtrees replaced by a literal.
    pub folded: usize,
    pub nodes_before: usize,
    pub nodes_after: usize,
}

/// Fold `root` in place.
pub fn optimize(root: &mut Node) -> OptimizeStats {
    let mut stats = OptimizeStats {
        nodes_before: root.size(),
        ..OptimizeStats::default()
    };
    // Foldable subtrees never read the context.
    let mut ctx = EvalContext::new();

    if fold(root, &mut ctx, &mut stats) == Foldability::CanFold {
        replace_with_value(root, &mut ctx, &mut stats);
    }

    stats.nodes_after = root.size();
    stats
}

fn replace_with_value(node: &mut Node, ctx: &mut EvalContext<'_>, stats: &mut OptimizeStats) {
    let value = node.evaluate(ctx);
    *node = Node::Literal(value);
    stats.folded += 1;
}

fn fold(node: &mut Node, ctx: &mut EvalContext<'_>, stats: &mut OptimizeStats) -> Foldability {
    match node {
        Node::Literal(_) => Foldability::Term,
        Node::Variable(def) => def.foldability(),
        Node::Operator { op, left, right } => {
            let codes = [fold(left, ctx, stats), fold(right, ctx, stats)];
            if op.foldable && !codes.contains(&Foldability::CannotFold) {
                return Foldability::CanFold;
            }
            for (child, code) in [left.as_mut(), right.as_mut()].into_iter().zip(codes) {
                if code == Foldability::CanFold {
                    replace_with_value(child, ctx, stats);
                }
            }
            Foldability::CannotFold
        }
        Node::Function { func, args } => {
            if args.is_empty() {
                return if func.foldable {
                    Foldability::CanFold
                } else {
                    Foldability::CannotFold
                };
            }
            let codes: Vec<Foldability> = args.iter_mut().map(|arg| fold(arg, ctx, stats)).collect();
            if func.foldable && !codes.contains(&Foldability::CannotFold) {
                return Foldability::CanFold;
            }
            for (arg, code) in args.iter_mut().zip(codes) {
                if code == Foldability::CanFold {
                    replace_with_value(arg, ctx, stats);
                }
            }
            Foldability::CannotFold
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Parser, clean};
    use crate::symbols::SymbolTable;

    fn tree(text: &str) -> Node {
        Parser::new(SymbolTable::global())
            .parse(&clean(text))
            .unwrap_or_else(|e| panic!("{text}: {e}"))
    }

    #[test]
    fn test_pure_tree_folds_to_literal() {
        let mut root = tree("2+3*sign(-1)");
        let stats = optimize(&mut root);
        assert!(matches!(root, Node::Literal(v) if v == -1.0));
        assert_eq!(stats.folded, 1);
        assert_eq!(stats.nodes_after, 1);
        assert!(stats.nodes_before > 1);
    }

    #[test]
    fn test_lone_literal_is_untouched() {
        let mut root = tree("4");
        let stats = optimize(&mut root);
        assert_eq!(stats.folded, 0);
        assert!(root.is_literal());
    }

    #[test]
    fn test_fixed_constants_fold_with_operators() {
        let mut root = tree("2*pi");
        optimize(&mut root);
        assert!(matches!(root, Node::Literal(v) if v == 2.0 * std::f64::consts::PI));

        let mut root = tree("pi");
        optimize(&mut root);
        assert!(matches!(root, Node::Variable(def) if def.key == "pi"));
    }

    #[test]
    fn test_variables_block_folding() {
        let mut root = tree("x+1");
        let stats = optimize(&mut root);
        assert_eq!(stats.folded, 0);
        let Node::Operator { left, .. } = &root else {
            panic!("expected operator");
        };
        assert!(matches!(**left, Node::Variable(def) if def.key == "x"));
    }

    #[test]
    fn test_pure_siblings_of_variables_are_hoisted() {
        let mut root = tree("x*sin(1+2)+y");
        let stats = optimize(&mut root);
        assert_eq!(stats.folded, 1);
        let mut ctx = EvalContext::new();
        ctx.set_x(2.0);
        ctx.set_y(1.0);
        assert_eq!(root.evaluate(&mut ctx), 2.0 * 3.0_f64.sin() + 1.0);
    }

    #[test]
    fn test_impure_functions_are_kept() {
        let mut root = tree("rand()*(2+2)");
        optimize(&mut root);
        let Node::Operator { left, right, .. } = &root else {
            panic!("expected operator");
        };
        assert!(matches!(**left, Node::Function { func, .. } if func.name() == "rand"));
        assert!(matches!(**right, Node::Literal(v) if v == 4.0));

        let mut root = tree("red(1+1,2)");
        optimize(&mut root);
        let Node::Function { args, .. } = &root else {
            panic!("expected function");
        };
        assert!(matches!(args[0], Node::Literal(v) if v == 2.0));
        assert!(args[1].is_literal());
    }

    #[test]
    fn test_optimize_is_idempotent() {
        let mut root = tree("min(x,3*4,abs(-2))/(1+1)");
        let first = optimize(&mut root);
        let second = optimize(&mut root);
        assert_eq!(second.folded, 0);
        assert_eq!(first.nodes_after, second.nodes_after);
    }
}
