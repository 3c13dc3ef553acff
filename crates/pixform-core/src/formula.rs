//! The formula façade: cleaned source text plus its owned tree.

use std::io;
use std::str::FromStr;

use crate::context::EvalContext;
use crate::error::ParseError;
use crate::graph::Graph;
use crate::node::Node;
use crate::optimize::{self, OptimizeStats};
use crate::parser::{Parser, clean};
use crate::symbols::SymbolTable;

/// A compiled formula.
///
/// Compilation has no global side effects and dropping a formula releases
/// its whole tree. A formula is `Send + Sync`; concurrent callers each
/// bring their own [`EvalContext`].
#[derive(Debug, Clone)]
pub struct Formula {
    source: String,
    root: Node,
}

impl Formula {
    /// Compile `text` against the built-in symbol table.
    ///
    /// With `report_errors` set, a failure is also logged as a warning.
    /// Live re-parsing on every edit passes `false` to stay quiet.
    pub fn new(text: &str, report_errors: bool) -> Result<Self, ParseError> {
        Self::with_table(text, SymbolTable::global(), report_errors)
    }

    /// Parse against `table` instead of the global one; see
    /// [`SymbolTable::from_symbols`] for restricted tables.
    pub fn with_table(
        text: &str,
        table: &SymbolTable,
        report_errors: bool,
    ) -> Result<Self, ParseError> {
        let source = clean(text);
        match Parser::new(table).parse(&source) {
            Ok(root) => Ok(Self { source, root }),
            Err(e) => {
                if report_errors {
                    tracing::warn!(formula = %source, "Failed to parse formula: {e}");
                }
                Err(e)
            }
        }
    }

    /// Cleaned source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// True when the tree is a single literal, e.g. after a full fold.
    pub fn is_constant(&self) -> bool {
        self.root.is_literal()
    }

    pub fn evaluate(&self, ctx: &mut EvalContext<'_>) -> f64 {
        self.root.evaluate(ctx)
    }

    /// Constant-fold the tree in place. Safe to call repeatedly.
    pub fn optimize(&mut self) -> OptimizeStats {
        let stats = optimize::optimize(&mut self.root);
        tracing::debug!(
            formula = %self.source,
            folded = stats.folded,
            "Optimized formula: {} -> {} nodes",
            stats.nodes_before,
            stats.nodes_after
        );
        stats
    }

    pub fn graph(&self) -> Graph {
        Graph::from_tree(&self.source, &self.root)
    }

    /// Write the XML debug graph of the current tree to `sink`.
    pub fn serialize<W: io::Write>(&self, sink: W) -> io::Result<()> {
        self.graph().write_xml(sink)
    }
}

impl FromStr for Formula {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s, false)
    }
}
