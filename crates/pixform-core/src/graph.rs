//! Debug graph of a formula tree.
//!
//! Nodes are numbered in pre-order from 0 and every parent→child relation
//! becomes an edge. The XML form is a minimal graph description wrapped in
//! a `<graph>` element named after the formula text.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::node::Node;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: usize,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub src: usize,
    pub dest: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    pub name: String,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    pub fn from_tree(name: &str, root: &Node) -> Self {
        let mut graph = Self {
            name: name.to_string(),
            nodes: Vec::new(),
            edges: Vec::new(),
        };
        graph.visit(root);
        graph
    }

    /// Record `node` and its subtree, returning the id given to `node`.
    fn visit(&mut self, node: &Node) -> usize {
        let id = self.nodes.len();
        self.nodes.push(GraphNode {
            id,
            label: node.label(),
        });
        for child in node.children() {
            let dest = self.visit(child);
            self.edges.push(GraphEdge { src: id, dest });
        }
        id
    }

    pub fn write_xml<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>")?;
        writeln!(out, "<graph name=\"{}\">", escape(&self.name))?;
        for node in &self.nodes {
            writeln!(
                out,
                "\t<node id=\"{}\">\n\t\t<text label=\"{}\"/>\n\t</node>",
                node.id,
                escape(&node.label)
            )?;
        }
        for edge in &self.edges {
            writeln!(out, "\t<edge src=\"{}\" dest=\"{}\"/>", edge.src, edge.dest)?;
        }
        writeln!(out, "</graph>")?;
        out.flush()
    }

    pub fn to_xml(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_xml(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Parser, clean};
    use crate::symbols::SymbolTable;

    fn graph(text: &str) -> Graph {
        let cleaned = clean(text);
        let root = Parser::new(SymbolTable::global())
            .parse(&cleaned)
            .unwrap_or_else(|e| panic!("{text}: {e}"));
        Graph::from_tree(&cleaned, &root)
    }

    #[test]
    fn test_preorder_ids_and_edges() {
        let g = graph("x+sin(2)");
        let labels: Vec<&str> = g.nodes.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, ["+", "x", "sin()", "2.000"]);
        assert_eq!(
            g.edges,
            [
                GraphEdge { src: 0, dest: 1 },
                GraphEdge { src: 2, dest: 3 },
                GraphEdge { src: 0, dest: 2 },
            ]
        );
    }

    #[test]
    fn test_xml_layout() {
        let xml = graph("1.5").to_xml();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n\
             <graph name=\"1.5\">\n\
             \t<node id=\"0\">\n\t\t<text label=\"1.500\"/>\n\t</node>\n\
             </graph>\n"
        );
    }

    #[test]
    fn test_xml_escapes_name() {
        let g = Graph {
            name: "a<b&\"c\"".to_string(),
            nodes: Vec::new(),
            edges: Vec::new(),
        };
        assert!(g.to_xml().contains("<graph name=\"a&lt;b&amp;&quot;c&quot;\">"));
    }

    #[test]
    fn test_json_round_trips_through_serde() {
        let g = graph("min(1,x)");
        let json = g.to_json().expect("serialize");
        let back: Graph = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, g);
    }
}
