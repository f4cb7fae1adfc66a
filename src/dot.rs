//! dot — запись описания диаграммы в формате Graphviz DOT.
//!
//! `DotWriter` is write-only and keeps no state besides the writer: callers
//! are responsible for balancing begin/end calls. Node labels are HTML-like
//! tables, one cell per nibble, coloured from the nibble palette.

use std::fmt;
use std::io::{self, Write};

use crate::layout::{GridCell, GridPlan, GridRow, LinearCell, LinearPlan};
use crate::nibble::{nibble_color, nibble_label};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeRole {
    Key,
    Value,
}

/// Deterministic node identifier: role + sequence index of the entry.
/// The same entry gets the same ids in the global and the per-bucket graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub role: NodeRole,
    pub seq: usize,
}

impl NodeId {
    pub fn key(seq: usize) -> Self {
        Self {
            role: NodeRole::Key,
            seq,
        }
    }

    pub fn value(seq: usize) -> Self {
        Self {
            role: NodeRole::Value,
            seq,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.role {
            NodeRole::Key => write!(f, "k_{}", self.seq),
            NodeRole::Value => write!(f, "v_{}", self.seq),
        }
    }
}

const TABLE_OPEN: &str = r##"<table border="0" color="#000000" cellborder="1" cellspacing="0">"##;
const ELISION_CELL: &str = r#"<td border="0"><font point-size="1">-----------</font></td>"#;
const BLANK_CELL: &str = r#"<td border="0"></td>"#;

pub struct DotWriter<W: Write> {
    w: W,
}

impl<W: Write> DotWriter<W> {
    pub fn new(w: W) -> Self {
        Self { w }
    }

    pub fn into_inner(self) -> W {
        self.w
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.w.flush()
    }

    pub fn begin_graph(&mut self) -> io::Result<()> {
        writeln!(self.w, "digraph trie {{")?;
        writeln!(self.w, "\trankdir=LR;")?;
        writeln!(self.w, "\tnode [shape=none margin=0 width=0 height=0]")?;
        writeln!(self.w, "\tedge [dir = none headport=w tailport=e]")
    }

    pub fn end_graph(&mut self) -> io::Result<()> {
        writeln!(self.w, "}}")
    }

    pub fn begin_cluster(&mut self, ordinal: usize, label: &str) -> io::Result<()> {
        writeln!(self.w, "subgraph cluster_{} {{", ordinal)?;
        writeln!(self.w, "\tlabel = \"{}\";", escape(label))?;
        writeln!(self.w, "\tcolor = black;")
    }

    pub fn end_cluster(&mut self) -> io::Result<()> {
        writeln!(self.w, "}}")
    }

    /// List cluster members on one line: `k_0;v_0;k_1;`.
    pub fn cluster_members(&mut self, nodes: &[NodeId]) -> io::Result<()> {
        for n in nodes {
            write!(self.w, "{};", n)?;
        }
        writeln!(self.w)
    }

    pub fn key_row(&mut self, seq: usize, plan: &LinearPlan) -> io::Result<()> {
        self.linear_node(NodeId::key(seq), plan)
    }

    pub fn value_row(&mut self, seq: usize, plan: &LinearPlan) -> io::Result<()> {
        self.linear_node(NodeId::value(seq), plan)
    }

    pub fn value_grid(&mut self, seq: usize, plan: &GridPlan) -> io::Result<()> {
        let id = NodeId::value(seq);
        writeln!(self.w, "\t{} [label=<", id)?;
        writeln!(self.w, "\t{}", TABLE_OPEN)?;
        if plan.rows.is_empty() {
            writeln!(self.w, "\t\t<tr>{}</tr>", BLANK_CELL)?;
        }
        for row in &plan.rows {
            write!(self.w, "\t\t<tr>")?;
            match row {
                GridRow::Cells(cells) => {
                    for cell in cells {
                        self.grid_cell(cell)?;
                    }
                }
                GridRow::Spacer { colspan } => {
                    write!(self.w, r#"<td colspan="{}" border="0"></td>"#, colspan)?;
                }
            }
            writeln!(self.w, "</tr>")?;
        }
        writeln!(self.w, "\t</table>")?;
        writeln!(self.w, "\t>];")
    }

    pub fn newline(&mut self) -> io::Result<()> {
        writeln!(self.w)
    }

    pub fn edge(&mut self, from: NodeId, to: NodeId) -> io::Result<()> {
        writeln!(self.w, "{} -> {};", from, to)
    }

    // ----------------- internal helpers -----------------

    fn linear_node(&mut self, id: NodeId, plan: &LinearPlan) -> io::Result<()> {
        writeln!(self.w, "\t{} [label=<", id)?;
        writeln!(self.w, "\t{}", TABLE_OPEN)?;
        writeln!(self.w, "\t<tr>")?;
        if plan.is_empty() {
            // Graphviz rejects a table row without cells.
            writeln!(self.w, "\t\t{}", BLANK_CELL)?;
        }
        for cell in &plan.cells {
            write!(self.w, "\t\t")?;
            match *cell {
                LinearCell::Filled(n) => self.labeled_cell(n)?,
                LinearCell::Empty(n) => self.color_cell(n)?,
                LinearCell::Elision => write!(self.w, "{}", ELISION_CELL)?,
            }
            writeln!(self.w)?;
        }
        writeln!(self.w, "\t</tr></table>")?;
        writeln!(self.w, "\t>];")
    }

    fn grid_cell(&mut self, cell: &GridCell) -> io::Result<()> {
        match *cell {
            GridCell::Nibble { value, labeled: true } => self.labeled_cell(value),
            GridCell::Nibble { value, labeled: false } => self.color_cell(value),
            GridCell::VerticalElision { rowspan } => {
                write!(self.w, r#"<td rowspan="{}" border="0"></td>"#, rowspan)
            }
            GridCell::Pad { colspan } => {
                write!(self.w, r#"<td colspan="{}" border="0"></td>"#, colspan)
            }
        }
    }

    fn labeled_cell(&mut self, n: u8) -> io::Result<()> {
        let (bg, fg) = nibble_color(n);
        write!(
            self.w,
            r#"<td bgcolor="{}"><font color="{}">{}</font></td>"#,
            bg,
            fg,
            nibble_label(n)
        )
    }

    fn color_cell(&mut self, n: u8) -> io::Result<()> {
        let (bg, _) = nibble_color(n);
        write!(self.w, r#"<td bgcolor="{}"></td>"#, bg)
    }
}

/// Escape a string for a double-quoted DOT literal.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}
