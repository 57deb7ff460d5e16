//! draw.io (mxGraph) document builder.
//!
//! Identifiers: a table cell uses the table name, and the N-th column of a
//! table owns `{table}-{N}` (row), `{table}-icon-{N}` and `{table}-col-{N}`.
//! Edges reference rows by those ids, so both sides must agree.

use log::debug;

use crate::clock::{Clock, SystemClock};
use crate::ir::{Edge, Node, SchemaIR};
use crate::layout::{Layout, LayoutNode};
use crate::measure::TableMetrics;
use crate::style::{self, Align, Style};

pub const TITLE_ID: &str = "title";
pub const DATE_GRID_ID: &str = "table-date";
/// Cell ids that belong to the document itself rather than to a table.
pub const RESERVED_IDS: [&str; 4] = ["0", "1", TITLE_ID, DATE_GRID_ID];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("Column '{column}' not found in table '{table}' or {table} doesn't exist")]
    DanglingReference { table: String, column: String },
    #[error("Table '{0}' has no layout")]
    MissingLayout(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellKind {
    /// The two reserved root cells
    Anchor,
    Vertex,
    Edge { source: String, target: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub id: String,
    pub value: String,
    pub style: Option<Style>,
    pub parent: Option<String>,
    pub kind: CellKind,
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub relative: bool,
    pub source_point: Option<(f64, f64)>,
    pub target_point: Option<(f64, f64)>,
}

impl Geometry {
    fn sized(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    fn at(mut self, x: Option<f64>, y: Option<f64>) -> Self {
        self.x = x;
        self.y = y;
        self
    }
}

/// The document tree: every cell is a sibling under the single content root.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphModel {
    pub cells: Vec<Cell>,
}

impl GraphModel {
    pub fn cell(&self, id: &str) -> Option<&Cell> {
        self.cells.iter().find(|c| c.id == id)
    }

    pub fn edges(&self) -> impl Iterator<Item = &Cell> {
        self.cells
            .iter()
            .filter(|c| matches!(c.kind, CellKind::Edge { .. }))
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<mxGraphModel");
        for (key, value) in CANVAS {
            push_attr(&mut xml, key, value);
        }
        xml.push_str(">\n  <root>\n");
        for cell in &self.cells {
            write_cell(&mut xml, cell);
        }
        xml.push_str("  </root>\n</mxGraphModel>\n");
        xml
    }
}

const CANVAS: [(&str, &str); 15] = [
    ("dx", "3247"),
    ("dy", "533"),
    ("grid", "0"),
    ("gridSize", "10"),
    ("guides", "1"),
    ("tooltips", "1"),
    ("connect", "1"),
    ("arrows", "1"),
    ("fold", "1"),
    ("page", "1"),
    ("pageScale", "1"),
    ("pageWidth", "850"),
    ("pageHeight", "1100"),
    ("math", "0"),
    ("shadow", "0"),
];

pub struct DrawioRenderer<C: Clock = SystemClock> {
    metrics: TableMetrics,
    clock: C,
}

impl Default for DrawioRenderer<SystemClock> {
    fn default() -> Self {
        Self {
            metrics: TableMetrics::default(),
            clock: SystemClock,
        }
    }
}

impl<C: Clock> DrawioRenderer<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            metrics: TableMetrics::default(),
            clock,
        }
    }

    pub fn render(&self, ir: &SchemaIR, layout: &Layout) -> Result<String, RenderError> {
        Ok(self.build(ir, layout)?.to_xml())
    }

    /// Build the cell tree: anchors, tables with their rows, edges, then the
    /// optional title and date grid.
    pub fn build(&self, ir: &SchemaIR, layout: &Layout) -> Result<GraphModel, RenderError> {
        let mut cells = vec![
            Cell {
                id: "0".into(),
                value: String::new(),
                style: None,
                parent: None,
                kind: CellKind::Anchor,
                geometry: None,
            },
            Cell {
                id: "1".into(),
                value: String::new(),
                style: None,
                parent: Some("0".into()),
                kind: CellKind::Anchor,
                geometry: None,
            },
        ];

        for node in &ir.nodes {
            let placed = layout
                .node(&node.name)
                .ok_or_else(|| RenderError::MissingLayout(node.name.clone()))?;
            self.table_cells(&mut cells, node, placed);
        }

        for edge in &ir.edges {
            cells.push(edge_cell(ir, edge)?);
        }

        if let Some(title) = &ir.title {
            cells.push(vertex(
                TITLE_ID,
                title,
                Style::Title,
                "1",
                Geometry::sized(125.0, 40.0).at(Some(186.0), Some(10.0)),
            ));
        }

        if let Some(created_at) = &ir.created_at {
            self.date_grid(&mut cells, created_at);
        }

        debug!("built {} cells", cells.len());
        Ok(GraphModel { cells })
    }

    fn table_cells(&self, cells: &mut Vec<Cell>, node: &Node, placed: &LayoutNode) {
        let width = placed.width as f64;
        let row_height = self.metrics.row_height as f64;
        let icon_width = self.metrics.icon_width as f64;

        cells.push(vertex(
            &node.name,
            &node.name,
            Style::Table {
                fill_color: style::table_fill(&node.name),
            },
            "1",
            Geometry::sized(width, placed.height as f64)
                .at(Some(placed.x as f64), Some(placed.y as f64)),
        ));

        for (i, column) in node.columns.iter().enumerate() {
            let n = i + 1;
            let row_id = format!("{}-{}", node.name, n);
            let row_y = row_height * n as f64;

            cells.push(vertex(
                &row_id,
                "",
                Style::Row {
                    fill_color: style::row_fill(n),
                    key: column.key,
                },
                &node.name,
                Geometry::sized(width, row_height).at(None, Some(row_y)),
            ));
            cells.push(vertex(
                &format!("{}-icon-{}", node.name, n),
                column.key.tag(),
                Style::IconCell { key: column.key },
                &row_id,
                Geometry::sized(icon_width, row_height),
            ));
            cells.push(vertex(
                &format!("{}-col-{}", node.name, n),
                &column.name,
                Style::LabelCell { key: column.key },
                &row_id,
                Geometry::sized(width - icon_width, row_height).at(Some(icon_width), None),
            ));
        }
    }

    fn date_grid(&self, cells: &mut Vec<Cell>, created_at: &str) {
        const WIDTH: f64 = 175.75;
        const ROW: f64 = 24.0;

        cells.push(vertex(
            DATE_GRID_ID,
            "",
            Style::DateGrid,
            "1",
            Geometry::sized(WIDTH, ROW * 2.0).at(Some(1.0), Some(6.0)),
        ));

        let updated_at = self.clock.iso_date();
        let rows = [("CreatedAt:", created_at), ("UpdatedAt:", updated_at.as_str())];

        for (r, (label, value)) in rows.into_iter().enumerate() {
            let row_id = format!("{DATE_GRID_ID}-{r}");
            let row_y = if r == 1 { Some(ROW) } else { None };
            cells.push(vertex(
                &row_id,
                "",
                Style::DateRow,
                DATE_GRID_ID,
                Geometry::sized(WIDTH, ROW).at(None, row_y),
            ));
            cells.push(vertex(
                &format!("{row_id}-0"),
                label,
                Style::DateCell {
                    align: Align::Right,
                },
                &row_id,
                Geometry::sized(82.0, ROW),
            ));
            cells.push(vertex(
                &format!("{row_id}-1"),
                value,
                Style::DateCell { align: Align::Left },
                &row_id,
                Geometry::sized(94.0, ROW).at(Some(82.0), None),
            ));
        }
    }
}

fn vertex(id: &str, value: &str, style: Style, parent: &str, geometry: Geometry) -> Cell {
    Cell {
        id: id.to_string(),
        value: value.to_string(),
        style: Some(style),
        parent: Some(parent.to_string()),
        kind: CellKind::Vertex,
        geometry: Some(geometry),
    }
}

fn row_id(ir: &SchemaIR, table: &str, column: &str) -> Result<String, RenderError> {
    ir.node(table)
        .and_then(|n| n.row_id(column))
        .ok_or_else(|| RenderError::DanglingReference {
            table: table.to_string(),
            column: column.to_string(),
        })
}

fn edge_cell(ir: &SchemaIR, edge: &Edge) -> Result<Cell, RenderError> {
    let source = row_id(ir, &edge.from.table, &edge.from.column)?;
    let target = row_id(ir, &edge.to.table, &edge.to.column)?;

    Ok(Cell {
        id: new_edge_id(),
        value: String::new(),
        style: Some(Style::Edge {
            start_arrow: edge.start_arrow,
            end_arrow: edge.end_arrow,
        }),
        parent: Some("1".into()),
        kind: CellKind::Edge { source, target },
        geometry: Some(Geometry {
            width: Some(100.0),
            height: Some(100.0),
            relative: true,
            source_point: Some((310.0, 98.0)),
            target_point: Some((420.0, 230.0)),
            ..Default::default()
        }),
    })
}

/// Random 128-bit token as 32 lowercase hex digits.
pub fn new_edge_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

fn write_cell(xml: &mut String, cell: &Cell) {
    xml.push_str("    <mxCell");
    push_attr(xml, "id", &cell.id);
    if cell.kind != CellKind::Anchor {
        push_attr(xml, "value", &cell.value);
    }
    if let Some(style) = &cell.style {
        push_attr(xml, "style", &style.render());
    }
    match &cell.kind {
        CellKind::Anchor => {}
        CellKind::Vertex => push_attr(xml, "vertex", "1"),
        CellKind::Edge { .. } => push_attr(xml, "edge", "1"),
    }
    if let Some(parent) = &cell.parent {
        push_attr(xml, "parent", parent);
    }
    if let CellKind::Edge { source, target } = &cell.kind {
        push_attr(xml, "source", source);
        push_attr(xml, "target", target);
    }

    let Some(geometry) = &cell.geometry else {
        xml.push_str(" />\n");
        return;
    };

    xml.push_str(">\n      <mxGeometry");
    for (key, value) in [
        ("x", geometry.x),
        ("y", geometry.y),
        ("width", geometry.width),
        ("height", geometry.height),
    ] {
        if let Some(v) = value {
            push_attr(xml, key, &format_num(v));
        }
    }
    if geometry.relative {
        push_attr(xml, "relative", "1");
    }
    push_attr(xml, "as", "geometry");

    let points = [
        ("sourcePoint", geometry.source_point),
        ("targetPoint", geometry.target_point),
    ];
    if points.iter().all(|(_, p)| p.is_none()) {
        xml.push_str(" />\n");
    } else {
        xml.push_str(">\n");
        for (role, point) in points {
            if let Some((x, y)) = point {
                xml.push_str("        <mxPoint");
                push_attr(xml, "x", &format_num(x));
                push_attr(xml, "y", &format_num(y));
                push_attr(xml, "as", role);
                xml.push_str(" />\n");
            }
        }
        xml.push_str("      </mxGeometry>\n");
    }
    xml.push_str("    </mxCell>\n");
}

fn push_attr(xml: &mut String, key: &str, value: &str) {
    xml.push(' ');
    xml.push_str(key);
    xml.push_str("=\"");
    xml.push_str(&escape_xml(value));
    xml.push('"');
}

/// Whole numbers print without a fractional part.
fn format_num(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

/// Escape an attribute value. Characters XML 1.0 cannot carry at all are
/// dropped.
fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c if is_forbidden_xml_char(c) => {}
            c => out.push(c),
        }
    }
    out
}

fn is_forbidden_xml_char(c: char) -> bool {
    matches!(
        c,
        '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}'
    )
}
