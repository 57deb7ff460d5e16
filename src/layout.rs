//! Table placement and sizing.
//!
//! Pinned tables keep their ARRANGE coordinate. All others flow left to right
//! on a single row in declaration order.

use log::debug;

use crate::ir::SchemaIR;
use crate::measure::TableMetrics;

/// A positioned table in the layout.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub id: String,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    pub pinned: bool,
}

/// The complete layout result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layout {
    pub nodes: Vec<LayoutNode>,
}

impl Layout {
    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

pub struct LayoutEngine {
    pub(crate) metrics: TableMetrics,
    /// x of the first slot in the flow
    pub(crate) origin_x: i64,
    /// y shared by every auto-placed table
    pub(crate) flow_y: i64,
    pub(crate) gutter: i64,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self {
            metrics: TableMetrics::default(),
            origin_x: 0,
            flow_y: 100,
            gutter: 10,
        }
    }
}

impl LayoutEngine {
    pub fn metrics(&self) -> &TableMetrics {
        &self.metrics
    }

    pub fn gutter(&self) -> i64 {
        self.gutter
    }

    pub fn layout(&self, ir: &SchemaIR) -> Layout {
        let mut nodes = Vec::with_capacity(ir.nodes.len());
        let mut cursor = self.origin_x;

        for node in &ir.nodes {
            let (width, height) = self.metrics.table_size(&node.name, &node.columns);

            // Every table takes a slot in the flow. A pinned table is drawn at
            // its pin, never at the cursor, and the cursor never jumps to a pin.
            let (x, y) = match node.pinned {
                Some(pin) => pin,
                None => (cursor, self.flow_y),
            };
            cursor += width + self.gutter;

            nodes.push(LayoutNode {
                id: node.name.clone(),
                x,
                y,
                width,
                height,
                pinned: node.pinned.is_some(),
            });
        }

        debug!("laid out {} tables", nodes.len());
        Layout { nodes }
    }
}
