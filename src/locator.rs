//! Reads table positions back out of a draw.io document.

use log::debug;

use crate::drawio::{DATE_GRID_ID, TITLE_ID};

const EXCLUDED_IDS: [&str; 2] = [TITLE_ID, DATE_GRID_ID];

#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    #[error("Invalid document: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("Cell '{cell}' has non-integer {axis} coordinate '{value}'")]
    BadCoordinate {
        cell: String,
        axis: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePosition {
    pub table: String,
    pub x: i64,
    pub y: i64,
}

/// Collect `(value, x, y)` for every labelled cell with an absolute geometry.
///
/// A label seen twice keeps its first slot and takes the later coordinates.
pub fn locate(xml: &str) -> Result<Vec<TablePosition>, LocateError> {
    let doc = roxmltree::Document::parse(xml)?;
    let mut positions: Vec<TablePosition> = Vec::new();

    for cell in doc.descendants().filter(|n| n.has_tag_name("mxCell")) {
        let value = cell.attribute("value").unwrap_or("");
        let id = cell.attribute("id").unwrap_or("");
        if value.is_empty() || EXCLUDED_IDS.contains(&id) {
            continue;
        }

        let Some(geometry) = cell.children().find(|c| c.has_tag_name("mxGeometry")) else {
            continue;
        };
        let (Some(x), Some(y)) = (geometry.attribute("x"), geometry.attribute("y")) else {
            continue;
        };

        let x = coordinate(id, "x", x)?;
        let y = coordinate(id, "y", y)?;

        match positions.iter_mut().find(|p| p.table == value) {
            Some(existing) => {
                existing.x = x;
                existing.y = y;
            }
            None => positions.push(TablePosition {
                table: value.to_string(),
                x,
                y,
            }),
        }
    }

    debug!("located {} tables", positions.len());
    Ok(positions)
}

fn coordinate(cell: &str, axis: &'static str, raw: &str) -> Result<i64, LocateError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| LocateError::BadCoordinate {
            cell: cell.to_string(),
            axis,
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::drawio::DrawioRenderer;
    use crate::ir::SchemaIR;
    use crate::layout::LayoutEngine;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;
    use time::{Date, Month};

    fn render(input: &str) -> String {
        let ir = SchemaIR::resolve(&parse(input).unwrap()).unwrap();
        let layout = LayoutEngine::default().layout(&ir);
        let clock = FixedClock(Date::from_calendar_date(2025, Month::January, 2).unwrap());
        DrawioRenderer::with_clock(clock).render(&ir, &layout).unwrap()
    }

    fn pos(table: &str, x: i64, y: i64) -> TablePosition {
        TablePosition {
            table: table.into(),
            x,
            y,
        }
    }

    #[test]
    fn test_round_trip_arrange() {
        let xml = render(
            "TITLE Shop\nCREATEDAT 2024-05-01\n\
             TABLE A\n ID *\n NAME\nTABLE B\n ID *\n A_ID\n\
             REFERENCE A.ID -> B.A_ID [ERone, ERmany]\n\
             ARRANGE A (10, 20)\nARRANGE B (-300, 450)",
        );
        assert_eq!(locate(&xml).unwrap(), vec![pos("A", 10, 20), pos("B", -300, 450)]);
    }

    #[test]
    fn test_auto_placed_tables_are_located() {
        let xml = render("TABLE A\n ID\nTABLE B\n ID");
        assert_eq!(locate(&xml).unwrap(), vec![pos("A", 0, 100), pos("B", 180, 100)]);
    }

    #[test]
    fn test_reserved_ids_excluded() {
        let xml = r#"<mxGraphModel><root>
            <mxCell id="title" value="Shop"><mxGeometry x="186" y="10" as="geometry"/></mxCell>
            <mxCell id="table-date" value="x"><mxGeometry x="1" y="6" as="geometry"/></mxCell>
            <mxCell id="T" value="T"><mxGeometry x="5" y="6" as="geometry"/></mxCell>
        </root></mxGraphModel>"#;
        assert_eq!(locate(xml).unwrap(), vec![pos("T", 5, 6)]);
    }

    #[test]
    fn test_cells_without_both_coordinates_skipped() {
        let xml = r#"<mxGraphModel><root>
            <mxCell id="T-col-1" value="ID"><mxGeometry x="30" width="140" as="geometry"/></mxCell>
            <mxCell id="T-1" value=""><mxGeometry x="0" y="30" as="geometry"/></mxCell>
            <mxCell id="U" value="U"/>
        </root></mxGraphModel>"#;
        assert!(locate(xml).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_label_keeps_first_slot() {
        let xml = r#"<mxGraphModel><root>
            <mxCell id="A" value="A"><mxGeometry x="1" y="1" as="geometry"/></mxCell>
            <mxCell id="B" value="B"><mxGeometry x="2" y="2" as="geometry"/></mxCell>
            <mxCell id="A2" value="A"><mxGeometry x="3" y="3" as="geometry"/></mxCell>
        </root></mxGraphModel>"#;
        assert_eq!(locate(xml).unwrap(), vec![pos("A", 3, 3), pos("B", 2, 2)]);
    }

    #[test]
    fn test_fractional_coordinate_rejected() {
        let xml = r#"<mxGraphModel><root>
            <mxCell id="A" value="A"><mxGeometry x="1.5" y="1" as="geometry"/></mxCell>
        </root></mxGraphModel>"#;
        assert!(matches!(
            locate(xml),
            Err(LocateError::BadCoordinate { axis: "x", .. })
        ));
    }

    #[test]
    fn test_malformed_xml() {
        assert!(matches!(locate("<mxGraphModel>"), Err(LocateError::Xml(_))));
    }
}
