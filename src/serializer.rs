//! Serializer for converting a parsed diagram back to canonical DSL text.

use crate::ast::{Arrow, Column, Diagram, KeyRole, Reference, Table};
use crate::locator::TablePosition;

/// Serialize a Diagram to DSL text.
///
/// Sections are written in a fixed order: metadata, tables, references,
/// positions. Parsing the result gives back an equal Diagram.
pub fn serialize(diagram: &Diagram) -> String {
    let mut output = String::new();

    if let Some(title) = &diagram.title {
        output.push_str(&format!("TITLE {}\n", title));
    }
    if let Some(created_at) = &diagram.created_at {
        output.push_str(&format!("CREATEDAT {}\n", created_at));
    }

    for table in &diagram.tables {
        if !output.is_empty() {
            output.push('\n');
        }
        serialize_table(&mut output, table);
    }

    if !diagram.references.is_empty() {
        output.push('\n');
        for reference in &diagram.references {
            serialize_reference(&mut output, reference);
        }
    }

    if !diagram.positions.is_empty() {
        output.push('\n');
        for p in &diagram.positions {
            serialize_position(&mut output, &p.table, p.x, p.y);
        }
    }

    output
}

/// Render located positions as ARRANGE lines.
pub fn serialize_arrangement(positions: &[TablePosition]) -> String {
    let mut output = String::new();
    for p in positions {
        serialize_position(&mut output, &p.table, p.x, p.y);
    }
    output
}

fn serialize_table(output: &mut String, table: &Table) {
    output.push_str(&format!("TABLE {}\n", table.name));
    for column in &table.columns {
        serialize_column(output, column);
    }
}

fn serialize_column(output: &mut String, column: &Column) {
    output.push_str("  ");
    output.push_str(&column.name);
    match column.key {
        KeyRole::Pk => output.push_str(" *"),
        KeyRole::Fk => output.push_str(" +"),
        KeyRole::None => {}
    }
    output.push('\n');
}

fn serialize_reference(output: &mut String, reference: &Reference) {
    output.push_str(&format!(
        "REFERENCE {} -> {}",
        reference.source, reference.target
    ));

    if reference.start_arrow.is_some() || reference.end_arrow.is_some() {
        // Blank end stays an empty slot
        let slot = |a: Option<Arrow>| a.map(Arrow::token).unwrap_or("");
        output.push_str(&format!(
            " [{}, {}]",
            slot(reference.start_arrow),
            slot(reference.end_arrow)
        ));
    }

    output.push('\n');
}

fn serialize_position(output: &mut String, table: &str, x: i64, y: i64) {
    output.push_str(&format!("ARRANGE {} ({}, {})\n", table, x, y));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ColumnRef, Position};
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_serialize_table() {
        let mut table = Table::new("USERS");
        table.columns = vec![
            Column::new("ID", KeyRole::Pk),
            Column::new("GROUP_ID", KeyRole::Fk),
            Column::new("NAME", KeyRole::None),
        ];
        let diagram = Diagram {
            tables: vec![table],
            ..Default::default()
        };

        assert_eq!(
            serialize(&diagram),
            "TABLE USERS\n  ID *\n  GROUP_ID +\n  NAME\n"
        );
    }

    #[test]
    fn test_serialize_reference_arrows() {
        let diagram = Diagram {
            references: vec![
                Reference {
                    source: ColumnRef::new("A", "ID"),
                    target: ColumnRef::new("B", "A_ID"),
                    start_arrow: Some(Arrow::One),
                    end_arrow: Some(Arrow::ZeroToMany),
                },
                Reference {
                    source: ColumnRef::new("B", "ID"),
                    target: ColumnRef::new("C", "B_ID"),
                    start_arrow: None,
                    end_arrow: Some(Arrow::Many),
                },
                Reference {
                    source: ColumnRef::new("C", "ID"),
                    target: ColumnRef::new("D", "C_ID"),
                    start_arrow: None,
                    end_arrow: None,
                },
            ],
            ..Default::default()
        };

        let result = serialize(&diagram);
        assert!(result.contains("REFERENCE A.ID -> B.A_ID [ERone, ERzeroToMany]\n"));
        assert!(result.contains("REFERENCE B.ID -> C.B_ID [, ERmany]\n"));
        assert!(result.contains("REFERENCE C.ID -> D.C_ID\n"));
    }

    #[test]
    fn test_round_trip() {
        let input = "\
TITLE Sales model
CREATEDAT 2024-01-01
TABLE FACT_SALES {
  * ID
  CUSTOMER_ID FK
  AMOUNT
}
TABLE DIM_CUSTOMER
  ID*
REFERENCE DIM_CUSTOMER.ID -> FACT_SALES.CUSTOMER_ID [ERmandOne, ERzeroToMany]
REFERENCE FACT_SALES.ID -> FACT_SALES.ID [, ERone]
ARRANGE FACT_SALES (-10, 40)
ARRANGE FACT_SALES (200, 300)";

        let diagram = parse(input).unwrap();
        let text = serialize(&diagram);
        assert_eq!(parse(&text).unwrap(), diagram);
        // Canonical output is a fixed point
        assert_eq!(serialize(&parse(&text).unwrap()), text);
    }

    #[test]
    fn test_serialize_arrangement() {
        let positions = vec![
            TablePosition {
                table: "A".into(),
                x: 10,
                y: 20,
            },
            TablePosition {
                table: "B".into(),
                x: -5,
                y: 0,
            },
        ];
        let text = serialize_arrangement(&positions);
        assert_eq!(text, "ARRANGE A (10, 20)\nARRANGE B (-5, 0)\n");
        let parsed = parse(&text).unwrap();
        assert_eq!(
            parsed.positions,
            vec![
                Position {
                    table: "A".into(),
                    x: 10,
                    y: 20
                },
                Position {
                    table: "B".into(),
                    x: -5,
                    y: 0
                },
            ]
        );
    }
}
