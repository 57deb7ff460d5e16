use std::collections::HashSet;

use log::{debug, warn};

use crate::ast::{Arrow, Column, ColumnRef, Diagram, Table};
use crate::drawio::RESERVED_IDS;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Table '{table}' named in {directive} doesn't exist")]
    UnknownTable {
        table: String,
        directive: &'static str,
    },
    #[error("Column '{column}' not found in table '{table}'")]
    UnknownColumn { table: String, column: String },
    #[error("Table '{0}' is declared more than once")]
    DuplicateTable(String),
    #[error("Column '{column}' is declared more than once in table '{table}'")]
    DuplicateColumn { table: String, column: String },
    #[error("Table name '{0}' is reserved by the document")]
    ReservedName(String),
}

/// The diagram after reference resolution and cleanup.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaIR {
    pub title: Option<String>,
    pub created_at: Option<String>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// Tables removed because they had no columns
    pub dropped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub columns: Vec<Column>,
    /// Manual position from ARRANGE
    pub pinned: Option<(i64, i64)>,
}

impl Node {
    /// Row identifier of a column: `{table}-{N}`, N counted from 1.
    pub fn row_id(&self, column: &str) -> Option<String> {
        self.columns
            .iter()
            .position(|c| c.name == column)
            .map(|i| format!("{}-{}", self.name, i + 1))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: ColumnRef,
    pub to: ColumnRef,
    pub start_arrow: Option<Arrow>,
    pub end_arrow: Option<Arrow>,
}

impl SchemaIR {
    pub fn resolve(diagram: &Diagram) -> Result<Self, SchemaError> {
        check_unique(&diagram.tables)?;

        let mut tables: Vec<Table> = diagram.tables.clone();

        // References see every table in the file, wherever they are declared
        for reference in &diagram.references {
            promote(&mut tables, &reference.source)?;
            promote(&mut tables, &reference.target)?;
        }

        for position in &diagram.positions {
            if !tables.iter().any(|t| t.name == position.table) {
                return Err(SchemaError::UnknownTable {
                    table: position.table.clone(),
                    directive: "ARRANGE",
                });
            }
        }

        let mut nodes = Vec::new();
        let mut dropped = Vec::new();
        for table in tables {
            if table.columns.is_empty() {
                warn!("Removed table {} because it has no columns", table.name);
                dropped.push(table.name);
                continue;
            }
            let pinned = diagram.position(&table.name).map(|p| (p.x, p.y));
            nodes.push(Node {
                name: table.name,
                columns: table.columns,
                pinned,
            });
        }

        let edges: Vec<Edge> = diagram
            .references
            .iter()
            .map(|r| Edge {
                from: r.source.clone(),
                to: r.target.clone(),
                start_arrow: r.start_arrow,
                end_arrow: r.end_arrow,
            })
            .collect();

        debug!(
            "resolved {} tables and {} edges ({} dropped)",
            nodes.len(),
            edges.len(),
            dropped.len()
        );

        Ok(SchemaIR {
            title: diagram.title.clone(),
            created_at: diagram.created_at.clone(),
            nodes,
            edges,
            dropped,
        })
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

fn check_unique(tables: &[Table]) -> Result<(), SchemaError> {
    let mut names = HashSet::new();
    for table in tables {
        if RESERVED_IDS.contains(&table.name.as_str()) {
            return Err(SchemaError::ReservedName(table.name.clone()));
        }
        if !names.insert(table.name.as_str()) {
            return Err(SchemaError::DuplicateTable(table.name.clone()));
        }
        let mut columns = HashSet::new();
        for column in &table.columns {
            if !columns.insert(column.name.as_str()) {
                return Err(SchemaError::DuplicateColumn {
                    table: table.name.clone(),
                    column: column.name.clone(),
                });
            }
        }
    }
    Ok(())
}

fn promote(tables: &mut [Table], target: &ColumnRef) -> Result<(), SchemaError> {
    let table = tables
        .iter_mut()
        .find(|t| t.name == target.table)
        .ok_or_else(|| SchemaError::UnknownTable {
            table: target.table.clone(),
            directive: "REFERENCE",
        })?;

    let column = table
        .columns
        .iter_mut()
        .find(|c| c.name == target.column)
        .ok_or_else(|| SchemaError::UnknownColumn {
            table: target.table.clone(),
            column: target.column.clone(),
        })?;

    column.key = column.key.promote();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::KeyRole;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn resolve(input: &str) -> Result<SchemaIR, SchemaError> {
        SchemaIR::resolve(&parse(input).unwrap())
    }

    /// Process-wide logger that keeps records per thread, so parallel tests
    /// only see their own output.
    mod log_sink {
        use std::sync::{Mutex, Once};
        use std::thread::{self, ThreadId};

        use log::{Level, LevelFilter, Log, Metadata, Record};

        static RECORDS: Mutex<Vec<(ThreadId, Level, String)>> = Mutex::new(Vec::new());
        static INIT: Once = Once::new();
        static SINK: Sink = Sink;

        struct Sink;

        impl Log for Sink {
            fn enabled(&self, _: &Metadata) -> bool {
                true
            }

            fn log(&self, record: &Record) {
                if let Ok(mut records) = RECORDS.lock() {
                    records.push((
                        thread::current().id(),
                        record.level(),
                        record.args().to_string(),
                    ));
                }
            }

            fn flush(&self) {}
        }

        pub fn install() {
            INIT.call_once(|| {
                log::set_logger(&SINK).unwrap();
                log::set_max_level(LevelFilter::Trace);
            });
        }

        /// Drain this thread's records at `level`.
        pub fn take(level: Level) -> Vec<String> {
            let me = thread::current().id();
            let mut records = RECORDS.lock().unwrap();
            let (mine, rest): (Vec<_>, Vec<_>) =
                records.drain(..).partition(|(id, _, _)| *id == me);
            *records = rest;
            mine.into_iter()
                .filter(|(_, l, _)| *l == level)
                .map(|(_, _, msg)| msg)
                .collect()
        }
    }

    fn keys(node: &Node) -> Vec<(&str, KeyRole)> {
        node.columns
            .iter()
            .map(|c| (c.name.as_str(), c.key))
            .collect()
    }

    #[test]
    fn test_reference_promotes_to_fk() {
        let ir = resolve("TABLE A\n ID *\nTABLE B\n A_ID\nREFERENCE A.ID -> B.A_ID").unwrap();
        assert_eq!(keys(&ir.nodes[0]), vec![("ID", KeyRole::Pk)]);
        assert_eq!(keys(&ir.nodes[1]), vec![("A_ID", KeyRole::Fk)]);
        assert_eq!(ir.edges.len(), 1);
    }

    #[test]
    fn test_reference_before_tables() {
        let ir = resolve("REFERENCE A.X -> B.Y\nTABLE A\n X\nTABLE B\n Y").unwrap();
        assert_eq!(ir.nodes[0].columns[0].key, KeyRole::Fk);
        assert_eq!(ir.nodes[1].columns[0].key, KeyRole::Fk);
    }

    #[test]
    fn test_roles_never_downgrade() {
        let input = r#"
            TABLE TEST_TABLE
                COLUMN1 *
                COLUMN2 +
            TABLE TEST_TABLE2
                COLUMN4 *
                COLUMN5
            TABLE TEST_TABLE3
                COLUMN6 *
                COLUMN7
            REFERENCE TEST_TABLE.COLUMN1 -> TEST_TABLE2.COLUMN5 [ERmany, ERone]
            REFERENCE TEST_TABLE.COLUMN2 -> TEST_TABLE3.COLUMN6 [ERmany, ERone]
            REFERENCE TEST_TABLE3.COLUMN6 -> TEST_TABLE.COLUMN2
        "#;
        let ir = resolve(input).unwrap();
        assert_eq!(
            keys(&ir.nodes[0]),
            vec![("COLUMN1", KeyRole::Pk), ("COLUMN2", KeyRole::Fk)]
        );
        assert_eq!(
            keys(&ir.nodes[1]),
            vec![("COLUMN4", KeyRole::Pk), ("COLUMN5", KeyRole::Fk)]
        );
        assert_eq!(
            keys(&ir.nodes[2]),
            vec![("COLUMN6", KeyRole::Pk), ("COLUMN7", KeyRole::None)]
        );
    }

    #[test]
    fn test_missing_column() {
        let err = resolve("TABLE A\n ID *\nTABLE B\n X\nREFERENCE A.ID -> B.MISSING").unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownColumn {
                table: "B".into(),
                column: "MISSING".into()
            }
        );
        let msg = err.to_string();
        assert!(msg.contains("MISSING") && msg.contains("'B'"), "got: {msg}");
    }

    #[test]
    fn test_missing_table() {
        let err = resolve("TABLE A\n ID *\nREFERENCE A.ID -> NOPE.ID").unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownTable {
                table: "NOPE".into(),
                directive: "REFERENCE"
            }
        );
    }

    #[test]
    fn test_reserved_table_names() {
        for name in ["0", "1", "title"] {
            let err = resolve(&format!("TABLE {name}\n ID *")).unwrap_err();
            assert_eq!(err, SchemaError::ReservedName(name.into()));
        }
        // Keywords are case-sensitive, so the upper-case spelling is an ordinary table
        assert!(resolve("TABLE Title\n ID").is_ok());
    }

    #[test]
    fn test_arrange_unknown_table() {
        let err = resolve("TABLE A\n ID\nARRANGE GHOST (1, 2)").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownTable { directive: "ARRANGE", .. }));
    }

    #[test]
    fn test_empty_table_dropped() {
        let ir = resolve("TABLE EMPTY\nTABLE A\n ID *\nARRANGE EMPTY (5, 5)").unwrap();
        assert_eq!(ir.dropped, vec!["EMPTY".to_string()]);
        assert_eq!(ir.nodes.len(), 1);
        assert!(ir.node("EMPTY").is_none());
    }

    #[test]
    fn test_empty_table_warns_once() {
        log_sink::install();
        log_sink::take(log::Level::Warn);

        let ir = resolve("TABLE EMPTY\nTABLE A\n ID").unwrap();
        assert_eq!(ir.dropped, vec!["EMPTY".to_string()]);
        assert_eq!(
            log_sink::take(log::Level::Warn),
            vec!["Removed table EMPTY because it has no columns".to_string()]
        );
    }

    #[test]
    fn test_no_warning_without_empty_tables() {
        log_sink::install();
        log_sink::take(log::Level::Warn);

        resolve("TABLE A\n ID").unwrap();
        assert!(log_sink::take(log::Level::Warn).is_empty());
    }

    #[test]
    fn test_duplicates_rejected() {
        assert_eq!(
            resolve("TABLE A\n ID\nTABLE A\n X").unwrap_err(),
            SchemaError::DuplicateTable("A".into())
        );
        assert!(matches!(
            resolve("TABLE A\n ID\n ID *").unwrap_err(),
            SchemaError::DuplicateColumn { .. }
        ));
    }

    #[test]
    fn test_last_arrange_wins() {
        let ir = resolve("TABLE A\n ID\nARRANGE A (1, 2)\nARRANGE A (3, 4)").unwrap();
        assert_eq!(ir.nodes[0].pinned, Some((3, 4)));
    }

    #[test]
    fn test_row_id() {
        let ir = resolve("TABLE FACT_SALES\n id\n amount").unwrap();
        assert_eq!(ir.nodes[0].row_id("amount").as_deref(), Some("FACT_SALES-2"));
        assert_eq!(ir.nodes[0].row_id("price"), None);
    }
}
