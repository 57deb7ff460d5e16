//! Cell styles for the draw.io document.
//!
//! Every node kind has its own style record. [`Style::render`] turns a record
//! into the editor's `key=value;` style string.

use crate::ast::{Arrow, KeyRole};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StyleError {
    #[error(
        "Invalid arrow '{0}'. Allowed: ERmandOne, ERmany, ERone, ERoneToMany, ERzeroToMany, ERzeroToOne or blank"
    )]
    UnknownArrow(String),
}

/// Parse an edge end marker token.
pub fn parse_arrow(token: &str) -> Result<Arrow, StyleError> {
    Arrow::from_token(token).ok_or_else(|| StyleError::UnknownArrow(token.to_string()))
}

pub const FACT_FILL: &str = "#F4AC9F";
pub const DIMENSION_FILL: &str = "#9CD6EF";
pub const EVEN_ROW_FILL: &str = "#DADADA";
pub const ODD_ROW_FILL: &str = "#ffffff";

/// Fill color for a table header, chosen by its naming convention.
pub fn table_fill(table_name: &str) -> &'static str {
    let is_fact = table_name
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("fact"));
    if is_fact { FACT_FILL } else { DIMENSION_FILL }
}

/// Alternating row fill by 1-based row index.
pub fn row_fill(index: usize) -> &'static str {
    if index % 2 == 0 {
        EVEN_ROW_FILL
    } else {
        ODD_ROW_FILL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

impl Align {
    fn as_str(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Right => "right",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Style {
    Table {
        fill_color: &'static str,
    },
    Row {
        fill_color: &'static str,
        key: KeyRole,
    },
    IconCell {
        key: KeyRole,
    },
    LabelCell {
        key: KeyRole,
    },
    Edge {
        start_arrow: Option<Arrow>,
        end_arrow: Option<Arrow>,
    },
    Title,
    DateGrid,
    DateRow,
    DateCell {
        align: Align,
    },
}

impl Style {
    pub fn render(&self) -> String {
        let pairs: Vec<(&str, &str)> = match self {
            Style::Table { fill_color } => vec![
                ("shape", "table"),
                ("startSize", "30"),
                ("container", "1"),
                ("collapsible", "1"),
                ("childLayout", "tableLayout"),
                ("rounded", "1"),
                ("arcSize", "6"),
                ("fixedRows", "1"),
                ("rowLines", "0"),
                ("fontStyle", "0"),
                ("align", "center"),
                ("resizeLast", "1"),
                ("resizeParent", "1"),
                ("fillColor", *fill_color),
                ("strokeColor", "default"),
            ],
            Style::Row { fill_color, key } => vec![
                ("shape", "tableRow"),
                ("horizontal", "0"),
                ("startSize", "0"),
                ("swimlaneHead", "0"),
                ("swimlaneBody", "0"),
                ("collapsible", "0"),
                ("dropTarget", "0"),
                ("portConstraint", "eastwest"),
                ("strokeColor", "inherit"),
                ("top", "0"),
                ("left", "0"),
                ("right", "0"),
                ("fillColor", *fill_color),
                ("bottom", if *key == KeyRole::Pk { "1" } else { "0" }),
            ],
            Style::IconCell { key } => vec![
                ("shape", "partialRectangle"),
                ("overflow", "hidden"),
                ("connectable", "0"),
                ("fillColor", "none"),
                ("strokeColor", "inherit"),
                ("top", "0"),
                ("left", "0"),
                ("bottom", "0"),
                ("right", "0"),
                ("fontStyle", icon_font_style(*key)),
            ],
            Style::LabelCell { key } => vec![
                ("shape", "partialRectangle"),
                ("overflow", "hidden"),
                ("connectable", "0"),
                ("fillColor", "none"),
                ("align", "left"),
                ("strokeColor", "inherit"),
                ("top", "0"),
                ("left", "0"),
                ("bottom", "0"),
                ("right", "0"),
                ("spacingLeft", "6"),
                ("fontStyle", label_font_style(*key)),
            ],
            Style::Edge {
                start_arrow,
                end_arrow,
            } => vec![
                ("edgeStyle", "entityRelationEdgeStyle"),
                ("fontSize", "12"),
                ("html", "1"),
                ("endArrow", end_arrow.map_or("", Arrow::token)),
                ("startArrow", start_arrow.map_or("", Arrow::token)),
            ],
            Style::Title => vec![
                ("shape", "text"),
                ("strokeColor", "none"),
                ("fillColor", "none"),
                ("html", "1"),
                ("fontSize", "24"),
                ("fontStyle", "1"),
                ("verticalAlign", "middle"),
                ("align", "left"),
                ("flipH", "1"),
                ("flipV", "1"),
            ],
            Style::DateGrid => vec![
                ("childLayout", "tableLayout"),
                ("recursiveResize", "0"),
                ("shadow", "0"),
                ("fillColor", "none"),
                ("strokeColor", "none"),
            ],
            Style::DateRow => vec![
                ("shape", "tableRow"),
                ("horizontal", "0"),
                ("startSize", "0"),
                ("swimlaneHead", "0"),
                ("swimlaneBody", "0"),
                ("top", "0"),
                ("left", "0"),
                ("bottom", "0"),
                ("right", "0"),
                ("dropTarget", "0"),
                ("collapsible", "0"),
                ("recursiveResize", "0"),
                ("expand", "0"),
                ("fontStyle", "0"),
                ("fillColor", "none"),
            ],
            Style::DateCell { align } => vec![
                ("connectable", "0"),
                ("recursiveResize", "0"),
                ("strokeColor", "none"),
                ("fillColor", "none"),
                ("whiteSpace", "wrap"),
                ("html", "1"),
                ("spacingLeft", "2"),
                ("spacingRight", "2"),
                ("align", align.as_str()),
            ],
        };

        let mut out = String::new();
        for (key, value) in pairs {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push(';');
        }
        out
    }
}

// fontStyle is a bit mask: 1 bold, 4 underline
fn icon_font_style(key: KeyRole) -> &'static str {
    match key {
        KeyRole::Pk | KeyRole::Fk => "1",
        KeyRole::None => "",
    }
}

fn label_font_style(key: KeyRole) -> &'static str {
    match key {
        KeyRole::Pk => "5",
        KeyRole::Fk => "1",
        KeyRole::None => "",
    }
}
