use std::fmt;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Diagram {
    pub title: Option<String>,
    pub created_at: Option<String>,
    pub tables: Vec<Table>,
    pub references: Vec<Reference>,
    /// Manual positions in the order their ARRANGE lines appeared
    pub positions: Vec<Position>,
}

impl Diagram {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn position(&self, table: &str) -> Option<&Position> {
        // Last ARRANGE for a table wins
        self.positions.iter().rev().find(|p| p.table == table)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub key: KeyRole,
}

impl Column {
    pub fn new(name: impl Into<String>, key: KeyRole) -> Self {
        Self {
            name: name.into(),
            key,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyRole {
    #[default]
    None,
    Pk,
    Fk,
}

impl KeyRole {
    /// Upgrade to FK. A primary key stays a primary key.
    pub fn promote(self) -> Self {
        match self {
            KeyRole::Pk => KeyRole::Pk,
            KeyRole::None | KeyRole::Fk => KeyRole::Fk,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            KeyRole::None => "",
            KeyRole::Pk => "PK",
            KeyRole::Fk => "FK",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub source: ColumnRef,
    pub target: ColumnRef,
    pub start_arrow: Option<Arrow>,
    pub end_arrow: Option<Arrow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// Edge end markers understood by the diagram editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrow {
    MandOne,
    Many,
    One,
    OneToMany,
    ZeroToMany,
    ZeroToOne,
}

impl Arrow {
    pub const ALL: [Arrow; 6] = [
        Arrow::MandOne,
        Arrow::Many,
        Arrow::One,
        Arrow::OneToMany,
        Arrow::ZeroToMany,
        Arrow::ZeroToOne,
    ];

    pub fn from_token(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.token() == s)
    }

    pub fn token(self) -> &'static str {
        match self {
            Arrow::MandOne => "ERmandOne",
            Arrow::Many => "ERmany",
            Arrow::One => "ERone",
            Arrow::OneToMany => "ERoneToMany",
            Arrow::ZeroToMany => "ERzeroToMany",
            Arrow::ZeroToOne => "ERzeroToOne",
        }
    }
}

impl fmt::Display for Arrow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub table: String,
    pub x: i64,
    pub y: i64,
}
