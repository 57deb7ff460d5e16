use log::{debug, warn};

use crate::ast::*;
use crate::lexer::{LexError, Lexer, LineKind, SourceLine, Token, source_lines};
use crate::style::{StyleError, parse_arrow};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: {source}")]
    Lex {
        line: usize,
        #[source]
        source: LexError,
    },
    #[error("line {line}: unexpected {found}, expected {expected} in `{text}`")]
    Unexpected {
        line: usize,
        text: String,
        found: String,
        expected: &'static str,
    },
    #[error("line {line}: column `{text}` is not inside a TABLE")]
    NoOpenTable { line: usize, text: String },
    #[error("line {line}: {keyword} may only appear once")]
    Duplicate { line: usize, keyword: &'static str },
    #[error("line {line}: {source}")]
    Style {
        line: usize,
        #[source]
        source: StyleError,
    },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::Lex { line, .. }
            | ParseError::Unexpected { line, .. }
            | ParseError::NoOpenTable { line, .. }
            | ParseError::Duplicate { line, .. }
            | ParseError::Style { line, .. } => *line,
        }
    }

    /// Grammar errors may be skipped in lenient mode. Style errors never are.
    pub fn is_grammar(&self) -> bool {
        !matches!(self, ParseError::Style { .. })
    }
}

/// How unparseable lines are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Fail on the first line that matches no grammar.
    #[default]
    Strict,
    /// Log a warning and skip the line.
    Lenient,
}

pub struct Parser {
    lines: Vec<SourceLine>,
    mode: ParseMode,
}

/// Mutable state threaded through the line handlers.
#[derive(Debug, Default)]
struct ParseContext {
    diagram: Diagram,
    /// Index of the table column lines are appended to
    open_table: Option<usize>,
}

impl ParseContext {
    fn finish(self) -> Diagram {
        self.diagram
    }
}

impl Parser {
    pub fn new(input: &str) -> Self {
        Self {
            lines: source_lines(input),
            mode: ParseMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ParseMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn parse(&self) -> Result<Diagram, ParseError> {
        let mut ctx = ParseContext::default();

        for line in &self.lines {
            match parse_line(&mut ctx, line) {
                Ok(()) => {}
                Err(err) if self.mode == ParseMode::Lenient && err.is_grammar() => {
                    warn!("skipping line {}: {}", line.number, err);
                }
                Err(err) => return Err(err),
            }
        }

        let diagram = ctx.finish();
        debug!(
            "parsed {} tables, {} references, {} positions",
            diagram.tables.len(),
            diagram.references.len(),
            diagram.positions.len()
        );
        Ok(diagram)
    }
}

/// Parse DSL source in strict mode.
pub fn parse(input: &str) -> Result<Diagram, ParseError> {
    Parser::new(input).parse()
}

fn parse_line(ctx: &mut ParseContext, line: &SourceLine) -> Result<(), ParseError> {
    let (kind, rest) = line.classify();
    // Any directive ends the current table's column list
    if !matches!(kind, LineKind::Column | LineKind::CloseBlock) {
        ctx.open_table = None;
    }
    match kind {
        LineKind::Reference => {
            let reference = TokenCursor::new(line, rest)?.parse_reference()?;
            ctx.diagram.references.push(reference);
        }
        LineKind::Arrange => {
            let position = TokenCursor::new(line, rest)?.parse_position()?;
            ctx.diagram.positions.push(position);
        }
        LineKind::Title => {
            let title = free_text(line, rest, "title text")?;
            if ctx.diagram.title.is_some() {
                return Err(ParseError::Duplicate {
                    line: line.number,
                    keyword: "TITLE",
                });
            }
            ctx.diagram.title = Some(title);
        }
        LineKind::CreatedAt => {
            let created_at = free_text(line, rest, "creation label")?;
            if ctx.diagram.created_at.is_some() {
                return Err(ParseError::Duplicate {
                    line: line.number,
                    keyword: "CREATEDAT",
                });
            }
            ctx.diagram.created_at = Some(created_at);
        }
        LineKind::Table => {
            let name = TokenCursor::new(line, rest)?.parse_table_header()?;
            ctx.diagram.tables.push(Table::new(name));
            ctx.open_table = Some(ctx.diagram.tables.len() - 1);
        }
        LineKind::CloseBlock => {
            if ctx.open_table.take().is_none() {
                return Err(ParseError::Unexpected {
                    line: line.number,
                    text: line.text.clone(),
                    found: "`}`".into(),
                    expected: "an open TABLE block",
                });
            }
        }
        LineKind::Column => {
            let Some(index) = ctx.open_table else {
                return Err(ParseError::NoOpenTable {
                    line: line.number,
                    text: line.text.clone(),
                });
            };
            let column = TokenCursor::new(line, rest)?.parse_column()?;
            ctx.diagram.tables[index].columns.push(column);
        }
    }
    Ok(())
}

fn free_text(line: &SourceLine, rest: &str, expected: &'static str) -> Result<String, ParseError> {
    let text = rest.trim();
    if text.is_empty() {
        return Err(ParseError::Unexpected {
            line: line.number,
            text: line.text.clone(),
            found: "end of line".into(),
            expected,
        });
    }
    Ok(text.to_string())
}

static EOF: Token = Token::Eof;

/// Token stream of one line.
struct TokenCursor<'a> {
    line: &'a SourceLine,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> TokenCursor<'a> {
    fn new(line: &'a SourceLine, rest: &str) -> Result<Self, ParseError> {
        let tokens = Lexer::new(rest).tokenize().map_err(|source| ParseError::Lex {
            line: line.number,
            source,
        })?;
        Ok(Self {
            line,
            tokens,
            pos: 0,
        })
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&EOF)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        self.pos += 1;
        tok
    }

    fn unexpected(&self, tok: &Token, expected: &'static str) -> ParseError {
        ParseError::Unexpected {
            line: self.line.number,
            text: self.line.text.clone(),
            found: describe(tok),
            expected,
        }
    }

    fn expect_ident(&mut self, expected: &'static str) -> Result<String, ParseError> {
        match self.advance() {
            Token::Ident(s) => Ok(s),
            tok => Err(self.unexpected(&tok, expected)),
        }
    }

    fn expect_num(&mut self, expected: &'static str) -> Result<i64, ParseError> {
        match self.advance() {
            Token::Num(n) => Ok(n),
            Token::Ident(word) if word.chars().all(|c| c.is_ascii_digit()) => {
                word.parse().map_err(|_| ParseError::Lex {
                    line: self.line.number,
                    source: LexError::InvalidNumber(word),
                })
            }
            tok => Err(self.unexpected(&tok, expected)),
        }
    }

    fn expect(&mut self, expected: Token, what: &'static str) -> Result<(), ParseError> {
        let tok = self.advance();
        if tok == expected {
            Ok(())
        } else {
            Err(self.unexpected(&tok, what))
        }
    }

    fn expect_end(&mut self) -> Result<(), ParseError> {
        self.expect(Token::Eof, "end of line")
    }

    fn style_error(&self, source: StyleError) -> ParseError {
        ParseError::Style {
            line: self.line.number,
            source,
        }
    }

    /// `<name> [{]`
    fn parse_table_header(mut self) -> Result<String, ParseError> {
        let name = self.expect_ident("table name")?;
        if *self.peek() == Token::LBrace {
            self.advance();
        }
        self.expect_end()?;
        Ok(name)
    }

    /// `<name>`, `<name> *|PK|+|FK`, or `*|+ <name>`
    fn parse_column(mut self) -> Result<Column, ParseError> {
        let leading = match self.peek() {
            Token::Star => Some(KeyRole::Pk),
            Token::Plus => Some(KeyRole::Fk),
            _ => None,
        };
        if leading.is_some() {
            self.advance();
        }

        let name = self.expect_ident("column name")?;

        let trailing = match self.peek() {
            Token::Star => Some(KeyRole::Pk),
            Token::Plus => Some(KeyRole::Fk),
            Token::Ident(s) if s == "PK" => Some(KeyRole::Pk),
            Token::Ident(s) if s == "FK" => Some(KeyRole::Fk),
            _ => None,
        };
        if leading.is_none() && trailing.is_some() {
            self.advance();
        }
        let key = leading.or(trailing).unwrap_or_default();

        self.expect_end()?;
        Ok(Column::new(name, key))
    }

    fn parse_column_ref(&mut self) -> Result<ColumnRef, ParseError> {
        let table = self.expect_ident("table name")?;
        self.expect(Token::Dot, "`.`")?;
        let column = self.expect_ident("column name")?;
        Ok(ColumnRef { table, column })
    }

    /// `<t>.<c> -> <t>.<c> [<start>, <end>]`
    fn parse_reference(mut self) -> Result<Reference, ParseError> {
        let source = self.parse_column_ref()?;
        self.expect(Token::Arrow, "`->`")?;
        let target = self.parse_column_ref()?;

        let mut start_arrow = None;
        let mut end_arrow = None;
        if *self.peek() == Token::LBracket {
            self.advance();
            start_arrow = self.parse_arrow_slot()?;
            self.expect(Token::Comma, "`,` between arrows")?;
            end_arrow = self.parse_arrow_slot()?;
            self.expect(Token::RBracket, "`]`")?;
        }
        self.expect_end()?;

        Ok(Reference {
            source,
            target,
            start_arrow,
            end_arrow,
        })
    }

    /// An arrow token, or nothing for a blank end.
    fn parse_arrow_slot(&mut self) -> Result<Option<Arrow>, ParseError> {
        match self.peek().clone() {
            Token::Ident(token) => {
                self.advance();
                parse_arrow(&token)
                    .map(Some)
                    .map_err(|e| self.style_error(e))
            }
            Token::Comma | Token::RBracket => Ok(None),
            tok => Err(self.unexpected(&tok, "arrow name")),
        }
    }

    /// `<table> (<x>, <y>)`
    fn parse_position(mut self) -> Result<Position, ParseError> {
        let table = self.expect_ident("table name")?;
        self.expect(Token::LParen, "`(`")?;
        let x = self.expect_num("x coordinate")?;
        self.expect(Token::Comma, "`,`")?;
        let y = self.expect_num("y coordinate")?;
        self.expect(Token::RParen, "`)`")?;
        self.expect_end()?;
        Ok(Position { table, x, y })
    }
}

fn describe(tok: &Token) -> String {
    match tok {
        Token::Ident(s) => format!("`{}`", s),
        Token::Num(n) => format!("`{}`", n),
        Token::LBrace => "`{`".into(),
        Token::RBrace => "`}`".into(),
        Token::LParen => "`(`".into(),
        Token::RParen => "`)`".into(),
        Token::LBracket => "`[`".into(),
        Token::RBracket => "`]`".into(),
        Token::Comma => "`,`".into(),
        Token::Dot => "`.`".into(),
        Token::Star => "`*`".into(),
        Token::Plus => "`+`".into(),
        Token::Arrow => "`->`".into(),
        Token::Eof => "end of line".into(),
    }
}
