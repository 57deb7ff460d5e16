use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    /// Negative integer; non-negative digit runs lex as `Ident`
    Num(i64),

    LBrace,   // {
    RBrace,   // }
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    Comma,    // ,
    Dot,      // .
    Star,     // *
    Plus,     // +
    Arrow,    // ->

    Eof,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("Unexpected character: {0}")]
    UnexpectedChar(char),
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
}

/// Which grammar a line belongs to, decided by its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Reference,
    Arrange,
    Title,
    CreatedAt,
    Table,
    /// `}` closing a braced table block
    CloseBlock,
    Column,
}

/// Keywords in the order they are tried.
const KEYWORDS: [(&str, LineKind); 5] = [
    ("REFERENCE", LineKind::Reference),
    ("ARRANGE", LineKind::Arrange),
    ("TITLE", LineKind::Title),
    ("CREATEDAT", LineKind::CreatedAt),
    ("TABLE", LineKind::Table),
];

/// A non-blank, non-comment input line with whitespace normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    /// 1-based line number in the input text
    pub number: usize,
    pub text: String,
}

impl SourceLine {
    /// Split off the keyword and return the line kind with the remaining text.
    pub fn classify(&self) -> (LineKind, &str) {
        let (head, rest) = match self.text.split_once(' ') {
            Some((head, rest)) => (head, rest),
            None => (self.text.as_str(), ""),
        };

        for (keyword, kind) in KEYWORDS {
            if head == keyword {
                return (kind, rest);
            }
        }

        if self.text == "}" {
            return (LineKind::CloseBlock, "");
        }

        (LineKind::Column, self.text.as_str())
    }
}

/// Trim every line, collapse whitespace runs to one space, and drop blank
/// and `#` comment lines.
pub fn source_lines(input: &str) -> Vec<SourceLine> {
    input
        .lines()
        .enumerate()
        .filter_map(|(i, raw)| {
            let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() || text.starts_with('#') {
                None
            } else {
                Some(SourceLine { number: i + 1, text })
            }
        })
        .collect()
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    fn read_word(&mut self, first: char) -> String {
        let mut s = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if is_word_char(c) {
                s.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        s
    }

    fn read_negative(&mut self) -> Result<Token, LexError> {
        let mut s = String::from('-');
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                s.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        s.parse()
            .map(Token::Num)
            .map_err(|_| LexError::InvalidNumber(s))
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();

        let c = match self.chars.next() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        let tok = match c {
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ',' => Token::Comma,
            '.' => Token::Dot,
            '*' => Token::Star,
            '+' => Token::Plus,
            '-' => match self.chars.peek().copied() {
                Some('>') => {
                    self.chars.next();
                    Token::Arrow
                }
                Some(d) if d.is_ascii_digit() => return self.read_negative(),
                _ => return Err(LexError::UnexpectedChar(c)),
            },
            // Digit-only words stay words: `2024` is a valid name. The parser
            // reads them as numbers where a coordinate is expected.
            c if is_word_char(c) => Token::Ident(self.read_word(c)),
            _ => return Err(LexError::UnexpectedChar(c)),
        };

        Ok(tok)
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            if tok == Token::Eof {
                tokens.push(tok);
                break;
            }
            tokens.push(tok);
        }
        Ok(tokens)
    }
}

/// Word characters as in a regex `\w`.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
