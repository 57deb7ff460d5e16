use unicode_width::UnicodeWidthStr;

use crate::ast::Column;

pub struct TableMetrics {
    pub row_height: i64,
    pub base_width: i64,
    /// Leading icon cell holding the PK/FK tag
    pub icon_width: i64,
    pub column_char_width: i64,
    pub title_char_width: i64,
}

impl Default for TableMetrics {
    fn default() -> Self {
        Self {
            row_height: 30,
            base_width: 170,
            icon_width: 30,
            column_char_width: 9,
            title_char_width: 8,
        }
    }
}

impl TableMetrics {
    /// Display width in terminal columns, so wide glyphs count double.
    pub fn chars(&self, text: &str) -> i64 {
        UnicodeWidthStr::width(text) as i64
    }

    pub fn table_width(&self, name: &str, columns: &[Column]) -> i64 {
        let longest_column = columns
            .iter()
            .map(|c| self.chars(&c.name))
            .max()
            .unwrap_or(0);

        let column_width = self.icon_width + longest_column * self.column_char_width;
        let title_width = self.icon_width + self.chars(name) * self.title_char_width;

        self.base_width.max(column_width).max(title_width)
    }

    /// One row per column plus the header row.
    pub fn table_height(&self, column_count: usize) -> i64 {
        self.row_height * (column_count as i64 + 1)
    }

    pub fn table_size(&self, name: &str, columns: &[Column]) -> (i64, i64) {
        (
            self.table_width(name, columns),
            self.table_height(columns.len()),
        )
    }
}
