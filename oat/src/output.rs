//! Plain-text tables for reports

use unicode_width::UnicodeWidthStr;

/// Column-aligned table with a header row and a dashed rule under it
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.width()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.width());
                }
            }
        }

        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();

        let mut out = String::new();
        out.push_str(&render_row(&self.headers, &widths));
        out.push_str(&render_row(&rule, &widths));
        for row in &self.rows {
            out.push_str(&render_row(row, &widths));
        }
        out
    }
}

fn render_row(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::new();
    for (i, width) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        if i > 0 {
            line.push_str("  ");
        }
        line.push_str(cell);
        line.push_str(&" ".repeat(width.saturating_sub(cell.width())));
    }
    let mut line = line.trim_end().to_string();
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_aligns_columns() {
        let mut table = Table::new(&["File", "Word Count"]);
        table.push(vec!["a.md".to_string(), "12".to_string()]);
        table.push(vec!["viikko.md".to_string(), "3".to_string()]);

        assert_eq!(
            table.render(),
            "File       Word Count\n\
             ---------  ----------\n\
             a.md       12\n\
             viikko.md  3\n"
        );
    }

    #[test]
    fn test_render_uses_display_width() {
        let mut table = Table::new(&["id", "x"]);
        table.push(vec!["ää".to_string(), "1".to_string()]);
        assert_eq!(table.render(), "id  x\n--  -\nää  1\n");
    }

    #[test]
    fn test_empty_table() {
        let table = Table::new(&["a"]);
        assert!(table.is_empty());
    }
}
