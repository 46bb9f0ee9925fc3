/// A simple text-based table generator for terminal panels
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    col_widths: Vec<usize>,
    right_aligned: Vec<bool>,
}

impl Table {
    /// Create a new table with the given headers
    pub fn new(headers: Vec<&str>) -> Self {
        let col_widths = headers.iter().map(|h| h.len()).collect();
        let right_aligned = vec![false; headers.len()];
        let headers = headers.iter().map(|h| h.to_string()).collect();
        Table {
            headers,
            rows: Vec::new(),
            col_widths,
            right_aligned,
        }
    }

    /// Right-align the given columns; numeric columns read better that way
    pub fn align_right(mut self, columns: &[usize]) -> Self {
        for &col in columns {
            if col < self.right_aligned.len() {
                self.right_aligned[col] = true;
            }
        }
        self
    }

    /// Add a row to the table
    pub fn add_row(&mut self, row: Vec<String>) {
        // Update column widths if needed
        for (i, col) in row.iter().enumerate() {
            if i < self.col_widths.len() {
                self.col_widths[i] = self.col_widths[i].max(col.len());
            }
        }
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render the table as plain text
    pub fn render(&self) -> String {
        let mut output = String::new();

        output.push_str(&self.render_row(&self.headers));
        output.push('\n');
        output.push_str(&self.render_separator());
        output.push('\n');

        for row in &self.rows {
            output.push_str(&self.render_row(row));
            output.push('\n');
        }

        output
    }

    /// Render a single row with proper spacing
    fn render_row(&self, row: &[String]) -> String {
        let mut line = String::new();
        for (i, col) in row.iter().enumerate() {
            if i < self.col_widths.len() {
                let width = self.col_widths[i];
                if self.right_aligned[i] {
                    line.push_str(&format!("{:>width$}", col, width = width));
                } else {
                    line.push_str(&format!("{:<width$}", col, width = width));
                }
                if i < row.len() - 1 {
                    line.push_str(" | ");
                }
            }
        }
        line
    }

    /// Render a separator line
    fn render_separator(&self) -> String {
        let mut line = String::new();
        for (i, &width) in self.col_widths.iter().enumerate() {
            line.push_str(&"-".repeat(width));
            if i < self.col_widths.len() - 1 {
                line.push_str("-+-");
            }
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_table() {
        let mut table = Table::new(vec!["Symbol", "LTP", "Change"]);
        table.add_row(vec!["RELIANCE".to_string(), "2940.10".to_string(), "+1.2%".to_string()]);
        table.add_row(vec!["WIPRO".to_string(), "480.55".to_string(), "-0.4%".to_string()]);

        let rendered = table.render();
        assert!(rendered.contains("Symbol"));
        assert!(rendered.contains("RELIANCE"));
        assert!(rendered.contains("WIPRO"));
        assert!(rendered.contains("-+-"));
    }

    #[test]
    fn right_aligned_columns_pad_on_the_left() {
        let mut table = Table::new(vec!["Symbol", "LTP"]).align_right(&[1]);
        table.add_row(vec!["A".to_string(), "1.0".to_string()]);
        table.add_row(vec!["B".to_string(), "100.0".to_string()]);

        let rendered = table.render();
        assert!(rendered.contains("|   1.0"));
        assert!(rendered.contains("| 100.0"));
    }
}
