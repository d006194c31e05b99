use std::fmt::Display;

const LINE_END: &str = "\r\n";

/// A plain text table framed with `+---+` separators.
///
/// Column widths are the widest cell in each column. The first row is treated as a header and
/// followed by a separator. Rows shorter than the widest row are padded with empty cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextTable {
    title: Option<String>,
    footer: Option<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new() -> Self {
        TextTable::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn set_footer(&mut self, footer: impl Into<String>) {
        self.footer = Some(footer.into());
    }

    pub fn push_row<I>(&mut self, cells: I)
    where
        I: IntoIterator,
        I::Item: Display,
    {
        self.rows
            .push(cells.into_iter().map(|c| c.to_string()).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = Vec::new();

        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let len = cell.chars().count();
                match widths.get_mut(i) {
                    Some(width) => *width = (*width).max(len),
                    None => widths.push(len),
                }
            }
        }

        widths
    }

    pub fn render(&self) -> String {
        let widths = self.column_widths();
        let total = widths.iter().sum::<usize>() + widths.len().saturating_sub(1) * 3 + 4;
        let inner = total.saturating_sub(4);
        let separator = format!("+{}+{}", "-".repeat(total.saturating_sub(2)), LINE_END);

        let mut out = separator.clone();

        if let Some(title) = &self.title {
            out.push_str(&format!("| {:<inner$} |{}", title, LINE_END));
            out.push_str(&separator);
        }

        for (row_num, row) in self.rows.iter().enumerate() {
            let cells: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(i, &width)| {
                    let cell = row.get(i).map(String::as_str).unwrap_or_default();
                    format!("{:<width$}", cell)
                })
                .collect();

            out.push_str(&format!("| {} |{}", cells.join(" | "), LINE_END));

            if row_num == 0 {
                out.push_str(&separator);
            }
        }

        out.push_str(&separator);

        if let Some(footer) = &self.footer {
            out.push_str(&format!("| {:<inner$} |{}", footer, LINE_END));
            out.push_str(&separator);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_with_title_and_footer() {
        let mut table = TextTable::new().title("Block: HDR");
        table.push_row(["ID", "Description"]);
        table.push_row(["A", "First"]);
        table.push_row(["LONGER", "x"]);
        table.set_footer("Total 7");

        assert_eq!(
            table.render().replace("\r\n", "\n"),
            indoc! {"
                +----------------------+
                | Block: HDR           |
                +----------------------+
                | ID     | Description |
                +----------------------+
                | A      | First       |
                | LONGER | x           |
                +----------------------+
                | Total 7              |
                +----------------------+
            "}
        );
    }

    #[test]
    fn test_short_rows_are_padded() {
        let mut table = TextTable::new();
        table.push_row(["a", "b", "c"]);
        table.push_row(["1"]);

        assert_eq!(
            table.render().replace("\r\n", "\n"),
            indoc! {"
                +-----------+
                | a | b | c |
                +-----------+
                | 1 |   |   |
                +-----------+
            "}
        );
    }

    #[test]
    fn test_lines_end_with_crlf() {
        let mut table = TextTable::new();
        table.push_row([1, 22]);

        let rendered = table.render();
        assert!(rendered.ends_with("+\r\n"));
        assert_eq!(rendered.matches("\r\n").count(), 4);
    }
}
