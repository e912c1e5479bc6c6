//! Fixed-width, right-justified text table.
//!
//! Widths depend on every row, so the whole table is collected before the
//! first line is written.

use std::io::{self, Write};

/// Rows of string cells plus the widest cell seen per column.
/// The first row is the header; the last column is never padded.
#[derive(Debug, Default, Clone)]
pub struct JustifiedTable {
    rows: Vec<Vec<String>>,
    widths: Vec<usize>,
}

impl JustifiedTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        if self.widths.len() < row.len() {
            self.widths.resize(row.len(), 0);
        }
        for (width, cell) in self.widths.iter_mut().zip(&row) {
            *width = (*width).max(cell.chars().count());
        }
        self.rows.push(row);
    }

    /// Number of data rows (header excluded).
    pub fn data_rows(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    fn write_row<W: Write + ?Sized>(&self, out: &mut W, row: &[String]) -> io::Result<()> {
        let mut line = String::new();
        if let Some((last, head)) = row.split_last() {
            for (cell, width) in head.iter().zip(&self.widths) {
                line.push_str(&format!("{:>width$} ", cell, width = *width));
            }
            line.push_str(last);
        }
        line.push('\n');
        out.write_all(line.as_bytes())
    }

    /// Writes the header and every data row. With `header_every = Some(n)`,
    /// a blank line and the header are repeated after every `n` data rows
    /// when more rows follow.
    pub fn write_to<W: Write + ?Sized>(
        &self,
        out: &mut W,
        header_every: Option<usize>,
    ) -> io::Result<()> {
        let Some((header, data)) = self.rows.split_first() else {
            return Ok(());
        };

        self.write_row(out, header)?;
        for (idx, row) in data.iter().enumerate() {
            self.write_row(out, row)?;
            let written = idx + 1;
            if let Some(n) = header_every.filter(|n| *n > 0) {
                if written % n == 0 && written < data.len() {
                    out.write_all(b"\n")?;
                    self.write_row(out, header)?;
                }
            }
        }
        Ok(())
    }
}
