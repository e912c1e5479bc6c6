//! Minimal CSV record writer.
//!
//! Fields are quoted only when they contain a delimiter, a quote or a line
//! break. Each record goes out in a single write followed by a flush.

use std::io::{self, Write};

/// Quotes a field when needed, doubling embedded quotes.
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Writes records to an underlying sink one line at a time.
pub struct CsvWriter<'a, W: Write + ?Sized> {
    out: &'a mut W,
}

impl<'a, W: Write + ?Sized> CsvWriter<'a, W> {
    pub fn new(out: &'a mut W) -> Self {
        Self { out }
    }

    pub fn write_record<S: AsRef<str>>(&mut self, fields: &[S]) -> io::Result<()> {
        let mut line = fields
            .iter()
            .map(|f| escape_field(f.as_ref()))
            .collect::<Vec<_>>()
            .join(",");
        line.push('\n');
        self.out.write_all(line.as_bytes())?;
        self.out.flush()
    }
}
