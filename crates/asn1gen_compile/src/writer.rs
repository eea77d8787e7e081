//! Indentation-aware text sink for code emission.
//!
//! [`CodeWriter`] wraps any [`io::Write`] and tracks the current indentation
//! level; emitters push and pop levels instead of padding strings by hand.
//! [`Fragment`] is a writer buffering into memory, so nested structures can
//! be composed bottom-up and re-indented into their parent with
//! [`CodeWriter::write_block`]. The sink knows nothing about what it writes.

use std::io::{self, Write};
use std::ops::{Deref, DerefMut};

/// A line-oriented writer with indentation state.
pub struct CodeWriter<W: Write> {
    out: W,
    indent_size: usize,
    current_indent: usize,
}

impl<W: Write> CodeWriter<W> {
    /// Wraps a stream with the default indent of four spaces.
    pub fn new(out: W) -> Self {
        Self::with_indent_size(out, 4)
    }

    pub fn with_indent_size(out: W, indent_size: usize) -> Self {
        Self {
            out,
            indent_size,
            current_indent: 0,
        }
    }

    pub fn push_indent(&mut self) {
        self.current_indent += self.indent_size;
    }

    pub fn pop_indent(&mut self) {
        self.current_indent = self.current_indent.saturating_sub(self.indent_size);
    }

    /// Writes one line at the current indentation; empty lines stay empty.
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        if line.is_empty() {
            writeln!(self.out)
        } else {
            writeln!(
                self.out,
                "{:indent$}{}",
                "",
                line,
                indent = self.current_indent
            )
        }
    }

    pub fn write_blanks(&mut self, count: usize) -> io::Result<()> {
        for _ in 0..count {
            writeln!(self.out)?;
        }
        Ok(())
    }

    /// Writes a multi-line block, reindenting after every line break.
    pub fn write_block(&mut self, block: &str) -> io::Result<()> {
        for line in block.trim_end().split('\n') {
            self.write_line(line)?;
        }
        Ok(())
    }

    /// Writes items one per line, comma-separated.
    pub fn write_enumeration(&mut self, items: &[String]) -> io::Result<()> {
        self.write_block(&items.join(",\n"))
    }

    /// A memory-buffered sink sharing this writer's indent size.
    pub fn fragment(&self) -> Fragment {
        Fragment::with_indent_size(self.indent_size)
    }
}

/// A buffering writer for nested structures; renders via [`ToString`].
pub struct Fragment {
    writer: CodeWriter<Vec<u8>>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::with_indent_size(4)
    }

    pub fn with_indent_size(indent_size: usize) -> Self {
        Fragment {
            writer: CodeWriter::with_indent_size(Vec::new(), indent_size),
        }
    }

    pub fn into_string(self) -> String {
        String::from_utf8_lossy(&self.writer.out).into_owned()
    }
}

impl Default for Fragment {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Fragment {
    type Target = CodeWriter<Vec<u8>>;

    fn deref(&self) -> &Self::Target {
        &self.writer
    }
}

impl DerefMut for Fragment {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.writer
    }
}

impl std::fmt::Display for Fragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.writer.out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(writer: CodeWriter<Vec<u8>>) -> String {
        String::from_utf8(writer.out).unwrap()
    }

    #[test]
    fn write_line_applies_indent() {
        let mut writer = CodeWriter::new(Vec::new());
        writer.write_line("a").unwrap();
        writer.push_indent();
        writer.write_line("b").unwrap();
        writer.pop_indent();
        writer.write_line("c").unwrap();
        assert_eq!(collect(writer), "a\n    b\nc\n");
    }

    #[test]
    fn empty_lines_carry_no_padding() {
        let mut writer = CodeWriter::new(Vec::new());
        writer.push_indent();
        writer.write_line("").unwrap();
        writer.write_blanks(2).unwrap();
        assert_eq!(collect(writer), "\n\n\n");
    }

    #[test]
    fn write_block_reindents_every_line() {
        let mut writer = CodeWriter::new(Vec::new());
        writer.push_indent();
        writer.write_block("x = 1\ny = 2\n").unwrap();
        assert_eq!(collect(writer), "    x = 1\n    y = 2\n");
    }

    #[test]
    fn write_enumeration_joins_with_commas() {
        let mut writer = CodeWriter::new(Vec::new());
        writer
            .write_enumeration(&["('a', 0)".to_string(), "('b', 1)".to_string()])
            .unwrap();
        assert_eq!(collect(writer), "('a', 0),\n('b', 1)\n");
    }

    #[test]
    fn fragments_compose_into_parents() {
        let mut fragment = Fragment::new();
        fragment.write_line("inner(").unwrap();
        fragment.push_indent();
        fragment.write_line("1").unwrap();
        fragment.pop_indent();
        fragment.write_line(")").unwrap();

        let mut writer = CodeWriter::new(Vec::new());
        writer.push_indent();
        writer.write_block(&fragment.into_string()).unwrap();
        assert_eq!(collect(writer), "    inner(\n        1\n    )\n");
    }

    #[test]
    fn pop_indent_saturates_at_zero() {
        let mut writer = CodeWriter::new(Vec::new());
        writer.pop_indent();
        writer.write_line("still left").unwrap();
        assert_eq!(collect(writer), "still left\n");
    }
}
