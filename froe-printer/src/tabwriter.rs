//! Elastic-tabstop column alignment.
//!
//! [`TabWriter`] is an [`io::Write`] adapter that consumes the printer's
//! layout markers: a tab terminates a cell, a newline terminates a row,
//! and a formfeed terminates a row *and* closes the current alignment
//! block. Within a block, cells that share a column across a run of
//! consecutive rows are padded to a common width, so the printed source
//! comes out with its names, types, and trailing comments lined up.
//!
//! Rows buffer until a block closes (formfeed or [`io::Write::flush`]);
//! only then is anything forwarded to the underlying writer.

use std::io;

#[derive(Debug, Clone, Copy)]
struct Cell {
    /// Byte range into the block's text buffer.
    start: usize,
    end: usize,
    /// Width in screen columns, not bytes.
    width: usize,
}

#[derive(Debug, Default)]
struct Line {
    cells: Vec<Cell>,
    /// False only for a partial line released by an explicit flush; such a
    /// line is written without a trailing newline.
    terminated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HtmlState {
    Text,
    Tag,
    Entity,
}

/// The column aligner. Configure with the builder methods, then write the
/// marker-bearing byte stream through it.
pub struct TabWriter<W: io::Write> {
    out: W,
    tabwidth: usize,
    padding: usize,
    padchar: u8,
    filter_html: bool,

    text: Vec<u8>,
    lines: Vec<Line>,
    cur_cells: Vec<Cell>,
    cell_start: usize,
    cell_width: usize,
    html: HtmlState,
}

impl<W: io::Write> TabWriter<W> {
    pub fn new(out: W) -> Self {
        TabWriter {
            out,
            tabwidth: 8,
            padding: 1,
            padchar: b'\t',
            filter_html: false,
            text: Vec::new(),
            lines: Vec::new(),
            cur_cells: Vec::new(),
            cell_start: 0,
            cell_width: 0,
            html: HtmlState::Text,
        }
    }

    /// Minimum cell width, which doubles as the tab-stop width when
    /// padding with tabs.
    #[must_use]
    pub fn tabwidth(mut self, tabwidth: usize) -> Self {
        self.tabwidth = tabwidth;
        self
    }

    /// Extra columns of air added to every aligned cell.
    #[must_use]
    pub fn padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    /// Pad with `b'\t'` (the default) or `b' '`.
    #[must_use]
    pub fn padchar(mut self, padchar: u8) -> Self {
        self.padchar = padchar;
        self
    }

    /// Count HTML tags as zero columns wide and entities as one, so markup
    /// inserted around tokens does not disturb alignment.
    #[must_use]
    pub fn filter_html(mut self, filter_html: bool) -> Self {
        self.filter_html = filter_html;
        self
    }

    /// Unwrap the underlying writer. Flush first; buffered rows are lost.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn byte_width(&mut self, b: u8) -> usize {
        if self.filter_html {
            match self.html {
                HtmlState::Text => match b {
                    b'<' => {
                        self.html = HtmlState::Tag;
                        0
                    }
                    b'&' => {
                        self.html = HtmlState::Entity;
                        1
                    }
                    _ => char_width(b),
                },
                HtmlState::Tag => {
                    if b == b'>' {
                        self.html = HtmlState::Text;
                    }
                    0
                }
                HtmlState::Entity => {
                    if b == b';' {
                        self.html = HtmlState::Text;
                    }
                    0
                }
            }
        } else {
            char_width(b)
        }
    }

    fn terminate_cell(&mut self) {
        self.cur_cells.push(Cell {
            start: self.cell_start,
            end: self.text.len(),
            width: self.cell_width,
        });
        self.cell_start = self.text.len();
        self.cell_width = 0;
    }

    fn byte(&mut self, b: u8) -> io::Result<()> {
        match b {
            b'\t' => self.terminate_cell(),
            b'\n' | b'\x0c' => {
                self.terminate_cell();
                let cells = std::mem::take(&mut self.cur_cells);
                self.lines.push(Line {
                    cells,
                    terminated: true,
                });
                if b == b'\x0c' {
                    // hard block boundary
                    self.flush_block()?;
                }
            }
            _ => {
                let w = self.byte_width(b);
                self.text.push(b);
                self.cell_width += w;
            }
        }
        Ok(())
    }

    /// Format the buffered block and forward it.
    fn flush_block(&mut self) -> io::Result<()> {
        if !self.lines.is_empty() {
            let lines = std::mem::take(&mut self.lines);
            let mut widths = Vec::new();
            self.format_lines(&lines, 0, lines.len(), &mut widths)?;
        }
        self.text.clear();
        self.cell_start = 0;
        Ok(())
    }

    /// Discover column runs recursively. A column exists for a run of
    /// consecutive lines that all carry a tab-terminated cell at that
    /// index; each run is formatted with its own width before recursing
    /// into the next column.
    fn format_lines(
        &mut self,
        lines: &[Line],
        line0: usize,
        line1: usize,
        widths: &mut Vec<usize>,
    ) -> io::Result<()> {
        let column = widths.len();
        let mut block_start = line0;
        let mut this = line0;
        while this < line1 {
            if column + 1 < lines[this].cells.len() {
                // A cell exists in this column. Write the preceding lines,
                // then gather the run sharing the column.
                self.write_lines(lines, block_start, this, widths)?;
                block_start = this;
                let mut width = self.tabwidth;
                while this < line1 && column + 1 < lines[this].cells.len() {
                    let w = lines[this].cells[column].width + self.padding;
                    if w > width {
                        width = w;
                    }
                    this += 1;
                }
                widths.push(width);
                self.format_lines(lines, block_start, this, widths)?;
                widths.pop();
                block_start = this;
            } else {
                this += 1;
            }
        }
        self.write_lines(lines, block_start, line1, widths)
    }

    fn write_lines(
        &mut self,
        lines: &[Line],
        line0: usize,
        line1: usize,
        widths: &[usize],
    ) -> io::Result<()> {
        for line in &lines[line0..line1] {
            let last = line.cells.len().saturating_sub(1);
            for (i, cell) in line.cells.iter().enumerate() {
                self.out.write_all(&self.text[cell.start..cell.end])?;
                if i < last {
                    let column_width = widths.get(i).copied().unwrap_or(self.tabwidth);
                    self.write_padding(cell.width, column_width)?;
                }
            }
            if line.terminated {
                self.out.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    fn write_padding(&mut self, cell_width: usize, column_width: usize) -> io::Result<()> {
        if self.padchar == b'\t' {
            if self.tabwidth == 0 {
                return Ok(());
            }
            // Round the column up to a tab stop; every tab written advances
            // at least one column.
            let column_width = column_width.div_ceil(self.tabwidth) * self.tabwidth;
            let n = column_width.saturating_sub(cell_width);
            for _ in 0..n.div_ceil(self.tabwidth) {
                self.out.write_all(b"\t")?;
            }
        } else {
            for _ in 0..column_width.saturating_sub(cell_width) {
                self.out.write_all(&[self.padchar])?;
            }
        }
        Ok(())
    }
}

fn char_width(b: u8) -> usize {
    // UTF-8 continuation bytes add no columns.
    usize::from(b & 0xC0 != 0x80)
}

impl<W: io::Write> io::Write for TabWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &b in buf {
            self.byte(b)?;
        }
        Ok(buf.len())
    }

    /// Terminate any partial row and release the buffered block.
    fn flush(&mut self) -> io::Result<()> {
        if self.cell_start < self.text.len() || !self.cur_cells.is_empty() {
            self.terminate_cell();
            let cells = std::mem::take(&mut self.cur_cells);
            self.lines.push(Line {
                cells,
                terminated: false,
            });
        }
        self.flush_block()?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn align(input: &str, f: impl FnOnce(TabWriter<Vec<u8>>) -> TabWriter<Vec<u8>>) -> String {
        let mut tw = f(TabWriter::new(Vec::new()));
        tw.write_all(input.as_bytes()).unwrap();
        tw.flush().unwrap();
        String::from_utf8(tw.into_inner()).unwrap()
    }

    #[test]
    fn columns_align_across_rows() {
        let got = align("a\tbb\tc\nlong\tx\ty\n", |tw| {
            tw.padchar(b' ').tabwidth(1).padding(1)
        });
        assert_eq!(got, "a    bb c\nlong x  y\n");
    }

    #[test]
    fn formfeed_closes_the_block() {
        let got = align("a\tbb\n\x0cxxxx\ty\n", |tw| {
            tw.padchar(b' ').tabwidth(1).padding(1)
        });
        // the wide cell in the second block does not widen the first
        assert_eq!(got, "a bb\nxxxx y\n");
    }

    #[test]
    fn tab_padding_rounds_to_tab_stops() {
        let got = align("a\tb\nlong\tc\n", |tw| tw);
        assert_eq!(got, "a\tb\nlong\tc\n");

        let got = align("verylongcell\tb\na\tc\n", |tw| tw);
        assert_eq!(got, "verylongcell\tb\na\t\tc\n");
    }

    #[test]
    fn rows_with_fewer_cells_break_the_run() {
        let got = align("a\tb\nplain\nc\td\n", |tw| {
            tw.padchar(b' ').tabwidth(1).padding(1)
        });
        assert_eq!(got, "a b\nplain\nc d\n");
    }

    #[test]
    fn html_tags_are_zero_wide() {
        let got = align("<a id=\"L1\"></a>x\tb\ny\tc\n", |tw| {
            tw.padchar(b' ').tabwidth(1).padding(1).filter_html(true)
        });
        assert_eq!(got, "<a id=\"L1\"></a>x b\ny c\n");
    }

    #[test]
    fn html_entities_are_one_wide() {
        let got = align("&amp;\tb\nx\tc\n", |tw| {
            tw.padchar(b' ').tabwidth(1).padding(1).filter_html(true)
        });
        assert_eq!(got, "&amp; b\nx c\n");
    }

    #[test]
    fn flush_releases_a_partial_row_without_a_newline() {
        let got = align("a\tb", |tw| tw.padchar(b' ').tabwidth(1).padding(1));
        assert_eq!(got, "a b");
    }

    #[test]
    fn multibyte_text_counts_characters_not_bytes() {
        let got = align("äöü\tb\nxxxx\tc\n", |tw| {
            tw.padchar(b' ').tabwidth(1).padding(1)
        });
        assert_eq!(got, "äöü  b\nxxxx c\n");
    }

    #[test]
    fn empty_lines_pass_through() {
        let got = align("a\tb\n\nc\td\n", |tw| tw.padchar(b' ').tabwidth(1).padding(1));
        assert_eq!(got, "a b\n\nc d\n");
    }
}
