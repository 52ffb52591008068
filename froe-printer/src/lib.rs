//! Pretty-printer for Froe ASTs.
//!
//! [`print`] walks an already-parsed tree and emits canonical source text,
//! interleaving the file's comments at the positions the source put them
//! and preserving intentional line breaks inside lists. Unless
//! [`Mode::RAW_FORMAT`] is set, output is piped through the elastic
//! column aligner in [`tabwriter`] so grouped declarations, struct fields,
//! and trailing comments line up. [`Mode::GEN_HTML`] wraps the output for
//! source-browser use with entity escaping and per-line anchors.
//!
//! For a given `(tree, comments, mode, tabwidth)` the output bytes are a
//! pure function: printing is single-threaded, synchronous, and touches no
//! shared state.

pub mod printer;
pub mod tabwriter;

mod fmt;

use std::io;

use bitflags::bitflags;
use froe_syntax::ast;
use froe_syntax::Pos;

use crate::printer::Printer;
use crate::tabwriter::TabWriter;

bitflags! {
    /// Flags controlling the printed output.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Mode: u32 {
        /// Generate HTML: entity-escape `&`, `<`, `>` and emit one
        /// `<a id="L{line}"></a>` anchor per source line.
        const GEN_HTML = 1 << 0;
        /// Skip the column aligner; formfeeds degrade to plain newlines.
        const RAW_FORMAT = 1 << 1;
        /// The aligner pads with spaces instead of tabs. Ignored when
        /// `RAW_FORMAT` is set.
        const USE_SPACES = 1 << 2;
    }
}

/// A printable AST root.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Expr(&'a ast::Expr),
    Stmt(&'a ast::Stmt),
    Decl(&'a ast::Decl),
    File(&'a ast::File),
}

/// Printing failure.
#[derive(Debug)]
pub enum Error {
    /// The sink failed. `written` counts the bytes delivered before the
    /// first error; later writes were skipped.
    Io { written: usize, source: io::Error },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io { written, source } => {
                write!(f, "write failed after {written} bytes: {source}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
        }
    }
}

/// Pretty-print `node` to `output` and return the number of bytes written.
///
/// `tabwidth` is handed to the column aligner; it has no effect under
/// [`Mode::RAW_FORMAT`]. The aligner is flushed once the traversal
/// completes; a failure during that flush is ignored in favor of the
/// printer's own first error, and the reported byte count covers what the
/// printer delivered to the aligner.
pub fn print(
    output: &mut dyn io::Write,
    node: Node<'_>,
    mode: Mode,
    tabwidth: usize,
) -> Result<usize, Error> {
    if mode.contains(Mode::RAW_FORMAT) {
        return print_node(output, node, mode);
    }

    let padchar = if mode.contains(Mode::USE_SPACES) {
        b' '
    } else {
        b'\t'
    };
    let mut tw = TabWriter::new(output)
        .tabwidth(tabwidth)
        .padding(1)
        .padchar(padchar)
        .filter_html(mode.contains(Mode::GEN_HTML));
    let result = print_node(&mut tw, node, mode);
    let _ = io::Write::flush(&mut tw);
    result
}

fn print_node(output: &mut dyn io::Write, node: Node<'_>, mode: Mode) -> Result<usize, Error> {
    let mut p = Printer::new(output, mode);
    match node {
        Node::Expr(x) => {
            p.format_expr(x);
        }
        Node::Stmt(s) => {
            p.format_stmt(s);
        }
        Node::Decl(d) => {
            let (comment, _) = p.format_decl(d);
            p.format_line_comment(comment); // no newline at the end
        }
        Node::File(f) => {
            p.set_comments(&f.comments);
            p.format_file(f);
        }
    }
    p.flush(Pos::INFINITY);

    let written = p.written();
    match p.take_error() {
        None => Ok(written),
        Some(source) => Err(Error::Io { written, source }),
    }
}
