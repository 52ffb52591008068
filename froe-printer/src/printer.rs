//! The low-level token emitter.
//!
//! Every byte of output funnels through [`Printer::print`]: formatting code
//! hands it a short sequence of [`Item`]s (indentation deltas, whitespace
//! atoms, token text, position hints) and the printer decides when pending
//! whitespace and comments actually reach the sink. Whitespace is buffered
//! until the next real token so that comments whose source position falls
//! before that token can be placed first, with separation derived from
//! source line deltas.

use std::io;

use froe_syntax::ast::{Comment, CommentGroup};
use froe_syntax::{Pos, Tok};

use crate::Mode;

/// Maximum number of consecutive line breaks between any two tokens.
pub const MAX_NEWLINES: usize = 3;

const WS_BUF: usize = 8;
const TABS: [u8; 8] = *b"\t\t\t\t\t\t\t\t";
const NEWLINES: [u8; MAX_NEWLINES] = *b"\n\n\n";

/// One pending whitespace atom. A formfeed is a hard column reset for the
/// downstream aligner; in raw mode it degrades to a newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ws {
    Blank,
    Tab,
    Newline,
    Formfeed,
}

impl Ws {
    fn byte(self) -> u8 {
        match self {
            Ws::Blank => b' ',
            Ws::Tab => b'\t',
            Ws::Newline => b'\n',
            Ws::Formfeed => b'\x0c',
        }
    }
}

/// Markup emitted around the next token in HTML mode. Start and end are
/// each consumed (cleared) on use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlTag {
    pub start: String,
    pub end: String,
}

/// One argument to [`Printer::print`].
#[derive(Debug, Clone)]
pub enum Item<'a> {
    /// Adjust the current indentation. Going negative is a programming
    /// error and panics.
    Indent(i8),
    /// Queue a whitespace atom.
    Ws(Ws),
    /// Schedule literal text as the next token.
    Str(&'a str),
    /// Schedule a token's canonical spelling as the next token.
    Tok(Tok),
    /// Accurate source position of the next item, if valid.
    Pos(Pos),
    /// Like [`Item::Pos`], and additionally request an HTML line anchor
    /// before the next token.
    LineTag(Pos),
    /// Markup to wrap around the next token in HTML mode.
    Tag(HtmlTag),
}

/// Shorthands for the common whitespace items.
pub const BLANK: Item<'static> = Item::Ws(Ws::Blank);
pub const TAB: Item<'static> = Item::Ws(Ws::Tab);
pub const NEWLINE: Item<'static> = Item::Ws(Ws::Newline);
pub const FORMFEED: Item<'static> = Item::Ws(Ws::Formfeed);

/// Printer state for one print run. All state is per-call; two printers
/// never share anything.
pub struct Printer<'a> {
    // configuration
    output: &'a mut dyn io::Write,
    mode: Mode,

    // current state
    written: usize,
    err: Option<io::Error>,
    pub(crate) level: usize,
    indent: usize,
    last: Pos,
    pos: Pos,
    tag: HtmlTag,
    last_tagged_line: usize,

    // buffered whitespace
    buffer: [Ws; WS_BUF],
    buflen: usize,

    // comment groups still to be interleaved, in source order
    comments: &'a [CommentGroup],
    next_group: usize,
}

impl<'a> Printer<'a> {
    pub fn new(output: &'a mut dyn io::Write, mode: Mode) -> Self {
        Printer {
            output,
            mode,
            written: 0,
            err: None,
            level: 0,
            indent: 0,
            last: Pos::default(),
            pos: Pos::default(),
            tag: HtmlTag::default(),
            last_tagged_line: 0,
            buffer: [Ws::Blank; WS_BUF],
            buflen: 0,
            comments: &[],
            next_group: 0,
        }
    }

    /// Install the file's comment groups for interleaving. While a comment
    /// list is installed, node-attached lead and line comments are ignored
    /// (they are reached through the list instead).
    pub fn set_comments(&mut self, comments: &'a [CommentGroup]) {
        self.comments = comments;
        self.next_group = 0;
    }

    /// Total bytes delivered to the sink so far.
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }

    /// Current function nesting depth; 0 is package scope.
    #[must_use]
    pub fn level(&self) -> usize {
        self.level
    }

    /// The first sink error observed, if any. Writes after the first error
    /// are skipped.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.err.take()
    }

    pub(crate) fn has_comments(&self) -> bool {
        !self.comments.is_empty()
    }

    // ------------------------------------------------------------------
    // Byte writer
    // ------------------------------------------------------------------

    /// Write directly to the sink: no indentation, no escaping, no
    /// position tracking. Only the byte tally and error capture.
    fn write_raw(&mut self, data: &[u8]) {
        if self.err.is_some() {
            return;
        }
        let mut buf = data;
        while !buf.is_empty() {
            match self.output.write(buf) {
                Ok(0) => {
                    self.err = Some(io::ErrorKind::WriteZero.into());
                    return;
                }
                Ok(n) => {
                    self.written += n;
                    buf = &buf[n..];
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.err = Some(e);
                    return;
                }
            }
        }
    }

    /// Write token or whitespace text: rewrites formfeeds in raw mode,
    /// emits indentation after line breaks, HTML-escapes `& < >` in HTML
    /// mode, and advances the estimated output position. An escape counts
    /// one column: the aligner and the reader both see a single glyph.
    fn write(&mut self, data: &[u8]) {
        let mut i0 = 0;
        for (i, &b) in data.iter().enumerate() {
            match b {
                b'\n' | b'\x0c' => {
                    if self.mode.contains(Mode::RAW_FORMAT) && b == b'\x0c' {
                        // no aligner downstream - degrade to a newline
                        self.write_raw(&data[i0..i]);
                        self.write_raw(b"\n");
                    } else {
                        self.write_raw(&data[i0..=i]);
                    }

                    let mut j = self.indent;
                    while j > TABS.len() {
                        self.write_raw(&TABS);
                        j -= TABS.len();
                    }
                    self.write_raw(&TABS[..j]);

                    self.pos.offset += i + 1 - i0 + self.indent;
                    self.pos.line += 1;
                    self.pos.column = self.indent + 1;

                    i0 = i + 1;
                }
                b'&' | b'<' | b'>' if self.mode.contains(Mode::GEN_HTML) => {
                    self.write_raw(&data[i0..i]);
                    let esc: &[u8] = match b {
                        b'&' => b"&amp;",
                        b'<' => b"&lt;",
                        _ => b"&gt;",
                    };
                    self.write_raw(esc);

                    self.pos.offset += i + 1 - i0;
                    self.pos.column += i + 1 - i0;

                    i0 = i + 1;
                }
                _ => {}
            }
        }

        self.write_raw(&data[i0..]);
        let n = data.len() - i0;
        self.pos.offset += n;
        self.pos.column += n;
    }

    fn write_newlines(&mut self, n: isize) {
        if n > 0 {
            let n = (n as usize).min(MAX_NEWLINES);
            self.write(&NEWLINES[..n]);
        }
    }

    /// Emit one token (or comment text) at `pos`, wrapped in any pending
    /// HTML markup, and record the position just past it.
    fn write_item(&mut self, pos: Pos, data: &str, set_line_tag: bool) {
        self.pos = pos;
        if self.mode.contains(Mode::GEN_HTML) {
            // Anchor ids must be unique within a document: tag a line only
            // when the line number has increased.
            if set_line_tag && pos.line > self.last_tagged_line {
                self.tag.start = format!(r#"<a id="L{}"></a>"#, pos.line);
                self.last_tagged_line = pos.line;
            }
            if !self.tag.start.is_empty() {
                let start = std::mem::take(&mut self.tag.start);
                self.write_raw(start.as_bytes());
            }
            self.write(data.as_bytes());
            if !self.tag.end.is_empty() {
                let end = std::mem::take(&mut self.tag.end);
                self.write_raw(end.as_bytes());
            }
        } else {
            self.write(data.as_bytes());
        }
        self.last = self.pos;
    }

    // ------------------------------------------------------------------
    // Comment interleaving
    // ------------------------------------------------------------------

    fn write_comment(&mut self, c: &Comment) {
        if self.last.is_valid() {
            // Separate from the preceding item; the first item of the run
            // gets no extra spacing.
            let n = c.pos.line as isize - self.last.line as isize;
            if n == 0 {
                // same line as the last item - separate with a tab
                self.write(b"\t");
            } else {
                self.write_newlines(n);
            }
        }
        self.write_item(c.pos, &c.text, false);
    }

    /// Emit every comment group whose first comment lies before `next`,
    /// then rewrite the pending whitespace so the following token lands
    /// where the source put it.
    fn intersperse_comments(&mut self, next: Pos) {
        let comments = self.comments;
        let mut first_line = 0;
        let mut needs_newline = false;
        while let Some(group) = comments.get(self.next_group) {
            if group.pos().offset >= next.offset {
                break;
            }
            for c in &group.list {
                if first_line == 0 {
                    first_line = c.pos.line;
                }
                self.write_comment(c);
                needs_newline = c.is_line_comment();
            }
            self.next_group += 1;
        }

        // Drop blanks and tabs; only line breaks may precede the token now.
        let mut j = 0;
        for i in 0..self.buflen {
            let ch = self.buffer[i];
            if ch == Ws::Newline || ch == Ws::Formfeed {
                self.buffer[j] = ch;
                j += 1;
            }
        }
        self.buflen = j;

        // Cap the buffered breaks at the source line delta so a comment
        // that was adjacent to its declaration stays adjacent.
        if self.last.is_valid() {
            let n = next.line.saturating_sub(self.last.line);
            if n < self.buflen {
                self.buflen = n;
            }
        }

        // A line comment must be closed off by a break. When the comments
        // spanned more than one line the structure of the next line likely
        // changed; force a formfeed to reset column alignment.
        if needs_newline {
            let mut ch = self.buffer[0];
            if self.buflen == 0 {
                self.buflen = 1;
                ch = Ws::Newline;
            }
            if self.last.line > first_line {
                ch = Ws::Formfeed;
            }
            self.buffer[0] = ch;
        }
    }

    // ------------------------------------------------------------------
    // Whitespace buffer
    // ------------------------------------------------------------------

    fn write_whitespace(&mut self) {
        let mut a = [0u8; WS_BUF];
        for i in 0..self.buflen {
            a[i] = self.buffer[i].byte();
        }
        let n = self.buflen;
        self.buflen = 0;
        self.write(&a[..n]);
    }

    // ------------------------------------------------------------------
    // Token printer
    // ------------------------------------------------------------------

    /// Print a sequence of items. This is the only function the formatting
    /// code calls to produce output.
    ///
    /// Whitespace accumulates until a real token arrives. Comments that
    /// belong before that token are printed first, taking the pending
    /// whitespace into account for placement; leftover whitespace follows,
    /// then the token itself.
    pub fn print(&mut self, items: &[Item<'_>]) {
        let mut set_line_tag = false;
        for item in items {
            let mut next = self.pos; // estimated position of the next item
            let mut data: Option<&str> = None;
            match item {
                Item::Indent(d) => {
                    let indent = self.indent as i64 + i64::from(*d);
                    assert!(indent >= 0, "print: negative indentation");
                    self.indent = indent as usize;
                }
                Item::Ws(ws) => {
                    if self.buflen >= WS_BUF {
                        // Whitespace runs are one or two atoms; flushing on
                        // overflow keeps going at the cost of comment
                        // placement in a degenerate tree.
                        self.write_whitespace();
                    }
                    self.buffer[self.buflen] = *ws;
                    self.buflen += 1;
                }
                Item::Str(s) => data = Some(s),
                Item::Tok(t) => data = Some(t.as_str()),
                Item::Pos(p) => {
                    if p.is_valid() {
                        next = *p; // accurate position of the next item
                    }
                }
                Item::LineTag(p) => {
                    if p.is_valid() {
                        next = *p;
                        set_line_tag = true;
                    }
                }
                Item::Tag(tag) => self.tag = tag.clone(),
            }
            self.pos = next;

            if let Some(data) = data {
                self.flush(next);

                // Interleaved comments reset the estimated position; make
                // up the difference so line breaks present in the source
                // reappear in the output.
                let delta = next.line as isize - self.pos.line as isize;
                self.write_newlines(delta);

                self.write_item(next, data, set_line_tag);
                set_line_tag = false;
            }
        }
    }

    /// Print any comments and whitespace pending before `next`. Flushing
    /// with [`Pos::INFINITY`] drains everything.
    pub fn flush(&mut self, next: Pos) {
        if self
            .comments
            .get(self.next_group)
            .is_some_and(|g| g.pos().offset < next.offset)
        {
            self.intersperse_comments(next);
        }
        self.write_whitespace();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(offset: usize, line: usize, column: usize) -> Pos {
        Pos::new(offset, line, column)
    }

    fn run(mode: Mode, f: impl FnOnce(&mut Printer<'_>)) -> String {
        let mut out = Vec::new();
        let mut p = Printer::new(&mut out, mode);
        f(&mut p);
        p.flush(Pos::INFINITY);
        assert!(p.take_error().is_none());
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn whitespace_is_deferred_until_a_token() {
        let got = run(Mode::RAW_FORMAT, |p| {
            p.print(&[BLANK, BLANK]);
            p.print(&[Item::Str("x")]);
        });
        assert_eq!(got, "  x");
    }

    #[test]
    fn trailing_whitespace_needs_a_flush() {
        let got = run(Mode::RAW_FORMAT, |p| {
            p.print(&[Item::Str("x"), NEWLINE]);
        });
        assert_eq!(got, "x\n");
    }

    #[test]
    fn indentation_follows_every_line_break() {
        let got = run(Mode::RAW_FORMAT, |p| {
            p.print(&[Item::Str("a"), Item::Indent(1), NEWLINE]);
            p.print(&[Item::Str("b"), NEWLINE]);
            p.print(&[Item::Indent(-1), Item::Str("c")]);
        });
        assert_eq!(got, "a\n\tb\nc");
    }

    #[test]
    fn formfeed_becomes_newline_in_raw_mode() {
        let got = run(Mode::RAW_FORMAT, |p| {
            p.print(&[Item::Str("a"), FORMFEED, Item::Str("b")]);
        });
        assert_eq!(got, "a\nb");
    }

    #[test]
    fn formfeed_survives_aligned_mode() {
        let got = run(Mode::empty(), |p| {
            p.print(&[Item::Str("a"), FORMFEED, Item::Str("b")]);
        });
        assert_eq!(got, "a\x0cb");
    }

    #[test]
    #[should_panic(expected = "negative indentation")]
    fn negative_indentation_panics() {
        let mut out = Vec::new();
        let mut p = Printer::new(&mut out, Mode::RAW_FORMAT);
        p.print(&[Item::Indent(-1)]);
    }

    #[test]
    fn html_mode_escapes_entities() {
        let got = run(Mode::GEN_HTML | Mode::RAW_FORMAT, |p| {
            p.print(&[Item::Str("a < b && c > d")]);
        });
        assert_eq!(got, "a &lt; b &amp;&amp; c &gt; d");
    }

    #[test]
    fn escapes_advance_one_column_each() {
        let mut out = Vec::new();
        let mut p = Printer::new(&mut out, Mode::GEN_HTML | Mode::RAW_FORMAT);
        p.print(&[Item::Pos(pos(1, 1, 1)), Item::Str("<>")]);
        // Two input bytes: the logical column moved two, not the width of
        // the expanded entities.
        assert_eq!(p.pos.column, 3);
        assert_eq!(String::from_utf8(out).unwrap(), "&lt;&gt;");
    }

    #[test]
    fn pending_tag_wraps_the_next_token_once() {
        let got = run(Mode::GEN_HTML | Mode::RAW_FORMAT, |p| {
            p.print(&[Item::Tag(HtmlTag {
                start: "<b>".into(),
                end: "</b>".into(),
            })]);
            p.print(&[Item::Str("x")]);
            p.print(&[BLANK, Item::Str("y")]);
        });
        assert_eq!(got, "<b>x</b> y");
    }

    #[test]
    fn line_anchors_are_unique_and_increasing() {
        let got = run(Mode::GEN_HTML | Mode::RAW_FORMAT, |p| {
            p.print(&[Item::LineTag(pos(1, 1, 1)), Item::Str("a")]);
            // second item on the same line: no second anchor
            p.print(&[BLANK, Item::LineTag(pos(3, 1, 3)), Item::Str("b")]);
            p.print(&[NEWLINE, Item::LineTag(pos(5, 2, 1)), Item::Str("c")]);
        });
        assert_eq!(got, "<a id=\"L1\"></a>a b\n<a id=\"L2\"></a>c");
    }

    #[test]
    fn vertical_space_before_a_comment_is_capped() {
        // A comment ten source lines below the previous token arrives with
        // at most three line breaks in front of it.
        let groups = vec![CommentGroup {
            list: vec![Comment {
                pos: pos(50, 11, 1),
                text: "// far".into(),
            }],
        }];
        let mut out = Vec::new();
        let mut p = Printer::new(&mut out, Mode::RAW_FORMAT);
        p.set_comments(&groups);
        p.print(&[Item::Pos(pos(1, 1, 1)), Item::Str("a")]);
        p.print(&[NEWLINE, Item::Pos(pos(60, 12, 1)), Item::Str("b")]);
        p.flush(Pos::INFINITY);
        assert!(p.take_error().is_none());
        assert_eq!(String::from_utf8(out).unwrap(), "a\n\n\n// far\nb");
    }

    #[test]
    fn comment_before_token_is_emitted_first() {
        let groups = vec![CommentGroup {
            list: vec![Comment {
                pos: pos(1, 1, 1),
                text: "// lead".into(),
            }],
        }];
        let mut out = Vec::new();
        let mut p = Printer::new(&mut out, Mode::RAW_FORMAT);
        p.set_comments(&groups);
        p.print(&[Item::Pos(pos(9, 2, 1)), Item::Str("x")]);
        p.flush(Pos::INFINITY);
        assert!(p.take_error().is_none());
        assert_eq!(String::from_utf8(out).unwrap(), "// lead\nx");
    }

    #[test]
    fn same_line_comment_separated_by_tab() {
        let groups = vec![CommentGroup {
            list: vec![Comment {
                pos: pos(3, 1, 3),
                text: "/* c */".into(),
            }],
        }];
        let mut out = Vec::new();
        let mut p = Printer::new(&mut out, Mode::RAW_FORMAT);
        p.set_comments(&groups);
        p.print(&[Item::Pos(pos(1, 1, 1)), Item::Str("x")]);
        p.print(&[NEWLINE, Item::Pos(pos(12, 2, 1)), Item::Str("y")]);
        p.flush(Pos::INFINITY);
        assert!(p.take_error().is_none());
        assert_eq!(String::from_utf8(out).unwrap(), "x\t/* c */\ny");
    }

    #[test]
    fn first_write_error_wins() {
        struct FailAfter(usize);
        impl io::Write for FailAfter {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                if self.0 == 0 {
                    return Err(io::Error::other("sink full"));
                }
                let n = buf.len().min(self.0);
                self.0 -= n;
                Ok(n)
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut out = FailAfter(4);
        let mut p = Printer::new(&mut out, Mode::RAW_FORMAT);
        p.print(&[Item::Str("abcdef"), NEWLINE, Item::Str("ghi")]);
        p.flush(Pos::INFINITY);
        assert_eq!(p.written(), 4);
        let err = p.take_error().expect("error expected");
        assert_eq!(err.to_string(), "sink full");
    }
}
