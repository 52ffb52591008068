//! AST traversal: expression, statement, declaration, and file formatters.
//!
//! All methods here speak to the sink exclusively through
//! [`Printer::print`]. Functions that can end in a closing brace (or an
//! otherwise self-terminating form) return `true` so the caller may elide
//! the separating semicolon.

use bitflags::bitflags;

use froe_syntax::ast::{
    BasicLit, BinaryExpr, BlockStmt, ChanDir, Comment, CommentGroup, Decl, Expr, Field, File,
    Ident, Spec, Stmt,
};
use froe_syntax::{Pos, Tok, HIGHEST_PREC, LOWEST_PREC, UNARY_PREC};

use crate::printer::{Item, Printer, BLANK, FORMFEED, NEWLINE, TAB};

bitflags! {
    /// Layout of an expression list.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct ListMode: u8 {
        /// Print a blank before the list.
        const BLANK_START = 1 << 0;
        /// Separate elements with commas.
        const COMMA_SEP = 1 << 1;
        /// Terminate the list with a comma.
        const COMMA_TERM = 1 << 2;
    }
}

/// The separator between a name column and what follows it: a single blank
/// for a lone entry, a tab (an alignment column) otherwise.
fn separator(use_tab: bool) -> Item<'static> {
    if use_tab {
        TAB
    } else {
        BLANK
    }
}

/// Whether an operand is bulky enough that the operators around it read
/// better with blanks.
fn needs_blanks(expr: &Expr) -> bool {
    match expr {
        // "long" identifiers look better with blanks around them
        Expr::Ident(x) => x.name.len() > 12,
        // "long" literals look better with blanks around them
        Expr::BasicLit(x) => x.value.len() > 6,
        // parenthesized expressions don't need blanks around them
        Expr::Paren(_) => false,
        // call expressions need blanks if they have more than one argument
        // or if the function or the sole argument needs blanks
        Expr::Call(x) => {
            x.args.len() > 1
                || needs_blanks(&x.fun)
                || (x.args.len() == 1 && needs_blanks(&x.args[0]))
        }
        _ => true,
    }
}

fn count_import_renames(specs: &[Spec]) -> usize {
    specs
        .iter()
        .filter(|s| matches!(s, Spec::Import(i) if i.name.is_some()))
        .count()
}

fn count_value_types(specs: &[Spec]) -> usize {
    specs
        .iter()
        .filter(|s| matches!(s, Spec::Value(v) if v.typ.is_some()))
        .count()
}

impl<'a> Printer<'a> {
    // ------------------------------------------------------------------
    // Comments attached to nodes
    // ------------------------------------------------------------------

    /// Print the comments of one group individually.
    fn comment_list(&mut self, list: &[Comment]) {
        for (i, c) in list.iter().enumerate() {
            self.print(&[Item::Pos(c.pos), Item::Str(&c.text)]);
            if c.is_line_comment() && i + 1 < list.len() {
                // a line comment not at the end needs its terminator now
                self.print(&[NEWLINE]);
            }
        }
    }

    /// Print a doc comment group followed by a newline. Ignored while an
    /// interleaved comment list is installed; the group is reached through
    /// the list instead.
    fn format_lead_comment(&mut self, doc: Option<&CommentGroup>) {
        if !self.has_comments() {
            if let Some(d) = doc {
                self.comment_list(&d.list);
                self.print(&[NEWLINE]);
            }
        }
    }

    /// Print a tab followed by a trailing line comment. The caller must
    /// print a newline afterwards since the comment may be `//`-style.
    pub(crate) fn format_line_comment(&mut self, comment: Option<&CommentGroup>) {
        if !self.has_comments() {
            if let Some(d) = comment {
                self.print(&[TAB]);
                self.comment_list(&d.list);
            }
        }
    }

    // ------------------------------------------------------------------
    // Lists
    // ------------------------------------------------------------------

    fn format_ident(&mut self, x: &Ident) {
        self.print(&[Item::Pos(x.pos), Item::Str(&x.name)]);
    }

    /// Print a list of items. If the list spans multiple source lines, the
    /// original line breaks are respected.
    fn item_list<T>(
        &mut self,
        list: &[T],
        mode: ListMode,
        pos_of: impl Fn(&T) -> Pos,
        mut format_item: impl FnMut(&mut Self, &T),
    ) {
        let (first, last) = match (list.first(), list.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return,
        };

        if pos_of(first).line == pos_of(last).line {
            // all list entries on a single line
            if mode.contains(ListMode::BLANK_START) {
                self.print(&[BLANK]);
            }
            for (i, x) in list.iter().enumerate() {
                if i > 0 {
                    if mode.contains(ListMode::COMMA_SEP) {
                        self.print(&[Item::Tok(Tok::Comma)]);
                    }
                    self.print(&[BLANK]);
                }
                format_item(self, x);
            }
            return;
        }

        // List entries span multiple lines; use source positions to guide
        // the line breaks.
        self.print(&[Item::Indent(1), FORMFEED]);
        let mut line = pos_of(first).line;
        for (i, x) in list.iter().enumerate() {
            let prev = line;
            line = pos_of(x).line;
            if i > 0 {
                if mode.contains(ListMode::COMMA_SEP) {
                    self.print(&[Item::Tok(Tok::Comma)]);
                }
                if prev < line {
                    self.print(&[NEWLINE]);
                } else {
                    self.print(&[BLANK]);
                }
            }
            format_item(self, x);
        }
        if mode.contains(ListMode::COMMA_TERM) {
            self.print(&[Item::Tok(Tok::Comma)]);
        }
        self.print(&[Item::Indent(-1), FORMFEED]);
    }

    fn expr_list(&mut self, list: &[Expr], mode: ListMode) {
        self.item_list(list, mode, Expr::pos, |p, x| {
            p.format_expr(x);
        });
    }

    fn ident_list(&mut self, list: &[Ident], mode: ListMode) {
        self.item_list(list, mode, |x| x.pos, Printer::format_ident);
    }

    fn string_list(&mut self, list: &[BasicLit]) {
        self.item_list(list, ListMode::empty(), |x| x.pos, |p, x| {
            p.print(&[Item::Pos(x.pos), Item::Str(&x.value)]);
        });
    }

    // ------------------------------------------------------------------
    // Signatures and field lists
    // ------------------------------------------------------------------

    fn format_parameters(&mut self, list: &[Field]) {
        self.print(&[Item::Tok(Tok::Lparen)]);
        if !list.is_empty() {
            self.level += 1; // adjust nesting level for parameters
            for (i, par) in list.iter().enumerate() {
                if i > 0 {
                    self.print(&[Item::Tok(Tok::Comma), BLANK]);
                }
                self.ident_list(&par.names, ListMode::COMMA_SEP);
                if !par.names.is_empty() {
                    self.print(&[BLANK]);
                }
                self.format_expr(&par.typ);
            }
            self.level -= 1;
        }
        self.print(&[Item::Tok(Tok::Rparen)]);
    }

    /// Returns true if a separating semicolon is optional afterwards.
    fn format_signature(&mut self, params: &[Field], results: Option<&[Field]>) -> bool {
        self.format_parameters(params);
        if let Some(results) = results {
            self.print(&[BLANK]);

            if let [f] = results {
                if f.names.is_empty() && !matches!(f.typ, Expr::FuncType(_)) {
                    // single anonymous result; no parentheses
                    return self.format_expr(&f.typ);
                }
            }

            self.format_parameters(results);
        }
        false
    }

    fn format_field_list(
        &mut self,
        lbrace: Pos,
        list: &[Field],
        rbrace: Pos,
        is_incomplete: bool,
        is_struct: bool,
    ) {
        if list.is_empty() && !is_incomplete {
            // no blank between the keyword and {} in this case
            self.print(&[
                Item::Pos(lbrace),
                Item::Tok(Tok::Lbrace),
                Item::Pos(rbrace),
                Item::Tok(Tok::Rbrace),
            ]);
            return;
        }

        // at least one entry or an incomplete list
        self.print(&[
            BLANK,
            Item::Pos(lbrace),
            Item::Tok(Tok::Lbrace),
            Item::Indent(1),
            FORMFEED,
        ]);
        if is_struct {
            let sep = separator(list.len() > 1);
            for (i, f) in list.iter().enumerate() {
                self.format_lead_comment(f.doc.as_ref());
                if !f.names.is_empty() {
                    self.ident_list(&f.names, ListMode::COMMA_SEP);
                    self.print(&[sep.clone()]);
                }
                self.format_expr(&f.typ);
                if let Some(tag) = &f.tag {
                    self.print(&[sep.clone()]);
                    self.string_list(tag);
                }
                self.print(&[Item::Tok(Tok::Semicolon)]);
                self.format_line_comment(f.comment.as_ref());
                if i + 1 < list.len() || is_incomplete {
                    self.print(&[NEWLINE]);
                }
            }
            if is_incomplete {
                self.print(&[Item::Str("// contains unexported fields")]);
            }
        } else {
            // interface
            for (i, f) in list.iter().enumerate() {
                self.format_lead_comment(f.doc.as_ref());
                self.ident_list(&f.names, ListMode::COMMA_SEP);
                if f.names.len() > 1 {
                    self.print(&[BLANK]);
                }
                if let Expr::FuncType(ftyp) = &f.typ {
                    // method(s)
                    self.format_signature(&ftyp.params, ftyp.results.as_deref());
                } else {
                    // embedded interface
                    self.format_expr(&f.typ);
                }
                self.print(&[Item::Tok(Tok::Semicolon)]);
                self.format_line_comment(f.comment.as_ref());
                if i + 1 < list.len() || is_incomplete {
                    self.print(&[NEWLINE]);
                }
            }
            if is_incomplete {
                self.print(&[Item::Str("// contains unexported methods")]);
            }
        }
        self.print(&[
            Item::Indent(-1),
            FORMFEED,
            Item::Pos(rbrace),
            Item::Tok(Tok::Rbrace),
        ]);
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Print a binary expression, collecting the left spine of operations
    /// at the same precedence so the whole run is padded consistently.
    fn format_binary_expr(&mut self, x: &BinaryExpr, prec1: u8) {
        let prec = x.op.precedence();
        if prec < prec1 {
            // Parentheses needed. A parser inserts an explicit parenthesis
            // node, so this only fires for synthesized trees.
            self.print(&[Item::Tok(Tok::Lparen), Item::Pos(x.x.pos())]);
            self.format_binary_expr(x, LOWEST_PREC);
            self.print(&[Item::Tok(Tok::Rparen)]);
            return;
        }

        // The right-hand side of each operation has a higher precedence
        // than the operation itself; that is how parsers build the tree.
        let mut list: Vec<&BinaryExpr> = Vec::new();
        let mut print_blanks = prec <= Tok::Eql.precedence() || needs_blanks(&x.y);
        let mut x = x;
        loop {
            list.push(x);
            match x.x.as_ref() {
                Expr::Binary(t) if t.op.precedence() == prec => {
                    x = t;
                    if needs_blanks(&x.y) {
                        print_blanks = true;
                    }
                }
                _ => break,
            }
        }
        if needs_blanks(&x.x) {
            print_blanks = true;
        }

        // Print the collected operations left-to-right.
        self.format_expr_prec(&x.x, prec);
        while let Some(op) = list.pop() {
            if print_blanks {
                self.print(&[BLANK, Item::Pos(op.op_pos), Item::Tok(op.op), BLANK]);
            } else {
                self.print(&[Item::Pos(op.op_pos), Item::Tok(op.op)]);
            }
            self.format_expr_prec(&op.y, prec);
        }
    }

    /// Returns true if a separating semicolon is optional afterwards.
    #[expect(clippy::too_many_lines, reason = "match on all Expr variants")]
    fn format_expr_prec(&mut self, expr: &Expr, prec1: u8) -> bool {
        self.print(&[Item::Pos(expr.pos())]);

        let mut opt_semi = false;
        match expr {
            Expr::Bad(_) => self.print(&[Item::Str("BadExpr")]),

            Expr::Ident(x) => self.print(&[Item::Str(&x.name)]),

            Expr::Binary(x) => self.format_binary_expr(x, prec1),

            Expr::KeyValue(x) => {
                self.format_expr(&x.key);
                self.print(&[Item::Pos(x.colon), Item::Tok(Tok::Colon), BLANK]);
                self.format_expr(&x.value);
            }

            Expr::Star(x) => {
                self.print(&[Item::Tok(Tok::Mul)]);
                opt_semi = self.format_expr(&x.x);
            }

            Expr::Unary(x) => {
                if UNARY_PREC < prec1 {
                    // parentheses needed
                    self.print(&[Item::Tok(Tok::Lparen)]);
                    self.format_expr(expr);
                    self.print(&[Item::Tok(Tok::Rparen)]);
                } else {
                    self.print(&[Item::Tok(x.op)]);
                    if x.op == Tok::Range {
                        self.print(&[BLANK]);
                    }
                    self.format_expr_prec(&x.x, UNARY_PREC);
                }
            }

            Expr::BasicLit(x) => self.print(&[Item::Str(&x.value)]),

            Expr::StringList(x) => self.string_list(&x.strings),

            Expr::FuncLit(x) => {
                self.print(&[Item::Tok(Tok::Func)]);
                self.format_signature(&x.typ.params, x.typ.results.as_deref());
                self.print(&[BLANK]);
                self.level += 1; // adjust nesting level for the body
                self.format_block(&x.body);
                self.level -= 1;
            }

            Expr::Paren(x) => {
                self.print(&[Item::Tok(Tok::Lparen)]);
                self.format_expr(&x.x);
                self.print(&[Item::Pos(x.rparen), Item::Tok(Tok::Rparen)]);
            }

            Expr::Selector(x) => {
                self.format_expr_prec(&x.x, HIGHEST_PREC);
                self.print(&[Item::Tok(Tok::Period)]);
                self.format_ident(&x.sel);
            }

            Expr::TypeAssert(x) => {
                self.format_expr_prec(&x.x, HIGHEST_PREC);
                self.print(&[Item::Tok(Tok::Period), Item::Tok(Tok::Lparen)]);
                match &x.typ {
                    Some(typ) => {
                        self.format_expr(typ);
                    }
                    None => self.print(&[Item::Tok(Tok::Type)]),
                }
                self.print(&[Item::Tok(Tok::Rparen)]);
            }

            Expr::Index(x) => {
                self.format_expr_prec(&x.x, HIGHEST_PREC);
                self.print(&[Item::Tok(Tok::Lbrack)]);
                self.format_expr_prec(&x.index, LOWEST_PREC);
                if let Some(end) = &x.end {
                    if needs_blanks(&x.index) || needs_blanks(end) {
                        // blanks around ":"
                        self.print(&[BLANK, Item::Tok(Tok::Colon), BLANK]);
                    } else {
                        self.print(&[Item::Tok(Tok::Colon)]);
                    }
                    self.format_expr(end);
                }
                self.print(&[Item::Tok(Tok::Rbrack)]);
            }

            Expr::Call(x) => {
                self.format_expr_prec(&x.fun, HIGHEST_PREC);
                self.print(&[Item::Pos(x.lparen), Item::Tok(Tok::Lparen)]);
                self.expr_list(&x.args, ListMode::COMMA_SEP);
                self.print(&[Item::Pos(x.rparen), Item::Tok(Tok::Rparen)]);
            }

            Expr::Composite(x) => {
                self.format_expr_prec(&x.typ, HIGHEST_PREC);
                self.print(&[Item::Pos(x.lbrace), Item::Tok(Tok::Lbrace)]);
                self.expr_list(&x.elts, ListMode::COMMA_SEP | ListMode::COMMA_TERM);
                self.print(&[Item::Pos(x.rbrace), Item::Tok(Tok::Rbrace)]);
            }

            Expr::Ellipsis(_) => self.print(&[Item::Tok(Tok::Ellipsis)]),

            Expr::ArrayType(x) => {
                self.print(&[Item::Tok(Tok::Lbrack)]);
                if let Some(len) = &x.len {
                    self.format_expr(len);
                }
                self.print(&[Item::Tok(Tok::Rbrack)]);
                opt_semi = self.format_expr(&x.elt);
            }

            Expr::StructType(x) => {
                self.print(&[Item::Tok(Tok::Struct)]);
                self.format_field_list(x.lbrace, &x.fields, x.rbrace, x.incomplete, true);
                opt_semi = true;
            }

            Expr::FuncType(x) => {
                self.print(&[Item::Tok(Tok::Func)]);
                opt_semi = self.format_signature(&x.params, x.results.as_deref());
            }

            Expr::InterfaceType(x) => {
                self.print(&[Item::Tok(Tok::Interface)]);
                self.format_field_list(x.lbrace, &x.methods, x.rbrace, x.incomplete, false);
                opt_semi = true;
            }

            Expr::MapType(x) => {
                self.print(&[Item::Tok(Tok::Map), Item::Tok(Tok::Lbrack)]);
                self.format_expr(&x.key);
                self.print(&[Item::Tok(Tok::Rbrack)]);
                opt_semi = self.format_expr(&x.value);
            }

            Expr::ChanType(x) => {
                match x.dir {
                    ChanDir::Both => self.print(&[Item::Tok(Tok::Chan)]),
                    ChanDir::Recv => self.print(&[Item::Tok(Tok::Arrow), Item::Tok(Tok::Chan)]),
                    ChanDir::Send => self.print(&[Item::Tok(Tok::Chan), Item::Tok(Tok::Arrow)]),
                }
                self.print(&[BLANK]);
                opt_semi = self.format_expr(&x.value);
            }
        }

        opt_semi
    }

    /// Returns true if a separating semicolon is optional afterwards.
    pub(crate) fn format_expr(&mut self, x: &Expr) -> bool {
        self.format_expr_prec(x, LOWEST_PREC)
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Print the statement list indented, without a newline after the last
    /// statement.
    fn format_stmt_list(&mut self, list: &[Stmt]) {
        if !list.is_empty() {
            self.print(&[Item::Indent(1), FORMFEED]); // the next lines have different structure
            let mut opt_semi = false;
            for (i, s) in list.iter().enumerate() {
                if i > 0 {
                    if !opt_semi {
                        self.print(&[Item::Tok(Tok::Semicolon)]);
                    }
                    self.print(&[NEWLINE]);
                }
                opt_semi = self.format_stmt(s);
            }
            if !opt_semi {
                self.print(&[Item::Tok(Tok::Semicolon)]);
            }
            self.print(&[Item::Indent(-1)]);
        }
    }

    pub(crate) fn format_block(&mut self, s: &BlockStmt) {
        self.print(&[Item::Pos(s.pos), Item::Tok(Tok::Lbrace)]);
        if !s.list.is_empty() {
            self.format_stmt_list(&s.list);
            self.print(&[FORMFEED]);
        }
        self.print(&[Item::Pos(s.rbrace), Item::Tok(Tok::Rbrace)]);
    }

    /// Like [`Printer::format_block`], but every clause starts behind a
    /// formfeed so the aligner treats each case as its own section.
    fn format_switch_block(&mut self, s: &BlockStmt) {
        self.print(&[Item::Pos(s.pos), Item::Tok(Tok::Lbrace)]);
        if !s.list.is_empty() {
            for clause in &s.list {
                // each clause is a case, type-case, or comm clause
                self.print(&[FORMFEED]);
                self.format_stmt(clause);
            }
            self.print(&[FORMFEED]);
        }
        self.print(&[Item::Pos(s.rbrace), Item::Tok(Tok::Rbrace)]);
    }

    fn format_control_clause(
        &mut self,
        is_for: bool,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        post: Option<&Stmt>,
    ) {
        if init.is_none() && post.is_none() {
            // no semicolons required
            if let Some(cond) = cond {
                self.print(&[BLANK]);
                self.format_expr(cond);
            }
        } else {
            // All semicolons required; they are not separators here, so
            // print them explicitly.
            self.print(&[BLANK]);
            if let Some(init) = init {
                self.format_stmt(init);
            }
            self.print(&[Item::Tok(Tok::Semicolon), BLANK]);
            if let Some(cond) = cond {
                self.format_expr(cond);
            }
            if is_for {
                self.print(&[Item::Tok(Tok::Semicolon), BLANK]);
                if let Some(post) = post {
                    self.format_stmt(post);
                }
            }
        }
    }

    /// Returns true if a separating semicolon is optional afterwards.
    #[expect(clippy::too_many_lines, reason = "match on all Stmt variants")]
    pub(crate) fn format_stmt(&mut self, stmt: &Stmt) -> bool {
        self.print(&[Item::Pos(stmt.pos())]);

        let mut opt_semi = false;
        match stmt {
            Stmt::Bad(_) => self.print(&[Item::Str("BadStmt")]),

            Stmt::Decl(s) => {
                let (comment, os) = self.format_decl(&s.decl);
                opt_semi = os;
                if comment.is_some() {
                    // Parsers do not attach line comments to declarations
                    // in statement position; print it anyway and continue
                    // gracefully.
                    #[cfg(debug_assertions)]
                    eprintln!(
                        "froe-printer: line comment attached to a declaration in a statement list"
                    );
                    self.format_line_comment(comment);
                    self.print(&[NEWLINE]);
                }
            }

            Stmt::Empty(_) => {}

            Stmt::Labeled(s) => {
                // the label sits one level left of the statement body
                self.print(&[Item::Indent(-1), FORMFEED]);
                self.format_ident(&s.label);
                self.print(&[Item::Tok(Tok::Colon), TAB, Item::Indent(1), FORMFEED]);
                opt_semi = self.format_stmt(&s.stmt);
            }

            Stmt::Expr(s) => {
                self.format_expr(&s.x);
            }

            Stmt::IncDec(s) => {
                self.format_expr(&s.x);
                self.print(&[Item::Tok(s.tok)]);
            }

            Stmt::Assign(s) => {
                self.expr_list(&s.lhs, ListMode::COMMA_SEP);
                self.print(&[BLANK, Item::Pos(s.tok_pos), Item::Tok(s.tok)]);
                self.expr_list(&s.rhs, ListMode::BLANK_START | ListMode::COMMA_SEP);
            }

            Stmt::Go(s) => {
                self.print(&[Item::Tok(Tok::Go), BLANK]);
                self.format_expr(&s.call);
            }

            Stmt::Defer(s) => {
                self.print(&[Item::Tok(Tok::Defer), BLANK]);
                self.format_expr(&s.call);
            }

            Stmt::Return(s) => {
                self.print(&[Item::Tok(Tok::Return)]);
                if !s.results.is_empty() {
                    self.expr_list(&s.results, ListMode::BLANK_START | ListMode::COMMA_SEP);
                }
            }

            Stmt::Branch(s) => {
                self.print(&[Item::Tok(s.tok)]);
                if let Some(label) = &s.label {
                    self.print(&[BLANK]);
                    self.format_ident(label);
                }
            }

            Stmt::Block(s) => {
                self.format_block(s);
                opt_semi = true;
            }

            Stmt::If(s) => {
                self.print(&[Item::Tok(Tok::If)]);
                self.format_control_clause(false, s.init.as_deref(), s.cond.as_deref(), None);
                self.print(&[BLANK]);
                self.format_block(&s.body);
                opt_semi = true;
                if let Some(else_stmt) = &s.else_stmt {
                    self.print(&[BLANK, Item::Tok(Tok::Else), BLANK]);
                    opt_semi = self.format_stmt(else_stmt);
                }
            }

            Stmt::Case(s) => {
                if s.values.is_empty() {
                    self.print(&[Item::Tok(Tok::Default)]);
                } else {
                    self.print(&[Item::Tok(Tok::Case)]);
                    self.expr_list(&s.values, ListMode::BLANK_START | ListMode::COMMA_SEP);
                }
                self.print(&[Item::Pos(s.colon), Item::Tok(Tok::Colon)]);
                self.format_stmt_list(&s.body);
            }

            Stmt::Switch(s) => {
                self.print(&[Item::Tok(Tok::Switch)]);
                self.format_control_clause(false, s.init.as_deref(), s.tag.as_deref(), None);
                self.print(&[BLANK]);
                self.format_switch_block(&s.body);
                opt_semi = true;
            }

            Stmt::TypeCase(s) => {
                if s.types.is_empty() {
                    self.print(&[Item::Tok(Tok::Default)]);
                } else {
                    self.print(&[Item::Tok(Tok::Case)]);
                    self.expr_list(&s.types, ListMode::BLANK_START | ListMode::COMMA_SEP);
                }
                self.print(&[Item::Pos(s.colon), Item::Tok(Tok::Colon)]);
                self.format_stmt_list(&s.body);
            }

            Stmt::TypeSwitch(s) => {
                self.print(&[Item::Tok(Tok::Switch)]);
                if let Some(init) = &s.init {
                    self.print(&[BLANK]);
                    self.format_stmt(init);
                    self.print(&[Item::Tok(Tok::Semicolon)]);
                }
                self.print(&[BLANK]);
                self.format_stmt(&s.assign);
                self.print(&[BLANK]);
                self.format_switch_block(&s.body);
                opt_semi = true;
            }

            Stmt::Comm(s) => {
                match &s.rhs {
                    Some(rhs) => {
                        self.print(&[Item::Tok(Tok::Case), BLANK]);
                        if let Some(lhs) = &s.lhs {
                            self.format_expr(lhs);
                            self.print(&[BLANK, Item::Tok(s.tok), BLANK]);
                        }
                        self.format_expr(rhs);
                    }
                    None => self.print(&[Item::Tok(Tok::Default)]),
                }
                self.print(&[Item::Pos(s.colon), Item::Tok(Tok::Colon)]);
                self.format_stmt_list(&s.body);
            }

            Stmt::Select(s) => {
                self.print(&[Item::Tok(Tok::Select), BLANK]);
                self.format_switch_block(&s.body);
                opt_semi = true;
            }

            Stmt::For(s) => {
                self.print(&[Item::Tok(Tok::For)]);
                self.format_control_clause(
                    true,
                    s.init.as_deref(),
                    s.cond.as_deref(),
                    s.post.as_deref(),
                );
                self.print(&[BLANK]);
                self.format_block(&s.body);
                opt_semi = true;
            }

            Stmt::Range(s) => {
                self.print(&[Item::Tok(Tok::For), BLANK]);
                self.format_expr(&s.key);
                if let Some(value) = &s.value {
                    self.print(&[Item::Tok(Tok::Comma), BLANK]);
                    self.format_expr(value);
                }
                self.print(&[
                    BLANK,
                    Item::Pos(s.tok_pos),
                    Item::Tok(s.tok),
                    BLANK,
                    Item::Tok(Tok::Range),
                    BLANK,
                ]);
                self.format_expr(&s.x);
                self.print(&[BLANK]);
                self.format_block(&s.body);
                opt_semi = true;
            }
        }

        opt_semi
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    /// Print one entry of a generic declaration. `m` is the group's layout
    /// count (imports with a rename, or values with an explicit type) and
    /// `n` the number of entries in the group. Returns the trailing line
    /// comment, if any, for the caller to place after the separator.
    fn format_spec<'n>(
        &mut self,
        spec: &'n Spec,
        m: usize,
        n: usize,
    ) -> (Option<&'n CommentGroup>, bool) {
        let sep = separator(n > 1);

        let comment;
        let mut opt_semi = false;
        match spec {
            Spec::Import(s) => {
                self.format_lead_comment(s.doc.as_ref());
                if m > 0 {
                    // at least one entry with a rename
                    if let Some(name) = &s.name {
                        self.format_ident(name);
                    }
                    self.print(&[sep.clone()]);
                }
                self.string_list(&s.path);
                comment = s.comment.as_ref();
            }

            Spec::Value(s) => {
                self.format_lead_comment(s.doc.as_ref());
                self.ident_list(&s.names, ListMode::COMMA_SEP);
                if m > 0 {
                    // at least one entry with a type
                    if let Some(typ) = &s.typ {
                        self.print(&[sep.clone()]);
                        opt_semi = self.format_expr(typ);
                    } else if !s.values.is_empty() {
                        self.print(&[sep.clone()]);
                    }
                }
                if !s.values.is_empty() {
                    self.print(&[sep.clone(), Item::Tok(Tok::Assign)]);
                    self.expr_list(&s.values, ListMode::BLANK_START | ListMode::COMMA_SEP);
                    opt_semi = false;
                }
                comment = s.comment.as_ref();
            }

            Spec::Type(s) => {
                self.format_lead_comment(s.doc.as_ref());
                self.format_ident(&s.name);
                self.print(&[sep.clone()]);
                opt_semi = self.format_expr(&s.typ);
                comment = s.comment.as_ref();
            }
        }

        (comment, opt_semi)
    }

    /// Returns the trailing line comment, if any, and whether a separating
    /// semicolon is optional afterwards.
    pub(crate) fn format_decl<'n>(&mut self, decl: &'n Decl) -> (Option<&'n CommentGroup>, bool) {
        let mut comment = None;
        let mut opt_semi = false;
        match decl {
            Decl::Bad(d) => self.print(&[Item::Pos(d.pos), Item::Str("BadDecl")]),

            Decl::Gen(d) => {
                self.format_lead_comment(d.doc.as_ref());
                self.print(&[Item::LineTag(d.pos), Item::Tok(d.tok), BLANK]);

                // layout count for the group's alignment column
                let m = match d.tok {
                    Tok::Import => count_import_renames(&d.specs),
                    Tok::Const | Tok::Var => count_value_types(&d.specs),
                    _ => 0,
                };

                if d.lparen.is_valid() {
                    // group of parenthesized declarations
                    self.print(&[Item::Pos(d.lparen), Item::Tok(Tok::Lparen)]);
                    if !d.specs.is_empty() {
                        self.print(&[Item::Indent(1), FORMFEED]);
                        for (i, s) in d.specs.iter().enumerate() {
                            if i > 0 {
                                self.print(&[Item::Tok(Tok::Semicolon)]);
                                self.format_line_comment(comment);
                                self.print(&[NEWLINE]);
                            }
                            let (c, _) = self.format_spec(s, m, d.specs.len());
                            comment = c;
                        }
                        self.print(&[Item::Tok(Tok::Semicolon)]);
                        self.format_line_comment(comment);
                        self.print(&[Item::Indent(-1), FORMFEED]);
                    }
                    self.print(&[Item::Pos(d.rparen), Item::Tok(Tok::Rparen)]);
                    comment = None; // already printed
                    opt_semi = true;
                } else {
                    // single declaration
                    let (c, os) = self.format_spec(&d.specs[0], m, 1);
                    comment = c;
                    opt_semi = os;
                }
            }

            Decl::Func(d) => {
                self.format_lead_comment(d.doc.as_ref());
                self.print(&[Item::LineTag(d.pos), Item::Tok(Tok::Func), BLANK]);
                if let Some(recv) = &d.recv {
                    // method: print the receiver
                    self.print(&[Item::Tok(Tok::Lparen)]);
                    if let Some(name) = recv.names.first() {
                        self.format_ident(name);
                        self.print(&[BLANK]);
                    }
                    self.format_expr(&recv.typ);
                    self.print(&[Item::Tok(Tok::Rparen), BLANK]);
                }
                self.format_ident(&d.name);
                self.format_signature(&d.typ.params, d.typ.results.as_deref());
                if let Some(body) = &d.body {
                    self.print(&[BLANK]);
                    self.level += 1; // adjust nesting level for the body
                    self.format_block(body);
                    self.level -= 1;
                }
            }
        }

        (comment, opt_semi)
    }

    // ------------------------------------------------------------------
    // Files
    // ------------------------------------------------------------------

    pub(crate) fn format_file(&mut self, f: &File) {
        self.format_lead_comment(f.doc.as_ref());
        self.print(&[Item::Pos(f.pos), Item::Tok(Tok::Package), BLANK]);
        self.format_ident(&f.name);

        for d in &f.decls {
            self.print(&[NEWLINE, NEWLINE]);
            let (comment, _) = self.format_decl(d);
            self.format_line_comment(comment);
        }

        self.print(&[NEWLINE]);
    }
}
