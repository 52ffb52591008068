//! Comment interleaving through the public entry point: ordering,
//! adjacency, and vertical-space capping.

use froe_printer::{print, Mode, Node};
use froe_syntax::ast::{
    Comment, CommentGroup, Decl, Expr, File, GenDecl, Ident, Spec, ValueSpec,
};
use froe_syntax::{Pos, Tok};
use similar_asserts::assert_eq;

fn pos(offset: usize, line: usize, column: usize) -> Pos {
    Pos::new(offset, line, column)
}

fn at(line: usize) -> Pos {
    pos(line * 100, line, 1)
}

fn id(name: &str, line: usize) -> Ident {
    Ident {
        pos: at(line),
        name: name.into(),
    }
}

fn var_decl(name: &str, line: usize) -> Decl {
    Decl::Gen(GenDecl {
        doc: None,
        pos: at(line),
        tok: Tok::Var,
        lparen: Pos::default(),
        specs: vec![Spec::Value(ValueSpec {
            doc: None,
            names: vec![id(name, line)],
            typ: Some(Expr::Ident(id("int", line))),
            values: vec![],
            comment: None,
        })],
        rparen: Pos::default(),
    })
}

fn comment(text: &str, p: Pos) -> CommentGroup {
    CommentGroup {
        list: vec![Comment {
            pos: p,
            text: text.into(),
        }],
    }
}

fn render(f: &File) -> String {
    let mut out = Vec::new();
    print(&mut out, Node::File(f), Mode::RAW_FORMAT, 8).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn comments_come_out_in_source_order() {
    let f = File {
        doc: None,
        pos: at(1),
        name: id("p", 1),
        decls: vec![var_decl("x", 5)],
        comments: vec![
            comment("// first", at(3)),
            comment("// second", at(4)),
        ],
    };
    assert_eq!(
        render(&f),
        "package p\n\n// first\n// second\nvar x int\n"
    );
}

#[test]
fn doc_comment_stays_adjacent() {
    let f = File {
        doc: None,
        pos: at(1),
        name: id("p", 1),
        decls: vec![var_decl("x", 4)],
        comments: vec![comment("// doc", at(3))],
    };
    // one newline between the comment and its declaration, regardless of
    // the two queued between declarations
    assert_eq!(render(&f), "package p\n\n// doc\nvar x int\n");
}

#[test]
fn same_line_comment_is_tab_separated() {
    let f = File {
        doc: None,
        pos: at(1),
        name: id("p", 1),
        decls: vec![var_decl("x", 3), var_decl("y", 5)],
        comments: vec![comment("// c", pos(320, 3, 20))],
    };
    assert_eq!(
        render(&f),
        "package p\n\nvar x int\t// c\n\nvar y int\n"
    );
}

#[test]
fn vertical_space_around_comments_is_capped() {
    let f = File {
        doc: None,
        pos: at(1),
        name: id("p", 1),
        decls: vec![var_decl("x", 3), var_decl("y", 12)],
        comments: vec![comment("// far", at(10))],
    };
    let got = render(&f);
    assert_eq!(
        got,
        "package p\n\nvar x int\n\n\n// far\n\nvar y int\n"
    );
    assert!(!got.contains("\n\n\n\n"));
}

#[test]
fn general_comment_keeps_its_blank_lines() {
    let f = File {
        doc: None,
        pos: at(1),
        name: id("p", 1),
        decls: vec![var_decl("x", 3), var_decl("y", 7)],
        comments: vec![comment("/* c */", at(5))],
    };
    assert_eq!(
        render(&f),
        "package p\n\nvar x int\n\n/* c */\n\nvar y int\n"
    );
}

#[test]
fn comments_after_the_last_token_are_flushed() {
    let f = File {
        doc: None,
        pos: at(1),
        name: id("p", 1),
        decls: vec![var_decl("x", 3)],
        comments: vec![comment("// tail", at(5))],
    };
    assert_eq!(render(&f), "package p\n\nvar x int\n\n// tail\n");
}

#[test]
fn every_comment_before_a_token_is_emitted() {
    // two groups straddling a declaration
    let f = File {
        doc: None,
        pos: at(1),
        name: id("p", 1),
        decls: vec![var_decl("x", 4), var_decl("y", 8)],
        comments: vec![comment("// a", at(3)), comment("// b", at(6))],
    };
    let got = render(&f);
    let a = got.find("// a").unwrap();
    let x = got.find("var x").unwrap();
    let b = got.find("// b").unwrap();
    let y = got.find("var y").unwrap();
    assert!(a < x && x < b && b < y);
}
