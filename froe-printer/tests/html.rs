//! HTML mode: entity escaping and per-line anchors.

use froe_printer::{print, Mode, Node};
use froe_syntax::ast::{
    BinaryExpr, Decl, Expr, File, GenDecl, Ident, Spec, ValueSpec,
};
use froe_syntax::{Pos, Tok};
use similar_asserts::assert_eq;

fn at(line: usize) -> Pos {
    Pos::new(line * 100, line, 1)
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

fn render(node: Node<'_>, mode: Mode) -> String {
    let mut out = Vec::new();
    print(&mut out, node, mode, 8).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn comparison_operators_are_escaped() {
    let x = Expr::Binary(BinaryExpr {
        x: Box::new(Expr::Ident(id("a", 1))),
        op_pos: at(1),
        op: Tok::Lss,
        y: Box::new(Expr::Ident(id("b", 1))),
    });
    assert_eq!(
        render(Node::Expr(&x), Mode::GEN_HTML | Mode::RAW_FORMAT),
        "a &lt; b"
    );
}

#[test]
fn declarations_get_line_anchors() {
    let f = File {
        doc: None,
        pos: at(1),
        name: id("p", 1),
        decls: vec![var_decl("x", 3), var_decl("y", 5)],
        comments: vec![],
    };
    assert_eq!(
        render(Node::File(&f), Mode::GEN_HTML | Mode::RAW_FORMAT),
        "package p\n\n<a id=\"L3\"></a>var x int\n\n<a id=\"L5\"></a>var y int\n"
    );
}

#[test]
fn anchor_line_numbers_are_strictly_increasing() {
    let f = File {
        doc: None,
        pos: at(1),
        name: id("p", 1),
        decls: vec![var_decl("a", 3), var_decl("b", 4), var_decl("c", 6)],
        comments: vec![],
    };
    let got = render(Node::File(&f), Mode::GEN_HTML | Mode::RAW_FORMAT);
    let lines: Vec<usize> = got
        .match_indices("<a id=\"L")
        .map(|(i, _)| {
            let rest = &got[i + 8..];
            let end = rest.find('"').unwrap();
            rest[..end].parse().unwrap()
        })
        .collect();
    assert_eq!(lines, vec![3, 4, 6]);
    assert!(lines.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn no_raw_markup_characters_outside_tags_and_entities() {
    let x = Expr::Binary(BinaryExpr {
        x: Box::new(Expr::Binary(BinaryExpr {
            x: Box::new(Expr::Ident(id("a", 3))),
            op_pos: at(3),
            op: Tok::Shl,
            y: Box::new(Expr::Ident(id("b", 3))),
        })),
        op_pos: at(3),
        op: Tok::Gtr,
        y: Box::new(Expr::Ident(id("c", 3))),
    });
    let got = render(Node::Expr(&x), Mode::GEN_HTML | Mode::RAW_FORMAT);
    assert_eq!(got, "a&lt;&lt;b &gt; c");

    let stripped = got
        .replace("&amp;", "")
        .replace("&lt;", "")
        .replace("&gt;", "");
    assert!(!stripped.contains('&') && !stripped.contains('<') && !stripped.contains('>'));
}

#[test]
fn aligned_html_output_keeps_anchors_and_escapes() {
    let f = File {
        doc: None,
        pos: at(1),
        name: id("p", 1),
        decls: vec![var_decl("x", 3)],
        comments: vec![],
    };
    assert_eq!(
        render(Node::File(&f), Mode::GEN_HTML),
        "package p\n\n<a id=\"L3\"></a>var x int\n"
    );
}
