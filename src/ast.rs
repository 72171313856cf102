//! Syntax tree produced by the parser and walked by the interpreter.
//!
//! Expressions and statements are closed enums, so evaluation dispatch is a
//! single exhaustive `match`. `for` loops never appear here: the parser
//! desugars them into `Block`/`While` before this tree is built.

use std::rc::Rc;

use crate::token::Token;

#[derive(Debug, Clone)]
pub enum Expr {
    // Used to parse Binary expressions
    Binary(Box<Expr>, Token, Box<Expr>),

    // Used to parse 'and' / 'or' with short-circuit evaluation
    Logical(Box<Expr>, Token, Box<Expr>),

    // Used to parse Unary expressions
    Unary(Token, Box<Expr>),

    // Used to parse Literal expressions (NUMBER, STRING, TRUE, FALSE, NIL)
    Literal(Token),

    // Used to parse parenthesized grouped expressions
    Grouping(Box<Expr>),

    // Used to parse variable reads
    Variable(Token),

    // Used to parse assignments
    Assign(Token, Box<Expr>),

    // Used to parse function calls; the Token is the closing ')'
    Call(Box<Expr>, Token, Vec<Expr>),
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expression(Expr),

    Print(Expr),

    Var(Token, Option<Expr>),

    Block(Vec<Stmt>),

    If(Expr, Box<Stmt>, Option<Box<Stmt>>),

    While(Expr, Box<Stmt>),

    // Shared with every closure capturing the function, hence the Rc
    Function(Rc<FunctionDecl>),

    // 'return' keyword token (for diagnostics) and optional value
    Return(Token, Option<Expr>),
}

/// A function declaration: name, parameters, body.
///
/// Declarations are reference‑counted so that the statement tree and any
/// number of closure values can point at the same node without cloning the
/// body.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}
