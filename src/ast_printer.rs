use crate::ast::{Expr, Stmt};
use crate::token::TokenType;

/// Converts syntax trees to a parenthesised prefix form, e.g.
/// `(+ 1.0 (* 2.0 3.0))`. Used by the `parse` subcommand, the REPL's
/// `.prntast` toggle, and parser tests.
pub struct AstPrinter;

impl AstPrinter {
    /// Render a whole program, one statement per line.
    pub fn print_program(statements: &[Stmt]) -> String {
        let rendered: Vec<String> = statements.iter().map(Self::print_stmt).collect();

        rendered.join("\n")
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(expr {})", Self::print(expr)),

            Stmt::Print(expr) => format!("(print {})", Self::print(expr)),

            Stmt::Var(name, Some(init)) => {
                format!("(var {} = {})", name.lexeme, Self::print(init))
            }

            Stmt::Var(name, None) => format!("(var {})", name.lexeme),

            Stmt::Block(statements) => {
                let mut s = String::from("(block");
                for statement in statements {
                    s.push(' ');
                    s.push_str(&Self::print_stmt(statement));
                }
                s.push(')');
                s
            }

            Stmt::If(condition, then_branch, Some(else_branch)) => format!(
                "(if {} {} {})",
                Self::print(condition),
                Self::print_stmt(then_branch),
                Self::print_stmt(else_branch)
            ),

            Stmt::If(condition, then_branch, None) => format!(
                "(if {} {})",
                Self::print(condition),
                Self::print_stmt(then_branch)
            ),

            Stmt::While(condition, body) => format!(
                "(while {} {})",
                Self::print(condition),
                Self::print_stmt(body)
            ),

            Stmt::Function(decl) => {
                let params: Vec<&str> = decl
                    .params
                    .iter()
                    .map(|param| param.lexeme.as_str())
                    .collect();

                let mut s = format!("(fun {} ({})", decl.name.lexeme, params.join(" "));
                for statement in &decl.body {
                    s.push(' ');
                    s.push_str(&Self::print_stmt(statement));
                }
                s.push(')');
                s
            }

            Stmt::Return(_, Some(value)) => format!("(return {})", Self::print(value)),

            Stmt::Return(_, None) => "(return)".into(),
        }
    }

    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(token) => match &token.token_type {
                TokenType::TRUE => "true".into(),

                TokenType::FALSE => "false".into(),

                TokenType::NIL => "nil".into(),

                TokenType::STRING(s) => s.clone(),

                TokenType::NUMBER(n) => {
                    if n.fract() == 0.0 {
                        // 3 → 3.0
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }

                other => unreachable!("Invalid literal token: {:?}", other),
            },

            // ── grouping ────────────────────────────────────────────────
            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            // ── unary operator ──────────────────────────────────────────
            Expr::Unary(operator, right) => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            // ── binary / logical operators ──────────────────────────────
            Expr::Binary(left, operator, right) | Expr::Logical(left, operator, right) => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            // ── variable / assign / call ────────────────────────────────
            Expr::Variable(name) => name.lexeme.clone(),

            Expr::Assign(name, value) => format!("(= {} {})", name.lexeme, Self::print(value)),

            Expr::Call(callee, _, arguments) => {
                let mut s = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }
        }
    }
}
