//! Centralised error hierarchy for the **zlox interpreter**.
//!
//! All subsystems (scanner, parser, runtime, CLI) must convert their internal
//! failure modes into one of the variants defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate and ergonomic
//! inter‑operation with `anyhow`, while still preserving rich diagnostic
//! detail.
//!
//! The module **does not** print diagnostics itself; the CLI renders errors
//! (including the caret line derived from [`LoxError::offset`]).

use std::io;
use thiserror::Error;

use log::info;

use crate::token::Token;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source position information.
    #[error("[offset {offset}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 0‑based byte offset where the error occurred.
        offset: usize,
    },

    /// Syntactic (parser) error, anchored at the offending token.
    #[error("[offset {}] Error: {message}", .token.offset)]
    Parse { message: String, token: Token },

    /// Reading a name that no scope in the chain defines.
    #[error("Undefined variable '{name}'.")]
    UndefinedVariable { name: String, token: Token },

    /// Declaring a name twice in the same scope.
    #[error("Variable '{name}' is already defined in this scope.")]
    Redefinition { name: String, token: Token },

    /// Operand or callee of the wrong type.
    #[error("{message}")]
    Type { message: String, token: Token },

    /// Calling a function with the wrong number of arguments.
    #[error("Expected {expected} arguments but got {got}.")]
    Arity {
        expected: usize,
        got: usize,
        token: Token,
    },

    /// Call nesting exceeded the interpreter's depth limit.
    #[error("Stack overflow.")]
    StackOverflow { token: Token },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(offset: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: offset={}, msg={}", offset, message);

        LoxError::Lex { message, offset }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Parse error: offset={}, msg={}",
            token.offset, message
        );

        LoxError::Parse {
            message,
            token: token.clone(),
        }
    }

    /// Reading an undefined variable. The name is taken from the token.
    pub fn undefined_variable(token: &Token) -> Self {
        info!(
            "Creating UndefinedVariable error: name={}, offset={}",
            token.lexeme, token.offset
        );

        LoxError::UndefinedVariable {
            name: token.lexeme.clone(),
            token: token.clone(),
        }
    }

    /// Re‑declaring a name in a scope that already holds it.
    pub fn redefinition(token: &Token) -> Self {
        info!(
            "Creating Redefinition error: name={}, offset={}",
            token.lexeme, token.offset
        );

        LoxError::Redefinition {
            name: token.lexeme.clone(),
            token: token.clone(),
        }
    }

    /// Type mismatch at `token`, described by `msg`.
    pub fn type_error<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Type error: offset={}, msg={}",
            token.offset, message
        );

        LoxError::Type {
            message,
            token: token.clone(),
        }
    }

    /// Argument count mismatch at the call site's closing paren.
    pub fn arity(token: &Token, expected: usize, got: usize) -> Self {
        info!(
            "Creating Arity error: expected={}, got={}, offset={}",
            expected, got, token.offset
        );

        LoxError::Arity {
            expected,
            got,
            token: token.clone(),
        }
    }

    /// Call depth limit exceeded at the call site's closing paren.
    pub fn stack_overflow(token: &Token) -> Self {
        info!("Creating StackOverflow error: offset={}", token.offset);

        LoxError::StackOverflow {
            token: token.clone(),
        }
    }

    /// Byte offset this error points at, when it carries one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            LoxError::Lex { offset, .. } => Some(*offset),
            LoxError::Parse { token, .. }
            | LoxError::UndefinedVariable { token, .. }
            | LoxError::Redefinition { token, .. }
            | LoxError::Type { token, .. }
            | LoxError::Arity { token, .. }
            | LoxError::StackOverflow { token } => Some(token.offset),
            LoxError::Io(_) => None,
        }
    }

    /// True for errors raised during evaluation (as opposed to scanning
    /// or parsing). The CLI maps these to exit code 70.
    pub fn is_runtime(&self) -> bool {
        !matches!(self, LoxError::Lex { .. } | LoxError::Parse { .. })
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
