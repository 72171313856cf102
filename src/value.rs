//! Runtime values and the callable seam.
//!
//! `Value` is a closed union: every runtime value the interpreter can produce
//! is one of these variants, and evaluation dispatch is exhaustive matching.
//! Functions and natives are both invoked through the [`Callable`] trait so
//! the call expression has a single arity/invoke path.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::FunctionDecl;
use crate::environment::Environment;
use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::token::Token;

/// Anything invocable from zlox code: an arity to check and a call hook.
pub trait Callable {
    /// Display name used in diagnostics and value printing.
    fn name(&self) -> &str;

    /// Number of arguments the callee expects. Checked before `call`.
    fn arity(&self) -> usize;

    /// Invoke with already‑evaluated arguments. `paren` is the call site's
    /// closing parenthesis, used to anchor runtime errors.
    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value>;
}

/// A builtin implemented in Rust as a plain function pointer.
///
/// Builtins receive the interpreter so they can reach its output sink and
/// input source (`flush()`, `input()`).
#[derive(Debug, Clone)]
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&mut Interpreter, &[Value]) -> Result<Value>,
}

impl Callable for NativeFunction {
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        _paren: &Token,
    ) -> Result<Value> {
        (self.func)(interpreter, &arguments)
    }
}

/// A user‑declared function bundled with the environment it closed over.
///
/// `closure` is the environment that was current at declaration time, not at
/// call time. Calls build their locals as a child of it, which is what makes
/// counters shared between two closures from the same factory call.
pub struct LoxFunction {
    pub declaration: Rc<FunctionDecl>,
    pub closure: Rc<RefCell<Environment>>,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: Rc<RefCell<Environment>>) -> Self {
        Self {
            declaration,
            closure,
        }
    }
}

impl Callable for LoxFunction {
    fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value> {
        interpreter.call_function(self, arguments, paren)
    }
}

// The closure chain can point back at an environment holding this function,
// so a derived Debug would recurse forever.
impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.declaration.name.lexeme)
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
    Native(NativeFunction),
    Function(Rc<LoxFunction>),
}

impl Value {
    /// Everything is truthy except `nil` and `false`. Zero and the empty
    /// string are truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Human‑readable type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Native(_) => "native function",
            Value::Function(_) => "function",
        }
    }
}

impl PartialEq for Value {
    /// Equality never coerces: values of different types are unequal.
    /// Functions compare by identity, natives by name.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,

            (Value::Bool(a), Value::Bool(b)) => a == b,

            (Value::Number(a), Value::Number(b)) => a == b,

            (Value::Str(a), Value::Str(b)) => a == b,

            (Value::Native(a), Value::Native(b)) => a.name == b.name,

            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),

            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::Str(s) => write!(f, "{}", s),

            Value::Native(native) => write!(f, "<native fn {}>", native.name),

            Value::Function(function) => write!(f, "<fn {}>", function.declaration.name.lexeme),
        }
    }
}
