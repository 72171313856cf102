use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, Stmt};
use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use crate::value::{Callable, LoxFunction, NativeFunction, Value};

/// Result of executing one statement: either fall through to the next, or
/// unwind the enclosing function call with a `return` value.
///
/// `return` is ordinary control flow, not an error: statement execution
/// reports it in its result type and every compound statement propagates it
/// upward until a function call (or the top level) consumes it.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

/// Deepest user‑function call nesting before `Stack overflow.` is raised.
pub const MAX_CALL_DEPTH: usize = 256;

pub struct Interpreter {
    environment: Rc<RefCell<Environment>>,
    sink: Rc<RefCell<dyn Write>>,
    input: Rc<RefCell<dyn BufRead>>,
    depth: usize,
}

impl Interpreter {
    /// Creates a new Interpreter whose globals hold the native functions
    /// `clock`, `flush`, and `input`.
    ///
    /// Program output goes to `sink` and `input()` reads from `input`, so
    /// the CLI passes stdout/stdin while tests pass in-memory buffers.
    pub fn new(sink: Rc<RefCell<dyn Write>>, input: Rc<RefCell<dyn BufRead>>) -> Self {
        info!("Initializing Interpreter");

        let environment: Rc<RefCell<Environment>> = Rc::new(RefCell::new(Environment::new()));

        {
            let mut globals = environment.borrow_mut();

            let natives = [
                NativeFunction {
                    name: "clock",
                    arity: 0,
                    func: native_clock,
                },
                NativeFunction {
                    name: "flush",
                    arity: 0,
                    func: native_flush,
                },
                NativeFunction {
                    name: "input",
                    arity: 0,
                    func: native_input,
                },
            ];

            for native in natives {
                debug!("Defining native function '{}'", native.name);

                let name: Token = Token::new(TokenType::IDENTIFIER, native.name, 0);

                globals
                    .define(&name, Value::Native(native))
                    .expect("native names are distinct");
            }
        }

        Self {
            environment,
            sink,
            input,
            depth: 0,
        }
    }

    /// Interprets a list of statements (a "program").
    ///
    /// A top‑level `return` simply stops interpretation; its value is
    /// discarded.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            if let Flow::Return(_) = self.execute(stmt)? {
                info!("Top-level return; stopping interpretation");

                return Ok(());
            }
        }

        info!("Interpretation completed successfully");

        Ok(())
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                debug!("Evaluating expression statement");

                self.evaluate(expr)?;

                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                debug!("Evaluating print statement");

                let value: Value = self.evaluate(expr)?;

                writeln!(self.sink.borrow_mut(), "{}", value)?;

                info!("Printed value: {}", value);

                Ok(Flow::Normal)
            }

            Stmt::Var(name, initializer) => {
                debug!("Defining variable '{}'", name.lexeme);

                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(name, value)?;

                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                debug!("Entering block with {} statements", statements.len());

                let child: Rc<RefCell<Environment>> = Rc::new(RefCell::new(
                    Environment::with_enclosing(self.environment.clone()),
                ));

                self.execute_block(statements, child)
            }

            Stmt::If(condition, then_branch, else_branch) => {
                debug!("Evaluating if condition");

                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While(condition, body) => {
                debug!("Entering while loop");

                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }

                info!("Exited while loop");

                Ok(Flow::Normal)
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);

                // The closure is the environment current at declaration time.
                let function: LoxFunction =
                    LoxFunction::new(Rc::clone(declaration), self.environment.clone());

                self.environment
                    .borrow_mut()
                    .define(&declaration.name, Value::Function(Rc::new(function)))?;

                Ok(Flow::Normal)
            }

            Stmt::Return(_keyword, expr) => {
                debug!("Executing return statement");

                let value: Value = match expr {
                    Some(e) => self.evaluate(e)?,
                    None => Value::Nil,
                };

                Ok(Flow::Return(value))
            }
        }
    }

    /// Executes `statements` inside `environment`, restoring the previous
    /// environment afterwards whether the block falls through, returns, or
    /// errors.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<Flow> {
        let previous: Rc<RefCell<Environment>> =
            std::mem::replace(&mut self.environment, environment);

        let mut flow: Result<Flow> = Ok(Flow::Normal);

        for stmt in statements {
            flow = self.execute(stmt);

            if !matches!(flow, Ok(Flow::Normal)) {
                break;
            }
        }

        self.environment = previous;

        flow
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        debug!("Evaluating expression: {:?}", expr);

        match expr {
            Expr::Literal(token) => Ok(Self::evaluate_literal(token)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary(operator, right) => self.evaluate_unary(operator, right),

            Expr::Binary(left, operator, right) => self.evaluate_binary(left, operator, right),

            Expr::Logical(left, operator, right) => self.evaluate_logical(left, operator, right),

            Expr::Variable(name) => {
                debug!("Looking up variable '{}'", name.lexeme);

                self.environment.borrow().get(name)
            }

            Expr::Assign(name, value_expr) => {
                debug!("Assigning to variable '{}'", name.lexeme);

                let value: Value = self.evaluate(value_expr)?;

                self.environment.borrow_mut().assign(name, value.clone())?;

                // Assignment is an expression; it yields the assigned value.
                Ok(value)
            }

            Expr::Call(callee, paren, arguments) => self.evaluate_call(callee, paren, arguments),
        }
    }

    /// Materializes a literal token into a runtime value.
    fn evaluate_literal(token: &Token) -> Value {
        match &token.token_type {
            TokenType::NUMBER(n) => Value::Number(*n),
            TokenType::STRING(s) => Value::Str(s.clone()),
            TokenType::TRUE => Value::Bool(true),
            TokenType::FALSE => Value::Bool(false),
            TokenType::NIL => Value::Nil,
            other => unreachable!("Invalid literal token: {:?}", other),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        debug!("Evaluating unary operation: {}", operator.lexeme);

        let value: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                other => Err(LoxError::type_error(
                    operator,
                    format!("Operand must be a number, got {}.", other.type_name()),
                )),
            },

            TokenType::BANG => Ok(Value::Bool(!value.is_truthy())),

            _ => unreachable!("Invalid unary operator: {}", operator.lexeme),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        debug!("Evaluating binary operation: {}", operator.lexeme);

        let lhs: Value = self.evaluate(left)?;
        let rhs: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (lhs, rhs) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),

                (a, b) => Err(Self::operand_mismatch(operator, &a, &b)),
            },

            TokenType::MINUS => Self::numeric(operator, lhs, rhs, |a, b| Value::Number(a - b)),

            TokenType::STAR => Self::numeric(operator, lhs, rhs, |a, b| Value::Number(a * b)),

            // IEEE 754 semantics: dividing by zero yields inf/-inf/NaN.
            TokenType::SLASH => Self::numeric(operator, lhs, rhs, |a, b| Value::Number(a / b)),

            TokenType::GREATER => Self::numeric(operator, lhs, rhs, |a, b| Value::Bool(a > b)),

            TokenType::GREATER_EQUAL => {
                Self::numeric(operator, lhs, rhs, |a, b| Value::Bool(a >= b))
            }

            TokenType::LESS => Self::numeric(operator, lhs, rhs, |a, b| Value::Bool(a < b)),

            TokenType::LESS_EQUAL => Self::numeric(operator, lhs, rhs, |a, b| Value::Bool(a <= b)),

            // Equality never coerces; mixed types are simply unequal.
            TokenType::EQUAL_EQUAL => Ok(Value::Bool(lhs == rhs)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(lhs != rhs)),

            _ => unreachable!("Invalid binary operator: {}", operator.lexeme),
        }
    }

    /// Applies `f` to two numeric operands, or reports an operand mismatch.
    fn numeric(
        operator: &Token,
        lhs: Value,
        rhs: Value,
        f: fn(f64, f64) -> Value,
    ) -> Result<Value> {
        match (lhs, rhs) {
            (Value::Number(a), Value::Number(b)) => Ok(f(a, b)),

            (a, b) => Err(Self::operand_mismatch(operator, &a, &b)),
        }
    }

    fn operand_mismatch(operator: &Token, lhs: &Value, rhs: &Value) -> LoxError {
        LoxError::type_error(
            operator,
            format!(
                "Unsupported operand types for '{}': {} and {}.",
                operator.lexeme,
                lhs.type_name(),
                rhs.type_name()
            ),
        )
    }

    /// `and` / `or` short‑circuit and yield the deciding operand's value,
    /// not a coerced boolean.
    fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        debug!("Evaluating logical operation: {}", operator.lexeme);

        let lhs: Value = self.evaluate(left)?;

        match operator.token_type {
            TokenType::OR => {
                if lhs.is_truthy() {
                    Ok(lhs)
                } else {
                    self.evaluate(right)
                }
            }

            TokenType::AND => {
                if lhs.is_truthy() {
                    self.evaluate(right)
                } else {
                    Ok(lhs)
                }
            }

            _ => unreachable!("Invalid logical operator: {}", operator.lexeme),
        }
    }

    /// Evaluates a call: callee first, then arguments left to right, then
    /// arity check, then dispatch through [`Callable`].
    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> Result<Value> {
        debug!("Evaluating function call");

        let callee_value: Value = self.evaluate(callee)?;

        let mut args: Vec<Value> = Vec::with_capacity(arguments.len());

        for argument in arguments {
            args.push(self.evaluate(argument)?);
        }

        let callable: &dyn Callable = match &callee_value {
            Value::Native(native) => native,

            Value::Function(function) => function.as_ref(),

            other => {
                return Err(LoxError::type_error(
                    paren,
                    format!("Can only call functions, got {}.", other.type_name()),
                ));
            }
        };

        if args.len() != callable.arity() {
            return Err(LoxError::arity(paren, callable.arity(), args.len()));
        }

        debug!("Calling '{}' with {} arguments", callable.name(), args.len());

        callable.call(self, args, paren)
    }

    /// Runs a user function body: a fresh environment is chained to the
    /// function's *closure* (not the caller's environment), parameters are
    /// bound there, and a `Return` unwind becomes the call's value.
    pub(crate) fn call_function(
        &mut self,
        function: &LoxFunction,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(LoxError::stack_overflow(paren));
        }

        let environment: Rc<RefCell<Environment>> = Rc::new(RefCell::new(
            Environment::with_enclosing(function.closure.clone()),
        ));

        for (param, argument) in function.declaration.params.iter().zip(arguments) {
            environment.borrow_mut().define(param, argument)?;
        }

        self.depth += 1;

        let flow: Result<Flow> = self.execute_block(&function.declaration.body, environment);

        self.depth -= 1;

        match flow? {
            Flow::Return(value) => {
                info!("Function '{}' returned: {}", function.name(), value);

                Ok(value)
            }

            Flow::Normal => Ok(Value::Nil),
        }
    }
}

// ───────────────────────── native functions ─────────────────────────

/// Seconds since the Unix epoch, with microsecond precision.
fn native_clock(_interpreter: &mut Interpreter, _args: &[Value]) -> Result<Value> {
    let micros: i64 = chrono::Utc::now().timestamp_micros();

    Ok(Value::Number(micros as f64 / 1e6))
}

/// Force out any buffered program output.
fn native_flush(interpreter: &mut Interpreter, _args: &[Value]) -> Result<Value> {
    interpreter.sink.borrow_mut().flush()?;

    Ok(Value::Nil)
}

/// Read one line from the interpreter's input source. Yields the line
/// without its trailing newline, or nil at end of input.
fn native_input(interpreter: &mut Interpreter, _args: &[Value]) -> Result<Value> {
    let mut line: String = String::new();

    let read: usize = interpreter.input.borrow_mut().read_line(&mut line)?;

    if read == 0 {
        return Ok(Value::Nil);
    }

    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }

    Ok(Value::Str(line))
}
