use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One lexical scope: a name table plus an optional link to the enclosing
/// scope. Scopes are shared via `Rc<RefCell<..>>` so every closure pointing
/// at a scope sees later mutations of it.
#[derive(Debug, Clone)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// The global scope: no parent.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    /// A child scope chained to `enclosing`.
    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind a new name in *this* scope. Redeclaring a name already present
    /// in this scope is an error; shadowing an outer scope's name is not.
    pub fn define(&mut self, name: &Token, value: Value) -> Result<()> {
        if self.values.contains_key(&name.lexeme) {
            return Err(LoxError::redefinition(name));
        }

        self.values.insert(name.lexeme.clone(), value);

        Ok(())
    }

    /// Read a name, walking outward through the scope chain. The innermost
    /// binding wins.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(LoxError::undefined_variable(name))
        }
    }

    /// Overwrite the nearest existing binding of `name`. Assignment never
    /// creates a binding: an unknown name is an error.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if self.values.contains_key(&name.lexeme) {
            self.values.insert(name.lexeme.clone(), value);

            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(LoxError::undefined_variable(name))
        }
    }
}
