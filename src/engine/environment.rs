use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::engine::value::RuntimeVal;
use crate::error::RuntimeError;
use crate::scan::token::Token;

/// Shared handle to a scope; closures keep their defining scope alive through it.
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    parent: Option<EnvRef>,
    vars: HashMap<String, RuntimeVal>,
}

impl Environment {
    pub fn new(parent: Option<EnvRef>) -> Self {
        Environment {
            parent,
            vars: HashMap::new(),
        }
    }

    pub fn shared(parent: Option<EnvRef>) -> EnvRef {
        Rc::new(RefCell::new(Environment::new(parent)))
    }

    /// Binds `name` in this scope, replacing any earlier binding here.
    pub fn define(&mut self, name: &str, value: RuntimeVal) {
        self.vars.insert(name.to_string(), value);
    }

    /// Rebinds `name` in the nearest scope that already defines it.
    pub fn assign(&mut self, name: &Token, value: RuntimeVal) -> Result<(), RuntimeError> {
        if let Some(slot) = self.vars.get_mut(&name.lexeme) {
            *slot = value;
            return Ok(());
        }

        match &self.parent {
            Some(parent) => parent.borrow_mut().assign(name, value),
            None => Err(undefined(name)),
        }
    }

    pub fn get(&self, name: &Token) -> Result<RuntimeVal, RuntimeError> {
        if let Some(value) = self.vars.get(&name.lexeme) {
            return Ok(value.clone());
        }

        match &self.parent {
            Some(parent) => parent.borrow().get(name),
            None => Err(undefined(name)),
        }
    }

}

fn undefined(name: &Token) -> RuntimeError {
    RuntimeError::at(name, format!("Undefined variable '{}'.", name.lexeme))
}
