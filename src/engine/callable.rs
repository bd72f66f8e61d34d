use std::fmt;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::engine::environment::{EnvRef, Environment};
use crate::engine::runtime::{Flow, Interpreter};
use crate::engine::value::RuntimeVal;
use crate::error::RuntimeError;
use crate::lexing::ast::FunctionDeclaration;

/// Anything a call expression can invoke.
pub trait Callable: fmt::Debug + fmt::Display {
    fn arity(&self) -> usize;

    /// Arguments arrive already evaluated and arity-checked.
    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<RuntimeVal>,
    ) -> Result<RuntimeVal, RuntimeError>;
}

pub struct LoxFunction {
    declaration: Rc<FunctionDeclaration>,
    closure: EnvRef,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDeclaration>, closure: EnvRef) -> Self {
        LoxFunction {
            declaration,
            closure,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<RuntimeVal>,
    ) -> Result<RuntimeVal, RuntimeError> {
        let scope = Environment::shared(Some(self.closure.clone()));

        for (param, arg) in self.declaration.params.iter().zip(arguments) {
            scope.borrow_mut().define(&param.lexeme, arg);
        }

        match interpreter.execute_block(&self.declaration.body, scope)? {
            Flow::Return(value) => Ok(value),
            Flow::Next => Ok(RuntimeVal::Nil),
        }
    }
}

// The closure can hold this function again, so it stays out of the debug output.
impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("LoxFunction")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

/// `clock()`: whole seconds since the Unix epoch.
#[derive(Debug)]
pub struct ClockFn;

impl Callable for ClockFn {
    fn arity(&self) -> usize {
        0
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter,
        _arguments: Vec<RuntimeVal>,
    ) -> Result<RuntimeVal, RuntimeError> {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        Ok(RuntimeVal::Number(seconds as f64))
    }
}

impl fmt::Display for ClockFn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<native fn clock>")
    }
}
