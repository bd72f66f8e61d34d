use std::fmt;
use std::rc::Rc;

use crate::engine::callable::Callable;
use crate::utils::number_display;

#[derive(Debug, Clone)]
pub enum RuntimeVal {
    Number(f64),
    Str(String),
    Bool(bool),
    Nil,
    Callable(Rc<dyn Callable>),
}

impl RuntimeVal {
    /// `nil` and `false` are falsy; every other value, `0` and `""` included, is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, RuntimeVal::Nil | RuntimeVal::Bool(false))
    }
}

impl PartialEq for RuntimeVal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RuntimeVal::Number(l), RuntimeVal::Number(r)) => l == r,
            (RuntimeVal::Str(l), RuntimeVal::Str(r)) => l == r,
            (RuntimeVal::Bool(l), RuntimeVal::Bool(r)) => l == r,
            (RuntimeVal::Nil, RuntimeVal::Nil) => true,
            (RuntimeVal::Callable(l), RuntimeVal::Callable(r)) => {
                std::ptr::addr_eq(Rc::as_ptr(l), Rc::as_ptr(r))
            }
            _ => false,
        }
    }
}

impl fmt::Display for RuntimeVal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RuntimeVal::Number(num) => f.write_str(&number_display(*num)),
            RuntimeVal::Str(s) => write!(f, "{}", s),
            RuntimeVal::Bool(b) => write!(f, "{}", b),
            RuntimeVal::Nil => write!(f, "nil"),
            RuntimeVal::Callable(callable) => write!(f, "{}", callable),
        }
    }
}
