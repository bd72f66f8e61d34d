use std::io::Write;
use std::rc::Rc;

use crate::config::Config;
use crate::engine::callable::{ClockFn, LoxFunction};
use crate::engine::environment::{EnvRef, Environment};
use crate::engine::value::RuntimeVal;
use crate::error::RuntimeError;
use crate::lexing::ast::*;
use crate::scan::token::{Token, TokenType};

type EvalResult<T> = Result<T, RuntimeError>;

/// How a statement completed: fall through to the next one, or unwind to the call boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Next,
    Return(RuntimeVal),
}

pub struct Interpreter {
    globals: EnvRef,
    out: Box<dyn Write>,
    depth: usize,
    max_depth: usize,
}

impl Interpreter {
    pub fn new(out: Box<dyn Write>) -> Self {
        Interpreter::with_config(&Config::default(), out)
    }

    pub fn with_config(config: &Config, out: Box<dyn Write>) -> Self {
        let globals = Environment::shared(None);
        globals
            .borrow_mut()
            .define("clock", RuntimeVal::Callable(Rc::new(ClockFn)));

        Interpreter {
            globals,
            out,
            depth: 0,
            max_depth: config.max_call_depth,
        }
    }

    pub fn globals(&self) -> EnvRef {
        self.globals.clone()
    }

    /// Runs a program in the global scope; the first runtime error aborts it.
    /// Output produced before the error is still flushed.
    pub fn eval_program(&mut self, prog: &Ast) -> EvalResult<()> {
        let globals = self.globals();
        let result = self.execute_block(&prog.statements, globals);

        let last_line = prog.statements.last().map_or(0, statement_line);
        self.out.flush().map_err(|e| output_error(last_line, e))?;
        result.map(|_| ())
    }

    pub fn execute(&mut self, stmt: &Statement, env: &EnvRef) -> EvalResult<Flow> {
        match stmt {
            Statement::Expression { expr, auto_print } => {
                let value = self.evaluate(expr, env)?;
                if *auto_print {
                    self.emit(&value, expr.line())?;
                }
                Ok(Flow::Next)
            }
            Statement::Print(expr) => {
                let value = self.evaluate(expr, env)?;
                self.emit(&value, expr.line())?;
                Ok(Flow::Next)
            }
            Statement::Var { name, initializer } => self.eval_var(name, initializer.as_ref(), env),
            Statement::Block(statements) => {
                let scope = Environment::shared(Some(env.clone()));
                self.execute_block(statements, scope)
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => self.eval_if_stmt(condition, then_branch, else_branch.as_deref(), env),
            Statement::While { condition, body } => self.eval_while(condition, body, env),
            Statement::Function(decl) => {
                tracing::trace!(name = %decl.name.lexeme, "declaring function");
                let function = LoxFunction::new(decl.clone(), env.clone());
                env.borrow_mut()
                    .define(&decl.name.lexeme, RuntimeVal::Callable(Rc::new(function)));
                Ok(Flow::Next)
            }
            Statement::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => RuntimeVal::Nil,
                };
                Ok(Flow::Return(value))
            }
        }
    }

    /// Executes `statements` in `scope`, stopping early on `return`.
    pub fn execute_block(&mut self, statements: &[Statement], scope: EnvRef) -> EvalResult<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt, &scope)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Next)
    }

    fn eval_var(
        &mut self,
        name: &Token,
        initializer: Option<&Expression>,
        env: &EnvRef,
    ) -> EvalResult<Flow> {
        let value = match initializer {
            Some(expr) => self.evaluate(expr, env)?,
            None => RuntimeVal::Nil,
        };
        env.borrow_mut().define(&name.lexeme, value);
        Ok(Flow::Next)
    }

    fn eval_if_stmt(
        &mut self,
        condition: &Expression,
        then_branch: &Statement,
        else_branch: Option<&Statement>,
        env: &EnvRef,
    ) -> EvalResult<Flow> {
        if self.evaluate(condition, env)?.is_truthy() {
            self.execute(then_branch, env)
        } else if let Some(otherwise) = else_branch {
            self.execute(otherwise, env)
        } else {
            Ok(Flow::Next)
        }
    }

    fn eval_while(
        &mut self,
        condition: &Expression,
        body: &Statement,
        env: &EnvRef,
    ) -> EvalResult<Flow> {
        while self.evaluate(condition, env)?.is_truthy() {
            if let Flow::Return(value) = self.execute(body, env)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Next)
    }

    pub fn evaluate(&mut self, expr: &Expression, env: &EnvRef) -> EvalResult<RuntimeVal> {
        match expr {
            Expression::Literal(literal) => Ok(eval_literal(literal)),
            Expression::Grouping(inner) => self.evaluate(inner, env),
            Expression::Unary { operator, right } => {
                let operand = self.evaluate(right, env)?;
                eval_unary(operator, operand)
            }
            Expression::Binary {
                left,
                operator,
                right,
            } => {
                let lhs = self.evaluate(left, env)?;
                let rhs = self.evaluate(right, env)?;
                eval_binary(lhs, operator, rhs)
            }
            Expression::Logical {
                left,
                operator,
                right,
            } => self.eval_logical_expr(left, operator, right, env),
            Expression::Variable(name) => env.borrow().get(name),
            Expression::Assign { name, value } => {
                let value = self.evaluate(value, env)?;
                env.borrow_mut().assign(name, value.clone())?;
                Ok(value)
            }
            Expression::Call {
                callee,
                paren,
                arguments,
            } => self.eval_call(callee, paren, arguments, env),
        }
    }

    // Yields whichever operand decided the result, not a coerced boolean.
    fn eval_logical_expr(
        &mut self,
        left: &Expression,
        operator: &Token,
        right: &Expression,
        env: &EnvRef,
    ) -> EvalResult<RuntimeVal> {
        let lhs = self.evaluate(left, env)?;

        let short_circuit = match operator.t_type {
            TokenType::Or => lhs.is_truthy(),
            _ => !lhs.is_truthy(),
        };
        if short_circuit {
            return Ok(lhs);
        }

        self.evaluate(right, env)
    }

    fn eval_call(
        &mut self,
        callee: &Expression,
        paren: &Token,
        arguments: &[Expression],
        env: &EnvRef,
    ) -> EvalResult<RuntimeVal> {
        let callee = self.evaluate(callee, env)?;
        let RuntimeVal::Callable(function) = callee else {
            return Err(RuntimeError::at(
                paren,
                "Can only call functions and classes.",
            ));
        };

        let mut args = Vec::with_capacity(arguments.len());
        for argument in arguments {
            args.push(self.evaluate(argument, env)?);
        }

        if args.len() != function.arity() {
            return Err(RuntimeError::at(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    function.arity(),
                    args.len()
                ),
            ));
        }

        if self.depth >= self.max_depth {
            return Err(RuntimeError::at(paren, "Stack overflow."));
        }

        tracing::trace!(callee = %function, depth = self.depth, "call");
        self.depth += 1;
        let result = function.call(self, args);
        self.depth -= 1;
        result
    }

    fn emit(&mut self, value: &RuntimeVal, line: usize) -> EvalResult<()> {
        writeln!(self.out, "{}", value).map_err(|e| output_error(line, e))
    }
}

fn statement_line(stmt: &Statement) -> usize {
    match stmt {
        Statement::Expression { expr, .. } | Statement::Print(expr) => expr.line(),
        Statement::Var { name, .. } => name.line,
        Statement::Block(statements) => statements.last().map_or(0, statement_line),
        Statement::If { condition, .. } | Statement::While { condition, .. } => condition.line(),
        Statement::Function(decl) => decl.name.line,
        Statement::Return { keyword, .. } => keyword.line,
    }
}

fn output_error(line: usize, err: std::io::Error) -> RuntimeError {
    RuntimeError::new(line, format!("Could not write output: {}.", err))
}

fn eval_literal(literal: &Literal) -> RuntimeVal {
    match literal.kind {
        LiteralKind::Number => match literal.value.parse::<f64>() {
            Ok(n) => RuntimeVal::Number(n),
            Err(_) => {
                tracing::error!(
                    line = literal.line,
                    value = %literal.value,
                    "invalid number literal, using nil"
                );
                RuntimeVal::Nil
            }
        },
        LiteralKind::Str => RuntimeVal::Str(literal.value.clone()),
        LiteralKind::Bool => RuntimeVal::Bool(literal.value == "true"),
        LiteralKind::Nil => RuntimeVal::Nil,
    }
}

fn eval_unary(operator: &Token, operand: RuntimeVal) -> EvalResult<RuntimeVal> {
    match (operator.t_type, operand) {
        (TokenType::Bang, RuntimeVal::Bool(b)) => Ok(RuntimeVal::Bool(!b)),
        (TokenType::Bang, RuntimeVal::Nil) => Ok(RuntimeVal::Bool(true)),
        (TokenType::Bang, _) => Err(RuntimeError::at(
            operator,
            "Operand must be a boolean or nil.",
        )),
        (TokenType::Minus, RuntimeVal::Number(n)) => Ok(RuntimeVal::Number(-n)),
        (_, _) => Err(RuntimeError::at(operator, "Operand must be a number.")),
    }
}

fn eval_binary(lhs: RuntimeVal, operator: &Token, rhs: RuntimeVal) -> EvalResult<RuntimeVal> {
    match (lhs, rhs) {
        (RuntimeVal::Number(l), RuntimeVal::Number(r)) => eval_numeric_binary(l, operator, r),
        (RuntimeVal::Str(l), RuntimeVal::Str(r)) => eval_string_binary(l, operator, r),
        // same-typed booleans, nils and callables only support equality
        (l, r) if std::mem::discriminant(&l) == std::mem::discriminant(&r) => {
            eval_equality(l == r, operator)
        }
        // incompatible types are never equal
        (_, _) => eval_equality(false, operator),
    }
}

fn eval_numeric_binary(lhs: f64, operator: &Token, rhs: f64) -> EvalResult<RuntimeVal> {
    let res = match operator.t_type {
        TokenType::Plus => RuntimeVal::Number(lhs + rhs),
        TokenType::Minus => RuntimeVal::Number(lhs - rhs),
        TokenType::Star => RuntimeVal::Number(lhs * rhs),
        TokenType::Slash => {
            if rhs == 0.0 {
                return Err(RuntimeError::at(operator, "Division by zero."));
            }
            RuntimeVal::Number(lhs / rhs)
        }
        TokenType::Greater => RuntimeVal::Bool(lhs > rhs),
        TokenType::GreaterEqual => RuntimeVal::Bool(lhs >= rhs),
        TokenType::Less => RuntimeVal::Bool(lhs < rhs),
        TokenType::LessEqual => RuntimeVal::Bool(lhs <= rhs),
        TokenType::EqualEqual => RuntimeVal::Bool(lhs == rhs),
        TokenType::BangEqual => RuntimeVal::Bool(lhs != rhs),
        _ => return Err(unknown_operator(operator)),
    };
    Ok(res)
}

fn eval_string_binary(lhs: String, operator: &Token, rhs: String) -> EvalResult<RuntimeVal> {
    match operator.t_type {
        TokenType::Plus => Ok(RuntimeVal::Str(lhs + &rhs)),
        _ => eval_equality(lhs == rhs, operator),
    }
}

fn eval_equality(equal: bool, operator: &Token) -> EvalResult<RuntimeVal> {
    match operator.t_type {
        TokenType::EqualEqual => Ok(RuntimeVal::Bool(equal)),
        TokenType::BangEqual => Ok(RuntimeVal::Bool(!equal)),
        TokenType::Plus => Err(RuntimeError::at(
            operator,
            "Operands must be two numbers or two strings.",
        )),
        TokenType::Minus
        | TokenType::Star
        | TokenType::Slash
        | TokenType::Greater
        | TokenType::GreaterEqual
        | TokenType::Less
        | TokenType::LessEqual => Err(RuntimeError::at(operator, "Operands must be numbers.")),
        _ => Err(unknown_operator(operator)),
    }
}

fn unknown_operator(operator: &Token) -> RuntimeError {
    RuntimeError::at(
        operator,
        format!("Unknown operator '{}'.", operator.lexeme),
    )
}
