use crate::scan::token::Token;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct Ast {
    pub statements: Vec<Statement>,
}

impl Ast {
    pub fn push_statement(&mut self, val: Statement) {
        self.statements.push(val);
    }

    /// Top-level expression statements, in source order.
    pub fn expressions(&self) -> impl Iterator<Item = &Expression> {
        self.statements.iter().filter_map(|stmt| match stmt {
            Statement::Expression { expr, .. } => Some(expr),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Number,
    Str,
    Bool,
    Nil,
}

/// Literal as decoded by the scanner; `value` is the token's literal text.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: String,
    pub kind: LiteralKind,
    pub line: usize,
}

impl Literal {
    pub fn new(value: impl Into<String>, kind: LiteralKind, line: usize) -> Self {
        Literal {
            value: value.into(),
            kind,
            line,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    Grouping(Box<Expression>),
    Unary {
        operator: Token,
        right: Box<Expression>,
    },
    Binary {
        left: Box<Expression>,
        operator: Token,
        right: Box<Expression>,
    },
    Logical {
        left: Box<Expression>,
        operator: Token,
        right: Box<Expression>,
    },
    Variable(Token),
    Assign {
        name: Token,
        value: Box<Expression>,
    },
    Call {
        callee: Box<Expression>,
        paren: Token,
        arguments: Vec<Expression>,
    },
}

impl Expression {
    /// Source line used when reporting errors about this expression.
    pub fn line(&self) -> usize {
        match self {
            Expression::Literal(literal) => literal.line,
            Expression::Grouping(inner) => inner.line(),
            Expression::Unary { operator, .. }
            | Expression::Binary { operator, .. }
            | Expression::Logical { operator, .. } => operator.line,
            Expression::Variable(name) | Expression::Assign { name, .. } => name.line,
            Expression::Call { paren, .. } => paren.line,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Statement {
    /// `auto_print` marks a trailing top-level expression written without `;`.
    Expression {
        expr: Expression,
        auto_print: bool,
    },
    Print(Expression),
    Var {
        name: Token,
        initializer: Option<Expression>,
    },
    Block(Vec<Statement>),
    If {
        condition: Expression,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
    },
    Function(Rc<FunctionDeclaration>),
    Return {
        keyword: Token,
        value: Option<Expression>,
    },
}

// Shared with every closure created from it, so bodies outlive the statement list.
#[derive(Debug)]
pub struct FunctionDeclaration {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Statement>,
}

impl FunctionDeclaration {
    pub fn new(name: Token, params: Vec<Token>, body: Vec<Statement>) -> Self {
        FunctionDeclaration { name, params, body }
    }
}

// DISPLAY IMPLEMENTATION

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{}", statement)?;
        }
        Ok(())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(literal) => write!(f, "{}", literal),
            Expression::Grouping(inner) => write!(f, "(group {})", inner),
            Expression::Unary { operator, right } => write!(f, "({} {})", operator.lexeme, right),
            Expression::Binary {
                left,
                operator,
                right,
            }
            | Expression::Logical {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", operator.lexeme, left, right),
            Expression::Variable(name) => f.write_str(&name.lexeme),
            Expression::Assign { name, value } => write!(f, "(= {} {})", name.lexeme, value),
            Expression::Call {
                callee, arguments, ..
            } => {
                write!(f, "(call {}", callee)?;
                for argument in arguments {
                    write!(f, " {}", argument)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Statement::Expression { expr, .. } => write!(f, "(; {})", expr),
            Statement::Print(expr) => write!(f, "(print {})", expr),
            Statement::Var { name, initializer } => match initializer {
                Some(init) => write!(f, "(var {} {})", name.lexeme, init),
                None => write!(f, "(var {})", name.lexeme),
            },
            Statement::Block(statements) => {
                write!(f, "(block")?;
                for statement in statements {
                    write!(f, " {}", statement)?;
                }
                write!(f, ")")
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(otherwise) => write!(f, "(if {} {} {})", condition, then_branch, otherwise),
                None => write!(f, "(if {} {})", condition, then_branch),
            },
            Statement::While { condition, body } => write!(f, "(while {} {})", condition, body),
            Statement::Function(decl) => {
                let params: Vec<&str> = decl.params.iter().map(|p| p.lexeme.as_str()).collect();
                write!(f, "(fun {} ({})", decl.name.lexeme, params.join(" "))?;
                for statement in &decl.body {
                    write!(f, " {}", statement)?;
                }
                write!(f, ")")
            }
            Statement::Return { value, .. } => match value {
                Some(value) => write!(f, "(return {})", value),
                None => write!(f, "(return)"),
            },
        }
    }
}
