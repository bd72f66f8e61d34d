use std::rc::Rc;

use crate::error::ParseError;
use crate::lexing::ast::*;
use crate::scan::token::{Token, TokenType, TokenType::*};

const MAX_ARITY: usize = 255;

type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    tokens: Vec<Token>,
    index: usize,
    function_depth: usize,
}

impl Parser {
    /// `tokens` should come from the scanner; a missing trailing `Eof` is supplied.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.t_type) != Some(Eof) {
            let line = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token::eof(line));
        }
        Parser {
            tokens,
            index: 0,
            function_depth: 0,
        }
    }

    pub fn parse(&mut self) -> ParseResult<Ast> {
        let mut prog = Ast::default();

        while !self.is_at_end() {
            prog.push_statement(self.parse_declaration(true)?);
        }

        tracing::debug!(statements = prog.statements.len(), "parsed program");
        Ok(prog)
    }

    // STATEMENTS

    fn parse_declaration(&mut self, top_level: bool) -> ParseResult<Statement> {
        if self.match_token(&[Fun]) {
            return self.parse_function();
        }
        if self.match_token(&[Var]) {
            return self.parse_var();
        }
        self.parse_statement(top_level)
    }

    fn parse_statement(&mut self, top_level: bool) -> ParseResult<Statement> {
        match self.c_token().t_type {
            Print => {
                self.advance();
                self.parse_print()
            }
            LBrace => {
                self.advance();
                Ok(Statement::Block(self.parse_block()?))
            }
            If => {
                self.advance();
                self.parse_if()
            }
            While => {
                self.advance();
                self.parse_while()
            }
            For => {
                self.advance();
                self.parse_for()
            }
            Return => {
                let keyword = self.advance();
                self.parse_return(keyword)
            }
            _ => self.parse_expression_statement(top_level),
        }
    }

    fn parse_var(&mut self) -> ParseResult<Statement> {
        let name = self.expect(Ident, "Expect variable name.")?;

        let initializer = if self.match_token(&[Equal]) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        self.expect(Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Statement::Var { name, initializer })
    }

    fn parse_function(&mut self) -> ParseResult<Statement> {
        let name = self.expect(Ident, "Expect function name.")?;
        self.expect(LParen, "Expect '(' after function name.")?;

        let mut params: Vec<Token> = vec![];
        if !self.check(RParen) {
            loop {
                if params.len() >= MAX_ARITY {
                    return Err(ParseError::at(
                        self.c_token(),
                        "Can't have more than 255 parameters.",
                    ));
                }
                params.push(self.expect(Ident, "Expect parameter name.")?);
                if !self.match_token(&[Comma]) {
                    break;
                }
            }
        }
        self.expect(RParen, "Expect ')' after parameters.")?;
        self.expect(LBrace, "Expect '{' before function body.")?;

        self.function_depth += 1;
        let body = self.parse_block();
        self.function_depth -= 1;

        Ok(Statement::Function(Rc::new(FunctionDeclaration::new(
            name, params, body?,
        ))))
    }

    fn parse_print(&mut self) -> ParseResult<Statement> {
        let value = self.parse_expr()?;
        self.expect(Semicolon, "Expect ';' after value.")?;
        Ok(Statement::Print(value))
    }

    fn parse_block(&mut self) -> ParseResult<Vec<Statement>> {
        let mut statements = vec![];
        while !self.check(RBrace) && !self.is_at_end() {
            statements.push(self.parse_declaration(false)?);
        }
        self.expect(RBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn parse_if(&mut self) -> ParseResult<Statement> {
        self.expect(LParen, "Expect '(' after 'if'.")?;
        let condition = self.parse_expr()?;
        self.expect(RParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.parse_statement(false)?);
        let else_branch = if self.match_token(&[Else]) {
            Some(Box::new(self.parse_statement(false)?))
        } else {
            None
        };

        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> ParseResult<Statement> {
        self.expect(LParen, "Expect '(' after 'while'.")?;
        let condition = self.parse_expr()?;
        self.expect(RParen, "Expect ')' after condition.")?;
        let body = Box::new(self.parse_statement(false)?);
        Ok(Statement::While { condition, body })
    }

    // for (init; cond; incr) body  =>  { init; while (cond) { body; incr; } }
    fn parse_for(&mut self) -> ParseResult<Statement> {
        let line = self.previous().line;
        self.expect(LParen, "Expect '(' after 'for'.")?;

        let initializer = if self.match_token(&[Semicolon]) {
            None
        } else if self.match_token(&[Var]) {
            Some(self.parse_var()?)
        } else {
            Some(self.parse_expression_statement(false)?)
        };

        let condition = if self.check(Semicolon) {
            Expression::Literal(Literal::new("true", LiteralKind::Bool, line))
        } else {
            self.parse_expr()?
        };
        self.expect(Semicolon, "Expect ';' after loop condition.")?;

        let increment = if self.check(RParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(RParen, "Expect ')' after for clauses.")?;

        let mut body = self.parse_statement(false)?;

        if let Some(increment) = increment {
            body = Statement::Block(vec![
                body,
                Statement::Expression {
                    expr: increment,
                    auto_print: false,
                },
            ]);
        }

        let mut desugared = Statement::While {
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            desugared = Statement::Block(vec![initializer, desugared]);
        }

        Ok(desugared)
    }

    fn parse_return(&mut self, keyword: Token) -> ParseResult<Statement> {
        if self.function_depth == 0 {
            return Err(ParseError::at(&keyword, "Can't return from top-level code."));
        }

        let value = if self.check(Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };

        self.expect(Semicolon, "Expect ';' after return value.")?;
        Ok(Statement::Return { keyword, value })
    }

    // The last top-level statement may drop its `;`; it then prints its value.
    fn parse_expression_statement(&mut self, top_level: bool) -> ParseResult<Statement> {
        let expr = self.parse_expr()?;

        if top_level && self.is_at_end() {
            return Ok(Statement::Expression {
                expr,
                auto_print: true,
            });
        }

        self.expect(Semicolon, "Expect ';' after expression.")?;
        Ok(Statement::Expression {
            expr,
            auto_print: false,
        })
    }

    // EXPRESSIONS, lowest precedence first

    fn parse_expr(&mut self) -> ParseResult<Expression> {
        self.parse_assignment_expr()
    }

    fn parse_assignment_expr(&mut self) -> ParseResult<Expression> {
        let expr = self.parse_or_expr()?;

        if self.match_token(&[Equal]) {
            let equals = self.previous().clone();
            let value = self.parse_assignment_expr()?;

            return match expr {
                Expression::Variable(name) => Ok(Expression::Assign {
                    name,
                    value: Box::new(value),
                }),
                _ => Err(ParseError::at(&equals, "Invalid assignment target.")),
            };
        }

        Ok(expr)
    }

    fn parse_or_expr(&mut self) -> ParseResult<Expression> {
        self.parse_left_assoc(&[Or], Self::parse_and_expr, true)
    }

    fn parse_and_expr(&mut self) -> ParseResult<Expression> {
        self.parse_left_assoc(&[And], Self::parse_equality_expr, true)
    }

    fn parse_equality_expr(&mut self) -> ParseResult<Expression> {
        self.parse_left_assoc(&[BangEqual, EqualEqual], Self::parse_comparison_expr, false)
    }

    fn parse_comparison_expr(&mut self) -> ParseResult<Expression> {
        self.parse_left_assoc(
            &[Greater, GreaterEqual, Less, LessEqual],
            Self::parse_add_expr,
            false,
        )
    }

    fn parse_add_expr(&mut self) -> ParseResult<Expression> {
        self.parse_left_assoc(&[Minus, Plus], Self::parse_multiplicative_expr, false)
    }

    fn parse_multiplicative_expr(&mut self) -> ParseResult<Expression> {
        self.parse_left_assoc(&[Slash, Star], Self::parse_unary_expr, false)
    }

    /// Folds `operand (op operand)*` into a left-leaning tree.
    fn parse_left_assoc(
        &mut self,
        operators: &[TokenType],
        operand: fn(&mut Self) -> ParseResult<Expression>,
        logical: bool,
    ) -> ParseResult<Expression> {
        let mut left_part = operand(self)?;

        while self.match_token(operators) {
            let operator = self.previous().clone();
            let right = Box::new(operand(self)?);
            let left = Box::new(left_part);
            left_part = if logical {
                Expression::Logical {
                    left,
                    operator,
                    right,
                }
            } else {
                Expression::Binary {
                    left,
                    operator,
                    right,
                }
            };
        }

        Ok(left_part)
    }

    fn parse_unary_expr(&mut self) -> ParseResult<Expression> {
        if self.match_token(&[Bang, Minus]) {
            let operator = self.previous().clone();
            let right = self.parse_unary_expr()?;
            return Ok(Expression::Unary {
                operator,
                right: Box::new(right),
            });
        }
        self.parse_call_expr()
    }

    fn parse_call_expr(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_primary_expr()?;

        while self.match_token(&[LParen]) {
            expr = self.finish_call(expr)?;
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expression) -> ParseResult<Expression> {
        let mut arguments = vec![];

        if !self.check(RParen) {
            loop {
                if arguments.len() >= MAX_ARITY {
                    return Err(ParseError::at(
                        self.c_token(),
                        "Can't have more than 255 arguments.",
                    ));
                }
                arguments.push(self.parse_expr()?);
                if !self.match_token(&[Comma]) {
                    break;
                }
            }
        }

        let paren = self.expect(RParen, "Expect ')' after arguments.")?;
        Ok(Expression::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn parse_primary_expr(&mut self) -> ParseResult<Expression> {
        let token = self.c_token().clone();

        if let Some(message) = token.error_message() {
            return Err(ParseError::at(&token, message));
        }

        let line = token.line;
        let expr = match token.t_type {
            False | True => {
                Expression::Literal(Literal::new(token.lexeme, LiteralKind::Bool, line))
            }
            Nil => Expression::Literal(Literal::new("nil", LiteralKind::Nil, line)),
            Number => Expression::Literal(Literal::new(
                token.literal.unwrap_or(token.lexeme),
                LiteralKind::Number,
                line,
            )),
            RawStr => Expression::Literal(Literal::new(
                token.literal.unwrap_or_default(),
                LiteralKind::Str,
                line,
            )),
            Ident => Expression::Variable(token),
            LParen => {
                self.advance(); // open paren
                let expr = self.parse_expr()?;
                self.expect(RParen, "Expect ')' after expression.")?;
                return Ok(Expression::Grouping(Box::new(expr)));
            }
            _ => return Err(ParseError::at(&token, "Expect expression.")),
        };

        self.advance();
        Ok(expr)
    }

    // CURSOR

    fn c_token(&self) -> &Token {
        &self.tokens[self.index]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.index.saturating_sub(1)]
    }

    fn is_at_end(&self) -> bool {
        self.c_token().t_type == Eof
    }

    fn check(&self, t_type: TokenType) -> bool {
        self.c_token().t_type == t_type
    }

    fn advance(&mut self) -> Token {
        let token = self.c_token().clone();
        if !self.is_at_end() {
            self.index += 1;
        }
        token
    }

    fn match_token(&mut self, types: &[TokenType]) -> bool {
        if types.iter().any(|t| self.check(*t)) {
            self.advance();
            return true;
        }
        false
    }

    fn expect(&mut self, exp_t: TokenType, message: &str) -> ParseResult<Token> {
        if self.check(exp_t) {
            return Ok(self.advance());
        }
        Err(ParseError::at(self.c_token(), message))
    }
}
