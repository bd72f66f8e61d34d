use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Space,
    Operator,
    Literal,
    Word,
    Unexpected,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub category: Category,
    pub t_type: TokenType,
    pub lexeme: String,
    pub literal: Option<String>,
    pub line: usize,
    pub error: bool,
}

impl Token {
    pub fn new(t_type: TokenType, lexeme: String, literal: Option<String>, line: usize) -> Self {
        Token {
            category: t_type.category(),
            t_type,
            lexeme,
            literal,
            line,
            error: false,
        }
    }

    pub fn with_error(mut self) -> Self {
        self.error = true;
        self
    }

    pub fn eof(line: usize) -> Self {
        Token::new(TokenType::Eof, String::new(), None, line)
    }

    /// Number of line breaks the lexeme spans.
    pub fn newlines(&self) -> usize {
        self.lexeme.matches('\n').count()
    }

    /// Scanner complaint for an error-flagged token, if any.
    pub fn error_message(&self) -> Option<String> {
        if !self.error {
            return None;
        }
        match self.t_type {
            TokenType::RawStr => Some("Unterminated string.".to_string()),
            TokenType::Number => Some("Number literal out of range.".to_string()),
            _ => Some(format!("Unexpected character: {}", self.lexeme)),
        }
    }

    pub fn diagnostic(&self) -> Option<String> {
        self.error_message()
            .map(|message| format!("[line {}] Error: {}", self.line, message))
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenType {
    // Single-character tokens.
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,
    // One or two character tokens.
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    // Literals.
    Ident,
    RawStr,
    Number,
    // Keywords.
    And,
    Class,
    Else,
    False,
    For,
    Fun,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,
    // Skipped input: whitespace and comments.
    Whitespace,
    Comment,
    Unexpected,
    Eof,
}

impl TokenType {
    pub fn keyword(word: &str) -> Option<TokenType> {
        use TokenType::*;
        let t_type = match word {
            "and" => And,
            "class" => Class,
            "else" => Else,
            "false" => False,
            "for" => For,
            "fun" => Fun,
            "if" => If,
            "nil" => Nil,
            "or" => Or,
            "print" => Print,
            "return" => Return,
            "super" => Super,
            "this" => This,
            "true" => True,
            "var" => Var,
            "while" => While,
            _ => return None,
        };
        Some(t_type)
    }

    pub fn category(self) -> Category {
        use TokenType::*;
        match self {
            Whitespace | Comment | Eof => Category::Space,
            RawStr | Number | True | False | Nil => Category::Literal,
            Ident | And | Class | Else | For | Fun | If | Or | Print | Return | Super | This
            | Var | While => Category::Word,
            Unexpected => Category::Unexpected,
            _ => Category::Operator,
        }
    }

    pub fn name(self) -> &'static str {
        use TokenType::*;
        match self {
            LParen => "LEFT_PAREN",
            RParen => "RIGHT_PAREN",
            LBrace => "LEFT_BRACE",
            RBrace => "RIGHT_BRACE",
            Comma => "COMMA",
            Dot => "DOT",
            Minus => "MINUS",
            Plus => "PLUS",
            Semicolon => "SEMICOLON",
            Slash => "SLASH",
            Star => "STAR",
            Bang => "BANG",
            BangEqual => "BANG_EQUAL",
            Equal => "EQUAL",
            EqualEqual => "EQUAL_EQUAL",
            Greater => "GREATER",
            GreaterEqual => "GREATER_EQUAL",
            Less => "LESS",
            LessEqual => "LESS_EQUAL",
            Ident => "IDENTIFIER",
            RawStr => "STRING",
            Number => "NUMBER",
            And => "AND",
            Class => "CLASS",
            Else => "ELSE",
            False => "FALSE",
            For => "FOR",
            Fun => "FUN",
            If => "IF",
            Nil => "NIL",
            Or => "OR",
            Print => "PRINT",
            Return => "RETURN",
            Super => "SUPER",
            This => "THIS",
            True => "TRUE",
            Var => "VAR",
            While => "WHILE",
            Whitespace => "WHITESPACE",
            Comment => "COMMENT",
            Unexpected => "UNEXPECTED",
            Eof => "EOF",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

// `<TYPE> <lexeme> <literal>`, the line format of the tokenize command
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} ", self.t_type, self.lexeme)?;
        match &self.literal {
            Some(literal) => write!(f, "{}", literal),
            None => write!(f, "null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_classified() {
        assert_eq!(TokenType::keyword("while"), Some(TokenType::While));
        assert_eq!(TokenType::keyword("While"), None);
        assert_eq!(TokenType::True.category(), Category::Literal);
        assert_eq!(TokenType::Fun.category(), Category::Word);
        assert_eq!(TokenType::LessEqual.category(), Category::Operator);
    }

    #[test]
    fn display_uses_null_for_missing_literal() {
        let token = Token::new(TokenType::LParen, "(".to_string(), None, 1);
        assert_eq!(token.to_string(), "LEFT_PAREN ( null");

        let number = Token::new(
            TokenType::Number,
            "42".to_string(),
            Some("42.0".to_string()),
            1,
        );
        assert_eq!(number.to_string(), "NUMBER 42 42.0");
    }

    #[test]
    fn eof_renders_with_empty_lexeme() {
        assert_eq!(Token::eof(3).to_string(), "EOF  null");
    }

    #[test]
    fn error_tokens_carry_diagnostics() {
        let token = Token::new(TokenType::Unexpected, "$".to_string(), None, 2).with_error();
        assert_eq!(
            token.diagnostic().as_deref(),
            Some("[line 2] Error: Unexpected character: $")
        );
        assert_eq!(token.category, Category::Unexpected);
    }
}
