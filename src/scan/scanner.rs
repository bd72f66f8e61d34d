use crate::scan::token::{Category, Token, TokenType, TokenType::*};
use crate::utils::number_literal;

/// Result of a scan: the significant tokens (always `Eof`-terminated) and the sticky error flag.
#[derive(Debug, Clone)]
pub struct Scanned {
    pub tokens: Vec<Token>,
    pub had_error: bool,
}

impl Scanned {
    pub fn errors(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(|t| t.error)
    }
}

pub struct Scanner {
    source: Vec<char>,
    start: usize,
    current: usize,
    line: usize,
    had_error: bool,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Scanner {
            source: source.chars().collect(),
            start: 0,
            current: 0,
            line: 1,
            had_error: false,
        }
    }

    pub fn scan_tokens(mut self) -> Scanned {
        let mut tokens = Vec::new();

        while !self.is_at_end() {
            self.start = self.current;
            let token = self.scan_token();
            self.line += token.newlines();
            if token.error {
                self.had_error = true;
            }
            if token.category != Category::Space {
                tokens.push(token);
            }
        }

        tokens.push(Token::eof(self.line));
        tracing::debug!(
            tokens = tokens.len(),
            had_error = self.had_error,
            "scanned source"
        );

        Scanned {
            tokens,
            had_error: self.had_error,
        }
    }

    fn scan_token(&mut self) -> Token {
        let c = self.advance();
        match c {
            '(' => self.add_token(LParen),
            ')' => self.add_token(RParen),
            '{' => self.add_token(LBrace),
            '}' => self.add_token(RBrace),
            ',' => self.add_token(Comma),
            '.' => self.add_token(Dot),
            '-' => self.add_token(Minus),
            '+' => self.add_token(Plus),
            ';' => self.add_token(Semicolon),
            '*' => self.add_token(Star),
            '!' => {
                if self.match_token('=') {
                    self.add_token(BangEqual)
                } else {
                    self.add_token(Bang)
                }
            }
            '=' => {
                if self.match_token('=') {
                    self.add_token(EqualEqual)
                } else {
                    self.add_token(Equal)
                }
            }
            '<' => {
                if self.match_token('=') {
                    self.add_token(LessEqual)
                } else {
                    self.add_token(Less)
                }
            }
            '>' => {
                if self.match_token('=') {
                    self.add_token(GreaterEqual)
                } else {
                    self.add_token(Greater)
                }
            }
            '/' => {
                if self.match_token('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                    self.add_token(Comment)
                } else {
                    self.add_token(Slash)
                }
            }
            '"' => self.found_string(),
            ' ' | '\r' | '\t' | '\n' => self.add_token(Whitespace),
            _ => {
                if c.is_ascii_digit() {
                    self.found_number()
                } else if self.is_alpha(c) {
                    self.found_identifier()
                } else {
                    self.add_token(Unexpected).with_error()
                }
            }
        }
    }

    fn is_alpha(&self, c: char) -> bool {
        c.is_ascii_lowercase() || c.is_ascii_uppercase() || c == '_'
    }

    fn match_token(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn lexeme(&self) -> String {
        self.source[self.start..self.current].iter().collect()
    }

    fn add_token(&self, t_type: TokenType) -> Token {
        Token::new(t_type, self.lexeme(), None, self.line)
    }

    fn add_literal_token(&self, t_type: TokenType, literal: String) -> Token {
        Token::new(t_type, self.lexeme(), Some(literal), self.line)
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        c
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    // Strings may span lines; an unterminated one swallows the rest of the input.
    fn found_string(&mut self) -> Token {
        while self.peek() != '"' && !self.is_at_end() {
            self.advance();
        }

        if self.is_at_end() {
            return self.add_token(RawStr).with_error();
        }

        self.advance();
        let value: String = self.source[self.start + 1..self.current - 1]
            .iter()
            .collect();
        self.add_literal_token(RawStr, value)
    }

    fn found_number(&mut self) -> Token {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        // digits with an optional fraction always parse, but may overflow to infinity
        let value = self.lexeme().parse::<f64>().unwrap_or(f64::INFINITY);
        if !value.is_finite() {
            return self.add_token(Number).with_error();
        }
        self.add_literal_token(Number, number_literal(value))
    }

    fn found_identifier(&mut self) -> Token {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        match TokenType::keyword(&self.lexeme()) {
            Some(keyword) => self.add_token(keyword),
            None => self.add_token(Ident),
        }
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            return '\0';
        }
        self.source[self.current]
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.source.len() {
            return '\0';
        }
        self.source[self.current + 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> Scanned {
        Scanner::new(source).scan_tokens()
    }

    fn rendered(source: &str) -> Vec<String> {
        scan(source)
            .tokens
            .iter()
            .filter(|t| !t.error)
            .map(|t| t.to_string())
            .collect()
    }

    #[test]
    fn empty_source_is_only_eof() {
        assert_eq!(rendered(""), vec!["EOF  null"]);
    }

    #[test]
    fn two_char_operators_win() {
        assert_eq!(
            rendered("!= == <= >= = ! < >"),
            vec![
                "BANG_EQUAL != null",
                "EQUAL_EQUAL == null",
                "LESS_EQUAL <= null",
                "GREATER_EQUAL >= null",
                "EQUAL = null",
                "BANG ! null",
                "LESS < null",
                "GREATER > null",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn numbers_are_canonicalised() {
        assert_eq!(
            rendered("3 3.140 42.5 0.0"),
            vec![
                "NUMBER 3 3.0",
                "NUMBER 3.140 3.14",
                "NUMBER 42.5 42.5",
                "NUMBER 0.0 0.0",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn trailing_dot_is_not_part_of_number() {
        assert_eq!(
            rendered("12."),
            vec!["NUMBER 12 12.0", "DOT . null", "EOF  null"]
        );
    }

    #[test]
    fn strings_strip_quotes() {
        assert_eq!(
            rendered("\"hello world\""),
            vec!["STRING \"hello world\" hello world", "EOF  null"]
        );
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            rendered("var _foo1 = nil; fun orchid"),
            vec![
                "VAR var null",
                "IDENTIFIER _foo1 null",
                "EQUAL = null",
                "NIL nil null",
                "SEMICOLON ; null",
                "FUN fun null",
                "IDENTIFIER orchid null",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn comments_are_skipped_and_lines_counted() {
        let scanned = scan("// first\n(\n// second\n)");
        let lines: Vec<usize> = scanned.tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![2, 4, 4]);
        assert!(!scanned.had_error);
    }

    #[test]
    fn multi_line_string_advances_line_counter() {
        let scanned = scan("\"a\nb\"\nx");
        assert_eq!(scanned.tokens[0].line, 1);
        assert_eq!(scanned.tokens[1].lexeme, "x");
        assert_eq!(scanned.tokens[1].line, 3);
    }

    #[test]
    fn unterminated_string_is_flagged_and_consumes_rest() {
        let scanned = scan("print \"abc\nvar x;");
        assert!(scanned.had_error);
        let errors: Vec<String> = scanned.errors().filter_map(|t| t.diagnostic()).collect();
        assert_eq!(errors, vec!["[line 1] Error: Unterminated string."]);
        assert_eq!(
            rendered("print \"abc\nvar x;"),
            vec!["PRINT print null", "EOF  null"]
        );
    }

    #[test]
    fn overflowing_number_is_a_lexical_error() {
        let source = format!("print {};\nprint 1;", "1".repeat(400));
        let scanned = scan(&source);
        assert!(scanned.had_error);
        let errors: Vec<String> = scanned.errors().filter_map(|t| t.diagnostic()).collect();
        assert_eq!(errors, vec!["[line 1] Error: Number literal out of range."]);
        assert_eq!(
            rendered(&source),
            vec![
                "PRINT print null",
                "SEMICOLON ; null",
                "PRINT print null",
                "NUMBER 1 1.0",
                "SEMICOLON ; null",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn unexpected_characters_do_not_stop_scanning() {
        let scanned = scan(",.$(#\n@");
        assert!(scanned.had_error);
        let errors: Vec<String> = scanned.errors().filter_map(|t| t.diagnostic()).collect();
        assert_eq!(
            errors,
            vec![
                "[line 1] Error: Unexpected character: $",
                "[line 1] Error: Unexpected character: #",
                "[line 2] Error: Unexpected character: @",
            ]
        );
        assert_eq!(
            rendered(",.$(#\n@"),
            vec!["COMMA , null", "DOT . null", "LEFT_PAREN ( null", "EOF  null"]
        );
    }
}
