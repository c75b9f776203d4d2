use thiserror::Error;

use crate::frontend::token::{Token, TokenKind};

/// Longest identifier the language accepts.
pub const MAX_IDENT_LEN: usize = 12;

/// Longest number literal the language accepts, in digits.
pub const MAX_NUMBER_DIGITS: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{col}: {message}")]
pub struct LexerError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl LexerError {
    fn at(span: Span, message: impl Into<String>) -> Self {
        LexerError {
            message: message.into(),
            line: span.line,
            col: span.col,
        }
    }
}

/// Anything the compiler can pull tokens from, one at a time.
///
/// After the last real token a source keeps yielding `TokenKind::Null`.
pub trait TokenSource {
    fn next_token(&mut self) -> Result<Spanned, LexerError>;
}

pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn current(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current();
        if ch == Some('\n') {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        self.pos += 1;
        ch
    }

    fn span(&self) -> Span {
        Span {
            line: self.line,
            col: self.col,
        }
    }

    /// Skips whitespace and `/* ... */` comments.
    fn skip_trivia(&mut self) -> Result<(), LexerError> {
        loop {
            match (self.current(), self.peek()) {
                (Some(ch), _) if ch.is_whitespace() => {
                    self.advance();
                }
                (Some('/'), Some('*')) => {
                    let start = self.span();
                    self.advance();
                    self.advance();
                    loop {
                        match (self.current(), self.peek()) {
                            (Some('*'), Some('/')) => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            (Some(_), _) => {
                                self.advance();
                            }
                            (None, _) => {
                                return Err(LexerError::at(start, "unterminated comment"));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_number(&mut self, start: Span) -> Result<Token, LexerError> {
        let mut digits = String::new();
        while let Some(ch) = self.current() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if self.current().is_some_and(|c| c.is_ascii_alphabetic()) {
            return Err(LexerError::at(
                start,
                format!("identifiers cannot begin with a digit: '{}...'", digits),
            ));
        }

        if digits.len() > MAX_NUMBER_DIGITS {
            return Err(LexerError::at(
                start,
                format!(
                    "number too long: {} (at most {} digits)",
                    digits, MAX_NUMBER_DIGITS
                ),
            ));
        }

        let value: i32 = digits
            .parse()
            .map_err(|_| LexerError::at(start, format!("invalid number: {}", digits)))?;

        Ok(Token::number(digits, value))
    }

    fn read_identifier(&mut self, start: Span) -> Result<Token, LexerError> {
        let mut ident = String::new();
        while let Some(ch) = self.current() {
            if ch.is_ascii_alphanumeric() {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if ident.len() > MAX_IDENT_LEN {
            return Err(LexerError::at(
                start,
                format!(
                    "identifier too long: {} (at most {} characters)",
                    ident, MAX_IDENT_LEN
                ),
            ));
        }

        let kind = TokenKind::keyword(&ident).unwrap_or(TokenKind::Ident);
        Ok(Token::new(kind, ident))
    }

    fn read_symbol(&mut self, start: Span) -> Result<Token, LexerError> {
        // skip_trivia guarantees a character is present
        let ch = self.current().unwrap_or_default();
        let next = self.peek();

        let (kind, len) = match (ch, next) {
            (':', Some('=')) => (TokenKind::Becomes, 2),
            ('<', Some('=')) => (TokenKind::Leq, 2),
            ('<', Some('>')) => (TokenKind::Neq, 2),
            ('>', Some('=')) => (TokenKind::Geq, 2),
            ('<', _) => (TokenKind::Lss, 1),
            ('>', _) => (TokenKind::Gtr, 1),
            ('=', _) => (TokenKind::Eql, 1),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('*', _) => (TokenKind::Mult, 1),
            ('/', _) => (TokenKind::Slash, 1),
            ('(', _) => (TokenKind::LParen, 1),
            (')', _) => (TokenKind::RParen, 1),
            (',', _) => (TokenKind::Comma, 1),
            (';', _) => (TokenKind::Semicolon, 1),
            ('.', _) => (TokenKind::Period, 1),
            _ => {
                return Err(LexerError::at(start, format!("invalid symbol: '{}'", ch)));
            }
        };

        let mut lexeme = String::new();
        for _ in 0..len {
            if let Some(c) = self.advance() {
                lexeme.push(c);
            }
        }

        Ok(Token::new(kind, lexeme))
    }

    /// Collects every token up to and including the terminating `Null`.
    pub fn tokenize(&mut self) -> Result<Vec<Spanned>, LexerError> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            let done = spanned.token.kind == TokenKind::Null;
            tokens.push(spanned);
            if done {
                return Ok(tokens);
            }
        }
    }
}

impl TokenSource for Lexer {
    fn next_token(&mut self) -> Result<Spanned, LexerError> {
        self.skip_trivia()?;
        let span = self.span();

        let token = match self.current() {
            None => Token::null(),
            Some(ch) if ch.is_ascii_digit() => self.read_number(span)?,
            Some(ch) if ch.is_ascii_alphabetic() => self.read_identifier(span)?,
            Some(_) => self.read_symbol(span)?,
        };

        Ok(Spanned { token, span })
    }
}

/// Pre-lexed tokens, e.g. from `Lexer::tokenize`.
impl TokenSource for std::vec::IntoIter<Spanned> {
    fn next_token(&mut self) -> Result<Spanned, LexerError> {
        Ok(self.next().unwrap_or(Spanned {
            token: Token::null(),
            span: Span::default(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        lexer
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|s| s.token.kind)
            .filter(|k| *k != TokenKind::Null)
            .collect()
    }

    #[test]
    fn test_declarations() {
        let k = kinds("const a = 5; var b, c;");
        assert_eq!(
            k,
            vec![
                TokenKind::Const,
                TokenKind::Ident,
                TokenKind::Eql,
                TokenKind::Number,
                TokenKind::Semicolon,
                TokenKind::Var,
                TokenKind::Ident,
                TokenKind::Comma,
                TokenKind::Ident,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_two_char_symbols() {
        let k = kinds(":= <= >= <> < > =");
        assert_eq!(
            k,
            vec![
                TokenKind::Becomes,
                TokenKind::Leq,
                TokenKind::Geq,
                TokenKind::Neq,
                TokenKind::Lss,
                TokenKind::Gtr,
                TokenKind::Eql,
            ]
        );
    }

    #[test]
    fn test_keywords_are_reserved() {
        let k = kinds("procedure p; begin call p end.");
        assert_eq!(
            k,
            vec![
                TokenKind::Procedure,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Begin,
                TokenKind::Call,
                TokenKind::Ident,
                TokenKind::End,
                TokenKind::Period,
            ]
        );
    }

    #[test]
    fn test_number_value() {
        let mut lexer = Lexer::new("  12345");
        let s = lexer.next_token().unwrap();
        assert_eq!(s.token.kind, TokenKind::Number);
        assert_eq!(s.token.value, 12345);
        assert_eq!(s.token.lexeme, "12345");
        assert_eq!(s.span, Span { line: 1, col: 3 });
    }

    #[test]
    fn test_comments_skipped() {
        let k = kinds("x /* a comment\n spanning lines */ := 1");
        assert_eq!(
            k,
            vec![TokenKind::Ident, TokenKind::Becomes, TokenKind::Number]
        );
    }

    #[test]
    fn test_spans_track_lines() {
        let mut lexer = Lexer::new("var x;\n  x := 1");
        let tokens = lexer.tokenize().unwrap();
        assert_eq!(tokens[3].token.lexeme, "x");
        assert_eq!(tokens[3].span, Span { line: 2, col: 3 });
    }

    #[test]
    fn test_null_repeats_after_end() {
        let mut lexer = Lexer::new("x");
        assert_eq!(lexer.next_token().unwrap().token.kind, TokenKind::Ident);
        assert_eq!(lexer.next_token().unwrap().token.kind, TokenKind::Null);
        assert_eq!(lexer.next_token().unwrap().token.kind, TokenKind::Null);
    }

    #[test]
    fn test_identifier_too_long() {
        let mut lexer = Lexer::new("abcdefghijklm");
        let err = lexer.next_token().unwrap_err();
        assert!(err.message.contains("identifier too long"));

        let mut lexer = Lexer::new("abcdefghijkl");
        assert_eq!(lexer.next_token().unwrap().token.lexeme, "abcdefghijkl");
    }

    #[test]
    fn test_number_too_long() {
        let mut lexer = Lexer::new("123456");
        let err = lexer.next_token().unwrap_err();
        assert!(err.message.contains("number too long"));
    }

    #[test]
    fn test_digit_led_identifier() {
        let mut lexer = Lexer::new("9lives");
        let err = lexer.next_token().unwrap_err();
        assert!(err.message.contains("cannot begin with a digit"));
    }

    #[test]
    fn test_invalid_symbol() {
        let mut lexer = Lexer::new("x : 1");
        lexer.next_token().unwrap();
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.col, 3);
        assert!(err.to_string().contains("invalid symbol"));

        let mut lexer = Lexer::new("#");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn test_unterminated_comment() {
        let mut lexer = Lexer::new("x /* never closed");
        lexer.next_token().unwrap();
        let err = lexer.next_token().unwrap_err();
        assert!(err.message.contains("unterminated comment"));
        assert_eq!((err.line, err.col), (1, 3));
    }

    #[test]
    fn test_vec_source_ends_with_null() {
        let tokens = Lexer::new("x").tokenize().unwrap();
        let mut source = tokens.into_iter();
        assert_eq!(source.next_token().unwrap().token.kind, TokenKind::Ident);
        assert_eq!(source.next_token().unwrap().token.kind, TokenKind::Null);
        assert_eq!(source.next_token().unwrap().token.kind, TokenKind::Null);
    }
}
