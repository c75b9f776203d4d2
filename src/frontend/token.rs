use serde::{Deserialize, Serialize};

/// Token kinds of the PL/0 grammar.
///
/// The discriminants follow the classic lexeme-list numbering, which is what
/// the token dumper prints and what diagnostics refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TokenKind {
    // End of input
    Null = 1,

    // Literals and names
    Ident = 2,
    Number = 3,

    // Arithmetic
    Plus = 4,
    Minus = 5,
    Mult = 6,
    Slash = 7,
    Odd = 8,

    // Relations
    Eql = 9,
    Neq = 10,
    Lss = 11,
    Leq = 12,
    Gtr = 13,
    Geq = 14,

    // Punctuation
    LParen = 15,
    RParen = 16,
    Comma = 17,
    Semicolon = 18,
    Period = 19,
    Becomes = 20,

    // Keywords
    Begin = 21,
    End = 22,
    If = 23,
    Then = 24,
    While = 25,
    Do = 26,
    Call = 27,
    Const = 28,
    Var = 29,
    Procedure = 30,
    Write = 31,
    Read = 32,
    Else = 33,
}

impl TokenKind {
    /// Numeric code used in the lexeme list.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Diagnostic name of the kind (`identsym`, `becomessym`, ...).
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Null => "nulsym",
            TokenKind::Ident => "identsym",
            TokenKind::Number => "numbersym",
            TokenKind::Plus => "plussym",
            TokenKind::Minus => "minussym",
            TokenKind::Mult => "multsym",
            TokenKind::Slash => "slashsym",
            TokenKind::Odd => "oddsym",
            TokenKind::Eql => "eqlsym",
            TokenKind::Neq => "neqsym",
            TokenKind::Lss => "lessym",
            TokenKind::Leq => "leqsym",
            TokenKind::Gtr => "gtrsym",
            TokenKind::Geq => "geqsym",
            TokenKind::LParen => "lparentsym",
            TokenKind::RParen => "rparentsym",
            TokenKind::Comma => "commasym",
            TokenKind::Semicolon => "semicolonsym",
            TokenKind::Period => "periodsym",
            TokenKind::Becomes => "becomessym",
            TokenKind::Begin => "beginsym",
            TokenKind::End => "endsym",
            TokenKind::If => "ifsym",
            TokenKind::Then => "thensym",
            TokenKind::While => "whilesym",
            TokenKind::Do => "dosym",
            TokenKind::Call => "callsym",
            TokenKind::Const => "constsym",
            TokenKind::Var => "varsym",
            TokenKind::Procedure => "procsym",
            TokenKind::Write => "writesym",
            TokenKind::Read => "readsym",
            TokenKind::Else => "elsesym",
        }
    }

    /// Looks up a reserved word.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "odd" => TokenKind::Odd,
            "begin" => TokenKind::Begin,
            "end" => TokenKind::End,
            "if" => TokenKind::If,
            "then" => TokenKind::Then,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "call" => TokenKind::Call,
            "const" => TokenKind::Const,
            "var" => TokenKind::Var,
            "procedure" => TokenKind::Procedure,
            "write" => TokenKind::Write,
            "read" => TokenKind::Read,
            "else" => TokenKind::Else,
            _ => return None,
        };
        Some(kind)
    }

    /// Returns true for reserved words.
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::Odd
                | TokenKind::Begin
                | TokenKind::End
                | TokenKind::If
                | TokenKind::Then
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::Call
                | TokenKind::Const
                | TokenKind::Var
                | TokenKind::Procedure
                | TokenKind::Write
                | TokenKind::Read
                | TokenKind::Else
        )
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A lexed token: kind, source text, and the literal value for numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    /// Only meaningful when `kind` is `TokenKind::Number`.
    pub value: i32,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            value: 0,
        }
    }

    pub fn number(lexeme: impl Into<String>, value: i32) -> Self {
        Token {
            kind: TokenKind::Number,
            lexeme: lexeme.into(),
            value,
        }
    }

    pub fn null() -> Self {
        Token::new(TokenKind::Null, "")
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::Null => write!(f, "end of input"),
            _ => write!(f, "{}: {}", self.kind, self.lexeme),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_lexeme_numbering() {
        assert_eq!(TokenKind::Null.code(), 1);
        assert_eq!(TokenKind::Ident.code(), 2);
        assert_eq!(TokenKind::Becomes.code(), 20);
        assert_eq!(TokenKind::Else.code(), 33);
    }

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(TokenKind::keyword("procedure"), Some(TokenKind::Procedure));
        assert_eq!(TokenKind::keyword("odd"), Some(TokenKind::Odd));
        assert_eq!(TokenKind::keyword("Begin"), None);
        assert_eq!(TokenKind::keyword("x"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Token::new(TokenKind::Ident, "x").to_string(), "identsym: x");
        assert_eq!(Token::null().to_string(), "end of input");
        assert_eq!(TokenKind::Semicolon.to_string(), "semicolonsym");
    }
}
