use thiserror::Error;

use crate::frontend::{
    lexer::{LexerError, Span},
    token::{Token, TokenKind},
};

pub type CompileResult<T> = Result<T, CompileError>;

/// Where in the token stream an error was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// 1-based ordinal of the offending token.
    pub index: usize,
    pub line: usize,
    pub col: usize,
}

impl Location {
    pub fn new(index: usize, span: Span) -> Self {
        Self {
            index,
            line: span.line,
            col: span.col,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: token #{}", self.line, self.col, self.index)
    }
}

/// Every way a compilation can fail. All of them stop the compiler at the
/// first occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The lexer could not classify the input for the requested token
    #[error("lexer failed to parse token #{index}: {source}")]
    Lexical {
        index: usize,
        #[source]
        source: LexerError,
    },

    /// The grammar required one token kind and got another
    #[error("{at}: wrong token: expected {expected}, but found {found}: {lexeme} instead")]
    UnexpectedToken {
        at: Location,
        expected: TokenKind,
        found: TokenKind,
        lexeme: String,
    },

    /// A condition without a relational operator between its expressions
    #[error("{at}: expected a relational operator, but found {found}: {lexeme} instead")]
    ExpectedRelation {
        at: Location,
        found: TokenKind,
        lexeme: String,
    },

    /// Same constant/variable name declared twice at one level
    #[error("{at}: duplicate identifier '{name}' at lexical level {level}")]
    DuplicateIdentifier {
        at: Location,
        name: String,
        level: u32,
    },

    /// Procedure names share one namespace
    #[error("{at}: procedure '{name}' already exists (at lexical level {level})")]
    DuplicateProcedure {
        at: Location,
        name: String,
        level: u32,
    },

    #[error("{at}: identifier not declared: {name}")]
    Undeclared { at: Location, name: String },

    #[error("{at}: undeclared procedure: {name}")]
    UndeclaredProcedure { at: Location, name: String },

    #[error("{at}: cannot change the value of constant '{name}'")]
    AssignToConstant { at: Location, name: String },

    #[error("{at}: too many symbols in the symbol table (limit {limit})")]
    TooManySymbols { at: Location, limit: usize },

    #[error("{at}: program too large (limit {limit} instructions)")]
    ProgramTooLarge { at: Location, limit: usize },

    #[error("{at}: nesting too deep (limit {limit})")]
    NestingTooDeep { at: Location, limit: usize },

    /// Internal compiler error (shouldn't happen in normal use)
    #[error("internal compiler error: {0}")]
    Internal(String),
}

impl CompileError {
    pub fn lexical(index: usize, source: LexerError) -> Self {
        CompileError::Lexical { index, source }
    }

    pub fn unexpected(at: Location, expected: TokenKind, found: &Token) -> Self {
        CompileError::UnexpectedToken {
            at,
            expected,
            found: found.kind,
            lexeme: found.lexeme.clone(),
        }
    }

    pub fn expected_relation(at: Location, found: &Token) -> Self {
        CompileError::ExpectedRelation {
            at,
            found: found.kind,
            lexeme: found.lexeme.clone(),
        }
    }

    pub fn undeclared(at: Location, name: &str) -> Self {
        CompileError::Undeclared {
            at,
            name: name.to_string(),
        }
    }

    pub fn undeclared_procedure(at: Location, name: &str) -> Self {
        CompileError::UndeclaredProcedure {
            at,
            name: name.to_string(),
        }
    }

    pub fn assign_to_constant(at: Location, name: &str) -> Self {
        CompileError::AssignToConstant {
            at,
            name: name.to_string(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        CompileError::Internal(msg.into())
    }

    /// Ordinal of the token the error refers to, when there is one.
    pub fn token_index(&self) -> Option<usize> {
        match self {
            CompileError::Lexical { index, .. } => Some(*index),
            CompileError::UnexpectedToken { at, .. }
            | CompileError::ExpectedRelation { at, .. }
            | CompileError::DuplicateIdentifier { at, .. }
            | CompileError::DuplicateProcedure { at, .. }
            | CompileError::Undeclared { at, .. }
            | CompileError::UndeclaredProcedure { at, .. }
            | CompileError::AssignToConstant { at, .. }
            | CompileError::TooManySymbols { at, .. }
            | CompileError::ProgramTooLarge { at, .. }
            | CompileError::NestingTooDeep { at, .. } => Some(at.index),
            CompileError::Internal(_) => None,
        }
    }
}
