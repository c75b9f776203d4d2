use std::fmt::Write as _;

use crate::frontend::lexer::Spanned;
use crate::frontend::token::TokenKind;

/// Renders a lexed token stream as a lexeme table and the numeric lexeme list.
pub struct TokenDumper {
    pub color: bool,
    pub show_table: bool,
}

impl Default for TokenDumper {
    fn default() -> Self {
        Self {
            color: true,
            show_table: true,
        }
    }
}

impl TokenDumper {
    // ANSI colors
    const RESET: &'static str = "\x1b[0m";
    const DIM: &'static str = "\x1b[2m";
    const YEL: &'static str = "\x1b[33m";
    const CYN: &'static str = "\x1b[36m";
    const MAG: &'static str = "\x1b[35m";
    const BLU: &'static str = "\x1b[34m";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_color(mut self) -> Self {
        self.color = false;
        self
    }

    /// Only print the lexeme list, not the table.
    pub fn list_only(mut self) -> Self {
        self.show_table = false;
        self
    }

    pub fn dump(&self, tokens: &[Spanned]) {
        print!("{}", self.render(tokens));
    }

    pub fn render(&self, tokens: &[Spanned]) -> String {
        let mut out = String::new();

        if self.show_table {
            for s in tokens {
                self.render_row(&mut out, s);
            }
            out.push('\n');
        }

        out.push_str("Lexeme List:\n");
        out.push_str(&lexeme_list(tokens));
        out.push('\n');
        out
    }

    fn render_row(&self, out: &mut String, s: &Spanned) {
        let colr = if self.color { self.color(s.token.kind) } else { "" };
        let reset = if self.color { Self::RESET } else { "" };

        // writing into a String cannot fail
        let _ = writeln!(
            out,
            "[{:02}:{:02}] {}{:<8} {:<13} {}{}",
            s.span.line,
            s.span.col,
            colr,
            self.category(s.token.kind),
            s.token.kind.name(),
            s.token.lexeme,
            reset
        );
    }

    fn category(&self, kind: TokenKind) -> &'static str {
        use TokenKind::*;
        match kind {
            Null => "EOF",
            Ident => "IDENT",
            Number => "NUMBER",
            Plus | Minus | Mult | Slash => "OP",
            Eql | Neq | Lss | Leq | Gtr | Geq => "CMP",
            LParen | RParen | Comma | Semicolon | Period | Becomes => "PUNCT",
            k if k.is_keyword() => "KEYWORD",
            _ => "OTHER",
        }
    }

    fn color(&self, kind: TokenKind) -> &'static str {
        use TokenKind::*;
        match kind {
            Null => Self::DIM,
            Ident => Self::YEL,
            Number => Self::CYN,
            Plus | Minus | Mult | Slash => Self::MAG,
            Eql | Neq | Lss | Leq | Gtr | Geq => Self::MAG,
            k if k.is_keyword() => Self::BLU,
            _ => Self::RESET,
        }
    }
}

/// The classic space-separated lexeme list: kind codes, with the name or
/// value following identifier and number codes. The terminating `Null` is
/// not listed.
pub fn lexeme_list(tokens: &[Spanned]) -> String {
    let mut parts: Vec<String> = Vec::new();
    for s in tokens {
        let kind = s.token.kind;
        if kind == TokenKind::Null {
            break;
        }
        parts.push(kind.code().to_string());
        match kind {
            TokenKind::Ident => parts.push(s.token.lexeme.clone()),
            TokenKind::Number => parts.push(s.token.value.to_string()),
            _ => {}
        }
    }
    parts.join(" ")
}
