use tracing::debug;

use crate::{
    bytecode::{
        Opcode, Operation, Program, SysCall,
        code_buffer::{Address, CodeBuffer, CodeBufferError, MAX_CODE_LENGTH, PatchSite},
        compile_error::{CompileError, CompileResult, Location},
        symbol_table::{DeclareError, MAX_SYMBOLS, Symbol, SymbolKind, SymbolTable},
    },
    frontend::{
        lexer::{Lexer, Span, Spanned, TokenSource},
        token::{Token, TokenKind},
    },
};

/// Frame slots reserved for the calling convention (return value, static
/// link, dynamic link, return address). Variables start after them.
pub const FRAME_BASE: u32 = 4;

/// Deepest allowed nesting of procedures, compound statements, `if`,
/// `while` and parenthesized expressions.
pub const MAX_NESTING: usize = 256;

/// Capacity limits for one compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerConfig {
    pub max_symbols: usize,
    pub max_code_length: usize,
    pub max_nesting: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            max_symbols: MAX_SYMBOLS,
            max_code_length: MAX_CODE_LENGTH,
            max_nesting: MAX_NESTING,
        }
    }
}

/// Per-traversal state threaded through every grammar method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerState {
    /// Next free variable slot in the frame being compiled.
    pub frame_size: u32,
    /// Current lexical level; 0 is the main program.
    pub level: u32,
    /// Open nested constructs around the current token.
    pub depth: usize,
}

impl Default for CompilerState {
    fn default() -> Self {
        Self {
            frame_size: FRAME_BASE,
            level: 0,
            depth: 0,
        }
    }
}

/// Compiles PL/0 source text with the default limits.
pub fn compile(source: &str) -> CompileResult<Program> {
    Compiler::new(source).compile_program()
}

pub fn compile_with_config(source: &str, config: CompilerConfig) -> CompileResult<Program> {
    Compiler::with_config(source, config).compile_program()
}

/// Single-pass recursive-descent compiler.
///
/// Each grammar nonterminal has one method. Methods look at the current
/// token, consume what they recognize, consult the symbol table and emit
/// instructions as they go. Forward jumps are emitted as placeholders and
/// patched once their target address is known.
pub struct Compiler<S: TokenSource> {
    tokens: S,
    /// The one-token lookahead.
    current: Spanned,
    /// 1-based ordinal of `current`; 0 before the first token is read.
    index: usize,
    symbols: SymbolTable,
    code: CodeBuffer,
    state: CompilerState,
    max_nesting: usize,
}

impl Compiler<Lexer> {
    pub fn new(source: &str) -> Self {
        Self::with_config(source, CompilerConfig::default())
    }

    pub fn with_config(source: &str, config: CompilerConfig) -> Self {
        Self::from_tokens(Lexer::new(source), config)
    }
}

impl<S: TokenSource> Compiler<S> {
    pub fn from_tokens(tokens: S, config: CompilerConfig) -> Self {
        Self {
            tokens,
            current: Spanned {
                token: Token::null(),
                span: Span::default(),
            },
            index: 0,
            symbols: SymbolTable::new(config.max_symbols),
            code: CodeBuffer::new(config.max_code_length),
            state: CompilerState::default(),
            max_nesting: config.max_nesting,
        }
    }

    /// program = block "." .
    pub fn compile_program(mut self) -> CompileResult<Program> {
        self.advance()?;
        self.block()?;
        self.expect(TokenKind::Period)?;
        self.emit(Opcode::Sio, 0, SysCall::Halt.code())?;

        debug!(
            instructions = self.code.next_address(),
            symbols = self.symbols.len(),
            tokens = self.index,
            "compiled program"
        );

        self.code
            .finalize()
            .map_err(|e| CompileError::internal(e.to_string()))
    }

    // =========================================================================
    // Token handling
    // =========================================================================

    fn kind(&self) -> TokenKind {
        self.current.token.kind
    }

    fn location(&self) -> Location {
        Location::new(self.index, self.current.span)
    }

    /// Pulls the next token and returns the one it replaces.
    fn advance(&mut self) -> CompileResult<Spanned> {
        let next_index = self.index + 1;
        let next = self
            .tokens
            .next_token()
            .map_err(|e| CompileError::lexical(next_index, e))?;
        self.index = next_index;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expect(&mut self, kind: TokenKind) -> CompileResult<Spanned> {
        if self.kind() != kind {
            return Err(CompileError::unexpected(
                self.location(),
                kind,
                &self.current.token,
            ));
        }
        self.advance()
    }

    /// Consumes an identifier, returning its name and where it stood.
    fn expect_ident(&mut self) -> CompileResult<(String, Location)> {
        let at = self.location();
        let spanned = self.expect(TokenKind::Ident)?;
        Ok((spanned.token.lexeme, at))
    }

    /// Runs `f` one nesting level deeper, failing once the limit is reached.
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> CompileResult<T>,
    ) -> CompileResult<T> {
        if self.state.depth >= self.max_nesting {
            return Err(CompileError::NestingTooDeep {
                at: self.location(),
                limit: self.max_nesting,
            });
        }

        self.state.depth += 1;
        let result = f(self);
        self.state.depth -= 1;
        result
    }

    // =========================================================================
    // Emission
    // =========================================================================

    fn code_error(&self, err: CodeBufferError) -> CompileError {
        match err {
            CodeBufferError::Full { limit } => CompileError::ProgramTooLarge {
                at: self.location(),
                limit,
            },
            other => CompileError::internal(other.to_string()),
        }
    }

    fn emit(&mut self, op: Opcode, lex_delta: u32, operand: i32) -> CompileResult<Address> {
        self.code
            .emit(op, lex_delta, operand)
            .map_err(|e| self.code_error(e))
    }

    fn emit_op(&mut self, operation: Operation) -> CompileResult<Address> {
        self.emit(Opcode::Opr, 0, operation.code())
    }

    fn emit_placeholder(&mut self, op: Opcode) -> CompileResult<PatchSite> {
        self.code
            .emit_placeholder(op, 0)
            .map_err(|e| self.code_error(e))
    }

    /// Static-link distance from the current level to a declaration.
    fn lex_delta(&self, from_level: u32, symbol: &Symbol) -> CompileResult<u32> {
        from_level.checked_sub(symbol.level).ok_or_else(|| {
            CompileError::internal(format!(
                "'{}' declared at level {} is not visible from level {}",
                symbol.name, symbol.level, from_level
            ))
        })
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn declare_error(&self, err: DeclareError, at: Location) -> CompileError {
        match err {
            DeclareError::Duplicate { name, level } => {
                CompileError::DuplicateIdentifier { at, name, level }
            }
            DeclareError::DuplicateProcedure { name, level } => {
                CompileError::DuplicateProcedure { at, name, level }
            }
            DeclareError::Full { limit } => CompileError::TooManySymbols { at, limit },
        }
    }

    fn declare(&mut self, symbol: Symbol, at: Location) -> CompileResult<()> {
        self.symbols
            .declare(symbol)
            .map_err(|e| self.declare_error(e, at))
    }

    /// block = [const-decl] [var-decl] {proc-decl} statement .
    fn block(&mut self) -> CompileResult<()> {
        // Jump over the bodies of nested procedures to this block's code
        let entry_jump = self.emit_placeholder(Opcode::Jmp)?;

        self.const_declarations()?;
        self.var_declarations()?;
        let frame_size = self.state.frame_size;

        self.state.level += 1;
        self.procedure_declarations()?;
        self.state.level -= 1;

        self.code.patch_here(entry_jump);
        self.emit(Opcode::Inc, 0, frame_size as i32)?;

        self.statement()?;

        if self.state.level > 0 {
            self.emit_op(Operation::Ret)?;
        }
        Ok(())
    }

    /// const-decl = "const" ident "=" number {"," ident "=" number} ";" .
    fn const_declarations(&mut self) -> CompileResult<()> {
        if self.kind() != TokenKind::Const {
            return Ok(());
        }
        self.advance()?;

        self.const_declaration()?;
        while self.kind() == TokenKind::Comma {
            self.advance()?;
            self.const_declaration()?;
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(())
    }

    fn const_declaration(&mut self) -> CompileResult<()> {
        let (name, at) = self.expect_ident()?;

        // Duplicates are reported before the value is read
        let mut symbol = Symbol::constant(name, 0, self.state.level);
        self.symbols
            .check(&symbol)
            .map_err(|e| self.declare_error(e, at))?;

        self.expect(TokenKind::Eql)?;
        symbol.value = self.expect(TokenKind::Number)?.token.value;
        self.declare(symbol, at)
    }

    /// var-decl = "var" ident {"," ident} ";" .
    fn var_declarations(&mut self) -> CompileResult<()> {
        if self.kind() != TokenKind::Var {
            return Ok(());
        }
        self.advance()?;

        self.var_declaration()?;
        while self.kind() == TokenKind::Comma {
            self.advance()?;
            self.var_declaration()?;
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(())
    }

    fn var_declaration(&mut self) -> CompileResult<()> {
        let (name, at) = self.expect_ident()?;
        let address = self.state.frame_size as i32;
        self.declare(Symbol::variable(name, self.state.level, address), at)?;
        self.state.frame_size += 1;
        Ok(())
    }

    /// proc-decl = "procedure" ident ";" block ";" .
    ///
    /// Called with the level already raised to the level of the bodies.
    fn procedure_declarations(&mut self) -> CompileResult<()> {
        while self.kind() == TokenKind::Procedure {
            self.nested(Self::procedure_declaration)?;
        }
        Ok(())
    }

    fn procedure_declaration(&mut self) -> CompileResult<()> {
        self.advance()?;
        let (name, at) = self.expect_ident()?;

        let entry = self.code.next_address() as i32;
        self.declare(Symbol::procedure(&name, self.state.level, entry), at)?;
        debug!(name = %name, level = self.state.level, entry, "compile procedure");

        // Symbols declared inside the body live until the closing ";"
        let scope = self.symbols.enter_scope();
        let outer_frame = std::mem::replace(&mut self.state.frame_size, FRAME_BASE);

        self.expect(TokenKind::Semicolon)?;
        self.block()?;
        self.expect(TokenKind::Semicolon)?;

        self.symbols.leave_scope(scope);
        self.state.frame_size = outer_frame;
        Ok(())
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Dispatches on the leading token; anything else is the empty statement.
    fn statement(&mut self) -> CompileResult<()> {
        match self.kind() {
            TokenKind::Ident => self.assignment(),
            TokenKind::Call => self.call(),
            TokenKind::Begin => self.nested(Self::compound),
            TokenKind::If => self.nested(Self::conditional),
            TokenKind::While => self.nested(Self::while_loop),
            TokenKind::Read => self.read(),
            TokenKind::Write => self.write(),
            _ => Ok(()),
        }
    }

    /// ident ":=" expression
    fn assignment(&mut self) -> CompileResult<()> {
        let (name, at) = self.expect_ident()?;
        self.expect(TokenKind::Becomes)?;
        self.expression()?;
        self.store(&name, at)
    }

    /// "call" ident
    fn call(&mut self) -> CompileResult<()> {
        self.advance()?;
        let (name, at) = self.expect_ident()?;

        let procedure = self
            .symbols
            .resolve_procedure(&name)
            .cloned()
            .ok_or_else(|| CompileError::undeclared_procedure(at, &name))?;

        // The callee runs one level deeper than where it was declared
        let delta = self.lex_delta(self.state.level + 1, &procedure)?;
        self.emit(Opcode::Cal, delta, procedure.address)?;
        Ok(())
    }

    /// "begin" statement {";" statement} "end"
    fn compound(&mut self) -> CompileResult<()> {
        self.advance()?;
        self.statement()?;
        while self.kind() == TokenKind::Semicolon {
            self.advance()?;
            self.statement()?;
        }
        self.expect(TokenKind::End)?;
        Ok(())
    }

    /// "if" condition "then" statement ["else" statement]
    fn conditional(&mut self) -> CompileResult<()> {
        self.advance()?;
        self.condition()?;
        let skip_then = self.emit_placeholder(Opcode::Jpc)?;

        self.expect(TokenKind::Then)?;
        self.statement()?;

        if self.kind() == TokenKind::Else {
            self.advance()?;
            let skip_else = self.emit_placeholder(Opcode::Jmp)?;
            self.code.patch_here(skip_then);
            self.statement()?;
            self.code.patch_here(skip_else);
        } else {
            self.code.patch_here(skip_then);
        }
        Ok(())
    }

    /// "while" condition "do" statement
    fn while_loop(&mut self) -> CompileResult<()> {
        self.advance()?;
        let loop_start = self.code.next_address() as i32;

        self.condition()?;
        let exit = self.emit_placeholder(Opcode::Jpc)?;

        self.expect(TokenKind::Do)?;
        self.statement()?;

        self.emit(Opcode::Jmp, 0, loop_start)?;
        self.code.patch_here(exit);
        Ok(())
    }

    /// "read" ident
    fn read(&mut self) -> CompileResult<()> {
        self.advance()?;
        let (name, at) = self.expect_ident()?;
        self.emit(Opcode::Sio, 0, SysCall::Read.code())?;
        self.store(&name, at)
    }

    /// "write" ident
    fn write(&mut self) -> CompileResult<()> {
        self.advance()?;
        let (name, at) = self.expect_ident()?;
        self.load(&name, at)?;
        self.emit(Opcode::Sio, 0, SysCall::Write.code())?;
        Ok(())
    }

    /// Pops the top of stack into variable `name`.
    fn store(&mut self, name: &str, at: Location) -> CompileResult<()> {
        let symbol = self
            .symbols
            .resolve(name)
            .cloned()
            .ok_or_else(|| CompileError::undeclared(at, name))?;

        if symbol.kind == SymbolKind::Constant {
            return Err(CompileError::assign_to_constant(at, name));
        }

        let delta = self.lex_delta(self.state.level, &symbol)?;
        self.emit(Opcode::Sto, delta, symbol.address)?;
        Ok(())
    }

    /// Pushes the value of constant or variable `name`.
    fn load(&mut self, name: &str, at: Location) -> CompileResult<()> {
        let symbol = self
            .symbols
            .resolve(name)
            .cloned()
            .ok_or_else(|| CompileError::undeclared(at, name))?;

        match symbol.kind {
            SymbolKind::Constant => {
                self.emit(Opcode::Lit, 0, symbol.value)?;
            }
            _ => {
                let delta = self.lex_delta(self.state.level, &symbol)?;
                self.emit(Opcode::Lod, delta, symbol.address)?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// condition = "odd" expression | expression rel-op expression .
    fn condition(&mut self) -> CompileResult<()> {
        if self.kind() == TokenKind::Odd {
            self.advance()?;
            self.expression()?;
            self.emit_op(Operation::Odd)?;
            return Ok(());
        }

        self.expression()?;

        let operation = match self.kind() {
            TokenKind::Eql => Operation::Eql,
            TokenKind::Neq => Operation::Neq,
            TokenKind::Lss => Operation::Lss,
            TokenKind::Leq => Operation::Leq,
            TokenKind::Gtr => Operation::Gtr,
            TokenKind::Geq => Operation::Geq,
            _ => {
                return Err(CompileError::expected_relation(
                    self.location(),
                    &self.current.token,
                ));
            }
        };
        self.advance()?;

        self.expression()?;
        self.emit_op(operation)?;
        Ok(())
    }

    /// expression = ["+" | "-"] term {("+" | "-") term} .
    fn expression(&mut self) -> CompileResult<()> {
        let negate = match self.kind() {
            TokenKind::Plus => {
                self.advance()?;
                false
            }
            TokenKind::Minus => {
                self.advance()?;
                true
            }
            _ => false,
        };

        self.term()?;
        if negate {
            self.emit_op(Operation::Neg)?;
        }

        loop {
            let operation = match self.kind() {
                TokenKind::Plus => Operation::Add,
                TokenKind::Minus => Operation::Sub,
                _ => return Ok(()),
            };
            self.advance()?;
            self.term()?;
            self.emit_op(operation)?;
        }
    }

    /// term = factor {("*" | "/") factor} .
    fn term(&mut self) -> CompileResult<()> {
        self.factor()?;

        loop {
            let operation = match self.kind() {
                TokenKind::Mult => Operation::Mul,
                TokenKind::Slash => Operation::Div,
                _ => return Ok(()),
            };
            self.advance()?;
            self.factor()?;
            self.emit_op(operation)?;
        }
    }

    /// factor = ident | number | "(" expression ")" .
    fn factor(&mut self) -> CompileResult<()> {
        match self.kind() {
            TokenKind::Ident => {
                let (name, at) = self.expect_ident()?;
                self.load(&name, at)
            }
            TokenKind::Number => {
                let value = self.advance()?.token.value;
                self.emit(Opcode::Lit, 0, value)?;
                Ok(())
            }
            _ => self.nested(|this| {
                this.expect(TokenKind::LParen)?;
                this.expression()?;
                this.expect(TokenKind::RParen)?;
                Ok(())
            }),
        }
    }
}
