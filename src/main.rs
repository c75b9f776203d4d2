use std::{
    fs, io,
    path::{Path, PathBuf},
};

use clap::{Parser, ValueEnum};
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use pl0c::{
    CompileError, CompilerConfig, Program,
    bytecode::{
        code_buffer::MAX_CODE_LENGTH, compile::MAX_NESTING, disasm::print_program,
        symbol_table::MAX_SYMBOLS,
    },
    compile_with_config,
    frontend::{
        lexer::{Lexer, LexerError},
        token_dumper::TokenDumper,
    },
};

/// pl0c - compile PL/0 source into stack-machine instructions
#[derive(Debug, Parser)]
#[command(name = "pl0c", version, about)]
struct Args {
    /// PL/0 source file
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Where to write the compiled instructions
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Output encoding
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Print the lexeme table and list, then stop
    #[arg(long)]
    tokens: bool,

    /// Print only the numeric lexeme list, then stop
    #[arg(long)]
    lexemes: bool,

    /// Print a disassembly of the compiled program
    #[arg(long)]
    disasm: bool,

    /// Disable ANSI colors in token dumps
    #[arg(long)]
    no_color: bool,

    /// Symbol table capacity
    #[arg(long, default_value_t = MAX_SYMBOLS)]
    max_symbols: usize,

    /// Instruction capacity
    #[arg(long, default_value_t = MAX_CODE_LENGTH)]
    max_code: usize,

    /// Deepest allowed nesting of blocks, statements and parentheses
    #[arg(long, default_value_t = MAX_NESTING)]
    max_nesting: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// One `op lex operand` line per instruction
    Text,
    /// postcard-encoded program
    Binary,
}

/// Everything that makes `pl0c` exit with a failure status.
#[derive(Debug, Error)]
enum CliError {
    #[error("Error: cannot read '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Lexer error: {0}")]
    Lexer(#[from] LexerError),

    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Error: cannot encode program: {0}")]
    Encode(String),

    #[error("Error: cannot write '{}': {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let Some(input) = args.input.as_deref() else {
        print_usage();
        return Ok(());
    };

    let source = fs::read_to_string(input).map_err(|source| CliError::Read {
        path: input.to_path_buf(),
        source,
    })?;

    if args.tokens || args.lexemes {
        return dump_tokens(&source, args);
    }

    let Some(output) = args.output.as_deref() else {
        print_usage();
        return Ok(());
    };

    let config = CompilerConfig {
        max_symbols: args.max_symbols,
        max_code_length: args.max_code,
        max_nesting: args.max_nesting,
    };

    let program = compile_with_config(&source, config)?;
    println!("No errors, program is syntactically correct.");

    if args.disasm {
        print_program(&program);
    }

    write_program(&program, output, args.format)?;
    info!(
        output = %output.display(),
        instructions = program.len(),
        "wrote program"
    );
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn print_usage() {
    eprintln!("Error: not enough arguments.");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  pl0c <input> <output>           Compile to text instructions");
    eprintln!("  pl0c -f binary <input> <output> Compile to postcard binary");
    eprintln!("  pl0c --tokens <input>           Show the lexeme table and list");
    eprintln!("  pl0c --lexemes <input>          Show only the lexeme list");
    eprintln!("  pl0c --help                     Show all options");
}

fn dump_tokens(source: &str, args: &Args) -> Result<(), CliError> {
    let tokens = Lexer::new(source).tokenize()?;

    let mut dumper = TokenDumper::new();
    if args.no_color {
        dumper = dumper.no_color();
    }
    if args.lexemes {
        dumper = dumper.list_only();
    }
    dumper.dump(&tokens);
    Ok(())
}

fn write_program(program: &Program, output: &Path, format: Format) -> Result<(), CliError> {
    debug!(format = ?format, "encoding program");
    let bytes = match format {
        Format::Text => program.to_text().into_bytes(),
        Format::Binary => program
            .to_bytes()
            .map_err(|e| CliError::Encode(e.to_string()))?,
    };

    fs::write(output, bytes).map_err(|source| CliError::Write {
        path: output.to_path_buf(),
        source,
    })
}
