//! pl0c - single-pass PL/0 compiler
//!
//! Translates PL/0 (constants, variables, nested procedures, structured
//! control flow) into instructions for a stack-based virtual machine. The
//! parser, symbol table and code generator run as one recursive-descent pass.

pub mod bytecode;
pub mod frontend;

pub use bytecode::compile::{Compiler, CompilerConfig, compile, compile_with_config};
pub use bytecode::compile_error::{CompileError, CompileResult};
pub use bytecode::{Instruction, Opcode, Program};
