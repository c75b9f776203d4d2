use thiserror::Error;
use tracing::trace;

use crate::bytecode::{Instruction, Opcode, Program};

/// Default instruction capacity.
pub const MAX_CODE_LENGTH: usize = 500;

/// Index of an instruction in the buffer.
pub type Address = usize;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeBufferError {
    #[error("program too large (limit {limit} instructions)")]
    Full { limit: usize },

    #[error("{count} placeholder jump(s) never patched")]
    Unpatched { count: usize },
}

/// A jump emitted before its target was known.
///
/// Handed out by `emit_placeholder` and consumed by `patch`, so each
/// placeholder is patched at most once.
#[must_use = "a placeholder jump must be patched"]
#[derive(Debug, PartialEq, Eq)]
pub struct PatchSite(Address);

/// Append-only instruction sequence whose operands can be back-patched.
#[derive(Debug)]
pub struct CodeBuffer {
    code: Vec<Instruction>,
    capacity: usize,
    pending: usize,
}

impl CodeBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            code: Vec::new(),
            // addresses are stored in i32 operands
            capacity: capacity.min(i32::MAX as usize),
            pending: 0,
        }
    }

    /// Address the next emitted instruction will get.
    pub fn next_address(&self) -> Address {
        self.code.len()
    }

    pub fn emit(
        &mut self,
        op: Opcode,
        lex_delta: u32,
        operand: i32,
    ) -> Result<Address, CodeBufferError> {
        if self.code.len() >= self.capacity {
            return Err(CodeBufferError::Full {
                limit: self.capacity,
            });
        }

        let address = self.code.len();
        let ins = Instruction::new(op, lex_delta, operand);
        trace!(address, "emit {}", ins);
        self.code.push(ins);
        Ok(address)
    }

    /// Emits a jump whose target is filled in later by `patch`.
    pub fn emit_placeholder(
        &mut self,
        op: Opcode,
        lex_delta: u32,
    ) -> Result<PatchSite, CodeBufferError> {
        let address = self.emit(op, lex_delta, 0)?;
        self.pending += 1;
        Ok(PatchSite(address))
    }

    /// Rewrites the operand of a placeholder.
    pub fn patch(&mut self, site: PatchSite, operand: i32) {
        if let Some(ins) = self.code.get_mut(site.0) {
            trace!(address = site.0, operand, "patch {}", ins.op.mnemonic());
            ins.operand = operand;
            self.pending -= 1;
        }
    }

    /// Patches a placeholder to jump to the next instruction to be emitted.
    pub fn patch_here(&mut self, site: PatchSite) {
        let here = self.next_address() as i32;
        self.patch(site, here);
    }

    pub fn finalize(self) -> Result<Program, CodeBufferError> {
        if self.pending > 0 {
            return Err(CodeBufferError::Unpatched {
                count: self.pending,
            });
        }
        Ok(Program::new(self.code))
    }
}

impl Default for CodeBuffer {
    fn default() -> Self {
        Self::new(MAX_CODE_LENGTH)
    }
}
