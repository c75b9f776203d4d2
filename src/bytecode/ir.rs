use serde::{Deserialize, Serialize};

use crate::bytecode::Opcode;

/// A single VM instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub op: Opcode,
    /// Number of static links to follow outward from the executing frame.
    pub lex_delta: u32,
    pub operand: i32,
}

impl Instruction {
    pub fn new(op: Opcode, lex_delta: u32, operand: i32) -> Self {
        Self {
            op,
            lex_delta,
            operand,
        }
    }
}

impl std::fmt::Display for Instruction {
    /// The on-disk form: `op lex operand`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.op.code(), self.lex_delta, self.operand)
    }
}

/// A compiled program: instructions in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub code: Vec<Instruction>,
}

impl Program {
    pub fn new(code: Vec<Instruction>) -> Self {
        Self { code }
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// One `op lex operand` line per instruction.
    pub fn to_text(&self) -> String {
        self.code.iter().map(|ins| format!("{}\n", ins)).collect()
    }

    /// Compact binary encoding (postcard).
    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Program {
        Program::new(vec![
            Instruction::new(Opcode::Jmp, 0, 1),
            Instruction::new(Opcode::Inc, 0, 5),
            Instruction::new(Opcode::Lit, 0, -3),
            Instruction::new(Opcode::Sio, 0, 2),
        ])
    }

    #[test]
    fn test_instruction_display() {
        let ins = Instruction::new(Opcode::Lod, 2, 4);
        assert_eq!(ins.to_string(), "3 2 4");
    }

    #[test]
    fn test_to_text() {
        assert_eq!(sample().to_text(), "7 0 1\n6 0 5\n1 0 -3\n9 0 2\n");
    }

    #[test]
    fn test_binary_encoding_is_readable_back() {
        let program = sample();
        let bytes = program.to_bytes().unwrap();
        assert_eq!(Program::from_bytes(&bytes).unwrap(), program);
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(Program::from_bytes(&[0xff, 0xff, 0xff]).is_err());
    }

    #[test]
    fn test_empty_program() {
        let program = Program::default();
        assert!(program.is_empty());
        assert_eq!(program.to_text(), "");
    }
}
