use serde::{Deserialize, Serialize};

// =============================================================================
// OPCODE - VM instruction set
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    /// Push the operand as a literal.
    Lit = 1,
    /// Arithmetic, relational or return, selected by an `Operation` operand.
    Opr = 2,
    /// Push the variable at frame offset `operand`, `lex_delta` frames out.
    Lod = 3,
    /// Pop into the variable at frame offset `operand`, `lex_delta` frames out.
    Sto = 4,
    /// Call the procedure at instruction `operand`.
    Cal = 5,
    /// Allocate `operand` slots for the current frame.
    Inc = 6,
    /// Unconditional jump to instruction `operand`.
    Jmp = 7,
    /// Pop; jump to instruction `operand` if the value is zero.
    Jpc = 8,
    /// System call selected by a `SysCall` operand.
    Sio = 9,
}

impl Opcode {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Lit => "LIT",
            Opcode::Opr => "OPR",
            Opcode::Lod => "LOD",
            Opcode::Sto => "STO",
            Opcode::Cal => "CAL",
            Opcode::Inc => "INC",
            Opcode::Jmp => "JMP",
            Opcode::Jpc => "JPC",
            Opcode::Sio => "SIO",
        }
    }

    /// Opcodes whose operand is an instruction address.
    pub fn is_jump(self) -> bool {
        matches!(self, Opcode::Jmp | Opcode::Jpc | Opcode::Cal)
    }
}

/// `OPR` sub-codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Operation {
    Ret = 0,
    Neg = 1,
    Add = 2,
    Sub = 3,
    Mul = 4,
    Div = 5,
    Odd = 6,
    Eql = 8,
    Neq = 9,
    Lss = 10,
    Leq = 11,
    Gtr = 12,
    Geq = 13,
}

impl Operation {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Operation> {
        let op = match code {
            0 => Operation::Ret,
            1 => Operation::Neg,
            2 => Operation::Add,
            3 => Operation::Sub,
            4 => Operation::Mul,
            5 => Operation::Div,
            6 => Operation::Odd,
            8 => Operation::Eql,
            9 => Operation::Neq,
            10 => Operation::Lss,
            11 => Operation::Leq,
            12 => Operation::Gtr,
            13 => Operation::Geq,
            _ => return None,
        };
        Some(op)
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Operation::Ret => "RET",
            Operation::Neg => "NEG",
            Operation::Add => "ADD",
            Operation::Sub => "SUB",
            Operation::Mul => "MUL",
            Operation::Div => "DIV",
            Operation::Odd => "ODD",
            Operation::Eql => "EQL",
            Operation::Neq => "NEQ",
            Operation::Lss => "LSS",
            Operation::Leq => "LEQ",
            Operation::Gtr => "GTR",
            Operation::Geq => "GEQ",
        }
    }
}

/// `SIO` sub-codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SysCall {
    Write = 0,
    Read = 1,
    Halt = 2,
}

impl SysCall {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<SysCall> {
        match code {
            0 => Some(SysCall::Write),
            1 => Some(SysCall::Read),
            2 => Some(SysCall::Halt),
            _ => None,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            SysCall::Write => "WRITE",
            SysCall::Read => "READ",
            SysCall::Halt => "HALT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_codes() {
        assert_eq!(Opcode::Lit.code(), 1);
        assert_eq!(Opcode::Sio.code(), 9);
        assert_eq!(Opcode::Jpc.code(), 8);
    }

    #[test]
    fn test_operation_gap_at_seven() {
        assert_eq!(Operation::from_code(6), Some(Operation::Odd));
        assert_eq!(Operation::from_code(7), None);
        assert_eq!(Operation::from_code(8), Some(Operation::Eql));
        assert_eq!(Operation::Geq.code(), 13);
    }

    #[test]
    fn test_syscalls() {
        assert_eq!(SysCall::Halt.code(), 2);
        assert_eq!(SysCall::from_code(1), Some(SysCall::Read));
        assert_eq!(SysCall::from_code(3), None);
    }

    #[test]
    fn test_jump_opcodes() {
        assert!(Opcode::Jmp.is_jump());
        assert!(Opcode::Jpc.is_jump());
        assert!(Opcode::Cal.is_jump());
        assert!(!Opcode::Lod.is_jump());
    }
}
