use crate::bytecode::{Instruction, Opcode, Operation, Program, SysCall};

const RULE: &str = "════════════════════════════════════════";

/// Print disassembly of a compiled program
pub fn print_program(program: &Program) {
    print!("{}", disassemble(program));
}

/// Mnemonic listing with jump-target markers.
pub fn disassemble(program: &Program) -> String {
    let targets = collect_jump_targets(&program.code);

    let mut lines = vec![
        RULE.to_string(),
        format!(" {} instructions", program.len()),
        RULE.to_string(),
    ];

    for (address, ins) in program.code.iter().enumerate() {
        let marker = if targets.contains(&address) {
            lines.push("      ┌──────────────────────────────────".to_string());
            "►"
        } else {
            " "
        };
        lines.push(format!("{:04} {} {}", address, marker, format_instruction(ins)));
    }

    lines.push(String::new());
    lines.join("\n")
}

fn collect_jump_targets(code: &[Instruction]) -> Vec<usize> {
    let mut targets = Vec::new();

    for ins in code {
        if ins.op.is_jump() {
            let target = ins.operand as usize;
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
    }

    targets
}

/// One instruction as `MNEMONIC lex operand` plus a note on what it does.
pub fn format_instruction(ins: &Instruction) -> String {
    let base = format!(
        "{:<4}{:>2}{:>6}",
        ins.op.mnemonic(),
        ins.lex_delta,
        ins.operand
    );

    let note = match ins.op {
        Opcode::Opr => match Operation::from_code(ins.operand) {
            Some(op) => op.mnemonic().to_string(),
            None => "?".to_string(),
        },
        Opcode::Sio => match SysCall::from_code(ins.operand) {
            Some(call) => call.mnemonic().to_string(),
            None => "?".to_string(),
        },
        Opcode::Jmp | Opcode::Jpc | Opcode::Cal => format!("→ {:04}", ins.operand),
        Opcode::Lod | Opcode::Sto if ins.lex_delta > 0 => {
            format!("{} frame(s) out", ins.lex_delta)
        }
        _ => String::new(),
    };

    if note.is_empty() {
        base
    } else {
        format!("{}   ; {}", base, note)
    }
}
