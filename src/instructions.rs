use serde::{Deserialize, Serialize};

/// The 21 opcodes of the ISA. Discriminants are the 5-bit codes placed in bits 27..=31.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Opcode {
    Add = 0,
    Sub = 1,
    Mul = 2,
    Div = 3,
    Mod = 4,
    Cmp = 5,
    And = 6,
    Or = 7,
    Not = 8,
    Mov = 9,
    Lsl = 10,
    Lsr = 11,
    Asr = 12,
    Nop = 13,
    Ld = 14,
    St = 15,
    Beq = 16,
    Bgt = 17,
    B = 18,
    Call = 19,
    Ret = 20,
}

/// Operand layout class; selects how the encoder reads the operand list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Format {
    /// `nop`, `ret`
    NoOperand,
    /// `rd, rs1, rs2|imm`
    Alu3,
    /// `rd, rs2|imm`
    Unary2,
    /// `rs1, rs2|imm`
    Compare,
    /// `rd, disp[rN]`
    Memory,
    /// `label|imm`
    Branch,
}

impl Format {
    /// Number of operands the format reads.
    pub fn arity(self) -> usize {
        match self {
            Format::NoOperand => 0,
            Format::Branch => 1,
            Format::Unary2 | Format::Compare | Format::Memory => 2,
            Format::Alu3 => 3,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InstrDesc {
    pub op: Opcode,
    pub mnemonic: &'static str,
    pub format: Format,
}

pub const TABLE: &[InstrDesc] = &[
    InstrDesc { op: Opcode::Add, mnemonic: "add", format: Format::Alu3 },
    InstrDesc { op: Opcode::Sub, mnemonic: "sub", format: Format::Alu3 },
    InstrDesc { op: Opcode::Mul, mnemonic: "mul", format: Format::Alu3 },
    InstrDesc { op: Opcode::Div, mnemonic: "div", format: Format::Alu3 },
    InstrDesc { op: Opcode::Mod, mnemonic: "mod", format: Format::Alu3 },
    InstrDesc { op: Opcode::Cmp, mnemonic: "cmp", format: Format::Compare },
    InstrDesc { op: Opcode::And, mnemonic: "and", format: Format::Alu3 },
    InstrDesc { op: Opcode::Or, mnemonic: "or", format: Format::Alu3 },
    InstrDesc { op: Opcode::Not, mnemonic: "not", format: Format::Unary2 },
    InstrDesc { op: Opcode::Mov, mnemonic: "mov", format: Format::Unary2 },
    InstrDesc { op: Opcode::Lsl, mnemonic: "lsl", format: Format::Alu3 },
    InstrDesc { op: Opcode::Lsr, mnemonic: "lsr", format: Format::Alu3 },
    InstrDesc { op: Opcode::Asr, mnemonic: "asr", format: Format::Alu3 },
    InstrDesc { op: Opcode::Nop, mnemonic: "nop", format: Format::NoOperand },
    InstrDesc { op: Opcode::Ld, mnemonic: "ld", format: Format::Memory },
    InstrDesc { op: Opcode::St, mnemonic: "st", format: Format::Memory },
    InstrDesc { op: Opcode::Beq, mnemonic: "beq", format: Format::Branch },
    InstrDesc { op: Opcode::Bgt, mnemonic: "bgt", format: Format::Branch },
    InstrDesc { op: Opcode::B, mnemonic: "b", format: Format::Branch },
    InstrDesc { op: Opcode::Call, mnemonic: "call", format: Format::Branch },
    InstrDesc { op: Opcode::Ret, mnemonic: "ret", format: Format::NoOperand },
];

impl Opcode {
    /// Case-insensitive mnemonic lookup.
    pub fn from_mnemonic(s: &str) -> Option<Opcode> {
        TABLE
            .iter()
            .find(|d| d.mnemonic.eq_ignore_ascii_case(s))
            .map(|d| d.op)
    }

    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn desc(self) -> &'static InstrDesc {
        // TABLE is ordered by code
        &TABLE[self as usize]
    }

    pub fn mnemonic(self) -> &'static str {
        self.desc().mnemonic
    }

    pub fn format(self) -> Format {
        self.desc().format
    }
}
