//! Instruction encoder (pass 2).
//!
//! Word layout, high bit first:
//!
//! ```text
//!  31    27 26 25  22 21  18 17  14 13           0
//! [ opcode ][I][ rd  ][ rs1 ][ rs2 ][   unused    ]   I = 0
//! [ opcode ][I][ rd  ][ rs1 ][ imm18                ]   I = 1
//! [ opcode ][ offset27                            ]   branches
//! ```

use tracing::trace;

use crate::assembler::AsmConfig;
use crate::error::EncodeError;
use crate::instructions::{Format, Opcode};
use crate::labels::{classify_line, LabelTable, Line};
use crate::operand::{fits_imm18, imm18, parse_memory, Operand};

pub const OPCODE_SHIFT: u32 = 27;
pub const I_BIT: u32 = 26;
pub const RD_SHIFT: u32 = 22;
pub const RS1_SHIFT: u32 = 18;
pub const RS2_SHIFT: u32 = 14;
pub const REG_MASK: u32 = 0xF;
pub const IMM_MASK: u32 = 0x3FFFF;
pub const OFFSET_MASK: u32 = 0x7FF_FFFF;
pub const OFFSET_BITS: u32 = 27;

/// Encode one source line. Blank, comment-only and label lines yield `None`
/// and must not advance `pc`.
pub fn encode_line(
    line: &str,
    labels: &LabelTable,
    pc: u32,
    cfg: &AsmConfig,
) -> Result<Option<u32>, EncodeError> {
    let text = match classify_line(line, cfg.comment_marker) {
        Line::Blank | Line::Label(_) => return Ok(None),
        Line::Instr(text) => text,
    };
    let mut tokens = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty());
    // classify_line never yields an empty instruction
    let mnemonic = tokens.next().unwrap_or_default();
    let op = Opcode::from_mnemonic(mnemonic)
        .ok_or_else(|| EncodeError::UnknownOpcode(mnemonic.to_ascii_lowercase()))?;
    let format = op.format();

    let tokens: Vec<&str> = tokens.collect();
    if cfg.reject_extra_operands && tokens.len() > format.arity() {
        return Err(EncodeError::OperandCount {
            mnemonic: op.mnemonic(),
            expected: format.arity(),
            found: tokens.len(),
        });
    }
    // operands past the format's arity are never looked at
    let operands = tokens
        .iter()
        .take(format.arity())
        .enumerate()
        .map(|(i, t)| tokenize_operand(format, i, t, labels))
        .collect::<Result<Vec<_>, _>>()?;

    let word = encode(op, &operands, labels, pc, cfg)?;
    trace!(pc, "{word:08x}  {text}");
    Ok(Some(word))
}

fn tokenize_operand(
    format: Format,
    index: usize,
    token: &str,
    labels: &LabelTable,
) -> Result<Operand, EncodeError> {
    match (format, index) {
        // a defined label wins over any other reading of the token
        (Format::Branch, _) if labels.contains(token) => Ok(Operand::LabelRef(token.to_string())),
        (Format::Memory, 1) => {
            parse_memory(token).map(|(base, disp)| Operand::MemoryRef { base, disp })
        }
        _ => Operand::parse(token),
    }
}

/// Encode an already tokenized instruction located at instruction index `pc`.
pub fn encode(
    op: Opcode,
    operands: &[Operand],
    labels: &LabelTable,
    pc: u32,
    cfg: &AsmConfig,
) -> Result<u32, EncodeError> {
    let format = op.format();
    if operands.len() < format.arity()
        || (cfg.reject_extra_operands && operands.len() > format.arity())
    {
        return Err(EncodeError::OperandCount {
            mnemonic: op.mnemonic(),
            expected: format.arity(),
            found: operands.len(),
        });
    }
    let opcode = op.code() << OPCODE_SHIFT;
    let mn = op.mnemonic();

    let word = match format {
        Format::NoOperand => opcode,
        Format::Alu3 => {
            let rd = reg(mn, 0, &operands[0])?;
            let rs1 = reg(mn, 1, &operands[1])?;
            let (i, field) = reg_or_imm(mn, 2, &operands[2], cfg)?;
            opcode | (i << I_BIT) | (rd << RD_SHIFT) | (rs1 << RS1_SHIFT) | field
        }
        Format::Unary2 => {
            let rd = reg(mn, 0, &operands[0])?;
            let (i, field) = reg_or_imm(mn, 1, &operands[1], cfg)?;
            opcode | (i << I_BIT) | (rd << RD_SHIFT) | field
        }
        Format::Compare => {
            let rs1 = reg(mn, 0, &operands[0])?;
            let (i, field) = reg_or_imm(mn, 1, &operands[1], cfg)?;
            opcode | (i << I_BIT) | (rs1 << RS1_SHIFT) | field
        }
        Format::Memory => {
            let rd = reg(mn, 0, &operands[0])?;
            let (base, disp) = match &operands[1] {
                Operand::MemoryRef { base, disp } => (u32::from(*base) & REG_MASK, *disp),
                other => return Err(EncodeError::BadMemoryOperand(other.to_string())),
            };
            check_imm(disp, cfg)?;
            opcode | (1 << I_BIT) | (rd << RD_SHIFT) | (base << RS1_SHIFT) | imm18(disp)
        }
        Format::Branch => opcode | branch_offset(mn, &operands[0], labels, pc, cfg)?,
    };
    Ok(word)
}

fn reg(mnemonic: &'static str, index: usize, operand: &Operand) -> Result<u32, EncodeError> {
    match operand {
        Operand::Register(r) => Ok(u32::from(*r) & REG_MASK),
        other => Err(unexpected(mnemonic, index, "register", other)),
    }
}

/// `(I, field)`: a register goes to the rs2 slot with I = 0, an immediate
/// fills the low 18 bits with I = 1.
fn reg_or_imm(
    mnemonic: &'static str,
    index: usize,
    operand: &Operand,
    cfg: &AsmConfig,
) -> Result<(u32, u32), EncodeError> {
    match operand {
        Operand::Register(r) => Ok((0, (u32::from(*r) & REG_MASK) << RS2_SHIFT)),
        Operand::Immediate { value, .. } => {
            check_imm(*value, cfg)?;
            Ok((1, imm18(*value)))
        }
        other => Err(unexpected(mnemonic, index, "register or immediate", other)),
    }
}

/// Labels resolve PC-relative; a numeric literal is placed as-is (absolute).
/// A decimal literal goes through the 18-bit immediate conversion first, a hex
/// literal keeps all 27 bits.
fn branch_offset(
    mnemonic: &'static str,
    operand: &Operand,
    labels: &LabelTable,
    pc: u32,
    cfg: &AsmConfig,
) -> Result<u32, EncodeError> {
    match operand {
        Operand::LabelRef(name) => {
            let target = labels
                .get(name)
                .ok_or_else(|| EncodeError::UndefinedLabel(name.clone()))?;
            let delta = i64::from(target) - i64::from(pc);
            let half = 1i64 << (OFFSET_BITS - 1);
            if cfg.strict_ranges && !(-half..half).contains(&delta) {
                return Err(EncodeError::RangeOverflow { value: delta, bits: OFFSET_BITS });
            }
            Ok((delta & i64::from(OFFSET_MASK)) as u32)
        }
        Operand::Immediate { value, hex: false } => {
            check_imm(*value, cfg)?;
            Ok(imm18(*value) & OFFSET_MASK)
        }
        Operand::Immediate { value, hex: true } => {
            let range = -(1i64 << (OFFSET_BITS - 1))..(1i64 << OFFSET_BITS);
            if cfg.strict_ranges && !range.contains(value) {
                return Err(EncodeError::RangeOverflow { value: *value, bits: OFFSET_BITS });
            }
            Ok((*value & i64::from(OFFSET_MASK)) as u32)
        }
        other => Err(unexpected(mnemonic, 0, "label or immediate", other)),
    }
}

fn check_imm(value: i64, cfg: &AsmConfig) -> Result<(), EncodeError> {
    if cfg.strict_ranges && !fits_imm18(value) {
        return Err(EncodeError::RangeOverflow { value, bits: 18 });
    }
    Ok(())
}

fn unexpected(
    mnemonic: &'static str,
    index: usize,
    expected: &'static str,
    found: &Operand,
) -> EncodeError {
    EncodeError::UnexpectedOperand {
        mnemonic,
        index: index + 1,
        expected,
        found: found.to_string(),
    }
}
