use crate::error::EncodeError;
use serde::{Deserialize, Serialize};

pub const SP: u8 = 14;
pub const RA: u8 = 15;
pub const NUM_REGS: u8 = 16;

/// Immediate fields are 18 bits wide.
pub const IMM_BITS: u32 = 18;

/// One operand token, classified once at tokenization time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    Register(u8),
    /// `hex` records a `0x` spelling; branch targets treat the two differently.
    Immediate { value: i64, hex: bool },
    MemoryRef { base: u8, disp: i64 },
    LabelRef(String),
}

impl Operand {
    /// Classify and parse a single operand token.
    ///
    /// `sp`/`ra` and `r<N>` are registers, anything with a `[` is a memory
    /// reference, a leading digit or sign makes an immediate, and every other
    /// token is taken as a label name.
    pub fn parse(token: &str) -> Result<Operand, EncodeError> {
        let t = token.trim();
        if t == "sp" || t == "ra" || t.starts_with('r') {
            return parse_register(t).map(Operand::Register);
        }
        if t.contains('[') {
            let (base, disp) = parse_memory(t)?;
            return Ok(Operand::MemoryRef { base, disp });
        }
        match t.chars().next() {
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' => {
                let value = parse_immediate(t)?;
                Ok(Operand::Immediate { value, hex: is_hex_literal(t) })
            }
            _ => Ok(Operand::LabelRef(t.to_string())),
        }
    }

    /// Short name of the operand kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Operand::Register(_) => "register",
            Operand::Immediate { .. } => "immediate",
            Operand::MemoryRef { .. } => "memory reference",
            Operand::LabelRef(_) => "label",
        }
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Register(r) => write!(f, "r{r}"),
            Operand::Immediate { value, hex: false } => write!(f, "{value}"),
            Operand::Immediate { value, hex: true } if *value < 0 => write!(f, "-{:#x}", -value),
            Operand::Immediate { value, hex: true } => write!(f, "{value:#x}"),
            Operand::MemoryRef { base, disp } => write!(f, "{disp}[r{base}]"),
            Operand::LabelRef(name) => f.write_str(name),
        }
    }
}

/// `r0`..`r15`, `sp` (r14) or `ra` (r15).
pub fn parse_register(s: &str) -> Result<u8, EncodeError> {
    let t = s.trim();
    let idx = match t {
        "sp" => Some(SP),
        "ra" => Some(RA),
        _ => t
            .strip_prefix('r')
            .filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|n| n.parse::<u8>().ok()),
    };
    idx.filter(|&r| r < NUM_REGS)
        .ok_or_else(|| EncodeError::InvalidRegister(t.to_string()))
}

/// Signed decimal, or hexadecimal with a `0x` prefix.
pub fn parse_immediate(s: &str) -> Result<i64, EncodeError> {
    let t = s.trim();
    let bad = || EncodeError::InvalidImmediate(t.to_string());
    let (neg, body) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t.strip_prefix('+').unwrap_or(t)),
    };
    let mag = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).map_err(|_| bad())?
    } else {
        if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        body.parse::<i64>().map_err(|_| bad())?
    };
    Ok(if neg { -mag } else { mag })
}

/// True for a `0x`/`0X` literal, with or without a sign.
pub fn is_hex_literal(s: &str) -> bool {
    let t = s.trim();
    let body = t.strip_prefix('-').or_else(|| t.strip_prefix('+')).unwrap_or(t);
    body.starts_with("0x") || body.starts_with("0X")
}

/// `<signed-decimal>[r<N>]`, e.g. `-4[r3]`. Returns `(base, disp)`.
pub fn parse_memory(s: &str) -> Result<(u8, i64), EncodeError> {
    let t = s.trim();
    let bad = || EncodeError::BadMemoryOperand(t.to_string());
    let (disp, rest) = t.split_once('[').ok_or_else(bad)?;
    let base = rest.strip_suffix(']').ok_or_else(bad)?;
    let digits = disp.strip_prefix('-').unwrap_or(disp);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    let disp = disp.parse::<i64>().map_err(|_| bad())?;
    // the base must be spelled r<N>; the sp/ra aliases are not accepted here
    if !base.starts_with('r') || base == "ra" {
        return Err(bad());
    }
    let base = parse_register(base).map_err(|_| bad())?;
    Ok((base, disp))
}

/// 18-bit two's-complement field for `value`. Out-of-range values wrap silently.
pub fn imm18(value: i64) -> u32 {
    // same as adding 2^18 to negatives before masking
    (value & ((1i64 << IMM_BITS) - 1)) as u32
}

/// Reinterpret an 18-bit field as a signed value.
pub fn sign_extend18(field: u32) -> i64 {
    let s = 32 - IMM_BITS;
    (((field << s) as i32) >> s) as i64
}

/// True when `value` is representable in an 18-bit field, read either as
/// signed or as a raw unsigned bit pattern.
pub fn fits_imm18(value: i64) -> bool {
    (-(1i64 << (IMM_BITS - 1))..(1i64 << IMM_BITS)).contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_and_aliases() {
        assert_eq!(parse_register("r0"), Ok(0));
        assert_eq!(parse_register("r15"), Ok(15));
        assert_eq!(parse_register("sp"), Ok(14));
        assert_eq!(parse_register("ra"), Ok(15));
        for bad in ["r16", "r", "x1", "R1", "r-1", "r1a"] {
            assert_eq!(
                parse_register(bad),
                Err(EncodeError::InvalidRegister(bad.to_string())),
                "{bad}"
            );
        }
    }

    #[test]
    fn immediates() {
        assert_eq!(parse_immediate("5"), Ok(5));
        assert_eq!(parse_immediate("-17"), Ok(-17));
        assert_eq!(parse_immediate("0x1f"), Ok(31));
        assert_eq!(parse_immediate("0X10"), Ok(16));
        assert!(parse_immediate("0xzz").is_err());
        assert!(parse_immediate("12ab").is_err());
        assert!(parse_immediate("-").is_err());
    }

    #[test]
    fn imm18_round_trips_negative_one() {
        let f = imm18(-1);
        assert_eq!(f, 0x3FFFF);
        assert_eq!(sign_extend18(f), -1);
        assert_eq!(sign_extend18(imm18(-(1 << 17))), -(1 << 17));
        assert_eq!(sign_extend18(imm18((1 << 17) - 1)), (1 << 17) - 1);
    }

    #[test]
    fn imm18_truncates_out_of_range() {
        assert_eq!(imm18(1 << 18), 0);
        assert_eq!(imm18((1 << 18) + 3), 3);
        assert!(!fits_imm18(1 << 18));
        assert!(fits_imm18(0x3FFFF));
        assert!(!fits_imm18(-(1 << 17) - 1));
    }

    #[test]
    fn memory_refs() {
        assert_eq!(parse_memory("-4[r3]"), Ok((3, -4)));
        assert_eq!(parse_memory("0[r15]"), Ok((15, 0)));
        for bad in ["4(r3)", "[r3]", "4[r3", "4[sp]", "x[r1]", "4[r16]", "+4[r1]"] {
            assert_eq!(
                parse_memory(bad),
                Err(EncodeError::BadMemoryOperand(bad.to_string())),
                "{bad}"
            );
        }
    }

    #[test]
    fn classification() {
        assert_eq!(Operand::parse("r7"), Ok(Operand::Register(7)));
        assert_eq!(Operand::parse("sp"), Ok(Operand::Register(14)));
        assert_eq!(Operand::parse("-3"), Ok(Operand::Immediate { value: -3, hex: false }));
        assert_eq!(
            Operand::parse("0x100000"),
            Ok(Operand::Immediate { value: 0x100000, hex: true })
        );
        assert_eq!(
            Operand::parse("8[r2]"),
            Ok(Operand::MemoryRef { base: 2, disp: 8 })
        );
        assert_eq!(Operand::parse("loop"), Ok(Operand::LabelRef("loop".into())));
        // anything starting with `r` is committed to being a register
        assert!(matches!(
            Operand::parse("result"),
            Err(EncodeError::InvalidRegister(_))
        ));
    }
}
