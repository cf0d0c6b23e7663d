use pretty_assertions::assert_eq;
use w32asm::encoder::OFFSET_MASK;
use w32asm::{assemble, AsmConfig, AsmError, Assembler, EncodeError};

#[test]
fn backward_branch_is_pc_relative() {
    let src = "top:\n  nop\n  nop\n  nop\n  nop\n  nop\n  beq top\n";
    let p = assemble(src).unwrap();
    assert_eq!(p.len(), 6);
    assert_eq!(p.words[5], (16 << 27) | ((0u32.wrapping_sub(5)) & OFFSET_MASK));
    assert_eq!(p.words[5], 0x87FF_FFFB);
}

#[test]
fn forward_reference_resolves() {
    let src = "call f\nnop\nf:\nret\n";
    let p = assemble(src).unwrap();
    assert_eq!(p.words, vec![0x9800_0002, 13 << 27, 0xA000_0000]);
    assert_eq!(p.labels.get("f"), Some(2));
}

#[test]
fn branch_to_self_is_zero_offset() {
    let p = assemble("spin:\nb spin\n").unwrap();
    assert_eq!(p.words, vec![18 << 27]);
}

#[test]
fn numeric_target_is_absolute() {
    // same field, but no pc subtraction
    let p = assemble("nop\nnop\nb 5\nbgt -1\n").unwrap();
    assert_eq!(p.words[2], 0x9000_0005);
    assert_eq!(p.words[3], (17 << 27) | 0x3FFFF);
}

#[test]
fn hex_target_keeps_all_27_bits() {
    let p = assemble("b 0x100000\ncall 0x7FFFFFF\nbeq 0x8000005\n").unwrap();
    assert_eq!(p.words[0], (18 << 27) | 0x100000);
    assert_eq!(p.words[0], 0x9010_0000);
    assert_eq!(p.words[1], (19 << 27) | OFFSET_MASK);
    // wider than the field: masked to 27 bits, never into the opcode
    assert_eq!(p.words[2], (16 << 27) | 5);
}

#[test]
fn decimal_target_uses_18_bit_conversion() {
    // 0x100000 written in decimal wraps to zero through the immediate path
    let p = assemble("b 1048576\n").unwrap();
    assert_eq!(p.words[0], 18 << 27);
}

#[test]
fn strict_mode_checks_hex_target_against_27_bits() {
    let strict = Assembler::new(AsmConfig::strict());
    let p = strict.assemble("b 0x100000\nb 0x7FFFFFF\n").unwrap();
    assert_eq!(p.words, vec![0x9010_0000, (18 << 27) | OFFSET_MASK]);

    let err = strict.assemble("b 0x8000000\n").unwrap_err();
    assert_eq!(
        err,
        AsmError::Line {
            line: 1,
            text: "b 0x8000000".into(),
            source: EncodeError::RangeOverflow { value: 0x800_0000, bits: 27 },
        }
    );
    // decimal literals are still held to the 18-bit immediate range
    assert!(strict.assemble("b 1048576\n").is_err());
}

#[test]
fn labels_that_look_like_registers() {
    let p = assemble("restart:\nnop\nb restart\n").unwrap();
    assert_eq!(p.words[1], 0x97FF_FFFF);
}

#[test]
fn undefined_label_fails() {
    let err = assemble("nop\nb nowhere\n").unwrap_err();
    assert_eq!(
        err,
        AsmError::Line {
            line: 2,
            text: "b nowhere".into(),
            source: EncodeError::UndefinedLabel("nowhere".into()),
        }
    );
}

#[test]
fn label_with_trailing_comment_keeps_passes_in_step() {
    let src = "start: # entry\nnop\nb start\n";
    let p = assemble(src).unwrap();
    assert_eq!(p.len(), 2);
    assert_eq!(p.words[1], (18 << 27) | (u32::MAX & OFFSET_MASK));
}

#[test]
fn duplicate_labels_last_definition_wins() {
    let p = assemble("x:\nnop\nx:\nnop\nb x\n").unwrap();
    // x = 1, branch at 2
    assert_eq!(p.words[2], (18 << 27) | (u32::MAX & OFFSET_MASK));

    let err = Assembler::new(AsmConfig::strict())
        .assemble("x:\nnop\nx:\nnop\nb x\n")
        .unwrap_err();
    assert_eq!(err.line(), 3);
}
