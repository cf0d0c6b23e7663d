use std::fmt::Write as _;
use std::io::{self, Write};

/// One word per line: lowercase hex, zero-padded to 8 digits.
pub fn write_hex<W: Write>(words: &[u32], w: &mut W) -> io::Result<()> {
    for word in words {
        writeln!(w, "{word:08x}")?;
    }
    Ok(())
}

pub fn to_hex_string(words: &[u32]) -> String {
    let mut out = String::with_capacity(words.len() * 9);
    for word in words {
        // writing into a String cannot fail
        let _ = writeln!(out, "{word:08x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_and_lowercases() {
        let words = [0xA000_0000, 0x1, 0x0048_C000];
        let s = to_hex_string(&words);
        assert_eq!(s, "a0000000\n00000001\n0048c000\n");
        let mut buf = Vec::new();
        write_hex(&words, &mut buf).unwrap();
        assert_eq!(buf, s.as_bytes());
    }

    #[test]
    fn empty_program_is_empty_file() {
        assert_eq!(to_hex_string(&[]), "");
    }
}
