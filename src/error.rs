/// Failure to encode a single source line.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("unknown opcode `{0}`")]
    UnknownOpcode(String),
    #[error("invalid register `{0}`")]
    InvalidRegister(String),
    #[error("bad memory operand `{0}` (expected <disp>[rN])")]
    BadMemoryOperand(String),
    #[error("invalid immediate `{0}`")]
    InvalidImmediate(String),
    #[error("`{mnemonic}` expects {expected} operand(s), found {found}")]
    OperandCount {
        mnemonic: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("`{mnemonic}` operand {index}: expected {expected}, found `{found}`")]
    UnexpectedOperand {
        mnemonic: &'static str,
        index: usize,
        expected: &'static str,
        found: String,
    },
    #[error("undefined label `{0}`")]
    UndefinedLabel(String),
    #[error("{value} does not fit in a {bits}-bit field")]
    RangeOverflow { value: i64, bits: u32 },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    #[error("line {line}: {source}\n    {text}")]
    Line {
        line: usize,
        text: String,
        #[source]
        source: EncodeError,
    },
    #[error("line {line}: duplicate label `{name}` (first defined on line {first})")]
    DuplicateLabel {
        name: String,
        line: usize,
        first: usize,
    },
}

impl AsmError {
    /// 1-based source line the error points at.
    pub fn line(&self) -> usize {
        match self {
            AsmError::Line { line, .. } | AsmError::DuplicateLabel { line, .. } => *line,
        }
    }
}
