use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::encoder::encode_line;
use crate::error::AsmError;
use crate::labels::{scan_labels, LabelTable};
use crate::listing::to_hex_string;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsmConfig {
    /// Starts a comment that runs to end of line.
    pub comment_marker: char,
    /// Fail with `RangeOverflow` instead of wrapping immediates and branch offsets.
    pub strict_ranges: bool,
    /// Fail on a second definition of a label instead of letting it win.
    pub reject_duplicate_labels: bool,
    /// Fail when an instruction has more operands than its format reads.
    pub reject_extra_operands: bool,
}

impl Default for AsmConfig {
    fn default() -> Self {
        Self {
            comment_marker: '#',
            strict_ranges: false,
            reject_duplicate_labels: false,
            reject_extra_operands: false,
        }
    }
}

impl AsmConfig {
    pub fn strict() -> Self {
        Self {
            strict_ranges: true,
            reject_duplicate_labels: true,
            reject_extra_operands: true,
            ..Self::default()
        }
    }
}

/// Assembled output: one word per instruction, plus the labels used to build it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub words: Vec<u32>,
    pub labels: LabelTable,
}

impl Program {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn to_hex(&self) -> String {
        to_hex_string(&self.words)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Assembler {
    pub cfg: AsmConfig,
}

impl Assembler {
    pub fn new(cfg: AsmConfig) -> Self {
        Self { cfg }
    }

    /// Label scan to completion, then encode every instruction line.
    pub fn assemble(&self, source: &str) -> Result<Program, AsmError> {
        let labels = scan_labels(source, &self.cfg)?;

        let mut words = Vec::new();
        let mut pc: u32 = 0;
        for (i, line) in source.lines().enumerate() {
            let word = encode_line(line, &labels, pc, &self.cfg).map_err(|source| {
                AsmError::Line {
                    line: i + 1,
                    text: line.trim().to_string(),
                    source,
                }
            })?;
            if let Some(word) = word {
                words.push(word);
                pc += 1;
            }
        }
        debug!(instructions = words.len(), labels = labels.len(), "assembled");
        Ok(Program { words, labels })
    }
}

/// Assemble with the default configuration.
pub fn assemble(source: &str) -> Result<Program, AsmError> {
    Assembler::default().assemble(source)
}
