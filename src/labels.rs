use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::assembler::AsmConfig;
use crate::error::AsmError;

/// How a source line participates in assembly. Both passes classify lines
/// through [`classify_line`] so their program counters stay in step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    Blank,
    Label(&'a str),
    Instr(&'a str),
}

/// Strip the trailing comment, trim, then classify.
pub fn classify_line(line: &str, comment_marker: char) -> Line<'_> {
    let code = match line.find(comment_marker) {
        Some(p) => &line[..p],
        None => line,
    };
    let code = code.trim();
    if code.is_empty() {
        Line::Blank
    } else if let Some(name) = code.strip_suffix(':') {
        Line::Label(name.trim())
    } else {
        Line::Instr(code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDef {
    /// Instruction index the label points at.
    pub pc: u32,
    /// 1-based source line of the definition.
    pub line: usize,
}

/// Label name to instruction address. Built by [`scan_labels`], read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelTable {
    labels: BTreeMap<String, LabelDef>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.labels.get(name).map(|d| d.pc)
    }

    pub fn def(&self, name: &str) -> Option<&LabelDef> {
        self.labels.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.labels.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.labels.iter().map(|(k, d)| (k.as_str(), d.pc))
    }

    /// Returns the previous definition if `name` was already present.
    pub fn insert(&mut self, name: &str, pc: u32, line: usize) -> Option<LabelDef> {
        self.labels.insert(name.to_string(), LabelDef { pc, line })
    }
}

/// Pass 1: assign every label the index of the next instruction.
pub fn scan_labels(source: &str, cfg: &AsmConfig) -> Result<LabelTable, AsmError> {
    let mut table = LabelTable::new();
    let mut pc: u32 = 0;
    for (i, raw) in source.lines().enumerate() {
        let line = i + 1;
        match classify_line(raw, cfg.comment_marker) {
            Line::Blank => {}
            Line::Label(name) => {
                if let Some(prev) = table.def(name).copied() {
                    if cfg.reject_duplicate_labels {
                        return Err(AsmError::DuplicateLabel {
                            name: name.to_string(),
                            line,
                            first: prev.line,
                        });
                    }
                    warn!(label = name, line, first = prev.line, "label redefined; last definition wins");
                }
                debug!(label = name, pc, line, "label");
                table.insert(name, pc, line);
            }
            Line::Instr(_) => pc += 1,
        }
    }
    debug!(labels = table.len(), instructions = pc, "label scan done");
    Ok(table)
}
