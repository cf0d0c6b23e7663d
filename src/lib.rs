pub mod assembler;
pub mod encoder;
pub mod error;
pub mod instructions;
pub mod labels;
pub mod listing;
pub mod operand;

pub use assembler::{assemble, AsmConfig, Assembler, Program};
pub use encoder::{encode, encode_line};
pub use error::{AsmError, EncodeError};
pub use instructions::{Format, Opcode};
pub use labels::{scan_labels, LabelTable};
pub use operand::Operand;
