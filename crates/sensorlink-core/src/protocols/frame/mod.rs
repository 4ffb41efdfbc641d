//! Serial frame envelope.
//!
//! The gateway emits fixed 23-byte frames: a 48-bit big-endian magic, a
//! 32-bit big-endian device code, a 12-byte device payload and an additive
//! checksum trailer. The assembler cuts the byte stream into candidates; the
//! parser validates checksum and magic and reports rejections as values,
//! since line noise on the RF channel is routine.
//!
//! Version française (résumé):
//! Trames fixes de 23 octets (magic 48 bits, code appareil 32 bits, charge
//! utile de 12 octets, somme de contrôle). Les trames invalides sont des
//! valeurs, jamais des erreurs fatales.

pub mod assembler;
pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use assembler::FrameAssembler;
pub use error::{FrameError, InvalidFrame};
pub use parser::{ParsedHeader, RawFrame, Validation, validate_frame};
