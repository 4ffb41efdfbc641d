//! Device payload decoding.
//!
//! Each device type has its own fixed 12-byte little-endian layout; bytes
//! not covered by a field are padding and are skipped, never checked.
//! Fixed-point fields are scaled (amperage x1000, temperature x10) and bit
//! flags become battery and tripped states. Layouts live in `layout`,
//! bounds-checked reads in `reader`.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use error::PayloadError;
pub use parser::decode_payload;
