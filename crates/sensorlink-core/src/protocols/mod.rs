//! Protocol decoding modules.
//!
//! Each protocol layer follows the same structure:
//! - `layout`: byte offsets, ranges and constants (source of truth)
//! - `reader`: safe byte access and protocol conventions
//! - `parser`: domain-level decoding (no direct byte indexing)
//! - `error`: explicit, actionable errors
//!
//! `frame` covers the 23-byte serial envelope (assembly, checksum, magic),
//! `payload` covers the per-device-type 12-byte body. Both are pure and
//! contain no I/O; sources, sinks and the pipeline handle the rest.

pub(crate) mod common;
pub mod frame;
pub mod payload;
