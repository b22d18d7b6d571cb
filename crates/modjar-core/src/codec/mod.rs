//! Low-level byte codecs for the class file format.
//!
//! All multi-byte integers in a class file are unsigned and big-endian:
//!
//! - [`ByteCursor`] reads `u1`/`u2`/`u4` values sequentially from an immutable buffer
//! - [`ByteSink`] appends them to a growable buffer and can patch fields that
//!   were written earlier, which is how attribute lengths are filled in once
//!   the payload size is known
//! - [`mutf8`] converts between Rust strings and the JVM's modified UTF-8

mod cursor;
pub mod mutf8;
mod sink;

pub use cursor::ByteCursor;
pub use sink::{ByteSink, DEFAULT_CHUNK_SIZE};
