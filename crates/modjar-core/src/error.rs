//! Error types for the modjar-core library.
//!
//! Every failure is surfaced through the single [`Error`] enum. Variants fall
//! into four broad groups, reported by [`Error::category`]:
//!
//! - structural: the descriptor bytes are malformed or use features a module
//!   descriptor may not contain; parsing is aborted and no model is returned
//! - policy: an edit would break a rule this tool enforces on descriptors
//! - programming: a caller used the API incorrectly
//! - I/O: files and archives around the descriptor

use crate::pool::ConstantKind;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for modjar operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The descriptor bytes are malformed or unsupported
    Structural,
    /// An edit was refused by a descriptor policy
    Policy,
    /// The API was used incorrectly
    Programming,
    /// Reading or writing files and archives failed
    Io,
}

/// Comprehensive error type for all modjar operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write output file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        /// Path to the file that failed to write
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to open or read an archive
    #[error("failed to read archive '{path}': {source}")]
    Archive {
        /// Path to the archive
        path: PathBuf,
        /// Underlying zip error
        #[source]
        source: zip::result::ZipError,
    },

    /// The external archive update step failed
    #[error("failed to update archive '{path}': {details}")]
    ArchiveUpdate {
        /// Path to the archive
        path: PathBuf,
        /// What went wrong
        details: String,
    },

    /// Input ended before a complete value could be read
    #[error("unexpected end of input at offset {offset}: needed {needed} more byte(s)")]
    UnexpectedEof {
        /// Byte offset where the read started
        offset: usize,
        /// Number of bytes that were requested
        needed: usize,
    },

    /// The class file magic is not 0xCAFEBABE
    #[error("does not start with magic 0xCAFEBABE: 0x{found:08X}")]
    BadMagic {
        /// The magic that was found
        found: u32,
    },

    /// access_flags is not exactly ACC_MODULE
    #[error("access flags not a module: 0x{found:04X}")]
    InvalidAccessFlags {
        /// The access flags that were found
        found: u16,
    },

    /// this_class does not name `module-info`
    #[error("the class name of a module must be module-info: {name}")]
    NotModuleInfo {
        /// The class name that was found
        name: String,
    },

    /// A header count that must be zero in a module descriptor is not
    #[error("{field} not 0: {value}")]
    NonZeroCount {
        /// Name of the header field
        field: &'static str,
        /// Value found
        value: u16,
    },

    /// Constant pool tag not defined by the class file format
    #[error("unknown constant pool tag at index {index}: {tag}")]
    UnknownConstantTag {
        /// Pool index being read
        index: u16,
        /// The tag byte
        tag: u8,
    },

    /// Constant pool kind that is valid in class files but not in module descriptors
    #[error("constant pool entry {index} has kind {kind} (tag {}), which is not supported in a module descriptor", kind.tag())]
    UnsupportedConstant {
        /// Pool index being read
        index: u16,
        /// The decoded kind
        kind: ConstantKind,
    },

    /// Reference to a pool index that holds no entry
    #[error("there is no constant pool entry with index {index}")]
    MissingConstant {
        /// The dangling index
        index: u16,
    },

    /// Pool entry exists but is of the wrong kind
    #[error("constant pool entry {index} is not {expected}: {found}")]
    ConstantKindMismatch {
        /// The index that was resolved
        index: u16,
        /// Kind the caller expected
        expected: ConstantKind,
        /// Kind actually stored
        found: ConstantKind,
    },

    /// Byte sequence is not valid modified UTF-8
    #[error("failed to decode modified UTF-8 at byte {offset}")]
    MalformedUtf8 {
        /// Offset of the offending sequence within the string bytes
        offset: usize,
    },

    /// An attribute that may occur at most once occurred again
    #[error("more than one {name} attribute")]
    DuplicateAttribute {
        /// Attribute name
        name: &'static str,
    },

    /// Descriptor lacks the mandatory Module attribute
    #[error("missing Module attribute")]
    MissingModuleAttribute,

    /// Attribute name not permitted in a module descriptor
    #[error("attribute_info not supported for module: {name}")]
    UnsupportedAttribute {
        /// Attribute name
        name: String,
    },

    /// Version string does not follow the module version grammar
    #[error("invalid module version '{version}': {reason}")]
    InvalidVersion {
        /// The rejected string
        version: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Same directive declared twice
    #[error("duplicate {directive} directive: {name}")]
    DuplicateDirective {
        /// Directive keyword (`requires`, `exports`, ...)
        directive: &'static str,
        /// Module, package or service name
        name: String,
    },

    /// Attempt to drop a requires directive carrying the MANDATED flag
    #[error("unable to remove mandated module: {module}")]
    MandatedRequires {
        /// The module whose requires is mandated
        module: String,
    },

    /// Pool compaction cannot trace references inside an opaque attribute
    #[error("cannot compact constant pool: references inside {attribute} attribute are not tracked")]
    CompactionUnsupported {
        /// Name of the blocking attribute
        attribute: String,
    },

    /// Parser-only append did not arrive at the next sequential index
    #[error("tried to add entry at {index} with constant_pool_count {count}")]
    OutOfSequence {
        /// Requested index
        index: u16,
        /// Current constant_pool_count
        count: u16,
    },

    /// `replace` was asked to overwrite an index that holds no Utf8 entry
    #[error("cannot replace constant pool entry {index}: no Utf8 entry at that index")]
    InvalidReplacement {
        /// Requested index
        index: u16,
    },

    /// The pool would exceed the u16 index space
    #[error("constant pool is full: constant_pool_count cannot exceed 65535")]
    PoolOverflow,

    /// A value does not fit the width of its field
    #[error("{field} too large: {value}")]
    FieldOverflow {
        /// Name of the field
        field: &'static str,
        /// The value that overflowed
        value: usize,
    },

    /// Write at an offset past the end of a byte sink
    #[error("write at offset {offset} is past the end of the output ({size} bytes)")]
    SinkOffset {
        /// Requested offset
        offset: usize,
        /// Current size of the sink
        size: usize,
    },
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new file write error
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a new archive read error
    pub fn archive(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        Self::Archive {
            path: path.into(),
            source,
        }
    }

    /// Creates a new archive update error
    pub fn archive_update(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        Self::ArchiveUpdate {
            path: path.into(),
            details: details.into(),
        }
    }

    /// Creates a new unexpected end-of-input error
    pub fn unexpected_eof(offset: usize, needed: usize) -> Self {
        Self::UnexpectedEof { offset, needed }
    }

    /// Creates a new unsupported attribute error
    pub fn unsupported_attribute(name: impl Into<String>) -> Self {
        Self::UnsupportedAttribute { name: name.into() }
    }

    /// Creates a new mandated-requires policy error
    pub fn mandated_requires(module: impl Into<String>) -> Self {
        Self::MandatedRequires {
            module: module.into(),
        }
    }

    /// Creates a new invalid version error
    pub fn invalid_version(version: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidVersion {
            version: version.into(),
            reason,
        }
    }

    /// Creates a new duplicate directive error
    pub fn duplicate_directive(directive: &'static str, name: impl Into<String>) -> Self {
        Self::DuplicateDirective {
            directive,
            name: name.into(),
        }
    }

    /// Returns the broad category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FileRead { .. }
            | Self::FileWrite { .. }
            | Self::Archive { .. }
            | Self::ArchiveUpdate { .. } => ErrorCategory::Io,
            Self::MandatedRequires { .. } | Self::CompactionUnsupported { .. } => {
                ErrorCategory::Policy
            }
            Self::OutOfSequence { .. }
            | Self::InvalidReplacement { .. }
            | Self::PoolOverflow
            | Self::FieldOverflow { .. }
            | Self::SinkOffset { .. } => ErrorCategory::Programming,
            _ => ErrorCategory::Structural,
        }
    }

    /// Returns true if the descriptor itself is malformed or unsupported
    pub fn is_structural(&self) -> bool {
        self.category() == ErrorCategory::Structural
    }
}
