//! # modjar-core
//!
//! A library for reading, editing and re-emitting JVM module descriptors
//! (`module-info.class` files).
//!
//! This crate provides the core functionality for:
//! - Parsing descriptor bytes into a binary model that serializes back byte for byte
//! - Editing the module name, version, requires, exports and main class in place
//! - Resolving the binary model into a semantic [`ModuleDescriptor`]
//! - Printing the descriptor as `module-info.java` source
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`codec`]: Big-endian reading and writing, modified UTF-8
//! - [`pool`]: The deduplicating constant pool
//! - [`attribute`]: The Module, SourceFile and opaque attributes
//! - [`class`]: The binary model, its reader and its edits
//! - [`descriptor`]: The semantic model, module versions and the declaration printer
//! - [`archive`]: Descriptors inside JAR files
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use modjar_core::{DeclarationPrinter, ModuleInfoClass, ModuleVersion};
//! use std::fs;
//!
//! let bytes = fs::read("module-info.class")?;
//! let mut class = ModuleInfoClass::from_bytes(bytes)?;
//!
//! class.set_module_version(&ModuleVersion::parse("2.0.0")?)?;
//! fs::write("module-info.class", class.to_bytes()?)?;
//!
//! let descriptor = class.descriptor()?;
//! println!("{}", DeclarationPrinter::new(&descriptor).print());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Extensibility
//!
//! - [`DescriptorWriter`]: Visit the parts of a resolved declaration
//! - [`ArchiveUpdater`]: Customize how a descriptor is stored back into an archive
//!

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod archive;
pub mod attribute;
pub mod class;
pub mod codec;
pub mod descriptor;
pub mod error;
pub mod pool;

#[cfg(test)]
mod testutil;

// Re-export primary types for convenience
pub use archive::{ArchiveUpdater, JarTool};
pub use class::{MinimalConfig, ModuleInfoClass, ModuleInfoClassReader};
pub use descriptor::{
    DeclarationPrinter, DescriptorWriter, ModuleDescriptor, ModuleDescriptorFactory,
    ModuleVersion, NullWriter, PrinterConfig, StatsWriter,
};
pub use error::{Error, ErrorCategory, Result};
pub use pool::{ConstantPool, ConstantPoolEntry};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
