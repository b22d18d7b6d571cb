//! The `Module` attribute and its directive records.
//!
//! Every field is a constant pool index; names are resolved later by the
//! descriptor factory. A version index of 0 means "no version" and an empty
//! target list means the directive is unqualified.

use crate::codec::{ByteCursor, ByteSink};
use crate::error::Result;
use bitflags::bitflags;

bitflags! {
    /// `module_flags` of the Module attribute
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModuleFlags: u16 {
        /// Declared `open module`
        const OPEN = 0x0020;
        /// Not explicitly or implicitly declared
        const SYNTHETIC = 0x1000;
        /// Implicitly declared
        const MANDATED = 0x8000;
    }
}

bitflags! {
    /// `requires_flags` of a requires directive
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RequiresFlags: u16 {
        /// `requires transitive`
        const TRANSITIVE = 0x0020;
        /// `requires static`
        const STATIC_PHASE = 0x0040;
        /// Not explicitly or implicitly declared
        const SYNTHETIC = 0x1000;
        /// Implicitly declared, e.g. the dependency on `java.base`
        const MANDATED = 0x8000;
    }
}

bitflags! {
    /// Flags of an exports or opens directive
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DirectiveFlags: u16 {
        /// Not explicitly or implicitly declared
        const SYNTHETIC = 0x1000;
        /// Implicitly declared
        const MANDATED = 0x8000;
    }
}

/// A `requires` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requires {
    /// Module entry of the required module
    pub requires_index: u16,
    /// Modifiers
    pub flags: RequiresFlags,
    /// Utf8 entry of the compile-time version, or 0
    pub version_index: u16,
}

/// An `exports` or `opens` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDirective {
    /// Package entry of the exported or opened package
    pub package_index: u16,
    /// Modifiers
    pub flags: DirectiveFlags,
    /// Module entries the directive is qualified to; empty if unqualified
    pub to_indices: Vec<u16>,
}

/// An `exports` directive
pub type Exports = PackageDirective;

/// An `opens` directive
pub type Opens = PackageDirective;

/// A `provides` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provides {
    /// Class entry of the service interface
    pub service_index: u16,
    /// Class entries of the implementations
    pub with_indices: Vec<u16>,
}

/// The Module attribute of a module descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleAttribute {
    /// Utf8 entry holding the attribute name `Module`
    pub attribute_name_index: u16,
    /// Module entry naming this module
    pub module_name_index: u16,
    /// Module modifiers
    pub module_flags: ModuleFlags,
    /// Utf8 entry of the module version, or 0
    pub module_version_index: u16,
    /// `requires` directives in file order
    pub requires: Vec<Requires>,
    /// `exports` directives in file order
    pub exports: Vec<Exports>,
    /// `opens` directives in file order
    pub opens: Vec<Opens>,
    /// Class entries of the `uses` directives
    pub uses_indices: Vec<u16>,
    /// `provides` directives in file order
    pub provides: Vec<Provides>,
}

impl ModuleAttribute {
    /// Creates an attribute with no directives
    pub fn new(attribute_name_index: u16, module_name_index: u16) -> Self {
        Self {
            attribute_name_index,
            module_name_index,
            module_flags: ModuleFlags::empty(),
            module_version_index: 0,
            requires: Vec::new(),
            exports: Vec::new(),
            opens: Vec::new(),
            uses_indices: Vec::new(),
            provides: Vec::new(),
        }
    }

    /// Reads the payload following the attribute name and length.
    ///
    /// Unknown flag bits are retained so the attribute serializes back to the
    /// same bytes.
    pub(crate) fn read(attribute_name_index: u16, cursor: &mut ByteCursor) -> Result<Self> {
        let module_name_index = cursor.read_u2()?;
        let module_flags = ModuleFlags::from_bits_retain(cursor.read_u2()?);
        let module_version_index = cursor.read_u2()?;

        let requires_count = cursor.read_u2()?;
        let mut requires = Vec::with_capacity(requires_count.into());
        for _ in 0..requires_count {
            requires.push(Requires {
                requires_index: cursor.read_u2()?,
                flags: RequiresFlags::from_bits_retain(cursor.read_u2()?),
                version_index: cursor.read_u2()?,
            });
        }

        let exports = read_package_directives(cursor)?;
        let opens = read_package_directives(cursor)?;
        let uses_indices = read_indices(cursor)?;

        let provides_count = cursor.read_u2()?;
        let mut provides = Vec::with_capacity(provides_count.into());
        for _ in 0..provides_count {
            let service_index = cursor.read_u2()?;
            let with_indices = read_indices(cursor)?;
            provides.push(Provides {
                service_index,
                with_indices,
            });
        }

        Ok(Self {
            attribute_name_index,
            module_name_index,
            module_flags,
            module_version_index,
            requires,
            exports,
            opens,
            uses_indices,
            provides,
        })
    }

    /// Writes the payload, without the attribute name and length
    pub(crate) fn append_payload(&self, sink: &mut ByteSink) -> Result<()> {
        sink.append_u2(self.module_name_index);
        sink.append_u2(self.module_flags.bits());
        sink.append_u2(self.module_version_index);

        sink.append_count("requires_count", self.requires.len())?;
        for requires in &self.requires {
            sink.append_u2(requires.requires_index);
            sink.append_u2(requires.flags.bits());
            sink.append_u2(requires.version_index);
        }

        append_package_directives(sink, "exports_count", &self.exports)?;
        append_package_directives(sink, "opens_count", &self.opens)?;
        append_indices(sink, "uses_count", &self.uses_indices)?;

        sink.append_count("provides_count", self.provides.len())?;
        for provides in &self.provides {
            sink.append_u2(provides.service_index);
            append_indices(sink, "provides_with_count", &provides.with_indices)?;
        }
        Ok(())
    }
}

fn read_indices(cursor: &mut ByteCursor) -> Result<Vec<u16>> {
    let count = cursor.read_u2()?;
    (0..count).map(|_| cursor.read_u2()).collect()
}

fn read_package_directives(cursor: &mut ByteCursor) -> Result<Vec<PackageDirective>> {
    let count = cursor.read_u2()?;
    let mut directives = Vec::with_capacity(count.into());
    for _ in 0..count {
        let package_index = cursor.read_u2()?;
        let flags = DirectiveFlags::from_bits_retain(cursor.read_u2()?);
        let to_indices = read_indices(cursor)?;
        directives.push(PackageDirective {
            package_index,
            flags,
            to_indices,
        });
    }
    Ok(directives)
}

fn append_indices(sink: &mut ByteSink, field: &'static str, indices: &[u16]) -> Result<()> {
    sink.append_count(field, indices.len())?;
    for &index in indices {
        sink.append_u2(index);
    }
    Ok(())
}

fn append_package_directives(
    sink: &mut ByteSink,
    field: &'static str,
    directives: &[PackageDirective],
) -> Result<()> {
    sink.append_count(field, directives.len())?;
    for directive in directives {
        sink.append_u2(directive.package_index);
        sink.append_u2(directive.flags.bits());
        append_indices(sink, "to_count", &directive.to_indices)?;
    }
    Ok(())
}
