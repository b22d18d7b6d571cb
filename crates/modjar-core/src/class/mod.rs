//! The binary model of a `module-info.class` file.
//!
//! [`ModuleInfoClass`] owns the header, the constant pool and the attribute
//! list. It is created by [`ModuleInfoClass::from_bytes`] or
//! [`ModuleInfoClass::minimal`], edited in place, and serialized again with
//! [`ModuleInfoClass::to_bytes`].
//!
//! Edits add constant pool entries but never remove them. An entry that
//! becomes unreferenced stays in the pool until
//! [`ModuleInfoClass::compact_constant_pool`] is called.

mod compact;
mod minimal;
mod reader;

use crate::attribute::{
    AttributeInfos, AttributeRef, DirectiveFlags, GenericAttribute, ModuleAttribute,
    PackageDirective, Requires, RequiresFlags, MODULE_MAIN_CLASS,
};
use crate::codec::{ByteCursor, ByteSink};
use crate::descriptor::{ModuleDescriptor, ModuleDescriptorFactory, ModuleVersion};
use crate::error::{Error, Result};
use crate::pool::{ConstantPool, Utf8Constant};
use bytes::Bytes;
use tracing::debug;

pub use minimal::{
    MinimalConfig, DEFAULT_JAVA_BASE_VERSION, DEFAULT_MAJOR_VERSION, DEFAULT_MINOR_VERSION,
};
pub use reader::ModuleInfoClassReader;

/// The class file magic number
pub const MAGIC: u32 = 0xCAFE_BABE;

/// The only access flags a module descriptor may have
pub const ACC_MODULE: u16 = 0x8000;

/// The class name of every module descriptor
pub const MODULE_INFO: &str = "module-info";

/// A parsed `module-info.class`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfoClass {
    minor_version: u16,
    major_version: u16,
    pool: ConstantPool,
    access_flags: u16,
    this_class_index: u16,
    attributes: AttributeInfos,
}

impl ModuleInfoClass {
    pub(crate) fn from_parts(
        minor_version: u16,
        major_version: u16,
        pool: ConstantPool,
        access_flags: u16,
        this_class_index: u16,
        attributes: AttributeInfos,
    ) -> Self {
        Self {
            minor_version,
            major_version,
            pool,
            access_flags,
            this_class_index,
            attributes,
        }
    }

    /// Parses a descriptor, rejecting anything that is not a well-formed module descriptor
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Result<Self> {
        ModuleInfoClassReader::new(bytes).read()
    }

    /// Always [`MAGIC`]
    pub fn magic(&self) -> u32 {
        MAGIC
    }

    /// Class file minor version
    pub fn minor_version(&self) -> u16 {
        self.minor_version
    }

    /// Class file major version
    pub fn major_version(&self) -> u16 {
        self.major_version
    }

    /// Always [`ACC_MODULE`]
    pub fn access_flags(&self) -> u16 {
        self.access_flags
    }

    /// Pool index of the `module-info` Class entry
    pub fn this_class_index(&self) -> u16 {
        self.this_class_index
    }

    /// The constant pool
    pub fn constant_pool(&self) -> &ConstantPool {
        &self.pool
    }

    /// The attribute list
    pub fn attributes(&self) -> &AttributeInfos {
        &self.attributes
    }

    #[cfg(test)]
    pub(crate) fn attributes_mut(&mut self) -> &mut AttributeInfos {
        &mut self.attributes
    }

    /// The Module attribute
    pub fn module_attribute(&self) -> &ModuleAttribute {
        self.attributes.module()
    }

    /// Resolves the descriptor into its semantic model
    pub fn descriptor(&self) -> Result<ModuleDescriptor> {
        ModuleDescriptorFactory::create(self)
    }

    /// The module name
    pub fn module_name(&self) -> Result<&str> {
        self.pool
            .resolve_module_name(self.module_attribute().module_name_index)
    }

    /// The module version string as stored, if any
    pub fn raw_module_version(&self) -> Result<Option<&str>> {
        match self.module_attribute().module_version_index {
            0 => Ok(None),
            index => self.pool.resolve_utf8(index).map(Some),
        }
    }

    /// The parsed module version, if any
    pub fn module_version(&self) -> Result<Option<ModuleVersion>> {
        self.raw_module_version()?
            .map(ModuleVersion::parse)
            .transpose()
    }

    /// Renames the module
    pub fn set_module_name(&mut self, module_name: &str) -> Result<()> {
        let index = self.pool.add_module(module_name)?;
        debug!("Setting module name to {} (index {})", module_name, index);
        self.attributes.module_mut().module_name_index = index;
        Ok(())
    }

    /// Sets the module version.
    ///
    /// An existing version entry is overwritten in place, unless another part
    /// of the descriptor refers to the same Utf8 entry; then a new entry is
    /// added instead.
    pub fn set_module_version(&mut self, version: &ModuleVersion) -> Result<()> {
        let index = self.module_attribute().module_version_index;
        if index != 0 && self.utf8_references(index) == 1 {
            debug!("Replacing module version at index {} with {}", index, version);
            return self.pool.replace(index, Utf8Constant::new(version.as_str()));
        }

        let index = self.pool.add_utf8(version.as_str())?;
        debug!("Setting module version to {} (index {})", version, index);
        self.attributes.module_mut().module_version_index = index;
        Ok(())
    }

    /// Drops the module version. The pool entry is left in place.
    pub fn remove_module_version(&mut self) {
        debug!("Removing module version");
        self.attributes.module_mut().module_version_index = 0;
    }

    /// Number of places in the descriptor that refer to the Utf8 entry at `index`
    fn utf8_references(&self, index: u16) -> usize {
        let module = self.module_attribute();
        let from_pool = self
            .pool
            .iter()
            .filter(|(_, entry)| entry.name_index() == Some(index))
            .count();
        let from_attributes = self
            .attributes
            .iter()
            .filter(|attr| attribute_name_index(*attr) == index)
            .count();
        let from_source_file = self
            .attributes
            .source_file()
            .map_or(0, |s| usize::from(s.sourcefile_index == index));
        let from_module = usize::from(module.module_version_index == index)
            + module
                .requires
                .iter()
                .filter(|r| r.version_index == index)
                .count();
        from_pool + from_attributes + from_source_file + from_module
    }

    fn requires_positions(&self, module_name: &str) -> Result<Vec<usize>> {
        let mut positions = Vec::new();
        for (i, requires) in self.module_attribute().requires.iter().enumerate() {
            if self.pool.resolve_module_name(requires.requires_index)? == module_name {
                positions.push(i);
            }
        }
        Ok(positions)
    }

    /// Adds a requires directive, or updates the flags and version of an existing one.
    ///
    /// Updating never clears the MANDATED flag.
    pub fn set_requires(
        &mut self,
        module_name: &str,
        flags: RequiresFlags,
        version: Option<&ModuleVersion>,
    ) -> Result<()> {
        let version_index = match version {
            Some(version) => self.pool.add_utf8(version.as_str())?,
            None => 0,
        };

        if let Some(&position) = self.requires_positions(module_name)?.first() {
            let requires = &mut self.attributes.module_mut().requires[position];
            // A mandated dependency stays mandated
            let flags = flags | (requires.flags & RequiresFlags::MANDATED);
            debug!("Updating requires {}: {:?}", module_name, flags);
            requires.flags = flags;
            requires.version_index = version_index;
            return Ok(());
        }

        let requires_index = self.pool.add_module(module_name)?;
        debug!("Adding requires {}: {:?}", module_name, flags);
        self.attributes.module_mut().requires.push(Requires {
            requires_index,
            flags,
            version_index,
        });
        Ok(())
    }

    /// Removes every requires directive for `module_name`.
    ///
    /// Fails, leaving the descriptor unchanged, if a matching directive is
    /// mandated. Returns whether anything was removed.
    pub fn remove_requires(&mut self, module_name: &str) -> Result<bool> {
        let positions = self.requires_positions(module_name)?;
        let requires = &self.module_attribute().requires;
        if positions
            .iter()
            .any(|&i| requires[i].flags.contains(RequiresFlags::MANDATED))
        {
            return Err(Error::mandated_requires(module_name));
        }

        debug!("Removing {} requires {}", positions.len(), module_name);
        let mut i = 0;
        self.attributes.module_mut().requires.retain(|_| {
            let keep = !positions.contains(&i);
            i += 1;
            keep
        });
        Ok(!positions.is_empty())
    }

    fn exports_positions(&self, package: &str) -> Result<Vec<usize>> {
        let mut positions = Vec::new();
        for (i, exports) in self.module_attribute().exports.iter().enumerate() {
            if self.pool.resolve_package_name(exports.package_index)? == package {
                positions.push(i);
            }
        }
        Ok(positions)
    }

    /// Exports `package`, to `targets` only if it is not empty.
    ///
    /// An existing exports directive for the package is retargeted and keeps
    /// its flags. Repeated targets are stored once.
    pub fn set_exports(&mut self, package: &str, targets: &[&str]) -> Result<()> {
        let mut to_indices = Vec::with_capacity(targets.len());
        for target in targets {
            let index = self.pool.add_module(target)?;
            if !to_indices.contains(&index) {
                to_indices.push(index);
            }
        }

        if let Some(&position) = self.exports_positions(package)?.first() {
            debug!("Updating exports {} to {:?}", package, targets);
            self.attributes.module_mut().exports[position].to_indices = to_indices;
            return Ok(());
        }

        let package_index = self.pool.add_package(package)?;
        debug!("Adding exports {} to {:?}", package, targets);
        self.attributes.module_mut().exports.push(PackageDirective {
            package_index,
            flags: DirectiveFlags::empty(),
            to_indices,
        });
        Ok(())
    }

    /// Removes every exports directive for `package`; returns whether any was removed
    pub fn remove_exports(&mut self, package: &str) -> Result<bool> {
        let positions = self.exports_positions(package)?;
        debug!("Removing {} exports {}", positions.len(), package);
        let mut i = 0;
        self.attributes.module_mut().exports.retain(|_| {
            let keep = !positions.contains(&i);
            i += 1;
            keep
        });
        Ok(!positions.is_empty())
    }

    /// The main class named by the ModuleMainClass attribute, if any
    pub fn main_class(&self) -> Result<Option<String>> {
        let Some(attribute) = self.attributes.generic(MODULE_MAIN_CLASS) else {
            return Ok(None);
        };
        let class_index = ByteCursor::new(attribute.info.clone()).read_u2()?;
        self.pool.resolve_class_name(class_index).map(Some)
    }

    /// Creates or replaces the ModuleMainClass attribute
    pub fn set_main_class(&mut self, class_name: &str) -> Result<()> {
        let attribute_name_index = self.pool.add_utf8(MODULE_MAIN_CLASS)?;
        let class_index = self.pool.add_class(class_name)?;
        debug!("Setting main class to {} (index {})", class_name, class_index);
        self.attributes.set_generic(GenericAttribute {
            attribute_name_index,
            name: MODULE_MAIN_CLASS.to_string(),
            info: Bytes::copy_from_slice(&class_index.to_be_bytes()),
        });
        Ok(())
    }

    /// Drops the ModuleMainClass attribute; returns whether it was present
    pub fn remove_main_class(&mut self) -> bool {
        debug!("Removing main class");
        self.attributes.remove_generic(MODULE_MAIN_CLASS)
    }

    /// Serializes the descriptor into `sink`
    pub fn append_to(&self, sink: &mut ByteSink) -> Result<()> {
        sink.append_u4(MAGIC);
        sink.append_u2(self.minor_version);
        sink.append_u2(self.major_version);
        self.pool.append_to(sink)?;
        sink.append_u2(self.access_flags);
        sink.append_u2(self.this_class_index);
        sink.append_u2(0); // super_class
        sink.append_u2(0); // interfaces_count
        sink.append_u2(0); // fields_count
        sink.append_u2(0); // methods_count
        self.attributes.append_to(sink)
    }

    /// Serializes the descriptor
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut sink = ByteSink::new();
        self.append_to(&mut sink)?;
        debug!("Serialized module descriptor: {} bytes", sink.size());
        Ok(sink.to_vec())
    }
}

fn attribute_name_index(attribute: AttributeRef<'_>) -> u16 {
    match attribute {
        AttributeRef::Module(module) => module.attribute_name_index,
        AttributeRef::SourceFile(source_file) => source_file.attribute_name_index,
        AttributeRef::Generic(generic) => generic.attribute_name_index,
    }
}
