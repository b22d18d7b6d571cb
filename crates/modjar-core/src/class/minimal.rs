//! The smallest valid descriptor for a module, as javac would emit for
//! `module NAME {}`.

use super::{ModuleInfoClass, ACC_MODULE, MODULE_INFO};
use crate::attribute::{
    AttributeInfo, AttributeInfos, ModuleAttribute, Requires, RequiresFlags, SourceFileAttribute,
    MODULE, SOURCE_FILE,
};
use crate::error::Result;
use crate::pool::{ConstantPool, ConstantPoolEntry};
use tracing::debug;

/// Class file minor version of a new descriptor
pub const DEFAULT_MINOR_VERSION: u16 = 0;

/// Class file major version of a new descriptor (Java 17)
pub const DEFAULT_MAJOR_VERSION: u16 = 61;

/// Version recorded on the mandated `java.base` dependency
pub const DEFAULT_JAVA_BASE_VERSION: &str = "17";

/// Parameters for [`ModuleInfoClass::minimal`]
#[derive(Debug, Clone)]
pub struct MinimalConfig {
    /// Class file minor version
    pub minor_version: u16,
    /// Class file major version
    pub major_version: u16,
    /// Version string of the `java.base` requires
    pub java_base_version: String,
}

impl Default for MinimalConfig {
    fn default() -> Self {
        Self {
            minor_version: DEFAULT_MINOR_VERSION,
            major_version: DEFAULT_MAJOR_VERSION,
            java_base_version: DEFAULT_JAVA_BASE_VERSION.to_string(),
        }
    }
}

impl MinimalConfig {
    /// Creates a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the class file minor version
    pub fn with_minor_version(mut self, minor_version: u16) -> Self {
        self.minor_version = minor_version;
        self
    }

    /// Sets the class file major version
    pub fn with_major_version(mut self, major_version: u16) -> Self {
        self.major_version = major_version;
        self
    }

    /// Sets the version recorded for `java.base`
    pub fn with_java_base_version(mut self, version: impl Into<String>) -> Self {
        self.java_base_version = version.into();
        self
    }
}

impl ModuleInfoClass {
    /// Builds a descriptor declaring `module_name` with only the mandated
    /// dependency on `java.base`.
    ///
    /// The name is not validated.
    pub fn minimal(module_name: &str, config: &MinimalConfig) -> Result<Self> {
        debug!(
            "Creating minimal descriptor for {} (class file {}.{}, java.base {})",
            module_name, config.major_version, config.minor_version, config.java_base_version
        );

        // Fixed layout; entries are appended without deduplication
        let entries = [
            ConstantPoolEntry::Class { name_index: 8 },
            ConstantPoolEntry::utf8(SOURCE_FILE),
            ConstantPoolEntry::utf8("module-info.java"),
            ConstantPoolEntry::utf8(MODULE),
            ConstantPoolEntry::Module { name_index: 9 },
            ConstantPoolEntry::Module { name_index: 10 },
            ConstantPoolEntry::utf8(config.java_base_version.as_str()),
            ConstantPoolEntry::utf8(MODULE_INFO),
            ConstantPoolEntry::utf8(module_name),
            ConstantPoolEntry::utf8("java.base"),
        ];
        let mut pool = ConstantPool::new();
        for entry in entries {
            pool.append(pool.count(), entry)?;
        }

        let mut module = ModuleAttribute::new(4, 5);
        module.requires.push(Requires {
            requires_index: 6,
            flags: RequiresFlags::MANDATED,
            version_index: 7,
        });

        let attributes = AttributeInfos::from_attributes([
            AttributeInfo::SourceFile(SourceFileAttribute {
                attribute_name_index: 2,
                sourcefile_index: 3,
            }),
            AttributeInfo::Module(module),
        ])?;

        Ok(ModuleInfoClass::from_parts(
            config.minor_version,
            config.major_version,
            pool,
            ACC_MODULE,
            1,
            attributes,
        ))
    }
}
