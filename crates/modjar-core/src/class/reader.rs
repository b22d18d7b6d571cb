//! Parser for `module-info.class` bytes.

use super::{ModuleInfoClass, ACC_MODULE, MAGIC, MODULE_INFO};
use crate::attribute::{
    AttributeInfo, AttributeInfos, GenericAttribute, ModuleAttribute, SourceFileAttribute,
    MODULE, OPAQUE_ATTRIBUTES, SOURCE_FILE,
};
use crate::codec::ByteCursor;
use crate::error::{Error, Result};
use crate::pool::{ConstantKind, ConstantPool, ConstantPoolEntry, Utf8Constant};
use bytes::Bytes;
use tracing::{debug, trace, warn};

/// Reads a module descriptor front to back.
///
/// The first violation of the descriptor rules aborts the read; no partial
/// result is returned.
#[derive(Debug)]
pub struct ModuleInfoClassReader {
    cursor: ByteCursor,
}

impl ModuleInfoClassReader {
    /// Creates a reader over `bytes`
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            cursor: ByteCursor::new(bytes),
        }
    }

    /// Parses the whole descriptor
    pub fn read(mut self) -> Result<ModuleInfoClass> {
        let magic = self.cursor.read_u4()?;
        if magic != MAGIC {
            return Err(Error::BadMagic { found: magic });
        }

        let minor_version = self.cursor.read_u2()?;
        let major_version = self.cursor.read_u2()?;
        debug!("Class file version {}.{}", major_version, minor_version);

        let pool = self.read_constant_pool()?;

        let access_flags = self.cursor.read_u2()?;
        if access_flags != ACC_MODULE {
            return Err(Error::InvalidAccessFlags {
                found: access_flags,
            });
        }

        let this_class_index = self.cursor.read_u2()?;
        let this_class = pool.resolve_binary_class_name(this_class_index)?;
        if this_class != MODULE_INFO {
            return Err(Error::NotModuleInfo {
                name: this_class.to_string(),
            });
        }

        for field in ["super_class", "interfaces_count", "fields_count", "methods_count"] {
            let value = self.cursor.read_u2()?;
            if value != 0 {
                return Err(Error::NonZeroCount { field, value });
            }
        }

        let attributes = self.read_attributes(&pool)?;

        if !self.cursor.is_empty() {
            warn!(
                "Ignoring {} trailing byte(s) after the last attribute",
                self.cursor.remaining()
            );
        }

        Ok(ModuleInfoClass::from_parts(
            minor_version,
            major_version,
            pool,
            access_flags,
            this_class_index,
            attributes,
        ))
    }

    fn read_constant_pool(&mut self) -> Result<ConstantPool> {
        let count = self.cursor.read_u2()?;
        let mut pool = ConstantPool::new();

        for index in 1..count {
            let tag = self.cursor.read_u1()?;
            let kind = ConstantKind::from_tag(tag).ok_or(Error::UnknownConstantTag { index, tag })?;
            let entry = match kind {
                ConstantKind::Utf8 => {
                    let length = self.cursor.read_u2()?;
                    let bytes = self.cursor.read_bytes(length.into())?;
                    ConstantPoolEntry::Utf8(Utf8Constant::from_bytes(bytes.to_vec())?)
                }
                ConstantKind::Class => ConstantPoolEntry::Class {
                    name_index: self.cursor.read_u2()?,
                },
                ConstantKind::Module => ConstantPoolEntry::Module {
                    name_index: self.cursor.read_u2()?,
                },
                ConstantKind::Package => ConstantPoolEntry::Package {
                    name_index: self.cursor.read_u2()?,
                },
                _ => return Err(Error::UnsupportedConstant { index, kind }),
            };
            trace!("Constant pool entry {}: {:?}", index, entry);
            pool.append(index, entry)?;
        }

        debug!("Read constant pool with {} entries", pool.len());
        Ok(pool)
    }

    fn read_attributes(&mut self, pool: &ConstantPool) -> Result<AttributeInfos> {
        let count = self.cursor.read_u2()?;
        let mut attributes = Vec::with_capacity(count.into());

        for _ in 0..count {
            let name_index = self.cursor.read_u2()?;
            let length = self.cursor.read_u4()?;
            let name = pool.resolve_utf8(name_index)?;
            trace!("Attribute {} ({} bytes)", name, length);

            let attribute = match name {
                MODULE => AttributeInfo::Module(ModuleAttribute::read(name_index, &mut self.cursor)?),
                SOURCE_FILE => AttributeInfo::SourceFile(SourceFileAttribute {
                    attribute_name_index: name_index,
                    sourcefile_index: self.cursor.read_u2()?,
                }),
                _ if OPAQUE_ATTRIBUTES.contains(&name) => {
                    let length = usize::try_from(length)
                        .map_err(|_| Error::unexpected_eof(self.cursor.offset(), usize::MAX))?;
                    AttributeInfo::Generic(GenericAttribute {
                        attribute_name_index: name_index,
                        name: name.to_string(),
                        info: self.cursor.read_bytes(length)?,
                    })
                }
                _ => return Err(Error::unsupported_attribute(name)),
            };
            attributes.push(attribute);
        }

        AttributeInfos::from_attributes(attributes)
    }
}
