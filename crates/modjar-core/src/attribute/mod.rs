//! Attributes of a module descriptor.
//!
//! A descriptor carries exactly one `Module` attribute, at most one
//! `SourceFile` attribute, and any number of attributes from a fixed list
//! that are kept as opaque bytes. [`AttributeInfos`] enforces the counts and
//! keeps the file order so the list serializes back unchanged.

mod module;

use crate::codec::ByteSink;
use crate::error::{Error, Result};
use bytes::Bytes;

pub use module::{
    DirectiveFlags, Exports, ModuleAttribute, ModuleFlags, Opens, PackageDirective, Provides,
    Requires, RequiresFlags,
};

/// Name of the Module attribute
pub const MODULE: &str = "Module";
/// Name of the SourceFile attribute
pub const SOURCE_FILE: &str = "SourceFile";
/// Name of the ModulePackages attribute
pub const MODULE_PACKAGES: &str = "ModulePackages";
/// Name of the ModuleMainClass attribute
pub const MODULE_MAIN_CLASS: &str = "ModuleMainClass";
/// Name of the InnerClasses attribute
pub const INNER_CLASSES: &str = "InnerClasses";

/// Attributes accepted in a descriptor and preserved byte for byte
pub const OPAQUE_ATTRIBUTES: &[&str] = &[
    MODULE_PACKAGES,
    MODULE_MAIN_CLASS,
    INNER_CLASSES,
    "SourceDebugExtension",
    "RuntimeVisibleAnnotations",
    "RuntimeInvisibleAnnotations",
];

/// The SourceFile attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFileAttribute {
    /// Utf8 entry holding the attribute name `SourceFile`
    pub attribute_name_index: u16,
    /// Utf8 entry holding the source file name
    pub sourcefile_index: u16,
}

/// An attribute kept as uninterpreted bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericAttribute {
    /// Utf8 entry holding the attribute name
    pub attribute_name_index: u16,
    /// The resolved attribute name
    pub name: String,
    /// The payload following the attribute length
    pub info: Bytes,
}

/// One attribute, as produced by the reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeInfo {
    /// `Module`
    Module(ModuleAttribute),
    /// `SourceFile`
    SourceFile(SourceFileAttribute),
    /// Any other accepted attribute
    Generic(GenericAttribute),
}

/// Borrowed view of one attribute in an [`AttributeInfos`]
#[derive(Debug, Clone, Copy)]
pub enum AttributeRef<'a> {
    /// `Module`
    Module(&'a ModuleAttribute),
    /// `SourceFile`
    SourceFile(&'a SourceFileAttribute),
    /// Any other accepted attribute
    Generic(&'a GenericAttribute),
}

impl AttributeRef<'_> {
    /// The attribute name
    pub fn name(&self) -> &str {
        match self {
            AttributeRef::Module(_) => MODULE,
            AttributeRef::SourceFile(_) => SOURCE_FILE,
            AttributeRef::Generic(generic) => &generic.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Module,
    SourceFile(SourceFileAttribute),
    Generic(GenericAttribute),
}

/// Ordered attribute list of a module descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfos {
    slots: Vec<Slot>,
    module: ModuleAttribute,
}

impl AttributeInfos {
    /// Creates a list holding only `module`
    pub fn new(module: ModuleAttribute) -> Self {
        Self {
            slots: vec![Slot::Module],
            module,
        }
    }

    /// Builds a list from attributes in file order.
    ///
    /// Fails if Module or SourceFile occurs more than once, or if there is
    /// no Module attribute.
    pub fn from_attributes(attributes: impl IntoIterator<Item = AttributeInfo>) -> Result<Self> {
        let mut slots = Vec::new();
        let mut module = None;
        let mut has_source_file = false;

        for attribute in attributes {
            match attribute {
                AttributeInfo::Module(attr) => {
                    if module.is_some() {
                        return Err(Error::DuplicateAttribute { name: MODULE });
                    }
                    module = Some(attr);
                    slots.push(Slot::Module);
                }
                AttributeInfo::SourceFile(attr) => {
                    if has_source_file {
                        return Err(Error::DuplicateAttribute { name: SOURCE_FILE });
                    }
                    has_source_file = true;
                    slots.push(Slot::SourceFile(attr));
                }
                AttributeInfo::Generic(attr) => slots.push(Slot::Generic(attr)),
            }
        }

        let module = module.ok_or(Error::MissingModuleAttribute)?;
        Ok(Self { slots, module })
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false: the Module attribute is mandatory
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The Module attribute
    pub fn module(&self) -> &ModuleAttribute {
        &self.module
    }

    /// The Module attribute, mutably
    pub fn module_mut(&mut self) -> &mut ModuleAttribute {
        &mut self.module
    }

    /// The SourceFile attribute, if present
    pub fn source_file(&self) -> Option<&SourceFileAttribute> {
        self.slots.iter().find_map(|slot| match slot {
            Slot::SourceFile(attr) => Some(attr),
            _ => None,
        })
    }

    pub(crate) fn source_file_mut(&mut self) -> Option<&mut SourceFileAttribute> {
        self.slots.iter_mut().find_map(|slot| match slot {
            Slot::SourceFile(attr) => Some(attr),
            _ => None,
        })
    }

    /// The first opaque attribute called `name`
    pub fn generic(&self, name: &str) -> Option<&GenericAttribute> {
        self.generics().find(|attr| attr.name == name)
    }

    /// All opaque attributes in file order
    pub fn generics(&self) -> impl Iterator<Item = &GenericAttribute> + '_ {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Generic(attr) => Some(attr),
            _ => None,
        })
    }

    pub(crate) fn generics_mut(&mut self) -> impl Iterator<Item = &mut GenericAttribute> + '_ {
        self.slots.iter_mut().filter_map(|slot| match slot {
            Slot::Generic(attr) => Some(attr),
            _ => None,
        })
    }

    /// Replaces the first opaque attribute with the same name, or appends it
    pub fn set_generic(&mut self, attribute: GenericAttribute) {
        let existing = self.slots.iter_mut().find_map(|slot| match slot {
            Slot::Generic(attr) if attr.name == attribute.name => Some(attr),
            _ => None,
        });
        match existing {
            Some(attr) => *attr = attribute,
            None => self.slots.push(Slot::Generic(attribute)),
        }
    }

    /// Removes every opaque attribute called `name`; returns whether any was removed
    pub fn remove_generic(&mut self, name: &str) -> bool {
        let before = self.slots.len();
        self.slots
            .retain(|slot| !matches!(slot, Slot::Generic(attr) if attr.name == name));
        self.slots.len() != before
    }

    /// Iterates over the attributes in file order
    pub fn iter(&self) -> impl Iterator<Item = AttributeRef<'_>> + '_ {
        self.slots.iter().map(move |slot| match slot {
            Slot::Module => AttributeRef::Module(&self.module),
            Slot::SourceFile(attr) => AttributeRef::SourceFile(attr),
            Slot::Generic(attr) => AttributeRef::Generic(attr),
        })
    }

    /// Serializes `attributes_count` and every attribute.
    ///
    /// Each attribute length is written as a placeholder and patched once
    /// the payload has been written.
    pub fn append_to(&self, sink: &mut ByteSink) -> Result<()> {
        sink.append_count("attributes_count", self.slots.len())?;
        for attribute in self.iter() {
            match attribute {
                AttributeRef::Module(module) => {
                    append_attribute(sink, module.attribute_name_index, |sink| {
                        module.append_payload(sink)
                    })?
                }
                AttributeRef::SourceFile(source_file) => {
                    append_attribute(sink, source_file.attribute_name_index, |sink| {
                        sink.append_u2(source_file.sourcefile_index);
                        Ok(())
                    })?
                }
                AttributeRef::Generic(generic) => {
                    append_attribute(sink, generic.attribute_name_index, |sink| {
                        sink.append_bytes(&generic.info);
                        Ok(())
                    })?
                }
            }
        }
        Ok(())
    }
}

fn append_attribute(
    sink: &mut ByteSink,
    attribute_name_index: u16,
    payload: impl FnOnce(&mut ByteSink) -> Result<()>,
) -> Result<()> {
    sink.append_u2(attribute_name_index);
    let length_offset = sink.size();
    sink.append_u4(0);

    let start = sink.size();
    payload(sink)?;
    let length = sink.size() - start;
    let length = u32::try_from(length).map_err(|_| Error::FieldOverflow {
        field: "attribute_length",
        value: length,
    })?;
    sink.write_u4_at(length_offset, length)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generic(name: &str, info: &'static [u8]) -> GenericAttribute {
        GenericAttribute {
            attribute_name_index: 9,
            name: name.to_string(),
            info: Bytes::from_static(info),
        }
    }

    #[test]
    fn test_requires_module_attribute() {
        let result = AttributeInfos::from_attributes(vec![AttributeInfo::SourceFile(
            SourceFileAttribute {
                attribute_name_index: 1,
                sourcefile_index: 2,
            },
        )]);
        assert!(matches!(result, Err(Error::MissingModuleAttribute)));
    }

    #[test]
    fn test_rejects_duplicates() {
        let module = ModuleAttribute::new(1, 2);
        let result = AttributeInfos::from_attributes(vec![
            AttributeInfo::Module(module.clone()),
            AttributeInfo::Module(module),
        ]);
        assert!(matches!(
            result,
            Err(Error::DuplicateAttribute { name: "Module" })
        ));

        let source_file = SourceFileAttribute {
            attribute_name_index: 3,
            sourcefile_index: 4,
        };
        let result = AttributeInfos::from_attributes(vec![
            AttributeInfo::SourceFile(source_file.clone()),
            AttributeInfo::Module(ModuleAttribute::new(1, 2)),
            AttributeInfo::SourceFile(source_file),
        ]);
        assert!(matches!(
            result,
            Err(Error::DuplicateAttribute { name: "SourceFile" })
        ));
    }

    #[test]
    fn test_keeps_file_order() {
        let attributes = AttributeInfos::from_attributes(vec![
            AttributeInfo::Generic(generic(MODULE_PACKAGES, &[0, 0])),
            AttributeInfo::Module(ModuleAttribute::new(1, 2)),
            AttributeInfo::SourceFile(SourceFileAttribute {
                attribute_name_index: 3,
                sourcefile_index: 4,
            }),
        ])
        .unwrap();

        let names: Vec<_> = attributes.iter().map(|attr| attr.name().to_string()).collect();
        assert_eq!(names, vec!["ModulePackages", "Module", "SourceFile"]);
        assert_eq!(attributes.source_file().map(|s| s.sourcefile_index), Some(4));
    }

    #[test]
    fn test_set_and_remove_generic() {
        let mut attributes = AttributeInfos::new(ModuleAttribute::new(1, 2));
        attributes.set_generic(generic(MODULE_MAIN_CLASS, &[0, 7]));
        attributes.set_generic(generic(MODULE_MAIN_CLASS, &[0, 8]));
        assert_eq!(attributes.len(), 2);
        assert_eq!(
            attributes.generic(MODULE_MAIN_CLASS).map(|a| a.info.as_ref()),
            Some(&[0u8, 8][..])
        );

        assert!(attributes.remove_generic(MODULE_MAIN_CLASS));
        assert!(!attributes.remove_generic(MODULE_MAIN_CLASS));
        assert_eq!(attributes.len(), 1);
    }

    #[test]
    fn test_backpatched_lengths() {
        let attributes = AttributeInfos::from_attributes(vec![
            AttributeInfo::SourceFile(SourceFileAttribute {
                attribute_name_index: 3,
                sourcefile_index: 4,
            }),
            AttributeInfo::Module(ModuleAttribute::new(5, 6)),
        ])
        .unwrap();

        let mut sink = ByteSink::with_chunk_size(5);
        attributes.append_to(&mut sink).unwrap();

        let mut expected = vec![0, 2];
        expected.extend_from_slice(&[0, 3, 0, 0, 0, 2, 0, 4]);
        expected.extend_from_slice(&[0, 5, 0, 0, 0, 16]);
        expected.extend_from_slice(&[0, 6, 0, 0, 0, 0]);
        expected.extend_from_slice(&[0; 10]);
        assert_eq!(sink.to_vec(), expected);
    }
}
