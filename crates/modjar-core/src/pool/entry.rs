//! Constant pool entry variants.

use crate::codec::{mutf8, ByteSink};
use crate::error::Result;
use std::fmt;

/// Every constant pool tag defined by the class file format.
///
/// Only [`Utf8`](ConstantKind::Utf8), [`Class`](ConstantKind::Class),
/// [`Module`](ConstantKind::Module) and [`Package`](ConstantKind::Package)
/// can appear in a module descriptor; the others are recognized so they can
/// be rejected with a precise error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConstantKind {
    /// CONSTANT_Utf8
    Utf8 = 1,
    /// CONSTANT_Integer
    Integer = 3,
    /// CONSTANT_Float
    Float = 4,
    /// CONSTANT_Long
    Long = 5,
    /// CONSTANT_Double
    Double = 6,
    /// CONSTANT_Class
    Class = 7,
    /// CONSTANT_String
    String = 8,
    /// CONSTANT_Fieldref
    Fieldref = 9,
    /// CONSTANT_Methodref
    Methodref = 10,
    /// CONSTANT_InterfaceMethodref
    InterfaceMethodref = 11,
    /// CONSTANT_NameAndType
    NameAndType = 12,
    /// CONSTANT_MethodHandle
    MethodHandle = 15,
    /// CONSTANT_MethodType
    MethodType = 16,
    /// CONSTANT_Dynamic
    Dynamic = 17,
    /// CONSTANT_InvokeDynamic
    InvokeDynamic = 18,
    /// CONSTANT_Module
    Module = 19,
    /// CONSTANT_Package
    Package = 20,
}

impl ConstantKind {
    /// Looks up the kind for a tag byte
    pub fn from_tag(tag: u8) -> Option<Self> {
        use ConstantKind::*;
        let kind = match tag {
            1 => Utf8,
            3 => Integer,
            4 => Float,
            5 => Long,
            6 => Double,
            7 => Class,
            8 => String,
            9 => Fieldref,
            10 => Methodref,
            11 => InterfaceMethodref,
            12 => NameAndType,
            15 => MethodHandle,
            16 => MethodType,
            17 => Dynamic,
            18 => InvokeDynamic,
            19 => Module,
            20 => Package,
            _ => return None,
        };
        Some(kind)
    }

    /// The tag byte written before the entry payload
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Returns true for the kinds a module descriptor may contain
    pub fn is_module_descriptor_kind(self) -> bool {
        matches!(
            self,
            ConstantKind::Utf8 | ConstantKind::Class | ConstantKind::Module | ConstantKind::Package
        )
    }
}

impl fmt::Display for ConstantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A CONSTANT_Utf8 payload.
///
/// Holds the raw modified UTF-8 bytes, which are what gets compared and
/// serialized, together with the decoded text. Decoding happens once, at
/// construction, so a malformed entry is rejected when it is read.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Utf8Constant {
    bytes: Vec<u8>,
    text: String,
}

impl Utf8Constant {
    /// Encodes a string
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            bytes: mutf8::encode(&text),
            text,
        }
    }

    /// Decodes raw modified UTF-8 bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let text = mutf8::decode(&bytes)?;
        Ok(Self { bytes, text })
    }

    /// The raw encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The decoded text
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Debug for Utf8Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.text)
    }
}

/// A constant pool entry that may appear in a module descriptor.
///
/// Entries are immutable values; equality is structural (bytes for Utf8,
/// name index for the reference kinds).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstantPoolEntry {
    /// Text, stored as modified UTF-8
    Utf8(Utf8Constant),
    /// Class or interface, by index of its binary name
    Class {
        /// Index of a Utf8 entry holding the `/`-separated name
        name_index: u16,
    },
    /// Module, by index of its name
    Module {
        /// Index of a Utf8 entry holding the module name
        name_index: u16,
    },
    /// Package, by index of its binary name
    Package {
        /// Index of a Utf8 entry holding the `/`-separated name
        name_index: u16,
    },
}

impl ConstantPoolEntry {
    /// Creates a Utf8 entry from text
    pub fn utf8(text: impl Into<String>) -> Self {
        ConstantPoolEntry::Utf8(Utf8Constant::new(text))
    }

    /// The kind of this entry
    pub fn kind(&self) -> ConstantKind {
        match self {
            ConstantPoolEntry::Utf8(_) => ConstantKind::Utf8,
            ConstantPoolEntry::Class { .. } => ConstantKind::Class,
            ConstantPoolEntry::Module { .. } => ConstantKind::Module,
            ConstantPoolEntry::Package { .. } => ConstantKind::Package,
        }
    }

    /// The Utf8 index referenced by a Class, Module or Package entry
    pub fn name_index(&self) -> Option<u16> {
        match self {
            ConstantPoolEntry::Utf8(_) => None,
            ConstantPoolEntry::Class { name_index }
            | ConstantPoolEntry::Module { name_index }
            | ConstantPoolEntry::Package { name_index } => Some(*name_index),
        }
    }

    /// Same entry with its name index replaced; Utf8 entries are returned as is
    pub(crate) fn with_name_index(&self, index: u16) -> Self {
        match self {
            ConstantPoolEntry::Utf8(_) => self.clone(),
            ConstantPoolEntry::Class { .. } => ConstantPoolEntry::Class { name_index: index },
            ConstantPoolEntry::Module { .. } => ConstantPoolEntry::Module { name_index: index },
            ConstantPoolEntry::Package { .. } => ConstantPoolEntry::Package { name_index: index },
        }
    }

    /// Serializes the tag byte and payload
    pub fn append_to(&self, sink: &mut ByteSink) -> Result<()> {
        sink.append_u1(self.kind().tag());
        match self {
            ConstantPoolEntry::Utf8(utf8) => {
                sink.append_count("CONSTANT_Utf8 length", utf8.as_bytes().len())?;
                sink.append_bytes(utf8.as_bytes());
            }
            ConstantPoolEntry::Class { name_index }
            | ConstantPoolEntry::Module { name_index }
            | ConstantPoolEntry::Package { name_index } => sink.append_u2(*name_index),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() {
        assert_eq!(ConstantKind::Utf8.tag(), 1);
        assert_eq!(ConstantKind::Class.tag(), 7);
        assert_eq!(ConstantKind::Module.tag(), 19);
        assert_eq!(ConstantKind::Package.tag(), 20);
        assert_eq!(ConstantKind::from_tag(10), Some(ConstantKind::Methodref));
        assert_eq!(ConstantKind::from_tag(2), None);
        assert_eq!(ConstantKind::from_tag(13), None);
        assert!(!ConstantKind::Long.is_module_descriptor_kind());
        assert!(ConstantKind::Package.is_module_descriptor_kind());
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(ConstantPoolEntry::utf8("a.b"), ConstantPoolEntry::utf8("a.b"));
        assert_ne!(
            ConstantPoolEntry::Class { name_index: 2 },
            ConstantPoolEntry::Module { name_index: 2 }
        );
    }

    #[test]
    fn test_serialized_form() {
        let mut sink = ByteSink::new();
        ConstantPoolEntry::utf8("ab").append_to(&mut sink).unwrap();
        ConstantPoolEntry::Package { name_index: 0x0102 }
            .append_to(&mut sink)
            .unwrap();
        assert_eq!(sink.to_vec(), vec![1, 0, 2, b'a', b'b', 20, 1, 2]);
    }
}
