//! The constant pool of a module descriptor.
//!
//! The pool is a 1-indexed table: index 0 is reserved, and the class file's
//! `constant_pool_count` is one more than the number of entries. Entries are
//! deduplicated on [`ConstantPool::add`], so adding a structurally equal entry
//! twice yields the same index.
//!
//! Names are stored indirectly: Class, Module and Package entries point at a
//! Utf8 entry. Class and package names use the internal `/` separator, which
//! the `resolve_*_name` methods convert to `.`.

mod entry;

use crate::codec::ByteSink;
use crate::error::{Error, Result};
use tracing::trace;

pub use entry::{ConstantKind, ConstantPoolEntry, Utf8Constant};

/// Largest number of entries whose count still fits `constant_pool_count`
const MAX_ENTRIES: usize = u16::MAX as usize - 1;

/// Deduplicating, 1-indexed table of constant pool entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstantPool {
    entries: Vec<ConstantPoolEntry>,
}

impl ConstantPool {
    /// Creates an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// `constant_pool_count`: number of entries plus one
    pub fn count(&self) -> u16 {
        // `push` keeps entries.len() <= MAX_ENTRIES
        (self.entries.len() + 1) as u16
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the pool holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(index, entry)` pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (u16, &ConstantPoolEntry)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| ((i + 1) as u16, entry))
    }

    /// The entry at `index`, if any
    pub fn get(&self, index: u16) -> Option<&ConstantPoolEntry> {
        (index as usize)
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
    }

    /// The entry at `index`, failing on a dangling reference
    pub fn entry(&self, index: u16) -> Result<&ConstantPoolEntry> {
        self.get(index).ok_or(Error::MissingConstant { index })
    }

    fn push(&mut self, entry: ConstantPoolEntry) -> Result<u16> {
        if self.entries.len() >= MAX_ENTRIES {
            return Err(Error::PoolOverflow);
        }
        self.entries.push(entry);
        Ok(self.entries.len() as u16)
    }

    /// Returns the index of an equal entry, appending `entry` if there is none
    pub fn add(&mut self, entry: ConstantPoolEntry) -> Result<u16> {
        if let Some((index, _)) = self.iter().find(|(_, existing)| **existing == entry) {
            return Ok(index);
        }
        let index = self.push(entry)?;
        trace!("Appended constant pool entry {}: {:?}", index, self.entries[index as usize - 1]);
        Ok(index)
    }

    /// Appends `entry` at `index`, which must equal [`count`](Self::count).
    ///
    /// Used while parsing, where entries arrive in file order. No
    /// deduplication takes place.
    pub fn append(&mut self, index: u16, entry: ConstantPoolEntry) -> Result<()> {
        if index != self.count() {
            return Err(Error::OutOfSequence {
                index,
                count: self.count(),
            });
        }
        self.push(entry)?;
        Ok(())
    }

    /// Overwrites the Utf8 entry at `index` in place
    pub fn replace(&mut self, index: u16, utf8: Utf8Constant) -> Result<()> {
        match (index as usize)
            .checked_sub(1)
            .and_then(|i| self.entries.get_mut(i))
        {
            Some(slot @ ConstantPoolEntry::Utf8(_)) => {
                *slot = ConstantPoolEntry::Utf8(utf8);
                Ok(())
            }
            _ => Err(Error::InvalidReplacement { index }),
        }
    }

    /// Adds (or finds) a Utf8 entry for `text`
    pub fn add_utf8(&mut self, text: &str) -> Result<u16> {
        self.add(ConstantPoolEntry::utf8(text))
    }

    /// Adds (or finds) a Module entry and its Utf8 name
    pub fn add_module(&mut self, module_name: &str) -> Result<u16> {
        let name_index = self.add_utf8(module_name)?;
        self.add(ConstantPoolEntry::Module { name_index })
    }

    /// Adds (or finds) a Package entry for a `.`-separated package name
    pub fn add_package(&mut self, package_name: &str) -> Result<u16> {
        let name_index = self.add_utf8(&package_name.replace('.', "/"))?;
        self.add(ConstantPoolEntry::Package { name_index })
    }

    /// Adds (or finds) a Class entry for a `.`-separated class name
    pub fn add_class(&mut self, class_name: &str) -> Result<u16> {
        let name_index = self.add_utf8(&class_name.replace('.', "/"))?;
        self.add(ConstantPoolEntry::Class { name_index })
    }

    fn expect(&self, index: u16, expected: ConstantKind) -> Result<&ConstantPoolEntry> {
        let entry = self.entry(index)?;
        if entry.kind() != expected {
            return Err(Error::ConstantKindMismatch {
                index,
                expected,
                found: entry.kind(),
            });
        }
        Ok(entry)
    }

    fn name_of(&self, index: u16, expected: ConstantKind) -> Result<&str> {
        match self.expect(index, expected)?.name_index() {
            Some(name_index) => self.resolve_utf8(name_index),
            None => Err(Error::ConstantKindMismatch {
                index,
                expected,
                found: ConstantKind::Utf8,
            }),
        }
    }

    /// Text of the Utf8 entry at `index`
    pub fn resolve_utf8(&self, index: u16) -> Result<&str> {
        match self.expect(index, ConstantKind::Utf8)? {
            ConstantPoolEntry::Utf8(utf8) => Ok(utf8.as_str()),
            other => Err(Error::ConstantKindMismatch {
                index,
                expected: ConstantKind::Utf8,
                found: other.kind(),
            }),
        }
    }

    /// `.`-separated name of the Class entry at `index`
    pub fn resolve_class_name(&self, index: u16) -> Result<String> {
        Ok(self.name_of(index, ConstantKind::Class)?.replace('/', "."))
    }

    /// Raw internal name of the Class entry at `index`
    pub fn resolve_binary_class_name(&self, index: u16) -> Result<&str> {
        self.name_of(index, ConstantKind::Class)
    }

    /// `.`-separated name of the Package entry at `index`
    pub fn resolve_package_name(&self, index: u16) -> Result<String> {
        Ok(self.name_of(index, ConstantKind::Package)?.replace('/', "."))
    }

    /// Name of the Module entry at `index`.
    ///
    /// The name is returned verbatim; it is not checked against the module
    /// name grammar.
    pub fn resolve_module_name(&self, index: u16) -> Result<&str> {
        self.name_of(index, ConstantKind::Module)
    }

    /// Serializes `constant_pool_count` followed by every entry
    pub fn append_to(&self, sink: &mut ByteSink) -> Result<()> {
        sink.append_u2(self.count());
        for entry in &self.entries {
            entry.append_to(sink)?;
        }
        Ok(())
    }

    pub(crate) fn from_entries(entries: Vec<ConstantPoolEntry>) -> Self {
        Self { entries }
    }
}
