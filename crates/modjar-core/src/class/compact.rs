//! Removal of unreferenced constant pool entries.

use super::ModuleInfoClass;
use crate::attribute::{
    GenericAttribute, ModuleAttribute, INNER_CLASSES, MODULE_MAIN_CLASS,
    MODULE_PACKAGES,
};
use crate::codec::{ByteCursor, ByteSink};
use crate::error::{Error, Result};
use crate::pool::ConstantPool;
use std::collections::BTreeMap;
use tracing::debug;

/// Opaque attributes whose constant pool references are not decoded
const UNTRACKED_ATTRIBUTES: &[&str] = &[
    INNER_CLASSES,
    "RuntimeVisibleAnnotations",
    "RuntimeInvisibleAnnotations",
];

/// Every constant pool index held by a Module attribute, zeros excluded
fn module_indices(module: &ModuleAttribute) -> Vec<u16> {
    let mut indices = vec![
        module.attribute_name_index,
        module.module_name_index,
        module.module_version_index,
    ];
    for requires in &module.requires {
        indices.push(requires.requires_index);
        indices.push(requires.version_index);
    }
    for directive in module.exports.iter().chain(&module.opens) {
        indices.push(directive.package_index);
        indices.extend(&directive.to_indices);
    }
    indices.extend(&module.uses_indices);
    for provides in &module.provides {
        indices.push(provides.service_index);
        indices.extend(&provides.with_indices);
    }
    indices.retain(|&index| index != 0);
    indices
}

/// Indices stored in the payload of an opaque attribute we know the shape of
fn payload_indices(attribute: &GenericAttribute) -> Result<Vec<u16>> {
    let mut cursor = ByteCursor::new(attribute.info.clone());
    match attribute.name.as_str() {
        MODULE_PACKAGES => {
            let count = cursor.read_u2()?;
            (0..count).map(|_| cursor.read_u2()).collect()
        }
        MODULE_MAIN_CLASS => Ok(vec![cursor.read_u2()?]),
        _ => Ok(Vec::new()),
    }
}

fn rewrite_payload(attribute: &mut GenericAttribute, map: &BTreeMap<u16, u16>) -> Result<()> {
    let indices = payload_indices(attribute)?;
    let mut sink = ByteSink::new();
    match attribute.name.as_str() {
        MODULE_PACKAGES => {
            sink.append_count("package_count", indices.len())?;
            for index in indices {
                sink.append_u2(remap(map, index));
            }
        }
        MODULE_MAIN_CLASS => {
            for index in indices {
                sink.append_u2(remap(map, index));
            }
        }
        _ => return Ok(()),
    }
    attribute.info = sink.freeze();
    Ok(())
}

fn remap(map: &BTreeMap<u16, u16>, index: u16) -> u16 {
    if index == 0 {
        return 0;
    }
    map.get(&index).copied().unwrap_or(index)
}

fn remap_module(module: &mut ModuleAttribute, map: &BTreeMap<u16, u16>) {
    let remap_index = |index: &mut u16| *index = remap(map, *index);
    remap_index(&mut module.attribute_name_index);
    remap_index(&mut module.module_name_index);
    remap_index(&mut module.module_version_index);
    for requires in &mut module.requires {
        remap_index(&mut requires.requires_index);
        remap_index(&mut requires.version_index);
    }
    for directive in module.exports.iter_mut().chain(module.opens.iter_mut()) {
        remap_index(&mut directive.package_index);
        directive.to_indices.iter_mut().for_each(remap_index);
    }
    module.uses_indices.iter_mut().for_each(remap_index);
    for provides in &mut module.provides {
        remap_index(&mut provides.service_index);
        provides.with_indices.iter_mut().for_each(remap_index);
    }
}

impl ModuleInfoClass {
    /// Drops constant pool entries nothing refers to and renumbers the rest.
    ///
    /// Surviving entries keep their relative order. Fails without changing
    /// anything if the descriptor holds an attribute whose references cannot
    /// be traced. Returns the number of entries removed.
    pub fn compact_constant_pool(&mut self) -> Result<usize> {
        if let Some(attribute) = self
            .attributes
            .generics()
            .find(|attr| UNTRACKED_ATTRIBUTES.contains(&attr.name.as_str()))
        {
            return Err(Error::CompactionUnsupported {
                attribute: attribute.name.clone(),
            });
        }

        let mut pending = vec![self.this_class_index];
        pending.extend(module_indices(self.attributes.module()));
        if let Some(source_file) = self.attributes.source_file() {
            pending.push(source_file.attribute_name_index);
            pending.push(source_file.sourcefile_index);
        }
        for generic in self.attributes.generics() {
            pending.push(generic.attribute_name_index);
            pending.extend(payload_indices(generic)?);
        }

        let mut reachable = vec![false; usize::from(self.pool.count())];
        while let Some(index) = pending.pop() {
            let entry = self.pool.entry(index)?;
            if !std::mem::replace(&mut reachable[usize::from(index)], true) {
                pending.extend(entry.name_index());
            }
        }

        let mut map = BTreeMap::new();
        let mut entries = Vec::new();
        for (index, _) in self.pool.iter() {
            if reachable[usize::from(index)] {
                map.insert(index, (entries.len() + 1) as u16);
                entries.push(index);
            }
        }
        let removed = self.pool.len() - entries.len();

        let mut new_entries = Vec::with_capacity(entries.len());
        for index in entries {
            let entry = self.pool.entry(index)?;
            new_entries.push(match entry.name_index() {
                Some(name_index) => entry.with_name_index(remap(&map, name_index)),
                None => entry.clone(),
            });
        }

        let mut attributes = self.attributes.clone();
        remap_module(attributes.module_mut(), &map);
        if let Some(source_file) = attributes.source_file_mut() {
            source_file.attribute_name_index = remap(&map, source_file.attribute_name_index);
            source_file.sourcefile_index = remap(&map, source_file.sourcefile_index);
        }
        for generic in attributes.generics_mut() {
            generic.attribute_name_index = remap(&map, generic.attribute_name_index);
            rewrite_payload(generic, &map)?;
        }

        self.this_class_index = remap(&map, self.this_class_index);
        self.pool = ConstantPool::from_entries(new_entries);
        self.attributes = attributes;
        debug!(
            "Compacted constant pool: removed {} entries, {} remain",
            removed,
            self.pool.len()
        );
        Ok(removed)
    }
}
