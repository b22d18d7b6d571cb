//! The semantic view of a module descriptor.
//!
//! [`ModuleDescriptorFactory`] resolves every constant pool reference of a
//! [`ModuleInfoClass`] into names and decodes the flag words into modifier
//! sets. The resulting [`ModuleDescriptor`] is read-only; edits go through
//! the binary model.

mod printer;
mod version;
mod writer;

use crate::attribute::{
    DirectiveFlags, ModuleFlags, PackageDirective, RequiresFlags, MODULE_PACKAGES,
};
use crate::class::ModuleInfoClass;
use crate::codec::ByteCursor;
use crate::error::{Error, Result};
use crate::pool::ConstantPool;
use std::collections::BTreeSet;
use tracing::debug;

pub use printer::{DeclarationPrinter, PrinterConfig};
pub use version::ModuleVersion;
pub use writer::{DescriptorWriter, NullWriter, StatsWriter};

/// Modifier of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModuleModifier {
    /// `open module`
    Open,
    /// Not explicitly or implicitly declared
    Synthetic,
    /// Implicitly declared
    Mandated,
}

/// Modifier of a requires directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RequiresModifier {
    /// `requires transitive`
    Transitive,
    /// `requires static`
    Static,
    /// Not explicitly or implicitly declared
    Synthetic,
    /// Implicitly declared
    Mandated,
}

/// Modifier of an exports or opens directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DirectiveModifier {
    /// Not explicitly or implicitly declared
    Synthetic,
    /// Implicitly declared
    Mandated,
}

fn module_modifiers(flags: ModuleFlags) -> BTreeSet<ModuleModifier> {
    [
        (ModuleFlags::OPEN, ModuleModifier::Open),
        (ModuleFlags::SYNTHETIC, ModuleModifier::Synthetic),
        (ModuleFlags::MANDATED, ModuleModifier::Mandated),
    ]
    .into_iter()
    .filter(|(flag, _)| flags.contains(*flag))
    .map(|(_, modifier)| modifier)
    .collect()
}

fn requires_modifiers(flags: RequiresFlags) -> BTreeSet<RequiresModifier> {
    [
        (RequiresFlags::TRANSITIVE, RequiresModifier::Transitive),
        (RequiresFlags::STATIC_PHASE, RequiresModifier::Static),
        (RequiresFlags::SYNTHETIC, RequiresModifier::Synthetic),
        (RequiresFlags::MANDATED, RequiresModifier::Mandated),
    ]
    .into_iter()
    .filter(|(flag, _)| flags.contains(*flag))
    .map(|(_, modifier)| modifier)
    .collect()
}

fn directive_modifiers(flags: DirectiveFlags) -> BTreeSet<DirectiveModifier> {
    [
        (DirectiveFlags::SYNTHETIC, DirectiveModifier::Synthetic),
        (DirectiveFlags::MANDATED, DirectiveModifier::Mandated),
    ]
    .into_iter()
    .filter(|(flag, _)| flags.contains(*flag))
    .map(|(_, modifier)| modifier)
    .collect()
}

/// A resolved `requires` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiresDirective {
    name: String,
    modifiers: BTreeSet<RequiresModifier>,
    compiled_version: Option<ModuleVersion>,
}

impl RequiresDirective {
    /// Name of the required module
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Modifiers
    pub fn modifiers(&self) -> &BTreeSet<RequiresModifier> {
        &self.modifiers
    }

    /// Version of the required module at compile time
    pub fn compiled_version(&self) -> Option<&ModuleVersion> {
        self.compiled_version.as_ref()
    }
}

/// A resolved `exports` or `opens` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageVisibility {
    package: String,
    modifiers: BTreeSet<DirectiveModifier>,
    targets: BTreeSet<String>,
}

impl PackageVisibility {
    /// The `.`-separated package name
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Modifiers
    pub fn modifiers(&self) -> &BTreeSet<DirectiveModifier> {
        &self.modifiers
    }

    /// Modules the package is visible to; empty when unqualified
    pub fn targets(&self) -> &BTreeSet<String> {
        &self.targets
    }

    /// Returns true if the directive names target modules
    pub fn is_qualified(&self) -> bool {
        !self.targets.is_empty()
    }
}

/// A resolved `exports` directive
pub type ExportsDirective = PackageVisibility;

/// A resolved `opens` directive
pub type OpensDirective = PackageVisibility;

/// A resolved `provides` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvidesDirective {
    service: String,
    providers: Vec<String>,
}

impl ProvidesDirective {
    /// The service interface
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Implementation classes, in declaration order
    pub fn providers(&self) -> &[String] {
        &self.providers
    }
}

/// A module declaration with every name resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    name: String,
    modifiers: BTreeSet<ModuleModifier>,
    version: Option<ModuleVersion>,
    requires: Vec<RequiresDirective>,
    exports: Vec<ExportsDirective>,
    opens: Vec<OpensDirective>,
    uses: Vec<String>,
    provides: Vec<ProvidesDirective>,
    packages: BTreeSet<String>,
    main_class: Option<String>,
}

impl ModuleDescriptor {
    /// The module name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Module modifiers
    pub fn modifiers(&self) -> &BTreeSet<ModuleModifier> {
        &self.modifiers
    }

    /// Returns true for an `open module`
    pub fn is_open(&self) -> bool {
        self.modifiers.contains(&ModuleModifier::Open)
    }

    /// The module version
    pub fn version(&self) -> Option<&ModuleVersion> {
        self.version.as_ref()
    }

    /// Requires directives in file order
    pub fn requires(&self) -> &[RequiresDirective] {
        &self.requires
    }

    /// Exports directives in file order
    pub fn exports(&self) -> &[ExportsDirective] {
        &self.exports
    }

    /// Opens directives in file order
    pub fn opens(&self) -> &[OpensDirective] {
        &self.opens
    }

    /// Services used, in file order
    pub fn uses(&self) -> &[String] {
        &self.uses
    }

    /// Provides directives in file order
    pub fn provides(&self) -> &[ProvidesDirective] {
        &self.provides
    }

    /// Packages listed by the ModulePackages attribute
    pub fn packages(&self) -> &BTreeSet<String> {
        &self.packages
    }

    /// The main class named by the ModuleMainClass attribute
    pub fn main_class(&self) -> Option<&str> {
        self.main_class.as_deref()
    }

    /// Feeds every part of the declaration to `writer`, in declaration order
    pub fn accept(&self, writer: &mut impl DescriptorWriter) -> std::fmt::Result {
        writer.write_module(self)?;
        for requires in &self.requires {
            writer.write_requires(requires)?;
        }
        for exports in &self.exports {
            writer.write_exports(exports)?;
        }
        for opens in &self.opens {
            writer.write_opens(opens)?;
        }
        for service in &self.uses {
            writer.write_uses(service)?;
        }
        for provides in &self.provides {
            writer.write_provides(provides)?;
        }
        Ok(())
    }
}

/// Builds a [`ModuleDescriptor`] from the binary model
#[derive(Debug, Clone, Copy, Default)]
pub struct ModuleDescriptorFactory;

/// Tracks names already declared by one kind of directive
struct Seen {
    directive: &'static str,
    names: BTreeSet<String>,
}

impl Seen {
    fn new(directive: &'static str) -> Self {
        Self {
            directive,
            names: BTreeSet::new(),
        }
    }

    fn insert(&mut self, name: &str) -> Result<()> {
        if !self.names.insert(name.to_string()) {
            return Err(Error::duplicate_directive(self.directive, name));
        }
        Ok(())
    }
}

fn resolve_targets(pool: &ConstantPool, indices: &[u16]) -> Result<BTreeSet<String>> {
    indices
        .iter()
        .map(|&index| pool.resolve_module_name(index).map(str::to_string))
        .collect()
}

fn resolve_version(pool: &ConstantPool, index: u16) -> Result<Option<ModuleVersion>> {
    match index {
        0 => Ok(None),
        index => ModuleVersion::parse(pool.resolve_utf8(index)?).map(Some),
    }
}

fn package_directives(
    pool: &ConstantPool,
    directive: &'static str,
    entries: &[PackageDirective],
) -> Result<Vec<PackageVisibility>> {
    let mut seen = Seen::new(directive);
    let mut directives = Vec::with_capacity(entries.len());
    for entry in entries {
        let package = pool.resolve_package_name(entry.package_index)?;
        seen.insert(&package)?;
        directives.push(PackageVisibility {
            package,
            modifiers: directive_modifiers(entry.flags),
            targets: resolve_targets(pool, &entry.to_indices)?,
        });
    }
    Ok(directives)
}

impl ModuleDescriptorFactory {
    /// Resolves `class` into a descriptor.
    ///
    /// Fails on dangling or mistyped references, on versions that do not
    /// parse, and on directives declared twice.
    pub fn create(class: &ModuleInfoClass) -> Result<ModuleDescriptor> {
        let pool = class.constant_pool();
        let module = class.module_attribute();

        let name = pool.resolve_module_name(module.module_name_index)?.to_string();
        let version = resolve_version(pool, module.module_version_index)?;

        let mut seen = Seen::new("requires");
        let mut requires = Vec::with_capacity(module.requires.len());
        for entry in &module.requires {
            let name = pool.resolve_module_name(entry.requires_index)?;
            seen.insert(name)?;
            requires.push(RequiresDirective {
                name: name.to_string(),
                modifiers: requires_modifiers(entry.flags),
                compiled_version: resolve_version(pool, entry.version_index)?,
            });
        }

        let exports = package_directives(pool, "exports", &module.exports)?;
        let opens = package_directives(pool, "opens", &module.opens)?;

        let mut seen = Seen::new("uses");
        let mut uses = Vec::with_capacity(module.uses_indices.len());
        for &index in &module.uses_indices {
            let service = pool.resolve_class_name(index)?;
            seen.insert(&service)?;
            uses.push(service);
        }

        let mut seen = Seen::new("provides");
        let mut provides = Vec::with_capacity(module.provides.len());
        for entry in &module.provides {
            let service = pool.resolve_class_name(entry.service_index)?;
            seen.insert(&service)?;
            let providers = entry
                .with_indices
                .iter()
                .map(|&index| pool.resolve_class_name(index))
                .collect::<Result<Vec<_>>>()?;
            provides.push(ProvidesDirective { service, providers });
        }

        let mut packages = BTreeSet::new();
        if let Some(attribute) = class.attributes().generic(MODULE_PACKAGES) {
            let mut cursor = ByteCursor::new(attribute.info.clone());
            for _ in 0..cursor.read_u2()? {
                packages.insert(pool.resolve_package_name(cursor.read_u2()?)?);
            }
        }

        let descriptor = ModuleDescriptor {
            name,
            modifiers: module_modifiers(module.module_flags),
            version,
            requires,
            exports,
            opens,
            uses,
            provides,
            packages,
            main_class: class.main_class()?,
        };
        debug!(
            "Resolved module {}: {} requires, {} exports, {} opens",
            descriptor.name,
            descriptor.requires.len(),
            descriptor.exports.len(),
            descriptor.opens.len()
        );
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{ModuleAttribute, Requires};
    use crate::testutil::sample_module_info;

    fn sample() -> ModuleInfoClass {
        ModuleInfoClass::from_bytes(sample_module_info()).unwrap()
    }

    #[test]
    fn test_resolves_sample() {
        let descriptor = ModuleDescriptorFactory::create(&sample()).unwrap();

        assert_eq!(descriptor.name(), "sample");
        assert_eq!(descriptor.version().map(|v| v.as_str()), Some("1.2.3"));
        assert!(!descriptor.is_open());

        let requires: Vec<_> = descriptor.requires().iter().map(|r| r.name()).collect();
        assert_eq!(requires, vec!["java.base", "java.compiler"]);
        assert!(descriptor.requires()[0]
            .modifiers()
            .contains(&RequiresModifier::Mandated));
        assert!(descriptor.requires()[1].modifiers().is_empty());

        assert_eq!(descriptor.exports()[0].package(), "sample.exported");
        assert!(!descriptor.exports()[0].is_qualified());
        assert_eq!(
            descriptor.opens()[0].targets().iter().collect::<Vec<_>>(),
            vec!["java.compiler"]
        );
        assert_eq!(descriptor.uses(), ["javax.tools.Tool".to_string()]);
        assert_eq!(descriptor.provides()[0].service(), "java.lang.Object");
        assert_eq!(
            descriptor.provides()[0].providers(),
            ["sample.internal.Internal".to_string()]
        );
        assert_eq!(
            descriptor.packages().iter().collect::<Vec<_>>(),
            vec!["sample.exported", "sample.internal"]
        );
        assert_eq!(descriptor.main_class(), None);
    }

    #[test]
    fn test_decodes_modifiers() {
        assert_eq!(
            module_modifiers(ModuleFlags::OPEN | ModuleFlags::MANDATED),
            [ModuleModifier::Open, ModuleModifier::Mandated].into()
        );
        assert_eq!(
            requires_modifiers(RequiresFlags::from_bits_retain(0x0060)),
            [RequiresModifier::Transitive, RequiresModifier::Static].into()
        );
        assert_eq!(
            directive_modifiers(DirectiveFlags::from_bits_retain(0x1001)),
            [DirectiveModifier::Synthetic].into()
        );
    }

    #[test]
    fn test_rejects_duplicate_requires() {
        let mut class = sample();
        let duplicate = Requires {
            requires_index: 12,
            flags: RequiresFlags::empty(),
            version_index: 0,
        };
        class_module(&mut class).requires.push(duplicate);
        match ModuleDescriptorFactory::create(&class) {
            Err(Error::DuplicateDirective { directive, name }) => {
                assert_eq!(directive, "requires");
                assert_eq!(name, "java.compiler");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_same_package_exported_and_opened() {
        let mut class = sample();
        class_module(&mut class).opens.push(PackageDirective {
            package_index: 14,
            flags: DirectiveFlags::empty(),
            to_indices: Vec::new(),
        });
        assert!(ModuleDescriptorFactory::create(&class).is_ok());
    }

    #[test]
    fn test_invalid_version_is_an_error() {
        let mut class = sample();
        // Point the module version at "sample"
        class_module(&mut class).module_version_index = 7;
        assert!(matches!(
            ModuleDescriptorFactory::create(&class),
            Err(Error::InvalidVersion { .. })
        ));
    }

    #[test]
    fn test_dangling_reference() {
        let mut class = sample();
        class_module(&mut class).uses_indices.push(99);
        assert!(matches!(
            ModuleDescriptorFactory::create(&class),
            Err(Error::MissingConstant { index: 99 })
        ));
    }

    fn class_module(class: &mut ModuleInfoClass) -> &mut ModuleAttribute {
        class.attributes_mut().module_mut()
    }
}
