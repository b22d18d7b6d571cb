//! Reading a descriptor from a file, applying edits and storing it back.

use crate::directive::{Edit, ExportsSpec, RequiresSpec};
use anyhow::{bail, Context, Result};
use modjar_core::archive::{self, MODULE_INFO_CLASS};
use modjar_core::{ArchiveUpdater, MinimalConfig, ModuleInfoClass, ModuleVersion};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A file that holds a module descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    /// A JAR with `module-info.class` at its root
    Archive(PathBuf),
    /// A bare `module-info.class`
    ClassFile(PathBuf),
}

impl Target {
    /// Classifies `path` by its name
    pub(crate) fn from_path(path: &Path) -> Result<Self> {
        let is_jar = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("jar"));
        if is_jar {
            return Ok(Self::Archive(path.to_path_buf()));
        }
        if path.file_name().and_then(|n| n.to_str()) == Some(MODULE_INFO_CLASS) {
            return Ok(Self::ClassFile(path.to_path_buf()));
        }
        bail!(
            "expected a .jar or {} file: {}",
            MODULE_INFO_CLASS,
            path.display()
        )
    }

    pub(crate) fn path(&self) -> &Path {
        match self {
            Self::Archive(path) | Self::ClassFile(path) => path,
        }
    }

    /// Parses the descriptor, or `None` for a JAR without one
    pub(crate) fn read(&self) -> Result<Option<ModuleInfoClass>> {
        let bytes = match self {
            Self::Archive(path) => archive::read_module_info(path)?,
            Self::ClassFile(path) => Some(
                fs::read(path)
                    .with_context(|| format!("Failed to read input file: {}", path.display()))?,
            ),
        };

        bytes
            .map(|bytes| {
                ModuleInfoClass::from_bytes(bytes).with_context(|| {
                    format!("Failed to parse module descriptor in {}", self.path().display())
                })
            })
            .transpose()
    }

    /// Stores `class` in place of the current descriptor
    pub(crate) fn write(&self, class: &ModuleInfoClass, updater: &impl ArchiveUpdater) -> Result<()> {
        let bytes = class.to_bytes()?;
        match self {
            Self::Archive(path) => updater.update(path, &bytes)?,
            Self::ClassFile(path) => fs::write(path, &bytes)
                .with_context(|| format!("Failed to write file: {}", path.display()))?,
        }
        info!("Wrote {} bytes to {}", bytes.len(), self.path().display());
        Ok(())
    }
}

/// The edits requested on the command line
#[derive(Debug, Clone, Default)]
pub(crate) struct UpdatePlan {
    pub(crate) module: Option<String>,
    pub(crate) version: Option<Edit<ModuleVersion>>,
    pub(crate) add_requires: Vec<RequiresSpec>,
    pub(crate) remove_requires: Vec<String>,
    pub(crate) add_exports: Vec<ExportsSpec>,
    pub(crate) remove_exports: Vec<String>,
    pub(crate) main_class: Option<Edit<String>>,
    pub(crate) compact_pool: bool,
}

impl UpdatePlan {
    pub(crate) fn is_empty(&self) -> bool {
        self.module.is_none()
            && self.version.is_none()
            && self.add_requires.is_empty()
            && self.remove_requires.is_empty()
            && self.add_exports.is_empty()
            && self.remove_exports.is_empty()
            && self.main_class.is_none()
            && !self.compact_pool
    }

    /// Applies every edit in a fixed order: name, version, requires,
    /// exports, main class, then pool compaction.
    pub(crate) fn apply(&self, class: &mut ModuleInfoClass) -> Result<()> {
        if let Some(module) = &self.module {
            if class.module_name()? != module {
                class.set_module_name(module)?;
            }
        }

        match &self.version {
            Some(Edit::Set(version)) => class.set_module_version(version)?,
            Some(Edit::Remove) => class.remove_module_version(),
            None => {}
        }

        for requires in &self.add_requires {
            class.set_requires(&requires.module, requires.flags, requires.version.as_ref())?;
        }
        for module in &self.remove_requires {
            if !class.remove_requires(module)? {
                warn!("No requires {} to remove", module);
            }
        }

        for exports in &self.add_exports {
            let targets: Vec<&str> = exports.targets.iter().map(String::as_str).collect();
            class.set_exports(&exports.package, &targets)?;
        }
        for package in &self.remove_exports {
            if !class.remove_exports(package)? {
                warn!("No exports {} to remove", package);
            }
        }

        match &self.main_class {
            Some(Edit::Set(main_class)) => class.set_main_class(main_class)?,
            Some(Edit::Remove) => {
                if !class.remove_main_class() {
                    warn!("No main class to remove");
                }
            }
            None => {}
        }

        if self.compact_pool {
            let removed = class.compact_constant_pool()?;
            info!("Removed {} unreferenced constant pool entries", removed);
        }

        Ok(())
    }
}

/// Applies `plan` to the descriptor of `target`.
///
/// A JAR without a descriptor gets a minimal one when the plan names the
/// module. The result is written back unless `dry_run` is set; either way
/// the updated descriptor is returned.
pub(crate) fn update(
    target: &Target,
    plan: &UpdatePlan,
    minimal: &MinimalConfig,
    updater: &impl ArchiveUpdater,
    dry_run: bool,
) -> Result<ModuleInfoClass> {
    let (mut class, created) = match target.read()? {
        Some(class) => (class, false),
        None => match &plan.module {
            Some(module) => {
                info!("Creating module-info.class for {}", module);
                (ModuleInfoClass::minimal(module, minimal)?, true)
            }
            None => bail!(
                "no {} in {} (use --module to create one)",
                MODULE_INFO_CLASS,
                target.path().display()
            ),
        },
    };

    plan.apply(&mut class)?;

    if plan.is_empty() && !created {
        info!("Nothing to update in {}", target.path().display());
    } else if dry_run {
        debug!("Dry run, not writing {}", target.path().display());
    } else {
        target.write(&class, updater)?;
    }
    Ok(class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use modjar_core::attribute::RequiresFlags;
    use modjar_core::descriptor::RequiresModifier;
    use std::cell::RefCell;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    /// Records updates instead of running `jar`
    #[derive(Default)]
    struct RecordingUpdater {
        updates: RefCell<Vec<(PathBuf, Vec<u8>)>>,
    }

    impl ArchiveUpdater for RecordingUpdater {
        fn update(&self, archive: &Path, module_info: &[u8]) -> modjar_core::Result<()> {
            self.updates
                .borrow_mut()
                .push((archive.to_path_buf(), module_info.to_vec()));
            Ok(())
        }
    }

    fn version(raw: &str) -> ModuleVersion {
        ModuleVersion::parse(raw).unwrap()
    }

    fn write_jar(dir: &TempDir, entries: &[(&str, &[u8])]) -> PathBuf {
        let path = dir.path().join("app.jar");
        let mut zip = ZipWriter::new(File::create(&path).unwrap());
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
        path
    }

    fn minimal(name: &str) -> ModuleInfoClass {
        ModuleInfoClass::minimal(name, &MinimalConfig::default()).unwrap()
    }

    #[test]
    fn test_target_from_path() {
        assert_eq!(
            Target::from_path(Path::new("lib/a.JAR")).unwrap(),
            Target::Archive(PathBuf::from("lib/a.JAR"))
        );
        assert_eq!(
            Target::from_path(Path::new("out/module-info.class")).unwrap(),
            Target::ClassFile(PathBuf::from("out/module-info.class"))
        );
        assert!(Target::from_path(Path::new("out/Main.class")).is_err());
        assert!(Target::from_path(Path::new("a.zip")).is_err());
    }

    #[test]
    fn test_apply_plan() {
        let mut class = minimal("app");
        let plan = UpdatePlan {
            module: Some("com.example.app".to_string()),
            version: Some(Edit::Set(version("1.0"))),
            add_requires: vec![RequiresSpec {
                module: "java.sql".to_string(),
                flags: RequiresFlags::STATIC_PHASE,
                version: None,
            }],
            add_exports: vec![ExportsSpec {
                package: "com.example.api".to_string(),
                targets: vec!["friend".to_string()],
            }],
            main_class: Some(Edit::Set("com.example.Main".to_string())),
            ..UpdatePlan::default()
        };
        plan.apply(&mut class).unwrap();

        let descriptor = class.descriptor().unwrap();
        assert_eq!(descriptor.name(), "com.example.app");
        assert_eq!(descriptor.version(), Some(&version("1.0")));
        let sql = descriptor
            .requires()
            .iter()
            .find(|r| r.name() == "java.sql")
            .unwrap();
        assert!(sql.modifiers().contains(&RequiresModifier::Static));
        assert_eq!(descriptor.exports()[0].package(), "com.example.api");
        assert!(descriptor.exports()[0].targets().contains("friend"));
        assert_eq!(descriptor.main_class(), Some("com.example.Main"));
    }

    #[test]
    fn test_apply_removals() {
        let mut class = minimal("app");
        class.set_requires("java.sql", RequiresFlags::empty(), None).unwrap();
        class.set_exports("p", &[]).unwrap();
        class.set_main_class("p.Main").unwrap();
        class.set_module_version(&version("3")).unwrap();

        let plan = UpdatePlan {
            version: Some(Edit::Remove),
            remove_requires: vec!["java.sql".to_string(), "absent".to_string()],
            remove_exports: vec!["p".to_string()],
            main_class: Some(Edit::Remove),
            ..UpdatePlan::default()
        };
        plan.apply(&mut class).unwrap();

        let descriptor = class.descriptor().unwrap();
        assert_eq!(descriptor.version(), None);
        assert_eq!(descriptor.requires().len(), 1);
        assert!(descriptor.exports().is_empty());
        assert_eq!(descriptor.main_class(), None);
    }

    #[test]
    fn test_apply_refuses_mandated_removal() {
        let mut class = minimal("app");
        let plan = UpdatePlan {
            remove_requires: vec!["java.base".to_string()],
            ..UpdatePlan::default()
        };
        let err = plan.apply(&mut class).unwrap_err();
        assert!(err.to_string().contains("mandated"));
        assert_eq!(class.descriptor().unwrap().requires().len(), 1);
    }

    #[test]
    fn test_apply_keeps_java_base_mandated_after_readding() {
        let mut class = minimal("app");
        let plan = UpdatePlan {
            add_requires: vec![RequiresSpec {
                module: "java.base".to_string(),
                flags: RequiresFlags::empty(),
                version: None,
            }],
            remove_requires: vec!["java.base".to_string()],
            ..UpdatePlan::default()
        };
        let err = plan.apply(&mut class).unwrap_err();
        assert!(err.to_string().contains("mandated"));
        let descriptor = class.descriptor().unwrap();
        assert_eq!(descriptor.requires().len(), 1);
        assert!(descriptor.requires()[0]
            .modifiers()
            .contains(&RequiresModifier::Mandated));
    }

    #[test]
    fn test_update_class_file_in_place() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(MODULE_INFO_CLASS);
        fs::write(&path, minimal("app").to_bytes().unwrap()).unwrap();

        let plan = UpdatePlan {
            version: Some(Edit::Set(version("2.0"))),
            ..UpdatePlan::default()
        };
        let updater = RecordingUpdater::default();
        update(
            &Target::ClassFile(path.clone()),
            &plan,
            &MinimalConfig::default(),
            &updater,
            false,
        )
        .unwrap();

        let reread = ModuleInfoClass::from_bytes(fs::read(&path).unwrap()).unwrap();
        assert_eq!(reread.raw_module_version().unwrap(), Some("2.0"));
        assert!(updater.updates.borrow().is_empty());
    }

    #[test]
    fn test_update_archive_creates_minimal_descriptor() {
        let dir = TempDir::new().unwrap();
        let jar = write_jar(&dir, &[("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n")]);

        let plan = UpdatePlan {
            module: Some("app".to_string()),
            ..UpdatePlan::default()
        };
        let updater = RecordingUpdater::default();
        let config = MinimalConfig::new().with_java_base_version("21");
        update(&Target::Archive(jar.clone()), &plan, &config, &updater, false).unwrap();

        let updates = updater.updates.borrow();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, jar);
        let written = ModuleInfoClass::from_bytes(updates[0].1.clone()).unwrap();
        let descriptor = written.descriptor().unwrap();
        assert_eq!(descriptor.name(), "app");
        assert_eq!(
            descriptor.requires()[0].compiled_version(),
            Some(&version("21"))
        );
    }

    #[test]
    fn test_update_archive_without_descriptor_needs_module() {
        let dir = TempDir::new().unwrap();
        let jar = write_jar(&dir, &[("a/B.class", b"\xCA\xFE\xBA\xBE")]);
        let plan = UpdatePlan {
            version: Some(Edit::Set(version("1"))),
            ..UpdatePlan::default()
        };
        let err = update(
            &Target::Archive(jar),
            &plan,
            &MinimalConfig::default(),
            &RecordingUpdater::default(),
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("use --module"));
    }

    #[test]
    fn test_update_existing_archive_descriptor() {
        let dir = TempDir::new().unwrap();
        let bytes = minimal("app").to_bytes().unwrap();
        let jar = write_jar(&dir, &[(MODULE_INFO_CLASS, bytes.as_slice())]);

        let plan = UpdatePlan {
            add_requires: vec![RequiresSpec {
                module: "java.logging".to_string(),
                flags: RequiresFlags::TRANSITIVE,
                version: None,
            }],
            ..UpdatePlan::default()
        };
        let updater = RecordingUpdater::default();
        let class = update(
            &Target::Archive(jar),
            &plan,
            &MinimalConfig::default(),
            &updater,
            false,
        )
        .unwrap();
        assert_eq!(class.descriptor().unwrap().requires().len(), 2);
        assert_eq!(updater.updates.borrow()[0].1, class.to_bytes().unwrap());
    }

    #[test]
    fn test_dry_run_and_empty_plan_do_not_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(MODULE_INFO_CLASS);
        let original = minimal("app").to_bytes().unwrap();
        fs::write(&path, &original).unwrap();
        let target = Target::ClassFile(path.clone());
        let updater = RecordingUpdater::default();

        let plan = UpdatePlan {
            module: Some("renamed".to_string()),
            ..UpdatePlan::default()
        };
        let class = update(&target, &plan, &MinimalConfig::default(), &updater, true).unwrap();
        assert_eq!(class.module_name().unwrap(), "renamed");
        assert_eq!(fs::read(&path).unwrap(), original);

        update(&target, &UpdatePlan::default(), &MinimalConfig::default(), &updater, false)
            .unwrap();
        assert_eq!(fs::read(&path).unwrap(), original);
    }
}
