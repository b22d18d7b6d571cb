//! Module descriptors inside JAR archives.
//!
//! Reading uses the `zip` crate directly. Writing is delegated to an
//! [`ArchiveUpdater`], by default the JDK `jar` tool.

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};
use zip::result::ZipError;
use zip::ZipArchive;

/// Name of the descriptor entry at the root of a modular JAR
pub const MODULE_INFO_CLASS: &str = "module-info.class";

/// Reads the root `module-info.class` of a JAR, if it has one
pub fn read_module_info(path: &Path) -> Result<Option<Vec<u8>>> {
    let file = File::open(path).map_err(|e| Error::file_read(path, e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| Error::archive(path, e))?;

    let mut entry = match archive.by_name(MODULE_INFO_CLASS) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => {
            debug!("No {} in {}", MODULE_INFO_CLASS, path.display());
            return Ok(None);
        }
        Err(e) => return Err(Error::archive(path, e)),
    };

    let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
    entry
        .read_to_end(&mut bytes)
        .map_err(|e| Error::file_read(path, e))?;
    debug!("Read {} bytes of {} from {}", bytes.len(), MODULE_INFO_CLASS, path.display());
    Ok(Some(bytes))
}

/// Stores new descriptor bytes in an archive.
///
/// Implementations may rewrite more than the descriptor entry. The `jar`
/// tool, for one, can reorder the constant pool and add a ModulePackages
/// attribute, so the descriptor read back from the archive is not
/// necessarily byte-identical to the bytes passed in.
pub trait ArchiveUpdater {
    /// Replaces (or adds) the `module-info.class` of `archive`
    fn update(&self, archive: &Path, module_info: &[u8]) -> Result<()>;
}

/// [`ArchiveUpdater`] running `jar --update`
#[derive(Debug, Clone)]
pub struct JarTool {
    program: PathBuf,
}

impl Default for JarTool {
    fn default() -> Self {
        Self {
            program: PathBuf::from("jar"),
        }
    }
}

impl JarTool {
    /// Uses `jar` from the `PATH`
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a specific `jar` executable
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl ArchiveUpdater for JarTool {
    fn update(&self, archive: &Path, module_info: &[u8]) -> Result<()> {
        // Removed when dropped, whichever way this function returns
        let scratch = tempfile::TempDir::new().map_err(|e| Error::file_write(archive, e))?;
        let class_path = scratch.path().join(MODULE_INFO_CLASS);
        fs::write(&class_path, module_info).map_err(|e| Error::file_write(&class_path, e))?;

        info!("Updating {} with {}", archive.display(), self.program.display());
        let output = Command::new(&self.program)
            .arg("--update")
            .arg("--file")
            .arg(archive)
            .arg("-C")
            .arg(scratch.path())
            .arg(MODULE_INFO_CLASS)
            .output()
            .map_err(|e| {
                Error::archive_update(
                    archive,
                    format!("failed to run {}: {}", self.program.display(), e),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::archive_update(
                archive,
                format!("{} exited with {}: {}", self.program.display(), output.status, stderr.trim()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn write_jar(dir: &TempDir, entries: &[(&str, &[u8])]) -> PathBuf {
        let path = dir.path().join("test.jar");
        let mut zip = ZipWriter::new(File::create(&path).unwrap());
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
        path
    }

    #[test]
    fn test_reads_module_info() {
        let dir = TempDir::new().unwrap();
        let path = write_jar(
            &dir,
            &[
                ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n"),
                ("module-info.class", b"\xCA\xFE\xBA\xBE"),
            ],
        );
        assert_eq!(
            read_module_info(&path).unwrap(),
            Some(vec![0xCA, 0xFE, 0xBA, 0xBE])
        );
    }

    #[test]
    fn test_missing_module_info() {
        let dir = TempDir::new().unwrap();
        let path = write_jar(&dir, &[("sample/module-info.class", b"x")]);
        assert_eq!(read_module_info(&path).unwrap(), None);
    }

    #[test]
    fn test_not_an_archive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jar");
        fs::write(&path, b"not a zip file").unwrap();
        assert!(matches!(
            read_module_info(&path),
            Err(Error::Archive { .. })
        ));
        assert!(matches!(
            read_module_info(&dir.path().join("absent.jar")),
            Err(Error::FileRead { .. })
        ));
    }

    #[test]
    fn test_jar_tool_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let tool = JarTool::with_program(dir.path().join("no-such-jar-tool"));
        let err = tool
            .update(&dir.path().join("a.jar"), b"\xCA\xFE\xBA\xBE")
            .unwrap_err();
        assert!(matches!(err, Error::ArchiveUpdate { .. }));
        assert!(err.to_string().contains("failed to run"));
    }
}
