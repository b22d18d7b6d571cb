//! Parsing of the directive strings accepted by the edit options.
//!
//! Each `parse_*` function has the shape clap expects of a value parser, so
//! malformed arguments are reported while the command line is parsed.

use crate::lexer::{parse_qualified_name, NameCursor};
use anyhow::{bail, Context, Result};
use modjar_core::attribute::RequiresFlags;
use modjar_core::ModuleVersion;

const JAVA_BASE: &str = "java.base";

/// A value to set, or a request to remove it
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Edit<T> {
    Set(T),
    Remove,
}

/// `--add-requires '[static|transitive]... MODULE[@VERSION]'`
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RequiresSpec {
    pub(crate) module: String,
    pub(crate) flags: RequiresFlags,
    pub(crate) version: Option<ModuleVersion>,
}

/// `--add-exports 'PACKAGE [to MODULE[, MODULE]...]'`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExportsSpec {
    pub(crate) package: String,
    pub(crate) targets: Vec<String>,
}

/// `--module MODULE[@VERSION]`
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ModuleSpec {
    pub(crate) name: String,
    pub(crate) version: Option<Edit<ModuleVersion>>,
}

fn parse_version(raw: &str) -> Result<ModuleVersion> {
    ModuleVersion::parse(raw).with_context(|| format!("not a module version: {}", raw))
}

/// A version, or removal of the version if `raw` is blank
pub(crate) fn parse_version_edit(raw: &str) -> Result<Edit<ModuleVersion>> {
    if raw.trim().is_empty() {
        return Ok(Edit::Remove);
    }
    parse_version(raw).map(Edit::Set)
}

/// A main class, or removal of the main class if `raw` is blank
pub(crate) fn parse_main_class_edit(raw: &str) -> Result<Edit<String>> {
    if raw.trim().is_empty() {
        return Ok(Edit::Remove);
    }
    parse_qualified_name(raw)
        .with_context(|| format!("not a class name: {}", raw))
        .map(Edit::Set)
}

pub(crate) fn parse_module(spec: &str) -> Result<ModuleSpec> {
    let (name, version) = match spec.split_once('@') {
        Some((name, raw_version)) => (name, Some(parse_version_edit(raw_version)?)),
        None => (spec, None),
    };
    let name = parse_qualified_name(name)
        .with_context(|| format!("not a valid module name: {}", name))?;
    Ok(ModuleSpec { name, version })
}

pub(crate) fn parse_requires(spec: &str) -> Result<RequiresSpec> {
    let mut cursor = NameCursor::new(spec);
    cursor.skip_whitespace();

    let mut flags = RequiresFlags::empty();
    loop {
        let flag = if cursor.skip_keyword("transitive") {
            RequiresFlags::TRANSITIVE
        } else if cursor.skip_keyword("static") {
            RequiresFlags::STATIC_PHASE
        } else {
            break;
        };

        if !cursor.skip_whitespace() || cursor.is_eof() {
            // `requires transitive;` names a module called transitive
            if flag == RequiresFlags::TRANSITIVE && cursor.is_eof() {
                return Ok(RequiresSpec {
                    module: "transitive".to_string(),
                    flags,
                    version: None,
                });
            }
            bail!("missing module name: {}", spec);
        }
        if flags.contains(flag) {
            bail!("modifier specified twice: {}", spec);
        }
        flags |= flag;
    }

    let Some(module) = cursor.skip_qualified_name()? else {
        bail!("missing module name: {}", spec);
    };
    if module == JAVA_BASE {
        bail!("{} is mandated and its requires cannot be changed", JAVA_BASE);
    }

    let version = if cursor.skip_literal("@") {
        Some(parse_version(cursor.rest().trim())?)
    } else {
        cursor.skip_whitespace();
        if !cursor.is_eof() {
            bail!("expected '@' following module name {}: {}", module, spec);
        }
        None
    };

    Ok(RequiresSpec {
        module,
        flags,
        version,
    })
}

pub(crate) fn parse_exports(spec: &str) -> Result<ExportsSpec> {
    let mut cursor = NameCursor::new(spec);
    cursor.skip_whitespace();
    let Some(package) = cursor.skip_qualified_name()? else {
        bail!("expected package name: {}", spec);
    };

    let mut targets = Vec::new();
    if cursor.skip_whitespace() && !cursor.is_eof() {
        if !cursor.skip_keyword("to") {
            bail!("expected 'to' following package name: {}", spec);
        }
        if !cursor.skip_whitespace() {
            bail!("missing module following 'to': {}", spec);
        }

        loop {
            let Some(module) = cursor.skip_qualified_name()? else {
                bail!("expected module name in to clause: {}", spec);
            };
            cursor.skip_whitespace();
            if cursor.is_eof() {
                targets.push(module);
                break;
            }
            if !cursor.skip_literal(",") {
                bail!("expected ',' following {}: {}", module, spec);
            }
            targets.push(module);
            cursor.skip_whitespace();
        }
    } else if !cursor.is_eof() {
        bail!("unexpected '{}' following {}", cursor.rest(), package);
    }

    Ok(ExportsSpec { package, targets })
}
