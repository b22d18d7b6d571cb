//! Extensible descriptor visiting traits.
//!
//! This module provides the [`DescriptorWriter`] trait, which
//! [`ModuleDescriptor::accept`] drives over every part of a declaration.

use super::{ExportsDirective, ModuleDescriptor, OpensDirective, ProvidesDirective, RequiresDirective};
use std::fmt::Result;

/// Trait for consuming the parts of a module declaration.
///
/// Every method defaults to doing nothing, so an implementation only
/// overrides the parts it cares about.
///
/// # Example
///
/// ```
/// use modjar_core::descriptor::{DescriptorWriter, RequiresDirective};
///
/// struct RequiresNames(Vec<String>);
///
/// impl DescriptorWriter for RequiresNames {
///     fn write_requires(&mut self, requires: &RequiresDirective) -> std::fmt::Result {
///         self.0.push(requires.name().to_string());
///         Ok(())
///     }
/// }
/// ```
pub trait DescriptorWriter {
    /// Called once, before any directive
    fn write_module(&mut self, module: &ModuleDescriptor) -> Result {
        let _ = module;
        Ok(())
    }

    /// Called for each requires directive
    fn write_requires(&mut self, requires: &RequiresDirective) -> Result {
        let _ = requires;
        Ok(())
    }

    /// Called for each exports directive
    fn write_exports(&mut self, exports: &ExportsDirective) -> Result {
        let _ = exports;
        Ok(())
    }

    /// Called for each opens directive
    fn write_opens(&mut self, opens: &OpensDirective) -> Result {
        let _ = opens;
        Ok(())
    }

    /// Called for each used service
    fn write_uses(&mut self, service: &str) -> Result {
        let _ = service;
        Ok(())
    }

    /// Called for each provides directive
    fn write_provides(&mut self, provides: &ProvidesDirective) -> Result {
        let _ = provides;
        Ok(())
    }
}

/// A no-op writer that discards everything
pub struct NullWriter;

impl DescriptorWriter for NullWriter {}

/// A writer that counts modules and directives
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatsWriter {
    /// Number of modules
    pub module_count: usize,
    /// Number of requires directives
    pub requires_count: usize,
    /// Number of exports directives
    pub exports_count: usize,
    /// Number of opens directives
    pub opens_count: usize,
    /// Number of uses directives
    pub uses_count: usize,
    /// Number of provides directives
    pub provides_count: usize,
}

impl DescriptorWriter for StatsWriter {
    fn write_module(&mut self, _module: &ModuleDescriptor) -> Result {
        self.module_count += 1;
        Ok(())
    }

    fn write_requires(&mut self, _requires: &RequiresDirective) -> Result {
        self.requires_count += 1;
        Ok(())
    }

    fn write_exports(&mut self, _exports: &ExportsDirective) -> Result {
        self.exports_count += 1;
        Ok(())
    }

    fn write_opens(&mut self, _opens: &OpensDirective) -> Result {
        self.opens_count += 1;
        Ok(())
    }

    fn write_uses(&mut self, _service: &str) -> Result {
        self.uses_count += 1;
        Ok(())
    }

    fn write_provides(&mut self, _provides: &ProvidesDirective) -> Result {
        self.provides_count += 1;
        Ok(())
    }
}
