//! Rendering a [`ModuleDescriptor`] as `module-info.java` text.
//!
//! The output is fully determined by the descriptor: directives are grouped
//! as requires, exports, opens, uses, provides, each group sorted by name,
//! with one blank line between non-empty groups. Information that has no
//! source syntax (versions and the synthetic and mandated flags) is written
//! as a trailing `//` comment on the line it belongs to.

use super::{
    DirectiveModifier, ModuleDescriptor, ModuleModifier, PackageVisibility, ProvidesDirective,
    RequiresDirective, RequiresModifier,
};
use std::fmt::Write as FmtWrite;

/// Configuration for declaration printing
#[derive(Debug, Clone)]
pub struct PrinterConfig {
    /// Indentation string (default: 4 spaces)
    pub indent_str: String,
    /// Include `@version` in trailing comments
    pub version_comments: bool,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            indent_str: "    ".to_string(),
            version_comments: true,
        }
    }
}

impl PrinterConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the indentation string
    pub fn indent_str(mut self, s: impl Into<String>) -> Self {
        self.indent_str = s.into();
        self
    }

    /// Sets whether versions appear in trailing comments
    pub fn version_comments(mut self, include: bool) -> Self {
        self.version_comments = include;
        self
    }
}

/// Prints a module declaration
#[derive(Debug)]
pub struct DeclarationPrinter<'a> {
    descriptor: &'a ModuleDescriptor,
    config: PrinterConfig,
}

impl<'a> DeclarationPrinter<'a> {
    /// Creates a printer with the default configuration
    pub fn new(descriptor: &'a ModuleDescriptor) -> Self {
        Self {
            descriptor,
            config: PrinterConfig::default(),
        }
    }

    /// Replaces the configuration
    pub fn with_config(mut self, config: PrinterConfig) -> Self {
        self.config = config;
        self
    }

    /// Renders the declaration as a string
    pub fn print(&self) -> String {
        let mut output = String::new();
        self.write_to(&mut output).expect("String write cannot fail");
        output
    }

    /// Writes the declaration to a writer
    pub fn write_to(&self, w: &mut impl FmtWrite) -> std::fmt::Result {
        let mut writer = DeclarationWriter::new(w, &self.config);
        writer.write_module(self.descriptor)
    }
}

struct DeclarationWriter<'a, W: FmtWrite> {
    writer: &'a mut W,
    config: &'a PrinterConfig,
    indent_level: usize,
    /// Whether a directive group has been written yet
    wrote_group: bool,
}

impl<'a, W: FmtWrite> DeclarationWriter<'a, W> {
    fn new(writer: &'a mut W, config: &'a PrinterConfig) -> Self {
        Self {
            writer,
            config,
            indent_level: 0,
            wrote_group: false,
        }
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    fn write_indent(&mut self) -> std::fmt::Result {
        for _ in 0..self.indent_level {
            write!(self.writer, "{}", self.config.indent_str)?;
        }
        Ok(())
    }

    /// Ends the current line with a `//` comment if there is anything to say
    fn end_line(&mut self, version: Option<String>, synthetic: bool, mandated: bool) -> std::fmt::Result {
        let mut notes = Vec::new();
        if let Some(version) = version.filter(|_| self.config.version_comments) {
            notes.push(format!("@{}", version));
        }
        if synthetic {
            notes.push("synthetic".to_string());
        }
        if mandated {
            notes.push("mandated".to_string());
        }

        if notes.is_empty() {
            writeln!(self.writer)
        } else {
            writeln!(self.writer, " // {}", notes.join(" "))
        }
    }

    /// Starts a directive group, separating it from the previous one
    fn begin_group(&mut self) -> std::fmt::Result {
        if self.wrote_group {
            writeln!(self.writer)?;
        }
        self.wrote_group = true;
        Ok(())
    }

    /// Writes `head`, then `items` one per line on a deeper indent, then `;`
    fn write_list<'s>(
        &mut self,
        head: &str,
        keyword: &str,
        items: impl IntoIterator<Item = &'s str>,
    ) -> std::fmt::Result {
        self.write_indent()?;
        write!(self.writer, "{}", head)?;

        let mut items = items.into_iter().peekable();
        if items.peek().is_some() {
            writeln!(self.writer, " {}", keyword)?;
            self.indent();
            while let Some(item) = items.next() {
                self.write_indent()?;
                write!(self.writer, "{}", item)?;
                if items.peek().is_some() {
                    writeln!(self.writer, ",")?;
                }
            }
            self.dedent();
        }
        write!(self.writer, ";")
    }

    fn write_module(&mut self, module: &ModuleDescriptor) -> std::fmt::Result {
        if module.is_open() {
            write!(self.writer, "open ")?;
        }
        write!(self.writer, "module {} {{", module.name())?;
        self.end_line(
            module.version().map(ToString::to_string),
            module.modifiers().contains(&ModuleModifier::Synthetic),
            module.modifiers().contains(&ModuleModifier::Mandated),
        )?;

        self.indent();

        let mut requires: Vec<_> = module.requires().iter().collect();
        requires.sort_by(|a, b| a.name().cmp(b.name()));
        if !requires.is_empty() {
            self.begin_group()?;
            for r in requires {
                self.write_requires(r)?;
            }
        }

        self.write_package_group("exports", module.exports())?;
        self.write_package_group("opens", module.opens())?;

        let mut uses: Vec<_> = module.uses().iter().collect();
        uses.sort();
        if !uses.is_empty() {
            self.begin_group()?;
            for service in uses {
                self.write_indent()?;
                writeln!(self.writer, "uses {};", service)?;
            }
        }

        let mut provides: Vec<_> = module.provides().iter().collect();
        provides.sort_by(|a, b| a.service().cmp(b.service()));
        if !provides.is_empty() {
            self.begin_group()?;
            for p in provides {
                self.write_provides(p)?;
            }
        }

        self.dedent();
        writeln!(self.writer, "}}")
    }

    fn write_requires(&mut self, requires: &RequiresDirective) -> std::fmt::Result {
        self.write_indent()?;
        write!(self.writer, "requires ")?;
        let modifiers = requires.modifiers();
        if modifiers.contains(&RequiresModifier::Transitive) {
            write!(self.writer, "transitive ")?;
        }
        if modifiers.contains(&RequiresModifier::Static) {
            write!(self.writer, "static ")?;
        }
        write!(self.writer, "{};", requires.name())?;
        self.end_line(
            requires.compiled_version().map(ToString::to_string),
            modifiers.contains(&RequiresModifier::Synthetic),
            modifiers.contains(&RequiresModifier::Mandated),
        )
    }

    fn write_package_group(
        &mut self,
        keyword: &str,
        directives: &[PackageVisibility],
    ) -> std::fmt::Result {
        if directives.is_empty() {
            return Ok(());
        }
        self.begin_group()?;

        let mut directives: Vec<_> = directives.iter().collect();
        directives.sort_by(|a, b| a.package().cmp(b.package()));
        for directive in directives {
            // Targets are a BTreeSet, so already sorted
            self.write_list(
                &format!("{} {}", keyword, directive.package()),
                "to",
                directive.targets().iter().map(String::as_str),
            )?;
            self.end_line(
                None,
                directive.modifiers().contains(&DirectiveModifier::Synthetic),
                directive.modifiers().contains(&DirectiveModifier::Mandated),
            )?;
        }
        Ok(())
    }

    fn write_provides(&mut self, provides: &ProvidesDirective) -> std::fmt::Result {
        let mut providers: Vec<_> = provides.providers().iter().map(String::as_str).collect();
        providers.sort_unstable();
        self.write_list(
            &format!("provides {}", provides.service()),
            "with",
            providers,
        )?;
        writeln!(self.writer)
    }
}
