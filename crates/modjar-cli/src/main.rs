//! modjar - View and modify the module descriptor of a JAR
//!
//! This tool prints the `module-info.class` of a JAR (or a bare descriptor)
//! as a module declaration, and edits it in place.

mod directive;
mod lexer;
mod update;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser};
use directive::{Edit, ExportsSpec, ModuleSpec, RequiresSpec};
use modjar_core::{
    DeclarationPrinter, JarTool, MinimalConfig, ModuleInfoClass, ModuleVersion, PrinterConfig,
    StatsWriter,
};
use std::path::Path;
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use update::{Target, UpdatePlan};
use walkdir::WalkDir;

/// View and modify the module descriptor of a JAR
#[derive(Parser, Debug)]
#[command(name = "modjar")]
#[command(author, version, about, long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Print the module declaration
    #[arg(short, long, conflicts_with = "update")]
    describe_module: bool,

    /// Update FILE in place
    #[arg(short, long)]
    update: bool,

    /// Set the module name, and the version if given (remove it if empty)
    #[arg(short, long, value_name = "MODULE[@VERSION]", value_parser = directive::parse_module, requires = "update")]
    module: Option<ModuleSpec>,

    /// Set the module version, or remove it if empty
    #[arg(short = 'V', long, value_name = "VERSION", value_parser = directive::parse_version_edit, requires = "update")]
    module_version: Option<Edit<ModuleVersion>>,

    /// Add a requires directive: '[static|transitive]... MODULE[@VERSION]'
    #[arg(short = 'A', long, visible_alias = "add-reads", value_name = "REQUIRES", value_parser = directive::parse_requires, requires = "update")]
    add_requires: Vec<RequiresSpec>,

    /// Remove the requires directive of a module
    #[arg(long, value_name = "MODULE", value_parser = lexer::parse_qualified_name, requires = "update")]
    remove_requires: Vec<String>,

    /// Add an exports directive: 'PACKAGE [to MODULE[, MODULE]...]'
    #[arg(short = 'E', long, value_name = "EXPORTS", value_parser = directive::parse_exports, requires = "update")]
    add_exports: Vec<ExportsSpec>,

    /// Remove the exports directive of a package
    #[arg(long, value_name = "PACKAGE", value_parser = lexer::parse_qualified_name, requires = "update")]
    remove_exports: Vec<String>,

    /// Set the main class, or remove it if empty
    #[arg(short = 'e', long, value_name = "CLASS", value_parser = directive::parse_main_class_edit, requires = "update")]
    main_class: Option<Edit<String>>,

    /// Drop constant pool entries nothing refers to
    #[arg(long, requires = "update")]
    compact_pool: bool,

    /// Print the updated declaration instead of writing it
    #[arg(long, requires = "update")]
    dry_run: bool,

    /// Version of java.base recorded in a newly created descriptor
    #[arg(long, default_value = "17")]
    java_base_version: String,

    /// Class file major version of a newly created descriptor
    #[arg(long, default_value = "61")]
    class_major_version: u16,

    /// Omit versions from the trailing comments of the declaration
    #[arg(long)]
    no_version_comments: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print version
    #[arg(long, action = clap::ArgAction::Version)]
    version: Option<bool>,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// A JAR or module-info.class
    #[arg(short, long)]
    file: Option<std::path::PathBuf>,

    /// Describe every JAR and module-info.class under a directory
    #[arg(short = 'D', long, conflicts_with = "update")]
    directory: Option<std::path::PathBuf>,
}

impl Cli {
    fn plan(&self) -> Result<UpdatePlan> {
        let mut version = self.module_version.clone();
        if let Some(module_version) = self.module.as_ref().and_then(|m| m.version.clone()) {
            if version.is_some() {
                bail!("--module-version conflicts with the version given to --module");
            }
            version = Some(module_version);
        }

        Ok(UpdatePlan {
            module: self.module.as_ref().map(|m| m.name.clone()),
            version,
            add_requires: self.add_requires.clone(),
            remove_requires: self.remove_requires.clone(),
            add_exports: self.add_exports.clone(),
            remove_exports: self.remove_exports.clone(),
            main_class: self.main_class.clone(),
            compact_pool: self.compact_pool,
        })
    }

    fn minimal_config(&self) -> MinimalConfig {
        MinimalConfig::new()
            .with_major_version(self.class_major_version)
            .with_java_base_version(self.java_base_version.clone())
    }

    fn printer_config(&self) -> PrinterConfig {
        PrinterConfig::new().version_comments(!self.no_version_comments)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if !cli.describe_module && !cli.update {
        bail!("nothing to do: specify --describe-module or --update");
    }

    // Dispatch based on input mode
    if let Some(ref file) = cli.input.file {
        process_single_file(&cli, file)
    } else if let Some(ref directory) = cli.input.directory {
        process_directory(&cli, directory)
    } else {
        bail!("Either --file or --directory must be specified")
    }
}

/// Describe or update a single JAR or descriptor
fn process_single_file(cli: &Cli, file: &Path) -> Result<()> {
    if !file.is_file() {
        bail!("Input file does not exist: {}", file.display());
    }
    let target = Target::from_path(file)?;

    if cli.update {
        let plan = cli.plan()?;
        let class = update::update(
            &target,
            &plan,
            &cli.minimal_config(),
            &JarTool::new(),
            cli.dry_run,
        )?;
        if cli.dry_run {
            print!("{}", declaration(cli, &class)?);
        }
        return Ok(());
    }

    let class = read_descriptor(&target)?;
    print!("{}", declaration(cli, &class)?);
    Ok(())
}

/// Describe every descriptor found under a directory
fn process_directory(cli: &Cli, directory: &Path) -> Result<()> {
    if !directory.is_dir() {
        bail!("Directory does not exist: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());

    let mut stats = StatsWriter::default();
    let mut failures = 0;

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(target) = Target::from_path(path) else {
            trace!("Skipping {}", path.display());
            continue;
        };

        debug!("Processing {}", path.display());
        match describe_into(cli, &target, &mut stats) {
            Ok(Some(text)) => {
                println!("// {}", path.display());
                println!("{}", text);
            }
            Ok(None) => trace!("No module-info.class in {}", path.display()),
            Err(e) => {
                // Log error but continue with other files
                warn!("Error processing {}: {:#}", path.display(), e);
                failures += 1;
            }
        }
    }

    info!(
        "Summary: {} modules, {} requires, {} exports, {} opens, {} uses, {} provides, {} failed",
        stats.module_count,
        stats.requires_count,
        stats.exports_count,
        stats.opens_count,
        stats.uses_count,
        stats.provides_count,
        failures
    );
    Ok(())
}

fn describe_into(cli: &Cli, target: &Target, stats: &mut StatsWriter) -> Result<Option<String>> {
    let Some(class) = target.read()? else {
        return Ok(None);
    };
    let descriptor = class.descriptor()?;
    descriptor
        .accept(stats)
        .context("Failed to collect statistics")?;
    let text = DeclarationPrinter::new(&descriptor)
        .with_config(cli.printer_config())
        .print();
    Ok(Some(text))
}

fn read_descriptor(target: &Target) -> Result<ModuleInfoClass> {
    match target.read()? {
        Some(class) => Ok(class),
        None => bail!("no module-info.class in {}", target.path().display()),
    }
}

fn declaration(cli: &Cli, class: &ModuleInfoClass) -> Result<String> {
    let descriptor = class
        .descriptor()
        .context("Failed to resolve module descriptor")?;
    Ok(DeclarationPrinter::new(&descriptor)
        .with_config(cli.printer_config())
        .print())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("modjar").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_update_options() {
        let cli = parse(&[
            "-f",
            "app.jar",
            "-u",
            "-m",
            "com.example@1.0",
            "-A",
            "static java.sql",
            "-E",
            "com.example.api to a, b",
            "--remove-requires",
            "java.logging",
            "-e",
            "",
        ])
        .unwrap();

        let plan = cli.plan().unwrap();
        assert_eq!(plan.module.as_deref(), Some("com.example"));
        assert_eq!(
            plan.version,
            Some(Edit::Set(ModuleVersion::parse("1.0").unwrap()))
        );
        assert_eq!(plan.add_requires[0].module, "java.sql");
        assert_eq!(plan.add_exports[0].targets, vec!["a", "b"]);
        assert_eq!(plan.remove_requires, vec!["java.logging"]);
        assert_eq!(plan.main_class, Some(Edit::Remove));
    }

    #[test]
    fn test_module_version_twice_is_rejected() {
        let cli = parse(&["-f", "a.jar", "-u", "-m", "m@1", "-V", "2"]).unwrap();
        assert!(cli.plan().is_err());

        let cli = parse(&["-f", "a.jar", "-u", "-m", "m", "-V", ""]).unwrap();
        assert_eq!(cli.plan().unwrap().version, Some(Edit::Remove));
    }

    #[test]
    fn test_invalid_arguments() {
        // Malformed directive strings fail while parsing
        assert!(parse(&["-f", "a.jar", "-u", "-A", "static"]).is_err());
        assert!(parse(&["-f", "a.jar", "-u", "-V", "x1"]).is_err());
        assert!(parse(&["-f", "a.jar", "-u", "-A", "java.base"]).is_err());
        // Edits need --update, and describing conflicts with it
        assert!(parse(&["-f", "a.jar", "-m", "m"]).is_err());
        assert!(parse(&["-f", "a.jar", "-d", "-u"]).is_err());
        // Exactly one input
        assert!(parse(&["-d"]).is_err());
        assert!(parse(&["-f", "a.jar", "-D", "lib", "-d"]).is_err());
        assert!(parse(&["-D", "lib", "-u"]).is_err());
    }

    #[test]
    fn test_minimal_config_from_options() {
        let cli = parse(&[
            "-f",
            "a.jar",
            "-u",
            "--java-base-version",
            "21",
            "--class-major-version",
            "65",
        ])
        .unwrap();
        let config = cli.minimal_config();
        assert_eq!(config.major_version, 65);
        assert_eq!(config.java_base_version, "21");
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
