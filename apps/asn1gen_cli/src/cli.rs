//! Argument parsing and command dispatch for the `asn1gen` driver.
//!
//! The pipeline runs to the requested stage and stops:
//!
//! ```bash
//! # Dump the tagged parse tree
//! asn1gen module.asn1 --stage parse
//!
//! # Dump the semantic model as JSON
//! asn1gen module.asn1 --stage sema
//!
//! # Generate pyasn1 classes to stdout
//! asn1gen module.asn1
//!
//! # Generate a Quick-DER header per module into a directory
//! asn1gen module.asn1 --backend quick-der --split --outdir generated/
//! ```
//!
//! Generated output always starts with the one-line banner naming the tool,
//! its version, the source basename and the source's last-modification
//! time. Existing output files are refused unless `--force` is given, and
//! more than one module emitted to a single stream draws a warning.

use clap::{Parser, ValueEnum};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use asn1gen_compile::codegen::{self, pyasn1, quickder};
use asn1gen_compile::{Backend, Pyasn1Backend, QuickDerBackend};
use asn1gen_language::sema::Module;
use asn1gen_language::{build_semantic_model, parse_asn1};

use crate::style::Style;

/// Generate runtime bindings from ASN.1 definitions.
#[derive(Parser)]
#[command(name = "asn1gen")]
#[command(about = "Generate runtime bindings from ASN.1 definitions", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The ASN.1 definition file to process.
    pub file: PathBuf,

    /// After which stage to stop.
    #[arg(long, value_enum, default_value = "gen")]
    pub stage: Stage,

    /// Code-generation back end.
    #[arg(long, value_enum, default_value = "pyasn1")]
    pub backend: BackendKind,

    /// Output file; stdout when omitted.
    #[arg(long, conflicts_with = "split")]
    pub output: Option<PathBuf>,

    /// Write one file per module instead of a single stream.
    #[arg(long)]
    pub split: bool,

    /// Directory for split-mode output files.
    #[arg(long, requires = "split", default_value = ".")]
    pub outdir: PathBuf,

    /// Overwrite existing output files.
    #[arg(long)]
    pub force: bool,
}

/// Pipeline stage selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Stage {
    /// Parse only and dump the tagged tree.
    Parse,
    /// Parse and build the semantic model, dumped as JSON.
    Sema,
    /// Run a code-generation back end (the default).
    Gen,
}

/// Selectable back ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// pyasn1 Python classes.
    Pyasn1,
    /// Quick-DER C headers.
    QuickDer,
}

impl BackendKind {
    fn comment_prefix(self) -> &'static str {
        match self {
            BackendKind::Pyasn1 => pyasn1::COMMENT_PREFIX,
            BackendKind::QuickDer => quickder::COMMENT_PREFIX,
        }
    }

    fn output_name(self, module: &Module) -> String {
        match self {
            BackendKind::Pyasn1 => pyasn1::output_name(module),
            BackendKind::QuickDer => quickder::output_name(module),
        }
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Parse command-line arguments and run the pipeline.
pub fn run_cli() -> CliResult {
    run(Cli::parse())
}

/// Run the pipeline for already-parsed arguments.
pub fn run(cli: Cli) -> CliResult {
    if cli.stage != Stage::Gen && (cli.output.is_some() || cli.split) {
        return Err("output options only apply to the gen stage".into());
    }

    let source = fs::read_to_string(&cli.file)?;
    let parse_tree = parse_asn1(&source)?;

    if cli.stage == Stage::Parse {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        for module in &parse_tree {
            out.write_all(module.dump().as_bytes())?;
        }
        return Ok(());
    }

    let modules = build_semantic_model(&parse_tree)?;

    if cli.stage == Stage::Sema {
        println!("{}", serde_json::to_string_pretty(&modules)?);
        return Ok(());
    }

    if cli.split {
        generate_split(&cli, &modules)
    } else {
        generate_to_stream(&cli, &modules)
    }
}

/// Single-stream mode: all modules to `--output` or stdout.
fn generate_to_stream(cli: &Cli, modules: &[Module]) -> CliResult {
    if modules.len() > 1 {
        eprintln!(
            "{}: more than one module generated to the same stream",
            Style::yellow("warning")
        );
    }
    match &cli.output {
        Some(path) => {
            let mut out = create_output(path, cli.force)?;
            for module in modules {
                generate_module(cli, module, modules, &mut out)?;
            }
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            for module in modules {
                generate_module(cli, module, modules, &mut out)?;
            }
        }
    }
    Ok(())
}

/// Split mode: one file per module under `--outdir`, named from the
/// sanitized module name with the back end's extension.
fn generate_split(cli: &Cli, modules: &[Module]) -> CliResult {
    for module in modules {
        let path = cli.outdir.join(cli.backend.output_name(module));
        let mut out = create_output(&path, cli.force)?;
        generate_module(cli, module, modules, &mut out)?;
    }
    Ok(())
}

/// Opens an output file, refusing to clobber existing paths without
/// `--force`.
fn create_output(path: &Path, force: bool) -> Result<fs::File, Box<dyn std::error::Error>> {
    if path.exists() && !force {
        return Err(format!(
            "output file {} already exists (pass --force to overwrite)",
            path.display()
        )
        .into());
    }
    Ok(fs::File::create(path)?)
}

fn generate_module(
    cli: &Cli,
    module: &Module,
    modules: &[Module],
    out: &mut dyn Write,
) -> CliResult {
    let banner = codegen::banner(
        "asn1gen",
        env!("CARGO_PKG_VERSION"),
        &cli.file,
        cli.backend.comment_prefix(),
    )?;
    writeln!(out, "{}", banner)?;
    writeln!(out)?;
    match cli.backend {
        BackendKind::Pyasn1 => Pyasn1Backend::new(module, out, modules).generate_code()?,
        BackendKind::QuickDer => QuickDerBackend::new(module, out, modules).generate_code()?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_conflicts_with_output() {
        let result = Cli::try_parse_from([
            "asn1gen", "mod.asn1", "--split", "--output", "out.py",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn outdir_requires_split() {
        let result = Cli::try_parse_from(["asn1gen", "mod.asn1", "--outdir", "gen"]);
        assert!(result.is_err());
    }

    #[test]
    fn defaults_are_gen_and_pyasn1() {
        let cli = Cli::try_parse_from(["asn1gen", "mod.asn1"]).unwrap();
        assert_eq!(cli.stage, Stage::Gen);
        assert_eq!(cli.backend, BackendKind::Pyasn1);
        assert!(cli.output.is_none());
        assert!(!cli.split);
        assert!(!cli.force);
    }

    #[test]
    fn backend_value_names() {
        let cli =
            Cli::try_parse_from(["asn1gen", "mod.asn1", "--backend", "quick-der"]).unwrap();
        assert_eq!(cli.backend, BackendKind::QuickDer);
    }

    #[test]
    fn stage_gating_of_output_options() {
        let cli = Cli::try_parse_from([
            "asn1gen", "mod.asn1", "--stage", "parse", "--output", "out.py",
        ])
        .unwrap();
        let err = run(cli).unwrap_err();
        assert!(err.to_string().contains("gen stage"));
    }
}
