use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;

mod cull;
mod manifest;
mod preserve;
mod report;

use preserve::PreserveList;
use report::{CullReport, Reporter};

/// Options clap parses. Only well-formed spellings of them reach clap (see
/// [`known_args`]); `--preserve=` is read straight from the raw arguments.
#[derive(Parser, Debug, Default)]
#[command(name = "culls")]
#[command(version)]
#[command(
    about = "Strip package.json down to the fields npm needs.",
    long_about = None,
    after_help = "Keep extra top-level fields with --preserve=<field>,<field>,...\n\
                  --preserve=scripts keeps every script. Unrecognized arguments are ignored."
)]
#[command(args_override_self = true)]
struct Cli {
    /// Directory holding package.json (defaults to the current directory).
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Emit a machine-readable JSON report on stdout.
    #[arg(long)]
    json: bool,

    /// Print nothing unless an error occurs.
    #[arg(long)]
    quiet: bool,
}

/// Keeps the arguments clap can parse without error and drops the rest, so
/// a stray or malformed flag never stops a cull.
fn known_args(raw: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut it = raw.iter().peekable();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--json" | "--quiet" | "--help" | "-h" | "--version" | "-V" => out.push(arg.clone()),
            "--dir" => {
                if let Some(dir) = it.next_if(|next| !next.is_empty() && !next.starts_with('-')) {
                    out.push(arg.clone());
                    out.push(dir.clone());
                }
            }
            _ => {
                if arg.strip_prefix("--dir=").is_some_and(|dir| !dir.is_empty()) {
                    out.push(arg.clone());
                }
            }
        }
    }
    out
}

fn parse_cli(raw: &[String]) -> Cli {
    let argv = std::iter::once("culls".to_string()).chain(known_args(raw));
    match Cli::try_parse_from(argv) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(_) => Cli::default(),
    }
}

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn try_main() -> Result<ExitCode> {
    let raw: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    let cli = parse_cli(&raw);
    let preserve = PreserveList::scan_args(&raw).unwrap_or_default();
    let reporter = Reporter {
        json: cli.json,
        quiet: cli.quiet,
    };
    let dir = match &cli.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("resolve current directory")?,
    };
    cmd_cull(&dir, &preserve, &reporter)
}

fn cmd_cull(dir: &Path, preserve: &PreserveList, reporter: &Reporter) -> Result<ExitCode> {
    let started = Instant::now();

    let path = manifest::manifest_path(dir);
    let mut doc = manifest::load(&path)?;
    let outcome = cull::cull_manifest(&mut doc, preserve);
    manifest::save(&path, &doc)?;

    if outcome.is_noop() {
        reporter.progress(&format!("nothing to cull in {}", path.display()));
    }

    let elapsed = started.elapsed();
    let report = CullReport::new(
        path.display().to_string(),
        outcome,
        preserve.fields().to_vec(),
        elapsed,
    );
    reporter.finish(&report, elapsed)?;
    Ok(ExitCode::SUCCESS)
}
