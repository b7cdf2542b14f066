use anyhow::{Context, Result, bail};
use clap::Parser;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use vm_hack::SourceUnit;

#[derive(Parser)]
#[command(name = "vm-hack")]
#[command(about = "Translate stack-machine VM code to Hack assembly")]
struct Cli {
    #[arg(help = "Input .vm file, or a directory of .vm files")]
    input: PathBuf,

    #[arg(short, long, help = "Output .asm file (default: derived from input)")]
    output: Option<PathBuf>,

    #[arg(long, help = "Skip the SP init and `call Sys.init 0` preamble")]
    no_bootstrap: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let inputs = collect_inputs(&cli.input)?;
    let output = match cli.output {
        Some(path) => path,
        None => default_output(&cli.input)?,
    };

    // Read everything up front so I/O problems surface before translation.
    let mut units = Vec::new();
    for path in &inputs {
        let source =
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        units.push(SourceUnit::new(file_stem(path)?, source));
    }

    let options = vm_hack::Options {
        bootstrap: !cli.no_bootstrap,
    };
    let program = vm_hack::translate_with_options(&units, &options)?;

    // The program text exists only in memory until here, so a failed run
    // never leaves a partial output file behind.
    fs::write(&output, program.to_text())
        .with_context(|| format!("Failed to write output to {}", output.display()))?;
    println!(
        "Translated {} unit(s) -> {} ({} instructions)",
        units.len(),
        output.display(),
        program.instructions().len()
    );

    Ok(())
}

/// Resolve the input path to the ordered list of `.vm` files to translate.
fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_dir() {
        let mut files: Vec<PathBuf> = fs::read_dir(input)
            .with_context(|| format!("Failed to read directory {}", input.display()))?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|e| e == "vm"))
            .collect();
        if files.is_empty() {
            bail!("no .vm files found in {}", input.display());
        }
        // Directory order is filesystem-dependent; sort for determinism.
        files.sort();
        Ok(files)
    } else if input.extension().is_some_and(|e| e == "vm") && input.exists() {
        Ok(vec![input.to_path_buf()])
    } else {
        bail!(
            "{} is neither a .vm file nor a directory of .vm files",
            input.display()
        );
    }
}

/// `Foo.vm` -> `Foo.asm`; a directory is named after itself.
fn default_output(input: &Path) -> Result<PathBuf> {
    if input.is_dir() {
        let name = file_stem(input)?;
        Ok(input.join(format!("{name}.asm")))
    } else {
        Ok(input.with_extension("asm"))
    }
}

fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(OsStr::to_str)
        .map(ToString::to_string)
        .with_context(|| format!("{} has no usable file name", path.display()))
}
